//! The upload pipeline.
//!
//! [`Uploader::run`] takes a raw file collection through normalization,
//! hooks, validation, transport and completion. Every exit path leaves a
//! visible trace (tooltip or hook call) and returns the same information as
//! a `Result` for callers that care.

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::escape_html;
use crate::file::{RawFile, normalize};
use crate::hooks::{Completion, CompletionContext, HandlerOutcome, UploadHooks};
use crate::platform::EditorPlatform;
use crate::session::UploadSession;
use crate::transport::Transport;
use crate::validate::validate;

/// How a successful run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadSummary {
    /// A generic handler took the batch.
    Delegated { files: usize },
    /// Files went through the transport and the completion ran.
    Uploaded { accepted: usize, rejected: usize },
}

/// Upload pipeline bound to one editor instance.
///
/// Owns the editor's [`UploadSession`]; create one per editor and drop it
/// with the editor.
pub struct Uploader<P: EditorPlatform, T, C, K = ()> {
    platform: P,
    transport: T,
    completion: C,
    hooks: K,
    config: UploadConfig,
    session: UploadSession<P::Range>,
}

impl<P: EditorPlatform, T, C> Uploader<P, T, C, ()> {
    pub fn new(platform: P, transport: T, completion: C, config: UploadConfig) -> Self {
        Self {
            platform,
            transport,
            completion,
            hooks: (),
            config,
            session: UploadSession::new(),
        }
    }
}

impl<P: EditorPlatform, T, C, K> Uploader<P, T, C, K> {
    /// Replace the hook set.
    pub fn with_hooks<K2>(self, hooks: K2) -> Uploader<P, T, C, K2> {
        Uploader {
            platform: self.platform,
            transport: self.transport,
            completion: self.completion,
            hooks,
            config: self.config,
            session: self.session,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn session(&self) -> &UploadSession<P::Range> {
        &self.session
    }

    pub fn hooks(&self) -> &K {
        &self.hooks
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn is_uploading(&self) -> bool {
        self.session.is_uploading()
    }

    /// Upload `raw` and insert the result at the current caret.
    ///
    /// `from_file_input` marks uploads triggered by an `<input type="file">`,
    /// whose value is cleared once the attempt ends.
    ///
    /// A second call while an upload is in flight is refused with
    /// [`UploadError::AlreadyUploading`].
    pub async fn run<H, I>(&self, raw: I, from_file_input: bool) -> Result<UploadSummary, UploadError>
    where
        I: IntoIterator<Item = RawFile<H>>,
        T: Transport<H>,
        C: Completion<P, H, T::Response>,
        K: UploadHooks<H>,
    {
        let platform = &self.platform;
        let messages = &self.config.messages;

        // Unlocked until dispatch, so a refused call only clears its input.
        let mut attempt = self.session.attempt(platform, from_file_input);

        if self.session.is_uploading() {
            platform.show_tip(&escape_html(&messages.already_uploading));
            return Err(UploadError::AlreadyUploading);
        }

        let files = normalize(raw, self.config.rule.multiple);
        tracing::debug!(target: "weaver::upload", files = files.len(), "upload requested");

        match self.hooks.handle(&files).await {
            HandlerOutcome::Declined => {}
            HandlerOutcome::Handled => {
                return Ok(UploadSummary::Delegated { files: files.len() });
            }
            HandlerOutcome::Rejected(message) => {
                platform.show_tip(&message);
                return Err(UploadError::Rejected(message));
            }
        }

        if self.transport.requires_url() && !self.config.has_url() {
            tracing::warn!(target: "weaver::upload", "upload url not configured");
            platform.show_tip(&escape_html(&messages.missing_url));
            return Err(UploadError::NotConfigured);
        }

        let files = self.hooks.transform(files).await;

        if let Err(message) = self.hooks.validate(&files) {
            platform.show_tip(&message);
            return Err(UploadError::Rejected(message));
        }

        // Captured before anything moves focus.
        let range = platform.capture_range();

        let outcome = validate(files, &self.config.rule, messages);
        platform.show_tip(&outcome.report_html(messages));
        if outcome.accepted.is_empty() {
            return Err(UploadError::NothingAccepted {
                rejected: outcome.rejected,
            });
        }

        if let Err(e) = attempt.lock(range) {
            platform.show_tip(&escape_html(&messages.already_uploading));
            return Err(e);
        }

        tracing::info!(
            target: "weaver::upload",
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected,
            "dispatching upload"
        );

        let on_progress = |fraction: f64| self.session.report_progress(platform, fraction);
        let result = self
            .transport
            .send(&outcome.accepted, &self.config, &on_progress)
            .await;
        attempt.settle();

        let cx = CompletionContext {
            platform,
            session: &self.session,
            config: &self.config,
            files: &outcome.accepted,
        };
        match result {
            Ok(response) => {
                self.completion.complete(&cx, response)?;
                Ok(UploadSummary::Uploaded {
                    accepted: outcome.accepted.len(),
                    rejected: outcome.rejected,
                })
            }
            Err(e) => {
                tracing::warn!(target: "weaver::upload", error = %e, status = ?e.status(), "upload failed");
                self.completion.fail(&cx, &e);
                Err(e.into())
            }
        }
    }
}
