//! Caller-supplied capabilities.
//!
//! Two seams:
//! - [`UploadHooks`] runs before dispatch: a bypassing handler, a file
//!   transform and a synchronous validator. Each default method is the
//!   built-in behaviour, so `()` is a valid "no hooks" value.
//! - [`Completion`] consumes the transport's result. [`RenderCompletion`]
//!   decodes the default JSON schema and inserts markup; callers with a
//!   custom transport supply their own.

use std::future::{Future, ready};
use std::rc::Rc;

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::escape_html;
use crate::file::FileDescriptor;
use crate::platform::EditorPlatform;
use crate::render::insert_response;
use crate::response::UploadResponse;
use crate::session::UploadSession;
use crate::transport::TransportError;

/// What a generic file handler did with the batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// No handler configured; run the built-in pipeline.
    Declined,
    /// The handler took care of everything.
    Handled,
    /// The handler refused the batch with a message for the user.
    Rejected(String),
}

/// Hooks that run before the transport is called.
pub trait UploadHooks<H> {
    /// Take over the whole upload. Anything other than
    /// [`HandlerOutcome::Declined`] skips validation, transport and rendering.
    fn handle(&self, files: &[FileDescriptor<H>]) -> impl Future<Output = HandlerOutcome> {
        let _ = files;
        ready(HandlerOutcome::Declined)
    }

    /// Rewrite the batch before validation (e.g. client-side compression).
    fn transform(
        &self,
        files: Vec<FileDescriptor<H>>,
    ) -> impl Future<Output = Vec<FileDescriptor<H>>> {
        ready(files)
    }

    /// Veto the batch. `Err` carries the message shown to the user.
    fn validate(&self, files: &[FileDescriptor<H>]) -> Result<(), String> {
        let _ = files;
        Ok(())
    }
}

impl<H> UploadHooks<H> for () {}

/// Everything a completion needs to act on the editor.
pub struct CompletionContext<'a, P: EditorPlatform, H> {
    pub platform: &'a P,
    pub session: &'a UploadSession<P::Range>,
    pub config: &'a UploadConfig,
    /// The files that were sent.
    pub files: &'a [FileDescriptor<H>],
}

/// Consumes a settled transport call.
///
/// Runs after editability has been restored and the session released.
pub trait Completion<P: EditorPlatform, H, R> {
    fn complete(&self, cx: &CompletionContext<'_, P, H>, response: R) -> Result<(), UploadError>;

    /// Report a transport failure. Defaults to the diagnostic surface.
    fn fail(&self, cx: &CompletionContext<'_, P, H>, error: &TransportError) {
        cx.platform.show_tip(&escape_html(&error.to_string()));
    }
}

impl<P, H, R, C> Completion<P, H, R> for &C
where
    P: EditorPlatform,
    C: Completion<P, H, R> + ?Sized,
{
    fn complete(&self, cx: &CompletionContext<'_, P, H>, response: R) -> Result<(), UploadError> {
        (**self).complete(cx, response)
    }

    fn fail(&self, cx: &CompletionContext<'_, P, H>, error: &TransportError) {
        (**self).fail(cx, error)
    }
}

/// Rewrites a raw response before decoding. Receives the sent files.
pub type FormatHook<H> = Rc<dyn Fn(&[FileDescriptor<H>], String) -> String>;

/// Default completion: decode [`UploadResponse`] and insert markup.
pub struct RenderCompletion<H> {
    format: Option<FormatHook<H>>,
}

impl<H> Default for RenderCompletion<H> {
    fn default() -> Self {
        Self { format: None }
    }
}

impl<H> Clone for RenderCompletion<H> {
    fn clone(&self) -> Self {
        Self {
            format: self.format.clone(),
        }
    }
}

impl<H> RenderCompletion<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(
        format: impl Fn(&[FileDescriptor<H>], String) -> String + 'static,
    ) -> Self {
        Self {
            format: Some(Rc::new(format)),
        }
    }

    /// Decode `raw` (after formatting) and insert it.
    pub fn render<P: EditorPlatform>(
        &self,
        cx: &CompletionContext<'_, P, H>,
        raw: String,
    ) -> Result<(), UploadError> {
        let raw = match &self.format {
            Some(format) => format(cx.files, raw),
            None => raw,
        };

        let response = match UploadResponse::parse(&raw) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(target: "weaver::upload", error = %e, "undecodable upload response");
                cx.platform.show_tip(&escape_html(&e.to_string()));
                return Err(e.into());
            }
        };

        if let Err(e) = insert_response(
            cx.platform,
            cx.session,
            &response,
            &cx.config.rule.filename,
            &cx.config.messages,
        ) {
            cx.platform.show_tip(&escape_html(&e.to_string()));
            return Err(e);
        }
        Ok(())
    }
}

impl<P: EditorPlatform, H, R: Into<String>> Completion<P, H, R> for RenderCompletion<H> {
    fn complete(&self, cx: &CompletionContext<'_, P, H>, response: R) -> Result<(), UploadError> {
        self.render(cx, response.into())
    }
}
