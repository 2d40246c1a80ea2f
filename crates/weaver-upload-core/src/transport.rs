//! Transport seam and the sans-IO parts of the default multipart upload.
//!
//! The browser's XHR transport lives in `weaver-upload-browser`; this module
//! holds what it shares with any other implementation: form field order,
//! request headers, status classification and progress math.

use std::future::Future;

use thiserror::Error;

use crate::config::UploadConfig;
use crate::file::FileDescriptor;

/// Header carrying `UploadConfig::token`.
pub const UPLOAD_TOKEN_HEADER: &str = "X-Upload-Token";

/// Transport failure. The message is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// Request completed with a non-2xx status; `body` is the raw response.
    #[error("{}", describe_status(.status, .body))]
    Status { status: u16, body: String },

    /// Request never completed (offline, CORS, aborted).
    #[error("{0}")]
    Network(String),

    /// A custom transport rejected with its own payload.
    #[error("{0}")]
    Rejected(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Moves accepted files to a remote endpoint.
///
/// Implementations call `on_progress` with a 0.0..=1.0 fraction as often as
/// they like; only the latest value matters.
pub trait Transport<H> {
    /// Whatever the matching [`Completion`](crate::Completion) understands.
    type Response;

    /// Whether `UploadConfig::url` must be set before dispatch.
    fn requires_url(&self) -> bool {
        true
    }

    fn send(
        &self,
        files: &[FileDescriptor<H>],
        config: &UploadConfig,
        on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<Self::Response, TransportError>>;
}

impl<H, T: Transport<H> + ?Sized> Transport<H> for &T {
    type Response = T::Response;

    fn requires_url(&self) -> bool {
        (**self).requires_url()
    }

    fn send(
        &self,
        files: &[FileDescriptor<H>],
        config: &UploadConfig,
        on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<Self::Response, TransportError>> {
        (**self).send(files, config, on_progress)
    }
}

/// One multipart form entry.
#[derive(Debug, PartialEq, Eq)]
pub enum FormField<'a, H> {
    Text { name: &'a str, value: &'a str },
    File { name: &'a str, file: &'a FileDescriptor<H> },
}

/// Form entries in send order: extra data first, then every file under the
/// configured field name.
pub fn form_fields<'a, H>(
    files: &'a [FileDescriptor<H>],
    config: &'a UploadConfig,
) -> Vec<FormField<'a, H>> {
    let text = config.extra_data.iter().map(|(name, value)| FormField::Text {
        name: name.as_str(),
        value: value.as_str(),
    });
    let files = files.iter().map(|file| FormField::File {
        name: config.field_name.as_str(),
        file,
    });
    text.chain(files).collect()
}

/// Request headers in the order they should be set.
pub fn request_headers(config: &UploadConfig) -> Vec<(&str, &str)> {
    let token = config
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| (UPLOAD_TOKEN_HEADER, t));
    token
        .into_iter()
        .chain(config.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .collect()
}

fn describe_status(status: &u16, body: &str) -> String {
    if body.is_empty() {
        format!("upload failed with status {status}")
    } else {
        body.to_string()
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Fraction for a progress event, or `None` if the total is unknown.
pub fn progress_fraction(loaded: f64, total: f64, length_computable: bool) -> Option<f64> {
    if !length_computable || !(total > 0.0) {
        return None;
    }
    Some((loaded / total).clamp(0.0, 1.0))
}
