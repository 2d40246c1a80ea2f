//! Error types for the upload pipeline.

use thiserror::Error;

use crate::platform::PlatformError;
use crate::response::ResponseError;
use crate::transport::TransportError;

/// Why an upload attempt ended without inserting anything (or only partly).
///
/// Every variant has already been shown to the user by the time it is
/// returned; the value is for callers that want to react programmatically.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UploadError {
    /// No endpoint configured and the transport needs one.
    #[error("upload url is not configured")]
    NotConfigured,

    /// Another upload on this editor has not settled yet.
    #[error("an upload is already in progress")]
    AlreadyUploading,

    /// A caller hook refused the batch.
    #[error("upload rejected: {0}")]
    Rejected(String),

    /// Every file failed validation.
    #[error("no files accepted ({rejected} rejected)")]
    NothingAccepted { rejected: usize },

    /// Network or server failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with something we could not decode.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Selection restore or insertion failed.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}
