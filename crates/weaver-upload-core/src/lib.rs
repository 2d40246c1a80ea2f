//! weaver-upload-core: File attachment pipeline without framework dependencies.
//!
//! This crate provides:
//! - `normalize` - raw selections (drops, file inputs, arrays) to `FileDescriptor`s
//! - `validate` - per-file acceptance rules with a rendered report
//! - `UploadSession` - the single in-flight upload per editor instance
//! - `Transport` - the seam for moving files to a remote endpoint
//! - `render_response` - mode-aware markup for uploaded files
//! - `Uploader` - the pipeline tying these together, generic over `EditorPlatform`

pub mod config;
pub mod error;
pub mod file;
pub mod hooks;
pub mod pipeline;
pub mod platform;
pub mod render;
pub mod response;
pub mod session;
pub mod transport;
pub mod validate;

pub use config::{AcceptRule, FilenameRewrite, UploadConfig, UploadMessages, sanitize_filename};
pub use error::UploadError;
pub use file::{FileDescriptor, RawFile, normalize, split_extension};
pub use hooks::{Completion, CompletionContext, FormatHook, HandlerOutcome, RenderCompletion, UploadHooks};
pub use pipeline::{UploadSummary, Uploader};
pub use platform::{EditorPlatform, PlatformError};
pub use render::{ContentCategory, EditorMode, RenderedResult, insert_response, render_item, render_response};
pub use response::{RESPONSE_SCHEMA_VERSION, ResponseError, UploadResponse, UploadedItem};
pub use session::{Attempt, UploadSession};
pub use transport::{
    FormField, Transport, TransportError, UPLOAD_TOKEN_HEADER, form_fields, is_success_status,
    progress_fraction, request_headers,
};
pub use validate::{ValidationOutcome, validate};

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String is infallible.
    let _ = markdown_weaver_escape::escape_html(&mut out, text);
    out
}
