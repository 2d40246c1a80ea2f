//! Browser layer for weaver file uploads.
//!
//! This crate binds the upload pipeline from `weaver-upload-core` to the
//! DOM. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `files`: `FileList` / `DataTransferItemList` / array extraction
//! - `cursor`: Selection API capture and restore of the insertion range
//! - `surface`: `EditorPlatform` over a contenteditable root, tooltip and progress bar
//! - `xhr`: multipart `XMLHttpRequest` transport with upload progress
//! - `logging`: console tracing and panic hook for wasm entry points
//!
//! # Re-exports
//!
//! This crate re-exports `weaver-upload-core` for convenience, so consumers
//! only need to depend on `weaver-upload-browser`.

// Re-export core crate
pub use weaver_upload_core;
pub use weaver_upload_core::*;

pub mod cursor;
pub mod files;
pub mod logging;
pub mod surface;
pub mod xhr;

pub use files::{
    descriptor, files_from_data_transfer, files_from_items, files_from_js, files_from_list,
};
pub use logging::{DEFAULT_LOG_FILTER, init_logging};
pub use surface::{BrowserSurface, BrowserTip};
pub use xhr::{XhrTransport, relay_progress};

/// Uploader wired to the DOM surface and the XHR transport.
pub type BrowserUploader<C, K = ()> = Uploader<BrowserSurface, XhrTransport, C, K>;
