//! WASM bindings for weaver editor file uploads.
//!
//! Exposes [`JsUploader`]: one upload pipeline per editor root, configured
//! from the editor's `upload` options object, with optional JS hooks for
//! every stage.

mod callbacks;
mod seams;
mod types;
mod uploader;

pub use types::*;
pub use uploader::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    weaver_upload_browser::init_logging(weaver_upload_browser::DEFAULT_LOG_FILTER);
}
