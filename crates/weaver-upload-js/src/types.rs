//! Types exposed to JavaScript via wasm-bindgen.

use serde::Serialize;
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;
use weaver_upload_browser::{BrowserTip, UploadError, UploadSummary};

/// How an `upload()` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Tsify)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    /// Files went through the transport and the result was handled.
    Uploaded,
    /// The `handler` hook took the batch.
    Delegated,
    /// Stopped early or failed; details are in `error` and on the tooltip.
    Failed,
}

/// Resolution value of `JsUploader.upload()`.
#[derive(Debug, Clone, Serialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub status: UploadStatus,
    pub accepted: usize,
    pub rejected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<UploadSummary, UploadError>> for UploadResult {
    fn from(result: Result<UploadSummary, UploadError>) -> Self {
        match result {
            Ok(UploadSummary::Uploaded { accepted, rejected }) => Self {
                status: UploadStatus::Uploaded,
                accepted,
                rejected,
                error: None,
            },
            Ok(UploadSummary::Delegated { files }) => Self {
                status: UploadStatus::Delegated,
                accepted: files,
                rejected: 0,
                error: None,
            },
            Err(e) => Self {
                status: UploadStatus::Failed,
                accepted: 0,
                rejected: match e {
                    UploadError::NothingAccepted { rejected } => rejected,
                    _ => 0,
                },
                error: Some(e.to_string()),
            },
        }
    }
}

/// Tooltip handle passed to `customUploaderCompleted`.
#[wasm_bindgen]
pub struct JsTip {
    tip: BrowserTip,
}

impl JsTip {
    pub(crate) fn new(tip: BrowserTip) -> Self {
        Self { tip }
    }
}

#[wasm_bindgen]
impl JsTip {
    /// Show HTML on the tooltip.
    pub fn show(&self, html: &str) {
        self.tip.show(html);
    }

    pub fn hide(&self) {
        self.tip.hide();
    }
}
