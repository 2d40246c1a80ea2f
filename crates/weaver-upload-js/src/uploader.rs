//! JsUploader - the upload pipeline wrapper for JavaScript.

use std::rc::Rc;

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{HtmlElement, HtmlInputElement};
use weaver_upload_browser::{
    BrowserSurface, EditorMode, FilenameRewrite, UploadConfig, Uploader, files_from_js,
    sanitize_filename,
};

use crate::callbacks::{JsCallbacks, current};
use crate::seams::{JsCompletion, JsHooks, JsTransport};
use crate::types::UploadResult;

type InnerUploader = Uploader<BrowserSurface, JsTransport, JsCompletion, JsHooks>;

/// File uploads for one editor instance.
///
/// Holds the editor's upload session: while an upload is in flight the
/// root is not editable and further `upload()` calls resolve as failed.
#[wasm_bindgen]
pub struct JsUploader {
    inner: Rc<InnerUploader>,
    callbacks: Rc<JsCallbacks>,
}

#[wasm_bindgen]
impl JsUploader {
    /// Create an uploader for `root`, reporting on `tip`.
    ///
    /// `config` is the `upload` options object (`url`, `max`, `accept`,
    /// `multiple`, `fieldName`, `extraData`, `token`, `withCredentials`,
    /// `headers`, `messages`). Missing keys take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(root: HtmlElement, tip: HtmlElement, config: JsValue) -> Result<JsUploader, JsError> {
        let mut config = parse_config(&config)?;

        let callbacks = Rc::new(JsCallbacks::default());
        config.rule.filename = filename_rewrite(callbacks.clone());

        let inner = Uploader::new(
            BrowserSurface::new(root, tip),
            JsTransport::new(callbacks.clone()),
            JsCompletion::new(callbacks.clone()),
            config,
        )
        .with_hooks(JsHooks::new(callbacks.clone()));

        Ok(Self {
            inner: Rc::new(inner),
            callbacks,
        })
    }

    /// Upload a `FileList`, `DataTransfer`, `DataTransferItemList` or `File[]`.
    ///
    /// Resolves with an `UploadResult`; rejects only if `files` is not a
    /// supported collection.
    pub fn upload(&self, files: JsValue, from_file_input: Option<bool>) -> Promise {
        let raw = match files_from_js(&files) {
            Ok(raw) => raw,
            Err(e) => return Promise::reject(&JsError::new(&e.to_string()).into()),
        };
        let inner = self.inner.clone();
        let from_file_input = from_file_input.unwrap_or(false);

        future_to_promise(async move {
            let result = UploadResult::from(inner.run(raw, from_file_input).await);
            serde_wasm_bindgen::to_value(&result).map_err(Into::into)
        })
    }

    /// Upload the current selection of a file input and clear it afterwards.
    #[wasm_bindgen(js_name = uploadFromInput)]
    pub fn upload_from_input(&self, input: HtmlInputElement) -> Promise {
        let files = input
            .files()
            .map(JsValue::from)
            .unwrap_or_else(|| js_sys::Array::new().into());
        if self.inner.is_uploading() {
            // The input slot belongs to the upload in flight; this call is
            // refused, so clear its own input here.
            input.set_value("");
            return self.upload(files, Some(false));
        }
        self.inner.platform().set_file_input(Some(input));
        self.upload(files, Some(true))
    }

    /// Whether an upload is in flight.
    #[wasm_bindgen(js_name = isUploading)]
    pub fn is_uploading(&self) -> bool {
        self.inner.is_uploading()
    }

    /// Switch the editing mode used for rendering results.
    ///
    /// Accepts `source`/`sv`, `wysiwyg` and `instant-render`/`ir`.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&self, mode: &str) -> Result<(), JsError> {
        let mode =
            EditorMode::parse(mode).ok_or_else(|| JsError::new(&format!("Unknown mode: {mode}")))?;
        self.inner.platform().set_mode(mode);
        Ok(())
    }

    /// Element whose width tracks upload progress.
    #[wasm_bindgen(js_name = setProgressElement)]
    pub fn set_progress_element(&self, element: Option<HtmlElement>) {
        self.inner.platform().set_progress_element(element);
    }

    /// File input cleared when an input-triggered upload ends.
    #[wasm_bindgen(js_name = setFileInput)]
    pub fn set_file_input(&self, input: Option<HtmlInputElement>) {
        self.inner.platform().set_file_input(input);
    }

    // === Hooks ===

    /// Take over uploads entirely.
    ///
    /// Called with: File[]
    /// Should return: string | null | Promise<string | null>. A string is
    /// shown on the tooltip.
    #[wasm_bindgen(js_name = setHandler)]
    pub fn set_handler(&self, callback: Option<Function>) {
        *self.callbacks.handler.borrow_mut() = callback;
    }

    /// Rewrite files before validation.
    ///
    /// Called with: File[]
    /// Should return: File[] | Promise<File[]>
    #[wasm_bindgen(js_name = setFile)]
    pub fn set_file(&self, callback: Option<Function>) {
        *self.callbacks.file.borrow_mut() = callback;
    }

    /// Veto a batch.
    ///
    /// Called with: File[]
    /// Should return: true, or a message to show and stop.
    #[wasm_bindgen(js_name = setValidate)]
    pub fn set_validate(&self, callback: Option<Function>) {
        *self.callbacks.validate.borrow_mut() = callback;
    }

    /// Rewrite file name stems for display and link text.
    ///
    /// Called with: string (name without extension)
    /// Should return: string
    #[wasm_bindgen(js_name = setFilename)]
    pub fn set_filename(&self, callback: Option<Function>) {
        *self.callbacks.filename.borrow_mut() = callback;
    }

    /// Rewrite the response before it is rendered or handed to
    /// `customUploaderCompleted`. Not called when `success` is set.
    ///
    /// Called with: (File[], response)
    /// Should return: the rewritten response
    #[wasm_bindgen(js_name = setFormat)]
    pub fn set_format(&self, callback: Option<Function>) {
        *self.callbacks.format.borrow_mut() = callback;
    }

    /// Handle a successful response. Takes precedence over `format`,
    /// `customUploaderCompleted` and the default renderer.
    ///
    /// Called with: (HTMLElement root, string response)
    #[wasm_bindgen(js_name = setSuccess)]
    pub fn set_success(&self, callback: Option<Function>) {
        *self.callbacks.success.borrow_mut() = callback;
    }

    /// Handle a transport failure instead of the tooltip.
    ///
    /// Called with: string message
    #[wasm_bindgen(js_name = setError)]
    pub fn set_error(&self, callback: Option<Function>) {
        *self.callbacks.error.borrow_mut() = callback;
    }

    /// Replace the XHR transport. No `url` is needed while set.
    ///
    /// Called with: (File[], onProgress: (fraction: number) => void)
    /// Should return: any | Promise<any>. Rejection is a failed upload.
    #[wasm_bindgen(js_name = setCustomUploader)]
    pub fn set_custom_uploader(&self, callback: Option<Function>) {
        *self.callbacks.custom_uploader.borrow_mut() = callback;
    }

    /// Consume responses instead of the default renderer. The root is
    /// focused first.
    ///
    /// Called with: (response after `format`, JsTip)
    #[wasm_bindgen(js_name = setCustomUploaderCompleted)]
    pub fn set_custom_uploader_completed(&self, callback: Option<Function>) {
        *self.callbacks.custom_uploader_completed.borrow_mut() = callback;
    }
}

/// Options objects go through JSON so flattened keys and integer sizes
/// decode the same way as a JSON config file.
fn parse_config(value: &JsValue) -> Result<UploadConfig, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(UploadConfig::default());
    }
    let json = js_sys::JSON::stringify(value)
        .map(String::from)
        .map_err(|e| JsError::new(&format!("Invalid upload config: {:?}", e)))?;
    UploadConfig::from_json(&json).map_err(|e| JsError::new(&format!("Invalid upload config: {}", e)))
}

/// Defer to the JS `filename` hook when set, else the default sanitizer.
fn filename_rewrite(callbacks: Rc<JsCallbacks>) -> FilenameRewrite {
    FilenameRewrite::new(move |stem| match current(&callbacks.filename) {
        Some(hook) => hook
            .call1(&JsValue::NULL, &JsValue::from_str(stem))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| sanitize_filename(stem)),
        None => sanitize_filename(stem),
    })
}
