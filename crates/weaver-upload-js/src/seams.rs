//! Pipeline seams backed by JS hooks.
//!
//! Each adapter checks its hook slot when the pipeline reaches it and falls
//! back to the built-in behaviour when the slot is empty.

use std::future::Future;
use std::rc::Rc;

use js_sys::{Array, Function, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::File;
use weaver_upload_browser::{
    BrowserSurface, Completion, CompletionContext, EditorPlatform, FileDescriptor,
    HandlerOutcome, PlatformError, RenderCompletion, Transport, TransportError, UploadConfig,
    UploadError, UploadHooks, XhrTransport, descriptor, escape_html, relay_progress,
};

use crate::callbacks::{
    JsCallbacks, call_async, current, describe, files_array, response_text,
};
use crate::types::JsTip;

/// `handler`, `file` and `validate` hooks.
pub(crate) struct JsHooks {
    callbacks: Rc<JsCallbacks>,
}

impl JsHooks {
    pub fn new(callbacks: Rc<JsCallbacks>) -> Self {
        Self { callbacks }
    }
}

impl UploadHooks<File> for JsHooks {
    fn handle(&self, files: &[FileDescriptor<File>]) -> impl Future<Output = HandlerOutcome> {
        let handler = current(&self.callbacks.handler);
        let args = files_array(files);
        async move {
            let Some(handler) = handler else {
                return HandlerOutcome::Declined;
            };
            match call_async(&handler, &args).await {
                Ok(value) => match value.as_string() {
                    Some(message) if !message.is_empty() => HandlerOutcome::Rejected(message),
                    _ => HandlerOutcome::Handled,
                },
                Err(e) => HandlerOutcome::Rejected(escape_html(&describe(&e))),
            }
        }
    }

    fn transform(
        &self,
        files: Vec<FileDescriptor<File>>,
    ) -> impl Future<Output = Vec<FileDescriptor<File>>> {
        let hook = current(&self.callbacks.file);
        async move {
            let Some(hook) = hook else {
                return files;
            };
            match call_async(&hook, &files_array(&files)).await {
                Ok(value) if Array::is_array(&value) => Array::from(&value)
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<File>().ok())
                    .map(descriptor)
                    .collect(),
                Ok(_) => {
                    tracing::warn!(target: "weaver::upload", "file hook did not return an array; keeping input");
                    files
                }
                Err(e) => {
                    tracing::warn!(target: "weaver::upload", "file hook threw: {}", describe(&e));
                    files
                }
            }
        }
    }

    fn validate(&self, files: &[FileDescriptor<File>]) -> Result<(), String> {
        let Some(hook) = current(&self.callbacks.validate) else {
            return Ok(());
        };
        match hook.call1(&JsValue::NULL, &files_array(files)) {
            Ok(value) => value.as_string().map_or(Ok(()), Err),
            Err(e) => Err(escape_html(&describe(&e))),
        }
    }
}

/// XHR upload, or the `customUploader` hook when set.
pub(crate) struct JsTransport {
    callbacks: Rc<JsCallbacks>,
}

impl JsTransport {
    pub fn new(callbacks: Rc<JsCallbacks>) -> Self {
        Self { callbacks }
    }
}

impl Transport<File> for JsTransport {
    type Response = JsValue;

    fn requires_url(&self) -> bool {
        self.callbacks.custom_uploader.borrow().is_none()
    }

    fn send(
        &self,
        files: &[FileDescriptor<File>],
        config: &UploadConfig,
        on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<JsValue, TransportError>> {
        let custom = current(&self.callbacks.custom_uploader);
        async move {
            match custom {
                Some(uploader) => custom_upload(&uploader, &files_array(files), on_progress).await,
                None => XhrTransport
                    .send(files, config, on_progress)
                    .await
                    .map(JsValue::from),
            }
        }
    }
}

/// `customUploader(files, onProgress)`; the returned value or promise is the response.
async fn custom_upload(
    uploader: &Function,
    files: &Array,
    on_progress: &dyn Fn(f64),
) -> Result<JsValue, TransportError> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let report = Closure::<dyn FnMut(f64)>::new(move |fraction: f64| {
        let _ = tx.send(fraction);
    });

    let returned = uploader
        .call2(&JsValue::NULL, files, report.as_ref())
        .map_err(|e| TransportError::Rejected(describe(&e)))?;
    let result = relay_progress(JsFuture::from(Promise::resolve(&returned)), rx, on_progress).await;
    drop(report);

    result.map_err(|e| TransportError::Rejected(describe(&e)))
}

/// `success`, `format`, `customUploaderCompleted` and `error` hooks around
/// the default renderer.
///
/// `success` replaces everything else. Otherwise the response goes through
/// `format` and then to `customUploaderCompleted` or the renderer.
pub(crate) struct JsCompletion {
    callbacks: Rc<JsCallbacks>,
}

impl JsCompletion {
    pub fn new(callbacks: Rc<JsCallbacks>) -> Self {
        Self { callbacks }
    }
}

fn hook_failed(
    cx: &CompletionContext<'_, BrowserSurface, File>,
    name: &str,
    e: &JsValue,
) -> UploadError {
    let message = describe(e);
    tracing::warn!(target: "weaver::upload", hook = name, "completion hook threw: {}", message);
    cx.platform.show_tip(&escape_html(&message));
    PlatformError(message).into()
}

impl Completion<BrowserSurface, File, JsValue> for JsCompletion {
    fn complete(
        &self,
        cx: &CompletionContext<'_, BrowserSurface, File>,
        response: JsValue,
    ) -> Result<(), UploadError> {
        if let Some(success) = current(&self.callbacks.success) {
            success
                .call2(
                    &JsValue::NULL,
                    cx.platform.root(),
                    &JsValue::from_str(&response_text(&response)),
                )
                .map_err(|e| hook_failed(cx, "success", &e))?;
            return Ok(());
        }

        let response = match current(&self.callbacks.format) {
            Some(format) => format
                .call2(&JsValue::NULL, &files_array(cx.files), &response)
                .map_err(|e| hook_failed(cx, "format", &e))?,
            None => response,
        };

        if let Some(done) = current(&self.callbacks.custom_uploader_completed) {
            cx.platform.focus();
            let tip = JsTip::new(cx.platform.tip().clone());
            done.call2(&JsValue::NULL, &response, &tip.into())
                .map_err(|e| hook_failed(cx, "customUploaderCompleted", &e))?;
            return Ok(());
        }

        RenderCompletion::new().render(cx, response_text(&response))
    }

    fn fail(&self, cx: &CompletionContext<'_, BrowserSurface, File>, error: &TransportError) {
        let message = error.to_string();
        match current(&self.callbacks.error) {
            Some(hook) => {
                if let Err(e) = hook.call1(&JsValue::NULL, &JsValue::from_str(&message)) {
                    hook_failed(cx, "error", &e);
                }
            }
            None => cx.platform.show_tip(&escape_html(&message)),
        }
    }
}
