//! JS hook slots and calling helpers.

use std::cell::RefCell;

use js_sys::{Array, Function, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::File;
use weaver_upload_core::FileDescriptor;

/// Hook functions set from JS. Each slot can be replaced or cleared at any
/// time; the pipeline reads the current value when it reaches that stage.
#[derive(Default)]
pub(crate) struct JsCallbacks {
    pub handler: RefCell<Option<Function>>,
    pub file: RefCell<Option<Function>>,
    pub validate: RefCell<Option<Function>>,
    pub filename: RefCell<Option<Function>>,
    pub format: RefCell<Option<Function>>,
    pub success: RefCell<Option<Function>>,
    pub error: RefCell<Option<Function>>,
    pub custom_uploader: RefCell<Option<Function>>,
    pub custom_uploader_completed: RefCell<Option<Function>>,
}

pub(crate) fn current(slot: &RefCell<Option<Function>>) -> Option<Function> {
    slot.borrow().clone()
}

/// The `File` handles as a JS array, in order.
pub(crate) fn files_array(files: &[FileDescriptor<File>]) -> Array {
    files.iter().map(|f| f.content.clone()).collect()
}

/// Resolve a hook's return value, awaiting it if it is a promise or thenable.
pub(crate) async fn settle(value: JsValue) -> Result<JsValue, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(value);
    }
    JsFuture::from(Promise::resolve(&value)).await
}

/// Call `hook(arg)` and settle the result.
pub(crate) async fn call_async(hook: &Function, arg: &JsValue) -> Result<JsValue, JsValue> {
    settle(hook.call1(&JsValue::NULL, arg)?).await
}

/// Human-readable message for a thrown value.
pub(crate) fn describe(e: &JsValue) -> String {
    if let Some(s) = e.as_string() {
        return s;
    }
    if let Some(err) = e.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{e:?}")
}

/// A response as text: strings pass through, anything else is JSON-encoded.
pub(crate) fn response_text(response: &JsValue) -> String {
    if let Some(s) = response.as_string() {
        return s;
    }
    js_sys::JSON::stringify(response)
        .map(String::from)
        .unwrap_or_default()
}
