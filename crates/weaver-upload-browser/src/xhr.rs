//! Multipart upload over `XMLHttpRequest`.
//!
//! XHR is used instead of `fetch` because only XHR reports upload progress.
//! DOM callbacks must be `'static`, so progress events are relayed through
//! a channel to the borrowed `on_progress` callback while the request runs.

use std::future::Future;
use std::pin::pin;

use tokio::sync::{mpsc, oneshot};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{File, FormData, ProgressEvent, XmlHttpRequest};
use weaver_upload_core::{
    FileDescriptor, FormField, Transport, TransportError, UploadConfig, form_fields,
    is_success_status, progress_fraction, request_headers,
};

/// Default transport: `POST` of a `multipart/form-data` body.
///
/// Resolves with the response text on 2xx; anything else is a
/// [`TransportError`].
#[derive(Clone, Copy, Debug, Default)]
pub struct XhrTransport;

impl Transport<File> for XhrTransport {
    type Response = String;

    fn send(
        &self,
        files: &[FileDescriptor<File>],
        config: &UploadConfig,
        on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<String, TransportError>> {
        let prepared = prepare(files, config);
        async move {
            let (xhr, form) = prepared?;
            post(&xhr, &form, on_progress).await
        }
    }
}

/// Build the request and body without sending.
fn prepare(
    files: &[FileDescriptor<File>],
    config: &UploadConfig,
) -> Result<(XmlHttpRequest, FormData), TransportError> {
    let url = config
        .url()
        .ok_or_else(|| TransportError::Network("upload url is not configured".into()))?;

    let form = FormData::new().map_err(js_error)?;
    for field in form_fields(files, config) {
        match field {
            FormField::Text { name, value } => form.append_with_str(name, value),
            FormField::File { name, file } => {
                form.append_with_blob_and_filename(name, &file.content, &file.name)
            }
        }
        .map_err(js_error)?;
    }

    let xhr = XmlHttpRequest::new().map_err(js_error)?;
    xhr.open_with_async("POST", url, true).map_err(js_error)?;
    xhr.set_with_credentials(config.with_credentials);
    for (name, value) in request_headers(config) {
        xhr.set_request_header(name, value).map_err(js_error)?;
    }
    Ok((xhr, form))
}

async fn post(
    xhr: &XmlHttpRequest,
    form: &FormData,
    on_progress: &dyn Fn(f64),
) -> Result<String, TransportError> {
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel::<()>();

    let on_upload_progress = Closure::<dyn FnMut(ProgressEvent)>::new(move |e: ProgressEvent| {
        if let Some(fraction) = progress_fraction(e.loaded(), e.total(), e.length_computable()) {
            let _ = progress_tx.send(fraction);
        }
    });
    let mut done_tx = Some(done_tx);
    let on_load_end = Closure::<dyn FnMut()>::new(move || {
        if let Some(tx) = done_tx.take() {
            let _ = tx.send(());
        }
    });

    let upload = xhr.upload().map_err(js_error)?;
    upload.set_onprogress(Some(on_upload_progress.as_ref().unchecked_ref()));
    xhr.set_onloadend(Some(on_load_end.as_ref().unchecked_ref()));

    let sent = xhr.send_with_opt_form_data(Some(form));
    if let Err(e) = sent {
        upload.set_onprogress(None);
        xhr.set_onloadend(None);
        return Err(js_error(e));
    }

    let _ = relay_progress(done_rx, progress_rx, on_progress).await;

    upload.set_onprogress(None);
    xhr.set_onloadend(None);

    let status = xhr.status().map_err(js_error)?;
    if status == 0 {
        tracing::debug!(target: "weaver::upload", "request ended without a status");
        return Err(TransportError::Network("network error".into()));
    }

    let body = xhr.response_text().ok().flatten().unwrap_or_default();
    if is_success_status(status) {
        tracing::debug!(target: "weaver::upload", status, bytes = body.len(), "upload request completed");
        Ok(body)
    } else {
        Err(TransportError::Status { status, body })
    }
}

/// Drive `work` to completion, forwarding fractions from `progress` to
/// `on_progress` as they arrive. Fractions still queued when `work`
/// finishes are delivered before returning.
pub async fn relay_progress<T>(
    work: impl Future<Output = T>,
    mut progress: mpsc::UnboundedReceiver<f64>,
    on_progress: &dyn Fn(f64),
) -> T {
    let mut work = pin!(work);
    loop {
        tokio::select! {
            biased;
            Some(fraction) = progress.recv() => on_progress(fraction),
            out = &mut work => {
                while let Ok(fraction) = progress.try_recv() {
                    on_progress(fraction);
                }
                return out;
            }
        }
    }
}

fn js_error(e: JsValue) -> TransportError {
    TransportError::Network(format!("{e:?}"))
}
