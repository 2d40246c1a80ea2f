//! Extract raw file collections from browser objects.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DataTransfer, DataTransferItemList, File, FileList};
use weaver_upload_core::{FileDescriptor, PlatformError, RawFile};

/// Describe a browser `File`. The handle itself is kept for the transport.
pub fn descriptor(file: File) -> FileDescriptor<File> {
    FileDescriptor::new(file.name(), file.size() as u64, file.type_(), file)
}

/// Entries of an `<input type="file">` selection.
pub fn files_from_list(list: &FileList) -> Vec<RawFile<File>> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|file| RawFile::File(descriptor(file)))
        .collect()
}

/// Entries of a drop or paste. Non-file items (dragged text, HTML) resolve
/// to `RawFile::Item(None)`.
pub fn files_from_items(items: &DataTransferItemList) -> Vec<RawFile<File>> {
    (0..items.length())
        .filter_map(|i| items.get(i))
        .map(|item| {
            let file = if item.kind() == "file" {
                item.get_as_file().ok().flatten()
            } else {
                None
            };
            RawFile::Item(file.map(descriptor))
        })
        .collect()
}

/// Prefer the item list; fall back to `files` on browsers without one.
pub fn files_from_data_transfer(dt: &DataTransfer) -> Vec<RawFile<File>> {
    let items = dt.items();
    if items.length() > 0 {
        return files_from_items(&items);
    }
    dt.files().map(|list| files_from_list(&list)).unwrap_or_default()
}

/// Accept a `FileList`, a `DataTransferItemList`, a `DataTransfer` or an
/// array of `File`s. Array entries that are not files occupy a slot but
/// resolve to nothing.
pub fn files_from_js(value: &JsValue) -> Result<Vec<RawFile<File>>, PlatformError> {
    if let Some(list) = value.dyn_ref::<FileList>() {
        return Ok(files_from_list(list));
    }
    if let Some(items) = value.dyn_ref::<DataTransferItemList>() {
        return Ok(files_from_items(items));
    }
    if let Some(dt) = value.dyn_ref::<DataTransfer>() {
        return Ok(files_from_data_transfer(dt));
    }
    if let Some(file) = value.dyn_ref::<File>() {
        return Ok(vec![RawFile::File(descriptor(file.clone()))]);
    }
    if js_sys::Array::is_array(value) {
        let array: &js_sys::Array = value.unchecked_ref();
        return Ok(array
            .iter()
            .map(|entry| RawFile::Item(entry.dyn_into::<File>().ok().map(descriptor)))
            .collect());
    }
    Err(format!("expected FileList, DataTransferItemList or File[], got {value:?}").into())
}
