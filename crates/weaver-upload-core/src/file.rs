//! File handles and normalization of raw selections.
//!
//! Browsers hand us files in several shapes: a `FileList` from an
//! `<input type="file">`, a `DataTransferItemList` from drag-and-drop or
//! paste, or a plain array. Platform layers map each entry to a [`RawFile`]
//! and [`normalize`] flattens them into an ordered list of descriptors.

/// A file selected for upload.
///
/// `H` is the platform's handle to the file bytes (`web_sys::File` in the
/// browser, `bytes::Bytes` natively). The pipeline never reads it; only the
/// transport does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDescriptor<H> {
    /// File name as reported by the platform, including extension.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, possibly empty when the platform cannot tell.
    pub mime_type: String,
    /// Opaque content handle.
    pub content: H,
}

impl<H> FileDescriptor<H> {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        content: H,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Extension including the leading dot, or `""` when the name has none.
    pub fn extension(&self) -> &str {
        split_extension(&self.name).1
    }

    /// Top-level MIME type (the part before `/`).
    pub fn top_level_type(&self) -> &str {
        self.mime_type.split('/').next().unwrap_or_default()
    }
}

/// One entry of a raw file collection, before normalization.
#[derive(Clone, Debug)]
pub enum RawFile<H> {
    /// Already a file (file input or plain array).
    File(FileDescriptor<H>),
    /// A drag/paste item; resolution yields `None` for non-file items
    /// such as dragged text.
    Item(Option<FileDescriptor<H>>),
}

impl<H> From<FileDescriptor<H>> for RawFile<H> {
    fn from(file: FileDescriptor<H>) -> Self {
        RawFile::File(file)
    }
}

impl<H> RawFile<H> {
    fn resolve(self) -> Option<FileDescriptor<H>> {
        match self {
            RawFile::File(file) => Some(file),
            RawFile::Item(item) => item,
        }
    }
}

/// Flatten a raw collection into an ordered list of files.
///
/// When `allow_multiple` is false only the first entry is looked at, so an
/// over-selection never reaches validation or the network. Items that
/// resolve to nothing are dropped.
///
/// The iterator is consumed lazily: entries past the cap are never resolved.
pub fn normalize<H, I>(raw: I, allow_multiple: bool) -> Vec<FileDescriptor<H>>
where
    I: IntoIterator<Item = RawFile<H>>,
{
    let cap = if allow_multiple { usize::MAX } else { 1 };
    raw.into_iter()
        .take(cap)
        .filter_map(RawFile::resolve)
        .collect()
}

/// Split a file name into stem and extension at the last `.`.
///
/// The extension keeps its dot. A name without a dot has an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}
