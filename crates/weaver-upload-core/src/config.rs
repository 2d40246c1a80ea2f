//! Upload configuration.
//!
//! Everything here is plain data that can be deserialized from the editor's
//! options object. Hook functions are not data; they live on
//! [`UploadHooks`](crate::UploadHooks) and [`Completion`](crate::Completion).

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::file::split_extension;

/// Default size ceiling: 10 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Default multipart field name for files.
pub const DEFAULT_FIELD_NAME: &str = "file[]";

/// Transport and acceptance settings for uploads.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadConfig {
    /// Endpoint for the default transport. Empty or missing means unconfigured.
    pub url: Option<String>,
    /// Multipart field name each file is appended under.
    pub field_name: String,
    /// Extra form fields, sent before the files in insertion order.
    pub extra_data: IndexMap<String, String>,
    /// Sent as `X-Upload-Token` when set.
    pub token: Option<String>,
    /// Send cookies/auth with cross-origin requests.
    pub with_credentials: bool,
    /// Additional request headers, applied after the token header.
    pub headers: IndexMap<String, String>,
    #[serde(flatten)]
    pub rule: AcceptRule,
    /// User-facing strings.
    pub messages: UploadMessages,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: None,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            extra_data: IndexMap::new(),
            token: None,
            with_credentials: false,
            headers: IndexMap::new(),
            rule: AcceptRule::default(),
            messages: UploadMessages::default(),
        }
    }
}

impl UploadConfig {
    /// Configured endpoint, ignoring blank values.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn has_url(&self) -> bool {
        self.url().is_some()
    }

    /// Parse from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-file acceptance rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AcceptRule {
    /// Size ceiling in bytes (inclusive).
    pub max: u64,
    /// Comma-separated accept tokens: `.ext` or MIME types like `image/*`.
    pub accept: Option<String>,
    /// Allow more than one file per upload.
    pub multiple: bool,
    #[serde(skip)]
    pub filename: FilenameRewrite,
}

impl Default for AcceptRule {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_SIZE,
            accept: None,
            multiple: true,
            filename: FilenameRewrite::default(),
        }
    }
}

impl AcceptRule {
    /// Non-empty accept tokens, trimmed. `None` if no accept list is configured.
    pub fn accept_tokens(&self) -> Option<Vec<&str>> {
        let accept = self.accept.as_deref()?.trim();
        if accept.is_empty() {
            return None;
        }
        Some(
            accept
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .collect(),
        )
    }
}

/// Rewrites the stem of a file name for display and link text.
///
/// The extension is never passed through the function; see
/// [`FilenameRewrite::display_name`].
#[derive(Clone)]
pub struct FilenameRewrite(Rc<dyn Fn(&str) -> String>);

impl FilenameRewrite {
    pub fn new(f: impl Fn(&str) -> String + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Leave names untouched.
    pub fn identity() -> Self {
        Self::new(str::to_string)
    }

    /// Apply to the stem only, keeping the extension verbatim.
    pub fn display_name(&self, name: &str) -> String {
        let (stem, ext) = split_extension(name);
        let mut out = (self.0)(stem);
        out.push_str(ext);
        out
    }
}

impl Default for FilenameRewrite {
    fn default() -> Self {
        Self::new(sanitize_filename)
    }
}

impl fmt::Debug for FilenameRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilenameRewrite(..)")
    }
}

/// Default stem rewrite: keep ASCII word characters (`[A-Za-z0-9_]`).
pub fn sanitize_filename(stem: &str) -> String {
    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Strings shown on the diagnostic surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadMessages {
    pub name_empty: String,
    pub over: String,
    pub file_type_error: String,
    pub uploading: String,
    pub upload_error: String,
    pub missing_url: String,
    pub already_uploading: String,
}

impl Default for UploadMessages {
    fn default() -> Self {
        Self {
            name_empty: "name empty".to_string(),
            over: "over".to_string(),
            file_type_error: "file type error".to_string(),
            uploading: "uploading".to_string(),
            upload_error: "upload error".to_string(),
            missing_url: "please config: options.upload.url".to_string(),
            already_uploading: "an upload is already in progress".to_string(),
        }
    }
}
