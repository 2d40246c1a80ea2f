//! Response schema shared by the default transport and result renderer.
//!
//! ```json
//! {
//!   "version": 1,
//!   "code": 0,
//!   "msg": "",
//!   "data": {
//!     "errFiles": ["b.txt"],
//!     "succMap": {"a.png": "/u/a.png"},
//!     "files": [{"originalKey": "a.png", "storagePath": "/u/a.png"}]
//!   }
//! }
//! ```
//!
//! `files` is optional. When present it fixes the insertion order; otherwise
//! `succMap` is used in document order.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Highest schema version this crate understands.
pub const RESPONSE_SCHEMA_VERSION: u32 = 1;

/// Errors decoding an upload response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ResponseError {
    /// Body is not a JSON document of the expected shape.
    #[error("malformed upload response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Server speaks a newer schema.
    #[error("unsupported upload response version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default = "default_version")]
    pub version: u32,
    /// 0 for success; anything else marks the batch as failed.
    #[serde(default)]
    pub code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: UploadResponseData,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponseData {
    /// Original key -> storage path, in document order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub succ_map: IndexMap<String, String>,
    /// Original keys of files the server refused.
    #[serde(default, deserialize_with = "null_as_default")]
    pub err_files: Vec<String>,
    /// Explicitly ordered successes. Takes precedence over `succ_map`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<UploadedItem>>,
}

/// A file the server stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedItem {
    pub original_key: String,
    pub storage_path: String,
}

fn default_version() -> u32 {
    RESPONSE_SCHEMA_VERSION
}

/// Servers that serialize empty collections as `null` decode the same as
/// servers that omit the key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl UploadResponse {
    /// Decode and check the schema version.
    pub fn parse(raw: &str) -> Result<Self, ResponseError> {
        let response: Self = serde_json::from_str(raw)?;
        if response.version > RESPONSE_SCHEMA_VERSION {
            return Err(ResponseError::UnsupportedVersion {
                found: response.version,
                supported: RESPONSE_SCHEMA_VERSION,
            });
        }
        Ok(response)
    }

    pub fn is_failure(&self) -> bool {
        self.code != 0
    }

    /// Stored files in insertion order.
    pub fn uploaded(&self) -> Vec<UploadedItem> {
        match &self.data.files {
            Some(files) => files.clone(),
            None => self
                .data
                .succ_map
                .iter()
                .map(|(key, path)| UploadedItem {
                    original_key: key.clone(),
                    storage_path: path.clone(),
                })
                .collect(),
        }
    }
}
