//! Request and response bodies for the slice-upload protocol.
//!
//! Field names follow the server's JSON exactly; the `ID` suffixes are
//! not derivable from `rename_all = "camelCase"`, hence the explicit
//! renames.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-side policy when the target filename already exists.
///
/// Serialized as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep both files; the new one gets a suffix.
    KeepBoth,
    /// Overwrite the existing file.
    #[default]
    Overwrite,
}

impl DuplicatePolicy {
    fn code(self) -> i64 {
        match self {
            DuplicatePolicy::KeepBoth => 1,
            DuplicatePolicy::Overwrite => 2,
        }
    }
}

impl Serialize for DuplicatePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for DuplicatePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i64::deserialize(deserializer)? {
            1 => Ok(DuplicatePolicy::KeepBoth),
            2 => Ok(DuplicatePolicy::Overwrite),
            other => Err(D::Error::custom(format!(
                "invalid duplicate policy: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Token exchange
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRequest {
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

// ---------------------------------------------------------------------------
// Upload session
// ---------------------------------------------------------------------------

/// Opens an upload session for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitUploadRequest {
    #[serde(rename = "parentFileID")]
    pub parent_file_id: i64,
    pub filename: String,
    /// Hex-encoded 128-bit content digest, the dedup key.
    pub etag: String,
    pub size: i64,
    pub duplicate: DuplicatePolicy,
    #[serde(rename = "containDir")]
    pub contain_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitUploadResponse {
    /// True when the server already stores content with this digest;
    /// no slice traffic follows.
    #[serde(default)]
    pub reuse: bool,
    #[serde(rename = "preuploadID", default)]
    pub preupload_id: String,
    /// Dictates all subsequent chunking for this session.
    #[serde(rename = "sliceSize", default)]
    pub slice_size: i64,
    #[serde(rename = "fileID", default)]
    pub file_id: i64,
}

/// Requests the presigned destination for one slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceUrlRequest {
    #[serde(rename = "preuploadID")]
    pub preupload_id: String,
    /// 1-based, strictly sequential.
    #[serde(rename = "sliceNo")]
    pub slice_no: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceUrlResponse {
    #[serde(rename = "presignedURL")]
    pub presigned_url: String,
}

/// Finalizes an upload session; also the poll-result request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteRequest {
    #[serde(rename = "preuploadID")]
    pub preupload_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteResponse {
    /// True when the server defers finalization; the client must poll.
    #[serde(rename = "async", default)]
    pub is_async: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "fileID", default)]
    pub file_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncResultResponse {
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "fileID", default)]
    pub file_id: i64,
}
