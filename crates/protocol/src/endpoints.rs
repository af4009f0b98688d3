//! Relative paths of the Shelf open API endpoints.
//!
//! All calls are POSTs against the configured base URL.

/// Exchanges client credentials for a bearer token.
pub const ACCESS_TOKEN: &str = "/api/v1/access_token";

/// Creates an upload session (or dedups by content digest).
pub const FILE_CREATE: &str = "/upload/v1/file/create";

/// Returns the presigned destination for one slice.
pub const GET_UPLOAD_URL: &str = "/upload/v1/file/get_upload_url";

/// Finalizes an upload session.
pub const UPLOAD_COMPLETE: &str = "/upload/v1/file/upload_complete";

/// Polls the result of an asynchronously finalized upload.
pub const UPLOAD_ASYNC_RESULT: &str = "/upload/v1/file/upload_async_result";
