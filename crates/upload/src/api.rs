//! Transport seam between the upload driver and the remote store.

use std::future::Future;
use std::pin::Pin;

use shelf_protocol::upload::{AsyncResultResponse, CompleteResponse, InitUploadRequest, InitUploadResponse};

use crate::error::UploadError;

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Abstract remote store.
///
/// The CLI implements this on top of `shelf-client`'s `ApiClient`;
/// tests use scripted mocks. Using a trait keeps protocol-driving
/// logic decoupled from transport.
pub trait StorageApi: Send + Sync {
    /// Opens an upload session (or dedups by digest).
    fn init_upload<'a>(&'a self, req: &'a InitUploadRequest) -> ApiFuture<'a, InitUploadResponse>;

    /// Returns the presigned destination URL for one slice.
    fn slice_url<'a>(&'a self, preupload_id: &'a str, slice_no: i64) -> ApiFuture<'a, String>;

    /// Transfers one slice body to its presigned destination.
    fn put_slice<'a>(&'a self, url: &'a str, data: Vec<u8>) -> ApiFuture<'a, ()>;

    /// Finalizes the session.
    fn complete<'a>(&'a self, preupload_id: &'a str) -> ApiFuture<'a, CompleteResponse>;

    /// Polls the result of an asynchronously finalized session.
    fn poll_result<'a>(&'a self, preupload_id: &'a str) -> ApiFuture<'a, AsyncResultResponse>;
}
