//! Bridges the upload engine's `StorageApi` seam to the real HTTP
//! client.

use shelf_client::{ApiClient, ClientError};
use shelf_protocol::endpoints;
use shelf_protocol::upload::{
    AsyncResultResponse, CompleteRequest, CompleteResponse, InitUploadRequest, InitUploadResponse,
    SliceUrlRequest, SliceUrlResponse,
};
use shelf_upload::{ApiFuture, StorageApi, UploadError};

/// `StorageApi` implementation over the authenticated API client.
pub struct RemoteStore {
    client: ApiClient,
}

impl RemoteStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl StorageApi for RemoteStore {
    fn init_upload<'a>(&'a self, req: &'a InitUploadRequest) -> ApiFuture<'a, InitUploadResponse> {
        Box::pin(async move {
            self.client
                .post(endpoints::FILE_CREATE, req)
                .await
                .map_err(|e| UploadError::Init(e.to_string()))
        })
    }

    fn slice_url<'a>(&'a self, preupload_id: &'a str, slice_no: i64) -> ApiFuture<'a, String> {
        Box::pin(async move {
            let req = SliceUrlRequest {
                preupload_id: preupload_id.to_string(),
                slice_no,
            };
            let resp: SliceUrlResponse = self
                .client
                .post(endpoints::GET_UPLOAD_URL, &req)
                .await
                .map_err(|e| UploadError::SliceUrl(e.to_string()))?;
            Ok(resp.presigned_url)
        })
    }

    fn put_slice<'a>(&'a self, url: &'a str, data: Vec<u8>) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.client.upload_slice(url, data).await.map_err(|e| match e {
                ClientError::SliceStatus(status) => UploadError::SliceTransfer { status },
                other => UploadError::SliceSend(other.to_string()),
            })
        })
    }

    fn complete<'a>(&'a self, preupload_id: &'a str) -> ApiFuture<'a, CompleteResponse> {
        Box::pin(async move {
            let req = CompleteRequest {
                preupload_id: preupload_id.to_string(),
            };
            self.client
                .post(endpoints::UPLOAD_COMPLETE, &req)
                .await
                .map_err(|e| UploadError::Complete(e.to_string()))
        })
    }

    fn poll_result<'a>(&'a self, preupload_id: &'a str) -> ApiFuture<'a, AsyncResultResponse> {
        Box::pin(async move {
            let req = CompleteRequest {
                preupload_id: preupload_id.to_string(),
            };
            self.client
                .post(endpoints::UPLOAD_ASYNC_RESULT, &req)
                .await
                .map_err(|e| UploadError::Poll(e.to_string()))
        })
    }
}
