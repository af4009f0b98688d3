//! Per-file upload protocol driver.
//!
//! Drives one task to a terminal outcome: digest → init (dedup
//! check) → sequential slice loop → completion → optional bounded
//! async-result polling. Any step failure aborts the whole attempt;
//! there is no partial resume within an attempt.

use std::time::Duration;

use shelf_protocol::upload::{DuplicatePolicy, InitUploadRequest};
use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::StorageApi;
use crate::error::UploadError;
use crate::slices::SliceReader;
use crate::types::{UploadTask, UploadedFile};
use crate::{DEFAULT_SLICE_SIZE, digest};

/// Drives single files through the slice-upload protocol.
pub struct SliceUploader<'a> {
    api: &'a dyn StorageApi,
    cancel: CancellationToken,
    poll_interval: Duration,
    max_polls: u32,
}

impl<'a> SliceUploader<'a> {
    pub fn new(
        api: &'a dyn StorageApi,
        cancel: CancellationToken,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            api,
            cancel,
            poll_interval,
            max_polls,
        }
    }

    /// Uploads one file to a terminal outcome.
    ///
    /// Performs 2 + one-per-slice + up-to-`max_polls` network calls;
    /// no local state survives across attempts.
    pub async fn upload(&self, task: &UploadTask) -> Result<UploadedFile, UploadError> {
        let mut file = File::open(&task.source).await.map_err(UploadError::Open)?;
        let size = file.metadata().await.map_err(UploadError::Open)?.len();
        let etag = digest::file_digest(&mut file).await?;
        self.check_cancelled()?;

        let init = self
            .api
            .init_upload(&InitUploadRequest {
                parent_file_id: task.parent_file_id,
                filename: task.remote_path.clone(),
                etag,
                size: size as i64,
                duplicate: DuplicatePolicy::Overwrite,
                contain_dir: true,
            })
            .await?;

        if init.reuse {
            debug!(
                file = %task.source.display(),
                file_id = init.file_id,
                "content already stored, reused without transfer"
            );
            return Ok(UploadedFile {
                file_id: init.file_id,
                reused: true,
            });
        }

        let slice_size = if init.slice_size > 0 {
            init.slice_size as u64
        } else {
            DEFAULT_SLICE_SIZE
        };
        debug!(
            file = %task.source.display(),
            total_bytes = size,
            slice_size,
            total_slices = size.div_ceil(slice_size).max(1),
            "starting slice upload"
        );

        // The digest stage already rewound the cursor to 0.
        let mut slices = SliceReader::new(file, size, slice_size);
        while let Some((slice_no, data)) = slices.next_slice().await? {
            self.check_cancelled()?;
            let url = self.api.slice_url(&init.preupload_id, slice_no).await?;
            self.api.put_slice(&url, data).await?;
            debug!(file = %task.source.display(), slice_no, "slice uploaded");
        }

        self.check_cancelled()?;
        let resp = self.api.complete(&init.preupload_id).await?;

        if !resp.is_async && (!resp.completed || resp.file_id == 0) {
            return Err(UploadError::Complete("server reported incomplete".into()));
        }
        if resp.completed {
            return Ok(UploadedFile {
                file_id: resp.file_id,
                reused: false,
            });
        }

        // async deferred finalization; poll until terminal or budget
        // exhaustion
        self.poll_completion(&init.preupload_id).await
    }

    /// Polls the async result on a fixed interval, up to `max_polls`
    /// attempts. Individual poll failures are swallowed and retried;
    /// only the budget forces termination. Cancellable via the token.
    async fn poll_completion(&self, preupload_id: &str) -> Result<UploadedFile, UploadError> {
        for attempt in 1..=self.max_polls {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            match self.api.poll_result(preupload_id).await {
                Ok(resp) if resp.completed => {
                    debug!(file_id = resp.file_id, "upload finalized");
                    return Ok(UploadedFile {
                        file_id: resp.file_id,
                        reused: false,
                    });
                }
                Ok(_) => debug!(attempt, "upload not yet finalized"),
                Err(e) => warn!(attempt, error = %e, "poll failed, will retry"),
            }
        }

        Err(UploadError::PollTimeout {
            attempts: self.max_polls,
        })
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiFuture;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use shelf_protocol::upload::{AsyncResultResponse, CompleteResponse, InitUploadResponse};

    /// Scripted remote store that records every call.
    struct MockStore {
        init: InitUploadResponse,
        init_requests: Mutex<Vec<InitUploadRequest>>,
        url_calls: Mutex<Vec<i64>>,
        put_sizes: Mutex<Vec<usize>>,
        complete_responses: Mutex<Vec<CompleteResponse>>,
        complete_calls: AtomicU32,
        poll_responses: Mutex<Vec<Result<AsyncResultResponse, UploadError>>>,
        poll_calls: AtomicU32,
    }

    impl MockStore {
        fn new(init: InitUploadResponse) -> Self {
            Self {
                init,
                init_requests: Mutex::new(Vec::new()),
                url_calls: Mutex::new(Vec::new()),
                put_sizes: Mutex::new(Vec::new()),
                complete_responses: Mutex::new(Vec::new()),
                complete_calls: AtomicU32::new(0),
                poll_responses: Mutex::new(Vec::new()),
                poll_calls: AtomicU32::new(0),
            }
        }

        fn with_complete(self, resp: CompleteResponse) -> Self {
            self.complete_responses.lock().unwrap().push(resp);
            self
        }

        fn push_poll(&self, resp: Result<AsyncResultResponse, UploadError>) {
            self.poll_responses.lock().unwrap().push(resp);
        }

        fn polls(&self) -> u32 {
            self.poll_calls.load(Ordering::SeqCst)
        }

        fn completes(&self) -> u32 {
            self.complete_calls.load(Ordering::SeqCst)
        }
    }

    impl StorageApi for MockStore {
        fn init_upload<'a>(
            &'a self,
            req: &'a InitUploadRequest,
        ) -> ApiFuture<'a, InitUploadResponse> {
            self.init_requests.lock().unwrap().push(req.clone());
            Box::pin(async move { Ok(self.init.clone()) })
        }

        fn slice_url<'a>(&'a self, _preupload_id: &'a str, slice_no: i64) -> ApiFuture<'a, String> {
            self.url_calls.lock().unwrap().push(slice_no);
            Box::pin(async move { Ok(format!("http://put.example/{slice_no}")) })
        }

        fn put_slice<'a>(&'a self, _url: &'a str, data: Vec<u8>) -> ApiFuture<'a, ()> {
            self.put_sizes.lock().unwrap().push(data.len());
            Box::pin(async move { Ok(()) })
        }

        fn complete<'a>(&'a self, _preupload_id: &'a str) -> ApiFuture<'a, CompleteResponse> {
            self.complete_calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut scripted = self.complete_responses.lock().unwrap();
                if scripted.is_empty() {
                    None
                } else {
                    Some(scripted.remove(0))
                }
            };
            Box::pin(async move {
                next.ok_or_else(|| UploadError::Complete("no scripted response".into()))
            })
        }

        fn poll_result<'a>(&'a self, _preupload_id: &'a str) -> ApiFuture<'a, AsyncResultResponse> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut scripted = self.poll_responses.lock().unwrap();
                if scripted.is_empty() {
                    None
                } else {
                    Some(scripted.remove(0))
                }
            };
            Box::pin(async move {
                match next {
                    Some(resp) => resp,
                    None => Err(UploadError::Poll("no scripted response".into())),
                }
            })
        }
    }

    fn init_response(reuse: bool, slice_size: i64) -> InitUploadResponse {
        InitUploadResponse {
            reuse,
            preupload_id: "p1".into(),
            slice_size,
            file_id: if reuse { 77 } else { 0 },
        }
    }

    fn completed_sync() -> CompleteResponse {
        CompleteResponse {
            is_async: false,
            completed: true,
            file_id: 42,
        }
    }

    fn task_for(path: &Path) -> UploadTask {
        UploadTask {
            source: path.to_path_buf(),
            remote_path: format!("backup/{}", path.file_name().unwrap().to_string_lossy()),
            parent_file_id: 0,
        }
    }

    fn write_temp(content: &[u8]) -> (tempfile::TempDir, UploadTask) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        std::fs::write(&path, content).unwrap();
        let task = task_for(&path);
        (dir, task)
    }

    fn uploader<'a>(api: &'a MockStore) -> SliceUploader<'a> {
        SliceUploader::new(
            api,
            CancellationToken::new(),
            Duration::from_secs(3),
            100,
        )
    }

    #[tokio::test]
    async fn reuse_short_circuits_all_traffic() {
        let (_dir, task) = write_temp(b"hello");
        let store = MockStore::new(init_response(true, 1024));
        let result = uploader(&store).upload(&task).await.unwrap();

        assert!(result.reused);
        assert_eq!(result.file_id, 77);
        assert!(store.url_calls.lock().unwrap().is_empty());
        assert!(store.put_sizes.lock().unwrap().is_empty());
        assert_eq!(store.completes(), 0);
        assert_eq!(store.polls(), 0);
    }

    #[tokio::test]
    async fn init_carries_digest_size_and_remote_path() {
        let (_dir, task) = write_temp(b"abc");
        let store = MockStore::new(init_response(false, 1024)).with_complete(completed_sync());
        uploader(&store).upload(&task).await.unwrap();

        let reqs = store.init_requests.lock().unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].etag, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(reqs[0].size, 3);
        assert_eq!(reqs[0].filename, "backup/file.bin");
        assert!(reqs[0].contain_dir);
        assert_eq!(reqs[0].duplicate, DuplicatePolicy::Overwrite);
    }

    #[tokio::test]
    async fn two_mebibyte_file_uploads_two_slices() {
        let (_dir, task) = write_temp(&vec![7u8; 2 * 1024 * 1024]);
        let store = MockStore::new(init_response(false, 1024 * 1024)).with_complete(completed_sync());
        let result = uploader(&store).upload(&task).await.unwrap();

        assert_eq!(result.file_id, 42);
        assert!(!result.reused);
        assert_eq!(*store.url_calls.lock().unwrap(), vec![1, 2]);
        assert_eq!(*store.put_sizes.lock().unwrap(), vec![1024 * 1024, 1024 * 1024]);
        assert_eq!(store.completes(), 1);
    }

    #[tokio::test]
    async fn empty_file_uploads_one_empty_slice() {
        let (_dir, task) = write_temp(b"");
        let store = MockStore::new(init_response(false, 1024)).with_complete(completed_sync());
        uploader(&store).upload(&task).await.unwrap();

        assert_eq!(*store.url_calls.lock().unwrap(), vec![1]);
        assert_eq!(*store.put_sizes.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn zero_slice_size_falls_back_to_default() {
        let (_dir, task) = write_temp(b"abc");
        let store = MockStore::new(init_response(false, 0)).with_complete(completed_sync());
        uploader(&store).upload(&task).await.unwrap();
        assert_eq!(*store.url_calls.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn completed_true_never_polls_even_when_async() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024)).with_complete(CompleteResponse {
            is_async: true,
            completed: true,
            file_id: 9,
        });
        let result = uploader(&store).upload(&task).await.unwrap();
        assert_eq!(result.file_id, 9);
        assert_eq!(store.polls(), 0);
    }

    #[tokio::test]
    async fn sync_incomplete_fails_without_polling() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024)).with_complete(CompleteResponse {
            is_async: false,
            completed: false,
            file_id: 0,
        });
        let err = uploader(&store).upload(&task).await.unwrap_err();
        assert!(matches!(err, UploadError::Complete(_)));
        assert_eq!(store.polls(), 0);
    }

    #[tokio::test]
    async fn sync_completed_with_zero_file_id_fails() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024)).with_complete(CompleteResponse {
            is_async: false,
            completed: true,
            file_id: 0,
        });
        let err = uploader(&store).upload(&task).await.unwrap_err();
        assert!(matches!(err, UploadError::Complete(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn async_pending_polls_until_completed() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024)).with_complete(CompleteResponse {
            is_async: true,
            completed: false,
            file_id: 0,
        });
        store.push_poll(Ok(AsyncResultResponse {
            completed: false,
            file_id: 0,
        }));
        store.push_poll(Ok(AsyncResultResponse {
            completed: true,
            file_id: 55,
        }));

        let result = uploader(&store).upload(&task).await.unwrap();
        assert_eq!(result.file_id, 55);
        assert_eq!(store.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_are_swallowed() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024)).with_complete(CompleteResponse {
            is_async: true,
            completed: false,
            file_id: 0,
        });
        store.push_poll(Err(UploadError::Poll("connection reset".into())));
        store.push_poll(Ok(AsyncResultResponse {
            completed: true,
            file_id: 3,
        }));

        let result = uploader(&store).upload(&task).await.unwrap();
        assert_eq!(result.file_id, 3);
        assert_eq!(store.polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_budget_exhaustion_is_a_failure() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024)).with_complete(CompleteResponse {
            is_async: true,
            completed: false,
            file_id: 0,
        });
        for _ in 0..3 {
            store.push_poll(Ok(AsyncResultResponse {
                completed: false,
                file_id: 0,
            }));
        }

        let driver = SliceUploader::new(&store, CancellationToken::new(), Duration::from_secs(3), 3);
        let err = driver.upload(&task).await.unwrap_err();
        assert!(matches!(err, UploadError::PollTimeout { attempts: 3 }));
        assert_eq!(store.polls(), 3);
    }

    #[tokio::test]
    async fn cancellation_preempts_before_network_calls() {
        let (_dir, task) = write_temp(b"x");
        let store = MockStore::new(init_response(false, 1024));

        let cancel = CancellationToken::new();
        let driver = SliceUploader::new(&store, cancel.clone(), Duration::from_secs(60), 100);
        cancel.cancel();

        let err = driver.upload(&task).await.unwrap_err();
        assert!(matches!(err, UploadError::Cancelled));
        assert!(store.init_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_poll_wait() {
        let store = MockStore::new(init_response(false, 1024));
        let cancel = CancellationToken::new();
        // 60 s interval: only cancellation can end the first wait.
        let driver = SliceUploader::new(&store, cancel.clone(), Duration::from_secs(60), 100);

        let (result, _) = tokio::join!(driver.poll_completion("p1"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        assert!(matches!(result, Err(UploadError::Cancelled)));
        assert_eq!(store.polls(), 0);
    }

    #[tokio::test]
    async fn missing_file_is_open_error() {
        let store = MockStore::new(init_response(false, 1024));
        let task = task_for(Path::new("/nonexistent/nope.bin"));
        let err = uploader(&store).upload(&task).await.unwrap_err();
        assert!(matches!(err, UploadError::Open(_)));
    }
}
