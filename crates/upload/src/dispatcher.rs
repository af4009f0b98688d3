//! Worker pool and dispatch loop.
//!
//! A fixed set of workers drains one bounded queue of discovered
//! tasks; each task gets up to `max_retries` sequential driver
//! attempts. The run completes only when every enqueued task has been
//! observed done, gated by joining the workers rather than by queue
//! emptiness.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::StorageApi;
use crate::driver::SliceUploader;
use crate::error::{RunError, UploadError};
use crate::report::ReportCollector;
use crate::types::{AggregateReport, UploadOutcome, UploadTask};
use crate::{DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL, QUEUE_DEPTH, walk};

/// Pool sizing and retry policy.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Number of concurrently in-flight file uploads.
    pub workers: u32,
    /// Total driver attempts per file, including the first.
    pub max_retries: u32,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            max_retries: 3,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

/// Owns the worker pool for one upload run.
pub struct Dispatcher {
    api: Arc<dyn StorageApi>,
    config: UploaderConfig,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// Creates a dispatcher, rejecting zero worker or retry counts.
    pub fn new(api: Arc<dyn StorageApi>, config: UploaderConfig) -> Result<Self, RunError> {
        if config.workers < 1 {
            return Err(RunError::Config("worker count must be at least 1".into()));
        }
        if config.max_retries < 1 {
            return Err(RunError::Config("max retries must be at least 1".into()));
        }
        Ok(Self {
            api,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Returns a token that stops the run: workers finish their
    /// current task and exit, and in-flight poll waits are
    /// interrupted.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Expands `inputs` and uploads every discovered file under
    /// `target`, returning the final report once all tasks drain.
    ///
    /// Per-file failures never abort sibling uploads; only config and
    /// traversal errors fail the run itself.
    pub async fn run(
        &self,
        inputs: &[PathBuf],
        target: &str,
        parent_file_id: i64,
    ) -> Result<AggregateReport, RunError> {
        let tasks = walk::expand_inputs(inputs, target, parent_file_id)?;
        info!(files = tasks.len(), target, "discovery complete");

        let collector = Arc::new(ReportCollector::new());
        let (tx, rx) = mpsc::channel::<UploadTask>(QUEUE_DEPTH);
        let queue = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.config.workers {
            let queue = Arc::clone(&queue);
            let api = Arc::clone(&self.api);
            let collector = Arc::clone(&collector);
            let cancel = self.cancel.clone();
            let config = self.config.clone();

            workers.spawn(async move {
                loop {
                    // biased: a pending cancellation must win over a
                    // simultaneously ready queue.
                    let task = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        task = async { queue.lock().await.recv().await } => task,
                    };
                    let Some(task) = task else { break };

                    let outcome = process(api.as_ref(), &config, &cancel, &task).await;
                    collector.record(outcome);
                }
            });
        }

        for task in tasks {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = tx.send(task) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        drop(tx);

        while workers.join_next().await.is_some() {}

        Ok(collector.snapshot())
    }
}

/// Applies the retry policy to one task: sequential attempts, any
/// error consuming one, first success winning.
async fn process(
    api: &dyn StorageApi,
    config: &UploaderConfig,
    cancel: &CancellationToken,
    task: &UploadTask,
) -> UploadOutcome {
    let driver = SliceUploader::new(api, cancel.clone(), config.poll_interval, config.max_polls);

    let mut attempts = 0;
    loop {
        attempts += 1;
        match driver.upload(task).await {
            Ok(uploaded) => {
                info!(
                    file = %task.source.display(),
                    remote = %task.remote_path,
                    file_id = uploaded.file_id,
                    reused = uploaded.reused,
                    attempts,
                    "upload succeeded"
                );
                return UploadOutcome {
                    path: task.source.clone(),
                    success: true,
                    attempts,
                };
            }
            Err(UploadError::Cancelled) => {
                warn!(file = %task.source.display(), "upload cancelled");
                return UploadOutcome {
                    path: task.source.clone(),
                    success: false,
                    attempts,
                };
            }
            Err(e) if attempts < config.max_retries => {
                warn!(
                    file = %task.source.display(),
                    remote = %task.remote_path,
                    error = %e,
                    attempt = attempts,
                    "upload failed, retrying"
                );
            }
            Err(e) => {
                error!(
                    file = %task.source.display(),
                    remote = %task.remote_path,
                    error = %e,
                    attempts,
                    "upload failed permanently"
                );
                return UploadOutcome {
                    path: task.source.clone(),
                    success: false,
                    attempts,
                };
            }
        }
    }
}
