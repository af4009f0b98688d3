//! Upload orchestration for the Shelf slice-upload protocol.
//!
//! A bounded pool of workers drains a queue of discovered files; each
//! file is driven through digest → init (dedup check) → sequential
//! slice transfer → completion → optional async-result polling, with
//! a per-file retry policy and an aggregated final report.
//!
//! Transport is abstracted behind [`StorageApi`] so the driver and
//! pool stay testable without a network.

mod api;
mod digest;
mod dispatcher;
mod driver;
mod error;
mod report;
mod slices;
mod types;
mod walk;

pub use api::{ApiFuture, StorageApi};
pub use digest::file_digest;
pub use dispatcher::{Dispatcher, UploaderConfig};
pub use driver::SliceUploader;
pub use error::{RunError, UploadError};
pub use report::ReportCollector;
pub use slices::SliceReader;
pub use types::{AggregateReport, UploadOutcome, UploadTask, UploadedFile};
pub use walk::expand_inputs;

use std::time::Duration;

/// Fallback slice size when the server returns 0: 16 MiB.
pub const DEFAULT_SLICE_SIZE: u64 = 16 * 1024 * 1024;

/// Interval between async-completion polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Poll-attempt budget before an async completion is declared failed.
pub const DEFAULT_MAX_POLLS: u32 = 100;

/// Depth of the bounded work queue. Affects memory only; totals are
/// known up front from the discovery pass.
pub(crate) const QUEUE_DEPTH: usize = 256;
