//! Thread-safe result aggregation across workers.

use std::sync::Mutex;

use crate::types::{AggregateReport, UploadOutcome};

/// Accumulates per-file outcomes as workers finish.
///
/// Mutation is append-only under a single lock; no entry is ever
/// removed or overwritten. The dispatcher snapshots it only after
/// every task has drained.
#[derive(Default)]
pub struct ReportCollector {
    inner: Mutex<AggregateReport>,
}

impl ReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished task.
    pub fn record(&self, outcome: UploadOutcome) {
        let mut report = self.inner.lock().unwrap();
        report.total_files += 1;
        if !outcome.success {
            report.failed_paths.push(outcome.path);
        }
    }

    /// Returns the accumulated report.
    pub fn snapshot(&self) -> AggregateReport {
        self.inner.lock().unwrap().clone()
    }
}
