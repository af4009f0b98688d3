use std::path::PathBuf;

/// One file queued for upload. Immutable; consumed exactly once by a
/// worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Local source path as discovered.
    pub source: PathBuf,
    /// Slash-joined destination path on the server.
    pub remote_path: String,
    /// Remote folder the destination path is resolved under.
    pub parent_file_id: i64,
}

/// Terminal result of one successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: i64,
    /// True when the server deduplicated by content digest and no
    /// slice traffic occurred.
    pub reused: bool,
}

/// Result of applying the retry policy to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: PathBuf,
    pub success: bool,
    /// Driver attempts consumed, including the final one.
    pub attempts: u32,
}

/// Final snapshot of a run, produced after every task has drained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub total_files: usize,
    /// Permanently failed source paths, in completion order.
    pub failed_paths: Vec<PathBuf>,
}

impl AggregateReport {
    pub fn failed_count(&self) -> usize {
        self.failed_paths.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_paths.is_empty()
    }
}
