//! Error taxonomy for the upload subsystem.

use std::io;
use std::path::PathBuf;

/// Errors failing a single upload attempt.
///
/// The retry policy treats every variant uniformly: any failure
/// consumes one attempt and the file is retried immediately.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to open file: {0}")]
    Open(#[source] io::Error),

    #[error("failed to digest file contents: {0}")]
    Digest(#[source] io::Error),

    #[error("failed to rewind file: {0}")]
    Seek(#[source] io::Error),

    #[error("failed to read slice: {0}")]
    Read(#[source] io::Error),

    #[error("upload init failed: {0}")]
    Init(String),

    #[error("failed to get slice upload url: {0}")]
    SliceUrl(String),

    /// The presigned destination rejected the slice body.
    #[error("slice upload rejected with status {status}")]
    SliceTransfer { status: u16 },

    /// Transport failure while sending a slice body.
    #[error("slice transfer failed: {0}")]
    SliceSend(String),

    #[error("upload completion failed: {0}")]
    Complete(String),

    /// One async-result poll failed. Swallowed by the poll loop, never
    /// escalated past it.
    #[error("async result poll failed: {0}")]
    Poll(String),

    #[error("upload not finalized after {attempts} polls")]
    PollTimeout { attempts: u32 },

    #[error("cancelled")]
    Cancelled,
}

/// Errors fatal to the whole run, raised before any upload traffic.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("traversal failed at {}: {source}", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
