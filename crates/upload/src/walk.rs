//! Discovery: expands input paths into a flat set of upload tasks.
//!
//! Runs as a full pass before any worker starts, so the dispatcher
//! knows the total task count up front and a traversal error aborts
//! the run before any upload traffic.

use std::path::{Path, PathBuf};

use crate::error::RunError;
use crate::types::UploadTask;

/// Expands `inputs` into one task per regular file.
///
/// A regular-file input becomes one task; a directory input is walked
/// recursively (directories themselves are never tasks). Any
/// traversal error fails the whole run; there is no silent partial
/// skip.
pub fn expand_inputs(
    inputs: &[PathBuf],
    target: &str,
    parent_file_id: i64,
) -> Result<Vec<UploadTask>, RunError> {
    let mut tasks = Vec::new();

    for input in inputs {
        let metadata = std::fs::metadata(input).map_err(|e| RunError::Traversal {
            path: input.clone(),
            source: e,
        })?;

        if metadata.is_dir() {
            walk_dir(input, target, parent_file_id, &mut tasks)?;
        } else {
            tasks.push(make_task(input, target, parent_file_id));
        }
    }

    Ok(tasks)
}

fn walk_dir(
    dir: &Path,
    target: &str,
    parent_file_id: i64,
    tasks: &mut Vec<UploadTask>,
) -> Result<(), RunError> {
    let entries = std::fs::read_dir(dir).map_err(|e| RunError::Traversal {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| RunError::Traversal {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| RunError::Traversal {
            path: path.clone(),
            source: e,
        })?;

        if metadata.is_dir() {
            walk_dir(&path, target, parent_file_id, tasks)?;
        } else if metadata.is_file() {
            tasks.push(make_task(&path, target, parent_file_id));
        }
    }

    Ok(())
}

fn make_task(source: &Path, target: &str, parent_file_id: i64) -> UploadTask {
    UploadTask {
        source: source.to_path_buf(),
        remote_path: join_remote(target, source),
        parent_file_id,
    }
}

/// Slash-joins the remote target directory and a local source path,
/// normalized to forward slashes (even on Windows).
fn join_remote(target: &str, source: &Path) -> String {
    let source = source.to_string_lossy().replace('\\', "/");
    let source = source.trim_start_matches("./").trim_start_matches('/');
    let target = target.trim_end_matches('/');
    if target.is_empty() {
        source.to_string()
    } else {
        format!("{target}/{source}")
    }
}
