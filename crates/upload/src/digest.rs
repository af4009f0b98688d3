//! Whole-file content digest.

use std::io::SeekFrom;

use md5::{Digest, Md5};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::UploadError;

/// Streams the entire file through MD5 and returns the hex digest,
/// with the read cursor repositioned to offset 0 afterwards.
///
/// The digest is the server's dedup key and an upload-init parameter,
/// so it must be computed before any slice is read. Recomputed from
/// scratch on every attempt; retries are file-level.
pub async fn file_digest(file: &mut File) -> Result<String, UploadError> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await.map_err(UploadError::Digest)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    file.seek(SeekFrom::Start(0))
        .await
        .map_err(UploadError::Seek)?;

    Ok(hex::encode(hasher.finalize()))
}
