//! Lazy fixed-size slicing of an open file.

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::UploadError;

/// Reads a file sequentially in slices of at most `slice_size` bytes.
///
/// Slice numbers are 1-based, strictly increasing and contiguous,
/// assigned lazily as data is read. A zero-length file yields exactly
/// one empty slice so the server session always sees slice 1. A short
/// read against the stat'd size (a file shrinking mid-upload) simply
/// ends the stream early; it is not an error.
pub struct SliceReader {
    file: File,
    buf_size: usize,
    slice_no: i64,
}

impl SliceReader {
    /// Wraps an already-rewound file. `size` is the stat'd file size;
    /// the read buffer is `min(size, slice_size)` so small files do
    /// not allocate a full slice.
    pub fn new(file: File, size: u64, slice_size: u64) -> Self {
        Self {
            file,
            buf_size: size.min(slice_size) as usize,
            slice_no: 0,
        }
    }

    /// Returns the next `(slice_no, data)` pair, or `None` at end of
    /// stream.
    pub async fn next_slice(&mut self) -> Result<Option<(i64, Vec<u8>)>, UploadError> {
        let mut buf = vec![0u8; self.buf_size];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .file
                .read(&mut buf[filled..])
                .await
                .map_err(UploadError::Read)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);

        if filled == 0 && self.slice_no > 0 {
            return Ok(None);
        }

        self.slice_no += 1;
        Ok(Some((self.slice_no, buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(content: &[u8]) -> (tempfile::TempDir, File, u64) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, content).unwrap();
        let file = File::open(&path).await.unwrap();
        let size = content.len() as u64;
        (dir, file, size)
    }

    #[tokio::test]
    async fn slices_are_contiguous_from_one() {
        let (_dir, file, size) = open(b"0123456789").await;
        let mut reader = SliceReader::new(file, size, 4);

        let mut numbers = Vec::new();
        let mut sizes = Vec::new();
        while let Some((no, data)) = reader.next_slice().await.unwrap() {
            numbers.push(no);
            sizes.push(data.len());
        }
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[tokio::test]
    async fn single_slice_when_smaller_than_slice_size() {
        let (_dir, file, size) = open(b"tiny").await;
        let mut reader = SliceReader::new(file, size, 1024);

        let (no, data) = reader.next_slice().await.unwrap().unwrap();
        assert_eq!(no, 1);
        assert_eq!(data, b"tiny");
        assert!(reader.next_slice().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_file_yields_one_empty_slice() {
        let (_dir, file, size) = open(b"").await;
        let mut reader = SliceReader::new(file, size, 1024);

        let (no, data) = reader.next_slice().await.unwrap().unwrap();
        assert_eq!(no, 1);
        assert!(data.is_empty());
        assert!(reader.next_slice().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exact_multiple_has_no_trailing_empty_slice() {
        let (_dir, file, size) = open(b"abcdefgh").await;
        let mut reader = SliceReader::new(file, size, 4);

        assert_eq!(reader.next_slice().await.unwrap().unwrap().0, 1);
        assert_eq!(reader.next_slice().await.unwrap().unwrap().0, 2);
        assert!(reader.next_slice().await.unwrap().is_none());
    }
}
