use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The atomic unit of disk I/O. Every persisted page is exactly this
/// many bytes.
pub const PAGE_SIZE: usize = 4096;

/// Paged read/write over a single regular file. Seeks are absolute
/// `page_number * PAGE_SIZE`; the pager is the only intended caller.
pub struct DbFile {
    path: PathBuf,
    file: Option<File>,
}

impl DbFile {
    /// Opens the file at `path`, creating it if absent. A freshly
    /// created file is initialized with one zero-filled page.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::Storage(format!("failed to open '{}': {}", path.display(), e)))?;

        let len = file
            .metadata()
            .map_err(|e| Error::Storage(format!("failed to stat '{}': {}", path.display(), e)))?
            .len();
        if len == 0 {
            file.write_all(&[0u8; PAGE_SIZE])
                .map_err(|e| Error::Storage(format!("failed to initialize file: {}", e)))?;
            file.flush()
                .map_err(|e| Error::Storage(format!("failed to flush file: {}", e)))?;
        }

        Ok(DbFile {
            path,
            file: Some(file),
        })
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::Storage("file is closed".to_string()))
    }

    /// Reads page `page_number` as exactly `PAGE_SIZE` bytes. A page
    /// wholly beyond the end of the file reads as zero-filled; a torn
    /// partial page is an error.
    pub fn read_page(&mut self, page_number: usize) -> Result<Vec<u8>> {
        let offset = page_number as u64 * PAGE_SIZE as u64;
        let file = self.file_mut()?;

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::Storage(format!("failed to seek to page {}: {}", page_number, e)))?;

        let mut data = vec![0u8; PAGE_SIZE];
        let mut read = 0;
        while read < PAGE_SIZE {
            let n = file
                .read(&mut data[read..])
                .map_err(|e| Error::Storage(format!("failed to read page {}: {}", page_number, e)))?;
            if n == 0 {
                break;
            }
            read += n;
        }

        if read == 0 || read == PAGE_SIZE {
            Ok(data)
        } else {
            Err(Error::Storage(format!(
                "partial page read at page {}: expected {} bytes, got {}",
                page_number, PAGE_SIZE, read
            )))
        }
    }

    /// Writes page `page_number`. The payload must be exactly
    /// `PAGE_SIZE` bytes; the host buffer is flushed before returning.
    pub fn write_page(&mut self, page_number: usize, data: &[u8]) -> Result<()> {
        if data.len() != PAGE_SIZE {
            return Err(Error::Storage(format!(
                "page data must be exactly {} bytes, got {}",
                PAGE_SIZE,
                data.len()
            )));
        }

        let offset = page_number as u64 * PAGE_SIZE as u64;
        let file = self.file_mut()?;

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::Storage(format!("failed to seek to page {}: {}", page_number, e)))?;
        file.write_all(data)
            .map_err(|e| Error::Storage(format!("failed to write page {}: {}", page_number, e)))?;
        file.flush()
            .map_err(|e| Error::Storage(format!("failed to flush page {}: {}", page_number, e)))?;
        Ok(())
    }

    pub fn size(&mut self) -> Result<u64> {
        let file = self.file_mut()?;
        let metadata = file
            .metadata()
            .map_err(|e| Error::Storage(format!("failed to stat file: {}", e)))?;
        Ok(metadata.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Syncs and drops the handle. Further operations fail with a
    /// storage error. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|e| {
                Error::Storage(format!("failed to close '{}': {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}
