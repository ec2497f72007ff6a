//! Input Stream Store.
//!
//! A single binary file of 4-byte records, opened read+write and created if
//! absent. Playback reads records from the start; once playback ends the same
//! handle appends at the current cursor. The file length is kept a multiple
//! of 4 at every point the harness can observe it.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tasrig_wire::{RECORD_LEN, RecordBytes};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures touching the stream file. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open input stream {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read record at byte {offset}: {source}")]
    Read { offset: u64, source: io::Error },

    #[error("failed to write record at byte {offset}: {source}")]
    Write { offset: u64, source: io::Error },

    #[error("failed to truncate input stream to {length} bytes: {source}")]
    Truncate { length: u64, source: io::Error },

    #[error("failed to seek input stream to byte {offset}: {source}")]
    Seek { offset: u64, source: io::Error },

    #[error("failed to flush input stream: {source}")]
    Flush { source: io::Error },
}

/// Round `length` down to a whole number of records.
pub fn aligned_len(length: u64) -> u64 {
    length - length % RECORD_LEN as u64
}

/// Record file opened for playback and recording.
#[derive(Debug)]
pub struct InputStore {
    file: File,
    path: PathBuf,
    /// Byte offset of the next read or write.
    cursor: u64,
    /// Aligned length found when the file was opened.
    opened_len: u64,
}

impl InputStore {
    /// Open or create the stream at `path`, positioned at byte 0.
    ///
    /// A partial trailing record (1 to 3 bytes) left by an interrupted write
    /// is truncated away before anything is read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| StoreError::Open {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(open_err)?;
        let raw_len = file.metadata().map_err(open_err)?.len();

        let mut store = Self {
            file,
            path,
            cursor: 0,
            opened_len: aligned_len(raw_len),
        };

        if store.opened_len != raw_len {
            warn!(
                path = %store.path.display(),
                raw_len,
                aligned_len = store.opened_len,
                "dropping partial trailing record"
            );
            store.truncate_and_seek_to(store.opened_len)?;
        }
        store.seek_to(0)?;

        info!(
            path = %store.path.display(),
            frames = store.frames_available(),
            "input stream opened"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next read or write.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Aligned length of the file when it was opened.
    pub fn opened_len(&self) -> u64 {
        self.opened_len
    }

    /// Whole records present when the file was opened.
    pub fn frames_available(&self) -> u64 {
        self.opened_len / RECORD_LEN as u64
    }

    /// Read the next record.
    ///
    /// Returns `None` when fewer than 4 bytes remain. The cursor then sits
    /// after whatever partial bytes were consumed; callers recover with
    /// [`truncate_and_seek_to`](Self::truncate_and_seek_to).
    pub fn read_record(&mut self) -> Result<Option<RecordBytes>, StoreError> {
        let mut buf = [0u8; RECORD_LEN];
        let mut filled = 0;
        while filled < RECORD_LEN {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(StoreError::Read {
                        offset: self.cursor,
                        source,
                    });
                }
            }
        }
        self.cursor += filled as u64;

        if filled == RECORD_LEN {
            Ok(Some(buf))
        } else {
            debug!(offset = self.cursor, partial = filled, "end of recorded input");
            Ok(None)
        }
    }

    /// Write one record at the cursor.
    pub fn write_record(&mut self, bytes: RecordBytes) -> Result<(), StoreError> {
        self.file
            .write_all(&bytes)
            .map_err(|source| StoreError::Write {
                offset: self.cursor,
                source,
            })?;
        self.cursor += RECORD_LEN as u64;
        Ok(())
    }

    /// Cut the file to `length` bytes and move the cursor there.
    pub fn truncate_and_seek_to(&mut self, length: u64) -> Result<(), StoreError> {
        self.file
            .set_len(length)
            .map_err(|source| StoreError::Truncate { length, source })?;
        self.seek_to(length)?;
        debug!(length, "input stream truncated");
        Ok(())
    }

    /// Push buffered data to the OS and the device.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.file
            .flush()
            .and_then(|()| self.file.sync_all())
            .map_err(|source| StoreError::Flush { source })
    }

    fn seek_to(&mut self, offset: u64) -> Result<(), StoreError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| StoreError::Seek { offset, source })?;
        self.cursor = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_stream(contents: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cont.m64");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.m64");

        let mut store = InputStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.frames_available(), 0);
        assert_eq!(store.read_record().unwrap(), None);
    }

    #[test]
    fn test_open_truncates_partial_tail() {
        for extra in 1..=3usize {
            let mut bytes = vec![7u8; 8];
            bytes.extend(std::iter::repeat_n(9u8, extra));
            let (_dir, path) = temp_stream(&bytes);

            let store = InputStore::open(&path).unwrap();

            assert_eq!(store.frames_available(), 2);
            assert_eq!(store.cursor(), 0);
            assert_eq!(std::fs::metadata(&path).unwrap().len(), 8);
        }
    }

    #[test]
    fn test_read_then_append_at_end() {
        let (_dir, path) = temp_stream(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut store = InputStore::open(&path).unwrap();

        assert_eq!(store.read_record().unwrap(), Some([1, 2, 3, 4]));
        assert_eq!(store.read_record().unwrap(), Some([5, 6, 7, 8]));
        assert_eq!(store.read_record().unwrap(), None);
        assert_eq!(store.cursor(), 8);

        store.write_record([9, 10, 11, 12]).unwrap();
        store.flush().unwrap();
        drop(store);

        assert_eq!(
            std::fs::read(&path).unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn test_truncate_discards_future_records() {
        let (_dir, path) = temp_stream(&[0u8; 16]);
        let mut store = InputStore::open(&path).unwrap();
        store.read_record().unwrap();

        store.truncate_and_seek_to(4).unwrap();
        assert_eq!(store.read_record().unwrap(), None);
        store.write_record([0xaa; 4]).unwrap();
        drop(store);

        assert_eq!(std::fs::read(&path).unwrap(), [0, 0, 0, 0, 0xaa, 0xaa, 0xaa, 0xaa]);
    }

    #[test]
    fn test_aligned_len() {
        assert_eq!(aligned_len(0), 0);
        assert_eq!(aligned_len(3), 0);
        assert_eq!(aligned_len(4), 4);
        assert_eq!(aligned_len(43), 40);
    }
}
