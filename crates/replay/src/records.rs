//! In-memory iteration over recorded pads.

use std::io;
use std::path::Path;

use tasrig_wire::{Pad, RECORD_LEN};

/// Size of the Mupen64 movie header preceding input records in `.m64` files.
pub const M64_HEADER_LEN: usize = 0x400;

/// Iterator over the records of a stream held in memory.
///
/// A trailing partial record is ignored, matching what playback would do.
#[derive(Debug, Clone)]
pub struct RecordReader {
    data: Vec<u8>,
    position: usize,
}

impl RecordReader {
    /// Records start at byte 0.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Records start after a 0x400-byte movie header.
    pub fn with_m64_header(data: Vec<u8>) -> Self {
        Self {
            data,
            position: M64_HEADER_LEN,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Whole records left to yield.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position) / RECORD_LEN
    }
}

impl Iterator for RecordReader {
    type Item = Pad;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.position.checked_add(RECORD_LEN)?;
        let bytes: [u8; RECORD_LEN] = self.data.get(self.position..end)?.try_into().ok()?;
        self.position = end;
        Some(Pad::from_record(bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for RecordReader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yields_whole_records_only() {
        let reader = RecordReader::new(vec![0x80, 0x00, 0x10, 0xf0, 0x00, 0x01, 0x02]);
        assert_eq!(reader.len(), 1);
        let pads: Vec<_> = reader.collect();
        assert_eq!(pads, vec![Pad::new(0x8000, 16, -16)]);
    }

    #[test]
    fn test_skips_m64_header() {
        let mut data = vec![0xffu8; M64_HEADER_LEN];
        data.extend_from_slice(&[0x40, 0x00, 0x05, 0x06]);
        let pads: Vec<_> = RecordReader::with_m64_header(data).collect();
        assert_eq!(pads, vec![Pad::new(0x4000, 5, 6)]);
    }

    #[test]
    fn test_header_longer_than_data() {
        let mut reader = RecordReader::with_m64_header(vec![0u8; 16]);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.next(), None);
    }
}
