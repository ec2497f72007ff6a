//! Run reports: a Protobuf summary of a finished run, bound to the exact
//! bytes of the stream it produced by length and SHA-256.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use prost::Message;
use sha2::{Digest, Sha256};
use tasrig_wire::{REPORT_FORMAT_VERSION, RunReport};
use thiserror::Error;

/// Report read/verify failures.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to decode run report {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: prost::DecodeError,
    },

    #[error("unsupported report format version {found} (expected {})", REPORT_FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("stream length mismatch: report says {expected} bytes, stream has {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("stream digest mismatch: report says {expected}, stream hashes to {actual}")]
    DigestMismatch { expected: String, actual: String },
}

/// Run facts known to the harness; the stream facts are filled in from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub seed: u32,
    pub record_mode: bool,
    pub window_length_max: u32,
    pub random_action_max: u32,
    pub max_bytes: u32,
    pub frames_played: u32,
    pub frames_recorded: u32,
    pub frames_explored: u32,
    pub end_reason: String,
    pub exit_code: i32,
}

impl RunSummary {
    /// Hash the finalized stream and produce the report.
    pub fn into_report(self, stream_path: &Path) -> Result<RunReport, ReportError> {
        let (stream_length, stream_sha256) =
            stream_digest(stream_path).map_err(|source| ReportError::Io {
                path: stream_path.to_path_buf(),
                source,
            })?;

        Ok(RunReport {
            report_format_version: REPORT_FORMAT_VERSION,
            seed: self.seed,
            record_mode: self.record_mode,
            window_length_max: self.window_length_max,
            random_action_max: self.random_action_max,
            max_bytes: self.max_bytes,
            frames_played: self.frames_played,
            frames_recorded: self.frames_recorded,
            frames_explored: self.frames_explored,
            stream_length,
            stream_sha256,
            end_reason: self.end_reason,
            exit_code: self.exit_code,
        })
    }
}

/// Length and lowercase hex SHA-256 of the file at `path`.
pub fn stream_digest(path: &Path) -> io::Result<(u64, String)> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut length = 0u64;
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        length += n as u64;
        hasher.update(&buffer[..n]);
    }
    Ok((length, format!("{:x}", hasher.finalize())))
}

/// Conventional report location: the stream path with `.report` appended.
pub fn default_report_path(stream_path: &Path) -> PathBuf {
    let mut name = stream_path.as_os_str().to_owned();
    name.push(".report");
    PathBuf::from(name)
}

/// Write a report, replacing any previous report at `path`.
pub fn write_report(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    fs::write(path, report.encode_to_vec()).map_err(io_err)
}

pub fn read_report(path: &Path) -> Result<RunReport, ReportError> {
    let data = fs::read(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RunReport::decode(data.as_slice()).map_err(|source| ReportError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Check that the stream at `stream_path` is byte-identical to the one the
/// report describes.
pub fn verify_stream(report: &RunReport, stream_path: &Path) -> Result<(), ReportError> {
    if report.report_format_version != REPORT_FORMAT_VERSION {
        return Err(ReportError::UnsupportedVersion {
            found: report.report_format_version,
        });
    }

    let (actual_len, actual_digest) =
        stream_digest(stream_path).map_err(|source| ReportError::Io {
            path: stream_path.to_path_buf(),
            source,
        })?;

    if actual_len != report.stream_length {
        return Err(ReportError::LengthMismatch {
            expected: report.stream_length,
            actual: actual_len,
        });
    }
    if actual_digest != report.stream_sha256 {
        return Err(ReportError::DigestMismatch {
            expected: report.stream_sha256.clone(),
            actual: actual_digest,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            seed: 22,
            record_mode: true,
            window_length_max: 100,
            random_action_max: 5,
            max_bytes: 400,
            frames_played: 2,
            frames_recorded: 1,
            frames_explored: 1,
            end_reason: "complete".to_string(),
            exit_code: 0,
        }
    }

    #[test]
    fn test_empty_stream_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.m64");
        fs::write(&path, b"").unwrap();

        let (len, digest) = stream_digest(&path).unwrap();
        assert_eq!(len, 0);
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_write_read_verify() {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("cont.m64");
        fs::write(&stream, [1u8; 12]).unwrap();

        let report = summary().into_report(&stream).unwrap();
        assert_eq!(report.stream_length, 12);
        assert_eq!(report.frames_played, 2);

        let report_path = default_report_path(&stream);
        assert_eq!(report_path, dir.path().join("cont.m64.report"));
        write_report(&report, &report_path).unwrap();

        let loaded = read_report(&report_path).unwrap();
        assert_eq!(loaded, report);
        assert!(verify_stream(&loaded, &stream).is_ok());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("cont.m64");
        fs::write(&stream, [1u8; 8]).unwrap();
        let report = summary().into_report(&stream).unwrap();

        fs::write(&stream, [1u8, 1, 1, 1, 1, 1, 1, 2]).unwrap();
        assert!(matches!(
            verify_stream(&report, &stream),
            Err(ReportError::DigestMismatch { .. })
        ));

        fs::write(&stream, [1u8; 4]).unwrap();
        assert!(matches!(
            verify_stream(&report, &stream),
            Err(ReportError::LengthMismatch {
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let stream = dir.path().join("cont.m64");
        fs::write(&stream, b"").unwrap();
        let mut report = summary().into_report(&stream).unwrap();
        report.report_format_version = 99;

        assert!(matches!(
            verify_stream(&report, &stream),
            Err(ReportError::UnsupportedVersion { found: 99 })
        ));
    }

    #[test]
    fn test_read_garbage_fails_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.report");
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        assert!(matches!(read_report(&path), Err(ReportError::Decode { .. })));
    }
}
