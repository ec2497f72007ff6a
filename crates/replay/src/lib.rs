//! tasrig Replay Storage
//!
//! This crate owns everything that touches recorded input on disk:
//! - `InputStore`: the record file the harness plays back from and appends to
//! - `RecordReader`: in-memory iteration over a stream's pads
//! - Run reports binding a run's summary to the stream it produced
//!
//! The stream format is defined in `tasrig-wire`: 4-byte records, no header.

#![deny(unsafe_code)]

pub mod records;
pub mod report;
pub mod store;

pub use records::{M64_HEADER_LEN, RecordReader};
pub use report::{
    ReportError, RunSummary, default_report_path, read_report, stream_digest, verify_stream,
    write_report,
};
pub use store::{InputStore, StoreError, aligned_len};
