//! Legacy run info file: up to five little-endian `u32` values overriding
//! the command line.
//!
//! | offset | field               |
//! |--------|---------------------|
//! | 0      | seed                |
//! | 4      | record mode (0/1)   |
//! | 8      | max bytes           |
//! | 12     | window length       |
//! | 16     | actions per window  |
//!
//! Values past the end of the file keep whatever the config already holds.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tasrig_harness::{HarnessConfig, Mode};
use tracing::{info, warn};

const FIELDS: [&str; 5] = [
    "seed",
    "record_mode",
    "max_bytes",
    "window_length_max",
    "random_action_max",
];

/// Apply the info file at `path` to `config`. A missing file leaves the
/// config untouched.
pub fn apply(path: &Path, config: &mut HarnessConfig) -> Result<()> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "info file not found, using defaults");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading info file {}", path.display()));
        }
    };

    let applied = apply_bytes(&bytes, config);
    info!(path = %path.display(), applied, "info file loaded");
    Ok(())
}

/// Apply as many whole values as `bytes` holds. Returns how many were used.
pub fn apply_bytes(bytes: &[u8], config: &mut HarnessConfig) -> usize {
    let mut values = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));

    let mut applied = 0;
    for (index, field) in FIELDS.iter().enumerate() {
        let Some(value) = values.next() else {
            warn!(field, "missing from info file, keeping default");
            continue;
        };
        match index {
            0 => config.seed = value,
            1 => config.mode = Mode::from_flag(value),
            2 => config.max_bytes = value,
            3 => config.window.window_length_max = value,
            _ => config.window.random_action_max = value,
        }
        applied += 1;
    }
    applied
}
