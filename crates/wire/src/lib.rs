//! tasrig Wire Types
//!
//! This crate defines the controller state shared by every tasrig crate and
//! the two on-disk formats the harness produces:
//!
//! - **Input records**: one 4-byte record per simulation frame,
//!   `[button_high, button_low, stick_x, stick_y]`. No header, no footer,
//!   no checksum. Frame `i` lives at byte offset `4 * i`.
//! - **Run reports**: a Protobuf message summarizing a finished run, written
//!   next to the input stream so the stream can be checked later.

#![deny(unsafe_code)]

use prost::Message;

// ============================================================================
// Type Aliases
// ============================================================================

/// Zero-based simulation frame index.
pub type Frame = u32;

/// Encoded input record as stored on disk.
pub type RecordBytes = [u8; RECORD_LEN];

/// Size of one input record in bytes.
pub const RECORD_LEN: usize = 4;

/// Synthetic stick values are drawn from `[-STICK_LIMIT, STICK_LIMIT]`.
pub const STICK_LIMIT: i8 = 80;

// ============================================================================
// Buttons
// ============================================================================

/// Controller button bits, high byte first on disk.
pub mod buttons {
    pub const A_BUTTON: u16 = 0x8000;
    pub const B_BUTTON: u16 = 0x4000;
    pub const Z_TRIG: u16 = 0x2000;
    pub const START_BUTTON: u16 = 0x1000;
    pub const U_JPAD: u16 = 0x0800;
    pub const D_JPAD: u16 = 0x0400;
    pub const L_JPAD: u16 = 0x0200;
    pub const R_JPAD: u16 = 0x0100;
    pub const L_TRIG: u16 = 0x0020;
    pub const R_TRIG: u16 = 0x0010;
    pub const U_CBUTTONS: u16 = 0x0008;
    pub const D_CBUTTONS: u16 = 0x0004;
    pub const L_CBUTTONS: u16 = 0x0002;
    pub const R_CBUTTONS: u16 = 0x0001;

    /// All four D-pad directions.
    pub const D_PAD: u16 = U_JPAD | D_JPAD | L_JPAD | R_JPAD;
}

// ============================================================================
// Pad
// ============================================================================

/// Controller state for a single frame.
///
/// Stick axes are signed. Live and recorded values are carried as-is; only
/// synthetic pads are guaranteed to stay within `[-80, 80]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pad {
    pub button: u16,
    pub stick_x: i8,
    pub stick_y: i8,
}

impl Pad {
    /// Neutral pad: no buttons, centered stick.
    pub const NEUTRAL: Self = Self {
        button: 0,
        stick_x: 0,
        stick_y: 0,
    };

    pub fn new(button: u16, stick_x: i8, stick_y: i8) -> Self {
        Self {
            button,
            stick_x,
            stick_y,
        }
    }

    /// True if every bit of `mask` is held.
    pub fn is_held(&self, mask: u16) -> bool {
        self.button & mask == mask
    }

    /// True if any bit of `mask` is held.
    pub fn any_held(&self, mask: u16) -> bool {
        self.button & mask != 0
    }

    /// Encode as `[button_high, button_low, stick_x, stick_y]`.
    pub fn to_record(&self) -> RecordBytes {
        let [high, low] = self.button.to_be_bytes();
        [high, low, self.stick_x as u8, self.stick_y as u8]
    }

    /// Decode a 4-byte record. Every bit pattern is a valid pad.
    pub fn from_record(bytes: RecordBytes) -> Self {
        Self {
            button: u16::from_be_bytes([bytes[0], bytes[1]]),
            stick_x: bytes[2] as i8,
            stick_y: bytes[3] as i8,
        }
    }
}

impl From<RecordBytes> for Pad {
    fn from(bytes: RecordBytes) -> Self {
        Self::from_record(bytes)
    }
}

impl From<Pad> for RecordBytes {
    fn from(pad: Pad) -> Self {
        pad.to_record()
    }
}

impl std::fmt::Display for Pad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "button={:#06x} stick=({}, {})",
            self.button, self.stick_x, self.stick_y
        )
    }
}

/// Where the pad applied to a frame came from.
///
/// `Synthetic` pads were generated by the exploration scheduler and consumed
/// exactly five PRNG draws. `Passthrough` pads carry the live values and
/// consumed none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadOrigin {
    Synthetic,
    Passthrough,
}

impl PadOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

// ============================================================================
// Run Report
// ============================================================================

/// Current run report schema version.
pub const REPORT_FORMAT_VERSION: u32 = 1;

/// Summary of one harness run, stored next to the input stream.
#[derive(Clone, PartialEq, Message)]
pub struct RunReport {
    /// Schema version (starts at 1).
    #[prost(uint32, tag = "1")]
    pub report_format_version: u32,

    /// Seed the PRNG was initialized with.
    #[prost(uint32, tag = "2")]
    pub seed: u32,

    /// True if the run was allowed to record after playback ended.
    #[prost(bool, tag = "3")]
    pub record_mode: bool,

    /// Exploration window length.
    #[prost(uint32, tag = "4")]
    pub window_length_max: u32,

    /// Exploration quota per window.
    #[prost(uint32, tag = "5")]
    pub random_action_max: u32,

    /// Byte budget the run was held to.
    #[prost(uint32, tag = "6")]
    pub max_bytes: u32,

    /// Frames replayed from the stream.
    #[prost(uint32, tag = "7")]
    pub frames_played: u32,

    /// Frames appended to the stream.
    #[prost(uint32, tag = "8")]
    pub frames_recorded: u32,

    /// Frames whose input was replaced by a synthetic pad.
    #[prost(uint32, tag = "9")]
    pub frames_explored: u32,

    /// Length of the stream in bytes after finalization.
    #[prost(uint64, tag = "10")]
    pub stream_length: u64,

    /// Lowercase hex SHA-256 of the finalized stream.
    #[prost(string, tag = "11")]
    pub stream_sha256: String,

    /// Why the run stopped (e.g. "complete", "budget_exceeded").
    #[prost(string, tag = "12")]
    pub end_reason: String,

    /// Process exit status the driver used.
    #[prost(int32, tag = "13")]
    pub exit_code: i32,
}

// ============================================================================
// Tests
// ============================================================================
