//! Fatal harness conditions.
//!
//! Nothing here is retried. Library code returns these to the driver, which
//! decides how to stop; `Harness::terminate` is the only place the process
//! exits.

use tasrig_replay::{ReportError, StoreError};
use tasrig_wire::{Frame, Pad};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid harness configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Report(#[from] ReportError),

    /// A recorded frame disagreed with the exploration pad generated for it:
    /// the stream came from a different seed, build, or was edited.
    #[error(
        "playback diverged from exploration stream at frame {frame}: generated {expected}, recorded {recorded}"
    )]
    Verification {
        frame: Frame,
        expected: Pad,
        recorded: Pad,
    },

    #[error("byte budget of {max_bytes} exhausted at frame {frame}")]
    BudgetExceeded { frame: Frame, max_bytes: u32 },

    #[error("recorded input ended at frame {frame} ({bytes} bytes) before the run completed")]
    PlaybackIncomplete { frame: Frame, bytes: u32 },

    #[error("operator aborted the run at frame {frame}")]
    OperatorAbort { frame: Frame },

    #[error("harness already terminated")]
    Terminated,
}

impl HarnessError {
    /// Process exit status for this failure. Always nonzero.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Short machine-readable reason, stored in run reports.
    pub fn end_reason(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Store(_) => "io_error",
            Self::Report(_) => "report_error",
            Self::Verification { .. } => "verification_failed",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::PlaybackIncomplete { .. } => "playback_incomplete",
            Self::OperatorAbort { .. } => "operator_abort",
            Self::Terminated => "terminated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_exits_nonzero() {
        let errors = [
            HarnessError::Config(ConfigError::ZeroBudget),
            HarnessError::Verification {
                frame: 3,
                expected: Pad::NEUTRAL,
                recorded: Pad::new(1, 0, 0),
            },
            HarnessError::BudgetExceeded {
                frame: 10,
                max_bytes: 40,
            },
            HarnessError::PlaybackIncomplete { frame: 0, bytes: 0 },
            HarnessError::OperatorAbort { frame: 1 },
            HarnessError::Terminated,
        ];
        for error in &errors {
            assert_ne!(error.exit_code(), 0, "{error}");
        }
    }

    #[test]
    fn test_verification_message_names_both_pads() {
        let error = HarnessError::Verification {
            frame: 7,
            expected: Pad::new(0x8000, 1, 2),
            recorded: Pad::new(0x4000, 3, 4),
        };
        let message = error.to_string();
        assert!(message.contains("frame 7"));
        assert!(message.contains("0x8000"));
        assert!(message.contains("0x4000"));
    }
}
