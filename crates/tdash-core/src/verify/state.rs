//! Per-file verification state machine.
//!
//! ```text
//! NotRequested -> Calculating -> Failed
//!                             -> Calculated -> Skipped | Verified | Mismatch
//! ```

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum VerifyState {
    NotRequested,
    Calculating,
    Failed(String),
    Calculated,
    Skipped,
    Verified,
    Mismatch,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("cannot {action} while {from}")]
    InvalidTransition { from: &'static str, action: &'static str },
}

impl VerifyState {
    pub fn name(&self) -> &'static str {
        match self {
            VerifyState::NotRequested => "not requested",
            VerifyState::Calculating => "calculating",
            VerifyState::Failed(_) => "failed",
            VerifyState::Calculated => "calculated",
            VerifyState::Skipped => "skipped",
            VerifyState::Verified => "verified",
            VerifyState::Mismatch => "mismatch",
        }
    }

    /// No further transitions are possible.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            VerifyState::Failed(_) | VerifyState::Skipped | VerifyState::Verified | VerifyState::Mismatch
        )
    }

    fn reject(&self, action: &'static str) -> VerifyError {
        VerifyError::InvalidTransition {
            from: self.name(),
            action,
        }
    }

    pub fn begin(self) -> Result<Self, VerifyError> {
        match self {
            VerifyState::NotRequested => Ok(VerifyState::Calculating),
            other => Err(other.reject("start calculation")),
        }
    }

    pub fn calculated(self) -> Result<Self, VerifyError> {
        match self {
            VerifyState::Calculating => Ok(VerifyState::Calculated),
            other => Err(other.reject("record digest")),
        }
    }

    pub fn failed(self, reason: String) -> Result<Self, VerifyError> {
        match self {
            VerifyState::Calculating => Ok(VerifyState::Failed(reason)),
            other => Err(other.reject("record failure")),
        }
    }

    pub fn skipped(self) -> Result<Self, VerifyError> {
        match self {
            VerifyState::Calculated => Ok(VerifyState::Skipped),
            other => Err(other.reject("skip comparison")),
        }
    }

    pub fn compared(self, matched: bool) -> Result<Self, VerifyError> {
        match self {
            VerifyState::Calculated if matched => Ok(VerifyState::Verified),
            VerifyState::Calculated => Ok(VerifyState::Mismatch),
            other => Err(other.reject("compare digests")),
        }
    }
}
