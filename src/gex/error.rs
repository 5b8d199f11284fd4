use super::contract::OptionType;
use thiserror::Error;

/// Failures that abort a snapshot's exposure run.
///
/// Zero volatility, zero time to expiry and a missing flip point are not
/// errors: the first two contribute zero gamma, the last is `None`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GexError {
    #[error("cannot decode option identifier '{identifier}': {reason}")]
    Decoding { identifier: String, reason: String },

    #[error("put/call merge failed: {calls} calls vs {puts} puts")]
    PairingCountMismatch { calls: usize, puts: usize },

    #[error("put/call merge failed: {side} {key} has no counterpart")]
    UnmatchedContract { side: OptionType, key: String },

    #[error("put/call merge failed: {side} {key} appears more than once")]
    DuplicateContract { side: OptionType, key: String },

    #[error("spot price must be finite and positive, got {0}")]
    InvalidSpot(f64),

    #[error("invalid profile configuration: {0}")]
    InvalidProfileConfig(String),
}

impl GexError {
    pub(crate) fn decoding(identifier: &str, reason: impl Into<String>) -> Self {
        GexError::Decoding {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the call/put merge family.
    pub fn is_pairing_mismatch(&self) -> bool {
        matches!(
            self,
            GexError::PairingCountMismatch { .. }
                | GexError::UnmatchedContract { .. }
                | GexError::DuplicateContract { .. }
        )
    }
}

pub type GexResult<T> = Result<T, GexError>;
