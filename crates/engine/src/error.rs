//! Error taxonomy for engine operations.

use ledger::LedgerError;
use std::fmt;
use store::StoreError;
use types::ParamsError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the auction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unknown auction or user.
    NotFound(String),
    /// Malformed input or validation failure.
    BadRequest(String),
    /// The operation does not apply to the aggregate's current state.
    IllegalState(String),
    /// Bid admission attempted at or after the round deadline.
    RoundEnded,
    /// The debit would take the user's balance below zero.
    InsufficientBalance,
    /// A concurrent aggregate update won the race; the caller may retry.
    Conflict,
    /// Unexpected store or ledger failure.
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotFound(msg) => write!(f, "not found: {}", msg),
            EngineError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            EngineError::IllegalState(msg) => write!(f, "illegal state: {}", msg),
            EngineError::RoundEnded => write!(f, "round has ended"),
            EngineError::InsufficientBalance => write!(f, "insufficient balance"),
            EngineError::Conflict => write!(f, "concurrent update conflict, retry"),
            EngineError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UnknownUser(id) => EngineError::NotFound(format!("user {}", id)),
            LedgerError::InsufficientBalance { .. } => EngineError::InsufficientBalance,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Internal(e.to_string())
    }
}

impl From<ParamsError> for EngineError {
    fn from(e: ParamsError) -> Self {
        EngineError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Cash;

    #[test]
    fn test_ledger_error_mapping() {
        let err: EngineError = LedgerError::UnknownUser("u1".into()).into();
        assert!(matches!(err, EngineError::NotFound(_)));

        let err: EngineError = LedgerError::InsufficientBalance {
            balance: Cash::from_float(4.0),
            requested: Cash::from_float(5.0),
        }
        .into();
        assert_eq!(err, EngineError::InsufficientBalance);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            EngineError::IllegalState("round has not ended".into()).to_string(),
            "illegal state: round has not ended"
        );
        assert_eq!(EngineError::RoundEnded.to_string(), "round has ended");
    }
}
