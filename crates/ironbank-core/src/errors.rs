//! Error types for Iron Bank

use thiserror::Error;

/// Core errors that can occur in Iron Bank
#[derive(Debug, Error)]
pub enum Error {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Quote computation errors
///
/// Both variants mean "cannot quote right now". They are recovered locally
/// by withholding the output and never surface as a user-facing fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Quote unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: &'static str },
}

impl QuoteError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::QuoteUnavailable {
            reason: reason.into(),
        }
    }
}

/// Errors from external collaborators (backend API, ledger, wallet)
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("Endpoint unreachable at {url}")]
    Unreachable { url: String },

    #[error("Endpoint returned error: {message}")]
    ApiError { message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Not yet available: {what}")]
    NotAvailable { what: String },

    #[error("Rejected by wallet: {reason}")]
    Rejected { reason: String },

    #[error("Transaction reverted: {reason}")]
    Reverted { reason: String },

    #[error("Timed out waiting for {what}")]
    Timeout { what: String },
}

/// Protocol validation errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Protocol not available on {network}")]
    NetworkNotSupported { network: String },

    #[error("Protocol state unavailable: {reason}")]
    StateUnavailable { reason: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Action not allowed: {reason}")]
    ActionNotAllowed { reason: String },

    #[error("Insufficient balance ({token}): need {required}, have {available}")]
    InsufficientBalance {
        token: String,
        required: u64,
        available: u64,
    },

    #[error("Balances not yet loaded for the active account")]
    BalanceUnavailable,
}

/// Transaction sequencing errors
#[derive(Debug, Clone, Error)]
pub enum TxError {
    #[error("Approval {step} ({token}) rejected: {reason}")]
    ApprovalRejected {
        step: usize,
        token: String,
        reason: String,
    },

    #[error("Approval {step} ({token}) failed: {reason}")]
    ApprovalFailed {
        step: usize,
        token: String,
        reason: String,
    },

    #[error("Pool {call} call failed: {reason}")]
    SubmissionFailed { call: String, reason: String },

    /// The pool call may have been broadcast; its outcome is unknown
    #[error("Pool {call} call unconfirmed: {reason}")]
    SubmissionUnconfirmed { call: String, reason: String },

    #[error("Another transaction sequence is already pending")]
    SequenceInFlight,

    #[error("Invalid sequence state: {state}")]
    InvalidState { state: String },
}

/// Result type alias for Iron Bank operations
pub type Result<T> = std::result::Result<T, Error>;

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NetworkNotSupported { .. } => "network_not_supported",
            Self::StateUnavailable { .. } => "state_unavailable",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::ActionNotAllowed { .. } => "action_not_allowed",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::BalanceUnavailable => "balance_unavailable",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } => 400,
            Self::InsufficientBalance { .. } => 422,
            Self::ActionNotAllowed { .. } | Self::NetworkNotSupported { .. } => 422,
            Self::StateUnavailable { .. } | Self::BalanceUnavailable => 503,
        }
    }
}

impl TxError {
    /// The step index (1-based) this error belongs to, if it is a step failure
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::ApprovalRejected { step, .. } | Self::ApprovalFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_codes() {
        let err = ProtocolError::InvalidAmount {
            message: "test".into(),
        };
        assert_eq!(err.error_code(), "invalid_amount");
        assert_eq!(err.status_code(), 400);

        let err = ProtocolError::InsufficientBalance {
            token: "USDC".into(),
            required: 100,
            available: 50,
        };
        assert_eq!(err.error_code(), "insufficient_balance");
        assert_eq!(err.status_code(), 422);

        assert_eq!(ProtocolError::BalanceUnavailable.status_code(), 503);
    }

    #[test]
    fn test_quote_error_display() {
        let err = QuoteError::unavailable("share price not loaded");
        assert_eq!(err.to_string(), "Quote unavailable: share price not loaded");

        let err = QuoteError::ArithmeticOverflow {
            operation: "mint output",
        };
        assert_eq!(err.to_string(), "Arithmetic overflow in mint output");
    }

    #[test]
    fn test_tx_error_step() {
        let err = TxError::ApprovalRejected {
            step: 2,
            token: "TITAN".into(),
            reason: "user denied".into(),
        };
        assert_eq!(err.step(), Some(2));
        assert_eq!(TxError::SequenceInFlight.step(), None);
    }
}
