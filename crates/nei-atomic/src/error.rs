//! Atomic data errors.

use nei_core::CoreError;
use thiserror::Error;

/// Result type for atomic data operations.
pub type AtomicResult<T> = Result<T, AtomicError>;

/// Errors raised while resolving elements or reading rate coefficients.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtomicError {
    /// Symbol, name or atomic number does not name a supported element.
    #[error("Unknown element: {query}")]
    UnknownElement { query: String },

    /// The rate source holds no coefficients for this element.
    #[error("No rate coefficients for element {symbol}")]
    MissingElement { symbol: &'static str },

    /// Coefficients exist but are unusable.
    #[error("Malformed rate data for {symbol}: {what}")]
    Malformed { symbol: &'static str, what: String },

    /// Rate catalog could not be decoded.
    #[error("Rate catalog decode error: {message}")]
    Decode { message: String },
}

impl From<serde_json::Error> for AtomicError {
    fn from(err: serde_json::Error) -> Self {
        AtomicError::Decode {
            message: err.to_string(),
        }
    }
}

impl From<AtomicError> for CoreError {
    fn from(err: AtomicError) -> Self {
        match err {
            AtomicError::UnknownElement { .. } => CoreError::InvalidArg {
                what: "unknown element",
            },
            AtomicError::MissingElement { .. }
            | AtomicError::Malformed { .. }
            | AtomicError::Decode { .. } => CoreError::Invariant {
                what: "rate data unavailable",
            },
        }
    }
}
