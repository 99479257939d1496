//! Charge-state distribution errors.

use nei_atomic::AtomicError;
use nei_core::CoreError;
use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("{symbol}: expected {expected} ionic fractions, got {actual}")]
    WrongLength {
        symbol: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{symbol}: ionic fraction of charge {charge} is {value}, must lie in [0, 1]")]
    FractionOutOfRange {
        symbol: &'static str,
        charge: usize,
        value: f64,
    },

    #[error("{symbol}: ionic fractions sum to {sum}, not 1 within {tol}")]
    NotNormalized {
        symbol: &'static str,
        sum: f64,
        tol: f64,
    },

    #[error("Tolerance must satisfy 0 <= tol < 1, got {value}")]
    InvalidTolerance { value: f64 },

    #[error("Invalid {what}: {value}")]
    InvalidQuantity { what: &'static str, value: f64 },

    #[error("{symbol}: no number density available")]
    MissingDensity { symbol: &'static str },

    #[error("Element {symbol} is not tracked")]
    UntrackedElement { symbol: &'static str },

    #[error("Element {symbol} appears more than once")]
    DuplicateElement { symbol: &'static str },

    #[error("Missing abundance for {symbol}")]
    MissingAbundance { symbol: &'static str },

    #[error("Cannot compare {left} with {right}")]
    ElementMismatch {
        left: &'static str,
        right: &'static str,
    },

    #[error(transparent)]
    Atomic(#[from] AtomicError),
}

impl From<StateError> for CoreError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::WrongLength { .. } | StateError::FractionOutOfRange { .. } => {
                CoreError::InvalidArg {
                    what: "ionic fractions",
                }
            }
            StateError::InvalidTolerance { .. } | StateError::InvalidQuantity { .. } => {
                CoreError::InvalidArg {
                    what: "state parameter",
                }
            }
            _ => CoreError::Invariant {
                what: "ionization state",
            },
        }
    }
}
