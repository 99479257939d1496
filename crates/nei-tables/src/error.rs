//! Error types for rate table construction and lookup.

use nei_atomic::AtomicError;
use thiserror::Error;

pub type TableResult<T> = Result<T, TableError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Rate data error: {0}")]
    Data(#[from] AtomicError),

    #[error("Eigendecomposition failed for {symbol} at node {node}: {what}")]
    Decomposition {
        symbol: &'static str,
        node: usize,
        what: String,
    },

    #[error("Equilibrium distribution failed for {symbol} at node {node}: {what}")]
    Equilibrium {
        symbol: &'static str,
        node: usize,
        what: String,
    },

    #[error("Grid index out of bounds: {index} (len={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid temperature query: {value}")]
    InvalidTemperature { value: f64 },
}
