//! nei-core: shared foundation for the non-equilibrium ionization engine.
//!
//! Contains:
//! - numeric (tolerances, float and grid helpers)
//! - timing (opt-in wall-clock accounting for table builds and stepping)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
