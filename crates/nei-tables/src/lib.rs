//! Eigenvalue rate tables for non-equilibrium ionization.
//!
//! For each element the linear rate-transfer matrix `A(T)` couples charge
//! state `k` to its neighbours through ionization and recombination. Along a
//! temperature grid this crate precomputes, once per node:
//!
//! - eigenvalues `λ` sorted ascending, and eigenvectors `V` with `A V = V diag(λ)`
//! - the inverse `V⁻¹`
//! - the equilibrium charge-state distribution, by direct recursive elimination
//!
//! The resulting [`RateTable`] is immutable. Lookups are pure functions of
//! the query temperature or grid index; temperatures outside the grid clamp
//! to the nearest boundary node and emit a `tracing` warning.

pub mod eigen;
pub mod equilibrium;
pub mod error;
pub mod matrix;
pub mod table;

pub use eigen::{Eigensystem, decompose};
pub use equilibrium::equilibrium_distribution;
pub use error::{TableError, TableResult};
pub use matrix::rate_matrix;
pub use table::{Boundary, GridIndex, GridQuery, RateTable, TableEntry};
