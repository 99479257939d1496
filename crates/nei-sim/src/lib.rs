//! Time-dependent non-equilibrium ionization.
//!
//! Provides:
//! - Temperature and density drivers from constant, sampled or functional profiles
//! - Validated run configuration
//! - Closed-form eigenvector advance over fixed steps
//! - The `Nei` controller and its append-only `SimulationRecord`
//! - Rankine-Hugoniot jump helpers for shock-heated setups

pub mod advance;
pub mod config;
pub mod controller;
pub mod error;
pub mod profile;
pub mod record;
pub mod shock;

pub use advance::{advance, advance_with};
pub use config::{DEFAULT_FINAL_TOLERANCE, DEFAULT_MAX_STEPS, RunConfig, RunConfigBuilder};
pub use controller::{DoneReason, EquilibriumQuery, Nei, Phase, SimProgress, StepResult};
pub use error::{SimError, SimResult};
pub use profile::{Driver, DriverKind, Profile, ProfileError};
pub use record::SimulationRecord;
