//! nei-atomic: atomic data consumed by the ionization engine.
//!
//! Provides:
//! - Element catalog (symbol, name, atomic number)
//! - `RateSource` trait for the external rate-coefficient collaborator
//! - `ElementRates`: validated ionization/recombination coefficients on a temperature grid
//! - `RateCatalog`: in-memory source, loadable from JSON
//! - `HydrogenicRates`: analytic synthetic rates for running without an atomic database
//!
//! # Example
//!
//! ```
//! use nei_atomic::{Element, HydrogenicRates, RateSource};
//!
//! let oxygen = Element::from_symbol("O").unwrap();
//! let rates = HydrogenicRates::default().element_rates(oxygen).unwrap();
//! assert_eq!(rates.nstates(), 9);
//! ```

pub mod catalog;
pub mod element;
pub mod error;
pub mod hydrogenic;
pub mod rates;

pub use catalog::{RateCatalog, RawElementRates};
pub use element::Element;
pub use error::{AtomicError, AtomicResult};
pub use hydrogenic::HydrogenicRates;
pub use rates::{ElementRates, RateSource};
