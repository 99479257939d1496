//! nei-states: charge-state distributions.
//!
//! - `IonizationStateVector`: validated ionic fractions of one element
//! - `IonizationStates`: several elements with abundances, temperature and
//!   hydrogen number density

pub mod collection;
pub mod error;
pub mod vector;

pub use collection::IonizationStates;
pub use error::{StateError, StateResult};
pub use vector::{ChargeState, DEFAULT_TOLERANCE, IonizationStateVector};
