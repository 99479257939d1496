//! Error types for configuring and running a simulation.

use crate::controller::Phase;
use crate::profile::ProfileError;
use nei_atomic::AtomicError;
use nei_states::StateError;
use nei_tables::TableError;
use thiserror::Error;

/// Errors from configuration, table construction and stepping.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Rate data error: {0}")]
    Data(#[from] TableError),

    #[error("Profile evaluation error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Step {step} failed for {}: {source}", .element.unwrap_or("drivers"))]
    Step {
        step: usize,
        element: Option<&'static str>,
        #[source]
        source: Box<SimError>,
    },

    #[error("Invalid ionization state: {0}")]
    State(#[from] StateError),

    #[error("Simulation record: {what}")]
    Record { what: String },

    #[error("Numerical failure: {what}")]
    Numerical { what: String },

    #[error("Controller is {actual}, expected {expected}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("Not implemented: {what}")]
    Unimplemented { what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<AtomicError> for SimError {
    fn from(e: AtomicError) -> Self {
        SimError::Data(TableError::Data(e))
    }
}

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        SimError::Configuration { what: what.into() }
    }

    pub(crate) fn record(what: impl Into<String>) -> Self {
        SimError::Record { what: what.into() }
    }

    pub(crate) fn at_step(self, step: usize, element: Option<&'static str>) -> Self {
        SimError::Step {
            step,
            element,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_names_element() {
        let err = SimError::Numerical {
            what: "non-finite fractions".into(),
        }
        .at_step(7, Some("He"));
        let msg = err.to_string();
        assert!(msg.contains("Step 7"));
        assert!(msg.contains("He"));
        assert!(msg.contains("non-finite"));
    }

    #[test]
    fn step_error_without_element() {
        let err = SimError::config("x").at_step(3, None);
        assert!(err.to_string().contains("drivers"));
    }

    #[test]
    fn atomic_errors_are_data_errors() {
        let err: SimError = AtomicError::UnknownElement { query: "Xx".into() }.into();
        assert!(matches!(err, SimError::Data(TableError::Data(_))));
    }
}
