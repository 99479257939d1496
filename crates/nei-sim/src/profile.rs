//! Time-dependent driving profiles for temperature and density.

use nei_core::{interp_linear, is_strictly_increasing};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A physical driver as a function of time.
#[derive(Clone)]
pub enum Profile {
    /// Same value at every time.
    Constant(f64),
    /// Piecewise-linear through `(times, values)`.
    Sampled { times: Vec<f64>, values: Vec<f64> },
    /// Arbitrary function of time in seconds.
    Function(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("{what}: {times} sample times but {values} values")]
    LengthMismatch {
        what: &'static str,
        times: usize,
        values: usize,
    },

    #[error("{what}: sample times must be finite and strictly increasing")]
    NotIncreasing { what: &'static str },

    #[error("{what}: no samples")]
    Empty { what: &'static str },

    #[error("{what}: time {time} lies outside [{start}, {end}]")]
    OutOfBounds {
        what: &'static str,
        time: f64,
        start: f64,
        end: f64,
    },

    #[error("{what} = {value} at time {time}")]
    InvalidValue {
        what: &'static str,
        time: f64,
        value: f64,
    },
}

impl Profile {
    /// Sampled profile, checked for shape and monotonic times.
    pub fn sampled(
        what: &'static str,
        times: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, ProfileError> {
        let profile = Profile::Sampled { times, values };
        profile.check_shape(what)?;
        Ok(profile)
    }

    /// Shape and ordering checks for sampled profiles. Other kinds pass.
    pub fn check_shape(&self, what: &'static str) -> Result<(), ProfileError> {
        let Profile::Sampled { times, values } = self else {
            return Ok(());
        };
        if times.is_empty() {
            return Err(ProfileError::Empty { what });
        }
        if times.len() != values.len() {
            return Err(ProfileError::LengthMismatch {
                what,
                times: times.len(),
                values: values.len(),
            });
        }
        if times.iter().any(|t| !t.is_finite()) || !is_strictly_increasing(times) {
            return Err(ProfileError::NotIncreasing { what });
        }
        Ok(())
    }

    pub fn function(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Profile::Function(Arc::new(f))
    }

    /// First and last sample times, for sampled profiles.
    pub fn sample_span(&self) -> Option<(f64, f64)> {
        match self {
            Profile::Sampled { times, .. } => Some((*times.first()?, *times.last()?)),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Profile::Constant(_))
    }

    /// Raw value at `time`, without physical checks.
    pub fn value_at(&self, what: &'static str, time: f64) -> Result<f64, ProfileError> {
        match self {
            Profile::Constant(v) => Ok(*v),
            Profile::Sampled { times, values } => {
                interp_linear(times, values, time).ok_or_else(|| ProfileError::OutOfBounds {
                    what,
                    time,
                    start: times.first().copied().unwrap_or(f64::NAN),
                    end: times.last().copied().unwrap_or(f64::NAN),
                })
            }
            Profile::Function(f) => Ok(f(time)),
        }
    }
}

impl From<f64> for Profile {
    fn from(value: f64) -> Self {
        Profile::Constant(value)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Profile::Sampled { times, values } => f
                .debug_struct("Sampled")
                .field("times", times)
                .field("values", values)
                .finish(),
            Profile::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// What a driver represents, which decides the admissible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// Electron temperature in kelvin, strictly positive.
    Temperature,
    /// Hydrogen number density scale in cm^-3, non-negative.
    DensityScale,
}

impl DriverKind {
    pub fn label(self) -> &'static str {
        match self {
            DriverKind::Temperature => "electron temperature",
            DriverKind::DensityScale => "density scale",
        }
    }

    fn admits(self, value: f64) -> bool {
        match self {
            DriverKind::Temperature => value.is_finite() && value > 0.0,
            DriverKind::DensityScale => value.is_finite() && value >= 0.0,
        }
    }
}

/// A profile bound to a run's time domain.
#[derive(Debug, Clone)]
pub struct Driver {
    kind: DriverKind,
    profile: Profile,
    start: f64,
    end: f64,
}

impl Driver {
    pub fn new(kind: DriverKind, profile: Profile, start: f64, end: f64) -> Self {
        Self {
            kind,
            profile,
            start,
            end,
        }
    }

    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Evaluate at `time`, which must lie in the run's time domain.
    pub fn evaluate(&self, time: f64) -> Result<f64, ProfileError> {
        let what = self.kind.label();
        if !(self.start..=self.end).contains(&time) {
            return Err(ProfileError::OutOfBounds {
                what,
                time,
                start: self.start,
                end: self.end,
            });
        }
        let value = self.profile.value_at(what, time)?;
        if !self.kind.admits(value) {
            return Err(ProfileError::InvalidValue { what, time, value });
        }
        Ok(value)
    }
}
