//! Run-definition validation.
//!
//! Checks what can be checked without building rate tables. Driver values
//! and time-domain coverage are checked again by `RunConfig::build`.

use crate::schema::{ProfileDef, RateSourceDef, RunDef};
use nei_atomic::Element;
use nei_core::is_strictly_increasing;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Unknown element: {query}")]
    UnknownElement { query: String },

    #[error("Duplicate element: {symbol}")]
    DuplicateElement { symbol: &'static str },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Resolve a symbol, name or atomic number.
pub fn resolve_element(query: &str) -> Result<Element, ValidationError> {
    let unknown = || ValidationError::UnknownElement {
        query: query.to_string(),
    };
    match query.trim().parse::<u8>() {
        Ok(z) => Element::from_atomic_number(z).map_err(|_| unknown()),
        Err(_) => Element::from_symbol(query).map_err(|_| unknown()),
    }
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_run(run: &RunDef) -> Result<(), ValidationError> {
    if run.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: run.version,
        });
    }
    if run.elements.is_empty() {
        return Err(invalid("elements", "[]", "at least one element is required"));
    }

    let mut seen = HashSet::new();
    for def in &run.elements {
        let element = resolve_element(&def.element)?;
        if !seen.insert(element) {
            return Err(ValidationError::DuplicateElement {
                symbol: element.symbol(),
            });
        }
        let field = format!("elements.{}", element.symbol());
        if !def.abundance.is_finite() || def.abundance < 0.0 {
            return Err(invalid(
                format!("{field}.abundance"),
                def.abundance,
                "must be finite and non-negative",
            ));
        }
        if let Some(fractions) = &def.initial_fractions {
            if fractions.len() != element.nstates() {
                return Err(invalid(
                    format!("{field}.initial_fractions"),
                    fractions.len(),
                    "length must be atomic number + 1",
                ));
            }
        }
    }
    if !seen.contains(&Element::HYDROGEN) {
        return Err(invalid("elements", "no H", "hydrogen must be tracked"));
    }

    validate_profile("temperature", &run.temperature)?;
    validate_profile("density_scale", &run.density_scale)?;

    if !run.dt.is_finite() || run.dt <= 0.0 {
        return Err(invalid("dt", run.dt, "must be positive"));
    }
    if let (Some(start), Some(end)) = (run.time_start, run.time_max) {
        if start >= end {
            return Err(invalid("time_max", end, "must exceed time_start"));
        }
    }
    if run.max_steps == Some(0) {
        return Err(invalid("max_steps", 0, "must be positive"));
    }

    if let RateSourceDef::Hydrogenic {
        log_t_min,
        log_t_max,
        nodes,
    } = &run.rates
    {
        if *nodes < 2 {
            return Err(invalid("rates.nodes", nodes, "need at least two grid nodes"));
        }
        if !(log_t_min.is_finite() && log_t_max.is_finite() && log_t_min < log_t_max) {
            return Err(invalid(
                "rates.log_t_max",
                log_t_max,
                "must be finite and exceed log_t_min",
            ));
        }
    }
    Ok(())
}

fn validate_profile(field: &str, profile: &ProfileDef) -> Result<(), ValidationError> {
    match profile {
        ProfileDef::Constant { value } => {
            if !value.is_finite() {
                return Err(invalid(format!("{field}.value"), value, "must be finite"));
            }
        }
        ProfileDef::Sampled { times, values } => {
            if times.is_empty() {
                return Err(invalid(format!("{field}.times"), "[]", "no samples"));
            }
            if times.len() != values.len() {
                return Err(invalid(
                    format!("{field}.values"),
                    values.len(),
                    "must match the number of times",
                ));
            }
            if times.iter().any(|t| !t.is_finite()) || !is_strictly_increasing(times) {
                return Err(invalid(
                    format!("{field}.times"),
                    "unordered",
                    "must be strictly increasing",
                ));
            }
        }
    }
    Ok(())
}
