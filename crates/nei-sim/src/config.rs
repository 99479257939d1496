//! Run configuration and its validating builder.

use crate::error::{SimError, SimResult};
use crate::profile::{Driver, DriverKind, Profile};
use nei_atomic::Element;
use nei_states::DEFAULT_TOLERANCE;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_STEPS: usize = 1000;
pub const MAX_STEPS_LIMIT: usize = 1_000_000;
/// Tolerance of the final snapshot, looser than the run tolerance.
pub const DEFAULT_FINAL_TOLERANCE: f64 = 1e-6;
pub const SAFETY_FACTOR_RANGE: (f64, f64) = (1e-3, 1e3);

/// Validated, frozen description of one simulation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    abundances: BTreeMap<Element, f64>,
    initial_fractions: BTreeMap<Element, Vec<f64>>,
    temperature: Driver,
    density_scale: Driver,
    time_start: f64,
    time_max: f64,
    dt: f64,
    max_steps: usize,
    tol: f64,
    final_tol: f64,
    safety_factor: f64,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Tracked elements in order of atomic number.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.abundances.keys().copied()
    }

    pub fn abundances(&self) -> &BTreeMap<Element, f64> {
        &self.abundances
    }

    /// Caller-supplied initial fractions, if any for `element`.
    pub fn initial_fractions(&self, element: Element) -> Option<&[f64]> {
        self.initial_fractions.get(&element).map(Vec::as_slice)
    }

    pub fn temperature(&self) -> &Driver {
        &self.temperature
    }

    pub fn density_scale(&self) -> &Driver {
        &self.density_scale
    }

    pub fn time_start(&self) -> f64 {
        self.time_start
    }

    pub fn time_max(&self) -> f64 {
        self.time_max
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn final_tol(&self) -> f64 {
        self.final_tol
    }

    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// Whether `time` lies in `[time_start, time_max]`.
    pub fn in_time_interval(&self, time: f64) -> bool {
        (self.time_start..=self.time_max).contains(&time)
    }
}

/// Builder for [`RunConfig`]. Nothing is checked until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    abundances: Vec<(Element, f64)>,
    initial_fractions: Vec<(Element, Vec<f64>)>,
    temperature: Option<Profile>,
    density_scale: Option<Profile>,
    time_start: Option<f64>,
    time_max: Option<f64>,
    dt: Option<f64>,
    max_steps: usize,
    tol: f64,
    final_tol: f64,
    adapt_dt: bool,
    safety_factor: f64,
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self {
            abundances: Vec::new(),
            initial_fractions: Vec::new(),
            temperature: None,
            density_scale: None,
            time_start: None,
            time_max: None,
            dt: None,
            max_steps: DEFAULT_MAX_STEPS,
            tol: DEFAULT_TOLERANCE,
            final_tol: DEFAULT_FINAL_TOLERANCE,
            adapt_dt: false,
            safety_factor: 1.0,
        }
    }
}

impl RunConfigBuilder {
    /// Track `element` with abundance relative to hydrogen.
    pub fn element(mut self, element: Element, abundance: f64) -> Self {
        self.abundances.push((element, abundance));
        self
    }

    pub fn elements(mut self, abundances: impl IntoIterator<Item = (Element, f64)>) -> Self {
        self.abundances.extend(abundances);
        self
    }

    /// Start `element` from `fractions` instead of equilibrium.
    pub fn initial_fractions(mut self, element: Element, fractions: Vec<f64>) -> Self {
        self.initial_fractions.push((element, fractions));
        self
    }

    pub fn temperature(mut self, profile: impl Into<Profile>) -> Self {
        self.temperature = Some(profile.into());
        self
    }

    pub fn density_scale(mut self, profile: impl Into<Profile>) -> Self {
        self.density_scale = Some(profile.into());
        self
    }

    pub fn time_start(mut self, t: f64) -> Self {
        self.time_start = Some(t);
        self
    }

    pub fn time_max(mut self, t: f64) -> Self {
        self.time_max = Some(t);
        self
    }

    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = n;
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn final_tol(mut self, tol: f64) -> Self {
        self.final_tol = tol;
        self
    }

    pub fn adapt_dt(mut self, adapt: bool) -> Self {
        self.adapt_dt = adapt;
        self
    }

    pub fn safety_factor(mut self, factor: f64) -> Self {
        self.safety_factor = factor;
        self
    }

    pub fn build(self) -> SimResult<RunConfig> {
        if self.adapt_dt {
            return Err(SimError::Unimplemented {
                what: "adaptive time stepping",
            });
        }
        let (lo, hi) = SAFETY_FACTOR_RANGE;
        if !(lo..=hi).contains(&self.safety_factor) {
            return Err(SimError::config(format!(
                "safety factor {} outside [{lo}, {hi}]",
                self.safety_factor
            )));
        }
        if self.max_steps == 0 || self.max_steps > MAX_STEPS_LIMIT {
            return Err(SimError::config(format!(
                "max_steps must satisfy 0 < max_steps <= {MAX_STEPS_LIMIT}, got {}",
                self.max_steps
            )));
        }
        for (name, tol) in [("tol", self.tol), ("final_tol", self.final_tol)] {
            if !(0.0..1.0).contains(&tol) {
                return Err(SimError::config(format!("need 0 <= {name} < 1, got {tol}")));
            }
        }

        let abundances = collect_abundances(self.abundances)?;
        let initial_fractions = collect_initial(self.initial_fractions, &abundances)?;

        let temperature = self
            .temperature
            .ok_or_else(|| SimError::config("no electron temperature profile"))?;
        let density_scale = self
            .density_scale
            .ok_or_else(|| SimError::config("no density scale profile"))?;
        for (profile, kind) in [
            (&temperature, DriverKind::Temperature),
            (&density_scale, DriverKind::DensityScale),
        ] {
            profile
                .check_shape(kind.label())
                .map_err(|e| SimError::config(e.to_string()))?;
        }

        let spans: Vec<(f64, f64)> = [&temperature, &density_scale]
            .iter()
            .filter_map(|p| p.sample_span())
            .collect();
        let time_start = self
            .time_start
            .or_else(|| spans.first().map(|s| s.0))
            .unwrap_or(0.0);
        let time_max = self
            .time_max
            .or_else(|| spans.first().map(|s| s.1))
            .ok_or_else(|| {
                SimError::config("time_max is required when no profile is sampled")
            })?;
        if !time_start.is_finite() || !time_max.is_finite() {
            return Err(SimError::config("time bounds must be finite"));
        }
        if time_start >= time_max {
            return Err(SimError::config(format!(
                "need time_start < time_max, got {time_start} and {time_max}"
            )));
        }
        for (start, end) in &spans {
            if *start > time_start || *end < time_max {
                return Err(SimError::config(format!(
                    "sampled profile spans [{start}, {end}], which does not cover [{time_start}, {time_max}]"
                )));
            }
        }

        let dt = self
            .dt
            .ok_or_else(|| SimError::config("a fixed time step is required"))?;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::config(format!("time step must be positive, got {dt}")));
        }

        let temperature = Driver::new(DriverKind::Temperature, temperature, time_start, time_max);
        let density_scale =
            Driver::new(DriverKind::DensityScale, density_scale, time_start, time_max);
        for driver in [&temperature, &density_scale] {
            for t in [time_start, time_max] {
                driver.evaluate(t)?;
            }
        }

        Ok(RunConfig {
            abundances,
            initial_fractions,
            temperature,
            density_scale,
            time_start,
            time_max,
            dt,
            max_steps: self.max_steps,
            tol: self.tol,
            final_tol: self.final_tol,
            safety_factor: self.safety_factor,
        })
    }
}

fn collect_abundances(raw: Vec<(Element, f64)>) -> SimResult<BTreeMap<Element, f64>> {
    let mut abundances = BTreeMap::new();
    for (element, abundance) in raw {
        if !abundance.is_finite() || abundance < 0.0 {
            return Err(SimError::config(format!(
                "abundance of {} must be finite and non-negative, got {abundance}",
                element.symbol()
            )));
        }
        if abundances.insert(element, abundance).is_some() {
            return Err(SimError::config(format!(
                "element {} listed twice",
                element.symbol()
            )));
        }
    }
    if !abundances.contains_key(&Element::HYDROGEN) {
        return Err(SimError::config("hydrogen must be among the tracked elements"));
    }
    Ok(abundances)
}

fn collect_initial(
    raw: Vec<(Element, Vec<f64>)>,
    abundances: &BTreeMap<Element, f64>,
) -> SimResult<BTreeMap<Element, Vec<f64>>> {
    let mut initial = BTreeMap::new();
    for (element, fractions) in raw {
        if !abundances.contains_key(&element) {
            return Err(SimError::config(format!(
                "initial fractions given for untracked element {}",
                element.symbol()
            )));
        }
        initial.insert(element, fractions);
    }
    Ok(initial)
}
