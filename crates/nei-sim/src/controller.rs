//! The NEI controller: owns the rate tables and drives the stepping loop.

use crate::advance::advance;
use crate::config::RunConfig;
use crate::error::{SimError, SimResult};
use crate::record::SimulationRecord;
use nei_atomic::{Element, RateSource};
use nei_states::{IonizationStateVector, IonizationStates};
use nei_tables::{GridQuery, RateTable};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Lifecycle of a [`Nei`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Running,
    Finalized,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Finalized => "finalized",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one pass through the stepping loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Done(DoneReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// The configured maximum time was reached.
    ReachedTimeMax,
    /// `max_steps` advances were taken.
    MaxSteps,
}

/// How to pick the temperature for an equilibrium query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EquilibriumQuery {
    /// Electron temperature in kelvin.
    Temperature(f64),
    /// Time in seconds; the temperature driver is evaluated there.
    Time(f64),
}

/// Progress reported after every committed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    pub max_steps: usize,
    pub time: f64,
    pub time_max: f64,
    pub fraction_complete: f64,
}

/// Non-equilibrium ionization run.
///
/// `new` stores a validated [`RunConfig`]. `prepare` builds one rate table
/// per element and the initial state (`Ready`). `simulate` steps until the
/// maximum time or `max_steps` and finalizes (`Finalized`), or stops at the
/// first error (`Failed`), in which case no partial record is kept.
#[derive(Debug)]
pub struct Nei {
    config: RunConfig,
    phase: Phase,
    tables: BTreeMap<Element, RateTable>,
    initial: Option<IonizationStates>,
    record: Option<SimulationRecord>,
    final_state: Option<IonizationStates>,
    done_reason: Option<DoneReason>,
}

impl Nei {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            phase: Phase::Uninitialized,
            tables: BTreeMap::new(),
            initial: None,
            record: None,
            final_state: None,
            done_reason: None,
        }
    }

    /// `new` followed by `prepare`.
    pub fn build(config: RunConfig, source: &dyn RateSource) -> SimResult<Self> {
        let mut nei = Self::new(config);
        nei.prepare(source)?;
        Ok(nei)
    }

    /// Build rate tables and the initial ionization state.
    pub fn prepare(&mut self, source: &dyn RateSource) -> SimResult<()> {
        self.expect_phase(Phase::Uninitialized)?;
        match self.build_tables(source) {
            Ok(()) => {
                self.phase = Phase::Ready;
                info!(
                    source = source.name(),
                    elements = self.tables.len(),
                    time_start = self.config.time_start(),
                    time_max = self.config.time_max(),
                    "NEI ready"
                );
                Ok(())
            }
            Err(e) => {
                self.tables.clear();
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    fn build_tables(&mut self, source: &dyn RateSource) -> SimResult<()> {
        let t_start = self.config.time_start();
        let t_e = self.config.temperature().evaluate(t_start)?;
        let n_h = self.config.density_scale().evaluate(t_start)?;

        let mut states = Vec::new();
        for element in self.config.elements() {
            let table = RateTable::from_source(source, element)?;
            let fractions = match self.config.initial_fractions(element) {
                Some(f) => f.to_vec(),
                None => table.equilibrium(GridQuery::Temperature(t_e))?.to_vec(),
            };
            states.push(IonizationStateVector::new(element, fractions, self.config.tol())?);
            self.tables.insert(element, table);
        }

        let mut initial = IonizationStates::new(states, self.config.abundances(), self.config.tol())?;
        initial.set_temperature(t_e)?;
        initial.set_hydrogen_density(n_h)?;
        self.initial = Some(initial);
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.config.elements()
    }

    pub fn table(&self, element: Element) -> SimResult<&RateTable> {
        self.tables.get(&element).ok_or_else(|| {
            SimError::config(format!("no rate table for {}", element.symbol()))
        })
    }

    /// Initial ionization state, available once `Ready`.
    pub fn initial(&self) -> SimResult<&IonizationStates> {
        self.initial.as_ref().ok_or(SimError::InvalidPhase {
            expected: Phase::Ready,
            actual: self.phase,
        })
    }

    /// Electron temperature at `time`.
    pub fn electron_temperature(&self, time: f64) -> SimResult<f64> {
        Ok(self.config.temperature().evaluate(time)?)
    }

    /// Hydrogen number density at `time`.
    pub fn hydrogen_density(&self, time: f64) -> SimResult<f64> {
        Ok(self.config.density_scale().evaluate(time)?)
    }

    /// Table equilibrium of every element.
    pub fn equilibrium_fractions(
        &self,
        query: EquilibriumQuery,
    ) -> SimResult<BTreeMap<Element, Vec<f64>>> {
        if self.tables.is_empty() {
            return Err(SimError::InvalidPhase {
                expected: Phase::Ready,
                actual: self.phase,
            });
        }
        let t_e = match query {
            EquilibriumQuery::Temperature(t) => t,
            EquilibriumQuery::Time(time) => self.electron_temperature(time)?,
        };
        self.tables
            .iter()
            .map(|(element, table)| {
                let eq = table.equilibrium(GridQuery::Temperature(t_e))?;
                Ok((*element, eq.to_vec()))
            })
            .collect()
    }

    pub fn simulate(&mut self) -> SimResult<&SimulationRecord> {
        self.simulate_with_progress(None)
    }

    /// Run to completion, calling `progress` after every committed step.
    pub fn simulate_with_progress(
        &mut self,
        progress: Option<&mut dyn FnMut(SimProgress)>,
    ) -> SimResult<&SimulationRecord> {
        self.expect_phase(Phase::Ready)?;
        self.phase = Phase::Running;

        match self.run(progress) {
            Ok((record, final_state, reason)) => {
                info!(
                    rows = record.len(),
                    time = record.time().last().copied().unwrap_or(f64::NAN),
                    ?reason,
                    "NEI finalized"
                );
                self.final_state = Some(final_state);
                self.done_reason = Some(reason);
                self.record = Some(record);
                self.phase = Phase::Finalized;
                self.results()
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    fn run(
        &self,
        mut progress: Option<&mut dyn FnMut(SimProgress)>,
    ) -> SimResult<(SimulationRecord, IonizationStates, DoneReason)> {
        let initial = self.initial()?;
        let t_start = self.config.time_start();
        let pairs: Vec<(Element, f64)> = self
            .config
            .abundances()
            .iter()
            .map(|(e, a)| (*e, *a))
            .collect();

        let mut record = SimulationRecord::new(&pairs, self.config.max_steps());
        let first: Vec<Vec<f64>> = initial
            .iter()
            .map(IonizationStateVector::into_fractions)
            .collect();
        record.append(
            t_start,
            &first,
            self.hydrogen_density(t_start)?,
            self.electron_temperature(t_start)?,
        )?;

        let mut time = t_start;
        let mut reason = DoneReason::MaxSteps;
        for step in 1..=self.config.max_steps() {
            match self.step(&mut record, &mut time, step)? {
                StepResult::Continue => {}
                StepResult::Done(r) => {
                    reason = r;
                    break;
                }
            }
            if let Some(cb) = progress.as_deref_mut() {
                cb(self.progress_at(step, time));
            }
        }
        if time >= self.config.time_max() {
            reason = DoneReason::ReachedTimeMax;
        }

        record.cleanup();
        let final_state = self.final_snapshot(&record)?;
        Ok((record, final_state, reason))
    }

    /// One pass of the loop: advance every element from the last committed
    /// row and commit the new row.
    fn step(
        &self,
        record: &mut SimulationRecord,
        time: &mut f64,
        step: usize,
    ) -> SimResult<StepResult> {
        let time_max = self.config.time_max();
        let old_time = *time;
        if old_time >= time_max {
            return Ok(StepResult::Done(DoneReason::ReachedTimeMax));
        }
        let mut dt = self.config.dt();
        let mut new_time = old_time + dt;
        if new_time > time_max {
            new_time = time_max;
            dt = new_time - old_time;
        }

        let new_t_e = self
            .electron_temperature(new_time)
            .map_err(|e| e.at_step(step, None))?;
        let new_n_h = self
            .hydrogen_density(new_time)
            .map_err(|e| e.at_step(step, None))?;

        let prev = record
            .last_step()
            .ok_or_else(|| SimError::record("no committed rows"))?;
        let t_e = record.temperature()[prev];
        let n_e = record.electron_density()[prev];
        debug!(step, time = old_time, t_e, n_e, dt, "advancing");

        let mut fractions = Vec::with_capacity(record.elements().len());
        for &element in record.elements() {
            let symbol = Some(element.symbol());
            let table = self.table(element).map_err(|e| e.at_step(step, symbol))?;
            let f0 = record
                .fractions_at(element, prev)
                .map_err(|e| e.at_step(step, symbol))?;
            let f1 = advance(table, &f0, t_e, n_e, dt).map_err(|e| e.at_step(step, symbol))?;
            fractions.push(f1);
        }

        record
            .append(new_time, &fractions, new_n_h, new_t_e)
            .map_err(|e| e.at_step(step, None))?;

        *time = new_time;
        Ok(StepResult::Continue)
    }

    fn final_snapshot(&self, record: &SimulationRecord) -> SimResult<IonizationStates> {
        let last = record
            .last_step()
            .ok_or_else(|| SimError::record("no committed rows"))?;
        let tol = self.config.final_tol();
        let mut states = Vec::with_capacity(record.elements().len());
        for &element in record.elements() {
            let f = record.fractions_at(element, last)?;
            states.push(IonizationStateVector::from_unnormalized(element, f, tol)?);
        }
        let mut snapshot = IonizationStates::new(states, self.config.abundances(), tol)?;
        snapshot.set_temperature(record.temperature()[last])?;
        snapshot.set_hydrogen_density(record.element_density(Element::HYDROGEN)?[last])?;
        Ok(snapshot)
    }

    fn progress_at(&self, step: usize, time: f64) -> SimProgress {
        let start = self.config.time_start();
        let span = self.config.time_max() - start;
        SimProgress {
            step,
            max_steps: self.config.max_steps(),
            time,
            time_max: self.config.time_max(),
            fraction_complete: ((time - start) / span).clamp(0.0, 1.0),
        }
    }

    /// Committed results, available once `Finalized`.
    pub fn results(&self) -> SimResult<&SimulationRecord> {
        self.record.as_ref().ok_or(SimError::InvalidPhase {
            expected: Phase::Finalized,
            actual: self.phase,
        })
    }

    /// Ionization state at the last committed row, available once `Finalized`.
    pub fn final_state(&self) -> SimResult<&IonizationStates> {
        self.final_state.as_ref().ok_or(SimError::InvalidPhase {
            expected: Phase::Finalized,
            actual: self.phase,
        })
    }

    /// Why the loop stopped, available once `Finalized`.
    pub fn done_reason(&self) -> Option<DoneReason> {
        self.done_reason
    }

    fn expect_phase(&self, expected: Phase) -> SimResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SimError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nei_atomic::HydrogenicRates;

    fn config(t_max: f64, dt: f64, max_steps: usize) -> RunConfig {
        RunConfig::builder()
            .element(Element::HYDROGEN, 1.0)
            .element(Element::HELIUM, 0.1)
            .temperature(1e5)
            .density_scale(1e8)
            .time_max(t_max)
            .dt(dt)
            .max_steps(max_steps)
            .build()
            .unwrap()
    }

    #[test]
    fn phases_advance_in_order() {
        let mut nei = Nei::new(config(10.0, 1.0, 100));
        assert_eq!(nei.phase(), Phase::Uninitialized);
        assert!(matches!(
            nei.simulate(),
            Err(SimError::InvalidPhase {
                expected: Phase::Ready,
                actual: Phase::Uninitialized
            })
        ));
        nei.prepare(&HydrogenicRates::default()).unwrap();
        assert_eq!(nei.phase(), Phase::Ready);
        assert!(nei.results().is_err());
        nei.simulate().unwrap();
        assert_eq!(nei.phase(), Phase::Finalized);
        assert!(nei.simulate().is_err());
        assert!(nei.results().is_ok());
    }

    #[test]
    fn stops_at_max_steps() {
        let mut nei = Nei::build(config(100.0, 1.0, 5), &HydrogenicRates::default()).unwrap();
        let record = nei.simulate().unwrap();
        assert_eq!(record.len(), 6);
        assert_eq!(record.time().last(), Some(&5.0));
        assert_eq!(nei.done_reason(), Some(DoneReason::MaxSteps));
    }

    #[test]
    fn last_allowed_step_on_time_max_counts_as_reaching_it() {
        let mut nei = Nei::build(config(10.0, 2.5, 4), &HydrogenicRates::default()).unwrap();
        assert_eq!(nei.done_reason(), None);
        let record = nei.simulate().unwrap();
        assert_eq!(record.time().last(), Some(&10.0));
        assert_eq!(nei.done_reason(), Some(DoneReason::ReachedTimeMax));
    }

    #[test]
    fn final_hydrogen_density_follows_hydrogen_abundance() {
        let config = RunConfig::builder()
            .element(Element::HYDROGEN, 0.5)
            .element(Element::HELIUM, 0.1)
            .temperature(1e5)
            .density_scale(1e8)
            .time_max(10.0)
            .dt(5.0)
            .build()
            .unwrap();
        let mut nei = Nei::build(config, &HydrogenicRates::default()).unwrap();
        nei.simulate().unwrap();
        assert_eq!(nei.final_state().unwrap().hydrogen_density(), Some(5e7));
    }

    #[test]
    fn final_step_is_shortened() {
        let mut nei = Nei::build(config(10.0, 4.0, 100), &HydrogenicRates::default()).unwrap();
        let record = nei.simulate().unwrap();
        assert_eq!(record.time(), &[0.0, 4.0, 8.0, 10.0]);
    }

    #[test]
    fn progress_reports_each_step() {
        let mut nei = Nei::build(config(10.0, 2.5, 100), &HydrogenicRates::default()).unwrap();
        let mut seen = Vec::new();
        let mut cb = |p: SimProgress| seen.push((p.step, p.fraction_complete));
        nei.simulate_with_progress(Some(&mut cb as &mut dyn FnMut(SimProgress)))
            .unwrap();
        assert_eq!(seen, vec![(1, 0.25), (2, 0.5), (3, 0.75), (4, 1.0)]);
    }

    #[test]
    fn missing_rates_fail_preparation() {
        let catalog = nei_atomic::RateCatalog::new("empty");
        let mut nei = Nei::new(config(10.0, 1.0, 10));
        let err = nei.prepare(&catalog).unwrap_err();
        assert!(matches!(err, SimError::Data(_)));
        assert_eq!(nei.phase(), Phase::Failed);
    }

    #[test]
    fn equilibrium_query_needs_tables() {
        let nei = Nei::new(config(10.0, 1.0, 10));
        assert!(nei.equilibrium_fractions(EquilibriumQuery::Temperature(1e6)).is_err());
    }

    #[test]
    fn equilibrium_by_time_matches_temperature() {
        let nei = Nei::build(config(10.0, 1.0, 10), &HydrogenicRates::default()).unwrap();
        let by_time = nei.equilibrium_fractions(EquilibriumQuery::Time(5.0)).unwrap();
        let by_temp = nei
            .equilibrium_fractions(EquilibriumQuery::Temperature(1e5))
            .unwrap();
        assert_eq!(by_time, by_temp);
        assert!(nei.equilibrium_fractions(EquilibriumQuery::Time(11.0)).is_err());
    }

    #[test]
    fn initial_state_defaults_to_equilibrium() {
        let nei = Nei::build(config(10.0, 1.0, 10), &HydrogenicRates::default()).unwrap();
        let initial = nei.initial().unwrap();
        let eq = nei
            .table(Element::HELIUM)
            .unwrap()
            .equilibrium(GridQuery::Temperature(1e5))
            .unwrap();
        assert_eq!(initial.get(Element::HELIUM).unwrap().fractions(), eq);
        assert_eq!(initial.temperature(), Some(1e5));
        assert_eq!(initial.hydrogen_density(), Some(1e8));
    }
}
