//! Append-only time series of simulation results.

use crate::error::{SimError, SimResult};
use nalgebra::{DMatrix, DMatrixView};
use nei_atomic::Element;
use nei_core::interp_linear;
use nei_states::StateError;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Results of one run: time, drivers, electron density and per-element
/// fractions and number densities.
///
/// Storage is preallocated for `max_steps + 1` rows. Rows are committed by
/// [`append`](Self::append), which either writes a complete row or leaves
/// the record untouched. [`cleanup`](Self::cleanup) trims unused capacity
/// and seals the record.
#[derive(Debug, Clone)]
pub struct SimulationRecord {
    elements: Vec<Element>,
    abundances: Vec<f64>,
    max_steps: usize,
    len: usize,
    sealed: bool,
    time: Vec<f64>,
    temperature: Vec<f64>,
    electron_density: Vec<f64>,
    density_scale: Vec<f64>,
    /// `[element]` of rows x charge states
    fractions: Vec<DMatrix<f64>>,
    number_densities: Vec<DMatrix<f64>>,
    /// `[element][row]` atoms plus ions
    element_density: Vec<Vec<f64>>,
}

impl SimulationRecord {
    /// Empty record for `(element, abundance)` pairs.
    pub fn new(elements: &[(Element, f64)], max_steps: usize) -> Self {
        let capacity = max_steps + 1;
        Self {
            elements: elements.iter().map(|(e, _)| *e).collect(),
            abundances: elements.iter().map(|(_, a)| *a).collect(),
            max_steps,
            len: 0,
            sealed: false,
            time: vec![0.0; capacity],
            temperature: vec![0.0; capacity],
            electron_density: vec![0.0; capacity],
            density_scale: vec![0.0; capacity],
            fractions: elements
                .iter()
                .map(|(e, _)| DMatrix::zeros(capacity, e.nstates()))
                .collect(),
            number_densities: elements
                .iter()
                .map(|(e, _)| DMatrix::zeros(capacity, e.nstates()))
                .collect(),
            element_density: vec![vec![0.0; capacity]; elements.len()],
        }
    }

    /// Commit one row.
    ///
    /// `fractions` holds one vector per element, in record order. Number
    /// densities are `density_scale * abundance * fraction`; the electron
    /// density is the charge-weighted sum of every ion's number density.
    pub fn append(
        &mut self,
        time: f64,
        fractions: &[Vec<f64>],
        density_scale: f64,
        temperature: f64,
    ) -> SimResult<()> {
        if self.sealed {
            return Err(SimError::record("record is sealed"));
        }
        if self.len == self.capacity() {
            return Err(SimError::record(format!(
                "capacity of {} rows exhausted",
                self.capacity()
            )));
        }
        if !time.is_finite() {
            return Err(SimError::record(format!("non-finite time {time}")));
        }
        if let Some(&last) = self.time().last() {
            if time <= last {
                return Err(SimError::record(format!(
                    "time {time} does not follow {last}"
                )));
            }
        }
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(SimError::record(format!("invalid temperature {temperature}")));
        }
        if !density_scale.is_finite() || density_scale < 0.0 {
            return Err(SimError::record(format!(
                "invalid density scale {density_scale}"
            )));
        }
        if fractions.len() != self.elements.len() {
            return Err(SimError::record(format!(
                "{} fraction vectors for {} elements",
                fractions.len(),
                self.elements.len()
            )));
        }

        let mut element_density = Vec::with_capacity(self.elements.len());
        let mut densities = Vec::with_capacity(self.elements.len());
        let mut n_e = 0.0;
        for ((element, abundance), f) in self.elements.iter().zip(&self.abundances).zip(fractions) {
            if f.len() != element.nstates() {
                return Err(StateError::WrongLength {
                    symbol: element.symbol(),
                    expected: element.nstates(),
                    actual: f.len(),
                }
                .into());
            }
            if let Some((charge, &value)) = f.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(StateError::FractionOutOfRange {
                    symbol: element.symbol(),
                    charge,
                    value,
                }
                .into());
            }
            let n_elem = density_scale * abundance;
            let n: Vec<f64> = f.iter().map(|x| n_elem * x).collect();
            n_e += n.iter().enumerate().map(|(k, v)| k as f64 * v).sum::<f64>();
            element_density.push(n_elem);
            densities.push(n);
        }
        if !n_e.is_finite() {
            return Err(SimError::record(format!("electron density {n_e} is not finite")));
        }

        let row = self.len;
        self.time[row] = time;
        self.temperature[row] = temperature;
        self.density_scale[row] = density_scale;
        self.electron_density[row] = n_e;
        for (i, (f, n)) in fractions.iter().zip(densities).enumerate() {
            for (k, (&fk, nk)) in f.iter().zip(n).enumerate() {
                self.fractions[i][(row, k)] = fk;
                self.number_densities[i][(row, k)] = nk;
            }
            self.element_density[i][row] = element_density[i];
        }
        self.len += 1;
        Ok(())
    }

    /// Trim to the committed rows and refuse further appends.
    pub fn cleanup(&mut self) {
        let n = self.len;
        self.time.truncate(n);
        self.temperature.truncate(n);
        self.electron_density.truncate(n);
        self.density_scale.truncate(n);
        for m in self.fractions.iter_mut().chain(self.number_densities.iter_mut()) {
            *m = m.rows(0, n).into_owned();
        }
        for d in &mut self.element_density {
            d.truncate(n);
        }
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Committed rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_steps + 1
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Row index of the last committed step.
    pub fn last_step(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn nstates(&self, element: Element) -> SimResult<usize> {
        self.position(element).map(|_| element.nstates())
    }

    pub fn abundance(&self, element: Element) -> SimResult<f64> {
        Ok(self.abundances[self.position(element)?])
    }

    pub fn time(&self) -> &[f64] {
        &self.time[..self.len]
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature[..self.len]
    }

    pub fn electron_density(&self) -> &[f64] {
        &self.electron_density[..self.len]
    }

    /// Hydrogen number density scale per row.
    pub fn density_scale(&self) -> &[f64] {
        &self.density_scale[..self.len]
    }

    /// Ionic fractions of `element`, rows x charge states.
    pub fn ionic_fractions(&self, element: Element) -> SimResult<DMatrixView<'_, f64>> {
        let i = self.position(element)?;
        Ok(self.fractions[i].rows(0, self.len))
    }

    /// Number densities of `element`, rows x charge states.
    pub fn number_densities(&self, element: Element) -> SimResult<DMatrixView<'_, f64>> {
        let i = self.position(element)?;
        Ok(self.number_densities[i].rows(0, self.len))
    }

    /// Total number density of `element` per row.
    pub fn element_density(&self, element: Element) -> SimResult<&[f64]> {
        let i = self.position(element)?;
        Ok(&self.element_density[i][..self.len])
    }

    /// Fractions of `element` at one committed row.
    pub fn fractions_at(&self, element: Element, row: usize) -> SimResult<Vec<f64>> {
        let i = self.position(element)?;
        if row >= self.len {
            return Err(SimError::record(format!(
                "row {row} not committed ({} rows)",
                self.len
            )));
        }
        Ok(self.fractions[i].row(row).iter().copied().collect())
    }

    /// Time at a fractional row index, linearly interpolated.
    pub fn index_to_time(&self, index: f64) -> SimResult<f64> {
        let indices: Vec<f64> = (0..self.len).map(|i| i as f64).collect();
        interp_linear(&indices, self.time(), index).ok_or_else(|| {
            SimError::record(format!("index {index} outside [0, {}]", self.len.saturating_sub(1)))
        })
    }

    /// Row index at `time`, interpolated and truncated toward zero.
    pub fn time_to_index(&self, time: f64) -> SimResult<usize> {
        let indices: Vec<f64> = (0..self.len).map(|i| i as f64).collect();
        interp_linear(self.time(), &indices, time)
            .map(|i| i as usize)
            .ok_or_else(|| SimError::record(format!("time {time} outside the recorded range")))
    }

    fn position(&self, element: Element) -> SimResult<usize> {
        self.elements
            .iter()
            .position(|e| *e == element)
            .ok_or_else(|| {
                StateError::UntrackedElement {
                    symbol: element.symbol(),
                }
                .into()
            })
    }
}

impl Serialize for SimulationRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let species: Vec<ElementSeries<'_>> = self
            .elements
            .iter()
            .enumerate()
            .map(|(i, element)| ElementSeries {
                element: element.symbol(),
                abundance: self.abundances[i],
                fractions: rows(&self.fractions[i], self.len),
                number_densities: rows(&self.number_densities[i], self.len),
                element_density: &self.element_density[i][..self.len],
            })
            .collect();
        let mut s = serializer.serialize_struct("SimulationRecord", 5)?;
        s.serialize_field("time", self.time())?;
        s.serialize_field("temperature", self.temperature())?;
        s.serialize_field("electron_density", self.electron_density())?;
        s.serialize_field("density_scale", self.density_scale())?;
        s.serialize_field("elements", &species)?;
        s.end()
    }
}

#[derive(serde::Serialize)]
struct ElementSeries<'a> {
    element: &'static str,
    abundance: f64,
    fractions: Vec<Vec<f64>>,
    number_densities: Vec<Vec<f64>>,
    element_density: &'a [f64],
}

fn rows(m: &DMatrix<f64>, n: usize) -> Vec<Vec<f64>> {
    (0..n).map(|r| m.row(r).iter().copied().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SimulationRecord {
        SimulationRecord::new(&[(Element::HYDROGEN, 1.0), (Element::HELIUM, 0.1)], 3)
    }

    fn row(h: f64, he: [f64; 3]) -> Vec<Vec<f64>> {
        vec![vec![1.0 - h, h], he.to_vec()]
    }

    #[test]
    fn append_derives_densities() {
        let mut rec = record();
        rec.append(0.0, &row(0.5, [0.0, 0.5, 0.5]), 100.0, 1e6).unwrap();
        assert_eq!(rec.len(), 1);
        // H: 100 * 0.5 * 1; He: 10 * (0.5 * 1 + 0.5 * 2)
        assert!((rec.electron_density()[0] - 65.0).abs() < 1e-12);
        assert_eq!(rec.element_density(Element::HELIUM).unwrap(), &[10.0]);
        let n = rec.number_densities(Element::HELIUM).unwrap();
        assert_eq!(n[(0, 2)], 5.0);
    }

    #[test]
    fn failed_append_leaves_record_unchanged() {
        let mut rec = record();
        rec.append(0.0, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4).unwrap();
        let bad = vec![vec![f64::NAN, 1.0], vec![1.0, 0.0, 0.0]];
        assert!(rec.append(1.0, &bad, 1.0, 1e4).is_err());
        assert!(rec.append(0.0, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4).is_err());
        assert!(rec.append(1.0, &vec![vec![1.0, 0.0], vec![1.0, 0.0]], 1.0, 1e4).is_err());
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.time(), &[0.0]);
    }

    #[test]
    fn capacity_is_max_steps_plus_one() {
        let mut rec = record();
        for i in 0..4 {
            rec.append(i as f64, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4).unwrap();
        }
        assert!(rec.append(10.0, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4).is_err());
    }

    #[test]
    fn cleanup_truncates_and_seals() {
        let mut rec = record();
        rec.append(0.0, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4).unwrap();
        rec.append(5.0, &row(1.0, [0.0, 0.0, 1.0]), 1.0, 1e4).unwrap();
        rec.cleanup();
        assert!(rec.is_sealed());
        assert_eq!(rec.last_step(), Some(1));
        assert_eq!(rec.ionic_fractions(Element::HYDROGEN).unwrap().nrows(), 2);
        assert!(rec.append(6.0, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4).is_err());
    }

    #[test]
    fn index_time_conversions() {
        let mut rec = record();
        for (i, t) in [0.0, 10.0, 30.0].iter().enumerate() {
            rec.append(*t, &row(0.0, [1.0, 0.0, 0.0]), 1.0, 1e4 + i as f64).unwrap();
        }
        assert_eq!(rec.index_to_time(1.5).unwrap(), 20.0);
        assert_eq!(rec.time_to_index(25.0).unwrap(), 1);
        assert_eq!(rec.time_to_index(30.0).unwrap(), 2);
        assert!(rec.time_to_index(31.0).is_err());
        assert!(rec.index_to_time(-0.5).is_err());
    }

    #[test]
    fn untracked_element() {
        let rec = record();
        let oxygen = Element::from_atomic_number(8).unwrap();
        assert!(matches!(
            rec.ionic_fractions(oxygen),
            Err(SimError::State(StateError::UntrackedElement { .. }))
        ));
    }

    #[test]
    fn serializes_committed_rows_only() {
        let mut rec = record();
        rec.append(0.0, &row(0.25, [1.0, 0.0, 0.0]), 2.0, 1e4).unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["time"].as_array().unwrap().len(), 1);
        assert_eq!(json["elements"][0]["element"], "H");
        assert_eq!(json["elements"][0]["fractions"][0][1], 0.25);
    }
}
