//! Rate coefficient source trait and validated per-element coefficients.

use crate::element::Element;
use crate::error::{AtomicError, AtomicResult};
use nei_core::is_strictly_increasing;

/// Collisional ionization and recombination coefficients for one element.
///
/// Coefficients are stored as `[charge state][temperature node]`:
/// - `ionization[k][i]`: rate from state `k` to `k+1` at node `i`
/// - `recombination[k][i]`: rate from state `k` to `k-1` at node `i`
///
/// The fully stripped state cannot ionize and the neutral state cannot
/// recombine, so `ionization[Z]` and `recombination[0]` are forced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRates {
    element: Element,
    temperature_grid: Vec<f64>,
    ionization: Vec<Vec<f64>>,
    recombination: Vec<Vec<f64>>,
}

impl ElementRates {
    /// Validate and wrap raw coefficients.
    ///
    /// Fails with [`AtomicError::Malformed`] when the grid is empty or not
    /// strictly increasing, when the matrices have the wrong shape, when a
    /// coefficient is negative or non-finite, or when a recombination rate
    /// into a physical state is zero.
    pub fn new(
        element: Element,
        temperature_grid: Vec<f64>,
        mut ionization: Vec<Vec<f64>>,
        mut recombination: Vec<Vec<f64>>,
    ) -> AtomicResult<Self> {
        let symbol = element.symbol();
        let malformed = |what: String| AtomicError::Malformed { symbol, what };

        let ntemp = temperature_grid.len();
        if ntemp == 0 {
            return Err(malformed("empty temperature grid".into()));
        }
        if temperature_grid.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(malformed("temperature grid must be positive and finite".into()));
        }
        if !is_strictly_increasing(&temperature_grid) {
            return Err(malformed("temperature grid is not strictly increasing".into()));
        }

        let nstates = element.nstates();
        for (label, matrix) in [("ionization", &ionization), ("recombination", &recombination)] {
            if matrix.len() != nstates {
                return Err(malformed(format!(
                    "{label} has {} charge states, expected {nstates}",
                    matrix.len()
                )));
            }
            for (state, row) in matrix.iter().enumerate() {
                if row.len() != ntemp {
                    return Err(malformed(format!(
                        "{label}[{state}] has {} temperature nodes, expected {ntemp}",
                        row.len()
                    )));
                }
                if let Some(bad) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(malformed(format!(
                        "{label}[{state}] contains invalid rate {bad}"
                    )));
                }
            }
        }

        for (state, row) in recombination.iter().enumerate().skip(1) {
            if let Some(node) = row.iter().position(|v| *v == 0.0) {
                return Err(malformed(format!(
                    "recombination[{state}] is zero at node {node}"
                )));
            }
        }

        ionization[nstates - 1].iter_mut().for_each(|v| *v = 0.0);
        recombination[0].iter_mut().for_each(|v| *v = 0.0);

        Ok(Self {
            element,
            temperature_grid,
            ionization,
            recombination,
        })
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn nstates(&self) -> usize {
        self.element.nstates()
    }

    pub fn temperature_grid(&self) -> &[f64] {
        &self.temperature_grid
    }

    pub fn ntemp(&self) -> usize {
        self.temperature_grid.len()
    }

    /// Ionization rates of every charge state at grid node `node`.
    pub fn ionization_at(&self, node: usize) -> Vec<f64> {
        self.ionization.iter().map(|row| row[node]).collect()
    }

    /// Recombination rates of every charge state at grid node `node`.
    pub fn recombination_at(&self, node: usize) -> Vec<f64> {
        self.recombination.iter().map(|row| row[node]).collect()
    }
}

/// Source of raw rate coefficients, keyed by element.
///
/// This is the seam to the atomic-physics database. Implementations must be
/// thread-safe so a source can be shared across table builds.
pub trait RateSource: Send + Sync {
    /// Source name (for logging).
    fn name(&self) -> &str;

    /// Coefficients for one element, or a data error if the element is
    /// absent or its data malformed.
    fn element_rates(&self, element: Element) -> AtomicResult<ElementRates>;
}
