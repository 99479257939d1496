//! Temperature-indexed eigenvalue table for one element.

use crate::eigen::decompose;
use crate::equilibrium::equilibrium_distribution;
use crate::error::{TableError, TableResult};
use crate::matrix::rate_matrix;
use nalgebra::{DMatrix, DVector};
use nei_atomic::{Element, ElementRates, RateSource};
use nei_core::timing::{Timer, engine_timing};
use tracing::{debug, warn};

/// Which end of the grid a temperature query was clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Below,
    Above,
}

/// Resolved grid node for a temperature query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIndex {
    pub index: usize,
    /// Set when the query fell at or outside the grid and was clamped.
    pub boundary: Option<Boundary>,
}

impl GridIndex {
    pub fn is_clamped(&self) -> bool {
        self.boundary.is_some()
    }
}

/// How a caller addresses a table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridQuery {
    Temperature(f64),
    Index(usize),
}

/// Precomputed quantities at one temperature node.
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub temperature: f64,
    pub ionization: Vec<f64>,
    pub recombination: Vec<f64>,
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
    pub inverse: DMatrix<f64>,
    pub equilibrium: Vec<f64>,
}

impl TableEntry {
    /// The rate-transfer matrix this entry was decomposed from.
    pub fn rate_matrix(&self) -> DMatrix<f64> {
        rate_matrix(&self.ionization, &self.recombination)
    }
}

/// Immutable eigen-table for one element over its temperature grid.
///
/// Built once from validated rate coefficients. Every query takes the
/// temperature or grid index explicitly; there is no cursor state.
#[derive(Debug, Clone)]
pub struct RateTable {
    element: Element,
    temperature_grid: Vec<f64>,
    entries: Vec<TableEntry>,
}

impl RateTable {
    /// Fetch coefficients for `element` from `source` and build the table.
    pub fn from_source(source: &dyn RateSource, element: Element) -> TableResult<Self> {
        let rates = source.element_rates(element)?;
        Self::build(&rates)
    }

    /// Decompose the rate matrix at every grid node.
    pub fn build(rates: &ElementRates) -> TableResult<Self> {
        let timer = Timer::start("table build");
        let element = rates.element();
        let grid = rates.temperature_grid().to_vec();

        let entries = build_entries(rates, &grid)?;

        timer.stop_into(&engine_timing::TABLE_BUILDS);
        debug!(
            element = element.symbol(),
            nodes = grid.len(),
            nstates = rates.nstates(),
            "built rate table"
        );
        Ok(Self {
            element,
            temperature_grid: grid,
            entries,
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

    /// Number of temperature nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest grid node to `temperature`.
    ///
    /// Exactly midway between two nodes resolves to the lower one. A query at
    /// or beyond either end clamps to that end and logs a warning; it is not
    /// an error. Non-finite queries are rejected.
    pub fn lookup(&self, temperature: f64) -> TableResult<GridIndex> {
        if !temperature.is_finite() {
            return Err(TableError::InvalidTemperature { value: temperature });
        }
        let grid = &self.temperature_grid;
        let last = grid.len() - 1;

        if temperature >= grid[last] {
            warn!(
                element = self.element.symbol(),
                temperature,
                grid_max = grid[last],
                "temperature at or above table grid, clamping to last node"
            );
            return Ok(GridIndex {
                index: last,
                boundary: Some(Boundary::Above),
            });
        }
        if temperature <= grid[0] {
            warn!(
                element = self.element.symbol(),
                temperature,
                grid_min = grid[0],
                "temperature at or below table grid, clamping to first node"
            );
            return Ok(GridIndex {
                index: 0,
                boundary: Some(Boundary::Below),
            });
        }

        // grid[0] < T < grid[last], so 1 <= upper <= last
        let upper = grid.partition_point(|&g| g < temperature);
        let index = if temperature - grid[upper - 1] <= grid[upper] - temperature {
            upper - 1
        } else {
            upper
        };
        Ok(GridIndex {
            index,
            boundary: None,
        })
    }

    /// Entry at an explicit grid index.
    pub fn entry(&self, index: usize) -> TableResult<&TableEntry> {
        self.entries.get(index).ok_or(TableError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Entry nearest to `temperature`.
    pub fn entry_at(&self, temperature: f64) -> TableResult<&TableEntry> {
        let idx = self.lookup(temperature)?;
        self.entry(idx.index)
    }

    pub fn resolve(&self, query: GridQuery) -> TableResult<&TableEntry> {
        match query {
            GridQuery::Temperature(t) => self.entry_at(t),
            GridQuery::Index(i) => self.entry(i),
        }
    }

    pub fn eigenvalues(&self, query: GridQuery) -> TableResult<&DVector<f64>> {
        Ok(&self.resolve(query)?.eigenvalues)
    }

    pub fn eigenvectors(&self, query: GridQuery) -> TableResult<&DMatrix<f64>> {
        Ok(&self.resolve(query)?.eigenvectors)
    }

    pub fn eigenvector_inverse(&self, query: GridQuery) -> TableResult<&DMatrix<f64>> {
        Ok(&self.resolve(query)?.inverse)
    }

    pub fn equilibrium(&self, query: GridQuery) -> TableResult<&[f64]> {
        Ok(&self.resolve(query)?.equilibrium)
    }

    pub fn ionization_rates(&self, query: GridQuery) -> TableResult<&[f64]> {
        Ok(&self.resolve(query)?.ionization)
    }

    pub fn recombination_rates(&self, query: GridQuery) -> TableResult<&[f64]> {
        Ok(&self.resolve(query)?.recombination)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }
}

fn build_entry(rates: &ElementRates, grid: &[f64], node: usize) -> TableResult<TableEntry> {
    let symbol = rates.element().symbol();
    let ionization = rates.ionization_at(node);
    let recombination = rates.recombination_at(node);

    let a = rate_matrix(&ionization, &recombination);
    let sys = decompose(&a).map_err(|what| TableError::Decomposition { symbol, node, what })?;
    let equilibrium = equilibrium_distribution(&ionization, &recombination)
        .map_err(|what| TableError::Equilibrium { symbol, node, what })?;

    Ok(TableEntry {
        temperature: grid[node],
        ionization,
        recombination,
        eigenvalues: sys.eigenvalues,
        eigenvectors: sys.eigenvectors,
        inverse: sys.inverse,
        equilibrium,
    })
}

#[cfg(not(feature = "parallel"))]
fn build_entries(rates: &ElementRates, grid: &[f64]) -> TableResult<Vec<TableEntry>> {
    (0..grid.len())
        .map(|node| build_entry(rates, grid, node))
        .collect()
}

#[cfg(feature = "parallel")]
fn build_entries(rates: &ElementRates, grid: &[f64]) -> TableResult<Vec<TableEntry>> {
    use rayon::prelude::*;
    (0..grid.len())
        .into_par_iter()
        .map(|node| build_entry(rates, grid, node))
        .collect()
}
