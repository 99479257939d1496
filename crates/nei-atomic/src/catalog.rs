//! In-memory rate catalog.

use crate::element::Element;
use crate::error::{AtomicError, AtomicResult};
use crate::rates::{ElementRates, RateSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Serialized form of one element's coefficients.
///
/// Matrices are `[charge state][temperature node]`, matching [`ElementRates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElementRates {
    pub element: Element,
    pub temperature_grid: Vec<f64>,
    pub ionization: Vec<Vec<f64>>,
    pub recombination: Vec<Vec<f64>>,
}

impl From<&ElementRates> for RawElementRates {
    fn from(rates: &ElementRates) -> Self {
        let ionization: Vec<Vec<f64>> = (0..rates.ntemp()).map(|i| rates.ionization_at(i)).collect();
        let recombination: Vec<Vec<f64>> =
            (0..rates.ntemp()).map(|i| rates.recombination_at(i)).collect();
        Self {
            element: rates.element(),
            temperature_grid: rates.temperature_grid().to_vec(),
            ionization: by_state(&ionization, rates.nstates()),
            recombination: by_state(&recombination, rates.nstates()),
        }
    }
}

/// Transpose `[node][state]` columns into `[state][node]` rows.
fn by_state(columns: &[Vec<f64>], nstates: usize) -> Vec<Vec<f64>> {
    (0..nstates)
        .map(|state| columns.iter().map(|col| col[state]).collect())
        .collect()
}

/// A rate source backed by coefficients held in memory.
#[derive(Debug, Clone, Default)]
pub struct RateCatalog {
    name: String,
    entries: BTreeMap<Element, ElementRates>,
}

impl RateCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add (or replace) an element's coefficients.
    pub fn insert(&mut self, rates: ElementRates) {
        self.entries.insert(rates.element(), rates);
    }

    /// Validate and add raw coefficients.
    pub fn insert_raw(&mut self, raw: RawElementRates) -> AtomicResult<()> {
        let rates = ElementRates::new(
            raw.element,
            raw.temperature_grid,
            raw.ionization,
            raw.recombination,
        )?;
        self.insert(rates);
        Ok(())
    }

    /// Parse a JSON array of [`RawElementRates`].
    pub fn from_json_str(name: impl Into<String>, json: &str) -> AtomicResult<Self> {
        let raws: Vec<RawElementRates> = serde_json::from_str(json)?;
        let mut catalog = Self::new(name);
        for raw in raws {
            catalog.insert_raw(raw)?;
        }
        Ok(catalog)
    }

    pub fn from_json_file(path: &Path) -> AtomicResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AtomicError::Decode {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_json_str(path.display().to_string(), &content)
    }

    /// Serialize every entry as a JSON array of [`RawElementRates`].
    pub fn to_json_string(&self) -> AtomicResult<String> {
        let raws: Vec<RawElementRates> = self.entries.values().map(RawElementRates::from).collect();
        Ok(serde_json::to_string_pretty(&raws)?)
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateSource for RateCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn element_rates(&self, element: Element) -> AtomicResult<ElementRates> {
        self.entries
            .get(&element)
            .cloned()
            .ok_or(AtomicError::MissingElement {
                symbol: element.symbol(),
            })
    }
}
