//! Ionization states of several elements in one plasma.

use crate::error::{StateError, StateResult};
use crate::vector::{IonizationStateVector, validate_tolerance};
use nei_atomic::Element;
use std::collections::BTreeMap;
use std::fmt;

/// Per-element ionic fractions with relative abundances.
///
/// Elements are kept in order of atomic number. Number densities follow
/// from the hydrogen number density `n_H` and abundances relative to
/// hydrogen: `n_k = n_H * abundance * f_k`.
#[derive(Debug, Clone, PartialEq)]
pub struct IonizationStates {
    states: BTreeMap<Element, IonizationStateVector>,
    abundances: BTreeMap<Element, f64>,
    temperature: Option<f64>,
    hydrogen_density: Option<f64>,
    tol: f64,
}

impl IonizationStates {
    /// Every element in `states` needs an entry in `abundances`; extra
    /// abundances are ignored.
    pub fn new(
        states: Vec<IonizationStateVector>,
        abundances: &BTreeMap<Element, f64>,
        tol: f64,
    ) -> StateResult<Self> {
        validate_tolerance(tol)?;
        let mut map = BTreeMap::new();
        for mut state in states {
            let element = state.element();
            if map.contains_key(&element) {
                return Err(StateError::DuplicateElement {
                    symbol: element.symbol(),
                });
            }
            state.set_tol(tol)?;
            map.insert(element, state);
        }

        let mut kept = BTreeMap::new();
        for &element in map.keys() {
            let abundance =
                *abundances
                    .get(&element)
                    .ok_or(StateError::MissingAbundance {
                        symbol: element.symbol(),
                    })?;
            if !abundance.is_finite() || abundance < 0.0 {
                return Err(StateError::InvalidQuantity {
                    what: "abundance",
                    value: abundance,
                });
            }
            kept.insert(element, abundance);
        }

        Ok(Self {
            states: map,
            abundances: kept,
            temperature: None,
            hydrogen_density: None,
            tol,
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.states.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, element: Element) -> StateResult<&IonizationStateVector> {
        self.states.get(&element).ok_or(StateError::UntrackedElement {
            symbol: element.symbol(),
        })
    }

    /// Replace one element's fractions.
    pub fn set(&mut self, element: Element, fractions: Vec<f64>) -> StateResult<()> {
        let state = self
            .states
            .get_mut(&element)
            .ok_or(StateError::UntrackedElement {
                symbol: element.symbol(),
            })?;
        state.set_fractions(fractions)
    }

    pub fn abundance(&self, element: Element) -> StateResult<f64> {
        self.abundances
            .get(&element)
            .copied()
            .ok_or(StateError::UntrackedElement {
                symbol: element.symbol(),
            })
    }

    pub fn abundances(&self) -> &BTreeMap<Element, f64> {
        &self.abundances
    }

    /// `log10` of each abundance.
    pub fn log_abundances(&self) -> BTreeMap<Element, f64> {
        self.abundances
            .iter()
            .map(|(&e, &a)| (e, a.log10()))
            .collect()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn set_temperature(&mut self, kelvin: f64) -> StateResult<()> {
        if !kelvin.is_finite() || kelvin <= 0.0 {
            return Err(StateError::InvalidQuantity {
                what: "electron temperature",
                value: kelvin,
            });
        }
        self.temperature = Some(kelvin);
        Ok(())
    }

    pub fn hydrogen_density(&self) -> Option<f64> {
        self.hydrogen_density
    }

    /// Set `n_H`, which fixes every element's number density.
    pub fn set_hydrogen_density(&mut self, n_h: f64) -> StateResult<()> {
        if !n_h.is_finite() || n_h < 0.0 {
            return Err(StateError::InvalidQuantity {
                what: "hydrogen number density",
                value: n_h,
            });
        }
        if !self.states.contains_key(&Element::HYDROGEN) {
            return Err(StateError::UntrackedElement { symbol: "H" });
        }
        self.hydrogen_density = Some(n_h);
        Ok(())
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Number density of each charge state of `element`.
    pub fn number_densities(&self, element: Element) -> StateResult<Vec<f64>> {
        let n_h = self.hydrogen_density.ok_or(StateError::MissingDensity {
            symbol: element.symbol(),
        })?;
        let abundance = self.abundance(element)?;
        let state = self.get(element)?;
        Ok(state
            .fractions()
            .iter()
            .map(|f| n_h * abundance * f)
            .collect())
    }

    /// `Σ_elements Σ_k k * n_k`.
    pub fn electron_density(&self) -> StateResult<f64> {
        let mut n_e = 0.0;
        for element in self.elements() {
            let densities = self.number_densities(element)?;
            n_e += densities
                .iter()
                .enumerate()
                .map(|(k, n)| k as f64 * n)
                .sum::<f64>();
        }
        Ok(n_e)
    }

    pub fn normalize(&mut self) {
        self.states.values_mut().for_each(IonizationStateVector::normalize);
    }

    /// Compare fractions element by element with the tighter tolerance.
    pub fn approx_eq(&self, other: &Self) -> StateResult<bool> {
        if !self.elements().eq(other.elements()) {
            return Err(StateError::ElementMismatch {
                left: "element set",
                right: "element set",
            });
        }
        let tol = self.tol.min(other.tol);
        Ok(self
            .states
            .values()
            .zip(other.states.values())
            .all(|(a, b)| a.within(b, tol)))
    }

    /// Per-element vectors carrying their number density when `n_H` is known.
    pub fn iter(&self) -> impl Iterator<Item = IonizationStateVector> + '_ {
        self.states.iter().map(|(element, state)| {
            match (self.hydrogen_density, self.abundances.get(element)) {
                (Some(n_h), Some(&a)) => state
                    .clone()
                    .with_density_scale(n_h * a)
                    .unwrap_or_else(|_| state.clone()),
                _ => state.clone(),
            }
        })
    }
}

impl fmt::Display for IonizationStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<&str> = self.elements().map(|e| e.symbol()).collect();
        write!(f, "<IonizationStates for: {}>", symbols.join(", "))
    }
}
