//! Analytic rate coefficients for running without an atomic database.
//!
//! This model is NOT a replacement for a real collisional-ionization
//! database. It exists so the engine, its tests and the CLI can run end to
//! end with physically shaped coefficients:
//!
//! - ionization potentials from a shell-resolved hydrogenic estimate,
//!   `chi = 13.6 eV * (q + 1)^2 / n^2` where `n` is the principal quantum
//!   number of the outermost bound electron
//! - ionization in Voronov form, scaled by outer-shell occupancy and `chi^-2`
//! - radiative recombination as a hydrogenic power law in `T / q^2`
//!
//! Rates are in cm^3 s^-1 on a log-spaced temperature grid in kelvin.

use crate::element::Element;
use crate::error::AtomicResult;
use crate::rates::{ElementRates, RateSource};
use nei_core::logspace;

/// Boltzmann constant in eV/K.
const K_B_EV: f64 = 8.617_333_262e-5;
/// Hydrogen ionization potential in eV.
const RYDBERG_EV: f64 = 13.605_693;

/// Voronov fit parameters for hydrogen.
const VORONOV_A: f64 = 2.91e-8;
const VORONOV_X: f64 = 0.232;
const VORONOV_K: f64 = 0.39;

/// Radiative recombination coefficient of hydrogen at 10^4 K.
const RR_ALPHA_1E4: f64 = 2.6e-13;
const RR_SLOPE: f64 = 0.7;

/// Closed-shell electron counts for n = 1, 2, 3, 4.
const SHELL_CAPACITY: [usize; 4] = [2, 10, 28, 60];

/// Synthetic rate model on a log-spaced temperature grid.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrogenicRates {
    temperature_grid: Vec<f64>,
}

impl Default for HydrogenicRates {
    /// 501 nodes between 10^4 K and 10^9 K.
    fn default() -> Self {
        Self::with_log_grid(4.0, 9.0, 501)
    }
}

impl HydrogenicRates {
    /// Grid of `n` nodes between `10^log_t_min` and `10^log_t_max` kelvin.
    pub fn with_log_grid(log_t_min: f64, log_t_max: f64, n: usize) -> Self {
        Self {
            temperature_grid: logspace(log_t_min, log_t_max, n),
        }
    }

    pub fn temperature_grid(&self) -> &[f64] {
        &self.temperature_grid
    }

    /// Ionization potential (eV) of charge state `charge` of `element`.
    pub fn ionization_potential(element: Element, charge: usize) -> f64 {
        let bound = element.nstates() - 1 - charge;
        let shell = principal_quantum_number(bound) as f64;
        let q_eff = (charge + 1) as f64;
        RYDBERG_EV * q_eff * q_eff / (shell * shell)
    }

    /// Collisional ionization rate from `charge` to `charge + 1` at `t_k`.
    pub fn ionization_rate(element: Element, charge: usize, t_k: f64) -> f64 {
        if charge + 1 >= element.nstates() {
            return 0.0;
        }
        let chi = Self::ionization_potential(element, charge);
        let bound = element.nstates() - 1 - charge;
        let u = chi / (K_B_EV * t_k);
        let scale = outer_shell_occupancy(bound) as f64 * (RYDBERG_EV / chi).powi(2);
        VORONOV_A * scale * u.powf(VORONOV_K) * (-u).exp() / (VORONOV_X + u)
    }

    /// Radiative recombination rate from `charge` to `charge - 1` at `t_k`.
    pub fn recombination_rate(charge: usize, t_k: f64) -> f64 {
        if charge == 0 {
            return 0.0;
        }
        let q2 = (charge * charge) as f64;
        RR_ALPHA_1E4 * q2 * (t_k / (1e4 * q2)).powf(-RR_SLOPE)
    }
}

fn principal_quantum_number(bound_electrons: usize) -> usize {
    SHELL_CAPACITY
        .iter()
        .position(|&cap| bound_electrons <= cap)
        .map_or(SHELL_CAPACITY.len() + 1, |idx| idx + 1)
}

fn outer_shell_occupancy(bound_electrons: usize) -> usize {
    let inner = SHELL_CAPACITY
        .iter()
        .copied()
        .take_while(|&cap| cap < bound_electrons)
        .last()
        .unwrap_or(0);
    bound_electrons - inner
}

impl RateSource for HydrogenicRates {
    fn name(&self) -> &str {
        "hydrogenic"
    }

    fn element_rates(&self, element: Element) -> AtomicResult<ElementRates> {
        let nstates = element.nstates();
        let grid = &self.temperature_grid;
        let ionization = (0..nstates)
            .map(|q| grid.iter().map(|&t| Self::ionization_rate(element, q, t)).collect())
            .collect();
        let recombination = (0..nstates)
            .map(|q| grid.iter().map(|&t| Self::recombination_rate(q, t)).collect())
            .collect();
        ElementRates::new(element, grid.clone(), ionization, recombination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrogen_potential_is_rydberg() {
        let chi = HydrogenicRates::ionization_potential(Element::HYDROGEN, 0);
        assert!((chi - 13.6).abs() < 0.01);
        let he_plus = HydrogenicRates::ionization_potential(Element::HELIUM, 1);
        assert!((he_plus - 54.4).abs() < 0.1);
    }

    #[test]
    fn potentials_increase_with_charge() {
        for element in Element::all() {
            let chis: Vec<f64> = (0..element.nstates() - 1)
                .map(|q| HydrogenicRates::ionization_potential(element, q))
                .collect();
            assert!(
                nei_core::is_strictly_increasing(&chis),
                "{element}: {chis:?}"
            );
        }
    }

    #[test]
    fn shell_bookkeeping() {
        assert_eq!(principal_quantum_number(1), 1);
        assert_eq!(principal_quantum_number(2), 1);
        assert_eq!(principal_quantum_number(3), 2);
        assert_eq!(principal_quantum_number(10), 2);
        assert_eq!(principal_quantum_number(26), 3);
        assert_eq!(outer_shell_occupancy(1), 1);
        assert_eq!(outer_shell_occupancy(8), 6);
        assert_eq!(outer_shell_occupancy(26), 16);
    }

    #[test]
    fn ionization_grows_with_temperature() {
        let cold = HydrogenicRates::ionization_rate(Element::HYDROGEN, 0, 1e4);
        let warm = HydrogenicRates::ionization_rate(Element::HYDROGEN, 0, 1e5);
        assert!(cold > 0.0 && warm > cold);
        assert_eq!(HydrogenicRates::ionization_rate(Element::HYDROGEN, 1, 1e5), 0.0);
    }

    #[test]
    fn recombination_falls_with_temperature() {
        let cold = HydrogenicRates::recombination_rate(1, 1e4);
        let hot = HydrogenicRates::recombination_rate(1, 1e6);
        assert!((cold - 2.6e-13).abs() < 1e-20);
        assert!(hot < cold);
        assert_eq!(HydrogenicRates::recombination_rate(0, 1e4), 0.0);
    }

    #[test]
    fn builds_valid_rates_for_every_element() {
        let model = HydrogenicRates::with_log_grid(4.0, 9.0, 51);
        for element in Element::all() {
            let rates = model.element_rates(element).unwrap();
            assert_eq!(rates.nstates(), element.nstates());
            assert_eq!(rates.ntemp(), 51);
        }
    }
}
