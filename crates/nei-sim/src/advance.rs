//! Closed-form time advance of one element's ionic fractions.
//!
//! With `T_e` and `n_e` held fixed over a step, `df/dt = n_e A f` has the
//! exact solution `f(dt) = V exp(n_e dt Λ) V⁻¹ f(0)` where `A V = V Λ`.

use crate::error::{SimError, SimResult};
use nalgebra::DVector;
use nei_core::stable_sum;
use nei_core::timing::{Timer, engine_timing};
use nei_tables::{RateTable, TableEntry};

/// Advance `fractions` by `dt` seconds at `temperature` and `electron_density`.
///
/// Rates come from the table node nearest `temperature`. Negative
/// components left by rounding are clamped to zero and the result is
/// renormalized to unit sum.
pub fn advance(
    table: &RateTable,
    fractions: &[f64],
    temperature: f64,
    electron_density: f64,
    dt: f64,
) -> SimResult<Vec<f64>> {
    let timer = Timer::start("advance");
    let entry = table.entry_at(temperature)?;
    let out = advance_with(entry, fractions, electron_density, dt);
    timer.stop_into(&engine_timing::ADVANCES);
    out
}

/// Same as [`advance`] with an already resolved table entry.
pub fn advance_with(
    entry: &TableEntry,
    fractions: &[f64],
    electron_density: f64,
    dt: f64,
) -> SimResult<Vec<f64>> {
    let n = entry.eigenvalues.len();
    if fractions.len() != n {
        return Err(SimError::Numerical {
            what: format!("{} fractions for {n} charge states", fractions.len()),
        });
    }
    if !dt.is_finite() || dt < 0.0 {
        return Err(SimError::Numerical {
            what: format!("invalid time step {dt}"),
        });
    }
    if !electron_density.is_finite() || electron_density < 0.0 {
        return Err(SimError::Numerical {
            what: format!("invalid electron density {electron_density}"),
        });
    }

    let f0 = DVector::from_column_slice(fractions);
    let mut modes = &entry.inverse * f0;
    for (c, lambda) in modes.iter_mut().zip(entry.eigenvalues.iter()) {
        *c *= (lambda * electron_density * dt).exp();
    }
    let f1 = &entry.eigenvectors * modes;

    let mut out: Vec<f64> = f1.iter().map(|v| v.max(0.0)).collect();
    if out.iter().any(|v| !v.is_finite()) {
        return Err(SimError::Numerical {
            what: "advanced fractions are not finite".into(),
        });
    }
    let total = stable_sum(&out);
    if total <= 0.0 {
        return Err(SimError::Numerical {
            what: format!("advanced fractions sum to {total}"),
        });
    }
    out.iter_mut().for_each(|v| *v /= total);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nei_atomic::{Element, ElementRates};

    fn helium_table() -> RateTable {
        let grid = vec![1e5, 1e6];
        let ion = vec![vec![1e-9, 2e-9], vec![1e-10, 5e-10], vec![0.0, 0.0]];
        let rec = vec![vec![0.0, 0.0], vec![1e-11, 5e-12], vec![2e-11, 1e-11]];
        let rates = ElementRates::new(Element::HELIUM, grid, ion, rec).unwrap();
        RateTable::build(&rates).unwrap()
    }

    #[test]
    fn zero_step_is_identity() {
        let table = helium_table();
        let f0 = [0.2, 0.3, 0.5];
        let f1 = advance(&table, &f0, 1e6, 1e9, 0.0).unwrap();
        for (a, b) in f0.iter().zip(&f1) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_density_is_identity() {
        let table = helium_table();
        let f0 = [1.0, 0.0, 0.0];
        let f1 = advance(&table, &f0, 1e5, 0.0, 1e6).unwrap();
        assert!((f1[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn long_step_reaches_equilibrium() {
        let table = helium_table();
        let f1 = advance(&table, &[1.0, 0.0, 0.0], 1e6, 1e10, 1e6).unwrap();
        let eq = &table.entry(1).unwrap().equilibrium;
        for (a, b) in f1.iter().zip(eq) {
            assert!((a - b).abs() < 1e-9, "{f1:?} vs {eq:?}");
        }
    }

    #[test]
    fn output_is_a_distribution() {
        let table = helium_table();
        let f1 = advance(&table, &[0.0, 0.0, 1.0], 3e5, 1e8, 37.0).unwrap();
        assert!(f1.iter().all(|&v| v >= 0.0));
        assert!((f1.iter().sum::<f64>() - 1.0).abs() < 1e-14);
    }

    #[test]
    fn rejects_bad_inputs() {
        let table = helium_table();
        assert!(advance(&table, &[1.0, 0.0], 1e6, 1.0, 1.0).is_err());
        assert!(advance(&table, &[1.0, 0.0, 0.0], 1e6, -1.0, 1.0).is_err());
        assert!(advance(&table, &[1.0, 0.0, 0.0], 1e6, 1.0, -1.0).is_err());
        assert!(matches!(
            advance(&table, &[1.0, 0.0, 0.0], f64::NAN, 1.0, 1.0),
            Err(SimError::Data(_))
        ));
    }
}
