//! Rankine-Hugoniot jump conditions for a normal shock in an ideal gas.
//!
//! Used to set up post-shock temperature and density drivers.

use crate::error::{SimError, SimResult};

/// Adiabatic index of a monatomic ideal gas.
pub const MONATOMIC_GAMMA: f64 = 5.0 / 3.0;

fn check(gamma: f64, mach: f64) -> SimResult<()> {
    if !gamma.is_finite() || gamma <= 1.0 {
        return Err(SimError::config(format!("adiabatic index must exceed 1, got {gamma}")));
    }
    if !mach.is_finite() || mach < 1.0 {
        return Err(SimError::config(format!(
            "upstream Mach number must be at least 1, got {mach}"
        )));
    }
    Ok(())
}

/// Post-shock over pre-shock density, `(γ+1)M² / ((γ-1)M² + 2)`.
pub fn density_ratio(gamma: f64, mach: f64) -> SimResult<f64> {
    check(gamma, mach)?;
    let m2 = mach * mach;
    Ok((gamma + 1.0) * m2 / ((gamma - 1.0) * m2 + 2.0))
}

/// Post-shock over pre-shock temperature.
pub fn temperature_ratio(gamma: f64, mach: f64) -> SimResult<f64> {
    check(gamma, mach)?;
    let m2 = mach * mach;
    let num = (2.0 * gamma * m2 - (gamma - 1.0)) * ((gamma - 1.0) * m2 + 2.0);
    let den = (gamma + 1.0).powi(2) * m2;
    Ok(num / den)
}

/// Post-shock over pre-shock pressure, `(2γM² - (γ-1)) / (γ+1)`.
pub fn pressure_ratio(gamma: f64, mach: f64) -> SimResult<f64> {
    check(gamma, mach)?;
    Ok((2.0 * gamma * mach * mach - (gamma - 1.0)) / (gamma + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_mach_is_no_jump() {
        for g in [1.4, MONATOMIC_GAMMA] {
            assert!((density_ratio(g, 1.0).unwrap() - 1.0).abs() < 1e-15);
            assert!((temperature_ratio(g, 1.0).unwrap() - 1.0).abs() < 1e-15);
            assert!((pressure_ratio(g, 1.0).unwrap() - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn strong_shock_compression_limit() {
        let r = density_ratio(MONATOMIC_GAMMA, 1e4).unwrap();
        assert!((r - 4.0).abs() < 1e-6);
    }

    #[test]
    fn ideal_gas_law_holds_across_shock() {
        let (g, m) = (1.4, 3.0);
        let p = pressure_ratio(g, m).unwrap();
        let rho = density_ratio(g, m).unwrap();
        let t = temperature_ratio(g, m).unwrap();
        assert!((p / rho - t).abs() < 1e-12);
        // Tabulated normal-shock values for air at M = 3.
        assert!((rho - 3.857).abs() < 1e-3);
        assert!((t - 2.679).abs() < 1e-3);
    }

    #[test]
    fn rejects_unphysical_inputs() {
        assert!(density_ratio(1.0, 2.0).is_err());
        assert!(temperature_ratio(1.4, 0.5).is_err());
        assert!(pressure_ratio(1.4, f64::NAN).is_err());
    }
}
