//! Equilibrium charge-state distribution by recursive elimination.
//!
//! The equilibrium is the null vector of the rate matrix. Solving for it
//! through the eigendecomposition means picking out the eigenvector of an
//! eigenvalue that is only approximately zero, so it is computed directly
//! from the balance equations instead.

use nei_core::stable_sum;

/// Equilibrium fractions for per-state rates `c` (ionization) and `r`
/// (recombination). `c.len() == r.len() == Z + 1`.
///
/// The result sums to 1 and is non-negative. Returns an error message if the
/// recurrence produces a non-finite value, which happens when `r[k]` is zero
/// for some physical `k ≥ 1` or the unnormalized populations overflow.
pub fn equilibrium_distribution(c: &[f64], r: &[f64]) -> Result<Vec<f64>, String> {
    let n = c.len();
    if n < 2 || r.len() != n {
        return Err(format!(
            "need at least two states with matching rates, got {} and {}",
            c.len(),
            r.len()
        ));
    }

    let mut f = vec![0.0; n];
    if n == 2 {
        f[0] = 1.0 / (1.0 + c[0] / r[1]);
        f[1] = c[0] * f[0] / r[1];
    } else {
        fill(&mut f, c, r, 1.0);
        let total = stable_sum(&f);
        if !(total.is_finite() && total > 0.0) {
            return Err(format!("unnormalized populations sum to {total}"));
        }
        fill(&mut f, c, r, 1.0 / total);
    }

    for v in f.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
    let total = stable_sum(&f);
    if !(total.is_finite() && total > 0.0) || f.iter().any(|v| !v.is_finite()) {
        return Err(format!("equilibrium populations are not finite (sum {total})"));
    }
    f.iter_mut().for_each(|v| *v /= total);
    Ok(f)
}

/// Run the balance recurrence upward from the neutral fraction `f0`.
fn fill(f: &mut [f64], c: &[f64], r: &[f64], f0: f64) {
    let z = f.len() - 1;
    f[0] = f0;
    f[1] = c[0] * f[0] / r[1];
    for j in 1..z - 1 {
        f[j + 1] = (-c[j - 1] * f[j - 1] + (c[j] + r[j]) * f[j]) / r[j + 1];
    }
    f[z] = c[z - 1] * f[z - 1] / r[z];
}
