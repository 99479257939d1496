//! Dense eigendecomposition of rate-transfer matrices.
//!
//! A rate matrix is tridiagonal with non-negative couplings `c_k` (below the
//! diagonal) and `r_{k+1}` (above it). The diagonal similarity with
//! `d_{k+1} / d_k = sqrt(c_k / r_{k+1})` turns it into a symmetric
//! tridiagonal matrix with couplings `sqrt(c_k r_{k+1})`; where a coupling
//! vanishes the matrix is block triangular and the symmetric form shares
//! the block spectra. Eigenvalues therefore come from a symmetric solver
//! and are real.
//!
//! The scaling itself is never applied, since `d` can span hundreds of
//! decades at cold nodes. Each eigenvector is instead recovered from the
//! original matrix by a twisted factorization of `A - λI`, which leaves a
//! residual at rounding level in every column.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Eigenvalues ascending, matching eigenvector columns, and their inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigensystem {
    pub eigenvalues: DVector<f64>,
    pub eigenvectors: DMatrix<f64>,
    pub inverse: DMatrix<f64>,
}

const MAX_QR_ITERATIONS: usize = 10_000;

/// Rescale a partial eigenvector once its entries grow past this.
const GROWTH_LIMIT: f64 = 1e100;

/// Decompose `a` so that `a * eigenvectors ≈ eigenvectors * diag(eigenvalues)`.
///
/// `a` must be tridiagonal with non-negative off-diagonal entries, as built
/// by [`rate_matrix`](crate::matrix::rate_matrix). Eigenvalues are sorted
/// ascending. Each eigenvector has unit Euclidean norm and its
/// largest-magnitude component positive.
pub fn decompose(a: &DMatrix<f64>) -> Result<Eigensystem, String> {
    let n = a.nrows();
    if n == 0 || n != a.ncols() {
        return Err(format!("matrix must be square and non-empty, got {}x{}", n, a.ncols()));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err("matrix has non-finite entries".into());
    }
    let bands = Bands::from_matrix(a)?;

    let mut eigenvalues: Vec<f64> =
        SymmetricEigen::try_new(bands.symmetric(), f64::EPSILON, MAX_QR_ITERATIONS)
            .ok_or_else(|| "symmetric QR iteration did not converge".to_string())?
            .eigenvalues
            .iter()
            .copied()
            .collect();
    eigenvalues.sort_by(f64::total_cmp);

    let tiny = (f64::EPSILON * a.amax()).max(f64::MIN_POSITIVE);
    let mut eigenvectors = DMatrix::zeros(n, n);
    for (j, &lambda) in eigenvalues.iter().enumerate() {
        // equal eigenvalues take distinct twist positions
        let rank = eigenvalues[..j]
            .iter()
            .filter(|&&mu| (lambda - mu).abs() <= tiny)
            .count();
        let mut v = bands.eigenvector(lambda, tiny, rank);
        let norm = v.norm();
        if norm > 0.0 && norm.is_finite() {
            v /= norm;
        }
        if v[v.iamax()] < 0.0 {
            v.neg_mut();
        }
        eigenvectors.set_column(j, &v);
    }

    let inverse = eigenvectors
        .clone()
        .try_inverse()
        .ok_or_else(|| "eigenvector matrix is singular".to_string())?;
    if inverse.iter().any(|x| !x.is_finite()) {
        return Err("eigenvector inverse has non-finite entries".into());
    }

    Ok(Eigensystem {
        eigenvalues: DVector::from_vec(eigenvalues),
        eigenvectors,
        inverse,
    })
}

/// The three bands of a tridiagonal matrix.
struct Bands {
    diag: Vec<f64>,
    /// `a[(k + 1, k)]`
    lower: Vec<f64>,
    /// `a[(k, k + 1)]`
    upper: Vec<f64>,
}

impl Bands {
    fn from_matrix(a: &DMatrix<f64>) -> Result<Self, String> {
        let n = a.nrows();
        for j in 0..n {
            for i in 0..n {
                if i.abs_diff(j) > 1 && a[(i, j)] != 0.0 {
                    return Err(format!("entry ({i}, {j}) lies outside the tridiagonal band"));
                }
            }
        }
        let lower: Vec<f64> = (1..n).map(|k| a[(k, k - 1)]).collect();
        let upper: Vec<f64> = (1..n).map(|k| a[(k - 1, k)]).collect();
        if let Some(k) = (0..lower.len()).find(|&k| lower[k] < 0.0 || upper[k] < 0.0) {
            return Err(format!("negative coupling between states {k} and {}", k + 1));
        }
        Ok(Self {
            diag: (0..n).map(|k| a[(k, k)]).collect(),
            lower,
            upper,
        })
    }

    /// Symmetric tridiagonal matrix with the same spectrum.
    fn symmetric(&self) -> DMatrix<f64> {
        let n = self.diag.len();
        let mut s = DMatrix::from_diagonal(&DVector::from_column_slice(&self.diag));
        for k in 0..n - 1 {
            // split the square root so tiny products cannot underflow
            let coupling = self.lower[k].sqrt() * self.upper[k].sqrt();
            s[(k + 1, k)] = coupling;
            s[(k, k + 1)] = coupling;
        }
        s
    }

    /// Null vector of `A - λI` from a twisted factorization.
    ///
    /// The forward and backward pivot sequences meet at the twist index with
    /// the smallest defect, where the only non-zero residual entry sits.
    /// `rank` picks the next best twist for repeated eigenvalues.
    fn eigenvector(&self, lambda: f64, tiny: f64, rank: usize) -> DVector<f64> {
        let n = self.diag.len();
        let guard = |x: f64| if x.abs() < tiny { tiny.copysign(x) } else { x };
        let shifted: Vec<f64> = self.diag.iter().map(|d| d - lambda).collect();

        let mut top = vec![0.0; n];
        top[0] = shifted[0];
        for k in 1..n {
            top[k] = shifted[k] - self.lower[k - 1] * self.upper[k - 1] / guard(top[k - 1]);
        }
        let mut bottom = vec![0.0; n];
        bottom[n - 1] = shifted[n - 1];
        for k in (0..n - 1).rev() {
            bottom[k] = shifted[k] - self.upper[k] * self.lower[k] / guard(bottom[k + 1]);
        }

        let defect = |k: usize| (top[k] + bottom[k] - shifted[k]).abs();
        let mut twists: Vec<usize> = (0..n).collect();
        twists.sort_by(|&i, &j| defect(i).total_cmp(&defect(j)));
        let t = twists[rank.min(n - 1)];

        let mut z = DVector::zeros(n);
        z[t] = 1.0;
        for k in (0..t).rev() {
            z[k] = -self.upper[k] * z[k + 1] / guard(top[k]);
            if z[k].abs() > GROWTH_LIMIT {
                z /= GROWTH_LIMIT;
            }
        }
        for k in t + 1..n {
            z[k] = -self.lower[k - 1] * z[k - 1] / guard(bottom[k]);
            if z[k].abs() > GROWTH_LIMIT {
                z /= GROWTH_LIMIT;
            }
        }
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::rate_matrix;

    fn residual(a: &DMatrix<f64>, sys: &Eigensystem) -> f64 {
        let lhs = a * &sys.eigenvectors;
        let rhs = &sys.eigenvectors * DMatrix::from_diagonal(&sys.eigenvalues);
        (lhs - rhs).amax()
    }

    fn spectral_step(sys: &Eigensystem, tau: f64, f0: &DVector<f64>) -> DVector<f64> {
        let decay = sys.eigenvalues.map(|l| (l * tau).exp());
        &sys.eigenvectors * DMatrix::from_diagonal(&decay) * (&sys.inverse * f0)
    }

    /// Carbon at 10^4 K: rates from 1e-8 down past 1e-250.
    fn cold_carbon() -> DMatrix<f64> {
        let c = [1.47e-8, 2.22e-15, 4.83e-25, 5.40e-38, 9.14e-184, 6.61e-260, 0.0];
        let r = [0.0, 2.60e-13, 2.74e-12, 1.09e-11, 2.90e-11, 6.19e-11, 1.15e-10];
        rate_matrix(&c, &r)
    }

    #[test]
    fn two_state_spectrum() {
        let a = rate_matrix(&[2.0, 0.0], &[0.0, 3.0]);
        let sys = decompose(&a).unwrap();
        assert!((sys.eigenvalues[0] + 5.0).abs() < 1e-12);
        assert!(sys.eigenvalues[1].abs() < 1e-12);
        assert!(residual(&a, &sys) < 1e-12);
    }

    #[test]
    fn eigenvalues_are_sorted_ascending() {
        let a = rate_matrix(&[4.0, 1.5, 0.2, 0.0], &[0.0, 0.7, 2.0, 5.0]);
        let sys = decompose(&a).unwrap();
        for w in sys.eigenvalues.as_slice().windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert!(residual(&a, &sys) < 1e-12 * a.amax());
    }

    #[test]
    fn inverse_is_inverse() {
        let a = rate_matrix(&[1e-3, 2e-4, 0.0], &[0.0, 5e-4, 1e-3]);
        let sys = decompose(&a).unwrap();
        let id = &sys.eigenvectors * &sys.inverse;
        assert!((id - DMatrix::identity(3, 3)).amax() < 1e-10);
    }

    #[test]
    fn handles_decoupled_states() {
        // ionization fully frozen out
        let a = rate_matrix(&[0.0, 0.0, 0.0], &[0.0, 2.0, 1.0]);
        let sys = decompose(&a).unwrap();
        assert!(residual(&a, &sys) < 1e-12);
    }

    #[test]
    fn repeated_eigenvalues_keep_independent_vectors() {
        let a = DMatrix::zeros(3, 3);
        let sys = decompose(&a).unwrap();
        assert_eq!(sys.eigenvalues, DVector::zeros(3));
        let id = &sys.eigenvectors * &sys.inverse;
        assert!((id - DMatrix::identity(3, 3)).amax() < 1e-12);
    }

    #[test]
    fn columns_are_unit_norm() {
        let a = rate_matrix(&[3.0, 1.0, 0.0], &[0.0, 1.0, 4.0]);
        let sys = decompose(&a).unwrap();
        for col in sys.eigenvectors.column_iter() {
            assert!((col.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn wide_dynamic_range_keeps_rounding_level_residual() {
        let a = cold_carbon();
        let sys = decompose(&a).unwrap();
        assert!(
            residual(&a, &sys) <= 1e-12 * a.amax(),
            "residual {:e}",
            residual(&a, &sys)
        );
        assert!(sys.eigenvalues[6].abs() <= 1e-12 * a.amax());
        let id = &sys.eigenvectors * &sys.inverse;
        assert!((id - DMatrix::identity(7, 7)).amax() < 1e-10);
    }

    #[test]
    fn wide_dynamic_range_matches_matrix_exponential() {
        let a = cold_carbon();
        let sys = decompose(&a).unwrap();
        for tau in [1e11, 1e12, 1e13] {
            for start in [0, 3, 6] {
                let mut f0 = DVector::zeros(7);
                f0[start] = 1.0;
                let spectral = spectral_step(&sys, tau, &f0);
                let exact = (&a * tau).exp() * &f0;
                let gap = (spectral - exact).amax();
                assert!(gap < 1e-10, "tau {tau:e} from state {start}: gap {gap:e}");
            }
        }
    }

    #[test]
    fn rejects_non_square() {
        let a = DMatrix::<f64>::zeros(2, 3);
        assert!(decompose(&a).is_err());
    }

    #[test]
    fn rejects_negative_coupling() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, -1.0, 1.0, 0.0]);
        assert!(decompose(&a).is_err());
    }

    #[test]
    fn rejects_entries_outside_the_band() {
        let mut a = rate_matrix(&[1.0, 1.0, 0.0], &[0.0, 1.0, 1.0]);
        a[(2, 0)] = 0.5;
        assert!(decompose(&a).is_err());
    }
}
