//! Rate-transfer matrix construction.

use nalgebra::DMatrix;

/// Build the tridiagonal rate-transfer matrix from per-state rates.
///
/// `ionization[k]` is the rate out of state `k` upward, `recombination[k]`
/// the rate out of state `k` downward. With `f` the column vector of ionic
/// fractions, `df/dt = n_e A f` and every column of `A` sums to zero.
pub fn rate_matrix(ionization: &[f64], recombination: &[f64]) -> DMatrix<f64> {
    let n = ionization.len();
    debug_assert_eq!(n, recombination.len());
    let mut a = DMatrix::zeros(n, n);
    if n == 0 {
        return a;
    }
    let last = n - 1;
    for k in 0..n {
        let up = if k < last { ionization[k] } else { 0.0 };
        let down = if k > 0 { recombination[k] } else { 0.0 };
        a[(k, k)] = -(up + down);
        if k > 0 {
            a[(k, k - 1)] = ionization[k - 1];
        }
        if k < last {
            a[(k, k + 1)] = recombination[k + 1];
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_conserve_particles() {
        let c = [3.0, 2.0, 1.0, 0.0];
        let r = [0.0, 0.5, 0.25, 0.125];
        let a = rate_matrix(&c, &r);
        for j in 0..4 {
            let col_sum: f64 = a.column(j).iter().sum();
            assert!(col_sum.abs() < 1e-15, "column {j} sums to {col_sum}");
        }
    }

    #[test]
    fn two_state_layout() {
        let a = rate_matrix(&[2.0, 0.0], &[0.0, 5.0]);
        assert_eq!(a[(0, 0)], -2.0);
        assert_eq!(a[(0, 1)], 5.0);
        assert_eq!(a[(1, 0)], 2.0);
        assert_eq!(a[(1, 1)], -5.0);
    }

    #[test]
    fn ignores_unphysical_end_rates() {
        let a = rate_matrix(&[1.0, 9.0], &[9.0, 1.0]);
        assert_eq!(a[(0, 0)], -1.0);
        assert_eq!(a[(1, 1)], -1.0);
    }
}
