//! Dense linear algebra for small symmetric systems.
//!
//! Regressions here have a handful of columns, so the normal-equation matrix
//! `XᵀX` is tiny. Cholesky factorization handles inversion, and a Jacobi
//! eigendecomposition supplies the condition number.

use crate::error::{RegressionError, Result};
use ndarray::{Array1, Array2};

/// Relative pivot below which a column is treated as collinear with earlier ones.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

fn ensure_square(matrix: &Array2<f64>) -> Result<usize> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    Ok(n)
}

/// Lower-triangular Cholesky factor `L` with `A = L Lᵀ`.
///
/// Fails with [`RegressionError::Singular`] when a pivot collapses relative to
/// its diagonal entry, i.e. the column is (numerically) a combination of the
/// preceding ones.
pub fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = ensure_square(a)?;
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let diag = a[[j, j]];
        let mut pivot = diag;
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if diag.is_nan() || diag <= 0.0 || pivot <= diag * PIVOT_TOLERANCE {
            return Err(RegressionError::Singular(format!(
                "column {} is linearly dependent on earlier columns",
                j
            )));
        }
        let ljj = pivot.sqrt();
        l[[j, j]] = ljj;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / ljj;
        }
    }

    Ok(l)
}

/// Inverse of a lower-triangular matrix by forward substitution.
fn invert_lower(l: &Array2<f64>) -> Array2<f64> {
    let n = l.nrows();
    let mut inv = Array2::<f64>::zeros((n, n));
    for col in 0..n {
        inv[[col, col]] = 1.0 / l[[col, col]];
        for i in (col + 1)..n {
            let mut sum = 0.0;
            for k in col..i {
                sum -= l[[i, k]] * inv[[k, col]];
            }
            inv[[i, col]] = sum / l[[i, i]];
        }
    }
    inv
}

/// Inverse of a symmetric positive definite matrix.
pub fn invert_spd(a: &Array2<f64>) -> Result<Array2<f64>> {
    let l = cholesky(a)?;
    let l_inv = invert_lower(&l);
    // A⁻¹ = L⁻ᵀ L⁻¹
    Ok(l_inv.t().dot(&l_inv))
}

/// Condition number of a design matrix: `sqrt(λmax / λmin)` of `XᵀX`.
pub fn condition_number(design: &Array2<f64>) -> f64 {
    let gram = design.t().dot(design);
    match jacobi_eigendecomp(&gram, 100, 1e-12) {
        Ok(decomp) => {
            let max_eig = decomp
                .eigenvalues
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let min_eig = decomp
                .eigenvalues
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);

            if min_eig <= max_eig.abs() * 1e-14 {
                f64::INFINITY
            } else {
                (max_eig / min_eig).sqrt()
            }
        }
        Err(_) => f64::INFINITY,
    }
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_sweeps` - Maximum number of sweeps over the off-diagonal entries
/// * `tolerance` - Convergence tolerance for off-diagonal elements
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<EigenDecomposition> {
    let n = ensure_square(matrix)?;

    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    if n > 1 {
        for _ in 0..max_sweeps * n * n {
            let (p, q, max_val) = find_largest_off_diagonal(&a);
            if max_val.abs() < tolerance {
                break;
            }
            let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
            apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
        }
    }

    let eigenvalues: Array1<f64> = (0..n).map(|i| a[[i, i]]).collect();

    // Sort eigenvalues and eigenvectors in descending order
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| {
        eigenvalues[j]
            .partial_cmp(&eigenvalues[i])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_eigenvectors = Array2::<f64>::zeros((n, n));
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_eigenvectors
            .column_mut(new_idx)
            .assign(&v.column(old_idx));
    }

    Ok(EigenDecomposition {
        eigenvalues: sorted_eigenvalues,
        eigenvectors: sorted_eigenvectors,
    })
}

fn find_largest_off_diagonal(matrix: &Array2<f64>) -> (usize, usize, f64) {
    let n = matrix.nrows();
    let mut max_val = 0.0;
    let mut p = 0;
    let mut q = 1;

    for i in 0..n {
        for j in (i + 1)..n {
            let val = matrix[[i, j]].abs();
            if val > max_val {
                max_val = val;
                p = i;
                q = j;
            }
        }
    }

    (p, q, matrix[[p, q]])
}

/// Rotation (cos, sin) that zeroes `a[p, q]`.
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq.abs() < 1e-300 {
        return (1.0, 0.0);
    }

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };

    let cos_theta = 1.0 / (1.0 + t * t).sqrt();
    (cos_theta, t * cos_theta)
}

fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_cholesky_reconstructs() {
        let a = array![[4.0, 2.0, 0.4], [2.0, 5.0, 1.0], [0.4, 1.0, 3.0]];
        let l = cholesky(&a).unwrap();
        let rebuilt = l.dot(&l.t());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rebuilt[[i, j]], a[[i, j]], epsilon = 1e-12);
            }
            for j in (i + 1)..3 {
                assert_eq!(l[[i, j]], 0.0);
            }
        }
    }

    #[test]
    fn test_invert_spd() {
        let a = array![[4.0, 2.0, 0.4], [2.0, 5.0, 1.0], [0.4, 1.0, 3.0]];
        let inv = invert_spd(&a).unwrap();
        let identity = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[[i, j]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_matrix() {
        // Second column is twice the first
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let gram = x.t().dot(&x);
        assert!(matches!(invert_spd(&gram), Err(RegressionError::Singular(_))));
    }

    #[test]
    fn test_non_square() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            cholesky(&a),
            Err(RegressionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_jacobi_diagonal() {
        let a = array![[1.0, 0.0], [0.0, 3.0]];
        let decomp = jacobi_eigendecomp(&a, 100, 1e-12).unwrap();
        assert_relative_eq!(decomp.eigenvalues[0], 3.0);
        assert_relative_eq!(decomp.eigenvalues[1], 1.0);
    }

    #[test]
    fn test_jacobi_symmetric() {
        // Eigenvalues of [[2,1],[1,2]] are 3 and 1
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let decomp = jacobi_eigendecomp(&a, 100, 1e-12).unwrap();
        assert_relative_eq!(decomp.eigenvalues[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(decomp.eigenvalues[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_condition_number_orthogonal_design() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        assert_relative_eq!(condition_number(&x), 1.0, epsilon = 1e-12);

        let x = array![[2.0, 0.0], [0.0, 1.0]];
        assert_relative_eq!(condition_number(&x), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_condition_number_collinear() {
        let x = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(condition_number(&x).is_infinite());
    }
}
