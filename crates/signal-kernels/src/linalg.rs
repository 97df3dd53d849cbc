//! Dense linear algebra primitives for small matrices
//!
//! Only what the SVD entropy needs: eigenvalues of a symmetric matrix via
//! cyclic Jacobi rotations, and singular values of a tall matrix through its
//! Gram matrix. Matrices are row-major `&[f64]`.

use crate::{KernelError, KernelResult};

/// Upper bound on Jacobi sweeps; convergence is quadratic, real inputs need < 10
const MAX_SWEEPS: usize = 64;

/// Off-diagonal energy, relative to the total, treated as converged
const CONVERGENCE: f64 = 1e-30;

/// Eigenvalues of a symmetric `n x n` matrix, sorted descending.
///
/// Only the upper triangle's mirror symmetry is assumed, not checked.
pub fn symmetric_eigenvalues(matrix: &[f64], n: usize) -> KernelResult<Vec<f64>> {
    if matrix.len() != n * n {
        return Err(KernelError::LengthMismatch {
            expected: n * n,
            actual: matrix.len(),
        });
    }

    let mut a = matrix.to_vec();
    let total: f64 = a.iter().map(|v| v * v).sum();

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p * n + q] * a[p * n + q])
            .sum();
        if off <= CONVERGENCE * total {
            break;
        }

        for p in 0..n {
            for q in p + 1..n {
                let apq = a[p * n + q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q * n + q] - a[p * n + p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A' = Jᵀ A J: columns first, then rows
                for k in 0..n {
                    let akp = a[k * n + p];
                    let akq = a[k * n + q];
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p * n + k];
                    let aqk = a[q * n + k];
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
            }
        }
    }

    let mut eigenvalues: Vec<f64> = (0..n).map(|i| a[i * n + i]).collect();
    eigenvalues.sort_by(|x, y| y.total_cmp(x));
    Ok(eigenvalues)
}

/// Singular values of a row-major `rows x cols` matrix, sorted descending.
///
/// Computed as the square roots of the eigenvalues of `XᵀX` (`cols x cols`),
/// which is cheap when `cols` is an embedding order. Rounding negatives clamp
/// to zero.
pub fn singular_values(matrix: &[f64], rows: usize, cols: usize) -> KernelResult<Vec<f64>> {
    if matrix.len() != rows * cols {
        return Err(KernelError::LengthMismatch {
            expected: rows * cols,
            actual: matrix.len(),
        });
    }

    let mut gram = vec![0.0; cols * cols];
    for row in matrix.chunks_exact(cols) {
        for i in 0..cols {
            for j in i..cols {
                gram[i * cols + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..cols {
        for j in 0..i {
            gram[i * cols + j] = gram[j * cols + i];
        }
    }

    Ok(symmetric_eigenvalues(&gram, cols)?
        .into_iter()
        .map(|ev| ev.max(0.0).sqrt())
        .collect())
}
