//! Matrix utilities on top of nalgebra.
//!
//! The square-root routines here back the diffusion terms of the cross-asset
//! state process. With [`SalvagingAlgorithm::Spectral`] or
//! [`SalvagingAlgorithm::Higham`] a symmetric input that is only nearly
//! positive semi-definite is repaired silently instead of failing.
//!
//! # Example
//!
//! ```
//! use nalgebra::DMatrix;
//! use pricer_core::math::matrix::{pseudo_sqrt, SalvagingAlgorithm};
//!
//! // Slightly indefinite correlation matrix
//! let m = DMatrix::from_row_slice(3, 3, &[
//!     1.0, 0.9, 0.7,
//!     0.9, 1.0, 0.3,
//!     0.7, 0.3, 1.0,
//! ]);
//! let root = pseudo_sqrt(&m, SalvagingAlgorithm::Spectral).unwrap();
//! let rebuilt = &root * root.transpose();
//! for i in 0..3 {
//!     assert!((rebuilt[(i, i)] - 1.0).abs() < 1e-12);
//! }
//! ```

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Matrix operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// Matrix is not square.
    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Cholesky factorisation failed.
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    /// Inversion failed.
    #[error("Matrix is singular")]
    Singular,
}

/// Repair strategy used when taking a matrix square root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SalvagingAlgorithm {
    /// Plain Cholesky; fails on anything that is not positive definite.
    None,
    /// Eigen decomposition with negative eigenvalues floored at zero.
    #[default]
    Spectral,
    /// Higham nearest-correlation projection followed by the spectral root.
    Higham,
}

const HIGHAM_MAX_ITERATIONS: usize = 100;
const HIGHAM_TOLERANCE: f64 = 1e-12;

fn ensure_square(m: &DMatrix<f64>) -> Result<usize, MatrixError> {
    if m.nrows() != m.ncols() {
        return Err(MatrixError::NotSquare {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(m.nrows())
}

/// Eigenvalues of a symmetric matrix (unordered).
pub fn symmetric_eigenvalues(m: &DMatrix<f64>) -> Result<DVector<f64>, MatrixError> {
    ensure_square(m)?;
    Ok(m.clone().symmetric_eigenvalues())
}

/// Smallest eigenvalue of a symmetric matrix.
pub fn min_eigenvalue(m: &DMatrix<f64>) -> Result<f64, MatrixError> {
    let ev = symmetric_eigenvalues(m)?;
    Ok(ev.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Whether every eigenvalue is at least `-tolerance`.
pub fn is_positive_semi_definite(m: &DMatrix<f64>, tolerance: f64) -> Result<bool, MatrixError> {
    Ok(min_eigenvalue(m)? >= -tolerance)
}

/// Project a symmetric matrix onto the PSD cone by flooring eigenvalues at zero.
fn project_psd(m: &DMatrix<f64>) -> DMatrix<f64> {
    let eigen = m.clone().symmetric_eigen();
    let clamped = eigen.eigenvalues.map(|v| v.max(0.0));
    let v = &eigen.eigenvectors;
    v * DMatrix::from_diagonal(&clamped) * v.transpose()
}

/// Nearest correlation matrix in the Frobenius norm (Higham 2002).
///
/// Alternating projections with Dykstra's correction between the PSD cone
/// and the set of unit-diagonal symmetric matrices.
pub fn nearest_correlation(m: &DMatrix<f64>) -> Result<DMatrix<f64>, MatrixError> {
    let n = ensure_square(m)?;
    let mut y = m.clone();
    let mut correction = DMatrix::<f64>::zeros(n, n);

    for _ in 0..HIGHAM_MAX_ITERATIONS {
        let r = &y - &correction;
        let x = project_psd(&r);
        correction = &x - &r;
        let mut next = x;
        for i in 0..n {
            next[(i, i)] = 1.0;
        }
        let change = (&next - &y).norm();
        let scale = next.norm().max(f64::MIN_POSITIVE);
        y = next;
        if change / scale < HIGHAM_TOLERANCE {
            break;
        }
    }
    Ok(y)
}

/// Rescale rows of `root` so that `root * root^T` keeps the diagonal of `m`.
fn normalise_rows(m: &DMatrix<f64>, root: &mut DMatrix<f64>) {
    for i in 0..root.nrows() {
        let norm = root.row(i).norm();
        if norm > 0.0 {
            let target = m[(i, i)].max(0.0).sqrt();
            root.row_mut(i).scale_mut(target / norm);
        }
    }
}

fn spectral_root(m: &DMatrix<f64>) -> DMatrix<f64> {
    let eigen = m.clone().symmetric_eigen();
    let sqrt_ev = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
    let mut root = &eigen.eigenvectors * DMatrix::from_diagonal(&sqrt_ev);
    normalise_rows(m, &mut root);
    root
}

/// Pseudo square root `S` of a symmetric matrix with `S * S^T ≈ m`.
///
/// # Errors
///
/// * [`MatrixError::NotSquare`] for non-square input
/// * [`MatrixError::NotPositiveDefinite`] with [`SalvagingAlgorithm::None`]
///   when Cholesky fails
pub fn pseudo_sqrt(
    m: &DMatrix<f64>,
    algorithm: SalvagingAlgorithm,
) -> Result<DMatrix<f64>, MatrixError> {
    let n = ensure_square(m)?;
    match algorithm {
        SalvagingAlgorithm::None => m
            .clone()
            .cholesky()
            .map(|c| c.l())
            .ok_or(MatrixError::NotPositiveDefinite),
        SalvagingAlgorithm::Spectral => Ok(spectral_root(m)),
        SalvagingAlgorithm::Higham => {
            // Work in correlation space; zero-variance factors stay zero.
            let vols: Vec<f64> = (0..n).map(|i| m[(i, i)].max(0.0).sqrt()).collect();
            let mut corr = DMatrix::<f64>::identity(n, n);
            for i in 0..n {
                for j in 0..n {
                    if i != j && vols[i] > 0.0 && vols[j] > 0.0 {
                        corr[(i, j)] = m[(i, j)] / (vols[i] * vols[j]);
                    }
                }
            }
            let corr = nearest_correlation(&corr)?;
            let mut root = spectral_root(&corr);
            for i in 0..n {
                root.row_mut(i).scale_mut(vols[i]);
            }
            Ok(root)
        }
    }
}

/// Inverse via LU decomposition.
pub fn invert(m: &DMatrix<f64>) -> Result<DMatrix<f64>, MatrixError> {
    ensure_square(m)?;
    m.clone().try_inverse().ok_or(MatrixError::Singular)
}

/// 2-norm condition number (ratio of extreme singular values).
///
/// Infinite for a singular matrix.
pub fn condition_number(m: &DMatrix<f64>) -> f64 {
    let sv = m.clone().singular_values();
    let max = sv.iter().copied().fold(0.0, f64::max);
    let min = sv.iter().copied().fold(f64::INFINITY, f64::min);
    if min <= 0.0 {
        f64::INFINITY
    } else {
        max / min
    }
}
