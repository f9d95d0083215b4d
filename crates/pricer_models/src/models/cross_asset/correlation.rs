//! Instantaneous correlation between the Brownian drivers of a
//! cross-asset model.
//!
//! Rows and columns follow the model's factor order: one IR block per
//! currency, domestic first, then one FX block per foreign currency. With
//! EUR domestic and USD, GBP foreign the order is
//!
//! ```text
//!   0: IR EUR   1: IR USD   2: IR GBP   3: FX USD/EUR   4: FX GBP/EUR
//! ```
//!
//! so entry (1, 3) correlates the USD short rate with the USD/EUR spot.
//!
//! The state process draws correlated increments through a Cholesky-type
//! factor of this matrix, which only exists when no eigenvalue is
//! negative. Entry checks are elementwise; the eigenvalue check catches
//! triplets such as ρ = (0.9, 0.9, -0.9) whose entries are all valid but
//! which describe no joint distribution.
//!
//! ```
//! use pricer_models::models::cross_asset::CorrelationMatrix;
//!
//! // IR EUR, IR USD, FX USD/EUR
//! let corr = CorrelationMatrix::new(&[
//!     1.0, 0.3, 0.2,
//!     0.3, 1.0, -0.4,
//!     0.2, -0.4, 1.0,
//! ], 3).unwrap();
//! assert_eq!(corr.get(1, 2), -0.4);
//!
//! // Every entry is in range but the matrix is indefinite
//! assert!(CorrelationMatrix::new(&[
//!     1.0, 0.9, 0.9,
//!     0.9, 1.0, -0.9,
//!     0.9, -0.9, 1.0,
//! ], 3).is_err());
//! ```

use nalgebra::DMatrix;
use pricer_core::math::matrix::min_eigenvalue;

use super::error::CorrelationError;

/// Tolerance for diagonal and symmetry checks.
const ENTRY_TOLERANCE: f64 = 1e-10;

/// Eigenvalues down to `-EIGEN_TOLERANCE` count as non-negative.
pub const EIGEN_TOLERANCE: f64 = 1e-10;

/// Correlation matrix with construction-time validation.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    matrix: DMatrix<f64>,
}

impl CorrelationMatrix {
    /// Builds the matrix from `dim * dim` entries, row by row in factor
    /// order.
    ///
    /// # Errors
    ///
    /// [`CorrelationError::InvalidDimensions`] for a wrong entry count, then
    /// the checks of [`from_matrix`](Self::from_matrix).
    pub fn new(data: &[f64], dim: usize) -> Result<Self, CorrelationError> {
        let expected = dim * dim;
        if data.len() != expected {
            return Err(CorrelationError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }
        Self::from_matrix(DMatrix::from_row_slice(dim, dim, data))
    }

    /// Validates a square matrix.
    ///
    /// Unit diagonal and symmetry are checked to 1e-10, then
    /// off-diagonal range, then the smallest eigenvalue against
    /// [`EIGEN_TOLERANCE`], which absorbs round-off in calibrated inputs.
    pub fn from_matrix(matrix: DMatrix<f64>) -> Result<Self, CorrelationError> {
        let dim = matrix.nrows();
        if matrix.ncols() != dim {
            return Err(CorrelationError::InvalidDimensions {
                expected: dim * dim,
                got: dim * matrix.ncols(),
            });
        }

        for i in 0..dim {
            let diag = matrix[(i, i)];
            if (diag - 1.0).abs() > ENTRY_TOLERANCE {
                return Err(CorrelationError::InvalidDiagonal {
                    index: i,
                    value: diag,
                });
            }
        }

        for i in 0..dim {
            for j in (i + 1)..dim {
                let val_ij = matrix[(i, j)];
                if (val_ij - matrix[(j, i)]).abs() > ENTRY_TOLERANCE {
                    return Err(CorrelationError::NotSymmetric { i, j });
                }
                if !(-1.0..=1.0).contains(&val_ij) {
                    return Err(CorrelationError::OutOfRange { i, j, value: val_ij });
                }
            }
        }

        if dim > 0 {
            let min_ev = min_eigenvalue(&matrix).unwrap_or(f64::NEG_INFINITY);
            if min_ev < -EIGEN_TOLERANCE {
                return Err(CorrelationError::NotPositiveSemiDefinite {
                    min_eigenvalue: min_ev,
                });
            }
        }

        Ok(Self { matrix })
    }

    /// Identity correlation (independent factors).
    pub fn identity(dim: usize) -> Self {
        Self {
            matrix: DMatrix::identity(dim, dim),
        }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Element at (i, j).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[(i, j)]
    }

    /// Underlying matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}
