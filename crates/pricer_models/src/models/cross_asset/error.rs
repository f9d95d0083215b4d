//! Error types for the cross-asset model.

use pricer_core::market_data::MarketDataError;
use pricer_core::math::MatrixError;
use thiserror::Error;

/// Correlation matrix validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// Matrix dimensions are invalid.
    #[error("Invalid matrix dimensions: expected {expected} elements, got {got}")]
    InvalidDimensions {
        /// Expected number of elements
        expected: usize,
        /// Provided number of elements
        got: usize,
    },

    /// Diagonal element is not 1.
    #[error("Diagonal element at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Row/column index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// Matrix is not symmetric.
    #[error("Matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row index
        i: usize,
        /// Column index
        j: usize,
    },

    /// Entry outside [-1, 1].
    #[error("Correlation at ({i}, {j}) is {value}, must be in [-1, 1]")]
    OutOfRange {
        /// Row index
        i: usize,
        /// Column index
        j: usize,
        /// Offending value
        value: f64,
    },

    /// Smallest eigenvalue below the negative tolerance.
    #[error("Correlation matrix is not positive semi-definite: min eigenvalue {min_eigenvalue}")]
    NotPositiveSemiDefinite {
        /// Smallest eigenvalue found
        min_eigenvalue: f64,
    },
}

/// Cross-asset model and state process errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Invalid model parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Block counts inconsistent (FX blocks must be IR blocks minus one,
    /// correlation must cover every block).
    #[error("Inconsistent dimensions: {0}")]
    InconsistentDimensions(String),

    /// Correlation validation failed.
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// Curve lookup failed.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    /// Matrix operation failed.
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// State vector size does not match the model dimension.
    #[error("State dimension mismatch: expected {expected}, got {got}")]
    StateDimension {
        /// Model dimension
        expected: usize,
        /// Provided size
        got: usize,
    },

    /// Cached accessor used before `precompute`.
    #[error("State process caches not precomputed")]
    NotPrecomputed,

    /// Step index beyond the precomputed grid.
    #[error("Step {step} out of range for grid with {steps} steps")]
    StepOutOfRange {
        /// Requested step
        step: usize,
        /// Number of steps on the grid
        steps: usize,
    },

    /// Time is not a point of the precomputed grid.
    #[error("Time {time} is not on the precomputed grid")]
    TimeNotOnGrid {
        /// Requested time
        time: f64,
    },

    /// Index of an IR or FX block out of range.
    #[error("Component index {index} out of range for {asset} ({count} components)")]
    ComponentOutOfRange {
        /// Asset class label
        asset: &'static str,
        /// Requested index
        index: usize,
        /// Number of components
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_error_display() {
        let err = CorrelationError::NotSymmetric { i: 0, j: 2 };
        assert_eq!(format!("{}", err), "Matrix is not symmetric at (0, 2)");

        let err = CorrelationError::OutOfRange {
            i: 1,
            j: 2,
            value: 1.5,
        };
        assert_eq!(
            format!("{}", err),
            "Correlation at (1, 2) is 1.5, must be in [-1, 1]"
        );
    }

    #[test]
    fn test_model_error_from_correlation() {
        let err: ModelError = CorrelationError::InvalidDiagonal {
            index: 0,
            value: 0.9,
        }
        .into();
        assert!(matches!(err, ModelError::Correlation(_)));
        assert!(format!("{}", err).contains("Diagonal element at index 0"));
    }

    #[test]
    fn test_step_out_of_range_display() {
        let err = ModelError::StepOutOfRange { step: 5, steps: 3 };
        assert_eq!(format!("{}", err), "Step 5 out of range for grid with 3 steps");
    }
}
