//! Par sensitivity error types.

use pricer_core::market_data::MarketDataError;
use thiserror::Error;

use crate::scenarios::{KeyType, ScenarioError};

/// Errors raised by par instruments, the par sensitivity analysis and the
/// par converter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParSensitivityError {
    /// Market data required by a par instrument is missing.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Simulation market failure.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Par instrument cannot calibrate the given key type.
    #[error("{instrument} cannot calibrate {key_type} keys")]
    UnsupportedKeyType {
        /// Instrument kind
        instrument: &'static str,
        /// Requested key type
        key_type: KeyType,
    },

    /// Instrument parameter out of range.
    #[error("Invalid par instrument {key}: {reason}")]
    InvalidInstrument {
        /// Par key
        key: String,
        /// What is wrong
        reason: String,
    },

    /// Two instruments calibrate the same key.
    #[error("Duplicate par instrument for {0}")]
    DuplicateInstrument(String),

    /// No shift configured for a key type being processed.
    #[error("No shift data configured for {0}")]
    MissingShiftData(KeyType),

    /// Shift sizes missing for a key at conversion time.
    #[error("No shift sizes recorded for {0}")]
    MissingShiftSize(String),

    /// Par and zero key sets differ.
    #[error("Par and zero key sets differ: {par_only} par-only, {zero_only} zero-only keys")]
    KeyMismatch {
        /// Keys with sensitivities only on the par side
        par_only: usize,
        /// Keys with sensitivities only on the zero side
        zero_only: usize,
    },

    /// Nothing to convert.
    #[error("No par sensitivities to convert")]
    Empty,

    /// Jacobian cannot be inverted.
    #[error("Singular par Jacobian: {zero_rows} zero rows, {zero_cols} zero columns")]
    SingularJacobian {
        /// Rows without any non-zero entry
        zero_rows: usize,
        /// Columns without any non-zero entry
        zero_cols: usize,
    },

    /// Input vector does not match the converter's key set.
    #[error("Expected {expected} zero sensitivities, got {actual}")]
    DimensionMismatch {
        /// Number of keys
        expected: usize,
        /// Input length
        actual: usize,
    },

    /// Configuration value out of range.
    #[error("Invalid par sensitivity configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("Failed to parse par sensitivity configuration: {0}")]
    ConfigParse(String),
}

impl From<toml::de::Error> for ParSensitivityError {
    fn from(err: toml::de::Error) -> Self {
        ParSensitivityError::ConfigParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParSensitivityError::UnsupportedKeyType {
            instrument: "ParCds",
            key_type: KeyType::DiscountCurve,
        };
        assert_eq!(format!("{}", err), "ParCds cannot calibrate DiscountCurve keys");

        let err = ParSensitivityError::KeyMismatch {
            par_only: 1,
            zero_only: 2,
        };
        assert_eq!(
            format!("{}", err),
            "Par and zero key sets differ: 1 par-only, 2 zero-only keys"
        );
    }

    #[test]
    fn test_scenario_error_is_transparent() {
        let err: ParSensitivityError = ScenarioError::UnknownKey("FxSpot/USDEUR/0".into()).into();
        assert_eq!(format!("{}", err), "Unknown risk factor: FxSpot/USDEUR/0");
    }
}
