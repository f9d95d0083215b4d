//! SIMM error types.

use pricer_core::types::CurrencyError;
use pricer_xva::cube::CubeError;
use thiserror::Error;

/// Errors raised by SIMM storage, aggregation and the margin helper.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimmError {
    /// Exactly one of the date and sample indices was given.
    #[error(
        "Date and sample index must be both set or both absent (date {date:?}, sample {sample:?})"
    )]
    MixedSlot {
        /// Date index
        date: Option<usize>,
        /// Sample index
        sample: Option<usize>,
    },

    /// Storage configured without currencies.
    #[error("SIMM sensitivity storage needs at least one currency")]
    NoCurrencies,

    /// Currency code not in the registry.
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// Cube access failed.
    #[error(transparent)]
    Cube(#[from] CubeError),

    /// Sensitivity or matrix of the wrong size.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Offending quantity
        what: String,
        /// Configured size
        expected: usize,
        /// Supplied size
        actual: usize,
    },

    /// Non-finite sensitivity.
    #[error("Non-finite {what}: {value}")]
    NonFinite {
        /// Offending quantity
        what: String,
        /// Value
        value: f64,
    },

    /// No par conversion matrix for a currency.
    #[error("No par conversion for currency {0}")]
    MissingConversion(String),

    /// Helper and storage disagree on the currency list.
    #[error("Currency mismatch: helper has {helper}, storage has {storage}")]
    CurrencyMismatch {
        /// Helper currencies
        helper: String,
        /// Storage currencies
        storage: String,
    },

    /// Invalid aggregator configuration.
    #[error("Invalid SIMM configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or parsed.
    #[error("Failed to parse SIMM configuration: {0}")]
    ConfigParse(String),
}

impl From<toml::de::Error> for SimmError {
    fn from(err: toml::de::Error) -> Self {
        SimmError::ConfigParse(err.to_string())
    }
}
