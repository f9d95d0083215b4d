//! Error types for currency handling.

use thiserror::Error;

/// Currency parsing and registry errors.
///
/// # Examples
///
/// ```
/// use pricer_core::types::CurrencyError;
///
/// let err = CurrencyError::UnknownCurrency("XYZ".to_string());
/// assert_eq!(format!("{}", err), "Unknown currency code: XYZ");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Code or alias not present in the registry.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency pair string is not two concatenated three-letter codes.
    #[error("Invalid currency pair: {0}")]
    InvalidPair(String),

    /// Alias registered twice with different targets.
    #[error("Alias {alias} already maps to {existing}")]
    ConflictingAlias {
        /// The alias being registered
        alias: String,
        /// The currency the alias already maps to
        existing: String,
    },
}
