//! Market data error types.
//!
//! This module provides structured error handling for curve construction,
//! curve queries and market lookups.

use thiserror::Error;

/// Market data operation errors.
///
/// # Variants
///
/// - `InvalidMaturity`: Negative or otherwise unusable time
/// - `OutOfBounds`: Query outside valid domain
/// - `InsufficientData`: Not enough pillars for construction
/// - `UnsortedPillars`: Pillar times not strictly increasing
/// - `MissingDiscountCurve` / `MissingYieldCurve` / `MissingDefaultCurve`:
///   required curve absent from the market
/// - `MissingRecoveryRate`: every recovery candidate failed
/// - `MissingFxSpot`: FX spot for a pair absent from the market
/// - `InvalidRecoveryRate`: recovery outside [0, 1]
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative time).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },

    /// Query point outside valid domain.
    #[error("Out of bounds: {x} not in [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data for construction.
    #[error("Insufficient data: got {got}, need {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Pillar times are not strictly increasing.
    #[error("Pillar times not strictly increasing at index {index}")]
    UnsortedPillars {
        /// First offending index
        index: usize,
    },

    /// Discount curve missing for a currency.
    #[error("Missing discount curve for currency {currency}")]
    MissingDiscountCurve {
        /// Currency code
        currency: String,
    },

    /// Named yield (index/forwarding) curve missing.
    #[error("Missing yield curve {name}")]
    MissingYieldCurve {
        /// Curve name
        name: String,
    },

    /// Default curve missing for a credit name.
    #[error("Missing default curve for {name}")]
    MissingDefaultCurve {
        /// Credit name
        name: String,
    },

    /// No recovery rate found along the whole fallback chain.
    #[error("No recovery rate found for {name}")]
    MissingRecoveryRate {
        /// Last candidate tried
        name: String,
    },

    /// FX spot missing for a currency pair.
    #[error("Missing FX spot for {pair}")]
    MissingFxSpot {
        /// Currency pair, e.g. `USDEUR`
        pair: String,
    },

    /// Recovery rate outside [0, 1].
    #[error("Invalid recovery rate {value} for {name}")]
    InvalidRecoveryRate {
        /// Credit name
        name: String,
        /// The offending value
        value: f64,
    },
}
