//! Scenario and simulation market error types.

use pricer_core::market_data::MarketDataError;
use thiserror::Error;

use super::risk_factor::KeyType;

/// Errors raised while building or applying scenarios.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    /// Base market lookup or curve construction failed.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Key not configured in the simulation market.
    #[error("Unknown risk factor: {0}")]
    UnknownKey(String),

    /// Curve configured without pillars.
    #[error("No tenors configured for {key_type} {name}")]
    EmptyTenors {
        /// Curve category
        key_type: KeyType,
        /// Curve name
        name: String,
    },

    /// Pillar value that cannot be converted to a rate.
    #[error("Non-positive value {value} for {key}")]
    NonPositiveValue {
        /// Offending key
        key: String,
        /// Stored discount factor, survival probability or spot
        value: f64,
    },
}
