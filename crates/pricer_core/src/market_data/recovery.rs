//! Recovery rate fallback chain.
//!
//! A recovery rate is resolved from an ordered list of candidate sources.
//! The first candidate present in the market wins; reaching any candidate
//! after the first logs a warning, and running out of candidates is an error.
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::{resolve_recovery_rate, RecoverySource, SimpleMarket};
//!
//! let market = SimpleMarket::new().with_recovery_rate("CPTY_A", 0.4);
//! let chain = [
//!     RecoverySource::Security("CPTY_A_SNR_BOND".to_string()),
//!     RecoverySource::CreditCurve("CPTY_A".to_string()),
//! ];
//! assert_eq!(resolve_recovery_rate(&market, &chain).unwrap(), 0.4);
//! ```

use std::fmt;

use tracing::warn;

use super::error::MarketDataError;
use super::market::Market;

/// A single candidate in a recovery rate fallback chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecoverySource {
    /// Security-specific recovery quote.
    Security(String),
    /// Curve-level recovery for a credit name.
    CreditCurve(String),
    /// Fixed override.
    Fixed(f64),
}

impl RecoverySource {
    fn lookup<M: Market + ?Sized>(&self, market: &M) -> Option<f64> {
        match self {
            RecoverySource::Security(id) => market.security_recovery_rate(id),
            RecoverySource::CreditCurve(name) => market.recovery_rate(name),
            RecoverySource::Fixed(value) => Some(*value),
        }
    }

    fn name(&self) -> String {
        match self {
            RecoverySource::Security(id) | RecoverySource::CreditCurve(id) => id.clone(),
            RecoverySource::Fixed(value) => value.to_string(),
        }
    }
}

impl fmt::Display for RecoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverySource::Security(id) => write!(f, "security {}", id),
            RecoverySource::CreditCurve(name) => write!(f, "credit curve {}", name),
            RecoverySource::Fixed(value) => write!(f, "fixed {}", value),
        }
    }
}

/// Resolve a recovery rate by trying each candidate in order.
///
/// # Errors
///
/// * [`MarketDataError::MissingRecoveryRate`] - No candidate present
/// * [`MarketDataError::InvalidRecoveryRate`] - The resolved value is outside [0, 1]
pub fn resolve_recovery_rate<M: Market + ?Sized>(
    market: &M,
    chain: &[RecoverySource],
) -> Result<f64, MarketDataError> {
    for (i, source) in chain.iter().enumerate() {
        let Some(value) = source.lookup(market) else {
            continue;
        };
        if i > 0 {
            warn!(
                requested = %chain[0],
                resolved = %source,
                recovery = value,
                "recovery rate not found, using fallback"
            );
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(MarketDataError::InvalidRecoveryRate {
                name: source.name(),
                value,
            });
        }
        return Ok(value);
    }
    Err(MarketDataError::MissingRecoveryRate {
        name: chain
            .last()
            .map(RecoverySource::name)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::market::SimpleMarket;

    fn market() -> SimpleMarket {
        SimpleMarket::new()
            .with_recovery_rate("CPTY_A", 0.4)
            .with_security_recovery_rate("CPTY_A_SUB", 0.2)
            .with_recovery_rate("BAD", 1.5)
    }

    #[test]
    fn test_first_candidate_wins() {
        let chain = [
            RecoverySource::Security("CPTY_A_SUB".to_string()),
            RecoverySource::CreditCurve("CPTY_A".to_string()),
        ];
        assert_eq!(resolve_recovery_rate(&market(), &chain).unwrap(), 0.2);
    }

    #[test]
    fn test_falls_back_to_credit_curve() {
        let chain = [
            RecoverySource::Security("CPTY_A_SNR".to_string()),
            RecoverySource::CreditCurve("CPTY_A".to_string()),
        ];
        assert_eq!(resolve_recovery_rate(&market(), &chain).unwrap(), 0.4);
    }

    #[test]
    fn test_fixed_terminates_chain() {
        let chain = [
            RecoverySource::CreditCurve("UNKNOWN".to_string()),
            RecoverySource::Fixed(0.25),
        ];
        assert_eq!(resolve_recovery_rate(&market(), &chain).unwrap(), 0.25);
    }

    #[test]
    fn test_exhausted_chain_is_error() {
        let chain = [
            RecoverySource::Security("X".to_string()),
            RecoverySource::CreditCurve("Y".to_string()),
        ];
        assert_eq!(
            resolve_recovery_rate(&market(), &chain),
            Err(MarketDataError::MissingRecoveryRate {
                name: "Y".to_string()
            })
        );
        assert!(resolve_recovery_rate(&market(), &[]).is_err());
    }

    #[test]
    fn test_out_of_range_recovery_rejected() {
        let chain = [RecoverySource::CreditCurve("BAD".to_string())];
        assert!(matches!(
            resolve_recovery_rate(&market(), &chain),
            Err(MarketDataError::InvalidRecoveryRate { .. })
        ));
    }
}
