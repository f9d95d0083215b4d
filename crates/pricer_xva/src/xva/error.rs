//! XVA error types.

use pricer_core::market_data::MarketDataError;
use thiserror::Error;

use crate::cube::CubeError;
use crate::portfolio::PortfolioError;

/// Errors raised by exposure aggregation and XVA calculation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XvaError {
    /// Cube construction or access failed.
    #[error(transparent)]
    Cube(#[from] CubeError),

    /// Required market data missing or invalid.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Portfolio inconsistency.
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Cube does not hold one id per portfolio entity.
    #[error("{cube} cube holds {actual} ids, expected {expected}")]
    IdCountMismatch {
        /// Which cube
        cube: &'static str,
        /// Entities in the portfolio
        expected: usize,
        /// Ids in the cube
        actual: usize,
    },

    /// Trade and netting set exposure cubes disagree on their dates.
    #[error("Date grid mismatch: trade cube has {trade} dates, netting set cube has {netting_set}")]
    DateGridMismatch {
        /// Dates in the trade cube
        trade: usize,
        /// Dates in the netting set cube
        netting_set: usize,
    },

    /// Configured depth slot outside the cube.
    #[error("{cube} cube {slot} index {index} must be below cube depth {depth}")]
    DepthOutOfRange {
        /// Which cube
        cube: &'static str,
        /// Slot name
        slot: &'static str,
        /// Configured index
        index: usize,
        /// Cube depth
        depth: usize,
    },

    /// Counterparty referenced by a trade or netting set but not held by
    /// the portfolio.
    #[error("Unknown counterparty: {0}")]
    UnknownCounterparty(String),

    /// FVA curves configured without a base currency for the OIS curve.
    #[error("Base currency required for FVA calculation")]
    MissingBaseCurrency,

    /// MVA requested without a DIM profile for a netting set.
    #[error("Missing DIM profile for netting set {0}")]
    MissingDimProfile(String),

    /// DIM profile length differs from the date grid.
    #[error("DIM profile for netting set {netting_set} has {actual} points, expected {expected}")]
    DimProfileLength {
        /// Netting set identifier
        netting_set: String,
        /// Number of cube dates
        expected: usize,
        /// Number of profile points
        actual: usize,
    },

    /// Configuration value out of range.
    #[error("Invalid XVA configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("Failed to parse XVA configuration: {0}")]
    ConfigParse(String),
}

impl From<toml::de::Error> for XvaError {
    fn from(err: toml::de::Error) -> Self {
        XvaError::ConfigParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_id_count_mismatch() {
        let err = XvaError::IdCountMismatch {
            cube: "trade",
            expected: 3,
            actual: 2,
        };
        assert_eq!(format!("{}", err), "trade cube holds 2 ids, expected 3");
    }

    #[test]
    fn test_error_display_depth_out_of_range() {
        let err = XvaError::DepthOutOfRange {
            cube: "netting set",
            slot: "ENE",
            index: 3,
            depth: 3,
        };
        assert_eq!(
            format!("{}", err),
            "netting set cube ENE index 3 must be below cube depth 3"
        );
    }

    #[test]
    fn test_market_error_is_transparent() {
        let err: XvaError = MarketDataError::MissingDefaultCurve {
            name: "CPTY_A".to_string(),
        }
        .into();
        assert_eq!(format!("{}", err), "Missing default curve for CPTY_A");
    }
}
