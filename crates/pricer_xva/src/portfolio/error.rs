//! Portfolio error types.

use thiserror::Error;

/// Errors raised while assembling a portfolio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    /// Duplicate trade ID encountered.
    #[error("Duplicate trade ID: {0}")]
    DuplicateTrade(String),

    /// Duplicate counterparty ID encountered.
    #[error("Duplicate counterparty ID: {0}")]
    DuplicateCounterparty(String),

    /// Duplicate netting set ID encountered.
    #[error("Duplicate netting set ID: {0}")]
    DuplicateNettingSet(String),

    /// Trade references an unknown netting set.
    #[error("Trade references unknown netting set: trade={0}, netting_set={1}")]
    UnknownNettingSetReference(String, String),

    /// Netting set references an unknown counterparty.
    #[error("Netting set references unknown counterparty: netting_set={0}, counterparty={1}")]
    NettingSetUnknownCounterparty(String, String),

    /// Trade counterparty differs from the counterparty of its netting set.
    #[error(
        "Trade {trade} names counterparty {trade_counterparty} but netting set {netting_set} \
         belongs to {netting_set_counterparty}"
    )]
    CounterpartyMismatch {
        /// Trade identifier
        trade: String,
        /// Counterparty named on the trade
        trade_counterparty: String,
        /// Netting set identifier
        netting_set: String,
        /// Counterparty of the netting set
        netting_set_counterparty: String,
    },

    /// Counterparty without a default curve name.
    #[error("Counterparty {0} has an empty default curve name")]
    EmptyDefaultCurve(String),
}
