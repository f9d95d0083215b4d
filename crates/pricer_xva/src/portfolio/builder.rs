//! Portfolio builder with reference validation.

use std::collections::HashMap;

use super::counterparty::Counterparty;
use super::error::PortfolioError;
use super::netting_set::NettingSet;
use super::trade::TradeInfo;
use super::Portfolio;

/// Builder for a validated [`Portfolio`].
///
/// Insertion order is kept: it is the order in which trades and netting
/// sets are reported and, by convention, their index in freshly allocated
/// NPV cubes.
///
/// # Examples
///
/// ```
/// use pricer_core::types::Currency;
/// use pricer_xva::portfolio::{
///     Counterparty, CounterpartyId, NettingSet, NettingSetId, PortfolioBuilder, TradeId,
///     TradeInfo,
/// };
///
/// let portfolio = PortfolioBuilder::new()
///     .add_counterparty(Counterparty::new(CounterpartyId::new("CP"), "CP_CURVE"))
///     .add_netting_set(NettingSet::new(NettingSetId::new("NS"), CounterpartyId::new("CP")))
///     .add_trade(TradeInfo::new(
///         TradeId::new("T1"),
///         NettingSetId::new("NS"),
///         CounterpartyId::new("CP"),
///         Currency::EUR,
///     ))
///     .build()
///     .unwrap();
///
/// assert_eq!(portfolio.trade_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PortfolioBuilder {
    trades: Vec<TradeInfo>,
    counterparties: Vec<Counterparty>,
    netting_sets: Vec<NettingSet>,
}

impl PortfolioBuilder {
    /// Creates an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trade.
    pub fn add_trade(mut self, trade: TradeInfo) -> Self {
        self.trades.push(trade);
        self
    }

    /// Adds several trades.
    pub fn add_trades(mut self, trades: impl IntoIterator<Item = TradeInfo>) -> Self {
        self.trades.extend(trades);
        self
    }

    /// Adds a counterparty.
    pub fn add_counterparty(mut self, counterparty: Counterparty) -> Self {
        self.counterparties.push(counterparty);
        self
    }

    /// Adds a netting set.
    pub fn add_netting_set(mut self, netting_set: NettingSet) -> Self {
        self.netting_sets.push(netting_set);
        self
    }

    /// Validates references and builds the portfolio.
    ///
    /// # Errors
    ///
    /// - Duplicate trade, counterparty or netting set ids
    /// - A counterparty with an empty default curve name
    /// - A netting set naming an unknown counterparty
    /// - A trade naming an unknown netting set, or a counterparty other
    ///   than its netting set's
    pub fn build(self) -> Result<Portfolio, PortfolioError> {
        let mut counterparty_index = HashMap::with_capacity(self.counterparties.len());
        for (i, cp) in self.counterparties.iter().enumerate() {
            if cp.default_curve().is_empty() {
                return Err(PortfolioError::EmptyDefaultCurve(cp.id().to_string()));
            }
            if counterparty_index.insert(cp.id().clone(), i).is_some() {
                return Err(PortfolioError::DuplicateCounterparty(cp.id().to_string()));
            }
        }

        let mut netting_set_index = HashMap::with_capacity(self.netting_sets.len());
        for (i, ns) in self.netting_sets.iter().enumerate() {
            if !counterparty_index.contains_key(ns.counterparty_id()) {
                return Err(PortfolioError::NettingSetUnknownCounterparty(
                    ns.id().to_string(),
                    ns.counterparty_id().to_string(),
                ));
            }
            if netting_set_index.insert(ns.id().clone(), i).is_some() {
                return Err(PortfolioError::DuplicateNettingSet(ns.id().to_string()));
            }
        }

        let mut trade_index = HashMap::with_capacity(self.trades.len());
        for (i, trade) in self.trades.iter().enumerate() {
            let Some(&ns) = netting_set_index.get(trade.netting_set_id()) else {
                return Err(PortfolioError::UnknownNettingSetReference(
                    trade.id().to_string(),
                    trade.netting_set_id().to_string(),
                ));
            };
            let netting_set = &self.netting_sets[ns];
            if netting_set.counterparty_id() != trade.counterparty_id() {
                return Err(PortfolioError::CounterpartyMismatch {
                    trade: trade.id().to_string(),
                    trade_counterparty: trade.counterparty_id().to_string(),
                    netting_set: netting_set.id().to_string(),
                    netting_set_counterparty: netting_set.counterparty_id().to_string(),
                });
            }
            if trade_index.insert(trade.id().clone(), i).is_some() {
                return Err(PortfolioError::DuplicateTrade(trade.id().to_string()));
            }
        }

        Ok(Portfolio {
            trades: self.trades,
            counterparties: self.counterparties,
            netting_sets: self.netting_sets,
            trade_index,
            counterparty_index,
            netting_set_index,
        })
    }
}
