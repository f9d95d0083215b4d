//! Portfolio structure for exposure and XVA aggregation.
//!
//! Three entities are tracked:
//!
//! - **TradeInfo**: trade id, netting set and counterparty
//! - **NettingSet**: a netting agreement with exactly one counterparty
//! - **Counterparty**: default curve and recovery references in the market
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::Currency;
//! use pricer_xva::portfolio::{
//!     Counterparty, CounterpartyId, NettingSet, NettingSetId, PortfolioBuilder, TradeId,
//!     TradeInfo,
//! };
//!
//! let portfolio = PortfolioBuilder::new()
//!     .add_counterparty(Counterparty::new(CounterpartyId::new("CPTY_A"), "CPTY_A"))
//!     .add_netting_set(NettingSet::new(
//!         NettingSetId::new("CPTY_A_CSA"),
//!         CounterpartyId::new("CPTY_A"),
//!     ))
//!     .add_trades((1..=3).map(|i| {
//!         TradeInfo::new(
//!             TradeId::new(format!("SWAP_{i}")),
//!             NettingSetId::new("CPTY_A_CSA"),
//!             CounterpartyId::new("CPTY_A"),
//!             Currency::EUR,
//!         )
//!     }))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(portfolio.trades_in_netting_set(&NettingSetId::new("CPTY_A_CSA")).len(), 3);
//! ```

mod builder;
mod counterparty;
mod error;
mod ids;
mod netting_set;
mod trade;

pub use builder::PortfolioBuilder;
pub use counterparty::Counterparty;
pub use error::PortfolioError;
pub use ids::{CounterpartyId, NettingSetId, TradeId};
pub use netting_set::NettingSet;
pub use trade::TradeInfo;

use std::collections::HashMap;

/// Validated container of trades, netting sets and counterparties.
///
/// Iteration follows insertion order; lookups by id are O(1).
#[derive(Debug, Clone)]
pub struct Portfolio {
    trades: Vec<TradeInfo>,
    counterparties: Vec<Counterparty>,
    netting_sets: Vec<NettingSet>,
    trade_index: HashMap<TradeId, usize>,
    counterparty_index: HashMap<CounterpartyId, usize>,
    netting_set_index: HashMap<NettingSetId, usize>,
}

impl Portfolio {
    /// Number of trades.
    #[inline]
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Number of netting sets.
    #[inline]
    pub fn netting_set_count(&self) -> usize {
        self.netting_sets.len()
    }

    /// Number of counterparties.
    #[inline]
    pub fn counterparty_count(&self) -> usize {
        self.counterparties.len()
    }

    /// Whether the portfolio holds no trade.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Trades in insertion order.
    #[inline]
    pub fn trades(&self) -> &[TradeInfo] {
        &self.trades
    }

    /// Netting sets in insertion order.
    #[inline]
    pub fn netting_sets(&self) -> &[NettingSet] {
        &self.netting_sets
    }

    /// Counterparties in insertion order.
    #[inline]
    pub fn counterparties(&self) -> &[Counterparty] {
        &self.counterparties
    }

    /// Trade by id.
    pub fn trade(&self, id: &TradeId) -> Option<&TradeInfo> {
        self.trade_index.get(id).map(|&i| &self.trades[i])
    }

    /// Netting set by id.
    pub fn netting_set(&self, id: &NettingSetId) -> Option<&NettingSet> {
        self.netting_set_index.get(id).map(|&i| &self.netting_sets[i])
    }

    /// Counterparty by id.
    pub fn counterparty(&self, id: &CounterpartyId) -> Option<&Counterparty> {
        self.counterparty_index.get(id).map(|&i| &self.counterparties[i])
    }

    /// Position of a netting set in insertion order.
    pub fn netting_set_position(&self, id: &NettingSetId) -> Option<usize> {
        self.netting_set_index.get(id).copied()
    }

    /// Counterparty of a netting set.
    ///
    /// Always present for netting sets of this portfolio, since the
    /// builder validates the reference.
    pub fn netting_set_counterparty(&self, id: &NettingSetId) -> Option<&Counterparty> {
        self.netting_set(id)
            .and_then(|ns| self.counterparty(ns.counterparty_id()))
    }

    /// Trades of a netting set in insertion order.
    pub fn trades_in_netting_set(&self, id: &NettingSetId) -> Vec<&TradeInfo> {
        self.trades
            .iter()
            .filter(|t| t.netting_set_id() == id)
            .collect()
    }
}
