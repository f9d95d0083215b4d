//! Trade metadata needed for exposure aggregation.
//!
//! Trade economics live with the pricer that fills the NPV cube; the XVA
//! layer only needs to know where each trade sits.

use pricer_core::types::Currency;

use super::ids::{CounterpartyId, NettingSetId, TradeId};

/// Trade identity, netting set and counterparty.
///
/// # Examples
///
/// ```
/// use pricer_core::types::Currency;
/// use pricer_xva::portfolio::{CounterpartyId, NettingSetId, TradeId, TradeInfo};
///
/// let trade = TradeInfo::new(
///     TradeId::new("SWAP_001"),
///     NettingSetId::new("CPTY_A_CSA"),
///     CounterpartyId::new("CPTY_A"),
///     Currency::EUR,
/// );
/// assert_eq!(trade.netting_set_id().as_str(), "CPTY_A_CSA");
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeInfo {
    id: TradeId,
    netting_set_id: NettingSetId,
    counterparty_id: CounterpartyId,
    currency: Currency,
}

impl TradeInfo {
    /// Creates trade metadata.
    pub fn new(
        id: TradeId,
        netting_set_id: NettingSetId,
        counterparty_id: CounterpartyId,
        currency: Currency,
    ) -> Self {
        Self {
            id,
            netting_set_id,
            counterparty_id,
            currency,
        }
    }

    /// Trade identifier.
    #[inline]
    pub fn id(&self) -> &TradeId {
        &self.id
    }

    /// Netting set the trade belongs to.
    #[inline]
    pub fn netting_set_id(&self) -> &NettingSetId {
        &self.netting_set_id
    }

    /// Counterparty identifier.
    #[inline]
    pub fn counterparty_id(&self) -> &CounterpartyId {
        &self.counterparty_id
    }

    /// NPV currency.
    #[inline]
    pub fn currency(&self) -> Currency {
        self.currency
    }
}
