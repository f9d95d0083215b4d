//! Netting sets.

use super::ids::{CounterpartyId, NettingSetId};

/// A netting agreement with one counterparty.
///
/// Trades in the same netting set are netted before exposure is floored,
/// which is why netting-set XVA differs from the sum of trade XVAs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NettingSet {
    id: NettingSetId,
    counterparty_id: CounterpartyId,
}

impl NettingSet {
    /// Creates a netting set with a counterparty.
    pub fn new(id: NettingSetId, counterparty_id: CounterpartyId) -> Self {
        Self {
            id,
            counterparty_id,
        }
    }

    /// Netting set identifier.
    #[inline]
    pub fn id(&self) -> &NettingSetId {
        &self.id
    }

    /// Counterparty identifier.
    #[inline]
    pub fn counterparty_id(&self) -> &CounterpartyId {
        &self.counterparty_id
    }
}
