//! XVA result structures.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use super::config::AllocationMethod;
use crate::portfolio::{CounterpartyId, NettingSetId, Portfolio, TradeId};

/// Sums below this magnitude are treated as zero when allocating.
const ALLOCATION_CUTOFF: f64 = 1e-12;

/// Valuation adjustments of one trade or netting set.
///
/// All amounts are non-negative for non-negative exposures and spreads;
/// FBA and DVA are benefits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XvaValues {
    /// Credit valuation adjustment.
    pub cva: f64,
    /// Debit valuation adjustment.
    pub dva: f64,
    /// Funding cost adjustment.
    pub fca: f64,
    /// Funding cost adjustment without own survival weighting.
    pub fca_ex_own_sp: f64,
    /// Funding cost adjustment without any survival weighting.
    pub fca_ex_all_sp: f64,
    /// Funding benefit adjustment.
    pub fba: f64,
    /// Funding benefit adjustment without own survival weighting.
    pub fba_ex_own_sp: f64,
    /// Funding benefit adjustment without any survival weighting.
    pub fba_ex_all_sp: f64,
    /// Margin valuation adjustment.
    pub mva: f64,
}

impl XvaValues {
    /// Net funding adjustment, FCA − FBA.
    #[inline]
    pub fn fva(&self) -> f64 {
        self.fca - self.fba
    }

    /// Bilateral credit adjustment, CVA − DVA.
    #[inline]
    pub fn bilateral_cva(&self) -> f64 {
        self.cva - self.dva
    }

    /// CVA − DVA + FVA + MVA.
    #[inline]
    pub fn total(&self) -> f64 {
        self.bilateral_cva() + self.fva() + self.mva
    }
}

impl AddAssign for XvaValues {
    fn add_assign(&mut self, rhs: Self) {
        self.cva += rhs.cva;
        self.dva += rhs.dva;
        self.fca += rhs.fca;
        self.fca_ex_own_sp += rhs.fca_ex_own_sp;
        self.fca_ex_all_sp += rhs.fca_ex_all_sp;
        self.fba += rhs.fba;
        self.fba_ex_own_sp += rhs.fba_ex_own_sp;
        self.fba_ex_all_sp += rhs.fba_ex_all_sp;
        self.mva += rhs.mva;
    }
}

/// Output of [`XvaCalculator::calculate`](super::XvaCalculator::calculate).
///
/// Netting-set values come from netted exposure and in general differ from
/// the sum of the trade values in the set; both are kept. Allocated trade
/// CVA and DVA split the netting-set values back onto the trades.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XvaResult {
    trades: BTreeMap<TradeId, XvaValues>,
    netting_sets: BTreeMap<NettingSetId, XvaValues>,
    netting_set_sum_cva: BTreeMap<NettingSetId, f64>,
    netting_set_sum_dva: BTreeMap<NettingSetId, f64>,
    allocated_cva: BTreeMap<TradeId, f64>,
    allocated_dva: BTreeMap<TradeId, f64>,
}

impl XvaResult {
    pub(crate) fn new(
        trades: BTreeMap<TradeId, XvaValues>,
        netting_sets: BTreeMap<NettingSetId, XvaValues>,
        portfolio: &Portfolio,
        allocation: AllocationMethod,
    ) -> Self {
        let mut netting_set_sum_cva = BTreeMap::new();
        let mut netting_set_sum_dva = BTreeMap::new();
        for trade in portfolio.trades() {
            let values = trades.get(trade.id()).copied().unwrap_or_default();
            *netting_set_sum_cva
                .entry(trade.netting_set_id().clone())
                .or_insert(0.0) += values.cva;
            *netting_set_sum_dva
                .entry(trade.netting_set_id().clone())
                .or_insert(0.0) += values.dva;
        }

        let mut set_sizes: BTreeMap<&NettingSetId, usize> = BTreeMap::new();
        for trade in portfolio.trades() {
            *set_sizes.entry(trade.netting_set_id()).or_insert(0) += 1;
        }
        let mut allocated_cva = BTreeMap::new();
        let mut allocated_dva = BTreeMap::new();
        for trade in portfolio.trades() {
            let ns = trade.netting_set_id();
            let own = trades.get(trade.id()).copied().unwrap_or_default();
            let set = netting_sets.get(ns).copied().unwrap_or_default();
            let size = set_sizes.get(ns).copied().unwrap_or(1);
            let (cva, dva) = match allocation {
                AllocationMethod::None => (0.0, 0.0),
                AllocationMethod::RelativeXva => {
                    let sum_cva = netting_set_sum_cva.get(ns).copied().unwrap_or(0.0);
                    let sum_dva = netting_set_sum_dva.get(ns).copied().unwrap_or(0.0);
                    (
                        allocate(set.cva, own.cva, sum_cva, size),
                        allocate(set.dva, own.dva, sum_dva, size),
                    )
                }
            };
            allocated_cva.insert(trade.id().clone(), cva);
            allocated_dva.insert(trade.id().clone(), dva);
        }

        Self {
            trades,
            netting_sets,
            netting_set_sum_cva,
            netting_set_sum_dva,
            allocated_cva,
            allocated_dva,
        }
    }

    /// Values of one trade.
    pub fn trade(&self, id: &TradeId) -> Option<&XvaValues> {
        self.trades.get(id)
    }

    /// Values of one netting set.
    pub fn netting_set(&self, id: &NettingSetId) -> Option<&XvaValues> {
        self.netting_sets.get(id)
    }

    /// All trade values, ordered by id.
    pub fn trades(&self) -> &BTreeMap<TradeId, XvaValues> {
        &self.trades
    }

    /// All netting set values, ordered by id.
    pub fn netting_sets(&self) -> &BTreeMap<NettingSetId, XvaValues> {
        &self.netting_sets
    }

    /// Sum of the trade CVAs of a netting set.
    pub fn netting_set_sum_cva(&self, id: &NettingSetId) -> Option<f64> {
        self.netting_set_sum_cva.get(id).copied()
    }

    /// Sum of the trade DVAs of a netting set.
    pub fn netting_set_sum_dva(&self, id: &NettingSetId) -> Option<f64> {
        self.netting_set_sum_dva.get(id).copied()
    }

    /// Netting-set CVA allocated to one trade.
    pub fn allocated_trade_cva(&self, id: &TradeId) -> Option<f64> {
        self.allocated_cva.get(id).copied()
    }

    /// Netting-set DVA allocated to one trade.
    pub fn allocated_trade_dva(&self, id: &TradeId) -> Option<f64> {
        self.allocated_dva.get(id).copied()
    }

    /// Netting set values summed per counterparty.
    pub fn by_counterparty(&self, portfolio: &Portfolio) -> BTreeMap<CounterpartyId, XvaValues> {
        let mut out: BTreeMap<CounterpartyId, XvaValues> = BTreeMap::new();
        for ns in portfolio.netting_sets() {
            if let Some(values) = self.netting_sets.get(ns.id()) {
                *out.entry(ns.counterparty_id().clone()).or_default() += *values;
            }
        }
        out
    }

    /// Portfolio total over netting sets.
    pub fn total(&self) -> XvaValues {
        let mut total = XvaValues::default();
        for values in self.netting_sets.values() {
            total += *values;
        }
        total
    }
}

/// Share of `set_value` for a trade with stand-alone `trade_value` out of
/// `sum`, or an equal share of `size` trades when `sum` vanishes.
fn allocate(set_value: f64, trade_value: f64, sum: f64, size: usize) -> f64 {
    if sum.abs() > ALLOCATION_CUTOFF {
        set_value * trade_value / sum
    } else {
        set_value / size.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{Counterparty, NettingSet, PortfolioBuilder, TradeInfo};
    use approx::assert_relative_eq;
    use pricer_core::types::Currency;

    fn portfolio() -> Portfolio {
        let trade = |id: &str, ns: &str| {
            TradeInfo::new(
                TradeId::new(id),
                NettingSetId::new(ns),
                CounterpartyId::new("CP"),
                Currency::EUR,
            )
        };
        PortfolioBuilder::new()
            .add_counterparty(Counterparty::new(CounterpartyId::new("CP"), "CP"))
            .add_netting_set(NettingSet::new(NettingSetId::new("NS1"), CounterpartyId::new("CP")))
            .add_netting_set(NettingSet::new(NettingSetId::new("NS2"), CounterpartyId::new("CP")))
            .add_trades(vec![trade("T1", "NS1"), trade("T2", "NS1"), trade("T3", "NS2")])
            .build()
            .unwrap()
    }

    fn values(cva: f64, dva: f64) -> XvaValues {
        XvaValues {
            cva,
            dva,
            ..Default::default()
        }
    }

    fn result(allocation: AllocationMethod) -> XvaResult {
        let trades = BTreeMap::from([
            (TradeId::new("T1"), values(6.0, 0.0)),
            (TradeId::new("T2"), values(2.0, 0.0)),
            (TradeId::new("T3"), values(1.0, 0.5)),
        ]);
        let netting_sets = BTreeMap::from([
            (NettingSetId::new("NS1"), values(5.0, 1.0)),
            (NettingSetId::new("NS2"), values(1.0, 0.5)),
        ]);
        XvaResult::new(trades, netting_sets, &portfolio(), allocation)
    }

    // ========================================
    // Allocation
    // ========================================

    #[test]
    fn test_relative_xva_allocation_adds_up() {
        let r = result(AllocationMethod::RelativeXva);
        let t1 = r.allocated_trade_cva(&TradeId::new("T1")).unwrap();
        let t2 = r.allocated_trade_cva(&TradeId::new("T2")).unwrap();

        assert_relative_eq!(t1, 5.0 * 6.0 / 8.0, max_relative = 1e-15);
        assert_relative_eq!(t1 + t2, 5.0, max_relative = 1e-15);
        assert_relative_eq!(r.allocated_trade_cva(&TradeId::new("T3")).unwrap(), 1.0);
        assert_eq!(r.netting_set_sum_cva(&NettingSetId::new("NS1")), Some(8.0));
    }

    #[test]
    fn test_zero_stand_alone_sum_splits_equally() {
        let r = result(AllocationMethod::RelativeXva);
        // NS1 has DVA 1.0 but neither trade has stand-alone DVA
        assert_eq!(r.allocated_trade_dva(&TradeId::new("T1")), Some(0.5));
        assert_eq!(r.allocated_trade_dva(&TradeId::new("T2")), Some(0.5));
    }

    #[test]
    fn test_no_allocation() {
        let r = result(AllocationMethod::None);
        assert_eq!(r.allocated_trade_cva(&TradeId::new("T1")), Some(0.0));
        assert_eq!(r.allocated_trade_dva(&TradeId::new("T3")), Some(0.0));
        assert_eq!(r.allocated_trade_cva(&TradeId::new("T9")), None);
    }

    #[test]
    fn test_derived_measures() {
        let v = XvaValues {
            cva: 10.0,
            dva: 3.0,
            fca: 4.0,
            fba: 1.5,
            mva: 0.5,
            ..Default::default()
        };
        assert_eq!(v.bilateral_cva(), 7.0);
        assert_eq!(v.fva(), 2.5);
        assert_eq!(v.total(), 10.0);
    }

    #[test]
    fn test_add_assign_is_fieldwise() {
        let mut a = XvaValues {
            cva: 1.0,
            fca_ex_all_sp: 2.0,
            ..Default::default()
        };
        a += XvaValues {
            cva: 0.5,
            fba_ex_own_sp: 3.0,
            ..Default::default()
        };
        assert_eq!(a.cva, 1.5);
        assert_eq!(a.fca_ex_all_sp, 2.0);
        assert_eq!(a.fba_ex_own_sp, 3.0);
    }
}
