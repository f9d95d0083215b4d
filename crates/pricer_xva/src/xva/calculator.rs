//! XVA aggregation over exposure cubes.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use pricer_core::market_data::{resolve_recovery_rate, Market, RecoverySource};
use rayon::prelude::*;
use tracing::{debug, info};

use super::config::XvaConfig;
use super::error::XvaError;
use super::result::{XvaResult, XvaValues};
use super::strategy::{ExposureProfile, IncrementPeriod, XvaIncrementStrategy};
use crate::cube::NpvCube;
use crate::portfolio::{Counterparty, CounterpartyId, NettingSetId, Portfolio};

/// Expected initial margin per netting set, one value per cube date.
pub type DimProfile = HashMap<NettingSetId, Vec<f64>>;

/// Computes trade and netting-set XVA by summing strategy increments over
/// the cube date grid.
///
/// ```text
///   as_of      d[0]       d[1]            d[n-1]
///     |---------|----------|-----  ...  -----|
///       period 0  period 1                period n-1
///     XVA = Σ strategy.increment(period)
/// ```
///
/// Everything that can be checked without touching the market is checked
/// at construction: id counts, id presence, identical date grids and
/// depth slots inside the cubes. Slot semantics themselves cannot be
/// verified; the cubes must have been filled with the layout the
/// configuration names.
///
/// With [`XvaConfig::flip_view`] the run takes the counterparty's side:
///
/// | role            | regular view            | flip view                     |
/// |-----------------|-------------------------|-------------------------------|
/// | CVA name        | counterparty curve      | `dva_name`                    |
/// | DVA name        | `dva_name`              | counterparty curve            |
/// | exposure        | EPE for CVA, ENE for DVA| ENE for CVA, EPE for DVA      |
/// | funding curves  | `fva_*_curve`           | counterparty curve + postfix  |
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use pricer_core::market_data::{FlatHazardRateCurve, SimpleMarket};
/// use pricer_core::types::Currency;
/// use pricer_xva::cube::{InMemoryCube, NpvCube};
/// use pricer_xva::portfolio::*;
/// use pricer_xva::xva::{StaticCreditXvaStrategy, XvaCalculator, XvaConfig};
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = vec![NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()];
/// let portfolio = PortfolioBuilder::new()
///     .add_counterparty(Counterparty::new(CounterpartyId::new("CP"), "CP"))
///     .add_netting_set(NettingSet::new(NettingSetId::new("NS"), CounterpartyId::new("CP")))
///     .add_trade(TradeInfo::new(
///         TradeId::new("T"),
///         NettingSetId::new("NS"),
///         CounterpartyId::new("CP"),
///         Currency::EUR,
///     ))
///     .build()
///     .unwrap();
///
/// let mut trades = InMemoryCube::new(as_of, ["T"], dates.clone(), 1, 2).unwrap();
/// let mut sets = InMemoryCube::new(as_of, ["NS"], dates, 1, 3).unwrap();
/// trades.set(100.0, 0, 0, 0, 0).unwrap();
/// sets.set(100.0, 0, 0, 0, 1).unwrap();
///
/// let market = SimpleMarket::new()
///     .with_default_curve("CP", FlatHazardRateCurve::new(0.02))
///     .with_recovery_rate("CP", 0.4);
/// let config = XvaConfig::default();
/// let strategy = StaticCreditXvaStrategy::new(&market, as_of, config.day_count);
/// let calculator =
///     XvaCalculator::new(&portfolio, &market, &strategy, &trades, &sets, config).unwrap();
///
/// let result = calculator.calculate().unwrap();
/// let cva = result.netting_set(&NettingSetId::new("NS")).unwrap().cva;
/// assert!((cva - 0.6 * (1.0 - (-0.02_f64 * 366.0 / 365.0).exp()) * 100.0).abs() < 1e-10);
/// ```
pub struct XvaCalculator<'a> {
    portfolio: &'a Portfolio,
    market: &'a dyn Market,
    strategy: &'a dyn XvaIncrementStrategy,
    trade_cube: &'a dyn NpvCube,
    netting_set_cube: &'a dyn NpvCube,
    config: XvaConfig,
    trade_indexes: Vec<usize>,
    netting_set_indexes: Vec<usize>,
    dim: Option<&'a DimProfile>,
}

/// Credit and funding inputs for the entities facing one counterparty.
struct Roles {
    cva_name: String,
    cva_recovery: f64,
    dva: Option<(String, f64)>,
    borrow_dcf: Option<Vec<f64>>,
    lend_dcf: Option<Vec<f64>>,
}

/// Inputs shared by every trade and netting set of one run.
struct RunContext {
    periods: Vec<IncrementPeriod>,
    roles: HashMap<CounterpartyId, Roles>,
}

fn check_depth(
    cube: &'static str,
    slot: &'static str,
    index: usize,
    depth: usize,
) -> Result<(), XvaError> {
    if index < depth {
        Ok(())
    } else {
        Err(XvaError::DepthOutOfRange {
            cube,
            slot,
            index,
            depth,
        })
    }
}

impl<'a> XvaCalculator<'a> {
    /// Validate inputs and build a calculator.
    ///
    /// # Arguments
    ///
    /// * `portfolio` - Trades, netting sets and counterparties
    /// * `market` - Source of default, funding and discount curves and recoveries
    /// * `strategy` - Increment computation
    /// * `trade_cube` - Trade exposure cube, one id per portfolio trade
    /// * `netting_set_cube` - Netting set exposure cube, one id per netting set
    /// * `config` - Slots and curve names
    ///
    /// # Errors
    ///
    /// - [`XvaError::IdCountMismatch`] if a cube id count differs from the portfolio
    /// - [`XvaError::Cube`] with an unknown id if a portfolio entity is absent from its cube
    /// - [`XvaError::DateGridMismatch`] if the cubes' date grids differ
    /// - [`XvaError::DepthOutOfRange`] if a configured slot is outside its cube
    /// - configuration errors from [`XvaConfig::validate`]
    pub fn new(
        portfolio: &'a Portfolio,
        market: &'a dyn Market,
        strategy: &'a dyn XvaIncrementStrategy,
        trade_cube: &'a dyn NpvCube,
        netting_set_cube: &'a dyn NpvCube,
        config: XvaConfig,
    ) -> Result<Self, XvaError> {
        config.validate()?;

        if trade_cube.num_ids() != portfolio.trade_count() {
            return Err(XvaError::IdCountMismatch {
                cube: "trade",
                expected: portfolio.trade_count(),
                actual: trade_cube.num_ids(),
            });
        }
        if netting_set_cube.num_ids() != portfolio.netting_set_count() {
            return Err(XvaError::IdCountMismatch {
                cube: "netting set",
                expected: portfolio.netting_set_count(),
                actual: netting_set_cube.num_ids(),
            });
        }
        if trade_cube.dates() != netting_set_cube.dates()
            || trade_cube.as_of() != netting_set_cube.as_of()
        {
            return Err(XvaError::DateGridMismatch {
                trade: trade_cube.num_dates(),
                netting_set: netting_set_cube.num_dates(),
            });
        }

        check_depth("trade", "EPE", config.trade_epe_index, trade_cube.depth())?;
        check_depth("trade", "ENE", config.trade_ene_index, trade_cube.depth())?;
        check_depth(
            "netting set",
            "EPE",
            config.netting_set_epe_index,
            netting_set_cube.depth(),
        )?;
        check_depth(
            "netting set",
            "ENE",
            config.netting_set_ene_index,
            netting_set_cube.depth(),
        )?;

        let trade_indexes = portfolio
            .trades()
            .iter()
            .map(|t| trade_cube.required_index(t.id().as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let netting_set_indexes = portfolio
            .netting_sets()
            .iter()
            .map(|ns| netting_set_cube.required_index(ns.id().as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            portfolio,
            market,
            strategy,
            trade_cube,
            netting_set_cube,
            config,
            trade_indexes,
            netting_set_indexes,
            dim: None,
        })
    }

    /// Attach expected initial margin profiles, enabling netting-set MVA
    /// when a borrowing curve is configured.
    ///
    /// # Errors
    ///
    /// [`XvaError::MissingDimProfile`] or [`XvaError::DimProfileLength`] if a
    /// netting set lacks a profile covering every cube date.
    pub fn with_dim_profile(mut self, dim: &'a DimProfile) -> Result<Self, XvaError> {
        let expected = self.netting_set_cube.num_dates();
        for ns in self.portfolio.netting_sets() {
            let profile = dim
                .get(ns.id())
                .ok_or_else(|| XvaError::MissingDimProfile(ns.id().to_string()))?;
            if profile.len() != expected {
                return Err(XvaError::DimProfileLength {
                    netting_set: ns.id().to_string(),
                    expected,
                    actual: profile.len(),
                });
            }
        }
        self.dim = Some(dim);
        Ok(self)
    }

    /// Active configuration.
    pub fn config(&self) -> &XvaConfig {
        &self.config
    }

    /// Compute all adjustments.
    ///
    /// Trades and netting sets are processed in parallel; each sums its
    /// increments in date order.
    ///
    /// # Errors
    ///
    /// Missing default curves, recovery rates, funding or OIS curves are
    /// fatal for the whole run.
    pub fn calculate(&self) -> Result<XvaResult, XvaError> {
        info!(
            strategy = self.strategy.name(),
            flip_view = self.config.flip_view,
            trades = self.portfolio.trade_count(),
            netting_sets = self.portfolio.netting_set_count(),
            dates = self.trade_cube.num_dates(),
            "calculating XVA"
        );
        let ctx = self.context()?;

        let trades = self
            .portfolio
            .trades()
            .par_iter()
            .zip(self.trade_indexes.par_iter())
            .map(|(trade, &index)| {
                let exposure = self.exposure(
                    self.trade_cube,
                    index,
                    self.config.trade_epe_index,
                    self.config.trade_ene_index,
                );
                let values = self.accumulate(&ctx, &exposure, trade.counterparty_id(), None)?;
                Ok((trade.id().clone(), values))
            })
            .collect::<Result<BTreeMap<_, _>, XvaError>>()?;

        let netting_sets = self
            .portfolio
            .netting_sets()
            .par_iter()
            .zip(self.netting_set_indexes.par_iter())
            .map(|(ns, &index)| {
                debug!(netting_set = %ns.id(), "updating netting set XVA");
                let exposure = self.exposure(
                    self.netting_set_cube,
                    index,
                    self.config.netting_set_epe_index,
                    self.config.netting_set_ene_index,
                );
                let dim = self
                    .dim
                    .and_then(|profiles| profiles.get(ns.id()))
                    .map(Vec::as_slice);
                let values = self.accumulate(&ctx, &exposure, ns.counterparty_id(), dim)?;
                Ok((ns.id().clone(), values))
            })
            .collect::<Result<BTreeMap<_, _>, XvaError>>()?;

        Ok(XvaResult::new(
            trades,
            netting_sets,
            self.portfolio,
            self.config.allocation_method,
        ))
    }

    fn counterparty(&self, id: &CounterpartyId) -> Result<&'a Counterparty, XvaError> {
        self.portfolio
            .counterparty(id)
            .ok_or_else(|| XvaError::UnknownCounterparty(id.to_string()))
    }

    /// Exposure profile of one cube id; EPE and ENE swap under flip view.
    fn exposure<'c>(
        &self,
        cube: &'c dyn NpvCube,
        index: usize,
        epe_index: usize,
        ene_index: usize,
    ) -> ExposureProfile<'c> {
        if self.config.flip_view {
            ExposureProfile::new(cube, index, ene_index, epe_index)
        } else {
            ExposureProfile::new(cube, index, epe_index, ene_index)
        }
    }

    fn context(&self) -> Result<RunContext, XvaError> {
        let periods = IncrementPeriod::grid(self.trade_cube.as_of(), self.trade_cube.dates());
        let own = self.config.dva_name.as_deref();

        let own_recovery = own
            .map(|name| match self.config.dva_recovery_override {
                Some(r) => Ok(r),
                None => resolve_recovery_rate(
                    self.market,
                    &[RecoverySource::CreditCurve(name.to_string())],
                ),
            })
            .transpose()?;

        let (borrow_dcf, lend_dcf) = if self.config.flip_view {
            (None, None)
        } else {
            (
                self.optional_funding_dcf(self.config.fva_borrowing_curve.clone(), &periods)?,
                self.optional_funding_dcf(self.config.fva_lending_curve.clone(), &periods)?,
            )
        };

        let counterparty_ids = self
            .portfolio
            .netting_sets()
            .iter()
            .map(|ns| ns.counterparty_id())
            .chain(self.portfolio.trades().iter().map(|t| t.counterparty_id()));

        let mut roles = HashMap::new();
        for id in counterparty_ids {
            if roles.contains_key(id) {
                continue;
            }
            let counterparty = self.counterparty(id)?;
            let name = counterparty.default_curve();
            let recovery = match self.config.cva_recovery_override {
                Some(r) => r,
                None => resolve_recovery_rate(self.market, &counterparty.recovery_chain())?,
            };

            let role = if self.config.flip_view {
                let (own, own_recovery) = own.zip(own_recovery).ok_or_else(|| {
                    XvaError::InvalidConfig("flip_view requires dva_name".to_string())
                })?;
                let postfixed = |postfix: &Option<String>| {
                    postfix.as_ref().map(|p| format!("{name}{p}"))
                };
                Roles {
                    cva_name: own.to_string(),
                    cva_recovery: own_recovery,
                    dva: Some((name.to_string(), recovery)),
                    borrow_dcf: self.optional_funding_dcf(
                        postfixed(&self.config.flip_view_borrowing_curve_postfix),
                        &periods,
                    )?,
                    lend_dcf: self.optional_funding_dcf(
                        postfixed(&self.config.flip_view_lending_curve_postfix),
                        &periods,
                    )?,
                }
            } else {
                Roles {
                    cva_name: name.to_string(),
                    cva_recovery: recovery,
                    dva: own.zip(own_recovery).map(|(n, r)| (n.to_string(), r)),
                    borrow_dcf: borrow_dcf.clone(),
                    lend_dcf: lend_dcf.clone(),
                }
            };
            roles.insert(id.clone(), role);
        }

        Ok(RunContext { periods, roles })
    }

    fn optional_funding_dcf(
        &self,
        curve: Option<String>,
        periods: &[IncrementPeriod],
    ) -> Result<Option<Vec<f64>>, XvaError> {
        curve.map(|name| self.funding_dcf(&name, periods)).transpose()
    }

    /// `B(d0)/B(d1) - P(d0)/P(d1)` per period for funding curve `B` and the
    /// base currency discount curve `P`.
    fn funding_dcf(&self, curve: &str, periods: &[IncrementPeriod]) -> Result<Vec<f64>, XvaError> {
        let base = self
            .config
            .base_currency
            .as_deref()
            .ok_or(XvaError::MissingBaseCurrency)?;
        let funding = self.market.required_yield_curve(curve)?;
        let ois = self.market.required_discount_curve(base)?;
        let as_of = self.trade_cube.as_of();
        let time = |d: NaiveDate| self.config.day_count.year_fraction(as_of, d).max(0.0);

        periods
            .iter()
            .map(|p| {
                let (t0, t1) = (time(p.d0), time(p.d1));
                let funding_ratio = funding.discount_factor(t0)? / funding.discount_factor(t1)?;
                let ois_ratio = ois.discount_factor(t0)? / ois.discount_factor(t1)?;
                Ok(funding_ratio - ois_ratio)
            })
            .collect()
    }

    fn accumulate(
        &self,
        ctx: &RunContext,
        exposure: &ExposureProfile<'_>,
        counterparty: &CounterpartyId,
        dim: Option<&[f64]>,
    ) -> Result<XvaValues, XvaError> {
        let roles = ctx
            .roles
            .get(counterparty)
            .ok_or_else(|| XvaError::UnknownCounterparty(counterparty.to_string()))?;
        let cid = roles.cva_name.as_str();
        let own = roles.dva.as_ref().map(|(name, _)| name.as_str());
        let s = self.strategy;

        let mut v = XvaValues::default();
        for p in &ctx.periods {
            v.cva += s.cva_increment(exposure, cid, p, roles.cva_recovery)?;
            if let Some((name, rr)) = &roles.dva {
                v.dva += s.dva_increment(exposure, name, p, *rr)?;
            }

            if let Some(dcf) = roles.borrow_dcf.as_ref().map(|d| d[p.index]) {
                v.fca += s.fca_increment(exposure, Some(cid), own, p, dcf)?;
                v.fca_ex_own_sp += s.fca_increment(exposure, Some(cid), None, p, dcf)?;
                v.fca_ex_all_sp += s.fca_increment(exposure, None, None, p, dcf)?;
                if let Some(dim) = dim {
                    v.mva += s.mva_increment(dim[p.index], cid, own, p, dcf)?;
                }
            }

            if let Some(dcf) = roles.lend_dcf.as_ref().map(|d| d[p.index]) {
                v.fba += s.fba_increment(exposure, Some(cid), own, p, dcf)?;
                v.fba_ex_own_sp += s.fba_increment(exposure, Some(cid), None, p, dcf)?;
                v.fba_ex_all_sp += s.fba_increment(exposure, None, None, p, dcf)?;
            }
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{CubeError, InMemoryCube};
    use crate::portfolio::{NettingSet, PortfolioBuilder, TradeId, TradeInfo};
    use crate::xva::{AllocationMethod, StaticCreditXvaStrategy};
    use approx::assert_relative_eq;
    use pricer_core::market_data::{FlatCurve, FlatHazardRateCurve, MarketDataError, SimpleMarket};
    use pricer_core::types::{Currency, DayCountConvention};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn as_of() -> NaiveDate {
        date(2024, 1, 1)
    }

    fn dates() -> Vec<NaiveDate> {
        vec![date(2024, 7, 1), date(2025, 1, 1), date(2026, 1, 1)]
    }

    fn portfolio() -> Portfolio {
        let trade = |id: &str| {
            TradeInfo::new(
                TradeId::new(id),
                NettingSetId::new("NS"),
                CounterpartyId::new("CP"),
                Currency::EUR,
            )
        };
        PortfolioBuilder::new()
            .add_counterparty(
                Counterparty::new(CounterpartyId::new("CP"), "CP").with_security_id("CP_BOND"),
            )
            .add_netting_set(NettingSet::new(
                NettingSetId::new("NS"),
                CounterpartyId::new("CP"),
            ))
            .add_trades(vec![trade("T1"), trade("T2")])
            .build()
            .unwrap()
    }

    fn market() -> SimpleMarket {
        SimpleMarket::new()
            .with_default_curve("CP", FlatHazardRateCurve::new(0.02))
            .with_default_curve("BANK", FlatHazardRateCurve::new(0.01))
            .with_recovery_rate("CP", 0.4)
            .with_recovery_rate("BANK", 0.4)
            .with_discount_curve("EUR", FlatCurve::new(0.01))
            .with_yield_curve("BORROW", FlatCurve::new(0.015))
            .with_yield_curve("LEND", FlatCurve::new(0.012))
            .with_yield_curve("CP_BORROW", FlatCurve::new(0.02))
    }

    /// Trade 1 always +60 EPE / 0 ENE, trade 2 +40 EPE / 30 ENE; netting set
    /// EPE 70, ENE 0.
    fn cubes() -> (InMemoryCube, InMemoryCube) {
        let mut trades = InMemoryCube::new(as_of(), ["T1", "T2"], dates(), 1, 2).unwrap();
        let mut sets = InMemoryCube::new(as_of(), ["NS"], dates(), 1, 3).unwrap();
        trades.par_fill(|id, _, _, slots| {
            if id == 0 {
                slots.copy_from_slice(&[60.0, 0.0]);
            } else {
                slots.copy_from_slice(&[40.0, 30.0]);
            }
        });
        sets.par_fill(|_, _, _, slots| slots.copy_from_slice(&[70.0, 70.0, 0.0]));
        (trades, sets)
    }

    fn survival(h: f64, d: NaiveDate) -> f64 {
        (-h * DayCountConvention::Act365Fixed.year_fraction(as_of(), d)).exp()
    }

    // ========================================
    // Validation
    // ========================================

    #[test]
    fn test_rejects_trade_count_mismatch() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let trades = InMemoryCube::new(as_of(), ["T1"], dates(), 1, 2).unwrap();
        let (_, sets) = cubes();
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .err()
            .unwrap();
        assert_eq!(
            err,
            XvaError::IdCountMismatch {
                cube: "trade",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_rejects_unknown_trade_id() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let trades = InMemoryCube::new(as_of(), ["T1", "T9"], dates(), 1, 2).unwrap();
        let (_, sets) = cubes();
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, XvaError::Cube(CubeError::UnknownId("T2".to_string())));
    }

    #[test]
    fn test_rejects_date_grid_mismatch() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, _) = cubes();
        let sets =
            InMemoryCube::new(as_of(), ["NS"], vec![date(2024, 7, 1), date(2025, 1, 1)], 1, 3)
                .unwrap();
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .err()
            .unwrap();
        assert_eq!(
            err,
            XvaError::DateGridMismatch {
                trade: 3,
                netting_set: 2
            }
        );
    }

    #[test]
    fn test_rejects_depth_outside_cube() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::default().with_netting_set_indices(1, 3);
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .err()
            .unwrap();
        assert_eq!(
            err,
            XvaError::DepthOutOfRange {
                cube: "netting set",
                slot: "ENE",
                index: 3,
                depth: 3
            }
        );
    }

    #[test]
    fn test_rejects_short_dim_profile() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let dim: DimProfile = [(NettingSetId::new("NS"), vec![1.0])].into_iter().collect();
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .unwrap()
            .with_dim_profile(&dim)
            .err()
            .unwrap();
        assert!(matches!(err, XvaError::DimProfileLength { expected: 3, actual: 1, .. }));
    }

    // ========================================
    // Calculation
    // ========================================

    #[test]
    fn test_cva_telescopes_for_constant_exposure() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .unwrap()
            .calculate()
            .unwrap();

        let pd = 1.0 - survival(0.02, date(2026, 1, 1));
        let ns = result.netting_set(&NettingSetId::new("NS")).unwrap();
        assert_relative_eq!(ns.cva, 0.6 * pd * 70.0, max_relative = 1e-12);
        assert_relative_eq!(
            result.trade(&TradeId::new("T1")).unwrap().cva,
            0.6 * pd * 60.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            result.netting_set_sum_cva(&NettingSetId::new("NS")).unwrap(),
            0.6 * pd * 100.0,
            max_relative = 1e-12
        );
        // no own curve configured
        assert_eq!(ns.dva, 0.0);
        assert_eq!(ns.fca, 0.0);
    }

    #[test]
    fn test_dva_and_funding() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::new()
            .with_base_currency("EUR")
            .with_dva_name("BANK")
            .with_fva_borrowing_curve("BORROW")
            .with_fva_lending_curve("LEND");
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .unwrap()
            .calculate()
            .unwrap();

        let t2 = result.trade(&TradeId::new("T2")).unwrap();
        let pd_own = 1.0 - survival(0.01, date(2026, 1, 1));
        assert_relative_eq!(t2.dva, 0.6 * pd_own * 30.0, max_relative = 1e-12);

        // ex-all-spread FCA is the undiscounted spread carry on a flat EPE
        let mut expected = 0.0;
        let mut d0 = as_of();
        for d1 in dates() {
            let t0 = DayCountConvention::Act365Fixed.year_fraction(as_of(), d0);
            let t1 = DayCountConvention::Act365Fixed.year_fraction(as_of(), d1);
            let dcf = (0.015 * (t1 - t0)).exp() - (0.01 * (t1 - t0)).exp();
            expected += 40.0 * dcf;
            d0 = d1;
        }
        assert_relative_eq!(t2.fca_ex_all_sp, expected, max_relative = 1e-12);
        assert!(t2.fca < t2.fca_ex_own_sp && t2.fca_ex_own_sp < t2.fca_ex_all_sp);
        assert!(t2.fba > 0.0);

        // netting set ENE is zero
        let ns = result.netting_set(&NettingSetId::new("NS")).unwrap();
        assert_eq!(ns.fba, 0.0);
        assert_eq!(ns.mva, 0.0);
    }

    #[test]
    fn test_mva_from_dim_profile() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::new()
            .with_base_currency("EUR")
            .with_fva_borrowing_curve("BORROW");
        let dim: DimProfile = [(NettingSetId::new("NS"), vec![10.0, 10.0, 10.0])]
            .into_iter()
            .collect();
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .unwrap()
            .with_dim_profile(&dim)
            .unwrap()
            .calculate()
            .unwrap();

        let ns = result.netting_set(&NettingSetId::new("NS")).unwrap();
        assert!(ns.mva > 0.0);
        // DIM of 10 against EPE of 70 with the same weights
        assert_relative_eq!(ns.mva, ns.fca_ex_own_sp / 7.0, max_relative = 1e-12);
        assert_eq!(result.trade(&TradeId::new("T1")).unwrap().mva, 0.0);
    }

    #[test]
    fn test_security_recovery_takes_precedence() {
        let p = portfolio();
        let m = market().with_security_recovery_rate("CP_BOND", 0.25);
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .unwrap()
            .calculate()
            .unwrap();
        let pd = 1.0 - survival(0.02, date(2026, 1, 1));
        assert_relative_eq!(
            result.netting_set(&NettingSetId::new("NS")).unwrap().cva,
            0.75 * pd * 70.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_missing_default_curve_is_fatal() {
        let p = portfolio();
        let m = SimpleMarket::new().with_recovery_rate("CP", 0.4);
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, XvaConfig::default())
            .unwrap()
            .calculate()
            .unwrap_err();
        assert_eq!(
            err,
            XvaError::MarketData(MarketDataError::MissingDefaultCurve {
                name: "CP".to_string()
            })
        );
    }

    #[test]
    fn test_missing_funding_curve_is_fatal() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::new()
            .with_base_currency("EUR")
            .with_fva_borrowing_curve("NOWHERE");
        let err = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .unwrap()
            .calculate()
            .unwrap_err();
        assert_eq!(
            err,
            XvaError::MarketData(MarketDataError::MissingYieldCurve {
                name: "NOWHERE".to_string()
            })
        );
    }

    // ========================================
    // Flip view and allocation
    // ========================================

    #[test]
    fn test_flip_view_swaps_cva_and_dva() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::new().with_dva_name("BANK");
        let regular = XvaCalculator::new(&p, &m, &s, &trades, &sets, config.clone())
            .unwrap()
            .calculate()
            .unwrap();
        let flipped = XvaCalculator::new(&p, &m, &s, &trades, &sets, config.with_flip_view())
            .unwrap()
            .calculate()
            .unwrap();

        let ns = NettingSetId::new("NS");
        let (r, f) = (regular.netting_set(&ns).unwrap(), flipped.netting_set(&ns).unwrap());
        assert!(r.cva > 0.0 && f.dva > 0.0);
        assert_relative_eq!(f.cva, r.dva, max_relative = 1e-12);
        assert_relative_eq!(f.dva, r.cva, max_relative = 1e-12);

        for id in ["T1", "T2"] {
            let (r, f) = (
                regular.trade(&TradeId::new(id)).unwrap(),
                flipped.trade(&TradeId::new(id)).unwrap(),
            );
            assert_relative_eq!(f.cva, r.dva, max_relative = 1e-12);
            assert_relative_eq!(f.dva, r.cva, max_relative = 1e-12);
        }

        // T2 has ENE 30, which the counterparty sees as exposure on the bank
        let pd_own = 1.0 - survival(0.01, date(2026, 1, 1));
        assert_relative_eq!(
            flipped.trade(&TradeId::new("T2")).unwrap().cva,
            0.6 * pd_own * 30.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_flip_view_funds_on_counterparty_curves() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let mut config = XvaConfig::new()
            .with_base_currency("EUR")
            .with_dva_name("BANK")
            .with_fva_borrowing_curve("NOWHERE")
            .with_flip_view();
        config.flip_view_borrowing_curve_postfix = Some("_BORROW".to_string());
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .unwrap()
            .calculate()
            .unwrap();

        // funded on CP_BORROW against the flipped EPE, i.e. the ENE slot
        let mut expected = 0.0;
        let mut d0 = as_of();
        for d1 in dates() {
            let t0 = DayCountConvention::Act365Fixed.year_fraction(as_of(), d0);
            let t1 = DayCountConvention::Act365Fixed.year_fraction(as_of(), d1);
            let dcf = (0.02 * (t1 - t0)).exp() - (0.01 * (t1 - t0)).exp();
            expected += 30.0 * dcf;
            d0 = d1;
        }
        let t2 = result.trade(&TradeId::new("T2")).unwrap();
        assert_relative_eq!(t2.fca_ex_all_sp, expected, max_relative = 1e-12);
        assert_eq!(t2.fba, 0.0);
    }

    #[test]
    fn test_flip_view_without_postfix_has_no_funding() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::new()
            .with_base_currency("EUR")
            .with_dva_name("BANK")
            .with_fva_borrowing_curve("BORROW")
            .with_flip_view();
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .unwrap()
            .calculate()
            .unwrap();
        assert_eq!(result.trade(&TradeId::new("T1")).unwrap().fca, 0.0);
    }

    #[test]
    fn test_allocated_cva_sums_to_netting_set() {
        let p = portfolio();
        let m = market();
        let s = StaticCreditXvaStrategy::new(&m, as_of(), DayCountConvention::Act365Fixed);
        let (trades, sets) = cubes();
        let config = XvaConfig::new()
            .with_dva_name("BANK")
            .with_allocation_method(AllocationMethod::RelativeXva);
        let result = XvaCalculator::new(&p, &m, &s, &trades, &sets, config)
            .unwrap()
            .calculate()
            .unwrap();

        let ns = result.netting_set(&NettingSetId::new("NS")).unwrap();
        let (t1, t2) = (TradeId::new("T1"), TradeId::new("T2"));
        let cva = |id: &TradeId| result.allocated_trade_cva(id).unwrap();
        assert_relative_eq!(cva(&t1) + cva(&t2), ns.cva, max_relative = 1e-12);
        // stand-alone CVA of 60 and 40
        assert_relative_eq!(cva(&t1), 0.6 * ns.cva, max_relative = 1e-12);

        // netting set ENE is zero, so allocated DVA is zero on both trades
        assert_eq!(result.allocated_trade_dva(&t1), Some(0.0));
        assert_eq!(result.allocated_trade_dva(&t2), Some(0.0));
    }
}
