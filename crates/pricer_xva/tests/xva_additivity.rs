//! Integration tests for exposure aggregation and XVA increments.
//!
//! Checks that increments telescope over the date grid, that trade and
//! netting set results are consistent, and that a TOML configuration
//! drives a full run.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use pricer_core::market_data::{FlatCurve, FlatHazardRateCurve, SimpleMarket};
use pricer_core::types::{Currency, DayCountConvention};
use pricer_xva::cube::{InMemoryCube, NpvCube};
use pricer_xva::exposure::{ExposureCalculator, NETTING_SET_EPE, TRADE_EPE};
use pricer_xva::portfolio::{
    Counterparty, CounterpartyId, NettingSet, NettingSetId, Portfolio, PortfolioBuilder, TradeId,
    TradeInfo,
};
use pricer_xva::xva::{AllocationMethod, StaticCreditXvaStrategy, XvaCalculator, XvaConfig};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn annual_dates(n: usize) -> Vec<NaiveDate> {
    (1..=n)
        .map(|i| NaiveDate::from_ymd_opt(2024 + i as i32, 1, 1).unwrap())
        .collect()
}

/// Two netting sets with one counterparty each; NS_A holds three trades,
/// NS_B holds one.
fn portfolio() -> Portfolio {
    let trade = |id: &str, ns: &str, cp: &str| {
        TradeInfo::new(
            TradeId::new(id),
            NettingSetId::new(ns),
            CounterpartyId::new(cp),
            Currency::EUR,
        )
    };
    PortfolioBuilder::new()
        .add_counterparty(Counterparty::new(CounterpartyId::new("CP_A"), "CP_A"))
        .add_counterparty(Counterparty::new(CounterpartyId::new("CP_B"), "CP_B"))
        .add_netting_set(NettingSet::new(
            NettingSetId::new("NS_A"),
            CounterpartyId::new("CP_A"),
        ))
        .add_netting_set(NettingSet::new(
            NettingSetId::new("NS_B"),
            CounterpartyId::new("CP_B"),
        ))
        .add_trades(vec![
            trade("A1", "NS_A", "CP_A"),
            trade("A2", "NS_A", "CP_A"),
            trade("A3", "NS_A", "CP_A"),
            trade("B1", "NS_B", "CP_B"),
        ])
        .build()
        .unwrap()
}

/// Raw NPVs where A1 and A2 partly offset each other.
fn raw_cube(n_dates: usize, n_samples: usize) -> InMemoryCube {
    let mut cube = InMemoryCube::new(
        as_of(),
        ["A1", "A2", "A3", "B1"],
        annual_dates(n_dates),
        n_samples,
        1,
    )
    .unwrap();
    cube.par_fill(|id, date, sample, slot| {
        let z = ((sample * 37 + date * 11) % 21) as f64 - 10.0;
        let t = (date + 1) as f64;
        slot[0] = match id {
            0 => 5.0 * z * t.sqrt(),
            1 => -3.0 * z * t.sqrt() + 2.0,
            2 => 1.5 * t,
            _ => z,
        };
    });
    cube
}

fn market() -> SimpleMarket {
    SimpleMarket::new()
        .with_discount_curve("EUR", FlatCurve::new(0.02))
        .with_yield_curve("EUR_BORROW", FlatCurve::new(0.026))
        .with_yield_curve("EUR_LEND", FlatCurve::new(0.023))
        .with_default_curve("CP_A", FlatHazardRateCurve::new(0.015))
        .with_default_curve("CP_B", FlatHazardRateCurve::new(0.04))
        .with_default_curve("BANK", FlatHazardRateCurve::new(0.008))
        .with_recovery_rate("CP_A", 0.4)
        .with_recovery_rate("CP_B", 0.25)
        .with_recovery_rate("BANK", 0.4)
}

// ========================================
// Telescoping
// ========================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With flat exposure the CVA increments sum to the default
    /// probability over the whole horizon.
    #[test]
    fn test_cva_telescopes_for_constant_exposure(
        n_dates in 1usize..15,
        hazard in 0.001f64..0.1,
        recovery in 0.0f64..0.9,
        epe in 0.0f64..1e6,
    ) {
        let portfolio = PortfolioBuilder::new()
            .add_counterparty(Counterparty::new(CounterpartyId::new("CP"), "CP"))
            .add_netting_set(NettingSet::new(NettingSetId::new("NS"), CounterpartyId::new("CP")))
            .add_trade(TradeInfo::new(
                TradeId::new("T"),
                NettingSetId::new("NS"),
                CounterpartyId::new("CP"),
                Currency::EUR,
            ))
            .build()
            .unwrap();
        let dates = annual_dates(n_dates);
        let horizon = DayCountConvention::Act365Fixed.year_fraction(as_of(), dates[n_dates - 1]);

        let mut trades = InMemoryCube::new(as_of(), ["T"], dates.clone(), 1, 2).unwrap();
        let mut sets = InMemoryCube::new(as_of(), ["NS"], dates, 1, 3).unwrap();
        trades.par_fill(|_, _, _, slots| slots[0] = epe);
        sets.par_fill(|_, _, _, slots| slots[1] = epe);

        let market = SimpleMarket::new()
            .with_default_curve("CP", FlatHazardRateCurve::new(hazard))
            .with_recovery_rate("CP", recovery);
        let config = XvaConfig::default();
        let strategy = StaticCreditXvaStrategy::new(&market, as_of(), config.day_count);
        let result = XvaCalculator::new(&portfolio, &market, &strategy, &trades, &sets, config)
            .unwrap()
            .calculate()
            .unwrap();

        let expected = (1.0 - recovery) * (1.0 - (-hazard * horizon).exp()) * epe;
        let cva = result.netting_set(&NettingSetId::new("NS")).unwrap().cva;
        prop_assert!((cva - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
        let trade_cva = result.trade(&TradeId::new("T")).unwrap().cva;
        prop_assert!((trade_cva - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
    }
}

// ========================================
// Trade / Netting Set Consistency
// ========================================

#[test]
fn test_netting_set_sums_match_trades() {
    init_tracing();
    let portfolio = portfolio();
    let exposures = ExposureCalculator::new()
        .compute(&portfolio, &raw_cube(8, 200))
        .unwrap();
    let market = market();
    let config = XvaConfig::default().with_dva_name("BANK");
    let strategy = StaticCreditXvaStrategy::new(&market, as_of(), config.day_count);
    let result = XvaCalculator::new(
        &portfolio,
        &market,
        &strategy,
        &exposures.trade,
        &exposures.netting_set,
        config,
    )
    .unwrap()
    .calculate()
    .unwrap();

    let ns_a = NettingSetId::new("NS_A");
    let sum_cva: f64 = ["A1", "A2", "A3"]
        .iter()
        .map(|id| result.trade(&TradeId::new(*id)).unwrap().cva)
        .sum();
    let sum_dva: f64 = ["A1", "A2", "A3"]
        .iter()
        .map(|id| result.trade(&TradeId::new(*id)).unwrap().dva)
        .sum();
    assert_relative_eq!(result.netting_set_sum_cva(&ns_a).unwrap(), sum_cva, max_relative = 1e-12);
    assert_relative_eq!(result.netting_set_sum_dva(&ns_a).unwrap(), sum_dva, max_relative = 1e-12);

    // Netting benefit: A1 and A2 offset.
    let netted = result.netting_set(&ns_a).unwrap();
    assert!(netted.cva < sum_cva);
    assert!(netted.cva > 0.0);
    assert!(netted.dva > 0.0);

    // Single-trade netting set: trade and netting set agree.
    let ns_b = result.netting_set(&NettingSetId::new("NS_B")).unwrap();
    let b1 = result.trade(&TradeId::new("B1")).unwrap();
    assert_relative_eq!(ns_b.cva, b1.cva, max_relative = 1e-12);
    assert_relative_eq!(ns_b.dva, b1.dva, max_relative = 1e-12);

    let by_cp = result.by_counterparty(&portfolio);
    assert_relative_eq!(by_cp[&CounterpartyId::new("CP_B")].cva, ns_b.cva);
    assert_relative_eq!(
        result.total().cva,
        netted.cva + ns_b.cva,
        max_relative = 1e-12
    );
}

#[test]
fn test_single_trade_netting_set_exposure_matches() {
    let portfolio = portfolio();
    let exposures = ExposureCalculator::new()
        .compute(&portfolio, &raw_cube(5, 50))
        .unwrap();
    let b1 = exposures.trade.index_of("B1").unwrap();
    let ns_b = exposures.netting_set.index_of("NS_B").unwrap();
    for date in 0..exposures.trade.num_dates() {
        assert_relative_eq!(
            exposures.trade.get(b1, date, 0, TRADE_EPE).unwrap(),
            exposures
                .netting_set
                .get(ns_b, date, 0, NETTING_SET_EPE)
                .unwrap()
        );
    }
}

#[test]
fn test_relative_allocation_recovers_netted_values() {
    init_tracing();
    let portfolio = portfolio();
    let exposures = ExposureCalculator::new()
        .compute(&portfolio, &raw_cube(8, 200))
        .unwrap();
    let market = market();
    let config = XvaConfig::default()
        .with_dva_name("BANK")
        .with_allocation_method(AllocationMethod::RelativeXva);
    let strategy = StaticCreditXvaStrategy::new(&market, as_of(), config.day_count);
    let result = XvaCalculator::new(
        &portfolio,
        &market,
        &strategy,
        &exposures.trade,
        &exposures.netting_set,
        config,
    )
    .unwrap()
    .calculate()
    .unwrap();

    let netted = result.netting_set(&NettingSetId::new("NS_A")).unwrap();
    let ids = ["A1", "A2", "A3"].map(TradeId::new);
    let cva: f64 = ids.iter().filter_map(|id| result.allocated_trade_cva(id)).sum();
    let dva: f64 = ids.iter().filter_map(|id| result.allocated_trade_dva(id)).sum();
    assert_relative_eq!(cva, netted.cva, max_relative = 1e-12);
    assert_relative_eq!(dva, netted.dva, max_relative = 1e-12);

    // netting benefit is shared out, never added
    for id in &ids {
        let stand_alone = result.trade(id).unwrap().cva;
        assert!(result.allocated_trade_cva(id).unwrap() <= stand_alone + 1e-12);
    }
}

#[test]
fn test_flip_view_mirrors_regular_run() {
    let portfolio = portfolio();
    let exposures = ExposureCalculator::new()
        .compute(&portfolio, &raw_cube(6, 100))
        .unwrap();
    let market = market();
    let run = |config: XvaConfig| {
        let strategy = StaticCreditXvaStrategy::new(&market, as_of(), config.day_count);
        XvaCalculator::new(
            &portfolio,
            &market,
            &strategy,
            &exposures.trade,
            &exposures.netting_set,
            config,
        )
        .unwrap()
        .calculate()
        .unwrap()
    };
    let regular = run(XvaConfig::default().with_dva_name("BANK"));
    let flipped = run(XvaConfig::default().with_dva_name("BANK").with_flip_view());

    for (id, r) in regular.netting_sets() {
        let f = flipped.netting_set(id).unwrap();
        assert_relative_eq!(f.cva, r.dva, max_relative = 1e-12);
        assert_relative_eq!(f.dva, r.cva, max_relative = 1e-12);
    }
}

// ========================================
// Configuration
// ========================================

#[test]
fn test_toml_configuration_drives_full_run() {
    init_tracing();
    let config = XvaConfig::from_toml_str(
        r#"
        base_currency = "EUR"
        dva_name = "BANK"
        fva_borrowing_curve = "EUR_BORROW"
        fva_lending_curve = "EUR_LEND"
        cva_recovery_override = 0.5
        "#,
    )
    .unwrap();
    assert!(config.fva_enabled());

    let portfolio = portfolio();
    let exposures = ExposureCalculator::new()
        .compute(&portfolio, &raw_cube(6, 100))
        .unwrap();
    let market = market();
    let strategy = StaticCreditXvaStrategy::new(&market, as_of(), config.day_count);
    let result = XvaCalculator::new(
        &portfolio,
        &market,
        &strategy,
        &exposures.trade,
        &exposures.netting_set,
        config,
    )
    .unwrap()
    .calculate()
    .unwrap();

    for values in result.netting_sets().values() {
        assert!(values.fca > 0.0);
        assert!(values.fba > 0.0);
        // Removing survival weighting can only increase the adjustment.
        assert!(values.fca <= values.fca_ex_own_sp);
        assert!(values.fca_ex_own_sp <= values.fca_ex_all_sp);
        assert!(values.fba <= values.fba_ex_own_sp);
        assert!(values.fba_ex_own_sp <= values.fba_ex_all_sp);
        assert_eq!(values.mva, 0.0);
    }

    // The override replaces CP_B's market recovery of 0.25.
    let override_cva = result.netting_set(&NettingSetId::new("NS_B")).unwrap().cva;
    let strategy = StaticCreditXvaStrategy::new(&market, as_of(), DayCountConvention::Act365Fixed);
    let market_result = XvaCalculator::new(
        &portfolio,
        &market,
        &strategy,
        &exposures.trade,
        &exposures.netting_set,
        XvaConfig::default(),
    )
    .unwrap()
    .calculate()
    .unwrap();
    let market_cva = market_result
        .netting_set(&NettingSetId::new("NS_B"))
        .unwrap()
        .cva;
    assert_relative_eq!(override_cva / market_cva, 0.5 / 0.75, max_relative = 1e-12);
}
