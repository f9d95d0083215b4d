//! # Pricer XVA
//!
//! NPV cubes, exposure post-processing and valuation adjustments.
//!
//! This crate provides:
//! - Portfolio structure: trades, netting sets and counterparties
//! - The [`NpvCube`](cube::NpvCube) storage trait and a dense in-memory cube
//! - Exposure aggregation into trade and netting set EPE/ENE cubes
//! - CVA, DVA, FCA, FBA and MVA from pluggable increment strategies
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              pricer_xva                 │
//! ├─────────────────────────────────────────┤
//! │  portfolio/  - TradeInfo, Counterparty, │
//! │                NettingSet, Portfolio    │
//! │  cube/       - NpvCube, InMemoryCube    │
//! │  exposure/   - EE, EPE, ENE cubes       │
//! │  xva/        - XvaCalculator,           │
//! │                XvaIncrementStrategy     │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │             pricer_core                 │
//! │  Market, curves, recovery, day counts   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use pricer_core::market_data::{FlatHazardRateCurve, SimpleMarket};
//! use pricer_core::types::Currency;
//! use pricer_xva::cube::InMemoryCube;
//! use pricer_xva::exposure::ExposureCalculator;
//! use pricer_xva::portfolio::*;
//! use pricer_xva::xva::{StaticCreditXvaStrategy, XvaCalculator, XvaConfig};
//!
//! let portfolio = PortfolioBuilder::new()
//!     .add_counterparty(Counterparty::new(CounterpartyId::new("CP001"), "CP001"))
//!     .add_netting_set(NettingSet::new(NettingSetId::new("NS001"), CounterpartyId::new("CP001")))
//!     .add_trade(TradeInfo::new(
//!         TradeId::new("T001"),
//!         NettingSetId::new("NS001"),
//!         CounterpartyId::new("CP001"),
//!         Currency::USD,
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let dates: Vec<_> = (2025..=2029).map(|y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap()).collect();
//! let mut npv = InMemoryCube::new(as_of, ["T001"], dates, 2, 1).unwrap();
//! npv.par_fill(|_, date, sample, slot| {
//!     slot[0] = if sample == 0 { 10.0 * (date + 1) as f64 } else { -5.0 };
//! });
//!
//! let exposures = ExposureCalculator::new().compute(&portfolio, &npv).unwrap();
//!
//! let market = SimpleMarket::new()
//!     .with_default_curve("CP001", FlatHazardRateCurve::new(0.02))
//!     .with_recovery_rate("CP001", 0.4);
//! let config = XvaConfig::default();
//! let strategy = StaticCreditXvaStrategy::new(&market, as_of, config.day_count);
//! let result = XvaCalculator::new(
//!     &portfolio,
//!     &market,
//!     &strategy,
//!     &exposures.trade,
//!     &exposures.netting_set,
//!     config,
//! )
//! .unwrap()
//! .calculate()
//! .unwrap();
//!
//! let trade_cva = result.trade(&TradeId::new("T001")).unwrap().cva;
//! let set_cva = result.netting_set(&NettingSetId::new("NS001")).unwrap().cva;
//! assert!(trade_cva > 0.0);
//! assert!((trade_cva - set_cva).abs() < 1e-12);
//! ```

#![warn(missing_docs)]

pub mod cube;
pub mod exposure;
pub mod portfolio;
pub mod xva;

// Re-export commonly used types
pub use cube::{CubeError, InMemoryCube, NpvCube};
pub use exposure::{ExposureCalculator, ExposureCubes};
pub use portfolio::{
    Counterparty, CounterpartyId, NettingSet, NettingSetId, Portfolio, PortfolioBuilder,
    PortfolioError, TradeId, TradeInfo,
};
pub use xva::{
    StaticCreditXvaStrategy, XvaCalculator, XvaConfig, XvaError, XvaIncrementStrategy, XvaResult,
    XvaValues,
};
