//! Market data structures for cross-asset risk calculations.
//!
//! # Components
//!
//! - [`curves`]: Yield and credit curve traits and implementations
//! - [`market`]: The read-only [`Market`] interface and the in-memory [`SimpleMarket`]
//! - [`recovery`]: Ordered recovery rate fallback chain
//! - [`error`]: Market data error types (MarketDataError)
//!
//! # Example
//!
//! ```
//! use pricer_core::market_data::{Market, SimpleMarket};
//! use pricer_core::market_data::curves::{FlatCurve, FlatHazardRateCurve, YieldCurve};
//!
//! let market = SimpleMarket::new()
//!     .with_discount_curve("EUR", FlatCurve::new(0.02))
//!     .with_default_curve("CPTY_A", FlatHazardRateCurve::new(0.01))
//!     .with_recovery_rate("CPTY_A", 0.4);
//!
//! let eur = market.required_discount_curve("EUR").unwrap();
//! assert!((eur.discount_factor(1.0).unwrap() - (-0.02_f64).exp()).abs() < 1e-15);
//! assert!(market.default_curve("CPTY_B").is_none());
//! ```

pub mod curves;
pub mod error;
pub mod market;
pub mod recovery;

pub use curves::{
    CreditCurve, FlatCurve, FlatHazardRateCurve, HazardRateCurve, InterpolatedCurve, YieldCurve,
};
pub use error::MarketDataError;
pub use market::{Market, SharedCreditCurve, SharedYieldCurve, SimpleMarket};
pub use recovery::{resolve_recovery_rate, RecoverySource};
