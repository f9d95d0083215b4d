//! Curve abstractions for interest rate and credit risk calculations.
//!
//! This module provides:
//! - [`YieldCurve`]: Generic trait for discount factor and rate calculations
//! - [`FlatCurve`]: Constant rate yield curve implementation
//! - [`InterpolatedCurve`]: Pillar-based curve, linear in zero rates
//! - [`CreditCurve`]: Generic trait for hazard rate and survival probability calculations
//! - [`HazardRateCurve`]: Piecewise-constant hazard rate curve
//! - [`FlatHazardRateCurve`]: Constant hazard rate curve

mod credit;
mod flat;
mod interpolated;
mod traits;

pub use credit::{CreditCurve, FlatHazardRateCurve, HazardRateCurve};
pub use flat::FlatCurve;
pub use interpolated::InterpolatedCurve;
pub use traits::YieldCurve;
