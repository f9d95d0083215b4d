//! # pricer_core: Foundation Layer for Cross-Asset Risk
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the workspace, providing:
//! - Currency types and an injected, frozen currency registry (`types`)
//! - Day count conventions (`types::time`)
//! - Yield and credit curve traits with flat and interpolated implementations
//!   (`market_data::curves`)
//! - The read-only [`Market`](market_data::Market) interface consumed by the
//!   sensitivity and XVA layers, including the recovery rate fallback chain
//! - Matrix utilities: eigenvalue PSD checks and salvaging square roots
//!   (`math::matrix`)
//! - Adaptive numerical integration for piecewise-constant model parameters
//!   (`math::integration`)
//!
//! ## Dependencies
//!
//! Layer 1 has no dependencies on other pricer_* crates:
//! - num-traits: Traits for generic numerical computation
//! - nalgebra: Dense linear algebra (eigen decomposition, inversion)
//! - chrono: Date arithmetic
//! - thiserror: Structured error types
//! - tracing: Structured logging of fallbacks and repairs
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
//! use pricer_core::types::{Currency, CurrencyRegistry};
//!
//! let registry = CurrencyRegistry::standard();
//! let eur = registry.parse("eur").unwrap();
//! assert_eq!(eur, Currency::EUR);
//!
//! let curve = FlatCurve::new(0.02_f64);
//! let df = curve.discount_factor(5.0).unwrap();
//! assert!((df - (-0.1_f64).exp()).abs() < 1e-14);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for currencies, day counts and curves

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;
