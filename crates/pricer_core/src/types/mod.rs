//! Core currency, time and error types.
//!
//! This module provides:
//! - `currency`: ISO 4217 currency codes with metadata
//! - `registry`: Explicitly constructed, frozen currency registry
//! - `time`: Day count conventions for year fraction calculations
//! - `error`: Structured error types for currency parsing
//!
//! # Re-exports
//!
//! - [`Currency`] from `currency`
//! - [`CurrencyRegistry`], [`CurrencyRegistryBuilder`] from `registry`
//! - [`DayCountConvention`] from `time`
//! - [`CurrencyError`] from `error`

pub mod currency;
pub mod error;
pub mod registry;
pub mod time;

pub use currency::Currency;
pub use error::CurrencyError;
pub use registry::{CurrencyRegistry, CurrencyRegistryBuilder};
pub use time::DayCountConvention;
