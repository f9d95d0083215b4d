//! Stochastic models for Monte Carlo exposure simulation.
//!
//! - [`cross_asset`]: LGM1F rates plus lognormal FX, joint state process

pub mod cross_asset;
