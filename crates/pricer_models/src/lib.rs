//! # Pricer Models (L2: Stochastic Models)
//!
//! The cross-asset model and its Monte Carlo state process.
//!
//! This crate provides:
//! - LGM1F interest rate and Black-Scholes FX parametrizations with
//!   piecewise-constant volatilities
//! - A validated correlation matrix across all factor blocks
//! - [`CrossAssetModel`](models::cross_asset::CrossAssetModel): IR blocks
//!   (one per currency, domestic first) followed by FX blocks (one per
//!   foreign currency against the domestic)
//! - Closed-form conditional moments of the joint state
//! - [`CrossAssetStateProcess`](models::cross_asset::CrossAssetStateProcess)
//!   with Euler and exact discretizations and time-grid caches
//! - A seeded, rayon-parallel multi-path generator
//!
//! ## Concurrency
//!
//! ```text
//! ┌──────────────────────────┐   precompute(&mut self, grid)
//! │  CrossAssetStateProcess  │◄── single-threaded, fills caches
//! └────────────┬─────────────┘
//!              │ &self (read-only)
//!   ┌──────────┼──────────┐
//!   ▼          ▼          ▼
//! path 0     path 1 ... path n     rayon workers
//! ```
//!
//! Recalibration goes through `recalibrate(&mut self, ..)`, which flushes the
//! caches; the borrow checker prevents any path worker from observing a
//! half-updated cache.

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod models;
