//! Par sensitivities and zero/par conversion.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Par Sensitivities                        │
//! ├────────────────────────────────────────────────────────────┤
//! │  ParInstrument           - Deposit, swap, CDS par rates     │
//! │  ParSensitivityConfig    - Shift sizes, disabled types      │
//! │  ParSensitivityAnalysis  - Bump zero factors, reprice par   │
//! │  ParSensitivityConverter - (Jᵀ)⁻¹ zero -> par sensitivities │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Jacobian computed here also drives the par stress conversion in
//! [`crate::stress`] and the per-currency par conversion used for SIMM in
//! [`crate::simm`].

mod analysis;
mod config;
mod converter;
mod error;
mod instruments;

pub use analysis::{ParSensitivities, ParSensitivityAnalysis, MIN_CREDIT_DIAGONAL};
pub use config::{ParSensitivityConfig, ShiftData};
pub use converter::ParSensitivityConverter;
pub use error::ParSensitivityError;
pub use instruments::{ParCds, ParDeposit, ParInstrument, ParSwap};
