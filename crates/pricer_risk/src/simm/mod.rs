//! SIMM initial margin on simulated sensitivities.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Dynamic SIMM                            │
//! ├────────────────────────────────────────────────────────────┤
//! │  CubeSensitivityStorage - Sensitivities in cube depth slots │
//! │  SimmHelper             - Zero -> par, FX scaling, IM paths │
//! │  StandardSimmAggregator - IR and FX delta, vega, curvature  │
//! └────────────────────────────────────────────────────────────┘
//!          ↓
//!   DimProfile (expected IM per date) -> pricer_xva MVA
//! ```
//!
//! ## Example
//!
//! ```
//! use pricer_risk::simm::fx_delta_for_simm;
//!
//! // ∂V/∂ln(FX) of 1,000 is a SIMM FX delta of 10 whatever the spot
//! assert_eq!(fx_delta_for_simm(1_000.0), 10.0);
//! ```

mod aggregator;
mod error;
mod helper;
mod storage;

pub use aggregator::{
    SimmAggregator, SimmAggregatorConfig, SimmInputs, SimmMargin, StandardSimmAggregator,
};
pub use error::SimmError;
pub use helper::{
    fx_delta_for_simm, par_conversions, InitialMargin, SimmHelper, FX_SCALING, IR_DELTA_SHIFT,
};
pub use storage::{
    CubeSensitivityStorage, CubeSlot, SensitivityStorage, SimmSensitivities, SIMM_TENORS,
};
