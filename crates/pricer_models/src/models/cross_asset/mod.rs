//! Cross-asset LGM1F + lognormal FX model and its state process.
//!
//! ## Layout
//!
//! - [`parametrization`]: α/κ for each IR block, σ for each FX block
//! - [`correlation`]: validated block correlation matrix
//! - [`model`]: [`CrossAssetModel`] (IR blocks first, then FX blocks)
//! - [`analytics`]: closed-form step moments
//! - [`state_process`]: Euler and exact discretization with step caches
//! - [`time_grid`]: simulation grid with quantized time lookup
//! - [`path_generator`]: rayon-parallel seeded path simulation

pub mod analytics;
pub mod correlation;
pub mod error;
pub mod model;
pub mod parametrization;
pub mod path_generator;
pub mod state_process;
pub mod time_grid;

pub use correlation::CorrelationMatrix;
pub use error::{CorrelationError, ModelError};
pub use model::{AssetType, CrossAssetModel};
pub use parametrization::{FxBsParametrization, IrLgm1fParametrization, PiecewiseConstant};
pub use path_generator::{MultiPathGenerator, Path};
pub use state_process::{CrossAssetStateProcess, Discretization};
pub use time_grid::TimeGrid;
