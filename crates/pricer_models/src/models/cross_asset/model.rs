//! Cross-asset model: IR blocks followed by FX blocks.
//!
//! For `n` currencies the state vector is
//!
//! ```text
//! [ z_0, z_1, …, z_{n-1}, ln x_0, …, ln x_{n-2} ]
//!   └──── IR (LGM) ────┘  └──── FX (log spot) ───┘
//! ```
//!
//! where currency 0 is the domestic currency and FX block `j` quotes
//! currency `j + 1` in units of currency 0. All index arithmetic in the
//! state process relies on this ordering.

use pricer_core::math::GaussLegendre;
use pricer_core::types::Currency;

use super::correlation::CorrelationMatrix;
use super::error::ModelError;
use super::parametrization::{FxBsParametrization, IrLgm1fParametrization, PiecewiseConstant};

/// Asset class of a factor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// Interest rate (LGM1F)
    IR,
    /// FX (log spot against the domestic currency)
    FX,
}

impl AssetType {
    fn label(self) -> &'static str {
        match self {
            AssetType::IR => "IR",
            AssetType::FX => "FX",
        }
    }
}

/// Joint LGM1F / lognormal FX model.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pricer_core::market_data::FlatCurve;
/// use pricer_core::types::Currency;
/// use pricer_models::models::cross_asset::{
///     AssetType, CorrelationMatrix, CrossAssetModel, FxBsParametrization,
///     IrLgm1fParametrization, PiecewiseConstant,
/// };
///
/// let eur = IrLgm1fParametrization::new(
///     Currency::EUR, Arc::new(FlatCurve::new(0.02)), PiecewiseConstant::constant(0.01), 0.01,
/// ).unwrap();
/// let usd = IrLgm1fParametrization::new(
///     Currency::USD, Arc::new(FlatCurve::new(0.03)), PiecewiseConstant::constant(0.012), 0.02,
/// ).unwrap();
/// let fx_vol = PiecewiseConstant::constant(0.1);
/// let fx = FxBsParametrization::new(Currency::USD, 0.9, fx_vol).unwrap();
///
/// let correlation = CorrelationMatrix::identity(3);
/// let model = CrossAssetModel::new(vec![eur, usd], vec![fx], correlation).unwrap();
/// assert_eq!(model.dimension(), 3);
/// assert_eq!(model.p_idx(AssetType::FX, 0), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CrossAssetModel {
    irs: Vec<IrLgm1fParametrization>,
    fxs: Vec<FxBsParametrization>,
    correlation: CorrelationMatrix,
    breakpoints: Vec<f64>,
    integrator: GaussLegendre,
}

impl CrossAssetModel {
    /// Assemble and validate a model.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InconsistentDimensions`] - no IR block, FX count not
    ///   IR count minus one, FX currency not matching its IR block, or
    ///   correlation not covering every block
    pub fn new(
        irs: Vec<IrLgm1fParametrization>,
        fxs: Vec<FxBsParametrization>,
        correlation: CorrelationMatrix,
    ) -> Result<Self, ModelError> {
        if irs.is_empty() {
            return Err(ModelError::InconsistentDimensions(
                "at least one IR block required".to_string(),
            ));
        }
        if fxs.len() + 1 != irs.len() {
            return Err(ModelError::InconsistentDimensions(format!(
                "{} IR blocks require {} FX blocks, got {}",
                irs.len(),
                irs.len() - 1,
                fxs.len()
            )));
        }
        for (j, fx) in fxs.iter().enumerate() {
            if fx.foreign() != irs[j + 1].currency() {
                return Err(ModelError::InconsistentDimensions(format!(
                    "FX block {} quotes {} but IR block {} is {}",
                    j,
                    fx.foreign(),
                    j + 1,
                    irs[j + 1].currency()
                )));
            }
        }
        let dimension = irs.len() + fxs.len();
        if correlation.dim() != dimension {
            return Err(ModelError::InconsistentDimensions(format!(
                "correlation dimension {} does not match model dimension {}",
                correlation.dim(),
                dimension
            )));
        }
        let mut model = Self {
            irs,
            fxs,
            correlation,
            breakpoints: Vec::new(),
            integrator: GaussLegendre::default(),
        };
        model.update_breakpoints();
        Ok(model)
    }

    fn update_breakpoints(&mut self) {
        let mut times: Vec<f64> = self
            .irs
            .iter()
            .flat_map(|p| p.alpha_function().times().iter().copied())
            .chain(
                self.fxs
                    .iter()
                    .flat_map(|p| p.sigma_function().times().iter().copied()),
            )
            .collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        self.breakpoints = times;
    }

    /// Number of IR blocks.
    pub fn ir_count(&self) -> usize {
        self.irs.len()
    }

    /// Number of FX blocks.
    pub fn fx_count(&self) -> usize {
        self.fxs.len()
    }

    /// State dimension (also the number of Brownian drivers).
    pub fn dimension(&self) -> usize {
        self.irs.len() + self.fxs.len()
    }

    /// Domestic currency.
    pub fn domestic_currency(&self) -> Currency {
        self.irs[0].currency()
    }

    /// IR block `i`, or an error when out of range.
    pub fn try_ir(&self, i: usize) -> Result<&IrLgm1fParametrization, ModelError> {
        self.irs.get(i).ok_or(ModelError::ComponentOutOfRange {
            asset: AssetType::IR.label(),
            index: i,
            count: self.irs.len(),
        })
    }

    /// FX block `j`; error when out of range.
    pub fn try_fx(&self, j: usize) -> Result<&FxBsParametrization, ModelError> {
        self.fxs.get(j).ok_or(ModelError::ComponentOutOfRange {
            asset: AssetType::FX.label(),
            index: j,
            count: self.fxs.len(),
        })
    }

    #[inline]
    pub(crate) fn ir(&self, i: usize) -> &IrLgm1fParametrization {
        &self.irs[i]
    }

    #[inline]
    pub(crate) fn fx(&self, j: usize) -> &FxBsParametrization {
        &self.fxs[j]
    }

    /// Index of a currency's IR block.
    pub fn ccy_index(&self, currency: Currency) -> Option<usize> {
        self.irs.iter().position(|p| p.currency() == currency)
    }

    /// Position of a block in the state vector.
    #[inline]
    pub fn p_idx(&self, asset: AssetType, i: usize) -> usize {
        match asset {
            AssetType::IR => i,
            AssetType::FX => self.irs.len() + i,
        }
    }

    /// Correlation between two blocks.
    #[inline]
    pub fn correlation(&self, a: AssetType, i: usize, b: AssetType, j: usize) -> f64 {
        self.correlation.get(self.p_idx(a, i), self.p_idx(b, j))
    }

    /// IR-IR correlation.
    #[inline]
    pub fn rho_zz(&self, i: usize, j: usize) -> f64 {
        self.correlation(AssetType::IR, i, AssetType::IR, j)
    }

    /// IR-FX correlation.
    #[inline]
    pub fn rho_zx(&self, i: usize, j: usize) -> f64 {
        self.correlation(AssetType::IR, i, AssetType::FX, j)
    }

    /// FX-FX correlation.
    #[inline]
    pub fn rho_xx(&self, i: usize, j: usize) -> f64 {
        self.correlation(AssetType::FX, i, AssetType::FX, j)
    }

    /// Full correlation matrix.
    pub fn correlation_matrix(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Sorted union of all parameter breakpoints.
    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    /// ∫ₐᵇ f, split at parameter breakpoints.
    pub fn integral<F: Fn(f64) -> f64>(&self, a: f64, b: f64, f: F) -> f64 {
        self.integrator.integrate(f, a, b, &self.breakpoints)
    }

    /// Replace the LGM volatility of IR block `i`.
    pub fn set_ir_alpha(&mut self, i: usize, alpha: PiecewiseConstant) -> Result<(), ModelError> {
        let count = self.irs.len();
        self.irs
            .get_mut(i)
            .ok_or(ModelError::ComponentOutOfRange {
                asset: AssetType::IR.label(),
                index: i,
                count,
            })?
            .set_alpha(alpha)?;
        self.update_breakpoints();
        Ok(())
    }

    /// Replace the volatility of FX block `j`.
    pub fn set_fx_sigma(&mut self, j: usize, sigma: PiecewiseConstant) -> Result<(), ModelError> {
        let count = self.fxs.len();
        self.fxs
            .get_mut(j)
            .ok_or(ModelError::ComponentOutOfRange {
                asset: AssetType::FX.label(),
                index: j,
                count,
            })?
            .set_sigma(sigma)?;
        self.update_breakpoints();
        Ok(())
    }
}
