//! Component parametrizations of the cross-asset model.
//!
//! - [`PiecewiseConstant`]: step function of time used for volatilities
//! - [`IrLgm1fParametrization`]: one-factor LGM for a single currency,
//!   piecewise-constant α and constant mean reversion κ
//! - [`FxBsParametrization`]: lognormal FX rate of a foreign currency against
//!   the domestic currency with piecewise-constant σ

use std::fmt;

use pricer_core::market_data::{SharedYieldCurve, YieldCurve};
use pricer_core::types::Currency;

use super::error::ModelError;

/// Mean reversion below this is treated as zero (H(t) = t).
const KAPPA_CUTOFF: f64 = 1e-6;

/// Right-continuous step function.
///
/// With breakpoints `t₀ < t₁ < … < tₙ₋₁` and values `v₀ … vₙ`, the function
/// equals `vᵢ` on `[tᵢ₋₁, tᵢ)`, `v₀` before `t₀` and `vₙ` from `tₙ₋₁` on.
///
/// # Example
///
/// ```
/// use pricer_models::models::cross_asset::PiecewiseConstant;
///
/// let f = PiecewiseConstant::new(vec![1.0], vec![0.01, 0.02]).unwrap();
/// assert_eq!(f.value(0.5), 0.01);
/// assert_eq!(f.value(1.0), 0.02);
/// assert!((f.integral_of_square(0.0, 2.0) - (1e-4 + 4e-4)).abs() < 1e-18);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PiecewiseConstant {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl PiecewiseConstant {
    /// Build a step function; `values.len()` must be `times.len() + 1` and
    /// `times` positive and strictly increasing.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, ModelError> {
        if values.len() != times.len() + 1 {
            return Err(ModelError::InvalidParameter(format!(
                "piecewise constant needs {} values for {} times, got {}",
                times.len() + 1,
                times.len(),
                values.len()
            )));
        }
        if times.first().is_some_and(|&t| t <= 0.0)
            || times.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(ModelError::InvalidParameter(
                "piecewise constant times must be positive and strictly increasing".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidParameter(
                "piecewise constant values must be finite".to_string(),
            ));
        }
        Ok(Self { times, values })
    }

    /// Constant function.
    pub fn constant(value: f64) -> Self {
        Self {
            times: Vec::new(),
            values: vec![value],
        }
    }

    /// Breakpoint times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Step values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `t`.
    #[inline]
    pub fn value(&self, t: f64) -> f64 {
        self.values[self.times.partition_point(|&x| x <= t)]
    }

    /// ∫ₐᵇ f(s)² ds, exact.
    pub fn integral_of_square(&self, a: f64, b: f64) -> f64 {
        if b < a {
            return -self.integral_of_square(b, a);
        }
        let mut total = 0.0;
        let mut lo = a;
        for (i, &t) in self.times.iter().enumerate() {
            if t <= lo {
                continue;
            }
            if t >= b {
                break;
            }
            total += self.values[i] * self.values[i] * (t - lo);
            lo = t;
        }
        let v = self.value(lo);
        total + v * v * (b - lo)
    }
}

/// One-factor LGM parametrization for a single currency.
///
/// ```text
/// dz(t) = α(t) dW(t)
/// H(t)  = (1 - e^{-κt}) / κ      (t when κ → 0)
/// H'(t) = e^{-κt}
/// ζ(t)  = ∫₀ᵗ α(s)² ds
/// ```
#[derive(Clone)]
pub struct IrLgm1fParametrization {
    currency: Currency,
    curve: SharedYieldCurve,
    alpha: PiecewiseConstant,
    kappa: f64,
}

impl fmt::Debug for IrLgm1fParametrization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrLgm1fParametrization")
            .field("currency", &self.currency)
            .field("alpha", &self.alpha)
            .field("kappa", &self.kappa)
            .finish_non_exhaustive()
    }
}

impl IrLgm1fParametrization {
    /// Create a parametrization on today's curve for `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] for negative α or non-finite κ.
    pub fn new(
        currency: Currency,
        curve: SharedYieldCurve,
        alpha: PiecewiseConstant,
        kappa: f64,
    ) -> Result<Self, ModelError> {
        if alpha.values().iter().any(|&a| a < 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "LGM alpha for {} must be non-negative",
                currency
            )));
        }
        if !kappa.is_finite() {
            return Err(ModelError::InvalidParameter(format!(
                "LGM kappa for {} must be finite",
                currency
            )));
        }
        Ok(Self {
            currency,
            curve,
            alpha,
            kappa,
        })
    }

    /// Currency of this block.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Today's discount curve.
    pub fn curve(&self) -> &SharedYieldCurve {
        &self.curve
    }

    /// Volatility step function.
    pub fn alpha_function(&self) -> &PiecewiseConstant {
        &self.alpha
    }

    /// Mean reversion.
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Replace α (recalibration).
    pub fn set_alpha(&mut self, alpha: PiecewiseConstant) -> Result<(), ModelError> {
        if alpha.values().iter().any(|&a| a < 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "LGM alpha for {} must be non-negative",
                self.currency
            )));
        }
        self.alpha = alpha;
        Ok(())
    }

    /// α(t).
    #[inline]
    pub fn alpha(&self, t: f64) -> f64 {
        self.alpha.value(t)
    }

    /// H(t).
    #[inline]
    pub fn h(&self, t: f64) -> f64 {
        if self.kappa.abs() < KAPPA_CUTOFF {
            t
        } else {
            (1.0 - (-self.kappa * t).exp()) / self.kappa
        }
    }

    /// H'(t).
    #[inline]
    pub fn h_prime(&self, t: f64) -> f64 {
        if self.kappa.abs() < KAPPA_CUTOFF {
            1.0
        } else {
            (-self.kappa * t).exp()
        }
    }

    /// ζ(t) = ∫₀ᵗ α².
    #[inline]
    pub fn zeta(&self, t: f64) -> f64 {
        self.alpha.integral_of_square(0.0, t)
    }

    /// Discount factor from today's curve.
    pub fn discount(&self, t: f64) -> Result<f64, ModelError> {
        Ok(self.curve.discount_factor(t)?)
    }

    /// Instantaneous forward rate from today's curve.
    pub fn instantaneous_forward(&self, t: f64) -> Result<f64, ModelError> {
        Ok(self.curve.instantaneous_forward(t)?)
    }
}

/// Lognormal FX parametrization for one foreign currency.
///
/// The spot is quoted as units of domestic currency per unit of foreign.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FxBsParametrization {
    foreign: Currency,
    spot: f64,
    sigma: PiecewiseConstant,
}

impl FxBsParametrization {
    /// Create a parametrization; the spot must be positive and σ non-negative.
    pub fn new(foreign: Currency, spot: f64, sigma: PiecewiseConstant) -> Result<Self, ModelError> {
        if spot <= 0.0 || !spot.is_finite() {
            return Err(ModelError::InvalidParameter(format!(
                "FX spot for {} must be positive, got {}",
                foreign, spot
            )));
        }
        if sigma.values().iter().any(|&s| s < 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "FX sigma for {} must be non-negative",
                foreign
            )));
        }
        Ok(Self {
            foreign,
            spot,
            sigma,
        })
    }

    /// Foreign currency.
    pub fn foreign(&self) -> Currency {
        self.foreign
    }

    /// Spot FX today.
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Volatility step function.
    pub fn sigma_function(&self) -> &PiecewiseConstant {
        &self.sigma
    }

    /// Replace σ (recalibration).
    pub fn set_sigma(&mut self, sigma: PiecewiseConstant) -> Result<(), ModelError> {
        if sigma.values().iter().any(|&s| s < 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "FX sigma for {} must be non-negative",
                self.foreign
            )));
        }
        self.sigma = sigma;
        Ok(())
    }

    /// σ(t).
    #[inline]
    pub fn sigma(&self, t: f64) -> f64 {
        self.sigma.value(t)
    }

    /// ∫₀ᵗ σ².
    #[inline]
    pub fn variance(&self, t: f64) -> f64 {
        self.sigma.integral_of_square(0.0, t)
    }
}
