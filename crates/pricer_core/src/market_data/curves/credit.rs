//! Credit curve abstractions for credit risk calculations.
//!
//! This module provides:
//! - [`CreditCurve`]: Generic trait for hazard rate and survival probability calculations
//! - [`HazardRateCurve`]: Piecewise-constant hazard rate curve
//! - [`FlatHazardRateCurve`]: Constant hazard rate curve

use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Generic credit curve trait for hazard rate and survival probability calculations.
///
/// # Contract
///
/// - `hazard_rate(t)` returns the instantaneous hazard rate λ(t) at time t
/// - `survival_probability(t)` returns P(τ > t) = exp(-∫₀ᵗ λ(s)ds)
/// - `default_probability(t)` returns P(τ ≤ t) = 1 - P(τ > t)
///
/// # Invariants
///
/// - λ(t) ≥ 0 for all t ≥ 0 (hazard rates are non-negative)
/// - P(τ > 0) = 1 (survival probability at time 0 is 1)
/// - P(τ > t) ≤ P(τ > s) for t ≥ s (survival probability is non-increasing)
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{CreditCurve, HazardRateCurve};
///
/// let curve = HazardRateCurve::new(&[1.0_f64, 2.0, 5.0], &[0.01, 0.012, 0.015]).unwrap();
///
/// let surv = curve.survival_probability(1.0).unwrap();
/// assert!((surv - (-0.01_f64).exp()).abs() < 1e-14);
/// ```
pub trait CreditCurve<T: Float> {
    /// Return the instantaneous hazard rate at time `t`.
    ///
    /// # Returns
    ///
    /// * `Ok(λ(t))` - Hazard rate at time t
    /// * `Err(MarketDataError::InvalidMaturity)` - If t < 0
    fn hazard_rate(&self, t: T) -> Result<T, MarketDataError>;

    /// Return the survival probability P(τ > t).
    ///
    /// # Returns
    ///
    /// * `Ok(P(τ > t))` - Survival probability at time t
    /// * `Err(MarketDataError::InvalidMaturity)` - If t < 0
    fn survival_probability(&self, t: T) -> Result<T, MarketDataError>;

    /// Return the default probability P(τ ≤ t).
    ///
    /// # Default Implementation
    ///
    /// ```text
    /// P(τ ≤ t) = 1 - P(τ > t)
    /// ```
    fn default_probability(&self, t: T) -> Result<T, MarketDataError> {
        Ok(T::one() - self.survival_probability(t)?)
    }
}

/// Piecewise-constant hazard rate curve.
///
/// Hazard rate λᵢ applies on (tᵢ₋₁, tᵢ] with t₋₁ = 0; the last rate is
/// extended flat beyond the final pillar.
///
/// ```text
/// P(τ > t) = exp(-Σ λᵢ Δtᵢ)
/// ```
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{CreditCurve, HazardRateCurve};
///
/// let curve = HazardRateCurve::new(&[1.0_f64, 3.0], &[0.01, 0.02]).unwrap();
///
/// // 1y at 1% then 1y at 2%
/// let surv = curve.survival_probability(2.0).unwrap();
/// assert!((surv - (-0.03_f64).exp()).abs() < 1e-14);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HazardRateCurve<T: Float> {
    tenors: Vec<T>,
    hazard_rates: Vec<T>,
}

impl<T: Float> HazardRateCurve<T> {
    /// Construct a hazard rate curve from pillar points.
    ///
    /// # Returns
    ///
    /// * `Err(MarketDataError::InsufficientData)` - No pillars, or length mismatch
    /// * `Err(MarketDataError::InvalidMaturity)` - Non-positive pillar
    /// * `Err(MarketDataError::UnsortedPillars)` - Pillars not strictly increasing
    pub fn new(tenors: &[T], hazard_rates: &[T]) -> Result<Self, MarketDataError> {
        if tenors.is_empty() {
            return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
        }
        if tenors.len() != hazard_rates.len() {
            return Err(MarketDataError::InsufficientData {
                got: hazard_rates.len(),
                need: tenors.len(),
            });
        }
        if tenors[0] <= T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: tenors[0].to_f64().unwrap_or(0.0),
            });
        }
        if let Some(index) = (1..tenors.len()).find(|&i| tenors[i] <= tenors[i - 1]) {
            return Err(MarketDataError::UnsortedPillars { index });
        }
        Ok(Self {
            tenors: tenors.to_vec(),
            hazard_rates: hazard_rates.to_vec(),
        })
    }

    /// Pillar times.
    #[inline]
    pub fn tenors(&self) -> &[T] {
        &self.tenors
    }

    /// Hazard rates per pillar segment.
    #[inline]
    pub fn hazard_rates(&self) -> &[T] {
        &self.hazard_rates
    }

    /// Number of pillars.
    #[inline]
    pub fn len(&self) -> usize {
        self.tenors.len()
    }

    /// Whether the curve has no pillars (never true for a constructed curve).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tenors.is_empty()
    }

    fn integrated_hazard(&self, t: T) -> T {
        let mut integral = T::zero();
        let mut prev = T::zero();
        for (&ti, &li) in self.tenors.iter().zip(&self.hazard_rates) {
            if t <= ti {
                return integral + li * (t - prev);
            }
            integral = integral + li * (ti - prev);
            prev = ti;
        }
        let last = self.hazard_rates[self.hazard_rates.len() - 1];
        integral + last * (t - prev)
    }
}

impl<T: Float> CreditCurve<T> for HazardRateCurve<T> {
    fn hazard_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        let i = self
            .tenors
            .partition_point(|&x| x < t)
            .min(self.tenors.len() - 1);
        Ok(self.hazard_rates[i])
    }

    fn survival_probability(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok((-self.integrated_hazard(t)).exp())
    }
}

/// A flat (constant) hazard rate curve.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{CreditCurve, FlatHazardRateCurve};
///
/// let curve = FlatHazardRateCurve::new(0.01_f64);
/// let surv = curve.survival_probability(5.0).unwrap();
/// assert!((surv - (-0.05_f64).exp()).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatHazardRateCurve<T: Float> {
    hazard_rate: T,
}

impl<T: Float> FlatHazardRateCurve<T> {
    /// Construct a flat hazard rate curve.
    #[inline]
    pub fn new(hazard_rate: T) -> Self {
        Self { hazard_rate }
    }

    /// Return the constant hazard rate.
    #[inline]
    pub fn rate(&self) -> T {
        self.hazard_rate
    }
}

impl<T: Float> CreditCurve<T> for FlatHazardRateCurve<T> {
    fn hazard_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok(self.hazard_rate)
    }

    fn survival_probability(&self, t: T) -> Result<T, MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok((-self.hazard_rate * t).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ========================================
    // HazardRateCurve Tests
    // ========================================

    #[test]
    fn test_survival_at_zero_is_one() {
        let curve = HazardRateCurve::new(&[1.0, 5.0], &[0.01, 0.02]).unwrap();
        assert_eq!(curve.survival_probability(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_piecewise_integration() {
        let curve = HazardRateCurve::new(&[1.0, 5.0], &[0.01, 0.02]).unwrap();
        // 0.01 * 1 + 0.02 * 4 + 0.02 * 2 (flat beyond last pillar)
        let expected = (-(0.01 + 0.08 + 0.04_f64)).exp();
        assert_relative_eq!(curve.survival_probability(7.0).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_hazard_rate_lookup() {
        let curve = HazardRateCurve::new(&[1.0, 5.0], &[0.01, 0.02]).unwrap();
        assert_eq!(curve.hazard_rate(0.5).unwrap(), 0.01);
        assert_eq!(curve.hazard_rate(1.0).unwrap(), 0.01);
        assert_eq!(curve.hazard_rate(3.0).unwrap(), 0.02);
        assert_eq!(curve.hazard_rate(20.0).unwrap(), 0.02);
    }

    #[test]
    fn test_survival_is_non_increasing() {
        let curve = HazardRateCurve::new(&[0.5, 2.0, 10.0], &[0.03, 0.0, 0.05]).unwrap();
        let mut prev = 1.0;
        for i in 1..100 {
            let s = curve.survival_probability(i as f64 * 0.15).unwrap();
            assert!(s <= prev + 1e-15);
            prev = s;
        }
    }

    #[test]
    fn test_default_probability_complement() {
        let curve = HazardRateCurve::new(&[2.0], &[0.04]).unwrap();
        let s = curve.survival_probability(3.0).unwrap();
        assert_relative_eq!(curve.default_probability(3.0).unwrap(), 1.0 - s, epsilon = 1e-15);
    }

    #[test]
    fn test_negative_time_rejected() {
        let curve = HazardRateCurve::new(&[2.0], &[0.04]).unwrap();
        assert!(curve.survival_probability(-1.0).is_err());
        assert!(curve.hazard_rate(-1.0).is_err());
    }

    // ========================================
    // FlatHazardRateCurve Tests
    // ========================================

    #[test]
    fn test_flat_matches_single_pillar() {
        let flat = FlatHazardRateCurve::new(0.015_f64);
        let piecewise = HazardRateCurve::new(&[1.0], &[0.015]).unwrap();
        for t in [0.0, 0.3, 1.0, 4.5] {
            assert_relative_eq!(
                flat.survival_probability(t).unwrap(),
                piecewise.survival_probability(t).unwrap(),
                epsilon = 1e-15
            );
        }
    }
}
