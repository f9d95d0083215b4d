//! Interpolated yield curve implementation.

use super::YieldCurve;
use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Pillar-based yield curve, linear in continuously compounded zero rates.
///
/// Zero rates are extrapolated flat on both sides of the pillar range, so the
/// curve is defined for every `t >= 0`. This is the curve shape the scenario
/// simulation market builds from zero-rate risk factors.
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, InterpolatedCurve};
///
/// let curve = InterpolatedCurve::<f64>::new(&[1.0, 2.0, 5.0], &[0.02, 0.025, 0.03]).unwrap();
///
/// // Halfway between the 1Y and 2Y pillars
/// let r = curve.zero_rate(1.5).unwrap();
/// assert!((r - 0.0225).abs() < 1e-12);
///
/// // Flat extrapolation
/// assert!((curve.zero_rate(10.0).unwrap() - 0.03).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolatedCurve<T: Float> {
    tenors: Vec<T>,
    rates: Vec<T>,
}

impl<T: Float> InterpolatedCurve<T> {
    /// Construct a curve from pillar times and zero rates.
    ///
    /// # Arguments
    ///
    /// * `tenors` - Pillar times in years, positive and strictly increasing
    /// * `rates` - Zero rates at the pillars
    ///
    /// # Returns
    ///
    /// * `Err(MarketDataError::InsufficientData)` - No pillars, or length mismatch
    /// * `Err(MarketDataError::InvalidMaturity)` - Non-positive pillar
    /// * `Err(MarketDataError::UnsortedPillars)` - Pillars not strictly increasing
    pub fn new(tenors: &[T], rates: &[T]) -> Result<Self, MarketDataError> {
        if tenors.is_empty() {
            return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
        }
        if tenors.len() != rates.len() {
            return Err(MarketDataError::InsufficientData {
                got: rates.len(),
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
            rates: rates.to_vec(),
        })
    }

    /// Pillar times.
    #[inline]
    pub fn tenors(&self) -> &[T] {
        &self.tenors
    }

    /// Zero rates at the pillars.
    #[inline]
    pub fn rates(&self) -> &[T] {
        &self.rates
    }

    /// Interpolated rate and its slope dr/dt at `t`.
    fn rate_and_slope(&self, t: T) -> (T, T) {
        let n = self.tenors.len();
        if t <= self.tenors[0] {
            return (self.rates[0], T::zero());
        }
        if t >= self.tenors[n - 1] {
            return (self.rates[n - 1], T::zero());
        }
        let i = self.tenors.partition_point(|&x| x < t);
        let (t0, t1) = (self.tenors[i - 1], self.tenors[i]);
        let (r0, r1) = (self.rates[i - 1], self.rates[i]);
        let slope = (r1 - r0) / (t1 - t0);
        (r0 + slope * (t - t0), slope)
    }

    fn check_time(t: T) -> Result<(), MarketDataError> {
        if t < T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        Ok(())
    }
}

impl<T: Float> YieldCurve<T> for InterpolatedCurve<T> {
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        Self::check_time(t)?;
        let (r, _) = self.rate_and_slope(t);
        Ok((-r * t).exp())
    }

    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        Self::check_time(t)?;
        Ok(self.rate_and_slope(t).0)
    }

    /// f(t) = r(t) + t r'(t), exact for the piecewise-linear zero curve.
    fn instantaneous_forward(&self, t: T) -> Result<T, MarketDataError> {
        Self::check_time(t)?;
        let (r, slope) = self.rate_and_slope(t);
        Ok(r + t * slope)
    }
}
