//! Read-only market interface.
//!
//! Sensitivity and XVA components only ever read curves, spots and recovery
//! rates through [`Market`]; they never build curves themselves. Lookups
//! return `Option` and the `required_*` helpers turn an absent entry into
//! the matching [`MarketDataError`].

use std::collections::HashMap;
use std::sync::Arc;

use super::curves::{CreditCurve, YieldCurve};
use super::error::MarketDataError;

/// Shared handle to a yield curve.
pub type SharedYieldCurve = Arc<dyn YieldCurve<f64> + Send + Sync>;

/// Shared handle to a credit curve.
pub type SharedCreditCurve = Arc<dyn CreditCurve<f64> + Send + Sync>;

/// Read-only market data accessors.
///
/// Implementations must be safe to share across worker threads; all
/// parallel phases read the market through `&self`.
pub trait Market: Send + Sync {
    /// Discount curve for a currency code.
    fn discount_curve(&self, currency: &str) -> Option<&(dyn YieldCurve<f64> + Send + Sync)>;

    /// Forwarding or other named yield curve.
    fn yield_curve(&self, name: &str) -> Option<&(dyn YieldCurve<f64> + Send + Sync)>;

    /// Default (survival) curve for a credit name.
    fn default_curve(&self, name: &str) -> Option<&(dyn CreditCurve<f64> + Send + Sync)>;

    /// Curve-level recovery rate for a credit name.
    fn recovery_rate(&self, name: &str) -> Option<f64>;

    /// Recovery rate quoted for a specific security.
    fn security_recovery_rate(&self, _security_id: &str) -> Option<f64> {
        None
    }

    /// FX spot for a six-letter pair, units of the second currency per
    /// unit of the first.
    fn fx_spot(&self, pair: &str) -> Option<f64>;

    /// Discount curve, or [`MarketDataError::MissingDiscountCurve`].
    fn required_discount_curve(
        &self,
        currency: &str,
    ) -> Result<&(dyn YieldCurve<f64> + Send + Sync), MarketDataError> {
        self.discount_curve(currency)
            .ok_or_else(|| MarketDataError::MissingDiscountCurve {
                currency: currency.to_string(),
            })
    }

    /// Named yield curve, or [`MarketDataError::MissingYieldCurve`].
    fn required_yield_curve(
        &self,
        name: &str,
    ) -> Result<&(dyn YieldCurve<f64> + Send + Sync), MarketDataError> {
        self.yield_curve(name)
            .ok_or_else(|| MarketDataError::MissingYieldCurve {
                name: name.to_string(),
            })
    }

    /// Default curve, or [`MarketDataError::MissingDefaultCurve`].
    fn required_default_curve(
        &self,
        name: &str,
    ) -> Result<&(dyn CreditCurve<f64> + Send + Sync), MarketDataError> {
        self.default_curve(name)
            .ok_or_else(|| MarketDataError::MissingDefaultCurve {
                name: name.to_string(),
            })
    }

    /// FX spot, or [`MarketDataError::MissingFxSpot`].
    fn required_fx_spot(&self, pair: &str) -> Result<f64, MarketDataError> {
        self.fx_spot(pair).ok_or_else(|| MarketDataError::MissingFxSpot {
            pair: pair.to_string(),
        })
    }
}

/// In-memory market assembled from pre-built curves.
///
/// FX lookups fall back to the inverse quote, and a pair of identical
/// currencies has spot 1.
#[derive(Clone, Default)]
pub struct SimpleMarket {
    discount_curves: HashMap<String, SharedYieldCurve>,
    yield_curves: HashMap<String, SharedYieldCurve>,
    default_curves: HashMap<String, SharedCreditCurve>,
    recovery_rates: HashMap<String, f64>,
    security_recovery_rates: HashMap<String, f64>,
    fx_spots: HashMap<String, f64>,
}

impl SimpleMarket {
    /// Create an empty market.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a discount curve for a currency.
    pub fn with_discount_curve<C>(mut self, currency: &str, curve: C) -> Self
    where
        C: YieldCurve<f64> + Send + Sync + 'static,
    {
        self.discount_curves
            .insert(currency.to_string(), Arc::new(curve));
        self
    }

    /// Add a named yield curve.
    pub fn with_yield_curve<C>(mut self, name: &str, curve: C) -> Self
    where
        C: YieldCurve<f64> + Send + Sync + 'static,
    {
        self.yield_curves.insert(name.to_string(), Arc::new(curve));
        self
    }

    /// Add a default curve for a credit name.
    pub fn with_default_curve<C>(mut self, name: &str, curve: C) -> Self
    where
        C: CreditCurve<f64> + Send + Sync + 'static,
    {
        self.default_curves.insert(name.to_string(), Arc::new(curve));
        self
    }

    /// Add a curve-level recovery rate.
    pub fn with_recovery_rate(mut self, name: &str, rate: f64) -> Self {
        self.recovery_rates.insert(name.to_string(), rate);
        self
    }

    /// Add a security-specific recovery rate.
    pub fn with_security_recovery_rate(mut self, security_id: &str, rate: f64) -> Self {
        self.security_recovery_rates
            .insert(security_id.to_string(), rate);
        self
    }

    /// Add an FX spot quote.
    pub fn with_fx_spot(mut self, pair: &str, spot: f64) -> Self {
        self.fx_spots.insert(pair.to_string(), spot);
        self
    }

    /// Shared handle to a discount curve, for components that keep curves
    /// beyond the lifetime of the market borrow.
    pub fn shared_discount_curve(&self, currency: &str) -> Option<SharedYieldCurve> {
        self.discount_curves.get(currency).cloned()
    }
}

impl Market for SimpleMarket {
    fn discount_curve(&self, currency: &str) -> Option<&(dyn YieldCurve<f64> + Send + Sync)> {
        self.discount_curves.get(currency).map(|c| c.as_ref())
    }

    fn yield_curve(&self, name: &str) -> Option<&(dyn YieldCurve<f64> + Send + Sync)> {
        self.yield_curves.get(name).map(|c| c.as_ref())
    }

    fn default_curve(&self, name: &str) -> Option<&(dyn CreditCurve<f64> + Send + Sync)> {
        self.default_curves.get(name).map(|c| c.as_ref())
    }

    fn recovery_rate(&self, name: &str) -> Option<f64> {
        self.recovery_rates.get(name).copied()
    }

    fn security_recovery_rate(&self, security_id: &str) -> Option<f64> {
        self.security_recovery_rates.get(security_id).copied()
    }

    fn fx_spot(&self, pair: &str) -> Option<f64> {
        if let Some(&spot) = self.fx_spots.get(pair) {
            return Some(spot);
        }
        if pair.len() != 6 || !pair.is_ascii() {
            return None;
        }
        let (foreign, domestic) = pair.split_at(3);
        if foreign == domestic {
            return Some(1.0);
        }
        self.fx_spots
            .get(&format!("{}{}", domestic, foreign))
            .filter(|s| **s != 0.0)
            .map(|s| 1.0 / s)
    }
}
