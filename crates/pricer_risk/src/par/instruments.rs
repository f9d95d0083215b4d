//! Calibrating par instruments.
//!
//! Each par risk factor is represented by one instrument whose fair rate
//! is the par rate. The instruments are priced off curves read through
//! [`Market`], so repricing under a [`ScenarioMarket`] gives the par rate
//! in that scenario.
//!
//! | Instrument   | Key types                              | Fair rate                      |
//! |--------------|----------------------------------------|--------------------------------|
//! | [`ParDeposit`] | discount, yield, index curves        | `(1/P(T) - 1) / T`             |
//! | [`ParSwap`]    | discount, yield, index curves        | float leg PV / fixed annuity   |
//! | [`ParCds`]     | survival probability                 | protection PV / premium RPV01  |
//!
//! [`ScenarioMarket`]: crate::scenarios::ScenarioMarket

use pricer_core::market_data::{
    resolve_recovery_rate, Market, MarketDataError, RecoverySource, YieldCurve,
};

use super::error::ParSensitivityError;
use crate::scenarios::{KeyType, RiskFactorKey};

/// A calibrating instrument for one par risk factor.
pub trait ParInstrument: Send + Sync {
    /// Par key the instrument calibrates.
    fn key(&self) -> &RiskFactorKey;

    /// Maturity in years, the natural pillar of the key.
    fn maturity(&self) -> f64;

    /// Fair par rate under `market`.
    ///
    /// # Errors
    ///
    /// [`MarketDataError`] if a curve or recovery rate the instrument needs
    /// is missing.
    fn fair_rate(&self, market: &dyn Market) -> Result<f64, MarketDataError>;
}

fn projection_curve<'m>(
    market: &'m dyn Market,
    key: &RiskFactorKey,
) -> Result<&'m (dyn YieldCurve<f64> + Send + Sync), MarketDataError> {
    match key.key_type {
        KeyType::DiscountCurve => market.required_discount_curve(&key.name),
        _ => market.required_yield_curve(&key.name),
    }
}

fn check_maturity(key: &RiskFactorKey, maturity: f64) -> Result<(), ParSensitivityError> {
    if maturity > 0.0 && maturity.is_finite() {
        Ok(())
    } else {
        Err(ParSensitivityError::InvalidInstrument {
            key: key.to_string(),
            reason: format!("maturity {} must be positive", maturity),
        })
    }
}

fn check_frequency(key: &RiskFactorKey, frequency: u32) -> Result<(), ParSensitivityError> {
    if frequency == 0 {
        return Err(ParSensitivityError::InvalidInstrument {
            key: key.to_string(),
            reason: "payment frequency must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn check_rate_curve(
    instrument: &'static str,
    key: &RiskFactorKey,
) -> Result<(), ParSensitivityError> {
    match key.key_type {
        KeyType::DiscountCurve | KeyType::YieldCurve | KeyType::IndexCurve => Ok(()),
        key_type => Err(ParSensitivityError::UnsupportedKeyType {
            instrument,
            key_type,
        }),
    }
}

/// Regular schedule of `(start, end)` periods ending at `maturity`.
fn periods(maturity: f64, frequency: u32) -> Vec<(f64, f64)> {
    let n = ((maturity * frequency as f64).round() as usize).max(1);
    let tau = maturity / n as f64;
    (0..n)
        .map(|i| {
            let end = if i + 1 == n { maturity } else { (i + 1) as f64 * tau };
            (i as f64 * tau, end)
        })
        .collect()
}

/// Zero-coupon deposit.
///
/// # Examples
///
/// ```rust
/// use pricer_core::market_data::{FlatCurve, SimpleMarket};
/// use pricer_risk::par::{ParDeposit, ParInstrument};
/// use pricer_risk::scenarios::RiskFactorKey;
///
/// let market = SimpleMarket::new().with_discount_curve("EUR", FlatCurve::new(0.02));
/// let deposit = ParDeposit::new(RiskFactorKey::discount("EUR", 0), 0.5).unwrap();
///
/// let expected = ((0.01_f64).exp() - 1.0) / 0.5;
/// assert!((deposit.fair_rate(&market).unwrap() - expected).abs() < 1e-14);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParDeposit {
    key: RiskFactorKey,
    maturity: f64,
}

impl ParDeposit {
    /// Deposit maturing at `maturity` years on the key's curve.
    ///
    /// # Errors
    ///
    /// * [`ParSensitivityError::UnsupportedKeyType`] - Not a rate curve key
    /// * [`ParSensitivityError::InvalidInstrument`] - Non-positive maturity
    pub fn new(key: RiskFactorKey, maturity: f64) -> Result<Self, ParSensitivityError> {
        check_rate_curve("ParDeposit", &key)?;
        check_maturity(&key, maturity)?;
        Ok(Self { key, maturity })
    }
}

impl ParInstrument for ParDeposit {
    fn key(&self) -> &RiskFactorKey {
        &self.key
    }

    fn maturity(&self) -> f64 {
        self.maturity
    }

    fn fair_rate(&self, market: &dyn Market) -> Result<f64, MarketDataError> {
        let df = projection_curve(market, &self.key)?.discount_factor(self.maturity)?;
        Ok((1.0 / df - 1.0) / self.maturity)
    }
}

/// Fixed-for-floating swap.
///
/// The floating leg projects forwards off the key's curve and both legs
/// discount on the discount curve of `discount_currency`. When the key is
/// that discount curve the fair rate reduces to `(1 - P(T)) / A`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParSwap {
    key: RiskFactorKey,
    discount_currency: String,
    maturity: f64,
    fixed_frequency: u32,
    float_frequency: u32,
}

impl ParSwap {
    /// Swap with the given payment frequencies per year.
    ///
    /// # Errors
    ///
    /// * [`ParSensitivityError::UnsupportedKeyType`] - Not a rate curve key
    /// * [`ParSensitivityError::InvalidInstrument`] - Non-positive maturity
    ///   or zero frequency
    pub fn new(
        key: RiskFactorKey,
        discount_currency: &str,
        maturity: f64,
        fixed_frequency: u32,
        float_frequency: u32,
    ) -> Result<Self, ParSensitivityError> {
        check_rate_curve("ParSwap", &key)?;
        check_maturity(&key, maturity)?;
        check_frequency(&key, fixed_frequency)?;
        check_frequency(&key, float_frequency)?;
        Ok(Self {
            key,
            discount_currency: discount_currency.to_string(),
            maturity,
            fixed_frequency,
            float_frequency,
        })
    }

    /// Fixed leg annuity `Σ τᵢ P(tᵢ)`.
    pub fn annuity(&self, market: &dyn Market) -> Result<f64, MarketDataError> {
        let discount = market.required_discount_curve(&self.discount_currency)?;
        periods(self.maturity, self.fixed_frequency)
            .into_iter()
            .try_fold(0.0, |acc, (s, e)| Ok(acc + (e - s) * discount.discount_factor(e)?))
    }
}

impl ParInstrument for ParSwap {
    fn key(&self) -> &RiskFactorKey {
        &self.key
    }

    fn maturity(&self) -> f64 {
        self.maturity
    }

    fn fair_rate(&self, market: &dyn Market) -> Result<f64, MarketDataError> {
        let discount = market.required_discount_curve(&self.discount_currency)?;
        let projection = projection_curve(market, &self.key)?;
        let mut float_leg = 0.0;
        for (s, e) in periods(self.maturity, self.float_frequency) {
            let forward = if s == 0.0 {
                1.0 / projection.discount_factor(e)?
            } else {
                projection.discount_factor(s)? / projection.discount_factor(e)?
            };
            float_leg += (forward - 1.0) * discount.discount_factor(e)?;
        }
        Ok(float_leg / self.annuity(market)?)
    }
}

/// Credit default swap quoted by its par spread.
///
/// Premiums accrue to the middle of each period; protection pays at the
/// end of the period of default.
#[derive(Debug, Clone, PartialEq)]
pub struct ParCds {
    key: RiskFactorKey,
    discount_currency: String,
    maturity: f64,
    frequency: u32,
    security_id: Option<String>,
}

impl ParCds {
    /// CDS on the key's credit name with `frequency` premiums per year.
    ///
    /// # Errors
    ///
    /// * [`ParSensitivityError::UnsupportedKeyType`] - Not a survival key
    /// * [`ParSensitivityError::InvalidInstrument`] - Non-positive maturity
    ///   or zero frequency
    pub fn new(
        key: RiskFactorKey,
        discount_currency: &str,
        maturity: f64,
        frequency: u32,
    ) -> Result<Self, ParSensitivityError> {
        if key.key_type != KeyType::SurvivalProbability {
            return Err(ParSensitivityError::UnsupportedKeyType {
                instrument: "ParCds",
                key_type: key.key_type,
            });
        }
        check_maturity(&key, maturity)?;
        check_frequency(&key, frequency)?;
        Ok(Self {
            key,
            discount_currency: discount_currency.to_string(),
            maturity,
            frequency,
            security_id: None,
        })
    }

    /// Prefer the recovery rate quoted for a reference security, falling
    /// back to the credit curve's recovery.
    pub fn with_security(mut self, security_id: &str) -> Self {
        self.security_id = Some(security_id.to_string());
        self
    }

    /// Recovery candidates in lookup order.
    pub fn recovery_chain(&self) -> Vec<RecoverySource> {
        self.security_id
            .iter()
            .map(|id| RecoverySource::Security(id.clone()))
            .chain(std::iter::once(RecoverySource::CreditCurve(self.key.name.clone())))
            .collect()
    }
}

impl ParInstrument for ParCds {
    fn key(&self) -> &RiskFactorKey {
        &self.key
    }

    fn maturity(&self) -> f64 {
        self.maturity
    }

    fn fair_rate(&self, market: &dyn Market) -> Result<f64, MarketDataError> {
        let discount = market.required_discount_curve(&self.discount_currency)?;
        let credit = market.required_default_curve(&self.key.name)?;
        let recovery = resolve_recovery_rate(market, &self.recovery_chain())?;

        let (mut protection, mut rpv01) = (0.0, 0.0);
        for (s, e) in periods(self.maturity, self.frequency) {
            let (sp_s, sp_e) = (credit.survival_probability(s)?, credit.survival_probability(e)?);
            let df = discount.discount_factor(e)?;
            protection += df * (sp_s - sp_e);
            rpv01 += (e - s) * df * 0.5 * (sp_s + sp_e);
        }
        Ok((1.0 - recovery) * protection / rpv01)
    }
}
