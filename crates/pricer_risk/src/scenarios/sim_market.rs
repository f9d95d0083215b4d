//! Simulation market: pillar grids, base scenario and scenario views.
//!
//! [`SimMarketParameters`] names the curves under simulation and their
//! pillar tenors. [`ScenarioSimMarket`] samples the base market on those
//! pillars to obtain the base [`Scenario`], shifts single risk factors on
//! the zero-rate scale, and turns any scenario into a [`ScenarioMarket`]
//! that implements [`Market`] by rebuilding the simulated curves and
//! delegating everything else to the base market.
//!
//! # Storage
//!
//! | Key type              | Stored value            | Curve rebuilt as      |
//! |-----------------------|-------------------------|-----------------------|
//! | `DiscountCurve`       | discount factor         | `InterpolatedCurve`   |
//! | `YieldCurve`          | discount factor         | `InterpolatedCurve`   |
//! | `IndexCurve`          | discount factor         | `InterpolatedCurve`   |
//! | `SurvivalProbability` | survival probability    | `HazardRateCurve`     |
//! | `FxSpot`              | spot                    | quoted spot           |

use std::collections::{BTreeMap, BTreeSet};

use pricer_core::market_data::{
    CreditCurve, HazardRateCurve, InterpolatedCurve, Market, MarketDataError, SimpleMarket,
    YieldCurve,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ScenarioError;
use super::risk_factor::{KeyType, RiskFactorKey};
use super::scenario::{Scenario, ShiftType};

/// Curves under simulation and their pillar tenors in years.
///
/// # Examples
///
/// ```rust
/// use pricer_risk::scenarios::{KeyType, SimMarketParameters};
///
/// let params = SimMarketParameters::new()
///     .with_discount_curve("EUR", vec![1.0, 2.0, 5.0])
///     .with_default_curve("CPTY_A", vec![1.0, 5.0])
///     .with_fx_pair("USDEUR");
///
/// assert_eq!(params.tenors(KeyType::DiscountCurve, "EUR"), Some(&[1.0, 2.0, 5.0][..]));
/// assert_eq!(params.keys().len(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimMarketParameters {
    discount_curves: BTreeMap<String, Vec<f64>>,
    yield_curves: BTreeMap<String, Vec<f64>>,
    index_curves: BTreeMap<String, Vec<f64>>,
    default_curves: BTreeMap<String, Vec<f64>>,
    fx_pairs: BTreeSet<String>,
}

impl SimMarketParameters {
    /// Empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discount curve pillars for a currency.
    pub fn with_discount_curve(self, currency: &str, tenors: Vec<f64>) -> Self {
        self.with_tenors(KeyType::DiscountCurve, currency, tenors)
    }

    /// Named yield curve pillars.
    pub fn with_yield_curve(self, name: &str, tenors: Vec<f64>) -> Self {
        self.with_tenors(KeyType::YieldCurve, name, tenors)
    }

    /// Index forwarding curve pillars.
    pub fn with_index_curve(self, name: &str, tenors: Vec<f64>) -> Self {
        self.with_tenors(KeyType::IndexCurve, name, tenors)
    }

    /// Default curve pillars.
    pub fn with_default_curve(self, name: &str, tenors: Vec<f64>) -> Self {
        self.with_tenors(KeyType::SurvivalProbability, name, tenors)
    }

    /// Simulated FX pair.
    pub fn with_fx_pair(mut self, pair: &str) -> Self {
        self.fx_pairs.insert(pair.to_string());
        self
    }

    /// Copy with the pillars of one curve replaced.
    ///
    /// For [`KeyType::FxSpot`] the pair is added and `tenors` is ignored.
    pub fn with_tenors(mut self, key_type: KeyType, name: &str, tenors: Vec<f64>) -> Self {
        match self.curves_mut(key_type) {
            Some(curves) => {
                curves.insert(name.to_string(), tenors);
            }
            None => {
                self.fx_pairs.insert(name.to_string());
            }
        }
        self
    }

    /// Pillars of a curve, if simulated.
    pub fn tenors(&self, key_type: KeyType, name: &str) -> Option<&[f64]> {
        self.curves(key_type)?.get(name).map(Vec::as_slice)
    }

    /// Names simulated under a key type, in order.
    pub fn names(&self, key_type: KeyType) -> Vec<&str> {
        match self.curves(key_type) {
            Some(curves) => curves.keys().map(String::as_str).collect(),
            None => self.fx_pairs.iter().map(String::as_str).collect(),
        }
    }

    /// Every risk factor key, in key order.
    pub fn keys(&self) -> Vec<RiskFactorKey> {
        let mut keys = Vec::new();
        for key_type in KeyType::PAR_TYPES {
            if let Some(curves) = self.curves(key_type) {
                for (name, tenors) in curves {
                    keys.extend((0..tenors.len()).map(|i| RiskFactorKey::new(key_type, name, i)));
                }
            }
        }
        keys.extend(
            self.fx_pairs
                .iter()
                .map(|pair| RiskFactorKey::new(KeyType::FxSpot, pair, 0)),
        );
        keys
    }

    fn curves(&self, key_type: KeyType) -> Option<&BTreeMap<String, Vec<f64>>> {
        match key_type {
            KeyType::DiscountCurve => Some(&self.discount_curves),
            KeyType::YieldCurve => Some(&self.yield_curves),
            KeyType::IndexCurve => Some(&self.index_curves),
            KeyType::SurvivalProbability => Some(&self.default_curves),
            KeyType::FxSpot => None,
        }
    }

    fn curves_mut(&mut self, key_type: KeyType) -> Option<&mut BTreeMap<String, Vec<f64>>> {
        match key_type {
            KeyType::DiscountCurve => Some(&mut self.discount_curves),
            KeyType::YieldCurve => Some(&mut self.yield_curves),
            KeyType::IndexCurve => Some(&mut self.index_curves),
            KeyType::SurvivalProbability => Some(&mut self.default_curves),
            KeyType::FxSpot => None,
        }
    }
}

/// Simulation market over a base [`Market`].
pub struct ScenarioSimMarket<'a> {
    base: &'a dyn Market,
    params: SimMarketParameters,
    base_scenario: Scenario,
}

impl<'a> ScenarioSimMarket<'a> {
    /// Sample the base market on the configured pillars.
    ///
    /// # Errors
    ///
    /// * [`ScenarioError::EmptyTenors`] - A curve has no pillars
    /// * [`ScenarioError::MarketData`] - A simulated curve or spot is absent
    ///   from the base market, or pillars are not positive and increasing
    pub fn new(base: &'a dyn Market, params: SimMarketParameters) -> Result<Self, ScenarioError> {
        let mut scenario = Scenario::new("base");
        for key_type in KeyType::PAR_TYPES {
            for name in params.names(key_type) {
                let tenors = params.tenors(key_type, name).unwrap_or_default();
                validate_tenors(key_type, name, tenors)?;
                for (i, &t) in tenors.iter().enumerate() {
                    let value = match key_type {
                        KeyType::DiscountCurve => {
                            base.required_discount_curve(name)?.discount_factor(t)?
                        }
                        KeyType::SurvivalProbability => {
                            base.required_default_curve(name)?.survival_probability(t)?
                        }
                        _ => base.required_yield_curve(name)?.discount_factor(t)?,
                    };
                    scenario = scenario.with_value(RiskFactorKey::new(key_type, name, i), value);
                }
            }
        }
        for pair in params.names(KeyType::FxSpot) {
            let spot = base.required_fx_spot(pair)?;
            scenario = scenario.with_value(RiskFactorKey::new(KeyType::FxSpot, pair, 0), spot);
        }
        debug!(keys = scenario.len(), "Built base scenario");

        Ok(Self {
            base,
            params,
            base_scenario: scenario,
        })
    }

    /// Market the simulation is built on.
    #[inline]
    pub fn base_market(&self) -> &'a dyn Market {
        self.base
    }

    /// Simulated curves and pillars.
    #[inline]
    pub fn params(&self) -> &SimMarketParameters {
        &self.params
    }

    /// Base scenario holding every simulated key.
    #[inline]
    pub fn base_scenario(&self) -> &Scenario {
        &self.base_scenario
    }

    /// Every simulated key, in key order.
    pub fn keys(&self) -> Vec<RiskFactorKey> {
        self.params.keys()
    }

    /// Pillar time of a curve key.
    pub fn pillar_time(&self, key: &RiskFactorKey) -> Result<f64, ScenarioError> {
        self.params
            .tenors(key.key_type, &key.name)
            .and_then(|tenors| tenors.get(key.index).copied())
            .ok_or_else(|| ScenarioError::UnknownKey(key.to_string()))
    }

    /// Base continuously compounded zero rate (or integrated hazard per
    /// year) of a curve key.
    pub fn zero_rate(&self, key: &RiskFactorKey) -> Result<f64, ScenarioError> {
        let value = self.base_value(key)?;
        let t = self.pillar_time(key)?;
        zero_rate_of(key, value, t)
    }

    /// Scenario moving a single key.
    ///
    /// Curve keys are shifted on the zero-rate scale, `v' = exp(-z' t)`;
    /// FX spots are shifted directly. The returned scenario holds only the
    /// shifted key.
    pub fn shifted_scenario(
        &self,
        key: &RiskFactorKey,
        shift: f64,
        shift_type: ShiftType,
    ) -> Result<Scenario, ScenarioError> {
        let value = self.base_value(key)?;
        let shifted = if key.key_type.is_curve() {
            let t = self.pillar_time(key)?;
            let z = zero_rate_of(key, value, t)?;
            (-shift_type.apply(z, shift) * t).exp()
        } else {
            shift_type.apply(value, shift)
        };
        Ok(Scenario::new(key.to_string()).with_value(key.clone(), shifted))
    }

    /// Market view of a scenario; keys absent from `scenario` take base
    /// values.
    pub fn scenario_market(
        &self,
        scenario: &Scenario,
    ) -> Result<ScenarioMarket<'a>, ScenarioError> {
        let mut simulated = SimpleMarket::new();
        for key_type in KeyType::PAR_TYPES {
            for name in self.params.names(key_type) {
                let tenors = self.params.tenors(key_type, name).unwrap_or_default();
                let values = tenors
                    .iter()
                    .enumerate()
                    .map(|(i, _)| self.value(scenario, &RiskFactorKey::new(key_type, name, i)))
                    .collect::<Result<Vec<_>, _>>()?;
                simulated = match key_type {
                    KeyType::DiscountCurve => {
                        let curve = zero_curve(key_type, name, tenors, &values)?;
                        simulated.with_discount_curve(name, curve)
                    }
                    KeyType::SurvivalProbability => {
                        let curve = hazard_curve(name, tenors, &values)?;
                        simulated.with_default_curve(name, curve)
                    }
                    _ => {
                        let curve = zero_curve(key_type, name, tenors, &values)?;
                        simulated.with_yield_curve(name, curve)
                    }
                };
            }
        }
        for pair in self.params.names(KeyType::FxSpot) {
            let spot = self.value(scenario, &RiskFactorKey::new(KeyType::FxSpot, pair, 0))?;
            simulated = simulated.with_fx_spot(pair, spot);
        }

        Ok(ScenarioMarket {
            base: self.base,
            simulated,
            label: scenario.label().to_string(),
        })
    }

    fn base_value(&self, key: &RiskFactorKey) -> Result<f64, ScenarioError> {
        self.base_scenario
            .get(key)
            .ok_or_else(|| ScenarioError::UnknownKey(key.to_string()))
    }

    fn value(&self, scenario: &Scenario, key: &RiskFactorKey) -> Result<f64, ScenarioError> {
        match scenario.get(key) {
            Some(value) => Ok(value),
            None => self.base_value(key),
        }
    }
}

fn validate_tenors(key_type: KeyType, name: &str, tenors: &[f64]) -> Result<(), ScenarioError> {
    if tenors.is_empty() {
        return Err(ScenarioError::EmptyTenors {
            key_type,
            name: name.to_string(),
        });
    }
    if let Some(&t) = tenors.iter().find(|&&t| t <= 0.0 || !t.is_finite()) {
        return Err(MarketDataError::InvalidMaturity { t }.into());
    }
    if let Some(index) = (1..tenors.len()).find(|&i| tenors[i] <= tenors[i - 1]) {
        return Err(MarketDataError::UnsortedPillars { index }.into());
    }
    Ok(())
}

fn zero_rate_of(key: &RiskFactorKey, value: f64, t: f64) -> Result<f64, ScenarioError> {
    if value <= 0.0 {
        return Err(ScenarioError::NonPositiveValue {
            key: key.to_string(),
            value,
        });
    }
    Ok(-value.ln() / t)
}

fn zero_curve(
    key_type: KeyType,
    name: &str,
    tenors: &[f64],
    discount_factors: &[f64],
) -> Result<InterpolatedCurve<f64>, ScenarioError> {
    let rates = tenors
        .iter()
        .zip(discount_factors)
        .enumerate()
        .map(|(i, (&t, &df))| zero_rate_of(&RiskFactorKey::new(key_type, name, i), df, t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InterpolatedCurve::new(tenors, &rates)?)
}

fn hazard_curve(
    name: &str,
    tenors: &[f64],
    survival: &[f64],
) -> Result<HazardRateCurve<f64>, ScenarioError> {
    let mut hazards = Vec::with_capacity(tenors.len());
    let (mut prev_t, mut prev_sp) = (0.0, 1.0);
    for (i, (&t, &sp)) in tenors.iter().zip(survival).enumerate() {
        if sp <= 0.0 {
            return Err(ScenarioError::NonPositiveValue {
                key: RiskFactorKey::survival(name, i).to_string(),
                value: sp,
            });
        }
        hazards.push(-(sp / prev_sp).ln() / (t - prev_t));
        prev_t = t;
        prev_sp = sp;
    }
    Ok(HazardRateCurve::new(tenors, &hazards)?)
}

/// [`Market`] view of one scenario.
///
/// Simulated curves and spots come from the scenario; recovery rates and
/// anything not simulated come from the base market.
pub struct ScenarioMarket<'a> {
    base: &'a dyn Market,
    simulated: SimpleMarket,
    label: String,
}

impl ScenarioMarket<'_> {
    /// Label of the scenario the view was built from.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Market for ScenarioMarket<'_> {
    fn discount_curve(&self, currency: &str) -> Option<&(dyn YieldCurve<f64> + Send + Sync)> {
        self.simulated
            .discount_curve(currency)
            .or_else(|| self.base.discount_curve(currency))
    }

    fn yield_curve(&self, name: &str) -> Option<&(dyn YieldCurve<f64> + Send + Sync)> {
        self.simulated
            .yield_curve(name)
            .or_else(|| self.base.yield_curve(name))
    }

    fn default_curve(&self, name: &str) -> Option<&(dyn CreditCurve<f64> + Send + Sync)> {
        self.simulated
            .default_curve(name)
            .or_else(|| self.base.default_curve(name))
    }

    fn recovery_rate(&self, name: &str) -> Option<f64> {
        self.base.recovery_rate(name)
    }

    fn security_recovery_rate(&self, security_id: &str) -> Option<f64> {
        self.base.security_recovery_rate(security_id)
    }

    fn fx_spot(&self, pair: &str) -> Option<f64> {
        self.simulated
            .fx_spot(pair)
            .or_else(|| self.base.fx_spot(pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::{FlatCurve, FlatHazardRateCurve};

    fn base_market() -> SimpleMarket {
        SimpleMarket::new()
            .with_discount_curve("EUR", FlatCurve::new(0.02))
            .with_discount_curve("USD", FlatCurve::new(0.04))
            .with_yield_curve("EUR-EURIBOR-6M", FlatCurve::new(0.025))
            .with_default_curve("CPTY_A", FlatHazardRateCurve::new(0.01))
            .with_recovery_rate("CPTY_A", 0.4)
            .with_fx_spot("USDEUR", 0.9)
    }

    fn params() -> SimMarketParameters {
        SimMarketParameters::new()
            .with_discount_curve("EUR", vec![1.0, 2.0, 5.0])
            .with_index_curve("EUR-EURIBOR-6M", vec![1.0, 5.0])
            .with_default_curve("CPTY_A", vec![1.0, 3.0, 5.0])
            .with_fx_pair("USDEUR")
    }

    // ================================================================
    // SimMarketParameters
    // ================================================================

    #[test]
    fn test_keys_are_ordered() {
        let keys = params().keys();
        assert_eq!(keys.len(), 9);
        assert_eq!(keys[0], RiskFactorKey::discount("EUR", 0));
        assert_eq!(keys[8], RiskFactorKey::new(KeyType::FxSpot, "USDEUR", 0));
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_with_tenors_replaces_pillars() {
        let p = params().with_tenors(KeyType::DiscountCurve, "EUR", vec![0.5, 10.0]);
        assert_eq!(p.tenors(KeyType::DiscountCurve, "EUR"), Some(&[0.5, 10.0][..]));
        assert_eq!(p.tenors(KeyType::DiscountCurve, "USD"), None);
        assert_eq!(p.tenors(KeyType::FxSpot, "USDEUR"), None);
    }

    // ================================================================
    // ScenarioSimMarket
    // ================================================================

    #[test]
    fn test_base_scenario_samples_pillars() {
        let market = base_market();
        let sim = ScenarioSimMarket::new(&market, params()).unwrap();
        let base = sim.base_scenario();
        assert_eq!(base.len(), 9);
        assert_relative_eq!(
            base.get(&RiskFactorKey::discount("EUR", 2)).unwrap(),
            (-0.1_f64).exp(),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            base.get(&RiskFactorKey::survival("CPTY_A", 1)).unwrap(),
            (-0.03_f64).exp(),
            epsilon = 1e-15
        );
        let zero = sim.zero_rate(&RiskFactorKey::discount("EUR", 1)).unwrap();
        assert_relative_eq!(zero, 0.02, epsilon = 1e-14);
    }

    #[test]
    fn test_missing_curve_fails() {
        let market = base_market();
        let err = ScenarioSimMarket::new(
            &market,
            SimMarketParameters::new().with_discount_curve("GBP", vec![1.0]),
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            ScenarioError::MarketData(MarketDataError::MissingDiscountCurve {
                currency: "GBP".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_tenors_fail() {
        let market = base_market();
        let empty = SimMarketParameters::new().with_discount_curve("EUR", vec![]);
        assert!(matches!(
            ScenarioSimMarket::new(&market, empty),
            Err(ScenarioError::EmptyTenors { .. })
        ));
        let unsorted = SimMarketParameters::new().with_discount_curve("EUR", vec![2.0, 1.0]);
        assert!(matches!(
            ScenarioSimMarket::new(&market, unsorted),
            Err(ScenarioError::MarketData(MarketDataError::UnsortedPillars { index: 1 }))
        ));
    }

    #[test]
    fn test_base_scenario_market_reprices_pillars() {
        let market = base_market();
        let sim = ScenarioSimMarket::new(&market, params()).unwrap();
        let view = sim.scenario_market(sim.base_scenario()).unwrap();
        let eur = view.required_discount_curve("EUR").unwrap();
        let df = eur.discount_factor(2.0).unwrap();
        assert_relative_eq!(df, (-0.04_f64).exp(), epsilon = 1e-14);
        let cpty = view.required_default_curve("CPTY_A").unwrap();
        assert_relative_eq!(
            cpty.survival_probability(4.0).unwrap(),
            (-0.04_f64).exp(),
            epsilon = 1e-14
        );
        // Not simulated: delegated to the base market.
        assert!(view.discount_curve("USD").is_some());
        assert_eq!(view.recovery_rate("CPTY_A"), Some(0.4));
        assert_relative_eq!(view.fx_spot("EURUSD").unwrap(), 1.0 / 0.9, epsilon = 1e-14);
    }

    #[test]
    fn test_shifted_scenario_moves_zero_rate() {
        let market = base_market();
        let sim = ScenarioSimMarket::new(&market, params()).unwrap();
        let key = RiskFactorKey::discount("EUR", 1);
        let shifted = sim.shifted_scenario(&key, 0.0001, ShiftType::Absolute).unwrap();
        assert_eq!(shifted.len(), 1);
        assert_eq!(shifted.label(), "DiscountCurve/EUR/1");

        let view = sim.scenario_market(&shifted).unwrap();
        let eur = view.required_discount_curve("EUR").unwrap();
        assert_relative_eq!(eur.zero_rate(2.0).unwrap(), 0.0201, epsilon = 1e-12);
        assert_relative_eq!(eur.zero_rate(1.0).unwrap(), 0.02, epsilon = 1e-12);
        // Halfway between the shifted pillar and its neighbour.
        assert_relative_eq!(eur.zero_rate(3.5).unwrap(), 0.02005, epsilon = 1e-12);
    }

    #[test]
    fn test_shifted_fx_spot_is_relative() {
        let market = base_market();
        let sim = ScenarioSimMarket::new(&market, params()).unwrap();
        let key = RiskFactorKey::new(KeyType::FxSpot, "USDEUR", 0);
        let shifted = sim.shifted_scenario(&key, 0.01, ShiftType::Relative).unwrap();
        let view = sim.scenario_market(&shifted).unwrap();
        assert_relative_eq!(view.fx_spot("USDEUR").unwrap(), 0.909, epsilon = 1e-14);
    }

    #[test]
    fn test_unknown_key() {
        let market = base_market();
        let sim = ScenarioSimMarket::new(&market, params()).unwrap();
        let key = RiskFactorKey::discount("EUR", 7);
        assert_eq!(
            sim.shifted_scenario(&key, 0.0001, ShiftType::Absolute).err(),
            Some(ScenarioError::UnknownKey("DiscountCurve/EUR/7".to_string()))
        );
    }
}
