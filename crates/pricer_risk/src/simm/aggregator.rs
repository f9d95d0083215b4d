//! SIMM margin aggregation for the interest rate and FX risk classes.
//!
//! Delta margin within a currency bucket `b`:
//!
//! ```text
//! WS_k = RW_k s_k CR_b,      CR_b = max(1, √(|Σ_k s_k| / T))
//! K_b  = √(Σ_k Σ_l ρ_kl WS_k WS_l)
//! S_b  = max(min(Σ_k WS_k, K_b), −K_b)
//! DM   = √(Σ_b K_b² + Σ_{b≠c} γ g_bc S_b S_c),   g_bc = min(CR) / max(CR)
//! ```
//!
//! Curvature uses the vega risk scaled by `SF(t) = 0.5 min(1, 14 / (365 t))`
//! with squared correlations and the `λ(θ)` tail adjustment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::SimmError;

/// χ²(1) quantile at 99.5%, `Φ⁻¹(0.995)²`.
const CURVATURE_QUANTILE: f64 = 6.634896601021214;

/// Risk weights and correlations for [`StandardSimmAggregator`].
///
/// Defaults are the ISDA SIMM 1.0 regular-volatility calibration without
/// concentration thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimmAggregatorConfig {
    /// IR delta risk weight per tenor.
    pub ir_delta_risk_weights: Vec<f64>,
    /// Correlation between IR tenors, also used across vega expiries.
    pub ir_tenor_correlation: Vec<Vec<f64>>,
    /// Correlation γ between currencies.
    pub ir_inter_currency_correlation: f64,
    /// IR vega risk weight.
    pub ir_vega_risk_weight: f64,
    /// FX delta risk weight.
    pub fx_risk_weight: f64,
    /// Correlation between FX risk factors.
    pub fx_correlation: f64,
    /// FX vega risk weight.
    pub fx_vega_risk_weight: f64,
    /// Delta concentration threshold; `None` disables concentration.
    pub concentration_threshold: Option<f64>,
}

impl Default for SimmAggregatorConfig {
    fn default() -> Self {
        let corr: [[f64; 12]; 12] = [
            [1.000, 1.000, 1.000, 0.782, 0.618, 0.498, 0.438, 0.361, 0.270, 0.196, 0.174, 0.129],
            [1.000, 1.000, 1.000, 0.782, 0.618, 0.498, 0.438, 0.361, 0.270, 0.196, 0.174, 0.129],
            [1.000, 1.000, 1.000, 0.782, 0.618, 0.498, 0.438, 0.361, 0.270, 0.196, 0.174, 0.129],
            [0.782, 0.782, 0.782, 1.000, 0.840, 0.739, 0.667, 0.569, 0.444, 0.375, 0.349, 0.296],
            [0.618, 0.618, 0.618, 0.840, 1.000, 0.917, 0.859, 0.757, 0.626, 0.555, 0.526, 0.471],
            [0.498, 0.498, 0.498, 0.739, 0.917, 1.000, 0.976, 0.895, 0.749, 0.690, 0.660, 0.602],
            [0.438, 0.438, 0.438, 0.667, 0.859, 0.976, 1.000, 0.958, 0.831, 0.779, 0.746, 0.690],
            [0.361, 0.361, 0.361, 0.569, 0.757, 0.895, 0.958, 1.000, 0.925, 0.893, 0.859, 0.812],
            [0.270, 0.270, 0.270, 0.444, 0.626, 0.749, 0.831, 0.925, 1.000, 0.980, 0.961, 0.931],
            [0.196, 0.196, 0.196, 0.375, 0.555, 0.690, 0.779, 0.893, 0.980, 1.000, 0.989, 0.970],
            [0.174, 0.174, 0.174, 0.349, 0.526, 0.660, 0.746, 0.859, 0.961, 0.989, 1.000, 0.988],
            [0.129, 0.129, 0.129, 0.296, 0.471, 0.602, 0.690, 0.812, 0.931, 0.970, 0.988, 1.000],
        ];
        Self {
            ir_delta_risk_weights: vec![
                77.0, 77.0, 77.0, 64.0, 58.0, 49.0, 47.0, 47.0, 45.0, 45.0, 48.0, 56.0,
            ],
            ir_tenor_correlation: corr.iter().map(|row| row.to_vec()).collect(),
            ir_inter_currency_correlation: 0.27,
            ir_vega_risk_weight: 0.21,
            fx_risk_weight: 7.9,
            fx_correlation: 0.5,
            fx_vega_risk_weight: 0.21,
            concentration_threshold: None,
        }
    }
}

impl SimmAggregatorConfig {
    /// Parse and validate a TOML document; omitted fields take defaults.
    ///
    /// # Errors
    ///
    /// [`SimmError::ConfigParse`] for malformed TOML, otherwise the errors
    /// of [`validate`](Self::validate).
    pub fn from_toml_str(s: &str) -> Result<Self, SimmError> {
        let config: SimmAggregatorConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SimmError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimmError::ConfigParse(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Sets the delta concentration threshold.
    pub fn with_concentration_threshold(mut self, threshold: f64) -> Self {
        self.concentration_threshold = Some(threshold);
        self
    }

    /// Number of IR tenors.
    pub fn tenor_count(&self) -> usize {
        self.ir_delta_risk_weights.len()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// [`SimmError::InvalidConfig`] for a tenor correlation matrix that is
    /// not square, symmetric, unit-diagonal and bounded by one in
    /// magnitude, or whose size differs from the risk weights; for
    /// correlations outside [-1, 1]; for negative or non-finite weights;
    /// and for a non-positive concentration threshold.
    pub fn validate(&self) -> Result<(), SimmError> {
        let n = self.tenor_count();
        if n == 0 {
            return Err(SimmError::InvalidConfig("no IR risk weights".to_string()));
        }
        if self.ir_tenor_correlation.len() != n
            || self.ir_tenor_correlation.iter().any(|row| row.len() != n)
        {
            return Err(SimmError::InvalidConfig(format!(
                "IR tenor correlation must be {n}x{n}"
            )));
        }
        for i in 0..n {
            if self.ir_tenor_correlation[i][i] != 1.0 {
                return Err(SimmError::InvalidConfig(format!(
                    "IR tenor correlation diagonal at {i} is not one"
                )));
            }
            for j in 0..i {
                let rho = self.ir_tenor_correlation[i][j];
                if rho != self.ir_tenor_correlation[j][i] {
                    return Err(SimmError::InvalidConfig(format!(
                        "IR tenor correlation not symmetric at ({i}, {j})"
                    )));
                }
                check_correlation("IR tenor correlation", rho)?;
            }
        }
        check_correlation("IR inter-currency correlation", self.ir_inter_currency_correlation)?;
        check_correlation("FX correlation", self.fx_correlation)?;

        let weights = self.ir_delta_risk_weights.iter().chain([
            &self.ir_vega_risk_weight,
            &self.fx_risk_weight,
            &self.fx_vega_risk_weight,
        ]);
        for &weight in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimmError::InvalidConfig(format!(
                    "risk weight must be non-negative, got {weight}"
                )));
            }
        }
        if let Some(threshold) = self.concentration_threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(SimmError::InvalidConfig(format!(
                    "concentration threshold must be positive, got {threshold}"
                )));
            }
        }
        Ok(())
    }
}

fn check_correlation(what: &str, rho: f64) -> Result<(), SimmError> {
    if !(-1.0..=1.0).contains(&rho) {
        return Err(SimmError::InvalidConfig(format!("{what} {rho} outside [-1, 1]")));
    }
    Ok(())
}

/// Bucketed SIMM risk of one netting set, already in SIMM units.
#[derive(Debug, Clone, PartialEq)]
pub struct SimmInputs<'a> {
    /// Par IR delta per currency and tenor, per 1bp.
    pub ir_delta: Vec<Vec<f64>>,
    /// FX delta per non-base currency, per 1% spot move.
    pub fx_delta: Vec<f64>,
    /// Swaption vega risk per currency and expiry.
    pub ir_vega: Vec<Vec<f64>>,
    /// FX vega risk per non-base currency and expiry.
    pub fx_vega: Vec<Vec<f64>>,
    /// Swaption expiries in years.
    pub ir_vega_terms: &'a [f64],
    /// FX option expiries in years.
    pub fx_vega_terms: &'a [f64],
}

/// Margin components per risk class and measure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimmMargin {
    /// IR delta margin.
    pub ir_delta: f64,
    /// IR vega margin.
    pub ir_vega: f64,
    /// IR curvature margin.
    pub ir_curvature: f64,
    /// FX delta margin.
    pub fx_delta: f64,
    /// FX vega margin.
    pub fx_vega: f64,
    /// FX curvature margin.
    pub fx_curvature: f64,
}

impl SimmMargin {
    /// IR plus FX delta margin.
    pub fn delta(&self) -> f64 {
        self.ir_delta + self.fx_delta
    }

    /// IR plus FX vega margin.
    pub fn vega(&self) -> f64 {
        self.ir_vega + self.fx_vega
    }

    /// IR plus FX curvature margin.
    pub fn curvature(&self) -> f64 {
        self.ir_curvature + self.fx_curvature
    }

    /// Sum of all components.
    pub fn total(&self) -> f64 {
        self.delta() + self.vega() + self.curvature()
    }
}

/// Turns bucketed risk into margin.
pub trait SimmAggregator: Send + Sync {
    /// Margin for one netting set.
    fn margin(&self, inputs: &SimmInputs<'_>) -> Result<SimmMargin, SimmError>;
}

/// SIMM delta, vega and curvature aggregation for IR and FX.
///
/// # Examples
///
/// ```
/// use pricer_risk::simm::{SimmAggregator, SimmInputs, StandardSimmAggregator, SIMM_TENORS};
///
/// let aggregator = StandardSimmAggregator::default();
/// let mut delta = vec![0.0; 12];
/// delta[8] = 1_000.0; // 10Y
///
/// let inputs = SimmInputs {
///     ir_delta: vec![delta],
///     fx_delta: Vec::new(),
///     ir_vega: vec![vec![0.0; 12]],
///     fx_vega: Vec::new(),
///     ir_vega_terms: &SIMM_TENORS,
///     fx_vega_terms: &SIMM_TENORS,
/// };
///
/// let margin = aggregator.margin(&inputs).unwrap();
/// assert!((margin.ir_delta - 45_000.0).abs() < 1e-9);
/// assert_eq!(margin.total(), margin.ir_delta);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardSimmAggregator {
    config: SimmAggregatorConfig,
}

impl StandardSimmAggregator {
    /// Aggregator over a validated configuration.
    pub fn new(config: SimmAggregatorConfig) -> Result<Self, SimmError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &SimmAggregatorConfig {
        &self.config
    }

    fn concentration(&self, net: f64) -> f64 {
        match self.config.concentration_threshold {
            Some(threshold) => (net.abs() / threshold).sqrt().max(1.0),
            None => 1.0,
        }
    }

    fn tenor_quadratic(&self, ws: &[f64], squared: bool) -> f64 {
        let corr = &self.config.ir_tenor_correlation;
        quadratic(ws, |k, l| {
            let rho = corr[k][l];
            if squared {
                rho * rho
            } else {
                rho
            }
        })
    }

    fn check_rows(&self, what: &str, rows: &[Vec<f64>]) -> Result<(), SimmError> {
        let n = self.config.tenor_count();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SimmError::DimensionMismatch {
                    what: format!("{what} bucket {i}"),
                    expected: n,
                    actual: row.len(),
                });
            }
        }
        Ok(())
    }

    fn ir_delta_margin(&self, deltas: &[Vec<f64>]) -> Result<f64, SimmError> {
        self.check_rows("IR delta", deltas)?;
        let weights = &self.config.ir_delta_risk_weights;
        let mut k = Vec::with_capacity(deltas.len());
        let mut s = Vec::with_capacity(deltas.len());
        let mut cr = Vec::with_capacity(deltas.len());
        for row in deltas {
            let concentration = self.concentration(row.iter().sum());
            let ws: Vec<f64> = row
                .iter()
                .zip(weights)
                .map(|(delta, weight)| weight * delta * concentration)
                .collect();
            let kb = self.tenor_quadratic(&ws, false).max(0.0).sqrt();
            s.push(ws.iter().sum::<f64>().clamp(-kb, kb));
            k.push(kb);
            cr.push(concentration);
        }
        let gamma = self.config.ir_inter_currency_correlation;
        let radicand = across_buckets(&k, &s, |b, c| gamma * cr[b].min(cr[c]) / cr[b].max(cr[c]));
        Ok(radicand.max(0.0).sqrt())
    }

    fn ir_vega_margin(&self, vegas: &[Vec<f64>]) -> Result<f64, SimmError> {
        self.check_rows("IR vega", vegas)?;
        let rw = self.config.ir_vega_risk_weight;
        let (k, s): (Vec<f64>, Vec<f64>) = vegas
            .iter()
            .map(|row| {
                let vr: Vec<f64> = row.iter().map(|v| rw * v).collect();
                let kb = self.tenor_quadratic(&vr, false).max(0.0).sqrt();
                (kb, vr.iter().sum::<f64>().clamp(-kb, kb))
            })
            .unzip();
        let gamma = self.config.ir_inter_currency_correlation;
        Ok(across_buckets(&k, &s, |_, _| gamma).max(0.0).sqrt())
    }

    fn ir_curvature_margin(&self, vegas: &[Vec<f64>], terms: &[f64]) -> Result<f64, SimmError> {
        self.check_rows("IR vega", vegas)?;
        if terms.len() != self.config.tenor_count() {
            return Err(SimmError::DimensionMismatch {
                what: "IR vega expiries".to_string(),
                expected: self.config.tenor_count(),
                actual: terms.len(),
            });
        }
        let mut k = Vec::with_capacity(vegas.len());
        let mut s = Vec::with_capacity(vegas.len());
        let mut all_cvr = Vec::new();
        for row in vegas {
            let cvr: Vec<f64> = row.iter().zip(terms).map(|(v, &t)| scaling(t) * v).collect();
            let kb = self.tenor_quadratic(&cvr, true).max(0.0).sqrt();
            s.push(cvr.iter().sum::<f64>().clamp(-kb, kb));
            k.push(kb);
            all_cvr.extend(cvr);
        }
        let gamma = self.config.ir_inter_currency_correlation;
        let spread = across_buckets(&k, &s, |_, _| gamma * gamma).max(0.0).sqrt();
        Ok(curvature(&all_cvr, spread))
    }

    fn fx_delta_margin(&self, deltas: &[f64]) -> f64 {
        let rw = self.config.fx_risk_weight;
        let ws: Vec<f64> = deltas
            .iter()
            .map(|d| rw * d * self.concentration(*d))
            .collect();
        self.fx_quadratic(&ws, false).max(0.0).sqrt()
    }

    fn fx_vega_margin(&self, vegas: &[Vec<f64>]) -> f64 {
        let rw = self.config.fx_vega_risk_weight;
        let vr: Vec<f64> = vegas.iter().map(|row| rw * row.iter().sum::<f64>()).collect();
        self.fx_quadratic(&vr, false).max(0.0).sqrt()
    }

    fn fx_curvature_margin(&self, vegas: &[Vec<f64>], terms: &[f64]) -> Result<f64, SimmError> {
        let mut cvr = Vec::with_capacity(vegas.len());
        for (i, row) in vegas.iter().enumerate() {
            if row.len() != terms.len() {
                return Err(SimmError::DimensionMismatch {
                    what: format!("FX vega bucket {i}"),
                    expected: terms.len(),
                    actual: row.len(),
                });
            }
            cvr.push(row.iter().zip(terms).map(|(v, &t)| scaling(t) * v).sum::<f64>());
        }
        let spread = self.fx_quadratic(&cvr, true).max(0.0).sqrt();
        Ok(curvature(&cvr, spread))
    }

    fn fx_quadratic(&self, ws: &[f64], squared: bool) -> f64 {
        let rho = self.config.fx_correlation;
        let rho = if squared { rho * rho } else { rho };
        quadratic(ws, |k, l| if k == l { 1.0 } else { rho })
    }
}

impl SimmAggregator for StandardSimmAggregator {
    fn margin(&self, inputs: &SimmInputs<'_>) -> Result<SimmMargin, SimmError> {
        if inputs.fx_vega.len() != inputs.fx_delta.len() {
            return Err(SimmError::DimensionMismatch {
                what: "FX vega pairs".to_string(),
                expected: inputs.fx_delta.len(),
                actual: inputs.fx_vega.len(),
            });
        }
        Ok(SimmMargin {
            ir_delta: self.ir_delta_margin(&inputs.ir_delta)?,
            ir_vega: self.ir_vega_margin(&inputs.ir_vega)?,
            ir_curvature: self.ir_curvature_margin(&inputs.ir_vega, inputs.ir_vega_terms)?,
            fx_delta: self.fx_delta_margin(&inputs.fx_delta),
            fx_vega: self.fx_vega_margin(&inputs.fx_vega),
            fx_curvature: self.fx_curvature_margin(&inputs.fx_vega, inputs.fx_vega_terms)?,
        })
    }
}

/// Curvature scaling `SF(t) = 0.5 min(1, 14 / (365 t))`.
fn scaling(t: f64) -> f64 {
    if t <= 0.0 {
        return 0.5;
    }
    0.5 * (14.0 / (365.0 * t)).min(1.0)
}

/// `Σ CVR + λ(θ) spread`, floored at zero.
fn curvature(cvr: &[f64], spread: f64) -> f64 {
    let net: f64 = cvr.iter().sum();
    let gross: f64 = cvr.iter().map(|v| v.abs()).sum();
    let theta = if gross > 0.0 { (net / gross).min(0.0) } else { 0.0 };
    let lambda = (CURVATURE_QUANTILE - 1.0) * (1.0 + theta) - theta;
    (net + lambda * spread).max(0.0)
}

fn quadratic(ws: &[f64], corr: impl Fn(usize, usize) -> f64) -> f64 {
    let mut sum = 0.0;
    for (k, wk) in ws.iter().enumerate() {
        for (l, wl) in ws.iter().enumerate() {
            sum += corr(k, l) * wk * wl;
        }
    }
    sum
}

/// `Σ_b K_b² + Σ_{b≠c} corr(b, c) S_b S_c`.
fn across_buckets(k: &[f64], s: &[f64], corr: impl Fn(usize, usize) -> f64) -> f64 {
    let mut sum: f64 = k.iter().map(|kb| kb * kb).sum();
    for b in 0..s.len() {
        for c in 0..s.len() {
            if b != c {
                sum += corr(b, c) * s[b] * s[c];
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simm::storage::SIMM_TENORS;
    use approx::assert_relative_eq;

    fn inputs(ir_delta: Vec<Vec<f64>>, fx_delta: Vec<f64>) -> SimmInputs<'static> {
        let n_ccy = ir_delta.len();
        let pairs = fx_delta.len();
        SimmInputs {
            ir_delta,
            fx_delta,
            ir_vega: vec![vec![0.0; 12]; n_ccy],
            fx_vega: vec![vec![0.0; 12]; pairs],
            ir_vega_terms: &SIMM_TENORS,
            fx_vega_terms: &SIMM_TENORS,
        }
    }

    fn single(tenor: usize, amount: f64) -> Vec<f64> {
        let mut row = vec![0.0; 12];
        row[tenor] = amount;
        row
    }

    // ========================================
    // Configuration
    // ========================================

    #[test]
    fn test_default_config_is_valid() {
        let config = SimmAggregatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tenor_count(), 12);
    }

    #[test]
    fn test_toml_overrides() {
        let config = SimmAggregatorConfig::from_toml_str(
            r#"
            fx_risk_weight = 8.1
            concentration_threshold = 330000000.0
            "#,
        )
        .unwrap();
        assert_eq!(config.fx_risk_weight, 8.1);
        assert_eq!(config.concentration_threshold, Some(330e6));
        assert_eq!(config.ir_delta_risk_weights.len(), 12);
    }

    #[test]
    fn test_invalid_configs() {
        let mut asymmetric = SimmAggregatorConfig::default();
        asymmetric.ir_tenor_correlation[0][5] = 0.3;
        assert!(matches!(asymmetric.validate(), Err(SimmError::InvalidConfig(_))));

        let mut diagonal = SimmAggregatorConfig::default();
        diagonal.ir_tenor_correlation[3][3] = 0.9;
        assert!(diagonal.validate().is_err());

        let mut short = SimmAggregatorConfig::default();
        short.ir_delta_risk_weights.pop();
        assert!(short.validate().is_err());

        let gamma = SimmAggregatorConfig {
            ir_inter_currency_correlation: 1.5,
            ..SimmAggregatorConfig::default()
        };
        assert!(StandardSimmAggregator::new(gamma).is_err());

        let threshold = SimmAggregatorConfig::default().with_concentration_threshold(0.0);
        assert!(threshold.validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SimmAggregatorConfig::from_toml_str("ir_weight = 1.0").unwrap_err();
        assert!(matches!(err, SimmError::ConfigParse(_)));
    }

    // ========================================
    // Delta
    // ========================================

    #[test]
    fn test_single_ir_delta() {
        let margin = StandardSimmAggregator::default()
            .margin(&inputs(vec![single(8, 1_000.0)], Vec::new()))
            .unwrap();
        assert_relative_eq!(margin.ir_delta, 45_000.0, max_relative = 1e-12);
        assert_eq!(margin.vega(), 0.0);
        assert_eq!(margin.curvature(), 0.0);
    }

    #[test]
    fn test_fully_correlated_tenors_offset() {
        let mut row = single(0, 100.0);
        row[1] = -100.0;
        let margin = StandardSimmAggregator::default()
            .margin(&inputs(vec![row], Vec::new()))
            .unwrap();
        assert_relative_eq!(margin.ir_delta, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_currencies() {
        let margin = StandardSimmAggregator::default()
            .margin(&inputs(vec![single(8, 1_000.0), single(8, 1_000.0)], vec![0.0]))
            .unwrap();
        let expected = 45_000.0 * (2.0 * (1.0 + 0.27_f64)).sqrt();
        assert_relative_eq!(margin.ir_delta, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_concentration_scales_delta() {
        let config = SimmAggregatorConfig::default().with_concentration_threshold(250.0);
        let aggregator = StandardSimmAggregator::new(config).unwrap();

        // CR = √(1000 / 250) = 2
        let margin = aggregator
            .margin(&inputs(vec![single(8, 1_000.0)], Vec::new()))
            .unwrap();
        assert_relative_eq!(margin.ir_delta, 90_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_fx_delta() {
        let margin = StandardSimmAggregator::default()
            .margin(&inputs(vec![vec![0.0; 12]; 3], vec![100.0, 100.0]))
            .unwrap();
        assert_relative_eq!(margin.fx_delta, 790.0 * 3.0_f64.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(margin.delta(), margin.fx_delta);
    }

    #[test]
    fn test_wrong_tenor_count() {
        let err = StandardSimmAggregator::default()
            .margin(&inputs(vec![vec![1.0; 10]], Vec::new()))
            .unwrap_err();
        assert!(matches!(err, SimmError::DimensionMismatch { expected: 12, actual: 10, .. }));
    }

    // ========================================
    // Vega and curvature
    // ========================================

    #[test]
    fn test_ir_vega_and_curvature_long() {
        let mut inputs = inputs(vec![vec![0.0; 12]], Vec::new());
        inputs.ir_vega = vec![single(4, 1_000.0)];

        let margin = StandardSimmAggregator::default().margin(&inputs).unwrap();

        assert_relative_eq!(margin.ir_vega, 210.0, max_relative = 1e-12);
        // θ = 0 so λ + 1 = 6.6349
        let cvr = 0.5 * 14.0 / 365.0 * 1_000.0;
        assert_relative_eq!(margin.ir_curvature, CURVATURE_QUANTILE * cvr, max_relative = 1e-12);
    }

    #[test]
    fn test_short_curvature_floored() {
        let mut inputs = inputs(vec![vec![0.0; 12]], Vec::new());
        inputs.ir_vega = vec![single(4, -1_000.0)];

        let margin = StandardSimmAggregator::default().margin(&inputs).unwrap();

        // θ = −1, λ = 1: net + |net| = 0
        assert_relative_eq!(margin.ir_curvature, 0.0, epsilon = 1e-12);
        assert!(margin.ir_vega > 0.0);
    }

    #[test]
    fn test_fx_vega_sums_expiries() {
        let mut inputs = inputs(vec![vec![0.0; 12]; 2], vec![0.0]);
        inputs.fx_vega = vec![single(0, 50.0)];
        inputs.fx_vega[0][11] = 50.0;

        let margin = StandardSimmAggregator::default().margin(&inputs).unwrap();

        assert_relative_eq!(margin.fx_vega, 21.0, max_relative = 1e-12);
        let cvr = 0.5 * 50.0 + scaling(30.0) * 50.0;
        assert_relative_eq!(margin.fx_curvature, CURVATURE_QUANTILE * cvr, max_relative = 1e-12);
        assert_relative_eq!(
            margin.total(),
            margin.fx_vega + margin.fx_curvature,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_scaling_function() {
        assert_relative_eq!(scaling(14.0 / 365.0), 0.5);
        assert_relative_eq!(scaling(1.0), 0.5 * 14.0 / 365.0);
        assert_eq!(scaling(1e-3), 0.5);
    }
}
