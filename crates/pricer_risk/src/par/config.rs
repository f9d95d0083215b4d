//! Par sensitivity configuration.
//!
//! Loaded from TOML or assembled with `with_*` builders:
//!
//! ```toml
//! closeness_threshold = 1e-10
//! disabled = ["YieldCurve"]
//!
//! [[shifts]]
//! key_type = "DiscountCurve"
//! shift_type = "Absolute"
//! shift_size = 0.0001
//! par_shift_type = "Absolute"
//! par_shift_size = 0.0001
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ParSensitivityError;
use crate::scenarios::{KeyType, ShiftType};

/// Shift applied to the zero risk factors of one key type, and the size
/// of the par shift results are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftData {
    /// Key type the shift applies to.
    pub key_type: KeyType,
    /// How the zero shift is applied to the zero rate.
    #[serde(default)]
    pub shift_type: ShiftType,
    /// Zero shift size.
    pub shift_size: f64,
    /// How the par shift relates to the par rate.
    #[serde(default)]
    pub par_shift_type: ShiftType,
    /// Par shift size.
    pub par_shift_size: f64,
}

impl ShiftData {
    /// Absolute zero and par shifts of the same size.
    pub fn absolute(key_type: KeyType, size: f64) -> Self {
        Self {
            key_type,
            shift_type: ShiftType::Absolute,
            shift_size: size,
            par_shift_type: ShiftType::Absolute,
            par_shift_size: size,
        }
    }
}

/// Settings for [`ParSensitivityAnalysis`](super::ParSensitivityAnalysis).
///
/// # Examples
///
/// ```
/// use pricer_risk::par::ParSensitivityConfig;
/// use pricer_risk::scenarios::KeyType;
///
/// let config = ParSensitivityConfig::from_toml_str(
///     r#"
///     disabled = ["IndexCurve"]
///
///     [[shifts]]
///     key_type = "DiscountCurve"
///     shift_size = 0.0001
///     par_shift_size = 0.0001
///     "#,
/// )
/// .unwrap();
///
/// assert!(config.is_disabled(KeyType::IndexCurve));
/// assert!(config.shift_data(KeyType::DiscountCurve).is_some());
/// assert!(config.shift_data(KeyType::YieldCurve).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParSensitivityConfig {
    /// Shift per key type.
    pub shifts: Vec<ShiftData>,
    /// Par key types excluded from the analysis.
    pub disabled: BTreeSet<KeyType>,
    /// Sensitivities with magnitude at or below this value are treated as
    /// absent.
    pub closeness_threshold: f64,
}

impl Default for ParSensitivityConfig {
    fn default() -> Self {
        Self {
            shifts: KeyType::PAR_TYPES
                .iter()
                .map(|&key_type| ShiftData::absolute(key_type, 1e-4))
                .collect(),
            disabled: BTreeSet::new(),
            closeness_threshold: 1e-10,
        }
    }
}

impl ParSensitivityConfig {
    /// Default configuration: 1bp absolute shifts on every par type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`ParSensitivityError::ConfigParse`] for malformed TOML or unknown
    /// keys, otherwise the errors of [`validate`](Self::validate).
    pub fn from_toml_str(s: &str) -> Result<Self, ParSensitivityError> {
        let config: ParSensitivityConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ParSensitivityError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ParSensitivityError::ConfigParse(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Replace the shift of one key type.
    pub fn with_shift(mut self, shift: ShiftData) -> Self {
        self.shifts.retain(|s| s.key_type != shift.key_type);
        self.shifts.push(shift);
        self
    }

    /// Exclude a key type.
    pub fn with_disabled(mut self, key_type: KeyType) -> Self {
        self.disabled.insert(key_type);
        self
    }

    /// Sets the closeness threshold.
    pub fn with_closeness_threshold(mut self, threshold: f64) -> Self {
        self.closeness_threshold = threshold;
        self
    }

    /// Shift configured for a key type.
    pub fn shift_data(&self, key_type: KeyType) -> Option<&ShiftData> {
        self.shifts.iter().find(|s| s.key_type == key_type)
    }

    /// Whether a key type is excluded.
    #[inline]
    pub fn is_disabled(&self, key_type: KeyType) -> bool {
        self.disabled.contains(&key_type)
    }

    /// Whether `value` is indistinguishable from zero.
    #[inline]
    pub fn is_negligible(&self, value: f64) -> bool {
        value.abs() <= self.closeness_threshold
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// [`ParSensitivityError::InvalidConfig`] for a negative or non-finite
    /// threshold, non-finite shift sizes, shifts on non-par key types or
    /// two shifts for the same key type.
    pub fn validate(&self) -> Result<(), ParSensitivityError> {
        if !self.closeness_threshold.is_finite() || self.closeness_threshold < 0.0 {
            return Err(ParSensitivityError::InvalidConfig(format!(
                "closeness_threshold must be non-negative, got {}",
                self.closeness_threshold
            )));
        }
        let mut seen = BTreeSet::new();
        for shift in &self.shifts {
            if !shift.key_type.is_par_type() {
                return Err(ParSensitivityError::InvalidConfig(format!(
                    "{} has no par instruments",
                    shift.key_type
                )));
            }
            if !seen.insert(shift.key_type) {
                return Err(ParSensitivityError::InvalidConfig(format!(
                    "duplicate shift for {}",
                    shift.key_type
                )));
            }
            if !shift.shift_size.is_finite() || !shift.par_shift_size.is_finite() {
                return Err(ParSensitivityError::InvalidConfig(format!(
                    "shift sizes for {} must be finite",
                    shift.key_type
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ParSensitivityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shifts.len(), 4);
        assert_eq!(
            config.shift_data(KeyType::SurvivalProbability),
            Some(&ShiftData::absolute(KeyType::SurvivalProbability, 1e-4))
        );
        assert!(config.is_negligible(1e-11));
        assert!(!config.is_negligible(1e-9));
    }

    #[test]
    fn test_toml_relative_par_shift() {
        let config = ParSensitivityConfig::from_toml_str(
            r#"
            closeness_threshold = 1e-8

            [[shifts]]
            key_type = "SurvivalProbability"
            shift_size = 0.0001
            par_shift_type = "Relative"
            par_shift_size = 0.01
            "#,
        )
        .unwrap();
        let shift = config.shift_data(KeyType::SurvivalProbability).unwrap();
        assert_eq!(shift.shift_type, ShiftType::Absolute);
        assert_eq!(shift.par_shift_type, ShiftType::Relative);
        assert_eq!(config.closeness_threshold, 1e-8);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ParSensitivityConfig::from_toml_str("threshold = 1.0").unwrap_err();
        assert!(matches!(err, ParSensitivityError::ConfigParse(_)));
    }

    #[test]
    fn test_validation_failures() {
        let fx = ParSensitivityConfig::new().with_shift(ShiftData::absolute(KeyType::FxSpot, 0.01));
        assert!(matches!(fx.validate(), Err(ParSensitivityError::InvalidConfig(_))));

        let mut duplicate = ParSensitivityConfig::new();
        duplicate
            .shifts
            .push(ShiftData::absolute(KeyType::DiscountCurve, 2e-4));
        assert!(duplicate.validate().is_err());

        let negative = ParSensitivityConfig::new().with_closeness_threshold(-1.0);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_with_shift_replaces() {
        let config = ParSensitivityConfig::new()
            .with_shift(ShiftData::absolute(KeyType::DiscountCurve, 5e-4))
            .with_disabled(KeyType::YieldCurve);
        assert_eq!(config.shifts.len(), 4);
        assert_eq!(config.shift_data(KeyType::DiscountCurve).unwrap().shift_size, 5e-4);
        assert!(config.is_disabled(KeyType::YieldCurve));
        assert!(config.validate().is_ok());
    }
}
