//! Immutable scenario snapshots.
//!
//! A [`Scenario`] maps risk factor keys to values under a label. The
//! difference between a shifted scenario and the base scenario defines a
//! shift. Scenarios are built once through consuming builder methods and
//! never mutated afterwards, so they can be shared freely across workers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::risk_factor::RiskFactorKey;

/// How a shift size is applied to a value.
///
/// # Examples
///
/// ```rust
/// use pricer_risk::scenarios::ShiftType;
///
/// assert!((ShiftType::Absolute.apply(0.02, 0.0001) - 0.0201).abs() < 1e-15);
/// assert!((ShiftType::Relative.apply(1.10, 0.01) - 1.111).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShiftType {
    /// `value + shift`
    #[default]
    Absolute,
    /// `value * (1 + shift)`
    Relative,
}

impl ShiftType {
    /// Apply `shift` to `value`.
    #[inline]
    pub fn apply(&self, value: f64, shift: f64) -> f64 {
        match self {
            ShiftType::Absolute => value + shift,
            ShiftType::Relative => value * (1.0 + shift),
        }
    }

    /// Size of the absolute change produced by `shift` on `value`.
    #[inline]
    pub fn absolute_size(&self, value: f64, shift: f64) -> f64 {
        match self {
            ShiftType::Absolute => shift,
            ShiftType::Relative => value * shift,
        }
    }
}

/// Labelled snapshot of risk factor values.
///
/// Keys absent from a scenario take their base value when the scenario is
/// applied to a simulation market.
///
/// # Examples
///
/// ```rust
/// use pricer_risk::scenarios::{RiskFactorKey, Scenario, ShiftType};
///
/// let key = RiskFactorKey::discount("EUR", 0);
/// let base = Scenario::new("base").with_value(key.clone(), 0.98);
/// let up = base.clone().relabel("up").with_shift(&key, 0.01, ShiftType::Absolute);
///
/// assert_eq!(up.label(), "up");
/// assert!((up.get(&key).unwrap() - 0.99).abs() < 1e-15);
/// assert_eq!(base.get(&key), Some(0.98));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scenario {
    label: String,
    values: BTreeMap<RiskFactorKey, f64>,
}

impl Scenario {
    /// Empty scenario.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set the value of a key.
    pub fn with_value(mut self, key: RiskFactorKey, value: f64) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Shift the value held for `key`.
    ///
    /// Keys not held by the scenario are left absent.
    pub fn with_shift(mut self, key: &RiskFactorKey, shift: f64, shift_type: ShiftType) -> Self {
        if let Some(value) = self.values.get_mut(key) {
            *value = shift_type.apply(*value, shift);
        }
        self
    }

    /// Same values under a new label.
    pub fn relabel(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Scenario label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Value of a key, if held.
    #[inline]
    pub fn get(&self, key: &RiskFactorKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Whether the scenario holds a key.
    #[inline]
    pub fn contains(&self, key: &RiskFactorKey) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &RiskFactorKey> {
        self.values.keys()
    }

    /// `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&RiskFactorKey, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the scenario holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value changes relative to `base`, for keys whose values differ.
    ///
    /// Keys held only by `self` are reported against a base of zero.
    pub fn differences(&self, base: &Scenario) -> BTreeMap<RiskFactorKey, f64> {
        self.values
            .iter()
            .filter_map(|(key, value)| {
                let diff = value - base.get(key).unwrap_or(0.0);
                (diff != 0.0).then(|| (key.clone(), diff))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ================================================================
    // ShiftType
    // ================================================================

    #[test]
    fn test_shift_type_apply() {
        assert_relative_eq!(ShiftType::Absolute.apply(100.0, 1.0), 101.0);
        assert_relative_eq!(ShiftType::Relative.apply(100.0, 0.01), 101.0);
        assert_relative_eq!(ShiftType::Relative.absolute_size(0.03, 0.01), 0.0003);
        assert_eq!(ShiftType::default(), ShiftType::Absolute);
    }

    // ================================================================
    // Scenario
    // ================================================================

    #[test]
    fn test_with_shift_ignores_absent_key() {
        let held = RiskFactorKey::discount("EUR", 0);
        let absent = RiskFactorKey::discount("EUR", 1);
        let s = Scenario::new("s")
            .with_value(held.clone(), 1.0)
            .with_shift(&absent, 0.5, ShiftType::Absolute);
        assert_eq!(s.len(), 1);
        assert!(!s.contains(&absent));
        assert_eq!(s.get(&held), Some(1.0));
    }

    #[test]
    fn test_differences() {
        let a = RiskFactorKey::discount("EUR", 0);
        let b = RiskFactorKey::discount("EUR", 1);
        let base = Scenario::new("base")
            .with_value(a.clone(), 0.99)
            .with_value(b.clone(), 0.97);
        let shifted = base
            .clone()
            .relabel("shifted")
            .with_shift(&b, -0.01, ShiftType::Absolute);

        let diff = shifted.differences(&base);
        assert_eq!(diff.len(), 1);
        assert_relative_eq!(diff[&b], -0.01, epsilon = 1e-15);
        assert!(base.differences(&base).is_empty());
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let s = Scenario::new("s")
            .with_value(RiskFactorKey::survival("B", 0), 0.9)
            .with_value(RiskFactorKey::discount("USD", 2), 0.95)
            .with_value(RiskFactorKey::discount("EUR", 1), 0.97);
        let names: Vec<&str> = s.keys().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["EUR", "USD", "B"]);
        assert!(!s.is_empty());
    }
}
