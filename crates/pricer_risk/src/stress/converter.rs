//! Par stress scenario conversion.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::dependency::{DependencyGraph, DependencyOrder};
use super::error::StressError;
use crate::par::{ParSensitivities, ParSensitivityAnalysis};
use crate::scenarios::{ParFamily, RiskFactorKey, Scenario, ScenarioSimMarket, ShiftType};

/// Stress scenario holding shocks to par rates and to zero factors.
///
/// Zero shifts are absolute changes of the continuously compounded zero
/// rate (or average hazard rate) at a pillar, or of the FX spot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StressScenario {
    label: String,
    par_shifts: BTreeMap<RiskFactorKey, f64>,
    zero_shifts: BTreeMap<RiskFactorKey, f64>,
}

impl StressScenario {
    /// Empty scenario.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Adds an absolute par rate shift.
    pub fn with_par_shift(mut self, key: RiskFactorKey, shift: f64) -> Self {
        self.par_shifts.insert(key, shift);
        self
    }

    /// Adds an absolute zero shift.
    pub fn with_zero_shift(mut self, key: RiskFactorKey, shift: f64) -> Self {
        self.zero_shifts.insert(key, shift);
        self
    }

    /// Scenario label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Par rate shifts.
    pub fn par_shifts(&self) -> &BTreeMap<RiskFactorKey, f64> {
        &self.par_shifts
    }

    /// Zero shifts.
    pub fn zero_shifts(&self) -> &BTreeMap<RiskFactorKey, f64> {
        &self.zero_shifts
    }

    /// Whether the scenario needs conversion.
    #[inline]
    pub fn has_par_shifts(&self) -> bool {
        !self.par_shifts.is_empty()
    }

    /// Applies the zero shifts to the simulation market base scenario.
    ///
    /// # Errors
    ///
    /// [`StressError::PendingParShifts`] if par shifts remain, or the
    /// scenario error of a key unknown to `sim_market`.
    pub fn to_scenario(&self, sim_market: &ScenarioSimMarket<'_>) -> Result<Scenario, StressError> {
        if self.has_par_shifts() {
            return Err(StressError::PendingParShifts(self.label.clone()));
        }
        let mut scenario = Scenario::new(self.label.clone());
        for (key, &shift) in &self.zero_shifts {
            let shifted = sim_market.shifted_scenario(key, shift, ShiftType::Absolute)?;
            if let Some(value) = shifted.get(key) {
                scenario = scenario.with_value(key.clone(), value);
            }
        }
        Ok(scenario)
    }
}

/// Converts par stress scenarios into equivalent zero shifts.
///
/// With `J[A, z] = ∂par_A/∂zero_z`, a par shift is the linearised response
/// `Δpar_A = Σ_z J[A, z] Δz`. Walking the par keys in dependency order each
/// key has exactly one unknown left, its own pillar:
///
/// ```text
/// Δz_A = (Δpar_A − Σ_{z ≠ A} J[A, z] Δz) / J[A, A]
/// ```
///
/// Par keys are solved per [`ParFamily`]: once a scenario shocks any rates
/// curve, every rates par key is solved, and likewise for credit. Keys of a
/// solved family without an explicit shift keep their par rate, so an
/// index curve is compensated for a shocked discount curve. Zero shifts of
/// families the scenario does not shock are taken from the input scenario.
#[derive(Debug, Clone)]
pub struct ParStressScenarioConverter {
    jacobian: BTreeMap<RiskFactorKey, BTreeMap<RiskFactorKey, f64>>,
    order: Vec<RiskFactorKey>,
    threshold: f64,
}

impl ParStressScenarioConverter {
    /// Converter over a computed par sensitivity analysis.
    ///
    /// # Errors
    ///
    /// [`StressError::CyclicDependency`] if the par keys cannot be ordered.
    pub fn new(analysis: &ParSensitivityAnalysis) -> Result<Self, StressError> {
        Self::from_sensitivities(
            analysis.par_sensitivities(),
            analysis.config().closeness_threshold,
        )
    }

    /// Converter over raw par sensitivities.
    ///
    /// # Arguments
    ///
    /// * `sensitivities` - (par key, zero key) → ∂par/∂zero
    /// * `threshold` - Sensitivities at or below this magnitude are treated
    ///   as absent
    ///
    /// # Errors
    ///
    /// [`StressError::CyclicDependency`] if the par keys cannot be ordered.
    pub fn from_sensitivities(
        sensitivities: &ParSensitivities,
        threshold: f64,
    ) -> Result<Self, StressError> {
        let graph = DependencyGraph::from_sensitivities(sensitivities, threshold);
        let DependencyOrder {
            ordered,
            unresolved,
        } = graph.topological_order();

        if !unresolved.is_empty() {
            for key in &unresolved {
                warn!(key = %key, "par key on a dependency cycle");
            }
            return Err(StressError::CyclicDependency {
                unresolved: unresolved.iter().map(ToString::to_string).collect(),
            });
        }

        let mut jacobian: BTreeMap<RiskFactorKey, BTreeMap<RiskFactorKey, f64>> = BTreeMap::new();
        for ((par_key, zero_key), &value) in sensitivities {
            let row = jacobian.entry(par_key.clone()).or_default();
            if value.abs() > threshold {
                row.insert(zero_key.clone(), value);
            }
        }

        debug!(
            keys = ordered.len(),
            edges = graph.edge_count(),
            "par dependency order built"
        );

        Ok(Self {
            jacobian,
            order: ordered,
            threshold,
        })
    }

    /// Par keys in conversion order.
    pub fn order(&self) -> &[RiskFactorKey] {
        &self.order
    }

    /// Sensitivity ∂par/∂zero used by the conversion, zero when negligible.
    pub fn sensitivity(&self, par_key: &RiskFactorKey, zero_key: &RiskFactorKey) -> f64 {
        self.jacobian
            .get(par_key)
            .and_then(|row| row.get(zero_key))
            .copied()
            .unwrap_or(0.0)
    }

    /// Converts one scenario.
    ///
    /// Scenarios without par shifts are returned unchanged. The result
    /// carries zero shifts only.
    ///
    /// # Errors
    ///
    /// - [`StressError::UnknownParKey`] for a par shift on a key without par
    ///   sensitivities
    /// - [`StressError::SingularDiagonal`] if a par rate does not move with
    ///   its own zero pillar
    pub fn convert_scenario(
        &self,
        scenario: &StressScenario,
    ) -> Result<StressScenario, StressError> {
        if !scenario.has_par_shifts() {
            return Ok(scenario.clone());
        }

        let mut families: BTreeSet<ParFamily> = BTreeSet::new();
        for key in scenario.par_shifts.keys() {
            let family = key.key_type.par_family();
            match family {
                Some(family) if self.jacobian.contains_key(key) => families.insert(family),
                _ => return Err(StressError::UnknownParKey(key.to_string())),
            };
        }

        let mut zero_shifts = scenario.zero_shifts.clone();
        for key in &self.order {
            let solved = key.key_type.par_family().is_some_and(|f| families.contains(&f));
            if !solved {
                continue;
            }
            let par_shift = scenario.par_shifts.get(key).copied().unwrap_or(0.0);
            let row = self.jacobian.get(key);
            let diagonal = row.and_then(|r| r.get(key)).copied().unwrap_or(0.0);
            if diagonal.abs() <= self.threshold {
                return Err(StressError::SingularDiagonal {
                    key: key.to_string(),
                    value: diagonal,
                });
            }
            let known: f64 = row
                .into_iter()
                .flatten()
                .filter(|(zero_key, _)| *zero_key != key)
                .map(|(zero_key, value)| value * shift_of(&zero_shifts, zero_key))
                .sum();
            zero_shifts.insert(key.clone(), (par_shift - known) / diagonal);
        }

        Ok(StressScenario {
            label: scenario.label.clone(),
            par_shifts: BTreeMap::new(),
            zero_shifts,
        })
    }

    /// Converts a batch of scenarios in parallel.
    ///
    /// A scenario that fails to convert is logged and left out; the others
    /// keep their input order.
    pub fn convert_scenarios(&self, scenarios: &[StressScenario]) -> Vec<StressScenario> {
        let converted: Vec<StressScenario> = scenarios
            .par_iter()
            .filter_map(|scenario| match self.convert_scenario(scenario) {
                Ok(converted) => Some(converted),
                Err(e) => {
                    warn!(scenario = %scenario.label(), error = %e, "skipping stress scenario");
                    None
                }
            })
            .collect();

        info!(
            requested = scenarios.len(),
            converted = converted.len(),
            "stress scenarios converted"
        );
        converted
    }

    /// Par shifts implied by zero shifts, `Δpar = J Δz`.
    pub fn implied_par_shifts(
        &self,
        zero_shifts: &BTreeMap<RiskFactorKey, f64>,
    ) -> BTreeMap<RiskFactorKey, f64> {
        self.jacobian
            .iter()
            .map(|(par_key, row)| {
                let shift: f64 = row
                    .iter()
                    .map(|(zero_key, value)| value * shift_of(zero_shifts, zero_key))
                    .sum();
                (par_key.clone(), shift)
            })
            .collect()
    }
}

fn shift_of(shifts: &BTreeMap<RiskFactorKey, f64>, key: &RiskFactorKey) -> f64 {
    shifts.get(key).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::KeyType;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn eur(i: usize) -> RiskFactorKey {
        RiskFactorKey::discount("EUR", i)
    }

    fn cds(i: usize) -> RiskFactorKey {
        RiskFactorKey::survival("CPTY_A", i)
    }

    fn euribor(i: usize) -> RiskFactorKey {
        RiskFactorKey::new(KeyType::IndexCurve, "EUR-EURIBOR-6M", i)
    }

    /// Two EUR pillars, one CDS pillar depending on both.
    fn sensitivities() -> ParSensitivities {
        [
            ((eur(0), eur(0)), 1.0),
            ((eur(1), eur(0)), -0.5),
            ((eur(1), eur(1)), 1.5),
            ((cds(0), eur(0)), 0.02),
            ((cds(0), eur(1)), 0.01),
            ((cds(0), cds(0)), 0.9),
        ]
        .into_iter()
        .collect()
    }

    fn converter() -> ParStressScenarioConverter {
        ParStressScenarioConverter::from_sensitivities(&sensitivities(), 1e-10).unwrap()
    }

    // ========================================
    // Construction
    // ========================================

    #[test]
    fn test_order_respects_dependencies() {
        let converter = converter();
        let order = converter.order();
        let at = |k: &RiskFactorKey| order.iter().position(|o| o == k).unwrap();
        assert_eq!(order.len(), 3);
        assert!(at(&eur(0)) < at(&eur(1)));
        assert!(at(&eur(1)) < at(&cds(0)));
    }

    #[test]
    fn test_cycle_rejected() {
        let cyclic: ParSensitivities = [
            ((eur(0), eur(0)), 1.0),
            ((eur(0), eur(1)), 0.3),
            ((eur(1), eur(0)), 0.3),
            ((eur(1), eur(1)), 1.0),
        ]
        .into_iter()
        .collect();

        let err = ParStressScenarioConverter::from_sensitivities(&cyclic, 1e-10).unwrap_err();

        match err {
            StressError::CyclicDependency { unresolved } => assert_eq!(unresolved.len(), 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_negligible_coupling_is_not_a_cycle() {
        let weak: ParSensitivities = [
            ((eur(0), eur(0)), 1.0),
            ((eur(0), eur(1)), 1e-12),
            ((eur(1), eur(0)), 0.3),
            ((eur(1), eur(1)), 1.0),
        ]
        .into_iter()
        .collect();

        let converter = ParStressScenarioConverter::from_sensitivities(&weak, 1e-10).unwrap();
        assert_eq!(converter.sensitivity(&eur(0), &eur(1)), 0.0);
    }

    // ========================================
    // Conversion
    // ========================================

    #[test]
    fn test_single_pillar_par_shift() {
        let five_year = eur(4);
        let sensitivities: ParSensitivities =
            [((five_year.clone(), five_year.clone()), 1.02)].into_iter().collect();
        let converter =
            ParStressScenarioConverter::from_sensitivities(&sensitivities, 1e-10).unwrap();

        let zero = BTreeMap::from([(five_year.clone(), 1e-4)]);
        let implied = converter.implied_par_shifts(&zero);
        assert!((implied[&five_year] - 1.02e-4).abs() < 1e-8);

        let scenario = StressScenario::new("EUR 5Y").with_par_shift(five_year.clone(), 1.02e-4);
        let converted = converter.convert_scenario(&scenario).unwrap();
        assert_relative_eq!(converted.zero_shifts()[&five_year], 1e-4, epsilon = 1e-14);
        assert!(!converted.has_par_shifts());
    }

    #[test]
    fn test_zero_only_scenario_unchanged() {
        let scenario = StressScenario::new("zero").with_zero_shift(eur(0), 1e-3);
        assert_eq!(converter().convert_scenario(&scenario).unwrap(), scenario);
    }

    #[test]
    fn test_par_zero_round_trip() {
        let converter = converter();
        let zero = BTreeMap::from([(eur(0), 1e-4), (eur(1), -2e-4), (cds(0), 5e-4)]);

        let scenario = converter
            .implied_par_shifts(&zero)
            .into_iter()
            .fold(StressScenario::new("round trip"), |s, (k, v)| s.with_par_shift(k, v));
        let converted = converter.convert_scenario(&scenario).unwrap();

        for (key, expected) in &zero {
            assert_relative_eq!(converted.zero_shifts()[key], *expected, epsilon = 1e-15);
        }
        assert_eq!(converted.label(), "round trip");
    }

    #[test]
    fn test_unshifted_pillars_keep_par_rate() {
        let converter = converter();
        let scenario = StressScenario::new("short end").with_par_shift(eur(0), 1e-4);

        let converted = converter.convert_scenario(&scenario).unwrap();
        let implied = converter.implied_par_shifts(converted.zero_shifts());

        assert_relative_eq!(implied[&eur(0)], 1e-4, epsilon = 1e-15);
        assert_relative_eq!(implied[&eur(1)], 0.0, epsilon = 1e-15);
        // credit curve not par-shifted, so its zero pillar stays put
        assert!(!converted.zero_shifts().contains_key(&cds(0)));
    }

    #[test]
    fn test_index_curve_held_when_discount_curve_shocked() {
        let sensitivities: ParSensitivities = [
            ((eur(0), eur(0)), 1.0),
            ((euribor(0), eur(0)), 0.3),
            ((euribor(0), euribor(0)), 0.9),
            ((cds(0), eur(0)), 0.02),
            ((cds(0), cds(0)), 0.9),
        ]
        .into_iter()
        .collect();
        let converter =
            ParStressScenarioConverter::from_sensitivities(&sensitivities, 1e-10).unwrap();
        let scenario = StressScenario::new("EUR discount").with_par_shift(eur(0), 1e-2);

        let converted = converter.convert_scenario(&scenario).unwrap();
        let implied = converter.implied_par_shifts(converted.zero_shifts());

        assert_relative_eq!(converted.zero_shifts()[&eur(0)], 1e-2, epsilon = 1e-15);
        assert_relative_eq!(
            converted.zero_shifts()[&euribor(0)],
            -0.3e-2 / 0.9,
            epsilon = 1e-15
        );
        assert_relative_eq!(implied[&eur(0)], 1e-2, epsilon = 1e-15);
        assert_abs_diff_eq!(implied[&euribor(0)], 0.0, epsilon = 1e-15);
        // credit is a separate family and not par-shifted here
        assert!(!converted.zero_shifts().contains_key(&cds(0)));
    }

    #[test]
    fn test_unshocked_rates_keys_imply_no_par_shift() {
        let sensitivities: ParSensitivities = [
            ((eur(0), eur(0)), 1.0),
            ((eur(1), eur(0)), -0.5),
            ((eur(1), eur(1)), 1.5),
            ((euribor(0), eur(0)), 0.3),
            ((euribor(0), euribor(0)), 0.9),
            ((euribor(1), eur(1)), 0.2),
            ((euribor(1), euribor(0)), -0.4),
            ((euribor(1), euribor(1)), 1.1),
        ]
        .into_iter()
        .collect();
        let converter =
            ParStressScenarioConverter::from_sensitivities(&sensitivities, 1e-10).unwrap();
        let scenario = StressScenario::new("EUR 1Y").with_par_shift(eur(1), -2.5e-3);

        let converted = converter.convert_scenario(&scenario).unwrap();
        let implied = converter.implied_par_shifts(converted.zero_shifts());

        for (key, shift) in &implied {
            let expected = scenario.par_shifts().get(key).copied().unwrap_or(0.0);
            assert_abs_diff_eq!(*shift, expected, epsilon = 1e-15);
        }
        assert_eq!(implied.len(), 4);
    }

    #[test]
    fn test_dependency_on_input_zero_shift() {
        let converter = converter();
        let scenario = StressScenario::new("credit")
            .with_zero_shift(eur(0), 1e-3)
            .with_par_shift(cds(0), 0.0);

        let converted = converter.convert_scenario(&scenario).unwrap();

        // 0.02 * 1e-3 + 0.9 * dz = 0
        assert_relative_eq!(converted.zero_shifts()[&cds(0)], -0.02e-3 / 0.9, epsilon = 1e-15);
        assert_relative_eq!(converted.zero_shifts()[&eur(0)], 1e-3);
    }

    #[test]
    fn test_unknown_par_key() {
        let scenario =
            StressScenario::new("usd").with_par_shift(RiskFactorKey::discount("USD", 0), 1e-4);
        assert!(matches!(
            converter().convert_scenario(&scenario),
            Err(StressError::UnknownParKey(_))
        ));
    }

    #[test]
    fn test_singular_diagonal() {
        let sensitivities: ParSensitivities =
            [((eur(0), eur(0)), 0.0), ((eur(1), eur(1)), 1.0)].into_iter().collect();
        let converter =
            ParStressScenarioConverter::from_sensitivities(&sensitivities, 1e-10).unwrap();

        let scenario = StressScenario::new("bad").with_par_shift(eur(1), 1e-4);
        assert!(matches!(
            converter.convert_scenario(&scenario),
            Err(StressError::SingularDiagonal { .. })
        ));
    }

    #[test]
    fn test_batch_skips_failures_and_keeps_order() {
        let converter = converter();
        let scenarios = vec![
            StressScenario::new("first").with_par_shift(eur(0), 1e-4),
            StressScenario::new("broken").with_par_shift(RiskFactorKey::discount("GBP", 0), 1e-4),
            StressScenario::new("third").with_zero_shift(cds(0), 1e-4),
        ];

        let converted = converter.convert_scenarios(&scenarios);

        let labels: Vec<&str> = converted.iter().map(StressScenario::label).collect();
        assert_eq!(labels, vec!["first", "third"]);
    }
}
