//! Par instrument sensitivities to zero risk factors.
//!
//! Each zero risk factor of an enabled par key type is bumped by its
//! configured shift, every enabled par instrument is repriced in the bumped
//! scenario, and the finite difference `(fair - base) / zero_shift` is
//! recorded under `(par key, zero key)`. Differences within the closeness
//! threshold are dropped, so an absent entry means "this par rate does not
//! depend on this zero factor".

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::ParSensitivityConfig;
use super::error::ParSensitivityError;
use super::instruments::ParInstrument;
use crate::scenarios::{KeyType, RiskFactorKey, ScenarioSimMarket, SimMarketParameters};

/// Finite-difference par sensitivities keyed by `(par key, zero key)`.
pub type ParSensitivities = BTreeMap<(RiskFactorKey, RiskFactorKey), f64>;

/// Floor for the magnitude of a credit curve's own-pillar sensitivity.
pub const MIN_CREDIT_DIAGONAL: f64 = 0.01;

/// Jacobian of par rates with respect to zero risk factors.
///
/// # Usage
///
/// ```text
/// let aligned = analysis.align_pillars();
/// let sim = ScenarioSimMarket::new(&market, aligned)?;
/// analysis.compute_par_instrument_sensitivities(&sim)?;
/// let converter = ParSensitivityConverter::new(&analysis)?;
/// ```
///
/// Par-equivalent results require the simulation market to be built on
/// [`align_pillars`](Self::align_pillars); the analysis does not check it.
pub struct ParSensitivityAnalysis {
    params: SimMarketParameters,
    config: ParSensitivityConfig,
    instruments: BTreeMap<RiskFactorKey, Box<dyn ParInstrument>>,
    par_sensitivities: ParSensitivities,
    shift_sizes: BTreeMap<RiskFactorKey, (f64, f64)>,
    base_par_rates: BTreeMap<RiskFactorKey, f64>,
    par_keys: BTreeSet<RiskFactorKey>,
    zero_keys: BTreeSet<RiskFactorKey>,
}

impl ParSensitivityAnalysis {
    /// Analysis over `instruments`, one per par key.
    ///
    /// # Errors
    ///
    /// * [`ParSensitivityError::InvalidConfig`] - Configuration fails validation
    /// * [`ParSensitivityError::DuplicateInstrument`] - Two instruments share a key
    /// * [`ParSensitivityError::InvalidInstrument`] - Pillar indices of a curve
    ///   are not `0..n`
    pub fn new(
        params: SimMarketParameters,
        config: ParSensitivityConfig,
        instruments: Vec<Box<dyn ParInstrument>>,
    ) -> Result<Self, ParSensitivityError> {
        config.validate()?;

        let mut by_key = BTreeMap::new();
        for instrument in instruments {
            let key = instrument.key().clone();
            if by_key.contains_key(&key) {
                return Err(ParSensitivityError::DuplicateInstrument(key.to_string()));
            }
            by_key.insert(key, instrument);
        }

        let mut expected: BTreeMap<(KeyType, &str), usize> = BTreeMap::new();
        for key in by_key.keys() {
            let next = expected.entry(key.group()).or_insert(0);
            if key.index != *next {
                return Err(ParSensitivityError::InvalidInstrument {
                    key: key.to_string(),
                    reason: format!("expected pillar index {}", next),
                });
            }
            *next += 1;
        }

        Ok(Self {
            params,
            config,
            instruments: by_key,
            par_sensitivities: BTreeMap::new(),
            shift_sizes: BTreeMap::new(),
            base_par_rates: BTreeMap::new(),
            par_keys: BTreeSet::new(),
            zero_keys: BTreeSet::new(),
        })
    }

    /// Exclude a par key type from the analysis.
    ///
    /// Types without par instruments are ignored.
    pub fn disable(&mut self, key_type: KeyType) {
        if key_type.is_par_type() {
            self.config.disabled.insert(key_type);
        } else {
            debug!(key_type = %key_type, "Ignoring disable for non-par key type");
        }
    }

    /// Whether a key type takes part in the analysis.
    #[inline]
    pub fn is_enabled(&self, key_type: KeyType) -> bool {
        key_type.is_par_type() && !self.config.is_disabled(key_type)
    }

    /// Simulation market parameters with each calibrated curve's pillars
    /// moved to its instruments' maturities.
    ///
    /// The stored parameters are left unchanged.
    pub fn align_pillars(&self) -> SimMarketParameters {
        let mut tenors: BTreeMap<(KeyType, &str), Vec<f64>> = BTreeMap::new();
        for (key, instrument) in &self.instruments {
            if self.is_enabled(key.key_type) {
                tenors.entry(key.group()).or_default().push(instrument.maturity());
            }
        }
        tenors
            .into_iter()
            .fold(self.params.clone(), |params, ((key_type, name), pillars)| {
                debug!(key_type = %key_type, name, pillars = ?pillars, "Aligned pillars");
                params.with_tenors(key_type, name, pillars)
            })
    }

    /// Bump every enabled zero risk factor and reprice every enabled par
    /// instrument.
    ///
    /// Replaces results of any earlier run.
    ///
    /// # Errors
    ///
    /// * [`ParSensitivityError::MissingShiftData`] - An enabled key type has
    ///   no configured shift
    /// * [`ParSensitivityError::MarketData`] - A par instrument cannot be
    ///   priced; missing curves are fatal
    /// * [`ParSensitivityError::Scenario`] - A scenario cannot be applied
    pub fn compute_par_instrument_sensitivities(
        &mut self,
        sim_market: &ScenarioSimMarket<'_>,
    ) -> Result<(), ParSensitivityError> {
        let instruments: Vec<&dyn ParInstrument> = self
            .instruments
            .values()
            .filter(|i| self.is_enabled(i.key().key_type))
            .map(|i| i.as_ref())
            .collect();

        let base_market = sim_market.scenario_market(sim_market.base_scenario())?;
        let mut base_par_rates = BTreeMap::new();
        for instrument in &instruments {
            base_par_rates.insert(instrument.key().clone(), instrument.fair_rate(&base_market)?);
        }

        let zero_keys: Vec<RiskFactorKey> = sim_market
            .keys()
            .into_iter()
            .filter(|k| self.is_enabled(k.key_type))
            .collect();

        let mut shift_sizes = BTreeMap::new();
        for key in &zero_keys {
            let shift = self
                .config
                .shift_data(key.key_type)
                .ok_or(ParSensitivityError::MissingShiftData(key.key_type))?;
            let zero_shift = shift
                .shift_type
                .absolute_size(sim_market.zero_rate(key)?, shift.shift_size);
            let par_shift = match base_par_rates.get(key) {
                Some(&rate) => shift.par_shift_type.absolute_size(rate, shift.par_shift_size),
                None => shift.par_shift_size,
            };
            shift_sizes.insert(key.clone(), (zero_shift, par_shift));
        }

        let config = &self.config;
        let rows = zero_keys
            .par_iter()
            .map(|zero_key| -> Result<_, ParSensitivityError> {
                let (zero_shift, _) = shift_sizes[zero_key];
                if config.is_negligible(zero_shift) {
                    warn!(key = %zero_key, "Zero shift size is zero, skipping");
                    return Ok(Vec::new());
                }
                let Some(shift) = config.shift_data(zero_key.key_type) else {
                    return Ok(Vec::new());
                };
                let scenario =
                    sim_market.shifted_scenario(zero_key, shift.shift_size, shift.shift_type)?;
                let market = sim_market.scenario_market(&scenario)?;

                let mut row = Vec::new();
                for instrument in &instruments {
                    let par_key = instrument.key();
                    let base = base_par_rates[par_key];
                    let mut sensitivity = (instrument.fair_rate(&market)? - base) / zero_shift;
                    if par_key == zero_key
                        && par_key.key_type == KeyType::SurvivalProbability
                        && sensitivity.abs() < MIN_CREDIT_DIAGONAL
                    {
                        warn!(
                            key = %par_key,
                            sensitivity,
                            floor = MIN_CREDIT_DIAGONAL,
                            "Credit par sensitivity below floor, replacing"
                        );
                        sensitivity = MIN_CREDIT_DIAGONAL;
                    }
                    if !config.is_negligible(sensitivity) {
                        row.push(((par_key.clone(), zero_key.clone()), sensitivity));
                    }
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let par_sensitivities: ParSensitivities = rows.into_iter().flatten().collect();
        let par_keys: BTreeSet<_> = par_sensitivities.keys().map(|(p, _)| p.clone()).collect();
        let zero_key_set: BTreeSet<_> = par_sensitivities.keys().map(|(_, z)| z.clone()).collect();

        for key in base_par_rates.keys().filter(|k| !par_keys.contains(*k)) {
            warn!(key = %key, "Par instrument has no sensitivity to any zero factor");
        }
        for key in zero_keys.iter().filter(|k| !zero_key_set.contains(*k)) {
            warn!(key = %key, "No par instrument depends on zero factor");
        }
        info!(
            zero_keys = zero_keys.len(),
            instruments = base_par_rates.len(),
            entries = par_sensitivities.len(),
            "Computed par instrument sensitivities"
        );

        self.par_sensitivities = par_sensitivities;
        self.shift_sizes = shift_sizes;
        self.base_par_rates = base_par_rates;
        self.par_keys = par_keys;
        self.zero_keys = zero_key_set;
        Ok(())
    }

    /// Sensitivities keyed by `(par key, zero key)`.
    #[inline]
    pub fn par_sensitivities(&self) -> &ParSensitivities {
        &self.par_sensitivities
    }

    /// Sensitivity of one par rate to one zero factor; zero when absent.
    pub fn par_sensitivity(&self, par_key: &RiskFactorKey, zero_key: &RiskFactorKey) -> f64 {
        self.par_sensitivities
            .get(&(par_key.clone(), zero_key.clone()))
            .copied()
            .unwrap_or(0.0)
    }

    /// `(zero shift, par shift)` in absolute rate terms, per key.
    #[inline]
    pub fn shift_sizes(&self) -> &BTreeMap<RiskFactorKey, (f64, f64)> {
        &self.shift_sizes
    }

    /// Par rates in the base scenario.
    #[inline]
    pub fn base_par_rates(&self) -> &BTreeMap<RiskFactorKey, f64> {
        &self.base_par_rates
    }

    /// Par keys with at least one sensitivity.
    #[inline]
    pub fn par_keys(&self) -> &BTreeSet<RiskFactorKey> {
        &self.par_keys
    }

    /// Zero keys at least one par rate depends on.
    #[inline]
    pub fn zero_keys(&self) -> &BTreeSet<RiskFactorKey> {
        &self.zero_keys
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &ParSensitivityConfig {
        &self.config
    }

    /// Simulation market parameters given at construction.
    #[inline]
    pub fn params(&self) -> &SimMarketParameters {
        &self.params
    }

    /// Instrument calibrating a par key.
    pub fn instrument(&self, key: &RiskFactorKey) -> Option<&dyn ParInstrument> {
        self.instruments.get(key).map(|i| i.as_ref())
    }
}
