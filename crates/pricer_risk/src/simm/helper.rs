//! Dynamic initial margin from stored SIMM sensitivities.

use nalgebra::{DMatrix, DVector};
use pricer_core::types::{Currency, CurrencyRegistry};
use pricer_xva::cube::NpvCube;
use pricer_xva::portfolio::NettingSetId;
use pricer_xva::xva::DimProfile;
use rayon::prelude::*;
use tracing::{debug, info};

use super::aggregator::{SimmAggregator, SimmInputs, SimmMargin};
use super::error::SimmError;
use super::storage::{CubeSlot, SensitivityStorage, SimmSensitivities};
use crate::par::ParSensitivityConverter;
use crate::parallel::ParallelConfig;
use crate::scenarios::KeyType;

/// SIMM IR delta bump, 1bp absolute.
pub const IR_DELTA_SHIFT: f64 = 1e-4;

/// SIMM FX delta and FX vega scaling, 1% of spot.
pub const FX_SCALING: f64 = 0.01;

/// FX delta in SIMM convention from ∂V/∂ln(FX).
///
/// SIMM wants `∂V/∂FX · 0.01 FX`; since `∂V/∂FX = (∂V/∂ln FX) / FX` the spot
/// cancels and the result is the raw delta times 0.01.
///
/// # Examples
///
/// ```
/// use pricer_risk::simm::fx_delta_for_simm;
///
/// assert_eq!(fx_delta_for_simm(250.0), 2.5);
/// ```
#[inline]
pub fn fx_delta_for_simm(raw_delta: f64) -> f64 {
    raw_delta * FX_SCALING
}

/// Par conversion block of each currency's discount curve.
///
/// # Errors
///
/// [`SimmError::MissingConversion`] if `converter` has no keys for one of
/// the currencies.
pub fn par_conversions(
    converter: &ParSensitivityConverter,
    currencies: &[Currency],
) -> Result<Vec<DMatrix<f64>>, SimmError> {
    currencies
        .iter()
        .map(|ccy| {
            converter
                .block(KeyType::DiscountCurve, ccy.code())
                .ok_or_else(|| SimmError::MissingConversion(ccy.code().to_string()))
        })
        .collect()
}

/// Initial margin of one netting set in one cube slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InitialMargin {
    /// Delta plus vega plus curvature.
    pub total: f64,
    /// IR and FX delta margin.
    pub delta: f64,
    /// IR and FX vega margin.
    pub vega: f64,
    /// IR and FX curvature margin.
    pub curvature: f64,
}

impl From<SimmMargin> for InitialMargin {
    fn from(margin: SimmMargin) -> Self {
        Self {
            total: margin.total(),
            delta: margin.delta(),
            vega: margin.vega(),
            curvature: margin.curvature(),
        }
    }
}

/// Computes SIMM initial margin per netting set, date and sample from
/// sensitivities held in an NPV cube.
///
/// Raw zero-rate deltas are turned into par deltas with one conversion
/// matrix per currency, `par = M · zero · 1bp`; FX deltas and FX vegas are
/// scaled to a 1% move; swaption vegas pass through.
#[derive(Debug, Clone)]
pub struct SimmHelper<S, A> {
    currencies: Vec<Currency>,
    storage: S,
    aggregator: A,
    conversions: Vec<DMatrix<f64>>,
    parallel: ParallelConfig,
}

impl<S: SensitivityStorage, A: SimmAggregator> SimmHelper<S, A> {
    /// Creates a helper.
    ///
    /// # Arguments
    ///
    /// * `registry` - Parses the currency codes
    /// * `currencies` - Codes in storage order, base first
    /// * `storage` - Where sensitivities are read from
    /// * `aggregator` - SIMM margin function
    /// * `conversions` - Par conversion matrix per currency, square in the
    ///   number of IR delta tenors
    ///
    /// # Errors
    ///
    /// - [`SimmError::Currency`] for a code unknown to `registry`
    /// - [`SimmError::CurrencyMismatch`] if the storage holds other currencies
    /// - [`SimmError::MissingConversion`] / [`SimmError::DimensionMismatch`]
    ///   for missing or wrongly sized conversion matrices
    pub fn new(
        registry: &CurrencyRegistry,
        currencies: &[&str],
        storage: S,
        aggregator: A,
        conversions: Vec<DMatrix<f64>>,
    ) -> Result<Self, SimmError> {
        let currencies = currencies
            .iter()
            .map(|code| registry.parse(code))
            .collect::<Result<Vec<_>, _>>()?;
        if currencies.as_slice() != storage.currencies() {
            return Err(SimmError::CurrencyMismatch {
                helper: join(&currencies),
                storage: join(storage.currencies()),
            });
        }
        if let Some(ccy) = currencies.get(conversions.len()) {
            return Err(SimmError::MissingConversion(ccy.code().to_string()));
        }
        if conversions.len() > currencies.len() {
            return Err(SimmError::DimensionMismatch {
                what: "par conversions".to_string(),
                expected: currencies.len(),
                actual: conversions.len(),
            });
        }
        let n = storage.ir_delta_terms().len();
        for (ccy, matrix) in currencies.iter().zip(&conversions) {
            if matrix.nrows() != n || matrix.ncols() != n {
                return Err(SimmError::DimensionMismatch {
                    what: format!("par conversion {}", ccy),
                    expected: n,
                    actual: matrix.nrows().max(matrix.ncols()),
                });
            }
        }
        debug!(currencies = currencies.len(), tenors = n, "SIMM helper created");
        Ok(Self {
            currencies,
            storage,
            aggregator,
            conversions,
            parallel: ParallelConfig::default(),
        })
    }

    /// Sets the sample batching of
    /// [`initial_margin_paths`](Self::initial_margin_paths).
    pub fn with_parallel_config(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Currencies, base first.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Sensitivity storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// SIMM aggregator.
    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    /// SIMM inputs from raw sensitivities.
    ///
    /// # Errors
    ///
    /// [`SimmError::DimensionMismatch`] if the sensitivities do not match the
    /// configured currencies and tenors.
    pub fn simm_inputs(
        &self,
        sensitivities: &SimmSensitivities,
    ) -> Result<SimmInputs<'_>, SimmError> {
        let n_ccy = self.currencies.len();
        check_len("IR delta currencies", n_ccy, sensitivities.ir_delta.len())?;
        check_len("FX delta", n_ccy - 1, sensitivities.fx_delta.len())?;

        let ir_delta = self
            .currencies
            .iter()
            .zip(&self.conversions)
            .zip(&sensitivities.ir_delta)
            .map(|((ccy, matrix), zero)| {
                check_len(&format!("IR delta {}", ccy), matrix.ncols(), zero.len())?;
                let par = matrix * DVector::from_column_slice(zero) * IR_DELTA_SHIFT;
                Ok(par.iter().copied().collect())
            })
            .collect::<Result<Vec<Vec<f64>>, SimmError>>()?;

        Ok(SimmInputs {
            ir_delta,
            fx_delta: sensitivities.fx_delta.iter().map(|d| fx_delta_for_simm(*d)).collect(),
            ir_vega: sensitivities.ir_vega.clone(),
            fx_vega: sensitivities
                .fx_vega
                .iter()
                .map(|row| row.iter().map(|v| v * FX_SCALING).collect())
                .collect(),
            ir_vega_terms: self.storage.ir_vega_terms(),
            fx_vega_terms: self.storage.fx_vega_terms(),
        })
    }

    /// Initial margin of a netting set.
    ///
    /// Both indices `None` selects the T0 slice.
    ///
    /// # Errors
    ///
    /// [`SimmError::MixedSlot`] if exactly one index is given, plus cube,
    /// dimension and aggregation errors.
    pub fn initial_margin(
        &self,
        cube: &dyn NpvCube,
        netting_set: &str,
        date: Option<usize>,
        sample: Option<usize>,
    ) -> Result<InitialMargin, SimmError> {
        let slot = CubeSlot::from_indices(date, sample)?;
        let sensitivities = self.storage.sensitivities(cube, netting_set, slot)?;
        let inputs = self.simm_inputs(&sensitivities)?;
        let margin = self.aggregator.margin(&inputs)?;
        Ok(margin.into())
    }

    /// Initial margin of a netting set on one date for every sample.
    pub fn initial_margin_paths(
        &self,
        cube: &dyn NpvCube,
        netting_set: &str,
        date: usize,
    ) -> Result<Vec<InitialMargin>, SimmError> {
        self.parallel.try_map_samples(cube.samples(), |sample| {
            self.initial_margin(cube, netting_set, Some(date), Some(sample))
        })
    }

    /// Expected initial margin per cube date, the sample average of the total
    /// margin, for each netting set.
    pub fn expected_dim_profile(
        &self,
        cube: &dyn NpvCube,
        netting_sets: &[NettingSetId],
    ) -> Result<DimProfile, SimmError> {
        let samples = cube.samples() as f64;
        let profile = netting_sets
            .par_iter()
            .map(|ns| {
                let profile = (0..cube.num_dates())
                    .map(|date| {
                        let paths = self.initial_margin_paths(cube, ns.as_str(), date)?;
                        Ok(paths.iter().map(|im| im.total).sum::<f64>() / samples)
                    })
                    .collect::<Result<Vec<f64>, SimmError>>()?;
                Ok((ns.clone(), profile))
            })
            .collect::<Result<DimProfile, SimmError>>()?;
        info!(
            netting_sets = profile.len(),
            dates = cube.num_dates(),
            "expected DIM profile computed"
        );
        Ok(profile)
    }
}

fn join(currencies: &[Currency]) -> String {
    currencies
        .iter()
        .map(Currency::code)
        .collect::<Vec<_>>()
        .join(",")
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<(), SimmError> {
    if expected != actual {
        return Err(SimmError::DimensionMismatch {
            what: what.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
