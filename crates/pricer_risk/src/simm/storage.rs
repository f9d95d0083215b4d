//! SIMM sensitivities stored in NPV cube depth slots.
//!
//! Each netting set cell holds, from the first configured depth index:
//!
//! ```text
//! ┌─────────────┬──────────┬───────┬──────────────┬────────────────────┐
//! │ IR delta    │ FX delta │ theta │ IR vega      │ FX vega            │
//! │ ccy × tenor │ ccy − 1  │ 1     │ ccy × expiry │ (ccy − 1) × expiry │
//! └─────────────┴──────────┴───────┴──────────────┴────────────────────┘
//! ```
//!
//! The first currency is the base currency and carries no FX risk.

use pricer_core::types::Currency;
use pricer_xva::cube::NpvCube;
use tracing::{debug, trace};

use super::error::SimmError;

/// SIMM interest rate tenors 2W, 1M, 3M, 6M, 1Y, 2Y, 3Y, 5Y, 10Y, 15Y,
/// 20Y and 30Y in years.
pub const SIMM_TENORS: [f64; 12] = [
    14.0 / 365.0,
    1.0 / 12.0,
    0.25,
    0.5,
    1.0,
    2.0,
    3.0,
    5.0,
    10.0,
    15.0,
    20.0,
    30.0,
];

/// Cube slice addressed by a sensitivity read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeSlot {
    /// Valuation date slice.
    T0,
    /// Simulated slice.
    Sample {
        /// Date index
        date: usize,
        /// Sample index
        sample: usize,
    },
}

impl CubeSlot {
    /// Slot from optional indices; both absent selects T0.
    ///
    /// # Errors
    ///
    /// [`SimmError::MixedSlot`] if exactly one index is given.
    pub fn from_indices(date: Option<usize>, sample: Option<usize>) -> Result<Self, SimmError> {
        match (date, sample) {
            (None, None) => Ok(CubeSlot::T0),
            (Some(date), Some(sample)) => Ok(CubeSlot::Sample { date, sample }),
            _ => Err(SimmError::MixedSlot { date, sample }),
        }
    }

    fn get(&self, cube: &dyn NpvCube, id: usize, depth: usize) -> Result<f64, SimmError> {
        Ok(match *self {
            CubeSlot::T0 => cube.get_t0(id, depth)?,
            CubeSlot::Sample { date, sample } => cube.get(id, date, sample, depth)?,
        })
    }

    fn set(
        &self,
        cube: &mut dyn NpvCube,
        value: f64,
        id: usize,
        depth: usize,
    ) -> Result<(), SimmError> {
        match *self {
            CubeSlot::T0 => cube.set_t0(value, id, depth)?,
            CubeSlot::Sample { date, sample } => cube.set(value, id, date, sample, depth)?,
        }
        Ok(())
    }
}

/// Raw sensitivities of one netting set in one cube slot.
///
/// IR deltas are ∂V/∂z per unit zero rate, FX deltas ∂V/∂ln(FX).
#[derive(Debug, Clone, PartialEq)]
pub struct SimmSensitivities {
    /// IR delta per currency and tenor.
    pub ir_delta: Vec<Vec<f64>>,
    /// FX delta per non-base currency.
    pub fx_delta: Vec<f64>,
    /// Theta.
    pub theta: f64,
    /// Swaption vega per currency and expiry.
    pub ir_vega: Vec<Vec<f64>>,
    /// FX option vega per non-base currency and expiry.
    pub fx_vega: Vec<Vec<f64>>,
}

impl SimmSensitivities {
    /// Zero sensitivities of the given shape.
    pub fn zeros(
        currencies: usize,
        delta_terms: usize,
        ir_vega_terms: usize,
        fx_vega_terms: usize,
    ) -> Self {
        let pairs = currencies.saturating_sub(1);
        Self {
            ir_delta: vec![vec![0.0; delta_terms]; currencies],
            fx_delta: vec![0.0; pairs],
            theta: 0.0,
            ir_vega: vec![vec![0.0; ir_vega_terms]; currencies],
            fx_vega: vec![vec![0.0; fx_vega_terms]; pairs],
        }
    }
}

/// Reads and writes SIMM sensitivities in an NPV cube.
pub trait SensitivityStorage: Send + Sync {
    /// Number of depth slots used per cell.
    fn required_size(&self) -> usize;

    /// Currencies, base first.
    fn currencies(&self) -> &[Currency];

    /// IR delta tenors in years.
    fn ir_delta_terms(&self) -> &[f64];

    /// Swaption vega expiries in years.
    fn ir_vega_terms(&self) -> &[f64];

    /// FX vega expiries in years.
    fn fx_vega_terms(&self) -> &[f64];

    /// Adds `sensitivities` to the netting set cell in `slot`.
    fn add_sensitivities(
        &self,
        cube: &mut dyn NpvCube,
        netting_set: &str,
        sensitivities: &SimmSensitivities,
        slot: CubeSlot,
    ) -> Result<(), SimmError>;

    /// Sensitivities stored for the netting set in `slot`.
    fn sensitivities(
        &self,
        cube: &dyn NpvCube,
        netting_set: &str,
        slot: CubeSlot,
    ) -> Result<SimmSensitivities, SimmError>;
}

/// [`SensitivityStorage`] writing the flattened layout from a fixed depth
/// index onwards.
///
/// # Examples
///
/// ```
/// use pricer_core::types::Currency;
/// use pricer_risk::simm::{CubeSensitivityStorage, SensitivityStorage};
///
/// let storage = CubeSensitivityStorage::new(vec![Currency::EUR, Currency::USD], 1).unwrap();
///
/// // 2 × 12 IR delta, 1 FX delta, theta, 2 × 12 IR vega, 1 × 12 FX vega
/// assert_eq!(storage.required_size(), 24 + 1 + 1 + 24 + 12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CubeSensitivityStorage {
    currencies: Vec<Currency>,
    first_index: usize,
    ir_delta_terms: Vec<f64>,
    ir_vega_terms: Vec<f64>,
    fx_vega_terms: Vec<f64>,
}

impl CubeSensitivityStorage {
    /// Storage over `currencies` (base first) using the SIMM tenors for
    /// every term structure.
    ///
    /// # Errors
    ///
    /// [`SimmError::NoCurrencies`] if `currencies` is empty.
    pub fn new(currencies: Vec<Currency>, first_index: usize) -> Result<Self, SimmError> {
        if currencies.is_empty() {
            return Err(SimmError::NoCurrencies);
        }
        let storage = Self {
            currencies,
            first_index,
            ir_delta_terms: SIMM_TENORS.to_vec(),
            ir_vega_terms: SIMM_TENORS.to_vec(),
            fx_vega_terms: SIMM_TENORS.to_vec(),
        };
        debug!(
            depth = storage.required_size(),
            currencies = storage.currencies.len(),
            first_index,
            "SIMM sensitivity storage created"
        );
        Ok(storage)
    }

    /// Replaces the IR delta tenors.
    pub fn with_ir_delta_terms(mut self, terms: Vec<f64>) -> Self {
        self.ir_delta_terms = terms;
        self
    }

    /// Replaces the swaption vega expiries.
    pub fn with_ir_vega_terms(mut self, terms: Vec<f64>) -> Self {
        self.ir_vega_terms = terms;
        self
    }

    /// Replaces the FX vega expiries.
    pub fn with_fx_vega_terms(mut self, terms: Vec<f64>) -> Self {
        self.fx_vega_terms = terms;
        self
    }

    /// First depth index used.
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    fn pairs(&self) -> usize {
        self.currencies.len() - 1
    }

    fn check(&self, sensitivities: &SimmSensitivities) -> Result<(), SimmError> {
        let n_ccy = self.currencies.len();
        check_len("IR delta currencies", n_ccy, sensitivities.ir_delta.len())?;
        check_len("FX delta", self.pairs(), sensitivities.fx_delta.len())?;
        check_len("IR vega currencies", n_ccy, sensitivities.ir_vega.len())?;
        check_len("FX vega pairs", self.pairs(), sensitivities.fx_vega.len())?;
        for (ccy, row) in self.currencies.iter().zip(&sensitivities.ir_delta) {
            check_len(&format!("IR delta {}", ccy), self.ir_delta_terms.len(), row.len())?;
        }
        for (ccy, row) in self.currencies.iter().zip(&sensitivities.ir_vega) {
            check_len(&format!("IR vega {}", ccy), self.ir_vega_terms.len(), row.len())?;
        }
        for (ccy, row) in self.currencies.iter().skip(1).zip(&sensitivities.fx_vega) {
            check_len(&format!("FX vega {}", ccy), self.fx_vega_terms.len(), row.len())?;
        }
        Ok(())
    }

    fn serialise(&self, sensitivities: &SimmSensitivities) -> Result<Vec<f64>, SimmError> {
        self.check(sensitivities)?;
        let mut data = Vec::with_capacity(self.required_size());
        data.extend(sensitivities.ir_delta.iter().flatten());
        data.extend(&sensitivities.fx_delta);
        data.push(sensitivities.theta);
        data.extend(sensitivities.ir_vega.iter().flatten());
        data.extend(sensitivities.fx_vega.iter().flatten());
        if let Some(value) = data.iter().find(|v| !v.is_finite()) {
            return Err(SimmError::NonFinite {
                what: "sensitivity".to_string(),
                value: *value,
            });
        }
        Ok(data)
    }

    fn deserialise(&self, data: &[f64]) -> SimmSensitivities {
        let n_delta = self.ir_delta_terms.len();
        let n_ir_vega = self.ir_vega_terms.len();
        let n_fx_vega = self.fx_vega_terms.len();
        let n_ccy = self.currencies.len();
        let pairs = self.pairs();

        let (ir_delta, rest) = data.split_at(n_ccy * n_delta);
        let (fx_delta, rest) = rest.split_at(pairs);
        let (theta, rest) = rest.split_at(1);
        let (ir_vega, fx_vega) = rest.split_at(n_ccy * n_ir_vega);

        SimmSensitivities {
            ir_delta: chunks(ir_delta, n_delta, n_ccy),
            fx_delta: fx_delta.to_vec(),
            theta: theta[0],
            ir_vega: chunks(ir_vega, n_ir_vega, n_ccy),
            fx_vega: chunks(fx_vega, n_fx_vega, pairs),
        }
    }

    fn check_depth(&self, cube: &dyn NpvCube) -> Result<(), SimmError> {
        let needed = self.first_index + self.required_size();
        if needed > cube.depth() {
            return Err(SimmError::DimensionMismatch {
                what: "cube depth".to_string(),
                expected: needed,
                actual: cube.depth(),
            });
        }
        Ok(())
    }
}

impl SensitivityStorage for CubeSensitivityStorage {
    fn required_size(&self) -> usize {
        let n_ccy = self.currencies.len();
        let pairs = self.pairs();
        n_ccy * self.ir_delta_terms.len()
            + pairs
            + 1
            + n_ccy * self.ir_vega_terms.len()
            + pairs * self.fx_vega_terms.len()
    }

    fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    fn ir_delta_terms(&self) -> &[f64] {
        &self.ir_delta_terms
    }

    fn ir_vega_terms(&self) -> &[f64] {
        &self.ir_vega_terms
    }

    fn fx_vega_terms(&self) -> &[f64] {
        &self.fx_vega_terms
    }

    fn add_sensitivities(
        &self,
        cube: &mut dyn NpvCube,
        netting_set: &str,
        sensitivities: &SimmSensitivities,
        slot: CubeSlot,
    ) -> Result<(), SimmError> {
        let data = self.serialise(sensitivities)?;
        self.check_depth(cube)?;
        let id = cube.required_index(netting_set)?;
        for (offset, value) in data.into_iter().enumerate() {
            let depth = self.first_index + offset;
            let stored = slot.get(cube, id, depth)?;
            slot.set(cube, stored + value, id, depth)?;
        }
        trace!(netting_set, ?slot, "SIMM sensitivities added");
        Ok(())
    }

    fn sensitivities(
        &self,
        cube: &dyn NpvCube,
        netting_set: &str,
        slot: CubeSlot,
    ) -> Result<SimmSensitivities, SimmError> {
        self.check_depth(cube)?;
        let id = cube.required_index(netting_set)?;
        let data = (0..self.required_size())
            .map(|offset| slot.get(cube, id, self.first_index + offset))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.deserialise(&data))
    }
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

fn chunks(data: &[f64], width: usize, rows: usize) -> Vec<Vec<f64>> {
    if width == 0 {
        return vec![Vec::new(); rows];
    }
    data.chunks(width).map(<[f64]>::to_vec).collect()
}
