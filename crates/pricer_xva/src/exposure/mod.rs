//! Exposure post-processing.
//!
//! Turns a raw NPV cube (discounted trade values per date and sample) into
//! the two exposure cubes read by the XVA calculator:
//!
//! | cube        | slot | content                              |
//! |-------------|------|--------------------------------------|
//! | trade       | 0    | EPE: `E[max(V, 0)]`                  |
//! | trade       | 1    | ENE: `E[max(-V, 0)]`                 |
//! | netting set | 0    | EE: `E[V]` of the netted value       |
//! | netting set | 1    | EPE of the netted value              |
//! | netting set | 2    | ENE of the netted value              |
//!
//! Expectations are sample averages stored in sample 0; the T0 slice holds
//! the same measures for today's NPV.

use rayon::prelude::*;
use tracing::debug;

use crate::cube::{CubeError, InMemoryCube, NpvCube};
use crate::portfolio::Portfolio;
use crate::xva::XvaError;

/// Trade cube slot holding EPE.
pub const TRADE_EPE: usize = 0;
/// Trade cube slot holding ENE.
pub const TRADE_ENE: usize = 1;
/// Depth of the trade exposure cube.
pub const TRADE_DEPTH: usize = 2;

/// Netting set cube slot holding EE.
pub const NETTING_SET_EE: usize = 0;
/// Netting set cube slot holding EPE.
pub const NETTING_SET_EPE: usize = 1;
/// Netting set cube slot holding ENE.
pub const NETTING_SET_ENE: usize = 2;
/// Depth of the netting set exposure cube.
pub const NETTING_SET_DEPTH: usize = 3;

/// Exposure cubes produced by [`ExposureCalculator::compute`].
#[derive(Debug, Clone)]
pub struct ExposureCubes {
    /// One id per portfolio trade, in portfolio order.
    pub trade: InMemoryCube,
    /// One id per netting set, in portfolio order.
    pub netting_set: InMemoryCube,
}

/// `[EE, EPE, ENE]` of a set of sample values.
fn moments(values: impl Iterator<Item = f64>, samples: usize) -> [f64; 3] {
    let mut m = [0.0; 3];
    for v in values {
        m[0] += v;
        m[1] += v.max(0.0);
        m[2] += (-v).max(0.0);
    }
    let n = samples as f64;
    [m[0] / n, m[1] / n, m[2] / n]
}

/// Builds trade and netting set exposure cubes from a raw NPV cube.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use pricer_core::types::Currency;
/// use pricer_xva::cube::{InMemoryCube, NpvCube};
/// use pricer_xva::exposure::{ExposureCalculator, NETTING_SET_EPE, TRADE_EPE};
/// use pricer_xva::portfolio::*;
///
/// let portfolio = PortfolioBuilder::new()
///     .add_counterparty(Counterparty::new(CounterpartyId::new("CP"), "CP"))
///     .add_netting_set(NettingSet::new(NettingSetId::new("NS"), CounterpartyId::new("CP")))
///     .add_trades(["A", "B"].map(|id| {
///         let (ns, cp) = (NettingSetId::new("NS"), CounterpartyId::new("CP"));
///         TradeInfo::new(TradeId::new(id), ns, cp, Currency::EUR)
///     }))
///     .build()
///     .unwrap();
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = vec![NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()];
/// let mut npv = InMemoryCube::new(as_of, ["A", "B"], dates, 2, 1).unwrap();
/// // A: +10 / -10, B: -4 / +6
/// npv.par_fill(|id, _, sample, slot| {
///     slot[0] = [[10.0, -10.0], [-4.0, 6.0]][id][sample];
/// });
///
/// let cubes = ExposureCalculator::new().compute(&portfolio, &npv).unwrap();
/// assert_eq!(cubes.trade.get(0, 0, 0, TRADE_EPE).unwrap(), 5.0);
/// // netted: 6 / -4
/// assert_eq!(cubes.netting_set.get(0, 0, 0, NETTING_SET_EPE).unwrap(), 3.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureCalculator {
    npv_index: usize,
}

impl ExposureCalculator {
    /// Calculator reading NPVs from slot 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read NPVs from another slot of the raw cube.
    pub fn with_npv_index(mut self, index: usize) -> Self {
        self.npv_index = index;
        self
    }

    /// Aggregate the raw cube.
    ///
    /// # Errors
    ///
    /// - [`XvaError::DepthOutOfRange`] if the NPV slot is outside the raw cube
    /// - [`XvaError::Cube`] if a portfolio trade is absent from the raw cube
    pub fn compute(
        &self,
        portfolio: &Portfolio,
        npv: &dyn NpvCube,
    ) -> Result<ExposureCubes, XvaError> {
        if self.npv_index >= npv.depth() {
            return Err(XvaError::DepthOutOfRange {
                cube: "NPV",
                slot: "NPV",
                index: self.npv_index,
                depth: npv.depth(),
            });
        }
        let sources = portfolio
            .trades()
            .iter()
            .map(|t| npv.required_index(t.id().as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            trades = sources.len(),
            netting_sets = portfolio.netting_set_count(),
            dates = npv.num_dates(),
            samples = npv.samples(),
            "aggregating exposures"
        );

        let trade_sets: Vec<Vec<usize>> = sources.iter().map(|&s| vec![s]).collect();
        let trade_profiles = self.profiles(npv, &trade_sets)?;

        let netting_sets: Vec<Vec<usize>> = portfolio
            .netting_sets()
            .iter()
            .map(|ns| {
                portfolio
                    .trades()
                    .iter()
                    .zip(&sources)
                    .filter(|(t, _)| t.netting_set_id() == ns.id())
                    .map(|(_, &s)| s)
                    .collect()
            })
            .collect();
        let netting_set_profiles = self.profiles(npv, &netting_sets)?;

        let mut trade = InMemoryCube::new(
            npv.as_of(),
            portfolio.trades().iter().map(|t| t.id().to_string()),
            npv.dates().to_vec(),
            1,
            TRADE_DEPTH,
        )?;
        trade.par_fill(|id, date, _, slots| {
            let [_, epe, ene] = trade_profiles[id].dates[date];
            slots[TRADE_EPE] = epe;
            slots[TRADE_ENE] = ene;
        });

        let mut netting_set = InMemoryCube::new(
            npv.as_of(),
            portfolio.netting_sets().iter().map(|ns| ns.id().to_string()),
            npv.dates().to_vec(),
            1,
            NETTING_SET_DEPTH,
        )?;
        netting_set.par_fill(|id, date, _, slots| {
            let [ee, epe, ene] = netting_set_profiles[id].dates[date];
            slots[NETTING_SET_EE] = ee;
            slots[NETTING_SET_EPE] = epe;
            slots[NETTING_SET_ENE] = ene;
        });

        for (id, profile) in trade_profiles.iter().enumerate() {
            let [_, epe, ene] = profile.t0;
            trade.set_t0(epe, id, TRADE_EPE)?;
            trade.set_t0(ene, id, TRADE_ENE)?;
        }
        for (id, profile) in netting_set_profiles.iter().enumerate() {
            let [ee, epe, ene] = profile.t0;
            netting_set.set_t0(ee, id, NETTING_SET_EE)?;
            netting_set.set_t0(epe, id, NETTING_SET_EPE)?;
            netting_set.set_t0(ene, id, NETTING_SET_ENE)?;
        }

        Ok(ExposureCubes { trade, netting_set })
    }

    /// Moments of the summed NPV of each group of raw cube ids, one group
    /// per task.
    fn profiles(
        &self,
        npv: &dyn NpvCube,
        groups: &[Vec<usize>],
    ) -> Result<Vec<Profile>, CubeError> {
        let samples = npv.samples();
        groups
            .par_iter()
            .map(|members| {
                let t0 = members
                    .iter()
                    .map(|&id| npv.get_t0(id, self.npv_index))
                    .sum::<Result<f64, _>>()?;
                let dates = (0..npv.num_dates())
                    .map(|date| {
                        let values = (0..samples)
                            .map(|sample| {
                                members
                                    .iter()
                                    .map(|&id| npv.get(id, date, sample, self.npv_index))
                                    .sum::<Result<f64, _>>()
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok::<_, CubeError>(moments(values.into_iter(), samples))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, CubeError>(Profile {
                    t0: moments(std::iter::once(t0), 1),
                    dates,
                })
            })
            .collect()
    }
}

struct Profile {
    t0: [f64; 3],
    dates: Vec<[f64; 3]>,
}
