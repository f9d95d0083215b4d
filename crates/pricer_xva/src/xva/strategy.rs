//! Pluggable XVA increment computation.
//!
//! [`XvaCalculator`](super::XvaCalculator) walks the date grid and asks an
//! [`XvaIncrementStrategy`] for the contribution of each sub-period
//! `(d0, d1]`. Strategies differ in how they weight exposure with credit
//! and funding information; the calculator never needs to know which one it
//! holds.

use chrono::NaiveDate;

use super::error::XvaError;
use crate::cube::{CubeError, NpvCube};

/// One sub-period of the date grid.
///
/// `index` is the position of `d1` in the cube date grid; `d0` is the
/// previous grid date, or the as-of date for the first period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementPeriod {
    /// Period start.
    pub d0: NaiveDate,
    /// Period end.
    pub d1: NaiveDate,
    /// Cube date index of `d1`.
    pub index: usize,
}

impl IncrementPeriod {
    /// Periods covering `as_of` to the last date of `dates`.
    pub fn grid(as_of: NaiveDate, dates: &[NaiveDate]) -> Vec<IncrementPeriod> {
        dates
            .iter()
            .enumerate()
            .map(|(index, &d1)| IncrementPeriod {
                d0: if index == 0 { as_of } else { dates[index - 1] },
                d1,
                index,
            })
            .collect()
    }
}

/// EPE and ENE profile of one trade or netting set inside an exposure cube.
///
/// Reads sample 0, where post-processed cubes keep the sample average.
#[derive(Clone, Copy)]
pub struct ExposureProfile<'a> {
    cube: &'a dyn NpvCube,
    id: usize,
    epe_index: usize,
    ene_index: usize,
}

impl<'a> ExposureProfile<'a> {
    /// Profile of cube id `id` with the given slots.
    pub fn new(cube: &'a dyn NpvCube, id: usize, epe_index: usize, ene_index: usize) -> Self {
        Self {
            cube,
            id,
            epe_index,
            ene_index,
        }
    }

    /// Expected positive exposure at date index `date`.
    #[inline]
    pub fn epe(&self, date: usize) -> Result<f64, CubeError> {
        self.cube.get(self.id, date, 0, self.epe_index)
    }

    /// Expected negative exposure at date index `date`, as a positive amount.
    #[inline]
    pub fn ene(&self, date: usize) -> Result<f64, CubeError> {
        self.cube.get(self.id, date, 0, self.ene_index)
    }
}

/// Per-period XVA contributions.
///
/// Credit names are market default curve names. For the funding
/// adjustments a `None` name means "survival probability one", which is
/// how the ex-own-spread and ex-all-spread variants are obtained from the
/// same method. `dcf` is the funding spread discount factor difference
/// `B(d0)/B(d1) - P(d0)/P(d1)` between the funding curve `B` and the
/// risk-free curve `P`.
///
/// Summing the increments of [`IncrementPeriod::grid`] yields the total
/// adjustment, so implementations must be additive over sub-periods.
pub trait XvaIncrementStrategy: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// CVA contribution of one period.
    fn cva_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        counterparty: &str,
        period: &IncrementPeriod,
        recovery: f64,
    ) -> Result<f64, XvaError>;

    /// DVA contribution of one period.
    fn dva_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        own: &str,
        period: &IncrementPeriod,
        recovery: f64,
    ) -> Result<f64, XvaError>;

    /// Funding cost contribution of one period.
    fn fca_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        counterparty: Option<&str>,
        own: Option<&str>,
        period: &IncrementPeriod,
        dcf: f64,
    ) -> Result<f64, XvaError>;

    /// Funding benefit contribution of one period.
    fn fba_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        counterparty: Option<&str>,
        own: Option<&str>,
        period: &IncrementPeriod,
        dcf: f64,
    ) -> Result<f64, XvaError>;

    /// Margin funding contribution of one period given the expected
    /// initial margin `dim` at `d1`.
    fn mva_increment(
        &self,
        dim: f64,
        counterparty: &str,
        own: Option<&str>,
        period: &IncrementPeriod,
        dcf: f64,
    ) -> Result<f64, XvaError>;
}
