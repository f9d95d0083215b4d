//! Static-credit increments: exposure weighted by today's survival curves.

use chrono::NaiveDate;
use pricer_core::market_data::Market;
use pricer_core::types::DayCountConvention;

use super::error::XvaError;
use super::strategy::{ExposureProfile, IncrementPeriod, XvaIncrementStrategy};

/// Increments from deterministic default curves taken from the market.
///
/// With `S_c` the counterparty and `S_b` the own survival probability:
///
/// | adjustment | increment over `(d0, d1]`                          |
/// |------------|----------------------------------------------------|
/// | CVA        | `(1 - R_c) (S_c(d0) - S_c(d1)) EPE(d1)`            |
/// | DVA        | `(1 - R_b) (S_b(d0) - S_b(d1)) ENE(d1)`            |
/// | FCA        | `S_c(d0) S_b(d0) EPE(d1) dcf`                      |
/// | FBA        | `S_c(d0) S_b(d0) ENE(d1) dcf`                      |
/// | MVA        | `S_c(d0) S_b(d0) DIM(d1) dcf`                      |
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use pricer_core::market_data::{FlatHazardRateCurve, SimpleMarket};
/// use pricer_core::types::DayCountConvention;
/// use pricer_xva::xva::{IncrementPeriod, StaticCreditXvaStrategy, XvaIncrementStrategy};
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let market = SimpleMarket::new().with_default_curve("CPTY", FlatHazardRateCurve::new(0.02));
/// let strategy = StaticCreditXvaStrategy::new(&market, as_of, DayCountConvention::Act365Fixed);
///
/// let d1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let period = IncrementPeriod { d0: as_of, d1, index: 0 };
/// let mva = strategy.mva_increment(1e6, "CPTY", None, &period, 0.001).unwrap();
/// assert!((mva - 1e3).abs() < 1e-9);
/// ```
pub struct StaticCreditXvaStrategy<'a, M: Market + ?Sized> {
    market: &'a M,
    as_of: NaiveDate,
    day_count: DayCountConvention,
}

impl<'a, M: Market + ?Sized> StaticCreditXvaStrategy<'a, M> {
    /// Strategy reading default curves from `market`, with curve times
    /// measured from `as_of` in `day_count`.
    pub fn new(market: &'a M, as_of: NaiveDate, day_count: DayCountConvention) -> Self {
        Self {
            market,
            as_of,
            day_count,
        }
    }

    fn time(&self, date: NaiveDate) -> f64 {
        self.day_count.year_fraction(self.as_of, date).max(0.0)
    }

    fn survival(&self, name: &str, date: NaiveDate) -> Result<f64, XvaError> {
        let curve = self.market.required_default_curve(name)?;
        Ok(curve.survival_probability(self.time(date))?)
    }

    /// Survival probability, or one when no name is given.
    fn optional_survival(&self, name: Option<&str>, date: NaiveDate) -> Result<f64, XvaError> {
        name.map_or(Ok(1.0), |n| self.survival(n, date))
    }

    fn joint_survival(
        &self,
        counterparty: Option<&str>,
        own: Option<&str>,
        date: NaiveDate,
    ) -> Result<f64, XvaError> {
        Ok(self.optional_survival(counterparty, date)? * self.optional_survival(own, date)?)
    }
}

impl<'a, M: Market + ?Sized> XvaIncrementStrategy for StaticCreditXvaStrategy<'a, M> {
    fn name(&self) -> &str {
        "static-credit"
    }

    fn cva_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        counterparty: &str,
        period: &IncrementPeriod,
        recovery: f64,
    ) -> Result<f64, XvaError> {
        let pd = self.survival(counterparty, period.d0)? - self.survival(counterparty, period.d1)?;
        Ok((1.0 - recovery) * pd * exposure.epe(period.index)?)
    }

    fn dva_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        own: &str,
        period: &IncrementPeriod,
        recovery: f64,
    ) -> Result<f64, XvaError> {
        let pd = self.survival(own, period.d0)? - self.survival(own, period.d1)?;
        Ok((1.0 - recovery) * pd * exposure.ene(period.index)?)
    }

    fn fca_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        counterparty: Option<&str>,
        own: Option<&str>,
        period: &IncrementPeriod,
        dcf: f64,
    ) -> Result<f64, XvaError> {
        let survival = self.joint_survival(counterparty, own, period.d0)?;
        Ok(survival * exposure.epe(period.index)? * dcf)
    }

    fn fba_increment(
        &self,
        exposure: &ExposureProfile<'_>,
        counterparty: Option<&str>,
        own: Option<&str>,
        period: &IncrementPeriod,
        dcf: f64,
    ) -> Result<f64, XvaError> {
        let survival = self.joint_survival(counterparty, own, period.d0)?;
        Ok(survival * exposure.ene(period.index)? * dcf)
    }

    fn mva_increment(
        &self,
        dim: f64,
        counterparty: &str,
        own: Option<&str>,
        period: &IncrementPeriod,
        dcf: f64,
    ) -> Result<f64, XvaError> {
        let survival = self.joint_survival(Some(counterparty), own, period.d0)?;
        Ok(survival * dim * dcf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{InMemoryCube, NpvCube};
    use approx::assert_relative_eq;
    use pricer_core::market_data::{FlatHazardRateCurve, MarketDataError, SimpleMarket};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (SimpleMarket, InMemoryCube) {
        let market = SimpleMarket::new()
            .with_default_curve("CPTY", FlatHazardRateCurve::new(0.03))
            .with_default_curve("BANK", FlatHazardRateCurve::new(0.01));
        let mut cube = InMemoryCube::new(
            date(2024, 1, 1),
            ["NS"],
            vec![date(2025, 1, 1), date(2026, 1, 1)],
            1,
            2,
        )
        .unwrap();
        cube.set(100.0, 0, 1, 0, 0).unwrap();
        cube.set(40.0, 0, 1, 0, 1).unwrap();
        (market, cube)
    }

    fn period() -> IncrementPeriod {
        IncrementPeriod {
            d0: date(2025, 1, 1),
            d1: date(2026, 1, 1),
            index: 1,
        }
    }

    fn t(d: NaiveDate) -> f64 {
        DayCountConvention::Act365Fixed.year_fraction(date(2024, 1, 1), d)
    }

    #[test]
    fn test_cva_increment() {
        let (market, cube) = setup();
        let s =
            StaticCreditXvaStrategy::new(&market, cube.as_of(), DayCountConvention::Act365Fixed);
        let exposure = ExposureProfile::new(&cube, 0, 0, 1);
        let p = period();
        let expected =
            0.6 * ((-0.03 * t(p.d0)).exp() - (-0.03 * t(p.d1)).exp()) * 100.0;
        assert_relative_eq!(
            s.cva_increment(&exposure, "CPTY", &p, 0.4).unwrap(),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_dva_uses_ene() {
        let (market, cube) = setup();
        let s =
            StaticCreditXvaStrategy::new(&market, cube.as_of(), DayCountConvention::Act365Fixed);
        let exposure = ExposureProfile::new(&cube, 0, 0, 1);
        let p = period();
        let expected = 0.7 * ((-0.01 * t(p.d0)).exp() - (-0.01 * t(p.d1)).exp()) * 40.0;
        assert_relative_eq!(
            s.dva_increment(&exposure, "BANK", &p, 0.3).unwrap(),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_funding_spread_variants() {
        let (market, cube) = setup();
        let s =
            StaticCreditXvaStrategy::new(&market, cube.as_of(), DayCountConvention::Act365Fixed);
        let exposure = ExposureProfile::new(&cube, 0, 0, 1);
        let p = period();
        let sc = (-0.03 * t(p.d0)).exp();
        let sb = (-0.01 * t(p.d0)).exp();
        let dcf = 0.002;

        let full = s
            .fca_increment(&exposure, Some("CPTY"), Some("BANK"), &p, dcf)
            .unwrap();
        let ex_own = s.fca_increment(&exposure, Some("CPTY"), None, &p, dcf).unwrap();
        let ex_all = s.fca_increment(&exposure, None, None, &p, dcf).unwrap();
        assert_relative_eq!(full, sc * sb * 100.0 * dcf, max_relative = 1e-12);
        assert_relative_eq!(ex_own, sc * 100.0 * dcf, max_relative = 1e-12);
        assert_relative_eq!(ex_all, 100.0 * dcf, max_relative = 1e-12);

        let fba = s
            .fba_increment(&exposure, Some("CPTY"), Some("BANK"), &p, dcf)
            .unwrap();
        assert_relative_eq!(fba, sc * sb * 40.0 * dcf, max_relative = 1e-12);
    }

    #[test]
    fn test_missing_curve_is_fatal() {
        let (market, cube) = setup();
        let s =
            StaticCreditXvaStrategy::new(&market, cube.as_of(), DayCountConvention::Act365Fixed);
        let exposure = ExposureProfile::new(&cube, 0, 0, 1);
        let err = s
            .cva_increment(&exposure, "UNKNOWN", &period(), 0.4)
            .unwrap_err();
        assert_eq!(
            err,
            XvaError::MarketData(MarketDataError::MissingDefaultCurve {
                name: "UNKNOWN".to_string()
            })
        );
    }
}
