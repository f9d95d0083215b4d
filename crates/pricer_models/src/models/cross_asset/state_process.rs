//! Cross-asset state process with Euler and exact discretizations.
//!
//! ## Caching
//!
//! Everything that does not depend on the state vector (deterministic drift,
//! diffusion, finite-step expectation offset, covariance and its square
//! root) is computed once per step of a [`TimeGrid`] by
//! [`CrossAssetStateProcess::precompute`]. The cached accessors take `&self`
//! and never write, so a precomputed process can be shared across rayon
//! workers. Recalibration goes through `&mut self` and drops the caches:
//!
//! ```text
//! precompute(&grid) ──► evolve / drift / covariance (&self, parallel)
//!        ▲                                   │
//!        └──── recalibrate(|m| ...) ◄────────┘  (&mut self, flushes)
//! ```
//!
//! ## Discretizations
//!
//! - [`Discretization::Euler`]: `x + μ(t0, x)·dt + σ(t0)·√dt·dw`
//! - [`Discretization::Exact`]: closed-form conditional mean and covariance
//!   of the step, `E[x(t0+dt) | x] + √Cov·dw`

use nalgebra::{DMatrix, DVector};
use pricer_core::math::matrix::{pseudo_sqrt, SalvagingAlgorithm};
use tracing::{debug, info};

use super::analytics;
use super::error::ModelError;
use super::model::{AssetType, CrossAssetModel};
use super::time_grid::TimeGrid;

/// Discretization scheme for finite steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Discretization {
    /// First-order Euler stepping of the SDE.
    Euler,
    /// Closed-form conditional moments.
    #[default]
    Exact,
}

/// State-independent quantities of one grid step.
#[derive(Debug, Clone)]
struct StepCache {
    drift: DVector<f64>,
    diffusion: DMatrix<f64>,
    expectation: DVector<f64>,
    covariance: DMatrix<f64>,
    std_deviation: DMatrix<f64>,
}

/// Joint IR/FX state process over a [`CrossAssetModel`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nalgebra::DVector;
/// use pricer_core::market_data::FlatCurve;
/// use pricer_core::math::SalvagingAlgorithm;
/// use pricer_core::types::Currency;
/// use pricer_models::models::cross_asset::{
///     CorrelationMatrix, CrossAssetModel, CrossAssetStateProcess, Discretization,
///     FxBsParametrization, IrLgm1fParametrization, PiecewiseConstant, TimeGrid,
/// };
///
/// let eur = IrLgm1fParametrization::new(
///     Currency::EUR, Arc::new(FlatCurve::new(0.02)), PiecewiseConstant::constant(0.01), 0.01,
/// ).unwrap();
/// let usd = IrLgm1fParametrization::new(
///     Currency::USD, Arc::new(FlatCurve::new(0.03)), PiecewiseConstant::constant(0.012), 0.02,
/// ).unwrap();
/// let fx_vol = PiecewiseConstant::constant(0.1);
/// let fx = FxBsParametrization::new(Currency::USD, 0.9, fx_vol).unwrap();
/// let correlation = CorrelationMatrix::identity(3);
/// let model = CrossAssetModel::new(vec![eur, usd], vec![fx], correlation).unwrap();
///
/// let salvaging = SalvagingAlgorithm::Spectral;
/// let mut process = CrossAssetStateProcess::new(model, Discretization::Exact, salvaging).unwrap();
/// process.precompute(&TimeGrid::uniform(1.0, 4).unwrap()).unwrap();
///
/// let x0 = process.initial_values();
/// let x1 = process.evolve_step(0, &x0, &DVector::zeros(3)).unwrap();
/// assert_eq!(x1.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CrossAssetStateProcess {
    model: CrossAssetModel,
    discretization: Discretization,
    salvaging: SalvagingAlgorithm,
    sqrt_correlation: DMatrix<f64>,
    grid: Option<TimeGrid>,
    cache: Vec<StepCache>,
}

impl CrossAssetStateProcess {
    /// Create a process; the correlation square root is taken once here.
    ///
    /// # Errors
    ///
    /// [`ModelError::Matrix`] if the correlation root fails, which only
    /// happens with [`SalvagingAlgorithm::None`] on a singular matrix.
    pub fn new(
        model: CrossAssetModel,
        discretization: Discretization,
        salvaging: SalvagingAlgorithm,
    ) -> Result<Self, ModelError> {
        let sqrt_correlation = pseudo_sqrt(model.correlation_matrix().as_matrix(), salvaging)?;
        Ok(Self {
            model,
            discretization,
            salvaging,
            sqrt_correlation,
            grid: None,
            cache: Vec::new(),
        })
    }

    /// Underlying model.
    pub fn model(&self) -> &CrossAssetModel {
        &self.model
    }

    /// Discretization scheme.
    pub fn discretization(&self) -> Discretization {
        self.discretization
    }

    /// Square-root repair strategy.
    pub fn salvaging(&self) -> SalvagingAlgorithm {
        self.salvaging
    }

    /// State and Brownian dimension.
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Grid the caches were built on, if any.
    pub fn grid(&self) -> Option<&TimeGrid> {
        self.grid.as_ref()
    }

    /// Whether [`precompute`](Self::precompute) has run since the last flush.
    pub fn is_precomputed(&self) -> bool {
        self.grid.is_some()
    }

    /// Zero for every IR factor, log spot for every FX factor.
    pub fn initial_values(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.dimension());
        for j in 0..self.model.fx_count() {
            x[self.model.p_idx(AssetType::FX, j)] = self.model.fx(j).spot().ln();
        }
        x
    }

    // ========================================
    // Uncached evaluation
    // ========================================

    /// State-independent part of the SDE drift at `t`.
    fn deterministic_drift(&self, t: f64) -> Result<DVector<f64>, ModelError> {
        let m = &self.model;
        let mut res = DVector::zeros(m.dimension());
        let ir0 = m.ir(0);
        let (h0, alpha0) = (ir0.h(t), ir0.alpha(t));
        let fwd0 = ir0.instantaneous_forward(t)?;

        for i in 1..m.ir_count() {
            let iri = m.ir(i);
            let fx = m.fx(i - 1);
            let (hi, alphai, sigmai) = (iri.h(t), iri.alpha(t), fx.sigma(t));
            let rho_zz_0i = m.rho_zz(0, i);
            let rho_zx_ii = m.rho_zx(i, i - 1);
            let rho_zx_0i = m.rho_zx(0, i - 1);

            res[m.p_idx(AssetType::IR, i)] = -hi * alphai * alphai
                + h0 * alpha0 * alphai * rho_zz_0i
                - sigmai * alphai * rho_zx_ii;
            res[m.p_idx(AssetType::FX, i - 1)] = h0 * alpha0 * sigmai * rho_zx_0i + fwd0
                - iri.instantaneous_forward(t)?
                - 0.5 * sigmai * sigmai;
        }
        Ok(res)
    }

    /// State-dependent part of the SDE drift at `t` (FX components only).
    fn state_drift(&self, t: f64, x: &DVector<f64>) -> DVector<f64> {
        let m = &self.model;
        let mut res = DVector::zeros(m.dimension());
        let ir0 = m.ir(0);
        let (h0, hp0, zeta0) = (ir0.h(t), ir0.h_prime(t), ir0.zeta(t));
        let z0 = x[m.p_idx(AssetType::IR, 0)];

        for i in 1..m.ir_count() {
            let iri = m.ir(i);
            let (hi, hpi, zetai) = (iri.h(t), iri.h_prime(t), iri.zeta(t));
            let zi = x[m.p_idx(AssetType::IR, i)];
            res[m.p_idx(AssetType::FX, i - 1)] =
                z0 * hp0 + zeta0 * hp0 * h0 - zi * hpi - zetai * hpi * hi;
        }
        res
    }

    /// SDE drift μ(t, x), evaluated without caches.
    pub fn drift_at(&self, t: f64, x: &DVector<f64>) -> Result<DVector<f64>, ModelError> {
        self.check_state(x)?;
        Ok(self.deterministic_drift(t)? + self.state_drift(t, x))
    }

    /// Diffusion matrix `diag(α, σ)·√ρ` at `t`, evaluated without caches.
    pub fn diffusion_at(&self, t: f64) -> DMatrix<f64> {
        let m = &self.model;
        let mut res = self.sqrt_correlation.clone();
        for i in 0..m.ir_count() {
            res.row_mut(m.p_idx(AssetType::IR, i)).scale_mut(m.ir(i).alpha(t));
        }
        for j in 0..m.fx_count() {
            res.row_mut(m.p_idx(AssetType::FX, j)).scale_mut(m.fx(j).sigma(t));
        }
        res
    }

    /// State-independent part of the step expectation.
    fn expectation_offset(&self, t0: f64, dt: f64) -> Result<DVector<f64>, ModelError> {
        match self.discretization {
            Discretization::Euler => Ok(self.deterministic_drift(t0)? * dt),
            Discretization::Exact => {
                let m = &self.model;
                let mut res = DVector::zeros(m.dimension());
                for i in 0..m.ir_count() {
                    res[m.p_idx(AssetType::IR, i)] = analytics::ir_expectation_1(m, i, t0, dt);
                }
                for j in 0..m.fx_count() {
                    res[m.p_idx(AssetType::FX, j)] = analytics::fx_expectation_1(m, j, t0, dt)?;
                }
                Ok(res)
            }
        }
    }

    /// State-dependent part of the step expectation.
    fn expectation_state(&self, t0: f64, x0: &DVector<f64>, dt: f64) -> DVector<f64> {
        match self.discretization {
            Discretization::Euler => x0 + self.state_drift(t0, x0) * dt,
            Discretization::Exact => {
                let m = &self.model;
                let mut res = DVector::zeros(m.dimension());
                let z0 = x0[m.p_idx(AssetType::IR, 0)];
                for i in 0..m.ir_count() {
                    let k = m.p_idx(AssetType::IR, i);
                    res[k] = analytics::ir_expectation_2(m, i, x0[k]);
                }
                for j in 0..m.fx_count() {
                    let k = m.p_idx(AssetType::FX, j);
                    let zi = x0[m.p_idx(AssetType::IR, j + 1)];
                    res[k] = analytics::fx_expectation_2(m, j, t0, x0[k], zi, z0, dt);
                }
                res
            }
        }
    }

    /// E[x(t0 + dt) | x(t0) = x0], evaluated without caches.
    pub fn expectation_at(
        &self,
        t0: f64,
        x0: &DVector<f64>,
        dt: f64,
    ) -> Result<DVector<f64>, ModelError> {
        self.check_state(x0)?;
        Ok(self.expectation_offset(t0, dt)? + self.expectation_state(t0, x0, dt))
    }

    /// Covariance of the step `[t0, t0 + dt]`, evaluated without caches.
    pub fn covariance_at(&self, t0: f64, dt: f64) -> DMatrix<f64> {
        match self.discretization {
            Discretization::Euler => {
                let d = self.diffusion_at(t0);
                &d * d.transpose() * dt
            }
            Discretization::Exact => self.exact_covariance(t0, dt),
        }
    }

    fn exact_covariance(&self, t0: f64, dt: f64) -> DMatrix<f64> {
        let m = &self.model;
        let n = m.dimension();
        let mut res = DMatrix::zeros(n, n);
        for i in 0..m.ir_count() {
            let pi = m.p_idx(AssetType::IR, i);
            for j in 0..=i {
                let v = analytics::ir_ir_covariance(m, i, j, t0, dt);
                let pj = m.p_idx(AssetType::IR, j);
                res[(pi, pj)] = v;
                res[(pj, pi)] = v;
            }
            for j in 0..m.fx_count() {
                let v = analytics::ir_fx_covariance(m, i, j, t0, dt);
                let pj = m.p_idx(AssetType::FX, j);
                res[(pi, pj)] = v;
                res[(pj, pi)] = v;
            }
        }
        for i in 0..m.fx_count() {
            let pi = m.p_idx(AssetType::FX, i);
            for j in 0..=i {
                let v = analytics::fx_fx_covariance(m, i, j, t0, dt);
                let pj = m.p_idx(AssetType::FX, j);
                res[(pi, pj)] = v;
                res[(pj, pi)] = v;
            }
        }
        res
    }

    fn std_deviation_from(
        &self,
        covariance: &DMatrix<f64>,
        diffusion: &DMatrix<f64>,
        dt: f64,
    ) -> Result<DMatrix<f64>, ModelError> {
        match self.discretization {
            Discretization::Euler => Ok(diffusion * dt.sqrt()),
            Discretization::Exact => Ok(pseudo_sqrt(covariance, self.salvaging)?),
        }
    }

    // ========================================
    // Cache management
    // ========================================

    /// Populate every step cache for `grid`, replacing any previous grid.
    ///
    /// Runs single-threaded; call before handing the process to parallel
    /// path simulation.
    pub fn precompute(&mut self, grid: &TimeGrid) -> Result<(), ModelError> {
        let mut cache = Vec::with_capacity(grid.step_count());
        for (t0, dt) in grid.steps() {
            let drift = self.deterministic_drift(t0)?;
            let diffusion = self.diffusion_at(t0);
            let expectation = self.expectation_offset(t0, dt)?;
            let covariance = self.covariance_at(t0, dt);
            let std_deviation = self.std_deviation_from(&covariance, &diffusion, dt)?;
            cache.push(StepCache {
                drift,
                diffusion,
                expectation,
                covariance,
                std_deviation,
            });
        }
        info!(
            steps = cache.len(),
            dimension = self.dimension(),
            discretization = ?self.discretization,
            "precomputed state process caches"
        );
        self.cache = cache;
        self.grid = Some(grid.clone());
        Ok(())
    }

    /// Drop all cached step data.
    pub fn flush_cache(&mut self) {
        if self.grid.is_some() {
            debug!(steps = self.cache.len(), "flushing state process caches");
        }
        self.cache.clear();
        self.grid = None;
    }

    /// Mutate the model (e.g. after calibration) and flush the caches.
    ///
    /// The caches are flushed even when `update` fails, since the model may
    /// have been partly modified.
    ///
    /// # Example
    ///
    /// ```ignore
    /// process.recalibrate(|m| m.set_ir_alpha(0, PiecewiseConstant::constant(0.02)))?;
    /// process.precompute(&grid)?;
    /// ```
    pub fn recalibrate<F>(&mut self, update: F) -> Result<(), ModelError>
    where
        F: FnOnce(&mut CrossAssetModel) -> Result<(), ModelError>,
    {
        let result = update(&mut self.model);
        self.flush_cache();
        result?;
        self.sqrt_correlation =
            pseudo_sqrt(self.model.correlation_matrix().as_matrix(), self.salvaging)?;
        Ok(())
    }

    // ========================================
    // Cached evaluation
    // ========================================

    fn step_cache(&self, step: usize) -> Result<&StepCache, ModelError> {
        if self.grid.is_none() {
            return Err(ModelError::NotPrecomputed);
        }
        self.cache.get(step).ok_or(ModelError::StepOutOfRange {
            step,
            steps: self.cache.len(),
        })
    }

    /// Step starting at grid time `t`.
    pub fn step_at(&self, t: f64) -> Result<usize, ModelError> {
        let grid = self.grid.as_ref().ok_or(ModelError::NotPrecomputed)?;
        match grid.index_of(t) {
            Some(step) if step < grid.step_count() => Ok(step),
            _ => Err(ModelError::TimeNotOnGrid { time: t }),
        }
    }

    /// Step `[t0, t0 + dt]` of the grid.
    pub fn step_index(&self, t0: f64, dt: f64) -> Result<usize, ModelError> {
        let step = self.step_at(t0)?;
        let grid = self.grid.as_ref().ok_or(ModelError::NotPrecomputed)?;
        if grid.index_of(t0 + dt) != Some(step + 1) {
            return Err(ModelError::TimeNotOnGrid { time: t0 + dt });
        }
        Ok(step)
    }

    /// SDE drift at grid time `t`; the state-independent part comes from
    /// the cache.
    pub fn drift(&self, t: f64, x: &DVector<f64>) -> Result<DVector<f64>, ModelError> {
        self.check_state(x)?;
        let cache = self.step_cache(self.step_at(t)?)?;
        Ok(&cache.drift + self.state_drift(t, x))
    }

    /// Cached diffusion at grid time `t`; `x` is only checked for size.
    pub fn diffusion(&self, t: f64, x: &DVector<f64>) -> Result<&DMatrix<f64>, ModelError> {
        self.check_state(x)?;
        Ok(&self.step_cache(self.step_at(t)?)?.diffusion)
    }

    /// Expectation over a grid step.
    pub fn expectation(
        &self,
        t0: f64,
        x0: &DVector<f64>,
        dt: f64,
    ) -> Result<DVector<f64>, ModelError> {
        self.expectation_step(self.step_index(t0, dt)?, x0)
    }

    /// Cached covariance of a grid step.
    pub fn covariance(
        &self,
        t0: f64,
        x0: &DVector<f64>,
        dt: f64,
    ) -> Result<&DMatrix<f64>, ModelError> {
        self.check_state(x0)?;
        Ok(&self.step_cache(self.step_index(t0, dt)?)?.covariance)
    }

    /// Cached square root of the step covariance.
    pub fn std_deviation(
        &self,
        t0: f64,
        x0: &DVector<f64>,
        dt: f64,
    ) -> Result<&DMatrix<f64>, ModelError> {
        self.check_state(x0)?;
        Ok(&self.step_cache(self.step_index(t0, dt)?)?.std_deviation)
    }

    /// Advance `x0` over a grid step with standard normal draws `dw`.
    pub fn evolve(
        &self,
        t0: f64,
        x0: &DVector<f64>,
        dt: f64,
        dw: &DVector<f64>,
    ) -> Result<DVector<f64>, ModelError> {
        self.evolve_step(self.step_index(t0, dt)?, x0, dw)
    }

    /// Expectation over step `step`.
    pub fn expectation_step(
        &self,
        step: usize,
        x0: &DVector<f64>,
    ) -> Result<DVector<f64>, ModelError> {
        self.check_state(x0)?;
        let cache = self.step_cache(step)?;
        let (t0, dt) = self.grid_step(step)?;
        Ok(&cache.expectation + self.expectation_state(t0, x0, dt))
    }

    /// Advance `x0` over step `step` with standard normal draws `dw`.
    pub fn evolve_step(
        &self,
        step: usize,
        x0: &DVector<f64>,
        dw: &DVector<f64>,
    ) -> Result<DVector<f64>, ModelError> {
        self.check_state(dw)?;
        let mean = self.expectation_step(step, x0)?;
        Ok(mean + &self.step_cache(step)?.std_deviation * dw)
    }

    fn grid_step(&self, step: usize) -> Result<(f64, f64), ModelError> {
        let grid = self.grid.as_ref().ok_or(ModelError::NotPrecomputed)?;
        grid.step(step).ok_or(ModelError::StepOutOfRange {
            step,
            steps: grid.step_count(),
        })
    }

    fn check_state(&self, x: &DVector<f64>) -> Result<(), ModelError> {
        if x.len() != self.dimension() {
            return Err(ModelError::StateDimension {
                expected: self.dimension(),
                got: x.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cross_asset::{
        CorrelationMatrix, FxBsParametrization, IrLgm1fParametrization, PiecewiseConstant,
    };
    use approx::assert_relative_eq;
    use pricer_core::market_data::FlatCurve;
    use pricer_core::math::matrix::min_eigenvalue;
    use pricer_core::types::Currency;
    use std::sync::Arc;

    fn model() -> CrossAssetModel {
        let eur = IrLgm1fParametrization::new(
            Currency::EUR,
            Arc::new(FlatCurve::new(0.02)),
            PiecewiseConstant::new(vec![1.0], vec![0.008, 0.012]).unwrap(),
            0.01,
        )
        .unwrap();
        let usd = IrLgm1fParametrization::new(
            Currency::USD,
            Arc::new(FlatCurve::new(0.03)),
            PiecewiseConstant::constant(0.01),
            0.03,
        )
        .unwrap();
        let fx = FxBsParametrization::new(
            Currency::USD,
            0.9,
            PiecewiseConstant::new(vec![2.0], vec![0.1, 0.12]).unwrap(),
        )
        .unwrap();
        #[rustfmt::skip]
        let corr = [
            1.0, 0.6, 0.2,
            0.6, 1.0, -0.3,
            0.2, -0.3, 1.0,
        ];
        CrossAssetModel::new(
            vec![eur, usd],
            vec![fx],
            CorrelationMatrix::new(&corr, 3).unwrap(),
        )
        .unwrap()
    }

    fn process(discretization: Discretization) -> CrossAssetStateProcess {
        CrossAssetStateProcess::new(model(), discretization, SalvagingAlgorithm::Spectral).unwrap()
    }

    // ========================================
    // Uncached
    // ========================================

    #[test]
    fn test_initial_values() {
        let p = process(Discretization::Exact);
        let x0 = p.initial_values();
        assert_eq!(x0[0], 0.0);
        assert_eq!(x0[1], 0.0);
        assert_relative_eq!(x0[2], 0.9_f64.ln(), epsilon = 1e-15);
    }

    #[test]
    fn test_domestic_ir_drift_is_zero() {
        let p = process(Discretization::Euler);
        let x = DVector::from_vec(vec![0.01, -0.02, 0.1]);
        for t in [0.0, 0.5, 1.5, 3.0] {
            assert_eq!(p.drift_at(t, &x).unwrap()[0], 0.0);
        }
    }

    #[test]
    fn test_diffusion_reproduces_instantaneous_covariance() {
        let p = process(Discretization::Euler);
        let d = p.diffusion_at(0.5);
        let cov = &d * d.transpose();
        assert_relative_eq!(cov[(0, 0)], 0.008 * 0.008, epsilon = 1e-14);
        assert_relative_eq!(cov[(0, 1)], 0.008 * 0.01 * 0.6, epsilon = 1e-14);
        assert_relative_eq!(cov[(1, 2)], 0.01 * 0.1 * -0.3, epsilon = 1e-14);
        assert_relative_eq!(cov[(2, 2)], 0.01, epsilon = 1e-14);
    }

    #[test]
    fn test_state_dimension_checked() {
        let p = process(Discretization::Exact);
        let x = DVector::zeros(2);
        assert!(matches!(
            p.drift_at(0.0, &x),
            Err(ModelError::StateDimension { expected: 3, got: 2 })
        ));
    }

    // ========================================
    // Cache behaviour
    // ========================================

    #[test]
    fn test_cached_accessors_require_precompute() {
        let p = process(Discretization::Exact);
        let x0 = p.initial_values();
        assert_eq!(p.evolve_step(0, &x0, &x0), Err(ModelError::NotPrecomputed));
        assert_eq!(p.diffusion(0.0, &x0).unwrap_err(), ModelError::NotPrecomputed);
    }

    #[test]
    fn test_diffusion_cache_independent_of_state() {
        let mut p = process(Discretization::Euler);
        p.precompute(&TimeGrid::new(&[0.5, 1.5, 2.5]).unwrap()).unwrap();
        let xa = p.initial_values();
        let xb = DVector::from_vec(vec![0.05, -0.03, 0.2]);

        let da = p.diffusion(0.5, &xa).unwrap().clone();
        let db = p.diffusion(0.5, &xb).unwrap();
        assert_eq!(&da, db);

        // EUR alpha changes at t = 1
        let later = p.diffusion(1.5, &xa).unwrap();
        assert_ne!(&da, later);
    }

    #[test]
    fn test_cached_matches_uncached() {
        for disc in [Discretization::Euler, Discretization::Exact] {
            let mut p = process(disc);
            let grid = TimeGrid::new(&[0.25, 1.0, 2.5]).unwrap();
            p.precompute(&grid).unwrap();
            let x = DVector::from_vec(vec![0.01, -0.01, -0.05]);
            for (t0, dt) in grid.steps() {
                let cached = p.expectation(t0, &x, dt).unwrap();
                let direct = p.expectation_at(t0, &x, dt).unwrap();
                for k in 0..3 {
                    assert_relative_eq!(cached[k], direct[k], epsilon = 1e-15);
                }
                assert_eq!(p.covariance(t0, &x, dt).unwrap(), &p.covariance_at(t0, dt));
                let drift = p.drift(t0, &x).unwrap();
                let direct = p.drift_at(t0, &x).unwrap();
                for k in 0..3 {
                    assert_relative_eq!(drift[k], direct[k], epsilon = 1e-15);
                }
            }
        }
    }

    #[test]
    fn test_off_grid_lookup_fails() {
        let mut p = process(Discretization::Exact);
        p.precompute(&TimeGrid::new(&[1.0, 2.0]).unwrap()).unwrap();
        let x0 = p.initial_values();
        assert!(matches!(
            p.expectation(0.5, &x0, 0.5),
            Err(ModelError::TimeNotOnGrid { .. })
        ));
        assert!(matches!(
            p.expectation(0.0, &x0, 2.0),
            Err(ModelError::TimeNotOnGrid { .. })
        ));
        // last grid point starts no step
        assert!(matches!(
            p.drift(2.0, &x0),
            Err(ModelError::TimeNotOnGrid { .. })
        ));
        assert!(matches!(
            p.evolve_step(2, &x0, &x0),
            Err(ModelError::StepOutOfRange { step: 2, steps: 2 })
        ));
    }

    #[test]
    fn test_flush_and_recalibrate() {
        let mut p = process(Discretization::Exact);
        let grid = TimeGrid::new(&[1.0, 2.0]).unwrap();
        p.precompute(&grid).unwrap();
        let x0 = p.initial_values();
        let before = p.covariance(0.0, &x0, 1.0).unwrap()[(0, 0)];

        p.recalibrate(|m| m.set_ir_alpha(0, PiecewiseConstant::constant(0.02)))
            .unwrap();
        assert!(!p.is_precomputed());
        assert_eq!(
            p.covariance(0.0, &x0, 1.0).unwrap_err(),
            ModelError::NotPrecomputed
        );

        p.precompute(&grid).unwrap();
        let after = p.covariance(0.0, &x0, 1.0).unwrap()[(0, 0)];
        assert_relative_eq!(after, 0.02 * 0.02, epsilon = 1e-14);
        assert!(after > before);

        p.flush_cache();
        assert!(p.grid().is_none());
    }

    #[test]
    fn test_recalibrate_error_still_flushes() {
        let mut p = process(Discretization::Exact);
        p.precompute(&TimeGrid::new(&[1.0]).unwrap()).unwrap();
        let result = p.recalibrate(|m| m.set_fx_sigma(3, PiecewiseConstant::constant(0.1)));
        assert!(result.is_err());
        assert!(!p.is_precomputed());
    }

    // ========================================
    // Discretization consistency
    // ========================================

    #[test]
    fn test_euler_and_exact_agree_on_small_steps() {
        let euler = process(Discretization::Euler);
        let exact = process(Discretization::Exact);
        let x = DVector::from_vec(vec![0.004, -0.006, 0.9_f64.ln() + 0.02]);
        let (t0, dt) = (1.2, 1e-3);

        let m_euler = euler.expectation_at(t0, &x, dt).unwrap();
        let m_exact = exact.expectation_at(t0, &x, dt).unwrap();
        for k in 0..3 {
            assert_relative_eq!(m_euler[k], m_exact[k], epsilon = 1e-8);
        }

        let c_euler = euler.covariance_at(t0, dt);
        let c_exact = exact.covariance_at(t0, dt);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(c_euler[(i, j)], c_exact[(i, j)], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_exact_covariance_is_psd() {
        let p = process(Discretization::Exact);
        for (t0, dt) in [(0.0, 0.5), (0.5, 2.0), (3.0, 10.0)] {
            let cov = p.covariance_at(t0, dt);
            assert!(min_eigenvalue(&cov).unwrap() > -1e-14);
            assert_relative_eq!(cov[(0, 1)], cov[(1, 0)], epsilon = 1e-18);
        }
    }

    #[test]
    fn test_deterministic_rates_give_forward_fx() {
        let eur = IrLgm1fParametrization::new(
            Currency::EUR,
            Arc::new(FlatCurve::new(0.02)),
            PiecewiseConstant::constant(0.0),
            0.01,
        )
        .unwrap();
        let usd = IrLgm1fParametrization::new(
            Currency::USD,
            Arc::new(FlatCurve::new(0.03)),
            PiecewiseConstant::constant(0.0),
            0.01,
        )
        .unwrap();
        let fx = FxBsParametrization::new(Currency::USD, 0.9, PiecewiseConstant::constant(0.15))
            .unwrap();
        let model =
            CrossAssetModel::new(vec![eur, usd], vec![fx], CorrelationMatrix::identity(3)).unwrap();
        let mut p =
            CrossAssetStateProcess::new(model, Discretization::Exact, SalvagingAlgorithm::Spectral)
                .unwrap();
        p.precompute(&TimeGrid::new(&[5.0]).unwrap()).unwrap();

        let x0 = p.initial_values();
        let mean = p.expectation(0.0, &x0, 5.0).unwrap();
        let expected = 0.9_f64.ln() + (0.02 - 0.03) * 5.0 - 0.5 * 0.15 * 0.15 * 5.0;
        assert_relative_eq!(mean[2], expected, epsilon = 1e-12);

        let sd = p.std_deviation(0.0, &x0, 5.0).unwrap();
        assert_relative_eq!(sd.row(2).norm(), 0.15 * 5.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(sd.row(0).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_evolve_with_zero_draws_is_expectation() {
        let mut p = process(Discretization::Exact);
        p.precompute(&TimeGrid::uniform(2.0, 8).unwrap()).unwrap();
        let x0 = p.initial_values();
        let zero = DVector::zeros(3);
        let evolved = p.evolve(0.25, &x0, 0.25, &zero).unwrap();
        let mean = p.expectation(0.25, &x0, 0.25).unwrap();
        assert_eq!(evolved, mean);
    }
}
