//! Seeded multi-path simulation of the cross-asset state.
//!
//! Paths are independent, so they are simulated in parallel with rayon.
//! Each path owns a `StdRng` seeded from the generator seed and the path
//! index, which makes results reproducible and independent of the thread
//! count. Along a path, steps run strictly in time order.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use tracing::debug;

use super::error::ModelError;
use super::state_process::CrossAssetStateProcess;

/// Odd 64-bit constant spreading per-path seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// One simulated path: the state at every grid point, starting with the
/// initial values.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    states: Vec<DVector<f64>>,
}

impl Path {
    /// States by grid index.
    pub fn states(&self) -> &[DVector<f64>] {
        &self.states
    }

    /// State at grid index `index`.
    pub fn state(&self, index: usize) -> Option<&DVector<f64>> {
        self.states.get(index)
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the path holds no state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Parallel path generator over a precomputed [`CrossAssetStateProcess`].
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use pricer_core::market_data::FlatCurve;
/// # use pricer_core::math::SalvagingAlgorithm;
/// # use pricer_core::types::Currency;
/// # use pricer_models::models::cross_asset::*;
/// # let eur = IrLgm1fParametrization::new(
/// #     Currency::EUR, Arc::new(FlatCurve::new(0.02)), PiecewiseConstant::constant(0.01), 0.01,
/// # ).unwrap();
/// # let model = CrossAssetModel::new(vec![eur], vec![], CorrelationMatrix::identity(1)).unwrap();
/// let salvaging = SalvagingAlgorithm::Spectral;
/// let mut process = CrossAssetStateProcess::new(model, Discretization::Exact, salvaging).unwrap();
/// process.precompute(&TimeGrid::uniform(1.0, 12).unwrap()).unwrap();
///
/// let paths = MultiPathGenerator::new(42).generate(&process, 100).unwrap();
/// assert_eq!(paths.len(), 100);
/// assert_eq!(paths[0].len(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiPathGenerator {
    seed: u64,
}

impl MultiPathGenerator {
    /// Create a generator with a base seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Base seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn path_seed(&self, index: usize) -> u64 {
        self.seed
            .wrapping_add((index as u64).wrapping_add(1).wrapping_mul(SEED_STRIDE))
    }

    /// Simulate one path with the draws of path `index`.
    pub fn path(
        &self,
        process: &CrossAssetStateProcess,
        index: usize,
    ) -> Result<Path, ModelError> {
        let grid = process.grid().ok_or(ModelError::NotPrecomputed)?;
        let dim = process.dimension();
        let mut rng = StdRng::seed_from_u64(self.path_seed(index));

        let mut states = Vec::with_capacity(grid.len());
        let mut x = process.initial_values();
        let mut dw = DVector::zeros(dim);
        states.push(x.clone());
        for step in 0..grid.step_count() {
            for k in 0..dim {
                dw[k] = StandardNormal.sample(&mut rng);
            }
            x = process.evolve_step(step, &x, &dw)?;
            states.push(x.clone());
        }
        Ok(Path { states })
    }

    /// Simulate `samples` paths in parallel.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotPrecomputed`] if the process has no grid.
    pub fn generate(
        &self,
        process: &CrossAssetStateProcess,
        samples: usize,
    ) -> Result<Vec<Path>, ModelError> {
        if !process.is_precomputed() {
            return Err(ModelError::NotPrecomputed);
        }
        debug!(samples, seed = self.seed, "generating paths");
        (0..samples)
            .into_par_iter()
            .map(|index| self.path(process, index))
            .collect()
    }
}
