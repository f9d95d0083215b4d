//! Sample-parallel evaluation for pathwise margin.
//!
//! Initial margin on one cube date is an independent SIMM evaluation per
//! Monte Carlo sample. Samples are cut into contiguous batches, batches run
//! on the rayon pool, and results come back in sample order. Small sample
//! counts stay on the calling thread.

use rayon::prelude::*;

/// Samples evaluated by one rayon task.
pub const DEFAULT_SAMPLES_PER_BATCH: usize = 64;

/// Sample count below which evaluation stays sequential.
pub const DEFAULT_MIN_PARALLEL_SAMPLES: usize = 100;

/// Batching of per-sample evaluations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Samples per rayon task, at least one
    pub samples_per_batch: usize,
    /// Minimum sample count before the pool is used
    pub min_parallel_samples: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            samples_per_batch: DEFAULT_SAMPLES_PER_BATCH,
            min_parallel_samples: DEFAULT_MIN_PARALLEL_SAMPLES,
        }
    }
}

impl ParallelConfig {
    /// Creates a configuration; a zero batch size is raised to one.
    pub fn new(samples_per_batch: usize, min_parallel_samples: usize) -> Self {
        Self {
            samples_per_batch: samples_per_batch.max(1),
            min_parallel_samples,
        }
    }

    /// Configuration that never uses the pool.
    pub fn sequential() -> Self {
        Self::new(DEFAULT_SAMPLES_PER_BATCH, usize::MAX)
    }

    /// Whether `n_samples` evaluations go to the pool.
    #[inline]
    pub fn is_parallel(&self, n_samples: usize) -> bool {
        n_samples >= self.min_parallel_samples
    }

    /// Evaluates `f` on every sample index `0..n_samples`.
    ///
    /// Results are in sample order. The first error in sample order is
    /// returned when several samples fail in sequential mode; in parallel
    /// mode any failing sample's error may be returned.
    pub fn try_map_samples<R, E, F>(&self, n_samples: usize, f: F) -> Result<Vec<R>, E>
    where
        R: Send,
        E: Send,
        F: Fn(usize) -> Result<R, E> + Sync + Send,
    {
        if !self.is_parallel(n_samples) {
            return (0..n_samples).map(f).collect();
        }
        let batch = self.samples_per_batch.max(1);
        let batches = (0..n_samples.div_ceil(batch))
            .into_par_iter()
            .map(|b| {
                (b * batch..((b + 1) * batch).min(n_samples))
                    .map(&f)
                    .collect::<Result<Vec<R>, E>>()
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(batches.into_iter().flatten().collect())
    }
}
