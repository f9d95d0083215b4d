//! Simulation time grid with quantized lookup.
//!
//! Step caches in the state process are addressed by step index. Times are
//! mapped to indices through integer keys `round(t / TIME_QUANTUM)`, so two
//! floating-point times that differ by less than half a quantum resolve to
//! the same step.

use super::error::ModelError;

/// Resolution of time lookups (years).
pub const TIME_QUANTUM: f64 = 1e-10;

#[inline]
fn quantize(t: f64) -> i64 {
    (t / TIME_QUANTUM).round() as i64
}

/// Sorted simulation times starting at zero.
///
/// # Example
///
/// ```
/// use pricer_models::models::cross_asset::TimeGrid;
///
/// let grid = TimeGrid::new(&[0.5, 1.0, 2.0]).unwrap();
/// assert_eq!(grid.len(), 4);
/// assert_eq!(grid.index_of(1.0 + 1e-13), Some(2));
/// assert_eq!(grid.steps().count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    keys: Vec<i64>,
}

impl TimeGrid {
    /// Build a grid from positive, strictly increasing times; `0` is prepended.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] if the times are empty, non-positive,
    /// unsorted or closer than [`TIME_QUANTUM`].
    pub fn new(times: &[f64]) -> Result<Self, ModelError> {
        if times.is_empty() {
            return Err(ModelError::InvalidParameter(
                "time grid needs at least one time".to_string(),
            ));
        }
        let mut grid = Vec::with_capacity(times.len() + 1);
        grid.push(0.0);
        grid.extend_from_slice(times);

        let keys: Vec<i64> = grid.iter().map(|&t| quantize(t)).collect();
        if grid.iter().any(|t| !t.is_finite()) || keys.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::InvalidParameter(
                "time grid must be finite, positive and strictly increasing".to_string(),
            ));
        }
        Ok(Self { times: grid, keys })
    }

    /// Equally spaced grid of `steps` steps up to `horizon`.
    pub fn uniform(horizon: f64, steps: usize) -> Result<Self, ModelError> {
        if steps == 0 || horizon <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "uniform grid needs positive horizon and steps, got {} / {}",
                horizon, steps
            )));
        }
        let dt = horizon / steps as f64;
        let times: Vec<f64> = (1..=steps).map(|k| k as f64 * dt).collect();
        Self::new(&times)
    }

    /// Grid times including the leading zero.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false: a grid holds at least `0` and one further time.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of steps (`len() - 1`).
    pub fn step_count(&self) -> usize {
        self.times.len() - 1
    }

    /// `(t0, dt)` of step `step`.
    pub fn step(&self, step: usize) -> Option<(f64, f64)> {
        let t0 = *self.times.get(step)?;
        let t1 = *self.times.get(step + 1)?;
        Some((t0, t1 - t0))
    }

    /// Iterator over `(t0, dt)` for every step.
    pub fn steps(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.windows(2).map(|w| (w[0], w[1] - w[0]))
    }

    /// Index of the grid point matching `t` to within the quantum.
    pub fn index_of(&self, t: f64) -> Option<usize> {
        self.keys.binary_search(&quantize(t)).ok()
    }
}
