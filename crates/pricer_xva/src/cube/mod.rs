//! NPV cube storage.
//!
//! A cube is a dense four-dimensional array indexed by
//! `(id, date, sample, depth)` plus a T0 slice indexed by `(id, depth)`.
//! Ids are trades or netting sets; depth slots are channels whose meaning
//! is agreed between the producer and each consumer (see
//! [`XvaConfig`](crate::xva::XvaConfig) for the slots the XVA calculator
//! reads).
//!
//! ```text
//!            sample ──►
//!         ┌───────────────┐
//!  date   │ [d0 d1 .. dk] │   one depth vector per cell
//!   │     │ [d0 d1 .. dk] │
//!   ▼     └───────────────┘   × num_ids
//! ```

mod error;
mod in_memory;

pub use error::CubeError;
pub use in_memory::InMemoryCube;

use chrono::NaiveDate;

/// Read/write access to an NPV cube.
///
/// All accessors check their indices and fail with
/// [`CubeError::IndexOutOfRange`] rather than panicking.
pub trait NpvCube: Send + Sync {
    /// Valuation date of the T0 slice.
    fn as_of(&self) -> NaiveDate;

    /// Simulation dates, strictly increasing and after [`as_of`](Self::as_of).
    fn dates(&self) -> &[NaiveDate];

    /// Ids in index order.
    fn ids(&self) -> &[String];

    /// Number of samples per date.
    fn samples(&self) -> usize;

    /// Number of depth slots per cell.
    fn depth(&self) -> usize;

    /// Value at `(id, date, sample, depth)`.
    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError>;

    /// Store a value at `(id, date, sample, depth)`.
    fn set(
        &mut self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError>;

    /// T0 value of `id` in slot `depth`.
    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError>;

    /// Store a T0 value.
    fn set_t0(&mut self, value: f64, id: usize, depth: usize) -> Result<(), CubeError>;

    /// Number of ids.
    fn num_ids(&self) -> usize {
        self.ids().len()
    }

    /// Number of simulation dates.
    fn num_dates(&self) -> usize {
        self.dates().len()
    }

    /// Index of an id, if held.
    fn index_of(&self, id: &str) -> Option<usize> {
        self.ids().iter().position(|held| held == id)
    }

    /// Index of an id.
    ///
    /// # Errors
    ///
    /// [`CubeError::UnknownId`] if the cube does not hold `id`.
    fn required_index(&self, id: &str) -> Result<usize, CubeError> {
        self.index_of(id)
            .ok_or_else(|| CubeError::UnknownId(id.to_string()))
    }

    /// `(id, index)` pairs in index order.
    fn ids_and_indexes(&self) -> Vec<(&str, usize)> {
        self.ids()
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect()
    }
}
