//! Dense in-memory cube.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;

use super::{CubeError, NpvCube};

/// Cube backed by one contiguous `Vec<f64>`.
///
/// Layout is id-major: all cells of one id form a contiguous block, which
/// lets [`par_fill`](Self::par_fill) hand each worker a disjoint block
/// without locking.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use pricer_xva::cube::{InMemoryCube, NpvCube};
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let dates = vec![
///     NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
/// ];
/// let mut cube = InMemoryCube::new(as_of, ["T1", "T2"], dates, 100, 1).unwrap();
///
/// cube.set(12.5, 1, 0, 42, 0).unwrap();
/// assert_eq!(cube.get(1, 0, 42, 0).unwrap(), 12.5);
/// assert_eq!(cube.index_of("T2"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryCube {
    as_of: NaiveDate,
    ids: Vec<String>,
    index: HashMap<String, usize>,
    dates: Vec<NaiveDate>,
    samples: usize,
    depth: usize,
    t0: Vec<f64>,
    data: Vec<f64>,
}

impl InMemoryCube {
    /// Allocate a zero-filled cube.
    ///
    /// # Errors
    ///
    /// - [`CubeError::EmptyDimension`] for zero samples, zero depth or no dates
    /// - [`CubeError::DuplicateId`] for repeated ids
    /// - [`CubeError::DateNotAfterAsOf`] / [`CubeError::UnsortedDates`] for a
    ///   bad date grid
    pub fn new<I, S>(
        as_of: NaiveDate,
        ids: I,
        dates: Vec<NaiveDate>,
        samples: usize,
        depth: usize,
    ) -> Result<Self, CubeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if samples == 0 {
            return Err(CubeError::EmptyDimension { axis: "sample" });
        }
        if depth == 0 {
            return Err(CubeError::EmptyDimension { axis: "depth" });
        }
        let Some(&first) = dates.first() else {
            return Err(CubeError::EmptyDimension { axis: "date" });
        };
        if first <= as_of {
            return Err(CubeError::DateNotAfterAsOf { date: first, as_of });
        }
        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CubeError::UnsortedDates { index: i + 1 });
        }

        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(CubeError::DuplicateId(id.clone()));
            }
        }

        let block = dates.len() * samples * depth;
        Ok(Self {
            as_of,
            t0: vec![0.0; ids.len() * depth],
            data: vec![0.0; ids.len() * block],
            ids,
            index,
            dates,
            samples,
            depth,
        })
    }

    /// Fill every cell in parallel, one id per task.
    ///
    /// `fill(id, date, sample, slots)` receives the depth vector of one
    /// cell. Cells of a given id are visited date by date, so a closure may
    /// rely on chronological order within an id.
    pub fn par_fill<F>(&mut self, fill: F)
    where
        F: Fn(usize, usize, usize, &mut [f64]) + Sync,
    {
        let (samples, depth) = (self.samples, self.depth);
        let block = self.block_len();
        if block == 0 {
            return;
        }
        self.data
            .par_chunks_mut(block)
            .enumerate()
            .for_each(|(id, cells)| {
                for (cell, slots) in cells.chunks_mut(depth).enumerate() {
                    fill(id, cell / samples, cell % samples, slots);
                }
            });
    }

    /// All samples of one `(id, date, depth)` triple.
    pub fn samples_at(&self, id: usize, date: usize, depth: usize) -> Result<Vec<f64>, CubeError> {
        self.check(id, date, 0, depth)?;
        let start = self.offset(id, date, 0, depth);
        Ok(self.data[start..start + self.samples * self.depth]
            .iter()
            .step_by(self.depth)
            .copied()
            .collect())
    }

    #[inline]
    fn block_len(&self) -> usize {
        self.dates.len() * self.samples * self.depth
    }

    #[inline]
    fn offset(&self, id: usize, date: usize, sample: usize, depth: usize) -> usize {
        ((id * self.dates.len() + date) * self.samples + sample) * self.depth + depth
    }

    fn check(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<(), CubeError> {
        check_axis("id", id, self.ids.len())?;
        check_axis("date", date, self.dates.len())?;
        check_axis("sample", sample, self.samples)?;
        check_axis("depth", depth, self.depth)
    }
}

#[inline]
fn check_axis(axis: &'static str, index: usize, len: usize) -> Result<(), CubeError> {
    if index < len {
        Ok(())
    } else {
        Err(CubeError::IndexOutOfRange { axis, index, len })
    }
}

impl NpvCube for InMemoryCube {
    fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    fn ids(&self) -> &[String] {
        &self.ids
    }

    fn samples(&self) -> usize {
        self.samples
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn get(&self, id: usize, date: usize, sample: usize, depth: usize) -> Result<f64, CubeError> {
        self.check(id, date, sample, depth)?;
        Ok(self.data[self.offset(id, date, sample, depth)])
    }

    fn set(
        &mut self,
        value: f64,
        id: usize,
        date: usize,
        sample: usize,
        depth: usize,
    ) -> Result<(), CubeError> {
        self.check(id, date, sample, depth)?;
        let offset = self.offset(id, date, sample, depth);
        self.data[offset] = value;
        Ok(())
    }

    fn get_t0(&self, id: usize, depth: usize) -> Result<f64, CubeError> {
        check_axis("id", id, self.ids.len())?;
        check_axis("depth", depth, self.depth)?;
        Ok(self.t0[id * self.depth + depth])
    }

    fn set_t0(&mut self, value: f64, id: usize, depth: usize) -> Result<(), CubeError> {
        check_axis("id", id, self.ids.len())?;
        check_axis("depth", depth, self.depth)?;
        self.t0[id * self.depth + depth] = value;
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }
}
