//! NPV cube error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by cube construction and cell access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CubeError {
    /// Index outside one of the cube dimensions.
    #[error("Cube {axis} index {index} out of range (size {len})")]
    IndexOutOfRange {
        /// Dimension name: id, date, sample or depth
        axis: &'static str,
        /// Requested index
        index: usize,
        /// Size of the dimension
        len: usize,
    },

    /// Id not held by the cube.
    #[error("Unknown cube id: {0}")]
    UnknownId(String),

    /// Id supplied twice at construction.
    #[error("Duplicate cube id: {0}")]
    DuplicateId(String),

    /// A cube dimension of size zero.
    #[error("Cube {axis} dimension must be non-empty")]
    EmptyDimension {
        /// Dimension name
        axis: &'static str,
    },

    /// Dates not strictly increasing.
    #[error("Cube dates not strictly increasing at index {index}")]
    UnsortedDates {
        /// First offending index
        index: usize,
    },

    /// First date on or before the as-of date.
    #[error("Cube date {date} is not after the as-of date {as_of}")]
    DateNotAfterAsOf {
        /// Offending date
        date: NaiveDate,
        /// Valuation date
        as_of: NaiveDate,
    },
}
