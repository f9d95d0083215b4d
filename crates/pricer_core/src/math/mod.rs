//! Numerical building blocks.
//!
//! - [`matrix`]: Eigenvalue checks, salvaging matrix square roots, inversion
//! - [`integration`]: Gauss-Legendre quadrature over piecewise-smooth integrands

pub mod integration;
pub mod matrix;

pub use integration::GaussLegendre;
pub use matrix::{MatrixError, SalvagingAlgorithm};
