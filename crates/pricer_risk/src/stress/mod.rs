//! Par stress scenarios.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Stress Conversion                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  DependencyGraph            - Par key -> par keys needed  │
//! │  DependencyOrder            - Kahn order + cycle residue  │
//! │  StressScenario             - Par and zero shocks         │
//! │  ParStressScenarioConverter - Par shocks -> zero shocks   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A cyclic par dependency is a configuration error: it is reported when
//! the converter is built, never by truncating a conversion.
//!
//! Par keys are solved per key-type family. Rates curves (discount, yield,
//! index) move together, so shocking a discount pillar holds every
//! unshocked index pillar at its par rate.

mod converter;
mod dependency;
mod error;

pub use converter::{ParStressScenarioConverter, StressScenario};
pub use dependency::{DependencyGraph, DependencyOrder};
pub use error::StressError;
