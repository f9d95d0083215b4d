//! # Pricer Risk (L4: Application)
//!
//! Par sensitivities, par stress scenarios and SIMM initial margin on top
//! of the simulation market.
//!
//! This crate provides:
//! - Risk factor keys, scenarios and a scenario simulation market
//! - Par instruments and the bump-and-reprice par sensitivity Jacobian
//! - Zero to par sensitivity conversion
//! - Dependency-ordered conversion of par stress shocks to zero shocks
//! - SIMM sensitivity storage in an NPV cube and dynamic initial margin
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            pricer_risk (L4)             │
//! ├─────────────────────────────────────────┤
//! │  scenarios/  - RiskFactorKey, Scenario, │
//! │               ScenarioSimMarket         │
//! │  par/        - Par Jacobian, converter  │
//! │  stress/     - Par -> zero stress       │
//! │  simm/       - SIMM storage, helper     │
//! │  parallel/   - Rayon utilities          │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │   pricer_xva (L3)  /  pricer_core (L1)  │
//! │   NPV cube, DIM     Curves, Market      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use pricer_risk::scenarios::RiskFactorKey;
//! use pricer_risk::stress::DependencyGraph;
//!
//! let one_year = RiskFactorKey::discount("EUR", 0);
//! let two_year = RiskFactorKey::discount("EUR", 1);
//!
//! // the 2Y par rate needs the 1Y zero shift first
//! let mut graph = DependencyGraph::new();
//! graph.add_edge(&one_year, &two_year);
//!
//! let order = graph.topological_order();
//! assert_eq!(order.ordered, vec![one_year, two_year]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod par;
pub mod parallel;
pub mod scenarios;
pub mod simm;
pub mod stress;

// Re-export commonly used types
pub use par::{ParSensitivityAnalysis, ParSensitivityConfig, ParSensitivityConverter};
pub use parallel::ParallelConfig;
pub use scenarios::{KeyType, RiskFactorKey, Scenario, ScenarioSimMarket};
pub use simm::{SimmHelper, StandardSimmAggregator};
pub use stress::{ParStressScenarioConverter, StressScenario};
