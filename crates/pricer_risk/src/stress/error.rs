//! Stress conversion error types.

use thiserror::Error;

use crate::scenarios::ScenarioError;

/// Errors raised while converting par stress scenarios.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StressError {
    /// Par dependencies contain a cycle; the listed keys cannot be ordered.
    #[error("Cyclic par dependency among {}: {}", .unresolved.len(), .unresolved.join(", "))]
    CyclicDependency {
        /// Keys left unordered by the sort
        unresolved: Vec<String>,
    },

    /// Par shift on a key with no par sensitivities.
    #[error("No par sensitivities for {0}")]
    UnknownParKey(String),

    /// Par rate insensitive to its own zero factor.
    #[error("Singular Jacobian diagonal {value} for {key}")]
    SingularDiagonal {
        /// Par key
        key: String,
        /// Diagonal sensitivity
        value: f64,
    },

    /// Scenario still carries par shifts.
    #[error("Scenario {0} has unconverted par shifts")]
    PendingParShifts(String),

    /// Zero shift could not be applied to the simulation market.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}
