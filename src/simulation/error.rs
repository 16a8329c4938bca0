//! Failure taxonomy of the numerical core
//!
//! Neither kind is transient: both point at a parameterization problem, so
//! callers stop rather than retry.

use thiserror::Error;

use super::states::SimulationState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Invalid physical parameters, or seeding inputs they cannot represent
    #[error("invalid parameter `{field}` = {value}: {reason}")]
    Domain {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A derivative or state component became NaN/Inf during a step.
    /// `stage` is 1..=4 for a stage derivative, 5 for the combined state;
    /// `state` is the last valid state, i.e. the input of the failed step.
    #[error("numerical divergence in RK4 stage {stage} (last valid state {state})")]
    NumericalDivergence { stage: usize, state: SimulationState },

    #[error("integrator advanced before an initial state was seeded")]
    Uninitialized,
}
