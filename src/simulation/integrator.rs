//! Fixed-step time integration for the coupled oscillator
//!
//! `rk4_step` is the pure classic Runge-Kutta-4 step over the four
//! first-order equations in `forces`. `Integrator` wraps it with the
//! owned state, the step counter and the simulated time.

use log::{error, trace};

use super::error::SimError;
use super::forces::derivatives;
use super::params::SystemParameters;
use super::states::{NVec4, SimulationState};

/// Stage number reported when the combined state, not a stage derivative, is non-finite
pub const COMBINE_STAGE: usize = 5;

/// Evaluate one RK4 stage, refusing NaN/Inf
fn stage(
    p: &SystemParameters,
    y: &NVec4,
    n: usize,
    start: &SimulationState,
) -> Result<NVec4, SimError> {
    let k = derivatives(p, y);
    if k.iter().all(|v| v.is_finite()) {
        Ok(k)
    } else {
        Err(SimError::NumericalDivergence { stage: n, state: *start })
    }
}

/// Advance `state` by exactly `p.dt` with classic RK4
///
/// Every stage reads the same pre-step snapshot `y`, so none of the four
/// components ever sees a partially updated sibling. On failure the error
/// carries `state` as the last valid state.
pub fn rk4_step(
    state: &SimulationState,
    p: &SystemParameters,
) -> Result<SimulationState, SimError> {
    let dt = p.dt;
    let half_dt = 0.5 * dt;
    let y = state.y;

    // k1 at y_n
    let k1 = stage(p, &y, 1, state)?;

    // k2 at y_n + dt/2 * k1
    let k2 = stage(p, &(y + half_dt * k1), 2, state)?;

    // k3 at y_n + dt/2 * k2
    let k3 = stage(p, &(y + half_dt * k2), 3, state)?;

    // k4 at y_n + dt * k3
    let k4 = stage(p, &(y + dt * k3), 4, state)?;

    // y_n+1 = y_n + dt/6 (k1 + 2 k2 + 2 k3 + k4)
    let next = SimulationState {
        y: y + (dt / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4),
    };

    if !next.is_finite() {
        return Err(SimError::NumericalDivergence {
            stage: COMBINE_STAGE,
            state: *state,
        });
    }

    Ok(next)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Uninitialized,
    Running {
        state: SimulationState,
        steps: u64, // completed steps
        t: f64,     // simulated time
    },
}

/// Owner of the evolving `SimulationState`
///
/// Starts uninitialized; `seed` makes it running. A failed `advance` leaves
/// the last valid state in place and the driver decides whether to stop.
#[derive(Debug, Clone)]
pub struct Integrator {
    params: SystemParameters,
    phase: Phase,
}

impl Integrator {
    pub fn new(params: SystemParameters) -> Self {
        Self {
            params,
            phase: Phase::Uninitialized,
        }
    }

    pub fn params(&self) -> &SystemParameters {
        &self.params
    }

    /// Install the initial state, restarting the step counter and clock
    pub fn seed(&mut self, state: SimulationState) {
        self.phase = Phase::Running { state, steps: 0, t: 0.0 };
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn state(&self) -> Option<&SimulationState> {
        match &self.phase {
            Phase::Running { state, .. } => Some(state),
            Phase::Uninitialized => None,
        }
    }

    pub fn steps(&self) -> u64 {
        match self.phase {
            Phase::Running { steps, .. } => steps,
            Phase::Uninitialized => 0,
        }
    }

    pub fn time(&self) -> f64 {
        match self.phase {
            Phase::Running { t, .. } => t,
            Phase::Uninitialized => 0.0,
        }
    }

    /// One tick: replace the state with its RK4 successor
    pub fn advance(&mut self) -> Result<&SimulationState, SimError> {
        let Phase::Running { state, steps, t } = &mut self.phase else {
            return Err(SimError::Uninitialized);
        };

        match rk4_step(state, &self.params) {
            Ok(next) => {
                *state = next;
                *steps += 1;
                *t += self.params.dt;
                trace!("step {} t = {:.6} {}", steps, t, state);
                Ok(state)
            }
            Err(e) => {
                error!("integration halted after {} steps at t = {:.6}: {}", steps, t, e);
                Err(e)
            }
        }
    }
}
