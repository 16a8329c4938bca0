//! Headless tick loop
//!
//! `Engine` holds the run-length settings; `run` drives an `Integrator` for
//! that many ticks, optionally recording samples, and stops at the first
//! numerical divergence.

use log::{info, warn};

use super::error::SimError;
use super::integrator::Integrator;
use super::states::SimulationState;

/// Relative energy drift above which an undamped run is reported as suspicious
const ENERGY_DRIFT_WARN: f64 = 1e-6;

/// Upper bound on the sample buffer allocated before the loop starts
const MAX_RESERVED_SAMPLES: u64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    pub steps: u64,        // ticks to run
    pub record_every: u64, // sample interval in ticks, 0 = record nothing
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            steps: 10_000,
            record_every: 10,
        }
    }
}

/// One recorded tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub state: SimulationState,
    pub energy: f64,
}

/// Outcome of a headless run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub steps: u64,                 // completed steps
    pub t: f64,                     // simulated time reached
    pub last_state: SimulationState, // last valid state
    pub initial_energy: f64,
    pub final_energy: f64,
    pub samples: Vec<Sample>,
    pub failure: Option<SimError>,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        self.failure.is_none()
    }

    /// Relative change of mechanical energy over the run
    pub fn energy_drift(&self) -> f64 {
        if self.initial_energy == 0.0 {
            return self.final_energy.abs();
        }
        (self.final_energy - self.initial_energy).abs() / self.initial_energy.abs()
    }
}

impl Engine {
    /// Advance a seeded integrator for `self.steps` ticks
    pub fn run(&self, integrator: &mut Integrator) -> Result<RunReport, SimError> {
        let params = *integrator.params();
        let start = *integrator.state().ok_or(SimError::Uninitialized)?;
        let initial_energy = start.energy(&params);

        let mut samples = Vec::new();
        if self.record_every > 0 {
            // steps may be huge while a run stops early; grow past the cap on demand
            let expected = (self.steps / self.record_every).saturating_add(1);
            samples.reserve(expected.min(MAX_RESERVED_SAMPLES) as usize);
            samples.push(Sample {
                t: integrator.time(),
                state: start,
                energy: initial_energy,
            });
        }

        let mut failure = None;
        for _ in 0..self.steps {
            match integrator.advance().copied() {
                Ok(state) => {
                    if self.record_every > 0 && integrator.steps() % self.record_every == 0 {
                        samples.push(Sample {
                            t: integrator.time(),
                            state,
                            energy: state.energy(&params),
                        });
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let last_state = *integrator.state().ok_or(SimError::Uninitialized)?;
        let report = RunReport {
            steps: integrator.steps(),
            t: integrator.time(),
            last_state,
            initial_energy,
            final_energy: last_state.energy(&params),
            samples,
            failure,
        };

        match &report.failure {
            None if params.is_undamped() && report.energy_drift() > ENERGY_DRIFT_WARN => warn!(
                "undamped run drifted {:.3e} in energy; dt = {} may be too coarse",
                report.energy_drift(),
                params.dt
            ),
            None => info!(
                "run finished: {} steps, t = {:.4}, final {}, energy drift {:.3e}",
                report.steps,
                report.t,
                report.last_state,
                report.energy_drift()
            ),
            Some(e) => warn!(
                "run stopped after {} steps at t = {:.4}: {}",
                report.steps, report.t, e
            ),
        }

        Ok(report)
    }
}
