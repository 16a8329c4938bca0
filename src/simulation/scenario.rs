//! Build a fully-initialized simulation scenario from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - engine settings (`Engine`)
//! - physical parameters (`SystemParameters`)
//! - modal analysis used for seeding (`ModalAnalysis`)
//! - an integrator already seeded with the modal displacements

use log::info;

use crate::configuration::config::ScenarioConfig;
use crate::simulation::engine::{Engine, RunReport};
use crate::simulation::error::SimError;
use crate::simulation::integrator::Integrator;
use crate::simulation::modal::{ModalAnalysis, Seeding};
use crate::simulation::params::SystemParameters;
use crate::simulation::states::SimulationState;

/// Runtime bundle constructed from a [`ScenarioConfig`]
///
/// With the `viewer` feature it is inserted into Bevy as a `Resource` and
/// stepped once per frame.
#[cfg_attr(feature = "viewer", derive(bevy::prelude::Resource))]
#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: SystemParameters,
    pub seeding: Seeding,
    pub modal: ModalAnalysis,
    pub integrator: Integrator,
}

impl Scenario {
    /// Validate parameters, run the modal analysis and seed the integrator.
    /// Fails with `SimError::Domain` before anything is simulated.
    pub fn build_scenario(cfg: &ScenarioConfig) -> Result<Self, SimError> {
        let parameters = SystemParameters::from(&cfg.parameters);
        parameters.validate()?;

        let seeding = Seeding::from(&cfg.seeding);
        let modal = ModalAnalysis::analyze(&parameters)?;
        let (x1, x2) = modal.seeds(&seeding)?;

        if let Some(w) = modal.natural_frequencies() {
            info!("natural frequencies: {:.4} rad/s, {:.4} rad/s", w.x, w.y);
        }
        info!("seeded x1 = {:.6}, x2 = {:.6} ({:?})", x1, x2, seeding.policy);

        let mut integrator = Integrator::new(parameters);
        integrator.seed(SimulationState::at_rest(x1, x2));

        Ok(Self {
            engine: Engine::from(&cfg.engine),
            parameters,
            seeding,
            modal,
            integrator,
        })
    }

    /// Run the configured number of ticks headlessly
    pub fn run(&mut self) -> Result<RunReport, SimError> {
        self.engine.run(&mut self.integrator)
    }
}
