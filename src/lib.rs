pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{SimulationState, NVec2, NVec4};
pub use simulation::params::SystemParameters;
pub use simulation::error::SimError;
pub use simulation::forces::derivatives;
pub use simulation::modal::{
    compute_initial_positions, compute_initial_positions_with, EigenDecomposition, ModalAnalysis,
    SeedPolicy, Seeding,
};
pub use simulation::integrator::{rk4_step, Integrator};
pub use simulation::engine::{Engine, RunReport, Sample};
pub use simulation::scenario::Scenario;

pub use configuration::config::{ScenarioConfig, ParametersConfig, SeedingConfig, EngineConfig};

#[cfg(feature = "viewer")]
pub use visualization::osc_vis2d::run_2d;

pub use benchmark::benchmark::{bench_rk4, bench_convergence, convergence_order};
