use float_cmp::approx_eq;
use test_case::test_case;

use oscsim::simulation::engine::Engine;
use oscsim::simulation::forces::{derivatives, f1, f2, f3, f4};
use oscsim::simulation::integrator::{rk4_step, Integrator, COMBINE_STAGE};
use oscsim::simulation::modal::{
    compute_initial_positions, compute_initial_positions_with, ModalAnalysis, SeedPolicy, Seeding,
};
use oscsim::simulation::params::SystemParameters;
use oscsim::simulation::states::{NVec2, NVec4, SimulationState};
use oscsim::{convergence_order, Scenario, ScenarioConfig, SimError};

/// Default parameters seeded from the lower mode, at rest
pub fn seeded_default() -> (SystemParameters, SimulationState) {
    let p = SystemParameters::default();
    let (x1, x2) = compute_initial_positions(&p).expect("default parameters are valid");
    (p, SimulationState::at_rest(x1, x2))
}

/// Step `n` times, panicking on divergence
pub fn step_n(mut state: SimulationState, p: &SystemParameters, n: usize) -> SimulationState {
    for i in 0..n {
        state = rk4_step(&state, p).unwrap_or_else(|e| panic!("step {i} failed: {e}"));
    }
    state
}

/// RK4 written out one scalar at a time, every stage from the same snapshot
fn rk4_scalar(s: &SimulationState, p: &SystemParameters) -> SimulationState {
    let dt = p.dt;
    let fs = [f1, f2, f3, f4];
    let eval = |y: &NVec4| [fs[0](p, y), fs[1](p, y), fs[2](p, y), fs[3](p, y)];
    let shift = |k: &[f64; 4], h: f64| {
        NVec4::new(s.x1() + h * k[0], s.x2() + h * k[1], s.x3() + h * k[2], s.x4() + h * k[3])
    };

    let k1 = eval(&s.y);
    let k2 = eval(&shift(&k1, dt / 2.0));
    let k3 = eval(&shift(&k2, dt / 2.0));
    let k4 = eval(&shift(&k3, dt));

    let mut out = s.y;
    for i in 0..4 {
        out[i] += dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    SimulationState { y: out }
}

// ==================================================================================
// Parameter tests
// ==================================================================================

#[test]
fn default_parameters_are_valid() {
    let p = SystemParameters::default();
    assert!(p.validate().is_ok(), "defaults should validate");
    assert!(p.is_undamped(), "defaults have no damping");
    assert_eq!(p.dt, 0.001, "default step size");
}

#[test]
fn negative_stiffness_is_domain_error() {
    let p = SystemParameters { k2: -1.0, ..Default::default() };
    assert!(
        matches!(p.validate(), Err(SimError::Domain { field: "k2", .. })),
        "negative k2 must be rejected"
    );
}

#[test]
fn zero_step_is_domain_error_for_runs() {
    let p = SystemParameters { dt: 0.0, ..Default::default() };
    assert!(
        matches!(p.validate(), Err(SimError::Domain { field: "dt", .. })),
        "a run needs dt > 0"
    );
}

// ==================================================================================
// Modal analysis tests
// ==================================================================================

#[test]
fn initial_positions_are_deterministic() {
    let p = SystemParameters::default();
    let a = compute_initial_positions(&p).unwrap();
    let b = compute_initial_positions(&p).unwrap();

    assert_eq!(a.0.to_bits(), b.0.to_bits(), "x1 seed differs between calls");
    assert_eq!(a.1.to_bits(), b.1.to_bits(), "x2 seed differs between calls");
}

#[test]
fn zero_mass_is_domain_error() {
    let p = SystemParameters { m1: 0.0, ..Default::default() };
    let result = compute_initial_positions(&p);
    assert!(
        matches!(result, Err(SimError::Domain { field: "m1", .. })),
        "expected DomainError for m1 = 0, got {result:?}"
    );
}

#[test]
fn negative_second_mass_is_domain_error() {
    let p = SystemParameters { m2: -0.1, ..Default::default() };
    assert!(
        matches!(ModalAnalysis::analyze(&p), Err(SimError::Domain { field: "m2", .. })),
        "negative m2 must not reach the eigen solver"
    );
}

// Masses and stiffnesses that pass the sign checks but overflow A
#[test_case(SystemParameters { m1: 1e-310, ..Default::default() } ; "subnormal first mass")]
#[test_case(SystemParameters { m2: 1e-310, ..Default::default() } ; "subnormal second mass")]
#[test_case(SystemParameters { k2: 1e308, ..Default::default() } ; "huge coupling stiffness")]
fn unrepresentable_parameters_are_domain_errors(p: SystemParameters) {
    let result = compute_initial_positions(&p);
    assert!(
        matches!(result, Err(SimError::Domain { field: "dynamics matrix", .. })),
        "expected DomainError, got {result:?}"
    );
}

#[test]
fn overflowing_eigenstructure_is_domain_error() {
    // Every entry of A is finite, but ((p - s)/2)^2 is not
    let p = SystemParameters { k1: 1e307, m1: 0.5, k3: 0.0, ..Default::default() };
    let result = ModalAnalysis::analyze(&p);
    assert!(
        matches!(result, Err(SimError::Domain { field: "eigen decomposition", .. })),
        "got {result:?}"
    );
}

#[test_case(NVec2::new(f64::NAN, 100.0), "amplitude[0]" ; "nan first amplitude")]
#[test_case(NVec2::new(-100.0, f64::INFINITY), "amplitude[1]" ; "infinite second amplitude")]
fn non_finite_amplitude_is_domain_error(amplitude: NVec2, expected: &str) {
    let p = SystemParameters::default();
    let seeding = Seeding { amplitude, ..Seeding::default() };
    match compute_initial_positions_with(&p, &seeding) {
        Err(SimError::Domain { field, .. }) => assert_eq!(field, expected),
        other => panic!("expected DomainError for {expected}, got {other:?}"),
    }
}

#[test]
fn extreme_finite_amplitude_gives_finite_seeds() {
    let p = SystemParameters::default();
    let seeding = Seeding { amplitude: NVec2::new(-f64::MAX, f64::MAX), ..Seeding::default() };
    let (x1, x2) = compute_initial_positions_with(&p, &seeding).unwrap();
    assert!(x1.is_finite() && x2.is_finite(), "seeds ({x1}, {x2})");
}

#[test]
fn default_system_is_stable_with_expected_modes() {
    let analysis = ModalAnalysis::analyze(&SystemParameters::default()).unwrap();
    assert!(analysis.is_stable(), "conservative chain must have real positive eigenvalues");

    let lo = analysis.eigen.values[0].re;
    let hi = analysis.eigen.values[1].re;
    assert!(approx_eq!(f64, lo, 43.196053609914, epsilon = 1e-6), "lower eigenvalue {lo}");
    assert!(lo < hi, "eigenvalues ordered by real part");

    let w = analysis.natural_frequencies().expect("stable system has frequencies");
    assert!(approx_eq!(f64, w.x * w.x, lo, epsilon = 1e-9), "omega^2 = lambda");
}

#[test]
fn mode_shapes_are_unit_and_phase_fixed() {
    let analysis = ModalAnalysis::analyze(&SystemParameters::default()).unwrap();

    for mode in 0..2 {
        let v = analysis.eigen.mode_shape(mode);
        let norm = (v[0].norm_sqr() + v[1].norm_sqr()).sqrt();
        assert!(approx_eq!(f64, norm, 1.0, epsilon = 1e-12), "mode {mode} not unit length");
        assert!(v[0].re > 0.0 && v[0].im == 0.0, "mode {mode} leading component not real positive");
    }

    // lower mode moves both masses in phase, upper mode against each other
    assert!(analysis.eigen.mode_shape(0)[1].re > 0.0, "lower mode should be in phase");
    assert!(analysis.eigen.mode_shape(1)[1].re < 0.0, "upper mode should be out of phase");
}

#[test]
fn shared_policy_uses_first_component_for_both_masses() {
    let (x1, x2) = compute_initial_positions(&SystemParameters::default()).unwrap();

    assert!(approx_eq!(f64, x1, -59.28006181985067, epsilon = 1e-6), "x1 seed {x1}");
    assert!(approx_eq!(f64, x2, -x1, epsilon = 1e-12), "shared seeds mirror each other");
}

#[test]
fn paired_policy_uses_both_components() {
    let p = SystemParameters::default();
    let seeding = Seeding { policy: SeedPolicy::PairedComponents, ..Seeding::default() };
    let (x1, x2) = compute_initial_positions_with(&p, &seeding).unwrap();

    let v = ModalAnalysis::analyze(&p).unwrap().eigen.mode_shape(0);
    assert!(approx_eq!(f64, x1, -100.0 * v[0].re, epsilon = 1e-12), "x1 from component 0");
    assert!(approx_eq!(f64, x2, 100.0 * v[1].re, epsilon = 1e-12), "x2 from component 1");
    assert!(approx_eq!(f64, x2, 80.53492578151844, epsilon = 1e-6), "x2 seed {x2}");
}

#[test]
fn amplitude_scales_seeds() {
    let p = SystemParameters::default();
    let unit = Seeding { amplitude: NVec2::new(1.0, 1.0), ..Seeding::default() };
    let big = Seeding { amplitude: NVec2::new(10.0, 10.0), ..Seeding::default() };

    let (a1, _) = compute_initial_positions_with(&p, &unit).unwrap();
    let (b1, _) = compute_initial_positions_with(&p, &big).unwrap();
    assert!(approx_eq!(f64, b1, 10.0 * a1, epsilon = 1e-12), "seed should scale with amplitude");
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn equilibrium_has_zero_derivatives() {
    let p = SystemParameters::default();
    let d = derivatives(&p, &NVec4::zeros());
    assert_eq!(d, NVec4::zeros(), "resting chain must not move");
}

#[test_case(SimulationState::new(1.0, -2.0, 0.5, 3.0) ; "generic state")]
#[test_case(SimulationState::at_rest(-59.28, 59.28) ; "modal seed")]
#[test_case(SimulationState::new(0.0, 0.0, 0.0, 0.0) ; "equilibrium")]
fn zero_step_is_identity(state: SimulationState) {
    let p = SystemParameters { dt: 0.0, ..Default::default() };
    let next = rk4_step(&state, &p).unwrap();
    assert_eq!(next, state, "dt = 0 must return the input state");
}

#[test]
fn vector_step_matches_scalar_stages() {
    let p = SystemParameters { b1: 0.3, b2: 0.1, b3: 0.2, ..Default::default() };
    let state = SimulationState::new(1.5, -0.7, 2.0, -4.0);

    let a = rk4_step(&state, &p).unwrap();
    let b = rk4_scalar(&state, &p);
    for i in 0..4 {
        assert!(
            approx_eq!(f64, a.y[i], b.y[i], epsilon = 1e-12),
            "component {i}: {} vs {}",
            a.y[i],
            b.y[i]
        );
    }
}

#[test]
fn default_scenario_moves_after_one_second() {
    let (p, start) = seeded_default();
    let end = step_n(start, &p, 1000);

    assert!(end.is_finite(), "state must stay finite: {end}");
    assert!(end.x3() != 0.0, "mass 1 should be moving");
    assert!(end.x4() != 0.0, "mass 2 should be moving");
}

#[test]
fn undamped_energy_is_conserved() {
    let (p, start) = seeded_default();
    let e0 = start.energy(&p);
    let end = step_n(start, &p, 10_000);
    let drift = (end.energy(&p) - e0).abs() / e0;

    assert!(drift < 1e-7, "energy drift too large: {drift:e}");
}

#[test]
fn damping_dissipates_energy() {
    let p = SystemParameters { b1: 0.05, b2: 0.02, b3: 0.05, ..Default::default() };
    let (x1, x2) = compute_initial_positions(&p).unwrap();
    let start = SimulationState::at_rest(x1, x2);

    let e0 = start.energy(&p);
    let e1 = step_n(start, &p, 20_000).energy(&p);
    assert!(e1 < 0.01 * e0, "damped chain should lose most of its energy, {e0} -> {e1}");
}

#[test]
fn rk4_is_fourth_order() {
    let (p, start) = seeded_default();
    let order = convergence_order(start, &p, 0.005, 1.0).unwrap();

    assert!((order - 4.0).abs() < 0.3, "empirical order {order} is not ~4");
}

#[test]
fn stiff_coupling_diverges() {
    let p = SystemParameters { k2: 1e9, ..Default::default() };
    let (x1, x2) = compute_initial_positions(&p).unwrap();
    let mut state = SimulationState::at_rest(x1, x2);

    let mut failure = None;
    for _ in 0..1000 {
        match rk4_step(&state, &p) {
            Ok(next) => state = next,
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    match failure {
        Some(SimError::NumericalDivergence { stage, state: last }) => {
            assert!((1..=COMBINE_STAGE).contains(&stage), "unexpected stage {stage}");
            assert_eq!(last, state, "error must carry the last valid state");
            assert!(last.is_finite(), "last valid state must be finite");
        }
        other => panic!("expected NumericalDivergence, got {other:?}"),
    }
}

#[test]
fn zero_mass_step_reports_divergence() {
    let p = SystemParameters { m1: 0.0, ..Default::default() };
    let state = SimulationState::at_rest(1.0, -1.0);
    assert!(
        matches!(rk4_step(&state, &p), Err(SimError::NumericalDivergence { stage: 1, .. })),
        "division by zero mass must surface as divergence"
    );
}

#[test]
fn integrator_requires_seed() {
    let mut integrator = Integrator::new(SystemParameters::default());
    assert!(!integrator.is_running(), "new integrator is uninitialized");
    assert_eq!(integrator.advance().unwrap_err(), SimError::Uninitialized);
    assert!(integrator.state().is_none(), "no state before seeding");
}

#[test]
fn integrator_tracks_steps_and_time() {
    let (p, start) = seeded_default();
    let mut integrator = Integrator::new(p);
    integrator.seed(start);

    for _ in 0..250 {
        integrator.advance().unwrap();
    }

    assert_eq!(integrator.steps(), 250);
    assert!(
        approx_eq!(f64, integrator.time(), 0.25, epsilon = 1e-12),
        "time {}",
        integrator.time()
    );
    assert_eq!(
        *integrator.state().unwrap(),
        step_n(start, &p, 250),
        "integrator must match pure steps"
    );
}

#[test]
fn failed_advance_keeps_last_valid_state() {
    let p = SystemParameters { k2: 1e9, ..Default::default() };
    let mut integrator = Integrator::new(p);
    integrator.seed(SimulationState::at_rest(-50.0, 50.0));

    let err = loop {
        let before = *integrator.state().unwrap();
        if let Err(e) = integrator.advance().copied() {
            assert_eq!(*integrator.state().unwrap(), before, "state changed on failure");
            break e;
        }
        assert!(integrator.steps() < 1000, "should diverge well before 1000 steps");
    };

    assert!(matches!(err, SimError::NumericalDivergence { .. }), "got {err:?}");
}

// ==================================================================================
// Engine / scenario tests
// ==================================================================================

#[test]
fn engine_records_samples() {
    let (p, start) = seeded_default();
    let mut integrator = Integrator::new(p);
    integrator.seed(start);

    let engine = Engine { steps: 100, record_every: 10 };
    let report = engine.run(&mut integrator).unwrap();

    assert!(report.completed(), "undamped default run must complete");
    assert_eq!(report.steps, 100);
    assert_eq!(report.samples.len(), 11, "initial sample plus one every 10 steps");
    assert_eq!(report.samples[0].state, start);
    assert!(report.energy_drift() < 1e-9, "drift {}", report.energy_drift());
}

#[test]
fn engine_stops_early_on_unbounded_run() {
    let p = SystemParameters { k2: 1e9, ..Default::default() };
    let mut integrator = Integrator::new(p);
    integrator.seed(SimulationState::at_rest(-50.0, 50.0));

    let engine = Engine { steps: u64::MAX, record_every: 1 };
    let report = engine.run(&mut integrator).unwrap();

    assert!(!report.completed(), "stiff run must stop");
    assert!(report.steps < 1000, "stopped after {} steps", report.steps);
    assert_eq!(report.samples.len() as u64, report.steps + 1, "initial sample plus one per step");
}

#[test]
fn engine_refuses_unseeded_integrator() {
    let mut integrator = Integrator::new(SystemParameters::default());
    let result = Engine::default().run(&mut integrator);
    assert!(matches!(result, Err(SimError::Uninitialized)), "got {result:?}");
}

#[test]
fn scenario_reports_divergence_with_last_state() {
    let cfg = ScenarioConfig::from_yaml_str(
        "parameters: { k2: 1.0e9 }\nengine: { steps: 1000, record_every: 0 }\n",
    )
    .unwrap();
    let mut scenario = Scenario::build_scenario(&cfg).unwrap();
    let report = scenario.run().unwrap();

    assert!(!report.completed(), "stiff run must stop");
    assert!(report.steps < 1000, "stopped after {} steps", report.steps);
    assert!(report.last_state.is_finite(), "last valid state must be finite");
    assert!(report.samples.is_empty(), "recording disabled");
    assert!(
        matches!(report.failure, Some(SimError::NumericalDivergence { .. })),
        "got {:?}",
        report.failure
    );
}

#[test]
fn scenario_refuses_invalid_mass() {
    let cfg = ScenarioConfig::from_yaml_str("parameters:\n  m1: 0.0\n").unwrap();
    let result = Scenario::build_scenario(&cfg);
    assert!(
        matches!(result, Err(SimError::Domain { field: "m1", .. })),
        "got {:?}",
        result.map(|_| ())
    );
}

#[test]
fn scenario_refuses_nan_amplitude() {
    let cfg = ScenarioConfig::from_yaml_str("seeding:\n  amplitude: [.nan, 100.0]\n").unwrap();
    let result = Scenario::build_scenario(&cfg);
    assert!(
        matches!(result, Err(SimError::Domain { field: "amplitude[0]", .. })),
        "got {:?}",
        result.map(|_| ())
    );
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let cfg = ScenarioConfig::from_yaml_str("seeding:\n  policy: \"paired\"\n").unwrap();

    assert_eq!(SystemParameters::from(&cfg.parameters), SystemParameters::default());
    assert_eq!(cfg.seeding.policy, SeedPolicy::PairedComponents);
    assert_eq!(cfg.seeding.amplitude, [-100.0, 100.0]);
    assert_eq!(cfg.engine.steps, 10_000);
}

#[test]
fn unknown_policy_is_rejected() {
    let result = ScenarioConfig::from_yaml_str("seeding:\n  policy: \"diagonal\"\n");
    assert!(result.is_err(), "unknown seed policy must not parse");
}

#[test]
fn bundled_scenarios_load() {
    let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios");

    for name in ["default.yaml", "damped_paired.yaml", "stiff_coupling.yaml"] {
        let cfg = ScenarioConfig::from_file(dir.join(name))
            .unwrap_or_else(|e| panic!("{name}: {e:#}"));
        assert!(Scenario::build_scenario(&cfg).is_ok(), "{name} should build");
    }
}
