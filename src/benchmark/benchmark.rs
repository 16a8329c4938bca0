use std::time::Instant;

use crate::simulation::error::SimError;
use crate::simulation::integrator::rk4_step;
use crate::simulation::modal::compute_initial_positions;
use crate::simulation::params::SystemParameters;
use crate::simulation::states::SimulationState;

/// Default system seeded from its lower mode, at rest
fn seeded_default() -> Result<(SystemParameters, SimulationState), SimError> {
    let params = SystemParameters::default();
    let (x1, x2) = compute_initial_positions(&params)?;
    Ok((params, SimulationState::at_rest(x1, x2)))
}

/// Integrate from `start` up to `t_end` with step `dt`
/// `t_end / dt` is rounded to the nearest whole number of steps
pub fn integrate_to(
    start: SimulationState,
    params: &SystemParameters,
    dt: f64,
    t_end: f64,
) -> Result<SimulationState, SimError> {
    let p = SystemParameters { dt, ..*params };
    let n = (t_end / dt).round() as u64;

    let mut state = start;
    for _ in 0..n {
        state = rk4_step(&state, &p)?;
    }
    Ok(state)
}

/// Empirical convergence order from three runs at `dt`, `dt/2`, `dt/4`
///
/// Richardson-style: with `e1 = |y(dt) - y(dt/2)|` and
/// `e2 = |y(dt/2) - y(dt/4)|`, the order is `log2(e1 / e2)`.
pub fn convergence_order(
    start: SimulationState,
    params: &SystemParameters,
    dt: f64,
    t_end: f64,
) -> Result<f64, SimError> {
    let coarse = integrate_to(start, params, dt, t_end)?;
    let medium = integrate_to(start, params, 0.5 * dt, t_end)?;
    let fine = integrate_to(start, params, 0.25 * dt, t_end)?;

    let e1 = (coarse.y - medium.y).norm();
    let e2 = (medium.y - fine.y).norm();

    Ok((e1 / e2).log2())
}

/// Time single RK4 steps for increasing step counts
pub fn bench_rk4() -> Result<(), SimError> {
    let (params, start) = seeded_default()?;
    let counts = [1_000u64, 10_000, 100_000, 1_000_000];

    for n in counts {
        let mut state = start;

        // Warm up
        state = rk4_step(&state, &params)?;

        let t0 = Instant::now();
        for _ in 0..n {
            state = rk4_step(&state, &params)?;
        }
        let per_step = t0.elapsed().as_secs_f64() / n as f64;

        println!("steps = {:8}, per step = {:10.3e} s, final {}", n, per_step, state);
    }
    Ok(())
}

/// Print the empirical order for a sweep of base step sizes
/// Paste output directly into a spreadsheet to graph
pub fn bench_convergence() -> Result<(), SimError> {
    let (params, start) = seeded_default()?;

    println!("dt,order");
    for dt in [0.04, 0.02, 0.01, 0.005] {
        let order = convergence_order(start, &params, dt, 1.0)?;
        println!("{},{:.4}", dt, order);
    }
    Ok(())
}
