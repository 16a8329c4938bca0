use oscsim::{Scenario, ScenarioConfig, RunReport};
use oscsim::{bench_convergence, bench_rk4};

use clap::Parser;
use anyhow::{bail, Result};
use log::info;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file, relative to the `scenarios` directory
    #[arg(short, default_value = "default.yaml")]
    file_name: String,

    /// Override the number of ticks to run
    #[arg(long)]
    steps: Option<u64>,

    /// Write recorded samples as CSV
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run the timing and convergence benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,

    /// Animate the scenario (requires the `viewer` feature)
    #[arg(long)]
    viewer: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    ScenarioConfig::from_file(config_path)
}

fn write_csv(path: &PathBuf, report: &RunReport) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "t,x1,x2,x3,x4,energy")?;
    for s in &report.samples {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            s.t,
            s.state.x1(),
            s.state.x2(),
            s.state.x3(),
            s.state.x4(),
            s.energy
        )?;
    }
    out.flush()?;
    info!("wrote {} samples to {}", report.samples.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    if args.bench {
        bench_rk4()?;
        bench_convergence()?;
        return Ok(());
    }

    let mut scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    if let Some(steps) = args.steps {
        scenario_cfg.engine.steps = steps;
    }

    let mut scenario = Scenario::build_scenario(&scenario_cfg)?;

    if args.viewer {
        #[cfg(feature = "viewer")]
        {
            oscsim::run_2d(scenario);
            return Ok(());
        }
        #[cfg(not(feature = "viewer"))]
        bail!("built without the `viewer` feature");
    }

    let report = scenario.run()?;

    if let Some(path) = &args.output {
        write_csv(path, &report)?;
    }

    if let Some(e) = report.failure {
        bail!(
            "simulation stopped after {} steps, last valid state {}: {}",
            report.steps,
            report.last_state,
            e
        );
    }

    Ok(())
}
