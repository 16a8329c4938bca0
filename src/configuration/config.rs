//! Configuration types for loading oscillator scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`ParametersConfig`] – masses, springs, dampers and the fixed step
//! - [`SeedingConfig`]    – how the modal analysis turns a mode into initial displacements
//! - [`EngineConfig`]     – run length and sampling for the headless driver
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! Every field has a default, so a partial (or empty) document is valid.
//!
//! # YAML format
//!
//! ```yaml
//! parameters:
//!   m1: 0.19      # mass 1
//!   m2: 0.1       # mass 2
//!   k1: 10.0      # wall <-> mass 1 stiffness
//!   k2: 5.0       # mass 1 <-> mass 2 stiffness
//!   k3: 3.0       # mass 2 <-> wall stiffness
//!   b1: 0.0       # damping, same layout as the springs
//!   b2: 0.0
//!   b3: 0.0
//!   dt: 0.001     # fixed step size
//!
//! seeding:
//!   amplitude: [ -100.0, 100.0 ]
//!   policy: "shared"   # or "paired"
//!   mode: 0            # 0 = lower mode, 1 = upper mode
//!
//! engine:
//!   steps: 10000
//!   record_every: 10   # 0 disables recording
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::simulation::engine::Engine;
use crate::simulation::modal::{SeedPolicy, Seeding};
use crate::simulation::params::SystemParameters;
use crate::simulation::states::NVec2;

/// Physical and numerical parameters
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub m1: f64,
    pub m2: f64,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    pub b1: f64,
    pub b2: f64,
    pub b3: f64,
    pub dt: f64,
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let p = SystemParameters::default();
        Self {
            m1: p.m1,
            m2: p.m2,
            k1: p.k1,
            k2: p.k2,
            k3: p.k3,
            b1: p.b1,
            b2: p.b2,
            b3: p.b3,
            dt: p.dt,
        }
    }
}

/// Initial displacement derived from a vibration mode
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SeedingConfig {
    pub amplitude: [f64; 2], // scale applied to (x1, x2)
    pub policy: SeedPolicy,  // which eigenvector components feed the two seeds
    pub mode: usize,         // which mode to excite
}

impl Default for SeedingConfig {
    fn default() -> Self {
        let s = Seeding::default();
        Self {
            amplitude: [s.amplitude.x, s.amplitude.y],
            policy: s.policy,
            mode: s.mode,
        }
    }
}

/// Headless run settings
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub steps: u64,        // number of ticks to run
    pub record_every: u64, // sampling interval in ticks
}

impl Default for EngineConfig {
    fn default() -> Self {
        let e = Engine::default();
        Self {
            steps: e.steps,
            record_every: e.record_every,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig, // physical system and step size
    pub seeding: SeedingConfig,       // modal seeding options
    pub engine: EngineConfig,         // headless driver options
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg = serde_yaml::from_str(s).context("failed to parse scenario YAML")?;
        Ok(cfg)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open scenario {}", path.display()))?;
        let reader = BufReader::new(file);
        let cfg = serde_yaml::from_reader(reader)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        Ok(cfg)
    }
}

impl From<&ParametersConfig> for SystemParameters {
    fn from(c: &ParametersConfig) -> Self {
        Self {
            m1: c.m1,
            m2: c.m2,
            k1: c.k1,
            k2: c.k2,
            k3: c.k3,
            b1: c.b1,
            b2: c.b2,
            b3: c.b3,
            dt: c.dt,
        }
    }
}

impl From<&SeedingConfig> for Seeding {
    fn from(c: &SeedingConfig) -> Self {
        Self {
            amplitude: NVec2::new(c.amplitude[0], c.amplitude[1]),
            policy: c.policy,
            mode: c.mode,
        }
    }
}

impl From<&EngineConfig> for Engine {
    fn from(c: &EngineConfig) -> Self {
        Self {
            steps: c.steps,
            record_every: c.record_every,
        }
    }
}
