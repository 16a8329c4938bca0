//! Core state type for the two-mass oscillator.
//!
//! `SimulationState` packs the four first-order variables into one `NVec4`:
//! - `x1`, `x2`: positions of mass 1 and mass 2
//! - `x3`, `x4`: velocities of mass 1 and mass 2

use std::fmt;

use nalgebra::{Vector2, Vector4};

use super::params::SystemParameters;

pub type NVec2 = Vector2<f64>;
pub type NVec4 = Vector4<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub y: NVec4, // (x1, x2, x3, x4)
}

impl SimulationState {
    pub fn new(x1: f64, x2: f64, x3: f64, x4: f64) -> Self {
        Self {
            y: NVec4::new(x1, x2, x3, x4),
        }
    }

    /// Masses displaced by the given seeds, both at rest
    pub fn at_rest(x1: f64, x2: f64) -> Self {
        Self::new(x1, x2, 0.0, 0.0)
    }

    pub fn x1(&self) -> f64 {
        self.y[0]
    }

    pub fn x2(&self) -> f64 {
        self.y[1]
    }

    pub fn x3(&self) -> f64 {
        self.y[2]
    }

    pub fn x4(&self) -> f64 {
        self.y[3]
    }

    /// The two scalars handed to the renderer each tick
    pub fn positions(&self) -> NVec2 {
        NVec2::new(self.x1(), self.x2())
    }

    pub fn is_finite(&self) -> bool {
        self.y.iter().all(|v| v.is_finite())
    }

    /// Total mechanical energy: kinetic energy of both masses plus the
    /// potential energy stored in the three springs
    pub fn energy(&self, p: &SystemParameters) -> f64 {
        let (x1, x2, v1, v2) = (self.x1(), self.x2(), self.x3(), self.x4());

        let kinetic = 0.5 * p.m1 * v1 * v1 + 0.5 * p.m2 * v2 * v2;
        let stretch = x2 - x1; // extension of the coupling spring
        let potential =
            0.5 * p.k1 * x1 * x1 + 0.5 * p.k2 * stretch * stretch + 0.5 * p.k3 * x2 * x2;

        kinetic + potential
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x1 = {:.6}, x2 = {:.6}, x3 = {:.6}, x4 = {:.6})",
            self.x1(),
            self.x2(),
            self.x3(),
            self.x4()
        )
    }
}
