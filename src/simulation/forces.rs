//! Right-hand side of the coupled oscillator
//!
//! The chain is: wall --(k1, b1)-- mass 1 --(k2, b2)-- mass 2 --(k3, b3)-- wall.
//! Written as four first-order equations over `(x1, x2, x3, x4)`, where
//! `x3`/`x4` are the velocities of the two masses. Every function is pure
//! and only reads the trial state it is given.

use super::params::SystemParameters;
use super::states::NVec4;

/// dx1/dt
pub fn f1(_p: &SystemParameters, y: &NVec4) -> f64 {
    y[2]
}

/// dx2/dt
pub fn f2(_p: &SystemParameters, y: &NVec4) -> f64 {
    y[3]
}

/// dx3/dt, acceleration of mass 1
pub fn f3(p: &SystemParameters, y: &NVec4) -> f64 {
    let (x1, x2, x3, x4) = (y[0], y[1], y[2], y[3]);
    (-(p.b1 + p.b2) * x3 + p.b2 * x4 - (p.k1 + p.k2) * x1 + p.k2 * x2) / p.m1
}

/// dx4/dt, acceleration of mass 2
pub fn f4(p: &SystemParameters, y: &NVec4) -> f64 {
    let (x1, x2, x3, x4) = (y[0], y[1], y[2], y[3]);
    (p.b2 * x3 - (p.b2 + p.b3) * x4 + p.k2 * x1 - (p.k2 + p.k3) * x2) / p.m2
}

/// All four derivatives evaluated at the same trial state
pub fn derivatives(p: &SystemParameters, y: &NVec4) -> NVec4 {
    NVec4::new(f1(p, y), f2(p, y), f3(p, y), f4(p, y))
}
