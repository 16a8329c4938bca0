//! Physical and numerical parameters for the oscillator
//!
//! `SystemParameters` is immutable for the duration of a run:
//! - masses `m1`, `m2`,
//! - wall, coupling and wall stiffnesses `k1`, `k2`, `k3`,
//! - matching damping coefficients `b1`, `b2`, `b3`,
//! - fixed integration step `dt`

use super::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemParameters {
    pub m1: f64, // mass 1
    pub m2: f64, // mass 2
    pub k1: f64, // wall <-> mass 1 stiffness
    pub k2: f64, // mass 1 <-> mass 2 stiffness
    pub k3: f64, // mass 2 <-> wall stiffness
    pub b1: f64, // wall <-> mass 1 damping
    pub b2: f64, // mass 1 <-> mass 2 damping
    pub b3: f64, // mass 2 <-> wall damping
    pub dt: f64, // fixed step size
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            m1: 0.19,
            m2: 0.1,
            k1: 10.0,
            k2: 5.0,
            k3: 3.0,
            b1: 0.0,
            b2: 0.0,
            b3: 0.0,
            dt: 0.001,
        }
    }
}

impl SystemParameters {
    /// Only the masses are needed to form the dynamics matrix and the
    /// derivative equations without dividing by zero
    pub fn check_masses(&self) -> Result<(), SimError> {
        for (field, value) in [("m1", self.m1), ("m2", self.m2)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::Domain {
                    field,
                    value,
                    reason: "mass must be positive and finite",
                });
            }
        }
        Ok(())
    }

    /// Full check of every field, used before a run is started
    pub fn validate(&self) -> Result<(), SimError> {
        self.check_masses()?;

        let non_negative = [
            ("k1", self.k1),
            ("k2", self.k2),
            ("k3", self.k3),
            ("b1", self.b1),
            ("b2", self.b2),
            ("b3", self.b3),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::Domain {
                    field,
                    value,
                    reason: "stiffness and damping must be non-negative and finite",
                });
            }
        }

        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::Domain {
                field: "dt",
                value: self.dt,
                reason: "time step must be positive and finite",
            });
        }

        Ok(())
    }

    /// True when no damping term is active
    pub fn is_undamped(&self) -> bool {
        self.b1 == 0.0 && self.b2 == 0.0 && self.b3 == 0.0
    }
}
