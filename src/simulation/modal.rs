//! Modal analysis of the undamped oscillator
//!
//! Builds the 2x2 dynamics matrix `A` from `SystemParameters`, solves its
//! eigenproblem in closed form and turns one vibration mode into the two
//! initial displacements that seed the integrator.
//!
//! `A` is generally not symmetric (the rows are scaled by different masses),
//! so eigenvalues and eigenvectors are carried as complex numbers even though
//! a physically stable system only produces real, positive eigenvalues.

use log::{debug, warn};
use nalgebra::{Complex, Matrix2, Vector2};
use serde::Deserialize;

use super::error::SimError;
use super::params::SystemParameters;
use super::states::NVec2;

pub type CVec2 = Vector2<Complex<f64>>;
pub type CMat2 = Matrix2<Complex<f64>>;

/// Relative tolerance below which an imaginary part is treated as roundoff
const IMAG_TOL: f64 = 1e-12;

// Entries of the dynamics matrix, row-major
fn a00(p: &SystemParameters) -> f64 {
    (p.k1 + p.k2) / p.m1
}

fn a01(p: &SystemParameters) -> f64 {
    -p.k2 / p.m1
}

fn a10(p: &SystemParameters) -> f64 {
    -p.k2 / p.m2
}

fn a11(p: &SystemParameters) -> f64 {
    (p.k2 + p.k3) / p.m2
}

/// `A = [[(k1+k2)/m1, -k2/m1], [-k2/m2, (k2+k3)/m2]]`
pub fn dynamics_matrix(p: &SystemParameters) -> Result<Matrix2<f64>, SimError> {
    p.check_masses()?;
    let a = Matrix2::new(a00(p), a01(p), a10(p), a11(p));

    // Positive but tiny masses or huge stiffnesses can still overflow
    if let Some(value) = a.iter().copied().find(|v| !v.is_finite()) {
        return Err(SimError::Domain {
            field: "dynamics matrix",
            value,
            reason: "stiffness-to-mass ratio is not representable",
        });
    }
    Ok(a)
}

/// Eigenvalues and unit eigenvectors (as columns) of a real 2x2 matrix.
///
/// Index 0 holds the root with the lower real part (the fundamental mode of
/// a stable system), index 1 the other one. Each eigenvector is scaled to
/// unit length and rotated so its first non-zero component is real and
/// positive, which makes the decomposition fully deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDecomposition {
    pub values: CVec2,
    pub vectors: CMat2,
}

impl EigenDecomposition {
    pub fn of(a: &Matrix2<f64>) -> Self {
        let (p, q, r, s) = (a[(0, 0)], a[(0, 1)], a[(1, 0)], a[(1, 1)]);

        // lambda = (p + s)/2 -/+ sqrt(((p - s)/2)^2 + q r)
        let centre = Complex::new(0.5 * (p + s), 0.0);
        let half_gap = 0.5 * (p - s);
        let root = Complex::new(half_gap * half_gap + q * r, 0.0).sqrt();

        let lo = centre - root;
        let hi = centre + root;

        // Diagonal case: the eigenvectors are the basis vectors, ordered like the roots
        let e1 = CVec2::new(Complex::new(1.0, 0.0), Complex::new(0.0, 0.0));
        let e2 = CVec2::new(Complex::new(0.0, 0.0), Complex::new(1.0, 0.0));
        let (basis_lo, basis_hi) = if p <= s { (e1, e2) } else { (e2, e1) };

        let v_lo = eigenvector(a, lo, basis_lo);
        let v_hi = eigenvector(a, hi, basis_hi);

        Self {
            values: CVec2::new(lo, hi),
            vectors: CMat2::from_columns(&[v_lo, v_hi]),
        }
    }

    /// Overflow inside the closed form leaves NaN/Inf in values or vectors
    pub fn check_finite(&self) -> Result<(), SimError> {
        let entries = self.values.iter().chain(self.vectors.iter());
        match entries.copied().find(|c| !(c.re.is_finite() && c.im.is_finite())) {
            Some(c) => Err(SimError::Domain {
                field: "eigen decomposition",
                value: if c.re.is_finite() { c.im } else { c.re },
                reason: "eigenstructure overflowed for these parameters",
            }),
            None => Ok(()),
        }
    }

    /// The two-component eigenvector of `mode` (0 or 1)
    pub fn mode_shape(&self, mode: usize) -> CVec2 {
        self.vectors.column(mode).into_owned()
    }
}

/// Solve `(A - lambda I) v = 0` using whichever row has the larger off-diagonal entry
fn eigenvector(a: &Matrix2<f64>, lambda: Complex<f64>, basis: CVec2) -> CVec2 {
    let (p, q, r, s) = (a[(0, 0)], a[(0, 1)], a[(1, 0)], a[(1, 1)]);

    let v = if q != 0.0 && q.abs() >= r.abs() {
        CVec2::new(Complex::new(q, 0.0), lambda - p)
    } else if r != 0.0 {
        CVec2::new(lambda - s, Complex::new(r, 0.0))
    } else {
        basis
    };

    normalize(v)
}

/// Unit length, first non-zero component real and positive
fn normalize(v: CVec2) -> CVec2 {
    let norm = (v[0].norm_sqr() + v[1].norm_sqr()).sqrt();
    let lead = if v[0].norm() > 0.0 { v[0] } else { v[1] };
    let phase = lead.conj() / lead.norm();

    v.map(|c| c * phase / norm)
}

/// How the two seeds are read off the chosen mode shape `v`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SeedPolicy {
    /// Both seeds from `Re(v[0])`, as the reference animation does
    #[serde(rename = "shared")]
    SharedComponent,

    /// `x1` from `Re(v[0])`, `x2` from `Re(v[1])`
    #[serde(rename = "paired")]
    PairedComponents,
}

/// Runtime seeding options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seeding {
    pub amplitude: NVec2, // scale applied to (x1, x2)
    pub policy: SeedPolicy,
    pub mode: usize, // 0 = lower mode, 1 = upper mode
}

impl Default for Seeding {
    fn default() -> Self {
        Self {
            amplitude: NVec2::new(-100.0, 100.0),
            policy: SeedPolicy::SharedComponent,
            mode: 0,
        }
    }
}

/// Dynamics matrix together with its eigenstructure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModalAnalysis {
    pub matrix: Matrix2<f64>,
    pub eigen: EigenDecomposition,
}

impl ModalAnalysis {
    pub fn analyze(p: &SystemParameters) -> Result<Self, SimError> {
        let matrix = dynamics_matrix(p)?;
        let eigen = EigenDecomposition::of(&matrix);
        eigen.check_finite()?;

        let analysis = Self { matrix, eigen };
        if !analysis.is_stable() {
            warn!(
                "dynamics matrix has non-real or non-positive eigenvalues {:?}; \
                 system is unstable or mis-parameterized",
                analysis.eigen.values.as_slice()
            );
        }
        Ok(analysis)
    }

    /// Both eigenvalues real and strictly positive
    pub fn is_stable(&self) -> bool {
        self.eigen
            .values
            .iter()
            .all(|l| l.im.abs() <= IMAG_TOL * l.re.abs().max(1.0) && l.re > 0.0)
    }

    /// Natural angular frequencies `sqrt(lambda)` of both modes, when stable
    pub fn natural_frequencies(&self) -> Option<NVec2> {
        if !self.is_stable() {
            return None;
        }
        let [lo, hi] = [self.eigen.values[0].re, self.eigen.values[1].re];
        Some(NVec2::new(lo.sqrt(), hi.sqrt()))
    }

    /// Initial displacements `(x1, x2)` for the given seeding options
    pub fn seeds(&self, seeding: &Seeding) -> Result<(f64, f64), SimError> {
        if seeding.mode > 1 {
            return Err(SimError::Domain {
                field: "mode",
                value: seeding.mode as f64,
                reason: "a two-mass system has modes 0 and 1 only",
            });
        }

        let amplitude = [
            ("amplitude[0]", seeding.amplitude.x),
            ("amplitude[1]", seeding.amplitude.y),
        ];
        for (field, value) in amplitude {
            if !value.is_finite() {
                return Err(SimError::Domain {
                    field,
                    value,
                    reason: "seed amplitude must be finite",
                });
            }
        }

        let v = self.eigen.mode_shape(seeding.mode);
        let (c1, c2) = match seeding.policy {
            SeedPolicy::SharedComponent => (v[0].re, v[0].re),
            SeedPolicy::PairedComponents => (v[0].re, v[1].re),
        };

        // |c| <= 1 for a unit mode shape, so finite amplitudes give finite seeds
        Ok((c1 * seeding.amplitude.x, c2 * seeding.amplitude.y))
    }
}

/// Seeds for the default seeding options
pub fn compute_initial_positions(p: &SystemParameters) -> Result<(f64, f64), SimError> {
    compute_initial_positions_with(p, &Seeding::default())
}

pub fn compute_initial_positions_with(
    p: &SystemParameters,
    seeding: &Seeding,
) -> Result<(f64, f64), SimError> {
    let analysis = ModalAnalysis::analyze(p)?;
    let seeds = analysis.seeds(seeding)?;
    debug!(
        "modal seeds: mode {} ({:?}) -> x1 = {:.6}, x2 = {:.6}",
        seeding.mode, seeding.policy, seeds.0, seeds.1
    );
    Ok(seeds)
}
