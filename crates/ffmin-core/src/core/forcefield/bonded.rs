use super::potentials;
use super::term::scatter;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BondStretchForm {
    /// `½·k·(r − r0)²` (UFF).
    Harmonic { force_constant: f64, rest_length: f64 },
    /// MMFF94 quartic stretch with `kb` in md/Å.
    MmffQuartic { kb: f64, rest_length: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondStretch {
    pub atoms: [usize; 2],
    pub form: BondStretchForm,
}

impl BondStretch {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j] = self.atoms;
        let (r, dr) = geometry::distance_with_gradient(&positions[i], &positions[j]);
        let (energy, de) = match self.form {
            BondStretchForm::Harmonic {
                force_constant,
                rest_length,
            } => potentials::harmonic(r, rest_length, force_constant),
            BondStretchForm::MmffQuartic { kb, rest_length } => {
                potentials::mmff_bond_stretch(r, rest_length, kb)
            }
        };
        scatter(gradient, &self.atoms, de, &dr);
        energy
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleBendForm {
    /// General UFF center: `K·(C0 + C1·cosθ + C2·cos2θ)`.
    UffFourier { k: f64, c0: f64, c1: f64, c2: f64 },
    /// Linear UFF center.
    UffLinear { k: f64 },
    /// Trigonal (`n = 3`) or square-planar (`n = 4`) UFF center.
    UffPeriodic { k: f64, n: u8 },
    /// MMFF94 cubic bend, `theta0` in degrees.
    Mmff { ka: f64, theta0: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AngleBend {
    /// Outer, center, outer.
    pub atoms: [usize; 3],
    pub form: AngleBendForm,
}

impl AngleBend {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j, k] = self.atoms;
        let (theta, dtheta) =
            geometry::angle_with_gradient(&positions[i], &positions[j], &positions[k]);
        let (energy, de) = match self.form {
            AngleBendForm::UffFourier { k, c0, c1, c2 } => {
                potentials::uff_angle_fourier(theta, k, c0, c1, c2)
            }
            AngleBendForm::UffLinear { k } => potentials::uff_angle_linear(theta, k),
            AngleBendForm::UffPeriodic { k, n } => potentials::uff_angle_periodic(theta, k, n),
            AngleBendForm::Mmff { ka, theta0 } => potentials::mmff_angle_bend(theta, theta0, ka),
        };
        scatter(gradient, &self.atoms, de, &dtheta);
        energy
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TorsionForm {
    /// `V/2·[1 − cos(nφ0)·cos(nφ)]`.
    Uff { barrier: f64, n: u8, cos_n_phi0: f64 },
    /// MMFF94 three-term Fourier series.
    Mmff { v1: f64, v2: f64, v3: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Torsion {
    pub atoms: [usize; 4],
    pub form: TorsionForm,
}

impl Torsion {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j, k, l] = self.atoms;
        let (phi, dphi) = geometry::dihedral_with_gradient(
            &positions[i],
            &positions[j],
            &positions[k],
            &positions[l],
        );
        let (energy, de) = match self.form {
            TorsionForm::Uff {
                barrier,
                n,
                cos_n_phi0,
            } => potentials::uff_torsion(phi, barrier, n, cos_n_phi0),
            TorsionForm::Mmff { v1, v2, v3 } => potentials::mmff_torsion(phi, v1, v2, v3),
        };
        scatter(gradient, &self.atoms, de, &dphi);
        energy
    }
}
