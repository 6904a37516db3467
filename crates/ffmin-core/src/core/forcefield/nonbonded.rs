use super::potentials;
use super::term::scatter;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VdwForm {
    /// `D·(ρ¹² − 2ρ⁶)` with `ρ = r_min / r` (UFF).
    LennardJones { r_min: f64, well_depth: f64 },
    /// Halgren buffered 14-7 (MMFF94).
    Buffered14_7 { r_star: f64, well_depth: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VanDerWaals {
    pub atoms: [usize; 2],
    pub form: VdwForm,
}

impl VanDerWaals {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j] = self.atoms;
        let (r, dr) = geometry::distance_with_gradient(&positions[i], &positions[j]);
        let (energy, de) = match self.form {
            VdwForm::LennardJones { r_min, well_depth } => (
                potentials::lennard_jones_12_6(r, r_min, well_depth),
                potentials::lennard_jones_12_6_derivative(r, r_min, well_depth),
            ),
            VdwForm::Buffered14_7 { r_star, well_depth } => {
                potentials::buffered_14_7(r, r_star, well_depth)
            }
        };
        scatter(gradient, &self.atoms, de, &dr);
        energy
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElectrostaticForm {
    /// Plain Coulomb with a constant dielectric (UFF).
    Coulomb { q1: f64, q2: f64, dielectric: f64 },
    /// MMFF buffered Coulomb; `charge_product` already carries any 1-4 scaling.
    MmffBuffered {
        charge_product: f64,
        dielectric: f64,
        distance_dependent: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Electrostatic {
    pub atoms: [usize; 2],
    pub form: ElectrostaticForm,
}

impl Electrostatic {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j] = self.atoms;
        let (r, dr) = geometry::distance_with_gradient(&positions[i], &positions[j]);
        let (energy, de) = match self.form {
            ElectrostaticForm::Coulomb { q1, q2, dielectric } => (
                potentials::coulomb(r, q1, q2, dielectric),
                potentials::coulomb_derivative(r, q1, q2, dielectric),
            ),
            ElectrostaticForm::MmffBuffered {
                charge_product,
                dielectric,
                distance_dependent,
            } => potentials::mmff_buffered_coulomb(r, charge_product, dielectric, distance_dependent),
        };
        scatter(gradient, &self.atoms, de, &dr);
        energy
    }
}
