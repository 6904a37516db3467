use super::potentials::flat_bottom;
use super::term::scatter;
use crate::core::utils::geometry::{self, wrap_degrees};
use nalgebra::{Point3, Vector3};

/// Flat-bottom restraint on an interatomic distance, bounds in Å.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraint {
    pub atoms: [usize; 2],
    pub lower: f64,
    pub upper: f64,
    /// kcal/(mol·Å²).
    pub force_constant: f64,
}

impl DistanceConstraint {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j] = self.atoms;
        let (r, dr) = geometry::distance_with_gradient(&positions[i], &positions[j]);
        let (energy, de) = flat_bottom(r, self.lower, self.upper, self.force_constant);
        if de != 0.0 {
            scatter(gradient, &self.atoms, de, &dr);
        }
        energy
    }
}

/// Flat-bottom restraint on a bond angle, bounds in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleConstraint {
    pub atoms: [usize; 3],
    pub lower: f64,
    pub upper: f64,
    /// kcal/(mol·deg²).
    pub force_constant: f64,
}

impl AngleConstraint {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j, k] = self.atoms;
        let (theta, dtheta) =
            geometry::angle_with_gradient(&positions[i], &positions[j], &positions[k]);
        let (energy, de_ddeg) = flat_bottom(
            theta.to_degrees(),
            self.lower,
            self.upper,
            self.force_constant,
        );
        if de_ddeg != 0.0 {
            scatter(gradient, &self.atoms, de_ddeg.to_degrees(), &dtheta);
        }
        energy
    }
}

/// Flat-bottom restraint on a dihedral angle, bounds in degrees.
///
/// The bounds may extend past ±180°; the interval is interpreted on the circle
/// starting at `lower` and spanning `upper − lower` degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionConstraint {
    pub atoms: [usize; 4],
    pub lower: f64,
    pub upper: f64,
    /// kcal/(mol·deg²).
    pub force_constant: f64,
}

impl TorsionConstraint {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let [i, j, k, l] = self.atoms;
        let (phi, dphi) = geometry::dihedral_with_gradient(
            &positions[i],
            &positions[j],
            &positions[k],
            &positions[l],
        );
        let deviation = torsion_deviation(phi.to_degrees(), self.lower, self.upper);
        if deviation == 0.0 {
            return 0.0;
        }
        let de_ddeg = 2.0 * self.force_constant * deviation;
        scatter(gradient, &self.atoms, de_ddeg.to_degrees(), &dphi);
        self.force_constant * deviation * deviation
    }
}

/// Signed distance in degrees from `phi` to the interval `[lower, upper]` on the
/// circle. Positive above the interval, negative below, zero inside.
pub fn torsion_deviation(phi: f64, lower: f64, upper: f64) -> f64 {
    let width = upper - lower;
    if width >= 360.0 {
        return 0.0;
    }
    let offset = (phi - wrap_degrees(lower)).rem_euclid(360.0);
    if offset <= width {
        return 0.0;
    }
    let above = offset - width;
    let below = 360.0 - offset;
    if above <= below { above } else { -below }
}

/// Keeps one atom within `max_displacement` Å of where it was when the
/// restraint was created.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionConstraint {
    pub atom: usize,
    pub reference: Point3<f64>,
    pub max_displacement: f64,
    /// kcal/(mol·Å²).
    pub force_constant: f64,
}

impl PositionConstraint {
    pub fn evaluate(&self, positions: &[Point3<f64>], gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        let offset = positions[self.atom] - self.reference;
        let d = offset.norm();
        let excess = d - self.max_displacement;
        if excess <= 0.0 {
            return 0.0;
        }
        if let Some(gradient) = gradient {
            gradient[self.atom] += offset * (2.0 * self.force_constant * excess / d);
        }
        self.force_constant * excess * excess
    }
}
