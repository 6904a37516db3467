use super::bonded::{AngleBend, BondStretch, Torsion};
use super::constraints::{
    AngleConstraint, DistanceConstraint, PositionConstraint, TorsionConstraint,
};
use super::nonbonded::{Electrostatic, VanDerWaals};
use nalgebra::{Point3, Vector3};
use std::ops::{Add, AddAssign};

/// Energy split by interaction category, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyBreakdown {
    pub bond_stretch: f64,
    pub angle_bend: f64,
    pub torsion: f64,
    pub van_der_waals: f64,
    pub electrostatic: f64,
    pub constraint: f64,
}

impl EnergyBreakdown {
    pub fn new(
        bond_stretch: f64,
        angle_bend: f64,
        torsion: f64,
        van_der_waals: f64,
        electrostatic: f64,
        constraint: f64,
    ) -> Self {
        Self {
            bond_stretch,
            angle_bend,
            torsion,
            van_der_waals,
            electrostatic,
            constraint,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.bond_stretch
            + self.angle_bend
            + self.torsion
            + self.van_der_waals
            + self.electrostatic
            + self.constraint
    }
}

impl Add for EnergyBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            bond_stretch: self.bond_stretch + rhs.bond_stretch,
            angle_bend: self.angle_bend + rhs.angle_bend,
            torsion: self.torsion + rhs.torsion,
            van_der_waals: self.van_der_waals + rhs.van_der_waals,
            electrostatic: self.electrostatic + rhs.electrostatic,
            constraint: self.constraint + rhs.constraint,
        }
    }
}

impl AddAssign for EnergyBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.bond_stretch += rhs.bond_stretch;
        self.angle_bend += rhs.angle_bend;
        self.torsion += rhs.torsion;
        self.van_der_waals += rhs.van_der_waals;
        self.electrostatic += rhs.electrostatic;
        self.constraint += rhs.constraint;
    }
}

/// One contribution to the total energy of a force field.
///
/// Base terms come from parameterization and never change; constraint variants
/// are appended by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyContrib {
    BondStretch(BondStretch),
    AngleBend(AngleBend),
    Torsion(Torsion),
    VanDerWaals(VanDerWaals),
    Electrostatic(Electrostatic),
    DistanceConstraint(DistanceConstraint),
    AngleConstraint(AngleConstraint),
    TorsionConstraint(TorsionConstraint),
    PositionConstraint(PositionConstraint),
}

impl EnergyContrib {
    /// Energy of this term at `positions`.
    ///
    /// When `gradient` is given, `dE/dx` of every involved atom is added to it
    /// (never overwritten).
    #[inline]
    pub fn evaluate(
        &self,
        positions: &[Point3<f64>],
        gradient: Option<&mut [Vector3<f64>]>,
    ) -> f64 {
        match self {
            Self::BondStretch(t) => t.evaluate(positions, gradient),
            Self::AngleBend(t) => t.evaluate(positions, gradient),
            Self::Torsion(t) => t.evaluate(positions, gradient),
            Self::VanDerWaals(t) => t.evaluate(positions, gradient),
            Self::Electrostatic(t) => t.evaluate(positions, gradient),
            Self::DistanceConstraint(t) => t.evaluate(positions, gradient),
            Self::AngleConstraint(t) => t.evaluate(positions, gradient),
            Self::TorsionConstraint(t) => t.evaluate(positions, gradient),
            Self::PositionConstraint(t) => t.evaluate(positions, gradient),
        }
    }

    /// Atom indices the term depends on.
    pub fn atoms(&self) -> &[usize] {
        match self {
            Self::BondStretch(t) => &t.atoms,
            Self::AngleBend(t) => &t.atoms,
            Self::Torsion(t) => &t.atoms,
            Self::VanDerWaals(t) => &t.atoms,
            Self::Electrostatic(t) => &t.atoms,
            Self::DistanceConstraint(t) => &t.atoms,
            Self::AngleConstraint(t) => &t.atoms,
            Self::TorsionConstraint(t) => &t.atoms,
            Self::PositionConstraint(t) => std::slice::from_ref(&t.atom),
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            Self::DistanceConstraint(_)
                | Self::AngleConstraint(_)
                | Self::TorsionConstraint(_)
                | Self::PositionConstraint(_)
        )
    }

    /// Breakdown holding `energy` in the category this term belongs to.
    pub fn categorize(&self, energy: f64) -> EnergyBreakdown {
        let mut breakdown = EnergyBreakdown::default();
        let slot = match self {
            Self::BondStretch(_) => &mut breakdown.bond_stretch,
            Self::AngleBend(_) => &mut breakdown.angle_bend,
            Self::Torsion(_) => &mut breakdown.torsion,
            Self::VanDerWaals(_) => &mut breakdown.van_der_waals,
            Self::Electrostatic(_) => &mut breakdown.electrostatic,
            _ => &mut breakdown.constraint,
        };
        *slot = energy;
        breakdown
    }
}

/// Adds `dE/dq · dq/dx` to the gradient entries of `atoms`.
#[inline]
pub(crate) fn scatter<const N: usize>(
    gradient: Option<&mut [Vector3<f64>]>,
    atoms: &[usize; N],
    de_dq: f64,
    dq_dx: &[Vector3<f64>; N],
) {
    if let Some(gradient) = gradient {
        for (&atom, d) in atoms.iter().zip(dq_dx) {
            gradient[atom] += d * de_dq;
        }
    }
}
