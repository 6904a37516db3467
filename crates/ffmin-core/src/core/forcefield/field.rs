use super::constraints::{
    AngleConstraint, DistanceConstraint, PositionConstraint, TorsionConstraint,
};
use super::mmff::{self, MmffProperties};
use super::parameterization::ParameterizationError;
use super::params::UffParameterTable;
use super::term::{EnergyBreakdown, EnergyContrib};
use super::uff;
use crate::core::models::molecule::{GeometryError, Molecule};
use crate::core::utils::geometry::{self, DEGENERACY_EPSILON};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceFieldError {
    #[error("Atom index {index} is out of range for a force field with {atom_count} atoms")]
    InvalidAtomIndex { index: usize, atom_count: usize },
    #[error("Lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds { lower: f64, upper: f64 },
    #[error("Invalid value for '{name}': {value} (must be finite and non-negative)")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("Atom {0} appears more than once in a constraint")]
    DuplicateAtom(usize),
    #[error("Geometry is degenerate for atoms {atoms:?} (coincident or collinear)")]
    DegenerateGeometry { atoms: Vec<usize> },
    #[error("Expected {expected} positions, got {actual}")]
    PositionCountMismatch { expected: usize, actual: usize },
}

/// A parameterized force field bound to one molecule's coordinates.
///
/// Holds the immutable base terms produced by parameterization, the user's
/// constraint terms (append-only), and the set of fixed atoms. Energies are in
/// kcal/mol and gradients in kcal/(mol·Å).
#[derive(Debug, Clone)]
pub struct ForceField {
    positions: Vec<Point3<f64>>,
    terms: Vec<EnergyContrib>,
    constraints: Vec<EnergyContrib>,
    fixed_atoms: BTreeSet<usize>,
}

impl ForceField {
    /// Force field over explicit terms, starting from `positions`.
    ///
    /// Every atom a term refers to must exist in `positions`.
    pub fn new(
        positions: Vec<Point3<f64>>,
        terms: Vec<EnergyContrib>,
    ) -> Result<Self, ForceFieldError> {
        let atom_count = positions.len();
        if let Some(&index) = terms
            .iter()
            .flat_map(|term| term.atoms())
            .find(|&&atom| atom >= atom_count)
        {
            return Err(ForceFieldError::InvalidAtomIndex { index, atom_count });
        }
        Ok(Self::from_parts(positions, terms))
    }

    fn from_parts(positions: Vec<Point3<f64>>, terms: Vec<EnergyContrib>) -> Self {
        Self {
            positions,
            terms,
            constraints: Vec::new(),
            fixed_atoms: BTreeSet::new(),
        }
    }

    /// UFF force field with the built-in parameter table.
    pub fn uff(molecule: &Molecule) -> Result<Self, ParameterizationError> {
        Self::uff_with_parameters(molecule, &UffParameterTable::builtin())
    }

    pub fn uff_with_parameters(
        molecule: &Molecule,
        table: &UffParameterTable,
    ) -> Result<Self, ParameterizationError> {
        let terms = uff::build_terms(molecule, table)?;
        info!(
            molecule = molecule.name(),
            atoms = molecule.atom_count(),
            terms = terms.len(),
            "Built UFF force field"
        );
        Ok(Self::from_parts(molecule.positions(), terms))
    }

    /// MMFF94 force field using previously computed [`MmffProperties`].
    pub fn mmff(
        molecule: &Molecule,
        properties: &MmffProperties,
    ) -> Result<Self, ParameterizationError> {
        let terms = mmff::build_terms(molecule, properties)?;
        info!(
            molecule = molecule.name(),
            atoms = molecule.atom_count(),
            terms = terms.len(),
            "Built MMFF94 force field"
        );
        Ok(Self::from_parts(molecule.positions(), terms))
    }

    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), ForceFieldError> {
        self.check_positions(positions)?;
        self.positions.copy_from_slice(positions);
        Ok(())
    }

    /// Copies the current coordinates back into `molecule`.
    pub fn write_positions(&self, molecule: &mut Molecule) -> Result<(), GeometryError> {
        molecule.set_positions(&self.positions)
    }

    pub fn terms(&self) -> &[EnergyContrib] {
        &self.terms
    }

    pub fn constraints(&self) -> &[EnergyContrib] {
        &self.constraints
    }

    pub fn fixed_atoms(&self) -> &BTreeSet<usize> {
        &self.fixed_atoms
    }

    pub fn is_fixed(&self, atom: usize) -> bool {
        self.fixed_atoms.contains(&atom)
    }

    /// Restrains the distance `i`–`j` to `[lower, upper]` Å.
    ///
    /// With `relative`, the bounds are offsets from the current distance.
    pub fn add_distance_constraint(
        &mut self,
        i: usize,
        j: usize,
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    ) -> Result<(), ForceFieldError> {
        self.validate_atoms(&[i, j])?;
        validate_bounds(lower, upper, force_constant)?;
        let (lower, upper) = if relative {
            let current = geometry::distance(&self.positions[i], &self.positions[j]);
            if current < DEGENERACY_EPSILON {
                return Err(ForceFieldError::DegenerateGeometry { atoms: vec![i, j] });
            }
            (current + lower, current + upper)
        } else {
            (lower, upper)
        };
        debug!(i, j, lower, upper, force_constant, "Adding distance constraint");
        self.constraints
            .push(EnergyContrib::DistanceConstraint(DistanceConstraint {
                atoms: [i, j],
                lower,
                upper,
                force_constant,
            }));
        Ok(())
    }

    /// Restrains the angle `i`–`j`–`k` to `[lower, upper]` degrees.
    #[allow(clippy::too_many_arguments)]
    pub fn add_angle_constraint(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    ) -> Result<(), ForceFieldError> {
        self.validate_atoms(&[i, j, k])?;
        validate_bounds(lower, upper, force_constant)?;
        let (lower, upper) = if relative {
            let current =
                geometry::angle_degrees(&self.positions[i], &self.positions[j], &self.positions[k])
                    .ok_or(ForceFieldError::DegenerateGeometry {
                        atoms: vec![i, j, k],
                    })?;
            (current + lower, current + upper)
        } else {
            (lower, upper)
        };
        debug!(i, j, k, lower, upper, force_constant, "Adding angle constraint");
        self.constraints
            .push(EnergyContrib::AngleConstraint(AngleConstraint {
                atoms: [i, j, k],
                lower,
                upper,
                force_constant,
            }));
        Ok(())
    }

    /// Restrains the dihedral `i`–`j`–`k`–`l` to `[lower, upper]` degrees.
    ///
    /// Bounds are interpreted on the circle, so an interval may cross ±180°.
    #[allow(clippy::too_many_arguments)]
    pub fn add_torsion_constraint(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        l: usize,
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    ) -> Result<(), ForceFieldError> {
        self.validate_atoms(&[i, j, k, l])?;
        validate_bounds(lower, upper, force_constant)?;
        let (lower, upper) = if relative {
            let current = geometry::dihedral_degrees(
                &self.positions[i],
                &self.positions[j],
                &self.positions[k],
                &self.positions[l],
            )
            .ok_or(ForceFieldError::DegenerateGeometry {
                atoms: vec![i, j, k, l],
            })?;
            (current + lower, current + upper)
        } else {
            (lower, upper)
        };
        debug!(i, j, k, l, lower, upper, force_constant, "Adding torsion constraint");
        self.constraints
            .push(EnergyContrib::TorsionConstraint(TorsionConstraint {
                atoms: [i, j, k, l],
                lower,
                upper,
                force_constant,
            }));
        Ok(())
    }

    /// Keeps `atom` within `max_displacement` Å of its current position.
    pub fn add_position_constraint(
        &mut self,
        atom: usize,
        max_displacement: f64,
        force_constant: f64,
    ) -> Result<(), ForceFieldError> {
        self.validate_atoms(&[atom])?;
        validate_non_negative("max_displacement", max_displacement)?;
        validate_non_negative("force_constant", force_constant)?;
        debug!(atom, max_displacement, force_constant, "Adding position constraint");
        self.constraints
            .push(EnergyContrib::PositionConstraint(PositionConstraint {
                atom,
                reference: self.positions[atom],
                max_displacement,
                force_constant,
            }));
        Ok(())
    }

    /// Freezes `atom` at its current position during minimization.
    pub fn add_fixed_point(&mut self, atom: usize) -> Result<(), ForceFieldError> {
        self.validate_atoms(&[atom])?;
        if self.fixed_atoms.insert(atom) {
            debug!(atom, "Fixed atom");
        }
        Ok(())
    }

    /// Total energy at `positions`.
    pub fn energy(&self, positions: &[Point3<f64>]) -> Result<f64, ForceFieldError> {
        self.check_positions(positions)?;
        Ok(self.energy_unchecked(positions))
    }

    /// Cartesian gradient at `positions`, zero for fixed atoms.
    pub fn gradient(&self, positions: &[Point3<f64>]) -> Result<Vec<Vector3<f64>>, ForceFieldError> {
        self.check_positions(positions)?;
        let mut gradient = vec![Vector3::zeros(); positions.len()];
        self.energy_and_gradient_unchecked(positions, &mut gradient);
        Ok(gradient)
    }

    pub fn energy_breakdown(
        &self,
        positions: &[Point3<f64>],
    ) -> Result<EnergyBreakdown, ForceFieldError> {
        self.check_positions(positions)?;
        Ok(self
            .all_terms()
            .fold(EnergyBreakdown::default(), |acc, term| {
                acc + term.categorize(term.evaluate(positions, None))
            }))
    }

    /// Rejects starting geometries on which an angle or torsion is undefined.
    pub fn check_geometry(&self) -> Result<(), ForceFieldError> {
        for term in self.all_terms() {
            let degenerate = match *term.atoms() {
                [i, j] => {
                    matches!(
                        term,
                        EnergyContrib::BondStretch(_) | EnergyContrib::DistanceConstraint(_)
                    ) && geometry::distance(&self.positions[i], &self.positions[j])
                        < DEGENERACY_EPSILON
                }
                [i, j, k] => geometry::angle_degrees(
                    &self.positions[i],
                    &self.positions[j],
                    &self.positions[k],
                )
                .is_none(),
                [i, j, k, l] => geometry::dihedral_degrees(
                    &self.positions[i],
                    &self.positions[j],
                    &self.positions[k],
                    &self.positions[l],
                )
                .is_none(),
                _ => false,
            };
            if degenerate {
                return Err(ForceFieldError::DegenerateGeometry {
                    atoms: term.atoms().to_vec(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn all_terms(&self) -> impl Iterator<Item = &EnergyContrib> {
        self.terms.iter().chain(self.constraints.iter())
    }

    #[cfg(not(feature = "parallel"))]
    pub(crate) fn energy_unchecked(&self, positions: &[Point3<f64>]) -> f64 {
        self.all_terms()
            .map(|term| term.evaluate(positions, None))
            .sum()
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn energy_unchecked(&self, positions: &[Point3<f64>]) -> f64 {
        use rayon::prelude::*;
        // Collected in term order so the summation is identical to the serial path.
        let energies: Vec<f64> = self
            .terms
            .par_iter()
            .chain(self.constraints.par_iter())
            .map(|term| term.evaluate(positions, None))
            .collect();
        energies.iter().sum()
    }

    /// Energy and gradient in one pass. `gradient` is overwritten; fixed atoms
    /// end up with a zero gradient.
    pub(crate) fn energy_and_gradient_unchecked(
        &self,
        positions: &[Point3<f64>],
        gradient: &mut [Vector3<f64>],
    ) -> f64 {
        gradient.iter_mut().for_each(|g| *g = Vector3::zeros());
        let mut energy = 0.0;
        for term in self.all_terms() {
            energy += term.evaluate(positions, Some(&mut *gradient));
        }
        for &atom in &self.fixed_atoms {
            gradient[atom] = Vector3::zeros();
        }
        energy
    }

    pub(crate) fn set_positions_unchecked(&mut self, positions: Vec<Point3<f64>>) {
        self.positions = positions;
    }

    fn check_positions(&self, positions: &[Point3<f64>]) -> Result<(), ForceFieldError> {
        if positions.len() != self.positions.len() {
            return Err(ForceFieldError::PositionCountMismatch {
                expected: self.positions.len(),
                actual: positions.len(),
            });
        }
        Ok(())
    }

    fn validate_atoms(&self, atoms: &[usize]) -> Result<(), ForceFieldError> {
        for (n, &atom) in atoms.iter().enumerate() {
            if atom >= self.positions.len() {
                return Err(ForceFieldError::InvalidAtomIndex {
                    index: atom,
                    atom_count: self.positions.len(),
                });
            }
            if atoms[..n].contains(&atom) {
                return Err(ForceFieldError::DuplicateAtom(atom));
            }
        }
        Ok(())
    }
}

fn validate_non_negative(name: &'static str, value: f64) -> Result<(), ForceFieldError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ForceFieldError::InvalidParameter { name, value })
    }
}

fn validate_bounds(lower: f64, upper: f64, force_constant: f64) -> Result<(), ForceFieldError> {
    if !lower.is_finite() || !upper.is_finite() || lower > upper {
        return Err(ForceFieldError::InvalidBounds { lower, upper });
    }
    validate_non_negative("force_constant", force_constant)
}
