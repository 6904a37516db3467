use super::atom::Atom;
use super::topology::{Bond, BondOrder};
use crate::core::utils::geometry::{self, rotation_from_axis_angle};
use nalgebra::Point3;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Atom index {index} is out of range for a molecule with {atom_count} atoms")]
    InvalidAtomIndex { index: usize, atom_count: usize },
    #[error("Geometry is degenerate for atoms {atoms:?} (coincident or collinear)")]
    Degenerate { atoms: Vec<usize> },
    #[error("Atoms {0} and {1} are not bonded")]
    NotBonded(usize, usize),
    #[error("Bond {0}-{1} is part of a ring; the dihedral cannot be set rigidly")]
    BondInRing(usize, usize),
    #[error("Expected {expected} positions, got {actual}")]
    PositionCountMismatch { expected: usize, actual: usize },
}

/// A molecule: atoms with 3D coordinates plus their fixed bonded topology.
///
/// Atoms are addressed by their 0-based insertion index. Bonds never change once
/// added; positions may be read and written freely.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    /// Free-form name carried through to reports.
    name: String,
    /// Atoms in index order.
    atoms: Vec<Atom>,
    /// List of all bonds in the molecule.
    bonds: Vec<Bond>,
    /// Cached adjacency list for bond connectivity, indexed by atom index.
    bond_adjacency: Vec<Vec<usize>>,
}

impl Molecule {
    /// Creates a new, empty molecule.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends an atom and returns its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.bond_adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Adds a bond between two existing atoms.
    ///
    /// Adding a bond that already exists is a no-op.
    ///
    /// # Arguments
    ///
    /// * `atom1` - Index of the first atom.
    /// * `atom2` - Index of the second atom.
    /// * `order` - The bond order.
    ///
    /// # Return
    ///
    /// Returns `None` if either index is out of range or both indices are equal,
    /// otherwise `Some(())`.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: BondOrder) -> Option<()> {
        if atom1 == atom2 || atom1 >= self.atoms.len() || atom2 >= self.atoms.len() {
            return None;
        }
        if self.bond_between(atom1, atom2).is_some() {
            return Some(());
        }
        self.bonds.push(Bond::new(atom1, atom2, order));
        self.bond_adjacency[atom1].push(atom2);
        self.bond_adjacency[atom2].push(atom1);
        Some(())
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Retrieves the atoms bonded to the given atom.
    ///
    /// # Return
    ///
    /// Returns `Some(&[usize])` with the neighbor indices in bond insertion order,
    /// or `None` if the index is out of range.
    pub fn bonded_neighbors(&self, index: usize) -> Option<&[usize]> {
        self.bond_adjacency.get(index).map(|v| v.as_slice())
    }

    pub fn bond_between(&self, atom1: usize, atom2: usize) -> Option<&Bond> {
        self.bonds
            .iter()
            .find(|b| b.contains(atom1) && b.other(atom1) == Some(atom2))
    }

    pub fn position(&self, index: usize) -> Result<Point3<f64>, GeometryError> {
        self.check_index(index)?;
        Ok(self.atoms[index].position)
    }

    pub fn set_position(&mut self, index: usize, position: Point3<f64>) -> Result<(), GeometryError> {
        self.check_index(index)?;
        self.atoms[index].position = position;
        Ok(())
    }

    /// Snapshot of all atom positions in index order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Overwrites every atom position at once.
    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), GeometryError> {
        if positions.len() != self.atoms.len() {
            return Err(GeometryError::PositionCountMismatch {
                expected: self.atoms.len(),
                actual: positions.len(),
            });
        }
        for (atom, position) in self.atoms.iter_mut().zip(positions) {
            atom.position = *position;
        }
        Ok(())
    }

    pub fn distance(&self, i: usize, j: usize) -> Result<f64, GeometryError> {
        Ok(geometry::distance(&self.position(i)?, &self.position(j)?))
    }

    /// Angle `i`–`j`–`k` at atom `j`, in degrees.
    pub fn angle(&self, i: usize, j: usize, k: usize) -> Result<f64, GeometryError> {
        geometry::angle_degrees(&self.position(i)?, &self.position(j)?, &self.position(k)?)
            .ok_or(GeometryError::Degenerate {
                atoms: vec![i, j, k],
            })
    }

    /// Dihedral `i`–`j`–`k`–`l` about the `j`–`k` bond, in degrees within (-180, 180].
    pub fn dihedral(&self, i: usize, j: usize, k: usize, l: usize) -> Result<f64, GeometryError> {
        geometry::dihedral_degrees(
            &self.position(i)?,
            &self.position(j)?,
            &self.position(k)?,
            &self.position(l)?,
        )
        .ok_or(GeometryError::Degenerate {
            atoms: vec![i, j, k, l],
        })
    }

    /// Sets the dihedral `i`–`j`–`k`–`l` to `degrees` by rigidly rotating every atom
    /// on the `k` side of the `j`–`k` bond about the bond axis.
    ///
    /// Atoms on the `j` side (including `i` and `j`) keep their positions.
    ///
    /// # Errors
    ///
    /// * [`GeometryError::NotBonded`] if `j` and `k` are not bonded.
    /// * [`GeometryError::BondInRing`] if `j`–`k` belongs to a ring.
    /// * [`GeometryError::Degenerate`] if the current dihedral is undefined.
    pub fn set_dihedral(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        l: usize,
        degrees: f64,
    ) -> Result<(), GeometryError> {
        let current = self.dihedral(i, j, k, l)?;
        if self.bond_between(j, k).is_none() {
            return Err(GeometryError::NotBonded(j, k));
        }
        let fragment = self.fragment_beyond(j, k)?;

        let pivot = self.atoms[k].position;
        let axis = pivot - self.atoms[j].position;
        let rotation = rotation_from_axis_angle(&axis, degrees - current);
        for index in fragment {
            let atom = &mut self.atoms[index];
            atom.position = pivot + rotation * (atom.position - pivot);
        }
        Ok(())
    }

    /// Atoms reachable from `k` without crossing the `j`–`k` bond.
    fn fragment_beyond(&self, j: usize, k: usize) -> Result<Vec<usize>, GeometryError> {
        let mut visited = HashSet::from([k]);
        let mut queue = VecDeque::from([k]);
        let mut fragment = Vec::new();

        while let Some(current) = queue.pop_front() {
            fragment.push(current);
            for &next in &self.bond_adjacency[current] {
                if current == k && next == j {
                    continue;
                }
                if next == j {
                    return Err(GeometryError::BondInRing(j, k));
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        Ok(fragment)
    }

    fn check_index(&self, index: usize) -> Result<(), GeometryError> {
        if index < self.atoms.len() {
            Ok(())
        } else {
            Err(GeometryError::InvalidAtomIndex {
                index,
                atom_count: self.atoms.len(),
            })
        }
    }
}
