use super::atom::{Atom, Element};
use super::molecule::Molecule;
use super::topology::BondOrder;
use nalgebra::Point3;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Duplicate atom serial number: {0}")]
    DuplicateSerial(usize),
    #[error("Bond references unknown atom serial {0}")]
    UnknownSerial(usize),
    #[error("Atom serial {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// Incrementally assembles a [`Molecule`] from serial-numbered atoms and bonds.
///
/// Serial numbers are arbitrary caller-side labels (e.g., 1-based numbering from a
/// structure file); atoms receive 0-based indices in insertion order.
pub struct MoleculeBuilder {
    molecule: Molecule,

    // --- Builder-specific state for efficient construction ---
    atom_serial_map: HashMap<usize, usize>,
    pending_bonds: Vec<(usize, usize, BondOrder)>,
    first_error: Option<BuildError>,
}

impl MoleculeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            molecule: Molecule::new(name),
            atom_serial_map: HashMap::new(),
            pending_bonds: Vec::new(),
            first_error: None,
        }
    }

    pub fn add_atom(
        &mut self,
        serial: usize,
        element: Element,
        position: Point3<f64>,
        charge: Option<f64>,
    ) -> &mut Self {
        if self.atom_serial_map.contains_key(&serial) {
            self.record_error(BuildError::DuplicateSerial(serial));
            return self;
        }
        let name = format!("{}{}", element.symbol(), serial);
        let atom = Atom::new(&name, element, position).with_charge(charge.unwrap_or(0.0));
        let index = self.molecule.add_atom(atom);
        self.atom_serial_map.insert(serial, index);
        self
    }

    pub fn add_bond(&mut self, serial1: usize, serial2: usize, order: BondOrder) -> &mut Self {
        self.pending_bonds.push((serial1, serial2, order));
        self
    }

    pub fn build(mut self) -> Result<Molecule, BuildError> {
        if let Some(err) = self.first_error.take() {
            return Err(err);
        }
        for (s1, s2, order) in std::mem::take(&mut self.pending_bonds) {
            if s1 == s2 {
                return Err(BuildError::SelfBond(s1));
            }
            let i = *self
                .atom_serial_map
                .get(&s1)
                .ok_or(BuildError::UnknownSerial(s1))?;
            let j = *self
                .atom_serial_map
                .get(&s2)
                .ok_or(BuildError::UnknownSerial(s2))?;
            self.molecule.add_bond(i, j, order);
        }
        Ok(self.molecule)
    }

    fn record_error(&mut self, err: BuildError) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_maps_serials_to_insertion_indices() {
        let mut builder = MoleculeBuilder::new("water");
        builder
            .add_atom(10, Element::Oxygen, Point3::origin(), Some(-0.8))
            .add_atom(11, Element::Hydrogen, Point3::new(0.96, 0.0, 0.0), Some(0.4))
            .add_atom(12, Element::Hydrogen, Point3::new(-0.24, 0.93, 0.0), Some(0.4))
            .add_bond(10, 11, BondOrder::Single)
            .add_bond(12, 10, BondOrder::Single);
        let mol = builder.build().unwrap();

        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.atom(0).unwrap().name, "O10");
        assert_eq!(mol.atom(0).unwrap().partial_charge, -0.8);
        assert_eq!(mol.bonded_neighbors(0), Some(&[1, 2][..]));
    }

    #[test]
    fn builder_rejects_bond_to_unknown_serial() {
        let mut builder = MoleculeBuilder::new("broken");
        builder
            .add_atom(1, Element::Carbon, Point3::origin(), None)
            .add_bond(1, 2, BondOrder::Single);
        assert_eq!(builder.build().unwrap_err(), BuildError::UnknownSerial(2));
    }

    #[test]
    fn builder_rejects_duplicate_serials() {
        let mut builder = MoleculeBuilder::new("dup");
        builder
            .add_atom(1, Element::Carbon, Point3::origin(), None)
            .add_atom(1, Element::Carbon, Point3::new(1.5, 0.0, 0.0), None);
        assert_eq!(builder.build().unwrap_err(), BuildError::DuplicateSerial(1));
    }

    #[test]
    fn builder_rejects_self_bonds() {
        let mut builder = MoleculeBuilder::new("self");
        builder
            .add_atom(1, Element::Carbon, Point3::origin(), None)
            .add_bond(1, 1, BondOrder::Single);
        assert_eq!(builder.build().unwrap_err(), BuildError::SelfBond(1));
    }
}
