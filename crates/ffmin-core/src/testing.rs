//! Shared fixtures for unit tests.

use crate::core::models::atom::Element;
use crate::core::models::builder::MoleculeBuilder;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;

/// Pentane (C5H12) with explicit hydrogens, 17 atoms, in a near-equilibrium geometry.
///
/// Serials are 1-based; atom indices are 0-based. Heavy atoms sit at indices
/// 0, 1, 3, 6 and 8.
pub fn pentane() -> Molecule {
    const ATOMS: [(Element, [f64; 3]); 17] = [
        (Element::Carbon, [0.0000, 0.0000, 0.0000]),
        (Element::Carbon, [1.4280, 0.0000, 0.0000]),
        (Element::Hydrogen, [1.7913, -0.2660, 0.9927]),
        (Element::Carbon, [1.9040, 1.3004, -0.3485]),
        (Element::Hydrogen, [1.5407, 2.0271, 0.3782]),
        (Element::Hydrogen, [1.5407, 1.5664, -1.3411]),
        (Element::Carbon, [3.3320, 1.3004, -0.3485]),
        (Element::Hydrogen, [3.6953, 1.5162, -1.3532]),
        (Element::Carbon, [3.8080, 0.0192, 0.0649]),
        (Element::Hydrogen, [3.4447, -0.7431, -0.6243]),
        (Element::Hydrogen, [3.4447, -0.1966, 1.0697]),
        (Element::Hydrogen, [4.8980, 0.0192, 0.0649]),
        (Element::Hydrogen, [3.6954, 2.0627, 0.3408]),
        (Element::Hydrogen, [1.7913, -0.7267, -0.7267]),
        (Element::Hydrogen, [-0.3633, 0.7267, 0.7267]),
        (Element::Hydrogen, [-0.3633, -0.9926, 0.2660]),
        (Element::Hydrogen, [-0.3633, 0.2660, -0.9926]),
    ];
    const BONDS: [(usize, usize); 16] = [
        (1, 2),
        (1, 15),
        (1, 16),
        (1, 17),
        (2, 3),
        (2, 4),
        (2, 14),
        (4, 5),
        (4, 6),
        (4, 7),
        (7, 8),
        (7, 9),
        (7, 13),
        (9, 10),
        (9, 11),
        (9, 12),
    ];

    let mut builder = MoleculeBuilder::new("pentane");
    for (n, (element, [x, y, z])) in ATOMS.iter().enumerate() {
        builder.add_atom(n + 1, *element, Point3::new(*x, *y, *z), None);
    }
    for (a, b) in BONDS {
        builder.add_bond(a, b, BondOrder::Single);
    }
    builder.build().expect("pentane fixture is well formed")
}
