use nalgebra::Point3;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical elements understood by the force-field parameterizers.
///
/// Only elements that at least one of the built-in parameter sets can type are
/// listed; anything else is rejected when a molecule is parsed or built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Hydrogen,
    Boron,
    Carbon,
    Nitrogen,
    Oxygen,
    Fluorine,
    Silicon,
    Phosphorus,
    Sulfur,
    Chlorine,
    Bromine,
    Iodine,
}

static ELEMENT_SYMBOLS: Map<&'static str, Element> = phf_map! {
    "h" => Element::Hydrogen,
    "b" => Element::Boron,
    "c" => Element::Carbon,
    "n" => Element::Nitrogen,
    "o" => Element::Oxygen,
    "f" => Element::Fluorine,
    "si" => Element::Silicon,
    "p" => Element::Phosphorus,
    "s" => Element::Sulfur,
    "cl" => Element::Chlorine,
    "br" => Element::Bromine,
    "i" => Element::Iodine,
};

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Hydrogen => "H",
            Self::Boron => "B",
            Self::Carbon => "C",
            Self::Nitrogen => "N",
            Self::Oxygen => "O",
            Self::Fluorine => "F",
            Self::Silicon => "Si",
            Self::Phosphorus => "P",
            Self::Sulfur => "S",
            Self::Chlorine => "Cl",
            Self::Bromine => "Br",
            Self::Iodine => "I",
        }
    }

    pub fn atomic_number(&self) -> u8 {
        match self {
            Self::Hydrogen => 1,
            Self::Boron => 5,
            Self::Carbon => 6,
            Self::Nitrogen => 7,
            Self::Oxygen => 8,
            Self::Fluorine => 9,
            Self::Silicon => 14,
            Self::Phosphorus => 15,
            Self::Sulfur => 16,
            Self::Chlorine => 17,
            Self::Bromine => 35,
            Self::Iodine => 53,
        }
    }

    /// Whether the element belongs to group 16 (chalcogens handled by the UFF torsion rules).
    pub fn is_chalcogen(&self) -> bool {
        matches!(self, Self::Oxygen | Self::Sulfur)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ELEMENT_SYMBOLS
            .get(s.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single atom of a molecule.
///
/// The atom's index is its position in the owning [`Molecule`](super::molecule::Molecule)
/// and is not stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Display name (e.g., "C1", "H12").
    pub name: String,
    /// The chemical element.
    pub element: Element,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
}

impl Atom {
    /// Creates a new uncharged `Atom`.
    ///
    /// # Arguments
    ///
    /// * `name` - The display name of the atom.
    /// * `element` - The chemical element.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element,
            position,
            partial_charge: 0.0,
        }
    }

    pub fn with_charge(mut self, partial_charge: f64) -> Self {
        self.partial_charge = partial_charge;
        self
    }
}
