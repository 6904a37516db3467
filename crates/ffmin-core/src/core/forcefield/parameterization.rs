use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceFieldKind {
    Uff,
    Mmff,
}

impl fmt::Display for ForceFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uff => write!(f, "UFF"),
            Self::Mmff => write!(f, "MMFF94"),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown force field kind: '{0}' (expected 'uff' or 'mmff')")]
pub struct ParseForceFieldKindError(pub String);

impl FromStr for ForceFieldKind {
    type Err = ParseForceFieldKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uff" => Ok(Self::Uff),
            "mmff" | "mmff94" => Ok(Self::Mmff),
            _ => Err(ParseForceFieldKindError(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterizationError {
    #[error("{force_field} has no atom type for element {element} (atom {atom})")]
    UnsupportedElement {
        force_field: ForceFieldKind,
        atom: usize,
        element: String,
    },
    #[error("{force_field} cannot type atom {atom} ({element}): {reason}")]
    UnsupportedEnvironment {
        force_field: ForceFieldKind,
        atom: usize,
        element: String,
        reason: String,
    },
    #[error("Missing {kind} parameters for '{key}'")]
    MissingParameters { kind: &'static str, key: String },
}

/// Summary of the bonds around one atom, as used by the typing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct BondingEnvironment {
    pub degree: usize,
    pub doubles: usize,
    pub triples: usize,
    pub aromatic: bool,
}

impl BondingEnvironment {
    pub fn of(molecule: &Molecule, atom: usize) -> Self {
        let mut env = Self::default();
        for &other in molecule.bonded_neighbors(atom).unwrap_or(&[]) {
            env.degree += 1;
            match molecule.bond_between(atom, other).map(|b| b.order) {
                Some(BondOrder::Double) => env.doubles += 1,
                Some(BondOrder::Triple) => env.triples += 1,
                Some(BondOrder::Aromatic) => env.aromatic = true,
                _ => {}
            }
        }
        env
    }

    pub fn all_single(&self) -> bool {
        self.doubles == 0 && self.triples == 0 && !self.aromatic
    }
}
