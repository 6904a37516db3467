use super::bonded::{AngleBend, AngleBendForm, BondStretch, BondStretchForm, Torsion, TorsionForm};
use super::interactions::Interactions;
use super::nonbonded::{Electrostatic, ElectrostaticForm, VanDerWaals, VdwForm};
use super::parameterization::{BondingEnvironment, ForceFieldKind, ParameterizationError};
use super::params::{
    DonorAcceptor, MmffVdwParams, mmff_angle_params, mmff_bond_charge_increment,
    mmff_bond_params, mmff_torsion_params, mmff_vdw_params,
};
use super::term::EnergyContrib;
use crate::core::models::atom::Element;
use crate::core::models::molecule::Molecule;
use serde::Deserialize;
use tracing::{debug, trace};

const ONE_FOUR_ELECTROSTATIC_SCALE: f64 = 0.75;
const VDW_RADIUS_POWER: f64 = 0.25;
const VDW_B: f64 = 0.2;
const VDW_BETA: f64 = 12.0;
const VDW_WELL_SCALE: f64 = 181.16;
const DONOR_ACCEPTOR_RADIUS_SCALE: f64 = 0.8;
const DONOR_ACCEPTOR_WELL_SCALE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DielectricModel {
    #[default]
    Constant,
    DistanceDependent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmffOptions {
    pub dielectric_model: DielectricModel,
    pub dielectric_constant: f64,
}

impl Default for MmffOptions {
    fn default() -> Self {
        Self {
            dielectric_model: DielectricModel::Constant,
            dielectric_constant: 1.0,
        }
    }
}

/// MMFF94 atom types, partial charges and electrostatic settings for one molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct MmffProperties {
    atom_types: Vec<u8>,
    partial_charges: Vec<f64>,
    options: MmffOptions,
}

impl MmffProperties {
    /// Types every atom and derives bond-charge-increment partial charges.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterizationError`] if an atom's element or bonding
    /// environment has no MMFF94 type, or if a bond lacks a charge increment.
    pub fn new(molecule: &Molecule) -> Result<Self, ParameterizationError> {
        Self::with_options(molecule, MmffOptions::default())
    }

    pub fn with_options(
        molecule: &Molecule,
        options: MmffOptions,
    ) -> Result<Self, ParameterizationError> {
        let atom_types = (0..molecule.atom_count())
            .map(|i| type_atom(molecule, i))
            .collect::<Result<Vec<_>, _>>()?;

        let mut partial_charges = vec![0.0; atom_types.len()];
        for bond in molecule.bonds() {
            let (ti, tj) = (atom_types[bond.atom1], atom_types[bond.atom2]);
            let bci = mmff_bond_charge_increment(ti, tj).ok_or_else(|| {
                ParameterizationError::MissingParameters {
                    kind: "MMFF bond charge increment",
                    key: format!("{}-{}", ti.min(tj), ti.max(tj)),
                }
            })?;
            partial_charges[bond.atom1] += bci;
            partial_charges[bond.atom2] -= bci;
        }
        debug!(types = ?atom_types, "Assigned MMFF94 atom types");

        Ok(Self {
            atom_types,
            partial_charges,
            options,
        })
    }

    pub fn atom_type(&self, index: usize) -> Option<u8> {
        self.atom_types.get(index).copied()
    }

    pub fn atom_types(&self) -> &[u8] {
        &self.atom_types
    }

    pub fn partial_charges(&self) -> &[f64] {
        &self.partial_charges
    }

    pub fn options(&self) -> &MmffOptions {
        &self.options
    }

    pub fn set_dielectric(&mut self, model: DielectricModel, constant: f64) {
        self.options.dielectric_model = model;
        self.options.dielectric_constant = constant;
    }
}

fn type_atom(molecule: &Molecule, index: usize) -> Result<u8, ParameterizationError> {
    let atom = &molecule.atoms()[index];
    let env = BondingEnvironment::of(molecule, index);
    let unsupported = |reason: &str| ParameterizationError::UnsupportedEnvironment {
        force_field: ForceFieldKind::Mmff,
        atom: index,
        element: atom.element.to_string(),
        reason: reason.to_string(),
    };

    match atom.element {
        Element::Carbon if env.degree == 4 && env.all_single() => Ok(1),
        Element::Carbon => Err(unsupported("only sp3 carbon is supported")),
        Element::Oxygen if env.degree == 2 && env.all_single() => Ok(6),
        Element::Oxygen => Err(unsupported("only divalent sp3 oxygen is supported")),
        Element::Nitrogen if env.degree == 3 && env.all_single() => Ok(8),
        Element::Nitrogen => Err(unsupported("only trivalent sp3 nitrogen is supported")),
        Element::Hydrogen => {
            let partner = molecule
                .bonded_neighbors(index)
                .and_then(|n| match n {
                    [only] => Some(molecule.atoms()[*only].element),
                    _ => None,
                })
                .ok_or_else(|| unsupported("hydrogen must have exactly one bond"))?;
            match partner {
                Element::Carbon => Ok(5),
                Element::Oxygen => Ok(21),
                Element::Nitrogen => Ok(23),
                _ => Err(unsupported("hydrogen bonded to an unsupported element")),
            }
        }
        other => Err(ParameterizationError::UnsupportedElement {
            force_field: ForceFieldKind::Mmff,
            atom: index,
            element: other.to_string(),
        }),
    }
}

fn vdw_params(t: u8) -> Result<MmffVdwParams, ParameterizationError> {
    mmff_vdw_params(t).ok_or_else(|| ParameterizationError::MissingParameters {
        kind: "MMFF van der Waals",
        key: t.to_string(),
    })
}

/// Combined `(R*ij, εij)` for a pair of MMFF94 atom types.
pub fn combine_vdw(pi: &MmffVdwParams, pj: &MmffVdwParams) -> (f64, f64) {
    let r_ii = pi.a * pi.alpha.powf(VDW_RADIUS_POWER);
    let r_jj = pj.a * pj.alpha.powf(VDW_RADIUS_POWER);
    let mut r_star = if pi.da == DonorAcceptor::Donor || pj.da == DonorAcceptor::Donor {
        0.5 * (r_ii + r_jj)
    } else {
        let gamma = (r_ii - r_jj) / (r_ii + r_jj);
        0.5 * (r_ii + r_jj) * (1.0 + VDW_B * (1.0 - (-VDW_BETA * gamma * gamma).exp()))
    };
    let mut epsilon = VDW_WELL_SCALE * pi.g * pj.g * pi.alpha * pj.alpha
        / ((pi.alpha / pi.n_eff).sqrt() + (pj.alpha / pj.n_eff).sqrt())
        / r_star.powi(6);

    let donor_acceptor = matches!(
        (pi.da, pj.da),
        (DonorAcceptor::Donor, DonorAcceptor::Acceptor)
            | (DonorAcceptor::Acceptor, DonorAcceptor::Donor)
    );
    if donor_acceptor {
        r_star *= DONOR_ACCEPTOR_RADIUS_SCALE;
        epsilon *= DONOR_ACCEPTOR_WELL_SCALE;
    }
    (r_star, epsilon)
}

/// Builds every MMFF94 base term for `molecule`.
pub(crate) fn build_terms(
    molecule: &Molecule,
    properties: &MmffProperties,
) -> Result<Vec<EnergyContrib>, ParameterizationError> {
    let types = properties.atom_types();
    if types.len() != molecule.atom_count() {
        return Err(ParameterizationError::MissingParameters {
            kind: "MMFF atom type",
            key: format!("{} of {} atoms typed", types.len(), molecule.atom_count()),
        });
    }
    let interactions = Interactions::from_molecule(molecule);
    let mut terms = Vec::new();

    for &[i, j] in &interactions.bonds {
        let p = mmff_bond_params(types[i], types[j]).ok_or_else(|| {
            ParameterizationError::MissingParameters {
                kind: "MMFF bond",
                key: format!("{}-{}", types[i], types[j]),
            }
        })?;
        terms.push(EnergyContrib::BondStretch(BondStretch {
            atoms: [i, j],
            form: BondStretchForm::MmffQuartic {
                kb: p.kb,
                rest_length: p.r0,
            },
        }));
    }

    for &[i, j, k] in &interactions.angles {
        let p = mmff_angle_params(types[i], types[j], types[k]).ok_or_else(|| {
            ParameterizationError::MissingParameters {
                kind: "MMFF angle",
                key: format!("{}-{}-{}", types[i], types[j], types[k]),
            }
        })?;
        terms.push(EnergyContrib::AngleBend(AngleBend {
            atoms: [i, j, k],
            form: AngleBendForm::Mmff {
                ka: p.ka,
                theta0: p.theta0,
            },
        }));
    }

    for &[i, j, k, l] in &interactions.torsions {
        let p = mmff_torsion_params(types[i], types[j], types[k], types[l]).ok_or_else(|| {
            ParameterizationError::MissingParameters {
                kind: "MMFF torsion",
                key: format!("{}-{}-{}-{}", types[i], types[j], types[k], types[l]),
            }
        })?;
        terms.push(EnergyContrib::Torsion(Torsion {
            atoms: [i, j, k, l],
            form: TorsionForm::Mmff {
                v1: p.v1,
                v2: p.v2,
                v3: p.v3,
            },
        }));
    }

    let charges = properties.partial_charges();
    let options = properties.options();
    for pair in &interactions.nonbonded {
        let [i, j] = pair.atoms;
        let (r_star, well_depth) = combine_vdw(&vdw_params(types[i])?, &vdw_params(types[j])?);
        terms.push(EnergyContrib::VanDerWaals(VanDerWaals {
            atoms: [i, j],
            form: VdwForm::Buffered14_7 { r_star, well_depth },
        }));

        let mut charge_product = charges[i] * charges[j];
        if charge_product == 0.0 {
            continue;
        }
        if pair.is_one_four {
            charge_product *= ONE_FOUR_ELECTROSTATIC_SCALE;
        }
        terms.push(EnergyContrib::Electrostatic(Electrostatic {
            atoms: [i, j],
            form: ElectrostaticForm::MmffBuffered {
                charge_product,
                dielectric: options.dielectric_constant,
                distance_dependent: options.dielectric_model == DielectricModel::DistanceDependent,
            },
        }));
    }

    trace!(count = terms.len(), "Built MMFF94 terms");
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::MoleculeBuilder;
    use crate::core::models::topology::BondOrder;
    use crate::testing::pentane;
    use nalgebra::Point3;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn methanol() -> Molecule {
        let mut builder = MoleculeBuilder::new("methanol");
        builder
            .add_atom(1, Element::Carbon, Point3::new(0.0, 0.0, 0.0), None)
            .add_atom(2, Element::Oxygen, Point3::new(1.42, 0.0, 0.0), None)
            .add_atom(3, Element::Hydrogen, Point3::new(1.74, 0.91, 0.0), None)
            .add_atom(4, Element::Hydrogen, Point3::new(-0.36, 1.03, 0.0), None)
            .add_atom(5, Element::Hydrogen, Point3::new(-0.36, -0.51, 0.89), None)
            .add_atom(6, Element::Hydrogen, Point3::new(-0.36, -0.51, -0.89), None)
            .add_bond(1, 2, BondOrder::Single)
            .add_bond(2, 3, BondOrder::Single)
            .add_bond(1, 4, BondOrder::Single)
            .add_bond(1, 5, BondOrder::Single)
            .add_bond(1, 6, BondOrder::Single);
        builder.build().unwrap()
    }

    #[test]
    fn pentane_types_and_charges() {
        let props = MmffProperties::new(&pentane()).unwrap();
        assert_eq!(props.atom_type(0), Some(1));
        assert_eq!(props.atom_type(2), Some(5));
        assert!(props.partial_charges().iter().all(|q| *q == 0.0));
    }

    #[test]
    fn methanol_charges_follow_bond_charge_increments() {
        let props = MmffProperties::new(&methanol()).unwrap();
        assert_eq!(props.atom_types(), &[1, 6, 21, 5, 5, 5]);
        let q = props.partial_charges();
        assert!(f64_approx_equal(q[0], 0.28));
        assert!(f64_approx_equal(q[1], -0.68));
        assert!(f64_approx_equal(q[2], 0.40));
        assert!(f64_approx_equal(q.iter().sum::<f64>(), 0.0));
    }

    #[test]
    fn fluorine_reports_unsupported_element() {
        let mut builder = MoleculeBuilder::new("fluorine");
        builder.add_atom(1, Element::Fluorine, Point3::origin(), None);
        let err = MmffProperties::new(&builder.build().unwrap()).unwrap_err();
        assert_eq!(
            err,
            ParameterizationError::UnsupportedElement {
                force_field: ForceFieldKind::Mmff,
                atom: 0,
                element: "F".to_string(),
            }
        );
    }

    #[test]
    fn sp2_carbon_is_rejected() {
        let mut builder = MoleculeBuilder::new("ethylene-fragment");
        builder
            .add_atom(1, Element::Carbon, Point3::origin(), None)
            .add_atom(2, Element::Carbon, Point3::new(1.33, 0.0, 0.0), None)
            .add_bond(1, 2, BondOrder::Double);
        assert!(matches!(
            MmffProperties::new(&builder.build().unwrap()),
            Err(ParameterizationError::UnsupportedEnvironment { atom: 0, .. })
        ));
    }

    #[test]
    fn donor_acceptor_pairs_are_scaled() {
        let hydroxyl_h = mmff_vdw_params(21).unwrap();
        let oxygen = mmff_vdw_params(6).unwrap();
        let carbon_h = mmff_vdw_params(5).unwrap();
        let (r_da, e_da) = combine_vdw(&hydroxyl_h, &oxygen);
        let (r_plain, _) = combine_vdw(&carbon_h, &oxygen);
        assert!(r_da < r_plain);
        assert!(e_da > 0.0);
    }

    #[test]
    fn combine_vdw_is_symmetric() {
        let a = mmff_vdw_params(1).unwrap();
        let b = mmff_vdw_params(5).unwrap();
        let (r_ab, e_ab) = combine_vdw(&a, &b);
        let (r_ba, e_ba) = combine_vdw(&b, &a);
        assert!(f64_approx_equal(r_ab, r_ba));
        assert!(f64_approx_equal(e_ab, e_ba));
    }

    #[test]
    fn methanol_terms_skip_uncharged_pairs() {
        let molecule = methanol();
        let props = MmffProperties::new(&molecule).unwrap();
        let terms = build_terms(&molecule, &props).unwrap();
        // The only pairs three or more bonds apart involve uncharged methyl hydrogens.
        let electrostatics: Vec<_> = terms
            .iter()
            .filter(|t| matches!(t, EnergyContrib::Electrostatic(_)))
            .collect();
        assert!(electrostatics.is_empty());
        assert_eq!(
            terms
                .iter()
                .filter(|t| matches!(t, EnergyContrib::Torsion(_)))
                .count(),
            3
        );
    }
}
