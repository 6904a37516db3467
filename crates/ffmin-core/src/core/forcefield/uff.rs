use super::bonded::{AngleBend, AngleBendForm, BondStretch, BondStretchForm, Torsion, TorsionForm};
use super::interactions::Interactions;
use super::nonbonded::{Electrostatic, ElectrostaticForm, VanDerWaals, VdwForm};
use super::parameterization::{BondingEnvironment, ParameterizationError};
use super::params::{UffAtomParams, UffParameterTable};
use super::term::EnergyContrib;
use crate::core::models::atom::Element;
use crate::core::models::molecule::Molecule;
use tracing::{debug, trace};

const BOND_ORDER_SCALE: f64 = 0.1332;
const FORCE_SCALE: f64 = 664.12;
const SP2_TORSION_SCALE: f64 = 5.0;
const SP2_TORSION_BOND_ORDER: f64 = 4.18;
const SP2_SP3_BARRIER: f64 = 1.0;
const LINEAR_ANGLE_CUTOFF: f64 = 179.0;
const TRIGONAL_ANGLE: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hybridization {
    Sp,
    Sp2,
    Sp3,
    Other,
}

fn hybridization(label: &str) -> Hybridization {
    match label.as_bytes().get(2) {
        Some(b'1') => Hybridization::Sp,
        Some(b'2') | Some(b'R') => Hybridization::Sp2,
        Some(b'3') => Hybridization::Sp3,
        _ => Hybridization::Other,
    }
}

/// Assigns a UFF atom-type label to every atom from its element, bond orders and
/// coordination.
pub fn assign_atom_types(molecule: &Molecule) -> Result<Vec<&'static str>, ParameterizationError> {
    Ok(molecule
        .atoms()
        .iter()
        .enumerate()
        .map(|(i, atom)| type_atom(atom.element, BondingEnvironment::of(molecule, i)))
        .collect())
}

fn type_atom(element: Element, env: BondingEnvironment) -> &'static str {
    match element {
        Element::Hydrogen => "H_",
        Element::Boron => {
            if env.degree >= 4 {
                "B_3"
            } else {
                "B_2"
            }
        }
        Element::Carbon => {
            if env.aromatic {
                "C_R"
            } else if env.triples > 0 || env.doubles >= 2 {
                "C_1"
            } else if env.doubles == 1 || env.degree == 3 {
                "C_2"
            } else {
                "C_3"
            }
        }
        Element::Nitrogen => {
            if env.aromatic {
                "N_R"
            } else if env.triples > 0 || env.doubles >= 2 {
                "N_1"
            } else if env.doubles == 1 {
                "N_2"
            } else {
                "N_3"
            }
        }
        Element::Oxygen => {
            if env.aromatic {
                "O_R"
            } else if env.triples > 0 {
                "O_1"
            } else if env.doubles > 0 {
                "O_2"
            } else {
                "O_3"
            }
        }
        Element::Fluorine => "F_",
        Element::Silicon => "Si3",
        Element::Phosphorus => "P_3+3",
        Element::Sulfur => {
            if env.doubles > 0 || env.aromatic {
                "S_2"
            } else {
                "S_3+2"
            }
        }
        Element::Chlorine => "Cl",
        Element::Bromine => "Br",
        Element::Iodine => "I_",
    }
}

/// Natural bond length `r0 = ri + rj + rBO − rEN`.
pub fn rest_length(pi: &UffAtomParams, pj: &UffAtomParams, bond_order: f64) -> f64 {
    let r_bo = -BOND_ORDER_SCALE * (pi.r1 + pj.r1) * bond_order.ln();
    let r_en = pi.r1 * pj.r1 * (pi.xi.sqrt() - pj.xi.sqrt()).powi(2)
        / (pi.xi * pi.r1 + pj.xi * pj.r1);
    pi.r1 + pj.r1 + r_bo - r_en
}

fn bond_order(molecule: &Molecule, i: usize, j: usize) -> f64 {
    molecule
        .bond_between(i, j)
        .map(|b| b.order.as_f64())
        .unwrap_or(1.0)
}

fn lookup<'t>(
    table: &'t UffParameterTable,
    label: &str,
) -> Result<&'t UffAtomParams, ParameterizationError> {
    table
        .get(label)
        .ok_or_else(|| ParameterizationError::MissingParameters {
            kind: "UFF atom",
            key: label.to_string(),
        })
}

fn group16_barrier(element: Element) -> f64 {
    match element {
        Element::Oxygen => 2.0,
        _ => 6.8,
    }
}

/// Builds every UFF base term for `molecule`.
pub(crate) fn build_terms(
    molecule: &Molecule,
    table: &UffParameterTable,
) -> Result<Vec<EnergyContrib>, ParameterizationError> {
    let labels = assign_atom_types(molecule)?;
    debug!(types = ?labels, "Assigned UFF atom types");
    let params: Vec<&UffAtomParams> = labels
        .iter()
        .map(|label| lookup(table, label))
        .collect::<Result<_, _>>()?;
    let interactions = Interactions::from_molecule(molecule);
    let mut terms = Vec::new();

    for &[i, j] in &interactions.bonds {
        let r0 = rest_length(params[i], params[j], bond_order(molecule, i, j));
        let k = FORCE_SCALE * params[i].z1 * params[j].z1 / r0.powi(3);
        terms.push(EnergyContrib::BondStretch(BondStretch {
            atoms: [i, j],
            form: BondStretchForm::Harmonic {
                force_constant: k,
                rest_length: r0,
            },
        }));
    }

    for &[i, j, k] in &interactions.angles {
        let theta0 = params[j].theta0;
        let cos0 = theta0.to_radians().cos();
        let r_ij = rest_length(params[i], params[j], bond_order(molecule, i, j));
        let r_jk = rest_length(params[j], params[k], bond_order(molecule, j, k));
        let r_ik2 = r_ij * r_ij + r_jk * r_jk - 2.0 * r_ij * r_jk * cos0;
        let force = FORCE_SCALE * params[i].z1 * params[k].z1 / r_ik2.sqrt().powi(5)
            * (3.0 * r_ij * r_jk * (1.0 - cos0 * cos0) - r_ik2 * cos0);

        let form = if theta0 >= LINEAR_ANGLE_CUTOFF {
            AngleBendForm::UffLinear { k: force }
        } else if (theta0 - TRIGONAL_ANGLE).abs() < 1e-6 {
            AngleBendForm::UffPeriodic { k: force, n: 3 }
        } else {
            let sin2 = 1.0 - cos0 * cos0;
            let c2 = 1.0 / (4.0 * sin2);
            AngleBendForm::UffFourier {
                k: force,
                c0: c2 * (2.0 * cos0 * cos0 + 1.0),
                c1: -4.0 * c2 * cos0,
                c2,
            }
        };
        terms.push(EnergyContrib::AngleBend(AngleBend {
            atoms: [i, j, k],
            form,
        }));
    }

    for &[i, j, k, l] in &interactions.torsions {
        let (hyb_j, hyb_k) = (hybridization(labels[j]), hybridization(labels[k]));
        let (barrier, n, cos_n_phi0) = match (hyb_j, hyb_k) {
            (Hybridization::Sp3, Hybridization::Sp3) => {
                let (ej, ek) = (molecule.atoms()[j].element, molecule.atoms()[k].element);
                if ej.is_chalcogen() && ek.is_chalcogen() {
                    // n = 2, φ0 = 90°
                    ((group16_barrier(ej) * group16_barrier(ek)).sqrt(), 2, -1.0)
                } else {
                    // n = 3, φ0 = 180°
                    ((params[j].v1 * params[k].v1).sqrt(), 3, -1.0)
                }
            }
            (Hybridization::Sp2, Hybridization::Sp2) => {
                let order = bond_order(molecule, j, k);
                let barrier = SP2_TORSION_SCALE
                    * (params[j].u1 * params[k].u1).sqrt()
                    * (1.0 + SP2_TORSION_BOND_ORDER * order.ln());
                (barrier, 2, 1.0)
            }
            (Hybridization::Sp2, Hybridization::Sp3) | (Hybridization::Sp3, Hybridization::Sp2) => {
                (SP2_SP3_BARRIER, 6, 1.0)
            }
            _ => continue,
        };
        if barrier.abs() < 1e-12 {
            continue;
        }
        let count = interactions.torsions_about(j, k).max(1) as f64;
        terms.push(EnergyContrib::Torsion(Torsion {
            atoms: [i, j, k, l],
            form: TorsionForm::Uff {
                barrier: barrier / count,
                n,
                cos_n_phi0,
            },
        }));
    }

    for pair in &interactions.nonbonded {
        let [i, j] = pair.atoms;
        terms.push(EnergyContrib::VanDerWaals(VanDerWaals {
            atoms: [i, j],
            form: VdwForm::LennardJones {
                r_min: (params[i].x1 * params[j].x1).sqrt(),
                well_depth: (params[i].d1 * params[j].d1).sqrt(),
            },
        }));
        let (qi, qj) = (
            molecule.atoms()[i].partial_charge,
            molecule.atoms()[j].partial_charge,
        );
        if qi != 0.0 && qj != 0.0 {
            terms.push(EnergyContrib::Electrostatic(Electrostatic {
                atoms: [i, j],
                form: ElectrostaticForm::Coulomb {
                    q1: qi,
                    q2: qj,
                    dielectric: 1.0,
                },
            }));
        }
    }

    trace!(count = terms.len(), "Built UFF terms");
    Ok(terms)
}
