use crate::cli::MinimizeArgs;
use crate::error::{CliError, Result};
use ffmin::core::forcefield::mmff::{DielectricModel, MmffOptions};
use ffmin::core::forcefield::parameterization::ForceFieldKind;
use ffmin::core::models::atom::Element;
use ffmin::core::models::builder::MoleculeBuilder;
use ffmin::core::models::molecule::Molecule;
use ffmin::core::models::topology::BondOrder;
use ffmin::engine::config::MinimizerConfigBuilder;
use ffmin::engine::error::EngineError;
use ffmin::workflows::minimize::{ConstraintSpec, ForceFieldSetup, MinimizationJob};
use nalgebra::Point3;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct AtomEntry {
    element: String,
    position: [f64; 3],
    name: Option<String>,
    charge: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct BondEntry {
    atoms: [usize; 2],
    #[serde(default)]
    order: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct MoleculeSection {
    name: Option<String>,
    atoms: Vec<AtomEntry>,
    #[serde(default)]
    bonds: Vec<BondEntry>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ForceFieldSection {
    kind: Option<ForceFieldKind>,
    #[serde(default)]
    fixed_atoms: Vec<usize>,
    uff_parameters: Option<PathBuf>,
    dielectric_model: Option<DielectricModel>,
    dielectric_constant: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct MinimizerSection {
    max_iterations: Option<usize>,
    gradient_tolerance: Option<f64>,
    energy_tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
enum ConstraintEntry {
    Distance {
        atoms: [usize; 2],
        #[serde(default)]
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    },
    Angle {
        atoms: [usize; 3],
        #[serde(default)]
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    },
    Torsion {
        atoms: [usize; 4],
        #[serde(default)]
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    },
    Position {
        atom: usize,
        max_displacement: f64,
        force_constant: f64,
    },
}

impl From<ConstraintEntry> for ConstraintSpec {
    fn from(entry: ConstraintEntry) -> Self {
        match entry {
            ConstraintEntry::Distance {
                atoms,
                relative,
                lower,
                upper,
                force_constant,
            } => Self::Distance {
                atoms,
                relative,
                lower,
                upper,
                force_constant,
            },
            ConstraintEntry::Angle {
                atoms,
                relative,
                lower,
                upper,
                force_constant,
            } => Self::Angle {
                atoms,
                relative,
                lower,
                upper,
                force_constant,
            },
            ConstraintEntry::Torsion {
                atoms,
                relative,
                lower,
                upper,
                force_constant,
            } => Self::Torsion {
                atoms,
                relative,
                lower,
                upper,
                force_constant,
            },
            ConstraintEntry::Position {
                atom,
                max_displacement,
                force_constant,
            } => Self::Position {
                atom,
                max_displacement,
                force_constant,
            },
        }
    }
}

/// A job file as written on disk; every section except `[molecule]` is optional.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct JobFile {
    molecule: MoleculeSection,
    #[serde(default)]
    force_field: ForceFieldSection,
    #[serde(default)]
    minimizer: MinimizerSection,
    #[serde(default)]
    constraints: Vec<ConstraintEntry>,
    /// Directory of the job file; relative parameter paths resolve against it.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl JobFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading job file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut job: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        job.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(job)
    }

    /// Builds the molecule. Atoms are indexed in file order starting at 0 and
    /// bonds refer to those indices.
    pub fn molecule(&self) -> Result<Molecule> {
        let section = &self.molecule;
        let mut builder = MoleculeBuilder::new(section.name.as_deref().unwrap_or("molecule"));
        for (index, atom) in section.atoms.iter().enumerate() {
            let element: Element = atom
                .element
                .parse()
                .map_err(|e| CliError::Config(format!("atom {index}: {e}")))?;
            let [x, y, z] = atom.position;
            builder.add_atom(index, element, Point3::new(x, y, z), atom.charge);
        }
        for bond in &section.bonds {
            let order = match &bond.order {
                Some(text) => text.parse::<BondOrder>().map_err(|_| {
                    CliError::Config(format!(
                        "bond {:?}: unknown bond order '{text}'",
                        bond.atoms
                    ))
                })?,
                None => BondOrder::Single,
            };
            builder.add_bond(bond.atoms[0], bond.atoms[1], order);
        }

        let mut molecule = builder.build()?;
        for (index, atom) in section.atoms.iter().enumerate() {
            if let (Some(name), Some(target)) = (&atom.name, molecule.atom_mut(index)) {
                target.name = name.clone();
            }
        }
        Ok(molecule)
    }

    /// Converts the file into a library job without command-line overrides.
    pub fn to_job(&self) -> Result<MinimizationJob> {
        self.build_job(None, None, None)
    }

    /// Converts the file into a library job, letting command-line values win.
    pub fn merge_with_cli(&self, args: &MinimizeArgs) -> Result<MinimizationJob> {
        self.build_job(
            args.max_iterations,
            args.gradient_tolerance,
            args.energy_tolerance,
        )
    }

    fn build_job(
        &self,
        max_iterations: Option<usize>,
        gradient_tolerance: Option<f64>,
        energy_tolerance: Option<f64>,
    ) -> Result<MinimizationJob> {
        let mut builder = MinimizerConfigBuilder::new();
        if let Some(n) = max_iterations.or(self.minimizer.max_iterations) {
            builder = builder.max_iterations(n);
        }
        if let Some(tol) = gradient_tolerance.or(self.minimizer.gradient_tolerance) {
            builder = builder.gradient_tolerance(tol);
        }
        if let Some(tol) = energy_tolerance.or(self.minimizer.energy_tolerance) {
            builder = builder.energy_tolerance(tol);
        }
        let minimizer = builder.build().map_err(EngineError::from)?;

        let ff = &self.force_field;

        let force_field = match ff.kind.unwrap_or(ForceFieldKind::Uff) {
            ForceFieldKind::Uff => {
                if ff.dielectric_model.is_some() || ff.dielectric_constant.is_some() {
                    return Err(CliError::Config(
                        "dielectric settings only apply to the MMFF force field".to_string(),
                    ));
                }
                ForceFieldSetup::Uff {
                    parameters: ff.uff_parameters.as_ref().map(|p| self.base_dir.join(p)),
                }
            }
            ForceFieldKind::Mmff => {
                if ff.uff_parameters.is_some() {
                    return Err(CliError::Config(
                        "'uff-parameters' cannot be combined with kind = \"mmff\"".to_string(),
                    ));
                }
                let defaults = MmffOptions::default();
                ForceFieldSetup::Mmff {
                    options: MmffOptions {
                        dielectric_model: ff.dielectric_model.unwrap_or(defaults.dielectric_model),
                        dielectric_constant: ff
                            .dielectric_constant
                            .unwrap_or(defaults.dielectric_constant),
                    },
                }
            }
        };

        Ok(MinimizationJob {
            force_field,
            constraints: self.constraints.iter().cloned().map(Into::into).collect(),
            fixed_atoms: ff.fixed_atoms.clone(),
            minimizer,
        })
    }
}
