use crate::core::forcefield::field::ForceField;
use crate::core::forcefield::mmff::{MmffOptions, MmffProperties};
use crate::core::forcefield::params::UffParameterTable;
use crate::core::forcefield::term::EnergyBreakdown;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::calculate_rmsd;
use crate::engine::config::MinimizerConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::MinimizationResult;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Which parameter family to build the force field from.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceFieldSetup {
    /// UFF, optionally overriding built-in atom parameters from a TOML or CSV file.
    Uff { parameters: Option<PathBuf> },
    Mmff { options: MmffOptions },
}

impl Default for ForceFieldSetup {
    fn default() -> Self {
        Self::Uff { parameters: None }
    }
}

/// A restraint to attach before minimizing. Angles are in degrees, distances in Å.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintSpec {
    Distance {
        atoms: [usize; 2],
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    },
    Angle {
        atoms: [usize; 3],
        relative: bool,
        lower: f64,
        upper: f64,
        force_constant: f64,
    },
    Torsion {
        atoms: [usize; 4],
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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinimizationJob {
    pub force_field: ForceFieldSetup,
    pub constraints: Vec<ConstraintSpec>,
    pub fixed_atoms: Vec<usize>,
    pub minimizer: MinimizerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationReport {
    pub result: MinimizationResult,
    /// RMSD between the starting and final coordinates, in Å.
    pub rmsd: f64,
    pub breakdown: EnergyBreakdown,
}

/// Builds the force field for `molecule` and attaches the job's constraints and
/// fixed atoms, in that order.
pub fn build_force_field(molecule: &Molecule, job: &MinimizationJob) -> Result<ForceField, EngineError> {
    let mut ff = match &job.force_field {
        ForceFieldSetup::Uff { parameters: None } => ForceField::uff(molecule)?,
        ForceFieldSetup::Uff {
            parameters: Some(path),
        } => {
            let table = UffParameterTable::load(path)?;
            ForceField::uff_with_parameters(molecule, &table)?
        }
        ForceFieldSetup::Mmff { options } => {
            let properties = MmffProperties::with_options(molecule, *options)?;
            ForceField::mmff(molecule, &properties)?
        }
    };

    for constraint in &job.constraints {
        apply_constraint(&mut ff, constraint)?;
    }
    for &atom in &job.fixed_atoms {
        ff.add_fixed_point(atom)?;
    }
    Ok(ff)
}

fn apply_constraint(ff: &mut ForceField, constraint: &ConstraintSpec) -> Result<(), EngineError> {
    match *constraint {
        ConstraintSpec::Distance {
            atoms: [i, j],
            relative,
            lower,
            upper,
            force_constant,
        } => ff.add_distance_constraint(i, j, relative, lower, upper, force_constant)?,
        ConstraintSpec::Angle {
            atoms: [i, j, k],
            relative,
            lower,
            upper,
            force_constant,
        } => ff.add_angle_constraint(i, j, k, relative, lower, upper, force_constant)?,
        ConstraintSpec::Torsion {
            atoms: [i, j, k, l],
            relative,
            lower,
            upper,
            force_constant,
        } => ff.add_torsion_constraint(i, j, k, l, relative, lower, upper, force_constant)?,
        ConstraintSpec::Position {
            atom,
            max_displacement,
            force_constant,
        } => ff.add_position_constraint(atom, max_displacement, force_constant)?,
    }
    Ok(())
}

/// Minimizes `molecule` in place according to `job`.
///
/// On error the molecule is left untouched. A run that does not converge still
/// writes its final coordinates back; check `report.result.status`.
#[instrument(skip_all, name = "minimization_workflow", fields(molecule = molecule.name()))]
pub fn run(
    molecule: &mut Molecule,
    job: &MinimizationJob,
    reporter: &ProgressReporter,
) -> Result<MinimizationReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Parameterization",
    });
    let mut ff = build_force_field(molecule, job)?;
    info!(
        terms = ff.terms().len(),
        constraints = ff.constraints().len(),
        fixed = ff.fixed_atoms().len(),
        "Force field ready"
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Minimization",
    });
    let start = molecule.positions();
    let result = ff.minimize_with_reporter(&job.minimizer, reporter)?;
    ff.write_positions(molecule)?;
    reporter.report(Progress::PhaseFinish);

    let rmsd = calculate_rmsd(&start, ff.positions()).unwrap_or(0.0);
    let breakdown = ff.energy_breakdown(ff.positions())?;
    info!(
        status = %result.status,
        energy = result.final_energy,
        rmsd,
        "Minimization workflow finished"
    );

    Ok(MinimizationReport {
        result,
        rmsd,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::MinimizationStatus;
    use crate::testing::pentane;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn job_with(constraints: Vec<ConstraintSpec>, fixed_atoms: Vec<usize>) -> MinimizationJob {
        MinimizationJob {
            constraints,
            fixed_atoms,
            ..Default::default()
        }
    }

    #[test]
    fn run_applies_constraints_and_updates_molecule() {
        let mut molecule = pentane();
        let job = job_with(
            vec![ConstraintSpec::Distance {
                atoms: [1, 3],
                relative: false,
                lower: 2.0,
                upper: 2.0,
                force_constant: 1.0e5,
            }],
            vec![0],
        );
        let start = molecule.position(0).unwrap();

        let report = run(&mut molecule, &job, &ProgressReporter::new()).unwrap();

        assert_eq!(report.result.status, MinimizationStatus::Converged);
        assert!(molecule.distance(1, 3).unwrap() > 1.99);
        assert_eq!(molecule.position(0).unwrap(), start);
        assert!(report.rmsd > 0.0);
        assert!((report.breakdown.total() - report.result.final_energy).abs() < 1e-6);
    }

    #[test]
    fn run_reports_phases_in_order() {
        let mut molecule = pentane();
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        run(&mut molecule, &MinimizationJob::default(), &reporter).unwrap();
        drop(reporter);
        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Parameterization", "Minimization"]
        );
    }

    #[test]
    fn invalid_constraint_leaves_molecule_untouched() {
        let mut molecule = pentane();
        let before = molecule.positions();
        let job = job_with(
            vec![ConstraintSpec::Position {
                atom: 42,
                max_displacement: 0.1,
                force_constant: 10.0,
            }],
            vec![],
        );
        let err = run(&mut molecule, &job, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::ForceField { .. }));
        assert_eq!(molecule.positions(), before);
    }

    #[test]
    fn mmff_job_builds_force_field_with_options() {
        let molecule = pentane();
        let job = MinimizationJob {
            force_field: ForceFieldSetup::Mmff {
                options: MmffOptions::default(),
            },
            ..Default::default()
        };
        let ff = build_force_field(&molecule, &job).unwrap();
        assert!(!ff.terms().is_empty());
    }

    #[test]
    fn uff_job_loads_parameter_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("uff.toml");
        fs::write(
            &path,
            r#"[atom_types.C_3]
r1 = 0.757
theta0 = 109.47
x1 = 3.851
d1 = 0.2
zeta = 12.73
z1 = 1.912
v1 = 2.119
u1 = 2.0
xi = 5.343
"#,
        )
        .unwrap();
        let molecule = pentane();
        let job = MinimizationJob {
            force_field: ForceFieldSetup::Uff {
                parameters: Some(path),
            },
            ..Default::default()
        };
        let custom = build_force_field(&molecule, &job).unwrap();
        let builtin = ForceField::uff(&molecule).unwrap();
        let positions = molecule.positions();
        assert_ne!(
            custom.energy(&positions).unwrap(),
            builtin.energy(&positions).unwrap()
        );
    }

    #[test]
    fn missing_parameter_file_is_reported() {
        let job = MinimizationJob {
            force_field: ForceFieldSetup::Uff {
                parameters: Some(PathBuf::from("/nonexistent/uff.toml")),
            },
            ..Default::default()
        };
        let err = build_force_field(&pentane(), &job).unwrap_err();
        assert!(matches!(err, EngineError::ParameterFile { .. }));
    }
}
