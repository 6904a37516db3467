use super::energy::format_breakdown;
use crate::cli::MinimizeArgs;
use crate::config::JobFile;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use ffmin::core::forcefield::term::EnergyBreakdown;
use ffmin::core::models::molecule::Molecule;
use ffmin::engine::progress::ProgressReporter;
use ffmin::workflows::{self, minimize::MinimizationReport};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct EnergyRecord {
    bond_stretch: f64,
    angle_bend: f64,
    torsion: f64,
    van_der_waals: f64,
    electrostatic: f64,
    constraint: f64,
    total: f64,
}

impl From<&EnergyBreakdown> for EnergyRecord {
    fn from(b: &EnergyBreakdown) -> Self {
        Self {
            bond_stretch: b.bond_stretch,
            angle_bend: b.angle_bend,
            torsion: b.torsion,
            van_der_waals: b.van_der_waals,
            electrostatic: b.electrostatic,
            constraint: b.constraint,
            total: b.total(),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct AtomRecord {
    name: String,
    element: String,
    position: [f64; 3],
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct ResultFile {
    molecule: String,
    status: String,
    code: i32,
    iterations: usize,
    initial_energy: f64,
    final_energy: f64,
    rmsd: f64,
    energy: EnergyRecord,
    atoms: Vec<AtomRecord>,
}

impl ResultFile {
    fn new(molecule: &Molecule, report: &MinimizationReport) -> Self {
        Self {
            molecule: molecule.name().to_string(),
            status: report.result.status.to_string(),
            code: report.result.status.code(),
            iterations: report.result.iterations,
            initial_energy: report.result.initial_energy,
            final_energy: report.result.final_energy,
            rmsd: report.rmsd,
            energy: EnergyRecord::from(&report.breakdown),
            atoms: molecule
                .atoms()
                .iter()
                .map(|atom| AtomRecord {
                    name: atom.name.clone(),
                    element: atom.element.to_string(),
                    position: [atom.position.x, atom.position.y, atom.position.z],
                })
                .collect(),
        }
    }
}

pub fn run(args: MinimizeArgs, show_progress: bool) -> Result<()> {
    let file = JobFile::from_file(&args.job)?;
    info!("Merging job file with command-line overrides...");
    let job = file.merge_with_cli(&args)?;
    let mut molecule = file.molecule()?;

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Minimizing '{}' ({} atoms, {} constraints, {} fixed)...",
        molecule.name(),
        molecule.atom_count(),
        job.constraints.len(),
        job.fixed_atoms.len()
    );
    let report = workflows::minimize::run(&mut molecule, &job, &reporter)?;

    if report.result.status.is_converged() {
        println!(
            "✓ Converged after {} iterations: {:.6} -> {:.6} kcal/mol (RMSD {:.4} Å)",
            report.result.iterations,
            report.result.initial_energy,
            report.result.final_energy,
            report.rmsd
        );
    } else {
        warn!(status = %report.result.status, "Minimization did not converge");
        println!(
            "Warning: minimization ended with status '{}' (code {}) after {} iterations.",
            report.result.status,
            report.result.status.code(),
            report.result.iterations
        );
    }
    print!("{}", format_breakdown(&report.breakdown));

    if let Some(output) = &args.output {
        write_result(output, &molecule, &report)?;
        println!("Result written to: {}", output.display());
    }
    Ok(())
}

fn write_result(path: &Path, molecule: &Molecule, report: &MinimizationReport) -> Result<()> {
    let content = toml::to_string(&ResultFile::new(molecule, report))?;
    std::fs::write(path, content)?;
    info!("Wrote minimization result to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WATER_JOB: &str = r#"
[molecule]
name = "water"
atoms = [
    { element = "O", position = [0.0, 0.0, 0.0] },
    { element = "H", position = [1.05, 0.0, 0.0] },
    { element = "H", position = [-0.2, 0.9, 0.0] },
]
bonds = [{ atoms = [0, 1] }, { atoms = [0, 2] }]

[force-field]
fixed-atoms = [0]

[[constraints]]
type = "angle"
atoms = [1, 0, 2]
lower = 100.0
upper = 100.0
force-constant = 100.0
"#;

    #[test]
    fn minimize_writes_result_file() {
        let dir = tempdir().unwrap();
        let job_path = dir.path().join("water.toml");
        let out_path = dir.path().join("result.toml");
        fs::write(&job_path, WATER_JOB).unwrap();

        let args = MinimizeArgs {
            job: job_path,
            output: Some(out_path.clone()),
            max_iterations: None,
            gradient_tolerance: None,
            energy_tolerance: None,
        };
        run(args, false).unwrap();

        let written: toml::Table = toml::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert_eq!(written["molecule"].as_str(), Some("water"));
        assert_eq!(written["status"].as_str(), Some("converged"));
        assert_eq!(written["code"].as_integer(), Some(0));
        assert_eq!(written["atoms"].as_array().unwrap().len(), 3);

        let oxygen = written["atoms"][0]["position"].as_array().unwrap();
        let coords: Vec<f64> = oxygen.iter().map(|v| v.as_float().unwrap()).collect();
        assert_eq!(coords, vec![0.0, 0.0, 0.0]);
        assert!(written["energy"]["total"].as_float().is_some());
    }

    #[test]
    fn missing_job_file_is_an_io_error() {
        let args = MinimizeArgs {
            job: "/nonexistent/job.toml".into(),
            output: None,
            max_iterations: None,
            gradient_tolerance: None,
            energy_tolerance: None,
        };
        assert!(matches!(run(args, false), Err(crate::error::CliError::Io(_))));
    }
}
