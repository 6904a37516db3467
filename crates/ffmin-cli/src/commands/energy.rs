use crate::cli::EnergyArgs;
use crate::config::JobFile;
use crate::error::Result;
use ffmin::core::forcefield::term::EnergyBreakdown;
use ffmin::workflows;
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    let file = JobFile::from_file(&args.job)?;
    let molecule = file.molecule()?;
    let job = file.to_job()?;

    info!("Evaluating single-point energy of '{}'", molecule.name());
    let breakdown = workflows::energy::run(&molecule, &job)?;
    print!("{}", format_breakdown(&breakdown));
    Ok(())
}

pub(crate) fn format_breakdown(breakdown: &EnergyBreakdown) -> String {
    let rows = [
        ("Bond stretch", breakdown.bond_stretch),
        ("Angle bend", breakdown.angle_bend),
        ("Torsion", breakdown.torsion),
        ("Van der Waals", breakdown.van_der_waals),
        ("Electrostatic", breakdown.electrostatic),
        ("Constraints", breakdown.constraint),
    ];
    let mut out = String::new();
    for (label, value) in rows {
        out.push_str(&format!("{label:<16}{value:>16.6} kcal/mol\n"));
    }
    out.push_str(&format!("{:<16}{:>16.6} kcal/mol\n", "Total", breakdown.total()));
    out
}
