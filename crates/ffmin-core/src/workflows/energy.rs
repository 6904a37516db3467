use super::minimize::{MinimizationJob, build_force_field};
use crate::core::forcefield::term::EnergyBreakdown;
use crate::core::models::molecule::Molecule;
use crate::engine::error::EngineError;
use tracing::{info, instrument};

/// Single-point energy of `molecule` under the job's force field and constraints.
///
/// The minimizer settings in `job` are ignored.
#[instrument(skip_all, name = "energy_workflow", fields(molecule = molecule.name()))]
pub fn run(molecule: &Molecule, job: &MinimizationJob) -> Result<EnergyBreakdown, EngineError> {
    let ff = build_force_field(molecule, job)?;
    ff.check_geometry()?;
    let breakdown = ff.energy_breakdown(ff.positions())?;
    info!(total = breakdown.total(), "Evaluated single-point energy");
    Ok(breakdown)
}
