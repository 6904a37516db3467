use super::config::MinimizerConfig;
use super::minimizer::{self, Objective};
use super::progress::{Progress, ProgressReporter};
use super::state::MinimizationResult;
use crate::core::forcefield::field::{ForceField, ForceFieldError};
use nalgebra::{DVector, Point3, Vector3};
use tracing::{info, instrument};

/// Exposes the non-fixed atoms of a force field as one flat coordinate vector.
///
/// Fixed atoms keep their stored positions; the optimizer never sees them.
struct FreeCoordinates<'a> {
    force_field: &'a ForceField,
    free_atoms: Vec<usize>,
}

impl<'a> FreeCoordinates<'a> {
    fn new(force_field: &'a ForceField) -> Self {
        let free_atoms = (0..force_field.atom_count())
            .filter(|&atom| !force_field.is_fixed(atom))
            .collect();
        Self {
            force_field,
            free_atoms,
        }
    }

    fn gather(&self, positions: &[Point3<f64>]) -> DVector<f64> {
        DVector::from_iterator(
            self.free_atoms.len() * 3,
            self.free_atoms
                .iter()
                .flat_map(|&atom| positions[atom].coords.iter().copied()),
        )
    }

    fn scatter(&self, x: &DVector<f64>) -> Vec<Point3<f64>> {
        let mut positions = self.force_field.positions().to_vec();
        for (n, &atom) in self.free_atoms.iter().enumerate() {
            positions[atom] = Point3::new(x[3 * n], x[3 * n + 1], x[3 * n + 2]);
        }
        positions
    }
}

impl Objective for FreeCoordinates<'_> {
    fn dimension(&self) -> usize {
        self.free_atoms.len() * 3
    }

    fn energy_and_gradient(&self, x: &DVector<f64>, gradient: &mut DVector<f64>) -> f64 {
        let positions = self.scatter(x);
        let mut full = vec![Vector3::zeros(); positions.len()];
        let energy = self
            .force_field
            .energy_and_gradient_unchecked(&positions, &mut full);
        for (n, &atom) in self.free_atoms.iter().enumerate() {
            gradient.fixed_rows_mut::<3>(3 * n).copy_from(&full[atom]);
        }
        energy
    }
}

impl ForceField {
    /// Minimizes the energy from the current positions, leaving the final
    /// geometry in the force field.
    ///
    /// Fixed atoms never move. Failing to converge is reported through
    /// [`MinimizationResult::status`]; an error is returned only when an
    /// angle or torsion is undefined on the starting geometry.
    pub fn minimize(&mut self, config: &MinimizerConfig) -> Result<MinimizationResult, ForceFieldError> {
        self.minimize_with_reporter(config, &ProgressReporter::new())
    }

    #[instrument(skip_all, name = "minimize", fields(atoms = self.atom_count(), constraints = self.constraints().len()))]
    pub fn minimize_with_reporter(
        &mut self,
        config: &MinimizerConfig,
        reporter: &ProgressReporter,
    ) -> Result<MinimizationResult, ForceFieldError> {
        self.check_geometry()?;

        let (outcome, positions) = {
            let objective = FreeCoordinates::new(self);
            let x0 = objective.gather(self.positions());
            let outcome = minimizer::minimize_bfgs(&objective, x0, config, reporter);
            let positions = objective.scatter(&outcome.x);
            (outcome, positions)
        };
        self.set_positions_unchecked(positions);

        reporter.report(Progress::Message(format!(
            "Minimization finished: {} after {} iterations",
            outcome.status, outcome.iterations
        )));
        info!(
            status = %outcome.status,
            iterations = outcome.iterations,
            initial_energy = outcome.initial_energy,
            final_energy = outcome.energy,
            "Minimization finished"
        );

        Ok(MinimizationResult {
            status: outcome.status,
            initial_energy: outcome.initial_energy,
            final_energy: outcome.energy,
            iterations: outcome.iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::mmff::MmffProperties;
    use crate::core::models::molecule::Molecule;
    use crate::engine::state::MinimizationStatus;
    use crate::testing::pentane;

    const STIFF: f64 = 1.0e5;

    #[derive(Clone, Copy)]
    enum Kind {
        Uff,
        Mmff,
    }

    fn build(kind: Kind, molecule: &Molecule) -> ForceField {
        match kind {
            Kind::Uff => ForceField::uff(molecule).unwrap(),
            Kind::Mmff => {
                let props = MmffProperties::new(molecule).unwrap();
                ForceField::mmff(molecule, &props).unwrap()
            }
        }
    }

    fn minimize_into(ff: &mut ForceField, molecule: &mut Molecule) -> MinimizationResult {
        let result = ff.minimize(&MinimizerConfig::default()).unwrap();
        assert_eq!(result.status.code(), 0, "minimization ended with {}", result.status);
        ff.write_positions(molecule).unwrap();
        result
    }

    fn distance_constraints(kind: Kind) {
        let mut molecule = pentane();

        let mut ff = build(kind, &molecule);
        ff.add_distance_constraint(1, 3, false, 2.0, 2.0, STIFF).unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert!(molecule.distance(1, 3).unwrap() > 1.99);

        let mut ff = build(kind, &molecule);
        ff.add_distance_constraint(1, 3, true, -0.2, 0.2, STIFF).unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert!(molecule.distance(1, 3).unwrap() > 1.79);
    }

    fn angle_constraints(kind: Kind) {
        let mut molecule = pentane();

        let mut ff = build(kind, &molecule);
        ff.add_angle_constraint(1, 3, 6, false, 90.0, 90.0, STIFF).unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert_eq!(molecule.angle(1, 3, 6).unwrap().trunc(), 90.0);

        let mut ff = build(kind, &molecule);
        ff.add_angle_constraint(1, 3, 6, true, -10.0, 10.0, STIFF).unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert_eq!(molecule.angle(1, 3, 6).unwrap().trunc(), 100.0);
    }

    fn torsion_constraints(kind: Kind) {
        let mut molecule = pentane();
        molecule.set_dihedral(1, 3, 6, 8, 60.0).unwrap();

        let mut ff = build(kind, &molecule);
        ff.add_torsion_constraint(1, 3, 6, 8, false, 30.0, 30.0, STIFF)
            .unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert_eq!(molecule.dihedral(1, 3, 6, 8).unwrap().trunc(), 30.0);

        let mut ff = build(kind, &molecule);
        ff.add_torsion_constraint(1, 3, 6, 8, true, -10.0, 10.0, STIFF)
            .unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert_eq!(molecule.dihedral(1, 3, 6, 8).unwrap().trunc(), 40.0);
    }

    fn position_constraint(kind: Kind) {
        let mut molecule = pentane();
        let start = molecule.position(1).unwrap();

        let mut ff = build(kind, &molecule);
        ff.add_position_constraint(1, 0.3, STIFF).unwrap();
        minimize_into(&mut ff, &mut molecule);
        let moved = (molecule.position(1).unwrap() - start).norm();
        assert!(moved < 0.3 + 1e-3, "atom 1 moved {moved}");
    }

    fn fixed_atom(kind: Kind) {
        let mut molecule = pentane();
        let start = molecule.position(1).unwrap();

        let mut ff = build(kind, &molecule);
        ff.add_fixed_point(1).unwrap();
        // Pulls hard on the fixed atom.
        ff.add_distance_constraint(1, 3, false, 2.0, 2.0, STIFF).unwrap();
        minimize_into(&mut ff, &mut molecule);
        assert!((molecule.position(1).unwrap() - start).norm() < 0.01);
        assert!(molecule.distance(1, 3).unwrap() > 1.99);
    }

    #[test]
    fn uff_distance_constraints_hold() {
        distance_constraints(Kind::Uff);
    }

    #[test]
    fn uff_angle_constraints_hold() {
        angle_constraints(Kind::Uff);
    }

    #[test]
    fn uff_torsion_constraints_hold() {
        torsion_constraints(Kind::Uff);
    }

    #[test]
    fn uff_position_constraint_limits_displacement() {
        position_constraint(Kind::Uff);
    }

    #[test]
    fn uff_fixed_atom_does_not_move() {
        fixed_atom(Kind::Uff);
    }

    #[test]
    fn mmff_distance_constraints_hold() {
        distance_constraints(Kind::Mmff);
    }

    #[test]
    fn mmff_angle_constraints_hold() {
        angle_constraints(Kind::Mmff);
    }

    #[test]
    fn mmff_torsion_constraints_hold() {
        torsion_constraints(Kind::Mmff);
    }

    #[test]
    fn mmff_position_constraint_limits_displacement() {
        position_constraint(Kind::Mmff);
    }

    #[test]
    fn mmff_fixed_atom_does_not_move() {
        fixed_atom(Kind::Mmff);
    }

    fn max_free_gradient(ff: &ForceField) -> f64 {
        ff.gradient(ff.positions())
            .unwrap()
            .iter()
            .map(|g| g.amax())
            .fold(0.0, f64::max)
    }

    /// Restrains the (1,3,6,8) torsion from 60° to 30° and minimizes the same
    /// force field twice.
    fn restrained_minimum_is_stable(kind: Kind) {
        let mut molecule = pentane();
        molecule.set_dihedral(1, 3, 6, 8, 60.0).unwrap();
        let mut ff = build(kind, &molecule);
        ff.add_torsion_constraint(1, 3, 6, 8, false, 30.0, 30.0, STIFF)
            .unwrap();

        let first = ff.minimize(&MinimizerConfig::default()).unwrap();
        assert_eq!(first.status.code(), 0, "first run ended with {}", first.status);
        assert!(first.final_energy <= first.initial_energy);

        let second = ff.minimize(&MinimizerConfig::default()).unwrap();
        assert_eq!(second.status.code(), 0, "second run ended with {}", second.status);
        let drop = first.final_energy - second.final_energy;
        assert!(
            drop <= 1e-3 * first.final_energy.abs().max(1.0),
            "re-minimizing lowered the energy by {drop}"
        );

        // Without the energy-change shortcut the run has to settle the gradient.
        let tight = MinimizerConfig {
            energy_tolerance: 1e-12,
            ..MinimizerConfig::default()
        };
        let settled = ff.minimize(&tight).unwrap();
        assert_eq!(settled.status.code(), 0, "tight run ended with {}", settled.status);
        assert!(
            second.final_energy - settled.final_energy <= 1e-3 * second.final_energy.abs().max(1.0)
        );
        let gradient = max_free_gradient(&ff);
        assert!(gradient < 1.0, "largest gradient component {gradient}");

        let again = ff.minimize(&tight).unwrap();
        assert!(again.final_energy <= settled.final_energy);
        assert!(
            settled.final_energy - again.final_energy <= 1e-6 * settled.final_energy.abs().max(1.0)
        );

        let mut out = pentane();
        ff.write_positions(&mut out).unwrap();
        assert!((out.dihedral(1, 3, 6, 8).unwrap() - 30.0).abs() < 0.01);
    }

    /// Drives the (1,3,6,8) torsion across the ±180° seam.
    fn torsion_across_seam(kind: Kind, start: f64, target: f64) {
        let mut molecule = pentane();
        molecule.set_dihedral(1, 3, 6, 8, start).unwrap();
        let mut ff = build(kind, &molecule);
        ff.add_torsion_constraint(1, 3, 6, 8, false, target, target, STIFF)
            .unwrap();
        minimize_into(&mut ff, &mut molecule);
        let dihedral = molecule.dihedral(1, 3, 6, 8).unwrap();
        let miss = (dihedral - target + 180.0).rem_euclid(360.0) - 180.0;
        assert!(miss.abs() < 0.01, "dihedral {dihedral}, target {target}");
    }

    #[test]
    fn uff_restrained_minimum_is_stable() {
        restrained_minimum_is_stable(Kind::Uff);
    }

    #[test]
    fn mmff_restrained_minimum_is_stable() {
        restrained_minimum_is_stable(Kind::Mmff);
    }

    #[test]
    fn uff_torsion_restraint_crosses_180() {
        torsion_across_seam(Kind::Uff, 170.0, -170.0);
        torsion_across_seam(Kind::Uff, -150.0, 170.0);
    }

    #[test]
    fn mmff_torsion_restraint_crosses_180() {
        torsion_across_seam(Kind::Mmff, 170.0, -170.0);
        torsion_across_seam(Kind::Mmff, -150.0, 170.0);
    }

    #[test]
    fn minimization_lowers_energy_and_is_idempotent() {
        let mut molecule = pentane();
        let mut ff = build(Kind::Uff, &molecule);
        let first = minimize_into(&mut ff, &mut molecule);
        assert!(first.final_energy <= first.initial_energy);

        let mut ff = build(Kind::Uff, &molecule);
        let second = minimize_into(&mut ff, &mut molecule);
        assert!((second.final_energy - first.final_energy).abs() < 1e-3);
    }

    #[test]
    fn minimization_is_deterministic() {
        let molecule = pentane();
        let mut a = build(Kind::Mmff, &molecule);
        let mut b = build(Kind::Mmff, &molecule);
        a.add_angle_constraint(1, 3, 6, false, 100.0, 105.0, 10.0).unwrap();
        b.add_angle_constraint(1, 3, 6, false, 100.0, 105.0, 10.0).unwrap();
        let ra = a.minimize(&MinimizerConfig::default()).unwrap();
        let rb = b.minimize(&MinimizerConfig::default()).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn all_atoms_fixed_converges_immediately() {
        let molecule = pentane();
        let mut ff = build(Kind::Uff, &molecule);
        for atom in 0..molecule.atom_count() {
            ff.add_fixed_point(atom).unwrap();
        }
        let result = ff.minimize(&MinimizerConfig::default()).unwrap();
        assert_eq!(result.status, MinimizationStatus::Converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(ff.positions(), molecule.positions().as_slice());
    }

    #[test]
    fn degenerate_start_is_rejected_before_iterating() {
        let mut molecule = pentane();
        molecule.set_position(0, Point3::new(-1.0, 0.0, 0.0)).unwrap();
        molecule.set_position(3, Point3::new(2.9, 0.0, 0.0)).unwrap();
        let mut ff = build(Kind::Uff, &molecule);
        let before = ff.positions().to_vec();
        assert!(matches!(
            ff.minimize(&MinimizerConfig::default()),
            Err(ForceFieldError::DegenerateGeometry { .. })
        ));
        assert_eq!(ff.positions(), before.as_slice());
    }
}
