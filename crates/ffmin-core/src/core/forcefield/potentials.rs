//! Closed-form potential energy functions.
//!
//! Functions returning a pair yield `(energy, dE/dx)` where `x` is the scalar
//! coordinate passed in (distance in Å, angle or dihedral in radians).

pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)
pub const MMFF_COULOMB_CONSTANT: f64 = 332.0716;

const MMFF_BOND_PREFACTOR: f64 = 143.9325 / 2.0;
const MMFF_BOND_CUBIC: f64 = -2.0;
const MMFF_BOND_QUARTIC: f64 = 7.0 / 12.0 * MMFF_BOND_CUBIC * MMFF_BOND_CUBIC;
const MMFF_ANGLE_PREFACTOR: f64 = 0.043844 / 2.0;
const MMFF_ANGLE_CUBIC: f64 = -0.006981;
const MMFF_ELECTROSTATIC_BUFFER: f64 = 0.05;
const BUFFER_DELTA: f64 = 0.07;
const BUFFER_GAMMA: f64 = 0.12;

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 0.0;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    12.0 * well_depth * (rho6 - rho12) / dist
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        return q1.signum() * q2.signum() * 1e10;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

#[inline]
pub fn coulomb_derivative(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < 1e-6 {
        return 0.0;
    }
    -COULOMB_CONSTANT * q1 * q2 / (dielectric * dist * dist)
}

/// Harmonic stretch `½·k·(r − r0)²`.
#[inline]
pub fn harmonic(value: f64, equilibrium: f64, force_constant: f64) -> (f64, f64) {
    let delta = value - equilibrium;
    (
        0.5 * force_constant * delta * delta,
        force_constant * delta,
    )
}

/// MMFF94 quartic bond stretch.
#[inline]
pub fn mmff_bond_stretch(dist: f64, r0: f64, kb: f64) -> (f64, f64) {
    let dr = dist - r0;
    let dr2 = dr * dr;
    let energy =
        MMFF_BOND_PREFACTOR * kb * dr2 * (1.0 + MMFF_BOND_CUBIC * dr + MMFF_BOND_QUARTIC * dr2);
    let derivative = MMFF_BOND_PREFACTOR
        * kb
        * dr
        * (2.0 + 3.0 * MMFF_BOND_CUBIC * dr + 4.0 * MMFF_BOND_QUARTIC * dr2);
    (energy, derivative)
}

/// UFF general angle term `K·(C0 + C1·cosθ + C2·cos2θ)`.
#[inline]
pub fn uff_angle_fourier(theta: f64, k: f64, c0: f64, c1: f64, c2: f64) -> (f64, f64) {
    let energy = k * (c0 + c1 * theta.cos() + c2 * (2.0 * theta).cos());
    let derivative = -k * (c1 * theta.sin() + 2.0 * c2 * (2.0 * theta).sin());
    (energy, derivative)
}

/// UFF linear angle term `K·(1 + cosθ)`, minimal at 180°.
#[inline]
pub fn uff_angle_linear(theta: f64, k: f64) -> (f64, f64) {
    (k * (1.0 + theta.cos()), -k * theta.sin())
}

/// UFF small-periodicity angle term `K/n²·(1 − cos nθ)` used for trigonal and square centers.
#[inline]
pub fn uff_angle_periodic(theta: f64, k: f64, n: u8) -> (f64, f64) {
    let n = f64::from(n);
    let scale = k / (n * n);
    (
        scale * (1.0 - (n * theta).cos()),
        scale * n * (n * theta).sin(),
    )
}

/// MMFF94 cubic angle bend; `theta` in radians, `theta0_degrees` in degrees.
#[inline]
pub fn mmff_angle_bend(theta: f64, theta0_degrees: f64, ka: f64) -> (f64, f64) {
    let dt = theta.to_degrees() - theta0_degrees;
    let energy = MMFF_ANGLE_PREFACTOR * ka * dt * dt * (1.0 + MMFF_ANGLE_CUBIC * dt);
    let d_deg = MMFF_ANGLE_PREFACTOR * ka * dt * (2.0 + 3.0 * MMFF_ANGLE_CUBIC * dt);
    (energy, d_deg.to_degrees())
}

/// UFF torsion `V/2·[1 − cos(nφ0)·cos(nφ)]`.
#[inline]
pub fn uff_torsion(phi: f64, barrier: f64, n: u8, cos_n_phi0: f64) -> (f64, f64) {
    let n = f64::from(n);
    let energy = 0.5 * barrier * (1.0 - cos_n_phi0 * (n * phi).cos());
    let derivative = 0.5 * barrier * cos_n_phi0 * n * (n * phi).sin();
    (energy, derivative)
}

/// MMFF94 three-term Fourier torsion.
#[inline]
pub fn mmff_torsion(phi: f64, v1: f64, v2: f64, v3: f64) -> (f64, f64) {
    let energy = 0.5
        * (v1 * (1.0 + phi.cos()) + v2 * (1.0 - (2.0 * phi).cos()) + v3 * (1.0 + (3.0 * phi).cos()));
    let derivative =
        0.5 * (-v1 * phi.sin() + 2.0 * v2 * (2.0 * phi).sin() - 3.0 * v3 * (3.0 * phi).sin());
    (energy, derivative)
}

/// Halgren buffered 14-7 van der Waals potential.
#[inline]
pub fn buffered_14_7(dist: f64, r_star: f64, well_depth: f64) -> (f64, f64) {
    if dist < 1e-6 {
        return (1e10, 0.0);
    }
    let buffered = dist + BUFFER_DELTA * r_star;
    let attract = ((1.0 + BUFFER_DELTA) * r_star / buffered).powi(7);
    let r_star7 = r_star.powi(7);
    let dist7 = dist.powi(7);
    let denom = dist7 + BUFFER_GAMMA * r_star7;
    let repulse = (1.0 + BUFFER_GAMMA) * r_star7 / denom - 2.0;

    let d_attract = -7.0 * attract / buffered;
    let d_repulse = -(1.0 + BUFFER_GAMMA) * r_star7 * 7.0 * dist.powi(6) / (denom * denom);
    (
        well_depth * attract * repulse,
        well_depth * (d_attract * repulse + attract * d_repulse),
    )
}

/// MMFF buffered Coulomb `332.0716·qq/(D·(r + 0.05)^n)`; `n = 2` for a distance-dependent dielectric.
#[inline]
pub fn mmff_buffered_coulomb(
    dist: f64,
    charge_product: f64,
    dielectric: f64,
    distance_dependent: bool,
) -> (f64, f64) {
    let buffered = dist + MMFF_ELECTROSTATIC_BUFFER;
    let power = if distance_dependent { 2 } else { 1 };
    let energy = MMFF_COULOMB_CONSTANT * charge_product / (dielectric * buffered.powi(power));
    (energy, -f64::from(power) * energy / buffered)
}

/// Flat-bottom restraint well: zero inside `[lower, upper]`, `k·Δ²` outside.
#[inline]
pub fn flat_bottom(value: f64, lower: f64, upper: f64, force_constant: f64) -> (f64, f64) {
    let excess = if value < lower {
        value - lower
    } else if value > upper {
        value - upper
    } else {
        return (0.0, 0.0);
    };
    (
        force_constant * excess * excess,
        2.0 * force_constant * excess,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;
    const STEP: f64 = 1e-6;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn assert_derivative_matches<F>(f: F, x: f64)
    where
        F: Fn(f64) -> (f64, f64),
    {
        let numeric = (f(x + STEP).0 - f(x - STEP).0) / (2.0 * STEP);
        let analytic = f(x).1;
        assert!(
            (numeric - analytic).abs() < 1e-5 * (1.0 + analytic.abs()),
            "numeric {numeric} vs analytic {analytic} at {x}"
        );
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(2.0, 2.0, 10.0);
        assert!(f64_approx_equal(energy, -10.0));
        assert!(f64_approx_equal(lennard_jones_12_6_derivative(2.0, 2.0, 10.0), 0.0));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let energy = lennard_jones_12_6(1e-7, 2.0, 10.0);
        assert!(f64_approx_equal(energy, 1e10));
    }

    #[test]
    fn lennard_jones_derivative_matches_finite_differences() {
        let f = |d| {
            (
                lennard_jones_12_6(d, 3.851, 0.105),
                lennard_jones_12_6_derivative(d, 3.851, 0.105),
            )
        };
        assert_derivative_matches(f, 3.2);
        assert_derivative_matches(f, 4.5);
    }

    #[test]
    fn coulomb_calculates_repulsive_force_correctly() {
        let energy = coulomb(1.0, 1.0, 1.0, 1.0);
        assert!(f64_approx_equal(energy, COULOMB_CONSTANT));
    }

    #[test]
    fn coulomb_calculates_attractive_force_correctly() {
        let energy = coulomb(2.0, 1.0, -1.0, 1.0);
        assert!(f64_approx_equal(energy, -COULOMB_CONSTANT / 2.0));
        assert!(f64_approx_equal(
            coulomb_derivative(2.0, 1.0, -1.0, 1.0),
            COULOMB_CONSTANT / 4.0
        ));
    }

    #[test]
    fn coulomb_at_very_small_distance_returns_large_energy_with_correct_sign() {
        assert!(f64_approx_equal(coulomb(1e-7, 1.0, 1.0, 1.0), 1e10));
        assert!(f64_approx_equal(coulomb(1e-7, -1.0, 1.0, 1.0), -1e10));
    }

    #[test]
    fn harmonic_is_zero_at_equilibrium_and_quadratic_away() {
        assert_eq!(harmonic(1.5, 1.5, 700.0), (0.0, 0.0));
        let (e, d) = harmonic(1.6, 1.5, 700.0);
        assert!((e - 3.5).abs() < 1e-9);
        assert!((d - 70.0).abs() < 1e-9);
    }

    #[test]
    fn mmff_bond_stretch_derivative_matches_finite_differences() {
        assert_derivative_matches(|r| mmff_bond_stretch(r, 1.508, 4.258), 1.7);
        assert_derivative_matches(|r| mmff_bond_stretch(r, 1.508, 4.258), 1.4);
    }

    #[test]
    fn uff_angle_forms_have_consistent_derivatives() {
        assert_derivative_matches(|t| uff_angle_fourier(t, 213.7, 0.43, 0.375, 0.281), 1.7);
        assert_derivative_matches(|t| uff_angle_linear(t, 100.0), 2.9);
        assert_derivative_matches(|t| uff_angle_periodic(t, 100.0, 3), 2.0);
    }

    #[test]
    fn uff_angle_periodic_is_minimal_at_one_twenty_degrees() {
        let at_min = uff_angle_periodic(120f64.to_radians(), 50.0, 3);
        assert!(at_min.0.abs() < 1e-9);
        assert!(at_min.1.abs() < 1e-9);
    }

    #[test]
    fn mmff_angle_bend_is_zero_at_reference_and_differentiable() {
        let (e, d) = mmff_angle_bend(109.608f64.to_radians(), 109.608, 0.851);
        assert!(e.abs() < 1e-12 && d.abs() < 1e-9);
        assert_derivative_matches(|t| mmff_angle_bend(t, 109.608, 0.851), 1.6);
    }

    #[test]
    fn uff_torsion_sp3_sp3_is_minimal_when_staggered() {
        let cos_n_phi0 = (3.0 * std::f64::consts::PI).cos();
        let (staggered, _) = uff_torsion(60f64.to_radians(), 2.119, 3, cos_n_phi0);
        let (eclipsed, _) = uff_torsion(0.0, 2.119, 3, cos_n_phi0);
        assert!(staggered.abs() < 1e-9);
        assert!((eclipsed - 2.119).abs() < 1e-9);
        assert_derivative_matches(|p| uff_torsion(p, 2.119, 3, cos_n_phi0), 0.4);
    }

    #[test]
    fn mmff_torsion_derivative_matches_finite_differences() {
        assert_derivative_matches(|p| mmff_torsion(p, 0.103, 0.681, 0.332), 0.5);
        assert_derivative_matches(|p| mmff_torsion(p, 0.284, -1.386, 0.314), -2.0);
    }

    #[test]
    fn buffered_14_7_at_r_star_returns_negative_well_depth_and_is_differentiable() {
        let (e, _) = buffered_14_7(3.9, 3.9, 0.2);
        assert!(f64_approx_equal(e, -0.2));
        assert_derivative_matches(|r| buffered_14_7(r, 3.9, 0.2), 3.3);
    }

    #[test]
    fn mmff_buffered_coulomb_derivative_matches_finite_differences() {
        assert_derivative_matches(|r| mmff_buffered_coulomb(r, -0.1, 1.0, false), 2.5);
        assert_derivative_matches(|r| mmff_buffered_coulomb(r, 0.1, 4.0, true), 2.5);
    }

    #[test]
    fn flat_bottom_is_zero_inside_bounds() {
        assert_eq!(flat_bottom(1.5, 1.0, 2.0, 100.0), (0.0, 0.0));
        assert_eq!(flat_bottom(2.0, 1.0, 2.0, 100.0), (0.0, 0.0));
    }

    #[test]
    fn flat_bottom_is_quadratic_outside_bounds() {
        let (below, d_below) = flat_bottom(0.5, 1.0, 2.0, 100.0);
        assert!(f64_approx_equal(below, 25.0));
        assert!(f64_approx_equal(d_below, -100.0));
        let (above, d_above) = flat_bottom(2.5, 1.0, 2.0, 100.0);
        assert!(f64_approx_equal(above, 25.0));
        assert!(f64_approx_equal(d_above, 100.0));
    }
}
