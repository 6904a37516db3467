use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Below this length a bond vector or plane normal is treated as zero.
pub const DEGENERACY_EPSILON: f64 = 1e-8;

const MIN_SIN_THETA: f64 = 1e-8;

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Wraps an angle in degrees into the half-open interval (-180, 180].
#[inline]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { wrapped + 360.0 } else { wrapped }
}

#[inline]
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

/// Angle at `b` in degrees, or `None` when either arm has zero length.
pub fn angle_degrees(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<f64> {
    let u = a - b;
    let v = c - b;
    let (nu, nv) = (u.norm(), v.norm());
    if nu < DEGENERACY_EPSILON || nv < DEGENERACY_EPSILON {
        return None;
    }
    let cos_theta = (u.dot(&v) / (nu * nv)).clamp(-1.0, 1.0);
    Some(cos_theta.acos().to_degrees())
}

/// Signed dihedral about the `b`–`c` bond in degrees, normalized to (-180, 180].
///
/// Positive values follow the IUPAC convention: looking from `b` towards `c`, the
/// front bond has to rotate clockwise to eclipse the back bond.
///
/// Returns `None` when three consecutive atoms are collinear and the dihedral is
/// undefined.
pub fn dihedral_degrees(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Option<f64> {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    if n1.norm() < DEGENERACY_EPSILON || n2.norm() < DEGENERACY_EPSILON {
        return None;
    }
    let y = b2.norm() * b1.dot(&n2);
    let x = n1.dot(&n2);
    Some(wrap_degrees(y.atan2(x).to_degrees()))
}

/// Distance between two points together with its derivative with respect to each.
pub fn distance_with_gradient(a: &Point3<f64>, b: &Point3<f64>) -> (f64, [Vector3<f64>; 2]) {
    let delta = a - b;
    let r = delta.norm();
    if r < DEGENERACY_EPSILON {
        return (r, [Vector3::zeros(); 2]);
    }
    let unit = delta / r;
    (r, [unit, -unit])
}

/// Angle at `b` in radians with its Cartesian derivatives for `a`, `b` and `c`.
///
/// Near 0° and 180° the `1/sin θ` factor is clamped so the gradient stays finite.
pub fn angle_with_gradient(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> (f64, [Vector3<f64>; 3]) {
    let u = a - b;
    let v = c - b;
    let (nu, nv) = (u.norm(), v.norm());
    if nu < DEGENERACY_EPSILON || nv < DEGENERACY_EPSILON {
        return (0.0, [Vector3::zeros(); 3]);
    }
    let (u_hat, v_hat) = (u / nu, v / nv);
    let cos_theta = u_hat.dot(&v_hat).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt().max(MIN_SIN_THETA);

    let grad_a = -(v_hat - u_hat * cos_theta) / (nu * sin_theta);
    let grad_c = -(u_hat - v_hat * cos_theta) / (nv * sin_theta);
    let grad_b = -(grad_a + grad_c);
    (theta, [grad_a, grad_b, grad_c])
}

/// Dihedral about `b`–`c` in radians with its Cartesian derivatives (Blondel–Karplus).
///
/// The angle uses the same sign convention as [`dihedral_degrees`]. For collinear
/// arms the gradient is zero.
pub fn dihedral_with_gradient(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> (f64, [Vector3<f64>; 4]) {
    let f = a - b;
    let g = b - c;
    let h = d - c;
    let cross_a = f.cross(&g);
    let cross_b = h.cross(&g);
    let a2 = cross_a.norm_squared();
    let b2 = cross_b.norm_squared();
    let g_norm = g.norm();

    if a2.sqrt() < DEGENERACY_EPSILON || b2.sqrt() < DEGENERACY_EPSILON || g_norm < DEGENERACY_EPSILON
    {
        return (0.0, [Vector3::zeros(); 4]);
    }

    let x = cross_a.dot(&cross_b);
    let y = cross_b.cross(&cross_a).dot(&g) / g_norm;
    let phi = y.atan2(x);

    let fg = f.dot(&g);
    let hg = h.dot(&g);
    let term_a = cross_a * (g_norm / a2);
    let term_b = cross_b * (g_norm / b2);
    let shift_a = cross_a * (fg / (a2 * g_norm));
    let shift_b = cross_b * (hg / (b2 * g_norm));

    let grad_a = -term_a;
    let grad_d = term_b;
    let grad_b = term_a + shift_a - shift_b;
    let grad_c = shift_b - shift_a - term_b;
    (phi, [grad_a, grad_b, grad_c, grad_d])
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;
    const STEP: f64 = 1e-6;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn numeric_gradient<F>(points: &[Point3<f64>], f: F) -> Vec<Vector3<f64>>
    where
        F: Fn(&[Point3<f64>]) -> f64,
    {
        let mut grads = vec![Vector3::zeros(); points.len()];
        for i in 0..points.len() {
            for axis in 0..3 {
                let mut plus = points.to_vec();
                let mut minus = points.to_vec();
                plus[i][axis] += STEP;
                minus[i][axis] -= STEP;
                grads[i][axis] = (f(&plus) - f(&minus)) / (2.0 * STEP);
            }
        }
        grads
    }

    fn skewed_quad() -> Vec<Point3<f64>> {
        vec![
            Point3::new(1.1, 0.3, -0.2),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.1, 0.2, 1.5),
            Point3::new(-0.9, 0.8, 1.9),
        ]
    }

    #[test]
    fn wrap_degrees_maps_into_half_open_interval() {
        assert!(f64_approx_equal(wrap_degrees(180.0), 180.0));
        assert!(f64_approx_equal(wrap_degrees(-180.0), 180.0));
        assert!(f64_approx_equal(wrap_degrees(190.0), -170.0));
        assert!(f64_approx_equal(wrap_degrees(-370.0), -10.0));
        assert!(f64_approx_equal(wrap_degrees(45.0), 45.0));
    }

    #[test]
    fn angle_degrees_of_right_angle_is_ninety() {
        let angle = angle_degrees(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::origin(),
            &Point3::new(0.0, 2.0, 0.0),
        )
        .unwrap();
        assert!(f64_approx_equal(angle, 90.0));
    }

    #[test]
    fn angle_degrees_with_coincident_atoms_is_none() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(angle_degrees(&p, &p, &Point3::origin()).is_none());
    }

    #[test]
    fn dihedral_degrees_follows_iupac_sign_convention() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 0.0, 1.0);
        let phi = 60.0f64.to_radians();
        let d = Point3::new(phi.cos(), phi.sin(), 1.0);
        let d_neg = Point3::new(phi.cos(), -phi.sin(), 1.0);

        assert!(f64_approx_equal(dihedral_degrees(&a, &b, &c, &d).unwrap(), 60.0));
        assert!(f64_approx_equal(dihedral_degrees(&a, &b, &c, &d_neg).unwrap(), -60.0));
    }

    #[test]
    fn dihedral_degrees_of_anti_conformation_is_one_eighty() {
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 0.0, 1.0);
        let d = Point3::new(-1.0, 0.0, 1.0);
        assert!(f64_approx_equal(dihedral_degrees(&a, &b, &c, &d).unwrap(), 180.0));
    }

    #[test]
    fn dihedral_degrees_with_collinear_atoms_is_none() {
        let a = Point3::new(0.0, 0.0, -1.0);
        let b = Point3::origin();
        let c = Point3::new(0.0, 0.0, 1.0);
        let d = Point3::new(1.0, 0.0, 1.0);
        assert!(dihedral_degrees(&a, &b, &c, &d).is_none());
    }

    #[test]
    fn distance_gradient_matches_finite_differences() {
        let pts = skewed_quad();
        let (_, analytic) = distance_with_gradient(&pts[0], &pts[2]);
        let numeric = numeric_gradient(&[pts[0], pts[2]], |p| distance(&p[0], &p[1]));
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert!((a - n).norm() < 1e-5);
        }
    }

    #[test]
    fn angle_gradient_matches_finite_differences() {
        let pts = skewed_quad();
        let (theta, analytic) = angle_with_gradient(&pts[0], &pts[1], &pts[2]);
        assert!(f64_approx_equal(
            theta.to_degrees(),
            angle_degrees(&pts[0], &pts[1], &pts[2]).unwrap()
        ));
        let numeric = numeric_gradient(&pts[..3], |p| {
            angle_with_gradient(&p[0], &p[1], &p[2]).0
        });
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert!((a - n).norm() < 1e-5);
        }
    }

    #[test]
    fn dihedral_gradient_matches_finite_differences() {
        let pts = skewed_quad();
        let (phi, analytic) = dihedral_with_gradient(&pts[0], &pts[1], &pts[2], &pts[3]);
        assert!(f64_approx_equal(
            phi.to_degrees(),
            dihedral_degrees(&pts[0], &pts[1], &pts[2], &pts[3]).unwrap()
        ));
        let numeric = numeric_gradient(&pts, |p| {
            dihedral_with_gradient(&p[0], &p[1], &p[2], &p[3]).0
        });
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert!((a - n).norm() < 1e-5);
        }
    }

    #[test]
    fn rotation_from_axis_angle_rotates_counter_clockwise_about_axis() {
        let rot = rotation_from_axis_angle(&Vector3::z(), 90.0);
        let rotated = rot * Vector3::x();
        assert!((rotated - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn calculate_rmsd_returns_none_for_mismatched_lengths() {
        assert!(calculate_rmsd(&[Point3::origin()], &[]).is_none());
    }

    #[test]
    fn calculate_rmsd_of_uniform_shift_equals_shift_length() {
        let a = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let b: Vec<_> = a.iter().map(|p| p + Vector3::new(0.0, 3.0, 4.0)).collect();
        assert!(f64_approx_equal(calculate_rmsd(&a, &b).unwrap(), 5.0));
    }
}
