use super::config::MinimizerConfig;
use super::progress::{Progress, ProgressReporter};
use super::state::MinimizationStatus;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, instrument, trace, warn};

/// Sufficient-decrease coefficient of the Wolfe conditions.
const ARMIJO: f64 = 1e-4;
/// Curvature coefficient of the strong Wolfe conditions.
const CURVATURE: f64 = 0.9;
/// Relative energy differences below this are indistinguishable from round-off.
const ENERGY_NOISE: f64 = 1e-12;
const MAX_STEP_FACTOR: f64 = 100.0;
/// Largest single-coordinate change tried first along an unscaled gradient.
const INITIAL_DISPLACEMENT: f64 = 0.1;
const EXTRAPOLATION: f64 = 4.0;
const MAX_LINE_SEARCH_STEPS: usize = 60;

/// A differentiable scalar function over a flat coordinate vector.
pub trait Objective {
    fn dimension(&self) -> usize;

    /// Returns the energy and overwrites `gradient` with its derivative at `x`.
    fn energy_and_gradient(&self, x: &DVector<f64>, gradient: &mut DVector<f64>) -> f64;
}

#[derive(Debug, Clone)]
pub struct BfgsOutcome {
    pub x: DVector<f64>,
    pub energy: f64,
    pub initial_energy: f64,
    pub iterations: usize,
    pub status: MinimizationStatus,
}

/// A point on the current search line.
#[derive(Debug, Clone)]
struct Trial {
    step: f64,
    x: DVector<f64>,
    energy: f64,
    gradient: DVector<f64>,
    /// Directional derivative along the search direction.
    slope: f64,
}

/// Upper end of a bracket; `energy` is infinite when the objective blew up there.
#[derive(Debug, Clone, Copy)]
struct Bound {
    step: f64,
    energy: f64,
    slope: f64,
}

impl Trial {
    fn bound(&self) -> Bound {
        Bound {
            step: self.step,
            energy: self.energy,
            slope: self.slope,
        }
    }
}

enum LineSearch {
    Accepted(Trial),
    NotDescent,
    Stalled,
}

/// Quasi-Newton minimization with an inverse-Hessian BFGS update and a
/// strong-Wolfe line search.
///
/// The run converges when the scaled gradient drops below
/// `config.gradient_tolerance`, or when a full quasi-Newton step changes the
/// energy by less than `config.energy_tolerance` (relative) and the model
/// predicts no larger change from the next one. A non-finite start, or a line
/// search that cannot lower the energy even along the steepest-descent
/// direction, ends the run with [`MinimizationStatus::NumericalFailure`] and
/// leaves `x` at the last accepted point.
#[instrument(skip_all, name = "bfgs_minimizer", fields(dimension = objective.dimension()))]
pub fn minimize_bfgs<O: Objective + ?Sized>(
    objective: &O,
    x0: DVector<f64>,
    config: &MinimizerConfig,
    reporter: &ProgressReporter,
) -> BfgsOutcome {
    let n = x0.len();
    let mut gradient = DVector::zeros(n);
    let energy = objective.energy_and_gradient(&x0, &mut gradient);
    let initial_energy = energy;
    let mut current = Trial {
        step: 0.0,
        x: x0,
        energy,
        gradient,
        slope: 0.0,
    };

    let finish = |point: Trial, iterations: usize, status: MinimizationStatus| BfgsOutcome {
        x: point.x,
        energy: point.energy,
        initial_energy,
        iterations,
        status,
    };

    if !current.energy.is_finite() || !is_finite(&current.gradient) {
        warn!(energy, "Non-finite energy or gradient at the starting point");
        return finish(current, 0, MinimizationStatus::NumericalFailure);
    }
    if n == 0 || gradient_converged(&current, config.gradient_tolerance) {
        debug!(energy, "Starting point already satisfies the gradient test");
        return finish(current, 0, MinimizationStatus::Converged);
    }

    let max_step = MAX_STEP_FACTOR * current.x.norm().max(n as f64);
    let mut inverse_hessian = DMatrix::<f64>::identity(n, n);
    // Until the first update the inverse Hessian is the unscaled identity.
    let mut unscaled = true;
    let mut direction = -&current.gradient;
    let mut initial_step = unscaled_step(&direction);

    reporter.report(Progress::TaskStart {
        total_steps: config.max_iterations as u64,
    });

    for iteration in 1..=config.max_iterations {
        let max_multiple = max_step / direction.norm();
        let trial = match line_search(
            objective,
            &current,
            &direction,
            initial_step.min(max_multiple),
            max_multiple,
        ) {
            LineSearch::Accepted(trial) => trial,
            LineSearch::NotDescent | LineSearch::Stalled if !unscaled => {
                trace!(iteration, "Resetting inverse Hessian");
                inverse_hessian.fill_with_identity();
                unscaled = true;
                direction = -&current.gradient;
                initial_step = unscaled_step(&direction);
                continue;
            }
            LineSearch::NotDescent | LineSearch::Stalled => {
                warn!(
                    iteration,
                    energy = current.energy,
                    "No lower energy found along the steepest-descent direction"
                );
                reporter.report(Progress::TaskFinish);
                return finish(current, iteration, MinimizationStatus::NumericalFailure);
            }
        };

        let dx = &trial.x - &current.x;
        let dg = &trial.gradient - &current.gradient;
        let full_step = trial.step == 1.0;
        let energy_old = current.energy;
        current = trial;

        trace!(iteration, energy = current.energy, step = current.step, "BFGS iteration");
        reporter.report(Progress::Iteration {
            iteration: iteration as u64,
            energy: current.energy,
        });

        if gradient_converged(&current, config.gradient_tolerance) {
            debug!(iteration, energy = current.energy, "Gradient converged");
            reporter.report(Progress::TaskFinish);
            return finish(current, iteration, MinimizationStatus::Converged);
        }

        let fac = dg.dot(&dx);
        let dg_squared = dg.norm_squared();
        // Skip the update when the curvature condition is not met.
        if fac > (f64::EPSILON * dg_squared * dx.norm_squared()).sqrt() {
            if unscaled {
                inverse_hessian.fill_with_identity();
                inverse_hessian *= fac / dg_squared;
            }
            let hdg = &inverse_hessian * &dg;
            let fae = dg.dot(&hdg);
            if fae > 0.0 {
                let fac = 1.0 / fac;
                let fad = 1.0 / fae;
                let u = &dx * fac - &hdg * fad;
                inverse_hessian.ger(fac, &dx, &dx, 1.0);
                inverse_hessian.ger(-fad, &hdg, &hdg, 1.0);
                inverse_hessian.ger(fae, &u, &u, 1.0);
                unscaled = false;
            }
        }
        direction = -(&inverse_hessian * &current.gradient);
        initial_step = if unscaled {
            unscaled_step(&direction)
        } else {
            1.0
        };

        let predicted = current.energy + 0.5 * current.gradient.dot(&direction);
        if full_step
            && energy_converged(energy_old, current.energy, config.energy_tolerance)
            && energy_converged(current.energy, predicted, config.energy_tolerance)
        {
            debug!(iteration, energy = current.energy, "Energy converged");
            reporter.report(Progress::TaskFinish);
            return finish(current, iteration, MinimizationStatus::Converged);
        }
    }

    debug!(
        iterations = config.max_iterations,
        energy = current.energy,
        "BFGS reached the iteration limit"
    );
    reporter.report(Progress::TaskFinish);
    finish(
        current,
        config.max_iterations,
        MinimizationStatus::MaxIterationsReached,
    )
}

/// First trial multiple for a direction not yet scaled by curvature information.
fn unscaled_step(direction: &DVector<f64>) -> f64 {
    (INITIAL_DISPLACEMENT / direction.amax()).min(1.0)
}

/// Searches along `direction` for a point satisfying the strong Wolfe
/// conditions, bracketing first and then zooming with safeguarded cubic
/// interpolation.
///
/// Energies within round-off of the start count as a sufficient decrease, so
/// stiff restraints near their minimum are still resolved by the slope alone.
/// If the curvature condition is never met, the lowest sufficient-decrease
/// point found is returned instead.
fn line_search<O: Objective + ?Sized>(
    objective: &O,
    start: &Trial,
    direction: &DVector<f64>,
    initial_step: f64,
    max_step: f64,
) -> LineSearch {
    let slope0 = start.gradient.dot(direction);
    if !(slope0 < 0.0) {
        return LineSearch::NotDescent;
    }
    let noise = ENERGY_NOISE * start.energy.abs();
    let sufficient = |t: &Trial| {
        t.energy <= start.energy + ARMIJO * t.step * slope0 || t.energy <= start.energy + noise
    };

    let mut lo = Trial {
        slope: slope0,
        ..start.clone()
    };
    let mut hi: Option<Bound> = None;
    let mut step = initial_step;

    for _ in 0..MAX_LINE_SEARCH_STEPS {
        let x = &start.x + direction * step;
        if x == lo.x {
            break;
        }
        let mut gradient = DVector::zeros(x.len());
        let energy = objective.energy_and_gradient(&x, &mut gradient);

        if !energy.is_finite() || !is_finite(&gradient) {
            hi = Some(Bound {
                step,
                energy: f64::INFINITY,
                slope: f64::NAN,
            });
        } else {
            let trial = Trial {
                step,
                slope: gradient.dot(direction),
                x,
                energy,
                gradient,
            };
            if !sufficient(&trial) || (lo.step > 0.0 && trial.energy > lo.energy) {
                hi = Some(trial.bound());
            } else {
                if trial.slope.abs() <= -CURVATURE * slope0 {
                    return LineSearch::Accepted(trial);
                }
                let flips = match hi {
                    Some(h) => trial.slope * (h.step - trial.step) >= 0.0,
                    None => trial.slope >= 0.0,
                };
                if flips {
                    hi = Some(lo.bound());
                }
                lo = trial;
            }
        }

        step = match hi {
            None if lo.step >= max_step => break,
            None => (lo.step * EXTRAPOLATION).min(max_step),
            Some(h) => {
                if (h.step - lo.step).abs() <= f64::EPSILON * h.step.max(lo.step) {
                    break;
                }
                interpolate(&lo.bound(), &h)
            }
        };
    }

    if lo.step > 0.0 {
        LineSearch::Accepted(lo)
    } else {
        LineSearch::Stalled
    }
}

/// Minimizer of the cubic through both bracket ends, kept at least a tenth of
/// the bracket away from either end.
fn interpolate(lo: &Bound, hi: &Bound) -> f64 {
    let width = hi.step - lo.step;
    let lower = lo.step.min(hi.step) + 0.1 * width.abs();
    let upper = lo.step.max(hi.step) - 0.1 * width.abs();
    if !hi.energy.is_finite() {
        return lo.step + 0.1 * width;
    }

    let d1 = lo.slope + hi.slope - 3.0 * (lo.energy - hi.energy) / (lo.step - hi.step);
    let discriminant = d1 * d1 - lo.slope * hi.slope;
    let candidate = if discriminant >= 0.0 {
        let d2 = width.signum() * discriminant.sqrt();
        hi.step - width * (hi.slope + d2 - d1) / (hi.slope - lo.slope + 2.0 * d2)
    } else {
        f64::NAN
    };

    if candidate.is_finite() {
        candidate.clamp(lower, upper)
    } else {
        lo.step + 0.5 * width
    }
}

fn is_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}

fn energy_converged(previous: f64, current: f64, tolerance: f64) -> bool {
    2.0 * (current - previous).abs() <= tolerance * (current.abs() + previous.abs() + f64::EPSILON)
}

fn gradient_converged(point: &Trial, tolerance: f64) -> bool {
    let scaled = point
        .gradient
        .iter()
        .zip(point.x.iter())
        .map(|(g, x)| g.abs() * x.abs().max(1.0))
        .fold(0.0, f64::max);
    scaled / point.energy.max(1.0) < tolerance
}
