/// Box-constrained Levenberg–Marquardt for small dense least-squares problems
///
/// **Problem**: minimize ½‖r(x)‖² over x ∈ [lb, ub] for a residual function
/// r: ℝᵐ → ℝⁿ whose Jacobian is not available analytically.
///
/// **Algorithm** (Madsen, Nielsen & Tingleff, "Methods for Non-Linear Least
/// Squares Problems"):
///
/// ```text
/// J ≈ forward differences of r
/// A = JᵀJ,  g = Jᵀr,  μ = τ·max diag(A),  ν = 2
/// Loop k = 1, 2, ...
///   solve (A + μI) δ = -g
///   x' = clamp(x + δ, lb, ub)
///   ρ = (‖r‖² - ‖r'‖²) / δᵀ(μδ - g)      gain ratio
///   ρ > 0: accept, refresh J, μ ← μ·max(1/3, 1-(2ρ-1)³), ν ← 2
///   else : reject, μ ← μν, ν ← 2ν
/// ```
///
/// Bounds are handled by projection: trial points and finite-difference
/// probes are kept inside the box, so the residual function never sees an
/// infeasible parameter vector.
///
/// # References
/// - Madsen, Nielsen & Tingleff (2004), IMM lecture notes
/// - Lourakis, "levmar: Levenberg-Marquardt nonlinear least squares
///   algorithms in C/C++" (option/termination vocabulary)
use nalgebra::{Cholesky, DMatrix, DVector};

/// Finite-difference scheme for the Jacobian columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// One extra evaluation per column; first-order accurate
    Forward,
    /// Two extra evaluations per column; second-order accurate
    Central,
}

/// Configuration for the Levenberg–Marquardt driver
#[derive(Debug, Clone)]
pub struct LevmarConfig {
    /// Trust-region initialization scale τ: μ₀ = τ·max diag(JᵀJ)
    pub tau: f64,

    /// Gradient tolerance: stop when ‖Jᵀr‖_∞ ≤ eps1
    pub eps1: f64,

    /// Step tolerance: stop when ‖δ‖ ≤ eps2·(‖x‖ + eps2)
    pub eps2: f64,

    /// Objective tolerance: stop when ‖r‖² ≤ eps3
    pub eps3: f64,

    /// Forward-difference step scale
    pub delta: f64,

    /// Maximum outer iterations
    pub max_iterations: usize,

    /// Optional per-parameter finite-difference scales; the probe step for
    /// parameter j is `delta · fd_scale[j]` instead of `delta · max(|x_j|, 1)`
    pub fd_scale: Option<Vec<f64>>,

    /// Finite-difference scheme
    pub diff_mode: DiffMode,
}

impl Default for LevmarConfig {
    fn default() -> Self {
        Self {
            tau: 1e-3,
            eps1: 1e-12,
            eps2: 1e-12,
            eps3: 1e-12,
            delta: 1e-6,
            max_iterations: 100,
            fd_scale: None,
            diff_mode: DiffMode::Forward,
        }
    }
}

/// Why the iteration stopped
///
/// Discriminants follow the levmar termination codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// ‖Jᵀr‖_∞ below the gradient tolerance
    SmallGradient = 1,
    /// Step norm below the step tolerance
    SmallStep = 2,
    /// Iteration budget exhausted
    MaxIterations = 3,
    /// Normal-equations matrix could not be factored even after damping
    SingularMatrix = 4,
    /// Damping grew without producing any error reduction
    NoReduction = 5,
    /// ‖r‖² below the objective tolerance
    SmallCost = 6,
    /// Residual produced non-finite values
    InvalidValues = 7,
}

/// Statistics from a Levenberg–Marquardt run
#[derive(Debug, Clone)]
pub struct LevmarReport {
    /// ½‖r(x₀)‖²
    pub initial_cost: f64,
    /// ½‖r(x*)‖²
    pub final_cost: f64,
    /// ‖Jᵀr‖_∞ at the final iterate
    pub grad_inf: f64,
    /// ‖δ‖ of the last accepted step
    pub step_norm: f64,
    /// Final damping parameter μ
    pub mu: f64,
    /// Outer iterations performed
    pub iterations: usize,
    /// Termination cause
    pub stop: StopReason,
    /// Residual evaluations (including finite-difference probes)
    pub n_fev: usize,
    /// Jacobian (finite-difference) builds
    pub n_jac: usize,
    /// Linear systems solved
    pub n_solve: usize,
}

/// Clamp a vector into the box, component-wise
fn project(x: &mut [f64], lower: Option<&[f64]>, upper: Option<&[f64]>) {
    if let Some(lb) = lower {
        for (xi, &l) in x.iter_mut().zip(lb.iter()) {
            if *xi < l {
                *xi = l;
            }
        }
    }
    if let Some(ub) = upper {
        for (xi, &u) in x.iter_mut().zip(ub.iter()) {
            if *xi > u {
                *xi = u;
            }
        }
    }
}

/// Minimize ½‖r(x)‖² over the box [lower, upper]
///
/// # Arguments
/// * `residual` - Fills `out` with r(x); an `Err` aborts the run immediately
/// * `x` - In: starting point (must satisfy the bounds). Out: the minimizer
/// * `n_residuals` - Residual dimension n
/// * `lower`, `upper` - Optional per-parameter bounds
/// * `config` - Tolerances and budgets
///
/// # Determinism
/// The iteration is entirely deterministic: identical inputs produce the
/// identical iterate sequence, report, and minimizer.
#[allow(non_snake_case)]
pub fn minimize<F>(
    residual: &mut F,
    x: &mut [f64],
    n_residuals: usize,
    lower: Option<&[f64]>,
    upper: Option<&[f64]>,
    config: &LevmarConfig,
) -> Result<LevmarReport, String>
where
    F: FnMut(&[f64], &mut [f64]) -> Result<(), String>,
{
    let m = x.len();
    let n = n_residuals;
    if m == 0 {
        return Err("Levenberg-Marquardt called with an empty parameter vector.".to_string());
    }
    if n == 0 {
        return Err("Levenberg-Marquardt called with an empty residual vector.".to_string());
    }
    if let Some(lb) = lower {
        if lb.len() != m {
            return Err("Lower bound length does not match parameter count.".to_string());
        }
    }
    if let Some(ub) = upper {
        if ub.len() != m {
            return Err("Upper bound length does not match parameter count.".to_string());
        }
    }
    if let (Some(lb), Some(ub)) = (lower, upper) {
        for j in 0..m {
            if lb[j] > ub[j] {
                return Err(format!(
                    "Invalid bounds for parameter {}: lower {} exceeds upper {}.",
                    j, lb[j], ub[j]
                ));
            }
        }
    }
    if let Some(scales) = &config.fd_scale {
        if scales.len() != m {
            return Err("Finite-difference scale length does not match parameter count.".to_string());
        }
    }

    project(x, lower, upper);

    let mut n_fev = 0usize;
    let mut n_jac = 0usize;
    let mut n_solve = 0usize;

    let mut r = vec![0.0; n];
    residual(x, &mut r)?;
    n_fev += 1;
    if r.iter().any(|v| !v.is_finite()) {
        return Err("Residual returned non-finite values at the starting point.".to_string());
    }

    let mut cost = r.iter().map(|v| v * v).sum::<f64>();
    let initial_cost = 0.5 * cost;

    // Probe step for parameter j, kept inside the box
    let fd_step = |x: &[f64], j: usize| -> f64 {
        let mut h = match &config.fd_scale {
            Some(scales) => config.delta * scales[j].abs(),
            None => config.delta * x[j].abs().max(1.0),
        };
        if h == 0.0 {
            h = config.delta;
        }
        if let Some(ub) = upper {
            if x[j] + h > ub[j] {
                h = -h;
            }
        }
        if let Some(lb) = lower {
            if x[j] + h < lb[j] {
                h = 0.0; // degenerate box; column stays zero
            }
        }
        h
    };

    // Central differences need both probes inside the box; fall back to the
    // one-sided scheme at an active bound
    let central_feasible = |x: &[f64], j: usize, h: f64| -> bool {
        let lo_ok = lower.map_or(true, |lb| x[j] - h.abs() >= lb[j]);
        let hi_ok = upper.map_or(true, |ub| x[j] + h.abs() <= ub[j]);
        lo_ok && hi_ok
    };

    let build_jacobian = |x: &[f64],
                          r0: &[f64],
                          residual: &mut F,
                          n_fev: &mut usize|
     -> Result<DMatrix<f64>, String> {
        let mut J = DMatrix::zeros(n, m);
        let mut probe = vec![0.0; n];
        let mut probe_back = vec![0.0; n];
        let mut xp = x.to_vec();
        for j in 0..m {
            let h = fd_step(x, j);
            if h == 0.0 {
                continue;
            }

            if config.diff_mode == DiffMode::Central && central_feasible(x, j, h) {
                xp[j] = x[j] + h.abs();
                residual(&xp, &mut probe)?;
                xp[j] = x[j] - h.abs();
                residual(&xp, &mut probe_back)?;
                *n_fev += 2;
                for i in 0..n {
                    J[(i, j)] = (probe[i] - probe_back[i]) / (2.0 * h.abs());
                }
            } else {
                xp[j] = x[j] + h;
                residual(&xp, &mut probe)?;
                *n_fev += 1;
                for i in 0..n {
                    J[(i, j)] = (probe[i] - r0[i]) / h;
                }
            }
            xp[j] = x[j];
        }
        Ok(J)
    };

    let finish = |stop: StopReason,
                  cost: f64,
                  grad_inf: f64,
                  step_norm: f64,
                  mu: f64,
                  iterations: usize,
                  n_fev: usize,
                  n_jac: usize,
                  n_solve: usize| LevmarReport {
        initial_cost,
        final_cost: 0.5 * cost,
        grad_inf,
        step_norm,
        mu,
        iterations,
        stop,
        n_fev,
        n_jac,
        n_solve,
    };

    // Already converged at the starting point
    if cost <= config.eps3 {
        return Ok(finish(StopReason::SmallCost, cost, 0.0, 0.0, 0.0, 0, n_fev, n_jac, n_solve));
    }

    let mut J = build_jacobian(x, &r, residual, &mut n_fev)?;
    n_jac += 1;

    let mut A = J.transpose() * &J;
    let mut g = J.transpose() * DVector::from_column_slice(&r);

    let mut mu = config.tau * (0..m).map(|j| A[(j, j)]).fold(0.0, f64::max);
    if mu <= 0.0 {
        mu = config.tau;
    }
    let mut nu = 2.0;
    let mut step_norm = 0.0;

    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;

        let grad_inf = g.amax();
        if grad_inf <= config.eps1 {
            return Ok(finish(
                StopReason::SmallGradient,
                cost,
                grad_inf,
                step_norm,
                mu,
                iterations - 1,
                n_fev,
                n_jac,
                n_solve,
            ));
        }

        // Damped normal equations (A + μI) δ = -g
        let mut damped = A.clone();
        for j in 0..m {
            damped[(j, j)] += mu;
        }
        n_solve += 1;
        let delta = match Cholesky::new(damped) {
            Some(chol) => chol.solve(&(-&g)),
            None => {
                // Increase damping and retry once before giving up
                mu *= nu;
                nu *= 2.0;
                let mut retry = A.clone();
                for j in 0..m {
                    retry[(j, j)] += mu;
                }
                n_solve += 1;
                match Cholesky::new(retry) {
                    Some(chol) => chol.solve(&(-&g)),
                    None => {
                        return Ok(finish(
                            StopReason::SingularMatrix,
                            cost,
                            grad_inf,
                            step_norm,
                            mu,
                            iterations,
                            n_fev,
                            n_jac,
                            n_solve,
                        ));
                    }
                }
            }
        };

        // Project the trial point onto the box; the effective step is what
        // remains after clamping
        let mut x_new = x.to_vec();
        for j in 0..m {
            x_new[j] += delta[j];
        }
        project(&mut x_new, lower, upper);

        let eff: Vec<f64> = (0..m).map(|j| x_new[j] - x[j]).collect();
        let eff_norm = eff.iter().map(|v| v * v).sum::<f64>().sqrt();
        let x_norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if eff_norm <= config.eps2 * (x_norm + config.eps2) {
            return Ok(finish(
                StopReason::SmallStep,
                cost,
                grad_inf,
                eff_norm,
                mu,
                iterations,
                n_fev,
                n_jac,
                n_solve,
            ));
        }

        let mut r_new = vec![0.0; n];
        residual(&x_new, &mut r_new)?;
        n_fev += 1;

        if r_new.iter().any(|v| !v.is_finite()) {
            return Ok(finish(
                StopReason::InvalidValues,
                cost,
                grad_inf,
                eff_norm,
                mu,
                iterations,
                n_fev,
                n_jac,
                n_solve,
            ));
        }

        let cost_new = r_new.iter().map(|v| v * v).sum::<f64>();

        // Gain ratio against the damped quadratic model
        let eff_vec = DVector::from_column_slice(&eff);
        let predicted = eff_vec.dot(&(&eff_vec * mu - &g));
        let rho = if predicted > 0.0 {
            (cost - cost_new) / predicted
        } else {
            -1.0
        };

        if rho > 0.0 {
            // Accept the step
            x.copy_from_slice(&x_new);
            r = r_new;
            cost = cost_new;
            step_norm = eff_norm;

            if cost <= config.eps3 {
                return Ok(finish(
                    StopReason::SmallCost,
                    cost,
                    grad_inf,
                    step_norm,
                    mu,
                    iterations,
                    n_fev,
                    n_jac,
                    n_solve,
                ));
            }

            J = build_jacobian(x, &r, residual, &mut n_fev)?;
            n_jac += 1;
            A = J.transpose() * &J;
            g = J.transpose() * DVector::from_column_slice(&r);

            let shrink: f64 = 1.0 - (2.0 * rho - 1.0).powi(3);
            mu *= shrink.max(1.0 / 3.0);
            nu = 2.0;
        } else {
            // Reject: inflate damping
            mu *= nu;
            nu *= 2.0;
            if !mu.is_finite() {
                return Ok(finish(
                    StopReason::NoReduction,
                    cost,
                    grad_inf,
                    step_norm,
                    mu,
                    iterations,
                    n_fev,
                    n_jac,
                    n_solve,
                ));
            }
        }
    }

    let grad_inf = g.amax();
    Ok(finish(
        StopReason::MaxIterations,
        cost,
        grad_inf,
        step_norm,
        mu,
        config.max_iterations,
        n_fev,
        n_jac,
        n_solve,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_least_squares() {
        // r(x) = [x0 - 3, x1 + 1] has the unique minimizer (3, -1)
        let mut residual = |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            out[0] = x[0] - 3.0;
            out[1] = x[1] + 1.0;
            Ok(())
        };
        let mut x = vec![0.0, 0.0];
        let report = minimize(&mut residual, &mut x, 2, None, None, &LevmarConfig::default()).unwrap();

        assert_relative_eq!(x[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(x[1], -1.0, epsilon = 1e-8);
        assert!(report.final_cost < 1e-12);
    }

    #[test]
    fn test_rosenbrock_residuals() {
        // Rosenbrock in least-squares form: r = [10(x1 - x0²), 1 - x0]
        let mut residual = |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            out[0] = 10.0 * (x[1] - x[0] * x[0]);
            out[1] = 1.0 - x[0];
            Ok(())
        };
        let mut x = vec![-1.2, 1.0];
        let config = LevmarConfig {
            max_iterations: 200,
            ..LevmarConfig::default()
        };
        let report = minimize(&mut residual, &mut x, 2, None, None, &config).unwrap();

        assert_relative_eq!(x[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-6);
        assert!(report.n_fev > 0 && report.n_jac > 0 && report.n_solve > 0);
    }

    #[test]
    fn test_converged_at_start() {
        let mut residual = |_x: &[f64], out: &mut [f64]| -> Result<(), String> {
            out[0] = 0.0;
            Ok(())
        };
        let mut x = vec![5.0];
        let report = minimize(&mut residual, &mut x, 1, None, None, &LevmarConfig::default()).unwrap();

        assert_eq!(report.stop, StopReason::SmallCost);
        assert_eq!(report.iterations, 0);
        assert_relative_eq!(x[0], 5.0, epsilon = 0.0);
    }

    #[test]
    fn test_active_upper_bound() {
        // Unconstrained minimizer at x = 3, box caps it at 0.9
        let mut residual = |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            out[0] = x[0] - 3.0;
            Ok(())
        };
        let mut x = vec![0.5];
        let lower = vec![0.0];
        let upper = vec![0.9];
        let report = minimize(
            &mut residual,
            &mut x,
            1,
            Some(&lower),
            Some(&upper),
            &LevmarConfig::default(),
        )
        .unwrap();

        assert_eq!(x[0], 0.9);
        assert!(report.grad_inf > 0.0);
        assert!(report.grad_inf.is_finite());
    }

    #[test]
    fn test_bounds_respected_at_every_evaluation() {
        let lower = vec![0.1];
        let upper = vec![0.9];
        let lb = lower.clone();
        let ub = upper.clone();
        let mut residual = move |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            assert!(x[0] >= lb[0] && x[0] <= ub[0], "infeasible evaluation at {}", x[0]);
            out[0] = x[0] - 5.0;
            Ok(())
        };
        let mut x = vec![0.5];
        minimize(
            &mut residual,
            &mut x,
            1,
            Some(&lower),
            Some(&upper),
            &LevmarConfig::default(),
        )
        .unwrap();
        assert_eq!(x[0], 0.9);
    }

    #[test]
    fn test_callback_error_aborts() {
        let mut calls = 0;
        let mut residual = |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            calls += 1;
            if calls > 2 {
                return Err("interrupted".to_string());
            }
            out[0] = x[0] - 1.0;
            Ok(())
        };
        let mut x = vec![10.0];
        let result = minimize(&mut residual, &mut x, 1, None, None, &LevmarConfig::default());
        assert_eq!(result.unwrap_err(), "interrupted");
    }

    #[test]
    fn test_central_differences_converge() {
        let mut residual = |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            out[0] = (x[0] - 2.0).powi(2);
            Ok(())
        };
        let mut x = vec![0.0];
        let config = LevmarConfig {
            diff_mode: DiffMode::Central,
            max_iterations: 200,
            ..LevmarConfig::default()
        };
        let report = minimize(&mut residual, &mut x, 1, None, None, &config).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-3);
        assert!(report.final_cost < 1e-12);
    }

    #[test]
    fn test_central_differences_respect_bounds() {
        let lower = vec![0.0];
        let upper = vec![1.0];
        let lb = lower.clone();
        let ub = upper.clone();
        let mut residual = move |x: &[f64], out: &mut [f64]| -> Result<(), String> {
            assert!(x[0] >= lb[0] && x[0] <= ub[0]);
            out[0] = x[0] - 0.5;
            Ok(())
        };
        let mut x = vec![1.0]; // starts on the upper bound
        let config = LevmarConfig {
            diff_mode: DiffMode::Central,
            ..LevmarConfig::default()
        };
        minimize(&mut residual, &mut x, 1, Some(&lower), Some(&upper), &config).unwrap();
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut residual = |x: &[f64], out: &mut [f64]| -> Result<(), String> {
                out[0] = (x[0] - 2.0) * (x[0] + 1.0);
                out[1] = x[1] * x[1] - 4.0;
                Ok(())
            };
            let mut x = vec![0.3, 0.7];
            let report =
                minimize(&mut residual, &mut x, 2, None, None, &LevmarConfig::default()).unwrap();
            (x, report.iterations, report.n_fev)
        };

        let (x1, it1, fev1) = run();
        let (x2, it2, fev2) = run();
        assert_eq!(x1, x2);
        assert_eq!(it1, it2);
        assert_eq!(fev1, fev2);
    }
}
