use super::internal_work;
use crate::diag;
use super::params::{Parameter, ParameterApplier};
use super::problem::{SolverKind, VfmProblem};
use super::providers::MeshMaterialProvider;
use super::stress::StressEval;
use crate::cancel::CancelFlag;
use crate::io::virtual_work;
use crate::linalg::levmar::{self, LevmarConfig, LevmarReport};
use crate::material::MaterialSystem;
use crate::mesh::{Mesh, MeshFacts};
use crate::storage::{DeformationSeries, StressSeries, VirtualDeformationSet};

/// Outcome of one optimization run
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Committed parameter vector
    pub theta: Vec<f64>,
    /// Residual evaluations performed (including finite-difference probes)
    pub evaluations: usize,
    /// Solver statistics; absent when there was nothing to optimize
    pub levmar: Option<LevmarReport>,
}

/// One residual evaluation: apply θ, rebuild stresses, assemble W_int
///
/// Parameter application strictly precedes stress recomputation, which
/// strictly precedes work assembly.
#[allow(clippy::too_many_arguments)]
fn evaluate_internal_work(
    mesh: &Mesh,
    facts: &MeshFacts,
    system: &mut MaterialSystem,
    params: &mut [Parameter],
    applier: &ParameterApplier,
    def: &DeformationSeries,
    vdef: &VirtualDeformationSet,
    stresses: &mut StressSeries,
    theta: &[f64],
) -> Result<Vec<f64>, String> {
    applier.apply(theta, system, params)?;
    let provider = MeshMaterialProvider::new(mesh, facts, system);
    StressEval::rebuild(def, stresses, &provider)?;
    internal_work::assemble(facts, vdef, stresses)
}

/// Run the bounded Levenberg–Marquardt identification on a prepared problem
///
/// The residual is r(θ) = W_int(θ) − W_ext, flattened over (virtual field,
/// time). On success θ* is committed to the material system and the stress
/// history reflects θ*. On any failure, including an asynchronous
/// cancellation raised through `cancel`, the parameters and stress history
/// are restored to θ₀ before the error is returned.
pub fn solve_problem(problem: &mut VfmProblem, cancel: &CancelFlag) -> Result<SolveReport, String> {
    if problem.state.params.is_empty() {
        diag::info("No parameters to optimize.");
        return Ok(SolveReport {
            theta: Vec::new(),
            evaluations: 0,
            levmar: None,
        });
    }
    if problem.external_work.is_empty() {
        diag::info("External work vector empty. Nothing to optimize.");
        return Ok(SolveReport {
            theta: problem.state.parameter_vector(),
            evaluations: 0,
            levmar: None,
        });
    }

    let applier = ParameterApplier::resolve(&problem.system, &problem.state.params)?;
    let theta0 = problem.state.parameter_vector();
    let mut theta = theta0.clone();
    let n_residuals = problem.external_work.len();

    let (lower, upper) = match problem.options.kind {
        SolverKind::ConstrainedLevmar => (
            Some(
                problem
                    .state
                    .params
                    .iter()
                    .map(|p| p.spec.lo)
                    .collect::<Vec<_>>(),
            ),
            Some(
                problem
                    .state
                    .params
                    .iter()
                    .map(|p| p.spec.hi)
                    .collect::<Vec<_>>(),
            ),
        ),
        SolverKind::Levmar => (None, None),
    };

    let config = LevmarConfig {
        tau: problem.options.tau,
        eps1: problem.options.grad_tol,
        eps2: problem.options.step_tol,
        eps3: problem.options.obj_tol,
        delta: problem.options.diff_scale,
        max_iterations: problem.options.max_iterations,
        fd_scale: Some(
            problem
                .state
                .params
                .iter()
                .map(|p| p.spec.scale.abs())
                .collect(),
        ),
        diff_mode: problem.options.diff_mode,
    };

    // Split the problem into the disjoint pieces the residual closure needs
    let VfmProblem {
        ref mesh,
        ref facts,
        ref mut system,
        ref mut state,
        ref options,
        ref external_work,
        ..
    } = *problem;
    let super::problem::VfmState {
        ref def,
        ref vdef,
        ref mut stresses,
        ref mut params,
        ..
    } = *state;

    let mut evaluations = 0usize;
    let mut latched: Option<String> = None;

    let result = {
        let mut residual = |p: &[f64], out: &mut [f64]| -> Result<(), String> {
            evaluations += 1;

            if let Some(msg) = &latched {
                out.iter_mut().for_each(|v| *v = 0.0);
                return Err(msg.clone());
            }
            if cancel.is_set() {
                let msg = "optimization interrupted".to_string();
                latched = Some(msg.clone());
                out.iter_mut().for_each(|v| *v = 0.0);
                return Err(msg);
            }

            let iw = match evaluate_internal_work(
                mesh, facts, system, params, &applier, def, vdef, stresses, p,
            ) {
                Ok(v) => v,
                Err(e) => {
                    latched = Some(e.clone());
                    out.iter_mut().for_each(|v| *v = 0.0);
                    return Err(e);
                }
            };

            if iw.len() != out.len() {
                let msg = format!(
                    "Residual dimension mismatch: internal work has {} entries, external work {}.",
                    iw.len(),
                    out.len()
                );
                latched = Some(msg.clone());
                out.iter_mut().for_each(|v| *v = 0.0);
                return Err(msg);
            }

            for (o, (i, e)) in out.iter_mut().zip(iw.iter().zip(external_work.iter())) {
                *o = i - e;
            }

            if options.log_evaluations {
                let cost = 0.5 * out.iter().map(|v| v * v).sum::<f64>();
                let values: Vec<String> = p.iter().map(|v| format!("{:.6}", v)).collect();
                diag::info(&format!(
                    "  eval {:>4}  cost = {:.6e}  theta = [{}]",
                    evaluations,
                    cost,
                    values.join(", ")
                ));
            }
            Ok(())
        };

        levmar::minimize(
            &mut residual,
            &mut theta,
            n_residuals,
            lower.as_deref(),
            upper.as_deref(),
            &config,
        )
    };

    // Restore θ₀ and its stress history; restoration errors are appended to
    // the primary message so the first cause stays visible
    let restore = |system: &mut MaterialSystem,
                   params: &mut [Parameter],
                   stresses: &mut StressSeries,
                   message: &mut String| {
        if let Err(e) = applier.apply(&theta0, system, params) {
            message.push_str(&format!(" Restore parameters: {}", e));
            return;
        }
        let provider = MeshMaterialProvider::new(mesh, facts, system);
        if let Err(e) = StressEval::rebuild(def, stresses, &provider) {
            message.push_str(&format!(" Restore stresses: {}", e));
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(mut msg) => {
            restore(system, params, stresses, &mut msg);
            return Err(msg);
        }
    };

    if let Some(mut msg) = latched {
        restore(system, params, stresses, &mut msg);
        return Err(msg);
    }

    // Commit θ*: apply once more and rebuild so export reflects the optimum
    if let Err(e) = applier.apply(&theta, system, params) {
        let mut msg = e;
        restore(system, params, stresses, &mut msg);
        return Err(msg);
    }
    {
        let provider = MeshMaterialProvider::new(mesh, facts, system);
        if let Err(e) = StressEval::rebuild(def, stresses, &provider) {
            let mut msg = e;
            restore(system, params, stresses, &mut msg);
            return Err(msg);
        }
    }

    diag::info(&diag::printers::levmar_summary(&report));
    diag::info(&diag::parameter_table(params, "Optimized parameters"));

    if let Some(path) = &options.save_virtual_work {
        let iw = internal_work::assemble(facts, vdef, stresses)?;
        virtual_work::write_csv(path, &iw, external_work, vdef.num_fields())?;
        diag::info(&diag::virtual_work_table(&iw, external_work, vdef.num_fields()));
        diag::info(&format!("Saved virtual work table to {}", path));
    }

    Ok(SolveReport {
        theta,
        evaluations,
        levmar: Some(report),
    })
}
