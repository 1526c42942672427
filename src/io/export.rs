//! Export session: identification results to the binary plot artifact
//!
//! One frame per time index in the longest of the measured, virtual, and
//! stress timelines. Registered variables: measured nodal displacement,
//! element-averaged measured deformation gradient, element-averaged Cauchy
//! and first Piola stresses, and per virtual field its nodal displacement and
//! element-averaged deformation gradient. Time indices a store does not cover
//! emit identity (gradients) or zero (displacements, stresses).

use std::path::Path;

use nalgebra::{Matrix3, Vector3};

use super::plot::{FrameData, PlotFile, PlotVariableKind};
use crate::storage::{NodalField, RaggedTensorField};
use crate::vfm::VfmProblem;

/// Arithmetic mean of a field over one element's integration points
fn element_average(field: &RaggedTensorField, e: usize, fallback: Matrix3<f64>) -> Matrix3<f64> {
    let values = field.element(e);
    if values.is_empty() {
        return fallback;
    }
    let mut sum = Matrix3::zeros();
    for m in values {
        sum += m;
    }
    sum / values.len() as f64
}

/// Element averages for a whole field, with a fallback for absent data
fn averaged(field: Option<&RaggedTensorField>, n_elems: usize, fallback: Matrix3<f64>) -> Vec<Matrix3<f64>> {
    match field {
        Some(field) => (0..n_elems)
            .map(|e| element_average(field, e, fallback))
            .collect(),
        None => vec![fallback; n_elems],
    }
}

/// Nodal values of a field, zeros when absent
fn nodal(field: Option<&NodalField>, n_nodes: usize) -> Vec<Vector3<f64>> {
    match field {
        Some(field) => field.iter().copied().collect(),
        None => vec![Vector3::zeros(); n_nodes],
    }
}

fn vf_name(base: &str, idx: usize, total: usize) -> String {
    if total > 1 {
        format!("{} #{}", base, idx)
    } else {
        base.to_string()
    }
}

/// Write the full plot artifact for a prepared (and usually solved) problem
pub fn export_problem<P: AsRef<Path>>(problem: &VfmProblem, path: P) -> Result<(), String> {
    let state = &problem.state;
    let n_nodes = problem.facts.n_nodes;
    let n_elems = problem.facts.n_elems;
    let n_vf = state.virtuals.num_fields();

    let meas_times = state.measured.num_frames();
    let def_times = state.def.num_frames();
    let stress_times = state.stresses.num_frames();

    let mut max_times = meas_times.max(def_times).max(stress_times);
    for v in 0..n_vf {
        max_times = max_times
            .max(state.virtuals.num_frames(v))
            .max(state.vdef.num_frames(v));
    }
    if max_times == 0 {
        return Err("No frames available for export.".to_string());
    }

    let mut plot = PlotFile::create(&path, n_nodes, n_elems)?;
    plot.add_variable("displacement", PlotVariableKind::NodeVector)?;
    plot.add_variable("measured deformation gradient", PlotVariableKind::ElementTensor)?;
    plot.add_variable("cauchy stress", PlotVariableKind::ElementSymTensor)?;
    plot.add_variable("first piola stress", PlotVariableKind::ElementTensor)?;
    for v in 0..n_vf {
        plot.add_variable(
            &vf_name("virtual displacement", v, n_vf),
            PlotVariableKind::NodeVector,
        )?;
        plot.add_variable(
            &vf_name("virtual deformation gradient", v, n_vf),
            PlotVariableKind::ElementTensor,
        )?;
    }

    for t in 0..max_times {
        let displacement = nodal(
            (t < meas_times).then(|| &state.measured.frame(t).u),
            n_nodes,
        );
        let def_avg = averaged(
            (t < def_times).then(|| state.def.frame(t)),
            n_elems,
            Matrix3::identity(),
        );
        let (sigma_avg, piola_avg) = if t < stress_times {
            let frame = state.stresses.frame(t);
            (
                averaged(Some(&frame.sigma), n_elems, Matrix3::zeros()),
                averaged(Some(&frame.piola), n_elems, Matrix3::zeros()),
            )
        } else {
            (
                vec![Matrix3::zeros(); n_elems],
                vec![Matrix3::zeros(); n_elems],
            )
        };

        // Virtual fields: single-frame fields are pinned to frame 0
        let mut virtual_nodal = Vec::with_capacity(n_vf);
        let mut virtual_avg = Vec::with_capacity(n_vf);
        for v in 0..n_vf {
            let disp_frames = state.virtuals.num_frames(v);
            let disp_t = if disp_frames == 1 {
                Some(0)
            } else if t < disp_frames {
                Some(t)
            } else {
                None
            };
            virtual_nodal.push(nodal(
                disp_t.map(|tt| &state.virtuals.frame(v, tt).u),
                n_nodes,
            ));

            let def_frames = state.vdef.num_frames(v);
            let def_t = if def_frames == 1 {
                Some(0)
            } else if t < def_frames {
                Some(t)
            } else {
                None
            };
            virtual_avg.push(averaged(
                def_t.map(|tt| state.vdef.frame(v, tt)),
                n_elems,
                Matrix3::identity(),
            ));
        }

        let mut data: Vec<FrameData> = Vec::with_capacity(4 + 2 * n_vf);
        data.push(FrameData::NodeVector(&displacement));
        data.push(FrameData::ElementTensor(&def_avg));
        data.push(FrameData::ElementSymTensor(&sigma_avg));
        data.push(FrameData::ElementTensor(&piola_avg));
        for v in 0..n_vf {
            data.push(FrameData::NodeVector(&virtual_nodal[v]));
            data.push(FrameData::ElementTensor(&virtual_avg[v]));
        }

        plot.write_frame(t as f64, &data)?;
    }

    plot.finish()?;
    crate::diag::info(&format!(
        "Exported plot results to {}",
        path.as_ref().display()
    ));
    Ok(())
}
