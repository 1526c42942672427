use nalgebra::Matrix3;

use crate::mesh::MeshFacts;
use crate::storage::{StressSeries, VirtualDeformationSet};

/// Full double contraction A : B = Σ_ij A_ij B_ij on possibly non-symmetric
/// tensors
pub fn double_contraction(a: &Matrix3<f64>, b: &Matrix3<f64>) -> f64 {
    let mut s = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            s += a[(i, j)] * b[(i, j)];
        }
    }
    s
}

/// Virtual displacement gradient from a virtual deformation gradient
///
/// G = F* − I
pub fn virtual_gradient(f_star: &Matrix3<f64>) -> Matrix3<f64> {
    f_star - Matrix3::identity()
}

/// Internal virtual work assembly
///
/// For each virtual field v and time t:
///
///   W_int(v,t) = Σ_{e,g} P(t,e,g) : G(v,t',e,g) · jw[offset[e]+g]
///
/// flattened as `W[v * T + t]` with T the stress frame count. A virtual field
/// with a single frame is time-invariant (t' = 0); one with exactly T frames
/// is indexed by t' = t; any other frame count is an error.
pub fn assemble(
    facts: &MeshFacts,
    vdef: &VirtualDeformationSet,
    stresses: &StressSeries,
) -> Result<Vec<f64>, String> {
    let n_vf = vdef.num_fields();
    let n_t = stresses.num_frames();
    if n_vf == 0 || n_t == 0 {
        return Ok(Vec::new());
    }

    let mut work = vec![0.0; n_vf * n_t];

    for v in 0..n_vf {
        let vf_frames = vdef.num_frames(v);
        if vf_frames == 0 {
            return Err(format!("Virtual field {} has no time frames.", v));
        }
        let single = vf_frames == 1;
        if !single && vf_frames != n_t {
            return Err(format!(
                "Virtual field {} has {} time frames but the stress timeline has {}. \
                 A constant field must use a single frame.",
                v, vf_frames, n_t
            ));
        }

        for t in 0..n_t {
            let piola = &stresses.frame(t).piola;
            let f_star = vdef.frame(v, if single { 0 } else { t });
            if !piola.same_shape(f_star) {
                return Err(format!(
                    "Shape mismatch between stress and virtual deformation stores (field {}, frame {}).",
                    v, t
                ));
            }

            let mut acc = 0.0;
            for e in 0..facts.n_elems {
                let off = facts.offset[e];
                for g in 0..facts.gp_per_elem[e] {
                    let w = facts
                        .jw
                        .get(off + g)
                        .copied()
                        .ok_or_else(|| {
                            format!(
                                "Integration weight missing for element {}, point {}.",
                                facts.elem_ids[e], g
                            )
                        })?;
                    let p = piola.get(e, g);
                    let gmat = virtual_gradient(f_star.get(e, g));
                    acc += double_contraction(p, &gmat) * w;
                }
            }
            work[v * n_t + t] = acc;
        }
    }

    Ok(work)
}
