//! Canonical admissible virtual displacement fields
//!
//! Helpers that fill a [`VirtualFieldSet`] with the fields used in practice:
//! rigid translations, uniform extensions, simple shears, and general linear
//! fields u*(X) = G·X. These are kinematically admissible weighting functions,
//! not solutions of any physical problem; they exist so synthetic studies and
//! tests state their weighting in one line instead of a node loop.

use nalgebra::{Matrix3, Vector3};

use crate::mesh::Mesh;
use crate::storage::VirtualFieldSet;

/// Append `frames` identical rigid-translation frames to field `v`
///
/// u*(X) = t at every node; the virtual gradient vanishes, so the field
/// weighs external work only.
pub fn fill_rigid_translation(
    set: &mut VirtualFieldSet,
    v: usize,
    frames: usize,
    translation: &Vector3<f64>,
) {
    let n_nodes = set.num_nodes();
    for _ in 0..frames {
        let t = set.add_frame(v);
        let frame = set.frame_mut(v, t);
        for i in 0..n_nodes {
            frame.u.set(i, *translation);
        }
    }
}

/// Append `frames` identical linear-field frames u*(X) = G·X to field `v`
pub fn fill_linear(
    mesh: &Mesh,
    set: &mut VirtualFieldSet,
    v: usize,
    frames: usize,
    gradient: &Matrix3<f64>,
) {
    for _ in 0..frames {
        let t = set.add_frame(v);
        let frame = set.frame_mut(v, t);
        for (i, p) in mesh.geometry.nodes.iter().enumerate() {
            frame.u.set(i, gradient * p.coords);
        }
    }
}

/// Append uniform-extension frames along `axis`: u*_axis(X) = X_axis
///
/// The virtual gradient is e_axis ⊗ e_axis; on the block meshes the positive
/// face along `axis` sees a unit translation, which is the rigid-grip
/// weighting the external-work assembler expects.
pub fn fill_uniform_extension(mesh: &Mesh, set: &mut VirtualFieldSet, v: usize, frames: usize, axis: usize) {
    let mut g = Matrix3::zeros();
    g[(axis, axis)] = 1.0;
    fill_linear(mesh, set, v, frames, &g);
}

/// Append simple-shear frames: u*_u_axis(X) = γ · X_grad_axis
pub fn fill_simple_shear(
    mesh: &Mesh,
    set: &mut VirtualFieldSet,
    v: usize,
    frames: usize,
    u_axis: usize,
    grad_axis: usize,
    gamma: f64,
) {
    let mut g = Matrix3::zeros();
    g[(u_axis, grad_axis)] = gamma;
    fill_linear(mesh, set, v, frames, &g);
}
