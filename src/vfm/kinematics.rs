use nalgebra::Matrix3;

use super::providers::ShapeProvider;
use crate::mesh::MeshFacts;
use crate::storage::{DeformationSeries, MeasuredSeries, NodalField, VirtualDeformationSet, VirtualFieldSet};

/// Deformation-gradient reconstruction from nodal displacement fields
///
/// Assembles the Total Lagrangian relation
///
///   F(e,g) = I + Σ_a u(node_of(e,a)) ⊗ ∇ₓN_a(e,g)
///
/// at every integration point of the mesh, using reference-configuration
/// shape-function gradients from the shape provider. The mesh itself is never
/// touched; results land in caller-owned tensor frames.
pub struct Kinematics;

/// F at one integration point for one nodal field
fn deformation_at(
    shp: &dyn ShapeProvider,
    u: &NodalField,
    e: usize,
    g: usize,
) -> Result<Matrix3<f64>, String> {
    let nodes = shp.elem_nodes(e);
    let grads = shp.grad_n(e, g)?;

    let mut f = Matrix3::identity();
    for (a, &node) in nodes.iter().enumerate() {
        let ua = u.get(node);
        let gr = &grads[a];
        // u ⊗ ∇N, accumulated in the fixed element-node order
        f[(0, 0)] += ua.x * gr.x;
        f[(0, 1)] += ua.x * gr.y;
        f[(0, 2)] += ua.x * gr.z;
        f[(1, 0)] += ua.y * gr.x;
        f[(1, 1)] += ua.y * gr.y;
        f[(1, 2)] += ua.y * gr.z;
        f[(2, 0)] += ua.z * gr.x;
        f[(2, 1)] += ua.z * gr.y;
        f[(2, 2)] += ua.z * gr.z;
    }
    Ok(f)
}

/// In-plane post-process for measured fields from planar experiments
///
/// Clears the out-of-plane shear entries and enforces incompressibility along
/// the out-of-plane axis: F₃₃ = 1/(F₁₁·F₂₂). Idempotent.
pub fn apply_plane_deformation(f: &mut Matrix3<f64>) {
    f[(0, 2)] = 0.0;
    f[(1, 2)] = 0.0;
    f[(2, 0)] = 0.0;
    f[(2, 1)] = 0.0;
    f[(2, 2)] = 1.0 / (f[(0, 0)] * f[(1, 1)]);
}

impl Kinematics {
    /// Fill the measured deformation series from the measured displacements
    ///
    /// `out` must already carry one frame per measured frame (mirrored by the
    /// problem builder). With `check_det` set, a non-positive det(F) aborts
    /// with a message naming the element and integration point.
    pub fn compute_measured(
        facts: &MeshFacts,
        shp: &dyn ShapeProvider,
        measured: &MeasuredSeries,
        out: &mut DeformationSeries,
        plane_deformation: bool,
        check_det: bool,
    ) -> Result<(), String> {
        if out.num_frames() != measured.num_frames() {
            return Err(format!(
                "Deformation store carries {} frames but the measured series has {}.",
                out.num_frames(),
                measured.num_frames()
            ));
        }

        for t in 0..measured.num_frames() {
            let u = &measured.frame(t).u;
            let frame = out.frame_mut(t);
            for e in 0..facts.n_elems {
                for g in 0..facts.gp_per_elem[e] {
                    let mut f = deformation_at(shp, u, e, g)?;
                    if plane_deformation {
                        apply_plane_deformation(&mut f);
                    }
                    if check_det && f.determinant() <= 0.0 {
                        return Err(format!(
                            "Non-positive det(F) in measured frame {} at element {}, integration point {}.",
                            t, facts.elem_ids[e], g
                        ));
                    }
                    frame.set(e, g, f);
                }
            }
        }
        Ok(())
    }

    /// Fill the virtual deformation set from the virtual displacement fields
    ///
    /// Virtual fields never use the plane-deformation post-process.
    pub fn compute_virtuals(
        facts: &MeshFacts,
        shp: &dyn ShapeProvider,
        virtuals: &VirtualFieldSet,
        out: &mut VirtualDeformationSet,
        check_det: bool,
    ) -> Result<(), String> {
        if out.num_fields() != virtuals.num_fields() {
            return Err(format!(
                "Virtual deformation store carries {} fields but the displacement set has {}.",
                out.num_fields(),
                virtuals.num_fields()
            ));
        }

        for v in 0..virtuals.num_fields() {
            if out.num_frames(v) != virtuals.num_frames(v) {
                return Err(format!(
                    "Virtual field {} carries {} deformation frames but {} displacement frames.",
                    v,
                    out.num_frames(v),
                    virtuals.num_frames(v)
                ));
            }
            for t in 0..virtuals.num_frames(v) {
                let u = &virtuals.frame(v, t).u;
                let frame = out.frame_mut(v, t);
                for e in 0..facts.n_elems {
                    for g in 0..facts.gp_per_elem[e] {
                        let f = deformation_at(shp, u, e, g)?;
                        if check_det && f.determinant() <= 0.0 {
                            return Err(format!(
                                "Non-positive det(F) in virtual field {} frame {} at element {}, integration point {}.",
                                v, t, facts.elem_ids[e], g
                            ));
                        }
                        frame.set(e, g, f);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshGenerator;
    use crate::vfm::providers::MeshShapeProvider;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn unit_cube_setup() -> (crate::mesh::Mesh, MeshFacts) {
        let mesh = MeshGenerator::unit_cube();
        let facts = MeshFacts::build(&mesh).unwrap();
        (mesh, facts)
    }

    #[test]
    fn test_zero_displacement_gives_identity() {
        let (mesh, facts) = unit_cube_setup();
        let shp = MeshShapeProvider::new(&mesh);

        let mut measured = MeasuredSeries::new(facts.n_nodes);
        measured.add_frame();

        let mut def = DeformationSeries::new();
        def.set_shape(&facts.gp_per_elem);
        def.add_frame();

        Kinematics::compute_measured(&facts, &shp, &measured, &mut def, false, true).unwrap();

        for g in 0..8 {
            let f = def.frame(0).get(0, g);
            for i in 0..3 {
                for j in 0..3 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_relative_eq!(f[(i, j)], expected, epsilon = 1e-13);
                }
            }
        }
    }

    #[test]
    fn test_uniform_stretch_recovered() {
        // u_x = 0.1 X ⇒ F = diag(1.1, 1, 1) at every integration point
        let (mesh, facts) = unit_cube_setup();
        let shp = MeshShapeProvider::new(&mesh);

        let mut measured = MeasuredSeries::new(facts.n_nodes);
        let t = measured.add_frame();
        for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
            measured
                .frame_mut(t)
                .u
                .set(idx, Vector3::new(0.1 * p.x, 0.0, 0.0));
        }

        let mut def = DeformationSeries::new();
        def.set_shape(&facts.gp_per_elem);
        def.add_frame();

        Kinematics::compute_measured(&facts, &shp, &measured, &mut def, false, true).unwrap();

        for g in 0..8 {
            let f = def.frame(0).get(0, g);
            assert_relative_eq!(f[(0, 0)], 1.1, epsilon = 1e-12);
            assert_relative_eq!(f[(1, 1)], 1.0, epsilon = 1e-12);
            assert_relative_eq!(f[(2, 2)], 1.0, epsilon = 1e-12);
            assert_relative_eq!(f[(0, 1)], 0.0, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_determinant_guard_names_element() {
        // u_x = -2 X inverts the element: F₁₁ = -1
        let (mesh, facts) = unit_cube_setup();
        let shp = MeshShapeProvider::new(&mesh);

        let mut measured = MeasuredSeries::new(facts.n_nodes);
        let t = measured.add_frame();
        for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
            measured
                .frame_mut(t)
                .u
                .set(idx, Vector3::new(-2.0 * p.x, 0.0, 0.0));
        }

        let mut def = DeformationSeries::new();
        def.set_shape(&facts.gp_per_elem);
        def.add_frame();

        let err =
            Kinematics::compute_measured(&facts, &shp, &measured, &mut def, false, true).unwrap_err();
        assert!(err.contains("Non-positive det(F)"));
        assert!(err.contains("element 1"));
    }

    #[test]
    fn test_plane_deformation_idempotent() {
        let mut f = Matrix3::new(1.2, 0.1, 0.3, 0.05, 0.9, 0.2, 0.1, 0.2, 1.4);
        apply_plane_deformation(&mut f);
        let once = f;
        apply_plane_deformation(&mut f);

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(f[(i, j)], once[(i, j)], epsilon = 0.0);
            }
        }
        assert_relative_eq!(once[(2, 2)], 1.0 / (1.2 * 0.9), epsilon = 1e-14);
        assert_relative_eq!(once[(0, 2)], 0.0, epsilon = 0.0);
    }

    #[test]
    fn test_virtual_fields_skip_plane_mode() {
        // A virtual field with out-of-plane shear keeps it
        let (mesh, facts) = unit_cube_setup();
        let shp = MeshShapeProvider::new(&mesh);

        let mut virtuals = VirtualFieldSet::new(facts.n_nodes, 1);
        let t = virtuals.add_frame(0);
        for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
            virtuals
                .frame_mut(0, t)
                .u
                .set(idx, Vector3::new(0.2 * p.z, 0.0, 0.0));
        }

        let mut vdef = VirtualDeformationSet::new(1);
        vdef.set_shape(&facts.gp_per_elem);
        vdef.add_frame(0);

        Kinematics::compute_virtuals(&facts, &shp, &virtuals, &mut vdef, true).unwrap();
        let f = vdef.frame(0, 0).get(0, 0);
        assert_relative_eq!(f[(0, 2)], 0.2, epsilon = 1e-12);
    }
}
