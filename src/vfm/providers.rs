use nalgebra::{Matrix3, Vector3};

use crate::fem::{reference_gradients, Hex20Basis, Hex8Basis, Tet10Basis, Tet4Basis};
use crate::material::{CauchyEval, MaterialSystem};
use crate::mesh::{ElementKind, Mesh, MeshFacts};

/// Shape-function access contract of the mesh collaborator
///
/// Supplies, for element `e` and integration point `g`, the element's node
/// indices and the reference-configuration shape-function gradients ∇ₓNₐ.
/// Implementations must be pure lookups: the reconstructor calls them in a
/// fixed order and expects bit-identical answers across calls.
pub trait ShapeProvider {
    /// Dense node indices of element `e`, in the element's canonical order
    fn elem_nodes(&self, e: usize) -> &[usize];

    /// ∇ₓNₐ at integration point `g` of element `e`, one entry per node
    fn grad_n(&self, e: usize, g: usize) -> Result<Vec<Vector3<f64>>, String>;
}

/// Constitutive evaluation contract of the material collaborator
///
/// Given an element, an integration point, and an injected deformation
/// gradient, produce the Cauchy response from a *cloned* material point. The
/// coupled/uncoupled distinction is carried by [`CauchyEval`]; the mesh's own
/// material-point history must remain untouched.
pub trait MaterialProvider {
    fn eval_cauchy(&self, e: usize, g: usize, f: &Matrix3<f64>) -> Result<CauchyEval, String>;
}

/// MeshFacts carries the precomputed reference gradients, so the frozen facts
/// themselves satisfy the shape contract; this is the provider the problem
/// builder hands to the reconstructor.
impl ShapeProvider for MeshFacts {
    fn elem_nodes(&self, e: usize) -> &[usize] {
        &self.elem_nodes[e]
    }

    fn grad_n(&self, e: usize, g: usize) -> Result<Vec<Vector3<f64>>, String> {
        Ok(MeshFacts::grad_n(self, e, g).to_vec())
    }
}

/// Shape provider backed by the in-crate mesh
///
/// Recomputes gradients from the basis functions on every call; `MeshFacts`
/// serves the same answers from its build-time cache.
pub struct MeshShapeProvider<'a> {
    mesh: &'a Mesh,
}

impl<'a> MeshShapeProvider<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }
}

impl ShapeProvider for MeshShapeProvider<'_> {
    fn elem_nodes(&self, e: usize) -> &[usize] {
        &self.mesh.connectivity.elements[e].nodes
    }

    fn grad_n(&self, e: usize, g: usize) -> Result<Vec<Vector3<f64>>, String> {
        let element = &self.mesh.connectivity.elements[e];
        let nodes = self.mesh.element_nodes(e);
        let quad = element.kind.quadrature();
        let point = quad
            .points
            .get(g)
            .ok_or_else(|| {
                format!(
                    "Integration point {} out of range for element {}.",
                    g, element.id
                )
            })?;

        let (dn, j0) = match element.kind {
            ElementKind::Hex8 => (
                Hex8Basis::shape_derivatives(point).to_vec(),
                Hex8Basis::jacobian(point, &nodes),
            ),
            ElementKind::Hex20 => (
                Hex20Basis::shape_derivatives(point).to_vec(),
                Hex20Basis::jacobian(point, &nodes),
            ),
            ElementKind::Tet4 => (
                Tet4Basis::shape_derivatives(point).to_vec(),
                Tet4Basis::jacobian(&nodes),
            ),
            ElementKind::Tet10 => (
                Tet10Basis::shape_derivatives(point).to_vec(),
                Tet10Basis::jacobian(point, &nodes),
            ),
        };

        reference_gradients(&dn, &j0).map_err(|e_msg| {
            format!(
                "Reference-Jacobian evaluation failed for element {}: {}.",
                element.id, e_msg
            )
        })
    }
}

/// Material provider backed by the in-crate mesh and material system
///
/// Evaluation clones the mesh's material point at (e, g), injects the trial
/// deformation gradient, zeros the scratch fields, and evaluates the model on
/// the clone. The clone is dropped when the call returns.
pub struct MeshMaterialProvider<'a> {
    mesh: &'a Mesh,
    facts: &'a MeshFacts,
    system: &'a MaterialSystem,
}

impl<'a> MeshMaterialProvider<'a> {
    pub fn new(mesh: &'a Mesh, facts: &'a MeshFacts, system: &'a MaterialSystem) -> Self {
        Self { mesh, facts, system }
    }
}

impl MaterialProvider for MeshMaterialProvider<'_> {
    fn eval_cauchy(&self, e: usize, g: usize, f: &Matrix3<f64>) -> Result<CauchyEval, String> {
        let flat = self.facts.offset[e] + g;
        let original = self.mesh.material_points.get(flat).ok_or_else(|| {
            format!(
                "Element {} lacks material point data at integration point {}.",
                self.facts.elem_ids[e], g
            )
        })?;

        let mut clone = original.clone();
        clone.set_deformation(f);
        clone.reset_scratch();

        self.system.model.evaluate(&clone).map_err(|msg| {
            format!(
                "Stress evaluation failed in element {} at integration point {}: {}",
                self.facts.elem_ids[e], g, msg
            )
        })
    }
}
