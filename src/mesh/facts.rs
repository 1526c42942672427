use std::collections::HashMap;

use nalgebra::Vector3;

use super::geometry::Mesh;
use super::topology::ElementKind;
use crate::fem::{reference_gradients, Hex20Basis, Hex8Basis, Tet10Basis, Tet4Basis};

/// Frozen mesh topology and quadrature facts
///
/// Built once from the mesh at setup and immutable afterwards. Tensor stores
/// reference this shape; nothing here ever points back at them.
///
/// The ragged element×integration-point layout is CSR-like: data for element
/// `e` lives at flat positions `offset[e] .. offset[e] + gp_per_elem[e]`, and
/// `offset[n_elems]` is the total integration-point count.
#[derive(Debug, Clone)]
pub struct MeshFacts {
    /// Number of mesh nodes
    pub n_nodes: usize,
    /// Number of solid elements
    pub n_elems: usize,
    /// External node id → dense node index
    pub node_id2idx: HashMap<i32, usize>,
    /// External element id → dense element index
    pub elem_id2idx: HashMap<i32, usize>,
    /// Dense node indices per element, in connectivity order
    pub elem_nodes: Vec<Vec<usize>>,
    /// External element ids, dense order
    pub elem_ids: Vec<i32>,
    /// Integration-point count per element (ragged)
    pub gp_per_elem: Vec<usize>,
    /// Prefix sums over `gp_per_elem`, length `n_elems + 1`
    pub offset: Vec<usize>,
    /// det(J₀(e,g)) · w_g per integration point, flat offset layout
    pub jw: Vec<f64>,
    /// Reference-configuration shape-function gradients ∇ₓNₐ per integration
    /// point (flat offset layout, one entry per element node)
    grad_n: Vec<Vec<Vector3<f64>>>,
}

impl MeshFacts {
    /// Derive the frozen facts from a mesh
    ///
    /// Fails when an external node or element id is duplicated, or when any
    /// integration point carries a non-positive reference volume contribution
    /// (inverted or degenerate element geometry).
    pub fn build(mesh: &Mesh) -> Result<Self, String> {
        let n_nodes = mesh.num_nodes();
        let n_elems = mesh.num_elements();

        let mut node_id2idx = HashMap::with_capacity(n_nodes);
        for (idx, &id) in mesh.geometry.node_ids.iter().enumerate() {
            if node_id2idx.insert(id, idx).is_some() {
                return Err(format!("Duplicate node id {} in mesh.", id));
            }
        }

        let mut elem_id2idx = HashMap::with_capacity(n_elems);
        let mut elem_nodes = Vec::with_capacity(n_elems);
        let mut elem_ids = Vec::with_capacity(n_elems);
        let mut gp_per_elem = Vec::with_capacity(n_elems);

        for (idx, el) in mesh.connectivity.elements.iter().enumerate() {
            if elem_id2idx.insert(el.id, idx).is_some() {
                return Err(format!("Duplicate element id {} in mesh.", el.id));
            }
            elem_nodes.push(el.nodes.clone());
            elem_ids.push(el.id);
            gp_per_elem.push(el.kind.num_gauss_points());
        }

        let mut offset = vec![0usize; n_elems + 1];
        for e in 0..n_elems {
            offset[e + 1] = offset[e] + gp_per_elem[e];
        }

        let total = offset[n_elems];
        let mut jw = vec![0.0; total];
        let mut grad_n = vec![Vec::new(); total];
        for (e, el) in mesh.connectivity.elements.iter().enumerate() {
            let nodes = mesh.element_nodes(e);
            let quad = el.kind.quadrature();
            for (g, (point, weight)) in quad.points.iter().zip(quad.weights.iter()).enumerate() {
                let (dn, j0) = match el.kind {
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

                let w = j0.determinant() * weight;
                if w <= 0.0 {
                    return Err(format!(
                        "Non-positive integration weight ({:.3e}) in element {} at integration point {}.",
                        w, el.id, g
                    ));
                }
                jw[offset[e] + g] = w;

                grad_n[offset[e] + g] = reference_gradients(&dn, &j0).map_err(|msg| {
                    format!(
                        "Reference-Jacobian evaluation failed for element {}: {}.",
                        el.id, msg
                    )
                })?;
            }
        }

        Ok(Self {
            n_nodes,
            n_elems,
            node_id2idx,
            elem_id2idx,
            elem_nodes,
            elem_ids,
            gp_per_elem,
            offset,
            jw,
            grad_n,
        })
    }

    /// Reference shape-function gradients at integration point (e, g)
    ///
    /// One ∇ₓNₐ per element node, in connectivity order; computed once at
    /// build time and immutable afterwards.
    pub fn grad_n(&self, e: usize, g: usize) -> &[Vector3<f64>] {
        &self.grad_n[self.offset[e] + g]
    }

    /// Total integration-point count
    pub fn total_gauss_points(&self) -> usize {
        self.offset[self.n_elems]
    }

    /// Reference volume of element `e` (sum of its jw entries)
    pub fn reference_volume(&self, e: usize) -> f64 {
        self.jw[self.offset[e]..self.offset[e + 1]].iter().sum()
    }

    /// Map an external node id to its dense index
    pub fn node_index(&self, id: i32) -> Option<usize> {
        self.node_id2idx.get(&id).copied()
    }

    /// Map an external element id to its dense index
    pub fn elem_index(&self, id: i32) -> Option<usize> {
        self.elem_id2idx.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::generator::MeshGenerator;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_cube_facts() {
        let mesh = MeshGenerator::unit_cube();
        let facts = MeshFacts::build(&mesh).unwrap();

        assert_eq!(facts.n_nodes, 8);
        assert_eq!(facts.n_elems, 1);
        assert_eq!(facts.gp_per_elem, vec![8]);
        assert_eq!(facts.offset, vec![0, 8]);
        assert_eq!(facts.total_gauss_points(), 8);

        // All jw positive and summing to the unit-cube volume
        for &w in &facts.jw {
            assert!(w > 0.0);
        }
        assert_relative_eq!(facts.reference_volume(0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_id_bijections() {
        let mesh = MeshGenerator::block(2, 1, 1, 2.0, 1.0, 1.0);
        let facts = MeshFacts::build(&mesh).unwrap();

        assert_eq!(facts.n_elems, 2);
        for (idx, &id) in facts.elem_ids.iter().enumerate() {
            assert_eq!(facts.elem_index(id), Some(idx));
        }
        for (&id, &idx) in &facts.node_id2idx {
            assert_eq!(mesh.geometry.node_ids[idx], id);
        }
    }

    #[test]
    fn test_inverted_element_rejected() {
        let mut mesh = MeshGenerator::unit_cube();
        // Swap two nodes of the hex to invert its reference Jacobian
        mesh.connectivity.elements[0].nodes.swap(0, 1);
        let err = MeshFacts::build(&mesh).unwrap_err();
        assert!(err.contains("Non-positive integration weight"));
    }

    #[test]
    fn test_block_volume_partition() {
        let mesh = MeshGenerator::block(3, 2, 2, 3.0, 2.0, 1.0);
        let facts = MeshFacts::build(&mesh).unwrap();

        let total: f64 = (0..facts.n_elems).map(|e| facts.reference_volume(e)).sum();
        assert_relative_eq!(total, 6.0, epsilon = 1e-10);
    }
}
