use nalgebra::Point3;

use super::surfaces::NamedSurfaces;
use super::topology::Connectivity;
use crate::material::MaterialPoint;

/// Geometric information for the mesh
///
/// Node coordinates are reference-configuration positions; external node ids
/// are the opaque integers used by the surrounding ecosystem (input files,
/// surface definitions) and are mapped to dense indices once by `MeshFacts`.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    /// Node coordinates (dense index order)
    pub nodes: Vec<Point3<f64>>,
    /// External node identifiers, parallel to `nodes`
    pub node_ids: Vec<i32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_ids: Vec::new(),
        }
    }

    /// Add a node with an external id; returns its dense index
    pub fn add_node(&mut self, id: i32, x: f64, y: f64, z: f64) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Point3::new(x, y, z));
        self.node_ids.push(id);
        idx
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Complete mesh: geometry, connectivity, named surfaces, and the
/// per-integration-point material state owned by the mesh
///
/// `material_points` is indexed by the same element-major offset layout as
/// `MeshFacts` (`offset[e] + g`). It represents the mesh ecosystem's own
/// material-point history; the identification pipeline only ever clones
/// entries out of it.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub geometry: Geometry,
    pub connectivity: Connectivity,
    pub surfaces: NamedSurfaces,
    pub material_points: Vec<MaterialPoint>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            geometry: Geometry::new(),
            connectivity: Connectivity::new(),
            surfaces: NamedSurfaces::new(),
            material_points: Vec::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.geometry.num_nodes()
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.num_elements()
    }

    /// Allocate one reference-state material point per integration point
    ///
    /// Called once after connectivity is final; re-calling resets the
    /// mesh-side material history to the reference state.
    pub fn init_material_points(&mut self) {
        let total = self.connectivity.total_gauss_points();
        self.material_points = vec![MaterialPoint::reference(); total];
    }

    /// Reference coordinates of an element's nodes, in connectivity order
    pub fn element_nodes(&self, e: usize) -> Vec<Point3<f64>> {
        self.connectivity.elements[e]
            .nodes
            .iter()
            .map(|&n| self.geometry.nodes[n])
            .collect()
    }
}
