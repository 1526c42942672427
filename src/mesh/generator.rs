use super::geometry::Mesh;
use super::topology::{DomainClass, ElementKind, SolidElement};

/// Structured hexahedral block mesh generation
///
/// Builds nx × ny × nz hex8 grids with 1-based external node and element ids
/// and one named surface per block face ("x-", "x+", "y-", "y+", "z-", "z+").
/// Used by the CLI demo path and by the integration tests; real meshes come
/// in through the model section of the input file.
pub struct MeshGenerator;

impl MeshGenerator {
    /// Generate a single-element unit cube
    pub fn unit_cube() -> Mesh {
        Self::block(1, 1, 1, 1.0, 1.0, 1.0)
    }

    /// Generate a structured hex8 block
    ///
    /// # Arguments
    /// * `nx`, `ny`, `nz` - Cell counts along each axis (all ≥ 1)
    /// * `lx`, `ly`, `lz` - Block dimensions
    pub fn block(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Mesh {
        assert!(nx >= 1 && ny >= 1 && nz >= 1, "cell counts must be positive");
        assert!(
            lx > 0.0 && ly > 0.0 && lz > 0.0,
            "block dimensions must be positive"
        );

        let mut mesh = Mesh::new();

        let (mx, my, mz) = (nx + 1, ny + 1, nz + 1);
        let node_index = |i: usize, j: usize, k: usize| k * mx * my + j * mx + i;

        for k in 0..mz {
            for j in 0..my {
                for i in 0..mx {
                    let id = (node_index(i, j, k) + 1) as i32;
                    mesh.geometry.add_node(
                        id,
                        lx * i as f64 / nx as f64,
                        ly * j as f64 / ny as f64,
                        lz * k as f64 / nz as f64,
                    );
                }
            }
        }

        let mut element_indices = Vec::with_capacity(nx * ny * nz);
        let mut next_elem_id = 1;
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let nodes = vec![
                        node_index(i, j, k),
                        node_index(i + 1, j, k),
                        node_index(i + 1, j + 1, k),
                        node_index(i, j + 1, k),
                        node_index(i, j, k + 1),
                        node_index(i + 1, j, k + 1),
                        node_index(i + 1, j + 1, k + 1),
                        node_index(i, j + 1, k + 1),
                    ];
                    let idx = mesh
                        .connectivity
                        .add_element(SolidElement::new(next_elem_id, ElementKind::Hex8, nodes));
                    element_indices.push(idx);
                    next_elem_id += 1;
                }
            }
        }

        mesh.connectivity
            .add_domain("Part1", DomainClass::Solid, element_indices);

        // Face surfaces, external node ids
        let face_ids = |pred: &dyn Fn(usize, usize, usize) -> bool| -> Vec<i32> {
            let mut ids = Vec::new();
            for k in 0..mz {
                for j in 0..my {
                    for i in 0..mx {
                        if pred(i, j, k) {
                            ids.push((node_index(i, j, k) + 1) as i32);
                        }
                    }
                }
            }
            ids
        };

        mesh.surfaces.add("x-", face_ids(&|i, _, _| i == 0));
        mesh.surfaces.add("x+", face_ids(&|i, _, _| i == nx));
        mesh.surfaces.add("y-", face_ids(&|_, j, _| j == 0));
        mesh.surfaces.add("y+", face_ids(&|_, j, _| j == ny));
        mesh.surfaces.add("z-", face_ids(&|_, _, k| k == 0));
        mesh.surfaces.add("z+", face_ids(&|_, _, k| k == nz));

        mesh.init_material_points();
        mesh
    }

    /// Generate a structured tet4 block
    ///
    /// Each grid cell is split into six positively oriented tetrahedra that
    /// share the cell diagonal, so neighbouring cells tile conformally. Face
    /// surfaces carry the same names as the hex block.
    pub fn tet_block(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Mesh {
        let mut mesh = Self::block(nx, ny, nz, lx, ly, lz);

        // Rebuild the connectivity, replacing each hex cell by its six tets
        let hexes: Vec<Vec<usize>> = mesh
            .connectivity
            .elements
            .iter()
            .map(|e| e.nodes.clone())
            .collect();
        mesh.connectivity = crate::mesh::topology::Connectivity::new();

        // Corner labels in hex order: 0=c000 1=c100 2=c110 3=c010
        //                             4=c001 5=c101 6=c111 7=c011
        // Six tets around the c000-c111 diagonal, all positively oriented
        const SPLIT: [[usize; 4]; 6] = [
            [0, 1, 2, 6],
            [0, 5, 1, 6],
            [0, 3, 7, 6],
            [0, 2, 3, 6],
            [0, 7, 4, 6],
            [0, 4, 5, 6],
        ];

        let mut element_indices = Vec::with_capacity(hexes.len() * 6);
        let mut next_elem_id = 1;
        for hex in &hexes {
            for tet in &SPLIT {
                let nodes = tet.iter().map(|&c| hex[c]).collect();
                let idx = mesh.connectivity.add_element(SolidElement::new(
                    next_elem_id,
                    ElementKind::Tet4,
                    nodes,
                ));
                element_indices.push(idx);
                next_elem_id += 1;
            }
        }
        mesh.connectivity
            .add_domain("Part1", DomainClass::Solid, element_indices);

        mesh.init_material_points();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_cube_counts() {
        let mesh = MeshGenerator::unit_cube();
        assert_eq!(mesh.num_nodes(), 8);
        assert_eq!(mesh.num_elements(), 1);
        assert_eq!(mesh.material_points.len(), 8);
        assert_eq!(mesh.connectivity.domains.len(), 1);
    }

    #[test]
    fn test_block_counts() {
        let mesh = MeshGenerator::block(2, 3, 4, 2.0, 3.0, 4.0);
        assert_eq!(mesh.num_nodes(), 3 * 4 * 5);
        assert_eq!(mesh.num_elements(), 24);
    }

    #[test]
    fn test_face_surfaces() {
        let mesh = MeshGenerator::block(2, 2, 2, 1.0, 1.0, 1.0);
        for name in ["x-", "x+", "y-", "y+", "z-", "z+"] {
            let ids = mesh.surfaces.get(name).unwrap();
            assert_eq!(ids.len(), 9, "face {} should carry 3x3 nodes", name);
        }
    }

    #[test]
    fn test_tet_block_counts_and_volume() {
        let mesh = MeshGenerator::tet_block(2, 1, 1, 2.0, 1.0, 1.0);
        assert_eq!(mesh.num_elements(), 12);
        assert_eq!(mesh.material_points.len(), 48);

        let facts = crate::mesh::MeshFacts::build(&mesh).unwrap();
        let total: f64 = (0..facts.n_elems).map(|e| facts.reference_volume(e)).sum();
        approx::assert_relative_eq!(total, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tet_block_positive_orientation() {
        // MeshFacts rejects non-positive jw, so a successful build proves
        // every tet in the split is positively oriented
        let mesh = MeshGenerator::tet_block(3, 2, 2, 1.0, 1.0, 1.0);
        assert!(crate::mesh::MeshFacts::build(&mesh).is_ok());
    }

    #[test]
    fn test_node_coordinates() {
        let mesh = MeshGenerator::block(2, 1, 1, 4.0, 1.0, 1.0);
        // Node with id 3 sits at i = 2 on the first row: x = 4.0
        let idx = mesh.geometry.node_ids.iter().position(|&id| id == 3).unwrap();
        assert_relative_eq!(mesh.geometry.nodes[idx].x, 4.0, epsilon = 1e-15);
        assert_relative_eq!(mesh.geometry.nodes[idx].y, 0.0, epsilon = 1e-15);
    }
}
