use nalgebra::{Matrix3, Point3, Vector3};

/// Hex8 (8-node trilinear hexahedral) element basis functions
///
/// Node numbering on the bi-unit reference cube ξ, η, ζ ∈ [-1, 1]:
///
///   0: (-1, -1, -1)    4: (-1, -1, +1)
///   1: (+1, -1, -1)    5: (+1, -1, +1)
///   2: (+1, +1, -1)    6: (+1, +1, +1)
///   3: (-1, +1, -1)    7: (-1, +1, +1)
///
/// Shape functions:
///   N_a = 1/8 (1 + ξ ξ_a)(1 + η η_a)(1 + ζ ζ_a)
pub struct Hex8Basis;

/// Reference-cube corner signs for the 8 nodes
const HEX8_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

impl Hex8Basis {
    /// Evaluate all 8 shape functions at natural coordinates (ξ, η, ζ)
    ///
    /// # Arguments
    /// * `xi` - Natural coordinates [ξ, η, ζ], each in [-1, 1]
    ///
    /// # Returns
    /// Array of 8 shape function values [N0, ..., N7]
    pub fn shape_functions(xi: &[f64; 3]) -> [f64; 8] {
        let mut n = [0.0; 8];
        for (a, s) in HEX8_SIGNS.iter().enumerate() {
            n[a] = 0.125 * (1.0 + xi[0] * s[0]) * (1.0 + xi[1] * s[1]) * (1.0 + xi[2] * s[2]);
        }
        n
    }

    /// Evaluate shape function derivatives with respect to natural coordinates
    ///
    /// # Returns
    /// Array of 8 derivative vectors, each [∂N/∂ξ, ∂N/∂η, ∂N/∂ζ]
    pub fn shape_derivatives(xi: &[f64; 3]) -> [[f64; 3]; 8] {
        let mut d = [[0.0; 3]; 8];
        for (a, s) in HEX8_SIGNS.iter().enumerate() {
            d[a][0] = 0.125 * s[0] * (1.0 + xi[1] * s[1]) * (1.0 + xi[2] * s[2]);
            d[a][1] = 0.125 * s[1] * (1.0 + xi[0] * s[0]) * (1.0 + xi[2] * s[2]);
            d[a][2] = 0.125 * s[2] * (1.0 + xi[0] * s[0]) * (1.0 + xi[1] * s[1]);
        }
        d
    }

    /// Compute the reference Jacobian J_ij = ∂X_i/∂ξ_j at natural coordinates
    ///
    /// # Arguments
    /// * `xi` - Natural coordinates
    /// * `nodes` - The 8 reference node coordinates of the element
    #[allow(non_snake_case)]
    pub fn jacobian(xi: &[f64; 3], nodes: &[Point3<f64>]) -> Matrix3<f64> {
        let dN = Self::shape_derivatives(xi);
        let mut J = Matrix3::zeros();
        for a in 0..8 {
            let x = &nodes[a];
            for j in 0..3 {
                J[(0, j)] += x.x * dN[a][j];
                J[(1, j)] += x.y * dN[a][j];
                J[(2, j)] += x.z * dN[a][j];
            }
        }
        J
    }
}

/// Tet4 (4-node linear tetrahedral) element basis functions
///
/// Natural coordinates (r, s, t) with the barycentric complement
/// L0 = 1 - r - s - t:
///
///   Node 0: (0, 0, 0)
///   Node 1: (1, 0, 0)
///   Node 2: (0, 1, 0)
///   Node 3: (0, 0, 1)
///
/// Shape functions are the barycentric coordinates themselves,
/// so all natural derivatives are constant over the element.
pub struct Tet4Basis;

impl Tet4Basis {
    /// Evaluate all 4 shape functions at natural coordinates (r, s, t)
    pub fn shape_functions(xi: &[f64; 3]) -> [f64; 4] {
        [1.0 - xi[0] - xi[1] - xi[2], xi[0], xi[1], xi[2]]
    }

    /// Shape function derivatives with respect to (r, s, t)
    ///
    /// Constant for a linear tetrahedron; the `xi` argument is kept for
    /// signature symmetry with the hex basis.
    pub fn shape_derivatives(_xi: &[f64; 3]) -> [[f64; 3]; 4] {
        [
            [-1.0, -1.0, -1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Compute the reference Jacobian J_ij = ∂X_i/∂ξ_j
    #[allow(non_snake_case)]
    pub fn jacobian(nodes: &[Point3<f64>]) -> Matrix3<f64> {
        let v0 = &nodes[0];
        Matrix3::new(
            nodes[1].x - v0.x, nodes[2].x - v0.x, nodes[3].x - v0.x,
            nodes[1].y - v0.y, nodes[2].y - v0.y, nodes[3].y - v0.y,
            nodes[1].z - v0.z, nodes[2].z - v0.z, nodes[3].z - v0.z,
        )
    }
}

/// Tet10 (10-node quadratic tetrahedral) element basis functions
///
/// Node numbering:
///   Vertices: 0, 1, 2, 3
///   Edge midpoints:
///     4: edge 0-1    7: edge 0-3
///     5: edge 1-2    8: edge 1-3
///     6: edge 2-0    9: edge 2-3
///
/// Natural coordinates (r, s, t) relate to the barycentric coordinates by
/// L = [1 - r - s - t, r, s, t]; vertex functions are L_i(2L_i - 1) and edge
/// functions 4 L_i L_j.
pub struct Tet10Basis;

impl Tet10Basis {
    fn barycentric(xi: &[f64; 3]) -> [f64; 4] {
        [1.0 - xi[0] - xi[1] - xi[2], xi[0], xi[1], xi[2]]
    }

    /// Evaluate all 10 shape functions at natural coordinates (r, s, t)
    #[allow(non_snake_case)]
    pub fn shape_functions(xi: &[f64; 3]) -> [f64; 10] {
        let [L0, L1, L2, L3] = Self::barycentric(xi);
        [
            L0 * (2.0 * L0 - 1.0),
            L1 * (2.0 * L1 - 1.0),
            L2 * (2.0 * L2 - 1.0),
            L3 * (2.0 * L3 - 1.0),
            4.0 * L0 * L1,
            4.0 * L1 * L2,
            4.0 * L2 * L0,
            4.0 * L0 * L3,
            4.0 * L1 * L3,
            4.0 * L2 * L3,
        ]
    }

    /// Shape function derivatives with respect to (r, s, t)
    ///
    /// Obtained from the barycentric derivatives through
    /// ∂L0/∂r = ∂L0/∂s = ∂L0/∂t = -1 and ∂L_i/∂ξ_j = δ_ij for i ≥ 1.
    #[allow(non_snake_case)]
    pub fn shape_derivatives(xi: &[f64; 3]) -> [[f64; 3]; 10] {
        let [L0, L1, L2, L3] = Self::barycentric(xi);

        // Barycentric gradients in natural coordinates
        let dl = [
            [-1.0, -1.0, -1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];

        let mut d = [[0.0; 3]; 10];
        // Vertex nodes: d/dξ [L_i (2 L_i - 1)] = (4 L_i - 1) dL_i
        let l = [L0, L1, L2, L3];
        for i in 0..4 {
            for j in 0..3 {
                d[i][j] = (4.0 * l[i] - 1.0) * dl[i][j];
            }
        }
        // Edge nodes: d/dξ [4 L_a L_b] = 4 (L_b dL_a + L_a dL_b)
        let edges = [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)];
        for (k, &(a, b)) in edges.iter().enumerate() {
            for j in 0..3 {
                d[4 + k][j] = 4.0 * (l[b] * dl[a][j] + l[a] * dl[b][j]);
            }
        }
        d
    }

    /// Compute the reference Jacobian J_ij = ∂X_i/∂ξ_j at natural coordinates
    #[allow(non_snake_case)]
    pub fn jacobian(xi: &[f64; 3], nodes: &[Point3<f64>]) -> Matrix3<f64> {
        let dN = Self::shape_derivatives(xi);
        let mut J = Matrix3::zeros();
        for a in 0..10 {
            let x = &nodes[a];
            for j in 0..3 {
                J[(0, j)] += x.x * dN[a][j];
                J[(1, j)] += x.y * dN[a][j];
                J[(2, j)] += x.z * dN[a][j];
            }
        }
        J
    }
}

/// Hex20 (20-node serendipity hexahedral) element basis functions
///
/// Corner nodes 0-7 follow the hex8 layout; mid-edge nodes 8-19 sit on the
/// bottom ring (8-11), top ring (12-15), and vertical edges (16-19).
pub struct Hex20Basis;

/// Natural coordinates of the 20 nodes; zeros mark mid-edge axes
const HEX20_COORDS: [[f64; 3]; 20] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [0.0, -1.0, -1.0],
    [1.0, 0.0, -1.0],
    [0.0, 1.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, -1.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [-1.0, 0.0, 1.0],
    [-1.0, -1.0, 0.0],
    [1.0, -1.0, 0.0],
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
];

impl Hex20Basis {
    /// Evaluate all 20 shape functions at natural coordinates (ξ, η, ζ)
    pub fn shape_functions(xi: &[f64; 3]) -> [f64; 20] {
        let (x, y, z) = (xi[0], xi[1], xi[2]);
        let mut n = [0.0; 20];
        for (a, c) in HEX20_COORDS.iter().enumerate() {
            let (xa, ya, za) = (c[0], c[1], c[2]);
            n[a] = if a < 8 {
                // Corner: 1/8 (1+ξξa)(1+ηηa)(1+ζζa)(ξξa+ηηa+ζζa-2)
                0.125
                    * (1.0 + x * xa)
                    * (1.0 + y * ya)
                    * (1.0 + z * za)
                    * (x * xa + y * ya + z * za - 2.0)
            } else if xa == 0.0 {
                0.25 * (1.0 - x * x) * (1.0 + y * ya) * (1.0 + z * za)
            } else if ya == 0.0 {
                0.25 * (1.0 + x * xa) * (1.0 - y * y) * (1.0 + z * za)
            } else {
                0.25 * (1.0 + x * xa) * (1.0 + y * ya) * (1.0 - z * z)
            };
        }
        n
    }

    /// Shape function derivatives with respect to natural coordinates
    pub fn shape_derivatives(xi: &[f64; 3]) -> [[f64; 3]; 20] {
        let (x, y, z) = (xi[0], xi[1], xi[2]);
        let mut d = [[0.0; 3]; 20];
        for (a, c) in HEX20_COORDS.iter().enumerate() {
            let (xa, ya, za) = (c[0], c[1], c[2]);
            if a < 8 {
                d[a][0] = 0.125 * xa * (1.0 + y * ya) * (1.0 + z * za)
                    * (2.0 * x * xa + y * ya + z * za - 1.0);
                d[a][1] = 0.125 * ya * (1.0 + x * xa) * (1.0 + z * za)
                    * (x * xa + 2.0 * y * ya + z * za - 1.0);
                d[a][2] = 0.125 * za * (1.0 + x * xa) * (1.0 + y * ya)
                    * (x * xa + y * ya + 2.0 * z * za - 1.0);
            } else if xa == 0.0 {
                d[a][0] = -0.5 * x * (1.0 + y * ya) * (1.0 + z * za);
                d[a][1] = 0.25 * ya * (1.0 - x * x) * (1.0 + z * za);
                d[a][2] = 0.25 * za * (1.0 - x * x) * (1.0 + y * ya);
            } else if ya == 0.0 {
                d[a][0] = 0.25 * xa * (1.0 - y * y) * (1.0 + z * za);
                d[a][1] = -0.5 * y * (1.0 + x * xa) * (1.0 + z * za);
                d[a][2] = 0.25 * za * (1.0 + x * xa) * (1.0 - y * y);
            } else {
                d[a][0] = 0.25 * xa * (1.0 + y * ya) * (1.0 - z * z);
                d[a][1] = 0.25 * ya * (1.0 + x * xa) * (1.0 - z * z);
                d[a][2] = -0.5 * z * (1.0 + x * xa) * (1.0 + y * ya);
            }
        }
        d
    }

    /// Compute the reference Jacobian J_ij = ∂X_i/∂ξ_j at natural coordinates
    #[allow(non_snake_case)]
    pub fn jacobian(xi: &[f64; 3], nodes: &[Point3<f64>]) -> Matrix3<f64> {
        let dN = Self::shape_derivatives(xi);
        let mut J = Matrix3::zeros();
        for a in 0..20 {
            let x = &nodes[a];
            for j in 0..3 {
                J[(0, j)] += x.x * dN[a][j];
                J[(1, j)] += x.y * dN[a][j];
                J[(2, j)] += x.z * dN[a][j];
            }
        }
        J
    }
}

/// Reference-configuration shape-function gradients for one integration point
///
/// Applies the chain rule ∇_X N_a = J₀⁻ᵀ ∂N_a/∂ξ with J₀ the reference
/// Jacobian evaluated at the integration point. Fails when the reference
/// Jacobian is singular.
///
/// # Arguments
/// * `dn_dxi` - Natural derivatives, one row per element node
/// * `jacobian` - Reference Jacobian J₀ at the integration point
///
/// # Returns
/// One ∇_X N_a vector per element node, in node order
#[allow(non_snake_case)]
pub fn reference_gradients(
    dn_dxi: &[[f64; 3]],
    jacobian: &Matrix3<f64>,
) -> Result<Vec<Vector3<f64>>, String> {
    let J_inv = jacobian
        .try_inverse()
        .ok_or_else(|| "singular reference Jacobian".to_string())?;

    let mut grads = Vec::with_capacity(dn_dxi.len());
    for d in dn_dxi {
        let g = J_inv.transpose() * Vector3::new(d[0], d[1], d[2]);
        grads.push(g);
    }
    Ok(grads)
}
