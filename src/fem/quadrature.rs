/// Gaussian quadrature rules for hexahedral and tetrahedral elements
///
/// Points are given in the natural coordinates of the respective reference
/// element; weights sum to the reference-element volume (8 for the bi-unit
/// hex, 1/6 for the unit tet).
pub struct GaussQuadrature {
    /// Integration point coordinates in natural form [ξ, η, ζ]
    pub points: Vec<[f64; 3]>,
    /// Integration weights
    pub weights: Vec<f64>,
}

impl GaussQuadrature {
    /// 1-point hex rule (degree 1 exactness) - centroid rule
    pub fn hex_1point() -> Self {
        Self {
            points: vec![[0.0, 0.0, 0.0]],
            weights: vec![8.0],
        }
    }

    /// 2×2×2 hex rule (degree 3 exactness)
    ///
    /// Standard rule for trilinear hexahedra; abscissae at ±1/√3 with
    /// unit weights.
    pub fn hex_8point() -> Self {
        let a = 1.0 / 3.0_f64.sqrt();
        let mut points = Vec::with_capacity(8);
        // ζ-major ordering matching the hex node layout
        for &z in &[-a, a] {
            for &y in &[-a, a] {
                for &x in &[-a, a] {
                    points.push([x, y, z]);
                }
            }
        }
        Self {
            points,
            weights: vec![1.0; 8],
        }
    }

    /// 3×3×3 hex rule (degree 5 exactness)
    ///
    /// Standard rule for quadratic hexahedra; abscissae at 0 and ±√(3/5)
    /// with weights 8/9 and 5/9 per axis.
    pub fn hex_27point() -> Self {
        let a = (3.0_f64 / 5.0).sqrt();
        let abscissae = [-a, 0.0, a];
        let axis_weights = [5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0];

        let mut points = Vec::with_capacity(27);
        let mut weights = Vec::with_capacity(27);
        for (kz, &z) in abscissae.iter().enumerate() {
            for (ky, &y) in abscissae.iter().enumerate() {
                for (kx, &x) in abscissae.iter().enumerate() {
                    points.push([x, y, z]);
                    weights.push(axis_weights[kx] * axis_weights[ky] * axis_weights[kz]);
                }
            }
        }
        Self { points, weights }
    }

    /// 1-point tet rule (degree 1 exactness) - centroid rule
    pub fn tet_1point() -> Self {
        Self {
            points: vec![[0.25, 0.25, 0.25]],
            weights: vec![1.0 / 6.0],
        }
    }

    /// 4-point tet rule (degree 2 exactness)
    pub fn tet_4point() -> Self {
        let a = 0.5854101966249685; // (5 + √5) / 20
        let b = 0.1381966011250105; // (5 - √5) / 20
        let w = 1.0 / 24.0;

        Self {
            points: vec![[a, b, b], [b, a, b], [b, b, a], [b, b, b]],
            weights: vec![w, w, w, w],
        }
    }

    /// 5-point tet rule (degree 3 exactness)
    ///
    /// Carries one negative weight; recommended for quadratic tetrahedra.
    pub fn tet_5point() -> Self {
        let a = 0.25;
        let b = 1.0 / 6.0;
        let c = 0.5;

        Self {
            points: vec![[a, a, a], [b, b, c], [b, c, b], [c, b, b], [b, b, b]],
            weights: vec![
                -2.0 / 15.0,
                3.0 / 40.0,
                3.0 / 40.0,
                3.0 / 40.0,
                3.0 / 40.0,
            ],
        }
    }

    /// 11-point tet rule (degree 4 exactness)
    pub fn tet_11point() -> Self {
        let a1 = 0.25;
        let a2 = 0.0714285714285714;
        let b2 = 0.7857142857142857;
        let a3 = 0.3994035761667992;
        let b3 = 0.1005964238332008;

        Self {
            points: vec![
                // Central point
                [a1, a1, a1],
                // 4 points near vertices: barycentric (a2,a2,a2,b2) permutations
                [a2, a2, b2],
                [a2, b2, a2],
                [b2, a2, a2],
                [a2, a2, a2],
                // 6 points on edges: barycentric (a3,a3,b3,b3) permutations
                [a3, b3, b3],
                [b3, a3, b3],
                [b3, b3, a3],
                [a3, a3, b3],
                [a3, b3, a3],
                [b3, a3, a3],
            ],
            weights: vec![
                -0.01315555555555556,
                0.007622222222222222,
                0.007622222222222222,
                0.007622222222222222,
                0.007622222222222222,
                0.024888888888888888,
                0.024888888888888888,
                0.024888888888888888,
                0.024888888888888888,
                0.024888888888888888,
                0.024888888888888888,
            ],
        }
    }

    /// Get the number of integration points
    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}
