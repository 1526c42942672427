/// Mesh quality assessment
///
/// Full-field measurements come with meshes produced by image correlation or
/// third-party preprocessors; badly shaped elements corrupt the reconstructed
/// deformation gradients long before they make the Jacobian guard fire. This
/// module measures reference-Jacobian statistics so setup can warn about
/// near-degenerate geometry.

use super::geometry::Mesh;
use super::topology::ElementKind;
use crate::fem::{Hex20Basis, Hex8Basis, Tet10Basis, Tet4Basis};

/// Reference-Jacobian statistics over all integration points
#[derive(Debug, Clone)]
pub struct MeshQuality {
    /// Minimum det(J₀) over all integration points
    pub min_jacobian: f64,
    /// Average det(J₀)
    pub avg_jacobian: f64,
    /// Maximum det(J₀)
    pub max_jacobian: f64,
    /// Integration points with det(J₀) ≤ 0 (inverted geometry)
    pub num_inverted: usize,
    /// Integration points with det(J₀) below the degeneracy threshold
    pub num_degenerate: usize,
    /// Total integration points inspected
    pub total_points: usize,
}

/// det(J₀) below this fraction of the element average counts as degenerate
const DEGENERACY_RATIO: f64 = 0.01;

impl MeshQuality {
    /// True when no integration point is inverted or degenerate
    pub fn is_acceptable(&self) -> bool {
        self.num_inverted == 0 && self.num_degenerate == 0
    }

    /// Human-readable quality report
    pub fn report(&self) -> String {
        format!(
            "Mesh quality: det(J0) in [{:.3e}, {:.3e}], avg {:.3e}, inverted {}/{}, degenerate {}/{}",
            self.min_jacobian,
            self.max_jacobian,
            self.avg_jacobian,
            self.num_inverted,
            self.total_points,
            self.num_degenerate,
            self.total_points
        )
    }
}

/// Evaluate det(J₀) at every integration point of every element
pub fn assess_mesh_quality(mesh: &Mesh) -> MeshQuality {
    let mut min_jacobian = f64::INFINITY;
    let mut max_jacobian = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut num_inverted = 0;
    let mut total_points = 0;

    let mut determinants = Vec::new();
    for (e, el) in mesh.connectivity.elements.iter().enumerate() {
        let nodes = mesh.element_nodes(e);
        let quad = el.kind.quadrature();
        for point in &quad.points {
            let det = match el.kind {
                ElementKind::Hex8 => Hex8Basis::jacobian(point, &nodes).determinant(),
                ElementKind::Hex20 => Hex20Basis::jacobian(point, &nodes).determinant(),
                ElementKind::Tet4 => Tet4Basis::jacobian(&nodes).determinant(),
                ElementKind::Tet10 => Tet10Basis::jacobian(point, &nodes).determinant(),
            };
            determinants.push(det);

            min_jacobian = min_jacobian.min(det);
            max_jacobian = max_jacobian.max(det);
            sum += det;
            if det <= 0.0 {
                num_inverted += 1;
            }
            total_points += 1;
        }
    }

    if total_points == 0 {
        return MeshQuality {
            min_jacobian: 0.0,
            avg_jacobian: 0.0,
            max_jacobian: 0.0,
            num_inverted: 0,
            num_degenerate: 0,
            total_points: 0,
        };
    }

    let avg_jacobian = sum / total_points as f64;
    let threshold = DEGENERACY_RATIO * avg_jacobian.abs();
    let num_degenerate = determinants
        .iter()
        .filter(|&&d| d > 0.0 && d < threshold)
        .count();

    MeshQuality {
        min_jacobian,
        avg_jacobian,
        max_jacobian,
        num_inverted,
        num_degenerate,
        total_points,
    }
}
