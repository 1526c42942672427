use nalgebra::{Matrix3, Vector3};

/// State carried at one integration point
///
/// The mesh owns one material point per integration point; the constitutive
/// driver never evaluates stress on these directly. It clones a point, injects
/// the trial deformation gradient, zeros the scratch fields, and reads stress
/// from the clone, leaving the mesh's own history untouched.
#[derive(Debug, Clone)]
pub struct MaterialPoint {
    /// Deformation gradient F
    pub f: Matrix3<f64>,
    /// Jacobian J = det F
    pub j: f64,
    /// Material point velocity (scratch)
    pub velocity: Vector3<f64>,
    /// Material point acceleration (scratch)
    pub acceleration: Vector3<f64>,
    /// Spatial velocity gradient L (scratch)
    pub velocity_gradient: Matrix3<f64>,
    /// Stored strain energy (scratch)
    pub stored_energy: f64,
    /// Dissipated energy (scratch)
    pub dissipated_energy: f64,
}

impl MaterialPoint {
    /// A point in the undeformed reference state
    pub fn reference() -> Self {
        Self {
            f: Matrix3::identity(),
            j: 1.0,
            velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            velocity_gradient: Matrix3::zeros(),
            stored_energy: 0.0,
            dissipated_energy: 0.0,
        }
    }

    /// Overwrite the deformation state with an injected gradient
    pub fn set_deformation(&mut self, f: &Matrix3<f64>) {
        self.f = *f;
        self.j = f.determinant();
    }

    /// Zero the stateful scratch fields
    ///
    /// Applied to every clone before stress evaluation so stale kinematic
    /// history cannot leak into the constitutive response.
    pub fn reset_scratch(&mut self) {
        self.velocity = Vector3::zeros();
        self.acceleration = Vector3::zeros();
        self.velocity_gradient = Matrix3::zeros();
        self.stored_energy = 0.0;
        self.dissipated_energy = 0.0;
    }
}

impl Default for MaterialPoint {
    fn default() -> Self {
        Self::reference()
    }
}
