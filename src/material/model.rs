use nalgebra::Matrix3;

use super::point::MaterialPoint;

/// Result of a constitutive evaluation at one material point
///
/// The coupled/uncoupled distinction is surfaced here, at the provider
/// boundary, so the stress driver can apply its pressure-recovery convention
/// without inspecting the concrete material type.
#[derive(Debug, Clone, Copy)]
pub enum CauchyEval {
    /// Full Cauchy stress
    Total(Matrix3<f64>),
    /// Deviatoric Cauchy stress of an uncoupled (deviatoric/volumetric split)
    /// material; the volumetric part must be recovered by the caller
    Deviatoric(Matrix3<f64>),
}

/// Compressible neo-Hookean solid
///
/// Strain energy:
///   W = μ/2 (I₁ - 3) - μ ln J + κ/2 (ln J)²
///
/// Cauchy stress:
///   σ = [ μ (B - I) + κ ln J · I ] / J
///
/// with B = F Fᵀ. The stress vanishes in the reference configuration
/// (σ(I) = 0), which the identification pipeline relies on.
#[derive(Debug, Clone)]
pub struct NeoHookean {
    /// Shear modulus μ
    pub mu: f64,
    /// Bulk modulus κ
    pub kappa: f64,
}

impl NeoHookean {
    /// Create a new neo-Hookean material
    ///
    /// # Panics
    /// Panics if μ ≤ 0 or κ ≤ 0
    pub fn new(mu: f64, kappa: f64) -> Self {
        assert!(mu > 0.0, "Shear modulus must be positive");
        assert!(kappa > 0.0, "Bulk modulus must be positive");
        Self { mu, kappa }
    }

    /// Cauchy stress at a prepared material point
    pub fn cauchy(&self, mp: &MaterialPoint) -> Result<Matrix3<f64>, String> {
        let j = mp.j;
        if j <= 0.0 {
            return Err(format!(
                "neo-Hookean stress evaluation with non-positive J = {:.6e}",
                j
            ));
        }
        let b = mp.f * mp.f.transpose();
        let identity = Matrix3::identity();
        Ok(((b - identity) * self.mu + identity * (self.kappa * j.ln())) / j)
    }
}

/// Saint Venant-Kirchhoff solid
///
/// The small-strain isotropic law expressed in finite-strain measures, using
/// the Lamé parameters (λ, μ):
///
///   E = ½(FᵀF - I)
///   S = λ tr(E) I + 2 μ E
///   σ = (1/J) F S Fᵀ
///
/// Valid for moderate stretches; σ(I) = 0 holds exactly.
#[derive(Debug, Clone)]
pub struct StVenantKirchhoff {
    /// First Lamé parameter λ
    pub lambda: f64,
    /// Second Lamé parameter μ (shear modulus)
    pub mu: f64,
}

impl StVenantKirchhoff {
    /// Create a new Saint Venant-Kirchhoff material
    ///
    /// # Panics
    /// Panics if μ ≤ 0 or λ < 0
    pub fn new(lambda: f64, mu: f64) -> Self {
        assert!(mu > 0.0, "Shear modulus must be positive");
        assert!(lambda >= 0.0, "First Lame parameter must be non-negative");
        Self { lambda, mu }
    }

    /// Cauchy stress at a prepared material point
    pub fn cauchy(&self, mp: &MaterialPoint) -> Result<Matrix3<f64>, String> {
        let j = mp.j;
        if j <= 0.0 {
            return Err(format!(
                "Saint Venant-Kirchhoff stress evaluation with non-positive J = {:.6e}",
                j
            ));
        }
        let identity = Matrix3::identity();
        let e = (mp.f.transpose() * mp.f - identity) * 0.5;
        let s = identity * (self.lambda * e.trace()) + e * (2.0 * self.mu);
        Ok(mp.f * s * mp.f.transpose() / j)
    }
}

/// Uncoupled Mooney-Rivlin solid (deviatoric part only)
///
/// Deviatoric strain energy in terms of the modified invariants
/// Ī₁ = tr B̄, Ī₂ with B̄ = J^(-2/3) B:
///
///   W_dev = c₁ (Ī₁ - 3) + c₂ (Ī₂ - 3)
///
/// Deviatoric Cauchy stress:
///   dev σ = (2/J) dev[ (c₁ + c₂ Ī₁) B̄ - c₂ B̄² ]
///
/// The volumetric response is not evaluated here; the provider reports this
/// material as uncoupled and the stress driver recovers the pressure from the
/// σ_zz = 0 convention.
#[derive(Debug, Clone)]
pub struct UncoupledMooneyRivlin {
    pub c1: f64,
    pub c2: f64,
}

impl UncoupledMooneyRivlin {
    /// Create a new uncoupled Mooney-Rivlin material
    ///
    /// # Panics
    /// Panics if c₁ ≤ 0 or c₂ < 0
    pub fn new(c1: f64, c2: f64) -> Self {
        assert!(c1 > 0.0, "First Mooney-Rivlin coefficient must be positive");
        assert!(
            c2 >= 0.0,
            "Second Mooney-Rivlin coefficient must be non-negative"
        );
        Self { c1, c2 }
    }

    /// Deviatoric Cauchy stress at a prepared material point
    pub fn deviatoric_cauchy(&self, mp: &MaterialPoint) -> Result<Matrix3<f64>, String> {
        let j = mp.j;
        if j <= 0.0 {
            return Err(format!(
                "Mooney-Rivlin stress evaluation with non-positive J = {:.6e}",
                j
            ));
        }
        let b_bar = (mp.f * mp.f.transpose()) * j.powf(-2.0 / 3.0);
        let i1_bar = b_bar.trace();

        let s = b_bar * (self.c1 + self.c2 * i1_bar) - (b_bar * b_bar) * self.c2;
        let dev = s - Matrix3::identity() * (s.trace() / 3.0);
        Ok(dev * (2.0 / j))
    }
}

/// The constitutive model behind the provider seam
///
/// A two-variant tagged choice: coupled materials return total Cauchy stress,
/// uncoupled materials return the deviatoric part only.
#[derive(Debug, Clone)]
pub enum MaterialModel {
    NeoHookean(NeoHookean),
    StVenantKirchhoff(StVenantKirchhoff),
    UncoupledMooneyRivlin(UncoupledMooneyRivlin),
}

impl MaterialModel {
    /// Human-readable model name (matches the input-file `type` attribute)
    pub fn name(&self) -> &'static str {
        match self {
            MaterialModel::NeoHookean(_) => "neo-Hookean",
            MaterialModel::StVenantKirchhoff(_) => "St. Venant-Kirchhoff",
            MaterialModel::UncoupledMooneyRivlin(_) => "uncoupled Mooney-Rivlin",
        }
    }

    /// Names of the scalar parameters this model exposes, in slot order
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            MaterialModel::NeoHookean(_) => &["mu", "kappa"],
            MaterialModel::StVenantKirchhoff(_) => &["lambda", "mu"],
            MaterialModel::UncoupledMooneyRivlin(_) => &["c1", "c2"],
        }
    }

    /// Read the scalar parameter in the given slot
    pub fn param(&self, slot: usize) -> f64 {
        match self {
            MaterialModel::NeoHookean(m) => match slot {
                0 => m.mu,
                1 => m.kappa,
                _ => panic!("invalid neo-Hookean parameter slot {}", slot),
            },
            MaterialModel::StVenantKirchhoff(m) => match slot {
                0 => m.lambda,
                1 => m.mu,
                _ => panic!("invalid St. Venant-Kirchhoff parameter slot {}", slot),
            },
            MaterialModel::UncoupledMooneyRivlin(m) => match slot {
                0 => m.c1,
                1 => m.c2,
                _ => panic!("invalid Mooney-Rivlin parameter slot {}", slot),
            },
        }
    }

    /// Write the scalar parameter in the given slot
    pub fn set_param(&mut self, slot: usize, value: f64) {
        match self {
            MaterialModel::NeoHookean(m) => match slot {
                0 => m.mu = value,
                1 => m.kappa = value,
                _ => panic!("invalid neo-Hookean parameter slot {}", slot),
            },
            MaterialModel::StVenantKirchhoff(m) => match slot {
                0 => m.lambda = value,
                1 => m.mu = value,
                _ => panic!("invalid St. Venant-Kirchhoff parameter slot {}", slot),
            },
            MaterialModel::UncoupledMooneyRivlin(m) => match slot {
                0 => m.c1 = value,
                1 => m.c2 = value,
                _ => panic!("invalid Mooney-Rivlin parameter slot {}", slot),
            },
        }
    }

    /// Evaluate the constitutive response at a prepared material point
    pub fn evaluate(&self, mp: &MaterialPoint) -> Result<CauchyEval, String> {
        match self {
            MaterialModel::NeoHookean(m) => Ok(CauchyEval::Total(m.cauchy(mp)?)),
            MaterialModel::StVenantKirchhoff(m) => Ok(CauchyEval::Total(m.cauchy(mp)?)),
            MaterialModel::UncoupledMooneyRivlin(m) => {
                Ok(CauchyEval::Deviatoric(m.deviatoric_cauchy(mp)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_neo_hookean_stress_free_reference() {
        let mat = NeoHookean::new(1.0, 1000.0);
        let mp = MaterialPoint::reference();
        let sigma = mat.cauchy(&mp).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(sigma[(i, j)], 0.0, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_neo_hookean_uniaxial_stretch() {
        let mu = 1.0;
        let kappa = 1000.0;
        let mat = NeoHookean::new(mu, kappa);

        let lambda = 1.1_f64;
        let mut mp = MaterialPoint::reference();
        let mut f = Matrix3::identity();
        f[(0, 0)] = lambda;
        mp.set_deformation(&f);

        let sigma = mat.cauchy(&mp).unwrap();
        let j = lambda;
        let expected_xx = (mu * (lambda * lambda - 1.0) + kappa * j.ln()) / j;
        let expected_yy = kappa * j.ln() / j;

        assert_relative_eq!(sigma[(0, 0)], expected_xx, epsilon = 1e-12);
        assert_relative_eq!(sigma[(1, 1)], expected_yy, epsilon = 1e-12);
        assert_relative_eq!(sigma[(0, 1)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_neo_hookean_rejects_inverted_state() {
        let mat = NeoHookean::new(1.0, 10.0);
        let mut mp = MaterialPoint::reference();
        let mut f = Matrix3::identity();
        f[(0, 0)] = -1.0;
        mp.set_deformation(&f);
        assert!(mat.cauchy(&mp).is_err());
    }

    #[test]
    fn test_st_venant_kirchhoff_stress_free_reference() {
        let mat = StVenantKirchhoff::new(100.0, 1.0);
        let sigma = mat.cauchy(&MaterialPoint::reference()).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(sigma[(i, j)], 0.0, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_st_venant_kirchhoff_uniaxial() {
        // F = diag(λ, 1, 1): E = diag((λ²-1)/2, 0, 0)
        // S = diag((λ_L + 2μ) E₁₁, λ_L E₁₁, λ_L E₁₁) with λ_L the Lamé constant
        // σ = diag(λ² S₁₁, S₂₂, S₃₃)/λ
        let (lame, mu) = (2.0, 1.5);
        let mat = StVenantKirchhoff::new(lame, mu);

        let stretch = 1.2_f64;
        let mut mp = MaterialPoint::reference();
        let mut f = Matrix3::identity();
        f[(0, 0)] = stretch;
        mp.set_deformation(&f);

        let e11 = 0.5 * (stretch * stretch - 1.0);
        let sigma = mat.cauchy(&mp).unwrap();
        assert_relative_eq!(
            sigma[(0, 0)],
            stretch * stretch * (lame + 2.0 * mu) * e11 / stretch,
            epsilon = 1e-12
        );
        assert_relative_eq!(sigma[(1, 1)], lame * e11 / stretch, epsilon = 1e-12);
        assert_relative_eq!(sigma[(0, 1)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_mooney_rivlin_deviatoric_is_traceless() {
        let mat = UncoupledMooneyRivlin::new(0.8, 0.2);
        let mut mp = MaterialPoint::reference();
        let f = Matrix3::new(1.2, 0.1, 0.0, 0.0, 0.95, 0.0, 0.0, 0.0, 0.9);
        mp.set_deformation(&f);

        let dev = mat.deviatoric_cauchy(&mp).unwrap();
        assert_relative_eq!(dev.trace(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_model_parameter_slots() {
        let mut model = MaterialModel::NeoHookean(NeoHookean::new(1.0, 1000.0));
        assert_eq!(model.param_names(), &["mu", "kappa"]);
        model.set_param(0, 0.7);
        assert_relative_eq!(model.param(0), 0.7, epsilon = 1e-15);
        assert_relative_eq!(model.param(1), 1000.0, epsilon = 1e-15);
    }

    #[test]
    fn test_evaluate_dispatch() {
        let mp = MaterialPoint::reference();

        let coupled = MaterialModel::NeoHookean(NeoHookean::new(1.0, 10.0));
        assert!(matches!(
            coupled.evaluate(&mp).unwrap(),
            CauchyEval::Total(_)
        ));

        let uncoupled =
            MaterialModel::UncoupledMooneyRivlin(UncoupledMooneyRivlin::new(1.0, 0.1));
        assert!(matches!(
            uncoupled.evaluate(&mp).unwrap(),
            CauchyEval::Deviatoric(_)
        ));
    }
}
