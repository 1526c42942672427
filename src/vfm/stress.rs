use nalgebra::Matrix3;

use super::providers::MaterialProvider;
use crate::material::CauchyEval;
use crate::storage::{DeformationSeries, StressSeries};

/// Constitutive driver: stress fields from deformation fields
///
/// For every (t, e, g) the Cauchy stress is obtained through the material
/// provider (which works on cloned material points only) and the first Piola
/// stress follows as P = J σ F⁻ᵀ. The stress series is rewritten on every
/// call; the deformation series is read-only.
pub struct StressEval;

impl StressEval {
    /// σ(t,e,g) from F(t,e,g)
    ///
    /// Missing stress frames are appended so the series mirrors the
    /// deformation timeline. For an uncoupled material the provider returns
    /// the deviatoric stress and the total is recovered from the plane-stress
    /// identification convention σ_zz = 0:
    ///
    ///   σ = dev − dev_zz · I
    pub fn cauchy(
        def: &DeformationSeries,
        out: &mut StressSeries,
        provider: &dyn MaterialProvider,
    ) -> Result<(), String> {
        while out.num_frames() < def.num_frames() {
            out.add_frame();
        }

        for t in 0..def.num_frames() {
            let def_frame = def.frame(t);
            for e in 0..def_frame.num_elements() {
                for g in 0..def_frame.num_gauss(e) {
                    let f = def_frame.get(e, g);
                    let sigma = match provider.eval_cauchy(e, g, f)? {
                        CauchyEval::Total(s) => s,
                        CauchyEval::Deviatoric(dev) => {
                            let p = dev[(2, 2)];
                            dev - Matrix3::identity() * p
                        }
                    };
                    out.frame_mut(t).sigma.set(e, g, sigma);
                }
            }
        }
        Ok(())
    }

    /// P(t,e,g) = J σ F⁻ᵀ from F and the already-computed Cauchy field
    pub fn first_piola(def: &DeformationSeries, out: &mut StressSeries) -> Result<(), String> {
        if out.num_frames() < def.num_frames() {
            return Err(format!(
                "Stress store carries {} frames but the deformation series has {}.",
                out.num_frames(),
                def.num_frames()
            ));
        }

        for t in 0..def.num_frames() {
            let def_frame = def.frame(t);
            for e in 0..def_frame.num_elements() {
                for g in 0..def_frame.num_gauss(e) {
                    let f = def_frame.get(e, g);
                    let j = f.determinant();
                    if j <= 0.0 {
                        return Err(format!(
                            "Non-positive det(F) = {:.6e} while forming first Piola stress (frame {}).",
                            j, t
                        ));
                    }
                    let f_inv_t = f
                        .try_inverse()
                        .ok_or_else(|| {
                            format!("Singular deformation gradient in frame {}.", t)
                        })?
                        .transpose();

                    let sigma = *out.frame(t).sigma.get(e, g);
                    let p = sigma * f_inv_t * j;
                    out.frame_mut(t).piola.set(e, g, p);
                }
            }
        }
        Ok(())
    }

    /// Rebuild the full (σ, P) history from a deformation series
    ///
    /// The one entry point the solve loop uses: clears the store, then runs
    /// the Cauchy and first-Piola passes.
    pub fn rebuild(
        def: &DeformationSeries,
        out: &mut StressSeries,
        provider: &dyn MaterialProvider,
    ) -> Result<(), String> {
        out.clear();
        Self::cauchy(def, out, provider)?;
        Self::first_piola(def, out)
    }
}
