//! Reusable pre-run validation checks
//!
//! Everything here must pass before a problem is considered prepared; each
//! check returns a descriptive error naming the offending entity so input
//! mistakes surface at setup, never mid-solve.

use super::params::Parameter;
use crate::mesh::{DomainClass, Mesh};
use crate::storage::{LoadSeries, MeasuredSeries, VirtualFieldSet};

/// The identification pipeline only supports solid domains
pub fn validate_solid_domains(mesh: &Mesh) -> Result<(), String> {
    for domain in &mesh.connectivity.domains {
        if domain.class != DomainClass::Solid {
            return Err(format!(
                "The Virtual Fields Method only supports solid domains; found non-solid domain \"{}\".",
                domain.name
            ));
        }
    }
    Ok(())
}

/// Parameter-spec rules: finite init inside finite ordered bounds, non-zero
/// finite scale, non-empty name
pub fn validate_param_specs(params: &[Parameter]) -> Result<(), String> {
    for p in params {
        let spec = &p.spec;
        if spec.name.is_empty() {
            return Err("Parameters: empty name.".to_string());
        }
        if !spec.init.is_finite() {
            return Err(format!("Parameters[{}]: non-finite init.", spec.name));
        }
        if !spec.lo.is_finite() || !spec.hi.is_finite() || spec.lo > spec.hi {
            return Err(format!("Parameters[{}]: invalid bounds.", spec.name));
        }
        if spec.init < spec.lo || spec.init > spec.hi {
            return Err(format!("Parameters[{}]: init out of bounds.", spec.name));
        }
        if !spec.scale.is_finite() || spec.scale == 0.0 {
            return Err(format!("Parameters[{}]: invalid scale.", spec.name));
        }
    }
    Ok(())
}

/// The residual subtracts external from internal work per (v, t); both
/// timelines must agree when loads are present
pub fn validate_frame_alignment(
    measured: &MeasuredSeries,
    loads: &LoadSeries,
) -> Result<(), String> {
    let n_meas = measured.num_frames();
    if !loads.frames.is_empty() && n_meas > 0 && loads.num_frames() != n_meas {
        return Err(format!(
            "Measured loads carry {} time frames but the measured displacements carry {}.",
            loads.num_frames(),
            n_meas
        ));
    }
    Ok(())
}

/// Virtual fields carry exactly one frame (time-invariant) or exactly the
/// measured frame count; anything else is fatal
pub fn validate_virtual_frame_counts(
    virtuals: &VirtualFieldSet,
    n_measured_frames: usize,
) -> Result<(), String> {
    for v in 0..virtuals.num_fields() {
        let frames = virtuals.num_frames(v);
        if frames != 1 && frames != n_measured_frames {
            return Err(format!(
                "Virtual field {} has {} time frames; expected 1 or {}.",
                v, frames, n_measured_frames
            ));
        }
    }
    Ok(())
}
