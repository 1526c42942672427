use std::collections::HashMap;

use crate::mesh::{Mesh, MeshFacts};
use crate::storage::{LoadSeries, VirtualFieldSet};

/// Resolved surface-name → dense-node-index map
///
/// Built once at setup from the mesh's named surfaces; the external-work
/// assembler only ever looks surfaces up here.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMap {
    map: HashMap<String, Vec<usize>>,
}

impl SurfaceMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Resolve the given surface names against the mesh
    ///
    /// Every requested name must exist and carry at least one node that maps
    /// into the dense index space; anything else is a setup failure.
    pub fn resolve(mesh: &Mesh, facts: &MeshFacts, names: &[String]) -> Result<Self, String> {
        let mut map = HashMap::with_capacity(names.len());
        for name in names {
            let ids = mesh
                .surfaces
                .get(name)
                .ok_or_else(|| format!("Unknown surface \"{}\" referenced by measured loads.", name))?;

            let mut indices = Vec::with_capacity(ids.len());
            for &id in ids {
                let idx = facts.node_index(id).ok_or_else(|| {
                    format!("Surface \"{}\" references unknown node id {}.", name, id)
                })?;
                indices.push(idx);
            }
            if indices.is_empty() {
                return Err(format!("Surface \"{}\" resolved to no nodes.", name));
            }
            map.insert(name.clone(), indices);
        }
        Ok(Self { map })
    }

    pub fn nodes(&self, name: &str) -> Option<&[usize]> {
        self.map.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// External virtual work assembly
///
/// For each virtual field v and load frame t:
///
///   W_ext(v,t) = Σ_k F_k(t) · u*(v,t',node_k)
///
/// flattened as `W[v * T + t]` with T the load frame count, using the same
/// single-frame/T-frame dispatch as the internal assembler.
///
/// **Surface contract.** The virtual displacement of a loaded surface is read
/// from a single representative node (the first in the surface's resolved
/// node set) and the surface's *resultant* force multiplies that one
/// displacement. This is exact when the virtual field is constant over each
/// load-carrying surface, the rigid-grip situation these measurements come
/// from; inputs violating that assumption silently weight the resultant by
/// whichever node comes first.
pub fn assemble(
    surfaces: &SurfaceMap,
    virtuals: &VirtualFieldSet,
    loads: &LoadSeries,
) -> Result<Vec<f64>, String> {
    let n_vf = virtuals.num_fields();
    let n_t = loads.num_frames();
    if n_vf == 0 || n_t == 0 {
        return Ok(Vec::new());
    }

    let mut work = vec![0.0; n_vf * n_t];

    for v in 0..n_vf {
        let vf_frames = virtuals.num_frames(v);
        if vf_frames == 0 {
            return Err(format!("Virtual field {} has no time frames.", v));
        }
        let single = vf_frames == 1;
        if !single && vf_frames != n_t {
            return Err(format!(
                "Virtual field {} has {} time frames but the load series has {}. \
                 A constant field must use a single frame.",
                v, vf_frames, n_t
            ));
        }

        for t in 0..n_t {
            let frame = loads.frame(t);
            let u_star = &virtuals.frame(v, if single { 0 } else { t }).u;

            let mut acc = 0.0;
            for entry in &frame.loads {
                let nodes = surfaces.nodes(&entry.surface).ok_or_else(|| {
                    format!("Missing surface mapping for \"{}\".", entry.surface)
                })?;
                let representative = *nodes.first().ok_or_else(|| {
                    format!("Surface \"{}\" has no nodes.", entry.surface)
                })?;
                if representative >= u_star.len() {
                    return Err(format!(
                        "Virtual field {} cannot supply a displacement for surface \"{}\".",
                        v, entry.surface
                    ));
                }
                acc += entry.force.dot(u_star.get(representative));
            }
            work[v * n_t + t] = acc;
        }
    }

    Ok(work)
}
