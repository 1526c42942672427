use nalgebra::Vector3;

/// Dense per-node vector storage
///
/// One entry per mesh node, indexed by dense node index. The size is fixed by
/// the owning series; access never allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct NodalField {
    data: Vec<Vector3<f64>>,
}

impl NodalField {
    pub fn zeros(n_nodes: usize) -> Self {
        Self {
            data: vec![Vector3::zeros(); n_nodes],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> &Vector3<f64> {
        &self.data[i]
    }

    pub fn set(&mut self, i: usize, v: Vector3<f64>) {
        self.data[i] = v;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector3<f64>> {
        self.data.iter()
    }
}

/// One measured time frame of nodal displacements
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredFrame {
    pub u: NodalField,
}

/// Time series of measured nodal displacements
///
/// The ordinal frame index is the time axis; every frame shares the node
/// count fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredSeries {
    n_nodes: usize,
    pub frames: Vec<MeasuredFrame>,
}

impl MeasuredSeries {
    pub fn new(n_nodes: usize) -> Self {
        Self {
            n_nodes,
            frames: Vec::new(),
        }
    }

    /// Append a zero-initialized frame; returns its ordinal index
    pub fn add_frame(&mut self) -> usize {
        self.frames.push(MeasuredFrame {
            u: NodalField::zeros(self.n_nodes),
        });
        self.frames.len() - 1
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn frame(&self, t: usize) -> &MeasuredFrame {
        &self.frames[t]
    }

    pub fn frame_mut(&mut self, t: usize) -> &mut MeasuredFrame {
        &mut self.frames[t]
    }
}

impl Default for MeasuredSeries {
    fn default() -> Self {
        Self::new(0)
    }
}

/// One virtual-field time frame of nodal displacements
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFrame {
    pub u: NodalField,
}

/// Collection of virtual displacement fields, VF-major then time
///
/// Every field shares the node count; frame counts may differ per field. A
/// field with exactly one frame is treated as time-invariant by the work
/// assemblers; any frame count other than 1 or the measured frame count is
/// rejected at validation.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFieldSet {
    n_nodes: usize,
    fields: Vec<Vec<VirtualFrame>>,
}

impl VirtualFieldSet {
    pub fn new(n_nodes: usize, n_fields: usize) -> Self {
        Self {
            n_nodes,
            fields: vec![Vec::new(); n_fields],
        }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Append a zero-initialized frame to field `v`; returns its ordinal index
    pub fn add_frame(&mut self, v: usize) -> usize {
        let frames = &mut self.fields[v];
        frames.push(VirtualFrame {
            u: NodalField::zeros(self.n_nodes),
        });
        frames.len() - 1
    }

    pub fn num_frames(&self, v: usize) -> usize {
        self.fields[v].len()
    }

    pub fn frame(&self, v: usize, t: usize) -> &VirtualFrame {
        &self.fields[v][t]
    }

    pub fn frame_mut(&mut self, v: usize, t: usize) -> &mut VirtualFrame {
        &mut self.fields[v][t]
    }
}

impl Default for VirtualFieldSet {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Resultant force on a named boundary surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLoad {
    pub surface: String,
    pub force: Vector3<f64>,
}

/// One load time frame: surface resultants measured at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFrame {
    pub time: f64,
    pub loads: Vec<SurfaceLoad>,
}

/// Time series of measured surface loads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSeries {
    pub frames: Vec<LoadFrame>,
}

impl LoadSeries {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Append an empty frame at the given time; returns its ordinal index
    pub fn add_frame(&mut self, time: f64) -> usize {
        self.frames.push(LoadFrame {
            time,
            loads: Vec::new(),
        });
        self.frames.len() - 1
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, t: usize) -> &LoadFrame {
        &self.frames[t]
    }

    pub fn frame_mut(&mut self, t: usize) -> &mut LoadFrame {
        &mut self.frames[t]
    }

    /// Locate a frame by floating-point time within an explicit tolerance
    ///
    /// Ordinal indexing is preferred on the critical paths; this helper exists
    /// for inputs that only carry floating times.
    pub fn find_frame_by_time(&self, time: f64, epsilon: f64) -> Option<usize> {
        self.frames.iter().position(|f| (f.time - time).abs() <= epsilon)
    }

    /// Surface names referenced anywhere in the series, first-seen order
    pub fn surface_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for frame in &self.frames {
            for load in &frame.loads {
                if !load.surface.is_empty() && !names.iter().any(|n| n == &load.surface) {
                    names.push(load.surface.clone());
                }
            }
        }
        names
    }
}
