use nalgebra::Matrix3;

/// Ragged element×integration-point tensor storage
///
/// CSR-like layout: values for element `e` occupy the flat range
/// `offset[e] .. offset[e+1]`, mirroring the MeshFacts layout, so
/// element-local access is O(1) and frame traversal is cache-friendly.
#[derive(Debug, Clone, PartialEq)]
pub struct RaggedTensorField {
    gp_per_elem: Vec<usize>,
    offset: Vec<usize>,
    data: Vec<Matrix3<f64>>,
}

impl RaggedTensorField {
    /// Build a zero-filled field with the given per-element GP counts
    pub fn from_shape(gp_per_elem: &[usize]) -> Self {
        let mut offset = vec![0usize; gp_per_elem.len() + 1];
        for (e, &n) in gp_per_elem.iter().enumerate() {
            offset[e + 1] = offset[e] + n;
        }
        let total = offset[gp_per_elem.len()];
        Self {
            gp_per_elem: gp_per_elem.to_vec(),
            offset,
            data: vec![Matrix3::zeros(); total],
        }
    }

    pub fn num_elements(&self) -> usize {
        self.gp_per_elem.len()
    }

    pub fn num_gauss(&self, e: usize) -> usize {
        self.gp_per_elem[e]
    }

    pub fn total_gauss_points(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, e: usize, g: usize) -> &Matrix3<f64> {
        debug_assert!(g < self.gp_per_elem[e]);
        &self.data[self.offset[e] + g]
    }

    pub fn set(&mut self, e: usize, g: usize, value: Matrix3<f64>) {
        debug_assert!(g < self.gp_per_elem[e]);
        self.data[self.offset[e] + g] = value;
    }

    /// All integration-point values of element `e`
    pub fn element(&self, e: usize) -> &[Matrix3<f64>] {
        &self.data[self.offset[e]..self.offset[e + 1]]
    }

    /// Overwrite every entry with the same value
    pub fn fill(&mut self, value: Matrix3<f64>) {
        for m in &mut self.data {
            *m = value;
        }
    }

    /// True when another field has the identical element×GP shape
    pub fn same_shape(&self, other: &Self) -> bool {
        self.gp_per_elem == other.gp_per_elem
    }
}

/// Time series of measured deformation-gradient fields
///
/// Frames inherit the element×GP shape fixed by `set_shape`; the ordinal
/// frame index is the time axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeformationSeries {
    shape: Vec<usize>,
    pub frames: Vec<RaggedTensorField>,
}

impl DeformationSeries {
    pub fn new() -> Self {
        Self {
            shape: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Fix the element×GP shape for all (current and future) frames
    pub fn set_shape(&mut self, gp_per_elem: &[usize]) {
        self.shape = gp_per_elem.to_vec();
        for frame in &mut self.frames {
            *frame = RaggedTensorField::from_shape(&self.shape);
        }
    }

    /// Append a zero-filled frame; returns its ordinal index
    pub fn add_frame(&mut self) -> usize {
        self.frames.push(RaggedTensorField::from_shape(&self.shape));
        self.frames.len() - 1
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, t: usize) -> &RaggedTensorField {
        &self.frames[t]
    }

    pub fn frame_mut(&mut self, t: usize) -> &mut RaggedTensorField {
        &mut self.frames[t]
    }
}

/// One stress time frame: Cauchy and first Piola fields on the same shape
#[derive(Debug, Clone, PartialEq)]
pub struct StressFrame {
    pub sigma: RaggedTensorField,
    pub piola: RaggedTensorField,
}

/// Time series of paired (σ, P) stress fields
///
/// Rewritten wholesale on every residual evaluation; cleared and rebuilt from
/// the deformation series by the constitutive driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StressSeries {
    shape: Vec<usize>,
    pub frames: Vec<StressFrame>,
}

impl StressSeries {
    pub fn new() -> Self {
        Self {
            shape: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn set_shape(&mut self, gp_per_elem: &[usize]) {
        self.shape = gp_per_elem.to_vec();
        for frame in &mut self.frames {
            frame.sigma = RaggedTensorField::from_shape(&self.shape);
            frame.piola = RaggedTensorField::from_shape(&self.shape);
        }
    }

    pub fn add_frame(&mut self) -> usize {
        self.frames.push(StressFrame {
            sigma: RaggedTensorField::from_shape(&self.shape),
            piola: RaggedTensorField::from_shape(&self.shape),
        });
        self.frames.len() - 1
    }

    /// Drop all frames, keeping the configured shape
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, t: usize) -> &StressFrame {
        &self.frames[t]
    }

    pub fn frame_mut(&mut self, t: usize) -> &mut StressFrame {
        &mut self.frames[t]
    }
}

/// Per-virtual-field time series of deformation-gradient fields
///
/// VF-major then time, all fields sharing one element×GP shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualDeformationSet {
    shape: Vec<usize>,
    fields: Vec<Vec<RaggedTensorField>>,
}

impl VirtualDeformationSet {
    pub fn new(n_fields: usize) -> Self {
        Self {
            shape: Vec::new(),
            fields: vec![Vec::new(); n_fields],
        }
    }

    pub fn set_shape(&mut self, gp_per_elem: &[usize]) {
        self.shape = gp_per_elem.to_vec();
        for field in &mut self.fields {
            for frame in field.iter_mut() {
                *frame = RaggedTensorField::from_shape(&self.shape);
            }
        }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Append a zero-filled frame to field `v`; returns its ordinal index
    pub fn add_frame(&mut self, v: usize) -> usize {
        self.fields[v].push(RaggedTensorField::from_shape(&self.shape));
        self.fields[v].len() - 1
    }

    pub fn num_frames(&self, v: usize) -> usize {
        self.fields[v].len()
    }

    pub fn frame(&self, v: usize, t: usize) -> &RaggedTensorField {
        &self.fields[v][t]
    }

    pub fn frame_mut(&mut self, v: usize, t: usize) -> &mut RaggedTensorField {
        &mut self.fields[v][t]
    }
}
