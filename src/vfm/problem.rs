use nalgebra::Vector3;

use super::external_work::{self, SurfaceMap};
use super::internal_work;
use super::kinematics::Kinematics;
use super::params::{ParamSpec, Parameter, ParameterApplier};
use super::providers::MeshMaterialProvider;
use super::stress::StressEval;
use super::validation;
use crate::config::{
    parse_node_ids, parse_param_tuple, parse_vec3, OptionsDto, VfmInput,
};
use crate::diag;
use crate::linalg::DiffMode;
use crate::material::{
    MaterialModel, MaterialSystem, NeoHookean, StVenantKirchhoff, UncoupledMooneyRivlin,
};
use crate::mesh::{DomainClass, ElementKind, Mesh, MeshFacts, SolidElement};
use crate::storage::{
    DeformationSeries, LoadSeries, MeasuredSeries, StressSeries, SurfaceLoad, VirtualDeformationSet,
    VirtualFieldSet,
};

/// Solver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// Unconstrained Levenberg–Marquardt
    Levmar,
    /// Box-constrained Levenberg–Marquardt (the default)
    ConstrainedLevmar,
}

/// Options governing the optimization run
#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub kind: SolverKind,
    /// Trust-region initialization scale τ
    pub tau: f64,
    /// Gradient tolerance (‖Jᵀr‖_∞)
    pub grad_tol: f64,
    /// Step tolerance (‖δ‖)
    pub step_tol: f64,
    /// Objective tolerance (‖r‖²)
    pub obj_tol: f64,
    /// Finite-difference step scale; multiplied by each parameter's `scale`
    pub diff_scale: f64,
    /// Finite-difference scheme for the LM Jacobian
    pub diff_mode: DiffMode,
    pub max_iterations: usize,
    /// Apply the plane-deformation post-process to measured kinematics
    pub plane_deformation: bool,
    /// Optional path of the virtual-work CSV artifact (must end in .txt)
    pub save_virtual_work: Option<String>,
    /// Emit one line per residual evaluation
    pub log_evaluations: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            kind: SolverKind::ConstrainedLevmar,
            tau: 1e-3,
            grad_tol: 1e-12,
            step_tol: 1e-12,
            obj_tol: 1e-15,
            diff_scale: 1e-6,
            diff_mode: DiffMode::Forward,
            max_iterations: 100,
            plane_deformation: false,
            save_virtual_work: None,
            log_evaluations: true,
        }
    }
}

impl SolverOptions {
    /// Normalize the raw options section
    pub fn from_dto(dto: Option<&OptionsDto>) -> Result<Self, String> {
        let mut options = SolverOptions::default();
        let Some(dto) = dto else {
            return Ok(options);
        };

        if let Some(kind) = &dto.kind {
            options.kind = match kind.as_str() {
                "levmar" => SolverKind::Levmar,
                "constrained-levmar" => SolverKind::ConstrainedLevmar,
                other => {
                    return Err(format!(
                        "Unknown solver type \"{}\". Expected levmar or constrained-levmar.",
                        other
                    ))
                }
            };
        }
        if let Some(tau) = dto.tau {
            options.tau = tau;
        }
        if let Some(tol) = dto.grad_tol {
            options.grad_tol = tol;
        }
        if let Some(tol) = dto.step_tol {
            options.step_tol = tol;
        }
        if let Some(tol) = dto.obj_tol {
            options.obj_tol = tol;
        }
        if let Some(scale) = dto.diff_scale {
            options.diff_scale = scale;
        }
        if let Some(mode) = &dto.diff_mode {
            options.diff_mode = match mode.as_str() {
                "forward" => DiffMode::Forward,
                "central" => DiffMode::Central,
                other => {
                    return Err(format!(
                        "Unknown diff_mode \"{}\". Expected forward or central.",
                        other
                    ))
                }
            };
        }
        if let Some(iters) = dto.max_iterations {
            options.max_iterations = if iters == 0 { 100 } else { iters };
        }
        if let Some(flag) = dto.plane_deformation {
            options.plane_deformation = flag;
        }
        if let Some(path) = &dto.save_virtual_work {
            let valid = path
                .rsplit('.')
                .next()
                .map(|ext| ext.eq_ignore_ascii_case("txt"))
                .unwrap_or(false)
                && path.contains('.');
            if !valid {
                return Err("Options/save_virtual_work must use a .txt extension.".to_string());
            }
            options.save_virtual_work = Some(path.clone());
        }
        Ok(options)
    }
}

/// All mutable state of one identification problem
///
/// Inputs (measured, virtuals, loads) and the derived kinematic tensors are
/// written once at setup and read-only afterwards; the stress series is
/// rewritten on every residual evaluation; parameter values track the
/// material backing store.
#[derive(Debug, Clone, Default)]
pub struct VfmState {
    pub measured: MeasuredSeries,
    pub virtuals: VirtualFieldSet,
    pub loads: LoadSeries,

    pub def: DeformationSeries,
    pub vdef: VirtualDeformationSet,
    pub stresses: StressSeries,

    pub params: Vec<Parameter>,
}

impl VfmState {
    /// Size the tensor stores once the quadrature shape and VF count are known
    pub fn configure_tensors(&mut self, gp_per_elem: &[usize], n_vf: usize) {
        self.def.set_shape(gp_per_elem);
        self.stresses.set_shape(gp_per_elem);
        self.vdef = VirtualDeformationSet::new(n_vf);
        self.vdef.set_shape(gp_per_elem);
    }

    /// Create tensor frames mirroring the displacement timelines
    ///
    /// Call after `configure_tensors`.
    pub fn mirror_frames_from_displacements(&mut self) {
        for _ in 0..self.measured.num_frames() {
            self.def.add_frame();
        }
        for v in 0..self.virtuals.num_fields() {
            for _ in 0..self.virtuals.num_frames(v) {
                self.vdef.add_frame(v);
            }
        }
    }

    /// Current parameter vector
    pub fn parameter_vector(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }
}

/// A fully prepared identification problem
#[derive(Debug, Clone)]
pub struct VfmProblem {
    pub mesh: Mesh,
    pub facts: MeshFacts,
    pub system: MaterialSystem,
    pub surfaces: SurfaceMap,
    pub state: VfmState,
    pub options: SolverOptions,
    /// Pre-computed external virtual work, flattened v·T + t; θ-independent
    pub external_work: Vec<f64>,
}

impl VfmProblem {
    /// End-to-end setup from a parsed input document
    ///
    /// Requires the document to carry model sections (`Mesh`, `Material`).
    pub fn from_input(input: &VfmInput) -> Result<Self, String> {
        let (mesh, system) = build_model(input)?;
        let facts = MeshFacts::build(&mesh)?;

        let params = load_params(input)?;
        let measured = load_measured(input, &facts)?;
        let virtuals = load_virtuals(input, &facts)?;
        let loads = load_loads(input)?;
        let options = SolverOptions::from_dto(input.options.as_ref())?;

        Self::prepare(mesh, facts, system, params, measured, virtuals, loads, options)
    }

    /// Assemble and validate a problem from typed inputs
    ///
    /// The one place every §7 validation rule runs; a single failure aborts
    /// setup and nothing partially-built escapes.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare(
        mesh: Mesh,
        facts: MeshFacts,
        system: MaterialSystem,
        params: Vec<Parameter>,
        measured: MeasuredSeries,
        virtuals: VirtualFieldSet,
        loads: LoadSeries,
        options: SolverOptions,
    ) -> Result<Self, String> {
        validation::validate_solid_domains(&mesh)?;
        validation::validate_param_specs(&params)?;
        validation::validate_frame_alignment(&measured, &loads)?;
        validation::validate_virtual_frame_counts(&virtuals, measured.num_frames())?;

        let quality = crate::mesh::assess_mesh_quality(&mesh);
        if !quality.is_acceptable() {
            diag::warn(&quality.report());
        } else {
            diag::debug(&quality.report());
        }

        let mut state = VfmState {
            measured,
            virtuals,
            loads,
            params,
            ..VfmState::default()
        };
        state.configure_tensors(&facts.gp_per_elem, state.virtuals.num_fields());
        state.mirror_frames_from_displacements();

        let mut system = system;
        let applier = ParameterApplier::resolve(&system, &state.params)?;
        let init: Vec<f64> = state.params.iter().map(|p| p.spec.init).collect();
        applier.apply(&init, &mut system, &mut state.params)?;

        Kinematics::compute_measured(
            &facts,
            &facts,
            &state.measured,
            &mut state.def,
            options.plane_deformation,
            true,
        )?;
        Kinematics::compute_virtuals(&facts, &facts, &state.virtuals, &mut state.vdef, true)?;

        let surface_names = state.loads.surface_names();
        let surfaces = SurfaceMap::resolve(&mesh, &facts, &surface_names)?;

        {
            let provider = MeshMaterialProvider::new(&mesh, &facts, &system);
            StressEval::rebuild(&state.def, &mut state.stresses, &provider)?;
        }

        let external_work = external_work::assemble(&surfaces, &state.virtuals, &state.loads)?;

        Ok(Self {
            mesh,
            facts,
            system,
            surfaces,
            state,
            options,
            external_work,
        })
    }

    /// Rebuild the stress history from the current parameter state
    pub fn rebuild_stresses(&mut self) -> Result<(), String> {
        let Self {
            ref mesh,
            ref facts,
            ref system,
            ref mut state,
            ..
        } = *self;
        let provider = MeshMaterialProvider::new(mesh, facts, system);
        StressEval::rebuild(&state.def, &mut state.stresses, &provider)
    }

    /// Internal virtual work for the current stress state, flattened v·T + t
    pub fn internal_work_vector(&self) -> Result<Vec<f64>, String> {
        internal_work::assemble(&self.facts, &self.state.vdef, &self.state.stresses)
    }

    /// Emit the setup summary through the diagnostic sink
    pub fn print_summary(&self) {
        diag::info(&format!(
            "mesh: nodes={} elems={} integration points={}",
            self.facts.n_nodes,
            self.facts.n_elems,
            self.facts.total_gauss_points()
        ));
        diag::info(&format!(
            "measuredU frames={}  virtual fields={}  load frames={}",
            self.state.measured.num_frames(),
            self.state.virtuals.num_fields(),
            self.state.loads.num_frames()
        ));
        diag::info(&diag::parameter_table(&self.state.params, "Parameters"));
        diag::debug(&diag::summary_measured(&self.state.measured));
        diag::debug(&diag::summary_virtuals(&self.state.virtuals));
        diag::debug(&diag::summary_loads(&self.state.loads));
        diag::debug(&diag::summary_deformation(&self.state.def));
        diag::debug(&diag::summary_stresses(&self.state.stresses));
    }
}

/// Build the mesh and material system from the model sections
pub fn build_model(input: &VfmInput) -> Result<(Mesh, MaterialSystem), String> {
    let mesh_dto = input
        .mesh
        .as_ref()
        .ok_or_else(|| "Input is missing the Mesh section.".to_string())?;
    let mat_dto = input
        .material
        .as_ref()
        .ok_or_else(|| "Input is missing the Material section.".to_string())?;

    let mut mesh = Mesh::new();

    for node in &mesh_dto.nodes.nodes {
        let [x, y, z] = parse_vec3(node.value.as_deref())
            .map_err(|e| format!("Mesh node {}: {}", node.id, e))?;
        mesh.geometry.add_node(node.id, x, y, z);
    }

    let node_index = |id: i32| -> Result<usize, String> {
        mesh.geometry
            .node_ids
            .iter()
            .position(|&n| n == id)
            .ok_or_else(|| format!("Element references unknown node id {}.", id))
    };

    let mut domain_elements = Vec::new();
    let mut parsed_elements = Vec::new();
    for block in &mesh_dto.elements {
        let kind = ElementKind::from_name(&block.kind)
            .ok_or_else(|| format!("Unknown element type \"{}\".", block.kind))?;
        for elem in &block.elems {
            let ids = parse_node_ids(elem.value.as_deref())
                .map_err(|e| format!("Element {}: {}", elem.id, e))?;
            if ids.len() != kind.num_nodes() {
                return Err(format!(
                    "Element {} carries {} nodes; {} expects {}.",
                    elem.id,
                    ids.len(),
                    block.kind,
                    kind.num_nodes()
                ));
            }
            let mut nodes = Vec::with_capacity(ids.len());
            for id in ids {
                nodes.push(node_index(id)?);
            }
            parsed_elements.push(SolidElement::new(elem.id, kind, nodes));
        }
    }
    for element in parsed_elements {
        let idx = mesh.connectivity.add_element(element);
        domain_elements.push(idx);
    }
    mesh.connectivity
        .add_domain("Part1", DomainClass::Solid, domain_elements);

    for surface in &mesh_dto.surfaces {
        let ids: Vec<i32> = surface.nodes.iter().map(|n| n.id).collect();
        mesh.surfaces.add(&surface.name, ids);
    }

    mesh.init_material_points();

    let model = match mat_dto.kind.as_str() {
        "neo-Hookean" => {
            let mu = mat_dto
                .mu
                .ok_or_else(|| "neo-Hookean material requires mu.".to_string())?;
            let kappa = mat_dto
                .kappa
                .ok_or_else(|| "neo-Hookean material requires kappa.".to_string())?;
            MaterialModel::NeoHookean(NeoHookean::new(mu, kappa))
        }
        "St. Venant-Kirchhoff" => {
            let lambda = mat_dto
                .lambda
                .ok_or_else(|| "St. Venant-Kirchhoff material requires lambda.".to_string())?;
            let mu = mat_dto
                .mu
                .ok_or_else(|| "St. Venant-Kirchhoff material requires mu.".to_string())?;
            MaterialModel::StVenantKirchhoff(StVenantKirchhoff::new(lambda, mu))
        }
        "uncoupled Mooney-Rivlin" => {
            let c1 = mat_dto
                .c1
                .ok_or_else(|| "uncoupled Mooney-Rivlin material requires c1.".to_string())?;
            let c2 = mat_dto
                .c2
                .ok_or_else(|| "uncoupled Mooney-Rivlin material requires c2.".to_string())?;
            MaterialModel::UncoupledMooneyRivlin(UncoupledMooneyRivlin::new(c1, c2))
        }
        other => return Err(format!("Unknown material type \"{}\".", other)),
    };
    let name = mat_dto.name.as_deref().unwrap_or("Material1");

    Ok((mesh, MaterialSystem::new(name, model)))
}

/// Parse and validate the parameter section
pub fn load_params(input: &VfmInput) -> Result<Vec<Parameter>, String> {
    let Some(dto) = &input.parameters else {
        return Ok(Vec::new());
    };

    let mut params = Vec::with_capacity(dto.params.len());
    for p in &dto.params {
        let (init, lo, hi, scale) = parse_param_tuple(p.value.as_deref())
            .map_err(|e| format!("Parameters[{}]: {}", p.name, e))?;
        params.push(Parameter::new(ParamSpec {
            name: p.name.clone(),
            init,
            lo,
            hi,
            scale,
        }));
    }
    Ok(params)
}

/// Load the measured displacement series, mapping external node ids
pub fn load_measured(input: &VfmInput, facts: &MeshFacts) -> Result<MeasuredSeries, String> {
    let mut out = MeasuredSeries::new(facts.n_nodes);
    let Some(dto) = &input.measured_displacements else {
        return Ok(out);
    };

    for (ordinal, slice) in dto.times.iter().enumerate() {
        let t = out.add_frame();
        let mut covered = std::collections::HashSet::new();
        for sample in slice.samples() {
            let idx = facts.node_index(sample.id).ok_or_else(|| {
                format!("Unknown node id in measured displacements: {}.", sample.id)
            })?;
            let [ux, uy, uz] = parse_vec3(sample.value.as_deref())
                .map_err(|e| format!("Measured displacement for node {}: {}", sample.id, e))?;
            out.frame_mut(t).u.set(idx, Vector3::new(ux, uy, uz));
            covered.insert(idx);
        }
        // Full-field data must cover every mesh node
        if covered.len() != facts.n_nodes {
            return Err(format!(
                "Measured displacement count ({}) does not match mesh node count ({}) in time slice {}.",
                covered.len(),
                facts.n_nodes,
                ordinal
            ));
        }
    }
    Ok(out)
}

/// Load the virtual displacement fields, mapping external node ids
pub fn load_virtuals(input: &VfmInput, facts: &MeshFacts) -> Result<VirtualFieldSet, String> {
    let Some(dto) = &input.virtual_displacements else {
        return Ok(VirtualFieldSet::new(facts.n_nodes, 0));
    };

    let fields = dto.all_fields();
    let mut out = VirtualFieldSet::new(facts.n_nodes, fields.len());
    for (v, field) in fields.iter().enumerate() {
        for slice in &field.times {
            let t = out.add_frame(v);
            for sample in slice.samples() {
                let idx = facts.node_index(sample.id).ok_or_else(|| {
                    format!("Unknown node id in virtual displacements: {}.", sample.id)
                })?;
                let [ux, uy, uz] = parse_vec3(sample.value.as_deref())
                    .map_err(|e| format!("Virtual displacement for node {}: {}", sample.id, e))?;
                out.frame_mut(v, t).u.set(idx, Vector3::new(ux, uy, uz));
            }
        }
    }
    Ok(out)
}

/// Load the measured surface-load series
pub fn load_loads(input: &VfmInput) -> Result<LoadSeries, String> {
    let mut out = LoadSeries::new();
    let Some(dto) = &input.measured_loads else {
        return Ok(out);
    };

    for (ordinal, slice) in dto.times.iter().enumerate() {
        let time = slice.t.unwrap_or(ordinal as f64);
        let t = out.add_frame(time);
        for surface in &slice.surfaces {
            let [fx, fy, fz] = parse_vec3(surface.value.as_deref())
                .map_err(|e| format!("Measured load on surface \"{}\": {}", surface.id, e))?;
            out.frame_mut(t).loads.push(SurfaceLoad {
                surface: surface.id.clone(),
                force: Vector3::new(fx, fy, fz),
            });
        }
    }
    Ok(out)
}
