//! End-to-end runs driven by complete XML input documents
//!
//! These tests exercise the ingestion path the CLI uses: parse the document,
//! build the model and problem, solve, export, and read the artifacts back.

use approx::assert_relative_eq;
use nalgebra::Vector3;

use vfm_ident::io::{read_plot, PlotValues};
use vfm_ident::{
    solve_problem, CancelFlag, LoadSeries, MaterialModel, MaterialSystem, MeasuredSeries,
    MeshFacts, MeshGenerator, ParamSpec, Parameter, SolverKind, SolverOptions, SurfaceLoad,
    UncoupledMooneyRivlin, VfmInput, VfmProblem, VirtualFieldSet,
};

fn forward_piola_xx(mu: f64, kappa: f64, lambda: f64) -> f64 {
    (mu * (lambda * lambda - 1.0) + kappa * lambda.ln()) / lambda
}

/// Complete single-cube document: model, data, options
fn uniaxial_document(save_virtual_work: &str) -> String {
    let lambda: f64 = 1.1;
    let force = forward_piola_xx(1.0, 1000.0, lambda);

    // Unit-cube nodes in hex8 order
    let coords: [(f64, f64, f64); 8] = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 1.0),
        (0.0, 1.0, 1.0),
    ];

    let mut nodes = String::new();
    let mut measured = String::new();
    let mut virtuals = String::new();
    for (i, (x, y, z)) in coords.iter().enumerate() {
        let id = i + 1;
        nodes.push_str(&format!(
            "<node id=\"{}\">{}, {}, {}</node>",
            id, x, y, z
        ));
        measured.push_str(&format!(
            "<node id=\"{}\">{}, 0.0, 0.0</node>",
            id,
            (lambda - 1.0) * x
        ));
        virtuals.push_str(&format!("<node id=\"{}\">{}, 0.0, 0.0</node>", id, x));
    }

    format!(
        r#"<vfm_input version="2.0">
            <Mesh>
                <Nodes>{nodes}</Nodes>
                <Elements type="hex8">
                    <elem id="1">1, 2, 3, 4, 5, 6, 7, 8</elem>
                </Elements>
                <Surface name="x+">
                    <node id="2"/>
                    <node id="3"/>
                    <node id="6"/>
                    <node id="7"/>
                </Surface>
            </Mesh>
            <Material type="neo-Hookean" name="rubber">
                <mu>0.7</mu>
                <kappa>1000.0</kappa>
            </Material>
            <Parameters>
                <param name="mu">0.7, 0.1, 10.0, 1.0</param>
            </Parameters>
            <MeasuredDisplacements>
                <time t="0">{measured}</time>
            </MeasuredDisplacements>
            <VirtualDisplacements>
                <virtualdisplacement id="0">
                    <time t="0">{virtuals}</time>
                </virtualdisplacement>
            </VirtualDisplacements>
            <MeasuredLoads>
                <time t="0">
                    <surface id="x+">{force}, 0.0, 0.0</surface>
                </time>
            </MeasuredLoads>
            <Options type="constrained-levmar">
                <max_iterations>100</max_iterations>
                <save_virtual_work>{save_virtual_work}</save_virtual_work>
            </Options>
        </vfm_input>"#
    )
}

#[test]
fn full_document_identifies_and_exports() {
    let work_path = std::env::temp_dir().join("vfm_model_input_work.txt");
    let doc = uniaxial_document(work_path.to_str().unwrap());

    let input = VfmInput::from_str(&doc).unwrap();
    let mut problem = VfmProblem::from_input(&input).unwrap();
    problem.options.log_evaluations = false;

    assert_eq!(problem.facts.n_nodes, 8);
    assert_eq!(problem.external_work.len(), 1);

    let cancel = CancelFlag::new();
    let report = solve_problem(&mut problem, &cancel).unwrap();
    assert_relative_eq!(report.theta[0], 1.0, epsilon = 1e-6);

    // Virtual-work table was emitted alongside the solve
    let table = std::fs::read_to_string(&work_path).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "#Step, IVW1, EVW1");
    assert_eq!(lines.len(), 2);

    // Export and read the plot artifact back
    let plot_path = std::env::temp_dir().join("vfm_model_input_plot.vfp");
    vfm_ident::export_problem(&problem, &plot_path).unwrap();
    let plot = read_plot(&plot_path).unwrap();

    assert_eq!(plot.n_nodes, 8);
    assert_eq!(plot.n_elems, 1);
    assert_eq!(plot.frames.len(), 1);
    assert_eq!(plot.variables.len(), 6);
    assert_eq!(plot.variables[0].0, "displacement");

    // Measured displacement of node 2 (dense index 1) is 0.1 in x
    match &plot.frames[0].data[0] {
        PlotValues::NodeVector(values) => {
            assert_relative_eq!(values[1].x, 0.1, epsilon = 1e-6);
            assert_relative_eq!(values[0].x, 0.0, epsilon = 1e-9);
        }
        _ => panic!("unexpected payload"),
    }

    // Element-averaged measured deformation gradient is diag(1.1, 1, 1)
    match &plot.frames[0].data[1] {
        PlotValues::ElementTensor(values) => {
            assert_relative_eq!(values[0][(0, 0)], 1.1, epsilon = 1e-6);
            assert_relative_eq!(values[0][(1, 1)], 1.0, epsilon = 1e-6);
            assert_relative_eq!(values[0][(0, 1)], 0.0, epsilon = 1e-9);
        }
        _ => panic!("unexpected payload"),
    }

    std::fs::remove_file(&work_path).ok();
    std::fs::remove_file(&plot_path).ok();
}

#[test]
fn measured_slice_must_cover_every_node() {
    // Drop one node from the measured block: setup must fail
    let work_path = std::env::temp_dir().join("vfm_model_input_cover.txt");
    let doc = uniaxial_document(work_path.to_str().unwrap())
        .replacen("<node id=\"8\">0, 0.0, 0.0</node>", "", 1);

    let input = VfmInput::from_str(&doc).unwrap();
    let err = VfmProblem::from_input(&input).unwrap_err();
    assert!(err.contains("does not match mesh node count"), "message was: {}", err);
}

#[test]
fn mixed_element_mesh_builds_ragged_facts() {
    // One hex8 cube plus a tet4 capping its x+ face: 12 integration points
    let doc = r#"<vfm_input version="2.0">
        <Mesh>
            <Nodes>
                <node id="1">0, 0, 0</node>
                <node id="2">1, 0, 0</node>
                <node id="3">1, 1, 0</node>
                <node id="4">0, 1, 0</node>
                <node id="5">0, 0, 1</node>
                <node id="6">1, 0, 1</node>
                <node id="7">1, 1, 1</node>
                <node id="8">0, 1, 1</node>
                <node id="9">2, 0.5, 0.5</node>
            </Nodes>
            <Elements type="hex8">
                <elem id="1">1, 2, 3, 4, 5, 6, 7, 8</elem>
            </Elements>
            <Elements type="tet4">
                <elem id="2">2, 3, 6, 9</elem>
            </Elements>
        </Mesh>
        <Material type="neo-Hookean" name="rubber">
            <mu>1.0</mu>
            <kappa>100.0</kappa>
        </Material>
    </vfm_input>"#;

    let input = VfmInput::from_str(doc).unwrap();
    let (mesh, system) = vfm_ident::vfm::problem::build_model(&input).unwrap();
    assert_eq!(system.model.name(), "neo-Hookean");
    assert_eq!(mesh.num_elements(), 2);
    assert_eq!(mesh.material_points.len(), 12);

    let facts = MeshFacts::build(&mesh).unwrap();
    assert_eq!(facts.gp_per_elem, vec![8, 4]);
    assert_eq!(facts.offset, vec![0, 8, 12]);
    for &w in &facts.jw {
        assert!(w > 0.0);
    }
}

#[test]
fn unconstrained_solver_kind_recovers_parameter() {
    let mesh = MeshGenerator::unit_cube();
    let facts = MeshFacts::build(&mesh).unwrap();
    let kappa = 1000.0;
    let lambda = 1.1;

    let mut measured = MeasuredSeries::new(facts.n_nodes);
    let t = measured.add_frame();
    for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
        measured
            .frame_mut(t)
            .u
            .set(idx, Vector3::new((lambda - 1.0) * p.x, 0.0, 0.0));
    }

    let mut virtuals = VirtualFieldSet::new(facts.n_nodes, 1);
    let t = virtuals.add_frame(0);
    for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
        virtuals
            .frame_mut(0, t)
            .u
            .set(idx, Vector3::new(p.x, 0.0, 0.0));
    }

    let mut loads = LoadSeries::new();
    let t = loads.add_frame(0.0);
    loads.frame_mut(t).loads.push(SurfaceLoad {
        surface: "x+".into(),
        force: Vector3::new(forward_piola_xx(1.0, kappa, lambda), 0.0, 0.0),
    });

    let system = MaterialSystem::new(
        "rubber",
        MaterialModel::NeoHookean(vfm_ident::NeoHookean::new(0.7, kappa)),
    );
    let params = vec![Parameter::new(ParamSpec {
        name: "mu".into(),
        init: 0.7,
        lo: 0.1,
        hi: 10.0,
        scale: 1.0,
    })];

    let mut problem = VfmProblem::prepare(
        mesh,
        facts,
        system,
        params,
        measured,
        virtuals,
        loads,
        SolverOptions {
            kind: SolverKind::Levmar,
            log_evaluations: false,
            ..SolverOptions::default()
        },
    )
    .unwrap();

    let cancel = CancelFlag::new();
    let report = solve_problem(&mut problem, &cancel).unwrap();
    assert_relative_eq!(report.theta[0], 1.0, epsilon = 1e-6);
}

#[test]
fn tet_mesh_identification() {
    // The same uniaxial setup on a six-tet cube: the affine elements carry
    // the uniform deformation exactly, so the recovery is as sharp as on hex8
    let mesh = MeshGenerator::tet_block(1, 1, 1, 1.0, 1.0, 1.0);
    let facts = MeshFacts::build(&mesh).unwrap();
    assert_eq!(facts.n_elems, 6);

    let kappa = 1000.0;
    let lambda = 1.1;

    let mut measured = MeasuredSeries::new(facts.n_nodes);
    let t = measured.add_frame();
    for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
        measured
            .frame_mut(t)
            .u
            .set(idx, Vector3::new((lambda - 1.0) * p.x, 0.0, 0.0));
    }

    let mut virtuals = VirtualFieldSet::new(facts.n_nodes, 1);
    vfm_ident::vfm::virtual_fields::fill_uniform_extension(&mesh, &mut virtuals, 0, 1, 0);

    let mut loads = LoadSeries::new();
    let t = loads.add_frame(0.0);
    loads.frame_mut(t).loads.push(SurfaceLoad {
        surface: "x+".into(),
        force: Vector3::new(forward_piola_xx(1.0, kappa, lambda), 0.0, 0.0),
    });

    let system = MaterialSystem::new(
        "rubber",
        MaterialModel::NeoHookean(vfm_ident::NeoHookean::new(0.7, kappa)),
    );
    let params = vec![Parameter::new(ParamSpec {
        name: "mu".into(),
        init: 0.7,
        lo: 0.1,
        hi: 10.0,
        scale: 1.0,
    })];

    let mut problem = VfmProblem::prepare(
        mesh,
        facts,
        system,
        params,
        measured,
        virtuals,
        loads,
        SolverOptions {
            log_evaluations: false,
            ..SolverOptions::default()
        },
    )
    .unwrap();

    let cancel = CancelFlag::new();
    let report = solve_problem(&mut problem, &cancel).unwrap();
    assert_relative_eq!(report.theta[0], 1.0, epsilon = 1e-6);
}

#[test]
fn st_venant_kirchhoff_identification() {
    // F = diag(λ, 1, 1): P = F S gives P_xx = λ (λ_L + 2μ) E₁₁
    let mesh = MeshGenerator::unit_cube();
    let facts = MeshFacts::build(&mesh).unwrap();
    let lame = 2.0;
    let (mu_true, mu_init) = (1.5, 1.0);
    let stretch = 1.08_f64;
    let e11 = 0.5 * (stretch * stretch - 1.0);

    let mut measured = MeasuredSeries::new(facts.n_nodes);
    let t = measured.add_frame();
    for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
        measured
            .frame_mut(t)
            .u
            .set(idx, Vector3::new((stretch - 1.0) * p.x, 0.0, 0.0));
    }

    let mut virtuals = VirtualFieldSet::new(facts.n_nodes, 1);
    vfm_ident::vfm::virtual_fields::fill_uniform_extension(&mesh, &mut virtuals, 0, 1, 0);

    let mut loads = LoadSeries::new();
    let t = loads.add_frame(0.0);
    loads.frame_mut(t).loads.push(SurfaceLoad {
        surface: "x+".into(),
        force: Vector3::new(stretch * (lame + 2.0 * mu_true) * e11, 0.0, 0.0),
    });

    let system = MaterialSystem::new(
        "steel",
        MaterialModel::StVenantKirchhoff(vfm_ident::StVenantKirchhoff::new(lame, mu_init)),
    );
    let params = vec![Parameter::new(ParamSpec {
        name: "mu".into(),
        init: mu_init,
        lo: 0.1,
        hi: 10.0,
        scale: 1.0,
    })];

    let mut problem = VfmProblem::prepare(
        mesh,
        facts,
        system,
        params,
        measured,
        virtuals,
        loads,
        SolverOptions {
            log_evaluations: false,
            ..SolverOptions::default()
        },
    )
    .unwrap();

    let cancel = CancelFlag::new();
    let report = solve_problem(&mut problem, &cancel).unwrap();
    assert_relative_eq!(report.theta[0], mu_true, epsilon = 1e-6);
}

#[test]
fn legacy_virtual_displacement_form() {
    // Bare <time> blocks under VirtualDisplacements make one anonymous field
    let work_path = std::env::temp_dir().join("vfm_model_input_legacy.txt");
    let doc = uniaxial_document(work_path.to_str().unwrap())
        .replace("<virtualdisplacement id=\"0\">", "")
        .replace("</virtualdisplacement>", "");

    let input = VfmInput::from_str(&doc).unwrap();
    let fields = input.virtual_displacements.as_ref().unwrap().all_fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].id, None);

    let mut problem = VfmProblem::from_input(&input).unwrap();
    problem.options.log_evaluations = false;
    problem.options.save_virtual_work = None;

    let cancel = CancelFlag::new();
    let report = solve_problem(&mut problem, &cancel).unwrap();
    assert_relative_eq!(report.theta[0], 1.0, epsilon = 1e-6);
}

#[test]
fn export_pads_short_timelines() {
    // Virtual field with one frame against three measured frames: the export
    // pins the virtual data to frame 0 and emits identity/zero fallbacks only
    // where a store genuinely has no data
    let mesh = MeshGenerator::unit_cube();
    let facts = MeshFacts::build(&mesh).unwrap();

    let mut measured = MeasuredSeries::new(facts.n_nodes);
    for _ in 0..3 {
        measured.add_frame();
    }

    let mut virtuals = VirtualFieldSet::new(facts.n_nodes, 1);
    vfm_ident::vfm::virtual_fields::fill_uniform_extension(&mesh, &mut virtuals, 0, 1, 0);

    let problem = VfmProblem::prepare(
        mesh,
        facts,
        MaterialSystem::new(
            "rubber",
            MaterialModel::NeoHookean(vfm_ident::NeoHookean::new(1.0, 100.0)),
        ),
        Vec::new(),
        measured,
        virtuals,
        LoadSeries::new(),
        SolverOptions {
            log_evaluations: false,
            ..SolverOptions::default()
        },
    )
    .unwrap();

    let path = std::env::temp_dir().join("vfm_export_pad_test.vfp");
    vfm_ident::export_problem(&problem, &path).unwrap();
    let plot = read_plot(&path).unwrap();

    assert_eq!(plot.frames.len(), 3);
    // Virtual deformation gradient (last variable) is pinned to its single
    // frame: F* = diag(2, 1, 1) at every time index
    for frame in &plot.frames {
        match frame.data.last().unwrap() {
            PlotValues::ElementTensor(values) => {
                assert_relative_eq!(values[0][(0, 0)], 2.0, epsilon = 1e-6);
                assert_relative_eq!(values[0][(1, 1)], 1.0, epsilon = 1e-6);
            }
            _ => panic!("unexpected payload"),
        }
    }
    std::fs::remove_file(&path).ok();
}

#[test]
fn uncoupled_material_identification() {
    // Equibiaxial in-plane stretch; the uncoupled driver recovers c1
    let lambda = 1.15;
    let (c1_true, c1_init) = (0.8, 0.5);

    let build = |c1: f64, loads: LoadSeries| -> VfmProblem {
        let mesh = MeshGenerator::unit_cube();
        let facts = MeshFacts::build(&mesh).unwrap();

        let mut measured = MeasuredSeries::new(facts.n_nodes);
        let t = measured.add_frame();
        for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
            measured.frame_mut(t).u.set(
                idx,
                Vector3::new((lambda - 1.0) * p.x, (lambda - 1.0) * p.y, 0.0),
            );
        }

        let mut virtuals = VirtualFieldSet::new(facts.n_nodes, 1);
        let t = virtuals.add_frame(0);
        for (idx, p) in mesh.geometry.nodes.iter().enumerate() {
            virtuals
                .frame_mut(0, t)
                .u
                .set(idx, Vector3::new(p.x, 0.0, 0.0));
        }

        let system = MaterialSystem::new(
            "membrane",
            MaterialModel::UncoupledMooneyRivlin(UncoupledMooneyRivlin::new(c1, 0.0)),
        );
        let params = vec![Parameter::new(ParamSpec {
            name: "c1".into(),
            init: c1,
            lo: 0.01,
            hi: 10.0,
            scale: 1.0,
        })];

        VfmProblem::prepare(
            mesh,
            facts,
            system,
            params,
            measured,
            virtuals,
            loads,
            SolverOptions {
                log_evaluations: false,
                ..SolverOptions::default()
            },
        )
        .unwrap()
    };

    // Forward pass at the ground truth gives the grip resultant
    let truth = build(c1_true, LoadSeries::new());
    let iw_true = truth.internal_work_vector().unwrap()[0];
    assert!(iw_true.abs() > 0.0);

    let mut loads = LoadSeries::new();
    let t = loads.add_frame(0.0);
    loads.frame_mut(t).loads.push(SurfaceLoad {
        surface: "x+".into(),
        force: Vector3::new(iw_true, 0.0, 0.0),
    });

    let mut problem = build(c1_init, loads);
    let cancel = CancelFlag::new();
    let report = solve_problem(&mut problem, &cancel).unwrap();

    assert_relative_eq!(report.theta[0], c1_true, epsilon = 1e-6);
}
