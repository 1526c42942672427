//! Hyperelastic parameter identification via the Virtual Fields Method
//!
//! Reconstructs deformation-gradient fields from full-field nodal
//! displacement measurements, re-evaluates Cauchy and first Piola stresses
//! through a pluggable constitutive collaborator, balances internal against
//! external virtual work over a set of admissible virtual fields, and drives
//! the residual to zero with a box-constrained Levenberg-Marquardt iteration.
//!
//! # Architecture
//!
//! - [`mesh`]: the mesh collaborator (topology, named surfaces, frozen
//!   [`MeshFacts`] with quadrature weights and reference gradients)
//! - [`material`]: the constitutive collaborator (material points, models,
//!   named-parameter store)
//! - [`storage`]: nodal and ragged element×integration-point time series
//! - [`vfm`]: the identification core (kinematics, stress driver, work
//!   assemblers, problem builder, solve driver)
//! - [`linalg`]: the Levenberg-Marquardt arithmetic
//! - [`io`]: plot and virtual-work artifacts
//! - [`diag`]: leveled logging with scoped sinks

pub mod cancel;
pub mod config;
pub mod diag;
pub mod fem;
pub mod io;
pub mod linalg;
pub mod material;
pub mod mesh;
pub mod storage;
pub mod vfm;

pub use cancel::{CancelFlag, SignalGuard};
pub use config::VfmInput;
pub use fem::{GaussQuadrature, Hex20Basis, Hex8Basis, Tet10Basis, Tet4Basis};
pub use io::export_problem;
pub use linalg::{DiffMode, LevmarConfig, LevmarReport, StopReason};
pub use material::{
    CauchyEval, MaterialModel, MaterialPoint, MaterialSystem, NeoHookean, StVenantKirchhoff,
    UncoupledMooneyRivlin,
};
pub use mesh::{ElementKind, Mesh, MeshFacts, MeshGenerator, NamedSurfaces, SolidElement};
pub use storage::{
    DeformationSeries, LoadSeries, MeasuredSeries, NodalField, RaggedTensorField, StressSeries,
    SurfaceLoad, VirtualDeformationSet, VirtualFieldSet,
};
pub use vfm::{
    solve_problem, Kinematics, ParamSpec, Parameter, ParameterApplier, SolveReport, SolverKind,
    SolverOptions, StressEval, SurfaceMap, VfmProblem, VfmState,
};
