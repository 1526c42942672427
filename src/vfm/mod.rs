//! The identification core
//!
//! Kinematic reconstruction, constitutive driving, virtual-work assembly,
//! and the bounded Levenberg–Marquardt orchestration, tied together by the
//! problem builder.

pub mod driver;
pub mod external_work;
pub mod internal_work;
pub mod kinematics;
pub mod params;
pub mod problem;
pub mod providers;
pub mod stress;
pub mod validation;
pub mod virtual_fields;

pub use driver::{solve_problem, SolveReport};
pub use external_work::SurfaceMap;
pub use kinematics::Kinematics;
pub use params::{ParamSpec, Parameter, ParameterApplier};
pub use problem::{SolverKind, SolverOptions, VfmProblem, VfmState};
pub use providers::{MaterialProvider, MeshMaterialProvider, MeshShapeProvider, ShapeProvider};
pub use stress::StressEval;
