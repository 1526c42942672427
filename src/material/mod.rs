pub mod model;
pub mod point;
pub mod system;

pub use model::{CauchyEval, MaterialModel, NeoHookean, StVenantKirchhoff, UncoupledMooneyRivlin};
pub use point::MaterialPoint;
pub use system::{MaterialSystem, ParamSlot};
