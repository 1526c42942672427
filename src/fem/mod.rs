pub mod basis;
pub mod quadrature;

pub use basis::{reference_gradients, Hex20Basis, Hex8Basis, Tet10Basis, Tet4Basis};
pub use quadrature::GaussQuadrature;
