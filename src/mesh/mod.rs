pub mod facts;
pub mod generator;
pub mod geometry;
pub mod quality;
pub mod surfaces;
pub mod topology;

pub use facts::MeshFacts;
pub use generator::MeshGenerator;
pub use geometry::{Geometry, Mesh};
pub use quality::{assess_mesh_quality, MeshQuality};
pub use surfaces::NamedSurfaces;
pub use topology::{Connectivity, Domain, DomainClass, ElementKind, SolidElement};
