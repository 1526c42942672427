pub mod nodal;
pub mod tensor;

pub use nodal::{
    LoadFrame, LoadSeries, MeasuredFrame, MeasuredSeries, NodalField, SurfaceLoad, VirtualFieldSet,
    VirtualFrame,
};
pub use tensor::{
    DeformationSeries, RaggedTensorField, StressFrame, StressSeries, VirtualDeformationSet,
};
