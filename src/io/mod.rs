pub mod export;
pub mod plot;
pub mod virtual_work;

pub use export::export_problem;
pub use plot::{read_plot, FrameData, PlotDocument, PlotFile, PlotValues, PlotVariableKind};
