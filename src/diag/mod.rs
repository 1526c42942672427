//! Diagnostics: leveled logging with scoped sinks, plus formatted tables and
//! summaries of the identification state.

pub mod logger;
pub mod printers;

pub use logger::{debug, emit, error, info, level, set_level, warn};
pub use logger::{BufferSink, LogLevel, LogSink, ScopedSink};
pub use printers::{
    dump_element_tensors, dump_nodes, mat3_to_string, parameter_table, summary_deformation,
    summary_loads, summary_measured, summary_stresses, summary_virtuals, vec3_to_string,
    virtual_work_table,
};
