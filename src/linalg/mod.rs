pub mod levmar;

pub use levmar::{minimize, DiffMode, LevmarConfig, LevmarReport, StopReason};
