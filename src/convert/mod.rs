//! Whole-file conversion driver

pub mod driver;
pub mod report;

pub use driver::{convert_source, convert_to_loops, Conversion};
pub use report::{LoopReport, Report};
