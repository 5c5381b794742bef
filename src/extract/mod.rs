//! Loop model extraction
//!
//! Turns one enhanced-for statement into an abstract loop model by
//! classifying its body statements against a fixed cascade of shapes.

pub mod if_shape;
pub mod reduce;
pub mod collect;
pub mod extractor;
pub mod grouping;

pub use extractor::{extract, ExtractContext, Rejection};
