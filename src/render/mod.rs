//! Rendering extracted models to replacement source text

pub mod pipeline;
pub mod loopback;

use crate::utils::Span;

/// A single replacement of a source region
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// The region being replaced
    pub span: Span,
    pub replacement: String,
    /// Simple names the replacement needs in scope (import candidates)
    pub required_symbols: Vec<&'static str>,
}

impl Rewrite {
    pub fn new(span: Span, replacement: String, required_symbols: Vec<&'static str>) -> Self {
        Self { span, replacement, required_symbols }
    }
}
