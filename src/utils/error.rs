//! Error handling for streamify

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Converter error
#[derive(Error, Debug, Clone)]
#[allow(dead_code)]
pub enum Error {
    // ==================== Lexer / Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected {0}")]
    Expected(String, Span),

    #[error("Expected identifier")]
    ExpectedIdent { span: Span },

    #[error("Expected type")]
    ExpectedType { span: Span },

    #[error("Expected expression")]
    ExpectedExpr { span: Span },

    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Unbalanced delimiter")]
    UnbalancedDelimiter { span: Span },

    // ==================== Analysis Errors ====================

    #[error("Unknown loop node index: {index}")]
    UnknownLoopNode { index: usize, span: Span },

    #[error("Loop has no terminal operation")]
    MissingTerminal { span: Span },

    #[error("Analysis failure: {message}")]
    AnalysisFailure { message: String, span: Span },

    // ==================== Rendering Errors ====================

    #[error("Variable not available at point of use: {name}")]
    VariableUnavailable { name: String, span: Span },

    #[error("Cannot render terminal: {message}")]
    CannotRender { message: String, span: Span },

    // ==================== I/O ====================

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::Expected(_, span) => Some(*span),
            Self::ExpectedIdent { span } => Some(*span),
            Self::ExpectedType { span } => Some(*span),
            Self::ExpectedExpr { span } => Some(*span),
            Self::UnterminatedString { span } => Some(*span),
            Self::UnbalancedDelimiter { span } => Some(*span),
            Self::UnknownLoopNode { span, .. } => Some(*span),
            Self::MissingTerminal { span } => Some(*span),
            Self::AnalysisFailure { span, .. } => Some(*span),
            Self::VariableUnavailable { span, .. } => Some(*span),
            Self::CannotRender { span, .. } => Some(*span),
            Self::Io(_) => None,
        }
    }
}
