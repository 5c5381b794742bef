//! Token definitions for the Java-like input subset
#![allow(dead_code)]

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// if
    If,
    /// else
    Else,
    /// for
    For,
    /// while
    While,
    /// return
    Return,
    /// break
    Break,
    /// continue
    Continue,
    /// throw
    Throw,
    /// try
    Try,
    /// catch
    Catch,
    /// finally
    Finally,
    /// switch
    Switch,
    /// synchronized
    Synchronized,
    /// new
    New,
    /// final
    Final,
    /// true
    True,
    /// false
    False,
    /// null
    Null,

    // ============ Identifiers and Literals ============
    /// Identifier (variable name, type name, method name)
    Ident(String),
    /// Number literal, raw text including any suffix (42, 3.14, 1L, 1.0f)
    NumberLit(String),
    /// String literal, raw text including quotes
    StringLit(String),
    /// Character literal, raw text including quotes
    CharLit(String),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// !
    Not,
    /// &
    And,
    /// |
    Or,
    /// ^
    Caret,
    /// <<
    Shl,
    /// >>
    Shr,
    /// +=
    PlusEq,
    /// -=
    MinusEq,
    /// *=
    StarEq,
    /// /=
    SlashEq,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// ~
    Tilde,
    /// .
    Dot,
    /// ?
    Question,
    /// -> (lambda)
    Arrow,
    /// :: (method reference)
    ColonColon,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,
    /// @ (annotation)
    At,

    // ============ Special ============
    /// End of file
    Eof,
    /// Unknown/invalid character
    Unknown(char),
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "throw" => Some(TokenKind::Throw),
            "try" => Some(TokenKind::Try),
            "catch" => Some(TokenKind::Catch),
            "finally" => Some(TokenKind::Finally),
            "switch" => Some(TokenKind::Switch),
            "synchronized" => Some(TokenKind::Synchronized),
            "new" => Some(TokenKind::New),
            "final" => Some(TokenKind::Final),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    /// Get the precedence of a binary operator (for Pratt parsing)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            // Logical OR
            TokenKind::OrOr => Some(2),

            // Logical AND
            TokenKind::AndAnd => Some(3),

            // Bitwise OR
            TokenKind::Or => Some(4),

            // Bitwise XOR
            TokenKind::Caret => Some(5),

            // Bitwise AND
            TokenKind::And => Some(6),

            // Equality
            TokenKind::EqEq | TokenKind::Ne => Some(7),

            // Comparison
            TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => Some(8),

            // Shift
            TokenKind::Shl | TokenKind::Shr => Some(9),

            // Additive
            TokenKind::Plus | TokenKind::Minus => Some(10),

            // Multiplicative (highest for binary)
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(11),

            _ => None,
        }
    }

    /// Check if this token is an assignment operator (= += -= *= /=)
    pub fn is_assignment_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
        )
    }
}
