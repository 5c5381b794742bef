//! Frontend module - Lexer, Parser, AST, Printer

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod printer;
