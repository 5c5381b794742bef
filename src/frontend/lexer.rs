//! Lexer for the Java-like input subset
//!
//! Converts source code into a stream of tokens. Literals keep their raw
//! lexeme so the renderer can reproduce them byte-for-byte.
#![allow(dead_code)]

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Span;

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// File ID for span tracking
    file_id: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str, file_id: usize) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            file_id,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.file_id)
    }

    /// Create a token with the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// The raw lexeme from start to current position
    fn lexeme(&self) -> String {
        self.source[self.start..self.pos].iter().collect()
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                // Whitespace
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment (no nesting in the input language)
                '/' if self.peek_next() == Some('*') => {
                    self.advance(); // skip /
                    self.advance(); // skip *
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.lexeme();
        let kind = TokenKind::keyword_from_str(&text)
            .unwrap_or(TokenKind::Ident(text));

        self.make_token(kind)
    }

    /// Read a number literal, keeping the raw text (suffixes included)
    fn read_number(&mut self) -> Token {
        // Hex literal
        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() || c == '_' || c == 'l' || c == 'L' {
                    self.advance();
                } else {
                    break;
                }
            }
            return self.make_token(TokenKind::NumberLit(self.lexeme()));
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        // Decimal point
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Exponent
        if matches!(self.peek(), Some('e') | Some('E'))
            && matches!(self.peek_next(), Some(c) if c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Type suffix (1L, 1.0f, 2.5d)
        if matches!(self.peek(), Some('l') | Some('L') | Some('f') | Some('F') | Some('d') | Some('D')) {
            self.advance();
        }

        self.make_token(TokenKind::NumberLit(self.lexeme()))
    }

    /// Read a string literal, raw text with quotes
    fn read_string(&mut self) -> Token {
        self.advance(); // consume opening quote

        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance(); // consume closing quote
                break;
            } else if c == '\\' {
                self.advance();
                self.advance();
            } else if c == '\n' {
                // Unterminated string
                break;
            } else {
                self.advance();
            }
        }

        self.make_token(TokenKind::StringLit(self.lexeme()))
    }

    /// Read a character literal, raw text with quotes
    fn read_char(&mut self) -> Token {
        self.advance(); // consume opening quote

        if self.peek() == Some('\\') {
            self.advance();
            self.advance();
        } else {
            self.advance();
        }

        if self.peek() == Some('\'') {
            self.advance();
        }

        self.make_token(TokenKind::CharLit(self.lexeme()))
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.pos;

        if self.is_at_end() {
            return Token::eof(self.make_span());
        }

        let Some(c) = self.advance() else {
            return Token::eof(self.make_span());
        };

        // Identifiers and keywords
        if c.is_alphabetic() || c == '_' || c == '$' {
            self.pos -= 1; // back up
            return self.read_identifier();
        }

        // Numbers
        if c.is_ascii_digit() {
            self.pos -= 1; // back up
            return self.read_number();
        }

        // String literals
        if c == '"' {
            self.pos -= 1; // back up
            return self.read_string();
        }

        // Character literals
        if c == '\'' {
            self.pos -= 1; // back up
            return self.read_char();
        }

        // Operators and punctuation
        let kind = match c {
            '+' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PlusEq
                } else if self.peek() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::MinusEq
                } else if self.peek() == Some('-') {
                    self.advance();
                    TokenKind::MinusMinus
                } else if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Le
                } else if self.peek() == Some('<') {
                    self.advance();
                    TokenKind::Shl
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ge
                } else if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Shr
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    TokenKind::And
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    TokenKind::Or
                }
            }
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            ':' => {
                if self.peek() == Some(':') {
                    self.advance();
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '@' => TokenKind::At,
            _ => TokenKind::Unknown(c),
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("for (String s : names) { }", 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::For));
        assert!(matches!(tokens[1].kind, TokenKind::LParen));
        assert!(matches!(tokens[2].kind, TokenKind::Ident(ref s) if s == "String"));
        assert!(matches!(tokens[3].kind, TokenKind::Ident(ref s) if s == "s"));
        assert!(matches!(tokens[4].kind, TokenKind::Colon));
        assert!(matches!(tokens[5].kind, TokenKind::Ident(ref s) if s == "names"));
        assert!(matches!(tokens[6].kind, TokenKind::RParen));
        assert!(matches!(tokens[7].kind, TokenKind::LBrace));
        assert!(matches!(tokens[8].kind, TokenKind::RBrace));
        assert!(matches!(tokens[9].kind, TokenKind::Eof));
    }

    #[test]
    fn test_numbers_keep_raw_text() {
        let mut lexer = Lexer::new("42 3.14 1L 1.0f 0xFF", 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::NumberLit(ref s) if s == "42"));
        assert!(matches!(tokens[1].kind, TokenKind::NumberLit(ref s) if s == "3.14"));
        assert!(matches!(tokens[2].kind, TokenKind::NumberLit(ref s) if s == "1L"));
        assert!(matches!(tokens[3].kind, TokenKind::NumberLit(ref s) if s == "1.0f"));
        assert!(matches!(tokens[4].kind, TokenKind::NumberLit(ref s) if s == "0xFF"));
    }

    #[test]
    fn test_strings_keep_quotes() {
        let mut lexer = Lexer::new(r#""hello\nworld""#, 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::StringLit(ref s) if s == r#""hello\nworld""#));
    }

    #[test]
    fn test_increment_and_compound_ops() {
        let mut lexer = Lexer::new("i++ --j x += 1", 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[1].kind, TokenKind::PlusPlus));
        assert!(matches!(tokens[2].kind, TokenKind::MinusMinus));
        assert!(matches!(tokens[5].kind, TokenKind::PlusEq));
    }

    #[test]
    fn test_keywords() {
        let mut lexer = Lexer::new("if else continue break return new final synchronized", 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::If));
        assert!(matches!(tokens[1].kind, TokenKind::Else));
        assert!(matches!(tokens[2].kind, TokenKind::Continue));
        assert!(matches!(tokens[3].kind, TokenKind::Break));
        assert!(matches!(tokens[4].kind, TokenKind::Return));
        assert!(matches!(tokens[5].kind, TokenKind::New));
        assert!(matches!(tokens[6].kind, TokenKind::Final));
        assert!(matches!(tokens[7].kind, TokenKind::Synchronized));
    }

    #[test]
    fn test_arrow_and_method_reference() {
        let mut lexer = Lexer::new("x -> f(x) Integer::sum a - b", 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[1].kind, TokenKind::Arrow));
        assert!(matches!(tokens[7].kind, TokenKind::ColonColon));
        assert!(matches!(tokens[10].kind, TokenKind::Minus));
    }

    #[test]
    fn test_comments_skipped() {
        let mut lexer = Lexer::new("a // line\n/* block */ b", 0);
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0].kind, TokenKind::Ident(ref s) if s == "a"));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "b"));
        assert!(matches!(tokens[2].kind, TokenKind::Eof));
    }
}
