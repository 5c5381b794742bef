//! Parser for the Java-like input subset
//!
//! Recursive descent parser with Pratt parsing for expressions. Statements
//! that look like declarations are resolved by bounded backtracking.

use crate::frontend::token::{Token, TokenKind};
use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::utils::{Error, Result, Span};

/// Primitive type names, the only legal cast targets in the subset
const PRIMITIVES: &[&str] = &["byte", "short", "char", "int", "long", "float", "double", "boolean"];

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Self {
        Self {
            tokens: lexer.tokenize(),
            pos: 0,
        }
    }

    /// Parse a source string directly
    pub fn from_source(source: &str, file_id: usize) -> Self {
        Self::new(Lexer::new(source, file_id))
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // The lexer always terminates the stream with an Eof token
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(Error::UnexpectedToken {
                expected: format!("{:?}", expected),
                got: format!("{:?}", self.current_kind()),
                span: self.current().span,
            })
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program (a statement sequence)
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::new();

        while !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }

        Ok(Program { stmts })
    }

    /// Parse a single statement
    pub fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.current_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for_each(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Synchronized => self.parse_synchronized(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Ok(Stmt::Empty { span })
            }
            TokenKind::Final => self.parse_decl(true),
            TokenKind::Ident(_) => {
                // label: statement
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Colon)) {
                    return self.parse_labeled();
                }
                // Try a declaration first, fall back to an expression statement
                let saved = self.pos;
                match self.parse_decl(false) {
                    Ok(stmt) => Ok(stmt),
                    Err(_) => {
                        self.pos = saved;
                        self.parse_expr_stmt()
                    }
                }
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.current().span;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Block { stmts, span: start.merge(&self.prev_span()) })
    }

    /// Parse a statement body: a block or a single statement
    fn parse_body(&mut self) -> Result<Stmt> {
        if self.check(&TokenKind::LBrace) {
            Ok(Stmt::Block(self.parse_block()?))
        } else {
            self.parse_stmt()
        }
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_body()?);
        let else_branch = if self.consume(&TokenKind::Else) {
            Some(Box::new(self.parse_body()?))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            span: start.merge(&self.prev_span()),
        })
    }

    /// Parse an enhanced for statement: for ([final] Type var : source) body
    fn parse_for_each(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let elem_final = self.consume(&TokenKind::Final);
        let elem_ty = self.parse_type()?;
        let var = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let source = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_body()?);

        Ok(Stmt::ForEach {
            elem_ty,
            elem_final,
            var,
            source,
            body,
            span: start.merge(&self.prev_span()),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_body()?);

        Ok(Stmt::While { cond, body, span: start.merge(&self.prev_span()) })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Return { value, span: start.merge(&self.prev_span()) })
    }

    fn parse_break(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Break)?;
        let label = if matches!(self.current_kind(), TokenKind::Ident(_)) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Break { label, span: start.merge(&self.prev_span()) })
    }

    fn parse_continue(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Continue)?;
        let label = if matches!(self.current_kind(), TokenKind::Ident(_)) {
            Some(self.parse_ident()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Continue { label, span: start.merge(&self.prev_span()) })
    }

    fn parse_throw(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Throw)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Throw { value, span: start.merge(&self.prev_span()) })
    }

    fn parse_try(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Try)?;
        let body = self.parse_block()?;

        let mut catches = Vec::new();
        while self.check(&TokenKind::Catch) {
            let cstart = self.advance().span;
            self.expect(TokenKind::LParen)?;
            let ty = self.parse_type()?;
            let name = self.parse_ident()?;
            self.expect(TokenKind::RParen)?;
            let cbody = self.parse_block()?;
            catches.push(CatchClause {
                ty,
                name,
                body: cbody,
                span: cstart.merge(&self.prev_span()),
            });
        }

        let finally = if self.consume(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::Try { body, catches, finally, span: start.merge(&self.prev_span()) })
    }

    /// Parse a switch statement, skipping its braced body. Switch bodies are
    /// never classified; the statement only needs to be detectable.
    fn parse_switch(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Switch)?;
        self.expect(TokenKind::LParen)?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::LBrace)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(Error::UnbalancedDelimiter { span: self.current().span });
            }
            match self.advance().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }

        Ok(Stmt::Switch { scrutinee, span: start.merge(&self.prev_span()) })
    }

    fn parse_synchronized(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Synchronized)?;
        self.expect(TokenKind::LParen)?;
        let lock = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;

        Ok(Stmt::Synchronized { lock, body, span: start.merge(&self.prev_span()) })
    }

    fn parse_labeled(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        let label = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let body = Box::new(self.parse_stmt()?);

        Ok(Stmt::Labeled { label, body, span: start.merge(&self.prev_span()) })
    }

    /// Parse a declaration: [final] Type name [= init];
    /// Fails (for backtracking) when the statement is not declaration-shaped.
    fn parse_decl(&mut self, is_final: bool) -> Result<Stmt> {
        let start = self.current().span;
        if is_final {
            self.expect(TokenKind::Final)?;
        }

        let ty = self.parse_type()?;
        let name = self.parse_ident()?;

        let init = if self.consume(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Decl {
            ty,
            name,
            is_final,
            init,
            span: start.merge(&self.prev_span()),
        })
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expr { expr, span: start.merge(&self.prev_span()) })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident { name: name.clone(), span: token.span })
            }
            _ => Err(Error::ExpectedIdent { span: token.span }),
        }
    }

    // ==================== Types ====================

    /// Parse a type reference: Name[<Args>][[]...]
    fn parse_type(&mut self) -> Result<TypeRef> {
        let start = self.current().span;
        let name = match self.current_kind() {
            TokenKind::Ident(n) => {
                let n = n.clone();
                self.advance();
                n
            }
            _ => return Err(Error::ExpectedType { span: self.current().span }),
        };

        let mut args = Vec::new();
        let mut diamond = false;
        if self.check(&TokenKind::Lt) {
            self.advance();
            // Diamond (<>) or an argument list
            if self.close_type_args()? {
                diamond = true;
            } else {
                loop {
                    args.push(self.parse_type()?);
                    if self.consume(&TokenKind::Comma) {
                        continue;
                    }
                    if self.close_type_args()? {
                        break;
                    }
                    return Err(Error::Expected("'>'".to_string(), self.current().span));
                }
            }
        }

        let mut dims = 0;
        while self.check(&TokenKind::LBracket) {
            self.advance();
            self.expect(TokenKind::RBracket)?;
            dims += 1;
        }

        Ok(TypeRef { name, args, diamond, dims, span: start.merge(&self.prev_span()) })
    }

    /// Consume a closing '>' of a type argument list if present. A '>>'
    /// token (nested generics like Map<String, List<Integer>>) is split in
    /// place: one level is consumed, the token becomes a single '>'.
    fn close_type_args(&mut self) -> Result<bool> {
        if self.check(&TokenKind::Gt) {
            self.advance();
            return Ok(true);
        }
        if self.check(&TokenKind::Shr) {
            self.tokens[self.pos].kind = TokenKind::Gt;
            return Ok(true);
        }
        Ok(false)
    }

    // ==================== Expressions ====================

    /// Parse an expression (assignment has the lowest precedence and is
    /// right-associative)
    pub fn parse_expr(&mut self) -> Result<Expr> {
        let start = self.current().span;
        let lhs = self.parse_binary(0)?;

        let op = match self.current_kind() {
            TokenKind::Eq => Some(AssignOp::Assign),
            TokenKind::PlusEq => Some(AssignOp::Add),
            TokenKind::MinusEq => Some(AssignOp::Sub),
            TokenKind::StarEq => Some(AssignOp::Mul),
            TokenKind::SlashEq => Some(AssignOp::Div),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(Expr::Assign {
                target: Box::new(lhs),
                op,
                value: Box::new(value),
                span: start.merge(&self.prev_span()),
            });
        }

        Ok(lhs)
    }

    /// Pratt loop over binary operators
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr> {
        let start = self.current().span;
        let mut left = self.parse_unary()?;

        while let Some(prec) = self.current_kind().binary_precedence() {
            if prec < min_prec {
                break;
            }
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                TokenKind::AndAnd => BinOp::And,
                TokenKind::OrOr => BinOp::Or,
                TokenKind::And => BinOp::BitAnd,
                TokenKind::Or => BinOp::BitOr,
                TokenKind::Caret => BinOp::BitXor,
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span: start.merge(&self.prev_span()),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.current().span;
        let op = match self.current_kind() {
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Tilde => Some(UnOp::BitNot),
            TokenKind::PlusPlus => Some(UnOp::PreInc),
            TokenKind::MinusMinus => Some(UnOp::PreDec),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                span: start.merge(&self.prev_span()),
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let start = self.current().span;
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.parse_ident()?;
                    if self.check(&TokenKind::LParen) {
                        let args = self.parse_args()?;
                        expr = Expr::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                            span: start.merge(&self.prev_span()),
                        };
                    } else {
                        expr = Expr::Field {
                            receiver: Box::new(expr),
                            field: name,
                            span: start.merge(&self.prev_span()),
                        };
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index {
                        receiver: Box::new(expr),
                        index: Box::new(index),
                        span: start.merge(&self.prev_span()),
                    };
                }
                TokenKind::ColonColon => {
                    self.advance();
                    let name = self.parse_ident()?;
                    expr = Expr::MethodRef {
                        receiver: Box::new(expr),
                        name,
                        span: start.merge(&self.prev_span()),
                    };
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    expr = Expr::Postfix {
                        op: IncDecOp::Inc,
                        expr: Box::new(expr),
                        span: start.merge(&self.prev_span()),
                    };
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    expr = Expr::Postfix {
                        op: IncDecOp::Dec,
                        expr: Box::new(expr),
                        span: start.merge(&self.prev_span()),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::NumberLit(raw) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(raw.clone(), token.span)))
            }
            TokenKind::StringLit(raw) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(raw.clone(), token.span)))
            }
            TokenKind::CharLit(raw) => {
                self.advance();
                Ok(Expr::Literal(Literal::Char(raw.clone(), token.span)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true, token.span)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false, token.span)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null(token.span)))
            }
            TokenKind::New => {
                let start = token.span;
                self.advance();
                let ty = self.parse_type()?;
                let args = self.parse_args()?;
                Ok(Expr::New { ty, args, span: start.merge(&self.prev_span()) })
            }
            TokenKind::Ident(name) => {
                let start = token.span;
                let ident = Ident { name: name.clone(), span: token.span };
                self.advance();
                if self.check(&TokenKind::Arrow) {
                    self.advance();
                    let body = self.parse_lambda_body()?;
                    return Ok(Expr::Lambda {
                        params: vec![ident],
                        body: Box::new(body),
                        span: start.merge(&self.prev_span()),
                    });
                }
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name: ident, args, span: start.merge(&self.prev_span()) })
                } else {
                    Ok(Expr::Name(ident))
                }
            }
            TokenKind::LParen => {
                let start = token.span;
                if let Some(lambda) = self.try_parse_lambda(start)? {
                    return Ok(lambda);
                }
                // Primitive cast: (int) expr
                if let Some(cast) = self.try_parse_cast(start)? {
                    return Ok(cast);
                }
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren {
                    inner: Box::new(inner),
                    span: start.merge(&self.prev_span()),
                })
            }
            _ => Err(Error::ExpectedExpr { span: token.span }),
        }
    }

    /// Recognize a parenthesized lambda parameter list `(a, b) ->` by
    /// lookahead: only identifiers and commas up to the closing paren, then
    /// an arrow.
    fn try_parse_lambda(&mut self, start: Span) -> Result<Option<Expr>> {
        let mut i = self.pos + 1;
        loop {
            match self.tokens.get(i).map(|t| &t.kind) {
                Some(TokenKind::Ident(_)) | Some(TokenKind::Comma) => i += 1,
                Some(TokenKind::RParen) => break,
                _ => return Ok(None),
            }
        }
        if !matches!(self.tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::Arrow)) {
            return Ok(None);
        }

        self.advance(); // (
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.parse_ident()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_lambda_body()?;

        Ok(Some(Expr::Lambda {
            params,
            body: Box::new(body),
            span: start.merge(&self.prev_span()),
        }))
    }

    fn parse_lambda_body(&mut self) -> Result<LambdaBody> {
        if self.check(&TokenKind::LBrace) {
            Ok(LambdaBody::Block(self.parse_block()?))
        } else {
            Ok(LambdaBody::Expr(self.parse_expr()?))
        }
    }

    /// Recognize a primitive cast `(int) x` by two-token lookahead. Casts to
    /// reference types are out of the subset.
    fn try_parse_cast(&mut self, start: Span) -> Result<Option<Expr>> {
        let is_cast = match (self.peek().map(|t| &t.kind), self.tokens.get(self.pos + 2).map(|t| &t.kind)) {
            (Some(TokenKind::Ident(name)), Some(TokenKind::RParen)) => {
                PRIMITIVES.contains(&name.as_str())
                    && matches!(
                        self.tokens.get(self.pos + 3).map(|t| &t.kind),
                        Some(TokenKind::Ident(_))
                            | Some(TokenKind::NumberLit(_))
                            | Some(TokenKind::CharLit(_))
                            | Some(TokenKind::LParen)
                            | Some(TokenKind::Minus)
                    )
            }
            _ => false,
        };

        if !is_cast {
            return Ok(None);
        }

        self.advance(); // (
        let ty = self.parse_type()?;
        self.expect(TokenKind::RParen)?;
        let expr = self.parse_unary()?;
        Ok(Some(Expr::Cast {
            ty,
            expr: Box::new(expr),
            span: start.merge(&self.prev_span()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        let mut parser = Parser::from_source(source, 0);
        parser.parse_program().expect("parse failed")
    }

    #[test]
    fn test_parse_for_each() {
        let program = parse("for (String s : names) { result.add(s); }");
        assert_eq!(program.stmts.len(), 1);

        if let Stmt::ForEach { elem_ty, var, source, body, .. } = &program.stmts[0] {
            assert_eq!(elem_ty.name, "String");
            assert_eq!(var.name, "s");
            assert!(source.is_name("names"));
            assert_eq!(body.as_body().len(), 1);
        } else {
            panic!("Expected ForEach statement");
        }
    }

    #[test]
    fn test_parse_generic_declaration() {
        let program = parse("Map<String, List<Integer>> m = new HashMap<>();");

        if let Stmt::Decl { ty, name, init, .. } = &program.stmts[0] {
            assert_eq!(ty.name, "Map");
            assert_eq!(ty.args.len(), 2);
            assert_eq!(ty.args[1].name, "List");
            assert_eq!(ty.args[1].args[0].name, "Integer");
            assert_eq!(name.name, "m");
            assert!(matches!(init, Some(Expr::New { .. })));
        } else {
            panic!("Expected Decl statement");
        }
    }

    #[test]
    fn test_parse_array_declaration() {
        let program = parse("int[] xs = data;");

        if let Stmt::Decl { ty, .. } = &program.stmts[0] {
            assert_eq!(ty.name, "int");
            assert_eq!(ty.dims, 1);
        } else {
            panic!("Expected Decl statement");
        }
    }

    #[test]
    fn test_parse_guard_continue() {
        let program = parse("for (String s : names) { if (s.isEmpty()) continue; use(s); }");

        if let Stmt::ForEach { body, .. } = &program.stmts[0] {
            let stmts = body.as_body();
            assert_eq!(stmts.len(), 2);
            assert!(matches!(stmts[0], Stmt::If { .. }));
        } else {
            panic!("Expected ForEach statement");
        }
    }

    #[test]
    fn test_parse_labeled_continue() {
        let program = parse("outer: for (String s : names) { continue outer; }");

        if let Stmt::Labeled { label, body, .. } = &program.stmts[0] {
            assert_eq!(label.name, "outer");
            if let Stmt::ForEach { body, .. } = body.as_ref() {
                if let Stmt::Continue { label: Some(l), .. } = body.as_body()[0] {
                    assert_eq!(l.name, "outer");
                } else {
                    panic!("Expected labeled continue");
                }
            } else {
                panic!("Expected ForEach under label");
            }
        } else {
            panic!("Expected Labeled statement");
        }
    }

    #[test]
    fn test_parse_compound_assignment() {
        let program = parse("sum += f(x);");

        if let Stmt::Expr { expr: Expr::Assign { target, op, .. }, .. } = &program.stmts[0] {
            assert!(target.is_name("sum"));
            assert_eq!(*op, AssignOp::Add);
        } else {
            panic!("Expected compound assignment");
        }
    }

    #[test]
    fn test_parse_primitive_cast() {
        let program = parse("byte b = (byte) 1;");

        if let Stmt::Decl { init: Some(Expr::Cast { ty, .. }), .. } = &program.stmts[0] {
            assert_eq!(ty.name, "byte");
        } else {
            panic!("Expected cast initializer");
        }
    }

    #[test]
    fn test_parse_switch_skips_body() {
        let program = parse("switch (x) { case 1: { a(); } } done();");
        assert_eq!(program.stmts.len(), 2);
        assert!(matches!(program.stmts[0], Stmt::Switch { .. }));
    }

    #[test]
    fn test_parse_negated_condition() {
        let program = parse("if (!(p(x))) return false;");

        if let Stmt::If { cond, .. } = &program.stmts[0] {
            if let Expr::Unary { op: UnOp::Not, expr, .. } = cond {
                assert!(matches!(expr.unwrap_parens(), Expr::Call { .. }));
            } else {
                panic!("Expected negation");
            }
        } else {
            panic!("Expected If statement");
        }
    }

    #[test]
    fn test_parse_lambda_forms() {
        let program = parse("names.forEach(s -> log(s));");
        if let Stmt::Expr { expr: Expr::MethodCall { method, args, .. }, .. } = &program.stmts[0] {
            assert_eq!(method.name, "forEach");
            if let Expr::Lambda { params, body, .. } = &args[0] {
                assert_eq!(params[0].name, "s");
                assert!(matches!(body.as_ref(), LambdaBody::Expr(_)));
            } else {
                panic!("Expected lambda argument");
            }
        } else {
            panic!("Expected forEach call");
        }

        let program = parse("x = xs.stream().reduce(0, (a, b) -> a + b);");
        if let Stmt::Expr { expr: Expr::Assign { value, .. }, .. } = &program.stmts[0] {
            if let Expr::MethodCall { args, .. } = value.as_ref() {
                if let Expr::Lambda { params, .. } = &args[1] {
                    assert_eq!(params.len(), 2);
                } else {
                    panic!("Expected lambda argument");
                }
            } else {
                panic!("Expected reduce call");
            }
        } else {
            panic!("Expected assignment");
        }
    }

    #[test]
    fn test_parse_lambda_block_body() {
        let program = parse("names.forEach(s -> { log(s); count++; });");
        if let Stmt::Expr { expr: Expr::MethodCall { args, .. }, .. } = &program.stmts[0] {
            if let Expr::Lambda { body, .. } = &args[0] {
                if let LambdaBody::Block(b) = body.as_ref() {
                    assert_eq!(b.stmts.len(), 2);
                } else {
                    panic!("Expected block body");
                }
            } else {
                panic!("Expected lambda argument");
            }
        } else {
            panic!("Expected forEach call");
        }
    }

    #[test]
    fn test_parse_method_reference() {
        let program = parse("x = xs.stream().reduce(x, Integer::sum);");
        if let Stmt::Expr { expr: Expr::Assign { value, .. }, .. } = &program.stmts[0] {
            if let Expr::MethodCall { args, .. } = value.as_ref() {
                if let Expr::MethodRef { receiver, name, .. } = &args[1] {
                    assert!(receiver.is_name("Integer"));
                    assert_eq!(name.name, "sum");
                } else {
                    panic!("Expected method reference");
                }
            } else {
                panic!("Expected reduce call");
            }
        } else {
            panic!("Expected assignment");
        }
    }

    #[test]
    fn test_parse_method_chain() {
        let program = parse("a.b().c(1, 2);");

        if let Stmt::Expr { expr: Expr::MethodCall { receiver, method, args, .. }, .. } = &program.stmts[0] {
            assert_eq!(method.name, "c");
            assert_eq!(args.len(), 2);
            assert!(matches!(receiver.as_ref(), Expr::MethodCall { .. }));
        } else {
            panic!("Expected method call chain");
        }
    }
}
