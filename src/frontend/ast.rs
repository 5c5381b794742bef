//! Abstract Syntax Tree for the Java-like input subset
//!
//! The tree models exactly the statement and expression shapes the converter
//! classifies; a program is one statement sequence (a method body).

use crate::utils::Span;

/// A complete program (one method body worth of statements)
#[derive(Debug, Clone)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// Code block
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Local variable declaration: [final] Type name [= init];
    Decl {
        ty: TypeRef,
        name: Ident,
        is_final: bool,
        init: Option<Expr>,
        span: Span,
    },
    /// Expression statement
    Expr { expr: Expr, span: Span },
    /// if (cond) then [else else_]
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    /// Block statement
    Block(Block),
    /// Enhanced for: for ([final] Type var : source) body
    ForEach {
        elem_ty: TypeRef,
        elem_final: bool,
        var: Ident,
        source: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    /// while (cond) body
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    /// return [expr];
    Return { value: Option<Expr>, span: Span },
    /// break [label];
    Break { label: Option<Ident>, span: Span },
    /// continue [label];
    Continue { label: Option<Ident>, span: Span },
    /// throw expr;
    Throw { value: Expr, span: Span },
    /// label: stmt
    Labeled {
        label: Ident,
        body: Box<Stmt>,
        span: Span,
    },
    /// try { } catch (T e) { } ... [finally { }]
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
        span: Span,
    },
    /// switch (expr) { ... } — contents are never classified, only detected
    Switch { scrutinee: Expr, span: Span },
    /// synchronized (lock) { }
    Synchronized {
        lock: Expr,
        body: Block,
        span: Span,
    },
    /// Empty statement (;)
    Empty { span: Span },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl { span, .. } => *span,
            Stmt::Expr { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::Block(b) => b.span,
            Stmt::ForEach { span, .. } => *span,
            Stmt::While { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::Break { span, .. } => *span,
            Stmt::Continue { span, .. } => *span,
            Stmt::Throw { span, .. } => *span,
            Stmt::Labeled { span, .. } => *span,
            Stmt::Try { span, .. } => *span,
            Stmt::Switch { span, .. } => *span,
            Stmt::Synchronized { span, .. } => *span,
            Stmt::Empty { span } => *span,
        }
    }

    /// The statements of this statement viewed as a body: a block's
    /// statements, or the statement itself as a one-element slice.
    pub fn as_body(&self) -> Vec<&Stmt> {
        match self {
            Stmt::Block(b) => b.stmts.iter().collect(),
            other => vec![other],
        }
    }

    /// Unwrap a single-statement block, if that is what this is
    pub fn unwrap_single(&self) -> &Stmt {
        match self {
            Stmt::Block(b) if b.stmts.len() == 1 => &b.stmts[0],
            other => other,
        }
    }
}

/// Catch clause of a try statement
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub ty: TypeRef,
    pub name: Ident,
    pub body: Block,
    pub span: Span,
}

/// A (possibly generic, possibly array) type reference
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    /// Empty diamond argument list (`new ArrayList<>()`)
    pub diamond: bool,
    /// Array dimensions (int[] has 1, int[][] has 2)
    pub dims: usize,
    pub span: Span,
}

impl TypeRef {
    pub fn named(name: &str, span: Span) -> Self {
        Self { name: name.to_string(), args: Vec::new(), diamond: false, dims: 0, span }
    }

    /// The erased name, ignoring type arguments and array dimensions
    pub fn erased_name(&self) -> &str {
        &self.name
    }

    pub fn is_array(&self) -> bool {
        self.dims > 0
    }

    /// The element type of a one-dimensional array, the first type argument
    /// of a generic type, else None
    pub fn element_type(&self) -> Option<TypeRef> {
        if self.dims > 0 {
            let mut elem = self.clone();
            elem.dims -= 1;
            return Some(elem);
        }
        self.args.first().cloned()
    }
}

/// Expression
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Simple name
    Name(Ident),
    /// Unary operation (!x, -x, ~x, ++x, --x)
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    /// Postfix increment/decrement (x++, x--)
    Postfix {
        op: IncDecOp,
        expr: Box<Expr>,
        span: Span,
    },
    /// Binary operation
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },
    /// Assignment, simple or compound
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
        span: Span,
    },
    /// Unqualified call: foo(args)
    Call {
        name: Ident,
        args: Vec<Expr>,
        span: Span,
    },
    /// Method call: receiver.method(args)
    MethodCall {
        receiver: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
        span: Span,
    },
    /// Field access: receiver.field
    Field {
        receiver: Box<Expr>,
        field: Ident,
        span: Span,
    },
    /// Index access: receiver[index]
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    /// Instance creation: new Type(args)
    New {
        ty: TypeRef,
        args: Vec<Expr>,
        span: Span,
    },
    /// Cast: (Type) expr
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
        span: Span,
    },
    /// Parenthesized expression — kept explicit so syntactic negation
    /// stripping can see through it
    Paren { inner: Box<Expr>, span: Span },
    /// Lambda: x -> expr, (a, b) -> expr, x -> { stmts }
    Lambda {
        params: Vec<Ident>,
        body: Box<LambdaBody>,
        span: Span,
    },
    /// Method reference: Receiver::name
    MethodRef {
        receiver: Box<Expr>,
        name: Ident,
        span: Span,
    },
}

/// Lambda body, an expression or a block
#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Expr),
    Block(Block),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(l) => l.span(),
            Expr::Name(id) => id.span,
            Expr::Unary { span, .. } => *span,
            Expr::Postfix { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Assign { span, .. } => *span,
            Expr::Call { span, .. } => *span,
            Expr::MethodCall { span, .. } => *span,
            Expr::Field { span, .. } => *span,
            Expr::Index { span, .. } => *span,
            Expr::New { span, .. } => *span,
            Expr::Cast { span, .. } => *span,
            Expr::Paren { span, .. } => *span,
            Expr::Lambda { span, .. } => *span,
            Expr::MethodRef { span, .. } => *span,
        }
    }

    /// If this is a simple name (parens stripped), return it
    pub fn as_name(&self) -> Option<&str> {
        match self.unwrap_parens() {
            Expr::Name(id) => Some(&id.name),
            _ => None,
        }
    }

    /// Check if this expression is exactly the given simple name
    pub fn is_name(&self, name: &str) -> bool {
        self.as_name() == Some(name)
    }

    /// Strip any number of wrapping parentheses
    pub fn unwrap_parens(&self) -> &Expr {
        let mut e = self;
        while let Expr::Paren { inner, .. } = e {
            e = inner;
        }
        e
    }

    /// If this is a boolean literal (parens stripped), return its value
    pub fn as_bool_literal(&self) -> Option<bool> {
        match self.unwrap_parens() {
            Expr::Literal(Literal::Bool(b, _)) => Some(*b),
            _ => None,
        }
    }
}

/// Literal value, numbers/strings/chars keep their raw lexeme
#[derive(Debug, Clone)]
pub enum Literal {
    Number(String, Span),
    Str(String, Span),
    Char(String, Span),
    Bool(bool, Span),
    Null(Span),
}

impl Literal {
    pub fn span(&self) -> Span {
        match self {
            Literal::Number(_, s) => *s,
            Literal::Str(_, s) => *s,
            Literal::Char(_, s) => *s,
            Literal::Bool(_, s) => *s,
            Literal::Null(s) => *s,
        }
    }
}

/// Identifier
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: &str, span: Span) -> Self {
        Self { name: name.to_string(), span }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Negation (-)
    Neg,
    /// Logical not (!)
    Not,
    /// Bitwise not (~)
    BitNot,
    /// Prefix increment (++x)
    PreInc,
    /// Prefix decrement (--x)
    PreDec,
}

/// Postfix increment/decrement operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

/// Assignment operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// =
    Assign,
    /// +=
    Add,
    /// -=
    Sub,
    /// *=
    Mul,
    /// /=
    Div,
}

impl AssignOp {
    pub fn is_compound(&self) -> bool {
        !matches!(self, AssignOp::Assign)
    }
}
