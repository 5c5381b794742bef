//! AST-to-text printing
//!
//! Renders expressions and statements back to source text. Parenthesization
//! is structural: the parser keeps explicit paren nodes, so printing never
//! has to re-derive precedence.

use crate::frontend::ast::*;

/// Render a type reference (List<String>, int[][])
pub fn type_text(ty: &TypeRef) -> String {
    let mut out = ty.name.clone();
    if ty.diamond {
        out.push_str("<>");
    } else if !ty.args.is_empty() {
        let args: Vec<String> = ty.args.iter().map(type_text).collect();
        out.push('<');
        out.push_str(&args.join(", "));
        out.push('>');
    }
    for _ in 0..ty.dims {
        out.push_str("[]");
    }
    out
}

/// Render an expression as source text
pub fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal(lit) => literal_text(lit),
        Expr::Name(id) => id.name.clone(),
        Expr::Unary { op, expr, .. } => {
            let op_str = match op {
                UnOp::Neg => "-",
                UnOp::Not => "!",
                UnOp::BitNot => "~",
                UnOp::PreInc => "++",
                UnOp::PreDec => "--",
            };
            format!("{}{}", op_str, expr_text(expr))
        }
        Expr::Postfix { op, expr, .. } => {
            let op_str = match op {
                IncDecOp::Inc => "++",
                IncDecOp::Dec => "--",
            };
            format!("{}{}", expr_text(expr), op_str)
        }
        Expr::Binary { left, op, right, .. } => {
            format!("{} {} {}", expr_text(left), bin_op_text(*op), expr_text(right))
        }
        Expr::Assign { target, op, value, .. } => {
            let op_str = match op {
                AssignOp::Assign => "=",
                AssignOp::Add => "+=",
                AssignOp::Sub => "-=",
                AssignOp::Mul => "*=",
                AssignOp::Div => "/=",
            };
            format!("{} {} {}", expr_text(target), op_str, expr_text(value))
        }
        Expr::Call { name, args, .. } => {
            format!("{}({})", name.name, args_text(args))
        }
        Expr::MethodCall { receiver, method, args, .. } => {
            format!("{}.{}({})", expr_text(receiver), method.name, args_text(args))
        }
        Expr::Field { receiver, field, .. } => {
            format!("{}.{}", expr_text(receiver), field.name)
        }
        Expr::Index { receiver, index, .. } => {
            format!("{}[{}]", expr_text(receiver), expr_text(index))
        }
        Expr::New { ty, args, .. } => {
            format!("new {}({})", type_text(ty), args_text(args))
        }
        Expr::Cast { ty, expr, .. } => {
            format!("({}) {}", type_text(ty), expr_text(expr))
        }
        Expr::Paren { inner, .. } => {
            format!("({})", expr_text(inner))
        }
        Expr::Lambda { params, body, .. } => {
            let header = if params.len() == 1 {
                params[0].name.clone()
            } else {
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                format!("({})", names.join(", "))
            };
            match body.as_ref() {
                LambdaBody::Expr(e) => format!("{} -> {}", header, expr_text(e)),
                LambdaBody::Block(b) => format!("{} -> {}", header, block_text(b)),
            }
        }
        Expr::MethodRef { receiver, name, .. } => {
            format!("{}::{}", expr_text(receiver), name.name)
        }
    }
}

/// Render a statement as single-line source text (nested blocks inline)
pub fn stmt_text(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Decl { ty, name, is_final, init, .. } => {
            let prefix = if *is_final { "final " } else { "" };
            match init {
                Some(e) => format!("{}{} {} = {};", prefix, type_text(ty), name.name, expr_text(e)),
                None => format!("{}{} {};", prefix, type_text(ty), name.name),
            }
        }
        Stmt::Expr { expr, .. } => format!("{};", expr_text(expr)),
        Stmt::If { cond, then_branch, else_branch, .. } => {
            let mut out = format!("if ({}) {}", expr_text(cond), stmt_text(then_branch));
            if let Some(e) = else_branch {
                out.push_str(&format!(" else {}", stmt_text(e)));
            }
            out
        }
        Stmt::Block(b) => block_text(b),
        Stmt::ForEach { elem_ty, elem_final, var, source, body, .. } => {
            let prefix = if *elem_final { "final " } else { "" };
            format!(
                "for ({}{} {} : {}) {}",
                prefix,
                type_text(elem_ty),
                var.name,
                expr_text(source),
                stmt_text(body)
            )
        }
        Stmt::While { cond, body, .. } => {
            format!("while ({}) {}", expr_text(cond), stmt_text(body))
        }
        Stmt::Return { value, .. } => match value {
            Some(e) => format!("return {};", expr_text(e)),
            None => "return;".to_string(),
        },
        Stmt::Break { label, .. } => match label {
            Some(l) => format!("break {};", l.name),
            None => "break;".to_string(),
        },
        Stmt::Continue { label, .. } => match label {
            Some(l) => format!("continue {};", l.name),
            None => "continue;".to_string(),
        },
        Stmt::Throw { value, .. } => format!("throw {};", expr_text(value)),
        Stmt::Labeled { label, body, .. } => format!("{}: {}", label.name, stmt_text(body)),
        Stmt::Try { body, catches, finally, .. } => {
            let mut out = format!("try {}", block_text(body));
            for c in catches {
                out.push_str(&format!(
                    " catch ({} {}) {}",
                    type_text(&c.ty),
                    c.name.name,
                    block_text(&c.body)
                ));
            }
            if let Some(f) = finally {
                out.push_str(&format!(" finally {}", block_text(f)));
            }
            out
        }
        Stmt::Switch { scrutinee, .. } => format!("switch ({}) {{ ... }}", expr_text(scrutinee)),
        Stmt::Synchronized { lock, body, .. } => {
            format!("synchronized ({}) {}", expr_text(lock), block_text(body))
        }
        Stmt::Empty { .. } => ";".to_string(),
    }
}

fn block_text(block: &Block) -> String {
    if block.stmts.is_empty() {
        return "{ }".to_string();
    }
    let stmts: Vec<String> = block.stmts.iter().map(stmt_text).collect();
    format!("{{ {} }}", stmts.join(" "))
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Number(raw, _) => raw.clone(),
        Literal::Str(raw, _) => raw.clone(),
        Literal::Char(raw, _) => raw.clone(),
        Literal::Bool(b, _) => b.to_string(),
        Literal::Null(_) => "null".to_string(),
    }
}

fn bin_op_text(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
    }
}

fn args_text(args: &[Expr]) -> String {
    let parts: Vec<String> = args.iter().map(expr_text).collect();
    parts.join(", ")
}
