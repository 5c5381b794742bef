//! Collection-accumulation shapes
//!
//! Detects `target.add(expr)` statements and the supporting facts the
//! collect terminal needs: whether the target was declared empty just
//! before the loop, and whether the body reads the target in any way other
//! than adding to it.

use crate::frontend::ast::{Expr, LambdaBody, Stmt};

/// Match `target.add(arg)` with a simple-name receiver and one argument
pub fn add_call(stmt: &Stmt) -> Option<(&str, &Expr)> {
    let Stmt::Expr { expr, .. } = stmt else {
        return None;
    };
    let Expr::MethodCall { receiver, method, args, .. } = expr.unwrap_parens() else {
        return None;
    };
    if method.name != "add" || args.len() != 1 {
        return None;
    }
    Some((receiver.as_name()?, &args[0]))
}

/// Match a declaration of `target` initialized to an empty collection
/// (`List<String> out = new ArrayList<>();`)
pub fn is_empty_collection_decl(stmt: &Stmt, target: &str) -> bool {
    let Stmt::Decl { name, init: Some(init), .. } = stmt else {
        return false;
    };
    if name.name != target {
        return false;
    }
    matches!(init.unwrap_parens(), Expr::New { args, .. } if args.is_empty())
}

/// True if the body uses `target` anywhere except as the receiver of an
/// `add` call. Any other use observes intermediate contents, so the loop
/// cannot be collapsed into a single collect.
pub fn target_read_during(body: &Stmt, target: &str) -> bool {
    read_in_stmt(body, target)
}

fn read_in_stmt(stmt: &Stmt, target: &str) -> bool {
    match stmt {
        Stmt::Decl { init, .. } => init.as_ref().is_some_and(|e| read_in_expr(e, target)),
        Stmt::Expr { expr, .. } => read_in_expr(expr, target),
        Stmt::If { cond, then_branch, else_branch, .. } => {
            read_in_expr(cond, target)
                || read_in_stmt(then_branch, target)
                || else_branch.as_ref().is_some_and(|e| read_in_stmt(e, target))
        }
        Stmt::Block(b) => b.stmts.iter().any(|s| read_in_stmt(s, target)),
        Stmt::ForEach { source, body, .. } => {
            read_in_expr(source, target) || read_in_stmt(body, target)
        }
        Stmt::While { cond, body, .. } => {
            read_in_expr(cond, target) || read_in_stmt(body, target)
        }
        Stmt::Return { value, .. } => value.as_ref().is_some_and(|e| read_in_expr(e, target)),
        Stmt::Throw { value, .. } => read_in_expr(value, target),
        Stmt::Labeled { body, .. } => read_in_stmt(body, target),
        Stmt::Try { body, catches, finally, .. } => {
            body.stmts.iter().any(|s| read_in_stmt(s, target))
                || catches.iter().any(|c| c.body.stmts.iter().any(|s| read_in_stmt(s, target)))
                || finally
                    .as_ref()
                    .is_some_and(|f| f.stmts.iter().any(|s| read_in_stmt(s, target)))
        }
        Stmt::Switch { scrutinee, .. } => read_in_expr(scrutinee, target),
        Stmt::Synchronized { lock, body, .. } => {
            read_in_expr(lock, target) || body.stmts.iter().any(|s| read_in_stmt(s, target))
        }
        Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty { .. } => false,
    }
}

fn read_in_expr(expr: &Expr, target: &str) -> bool {
    match expr {
        Expr::Name(id) => id.name == target,
        Expr::Unary { expr, .. } | Expr::Postfix { expr, .. } | Expr::Cast { expr, .. } => {
            read_in_expr(expr, target)
        }
        Expr::Binary { left, right, .. } => {
            read_in_expr(left, target) || read_in_expr(right, target)
        }
        Expr::Assign { target: t, value, .. } => {
            read_in_expr(t, target) || read_in_expr(value, target)
        }
        Expr::Call { args, .. } => args.iter().any(|a| read_in_expr(a, target)),
        Expr::MethodCall { receiver, method, args, .. } => {
            // The receiver of an add call is the one permitted use
            let receiver_reads = if method.name == "add" && receiver.is_name(target) {
                false
            } else {
                read_in_expr(receiver, target)
            };
            receiver_reads || args.iter().any(|a| read_in_expr(a, target))
        }
        Expr::Field { receiver, .. } => read_in_expr(receiver, target),
        Expr::Index { receiver, index, .. } => {
            read_in_expr(receiver, target) || read_in_expr(index, target)
        }
        Expr::New { args, .. } => args.iter().any(|a| read_in_expr(a, target)),
        Expr::Paren { inner, .. } => read_in_expr(inner, target),
        Expr::Lambda { body, .. } => match body.as_ref() {
            LambdaBody::Expr(e) => read_in_expr(e, target),
            LambdaBody::Block(b) => b.stmts.iter().any(|s| read_in_stmt(s, target)),
        },
        Expr::MethodRef { receiver, .. } => read_in_expr(receiver, target),
        Expr::Literal(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use crate::frontend::printer::expr_text;

    fn stmt(source: &str) -> Stmt {
        let mut parser = Parser::from_source(source, 0);
        parser.parse_program().expect("parse failed").stmts.remove(0)
    }

    #[test]
    fn test_add_call_shape() {
        let s = stmt("out.add(x.trim());");
        let (target, arg) = add_call(&s).expect("add call");
        assert_eq!(target, "out");
        assert_eq!(expr_text(arg), "x.trim()");

        assert!(add_call(&stmt("out.add(x, y);")).is_none());
        assert!(add_call(&stmt("out.remove(x);")).is_none());
        assert!(add_call(&stmt("a.b.add(x);")).is_none());
    }

    #[test]
    fn test_empty_collection_declaration() {
        let s = stmt("List<String> out = new ArrayList<>();");
        assert!(is_empty_collection_decl(&s, "out"));
        assert!(!is_empty_collection_decl(&s, "other"));

        let s = stmt("List<String> out = new ArrayList<>(seed);");
        assert!(!is_empty_collection_decl(&s, "out"));

        let s = stmt("List<String> out = existing;");
        assert!(!is_empty_collection_decl(&s, "out"));
    }

    #[test]
    fn test_target_read_detection() {
        let body = stmt("{ out.add(x); }");
        assert!(!target_read_during(&body, "out"));

        let body = stmt("{ if (out.contains(x)) continue; out.add(x); }");
        assert!(target_read_during(&body, "out"));

        let body = stmt("{ log(out); out.add(x); }");
        assert!(target_read_during(&body, "out"));
    }
}
