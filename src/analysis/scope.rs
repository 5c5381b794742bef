//! Scope scanning over loop bodies
//!
//! One pass per loop collects the names it declares, the names it modifies,
//! and the names it references. Capture safety intersects these sets across
//! the loop-tree ancestor chain.

use std::collections::HashSet;

use crate::frontend::ast::{Expr, LambdaBody, Stmt, UnOp};

/// Declared and modified variable names of one loop's body
#[derive(Debug, Clone, Default)]
pub struct ScopeInfo {
    pub declared: HashSet<String>,
    pub modified: HashSet<String>,
}

impl ScopeInfo {
    /// Scan a loop body (the body statement, not the loop header)
    pub fn of_body(body: &Stmt) -> Self {
        let mut info = ScopeInfo::default();
        scan_stmt(body, &mut info);
        info
    }
}

fn scan_stmt(stmt: &Stmt, info: &mut ScopeInfo) {
    match stmt {
        Stmt::Decl { name, init, .. } => {
            info.declared.insert(name.name.clone());
            if let Some(e) = init {
                scan_expr(e, info);
            }
        }
        Stmt::Expr { expr, .. } => scan_expr(expr, info),
        Stmt::If { cond, then_branch, else_branch, .. } => {
            scan_expr(cond, info);
            scan_stmt(then_branch, info);
            if let Some(e) = else_branch {
                scan_stmt(e, info);
            }
        }
        Stmt::Block(b) => {
            for s in &b.stmts {
                scan_stmt(s, info);
            }
        }
        Stmt::ForEach { var, source, body, .. } => {
            info.declared.insert(var.name.clone());
            scan_expr(source, info);
            scan_stmt(body, info);
        }
        Stmt::While { cond, body, .. } => {
            scan_expr(cond, info);
            scan_stmt(body, info);
        }
        Stmt::Return { value, .. } => {
            if let Some(e) = value {
                scan_expr(e, info);
            }
        }
        Stmt::Throw { value, .. } => scan_expr(value, info),
        Stmt::Labeled { body, .. } => scan_stmt(body, info),
        Stmt::Try { body, catches, finally, .. } => {
            for s in &body.stmts {
                scan_stmt(s, info);
            }
            for c in catches {
                info.declared.insert(c.name.name.clone());
                for s in &c.body.stmts {
                    scan_stmt(s, info);
                }
            }
            if let Some(f) = finally {
                for s in &f.stmts {
                    scan_stmt(s, info);
                }
            }
        }
        Stmt::Switch { scrutinee, .. } => scan_expr(scrutinee, info),
        Stmt::Synchronized { lock, body, .. } => {
            scan_expr(lock, info);
            for s in &body.stmts {
                scan_stmt(s, info);
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty { .. } => {}
    }
}

fn scan_expr(expr: &Expr, info: &mut ScopeInfo) {
    match expr {
        Expr::Assign { target, value, .. } => {
            if let Some(name) = target.as_name() {
                info.modified.insert(name.to_string());
            } else {
                scan_expr(target, info);
            }
            scan_expr(value, info);
        }
        Expr::Postfix { expr, .. } => {
            if let Some(name) = expr.as_name() {
                info.modified.insert(name.to_string());
            }
            scan_expr(expr, info);
        }
        Expr::Unary { op: UnOp::PreInc | UnOp::PreDec, expr, .. } => {
            if let Some(name) = expr.as_name() {
                info.modified.insert(name.to_string());
            }
            scan_expr(expr, info);
        }
        Expr::Unary { expr, .. } => scan_expr(expr, info),
        Expr::Binary { left, right, .. } => {
            scan_expr(left, info);
            scan_expr(right, info);
        }
        Expr::Call { args, .. } => {
            for a in args {
                scan_expr(a, info);
            }
        }
        Expr::MethodCall { receiver, args, .. } => {
            scan_expr(receiver, info);
            for a in args {
                scan_expr(a, info);
            }
        }
        Expr::Field { receiver, .. } => scan_expr(receiver, info),
        Expr::Index { receiver, index, .. } => {
            scan_expr(receiver, info);
            scan_expr(index, info);
        }
        Expr::New { args, .. } => {
            for a in args {
                scan_expr(a, info);
            }
        }
        Expr::Cast { expr, .. } => scan_expr(expr, info),
        Expr::Paren { inner, .. } => scan_expr(inner, info),
        Expr::Lambda { params, body, .. } => {
            for p in params {
                info.declared.insert(p.name.clone());
            }
            match body.as_ref() {
                LambdaBody::Expr(e) => scan_expr(e, info),
                LambdaBody::Block(b) => {
                    for s in &b.stmts {
                        scan_stmt(s, info);
                    }
                }
            }
        }
        Expr::MethodRef { receiver, .. } => scan_expr(receiver, info),
        Expr::Literal(_) | Expr::Name(_) => {}
    }
}

/// All simple names referenced anywhere in a loop body, minus the names the
/// body declares itself (a redeclared name is a fresh variable, not a
/// capture)
pub fn referenced_variables(body: &Stmt) -> HashSet<String> {
    let mut refs = HashSet::new();
    collect_refs_stmt(body, &mut refs);

    let scope = ScopeInfo::of_body(body);
    refs.retain(|name| !scope.declared.contains(name));
    refs
}

fn collect_refs_stmt(stmt: &Stmt, refs: &mut HashSet<String>) {
    match stmt {
        Stmt::Decl { init, .. } => {
            if let Some(e) = init {
                collect_refs_expr(e, refs);
            }
        }
        Stmt::Expr { expr, .. } => collect_refs_expr(expr, refs),
        Stmt::If { cond, then_branch, else_branch, .. } => {
            collect_refs_expr(cond, refs);
            collect_refs_stmt(then_branch, refs);
            if let Some(e) = else_branch {
                collect_refs_stmt(e, refs);
            }
        }
        Stmt::Block(b) => {
            for s in &b.stmts {
                collect_refs_stmt(s, refs);
            }
        }
        Stmt::ForEach { source, body, .. } => {
            collect_refs_expr(source, refs);
            collect_refs_stmt(body, refs);
        }
        Stmt::While { cond, body, .. } => {
            collect_refs_expr(cond, refs);
            collect_refs_stmt(body, refs);
        }
        Stmt::Return { value, .. } => {
            if let Some(e) = value {
                collect_refs_expr(e, refs);
            }
        }
        Stmt::Throw { value, .. } => collect_refs_expr(value, refs),
        Stmt::Labeled { body, .. } => collect_refs_stmt(body, refs),
        Stmt::Try { body, catches, finally, .. } => {
            for s in &body.stmts {
                collect_refs_stmt(s, refs);
            }
            for c in catches {
                for s in &c.body.stmts {
                    collect_refs_stmt(s, refs);
                }
            }
            if let Some(f) = finally {
                for s in &f.stmts {
                    collect_refs_stmt(s, refs);
                }
            }
        }
        Stmt::Switch { scrutinee, .. } => collect_refs_expr(scrutinee, refs),
        Stmt::Synchronized { lock, body, .. } => {
            collect_refs_expr(lock, refs);
            for s in &body.stmts {
                collect_refs_stmt(s, refs);
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty { .. } => {}
    }
}

fn collect_refs_expr(expr: &Expr, refs: &mut HashSet<String>) {
    match expr {
        Expr::Name(id) => {
            refs.insert(id.name.clone());
        }
        Expr::Unary { expr, .. } => collect_refs_expr(expr, refs),
        Expr::Postfix { expr, .. } => collect_refs_expr(expr, refs),
        Expr::Binary { left, right, .. } => {
            collect_refs_expr(left, refs);
            collect_refs_expr(right, refs);
        }
        Expr::Assign { target, value, .. } => {
            collect_refs_expr(target, refs);
            collect_refs_expr(value, refs);
        }
        Expr::Call { args, .. } => {
            for a in args {
                collect_refs_expr(a, refs);
            }
        }
        Expr::MethodCall { receiver, args, .. } => {
            collect_refs_expr(receiver, refs);
            for a in args {
                collect_refs_expr(a, refs);
            }
        }
        Expr::Field { receiver, .. } => collect_refs_expr(receiver, refs),
        Expr::Index { receiver, index, .. } => {
            collect_refs_expr(receiver, refs);
            collect_refs_expr(index, refs);
        }
        Expr::New { args, .. } => {
            for a in args {
                collect_refs_expr(a, refs);
            }
        }
        Expr::Cast { expr, .. } => collect_refs_expr(expr, refs),
        Expr::Paren { inner, .. } => collect_refs_expr(inner, refs),
        Expr::Lambda { body, .. } => match body.as_ref() {
            LambdaBody::Expr(e) => collect_refs_expr(e, refs),
            LambdaBody::Block(b) => {
                for s in &b.stmts {
                    collect_refs_stmt(s, refs);
                }
            }
        },
        Expr::MethodRef { receiver, .. } => collect_refs_expr(receiver, refs),
        Expr::Literal(_) => {}
    }
}
