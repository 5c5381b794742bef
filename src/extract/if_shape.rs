//! If-statement shapes the cascade recognizes
//!
//! Three shapes matter: the guard continue (`if (c) continue;`), the early
//! boolean return (`if (c) return true;` with a boolean return following the
//! loop), and the guarded tail (a final else-less if wrapping the rest of
//! the body).

use crate::frontend::ast::{Expr, Stmt, UnOp};
use crate::frontend::printer::expr_text;
use crate::model::MatchKind;

/// Strip one syntactic negation, looking through parentheses.
/// `!(c)` and `!c` both yield `c`; anything else yields None.
pub fn strip_negation(expr: &Expr) -> Option<&Expr> {
    match expr.unwrap_parens() {
        Expr::Unary { op: UnOp::Not, expr, .. } => Some(expr.unwrap_parens()),
        _ => None,
    }
}

/// Negate a condition for use as a filter predicate. An already-negated
/// condition has its negation stripped instead of being double-wrapped.
pub fn negated_text(cond: &Expr) -> String {
    match strip_negation(cond) {
        Some(inner) => expr_text(inner),
        None => format!("!({})", expr_text(cond)),
    }
}

/// Match `if (c) continue;` with no else and an unlabeled continue
pub fn guard_continue(stmt: &Stmt) -> Option<&Expr> {
    let Stmt::If { cond, then_branch, else_branch: None, .. } = stmt else {
        return None;
    };
    match then_branch.unwrap_single() {
        Stmt::Continue { label: None, .. } => Some(cond),
        _ => None,
    }
}

/// Match `if (c) return <bool>;` against the boolean return that follows
/// the loop in the surrounding scope.
///
/// * returns `true` inside, `false` after: any-match
/// * returns `false` inside, `true` after: none-match, or all-match when the
///   condition is syntactically negated (the negation is removed)
///
/// Any other value combination has no match terminal.
pub fn match_return(stmt: &Stmt, following_return: Option<bool>) -> Option<(MatchKind, String)> {
    let Stmt::If { cond, then_branch, else_branch: None, .. } = stmt else {
        return None;
    };
    let Stmt::Return { value: Some(value), .. } = then_branch.unwrap_single() else {
        return None;
    };
    let inside = value.as_bool_literal()?;
    let after = following_return?;

    match (inside, after) {
        (true, false) => Some((MatchKind::Any, expr_text(cond))),
        (false, true) => match strip_negation(cond) {
            Some(inner) => Some((MatchKind::All, expr_text(inner))),
            None => Some((MatchKind::None, expr_text(cond))),
        },
        _ => None,
    }
}

/// Match a final else-less if whose body continues the cascade:
/// `if (c) { rest... }` becomes a filter on `c` over the rest.
pub fn guarded_tail(stmt: &Stmt) -> Option<(&Expr, &Stmt)> {
    match stmt {
        Stmt::If { cond, then_branch, else_branch: None, .. } => Some((cond, then_branch)),
        _ => None,
    }
}
