//! Accumulator statement shapes
//!
//! Detects the final-statement shapes that fold into a reduce terminal:
//! increment/decrement, compound assignment, self-referential assignment,
//! and `Math.max`/`Math.min` folds. Type-sensitive decisions (string
//! concatenation, combiner selection) happen later, once the accumulator's
//! declared type is known.

use crate::frontend::ast::{AssignOp, BinOp, Expr, IncDecOp, Stmt, UnOp};
use crate::model::ReducerKind;

/// A detected accumulator statement
#[derive(Debug, Clone)]
pub struct ReduceShape {
    /// The accumulator variable
    pub variable: String,
    pub kind: ReducerKind,
    /// The folded operand; None for pure counting (`x++`)
    pub operand: Option<Expr>,
}

impl ReduceShape {
    fn new(variable: &str, kind: ReducerKind, operand: Option<&Expr>) -> Self {
        Self {
            variable: variable.to_string(),
            kind,
            operand: operand.cloned(),
        }
    }
}

/// Detect an accumulator shape in a statement
pub fn detect(stmt: &Stmt) -> Option<ReduceShape> {
    let Stmt::Expr { expr, .. } = stmt else {
        return None;
    };

    match expr.unwrap_parens() {
        Expr::Postfix { op, expr, .. } => {
            let name = expr.as_name()?;
            let kind = match op {
                IncDecOp::Inc => ReducerKind::Increment,
                IncDecOp::Dec => ReducerKind::Decrement,
            };
            Some(ReduceShape::new(name, kind, None))
        }
        Expr::Unary { op: UnOp::PreInc, expr, .. } => {
            Some(ReduceShape::new(expr.as_name()?, ReducerKind::Increment, None))
        }
        Expr::Unary { op: UnOp::PreDec, expr, .. } => {
            Some(ReduceShape::new(expr.as_name()?, ReducerKind::Decrement, None))
        }
        Expr::Assign { target, op, value, .. } => {
            let name = target.as_name()?;
            let value: &Expr = value;
            match op {
                AssignOp::Add => Some(ReduceShape::new(name, ReducerKind::Sum, Some(value))),
                AssignOp::Sub => Some(ReduceShape::new(name, ReducerKind::Decrement, Some(value))),
                AssignOp::Mul => Some(ReduceShape::new(name, ReducerKind::Product, Some(value))),
                AssignOp::Assign => detect_self_assign(name, value),
                AssignOp::Div => None,
            }
        }
        _ => None,
    }
}

/// `x = x + e`, `x = x * e`, `x = x - e`, `x = Math.max(x, e)`
fn detect_self_assign(name: &str, value: &Expr) -> Option<ReduceShape> {
    match value.unwrap_parens() {
        Expr::Binary { left, op, right, .. } if left.is_name(name) => {
            let kind = match op {
                BinOp::Add => ReducerKind::Sum,
                BinOp::Sub => ReducerKind::Decrement,
                BinOp::Mul => ReducerKind::Product,
                _ => return None,
            };
            Some(ReduceShape::new(name, kind, Some(right.as_ref())))
        }
        Expr::MethodCall { receiver, method, args, .. } => {
            if !receiver.is_name("Math") || args.len() != 2 {
                return None;
            }
            let kind = match method.name.as_str() {
                "max" => ReducerKind::Max,
                "min" => ReducerKind::Min,
                _ => return None,
            };
            let operand = if args[0].is_name(name) {
                &args[1]
            } else if args[1].is_name(name) {
                &args[0]
            } else {
                return None;
            };
            Some(ReduceShape::new(name, kind, Some(operand)))
        }
        _ => None,
    }
}
