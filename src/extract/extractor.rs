//! The classification cascade
//!
//! Walks the loop body statement by statement, first match wins:
//!
//! 1. guard continue            -> filter (negated)
//! 2. early boolean return      -> match terminal (final statement only)
//! 3. guarded tail              -> filter, recurse into the if body
//! 4. declaration with init     -> map producing the declared name
//! 5. reassignment of the
//!    current pipeline variable -> map
//! 6. target.add(expr)          -> collect terminal (final statement only)
//! 7. accumulator statement     -> reduce terminal (final statement only)
//! 8. anything else             -> the rest of the body becomes a forEach
//!
//! A body whose trailing guards consume every statement still gets a
//! forEach terminal over the empty tail, so no filter is lost.

use std::collections::HashMap;
use std::fmt;

use crate::analysis::safety;
use crate::extract::{collect, if_shape, reduce};
use crate::frontend::ast::{AssignOp, Expr, Stmt, TypeRef};
use crate::frontend::printer::{expr_text, stmt_text, type_text};
use crate::model::{
    AccumulatorType, CollectorKind, ElementBinding, LoopModel, Operation, ReducerKind,
    SourceDescriptor, SourceKind, Terminal,
};

/// Why a loop could not be modeled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Facts about the surrounding scope the cascade needs
#[derive(Debug, Default)]
pub struct ExtractContext {
    /// The value of the bare `return <bool>;` directly after the loop, when
    /// there is one (enables match terminals)
    pub following_return: Option<bool>,
    /// Declared types of variables visible at the loop, by name
    pub declarations: HashMap<String, TypeRef>,
}

impl ExtractContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, ty: &TypeRef) {
        self.declarations.insert(name.to_string(), ty.clone());
    }

    pub fn declared_type(&self, name: &str) -> Option<&TypeRef> {
        self.declarations.get(name)
    }
}

/// Source types with a direct `.stream()` method
const COLLECTION_TYPES: &[&str] = &[
    "Collection",
    "List",
    "ArrayList",
    "LinkedList",
    "Set",
    "HashSet",
    "TreeSet",
    "LinkedHashSet",
    "SortedSet",
    "NavigableSet",
    "Queue",
    "Deque",
    "ArrayDeque",
    "PriorityQueue",
    "Vector",
    "Stack",
];

pub(crate) fn resolve_source_kind(source: &Expr, ctx: &ExtractContext) -> SourceKind {
    match source.as_name() {
        Some(name) => match ctx.declared_type(name) {
            Some(ty) if ty.is_array() => SourceKind::Array,
            Some(ty) if COLLECTION_TYPES.contains(&ty.erased_name()) => SourceKind::Collection,
            // Unknown or plain Iterable: the spliterator form is always legal
            _ => SourceKind::Iterable,
        },
        // Non-name sources (method calls) are assumed to produce collections
        None => SourceKind::Collection,
    }
}

/// Extract the loop model of one enhanced-for statement
pub fn extract(stmt: &Stmt, ctx: &ExtractContext) -> Result<LoopModel, Rejection> {
    let Stmt::ForEach { elem_ty, elem_final, var, source, body, .. } = stmt else {
        return Err(Rejection::new("not an enhanced for loop"));
    };

    if let Some(kind) = safety::disallowed_construct(body) {
        return Err(Rejection::new(format!("{} statement in loop body", kind)));
    }

    let source_kind = resolve_source_kind(source, ctx);
    let elem_type = type_text(elem_ty);
    let mut model = LoopModel::new(
        SourceDescriptor::new(source_kind, &expr_text(source), &elem_type),
        ElementBinding::new(&var.name, &elem_type, *elem_final),
    );
    model.metadata = safety::scan_control_flow(body);

    let stmts: Vec<&Stmt> = body
        .as_body()
        .into_iter()
        .filter(|s| !matches!(s, Stmt::Empty { .. }))
        .collect();
    if stmts.is_empty() {
        return Err(Rejection::new("empty loop body"));
    }

    classify(&stmts, &mut model, ctx)?;

    if let Some(Terminal::Collect { target_variable, .. }) = &model.terminal {
        if collect::target_read_during(body, target_variable) {
            return Err(Rejection::new("collection target is read during iteration"));
        }
    }

    Ok(model)
}

fn classify(stmts: &[&Stmt], model: &mut LoopModel, ctx: &ExtractContext) -> Result<(), Rejection> {
    let mut i = 0;
    while i < stmts.len() {
        let stmt = stmts[i];
        let is_last = i + 1 == stmts.len();

        // 1. guard continue
        if let Some(cond) = if_shape::guard_continue(stmt) {
            model.operations.push(Operation::filter(&if_shape::negated_text(cond)));
            i += 1;
            continue;
        }

        if is_last {
            // 2. early boolean return
            if let Some((kind, condition)) = if_shape::match_return(stmt, ctx.following_return) {
                model.terminal = Some(Terminal::Match { kind, condition });
                return Ok(());
            }

            // 3. guarded tail
            if let Some((cond, tail)) = if_shape::guarded_tail(stmt) {
                model.operations.push(Operation::filter(&expr_text(cond)));
                let inner: Vec<&Stmt> = tail
                    .as_body()
                    .into_iter()
                    .filter(|s| !matches!(s, Stmt::Empty { .. }))
                    .collect();
                if inner.is_empty() {
                    return Err(Rejection::new("empty guarded body"));
                }
                return classify(&inner, model, ctx);
            }
        }

        // 4. declaration with initializer
        if !is_last {
            if let Stmt::Decl { ty, name, init: Some(init), .. } = stmt {
                model.operations.push(Operation::Map {
                    expression: expr_text(init),
                    produced_variable: name.name.clone(),
                    output_type: Some(type_text(ty)),
                });
                i += 1;
                continue;
            }
        }

        // 5. reassignment of the current pipeline variable
        if let Stmt::Expr { expr, .. } = stmt {
            if let Expr::Assign { target, op: AssignOp::Assign, value, .. } = expr.unwrap_parens() {
                if target.is_name(model.current_variable()) {
                    let var = model.current_variable().to_string();
                    model.operations.push(Operation::map(&expr_text(value), &var));
                    i += 1;
                    continue;
                }
            }
        }

        if is_last {
            // 6. collection add
            if let Some((target, arg)) = collect::add_call(stmt) {
                build_collect(target, arg, model, ctx);
                return Ok(());
            }

            // 7. accumulator
            if let Some(shape) = reduce::detect(stmt) {
                build_reduce(&shape, model, ctx);
                return Ok(());
            }
        }

        // 8. everything else: the rest of the body is consumed side-effects
        return build_for_each(&stmts[i..], model);
    }

    // A trailing guard consumed every remaining statement; the pipeline
    // still needs its consuming call, over an empty tail.
    build_for_each(&[], model)
}

fn build_collect(target: &str, arg: &Expr, model: &mut LoopModel, ctx: &ExtractContext) {
    let kind = ctx
        .declared_type(target)
        .map(|ty| CollectorKind::from_type_name(ty.erased_name()))
        .unwrap_or(CollectorKind::ToList);

    let current = model.current_variable().to_string();
    if !arg.is_name(&current) {
        model.operations.push(Operation::map(&expr_text(arg), &current));
    }
    model.terminal = Some(Terminal::Collect {
        kind,
        target_variable: target.to_string(),
    });
}

fn build_reduce(shape: &reduce::ReduceShape, model: &mut LoopModel, ctx: &ExtractContext) {
    let acc_ty = ctx
        .declared_type(&shape.variable)
        .map(|ty| AccumulatorType::from_type_name(ty.erased_name()))
        .unwrap_or(AccumulatorType::Other);

    let mut kind = shape.kind;
    if kind == ReducerKind::Sum && acc_ty == AccumulatorType::Str {
        kind = ReducerKind::StringConcat;
    }

    let operand_text = shape.operand.as_ref().map(expr_text);
    let current = model.current_variable().to_string();
    if let Some(map_expr) = kind.map_expression(acc_ty, operand_text.as_deref(), &current) {
        model.operations.push(Operation::map(&map_expr, &kind.map_variable(&current)));
    }

    model.terminal = Some(Terminal::Reduce {
        identity: shape.variable.clone(),
        accumulator: kind.combiner(acc_ty, false),
        kind,
        accumulator_variable: shape.variable.clone(),
    });
}

fn build_for_each(stmts: &[&Stmt], model: &mut LoopModel) -> Result<(), Rejection> {
    for stmt in stmts {
        if let Some(breaker) = flow_breaker(stmt, false) {
            return Err(Rejection::new(format!("{} statement in consumed body", breaker)));
        }
    }
    model.terminal = Some(Terminal::ForEach {
        body: stmts.iter().map(|s| stmt_text(s)).collect(),
        ordered: model.has_operations(),
    });
    Ok(())
}

/// Find control flow that cannot live inside a consumer lambda. An unlabeled
/// break or continue inside a nested loop binds to that loop and is fine;
/// return and throw never are.
fn flow_breaker(stmt: &Stmt, in_nested_loop: bool) -> Option<&'static str> {
    match stmt {
        Stmt::Return { .. } => Some("return"),
        Stmt::Throw { .. } => Some("throw"),
        Stmt::Break { label, .. } => {
            if label.is_some() || !in_nested_loop {
                Some("break")
            } else {
                None
            }
        }
        Stmt::Continue { label, .. } => {
            if label.is_some() || !in_nested_loop {
                Some("continue")
            } else {
                None
            }
        }
        Stmt::If { then_branch, else_branch, .. } => {
            flow_breaker(then_branch, in_nested_loop).or_else(|| {
                else_branch
                    .as_deref()
                    .and_then(|e| flow_breaker(e, in_nested_loop))
            })
        }
        Stmt::Block(b) => b.stmts.iter().find_map(|s| flow_breaker(s, in_nested_loop)),
        Stmt::ForEach { body, .. } | Stmt::While { body, .. } => flow_breaker(body, true),
        Stmt::Labeled { body, .. } => flow_breaker(body, in_nested_loop),
        Stmt::Try { body, catches, finally, .. } => {
            let in_body = body.stmts.iter().find_map(|s| flow_breaker(s, in_nested_loop));
            in_body
                .or_else(|| {
                    catches.iter().find_map(|c| {
                        c.body.stmts.iter().find_map(|s| flow_breaker(s, in_nested_loop))
                    })
                })
                .or_else(|| {
                    finally
                        .as_ref()
                        .and_then(|f| f.stmts.iter().find_map(|s| flow_breaker(s, in_nested_loop)))
                })
        }
        // Switch bodies are skipped at parse time, so a consumed body
        // containing one cannot be reprinted faithfully
        Stmt::Switch { .. } => Some("switch"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use crate::model::MatchKind;
    use pretty_assertions::assert_eq;

    fn parse_loop(source: &str) -> Stmt {
        let mut parser = Parser::from_source(source, 0);
        let program = parser.parse_program().expect("parse failed");
        program
            .stmts
            .into_iter()
            .find(|s| matches!(s, Stmt::ForEach { .. }))
            .expect("no loop in source")
    }

    fn ctx_with(decls: &[(&str, &str)]) -> ExtractContext {
        let mut parser_source = String::new();
        for (name, ty) in decls {
            parser_source.push_str(&format!("{} {};\n", ty, name));
        }
        let mut parser = Parser::from_source(&parser_source, 0);
        let program = parser.parse_program().expect("parse failed");

        let mut ctx = ExtractContext::new();
        for stmt in &program.stmts {
            if let Stmt::Decl { ty, name, .. } = stmt {
                ctx.declare(&name.name, ty);
            }
        }
        ctx
    }

    #[test]
    fn test_plain_for_each() {
        let model = extract(
            &parse_loop("for (String s : names) { log(s); }"),
            &ctx_with(&[("names", "List<String>")]),
        )
        .expect("model");

        assert_eq!(model.source.kind, SourceKind::Collection);
        assert_eq!(model.element.name, "s");
        assert!(model.operations.is_empty());
        if let Some(Terminal::ForEach { body, ordered }) = &model.terminal {
            assert_eq!(body, &vec!["log(s);".to_string()]);
            assert!(!ordered);
        } else {
            panic!("Expected forEach terminal");
        }
    }

    #[test]
    fn test_guard_continue_then_for_each_is_ordered() {
        let model = extract(
            &parse_loop("for (String s : names) { if (s.isEmpty()) continue; log(s); }"),
            &ctx_with(&[("names", "List<String>")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 1);
        if let Operation::Filter { predicate } = &model.operations[0] {
            assert_eq!(predicate, "!(s.isEmpty())");
        } else {
            panic!("Expected filter");
        }
        if let Some(Terminal::ForEach { ordered, .. }) = &model.terminal {
            assert!(ordered);
        } else {
            panic!("Expected forEach terminal");
        }
    }

    #[test]
    fn test_map_chain_threads_variable() {
        let model = extract(
            &parse_loop(
                "for (String s : names) { String t = s.trim(); int n = t.length(); use(n); }",
            ),
            &ctx_with(&[("names", "List<String>")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 2);
        assert_eq!(model.variable_after(0), "s");
        assert_eq!(model.variable_after(1), "t");
        assert_eq!(model.current_variable(), "n");
    }

    #[test]
    fn test_reassignment_becomes_map() {
        let model = extract(
            &parse_loop("for (String s : names) { s = s.trim(); out.add(s); }"),
            &ctx_with(&[("names", "List<String>"), ("out", "List<String>")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 1);
        if let Operation::Map { expression, produced_variable, .. } = &model.operations[0] {
            assert_eq!(expression, "s.trim()");
            assert_eq!(produced_variable, "s");
        } else {
            panic!("Expected map");
        }
        assert!(matches!(model.terminal, Some(Terminal::Collect { .. })));
    }

    #[test]
    fn test_collect_with_map_and_set_target() {
        let model = extract(
            &parse_loop("for (String s : names) { keys.add(s.toUpperCase()); }"),
            &ctx_with(&[("names", "List<String>"), ("keys", "HashSet<String>")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 1);
        if let Some(Terminal::Collect { kind, target_variable }) = &model.terminal {
            assert_eq!(*kind, CollectorKind::ToSet);
            assert_eq!(target_variable, "keys");
        } else {
            panic!("Expected collect terminal");
        }
    }

    #[test]
    fn test_collect_identity_needs_no_map() {
        let model = extract(
            &parse_loop("for (String s : names) { out.add(s); }"),
            &ctx_with(&[("names", "List<String>"), ("out", "List<String>")]),
        )
        .expect("model");

        assert!(model.operations.is_empty());
        assert!(matches!(
            model.terminal,
            Some(Terminal::Collect { kind: CollectorKind::ToList, .. })
        ));
    }

    #[test]
    fn test_collect_rejected_when_target_is_read() {
        let err = extract(
            &parse_loop(
                "for (String s : names) { if (out.contains(s)) continue; out.add(s); }",
            ),
            &ctx_with(&[("names", "List<String>"), ("out", "List<String>")]),
        )
        .expect_err("should reject");
        assert!(err.reason.contains("read during iteration"));
    }

    #[test]
    fn test_sum_reduce() {
        let model = extract(
            &parse_loop("for (String s : names) { total += s.length(); }"),
            &ctx_with(&[("names", "List<String>"), ("total", "int")]),
        )
        .expect("model");

        // The operand is mapped, then folded with the named combiner
        assert_eq!(model.operations.len(), 1);
        if let Some(Terminal::Reduce { identity, accumulator, kind, accumulator_variable }) =
            &model.terminal
        {
            assert_eq!(identity, "total");
            assert_eq!(accumulator, "Integer::sum");
            assert_eq!(*kind, ReducerKind::Sum);
            assert_eq!(accumulator_variable, "total");
        } else {
            panic!("Expected reduce terminal");
        }
    }

    #[test]
    fn test_count_reduce_maps_to_one() {
        let model = extract(
            &parse_loop("for (String s : names) { count++; }"),
            &ctx_with(&[("names", "List<String>"), ("count", "int")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 1);
        if let Operation::Map { expression, produced_variable, .. } = &model.operations[0] {
            assert_eq!(expression, "1");
            assert_eq!(produced_variable, "_item");
        } else {
            panic!("Expected map");
        }
        if let Some(Terminal::Reduce { accumulator, .. }) = &model.terminal {
            assert_eq!(accumulator, "Integer::sum");
        } else {
            panic!("Expected reduce terminal");
        }
    }

    #[test]
    fn test_double_count_uses_counting_lambda() {
        let model = extract(
            &parse_loop("for (String s : names) { count++; }"),
            &ctx_with(&[("names", "List<String>"), ("count", "double")]),
        )
        .expect("model");

        // No map at all; the fold consumes the element placeholder directly
        assert!(model.operations.is_empty());
        if let Some(Terminal::Reduce { accumulator, .. }) = &model.terminal {
            assert_eq!(accumulator, "(a, _item) -> a + 1");
        } else {
            panic!("Expected reduce terminal");
        }
    }

    #[test]
    fn test_string_concat_reduce() {
        let model = extract(
            &parse_loop("for (String s : names) { joined += s; }"),
            &ctx_with(&[("names", "List<String>"), ("joined", "String")]),
        )
        .expect("model");

        if let Some(Terminal::Reduce { kind, accumulator, .. }) = &model.terminal {
            assert_eq!(*kind, ReducerKind::StringConcat);
            assert_eq!(accumulator, "(a, b) -> a + b");
        } else {
            panic!("Expected reduce terminal");
        }
    }

    #[test]
    fn test_any_match() {
        let mut ctx = ctx_with(&[("names", "List<String>")]);
        ctx.following_return = Some(false);

        let model = extract(
            &parse_loop("for (String s : names) { if (s.isEmpty()) return true; }"),
            &ctx,
        )
        .expect("model");

        if let Some(Terminal::Match { kind, condition }) = &model.terminal {
            assert_eq!(*kind, MatchKind::Any);
            assert_eq!(condition, "s.isEmpty()");
        } else {
            panic!("Expected match terminal");
        }
    }

    #[test]
    fn test_all_match_from_negated_condition() {
        let mut ctx = ctx_with(&[("names", "List<String>")]);
        ctx.following_return = Some(true);

        let model = extract(
            &parse_loop("for (String s : names) { if (!(s.isValid())) return false; }"),
            &ctx,
        )
        .expect("model");

        if let Some(Terminal::Match { kind, condition }) = &model.terminal {
            assert_eq!(*kind, MatchKind::All);
            assert_eq!(condition, "s.isValid()");
        } else {
            panic!("Expected match terminal");
        }
    }

    #[test]
    fn test_guarded_tail_becomes_filter() {
        let model = extract(
            &parse_loop("for (String s : names) { if (s.isValid()) { out.add(s); } }"),
            &ctx_with(&[("names", "List<String>"), ("out", "List<String>")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 1);
        if let Operation::Filter { predicate } = &model.operations[0] {
            assert_eq!(predicate, "s.isValid()");
        } else {
            panic!("Expected filter");
        }
        assert!(matches!(model.terminal, Some(Terminal::Collect { .. })));
    }

    #[test]
    fn test_array_source_kind() {
        let model = extract(
            &parse_loop("for (int x : xs) { sum += x; }"),
            &ctx_with(&[("xs", "int[]"), ("sum", "int")]),
        )
        .expect("model");
        assert_eq!(model.source.kind, SourceKind::Array);
    }

    #[test]
    fn test_unknown_source_is_iterable() {
        let model = extract(
            &parse_loop("for (String s : things) { log(s); }"),
            &ExtractContext::new(),
        )
        .expect("model");
        assert_eq!(model.source.kind, SourceKind::Iterable);
    }

    #[test]
    fn test_method_call_source_is_collection() {
        let model = extract(
            &parse_loop("for (String s : lookup(key)) { log(s); }"),
            &ExtractContext::new(),
        )
        .expect("model");
        assert_eq!(model.source.kind, SourceKind::Collection);
    }

    #[test]
    fn test_rejections() {
        let ctx = ctx_with(&[("names", "List<String>")]);

        let err = extract(&parse_loop("for (String s : names) { }"), &ctx).expect_err("empty");
        assert_eq!(err.reason, "empty loop body");

        let err = extract(
            &parse_loop("for (String s : names) { if (s.isEmpty()) break; log(s); }"),
            &ctx,
        )
        .expect_err("break");
        assert!(err.reason.contains("break"));

        let err = extract(
            &parse_loop("for (String s : names) { throw new IllegalStateException(); }"),
            &ctx,
        )
        .expect_err("throw");
        assert!(err.reason.contains("throw"));

        let err = extract(
            &parse_loop("for (String s : names) { try { log(s); } catch (Exception e) { } }"),
            &ctx,
        )
        .expect_err("try");
        assert!(err.reason.contains("try"));

        // A boolean return without a matching return after the loop
        let err = extract(
            &parse_loop("for (String s : names) { if (s.isEmpty()) return true; }"),
            &ctx,
        )
        .expect_err("return");
        assert!(err.reason.contains("return"));

    }

    #[test]
    fn test_trailing_guard_keeps_its_filter() {
        let model = extract(
            &parse_loop("for (String s : names) { if (s.isEmpty()) continue; }"),
            &ctx_with(&[("names", "List<String>")]),
        )
        .expect("model");

        assert_eq!(model.operations.len(), 1);
        if let Operation::Filter { predicate } = &model.operations[0] {
            assert_eq!(predicate, "!(s.isEmpty())");
        } else {
            panic!("Expected filter");
        }
        if let Some(Terminal::ForEach { body, ordered }) = &model.terminal {
            assert!(body.is_empty());
            assert!(ordered);
        } else {
            panic!("Expected forEach terminal");
        }
    }

    #[test]
    fn test_nested_loop_break_stays_inside() {
        let model = extract(
            &parse_loop(
                "for (List<String> g : groups) { for (String s : g) { if (s.isEmpty()) break; log(s); } }",
            ),
            &ctx_with(&[("groups", "List<List<String>>")]),
        )
        .expect("model");

        assert!(!model.metadata.has_break);
        assert!(matches!(model.terminal, Some(Terminal::ForEach { .. })));
    }
}
