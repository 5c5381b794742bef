//! Pipeline assembly
//!
//! Renders a loop model to stream-pipeline source text. The lambda
//! parameter of each step is the produced name of the most recent map
//! before it, so filters written before a rename still see the old name.

use std::collections::HashSet;

use crate::analysis::scope;
use crate::extract::grouping::ConsecutiveGroup;
use crate::frontend::parser::Parser;
use crate::frontend::ast::Stmt;
use crate::model::{
    CollectorKind, LoopModel, MatchKind, Operation, SourceKind, Terminal,
};
use crate::utils::{Error, Result, Span};

/// Replacement text plus the simple names it needs in scope
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub required_symbols: Vec<&'static str>,
}

/// Stream prefix for a source, with the symbol it requires
fn prefix_text(kind: SourceKind, source: &str) -> (String, Option<&'static str>) {
    match kind {
        SourceKind::Collection => (format!("{}.stream()", source), None),
        SourceKind::Array => (format!("Arrays.stream({})", source), Some("Arrays")),
        SourceKind::Iterable => (
            format!("StreamSupport.stream({}.spliterator(), false)", source),
            Some("StreamSupport"),
        ),
    }
}

fn collector_text(kind: CollectorKind) -> &'static str {
    match kind {
        CollectorKind::ToList => "Collectors.toList()",
        CollectorKind::ToSet => "Collectors.toSet()",
    }
}

/// True when the statement text is a plain expression statement, and can
/// therefore drop its braces and semicolon inside a lambda
fn is_expression_stmt(text: &str) -> bool {
    let mut parser = Parser::from_source(text, 0);
    match parser.parse_program() {
        Ok(program) => matches!(program.stmts.as_slice(), [Stmt::Expr { .. }]),
        Err(_) => false,
    }
}

/// A consumer lambda over rendered statements
fn consumer_lambda(param: &str, stmts: &[String]) -> String {
    if stmts.is_empty() {
        return format!("{} -> {{ }}", param);
    }
    if let [only] = stmts {
        if is_expression_stmt(only) {
            return format!("{} -> {}", param, only.trim_end_matches(';'));
        }
    }
    format!("{} -> {{ {} }}", param, stmts.join(" "))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// A name referenced by the given source fragment that is no longer in
/// scope. Names the pipeline never bound are assumed to come from the
/// enclosing scope and pass.
fn out_of_scope_name(text: &str, dropped: &HashSet<String>) -> Option<String> {
    let mut parser = Parser::from_source(text, 0);
    let program = parser.parse_program().ok()?;
    for stmt in &program.stmts {
        let refs = scope::referenced_variables(stmt);
        if let Some(name) = refs.iter().find(|n| dropped.contains(n.as_str())) {
            return Some(name.clone());
        }
    }
    None
}

/// Re-check the model's variable threading before assembly. The available
/// set starts with the element name, gains each map's produced name, and
/// drops the previous pipeline variable once a map renames it; a consumed
/// name that has been dropped signals an inconsistent model, and assembly
/// aborts rather than emitting code that cannot resolve it. Extraction
/// produces consistent models, but a model can also be built directly.
fn validate(model: &LoopModel, span: Span) -> Result<()> {
    if !is_identifier(&model.element.name) {
        return Err(Error::CannotRender {
            message: format!("element name `{}` is not an identifier", model.element.name),
            span,
        });
    }

    let mut current = model.element.name.clone();
    let mut dropped: HashSet<String> = HashSet::new();
    let check = |text: String, dropped: &HashSet<String>| -> Result<()> {
        match out_of_scope_name(&text, dropped) {
            Some(name) => Err(Error::CannotRender {
                message: format!("`{}` is no longer in scope at `{}`", name, text),
                span,
            }),
            None => Ok(()),
        }
    };

    for op in &model.operations {
        match op {
            Operation::Filter { predicate } => {
                check(format!("{};", predicate), &dropped)?;
            }
            Operation::Map { expression, produced_variable, .. } => {
                if !is_identifier(produced_variable) {
                    return Err(Error::CannotRender {
                        message: format!("mapped name `{}` is not an identifier", produced_variable),
                        span,
                    });
                }
                check(format!("{};", expression), &dropped)?;
                if *produced_variable != current {
                    dropped.insert(current);
                    dropped.remove(produced_variable);
                    current = produced_variable.clone();
                }
            }
        }
    }

    match model.terminal.as_ref() {
        Some(Terminal::ForEach { body, .. }) => {
            for stmt in body {
                check(stmt.clone(), &dropped)?;
            }
        }
        Some(Terminal::Match { condition, .. }) => {
            check(format!("{};", condition), &dropped)?;
        }
        Some(Terminal::Reduce { identity, accumulator, .. }) => {
            check(format!("{};", identity), &dropped)?;
            check(format!("{};", accumulator), &dropped)?;
        }
        Some(Terminal::Collect { .. }) | None => {}
    }
    Ok(())
}

/// Render the replacement statement for one loop model
pub fn render(model: &LoopModel, span: Span) -> Result<Rendered> {
    let Some(terminal) = model.terminal.as_ref() else {
        return Err(Error::MissingTerminal { span });
    };
    validate(model, span)?;
    let mut symbols = Vec::new();

    // Bare consumption of a streamable source keeps the direct form
    if let Terminal::ForEach { body, ordered: false } = terminal {
        if model.operations.is_empty() && model.source.kind != SourceKind::Array {
            let lambda = consumer_lambda(&model.element.name, body);
            return Ok(Rendered {
                text: format!("{}.forEach({});", model.source.expression, lambda),
                required_symbols: symbols,
            });
        }
    }

    let (mut chain, prefix_symbol) = prefix_text(model.source.kind, &model.source.expression);
    if let Some(sym) = prefix_symbol {
        symbols.push(sym);
    }

    for (i, op) in model.operations.iter().enumerate() {
        let param = model.variable_after(i);
        match op {
            Operation::Filter { predicate } => {
                chain.push_str(&format!(".filter({} -> {})", param, predicate));
            }
            Operation::Map { expression, produced_variable, .. } => {
                // A map that ignores its input (count loops map to a literal
                // 1) renames the unused parameter to the produced placeholder
                let param = if expression.contains(param) { param } else { produced_variable };
                chain.push_str(&format!(".map({} -> {})", param, expression));
            }
        }
    }

    let param = model.current_variable();
    let text = match terminal {
        Terminal::ForEach { body, ordered } => {
            let method = if *ordered { "forEachOrdered" } else { "forEach" };
            format!("{}.{}({});", chain, method, consumer_lambda(param, body))
        }
        Terminal::Collect { kind, target_variable } => {
            symbols.push("Collectors");
            format!("{} = {}.collect({});", target_variable, chain, collector_text(*kind))
        }
        Terminal::Reduce { identity, accumulator, accumulator_variable, .. } => {
            format!(
                "{} = {}.reduce({}, {});",
                accumulator_variable, chain, identity, accumulator
            )
        }
        Terminal::Match { kind, condition } => {
            let lambda = format!("{} -> {}", param, condition);
            match kind {
                MatchKind::Any => format!("if ({}.anyMatch({})) return true;", chain, lambda),
                MatchKind::None => format!("if (!{}.noneMatch({})) return false;", chain, lambda),
                MatchKind::All => format!("if (!{}.allMatch({})) return false;", chain, lambda),
            }
        }
    };

    Ok(Rendered { text, required_symbols: symbols })
}

/// Render a consecutive add-loop group as one concatenated pipeline
pub fn render_group(group: &ConsecutiveGroup, collector: CollectorKind) -> Rendered {
    let mut symbols = vec!["Stream", "Collectors"];

    let mut member_pipelines = Vec::new();
    for member in &group.members {
        let (mut pipe, prefix_symbol) = prefix_text(member.kind, &member.source);
        if let Some(sym) = prefix_symbol {
            if !symbols.contains(&sym) {
                symbols.push(sym);
            }
        }
        if !member.identity {
            pipe.push_str(&format!(".map({} -> {})", member.element, member.add_arg));
        }
        member_pipelines.push(pipe);
    }

    let mut concat = member_pipelines[0].clone();
    for pipe in &member_pipelines[1..] {
        concat = format!("Stream.concat({}, {})", concat, pipe);
    }

    Rendered {
        text: format!(
            "{} = {}.collect({});",
            group.target,
            concat,
            collector_text(collector)
        ),
        required_symbols: symbols,
    }
}
