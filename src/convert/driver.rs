//! The conversion driver
//!
//! Walks a parsed file, builds the loop tree while descending, and decides
//! every loop bottom-up: a loop whose descendant already converts is
//! skipped, everything else runs the extraction cascade plus the safety
//! checks. Survivors are rendered and spliced back into the source text.

use std::collections::HashSet;

use log::{debug, warn};

use crate::analysis::loop_tree::{Decision, LoopTree, NodeId};
use crate::analysis::safety;
use crate::analysis::scope::{referenced_variables, ScopeInfo};
use crate::convert::report::{LoopReport, Report};
use crate::extract::grouping::{self, ConsecutiveGroup};
use crate::extract::{collect, extract, ExtractContext};
use crate::frontend::ast::{Expr, Stmt, TypeRef};
use crate::frontend::parser::Parser;
use crate::frontend::printer::{expr_text, type_text};
use crate::model::{CollectorKind, LoopModel, Operation, Terminal};
use crate::render::{loopback, pipeline, Rewrite};
use crate::utils::Result;

/// The outcome of one conversion run
#[derive(Debug)]
pub struct Conversion {
    pub output: String,
    pub report: Report,
}

/// A declaration visible at the current walk position
#[derive(Debug, Clone)]
struct DeclInfo {
    name: String,
    ty: TypeRef,
    init: Option<Expr>,
    /// Introduced by a loop header rather than a declaration statement;
    /// carries a type but no initializer to classify
    binding: bool,
}

/// Convert every safe loop in a source file to a pipeline
pub fn convert_source(source: &str, file_id: usize) -> Result<Conversion> {
    let program = Parser::from_source(source, file_id).parse_program()?;

    let mut cv = Converter::default();
    cv.process_block(&program.stmts);
    Ok(cv.finish(source))
}

/// Convert every bare forEach pipeline in a source file back to an
/// iterator-while loop
pub fn convert_to_loops(source: &str, file_id: usize) -> Result<Conversion> {
    let program = Parser::from_source(source, file_id).parse_program()?;

    let mut decls = Vec::new();
    let mut rewrites = Vec::new();
    walk_pipelines(&program.stmts, &mut decls, &mut rewrites);

    let symbols = collect_symbols(&rewrites);
    let count = rewrites.len();
    let output = apply_rewrites(source, &mut rewrites);
    Ok(Conversion {
        output,
        report: Report {
            loops: Vec::new(),
            groups: 0,
            rewrites: count,
            required_symbols: symbols,
        },
    })
}

#[derive(Default)]
struct Converter {
    tree: LoopTree,
    rewrites: Vec<Rewrite>,
    loops: Vec<LoopReport>,
    groups: usize,
    decls: Vec<DeclInfo>,
}

impl Converter {
    fn ctx(&self, following_return: Option<bool>) -> ExtractContext {
        let mut ctx = ExtractContext::new();
        ctx.following_return = following_return;
        for decl in &self.decls {
            ctx.declare(&decl.name, &decl.ty);
        }
        ctx
    }

    fn lookup(&self, name: &str) -> Option<&DeclInfo> {
        self.decls.iter().rev().find(|d| d.name == name)
    }

    fn process_block(&mut self, stmts: &[Stmt]) {
        let scope_mark = self.decls.len();
        let mut grouped: HashSet<usize> = HashSet::new();

        for i in 0..stmts.len() {
            let stmt = &stmts[i];
            if grouped.contains(&i) {
                self.register_grouped_member(stmt);
                continue;
            }

            match stmt {
                Stmt::Decl { ty, name, init, .. } => {
                    self.decls.push(DeclInfo {
                        name: name.name.clone(),
                        ty: ty.clone(),
                        init: init.clone(),
                        binding: false,
                    });
                }
                Stmt::ForEach { .. } => {
                    if let Some(group) = self.group_at(stmts, i) {
                        for offset in 1..group.members.len() {
                            grouped.insert(i + offset);
                        }
                        self.emit_group(&group, if i > 0 { Some(&stmts[i - 1]) } else { None });
                        self.register_grouped_member(stmt);
                        continue;
                    }
                    let prev = if i > 0 { Some(&stmts[i - 1]) } else { None };
                    self.process_loop(stmt, prev, stmts.get(i + 1));
                }
                other => self.descend(other),
            }
        }

        self.decls.truncate(scope_mark);
    }

    /// A maximal add-loop run starting exactly at position `i`, if any
    fn group_at(&self, stmts: &[Stmt], i: usize) -> Option<ConsecutiveGroup> {
        let ctx = self.ctx(None);
        grouping::find_groups(&stmts[i..], &ctx)
            .into_iter()
            .find(|g| g.members[0].index == 0)
    }

    fn descend(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If { then_branch, else_branch, .. } => {
                self.descend_body(then_branch);
                if let Some(e) = else_branch {
                    self.descend_body(e);
                }
            }
            Stmt::Block(b) => self.process_block(&b.stmts),
            Stmt::While { body, .. } => self.descend_body(body),
            Stmt::Labeled { body, .. } => self.descend_body(body),
            Stmt::Try { body, catches, finally, .. } => {
                self.process_block(&body.stmts);
                for c in catches {
                    self.process_block(&c.body.stmts);
                }
                if let Some(f) = finally {
                    self.process_block(&f.stmts);
                }
            }
            Stmt::Synchronized { body, .. } => self.process_block(&body.stmts),
            _ => {}
        }
    }

    fn descend_body(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(b) => self.process_block(&b.stmts),
            Stmt::ForEach { .. } => self.process_loop(stmt, None, None),
            other => self.descend(other),
        }
    }

    fn process_loop(&mut self, stmt: &Stmt, prev: Option<&Stmt>, next: Option<&Stmt>) {
        let Stmt::ForEach { elem_ty, var, body, span, .. } = stmt else {
            return;
        };

        let id = self.tree.enter(*span, ScopeInfo::of_body(body));

        // The element is visible to nested loops as a typed binding
        let scope_mark = self.decls.len();
        self.decls.push(DeclInfo {
            name: var.name.clone(),
            ty: elem_ty.clone(),
            init: None,
            binding: true,
        });
        self.descend_body(body);
        self.decls.truncate(scope_mark);

        let (decision, reason) = if self.tree.has_convertible_descendant(id) {
            (Decision::SkippedInnerConverted, None)
        } else {
            match self.decide(stmt, id, prev, next) {
                Ok(None) => (Decision::Convertible, None),
                Ok(Some(reason)) => (Decision::NotConvertible, Some(reason)),
                Err(err) => {
                    warn!(
                        "loop at {}..{} left unchanged after internal failure: {}",
                        span.start, span.end, err
                    );
                    (Decision::NotConvertible, Some(err.to_string()))
                }
            }
        };

        self.tree.exit();
        self.tree.node_mut(id).decision = decision;
        self.loops.push(LoopReport {
            start: span.start,
            end: span.end,
            decision,
            reason,
        });
    }

    /// Run the cascade and the safety checks for one loop. `Ok(None)` means
    /// the loop converted and its rewrite was queued.
    fn decide(
        &mut self,
        stmt: &Stmt,
        id: NodeId,
        prev: Option<&Stmt>,
        next: Option<&Stmt>,
    ) -> Result<Option<String>> {
        let Stmt::ForEach { source, body, span, .. } = stmt else {
            return Ok(Some("unsupported loop form".to_string()));
        };

        let following_return = match next {
            Some(Stmt::Return { value: Some(v), .. }) => v.as_bool_literal(),
            _ => None,
        };
        let ctx = self.ctx(following_return);

        let model = match extract(stmt, &ctx) {
            Ok(model) => model,
            Err(rejection) => {
                debug!("loop at {}..{}: {}", span.start, span.end, rejection);
                return Ok(Some(rejection.reason));
            }
        };

        if model.metadata.has_break {
            return Ok(Some("break statement in loop body".to_string()));
        }
        if model.metadata.has_labeled_continue {
            return Ok(Some("labeled continue in loop body".to_string()));
        }

        let referenced = referenced_variables(body);
        if let Some(name) = safety::capture_violation(&self.tree, id, &referenced) {
            return Ok(Some(format!(
                "captured variable `{}` is modified by an enclosing loop",
                name
            )));
        }

        let allowed = allowed_mutations(&model);
        if let Some(name) = safety::unsafe_mutations(body, &allowed).first() {
            return Ok(Some(format!("loop body assigns `{}` outside the pipeline", name)));
        }

        if let Some(name) = source.as_name() {
            if let Some(decl) = self.lookup(name) {
                if !decl.binding
                    && safety::classify_declaration(&decl.ty, decl.init.as_ref())
                        .blocks_conversion()
                {
                    return Ok(Some(format!("source `{}` may be shared", name)));
                }
            }
        }

        let rewrite = self.render_with_merge(&model, stmt, prev)?;
        self.tree.node_mut(id).model = Some(model);
        self.rewrites.push(rewrite);
        Ok(None)
    }

    /// Render a model; a collect or reduce whose target is declared by the
    /// directly preceding statement absorbs that declaration.
    fn render_with_merge(
        &self,
        model: &LoopModel,
        stmt: &Stmt,
        prev: Option<&Stmt>,
    ) -> Result<Rewrite> {
        let span = stmt.span();

        match (&model.terminal, prev) {
            (Some(Terminal::Collect { target_variable, .. }), Some(decl)) => {
                if collect::is_empty_collection_decl(decl, target_variable) {
                    if let Stmt::Decl { ty, .. } = decl {
                        let rendered = pipeline::render(model, span)?;
                        return Ok(Rewrite::new(
                            decl.span().merge(&span),
                            format!("{} {}", type_text(ty), rendered.text),
                            rendered.required_symbols,
                        ));
                    }
                }
            }
            (Some(Terminal::Reduce { accumulator_variable, .. }), Some(decl)) => {
                if let Stmt::Decl { ty, name, init: Some(init), .. } = decl {
                    if &name.name == accumulator_variable {
                        // The declaration's initializer becomes the fold identity
                        let mut merged = model.clone();
                        if let Some(Terminal::Reduce { identity, .. }) = merged.terminal.as_mut() {
                            *identity = expr_text(init);
                        }
                        let rendered = pipeline::render(&merged, span)?;
                        return Ok(Rewrite::new(
                            decl.span().merge(&span),
                            format!("{} {}", type_text(ty), rendered.text),
                            rendered.required_symbols,
                        ));
                    }
                }
            }
            _ => {}
        }

        let rendered = pipeline::render(model, span)?;
        Ok(Rewrite::new(span, rendered.text, rendered.required_symbols))
    }

    fn emit_group(&mut self, group: &ConsecutiveGroup, prev: Option<&Stmt>) {
        let collector = self
            .lookup(&group.target)
            .map(|d| CollectorKind::from_type_name(d.ty.erased_name()))
            .unwrap_or(CollectorKind::ToList);

        let rendered = pipeline::render_group(group, collector);
        let span = group.span();

        let rewrite = match prev {
            Some(decl @ Stmt::Decl { ty, .. })
                if collect::is_empty_collection_decl(decl, &group.target) =>
            {
                Rewrite::new(
                    decl.span().merge(&span),
                    format!("{} {}", type_text(ty), rendered.text),
                    rendered.required_symbols,
                )
            }
            _ => Rewrite::new(span, rendered.text, rendered.required_symbols),
        };

        self.rewrites.push(rewrite);
        self.groups += 1;
    }

    /// Enter a grouped loop into the tree so enclosing loops see a
    /// converted descendant, without running the cascade on it
    fn register_grouped_member(&mut self, stmt: &Stmt) {
        let Stmt::ForEach { body, span, .. } = stmt else {
            return;
        };
        let id = self.tree.enter(*span, ScopeInfo::of_body(body));
        self.tree.exit();

        let node = self.tree.node_mut(id);
        node.decision = Decision::Convertible;
        node.grouped = true;

        self.loops.push(LoopReport {
            start: span.start,
            end: span.end,
            decision: Decision::Convertible,
            reason: None,
        });
    }

    fn finish(mut self, source: &str) -> Conversion {
        let required_symbols = collect_symbols(&self.rewrites);
        let rewrites = self.rewrites.len();
        let output = apply_rewrites(source, &mut self.rewrites);

        Conversion {
            output,
            report: Report {
                loops: self.loops,
                groups: self.groups,
                rewrites,
                required_symbols,
            },
        }
    }
}

/// Names the pipeline itself is allowed to assign: the element, every
/// mapped name, and the reduce accumulator
fn allowed_mutations(model: &LoopModel) -> HashSet<String> {
    let mut allowed = HashSet::new();
    allowed.insert(model.element.name.clone());
    for op in &model.operations {
        if let Operation::Map { produced_variable, .. } = op {
            allowed.insert(produced_variable.clone());
        }
    }
    if let Some(Terminal::Reduce { accumulator_variable, .. }) = &model.terminal {
        allowed.insert(accumulator_variable.clone());
    }
    allowed
}

fn collect_symbols(rewrites: &[Rewrite]) -> Vec<String> {
    let mut symbols: Vec<String> = rewrites
        .iter()
        .flat_map(|r| r.required_symbols.iter().map(|s| s.to_string()))
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

/// Splice the queued replacements into the source text. Spans are char
/// offsets from the lexer; later rewrites that overlap an earlier one are
/// dropped.
fn apply_rewrites(source: &str, rewrites: &mut [Rewrite]) -> String {
    rewrites.sort_by_key(|r| r.span.start);

    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;

    for rewrite in rewrites.iter() {
        if rewrite.span.start < pos {
            continue;
        }
        out.extend(chars[pos..rewrite.span.start].iter());
        out.push_str(&rewrite.replacement);
        pos = rewrite.span.end;
    }
    out.extend(chars[pos..].iter());
    out
}

/// Recursive walk for the pipeline-to-loop direction
fn walk_pipelines(stmts: &[Stmt], decls: &mut Vec<DeclInfo>, rewrites: &mut Vec<Rewrite>) {
    let scope_mark = decls.len();

    for stmt in stmts {
        match stmt {
            Stmt::Decl { ty, name, init, .. } => {
                decls.push(DeclInfo {
                    name: name.name.clone(),
                    ty: ty.clone(),
                    init: init.clone(),
                    binding: false,
                });
            }
            Stmt::Expr { .. } => {
                let mut ctx = ExtractContext::new();
                for decl in decls.iter() {
                    ctx.declare(&decl.name, &decl.ty);
                }
                if let Some(rendered) = loopback::to_iterator_while(stmt, &ctx) {
                    rewrites.push(Rewrite::new(
                        stmt.span(),
                        rendered.text,
                        rendered.required_symbols,
                    ));
                }
            }
            Stmt::If { then_branch, else_branch, .. } => {
                walk_pipelines(std::slice::from_ref(then_branch), decls, rewrites);
                if let Some(e) = else_branch {
                    walk_pipelines(std::slice::from_ref(e), decls, rewrites);
                }
            }
            Stmt::Block(b) => walk_pipelines(&b.stmts, decls, rewrites),
            Stmt::ForEach { body, .. } | Stmt::While { body, .. } => {
                walk_pipelines(std::slice::from_ref(body), decls, rewrites);
            }
            Stmt::Labeled { body, .. } => {
                walk_pipelines(std::slice::from_ref(body), decls, rewrites);
            }
            Stmt::Try { body, catches, finally, .. } => {
                walk_pipelines(&body.stmts, decls, rewrites);
                for c in catches {
                    walk_pipelines(&c.body.stmts, decls, rewrites);
                }
                if let Some(f) = finally {
                    walk_pipelines(&f.stmts, decls, rewrites);
                }
            }
            Stmt::Synchronized { body, .. } => walk_pipelines(&body.stmts, decls, rewrites),
            _ => {}
        }
    }

    decls.truncate(scope_mark);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convert(source: &str) -> Conversion {
        convert_source(source, 0).expect("conversion failed")
    }

    #[test]
    fn test_simple_for_each_conversion() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             for (String s : names) { log(s); }",
        );
        assert!(c.output.contains("names.forEach(s -> log(s));"));
        assert_eq!(c.report.rewrites, 1);
        assert_eq!(c.report.converted(), 1);
    }

    #[test]
    fn test_collect_merges_declaration() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             List<String> out = new ArrayList<>();\n\
             for (String s : names) { out.add(s.trim()); }",
        );
        assert!(c.output.contains(
            "List<String> out = names.stream().map(s -> s.trim()).collect(Collectors.toList());"
        ));
        assert!(!c.output.contains("out.add"));
        assert!(c.report.required_symbols.contains(&"Collectors".to_string()));
    }

    #[test]
    fn test_reduce_merges_declaration_identity() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             int total = 0;\n\
             for (String s : names) { total += s.length(); }",
        );
        assert!(c.output.contains(
            "int total = names.stream().map(s -> s.length()).reduce(0, Integer::sum);"
        ));
    }

    #[test]
    fn test_reduce_without_declaration_folds_from_variable() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             int total = seed();\n\
             log(total);\n\
             for (String s : names) { total += s.length(); }",
        );
        // The declaration is not adjacent, so the running value is the identity
        assert!(c.output.contains("total = names.stream().map(s -> s.length()).reduce(total, Integer::sum);"));
        assert!(c.output.contains("int total = seed();"));
    }

    #[test]
    fn test_inner_loop_wins_over_outer() {
        let c = convert(
            "List<List<String>> groups = new ArrayList<>();\n\
             for (List<String> group : groups) {\n\
                 for (String s : group) { log(s); }\n\
             }",
        );
        assert!(c.output.contains("group.forEach(s -> log(s));"));
        // The outer loop survives as a loop
        assert!(c.output.contains("for (List<String> group : groups)"));

        let decisions: Vec<Decision> = c.report.loops.iter().map(|l| l.decision).collect();
        assert_eq!(
            decisions,
            vec![Decision::Convertible, Decision::SkippedInnerConverted]
        );
    }

    #[test]
    fn test_break_blocks_conversion() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             for (String s : names) { if (s.isEmpty()) break; log(s); }",
        );
        assert_eq!(c.report.rewrites, 0);
        assert_eq!(c.report.loops.len(), 1);
        assert_eq!(c.report.loops[0].decision, Decision::NotConvertible);
        assert!(c.output.contains("for (String s : names)"));
    }

    #[test]
    fn test_capture_of_modified_variable_blocks_inner_loop() {
        let c = convert(
            "for (String a : xs) {\n\
                 a = a.trim();\n\
                 for (String b : ys) { use(a, b); }\n\
             }",
        );
        let inner = &c.report.loops[0];
        assert_eq!(inner.decision, Decision::NotConvertible);
        assert!(inner.reason.as_deref().unwrap().contains("captured variable `a`"));
    }

    #[test]
    fn test_external_side_effect_blocks_conversion() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             for (String s : names) { seen = s; log(s); }",
        );
        assert_eq!(c.report.loops[0].decision, Decision::NotConvertible);
        assert!(c.report.loops[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("assigns `seen`"));
    }

    #[test]
    fn test_shared_source_blocks_conversion() {
        let c = convert(
            "List<String> shared = registry.current();\n\
             for (String s : shared) { log(s); }",
        );
        assert_eq!(c.report.loops[0].decision, Decision::NotConvertible);
        assert!(c.report.loops[0].reason.as_deref().unwrap().contains("shared"));
    }

    #[test]
    fn test_synchronized_wrapped_source_converts() {
        let c = convert(
            "List<String> safe = Collections.synchronizedList(base);\n\
             for (String s : safe) { log(s); }",
        );
        assert_eq!(c.report.converted(), 1);
    }

    #[test]
    fn test_match_keeps_following_return() {
        let c = convert(
            "List<String> names = new ArrayList<>();\n\
             for (String s : names) { if (s.isEmpty()) return true; }\n\
             return false;",
        );
        assert!(c
            .output
            .contains("if (names.stream().anyMatch(s -> s.isEmpty())) return true;"));
        assert!(c.output.contains("return false;"));
    }

    #[test]
    fn test_consecutive_add_loops_concatenate() {
        let c = convert(
            "List<String> first = new ArrayList<>();\n\
             List<String> second = new ArrayList<>();\n\
             List<String> all = new ArrayList<>();\n\
             for (String a : first) { all.add(a); }\n\
             for (String b : second) { all.add(b); }",
        );
        assert!(c.output.contains(
            "List<String> all = Stream.concat(first.stream(), second.stream()).collect(Collectors.toList());"
        ));
        assert_eq!(c.report.groups, 1);
        assert_eq!(c.report.loops.len(), 2);
        assert!(c.report.required_symbols.contains(&"Stream".to_string()));
    }

    #[test]
    fn test_pipeline_back_to_loop() {
        let c = convert_to_loops(
            "List<String> names = new ArrayList<>();\n\
             names.forEach(s -> log(s));",
            0,
        )
        .expect("conversion failed");

        assert!(c.output.contains("Iterator<String> it = names.iterator();"));
        assert!(c.output.contains("while (it.hasNext()) {"));
        assert!(c.output.contains("String s = it.next();"));
        assert_eq!(c.report.rewrites, 1);
        assert!(c.report.required_symbols.contains(&"Iterator".to_string()));
    }

    #[test]
    fn test_round_trip_restores_a_loop_form() {
        let forward = convert(
            "List<String> names = new ArrayList<>();\n\
             for (String s : names) { log(s); }",
        );
        let back = convert_to_loops(&forward.output, 0).expect("conversion failed");

        assert!(back.output.contains("while (it.hasNext()) {"));
        assert!(back.output.contains("log(s);"));
    }
}
