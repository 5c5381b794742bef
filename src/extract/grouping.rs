//! Consecutive add-loop groups
//!
//! A maximal run of two or more adjacent sibling loops that each do nothing
//! but add into the same collection collapses into a single concatenated
//! pipeline. Members are detected here; the combined rewrite is assembled by
//! the renderer.

use crate::extract::{collect, extractor};
use crate::extract::extractor::ExtractContext;
use crate::frontend::ast::Stmt;
use crate::frontend::printer::expr_text;
use crate::model::SourceKind;
use crate::utils::Span;

/// One loop of a group
#[derive(Debug, Clone)]
pub struct GroupMember {
    /// Position in the sibling statement list
    pub index: usize,
    pub span: Span,
    pub kind: SourceKind,
    /// Source expression text
    pub source: String,
    /// Element variable name
    pub element: String,
    /// Argument text of the add call
    pub add_arg: String,
    /// True when the add argument is exactly the element
    pub identity: bool,
}

/// A run of adjacent loops feeding one target collection
#[derive(Debug, Clone)]
pub struct ConsecutiveGroup {
    pub target: String,
    pub members: Vec<GroupMember>,
}

impl ConsecutiveGroup {
    /// The source span covered by all member loops
    pub fn span(&self) -> Span {
        let first = self.members.first().map(|m| m.span).unwrap_or_else(Span::dummy);
        let last = self.members.last().map(|m| m.span).unwrap_or_else(Span::dummy);
        first.merge(&last)
    }
}

/// Match a loop whose body is exactly one `target.add(arg)` statement
fn add_only_loop(index: usize, stmt: &Stmt, ctx: &ExtractContext) -> Option<(String, GroupMember)> {
    let Stmt::ForEach { var, source, body, span, .. } = stmt else {
        return None;
    };
    let stmts: Vec<&Stmt> = body
        .as_body()
        .into_iter()
        .filter(|s| !matches!(s, Stmt::Empty { .. }))
        .collect();
    if stmts.len() != 1 {
        return None;
    }
    let (target, arg) = collect::add_call(stmts[0])?;

    Some((
        target.to_string(),
        GroupMember {
            index,
            span: *span,
            kind: extractor::resolve_source_kind(source, ctx),
            source: expr_text(source),
            element: var.name.clone(),
            add_arg: expr_text(arg),
            identity: arg.is_name(&var.name),
        },
    ))
}

/// Find every maximal run of two or more adjacent add-only loops with a
/// common target in a sibling statement list
pub fn find_groups(stmts: &[Stmt], ctx: &ExtractContext) -> Vec<ConsecutiveGroup> {
    let mut groups = Vec::new();
    let mut i = 0;

    while i < stmts.len() {
        let Some((target, first)) = add_only_loop(i, &stmts[i], ctx) else {
            i += 1;
            continue;
        };

        let mut members = vec![first];
        let mut j = i + 1;
        while j < stmts.len() {
            match add_only_loop(j, &stmts[j], ctx) {
                Some((t, m)) if t == target => {
                    members.push(m);
                    j += 1;
                }
                _ => break,
            }
        }

        if members.len() >= 2 {
            groups.push(ConsecutiveGroup { target, members });
        }
        i = j.max(i + 1);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::Stmt;
    use crate::frontend::parser::Parser;

    fn parse(source: &str) -> Vec<Stmt> {
        let mut parser = Parser::from_source(source, 0);
        parser.parse_program().expect("parse failed").stmts
    }

    fn ctx(decls: &str) -> ExtractContext {
        let mut ctx = ExtractContext::new();
        for stmt in parse(decls) {
            if let Stmt::Decl { ty, name, .. } = stmt {
                ctx.declare(&name.name, &ty);
            }
        }
        ctx
    }

    #[test]
    fn test_two_adjacent_add_loops_group() {
        let stmts = parse(
            "for (String a : first) { out.add(a); } \
             for (String b : second) { out.add(b.trim()); }",
        );
        let groups = find_groups(&stmts, &ctx("List<String> first; List<String> second;"));

        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.target, "out");
        assert_eq!(g.members.len(), 2);
        assert!(g.members[0].identity);
        assert!(!g.members[1].identity);
        assert_eq!(g.members[1].add_arg, "b.trim()");
    }

    #[test]
    fn test_single_add_loop_is_not_a_group() {
        let stmts = parse("for (String a : first) { out.add(a); } log(out);");
        assert!(find_groups(&stmts, &ExtractContext::new()).is_empty());
    }

    #[test]
    fn test_different_targets_break_the_run() {
        let stmts = parse(
            "for (String a : first) { xs.add(a); } \
             for (String b : second) { ys.add(b); }",
        );
        assert!(find_groups(&stmts, &ExtractContext::new()).is_empty());
    }

    #[test]
    fn test_interposed_statement_breaks_the_run() {
        let stmts = parse(
            "for (String a : first) { out.add(a); } \
             log(out); \
             for (String b : second) { out.add(b); }",
        );
        assert!(find_groups(&stmts, &ExtractContext::new()).is_empty());
    }

    #[test]
    fn test_run_of_three_is_one_group() {
        let stmts = parse(
            "for (String a : first) { out.add(a); } \
             for (String b : second) { out.add(b); } \
             for (String c : third) { out.add(c); }",
        );
        let groups = find_groups(&stmts, &ExtractContext::new());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 3);
        assert_eq!(groups[0].members[2].index, 2);
    }

    #[test]
    fn test_multi_statement_body_is_not_a_member() {
        let stmts = parse(
            "for (String a : first) { log(a); out.add(a); } \
             for (String b : second) { out.add(b); }",
        );
        assert!(find_groups(&stmts, &ExtractContext::new()).is_empty());
    }
}
