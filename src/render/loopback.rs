//! Pipeline-to-loop rendering
//!
//! Rewrites a `source.forEach(x -> ...)` statement (optionally through a
//! bare `.stream()`) as an explicit iterator-while loop. Pipelines with
//! intermediate operations keep their fused semantics and are left alone.

use crate::extract::ExtractContext;
use crate::frontend::ast::{Expr, LambdaBody, Stmt};
use crate::frontend::printer::{expr_text, stmt_text, type_text};
use crate::render::pipeline::Rendered;

/// Intermediate operations that disqualify the rewrite
const CHAIN_OPS: &[&str] = &[
    "map", "filter", "sorted", "distinct", "limit", "skip", "peek", "boxed", "flatMap",
];

/// The detected shape of a convertible forEach statement
struct ForEachCall<'a> {
    source: &'a Expr,
    param: String,
    body: &'a LambdaBody,
}

fn detect(stmt: &Stmt) -> Option<ForEachCall<'_>> {
    let Stmt::Expr { expr, .. } = stmt else {
        return None;
    };
    let Expr::MethodCall { receiver, method, args, .. } = expr.unwrap_parens() else {
        return None;
    };
    if method.name != "forEach" && method.name != "forEachOrdered" {
        return None;
    }
    let [Expr::Lambda { params, body, .. }] = args.as_slice() else {
        return None;
    };
    let [param] = params.as_slice() else {
        return None;
    };

    // Look through a bare `.stream()`; any other chained stream operation
    // means the pipeline does more than consume
    let source = match receiver.unwrap_parens() {
        Expr::MethodCall { receiver: inner, method: m, args: a, .. } => {
            if m.name == "stream" && a.is_empty() {
                inner.unwrap_parens()
            } else if CHAIN_OPS.contains(&m.name.as_str()) || m.name == "stream" {
                return None;
            } else {
                receiver.unwrap_parens()
            }
        }
        other => other,
    };

    Some(ForEachCall { source, param: param.name.clone(), body })
}

/// The element type for the iterator declaration, from the source's
/// declared type when it is known
fn element_type(source: &Expr, ctx: &ExtractContext) -> String {
    source
        .as_name()
        .and_then(|name| ctx.declared_type(name))
        .and_then(|ty| ty.element_type())
        .map(|ty| type_text(&ty))
        .unwrap_or_else(|| "Object".to_string())
}

/// Rewrite a forEach statement as an iterator-while loop, if it has the
/// convertible shape
pub fn to_iterator_while(stmt: &Stmt, ctx: &ExtractContext) -> Option<Rendered> {
    let call = detect(stmt)?;
    let elem_ty = element_type(call.source, ctx);
    let source = expr_text(call.source);

    let body_stmts: Vec<String> = match call.body {
        LambdaBody::Expr(e) => vec![format!("{};", expr_text(e))],
        LambdaBody::Block(b) => b.stmts.iter().map(stmt_text).collect(),
    };

    let mut text = format!("Iterator<{}> it = {}.iterator();\n", elem_ty, source);
    text.push_str("while (it.hasNext()) {\n");
    text.push_str(&format!("    {} {} = it.next();\n", elem_ty, call.param));
    for line in &body_stmts {
        text.push_str(&format!("    {}\n", line));
    }
    text.push('}');

    Some(Rendered { text, required_symbols: vec!["Iterator"] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn parse_stmt(source: &str) -> Stmt {
        let mut parser = Parser::from_source(source, 0);
        parser.parse_program().expect("parse failed").stmts.remove(0)
    }

    fn ctx_of(decls: &str) -> ExtractContext {
        let mut parser = Parser::from_source(decls, 0);
        let mut ctx = ExtractContext::new();
        for stmt in parser.parse_program().expect("parse failed").stmts {
            if let Stmt::Decl { ty, name, .. } = stmt {
                ctx.declare(&name.name, &ty);
            }
        }
        ctx
    }

    #[test]
    fn test_direct_for_each_to_while() {
        let stmt = parse_stmt("names.forEach(s -> log(s));");
        let r = to_iterator_while(&stmt, &ctx_of("List<String> names;")).expect("rewrite");

        assert_eq!(
            r.text,
            "Iterator<String> it = names.iterator();\n\
             while (it.hasNext()) {\n    \
                 String s = it.next();\n    \
                 log(s);\n\
             }"
        );
        assert_eq!(r.required_symbols, vec!["Iterator"]);
    }

    #[test]
    fn test_stream_for_each_unwraps_stream() {
        let stmt = parse_stmt("names.stream().forEach(s -> log(s));");
        let r = to_iterator_while(&stmt, &ctx_of("List<String> names;")).expect("rewrite");
        assert!(r.text.starts_with("Iterator<String> it = names.iterator();"));
    }

    #[test]
    fn test_block_body_statements_carry_over() {
        let stmt = parse_stmt("names.forEach(s -> { log(s); audit(s); });");
        let r = to_iterator_while(&stmt, &ctx_of("List<String> names;")).expect("rewrite");
        assert!(r.text.contains("    log(s);\n    audit(s);\n"));
    }

    #[test]
    fn test_unknown_source_type_falls_back_to_object() {
        let stmt = parse_stmt("names.forEach(s -> log(s));");
        let r = to_iterator_while(&stmt, &ExtractContext::new()).expect("rewrite");
        assert!(r.text.starts_with("Iterator<Object> it = names.iterator();"));
    }

    #[test]
    fn test_chained_operations_are_left_alone() {
        let ctx = ctx_of("List<String> names;");
        let stmt = parse_stmt("names.stream().filter(s -> s.isEmpty()).forEach(s -> log(s));");
        assert!(to_iterator_while(&stmt, &ctx).is_none());

        let stmt = parse_stmt("names.stream().map(s -> s.trim()).forEach(s -> log(s));");
        assert!(to_iterator_while(&stmt, &ctx).is_none());
    }

    #[test]
    fn test_non_for_each_statements_are_ignored() {
        let ctx = ExtractContext::new();
        assert!(to_iterator_while(&parse_stmt("log(s);"), &ctx).is_none());
        assert!(to_iterator_while(&parse_stmt("names.forEach(f(x));"), &ctx).is_none());
        assert!(to_iterator_while(&parse_stmt("names.forEach((a, b) -> use(a, b));"), &ctx).is_none());
    }

    #[test]
    fn test_method_call_source_is_allowed() {
        let stmt = parse_stmt("registry.lookup(key).forEach(s -> log(s));");
        let r = to_iterator_while(&stmt, &ExtractContext::new()).expect("rewrite");
        assert!(r.text.starts_with("Iterator<Object> it = registry.lookup(key).iterator();"));
    }
}
