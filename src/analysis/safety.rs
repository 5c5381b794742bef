//! Safety / convertibility checks
//!
//! Every check here is conservative: a failed check leaves the loop
//! unchanged. The checks are independent of the extraction cascade — they
//! veto loops whose body shape the cascade would otherwise accept.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;

use crate::analysis::loop_tree::{LoopTree, NodeId};
use crate::frontend::ast::{Expr, Stmt, TypeRef};
use crate::model::Metadata;

// ==================== Control flow ====================

/// Scan a loop body for disqualifying control flow.
///
/// An unlabeled `break` binds to the nearest enclosing loop, so nested loop
/// bodies are not descended into; a labeled `continue` (or labeled `break`)
/// can target any enclosing loop and disqualifies wherever it appears.
pub fn scan_control_flow(body: &Stmt) -> Metadata {
    let mut meta = Metadata::default();
    scan_cf(body, true, &mut meta);
    meta
}

fn scan_cf(stmt: &Stmt, direct: bool, meta: &mut Metadata) {
    match stmt {
        Stmt::Break { label, .. } => {
            if direct || label.is_some() {
                meta.has_break = true;
            }
        }
        Stmt::Continue { label, .. } => {
            if label.is_some() {
                meta.has_labeled_continue = true;
            }
        }
        Stmt::If { then_branch, else_branch, .. } => {
            scan_cf(then_branch, direct, meta);
            if let Some(e) = else_branch {
                scan_cf(e, direct, meta);
            }
        }
        Stmt::Block(b) => {
            for s in &b.stmts {
                scan_cf(s, direct, meta);
            }
        }
        Stmt::ForEach { body, .. } | Stmt::While { body, .. } => {
            // Unlabeled break/continue inside bind to the inner loop
            scan_cf(body, false, meta);
        }
        Stmt::Labeled { body, .. } => scan_cf(body, direct, meta),
        Stmt::Try { body, catches, finally, .. } => {
            for s in &body.stmts {
                scan_cf(s, direct, meta);
            }
            for c in catches {
                for s in &c.body.stmts {
                    scan_cf(s, direct, meta);
                }
            }
            if let Some(f) = finally {
                for s in &f.stmts {
                    scan_cf(s, direct, meta);
                }
            }
        }
        Stmt::Synchronized { body, .. } => {
            for s in &body.stmts {
                scan_cf(s, direct, meta);
            }
        }
        _ => {}
    }
}

// ==================== Disallowed constructs ====================

/// Find a construct whose lambda-capture and control-flow implications are
/// out of scope (try/switch/synchronized in the loop body). Nested loops
/// are not descended into; they are vetted as loops in their own right.
pub fn disallowed_construct(body: &Stmt) -> Option<&'static str> {
    match body {
        Stmt::Try { .. } => Some("try"),
        Stmt::Switch { .. } => Some("switch"),
        Stmt::Synchronized { .. } => Some("synchronized"),
        Stmt::If { then_branch, else_branch, .. } => {
            disallowed_construct(then_branch).or_else(|| {
                else_branch.as_deref().and_then(disallowed_construct)
            })
        }
        Stmt::Block(b) => b.stmts.iter().find_map(disallowed_construct),
        Stmt::Labeled { body, .. } => disallowed_construct(body),
        Stmt::ForEach { .. } | Stmt::While { .. } => None,
        _ => None,
    }
}

// ==================== Capture safety ====================

/// Check that no variable referenced by this loop is modified by an
/// ancestor loop's scope. Returns the first offending name.
pub fn capture_violation(
    tree: &LoopTree,
    id: NodeId,
    referenced: &HashSet<String>,
) -> Option<String> {
    for (ancestor_id, ancestor) in tree.ancestors(id) {
        for name in referenced {
            if ancestor.scope.modified.contains(name) {
                debug!(
                    "capture violation: {} referenced by loop {} is modified by ancestor {}",
                    name, id, ancestor_id
                );
                return Some(name.clone());
            }
        }
    }
    None
}

// ==================== Side-effect safety ====================

/// Names the body mutates that are neither declared inside it nor in the
/// allowed set (the mapped pipeline variable and the reduce accumulator).
/// Any such mutation is an unsafe external side effect.
pub fn unsafe_mutations(body: &Stmt, allowed: &HashSet<String>) -> Vec<String> {
    let scope = crate::analysis::scope::ScopeInfo::of_body(body);
    let mut names: Vec<String> = scope
        .modified
        .iter()
        .filter(|n| !scope.declared.contains(*n) && !allowed.contains(*n))
        .cloned()
        .collect();
    names.sort();
    names
}

// ==================== Source thread-safety ====================

/// Thread-safety classification of the iterated source's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SafetyLevel {
    /// Freshly constructed in the visible scope
    LocallyCreated,
    /// A concurrent collection type
    ConcurrentSafeType,
    /// An unmodifiable view or value-based factory result
    Immutable,
    /// Wrapped by a synchronized decorator
    SynchronizedWrapper,
    /// Origin unknown; the only level that blocks conversion
    PotentiallyShared,
}

impl SafetyLevel {
    pub fn blocks_conversion(&self) -> bool {
        matches!(self, SafetyLevel::PotentiallyShared)
    }
}

const CONCURRENT_TYPES: &[&str] = &[
    "CopyOnWriteArrayList",
    "CopyOnWriteArraySet",
    "ConcurrentLinkedQueue",
    "ConcurrentLinkedDeque",
    "ConcurrentSkipListSet",
    "ConcurrentHashMap",
    "LinkedBlockingQueue",
    "LinkedBlockingDeque",
];

const IMMUTABLE_FACTORIES: &[&str] = &["List", "Set", "Map"];

/// Classify a source variable from its declared type and initializer
pub fn classify_declaration(ty: &TypeRef, init: Option<&Expr>) -> SafetyLevel {
    if CONCURRENT_TYPES.contains(&ty.erased_name()) {
        return SafetyLevel::ConcurrentSafeType;
    }

    let Some(init) = init.map(Expr::unwrap_parens) else {
        return SafetyLevel::PotentiallyShared;
    };

    match init {
        Expr::New { ty, .. } => {
            if CONCURRENT_TYPES.contains(&ty.erased_name()) {
                SafetyLevel::ConcurrentSafeType
            } else {
                SafetyLevel::LocallyCreated
            }
        }
        Expr::MethodCall { receiver, method, .. } => {
            match receiver.as_name() {
                Some("Collections") => {
                    if method.name.starts_with("unmodifiable") {
                        SafetyLevel::Immutable
                    } else if method.name.starts_with("synchronized") {
                        SafetyLevel::SynchronizedWrapper
                    } else if method.name == "emptyList" || method.name == "emptySet" {
                        SafetyLevel::Immutable
                    } else {
                        SafetyLevel::PotentiallyShared
                    }
                }
                Some(factory) if IMMUTABLE_FACTORIES.contains(&factory) => {
                    if method.name == "of" || method.name == "copyOf" {
                        SafetyLevel::Immutable
                    } else {
                        SafetyLevel::PotentiallyShared
                    }
                }
                _ => SafetyLevel::PotentiallyShared,
            }
        }
        _ => SafetyLevel::PotentiallyShared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scope::ScopeInfo;
    use crate::frontend::parser::Parser;
    use crate::utils::Span;

    fn first_stmt(source: &str) -> Stmt {
        let mut parser = Parser::from_source(source, 0);
        parser.parse_program().expect("parse failed").stmts.remove(0)
    }

    fn loop_body(source: &str) -> Stmt {
        match first_stmt(source) {
            Stmt::ForEach { body, .. } => *body,
            Stmt::Labeled { body, .. } => match *body {
                Stmt::ForEach { body, .. } => *body,
                _ => panic!("Expected ForEach under label"),
            },
            _ => panic!("Expected ForEach statement"),
        }
    }

    #[test]
    fn test_break_detected() {
        let body = loop_body("for (String s : xs) { if (s.isEmpty()) break; use(s); }");
        let meta = scan_control_flow(&body);
        assert!(meta.has_break);
        assert!(!meta.has_labeled_continue);
    }

    #[test]
    fn test_break_in_nested_loop_does_not_count() {
        let body = loop_body("for (List<String> g : gs) { for (String s : g) { break; } use(g); }");
        let meta = scan_control_flow(&body);
        assert!(!meta.has_break);
    }

    #[test]
    fn test_labeled_continue_detected_through_nesting() {
        let body = loop_body("outer: for (List<String> g : gs) { for (String s : g) { continue outer; } }");
        let meta = scan_control_flow(&body);
        assert!(meta.has_labeled_continue);
    }

    #[test]
    fn test_unlabeled_continue_permitted() {
        let body = loop_body("for (String s : xs) { if (s.isEmpty()) continue; use(s); }");
        let meta = scan_control_flow(&body);
        assert!(!meta.has_break);
        assert!(!meta.has_labeled_continue);
    }

    #[test]
    fn test_disallowed_constructs() {
        let body = loop_body("for (String s : xs) { try { use(s); } catch (Exception e) { } }");
        assert_eq!(disallowed_construct(&body), Some("try"));

        let body = loop_body("for (String s : xs) { synchronized (lock) { use(s); } }");
        assert_eq!(disallowed_construct(&body), Some("synchronized"));

        let body = loop_body("for (String s : xs) { switch (s) { } }");
        assert_eq!(disallowed_construct(&body), Some("switch"));

        let body = loop_body("for (String s : xs) { use(s); }");
        assert_eq!(disallowed_construct(&body), None);
    }

    #[test]
    fn test_capture_violation_against_ancestor() {
        let mut tree = LoopTree::new();
        let mut outer_scope = ScopeInfo::default();
        outer_scope.modified.insert("acc".to_string());
        tree.enter(Span::dummy(), outer_scope);
        let inner = tree.enter(Span::dummy(), ScopeInfo::default());

        let mut refs = HashSet::new();
        refs.insert("acc".to_string());
        assert_eq!(capture_violation(&tree, inner, &refs), Some("acc".to_string()));

        let mut safe_refs = HashSet::new();
        safe_refs.insert("other".to_string());
        assert_eq!(capture_violation(&tree, inner, &safe_refs), None);
    }

    #[test]
    fn test_unsafe_mutations() {
        let body = loop_body("for (String s : xs) { int n = 0; n = n + 1; total = total + 1; }");
        let allowed = HashSet::new();
        assert_eq!(unsafe_mutations(&body, &allowed), vec!["total".to_string()]);

        let mut allowed = HashSet::new();
        allowed.insert("total".to_string());
        assert!(unsafe_mutations(&body, &allowed).is_empty());
    }

    #[test]
    fn test_classify_declaration() {
        let decl = |src: &str| match first_stmt(src) {
            Stmt::Decl { ty, init, .. } => (ty, init),
            _ => panic!("Expected Decl"),
        };

        let (ty, init) = decl("List<String> a = new ArrayList<>();");
        assert_eq!(classify_declaration(&ty, init.as_ref()), SafetyLevel::LocallyCreated);

        let (ty, init) = decl("List<String> a = Collections.unmodifiableList(b);");
        assert_eq!(classify_declaration(&ty, init.as_ref()), SafetyLevel::Immutable);

        let (ty, init) = decl("List<String> a = Collections.synchronizedList(b);");
        assert_eq!(classify_declaration(&ty, init.as_ref()), SafetyLevel::SynchronizedWrapper);

        let (ty, init) = decl("List<String> a = List.of(x, y);");
        assert_eq!(classify_declaration(&ty, init.as_ref()), SafetyLevel::Immutable);

        let (ty, init) = decl("CopyOnWriteArrayList<String> a = other;");
        assert_eq!(classify_declaration(&ty, init.as_ref()), SafetyLevel::ConcurrentSafeType);

        let (ty, init) = decl("List<String> a = someField;");
        assert_eq!(classify_declaration(&ty, init.as_ref()), SafetyLevel::PotentiallyShared);
        assert!(classify_declaration(&ty, init.as_ref()).blocks_conversion());
    }
}
