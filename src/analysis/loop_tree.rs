//! Loop tree built during one traversal pass
//!
//! One node per nested iteration construct, arena-indexed so child nodes
//! keep a plain parent index instead of an owning back-reference. The tree
//! lives exactly as long as the traversal that built it. Decisions are
//! assigned bottom-up: a loop is decided only after all of its descendants.

use serde::Serialize;

use crate::analysis::scope::ScopeInfo;
use crate::model::LoopModel;
use crate::utils::Span;

/// Index of a node in the tree arena
pub type NodeId = usize;

/// Convertibility decision for one loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// Not yet decided (node still open)
    Unknown,
    /// Safe to rewrite; the extracted model is cached on the node
    Convertible,
    /// Left unchanged, conservatively or structurally
    NotConvertible,
    /// A descendant converts; rewriting this loop too would duplicate or
    /// overwrite the inner rewrite
    SkippedInnerConverted,
}

/// One loop in the tree
#[derive(Debug)]
pub struct LoopTreeNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub scope: ScopeInfo,
    pub decision: Decision,
    pub span: Span,
    /// Extraction result cached at decision time to avoid re-extraction
    /// when the rewrite is emitted
    pub model: Option<LoopModel>,
    /// Absorbed into a consecutive-loop group; the per-loop pass must not
    /// rewrite it individually
    pub grouped: bool,
}

/// The arena of loops for one traversal
#[derive(Debug, Default)]
pub struct LoopTree {
    nodes: Vec<LoopTreeNode>,
    stack: Vec<NodeId>,
    roots: Vec<NodeId>,
}

impl LoopTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a loop: push a node under the currently open loop (if any)
    pub fn enter(&mut self, span: Span, scope: ScopeInfo) -> NodeId {
        let id = self.nodes.len();
        let parent = self.stack.last().copied();

        self.nodes.push(LoopTreeNode {
            parent,
            children: Vec::new(),
            scope,
            decision: Decision::Unknown,
            span,
            model: None,
            grouped: false,
        });

        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        self.stack.push(id);
        id
    }

    /// Leave the currently open loop
    pub fn exit(&mut self) -> Option<NodeId> {
        self.stack.pop()
    }

    pub fn node(&self, id: NodeId) -> &LoopTreeNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut LoopTreeNode {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &LoopTreeNode)> {
        self.nodes.iter().enumerate()
    }

    /// Walk the ancestor chain of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> AncestorIter<'_> {
        AncestorIter { tree: self, next: self.nodes[id].parent }
    }

    /// True if any descendant of this node has decided Convertible
    pub fn has_convertible_descendant(&self, id: NodeId) -> bool {
        self.nodes[id].children.iter().any(|&c| {
            self.nodes[c].decision == Decision::Convertible || self.has_convertible_descendant(c)
        })
    }
}

/// Iterator over ancestors via parent indices
pub struct AncestorIter<'a> {
    tree: &'a LoopTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = (NodeId, &'a LoopTreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = &self.tree.nodes[id];
        self.next = node.parent;
        Some((id, node))
    }
}
