//! Abstract loop model
//!
//! The structured representation extracted from one iteration construct:
//! source, element binding, ordered Map/Filter operations, and exactly one
//! terminal. A model with no terminal is by definition not convertible.

pub mod reducer;

pub use reducer::{AccumulatorType, ReducerKind};

use serde::Serialize;

// ==================== Source ====================

/// What kind of thing the loop iterates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    Array,
    Collection,
    Iterable,
}

/// The iterated source, created once per loop during extraction
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    /// Source expression text (`names`, `lookup(key)`)
    pub expression: String,
    /// Element type name as declared in the loop header
    pub element_type: String,
}

impl SourceDescriptor {
    pub fn new(kind: SourceKind, expression: &str, element_type: &str) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            element_type: element_type.to_string(),
        }
    }
}

// ==================== Element binding ====================

/// The per-iteration variable. The "current pipeline variable" starts out as
/// this name and is renamed as Map operations are chained.
#[derive(Debug, Clone)]
pub struct ElementBinding {
    pub name: String,
    pub type_name: String,
    pub is_final: bool,
}

impl ElementBinding {
    pub fn new(name: &str, type_name: &str, is_final: bool) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            is_final,
        }
    }
}

// ==================== Operations ====================

/// An intermediate pipeline operation, insertion order significant
#[derive(Debug, Clone)]
pub enum Operation {
    /// Transformation step; renames the current pipeline variable
    Map {
        expression: String,
        produced_variable: String,
        output_type: Option<String>,
    },
    /// Predicate step; the predicate is already polarity-normalized
    /// (guard-continue conditions arrive pre-negated)
    Filter { predicate: String },
}

impl Operation {
    pub fn map(expression: &str, produced_variable: &str) -> Self {
        Operation::Map {
            expression: expression.to_string(),
            produced_variable: produced_variable.to_string(),
            output_type: None,
        }
    }

    pub fn filter(predicate: &str) -> Self {
        Operation::Filter { predicate: predicate.to_string() }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Operation::Map { .. })
    }
}

// ==================== Terminals ====================

/// Collector kind for Collect terminals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectorKind {
    ToList,
    ToSet,
}

impl CollectorKind {
    /// Select the collector from the erased type name of the target
    /// collection (anything with "Set" in it collects to a set)
    pub fn from_type_name(name: &str) -> Self {
        if name.contains("Set") {
            CollectorKind::ToSet
        } else {
            CollectorKind::ToList
        }
    }
}

/// Match kind for boolean early-return terminals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Any,
    None,
    All,
}

/// The single consuming action of a pipeline
#[derive(Debug, Clone)]
pub enum Terminal {
    /// Side-effecting consumption of each element
    ForEach {
        /// Body statements, already rendered to text
        body: Vec<String>,
        /// True whenever any Map/Filter precedes the terminal, to preserve
        /// encounter-order semantics
        ordered: bool,
    },
    /// Accumulation into a collection
    Collect {
        kind: CollectorKind,
        target_variable: String,
    },
    /// Reduction into an accumulator variable
    Reduce {
        identity: String,
        accumulator: String,
        kind: ReducerKind,
        accumulator_variable: String,
    },
    /// Boolean early-return over a condition
    Match {
        kind: MatchKind,
        condition: String,
    },
}

// ==================== Loop model ====================

/// Control-flow facts gathered from the loop body
#[derive(Debug, Clone, Copy, Default)]
pub struct Metadata {
    pub has_break: bool,
    pub has_labeled_continue: bool,
}

/// The extracted model of one loop
#[derive(Debug, Clone)]
pub struct LoopModel {
    pub source: SourceDescriptor,
    pub element: ElementBinding,
    pub operations: Vec<Operation>,
    /// None means the loop produced no terminal and is not convertible
    pub terminal: Option<Terminal>,
    pub metadata: Metadata,
}

impl LoopModel {
    pub fn new(source: SourceDescriptor, element: ElementBinding) -> Self {
        Self {
            source,
            element,
            operations: Vec::new(),
            terminal: None,
            metadata: Metadata::default(),
        }
    }

    /// A model is convertible when it has a terminal and no disqualifying
    /// control flow
    pub fn is_convertible(&self) -> bool {
        self.terminal.is_some()
            && !self.metadata.has_break
            && !self.metadata.has_labeled_continue
    }

    /// The lambda parameter name in effect after all operations: the
    /// produced name of the last Map, else the element name
    pub fn current_variable(&self) -> &str {
        self.variable_after(self.operations.len())
    }

    /// The lambda parameter name in effect for the operation at `index`:
    /// the produced name of the most recent preceding Map, else the element
    /// name
    pub fn variable_after(&self, index: usize) -> &str {
        for op in self.operations[..index.min(self.operations.len())].iter().rev() {
            if let Operation::Map { produced_variable, .. } = op {
                return produced_variable;
            }
        }
        &self.element.name
    }

    /// True if any Map or Filter operation exists
    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }
}
