//! Reducer kinds and their per-variant rendering behavior
//!
//! Each kind carries its own expression-construction rules: the typed
//! identity literal, the combining function, and whether the element is
//! mapped at all. Combiner selection is type-sensitive: a named two-argument
//! combiner (`Integer::sum` style) is only legal for the types that actually
//! declare one; everything else falls back to an explicit lambda so the
//! generated code picks the right operator.

use serde::Serialize;

/// The declared type of a reduce accumulator, after unboxing wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccumulatorType {
    Int,
    Long,
    Double,
    Float,
    Short,
    Byte,
    Char,
    Str,
    Other,
}

impl AccumulatorType {
    /// Classify a declared type name (primitive or wrapper)
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "int" | "Integer" => AccumulatorType::Int,
            "long" | "Long" => AccumulatorType::Long,
            "double" | "Double" => AccumulatorType::Double,
            "float" | "Float" => AccumulatorType::Float,
            "short" | "Short" => AccumulatorType::Short,
            "byte" | "Byte" => AccumulatorType::Byte,
            "char" | "Character" => AccumulatorType::Char,
            "String" => AccumulatorType::Str,
            _ => AccumulatorType::Other,
        }
    }

    /// The literal `1` for this type, with an explicit cast where a plain
    /// int literal would not narrow implicitly
    pub fn one_literal(&self) -> String {
        match self {
            AccumulatorType::Double => "1.0".to_string(),
            AccumulatorType::Float => "1.0f".to_string(),
            AccumulatorType::Long => "1L".to_string(),
            AccumulatorType::Byte => "(byte) 1".to_string(),
            AccumulatorType::Short => "(short) 1".to_string(),
            AccumulatorType::Char => "(char) 1".to_string(),
            _ => "1".to_string(),
        }
    }

    /// Whether this type has a legal named sum combiner
    fn has_named_sum(&self) -> bool {
        matches!(self, AccumulatorType::Int | AccumulatorType::Long | AccumulatorType::Double)
    }

    /// The wrapper class carrying the named sum combiner
    fn sum_combiner(&self) -> &'static str {
        match self {
            AccumulatorType::Long => "Long::sum",
            AccumulatorType::Double => "Double::sum",
            // Int and the untyped default
            _ => "Integer::sum",
        }
    }
}

/// Reduce sub-kind, detected from the accumulator statement shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReducerKind {
    Sum,
    Product,
    Increment,
    Decrement,
    StringConcat,
    Max,
    Min,
}

impl ReducerKind {
    /// Counting reducers consume no element value (x++ / x--)
    pub fn is_counting(&self) -> bool {
        matches!(self, ReducerKind::Increment | ReducerKind::Decrement)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            ReducerKind::Sum | ReducerKind::Product | ReducerKind::Increment | ReducerKind::Decrement
        )
    }

    pub fn is_min_max(&self) -> bool {
        matches!(self, ReducerKind::Max | ReducerKind::Min)
    }

    /// Whether a counting reducer over this accumulator type folds with a
    /// two-parameter counting lambda instead of a map-to-one plus sum.
    /// Narrow and floating accumulators have no usable named combiner, so
    /// the count is applied directly in the fold.
    pub fn uses_counting_lambda(&self, ty: AccumulatorType) -> bool {
        self.is_counting()
            && matches!(
                ty,
                AccumulatorType::Double
                    | AccumulatorType::Float
                    | AccumulatorType::Short
                    | AccumulatorType::Byte
            )
    }

    /// The mapped element expression this reducer needs, if any.
    /// Counting reducers map every element to a typed literal `1` (unless
    /// the counting lambda applies); value reducers map to the operand
    /// expression unless it is already the identity reference to the
    /// current pipeline variable.
    pub fn map_expression(
        &self,
        ty: AccumulatorType,
        operand: Option<&str>,
        current_variable: &str,
    ) -> Option<String> {
        if self.is_counting() {
            if self.uses_counting_lambda(ty) {
                return None;
            }
            return Some(ty.one_literal());
        }
        match operand {
            Some(expr) if expr != current_variable => Some(expr.to_string()),
            _ => None,
        }
    }

    /// The mapped variable name introduced by this reducer's Map step.
    /// Counting reducers do not consume the element, so the placeholder
    /// `_item` is used.
    pub fn map_variable(&self, current_variable: &str) -> String {
        if self.is_counting() {
            "_item".to_string()
        } else {
            current_variable.to_string()
        }
    }

    /// The combining function text for this kind over the given type.
    /// `operand_non_null` enables the named concat; without a nullness
    /// proof string concatenation must keep `+` semantics for null operands.
    pub fn combiner(&self, ty: AccumulatorType, operand_non_null: bool) -> String {
        match self {
            ReducerKind::Sum => {
                if ty.has_named_sum() || ty == AccumulatorType::Other {
                    // Unknown numeric types keep the int default
                    ty.sum_combiner().to_string()
                } else {
                    "(a, b) -> a + b".to_string()
                }
            }
            ReducerKind::Product => "(a, b) -> a * b".to_string(),
            ReducerKind::Increment => {
                if self.uses_counting_lambda(ty) {
                    "(a, _item) -> a + 1".to_string()
                } else if ty.has_named_sum() || ty == AccumulatorType::Other {
                    ty.sum_combiner().to_string()
                } else {
                    "(a, b) -> a + b".to_string()
                }
            }
            ReducerKind::Decrement => {
                if self.uses_counting_lambda(ty) {
                    "(a, _item) -> a - 1".to_string()
                } else {
                    "(a, b) -> a - b".to_string()
                }
            }
            ReducerKind::StringConcat => {
                if operand_non_null {
                    "String::concat".to_string()
                } else {
                    "(a, b) -> a + b".to_string()
                }
            }
            ReducerKind::Max => "Math::max".to_string(),
            ReducerKind::Min => "Math::min".to_string(),
        }
    }
}
