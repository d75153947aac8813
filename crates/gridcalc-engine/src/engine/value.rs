//! Scalar values held by cells and the symbol table.

use crate::builtins::BuiltinFn;

/// A value stored in the symbol table.
///
/// Builtin functions live in the same namespace as cells and constants, so
/// `sin` evaluates to a [`Value::Builtin`] and `sin(x)` calls it.
#[derive(Clone, Debug)]
pub enum Value {
    /// Value of a cell whose text is empty.
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    Builtin(&'static BuiltinFn),
}

impl Value {
    /// Name used in type-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Builtin(_) => "function",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the value. Booleans count as 0 and 1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// String view of the value. The empty value reads as `""`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Empty => Some(""),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
            Value::Builtin(_) => true,
        }
    }
}

/// Structural equality. Numbers compare by bit pattern so a table holding
/// `nan` still equals its own copy; formula `==` lives in the evaluator.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
