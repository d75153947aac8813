use gridcalc_engine::engine::{CellRef, Expr, Value, format_value};

/// One grid position: its label, the text the user entered, the compiled
/// form of that text, and the value it last evaluated to.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub(crate) label: CellRef,
    pub(crate) text: String,
    pub(crate) compiled: Option<Expr>,
    pub(crate) value: Value,
}

impl Cell {
    pub(crate) fn new(label: CellRef) -> Cell {
        Cell {
            label,
            text: String::new(),
            compiled: None,
            value: Value::Empty,
        }
    }

    pub fn label(&self) -> CellRef {
        self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn compiled(&self) -> Option<&Expr> {
        self.compiled.as_ref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The value rendered for display (empty string for an empty cell).
    pub fn display(&self) -> String {
        format_value(&self.value)
    }
}
