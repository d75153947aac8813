//! Notifications from a sheet to whatever presents it.

use gridcalc_engine::engine::CellRef;

use crate::error::ErrorKind;

/// Receives the outcome of edits.
///
/// `on_display` fires once per committed cell, the edited cell first and
/// then its dependents in recalculation order. `on_error` fires exactly
/// once per rejected edit, after all state has been restored.
pub trait SheetObserver {
    fn on_display(&mut self, label: CellRef, text: &str);
    fn on_error(&mut self, kind: ErrorKind, message: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetEvent {
    Display { label: CellRef, text: String },
    Error { kind: ErrorKind, message: String },
}

/// Records every notification in order.
impl SheetObserver for Vec<SheetEvent> {
    fn on_display(&mut self, label: CellRef, text: &str) {
        self.push(SheetEvent::Display {
            label,
            text: text.to_string(),
        });
    }

    fn on_error(&mut self, kind: ErrorKind, message: &str) {
        self.push(SheetEvent::Error {
            kind,
            message: message.to_string(),
        });
    }
}

/// Ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl SheetObserver for Silent {
    fn on_display(&mut self, _label: CellRef, _text: &str) {}

    fn on_error(&mut self, _kind: ErrorKind, _message: &str) {}
}
