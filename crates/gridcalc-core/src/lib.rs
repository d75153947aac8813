//! gridcalc-core - UI-agnostic sheet model with transactional recalculation.

pub mod config;
pub mod document;
pub mod error;

pub use config::SheetConfig;
pub use document::{Cell, EditOutcome, Phase, Sheet, SheetEvent, SheetObserver, SheetSnapshot, Silent};
pub use error::{EditError, ErrorKind, GridError, Result};

pub use gridcalc_engine::engine::{CellRef, Value};
