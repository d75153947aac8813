//! Sheet state and edit transactions (UI-agnostic).

mod cell;
mod events;
mod ops;
mod propagate;
mod state;
mod txn;

pub use cell::Cell;
pub use events::{SheetEvent, SheetObserver, Silent};
pub use ops::EditOutcome;
pub use state::{Sheet, SheetSnapshot};
pub use txn::Phase;
