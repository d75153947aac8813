use gridcalc_engine::engine::{CellRef, Value, evaluate};
use tracing::trace;

use super::events::SheetObserver;
use super::state::Sheet;
use super::txn::Journal;
use crate::error::EditError;

/// Recompute `dependers` in order against the tentative symbol table,
/// binding each new value before moving on so later cells see it.
///
/// Stops at the first cell that fails; the caller rolls back.
pub(crate) fn propagate<O: SheetObserver>(
    sheet: &mut Sheet<O>,
    journal: &mut Journal,
    dependers: &[CellRef],
) -> Result<Vec<(CellRef, Value)>, EditError> {
    let mut recomputed = Vec::with_capacity(dependers.len());
    for &dependent in dependers {
        let Some(expr) = sheet.cell(dependent).and_then(|cell| cell.compiled.as_ref()) else {
            continue;
        };
        let value = evaluate(expr, &sheet.symbols)
            .map_err(|source| EditError::DependentBroken { dependent, source })?;
        trace!(%dependent, "recomputed");
        sheet.set_symbol_logged(journal, dependent, value.clone());
        recomputed.push((dependent, value));
    }
    Ok(recomputed)
}
