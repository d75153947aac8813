//! The edit transaction.

use std::collections::BTreeSet;

use gridcalc_engine::engine::{CellRef, Expr, Value, compile, evaluate, extract_dependencies};
use tracing::{debug, debug_span, warn};

use super::events::SheetObserver;
use super::propagate::propagate;
use super::state::Sheet;
use super::txn::{Journal, Phase};
use crate::error::{EditError, Result};

/// A committed edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditOutcome {
    pub label: CellRef,
    /// Dependents that were recomputed, in recalculation order.
    pub recomputed: Vec<CellRef>,
}

impl EditOutcome {
    /// The edited cell followed by its recomputed dependents.
    pub fn updated(&self) -> impl Iterator<Item = CellRef> + '_ {
        std::iter::once(self.label).chain(self.recomputed.iter().copied())
    }
}

/// State of an edit that has passed every check but is not yet visible in
/// the cells.
struct Pending {
    label: CellRef,
    text: String,
    compiled: Option<Expr>,
    value: Value,
    recomputed: Vec<(CellRef, Value)>,
}

impl<O: SheetObserver> Sheet<O> {
    /// Set the text of a cell and recompute everything that depends on it.
    ///
    /// On success the observer sees a display notification for the edited
    /// cell and then for each dependent. On failure the sheet is left exactly
    /// as it was and the observer sees a single error notification.
    pub fn apply_edit(&mut self, label: &str, text: &str) -> bool {
        match self.try_apply_edit(label, text) {
            Ok(outcome) => {
                for updated in outcome.updated() {
                    let display = self
                        .cell(updated)
                        .map(|cell| cell.display())
                        .unwrap_or_default();
                    self.observer.on_display(updated, &display);
                }
                true
            }
            Err(err) => {
                self.observer.on_error(err.kind(), &err.to_string());
                false
            }
        }
    }

    /// Like `apply_edit`, but returns the outcome instead of notifying the
    /// observer.
    pub fn try_apply_edit(&mut self, label: &str, text: &str) -> Result<EditOutcome> {
        let Some(cell) = self.resolve(label) else {
            warn!(label, "edit of unknown cell rejected");
            return Err(EditError::UnknownCell(label.to_string()));
        };
        let _span = debug_span!("apply_edit", label = %cell).entered();

        let mut journal = Journal::begin(cell);
        match self.stage_edit(&mut journal, cell, text) {
            Ok(pending) => Ok(self.commit(journal, pending)),
            Err(err) => {
                warn!(phase = ?journal.phase(), error = %err, "edit rejected");
                self.rollback(journal);
                Err(err)
            }
        }
    }

    /// Re-run the transaction for a cell with its current text.
    pub fn recalculate(&mut self, label: &str) -> bool {
        let text = self.text(label).unwrap_or_default().to_string();
        self.apply_edit(label, &text)
    }

    pub fn clear_cell(&mut self, label: &str) -> bool {
        self.apply_edit(label, "")
    }

    fn stage_edit(&mut self, journal: &mut Journal, label: CellRef, text: &str) -> Result<Pending> {
        // Whitespace-only text counts as empty.
        let text = if text.trim().is_empty() { "" } else { text };

        journal.enter(Phase::Compiling);
        let compiled = if text.is_empty() {
            None
        } else {
            Some(compile(text, &label.to_string())?)
        };

        journal.enter(Phase::GraphUpdate);
        let edges = match &compiled {
            Some(expr) => extract_dependencies(expr, |name| self.resolve(name)),
            None => BTreeSet::new(),
        };
        self.set_edges_logged(journal, label, edges);

        journal.enter(Phase::CycleCheck);
        let dependers = self.graph.dependers(label)?;

        journal.enter(Phase::Evaluating);
        let value = match &compiled {
            Some(expr) => {
                evaluate(expr, &self.symbols).map_err(|source| EditError::Eval { label, source })?
            }
            None => Value::Empty,
        };
        self.set_symbol_logged(journal, label, value.clone());

        journal.enter(Phase::DependentValidation);
        let recomputed = propagate(self, journal, &dependers)?;

        Ok(Pending {
            label,
            text: text.to_string(),
            compiled,
            value,
            recomputed,
        })
    }

    fn commit(&mut self, mut journal: Journal, pending: Pending) -> EditOutcome {
        journal.enter(Phase::Committed);
        self.last_phase = Phase::Committed;

        let Pending {
            label,
            text,
            compiled,
            value,
            recomputed,
        } = pending;

        let cell = self.cell_mut(label);
        cell.text = text;
        cell.compiled = compiled;
        cell.value = value;

        let mut order = Vec::with_capacity(recomputed.len());
        for (dependent, value) in recomputed {
            self.cell_mut(dependent).value = value;
            order.push(dependent);
        }
        debug!(recomputed = order.len(), journaled = journal.len(), "edit committed");

        EditOutcome {
            label,
            recomputed: order,
        }
    }
}
