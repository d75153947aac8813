//! Edit transactions.
//!
//! Every mutation of the symbol table or the dependency graph made while an
//! edit is in flight goes through the journal, which records the prior
//! state of what it touched. Rolling back replays the journal in reverse.
//! Cells themselves are only written at commit.

use std::collections::BTreeSet;

use gridcalc_engine::engine::{CellRef, Value};
use tracing::{debug, trace};

use super::events::SheetObserver;
use super::state::Sheet;

/// Where an edit is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Compiling,
    GraphUpdate,
    CycleCheck,
    Evaluating,
    DependentValidation,
    Committed,
    RolledBack,
}

enum Entry {
    Symbol { name: String, prior: Option<Value> },
    Edges { label: CellRef, prior: BTreeSet<CellRef> },
}

pub(crate) struct Journal {
    label: CellRef,
    phase: Phase,
    entries: Vec<Entry>,
}

impl Journal {
    pub(crate) fn begin(label: CellRef) -> Journal {
        Journal {
            label,
            phase: Phase::Idle,
            entries: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        trace!(label = %self.label, from = ?self.phase, to = ?phase, "edit phase");
        self.phase = phase;
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<O: SheetObserver> Sheet<O> {
    pub(crate) fn set_symbol_logged(&mut self, journal: &mut Journal, label: CellRef, value: Value) {
        let name = label.to_string();
        let prior = self.symbols.set(&name, value);
        journal.entries.push(Entry::Symbol { name, prior });
    }

    pub(crate) fn set_edges_logged(
        &mut self,
        journal: &mut Journal,
        label: CellRef,
        edges: BTreeSet<CellRef>,
    ) {
        let prior = self.graph.set_edges(label, edges);
        journal.entries.push(Entry::Edges { label, prior });
    }

    /// Undo everything recorded in `journal`.
    pub(crate) fn rollback(&mut self, mut journal: Journal) {
        let undone = journal.entries.len();
        while let Some(entry) = journal.entries.pop() {
            match entry {
                Entry::Symbol { name, prior: Some(value) } => {
                    self.symbols.set(&name, value);
                }
                Entry::Symbol { name, prior: None } => {
                    self.symbols.remove(&name);
                }
                Entry::Edges { label, prior } => {
                    self.graph.set_edges(label, prior);
                }
            }
        }
        journal.enter(Phase::RolledBack);
        self.last_phase = Phase::RolledBack;
        debug!(label = %journal.label, undone, "edit rolled back");
    }
}
