use gridcalc_engine::builtins;
use gridcalc_engine::engine::{
    CellRef, DependencyGraph, SymbolSnapshot, SymbolTable, Value, evaluate,
};
use tracing::{debug, warn};

use super::cell::Cell;
use super::events::{SheetObserver, Silent};
use super::txn::Phase;
use crate::config::SheetConfig;
use crate::error::{EditError, GridError};

/// A grid of cells together with the symbol table their formulas are
/// evaluated against and the graph of references between them.
///
/// Every cell label is bound in the symbol table for the life of the sheet.
/// Cells only change through edit transactions (see `apply_edit`).
pub struct Sheet<O: SheetObserver = Silent> {
    pub(crate) config: SheetConfig,
    pub(crate) cells: Vec<Cell>,
    pub(crate) symbols: SymbolTable,
    pub(crate) graph: DependencyGraph,
    pub(crate) observer: O,
    pub(crate) last_phase: Phase,
}

/// Everything an edit can touch, for comparing sheet states.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetSnapshot {
    pub cells: Vec<Cell>,
    pub symbols: SymbolSnapshot,
    pub graph: DependencyGraph,
}

impl Sheet<Silent> {
    pub fn new(config: SheetConfig) -> Result<Self, GridError> {
        Self::with_observer(config, Silent)
    }
}

impl<O: SheetObserver> Sheet<O> {
    pub fn with_observer(config: SheetConfig, observer: O) -> Result<Self, GridError> {
        config.validate()?;

        let mut symbols = SymbolTable::with_reserved_prefix(&config.reserved_prefix);
        if config.import_math {
            symbols.import_namespace(builtins::math_namespace());
        }

        let mut cells = Vec::with_capacity(config.rows * config.cols);
        for row in 0..config.rows {
            for col in 0..config.cols {
                let label = CellRef::new(row, col);
                symbols.set(&label.to_string(), Value::Empty);
                cells.push(Cell::new(label));
            }
        }
        debug!(rows = config.rows, cols = config.cols, "created sheet");

        Ok(Sheet {
            config,
            cells,
            symbols,
            graph: DependencyGraph::new(),
            observer,
            last_phase: Phase::Idle,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn rows(&self) -> usize {
        self.config.rows
    }

    pub fn cols(&self) -> usize {
        self.config.cols
    }

    pub fn contains(&self, label: CellRef) -> bool {
        label.row < self.config.rows && label.col < self.config.cols
    }

    /// The cell named by `name`, if it is a label inside this grid.
    pub fn resolve(&self, name: &str) -> Option<CellRef> {
        CellRef::from_str(name).filter(|label| self.contains(*label))
    }

    pub fn is_cell_name(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn cell(&self, label: CellRef) -> Option<&Cell> {
        if !self.contains(label) {
            return None;
        }
        self.cells.get(self.index(label))
    }

    /// Look up a cell by name.
    pub fn find(&self, name: &str) -> Option<&Cell> {
        self.resolve(name).and_then(|label| self.cell(label))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.find(name).map(Cell::text)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.find(name).map(Cell::value)
    }

    pub fn display(&self, name: &str) -> Option<String> {
        self.find(name).map(Cell::display)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.cells.iter().map(Cell::label)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Cells that would be recomputed after an edit of `name`, in the order
    /// they would be recomputed.
    pub fn dependers(&self, name: &str) -> Result<Vec<CellRef>, EditError> {
        let label = self
            .resolve(name)
            .ok_or_else(|| EditError::UnknownCell(name.to_string()))?;
        Ok(self.graph.dependers(label)?)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Phase the most recent edit ended in.
    pub fn last_phase(&self) -> Phase {
        self.last_phase
    }

    /// Add new names visible to formulas. Returns the number imported.
    ///
    /// Only unbound names are added, so no committed value can change:
    /// names already in the table (cell labels, builtins, earlier imports)
    /// are skipped, as are reserved names.
    pub fn import_namespace<I, S>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let mut accepted = Vec::new();
        for (name, value) in pairs {
            if self.is_cell_name(name.as_ref()) {
                warn!(name = name.as_ref(), "namespace entry shadows a cell label, skipped");
                continue;
            }
            if self.symbols.contains(name.as_ref()) {
                warn!(name = name.as_ref(), "namespace entry is already bound, skipped");
                continue;
            }
            accepted.push((name, value));
        }
        self.symbols.import_namespace(accepted)
    }

    pub fn snapshot(&self) -> SheetSnapshot {
        SheetSnapshot {
            cells: self.cells.clone(),
            symbols: self.symbols.snapshot(),
            graph: self.graph.clone(),
        }
    }

    /// Cells whose stored value disagrees with the symbol table or with a
    /// fresh evaluation of their formula. Empty for a sheet at rest.
    pub fn inconsistent_cells(&self) -> Vec<CellRef> {
        self.cells
            .iter()
            .filter(|cell| {
                let bound = self.symbols.get(&cell.label.to_string()).ok();
                let expected = match &cell.compiled {
                    Some(expr) => evaluate(expr, &self.symbols).ok(),
                    None => Some(Value::Empty),
                };
                bound != Some(&cell.value)
                    || expected.as_ref() != Some(&cell.value)
                    || cell.text.is_empty() != cell.compiled.is_none()
            })
            .map(Cell::label)
            .collect()
    }

    fn index(&self, label: CellRef) -> usize {
        label.row * self.config.cols + label.col
    }

    /// Cell for a label already known to be inside the grid.
    pub(crate) fn cell_mut(&mut self, label: CellRef) -> &mut Cell {
        let index = self.index(label);
        &mut self.cells[index]
    }
}
