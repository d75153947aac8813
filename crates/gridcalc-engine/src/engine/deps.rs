//! Cell dependency graph.
//!
//! An edge `a -> b` means "the formula in `a` references `b`". The graph
//! keeps the forward edges and a reverse index (who references whom) in
//! step, so both directions are cheap to walk.

use std::collections::{BTreeMap, BTreeSet};

use super::ast::Expr;
use super::cell_ref::CellRef;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<CellRef, BTreeSet<CellRef>>,
    referenced_by: BTreeMap<CellRef, BTreeSet<CellRef>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outgoing edges of `label`, returning the previous set.
    pub fn set_edges(&mut self, label: CellRef, targets: BTreeSet<CellRef>) -> BTreeSet<CellRef> {
        let previous = self.edges.remove(&label).unwrap_or_default();

        for target in previous.difference(&targets) {
            if let Some(sources) = self.referenced_by.get_mut(target) {
                sources.remove(&label);
                if sources.is_empty() {
                    self.referenced_by.remove(target);
                }
            }
        }
        for target in targets.difference(&previous) {
            self.referenced_by.entry(*target).or_default().insert(label);
        }

        if !targets.is_empty() {
            self.edges.insert(label, targets);
        }
        previous
    }

    /// Cells `label` references directly.
    pub fn edges(&self, label: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.edges.get(&label).into_iter().flatten().copied()
    }

    /// Cells that reference `label` directly.
    pub fn referenced_by(&self, label: CellRef) -> impl Iterator<Item = CellRef> + '_ {
        self.referenced_by.get(&label).into_iter().flatten().copied()
    }

    /// Number of cells with at least one outgoing edge.
    pub fn sources(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Referenced names of `expr` that resolve to cells, according to `resolve`.
/// Other names are left for the builtin namespace.
pub fn extract_dependencies(
    expr: &Expr,
    resolve: impl Fn(&str) -> Option<CellRef>,
) -> BTreeSet<CellRef> {
    expr.referenced_names()
        .into_iter()
        .filter_map(resolve)
        .collect()
}
