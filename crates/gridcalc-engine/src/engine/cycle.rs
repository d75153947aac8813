//! Dependers and circular dependency detection.
//!
//! `dependers` walks the reverse edges from a cell with a colored DFS
//! (unvisited / in progress / done). Reaching a cell that is still in
//! progress means the cell is part of a cycle, which is reported instead of
//! a partial set.

use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use super::{CellRef, DependencyGraph};

/// A dependency cycle, in reference order: each cell references the next,
/// and the last cell is the first one again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct CycleError {
    pub path: Vec<CellRef>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.path.first() else {
            return f.write_str("dependency cycle detected");
        };
        write!(f, "dependency cycle on {first} detected: ")?;
        for (i, cell) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Every cell whose formula depends on `label`, directly or indirectly,
    /// ordered so each cell comes after the cells it references.
    /// `label` itself is not included.
    pub fn dependers(&self, label: CellRef) -> Result<Vec<CellRef>, CycleError> {
        let mut marks: HashMap<CellRef, Mark> = HashMap::new();
        let mut finished = Vec::new();
        let mut stack: Vec<(CellRef, std::vec::IntoIter<CellRef>)> = Vec::new();

        marks.insert(label, Mark::InProgress);
        stack.push((label, self.referencing(label)));

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            let Some(next) = pending.next() else {
                marks.insert(node, Mark::Done);
                finished.push(node);
                stack.pop();
                continue;
            };
            match marks.get(&next) {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => {
                    let start = stack.iter().position(|(cell, _)| *cell == next).unwrap_or(0);
                    let mut path: Vec<CellRef> = stack[start..].iter().map(|(cell, _)| *cell).collect();
                    path.push(next);
                    path.reverse();
                    return Err(CycleError { path });
                }
                None => {
                    marks.insert(next, Mark::InProgress);
                    stack.push((next, self.referencing(next)));
                }
            }
        }

        // `label` finishes last; reversing the finish order puts every cell
        // after all cells it references.
        finished.pop();
        finished.reverse();
        Ok(finished)
    }

    fn referencing(&self, label: CellRef) -> std::vec::IntoIter<CellRef> {
        self.referenced_by(label).collect::<Vec<_>>().into_iter()
    }

    /// True if `node` references `target`, directly or indirectly.
    pub fn depends_on(&self, node: CellRef, target: CellRef) -> bool {
        let mut seen = HashSet::new();
        let mut pending: Vec<CellRef> = self.edges(node).collect();
        while let Some(cell) = pending.pop() {
            if cell == target {
                return true;
            }
            if seen.insert(cell) {
                pending.extend(self.edges(cell));
            }
        }
        false
    }

    /// True if `node` depends on itself.
    pub fn is_cyclic(&self, node: CellRef) -> bool {
        self.depends_on(node, node)
    }

    /// True if no cell in `seq` is preceded by a cell that depends on it, so
    /// updating in `seq` order never reads a stale value.
    pub fn is_ordered(&self, seq: &[CellRef]) -> bool {
        seq.iter().enumerate().all(|(i, earlier)| {
            seq[i..]
                .iter()
                .all(|later| !self.depends_on(*earlier, *later))
        })
    }
}
