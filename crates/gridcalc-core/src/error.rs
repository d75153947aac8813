//! Error types for gridcalc core.

use std::fmt;
use thiserror::Error;

use gridcalc_engine::engine::{CellRef, CompileError, CycleError, EvalError};

/// Error category reported to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Compile,
    CyclicDependency,
    Evaluation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Compile => "CompileError",
            ErrorKind::CyclicDependency => "CyclicDependency",
            ErrorKind::Evaluation => "EvaluationError",
        })
    }
}

/// Why an edit was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("no cell named '{0}' in this sheet")]
    UnknownCell(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("{label}: {source}")]
    Eval {
        label: CellRef,
        #[source]
        source: EvalError,
    },

    #[error("edit would break {dependent}: {source}")]
    DependentBroken {
        dependent: CellRef,
        #[source]
        source: EvalError,
    },
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::Compile(_) => ErrorKind::Compile,
            EditError::Cycle(_) => ErrorKind::CyclicDependency,
            EditError::UnknownCell(_) | EditError::Eval { .. } | EditError::DependentBroken { .. } => {
                ErrorKind::Evaluation
            }
        }
    }
}

/// Errors creating a grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("number of rows cannot exceed 26 (got {0})")]
    TooManyRows(usize),

    #[error("number of columns cannot exceed {max} (got {cols})")]
    TooManyColumns { cols: usize, max: usize },

    #[error("a grid needs at least one row and one column")]
    Empty,
}

pub type Result<T> = std::result::Result<T, EditError>;
