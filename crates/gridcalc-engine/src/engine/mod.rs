//! Formula engine API.
//!
//! - [`CellRef`] - Cell labels (`a0`, `b12`)
//! - [`Value`] - Scalars held by cells and the symbol table
//! - [`SymbolTable`] - Every name a formula can see
//! - [`compile`] / [`Expr`] - Formula text to syntax tree
//! - [`evaluate`] - Tree-walking interpreter
//! - [`DependencyGraph`] - Reference edges, dependers and cycle detection
//! - [`format_value`] - Display text for values

mod ast;
mod cell_ref;
mod compile;
mod cycle;
mod deps;
mod eval;
mod format;
mod symtab;
mod value;

pub use ast::{BinaryOp, Expr, LogicalOp, Node, UnaryOp};
pub use cell_ref::{CellRef, LabelError, MAX_ROWS};
pub use compile::{CompileError, MAX_DEPTH, MAX_NESTING, compile};
pub use cycle::CycleError;
pub use deps::{DependencyGraph, extract_dependencies};
pub use eval::{EvalError, evaluate};
pub use format::{format_number, format_value};
pub use symtab::{RESERVED_PREFIX, SymbolSnapshot, SymbolTable, UnknownSymbol};
pub use value::Value;
