//! gridcalc_engine - formula compiler, evaluator and dependency graph.

pub mod builtins;
pub mod engine;
