//! REPL Engine Module
//!
//! Evaluation side of a session: the adapter that drives a pluggable
//! evaluator, the per-line context and the built-in expression evaluator.

pub mod adapter;
pub mod context;
pub mod evaluator;
pub mod lexer;
pub mod numeric;
pub mod parser;

pub use adapter::{EvalAdapter, SOURCE_LABEL};
pub use context::EvalContext;
pub use evaluator::DefaultEvaluator;
