//! REPL Module
//!
//! An embeddable read-eval-print loop with pluggable evaluation.
//!
//! This module contains:
//! - [`session::Session`] - Session state machine and public façade
//! - [`commands::CommandRegistry`] - `.keyword` meta-commands
//! - [`engine::EvalAdapter`] - Uniform completion for pluggable evaluators
//! - [`engine::DefaultEvaluator`] - Built-in expression evaluator
//! - [`writer::Inspector`] - Default value writer
//! - [`line::RustylineTerminal`] - Interactive terminal with rustyline
//! - [`line::ChannelTerminal`] - Headless terminal for embedding and tests
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> replkit::repl::Result<()> {
//! let mut session = replkit::repl::start("> ")?;
//! session.run().await
//! # }
//! ```

pub mod backend_trait;
pub mod commands;
pub mod engine;
pub mod error;
pub mod line;
pub mod session;
pub mod value;
pub mod writer;

pub use backend_trait::{settled, Done, EvalFuture, Evaluator, Outcome};
pub use commands::{CommandRegistry, HostExit};
pub use engine::{DefaultEvaluator, EvalAdapter, EvalContext, SOURCE_LABEL};
pub use error::{ReplError, Result};
pub use line::{input_channel, ChannelTerminal, EventReceiver, EventSender, InputEvent, RustylineTerminal, Terminal};
pub use session::{
    start, ReplMode, ReplOptions, Session, SessionEvent, DEFAULT_PROMPT, EXIT_ADVISORY, INVALID_KEYWORD,
};
pub use value::Value;
pub use writer::{InspectOptions, Inspector, Writer};
