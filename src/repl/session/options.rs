//! Session options
//!
//! Every field is optional; [`Session::new`](super::Session::new) fills in
//! the defaults. A bare prompt string converts into options carrying just
//! that prompt.

use std::path::PathBuf;
use std::sync::Arc;

use crate::repl::backend_trait::Evaluator;
use crate::repl::commands::HostExit;
use crate::repl::line::{CompleterFn, EventReceiver, Terminal};
use crate::repl::writer::Writer;

/// Default prompt
pub const DEFAULT_PROMPT: &str = "> ";

/// Evaluation mode hint for evaluators; carried but not interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplMode {
    #[default]
    Sloppy,
    Strict,
}

/// Options for constructing a [`Session`](super::Session)
#[derive(Default)]
pub struct ReplOptions {
    /// Text shown before each line; `"> "` when unset
    pub prompt: Option<String>,
    /// Input events; must be given together with `output`
    pub input: Option<EventReceiver>,
    /// Output terminal; must be given together with `input`
    pub output: Option<Box<dyn Terminal>>,
    /// Passed to the line editor unchanged
    pub completer: Option<Arc<CompleterFn>>,
    /// Interactive features; defaults to whether the output is a terminal
    pub terminal: Option<bool>,
    /// Colored output; defaults to `terminal` and a color depth above 2
    pub use_colors: Option<bool>,
    /// Suppress printing of `undefined` results
    pub ignore_undefined: bool,
    /// Value writer; defaults to the shared inspector
    pub writer: Option<Arc<dyn Writer>>,
    /// Evaluator; defaults to the built-in expression evaluator
    pub eval: Option<Arc<dyn Evaluator>>,
    /// Passed to the line editor unchanged
    pub history_size: Option<usize>,
    /// History file for the line editor
    pub history_file: Option<PathBuf>,
    /// What the `exit` command calls; defaults to exiting the process
    pub host_exit: Option<HostExit>,
    pub repl_mode: ReplMode,
    pub use_global: bool,
    pub break_eval_on_sigint: bool,
    /// Defaults to `true` when no custom evaluator is given
    pub preview: Option<bool>,
}

impl ReplOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prompt
    pub fn with_prompt(
        mut self,
        prompt: impl Into<String>,
    ) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Use a custom input source and terminal
    pub fn with_io(
        mut self,
        input: EventReceiver,
        output: impl Terminal + 'static,
    ) -> Self {
        self.input = Some(input);
        self.output = Some(Box::new(output));
        self
    }

    /// Use a custom evaluator
    pub fn with_eval(
        mut self,
        eval: impl Evaluator + 'static,
    ) -> Self {
        self.eval = Some(Arc::new(eval));
        self
    }

    /// Use a custom writer
    pub fn with_writer(
        mut self,
        writer: impl Writer + 'static,
    ) -> Self {
        self.writer = Some(Arc::new(writer));
        self
    }

    /// Replace what the `exit` command does
    pub fn with_host_exit(
        mut self,
        host_exit: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.host_exit = Some(Arc::new(host_exit));
        self
    }
}

impl From<&str> for ReplOptions {
    fn from(prompt: &str) -> Self {
        Self::new().with_prompt(prompt)
    }
}

impl From<String> for ReplOptions {
    fn from(prompt: String) -> Self {
        Self::new().with_prompt(prompt)
    }
}
