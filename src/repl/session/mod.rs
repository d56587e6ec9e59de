//! REPL Session
//!
//! The session owns the prompt, the command registry, the value writer and
//! the evaluator adapter, and reacts to input events:
//!
//! - `Line`: classify, then run a command or dispatch to the evaluator.
//!   Only one line is in flight at a time; lines arriving meanwhile are
//!   queued in arrival order.
//! - `Interrupt`: first press prints an advisory, a second consecutive one
//!   closes the session. Handled immediately, even during evaluation.
//! - `Close`: ends the session and emits [`SessionEvent::Exit`] once.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::repl::backend_trait::{Evaluator, Outcome};
use crate::repl::commands::{process_exit, CommandRegistry};
use crate::repl::engine::adapter::{resolve, Completion};
use crate::repl::engine::{DefaultEvaluator, EvalAdapter};
use crate::repl::error::{ReplError, Result};
use crate::repl::line::{EditorOptions, EventReceiver, InputEvent, RustylineTerminal, Terminal};
use crate::repl::value::Value;
use crate::repl::writer::{Inspector, Writer};

mod classify;
mod options;

pub use classify::{classify, LineKind, COMMAND_MARKER};
pub use options::{ReplMode, ReplOptions, DEFAULT_PROMPT};

/// Written when a `.keyword` is not registered
pub const INVALID_KEYWORD: &str = "Invalid REPL keyword\n";

/// Written on the first interrupt
pub const EXIT_ADVISORY: &str = "(To exit, press Ctrl+C again or Ctrl+D or type .exit)\n";

/// Notifications emitted by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session closed; sent exactly once
    Exit,
}

enum Wake {
    Completed(Outcome),
    Input(Option<InputEvent>),
    Queued(String),
}

/// Interactive read-eval-print session
pub struct Session {
    prompt: String,
    terminal_mode: bool,
    use_colors: bool,
    ignore_undefined: bool,
    pending_exit: bool,
    closed: bool,
    commands: CommandRegistry,
    adapter: EvalAdapter,
    writer: Arc<dyn Writer>,
    input: EventReceiver,
    output: Box<dyn Terminal>,
    in_flight: Option<Completion>,
    queued: VecDeque<String>,
    events: broadcast::Sender<SessionEvent>,
    repl_mode: ReplMode,
    use_global: bool,
    break_eval_on_sigint: bool,
    preview: bool,
}

/// Create a session and show its first prompt
pub fn start(options: impl Into<ReplOptions>) -> Result<Session> {
    Session::new(options)
}

impl Session {
    /// Create a new session from options or a bare prompt string.
    ///
    /// Without `input`/`output` the session reads from an interactive
    /// rustyline terminal, which needs a running Tokio runtime.
    pub fn new(options: impl Into<ReplOptions>) -> Result<Self> {
        let options = options.into();

        let (input, mut output) = match (options.input, options.output) {
            (Some(input), Some(output)) => (input, output),
            (None, None) => {
                let (terminal, input) = RustylineTerminal::spawn(EditorOptions {
                    history_size: options.history_size,
                    completer: options.completer,
                    history_file: options.history_file,
                })?;
                (input, Box::new(terminal) as Box<dyn Terminal>)
            }
            (Some(_), None) => return Err(ReplError::config("an input source was given without an output terminal")),
            (None, Some(_)) => return Err(ReplError::config("an output terminal was given without an input source")),
        };

        let terminal_mode = options.terminal.unwrap_or_else(|| output.is_terminal());
        let use_colors = options
            .use_colors
            .unwrap_or_else(|| terminal_mode && output.color_depth() > 2);

        let writer = match options.writer {
            Some(writer) => writer,
            None => {
                let inspector = Inspector::shared();
                inspector.set_colors(use_colors);
                Arc::new(inspector) as Arc<dyn Writer>
            }
        };

        let preview = options.preview.unwrap_or(options.eval.is_none());
        let eval: Arc<dyn Evaluator> = match options.eval {
            Some(eval) => eval,
            None => Arc::new(DefaultEvaluator::new()),
        };

        let commands = CommandRegistry::with_defaults(options.host_exit.unwrap_or_else(process_exit));
        output.set_command_keywords(commands.keywords().map(String::from).collect());

        let (events, _) = broadcast::channel(1);
        let mut session = Self {
            prompt: options.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            terminal_mode,
            use_colors,
            ignore_undefined: options.ignore_undefined,
            pending_exit: false,
            closed: false,
            commands,
            adapter: EvalAdapter::new(eval),
            writer,
            input,
            output,
            in_flight: None,
            queued: VecDeque::new(),
            events,
            repl_mode: options.repl_mode,
            use_global: options.use_global,
            break_eval_on_sigint: options.break_eval_on_sigint,
            preview,
        };

        info!(
            prompt = %session.prompt,
            terminal = session.terminal_mode,
            colors = session.use_colors,
            "REPL session started"
        );
        session.display_prompt(false)?;
        Ok(session)
    }

    /// Drive the session until it closes
    pub async fn run(&mut self) -> Result<()> {
        while self.step().await? {}
        Ok(())
    }

    /// Handle one wake-up: a completion, an input event or a queued line.
    /// Returns whether the session is still open.
    pub async fn step(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }

        let wake = match self.in_flight.as_mut() {
            Some(completion) => tokio::select! {
                biased;
                received = completion => Wake::Completed(resolve(received)),
                event = self.input.recv() => Wake::Input(event),
            },
            None => match self.queued.pop_front() {
                Some(line) => Wake::Queued(line),
                None => Wake::Input(self.input.recv().await),
            },
        };

        match wake {
            Wake::Completed(outcome) => {
                self.in_flight = None;
                self.finish(outcome)?;
            }
            Wake::Queued(line) => self.dispatch(&line)?,
            Wake::Input(None) => {
                debug!("input source ended");
                self.close();
            }
            Wake::Input(Some(event)) => self.on_event(event)?,
        }

        Ok(!self.closed)
    }

    fn on_event(
        &mut self,
        event: InputEvent,
    ) -> Result<()> {
        match event {
            InputEvent::Line(line) => {
                self.pending_exit = false;
                if self.in_flight.is_some() || !self.queued.is_empty() {
                    debug!(queued = self.queued.len() + 1, "line queued behind evaluation");
                    self.queued.push_back(line);
                    Ok(())
                } else {
                    self.dispatch(&line)
                }
            }
            InputEvent::Interrupt => self.on_interrupt(),
            InputEvent::Close => {
                self.close();
                Ok(())
            }
        }
    }

    fn on_interrupt(&mut self) -> Result<()> {
        self.output.clear_line()?;
        if self.pending_exit {
            debug!("second interrupt, closing");
            self.pending_exit = false;
            self.close();
            return Ok(());
        }

        debug!("interrupt armed");
        self.output.write(EXIT_ADVISORY)?;
        self.pending_exit = true;
        self.display_prompt(false)
    }

    /// Classify a line and run it
    fn dispatch(
        &mut self,
        line: &str,
    ) -> Result<()> {
        match classify(line.trim()) {
            LineKind::Command { keyword, args } => {
                let outcome = match self.commands.invoke(keyword, args) {
                    Some(Ok(())) => {
                        debug!(%keyword, "command finished");
                        Outcome::Empty
                    }
                    Some(Err(err)) => {
                        warn!(%keyword, error = %err, "command failed");
                        Outcome::Error(Value::from(err))
                    }
                    None => {
                        debug!(%keyword, "unknown command");
                        self.output.write(INVALID_KEYWORD)?;
                        Outcome::Empty
                    }
                };
                self.finish(outcome)
            }
            LineKind::Evaluate => {
                debug!(len = line.len(), "evaluating line");
                self.in_flight = Some(self.adapter.dispatch(line));
                Ok(())
            }
        }
    }

    /// Print the outcome of a line and show the prompt again
    fn finish(
        &mut self,
        outcome: Outcome,
    ) -> Result<()> {
        match outcome {
            Outcome::Value(value) if !(self.ignore_undefined && value.is_undefined()) => {
                let text = self.writer.write(&value);
                self.output.write(&format!("{}\n", text))?;
            }
            Outcome::Error(err) => {
                let text = self.writer.write(&err);
                self.output.write(&format!("{}\n", text))?;
            }
            _ => {}
        }
        self.display_prompt(false)
    }

    /// Close the session. Later calls do nothing.
    ///
    /// An evaluation still in flight keeps running but its result is dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.in_flight = None;
        self.queued.clear();
        self.output.close();
        info!("REPL session closed");
        let _ = self.events.send(SessionEvent::Exit);
    }

    /// Show the prompt
    pub fn display_prompt(
        &mut self,
        preserve_cursor: bool,
    ) -> Result<()> {
        self.output.render_prompt(&self.prompt, preserve_cursor)?;
        Ok(())
    }

    /// Register a `.keyword` command, replacing any existing one
    pub fn define_command<F>(
        &mut self,
        keyword: impl Into<String>,
        handler: F,
    ) where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.register(keyword, handler);
        self.output
            .set_command_keywords(self.commands.keywords().map(String::from).collect());
    }

    /// Persist line history in `path`
    pub fn setup_history(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "setting up history");
        self.output.setup_history(path)
    }

    /// Discard a partially entered command; nothing is buffered
    pub fn clear_buffered_command(&mut self) {}

    /// Receive [`SessionEvent`]s
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Change the prompt shown from the next render on
    pub fn set_prompt(
        &mut self,
        prompt: impl Into<String>,
    ) {
        self.prompt = prompt.into();
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_mode
    }

    pub fn use_colors(&self) -> bool {
        self.use_colors
    }

    pub fn ignore_undefined(&self) -> bool {
        self.ignore_undefined
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a line is being evaluated or waiting for its turn
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || !self.queued.is_empty()
    }

    /// Whether one interrupt has been seen since the last line
    pub fn pending_exit(&self) -> bool {
        self.pending_exit
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn writer(&self) -> &Arc<dyn Writer> {
        &self.writer
    }

    pub fn repl_mode(&self) -> ReplMode {
        self.repl_mode
    }

    pub fn use_global(&self) -> bool {
        self.use_global
    }

    pub fn break_eval_on_sigint(&self) -> bool {
        self.break_eval_on_sigint
    }

    pub fn preview(&self) -> bool {
        self.preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::backend_trait::{settled, Done, EvalFuture};
    use crate::repl::engine::EvalContext;
    use crate::repl::line::{input_channel, ChannelTerminal, EventSender};
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    fn session_with(options: ReplOptions) -> (Session, EventSender, ChannelTerminal) {
        let (sender, input) = input_channel();
        let terminal = ChannelTerminal::new();
        let session = Session::new(options.with_io(input, terminal.clone())).unwrap();
        (session, sender, terminal)
    }

    fn session() -> (Session, EventSender, ChannelTerminal) {
        session_with(ReplOptions::new().with_host_exit(|| {}))
    }

    #[tokio::test]
    async fn test_first_prompt_and_defaults() {
        let (session, _tx, terminal) = session();
        assert_eq!(terminal.output(), "> ");
        assert_eq!(session.prompt(), DEFAULT_PROMPT);
        assert!(!session.is_terminal());
        assert!(!session.use_colors());
        assert!(session.preview());
        assert_eq!(terminal.transcript().command_keywords, vec!["exit".to_string()]);
    }

    #[tokio::test]
    async fn test_only_one_stream_is_config_error() {
        let (_tx, input) = input_channel();
        let options = ReplOptions {
            input: Some(input),
            ..ReplOptions::default()
        };
        assert!(matches!(Session::new(options), Err(ReplError::Config { .. })));

        let options = ReplOptions {
            output: Some(Box::new(ChannelTerminal::new())),
            ..ReplOptions::default()
        };
        assert!(matches!(Session::new(options), Err(ReplError::Config { .. })));
    }

    #[tokio::test]
    async fn test_interrupt_then_line_resets_pending_exit() {
        let (mut session, tx, terminal) = session();
        terminal.take_output();

        tx.interrupt();
        assert!(session.step().await.unwrap());
        assert!(session.pending_exit());
        assert_eq!(terminal.take_output(), format!("{}> ", EXIT_ADVISORY));

        tx.line("");
        assert!(session.step().await.unwrap());
        assert!(!session.pending_exit());
        // Drain the empty line's completion so the interrupt is next
        assert!(session.step().await.unwrap());
        assert!(!session.is_busy());

        tx.interrupt();
        assert!(session.step().await.unwrap());
        assert!(session.pending_exit());
        assert_eq!(terminal.transcript().clears, 2);
    }

    #[tokio::test]
    async fn test_double_interrupt_closes_once() {
        let (mut session, tx, terminal) = session();
        let mut exits = session.subscribe();

        tx.interrupt();
        tx.interrupt();
        session.run().await.unwrap();

        assert!(session.is_closed());
        assert!(!session.pending_exit());
        assert!(terminal.transcript().closed);
        assert_eq!(exits.recv().await.unwrap(), SessionEvent::Exit);

        session.close();
        assert!(exits.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lines_queue_behind_async_evaluation() {
        let gates: Arc<Mutex<Vec<oneshot::Sender<()>>>> = Arc::new(Mutex::new(Vec::new()));
        let registered = gates.clone();
        let eval = move |code: &str, _: EvalContext, _: &str, done: Done| -> std::result::Result<EvalFuture, Value> {
            let (gate, wait) = oneshot::channel::<()>();
            registered.lock().push(gate);
            let code = code.to_string();
            Ok(Box::pin(async move {
                let _ = wait.await;
                done.value(Value::from(code));
                Ok(())
            }))
        };
        let (mut session, tx, terminal) = session_with(ReplOptions::new().with_eval(eval).with_host_exit(|| {}));
        terminal.take_output();

        tx.line("first");
        assert!(session.step().await.unwrap());
        tx.line("second");
        assert!(session.step().await.unwrap());
        assert_eq!(gates.lock().len(), 1, "second line dispatched early");

        let gate = gates.lock().remove(0);
        let _ = gate.send(());
        assert!(session.step().await.unwrap());
        assert_eq!(terminal.take_output(), "'first'\n> ");

        assert!(session.step().await.unwrap());
        let gate = gates.lock().remove(0);
        let _ = gate.send(());
        assert!(session.step().await.unwrap());
        assert_eq!(terminal.take_output(), "'second'\n> ");
    }

    #[tokio::test]
    async fn test_close_during_evaluation_discards_result() {
        let eval = |_: &str, _: EvalContext, _: &str, done: Done| -> std::result::Result<EvalFuture, Value> {
            Ok(Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                done.value(Value::from(1));
                Ok(())
            }))
        };
        let (mut session, tx, terminal) = session_with(ReplOptions::new().with_eval(eval).with_host_exit(|| {}));
        tx.line("slow");
        tx.close();
        session.run().await.unwrap();

        assert!(session.is_closed());
        assert_eq!(terminal.output(), "> ");
    }

    #[tokio::test]
    async fn test_command_error_is_reported() {
        let (mut session, tx, terminal) = session();
        session.define_command("boom", |args| anyhow::bail!("bad args: {}", args));
        assert!(terminal.transcript().command_keywords.contains(&"boom".to_string()));
        terminal.take_output();

        tx.line(".boom  x ");
        assert!(session.step().await.unwrap());
        assert_eq!(terminal.take_output(), "Error: bad args:  x\n> ");
    }

    #[tokio::test]
    async fn test_ignore_undefined() {
        let eval = |_: &str, _: EvalContext, _: &str, done: Done| -> std::result::Result<EvalFuture, Value> {
            done.value(Value::Undefined);
            Ok(settled())
        };
        let options = ReplOptions {
            ignore_undefined: true,
            ..ReplOptions::new().with_eval(eval)
        };
        let (mut session, tx, terminal) = session_with(options);
        assert!(!session.preview());
        terminal.take_output();

        tx.line("x");
        assert!(session.step().await.unwrap());
        assert!(session.step().await.unwrap());
        assert_eq!(terminal.take_output(), "> ");
    }

    #[tokio::test]
    async fn test_setup_history_and_prompt_change() {
        let (mut session, tx, terminal) = session();
        session.setup_history("/tmp/replkit-history").unwrap();
        assert_eq!(
            terminal.transcript().history_path.as_deref(),
            Some(Path::new("/tmp/replkit-history"))
        );

        session.set_prompt("$ ");
        session.clear_buffered_command();
        terminal.take_output();
        tx.line(".nope");
        assert!(session.step().await.unwrap());
        assert_eq!(terminal.take_output(), format!("{}$ ", INVALID_KEYWORD));
    }
}
