//! Line-based terminal with rustyline
//!
//! A reader thread owns the rustyline editor and reads exactly one line per
//! prompt request, so the next line is never read before the session has
//! redisplayed its prompt. Interrupts that arrive while no line is being
//! edited are picked up from the process signal and forwarded as well.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use parking_lot::RwLock;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{CompletionType, Editor};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::completer::{CompleterFn, ReplHelper};
use super::{detect_color_depth, EventReceiver, InputEvent, Terminal};
use crate::repl::error::{ReplError, Result};

/// Options passed through to the line editor
#[derive(Clone, Default)]
pub struct EditorOptions {
    /// Maximum number of history entries
    pub history_size: Option<usize>,
    pub completer: Option<Arc<CompleterFn>>,
    /// History file loaded before the first prompt
    pub history_file: Option<PathBuf>,
}

enum Request {
    ReadLine(String),
    History(PathBuf),
}

/// Set while a line read is requested and its event not yet sent
#[derive(Clone, Default)]
struct ReadGate(Arc<AtomicBool>);

impl ReadGate {
    /// Claim the next read. False when one is already outstanding.
    fn claim(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Interactive console terminal
pub struct RustylineTerminal {
    requests: Option<std_mpsc::Sender<Request>>,
    commands: Arc<RwLock<Vec<String>>>,
    stdout: io::Stdout,
    is_terminal: bool,
    reading: ReadGate,
}

impl RustylineTerminal {
    /// Start the reader thread and the interrupt forwarder.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(options: EditorOptions) -> Result<(Self, EventReceiver)> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ReplError::config(format!("a Tokio runtime is required: {}", e)))?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let commands = Arc::new(RwLock::new(Vec::new()));
        let reading = ReadGate::default();

        let helper = ReplHelper::new(commands.clone(), options.completer.clone());
        let history_size = options.history_size;
        let history_file = options.history_file.clone();
        let reader_events = events_tx.clone();
        let reader_gate = reading.clone();
        thread::Builder::new()
            .name("repl-line-reader".into())
            .spawn(move || {
                let mut editor = match build_editor(history_size, helper) {
                    Ok(editor) => {
                        let _ = ready_tx.send(Ok(()));
                        editor
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                reader_loop(&mut editor, history_file, requests_rx, reader_events, reader_gate);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ReplError::config(format!("cannot initialise line editor: {}", e))),
            Err(_) => return Err(ReplError::config("line editor thread exited during startup")),
        }

        runtime.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if events_tx.send(InputEvent::Interrupt).is_err() {
                    break;
                }
            }
        });

        let stdout = io::stdout();
        let is_terminal = stdout.is_terminal();
        Ok((
            Self {
                requests: Some(requests_tx),
                commands,
                stdout,
                is_terminal,
                reading,
            },
            events_rx,
        ))
    }

    fn request(
        &self,
        request: Request,
    ) -> io::Result<()> {
        let Some(requests) = &self.requests else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "line reader closed"));
        };
        requests
            .send(request)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "line reader stopped"))
    }
}

fn build_editor(
    history_size: Option<usize>,
    helper: ReplHelper,
) -> std::result::Result<Editor<ReplHelper, FileHistory>, ReadlineError> {
    let mut builder = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .completion_type(CompletionType::List);
    if let Some(size) = history_size {
        builder = builder.max_history_size(size)?;
    }

    let mut editor = Editor::with_config(builder.build())?;
    editor.set_helper(Some(helper));
    Ok(editor)
}

fn reader_loop(
    editor: &mut Editor<ReplHelper, FileHistory>,
    mut history_file: Option<PathBuf>,
    requests: std_mpsc::Receiver<Request>,
    events: mpsc::UnboundedSender<InputEvent>,
    reading: ReadGate,
) {
    if let Some(path) = &history_file {
        load_history(editor, path);
    }

    while let Ok(request) = requests.recv() {
        let mut prompt = match request {
            Request::ReadLine(prompt) => prompt,
            Request::History(path) => {
                load_history(editor, &path);
                history_file = Some(path);
                continue;
            }
        };

        // History requests sent along with the prompt apply to this read
        while let Ok(queued) = requests.try_recv() {
            match queued {
                Request::ReadLine(next) => prompt = next,
                Request::History(path) => {
                    load_history(editor, &path);
                    history_file = Some(path);
                }
            }
        }

        let event = match editor.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                    if let Some(path) = &history_file {
                        if let Err(e) = editor.save_history(path) {
                            warn!(path = %path.display(), error = %e, "failed to save history");
                        }
                    }
                }
                InputEvent::Line(line)
            }
            Err(ReadlineError::Interrupted) => InputEvent::Interrupt,
            Err(ReadlineError::Eof) => InputEvent::Close,
            Err(e) => {
                warn!(error = %e, "line reader failed; closing input");
                InputEvent::Close
            }
        };

        let closing = event == InputEvent::Close;
        reading.release();
        if events.send(event).is_err() || closing {
            break;
        }
    }
    debug!("line reader stopped");
}

fn load_history(
    editor: &mut Editor<ReplHelper, FileHistory>,
    path: &Path,
) {
    if !path.exists() {
        return;
    }
    match editor.load_history(path) {
        Ok(()) => debug!(path = %path.display(), "history loaded"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to load history"),
    }
}

impl Terminal for RustylineTerminal {
    fn write(
        &mut self,
        text: &str,
    ) -> io::Result<()> {
        self.stdout.write_all(text.as_bytes())?;
        self.stdout.flush()
    }

    fn clear_line(&mut self) -> io::Result<()> {
        if !self.is_terminal {
            return Ok(());
        }
        execute!(self.stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))
    }

    /// Asks for the next line unless a read is still outstanding
    fn render_prompt(
        &mut self,
        prompt: &str,
        _preserve_cursor: bool,
    ) -> io::Result<()> {
        if !self.reading.claim() {
            debug!("read already pending, prompt not re-requested");
            return Ok(());
        }
        let sent = self.request(Request::ReadLine(prompt.to_string()));
        if sent.is_err() {
            self.reading.release();
        }
        sent
    }

    fn close(&mut self) {
        self.requests = None;
    }

    fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    fn color_depth(&self) -> u8 {
        if self.is_terminal {
            detect_color_depth()
        } else {
            1
        }
    }

    /// Takes effect before the next line is read; load failures are logged
    fn setup_history(
        &mut self,
        path: &Path,
    ) -> Result<()> {
        if path.is_dir() {
            return Err(ReplError::History {
                message: format!("{} is a directory", path.display()),
            });
        }
        self.request(Request::History(path.to_path_buf()))?;
        Ok(())
    }

    fn set_command_keywords(
        &mut self,
        keywords: Vec<String>,
    ) {
        *self.commands.write() = keywords;
    }
}
