//! Headless terminal
//!
//! Output goes to a shared [`Transcript`] and input is pushed through an
//! [`EventSender`]. Useful for embedding a session behind another front-end
//! and for driving sessions in tests.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{InputEvent, Terminal};
use crate::repl::error::Result;

/// Everything a [`ChannelTerminal`] was asked to do
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Written text, prompts included
    pub output: String,
    /// Number of prompt renders
    pub prompts: usize,
    /// Number of line clears
    pub clears: usize,
    pub closed: bool,
    pub history_path: Option<PathBuf>,
    pub command_keywords: Vec<String>,
}

/// Headless [`Terminal`]
#[derive(Debug, Clone)]
pub struct ChannelTerminal {
    transcript: Arc<Mutex<Transcript>>,
    is_terminal: bool,
    color_depth: u8,
}

impl Default for ChannelTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelTerminal {
    /// Non-interactive terminal without colors
    pub fn new() -> Self {
        Self {
            transcript: Arc::new(Mutex::new(Transcript::default())),
            is_terminal: false,
            color_depth: 1,
        }
    }

    /// Report as an interactive terminal with the given color depth
    pub fn interactive(color_depth: u8) -> Self {
        Self {
            is_terminal: true,
            color_depth,
            ..Self::new()
        }
    }

    /// Snapshot of the transcript
    pub fn transcript(&self) -> Transcript {
        self.transcript.lock().clone()
    }

    /// Written text so far
    pub fn output(&self) -> String {
        self.transcript.lock().output.clone()
    }

    /// Drain written text
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.transcript.lock().output)
    }
}

impl Terminal for ChannelTerminal {
    fn write(
        &mut self,
        text: &str,
    ) -> io::Result<()> {
        self.transcript.lock().output.push_str(text);
        Ok(())
    }

    fn clear_line(&mut self) -> io::Result<()> {
        self.transcript.lock().clears += 1;
        Ok(())
    }

    fn render_prompt(
        &mut self,
        prompt: &str,
        _preserve_cursor: bool,
    ) -> io::Result<()> {
        let mut transcript = self.transcript.lock();
        transcript.output.push_str(prompt);
        transcript.prompts += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.transcript.lock().closed = true;
    }

    fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    fn color_depth(&self) -> u8 {
        self.color_depth
    }

    fn setup_history(
        &mut self,
        path: &Path,
    ) -> Result<()> {
        self.transcript.lock().history_path = Some(path.to_path_buf());
        Ok(())
    }

    fn set_command_keywords(
        &mut self,
        keywords: Vec<String>,
    ) {
        self.transcript.lock().command_keywords = keywords;
    }
}

/// Sending half of the input source
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<InputEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<InputEvent>) -> Self {
        Self { tx }
    }

    /// Send an event; `false` once the session has gone away
    pub fn send(
        &self,
        event: InputEvent,
    ) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn line(
        &self,
        line: impl Into<String>,
    ) -> bool {
        self.send(InputEvent::Line(line.into()))
    }

    pub fn interrupt(&self) -> bool {
        self.send(InputEvent::Interrupt)
    }

    pub fn close(&self) -> bool {
        self.send(InputEvent::Close)
    }
}
