//! Line Input and Terminal Output
//!
//! The session talks to the outside world through two halves:
//!
//! - an [`EventReceiver`] delivering [`InputEvent`]s (lines, interrupts,
//!   close) in arrival order, and
//! - a [`Terminal`] that writes output, clears the current input line and
//!   shows the prompt.
//!
//! [`RustylineTerminal`] backs an interactive console with rustyline;
//! [`ChannelTerminal`] is a headless front-end fed through an [`EventSender`].

use std::io;
use std::path::Path;

use tokio::sync::mpsc;

use crate::repl::error::Result;

mod channel;
mod completer;
mod editor;

pub use channel::{ChannelTerminal, EventSender, Transcript};
pub use completer::{CompleterFn, ReplHelper};
pub use editor::{EditorOptions, RustylineTerminal};

/// Event raised by the input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A complete line, without its terminator
    Line(String),
    /// Interrupt signal (Ctrl+C)
    Interrupt,
    /// End of input or explicit close (Ctrl+D)
    Close,
}

/// Receiving half of the input source
pub type EventReceiver = mpsc::UnboundedReceiver<InputEvent>;

/// Create a connected sender/receiver pair
pub fn input_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender::new(tx), rx)
}

/// Output side of the input source
pub trait Terminal: Send {
    /// Write raw text
    fn write(
        &mut self,
        text: &str,
    ) -> io::Result<()>;

    /// Visually clear the line currently being edited
    fn clear_line(&mut self) -> io::Result<()>;

    /// Show `prompt` and make the input source ready for the next line
    fn render_prompt(
        &mut self,
        prompt: &str,
        preserve_cursor: bool,
    ) -> io::Result<()>;

    /// Stop producing input events
    fn close(&mut self);

    /// Whether the output is an interactive terminal
    fn is_terminal(&self) -> bool;

    /// Supported color depth in bits (1, 4, 8 or 24)
    fn color_depth(&self) -> u8 {
        detect_color_depth()
    }

    /// Load persisted history from `path` and keep it updated.
    /// Terminals without history support ignore the call.
    fn setup_history(
        &mut self,
        _path: &Path,
    ) -> Result<()> {
        Ok(())
    }

    /// Keywords offered for `.command` completion
    fn set_command_keywords(
        &mut self,
        _keywords: Vec<String>,
    ) {
    }
}

/// Color depth of the process environment
pub fn detect_color_depth() -> u8 {
    color_depth_from(|key| std::env::var(key).ok())
}

/// Color depth from an environment lookup
pub fn color_depth_from(env: impl Fn(&str) -> Option<String>) -> u8 {
    if env("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return 1;
    }
    if let Some(colorterm) = env("COLORTERM") {
        if colorterm == "truecolor" || colorterm == "24bit" {
            return 24;
        }
    }

    let Some(term) = env("TERM") else {
        return if cfg!(windows) { 24 } else { 1 };
    };
    if term == "dumb" {
        return 1;
    }
    if term.contains("256") {
        return 8;
    }

    const ANSI_TERMS: &[&str] = &["xterm", "screen", "tmux", "vt100", "linux", "ansi", "cygwin", "rxvt", "konsole"];
    if term.contains("color") || ANSI_TERMS.iter().any(|t| term.starts_with(t)) {
        4
    } else {
        1
    }
}
