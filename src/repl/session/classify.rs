//! Line classification
//!
//! Decides whether an input line is a meta-command (`.keyword args`) or code
//! for the evaluator.

use crate::repl::engine::numeric::is_numeric;

/// Marker that starts a meta-command
pub const COMMAND_MARKER: char = '.';

/// How a line is dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `.keyword args`
    Command { keyword: &'a str, args: &'a str },
    /// Anything else goes to the evaluator
    Evaluate,
}

/// Classify an already trimmed line.
///
/// A command starts with a single marker, is not doubled (`..`) and is not a
/// numeric literal such as `.5`. The keyword runs up to the first whitespace
/// character; the arguments are everything after that one character.
pub fn classify(trimmed: &str) -> LineKind<'_> {
    let mut chars = trimmed.chars();
    if chars.next() != Some(COMMAND_MARKER) || chars.next() == Some(COMMAND_MARKER) {
        return LineKind::Evaluate;
    }
    if is_numeric(trimmed) {
        return LineKind::Evaluate;
    }

    let body = &trimmed[COMMAND_MARKER.len_utf8()..];
    match body.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((i, c)) => LineKind::Command {
            keyword: &body[..i],
            args: &body[i + c.len_utf8()..],
        },
        None => LineKind::Command {
            keyword: body,
            args: "",
        },
    }
}
