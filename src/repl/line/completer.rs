//! REPL Completer
//!
//! Provides completion candidates for rustyline. A user completer, when
//! configured, is consulted as-is; otherwise `.` followed by a partial
//! keyword completes against the registered commands.

use std::sync::Arc;

use parking_lot::RwLock;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;

/// User completer: takes the text before the cursor and returns the
/// candidates plus the substring they replace
pub type CompleterFn = dyn Fn(&str) -> (Vec<String>, String) + Send + Sync;

/// rustyline helper for REPL sessions
#[derive(Clone, Default)]
pub struct ReplHelper {
    /// Registered command keywords
    commands: Arc<RwLock<Vec<String>>>,
    user: Option<Arc<CompleterFn>>,
}

impl ReplHelper {
    /// Create a helper
    pub fn new(
        commands: Arc<RwLock<Vec<String>>>,
        user: Option<Arc<CompleterFn>>,
    ) -> Self {
        Self { commands, user }
    }

    /// Start offset and candidates for the text before `pos`
    pub fn candidates(
        &self,
        line: &str,
        pos: usize,
    ) -> (usize, Vec<String>) {
        let head = &line[..pos];

        if let Some(user) = &self.user {
            let (candidates, replaced) = user(head);
            return (pos.saturating_sub(replaced.len()), candidates);
        }

        let Some(partial) = head.trim_start().strip_prefix('.') else {
            return (pos, Vec::new());
        };
        if partial.contains(char::is_whitespace) || partial.starts_with('.') {
            return (pos, Vec::new());
        }

        let mut candidates: Vec<String> = self
            .commands
            .read()
            .iter()
            .filter(|k| k.starts_with(partial))
            .cloned()
            .collect();
        candidates.sort();
        candidates.dedup();
        (pos - partial.len(), candidates)
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (start, candidates) = self.candidates(line, pos);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}
