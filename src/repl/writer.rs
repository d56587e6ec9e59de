//! Value Writer
//!
//! Renders evaluation results and thrown errors as display text. The default
//! [`Inspector`] follows the conventions of an object inspector: quoted
//! strings, `[ 1, 2 ]` arrays, `{ a: 1 }` objects, `[Circular]` for cycles.
//!
//! # Shared defaults
//!
//! [`Inspector::shared`] hands out a view onto one process-wide
//! [`InspectOptions`] instance. A session constructed without its own writer
//! uses that instance and overwrites its `colors` flag with the session's own
//! color decision, so the most recently constructed session wins. Use
//! [`Inspector::new`] for a private, isolated instance.

use std::sync::Arc;

use once_cell::sync::Lazy;
use owo_colors::OwoColorize;
use parking_lot::RwLock;

use super::value::{format_number, Value};

/// Formats a value for display. Must never fail.
pub trait Writer: Send + Sync {
    fn write(
        &self,
        value: &Value,
    ) -> String;
}

impl<F> Writer for F
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn write(
        &self,
        value: &Value,
    ) -> String {
        self(value)
    }
}

/// Display toggles for the inspector
#[derive(Debug, Clone, PartialEq)]
pub struct InspectOptions {
    /// Emit ANSI colors
    pub colors: bool,
    /// Show proxies as `Proxy [ target, handler ]` instead of their target
    pub show_proxy: bool,
    /// Nesting depth before collapsing to `[Array]` / `[Object]`
    pub depth: usize,
    /// Single-line width before entries are broken onto separate lines
    pub break_length: usize,
    pub max_array_length: usize,
    pub max_string_length: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            colors: false,
            show_proxy: true,
            depth: 2,
            break_length: 80,
            max_array_length: 100,
            max_string_length: 10_000,
        }
    }
}

static SHARED_OPTIONS: Lazy<Arc<RwLock<InspectOptions>>> =
    Lazy::new(|| Arc::new(RwLock::new(InspectOptions::default())));

/// Default writer
#[derive(Debug, Clone)]
pub struct Inspector {
    options: Arc<RwLock<InspectOptions>>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::shared()
    }
}

impl Inspector {
    /// Inspector backed by the process-wide options
    pub fn shared() -> Self {
        Self {
            options: SHARED_OPTIONS.clone(),
        }
    }

    /// Inspector with private options
    pub fn new(options: InspectOptions) -> Self {
        Self {
            options: Arc::new(RwLock::new(options)),
        }
    }

    /// Handle on the options; mutations affect every clone of this inspector
    pub fn options(&self) -> Arc<RwLock<InspectOptions>> {
        self.options.clone()
    }

    pub fn set_colors(
        &self,
        colors: bool,
    ) {
        self.options.write().colors = colors;
    }

    /// Whether two inspectors share the same options
    pub fn shares_options_with(
        &self,
        other: &Inspector,
    ) -> bool {
        Arc::ptr_eq(&self.options, &other.options)
    }

    /// Format a value
    pub fn inspect(
        &self,
        value: &Value,
    ) -> String {
        let options = self.options.read().clone();
        let mut fmt = Formatter {
            options: &options,
            seen: Vec::new(),
        };
        match value {
            // Top-level errors print their headline and stack unbracketed
            Value::Error(err) => {
                let mut out = format!("{}: {}", err.name, err.message);
                if err.message.is_empty() {
                    out = err.name.clone();
                }
                if let Some(stack) = &err.stack {
                    out.push('\n');
                    out.push_str(stack);
                }
                out
            }
            other => fmt.format(other, 0),
        }
    }
}

impl Writer for Inspector {
    fn write(
        &self,
        value: &Value,
    ) -> String {
        self.inspect(value)
    }
}

enum Style {
    Number,
    String,
    Undefined,
    Null,
    Special,
}

struct Formatter<'a> {
    options: &'a InspectOptions,
    /// Identities of containers on the current path
    seen: Vec<usize>,
}

impl Formatter<'_> {
    fn paint(
        &self,
        text: String,
        style: Style,
    ) -> String {
        if !self.options.colors {
            return text;
        }
        match style {
            Style::Number => text.yellow().to_string(),
            Style::String => text.green().to_string(),
            Style::Undefined => text.bright_black().to_string(),
            Style::Null => text.bold().to_string(),
            Style::Special => text.cyan().to_string(),
        }
    }

    fn format(
        &mut self,
        value: &Value,
        level: usize,
    ) -> String {
        match value {
            Value::Undefined => self.paint("undefined".into(), Style::Undefined),
            Value::Null => self.paint("null".into(), Style::Null),
            Value::Bool(b) => self.paint(b.to_string(), Style::Number),
            Value::Number(n) => self.paint(format_number(*n), Style::Number),
            Value::BigInt(n) => self.paint(format!("{}n", n), Style::Number),
            Value::String(s) => {
                let quoted = self.quote(s);
                self.paint(quoted, Style::String)
            }
            Value::Symbol(desc) => self.paint(format!("Symbol({})", desc), Style::String),
            Value::Function(name) => {
                let text = match name {
                    Some(name) if !name.is_empty() => format!("[Function: {}]", name),
                    _ => "[Function (anonymous)]".to_string(),
                };
                self.paint(text, Style::Special)
            }
            Value::Error(err) if err.message.is_empty() => format!("[{}]", err.name),
            Value::Error(err) => format!("[{}: {}]", err.name, err.message),
            Value::Array(_) | Value::Object(_) | Value::Proxy(_) => self.format_container(value, level),
        }
    }

    fn format_container(
        &mut self,
        value: &Value,
        level: usize,
    ) -> String {
        let id = value.identity().unwrap_or_default();
        if self.seen.contains(&id) {
            return self.paint("[Circular]".into(), Style::Special);
        }

        if let Value::Proxy(proxy) = value {
            if !self.options.show_proxy {
                return self.format(&proxy.target, level);
            }
            if level > self.options.depth {
                return self.paint("Proxy [Array]".into(), Style::Special);
            }
            self.seen.push(id);
            let entries = vec![
                self.format(&proxy.target, level + 1),
                self.format(&proxy.handler, level + 1),
            ];
            self.seen.pop();
            return self.wrap("Proxy [", "]", entries, level);
        }

        let is_empty = match value {
            Value::Array(items) => items.read().is_empty(),
            Value::Object(map) => map.read().is_empty(),
            _ => false,
        };
        if level > self.options.depth && !is_empty {
            let label = if matches!(value, Value::Array(_)) { "[Array]" } else { "[Object]" };
            return self.paint(label.into(), Style::Special);
        }

        self.seen.push(id);
        let (open, close, entries) = match value {
            Value::Array(items) => {
                let items = items.read().clone();
                let limit = self.options.max_array_length;
                let mut entries: Vec<String> =
                    items.iter().take(limit).map(|v| self.format(v, level + 1)).collect();
                if items.len() > limit {
                    let rest = items.len() - limit;
                    entries.push(format!("... {} more item{}", rest, if rest > 1 { "s" } else { "" }));
                }
                ("[", "]", entries)
            }
            Value::Object(map) => {
                let map = map.read().clone();
                let entries = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", self.key(k), self.format(v, level + 1)))
                    .collect();
                ("{", "}", entries)
            }
            _ => ("", "", Vec::new()),
        };
        self.seen.pop();

        if entries.is_empty() {
            return format!("{}{}", open, close);
        }
        self.wrap(open, close, entries, level)
    }

    /// Join entries on one line, or one per line when too wide
    fn wrap(
        &self,
        open: &str,
        close: &str,
        entries: Vec<String>,
        level: usize,
    ) -> String {
        let single = format!("{} {} {}", open, entries.join(", "), close);
        let multiline = entries.iter().any(|e| e.contains('\n'));
        if !multiline && visible_len(&single) + level * 2 <= self.options.break_length {
            return single;
        }

        let indent = "  ".repeat(level + 1);
        let body = entries
            .iter()
            .map(|e| format!("{}{}", indent, e))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{}\n{}\n{}{}", open, body, "  ".repeat(level), close)
    }

    fn key(
        &self,
        key: &str,
    ) -> String {
        if is_identifier(key) {
            key.to_string()
        } else {
            let quoted = self.quote(key);
            self.paint(quoted, Style::String)
        }
    }

    fn quote(
        &self,
        s: &str,
    ) -> String {
        let limit = self.options.max_string_length;
        let total = s.chars().count();
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for c in s.chars().take(limit) {
            match c {
                '\'' => out.push_str("\\'"),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
                c => out.push(c),
            }
        }
        out.push('\'');
        if total > limit {
            let rest = total - limit;
            out.push_str(&format!("... {} more character{}", rest, if rest > 1 { "s" } else { "" }));
        }
        out
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if unicode_ident::is_xid_start(c) || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| unicode_ident::is_xid_continue(c) || c == '$')
}

/// Length ignoring ANSI escape sequences
fn visible_len(s: &str) -> usize {
    let mut len = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else if c == '\u{1b}' {
            in_escape = true;
        } else {
            len += 1;
        }
    }
    len
}
