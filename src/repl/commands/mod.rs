//! REPL Command Registry
//!
//! Maps meta-command keywords (the text after the leading `.`) to handlers.
//! Keywords are matched case-sensitively; registering an existing keyword
//! replaces its handler.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Command handler: receives the argument string after the keyword
pub type CommandFn = dyn Fn(&str) -> anyhow::Result<()> + Send + Sync;

/// Terminates the host process
pub type HostExit = Arc<dyn Fn() + Send + Sync>;

/// Default [`HostExit`]: exit the process immediately
pub fn process_exit() -> HostExit {
    Arc::new(|| std::process::exit(0))
}

/// Registered command
#[derive(Clone)]
pub struct Command {
    /// Keyword without the marker
    pub keyword: String,
    /// Optional help text
    pub help: Option<String>,
    handler: Arc<CommandFn>,
}

impl Command {
    /// Run the handler
    pub fn invoke(
        &self,
        args: &str,
    ) -> anyhow::Result<()> {
        (self.handler)(args)
    }
}

impl fmt::Debug for Command {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Command")
            .field("keyword", &self.keyword)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Keyword → handler map
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `exit` command
    ///
    /// `exit` calls `host_exit` unconditionally; there is no drain of
    /// pending work and no `Exit` event.
    pub fn with_defaults(host_exit: HostExit) -> Self {
        let mut registry = Self::new();
        registry.register_with_help("exit", "Exit the REPL", move |_| {
            host_exit();
            Ok(())
        });
        registry
    }

    /// Register a handler, replacing any previous one for `keyword`
    pub fn register<F>(
        &mut self,
        keyword: impl Into<String>,
        handler: F,
    ) where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.insert(keyword.into(), None, Arc::new(handler));
    }

    /// Register a handler with help text
    pub fn register_with_help<F>(
        &mut self,
        keyword: impl Into<String>,
        help: impl Into<String>,
        handler: F,
    ) where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.insert(keyword.into(), Some(help.into()), Arc::new(handler));
    }

    fn insert(
        &mut self,
        keyword: String,
        help: Option<String>,
        handler: Arc<CommandFn>,
    ) {
        if self.commands.contains_key(&keyword) {
            debug!(%keyword, "replacing command");
        }
        self.commands.insert(
            keyword.clone(),
            Command {
                keyword,
                help,
                handler,
            },
        );
    }

    /// Whether `keyword` is registered
    pub fn has(
        &self,
        keyword: &str,
    ) -> bool {
        self.commands.contains_key(keyword)
    }

    pub fn get(
        &self,
        keyword: &str,
    ) -> Option<&Command> {
        self.commands.get(keyword)
    }

    /// Invoke a registered command; `None` when the keyword is unknown
    pub fn invoke(
        &self,
        keyword: &str,
        args: &str,
    ) -> Option<anyhow::Result<()>> {
        self.commands.get(keyword).map(|command| command.invoke(args))
    }

    /// Registered keywords in sorted order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
