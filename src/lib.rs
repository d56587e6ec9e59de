//! replkit
//!
//! An embeddable interactive read-eval-print loop: prompt, classify each line
//! as a `.command` or code, evaluate code through a pluggable evaluator and
//! print results through a pluggable writer.
//!
//! # Example
//!
//! ```no_run
//! use replkit::repl::{ReplOptions, Session};
//!
//! #[tokio::main]
//! async fn main() -> replkit::repl::Result<()> {
//!     let mut session = Session::new(ReplOptions::new().with_prompt("js> "))?;
//!     session.run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/replkit")]
#![warn(rust_2018_idioms)]

pub mod repl;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use repl::{start, ReplOptions, Session, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name
pub const NAME: &str = "replkit";
