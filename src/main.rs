//! replkit - CLI

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use replkit::repl;
use replkit::util::{config, logger};
use replkit::{NAME, VERSION};

/// Interactive read-eval-print loop
#[derive(Parser, Debug)]
#[command(name = "replkit")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    /// Prompt shown before each line
    #[arg(short, long)]
    prompt: Option<String>,

    /// Do not print `undefined` results
    #[arg(long)]
    ignore_undefined: bool,

    /// Disable colored output
    #[arg(long)]
    no_colors: bool,

    /// Persist line history in this file
    #[arg(long, value_name = "PATH")]
    history_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Layer command line flags over the user config
    fn options(
        self,
        config: &config::ReplConfig,
    ) -> repl::ReplOptions {
        let mut options = config.to_options();
        if let Some(prompt) = self.prompt {
            options.prompt = Some(prompt);
        }
        if self.ignore_undefined {
            options.ignore_undefined = true;
        }
        if self.no_colors {
            options.use_colors = Some(false);
        }
        if let Some(path) = self.history_file {
            options.history_file = Some(path);
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli(args.verbose);
    debug!(version = VERSION, host = std::env::consts::OS, "starting");

    let config = config::load_user_config().context("Failed to load user config")?;
    let options = args.options(&config.repl);

    let mut session = repl::start(options).context("Failed to start REPL")?;
    session.run().await.context("REPL session failed")?;
    Ok(())
}
