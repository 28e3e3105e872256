// Copyright 2026 Bookhound Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use bookhound::cli;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bookhound",
    about = "Bookhound: Telegram bot that finds and delivers book PDFs",
    version,
    after_help = "Run 'bookhound <command> --help' for details on each command.\nRun 'bookhound' with no command to start the bot."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (long polling)
    Run,
    /// Check environment and diagnose issues
    Doctor,
    /// Search the trusted book sites
    Search {
        /// Book title or author
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the PDF link behind a book page
    Resolve {
        /// Book page URL
        url: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve and download a PDF
    Fetch {
        /// Book page URL
        url: String,
        /// Output file (defaults to a name derived from the title)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "bookhound=debug" } else { "bookhound=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "bookhound", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose, cli.log_json);

    let result = match cli.command {
        None | Some(Commands::Run) => cli::run::run().await,
        Some(Commands::Doctor) => cli::doctor::run().await,
        Some(Commands::Search { query, json }) => cli::search_cmd::run(&query.join(" "), json).await,
        Some(Commands::Resolve { url, json }) => cli::resolve_cmd::run(&url, json).await,
        Some(Commands::Fetch { url, out }) => cli::fetch_cmd::run(&url, out).await,
        Some(Commands::Completions { .. }) => Ok(()),
    };

    // 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
