mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    convert, init, inspect, merge, render, ConvertArgs, InitArgs, InspectArgs, MergeArgs,
    RenderArgs,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pagekit CLI - convert, merge and render page-builder documents
#[derive(Parser, Debug)]
#[command(name = "pagekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./pagekit.config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default pagekit.config.json
    Init(InitArgs),

    /// Convert HTML into a document JSON file
    Convert(ConvertArgs),

    /// Serialize a page of a document back to HTML
    Render(RenderArgs),

    /// Merge HTML into a page, keeping edited sections
    Merge(MergeArgs),

    /// List every node of a document with its path
    Inspect(InspectArgs),
}

fn init_logging(verbose: bool, fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { fallback })
    });

    // stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = config::load(&cwd, cli.config.as_deref())?;
    init_logging(cli.verbose, &config.log_level);

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Convert(args) => convert(args, config),
        Command::Render(args) => render(args, config),
        Command::Merge(args) => merge(args, config),
        Command::Inspect(args) => inspect(args, config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
