//! Lingo CLI: sync document texts with a translation project.
//!
//! Runs the document and interface contexts in one process over a local
//! channel. The document and the remote project are JSON files.

mod commands;
mod config;
mod files;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{copy_page, pull, push, screenshots, CopyPageArgs, PullArgs, PushArgs, ScreenshotsArgs};
use config::{Config, DEFAULT_CONFIG_NAME};
use std::path::PathBuf;

/// Lingo - keep design texts and translations in sync
#[derive(Parser, Debug)]
#[command(name = "lingo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push document texts to the translation project
    Push(PushArgs),

    /// Pull translations into the document
    Pull(PullArgs),

    /// Duplicate the current page with translations or keys
    CopyPage(CopyPageArgs),

    /// Render previews of frames containing text
    Screenshots(ScreenshotsArgs),
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;
    match cli.command {
        Command::Push(args) => push(args, &config).await.map(|_| ()),
        Command::Pull(args) => pull(args, &config).await.map(|_| ()),
        Command::CopyPage(args) => copy_page(args, &config).await.map(|_| ()),
        Command::Screenshots(args) => screenshots(args, &config).await.map(|_| ()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
