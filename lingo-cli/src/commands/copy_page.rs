use super::{open, resolve_language};
use crate::config::Config;
use crate::files;
use clap::Args;
use colored::Colorize;
use lingo_plugin::interface::create_page_copy;
use lingo_plugin::{CopiedPage, MemoryTranslationService};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CopyPageArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Remote translations JSON file
    #[arg(short, long, default_value = "translations.json")]
    pub remote: PathBuf,

    /// Language of the copy (overrides config)
    #[arg(short, long, conflicts_with = "keys")]
    pub language: Option<String>,

    /// Show translation keys instead of translations
    #[arg(long)]
    pub keys: bool,
}

pub async fn copy_page(args: CopyPageArgs, config: &Config) -> anyhow::Result<CopiedPage> {
    let plugin = open(&args.document, config).await?;
    let language = if args.keys {
        None
    } else {
        Some(resolve_language(args.language, config, &plugin.client).await?)
    };
    let service = MemoryTranslationService::new(files::load_records(&args.remote)?);

    let copied = create_page_copy(&plugin.client, &service, language.as_deref()).await?;
    files::save_document(&args.document, &plugin.snapshot().await)?;

    if copied.replaced > 0 {
        println!("   {} Replaced {} earlier copy", "↻".yellow(), copied.replaced);
    }
    println!(
        "{} Created page \"{}\" ({} text(s) filled)",
        "✓".green(),
        copied.name,
        copied.updated
    );
    Ok(copied)
}
