use super::{open, resolve_language};
use crate::config::Config;
use crate::files;
use clap::Args;
use colored::Colorize;
use lingo_plugin::interface::{apply_pull, prepare_pull, PullOutcome};
use lingo_plugin::{MemoryTranslationService, NodeQuery};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PullArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Remote translations JSON file
    #[arg(short, long, default_value = "translations.json")]
    pub remote: PathBuf,

    /// Language to pull (overrides config)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Write the new texts into the document file
    #[arg(long)]
    pub apply: bool,
}

pub async fn pull(args: PullArgs, config: &Config) -> anyhow::Result<PullOutcome> {
    let plugin = open(&args.document, config).await?;
    let language = resolve_language(args.language, config, &plugin.client).await?;
    let service = MemoryTranslationService::new(files::load_records(&args.remote)?);

    let query = NodeQuery {
        ignore_selection: config.ignore_selection,
        connected_only: false,
    };
    let plan = prepare_pull(&plugin.client, &service, &language, query).await?;

    println!("{}", format!("⬇️  Pull ({language})").bright_blue().bold());
    if plan.changes.is_up_to_date() {
        println!("   Everything up to date");
    } else {
        println!(
            "   This will replace translations in {} text(s):",
            plan.changes.changed_nodes.len()
        );
        for node in &plan.changes.changed_nodes {
            println!("   {} {} → {:?}", "~".yellow(), node.key, node.characters);
        }
    }
    if !plan.changes.missing_keys.is_empty() {
        println!("   {} key(s) not found in the document:", plan.changes.missing_keys.len());
        for key in &plan.changes.missing_keys {
            match &key.ns {
                Some(ns) if !ns.is_empty() => println!("     {} {ns}:{}", "?".dimmed(), key.key),
                _ => println!("     {} {}", "?".dimmed(), key.key),
            }
        }
    }

    if !args.apply {
        return Ok(PullOutcome::default());
    }

    let outcome = apply_pull(&plugin.client, &plan).await?;
    files::save_document(&args.document, &plugin.snapshot().await)?;
    println!(
        "   {} {} text(s) updated, {} node(s) connected",
        "✓".green(),
        outcome.updated,
        outcome.connected
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::{Document, NodeLinkage, Page, TextLayer, TranslationRecord};

    #[tokio::test]
    async fn test_apply_rewrites_document() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("doc.json");
        let remote = dir.path().join("remote.json");
        let page = Page::new("Home")
            .with_layer(TextLayer::new("Hello").with_linkage(&NodeLinkage::new("greet", None, true)))
            .with_layer(TextLayer::new("Menu").with_linkage(&NodeLinkage::new("menu", None, false)));
        files::save_document(&document, &Document::with_pages(vec![page])).unwrap();
        files::save_records(
            &remote,
            &[
                TranslationRecord::new("greet", None).with_translation("de", "Hallo"),
                TranslationRecord::new("menu", None).with_translation("de", "Menu"),
            ],
        )
        .unwrap();

        let args = PullArgs {
            document: document.clone(),
            remote,
            language: Some("de".into()),
            apply: true,
        };
        let outcome = pull(args, &Config::default()).await.unwrap();
        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.connected, 1);

        let saved = files::load_document(&document).unwrap();
        let nodes = saved.page_text_nodes();
        assert_eq!(nodes[0].characters, "Hallo");
        assert!(nodes[1].connected);
        assert!(saved.pages[0].plugin_data.contains("\"language\":\"de\""));
    }
}
