use super::{open, resolve_language};
use crate::config::Config;
use crate::files;
use clap::{Args, ValueEnum};
use colored::Colorize;
use lingo_core::KeyMatching;
use lingo_plugin::interface::{prepare_push, submit_push};
use lingo_plugin::{MemoryTranslationService, NodeQuery, PushReport};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Matching {
    /// Pair by key name only
    Key,
    /// Pair by key name and namespace
    KeyAndNamespace,
}

impl From<Matching> for KeyMatching {
    fn from(m: Matching) -> Self {
        match m {
            Matching::Key => KeyMatching::Key,
            Matching::KeyAndNamespace => KeyMatching::KeyAndNamespace,
        }
    }
}

#[derive(Debug, Args)]
pub struct PushArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Remote translations JSON file
    #[arg(short, long, default_value = "translations.json")]
    pub remote: PathBuf,

    /// Language to push (overrides config)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Key matching mode (overrides config)
    #[arg(short, long, value_enum)]
    pub matching: Option<Matching>,

    /// Write the changes to the remote file
    #[arg(long)]
    pub apply: bool,
}

pub async fn push(args: PushArgs, config: &Config) -> anyhow::Result<PushReport> {
    let plugin = open(&args.document, config).await?;
    let language = resolve_language(args.language, config, &plugin.client).await?;
    let matching = args.matching.map(KeyMatching::from).unwrap_or(config.push_matching);

    let service = MemoryTranslationService::new(files::load_records(&args.remote)?);
    let query = NodeQuery {
        ignore_selection: config.ignore_selection,
        connected_only: true,
    };
    let nodes = plugin.client.nodes(query).await?.items;
    let changes = prepare_push(&service, &nodes, &language, matching).await?;

    println!("{}", format!("⬆️  Push ({language})").bright_blue().bold());
    if changes.is_empty() {
        println!("   Everything up to date");
        return Ok(PushReport::default());
    }
    for change in &changes.changed_keys {
        println!(
            "   {} {}: {:?} → {:?}",
            "~".yellow(),
            change.key,
            change.old_value.as_deref().unwrap_or_default(),
            change.new_value
        );
    }
    for change in &changes.new_keys {
        println!("   {} {}: {:?}", "+".green(), change.key, change.new_value);
    }

    if !args.apply {
        println!("   {} key(s) would be pushed; rerun with --apply", changes.len());
        return Ok(PushReport::default());
    }

    let report = submit_push(&service, &changes, &language).await;
    files::save_records(&args.remote, &service.records())?;

    for (change, err) in report.failed() {
        eprintln!("   {} {} - {}", "✗".red(), change.key, err);
    }
    println!(
        "   {} {} key(s) written to {}",
        "✓".green(),
        report.success_count(),
        args.remote.display()
    );
    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} key(s) failed to push",
            report.failure_count(),
            report.outcomes.len()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::{Document, NodeLinkage, Page, TextLayer, TranslationRecord};

    fn write_fixture(dir: &std::path::Path) -> (PathBuf, PathBuf) {
        let page = Page::new("Home")
            .with_layer(TextLayer::new("Hello").with_linkage(&NodeLinkage::new("greet", None, true)))
            .with_layer(TextLayer::new("Sign in").with_linkage(&NodeLinkage::new("login", Some("auth".into()), true)));
        let document = dir.join("doc.json");
        let remote = dir.join("remote.json");
        files::save_document(&document, &Document::with_pages(vec![page])).unwrap();
        files::save_records(
            &remote,
            &[TranslationRecord::new("greet", None).with_translation("en", "Hi")],
        )
        .unwrap();
        (document, remote)
    }

    fn args(document: PathBuf, remote: PathBuf, apply: bool) -> PushArgs {
        PushArgs {
            document,
            remote,
            language: Some("en".into()),
            matching: None,
            apply,
        }
    }

    #[tokio::test]
    async fn test_dry_run_leaves_remote_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (document, remote) = write_fixture(dir.path());
        let before = std::fs::read_to_string(&remote).unwrap();

        let report = push(args(document, remote.clone(), false), &Config::default()).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(std::fs::read_to_string(&remote).unwrap(), before);
    }

    #[tokio::test]
    async fn test_apply_writes_remote_file() {
        let dir = tempfile::tempdir().unwrap();
        let (document, remote) = write_fixture(dir.path());

        let report = push(args(document, remote.clone(), true), &Config::default()).await.unwrap();
        assert_eq!(report.success_count(), 2);

        let records = files::load_records(&remote).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("en"), Some("Hello"));
        assert_eq!(records[1].key_name, "login");
        assert_eq!(records[1].namespace.as_deref(), Some("auth"));
    }

    #[tokio::test]
    async fn test_missing_language_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (document, remote) = write_fixture(dir.path());
        let mut args = args(document, remote, false);
        args.language = None;

        let err = push(args, &Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("No language"));
    }
}
