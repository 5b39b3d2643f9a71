use super::open;
use crate::config::Config;
use anyhow::Context;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ScreenshotsArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Output directory for SVG previews
    #[arg(short, long, default_value = "./screenshots")]
    pub out_dir: PathBuf,
}

/// Render previews of the frames holding text. Returns the written files.
pub async fn screenshots(args: ScreenshotsArgs, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let plugin = open(&args.document, config).await?;
    let shots = plugin.client.screenshots().await?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Cannot create {}", args.out_dir.display()))?;

    println!("📸 {} frame(s)", shots.len());
    let mut written = Vec::with_capacity(shots.len());
    for shot in shots {
        let id = shot.id.simple().to_string();
        let file = args.out_dir.join(format!("{}-{}.svg", file_stem(&shot.name), &id[..8]));
        std::fs::write(&file, &shot.image)
            .with_context(|| format!("Cannot write {}", file.display()))?;
        println!(
            "   {} {} ({} text(s)) → {}",
            "✓".green(),
            shot.name,
            shot.nodes.len(),
            file.display()
        );
        written.push(file);
    }
    Ok(written)
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "frame".to_string()
    } else {
        stem
    }
}
