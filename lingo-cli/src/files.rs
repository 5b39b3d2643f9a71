//! JSON files the CLI works on: a document and the remote translations.

use anyhow::Context;
use lingo_core::{Document, TranslationRecord};
use std::path::Path;

pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read document {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid document {}", path.display()))
}

pub fn save_document(path: &Path, document: &Document) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(document)?;
    std::fs::write(path, content).with_context(|| format!("Cannot write {}", path.display()))
}

/// Remote translations; a missing file is an empty project.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<TranslationRecord>> {
    if !path.exists() {
        log::warn!("{} does not exist, starting from an empty project", path.display());
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read translations {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid translations {}", path.display()))
}

pub fn save_records(path: &Path, records: &[TranslationRecord]) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    std::fs::write(path, content).with_context(|| format!("Cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_records_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_records(&dir.path().join("remote.json")).unwrap().is_empty());
    }

    #[test]
    fn test_records_use_remote_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote.json");
        std::fs::write(
            &path,
            r#"[{"keyName":"greet","namespace":"app","translations":{"en":"Hi"}}]"#,
        )
        .unwrap();
        let records = load_records(&path).unwrap();
        assert_eq!(records[0].key_name, "greet");
        assert_eq!(records[0].text("en"), Some("Hi"));
    }

    #[test]
    fn test_invalid_document_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "[]").unwrap();
        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("doc.json"));
    }
}
