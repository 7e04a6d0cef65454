//! Per-verse side documents: tafsir, translations and word-by-word glosses.
//!
//! Documents live under a data root following
//! `{category}/{variant}/{chapter}_{verse}.json`. Any failure to read or
//! parse one is `DataUnavailable`; callers render a placeholder instead.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tafsir {
    #[serde(rename = "tafsirName")]
    pub name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub ar: String,
    pub en: String,
    #[serde(rename = "trans", default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordByWord {
    pub words: Vec<Word>,
}

/// Which side panel a document belongs to. Each kind is shown independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxiliaryKind {
    Tafsir,
    Translation,
    Words,
}

impl AuxiliaryKind {
    pub fn label(self) -> &'static str {
        match self {
            AuxiliaryKind::Tafsir => "tafsir",
            AuxiliaryKind::Translation => "translation",
            AuxiliaryKind::Words => "word-by-word",
        }
    }
}

/// A loaded side document, tagged with what it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuxiliaryContent {
    Tafsir(Tafsir),
    Translation(Translation),
    Words(WordByWord),
}

impl AuxiliaryContent {
    pub fn kind(&self) -> AuxiliaryKind {
        match self {
            AuxiliaryContent::Tafsir(_) => AuxiliaryKind::Tafsir,
            AuxiliaryContent::Translation(_) => AuxiliaryKind::Translation,
            AuxiliaryContent::Words(_) => AuxiliaryKind::Words,
        }
    }
}

pub struct AuxiliarySource {
    root: PathBuf,
}

impl AuxiliarySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn tafsir(&self, variant: &str, pos: Position) -> Result<Tafsir> {
        let path = self.variant_path("tafsir", variant, pos)?;
        fetch(&path).await
    }

    pub async fn translation(&self, variant: &str, pos: Position) -> Result<Translation> {
        let path = self.variant_path("translations", variant, pos)?;
        fetch(&path).await
    }

    pub async fn word_by_word(&self, pos: Position) -> Result<WordByWord> {
        let path = self.root.join("word-by-word").join(file_name(pos));
        fetch(&path).await
    }

    fn variant_path(&self, category: &str, variant: &str, pos: Position) -> Result<PathBuf> {
        let valid = !variant.is_empty()
            && variant
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CoreError::DataUnavailable(format!(
                "invalid {} variant '{}'",
                category, variant
            )));
        }
        Ok(self.root.join(category).join(variant).join(file_name(pos)))
    }
}

fn file_name(pos: Position) -> String {
    format!("{}_{}.json", pos.chapter, pos.verse)
}

async fn fetch<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        log::debug!("Side document {} unavailable: {}", path.display(), e);
        CoreError::DataUnavailable(format!("{}: {}", path.display(), e))
    })?;
    serde_json::from_str(&json).map_err(|e| {
        log::warn!("Side document {} is malformed: {}", path.display(), e);
        CoreError::DataUnavailable(format!("{}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(root: &Path, relative: &str, body: &str) {
        let path = root.join(relative);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, body).await.unwrap();
    }

    #[tokio::test]
    async fn test_reads_documents_by_path_convention() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "tafsir/ibn-kathir/1_1.json",
            r#"{"tafsirName": "ابن كثير", "text": "...", "source": "book"}"#,
        )
        .await;
        write(
            dir.path(),
            "translations/en/1_1.json",
            r#"{"text": "In the name of God", "translator": "Saheeh"}"#,
        )
        .await;
        write(
            dir.path(),
            "word-by-word/1_1.json",
            r#"{"words": [{"ar": "بِسْمِ", "en": "In the name", "trans": "bismi"}]}"#,
        )
        .await;

        let source = AuxiliarySource::new(dir.path());
        let pos = Position::new(1, 1);

        let tafsir = source.tafsir("ibn-kathir", pos).await.unwrap();
        assert_eq!(tafsir.source.as_deref(), Some("book"));

        let translation = source.translation("en", pos).await.unwrap();
        assert_eq!(translation.text, "In the name of God");

        let words = source.word_by_word(pos).await.unwrap();
        assert_eq!(words.words[0].transliteration.as_deref(), Some("bismi"));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_is_data_unavailable() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "translations/en/2_1.json", "not json").await;
        let source = AuxiliarySource::new(dir.path());

        let missing = source.tafsir("ibn-kathir", Position::new(1, 1)).await;
        assert!(matches!(missing, Err(CoreError::DataUnavailable(_))));

        let malformed = source.translation("en", Position::new(2, 1)).await;
        assert!(matches!(malformed, Err(CoreError::DataUnavailable(_))));

        let escaping = source.translation("../en", Position::new(2, 1)).await;
        assert!(matches!(escaping, Err(CoreError::DataUnavailable(_))));
    }
}
