//! Export and import of user annotations as a single JSON document.
//!
//! Import is all-or-nothing at the parse level: the whole document is
//! validated before any collection is touched. Each top-level key that is
//! present replaces its collection; absent keys leave it alone. History may
//! arrive as `readingHistory` or `history`; when both are present
//! `readingHistory` wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::annotations::{Bookmarks, History, Marker, MarkerSet, MemorizationMarks};
use crate::corpus::is_canonical;
use crate::error::{CoreError, Result};
use crate::preferences::PreferenceBackup;
use crate::state::ReadingState;

const READING_HISTORY: &str = "readingHistory";
const LEGACY_HISTORY: &str = "history";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<Bookmarks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memorized: Option<MemorizationMarks>,
    #[serde(default, alias = "history", skip_serializing_if = "Option::is_none")]
    pub reading_history: Option<History>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferenceBackup>,
}

impl BackupDocument {
    pub fn capture(state: &ReadingState) -> Self {
        Self {
            bookmarks: Some(state.bookmarks.clone()),
            memorized: Some(state.memorized.clone()),
            reading_history: Some(state.history.clone()),
            preferences: Some(PreferenceBackup::capture(&state.preferences)),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::StorageUnavailable(format!("serialize backup: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| CoreError::MalformedImport(e.to_string()))?;
        let Some(object) = value.as_object_mut() else {
            return Err(CoreError::MalformedImport(
                "top level must be a JSON object".to_string(),
            ));
        };
        if object.contains_key(READING_HISTORY) && object.remove(LEGACY_HISTORY).is_some() {
            log::warn!(
                "Backup carries both '{}' and '{}', using '{}'",
                READING_HISTORY,
                LEGACY_HISTORY,
                READING_HISTORY
            );
        }
        serde_json::from_value(value).map_err(|e| CoreError::MalformedImport(e.to_string()))
    }

    /// Replace every collection the document carries.
    pub fn apply(self, state: &mut ReadingState) -> ImportSummary {
        let mut summary = ImportSummary::default();

        if let Some(bookmarks) = self.bookmarks {
            state.bookmarks = keep_canonical(bookmarks);
            summary.bookmarks = Some(state.bookmarks.len());
        }
        if let Some(memorized) = self.memorized {
            state.memorized = keep_canonical(memorized);
            summary.memorized = Some(state.memorized.len());
        }
        if let Some(history) = self.reading_history {
            state.history = keep_canonical_history(history);
            summary.history = Some(state.history.len());
        }
        if let Some(preferences) = self.preferences {
            preferences.apply_to(&mut state.preferences);
            summary.preferences = true;
        }

        summary
    }
}

fn keep_canonical<T: Marker>(set: MarkerSet<T>) -> MarkerSet<T> {
    let before = set.len();
    let kept = MarkerSet::from_items(
        set.into_items()
            .into_iter()
            .filter(|item| is_canonical(item.position()))
            .collect(),
    );
    if kept.len() != before {
        log::warn!(
            "Dropped {} imported markers outside the corpus",
            before - kept.len()
        );
    }
    kept
}

fn keep_canonical_history(history: History) -> History {
    let before = history.len();
    let kept = History::from_entries(
        history
            .into_entries()
            .into_iter()
            .filter(|entry| is_canonical(entry.position()))
            .collect(),
    );
    if kept.len() != before {
        log::warn!(
            "Dropped {} imported history entries outside the corpus",
            before - kept.len()
        );
    }
    kept
}

/// What an import replaced. `None` means the key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub bookmarks: Option<usize>,
    pub memorized: Option<usize>,
    pub history: Option<usize>,
    pub preferences: bool,
}

impl ImportSummary {
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_none()
            && self.memorized.is_none()
            && self.history.is_none()
            && !self.preferences
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("nothing to import");
        }
        let mut parts = Vec::new();
        if let Some(n) = self.bookmarks {
            parts.push(format!("{} bookmarks", n));
        }
        if let Some(n) = self.memorized {
            parts.push(format!("{} memorized verses", n));
        }
        if let Some(n) = self.history {
            parts.push(format!("{} history entries", n));
        }
        if self.preferences {
            parts.push("preferences".to_string());
        }
        write!(f, "imported {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Bookmark, MemorizationMark};
    use crate::position::Position;
    use chrono::Utc;

    fn populated_state() -> ReadingState {
        let mut state = ReadingState::default();
        let now = Utc::now();
        state
            .bookmarks
            .toggle(Position::new(1, 1), |p| Bookmark::new(p, now));
        state
            .memorized
            .toggle(Position::new(112, 1), |p| MemorizationMark::new(p, now));
        state
            .memorized
            .toggle(Position::new(112, 2), |p| MemorizationMark::new(p, now));
        state.history.record(Position::new(1, 1), now);
        state.preferences.dark_mode = true;
        state
    }

    #[test]
    fn test_export_shape() {
        let json = BackupDocument::capture(&populated_state()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bookmarks"].as_array().unwrap().len(), 1);
        assert_eq!(value["memorized"].as_array().unwrap().len(), 2);
        assert_eq!(value["readingHistory"].as_array().unwrap().len(), 1);
        assert_eq!(value["preferences"]["darkMode"], true);
        assert_eq!(value["preferences"]["fontSize"], 24);
        assert!(value["preferences"].get("audioVolume").is_none());
    }

    #[test]
    fn test_partial_import_leaves_absent_keys_untouched() {
        let mut state = populated_state();
        let doc = BackupDocument::from_json(
            r#"{"bookmarks": [{"chapter": 2, "verse": 5, "timestamp": 1700000000000}]}"#,
        )
        .unwrap();
        let summary = doc.apply(&mut state);

        assert_eq!(state.bookmarks.positions(), vec![Position::new(2, 5)]);
        assert_eq!(state.memorized.len(), 2);
        assert_eq!(state.history.len(), 1);
        assert!(state.preferences.dark_mode);
        assert_eq!(summary.bookmarks, Some(1));
        assert_eq!(summary.memorized, None);
        assert_eq!(summary.to_string(), "imported 1 bookmarks");
    }

    #[test]
    fn test_malformed_import_is_rejected_whole() {
        for bad in ["{not json", "[]", r#"{"bookmarks": "oops"}"#] {
            let err = BackupDocument::from_json(bad).unwrap_err();
            assert!(matches!(err, CoreError::MalformedImport(_)), "{}", bad);
        }
    }

    #[test]
    fn test_import_drops_positions_outside_the_corpus() {
        let mut state = ReadingState::default();
        let doc = BackupDocument::from_json(
            r#"{"memorized": [{"surah": 1, "ayah": 8}, {"surah": 1, "ayah": 7}], "history": []}"#,
        )
        .unwrap();
        let summary = doc.apply(&mut state);
        assert_eq!(state.memorized.positions(), vec![Position::new(1, 7)]);
        assert_eq!(summary.history, Some(0));
    }

    #[test]
    fn test_import_drops_history_outside_the_corpus() {
        let mut state = ReadingState::default();
        let doc = BackupDocument::from_json(
            r#"{"readingHistory": [
                {"surah": 300, "ayah": 9, "timestamp": 1700000000000},
                {"surah": 2, "ayah": 255, "timestamp": 1700000000000}
            ]}"#,
        )
        .unwrap();
        let summary = doc.apply(&mut state);

        assert_eq!(summary.history, Some(1));
        assert_eq!(
            state.history.latest().map(|e| e.position()),
            Some(Position::new(2, 255))
        );
    }

    #[test]
    fn test_reading_history_wins_over_legacy_key() {
        let mut state = ReadingState::default();
        let doc = BackupDocument::from_json(
            r#"{
                "readingHistory": [{"chapter": 1, "verse": 2, "timestamp": 1700000000000}],
                "history": [
                    {"chapter": 1, "verse": 3, "timestamp": 1700000000000},
                    {"chapter": 1, "verse": 4, "timestamp": 1700000000000}
                ]
            }"#,
        )
        .unwrap();
        doc.apply(&mut state);

        assert_eq!(state.history.len(), 1);
        assert_eq!(
            state.history.latest().map(|e| e.position()),
            Some(Position::new(1, 2))
        );
    }
}
