//! Bookmarks, memorization marks and reading history.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashSet, VecDeque};

use crate::corpus::TOTAL_VERSES;
use crate::position::Position;

/// Maximum number of history entries kept.
pub const HISTORY_LIMIT: usize = 100;

/// Anything pinned to a single verse.
pub trait Marker {
    fn position(&self) -> Position;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(alias = "surah")]
    pub chapter: u16,
    #[serde(alias = "ayah")]
    pub verse: u16,
    #[serde(
        rename = "timestamp",
        alias = "createdAt",
        with = "chrono::serde::ts_milliseconds",
        default = "Utc::now"
    )]
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(pos: Position, created_at: DateTime<Utc>) -> Self {
        Self {
            chapter: pos.chapter,
            verse: pos.verse,
            created_at,
        }
    }
}

impl Marker for Bookmark {
    fn position(&self) -> Position {
        Position::new(self.chapter, self.verse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorizationMark {
    #[serde(alias = "surah")]
    pub chapter: u16,
    #[serde(alias = "ayah")]
    pub verse: u16,
    #[serde(rename = "markedAt", alias = "date", default = "Utc::now")]
    pub marked_at: DateTime<Utc>,
}

impl MemorizationMark {
    pub fn new(pos: Position, marked_at: DateTime<Utc>) -> Self {
        Self {
            chapter: pos.chapter,
            verse: pos.verse,
            marked_at,
        }
    }
}

impl Marker for MemorizationMark {
    fn position(&self) -> Position {
        Position::new(self.chapter, self.verse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(alias = "surah")]
    pub chapter: u16,
    #[serde(alias = "ayah")]
    pub verse: u16,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn position(&self) -> Position {
        Position::new(self.chapter, self.verse)
    }
}

/// Insertion-ordered set of markers keyed by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet<T> {
    items: Vec<T>,
}

impl<T> Default for MarkerSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Marker> MarkerSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list that may contain duplicates; the first one wins.
    pub fn from_items(items: Vec<T>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.position()))
            .collect();
        Self { items }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.items.iter().any(|item| item.position() == pos)
    }

    /// Remove the marker at `pos` if there is one, otherwise add `make(pos)`.
    /// Returns whether a marker is present afterwards.
    pub fn toggle(&mut self, pos: Position, make: impl FnOnce(Position) -> T) -> bool {
        match self.items.iter().position(|item| item.position() == pos) {
            Some(index) => {
                self.items.remove(index);
                false
            }
            None => {
                self.items.push(make(pos));
                true
            }
        }
    }

    pub fn any_in_chapter(&self, chapter: u16) -> bool {
        self.items.iter().any(|item| item.position().chapter == chapter)
    }

    pub fn positions(&self) -> Vec<Position> {
        self.items.iter().map(Marker::position).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for MarkerSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Marker> Deserialize<'de> for MarkerSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_items)
    }
}

pub type Bookmarks = MarkerSet<Bookmark>;
pub type MemorizationMarks = MarkerSet<MemorizationMark>;

/// Newest-first reading history, bounded to [`HISTORY_LIMIT`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut entries: VecDeque<_> = entries.into();
        entries.truncate(HISTORY_LIMIT);
        Self { entries }
    }

    pub fn record(&mut self, pos: Position, at: DateTime<Utc>) {
        self.entries.push_front(HistoryEntry {
            chapter: pos.chapter,
            verse: pos.verse,
            timestamp: at,
        });
        if self.entries.len() > HISTORY_LIMIT {
            self.entries.pop_back();
        }
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries.into()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for History {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<HistoryEntry>::deserialize(deserializer).map(Self::from_entries)
    }
}

/// Share of the whole Quran memorized, with one decimal place.
pub fn memorization_percentage(memorized: usize) -> String {
    let ratio = memorized.min(TOTAL_VERSES) as f64 / TOTAL_VERSES as f64;
    format!("{:.1}", ratio * 100.0)
}

/// Distinct verses read today, measured against the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyProgress {
    pub read_today: usize,
    pub goal: u32,
}

impl DailyProgress {
    pub fn from_history(history: &History, goal: u32, now: DateTime<Local>) -> Self {
        let today = now.date_naive();
        let read_today = history
            .iter()
            .filter(|entry| entry.timestamp.with_timezone(&Local).date_naive() == today)
            .map(HistoryEntry::position)
            .collect::<HashSet<_>>()
            .len();
        Self { read_today, goal }
    }

    pub fn is_met(&self) -> bool {
        self.read_today as u64 >= self.goal as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut bookmarks = Bookmarks::new();
        bookmarks.toggle(Position::new(2, 1), |p| Bookmark::new(p, at(1)));
        let before = bookmarks.positions();

        let pos = Position::new(18, 10);
        assert!(bookmarks.toggle(pos, |p| Bookmark::new(p, at(2))));
        assert!(bookmarks.contains(pos));
        assert!(!bookmarks.toggle(pos, |p| Bookmark::new(p, at(3))));
        assert_eq!(bookmarks.positions(), before);
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let json = r#"[
            {"surah": 2, "ayah": 5, "timestamp": 1000},
            {"chapter": 2, "verse": 5, "timestamp": 2000},
            {"chapter": 3, "verse": 1}
        ]"#;
        let bookmarks: Bookmarks = serde_json::from_str(json).unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks.iter().next().unwrap().created_at, at(1000));
        assert!(bookmarks.any_in_chapter(3));
    }

    #[test]
    fn test_memorization_mark_reads_legacy_date() {
        let json = r#"[{"surah": 1, "ayah": 1, "date": "2024-03-01T10:00:00.000Z"}]"#;
        let marks: MemorizationMarks = serde_json::from_str(json).unwrap();
        let mark = marks.iter().next().unwrap();
        assert_eq!(mark.marked_at, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());

        let out = serde_json::to_string(&marks).unwrap();
        assert!(out.contains("\"markedAt\""));
    }

    #[test]
    fn test_history_is_bounded_and_newest_first() {
        let mut history = History::new();
        for i in 0..=HISTORY_LIMIT as u16 {
            history.record(Position::new(1 + i / 7, 1 + i % 7), at(i as i64));
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history.iter().all(|e| e.timestamp != at(0)));
        assert_eq!(history.latest().unwrap().timestamp, at(HISTORY_LIMIT as i64));
    }

    #[test]
    fn test_history_deserialize_truncates() {
        let entries: Vec<_> = (0..150)
            .map(|i| format!(r#"{{"chapter":1,"verse":1,"timestamp":{}}}"#, i))
            .collect();
        let json = format!("[{}]", entries.join(","));
        let history: History = serde_json::from_str(&json).unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.latest().unwrap().timestamp, at(0));
    }

    #[test]
    fn test_memorization_percentage_bounds() {
        assert_eq!(memorization_percentage(0), "0.0");
        assert_eq!(memorization_percentage(TOTAL_VERSES), "100.0");
        assert_eq!(memorization_percentage(7), "0.1");
    }

    #[test]
    fn test_daily_progress_counts_distinct_verses_today() {
        let now = Local::now();
        let mut history = History::new();
        history.record(Position::new(1, 1), (now - Duration::days(3)).with_timezone(&Utc));
        history.record(Position::new(1, 2), now.with_timezone(&Utc));
        history.record(Position::new(1, 2), now.with_timezone(&Utc));
        history.record(Position::new(1, 3), now.with_timezone(&Utc));

        let progress = DailyProgress::from_history(&history, 2, now);
        assert_eq!(progress.read_today, 2);
        assert!(progress.is_met());
    }
}
