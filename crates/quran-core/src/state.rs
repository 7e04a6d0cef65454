//! The reading session: in-memory state plus its durable slices.
//!
//! `ReadingState` is plain data with pure mutations. `Reader` binds it to a
//! corpus and a store, applies each mutation and flushes only the slice it
//! touched. A failed write never rolls back memory; it is queued so the
//! front end can tell the user.

use chrono::{DateTime, Local, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::annotations::{
    memorization_percentage, Bookmark, Bookmarks, DailyProgress, History, MemorizationMark,
    MemorizationMarks,
};
use crate::auxiliary::{AuxiliaryContent, AuxiliaryKind};
use crate::backup::{BackupDocument, ImportSummary};
use crate::corpus::{Corpus, TOTAL_VERSES};
use crate::error::{CoreError, Result};
use crate::navigation;
use crate::position::Position;
use crate::preferences::Preferences;
use crate::search::SearchResult;
use crate::store::{keys, read_json, write_json, KeyValueStore};

/// One independently persisted part of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Position,
    Preferences,
    Bookmarks,
    Memorized,
    History,
}

impl Slice {
    pub const ALL: [Slice; 5] = [
        Slice::Position,
        Slice::Preferences,
        Slice::Bookmarks,
        Slice::Memorized,
        Slice::History,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Slice::Position => keys::POSITION,
            Slice::Preferences => keys::PREFERENCES,
            Slice::Bookmarks => keys::BOOKMARKS,
            Slice::Memorized => keys::MEMORIZED,
            Slice::History => keys::HISTORY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingState {
    pub position: Position,
    pub preferences: Preferences,
    pub bookmarks: Bookmarks,
    pub memorized: MemorizationMarks,
    pub history: History,
}

impl ReadingState {
    /// Read every slice from `store`. Missing or corrupt slices take their
    /// defaults; a stored position the corpus does not hold falls back to
    /// the corpus start.
    pub fn load<S>(store: &S, corpus: &Corpus) -> Self
    where
        S: KeyValueStore + ?Sized,
    {
        let mut preferences: Preferences = read_json(store, keys::PREFERENCES).unwrap_or_default();
        preferences.validate();

        let position = match read_json::<Position, _>(store, keys::POSITION) {
            Some(pos) if corpus.contains(pos) => pos,
            Some(pos) => {
                log::warn!("Stored position {} is not in the corpus, starting over", pos);
                corpus.first_position()
            }
            None => corpus.first_position(),
        };

        Self {
            position,
            preferences,
            bookmarks: read_json(store, keys::BOOKMARKS).unwrap_or_default(),
            memorized: read_json(store, keys::MEMORIZED).unwrap_or_default(),
            history: read_json(store, keys::HISTORY).unwrap_or_default(),
        }
    }

    pub fn persist<S>(&self, slice: Slice, store: &mut S) -> Result<()>
    where
        S: KeyValueStore + ?Sized,
    {
        let key = slice.key();
        match slice {
            Slice::Position => write_json(store, key, &self.position),
            Slice::Preferences => write_json(store, key, &self.preferences),
            Slice::Bookmarks => write_json(store, key, &self.bookmarks),
            Slice::Memorized => write_json(store, key, &self.memorized),
            Slice::History => write_json(store, key, &self.history),
        }
    }

    /// Owned copy for rendering; later mutations do not show through it.
    pub fn snapshot(&self) -> ReadingState {
        self.clone()
    }

    pub fn toggle_bookmark(&mut self, pos: Position, now: DateTime<Utc>) -> bool {
        self.bookmarks.toggle(pos, |p| Bookmark::new(p, now))
    }

    pub fn toggle_memorization(&mut self, pos: Position, now: DateTime<Utc>) -> bool {
        self.memorized.toggle(pos, |p| MemorizationMark::new(p, now))
    }

    pub fn record_history(&mut self, pos: Position, now: DateTime<Utc>) {
        self.history.record(pos, now);
    }

    pub fn is_bookmarked(&self, pos: Position) -> bool {
        self.bookmarks.contains(pos)
    }

    pub fn is_memorized(&self, pos: Position) -> bool {
        self.memorized.contains(pos)
    }

    pub fn chapter_has_bookmark(&self, chapter: u16) -> bool {
        self.bookmarks.any_in_chapter(chapter)
    }

    pub fn chapter_has_memorized(&self, chapter: u16) -> bool {
        self.memorized.any_in_chapter(chapter)
    }

    pub fn memorized_count(&self) -> usize {
        self.memorized.len()
    }

    pub fn remaining_count(&self) -> usize {
        TOTAL_VERSES.saturating_sub(self.memorized.len())
    }

    pub fn memorization_percentage(&self) -> String {
        memorization_percentage(self.memorized.len())
    }
}

/// The session context object. The composition root owns exactly one.
pub struct Reader<S: KeyValueStore> {
    corpus: Arc<Corpus>,
    state: ReadingState,
    store: S,
    auxiliary: HashMap<AuxiliaryKind, (Position, AuxiliaryContent)>,
    storage_errors: Vec<CoreError>,
}

impl<S: KeyValueStore> Reader<S> {
    pub fn open(corpus: Arc<Corpus>, store: S) -> Self {
        let state = ReadingState::load(&store, &corpus);
        log::info!(
            "Session opened at {} ({} bookmarks, {} memorized, {} history entries)",
            state.position,
            state.bookmarks.len(),
            state.memorized.len(),
            state.history.len()
        );
        Self {
            corpus,
            state,
            store,
            auxiliary: HashMap::new(),
            storage_errors: Vec::new(),
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn state(&self) -> &ReadingState {
        &self.state
    }

    pub fn snapshot(&self) -> ReadingState {
        self.state.snapshot()
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn preferences(&self) -> &Preferences {
        &self.state.preferences
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn next(&mut self) -> Position {
        let target = navigation::next(self.state.position, &self.corpus);
        self.move_to(target);
        target
    }

    pub fn prev(&mut self) -> Position {
        let target = navigation::prev(self.state.position, &self.corpus);
        self.move_to(target);
        target
    }

    /// Jump to an explicit verse and record it in the history.
    pub fn jump_to(&mut self, chapter: u16, verse: u16) -> Result<Position> {
        let target = navigation::jump_to(chapter, verse, &self.corpus)?;
        self.move_to(target);
        self.record_history(target);
        Ok(target)
    }

    pub fn open_result(&mut self, result: &SearchResult) -> Result<Position> {
        self.jump_to(result.chapter, result.verse)
    }

    pub fn toggle_bookmark(&mut self, pos: Position) -> Result<bool> {
        self.ensure_in_corpus(pos)?;
        let present = self.state.toggle_bookmark(pos, Utc::now());
        log::debug!("Bookmark at {} is now {}", pos, if present { "set" } else { "cleared" });
        self.persist(Slice::Bookmarks);
        Ok(present)
    }

    pub fn toggle_memorization(&mut self, pos: Position) -> Result<bool> {
        self.ensure_in_corpus(pos)?;
        let present = self.state.toggle_memorization(pos, Utc::now());
        self.persist(Slice::Memorized);
        Ok(present)
    }

    pub fn record_history(&mut self, pos: Position) {
        self.state.record_history(pos, Utc::now());
        self.persist(Slice::History);
    }

    pub fn memorization_percentage(&self) -> String {
        self.state.memorization_percentage()
    }

    pub fn daily_progress(&self) -> DailyProgress {
        DailyProgress::from_history(
            &self.state.history,
            self.state.preferences.daily_goal,
            Local::now(),
        )
    }

    pub fn chapter_progress(&self) -> u8 {
        navigation::chapter_progress(self.state.position, &self.corpus)
    }

    pub fn share_text(&self) -> Option<String> {
        self.corpus.share_text(self.state.position)
    }

    /// Apply a preference change, re-validate and flush it.
    pub fn update_preferences<R>(&mut self, change: impl FnOnce(&mut Preferences) -> R) -> R {
        let result = change(&mut self.state.preferences);
        self.state.preferences.validate();
        self.persist(Slice::Preferences);
        result
    }

    pub fn adjust_font_size(&mut self, delta: i32) -> u16 {
        self.update_preferences(|p| p.adjust_font_size(delta))
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.update_preferences(|p| {
            p.dark_mode = !p.dark_mode;
            p.dark_mode
        })
    }

    pub fn toggle_tajweed(&mut self) -> bool {
        self.update_preferences(|p| {
            p.tajweed_enabled = !p.tajweed_enabled;
            p.tajweed_enabled
        })
    }

    pub fn toggle_translation(&mut self) -> bool {
        self.update_preferences(|p| {
            p.translation_enabled = !p.translation_enabled;
            p.translation_enabled
        })
    }

    pub fn toggle_tafsir(&mut self) -> bool {
        self.update_preferences(|p| {
            p.tafsir_enabled = !p.tafsir_enabled;
            p.tafsir_enabled
        })
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.update_preferences(|p| p.set_volume(volume))
    }

    pub fn cycle_audio_speed(&mut self) -> f32 {
        self.update_preferences(Preferences::cycle_audio_speed)
    }

    /// Set a preference by name. A rejected value changes nothing and
    /// writes nothing.
    pub fn set_preference(&mut self, key: &str, value: &str) -> Result<&'static str> {
        let mut candidate = self.state.preferences.clone();
        let name = candidate.set(key, value)?;
        self.update_preferences(|p| *p = candidate);
        Ok(name)
    }

    /// Whether an auxiliary result fetched for `target` still applies.
    pub fn is_current(&self, target: Position) -> bool {
        self.state.position == target
    }

    /// Keep `content` in its kind's slot only if the reader is still on
    /// `target`. Other kinds are left alone.
    pub fn accept_auxiliary(&mut self, target: Position, content: AuxiliaryContent) -> bool {
        let kind = content.kind();
        if !self.is_current(target) {
            log::debug!(
                "Discarding late {} result for {} (now at {})",
                kind.label(),
                target,
                self.state.position
            );
            return false;
        }
        self.auxiliary.insert(kind, (target, content));
        true
    }

    pub fn auxiliary(&self, kind: AuxiliaryKind) -> Option<&AuxiliaryContent> {
        match self.auxiliary.get(&kind) {
            Some((pos, content)) if *pos == self.state.position => Some(content),
            _ => None,
        }
    }

    pub fn clear_auxiliary(&mut self, kind: AuxiliaryKind) {
        self.auxiliary.remove(&kind);
    }

    pub fn export(&self) -> Result<String> {
        BackupDocument::capture(&self.state).to_json()
    }

    /// Parse a backup document and replace what it carries. On a parse
    /// failure nothing changes.
    pub fn import(&mut self, json: &str) -> Result<ImportSummary> {
        let document = BackupDocument::from_json(json)?;
        let summary = document.apply(&mut self.state);
        for slice in [
            Slice::Bookmarks,
            Slice::Memorized,
            Slice::History,
            Slice::Preferences,
        ] {
            self.persist(slice);
        }
        log::info!("Backup {}", summary);
        Ok(summary)
    }

    /// Write every slice. Called on session end.
    pub fn flush_all(&mut self) {
        for slice in Slice::ALL {
            self.persist(slice);
        }
    }

    pub fn take_storage_errors(&mut self) -> Vec<CoreError> {
        std::mem::take(&mut self.storage_errors)
    }

    fn move_to(&mut self, target: Position) {
        if target == self.state.position {
            return;
        }
        self.state.position = target;
        self.auxiliary.clear();
        self.persist(Slice::Position);
    }

    fn ensure_in_corpus(&self, pos: Position) -> Result<()> {
        if self.corpus.contains(pos) {
            Ok(())
        } else {
            Err(CoreError::out_of_range(pos.chapter, pos.verse))
        }
    }

    fn persist(&mut self, slice: Slice) {
        if let Err(e) = self.state.persist(slice, &mut self.store) {
            log::warn!("Failed to save {}: {}", slice.key(), e);
            self.storage_errors.push(e);
        }
    }
}
