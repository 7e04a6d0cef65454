//! The read-only text corpus and its bootstrap/cache loading.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::position::Position;
use crate::store::{keys, KeyValueStore};

pub const CHAPTER_COUNT: u16 = 114;

/// Verse count of the whole Quran, used for memorization progress even when
/// only part of the corpus is loaded.
pub const TOTAL_VERSES: usize = 6236;

/// Canonical verse count of every chapter, indexed by `chapter - 1`.
pub const AYAH_COUNTS: [u16; CHAPTER_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Whether `pos` can exist in the complete corpus, regardless of what is loaded.
pub fn is_canonical(pos: Position) -> bool {
    pos.chapter >= 1
        && pos.chapter <= CHAPTER_COUNT
        && pos.verse >= 1
        && pos.verse <= AYAH_COUNTS[(pos.chapter - 1) as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevelationType {
    Meccan,
    Medinan,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub number: u16,
    pub name: String,
    pub english_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_name_translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_ayahs: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revelation_type: Option<RevelationType>,
    pub ayahs: Vec<Verse>,
}

impl Chapter {
    pub fn ayah_count(&self) -> u16 {
        self.ayahs.len() as u16
    }

    /// Verse by 1-based ordinal.
    pub fn verse(&self, ordinal: u16) -> Option<&Verse> {
        if ordinal == 0 {
            return None;
        }
        self.ayahs.get((ordinal - 1) as usize)
    }
}

/// Wire shape of the bootstrap document.
#[derive(Debug, Serialize, Deserialize)]
struct CorpusDocument {
    surahs: Vec<Chapter>,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    chapters: Vec<Chapter>,
}

impl Corpus {
    /// Build a corpus, checking numbering and ordering.
    pub fn new(chapters: Vec<Chapter>) -> Result<Self> {
        if chapters.is_empty() {
            return Err(CoreError::MalformedCorpus("no chapters".to_string()));
        }

        let mut previous = 0u16;
        for chapter in &chapters {
            if chapter.number == 0 || chapter.number > CHAPTER_COUNT {
                return Err(CoreError::MalformedCorpus(format!(
                    "chapter number {} out of range",
                    chapter.number
                )));
            }
            if chapter.number <= previous {
                return Err(CoreError::MalformedCorpus(format!(
                    "chapter {} is out of order or duplicated",
                    chapter.number
                )));
            }
            if chapter.ayahs.is_empty() {
                return Err(CoreError::MalformedCorpus(format!(
                    "chapter {} has no verses",
                    chapter.number
                )));
            }
            if let Some(declared) = chapter.number_of_ayahs {
                if declared != chapter.ayah_count() {
                    log::warn!(
                        "Chapter {} declares {} verses but carries {}",
                        chapter.number,
                        declared,
                        chapter.ayah_count()
                    );
                }
            }
            previous = chapter.number;
        }

        Ok(Self { chapters })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: CorpusDocument =
            serde_json::from_str(json).map_err(|e| CoreError::MalformedCorpus(e.to_string()))?;
        Self::new(document.surahs)
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, number: u16) -> Option<&Chapter> {
        self.chapters
            .binary_search_by_key(&number, |c| c.number)
            .ok()
            .map(|index| &self.chapters[index])
    }

    pub fn ayah_count(&self, chapter: u16) -> Option<u16> {
        self.chapter(chapter).map(Chapter::ayah_count)
    }

    pub fn verse(&self, pos: Position) -> Option<&Verse> {
        self.chapter(pos.chapter)?.verse(pos.verse)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.verse(pos).is_some()
    }

    /// The first loaded chapter numbered above `chapter`.
    pub fn chapter_after(&self, chapter: u16) -> Option<&Chapter> {
        let index = self.chapters.partition_point(|c| c.number <= chapter);
        self.chapters.get(index)
    }

    /// The last loaded chapter numbered below `chapter`.
    pub fn chapter_before(&self, chapter: u16) -> Option<&Chapter> {
        let index = self.chapters.partition_point(|c| c.number < chapter);
        index.checked_sub(1).map(|i| &self.chapters[i])
    }

    pub fn first_position(&self) -> Position {
        Position::new(self.chapters[0].number, 1)
    }

    pub fn last_position(&self) -> Position {
        let last = &self.chapters[self.chapters.len() - 1];
        Position::new(last.number, last.ayah_count())
    }

    pub fn loaded_verses(&self) -> usize {
        self.chapters.iter().map(|c| c.ayahs.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.chapters.len() == CHAPTER_COUNT as usize
    }

    /// Plain-text rendering of a verse for sharing or copying.
    pub fn share_text(&self, pos: Position) -> Option<String> {
        let chapter = self.chapter(pos.chapter)?;
        let verse = chapter.verse(pos.verse)?;
        Some(format!("{} - الآية {}\n{}", chapter.name, pos.verse, verse.text))
    }

    /// Chapters 1 and 112, used when no corpus can be loaded.
    pub fn sample() -> Self {
        let chapter = |number, name: &str, english: &str, translation: &str, verses: &[&str]| {
            Chapter {
                number,
                name: name.to_string(),
                english_name: english.to_string(),
                english_name_translation: Some(translation.to_string()),
                number_of_ayahs: Some(verses.len() as u16),
                revelation_type: Some(RevelationType::Meccan),
                ayahs: verses
                    .iter()
                    .map(|text| Verse {
                        text: text.to_string(),
                    })
                    .collect(),
            }
        };

        Self {
            chapters: vec![
                chapter(
                    1,
                    "الفاتحة",
                    "Al-Fatiha",
                    "The Opening",
                    &[
                        "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ",
                        "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَـٰلَمِينَ",
                        "ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ",
                        "مَـٰلِكِ يَوْمِ ٱلدِّينِ",
                        "إِيَّاكَ نَعْبُدُ وَإِيَّاكَ نَسْتَعِينُ",
                        "ٱهْدِنَا ٱلصِّرَٰطَ ٱلْمُسْتَقِيمَ",
                        "صِرَٰطَ ٱلَّذِينَ أَنْعَمْتَ عَلَيْهِمْ غَيْرِ ٱلْمَغْضُوبِ عَلَيْهِمْ وَلَا ٱلضَّآلِّينَ",
                    ],
                ),
                chapter(
                    112,
                    "الإخلاص",
                    "Al-Ikhlas",
                    "The Sincerity",
                    &[
                        "قُلْ هُوَ ٱللَّهُ أَحَدٌ",
                        "ٱللَّهُ ٱلصَّمَدُ",
                        "لَمْ يَلِدْ وَلَمْ يُولَدْ",
                        "وَلَمْ يَكُن لَّهُۥ كُفُوًا أَحَدٌۢ",
                    ],
                ),
            ],
        }
    }
}

/// Load the corpus for a session.
///
/// The cached copy under `quran_data` wins; otherwise the bootstrap document
/// is read from `source` and cached verbatim. When neither works the sample
/// corpus is returned so the reader still starts.
pub async fn load_corpus<S>(source: Option<&Path>, store: &mut S) -> Corpus
where
    S: KeyValueStore + ?Sized,
{
    if let Some(cached) = store.get(keys::CORPUS) {
        match Corpus::from_json(&cached) {
            Ok(corpus) => {
                log::info!("Loaded corpus from cache ({} chapters)", corpus.chapters().len());
                return corpus;
            }
            Err(e) => log::warn!("Cached corpus is unusable, reloading: {}", e),
        }
    }

    if let Some(path) = source {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => match Corpus::from_json(&json) {
                Ok(corpus) => {
                    if let Err(e) = store.set(keys::CORPUS, &json) {
                        log::warn!("Could not cache corpus: {}", e);
                    }
                    log::info!(
                        "Loaded corpus from {} ({} chapters)",
                        path.display(),
                        corpus.chapters().len()
                    );
                    return corpus;
                }
                Err(e) => log::error!("Corpus at {} is malformed: {}", path.display(), e),
            },
            Err(e) => log::error!("Failed to read corpus {}: {}", path.display(), e),
        }
    }

    log::warn!("Falling back to the built-in sample corpus");
    Corpus::sample()
}
