//! Linear search over the corpus.

use std::fmt;
use std::str::FromStr;

use crate::corpus::Corpus;
use crate::position::Position;

/// Hard cap on returned results. The first matches in corpus order are kept.
pub const MAX_RESULTS: usize = 50;

/// Text queries shorter than this return nothing.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Verse text, chapter name or english name.
    #[default]
    All,
    ChapterName,
    VerseNumber,
    /// Needs juz boundary data, which the corpus does not carry.
    Juz,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(SearchMode::All),
            "chapter" | "surah" | "chaptername" => Ok(SearchMode::ChapterName),
            "verse" | "ayah" | "versenumber" => Ok(SearchMode::VerseNumber),
            "juz" | "part" => Ok(SearchMode::Juz),
            other => Err(format!("unknown search mode: {}", other)),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::All => "all",
            SearchMode::ChapterName => "chapter",
            SearchMode::VerseNumber => "verse",
            SearchMode::Juz => "juz",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub chapter: u16,
    pub verse: u16,
    pub chapter_name: String,
    pub matched_text: String,
}

impl SearchResult {
    pub fn position(&self) -> Position {
        Position::new(self.chapter, self.verse)
    }
}

/// Fold a string for matching: lowercase, drop Arabic diacritics and
/// tatweel, and collapse the alef variants into a bare alef.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !is_arabic_mark(*c))
        .map(|c| match c {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_arabic_mark(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}'
        | '\u{0640}')
}

pub fn search(query: &str, mode: SearchMode, corpus: &Corpus) -> Vec<SearchResult> {
    let query = query.trim();
    match mode {
        SearchMode::All => search_all(query, corpus),
        SearchMode::ChapterName => search_chapter_names(query, corpus),
        SearchMode::VerseNumber => search_verse_number(query, corpus),
        SearchMode::Juz => {
            log::debug!("Juz search requested but no juz data is available");
            Vec::new()
        }
    }
}

fn too_short(query: &str) -> bool {
    query.chars().count() < MIN_QUERY_CHARS
}

fn search_all(query: &str, corpus: &Corpus) -> Vec<SearchResult> {
    if too_short(query) {
        return Vec::new();
    }
    let needle = normalize(query);
    if needle.is_empty() {
        return Vec::new();
    }

    corpus
        .chapters()
        .iter()
        .flat_map(|chapter| {
            let name_hit = normalize(&chapter.name).contains(&needle)
                || normalize(&chapter.english_name).contains(&needle);
            let needle = needle.clone();
            chapter
                .ayahs
                .iter()
                .enumerate()
                .filter(move |(_, verse)| name_hit || normalize(&verse.text).contains(&needle))
                .map(move |(index, verse)| SearchResult {
                    chapter: chapter.number,
                    verse: index as u16 + 1,
                    chapter_name: chapter.name.clone(),
                    matched_text: verse.text.clone(),
                })
        })
        .take(MAX_RESULTS)
        .collect()
}

fn search_chapter_names(query: &str, corpus: &Corpus) -> Vec<SearchResult> {
    if too_short(query) {
        return Vec::new();
    }
    let needle = normalize(query);
    if needle.is_empty() {
        return Vec::new();
    }

    corpus
        .chapters()
        .iter()
        .filter(|chapter| {
            normalize(&chapter.name).contains(&needle)
                || normalize(&chapter.english_name).contains(&needle)
        })
        .map(|chapter| SearchResult {
            chapter: chapter.number,
            verse: 1,
            chapter_name: chapter.name.clone(),
            matched_text: chapter.name.clone(),
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Only the plain decimal spelling of a verse number matches: `"7"` does,
/// `"07"` and `"+7"` do not.
fn search_verse_number(query: &str, corpus: &Corpus) -> Vec<SearchResult> {
    if query.starts_with('0') || !query.bytes().all(|b| b.is_ascii_digit()) {
        return Vec::new();
    }
    let ordinal: u16 = match query.parse() {
        Ok(n) => n,
        Err(_) => return Vec::new(),
    };

    corpus
        .chapters()
        .iter()
        .filter_map(|chapter| {
            chapter.verse(ordinal).map(|verse| SearchResult {
                chapter: chapter.number,
                verse: ordinal,
                chapter_name: chapter.name.clone(),
                matched_text: verse.text.clone(),
            })
        })
        .take(MAX_RESULTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Chapter, Verse};

    fn repeated_corpus() -> Corpus {
        let chapters = (1..=3)
            .map(|number| Chapter {
                number,
                name: format!("سورة {}", number),
                english_name: format!("Chapter {}", number),
                english_name_translation: None,
                number_of_ayahs: None,
                revelation_type: None,
                ayahs: (0..30)
                    .map(|_| Verse {
                        text: "ٱلْحَمْدُ لِلَّهِ".to_string(),
                    })
                    .collect(),
            })
            .collect();
        Corpus::new(chapters).unwrap()
    }

    #[test]
    fn test_chapter_name_returns_one_hit_per_chapter() {
        let corpus = Corpus::sample();
        let results = search("الفاتحة", SearchMode::ChapterName, &corpus);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chapter, 1);
    }

    #[test]
    fn test_english_name_is_case_insensitive() {
        let corpus = Corpus::sample();
        let results = search("al-IKHLAS", SearchMode::All, &corpus);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.chapter == 112));
        assert_eq!(results[3].verse, 4);
    }

    #[test]
    fn test_verse_text_ignores_diacritics() {
        let corpus = Corpus::sample();
        let results = search("الصمد", SearchMode::All, &corpus);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position(), Position::new(112, 2));
    }

    #[test]
    fn test_results_are_capped_in_corpus_order() {
        let corpus = repeated_corpus();
        let results = search("الحمد", SearchMode::All, &corpus);
        assert_eq!(results.len(), MAX_RESULTS);
        assert_eq!(results[0].position(), Position::new(1, 1));
        assert_eq!(results[29].position(), Position::new(1, 30));
        assert_eq!(results[49].position(), Position::new(2, 20));
    }

    #[test]
    fn test_verse_number_mode() {
        let corpus = Corpus::sample();
        let results = search("5", SearchMode::VerseNumber, &corpus);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position(), Position::new(1, 5));

        assert_eq!(search("1", SearchMode::VerseNumber, &corpus).len(), 2);
        assert!(search("x", SearchMode::VerseNumber, &corpus).is_empty());
        assert!(search("0", SearchMode::VerseNumber, &corpus).is_empty());
        assert!(search("05", SearchMode::VerseNumber, &corpus).is_empty());
        assert!(search("+5", SearchMode::VerseNumber, &corpus).is_empty());
    }

    #[test]
    fn test_unsupported_and_short_queries_are_empty() {
        let corpus = Corpus::sample();
        assert!(search("الفاتحة", SearchMode::Juz, &corpus).is_empty());
        assert!(search("ا", SearchMode::All, &corpus).is_empty());
        assert!(search("   ", SearchMode::ChapterName, &corpus).is_empty());
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("surah".parse::<SearchMode>().unwrap(), SearchMode::ChapterName);
        assert_eq!("AYAH".parse::<SearchMode>().unwrap(), SearchMode::VerseNumber);
        assert!("page".parse::<SearchMode>().is_err());
    }
}
