//! Pure position arithmetic over the corpus structure.
//!
//! `next` and `prev` clamp at the corpus boundaries and never wrap around.
//! Only `jump_to` reports an out-of-range target.

use crate::corpus::Corpus;
use crate::error::{CoreError, Result};
use crate::position::Position;

pub fn next(pos: Position, corpus: &Corpus) -> Position {
    if let Some(count) = corpus.ayah_count(pos.chapter) {
        if pos.verse < count {
            return Position::new(pos.chapter, pos.verse + 1);
        }
    }
    match corpus.chapter_after(pos.chapter) {
        Some(chapter) => Position::new(chapter.number, 1),
        None => pos,
    }
}

pub fn prev(pos: Position, corpus: &Corpus) -> Position {
    if pos.verse > 1 && corpus.contains(pos) {
        return Position::new(pos.chapter, pos.verse - 1);
    }
    match corpus.chapter_before(pos.chapter) {
        Some(chapter) => Position::new(chapter.number, chapter.ayah_count()),
        None => pos,
    }
}

pub fn jump_to(chapter: u16, verse: u16, corpus: &Corpus) -> Result<Position> {
    let pos = Position::new(chapter, verse);
    if corpus.contains(pos) {
        Ok(pos)
    } else {
        Err(CoreError::out_of_range(chapter, verse))
    }
}

/// How far into its chapter `pos` is, as a whole percentage.
pub fn chapter_progress(pos: Position, corpus: &Corpus) -> u8 {
    match corpus.ayah_count(pos.chapter) {
        Some(count) if count > 0 => {
            let verse = pos.verse.min(count) as f64;
            ((verse / count as f64) * 100.0).round() as u8
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Chapter, Verse};

    fn corpus_with_counts(counts: &[(u16, u16)]) -> Corpus {
        let chapters = counts
            .iter()
            .map(|&(number, verses)| Chapter {
                number,
                name: format!("سورة {}", number),
                english_name: format!("Chapter {}", number),
                english_name_translation: None,
                number_of_ayahs: Some(verses),
                revelation_type: None,
                ayahs: (1..=verses)
                    .map(|v| Verse {
                        text: format!("{}:{}", number, v),
                    })
                    .collect(),
            })
            .collect();
        Corpus::new(chapters).unwrap()
    }

    #[test]
    fn test_next_within_and_across_chapters() {
        let corpus = corpus_with_counts(&[(1, 7), (2, 3)]);
        assert_eq!(next(Position::new(1, 3), &corpus), Position::new(1, 4));

        let end_of_first = jump_to(1, 7, &corpus).unwrap();
        assert_eq!(next(end_of_first, &corpus), Position::new(2, 1));
    }

    #[test]
    fn test_boundaries_stay_put() {
        let corpus = corpus_with_counts(&[(1, 7), (114, 6)]);
        assert_eq!(prev(Position::new(1, 1), &corpus), Position::new(1, 1));
        assert_eq!(next(Position::new(114, 6), &corpus), Position::new(114, 6));
    }

    #[test]
    fn test_prev_moves_to_last_verse_of_previous_chapter() {
        let corpus = corpus_with_counts(&[(1, 7), (2, 3)]);
        assert_eq!(prev(Position::new(2, 1), &corpus), Position::new(1, 7));
        assert_eq!(prev(Position::new(2, 3), &corpus), Position::new(2, 2));
    }

    #[test]
    fn test_partial_corpus_skips_missing_chapters() {
        let corpus = Corpus::sample();
        assert_eq!(next(Position::new(1, 7), &corpus), Position::new(112, 1));
        assert_eq!(prev(Position::new(112, 1), &corpus), Position::new(1, 7));
    }

    #[test]
    fn test_jump_out_of_range() {
        let corpus = corpus_with_counts(&[(1, 7), (2, 3)]);
        let err = jump_to(1, 8, &corpus).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { chapter: 1, verse: 8 }));
        assert!(jump_to(0, 1, &corpus).is_err());
        assert!(jump_to(115, 1, &corpus).is_err());
        assert!(jump_to(2, 0, &corpus).is_err());
    }

    #[test]
    fn test_chapter_progress() {
        let corpus = corpus_with_counts(&[(1, 7)]);
        assert_eq!(chapter_progress(Position::new(1, 7), &corpus), 100);
        assert_eq!(chapter_progress(Position::new(1, 1), &corpus), 14);
        assert_eq!(chapter_progress(Position::new(9, 1), &corpus), 0);
    }
}
