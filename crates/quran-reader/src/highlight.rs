//! Tajweed colouring for verse text.
//!
//! Letters are classified by the base character of each grapheme cluster so
//! harakat stay attached to the letter they sit on. Colouring is applied
//! after wrapping; escape codes take no columns.

use crossterm::style::{Color, Stylize};
use unicode_segmentation::UnicodeSegmentation;

use crate::text_width::wrap_indented;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TajweedRule {
    /// Prolongation letters: alef, waw, ya.
    Madd,
    /// Echoing letters: qaf, ta, ba, jim, dal.
    Qalqalah,
    /// Concealment letters: ta, tha.
    Ikhfa,
}

impl TajweedRule {
    pub fn of(letter: char) -> Option<Self> {
        match letter {
            'ا' | 'و' | 'ي' => Some(TajweedRule::Madd),
            'ق' | 'ط' | 'ب' | 'ج' | 'د' => Some(TajweedRule::Qalqalah),
            'ت' | 'ث' => Some(TajweedRule::Ikhfa),
            _ => None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            TajweedRule::Madd => Color::Rgb {
                r: 0xff,
                g: 0x57,
                b: 0x22,
            },
            TajweedRule::Qalqalah => Color::Rgb {
                r: 0x21,
                g: 0x96,
                b: 0xf3,
            },
            TajweedRule::Ikhfa => Color::Rgb {
                r: 0x4c,
                g: 0xaf,
                b: 0x50,
            },
        }
    }
}

/// Split `text` into runs of grapheme clusters sharing one rule.
pub fn segments(text: &str) -> Vec<(Option<TajweedRule>, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<TajweedRule> = None;

    for (offset, grapheme) in text.grapheme_indices(true) {
        let rule = grapheme.chars().next().and_then(TajweedRule::of);
        if offset > start && rule != current {
            runs.push((current, &text[start..offset]));
            start = offset;
        }
        current = rule;
    }
    if start < text.len() {
        runs.push((current, &text[start..]));
    }

    runs
}

pub fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for (rule, run) in segments(text) {
        match rule {
            Some(rule) => out.push_str(&run.with(rule.color()).to_string()),
            None => out.push_str(run),
        }
    }
    out
}

/// Wrap verse text and colour it when tajweed display is on.
pub fn verse_block(text: &str, width: usize, indent: usize, tajweed: bool) -> String {
    let wrapped = wrap_indented(text, width, indent);
    if tajweed {
        colorize(&wrapped)
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_letters() {
        assert_eq!(TajweedRule::of('ا'), Some(TajweedRule::Madd));
        assert_eq!(TajweedRule::of('ق'), Some(TajweedRule::Qalqalah));
        assert_eq!(TajweedRule::of('ث'), Some(TajweedRule::Ikhfa));
        assert_eq!(TajweedRule::of('م'), None);
    }

    #[test]
    fn test_segments_keep_marks_with_their_letter() {
        // ba with kasra, then sin with sukun, then mim with kasra
        let word = "بِسْمِ";
        let runs = segments(word);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], (Some(TajweedRule::Qalqalah), "بِ"));
        assert_eq!(runs[1], (None, "سْمِ"));
        assert_eq!(runs.iter().map(|(_, r)| *r).collect::<String>(), word);
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(colorize("In the name"), "In the name");
        assert_eq!(colorize(""), "");
    }

    #[test]
    fn test_verse_block_plain_when_off() {
        let verse = "قُلْ هُوَ ٱللَّهُ أَحَدٌ";
        assert_eq!(verse_block(verse, 80, 2, false), format!("  {}", verse));
        assert_ne!(verse_block(verse, 80, 2, true), verse_block(verse, 80, 2, false));
    }

    #[test]
    fn test_colorize_wraps_classified_runs() {
        let coloured = colorize("قل");
        assert!(coloured.contains('\u{1b}'));
        assert!(coloured.contains('ق'));
        assert!(coloured.ends_with('ل'));
    }
}
