//! Display-width aware wrapping for verse text.
//!
//! Arabic verse text is full of combining marks (harakat, small high
//! letters) that occupy no column of their own, so widths are measured per
//! grapheme cluster rather than per `char`.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns taken by one grapheme cluster.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.chars().all(char::is_control) {
        return 0;
    }
    // The base character decides; combining marks ride on it.
    match grapheme.chars().next().and_then(UnicodeWidthChar::width) {
        Some(0) | None => grapheme.width(),
        Some(width) => width,
    }
}

pub fn str_width(text: &str) -> usize {
    text.graphemes(true).map(grapheme_width).sum()
}

/// Wrap `text` into lines no wider than `max_width` columns, breaking at
/// whitespace where possible and never inside a grapheme cluster.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = str_width(word);

            if line_width > 0 && line_width + 1 + word_width <= max_width {
                line.push(' ');
                line.push_str(word);
                line_width += 1 + word_width;
                continue;
            }

            if line_width > 0 {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            if word_width <= max_width {
                line.push_str(word);
                line_width = word_width;
            } else {
                for grapheme in word.graphemes(true) {
                    let width = grapheme_width(grapheme);
                    if line_width + width > max_width && line_width > 0 {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0;
                    }
                    line.push_str(grapheme);
                    line_width += width;
                }
            }
        }

        lines.push(line);
    }

    lines
}

/// Cut `text` to at most `max_width` columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if str_width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme_width(grapheme);
        if width + w + 1 > max_width {
            break;
        }
        out.push_str(grapheme);
        width += w;
    }
    out.push('…');
    out
}

/// Wrap and indent every line by `indent` spaces.
pub fn wrap_indented(text: &str, max_width: usize, indent: usize) -> String {
    let pad = " ".repeat(indent);
    wrap_text(text, max_width.saturating_sub(indent))
        .into_iter()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}
