//! Parsing of typed verse references such as `2:255`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::position::Position;

lazy_static! {
    static ref VERSE_REFERENCE: Regex = Regex::new(r"^\s*(\d{1,3})(?:\s*[:.\s]\s*(\d{1,3}))?\s*$")
        .expect("Invalid VERSE_REFERENCE regex pattern");
}

/// Parse `"2:255"`, `"2.255"`, `"2 255"` or a bare chapter `"2"` (verse 1).
/// Bounds are not checked here; `navigation::jump_to` does that.
pub fn parse_reference(input: &str) -> Option<Position> {
    let caps = VERSE_REFERENCE.captures(input)?;
    let chapter = caps.get(1)?.as_str().parse().ok()?;
    let verse = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    Some(Position::new(chapter, verse))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_forms() {
        assert_eq!(parse_reference("2:255"), Some(Position::new(2, 255)));
        assert_eq!(parse_reference(" 18 . 10 "), Some(Position::new(18, 10)));
        assert_eq!(parse_reference("36 12"), Some(Position::new(36, 12)));
        assert_eq!(parse_reference("112"), Some(Position::new(112, 1)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_reference(""), None);
        assert_eq!(parse_reference("two:five"), None);
        assert_eq!(parse_reference("1:2:3"), None);
        assert_eq!(parse_reference("1234:1"), None);
    }
}
