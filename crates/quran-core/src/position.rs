use serde::{Deserialize, Serialize};
use std::fmt;

/// A (chapter, verse) reading location. Both parts are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    #[serde(alias = "surah")]
    pub chapter: u16,
    #[serde(alias = "ayah")]
    pub verse: u16,
}

impl Position {
    pub const fn new(chapter: u16, verse: u16) -> Self {
        Self { chapter, verse }
    }

    pub const fn start() -> Self {
        Self::new(1, 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}
