//! Error types for the reading core

use thiserror::Error;

/// Every failure the core can report. None of them is fatal: callers turn
/// each one into a notice and keep going with a safe fallback.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A per-verse tafsir, translation or word-by-word document is missing
    /// or unreadable.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The durable store could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("position {chapter}:{verse} is outside the corpus")]
    OutOfRange { chapter: u16, verse: u16 },

    #[error("malformed import document: {0}")]
    MalformedImport(String),

    #[error("malformed corpus: {0}")]
    MalformedCorpus(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// A user-supplied preference name or value was rejected.
    #[error("invalid preference: {0}")]
    InvalidPreference(String),
}

impl CoreError {
    pub fn out_of_range(chapter: u16, verse: u16) -> Self {
        CoreError::OutOfRange { chapter, verse }
    }

    /// Storage and auxiliary-data failures only degrade the session; the
    /// front end shows them as warnings rather than errors.
    pub fn is_recoverable_io(&self) -> bool {
        matches!(
            self,
            CoreError::DataUnavailable(_) | CoreError::StorageUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
