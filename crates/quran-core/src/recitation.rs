//! Recitation audio addressing.
//!
//! Only URLs are produced here; playback belongs to the front end. Verse or
//! word level synchronisation needs real timing metadata and is not derived
//! from elapsed playback time.

use crate::corpus::CHAPTER_COUNT;

const AUDIO_BASE_URL: &str = "https://cdn.islamic.network/quran/audio/128";

/// Full-chapter recitation by `reciter`.
pub fn chapter_audio_url(reciter: &str, chapter: u16) -> String {
    format!("{}/ar.{}/{}.mp3", AUDIO_BASE_URL, reciter, chapter)
}

/// The chapter to fetch ahead of time so playback can continue seamlessly.
pub fn preload_url(reciter: &str, chapter: u16) -> Option<String> {
    if chapter >= CHAPTER_COUNT {
        return None;
    }
    Some(chapter_audio_url(reciter, chapter + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            chapter_audio_url("abdulbasit", 36),
            "https://cdn.islamic.network/quran/audio/128/ar.abdulbasit/36.mp3"
        );
        assert_eq!(
            preload_url("husary", 1).as_deref(),
            Some("https://cdn.islamic.network/quran/audio/128/ar.husary/2.mp3")
        );
        assert!(preload_url("husary", 114).is_none());
    }
}
