use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const MIN_FONT_SIZE: u16 = 16;
pub const MAX_FONT_SIZE: u16 = 48;

/// Playback speeds offered by the speed control, in cycling order.
pub const AUDIO_SPEEDS: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Preference names accepted by [`Preferences::set`], as they are stored.
pub const SETTABLE_KEYS: [&str; 10] = [
    "fontSize",
    "fontFamily",
    "lineSpacing",
    "autoPlay",
    "wordHighlight",
    "audioSpeed",
    "audioVolume",
    "currentReciter",
    "dailyGoal",
    "darkMode",
];

/// Display and audio settings. Missing keys take their defaults and unknown
/// keys are ignored, so older or newer preference blobs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub dark_mode: bool,
    pub font_size: u16,
    pub font_family: String,
    pub line_spacing: f32,
    pub tajweed_enabled: bool,
    pub translation_enabled: bool,
    pub tafsir_enabled: bool,
    pub auto_play: bool,
    pub word_highlight: bool,
    pub audio_speed: f32,
    pub audio_volume: f32,
    #[serde(rename = "currentReciter")]
    pub reciter: String,
    pub daily_goal: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            font_size: 24,
            font_family: String::from("Amiri"),
            line_spacing: 2.0,
            tajweed_enabled: true,
            translation_enabled: false,
            tafsir_enabled: false,
            auto_play: false,
            word_highlight: true,
            audio_speed: 1.0,
            audio_volume: 0.8,
            reciter: String::from("abdulbasit"),
            daily_goal: 20,
        }
    }
}

impl Preferences {
    /// Reset every out-of-range value to its default. Returns whether
    /// anything had to be corrected.
    pub fn validate(&mut self) -> bool {
        let defaults = Self::default();
        let mut has_issues = false;

        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            log::warn!("Invalid font size: {}, using default", self.font_size);
            self.font_size = defaults.font_size;
            has_issues = true;
        }

        if self.font_family.trim().is_empty() {
            log::warn!("Empty font family, using default");
            self.font_family = defaults.font_family;
            has_issues = true;
        }

        if !self.line_spacing.is_finite() || !(1.0..=3.0).contains(&self.line_spacing) {
            log::warn!("Invalid line spacing: {}, using default", self.line_spacing);
            self.line_spacing = defaults.line_spacing;
            has_issues = true;
        }

        if !AUDIO_SPEEDS.contains(&self.audio_speed) {
            log::warn!("Unsupported audio speed: {}, using default", self.audio_speed);
            self.audio_speed = defaults.audio_speed;
            has_issues = true;
        }

        if !self.audio_volume.is_finite() || !(0.0..=1.0).contains(&self.audio_volume) {
            log::warn!("Invalid audio volume: {}, using default", self.audio_volume);
            self.audio_volume = defaults.audio_volume;
            has_issues = true;
        }

        if self.reciter.trim().is_empty() {
            log::warn!("Empty reciter id, using default");
            self.reciter = defaults.reciter;
            has_issues = true;
        }

        if self.daily_goal == 0 || self.daily_goal as usize > crate::corpus::TOTAL_VERSES {
            log::warn!("Invalid daily goal: {}, using default", self.daily_goal);
            self.daily_goal = defaults.daily_goal;
            has_issues = true;
        }

        if has_issues {
            log::info!("Preferences validation completed with corrections");
        }
        has_issues
    }

    pub fn adjust_font_size(&mut self, delta: i32) -> u16 {
        let size = (self.font_size as i32 + delta).clamp(MIN_FONT_SIZE as i32, MAX_FONT_SIZE as i32);
        self.font_size = size as u16;
        self.font_size
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.audio_volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            Self::default().audio_volume
        };
        self.audio_volume
    }

    /// Set one preference from user text. Names match case-insensitively
    /// with or without `_`/`-`. Out-of-range values are rejected rather than
    /// reset. Returns the stored name of the key that changed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&'static str> {
        let normalized: String = key
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        let value = value.trim();

        let name = match normalized.as_str() {
            "fontsize" => {
                let size: u16 = parse_value("fontSize", value)?;
                if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
                    return Err(out_of_bounds("fontSize", value, "16..48"));
                }
                self.font_size = size;
                "fontSize"
            }
            "fontfamily" | "font" => {
                if value.is_empty() {
                    return Err(out_of_bounds("fontFamily", value, "a font name"));
                }
                self.font_family = value.to_string();
                "fontFamily"
            }
            "linespacing" => {
                let spacing: f32 = parse_value("lineSpacing", value)?;
                if !spacing.is_finite() || !(1.0..=3.0).contains(&spacing) {
                    return Err(out_of_bounds("lineSpacing", value, "1.0..3.0"));
                }
                self.line_spacing = spacing;
                "lineSpacing"
            }
            "autoplay" => {
                self.auto_play = parse_switch("autoPlay", value)?;
                "autoPlay"
            }
            "wordhighlight" => {
                self.word_highlight = parse_switch("wordHighlight", value)?;
                "wordHighlight"
            }
            "darkmode" | "dark" => {
                self.dark_mode = parse_switch("darkMode", value)?;
                "darkMode"
            }
            "audiospeed" | "speed" => {
                let speed: f32 = parse_value("audioSpeed", value)?;
                if !AUDIO_SPEEDS.contains(&speed) {
                    return Err(out_of_bounds("audioSpeed", value, "0.5, 0.75, 1, 1.25, 1.5 or 2"));
                }
                self.audio_speed = speed;
                "audioSpeed"
            }
            "audiovolume" | "volume" => {
                let volume: f32 = parse_value("audioVolume", value)?;
                if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
                    return Err(out_of_bounds("audioVolume", value, "0..1"));
                }
                self.audio_volume = volume;
                "audioVolume"
            }
            "currentreciter" | "reciter" => {
                let valid = !value.is_empty()
                    && value
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
                if !valid {
                    return Err(out_of_bounds("currentReciter", value, "a reciter id"));
                }
                self.reciter = value.to_string();
                "currentReciter"
            }
            "dailygoal" | "goal" => {
                let goal: u32 = parse_value("dailyGoal", value)?;
                if goal == 0 || goal as usize > crate::corpus::TOTAL_VERSES {
                    return Err(out_of_bounds("dailyGoal", value, "1..6236"));
                }
                self.daily_goal = goal;
                "dailyGoal"
            }
            _ => {
                return Err(CoreError::InvalidPreference(format!(
                    "unknown preference '{}'",
                    key
                )))
            }
        };

        Ok(name)
    }

    /// The current value of a stored preference name, for display.
    pub fn describe(&self, name: &str) -> Option<String> {
        let value = match name {
            "fontSize" => self.font_size.to_string(),
            "fontFamily" => self.font_family.clone(),
            "lineSpacing" => self.line_spacing.to_string(),
            "autoPlay" => self.auto_play.to_string(),
            "wordHighlight" => self.word_highlight.to_string(),
            "audioSpeed" => self.audio_speed.to_string(),
            "audioVolume" => self.audio_volume.to_string(),
            "currentReciter" => self.reciter.clone(),
            "dailyGoal" => self.daily_goal.to_string(),
            "darkMode" => self.dark_mode.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Step to the next playback speed, wrapping after the fastest.
    pub fn cycle_audio_speed(&mut self) -> f32 {
        let next = AUDIO_SPEEDS
            .iter()
            .position(|&s| s == self.audio_speed)
            .map(|i| (i + 1) % AUDIO_SPEEDS.len())
            .unwrap_or(2);
        self.audio_speed = AUDIO_SPEEDS[next];
        self.audio_speed
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CoreError::InvalidPreference(format!("{}: cannot parse '{}'", name, value)))
}

fn parse_switch(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(out_of_bounds(name, value, "on or off")),
    }
}

fn out_of_bounds(name: &str, value: &str, expected: &str) -> CoreError {
    CoreError::InvalidPreference(format!("{}: '{}' is not {}", name, value, expected))
}

/// The slice of preferences carried by backup documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceBackup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl PreferenceBackup {
    pub fn capture(preferences: &Preferences) -> Self {
        Self {
            dark_mode: Some(preferences.dark_mode),
            font_size: Some(preferences.font_size),
            font_family: Some(preferences.font_family.clone()),
        }
    }

    pub fn apply_to(&self, preferences: &mut Preferences) {
        if let Some(dark_mode) = self.dark_mode {
            preferences.dark_mode = dark_mode;
        }
        if let Some(size) = self.font_size {
            preferences.font_size = size;
        }
        if let Some(ref family) = self.font_family {
            preferences.font_family = family.clone();
        }
        preferences.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = Preferences::default();
        assert_eq!(prefs.font_size, 24);
        assert_eq!(prefs.font_family, "Amiri");
        assert!(prefs.tajweed_enabled);
        assert!(!prefs.dark_mode);
        assert_eq!(prefs.reciter, "abdulbasit");
        assert_eq!(prefs.daily_goal, 20);
    }

    #[test]
    fn test_missing_and_unknown_keys() {
        let json = r#"{"fontSize": 30, "currentReciter": "husary", "somethingElse": 1}"#;
        let prefs: Preferences = serde_json::from_str(json).unwrap();
        assert_eq!(prefs.font_size, 30);
        assert_eq!(prefs.reciter, "husary");
        assert_eq!(prefs.audio_volume, 0.8);
        assert!(prefs.word_highlight);
    }

    #[test]
    fn test_validate_resets_out_of_range_values() {
        let json = r#"{"fontSize": 90, "audioVolume": 3.5, "audioSpeed": 1.1, "dailyGoal": 0}"#;
        let mut prefs: Preferences = serde_json::from_str(json).unwrap();
        assert!(prefs.validate());
        assert_eq!(prefs.font_size, 24);
        assert_eq!(prefs.audio_volume, 0.8);
        assert_eq!(prefs.audio_speed, 1.0);
        assert_eq!(prefs.daily_goal, 20);

        assert!(!prefs.validate());
    }

    #[test]
    fn test_font_size_clamps() {
        let mut prefs = Preferences::default();
        prefs.font_size = 46;
        assert_eq!(prefs.adjust_font_size(2), 48);
        assert_eq!(prefs.adjust_font_size(2), 48);
        prefs.font_size = 17;
        assert_eq!(prefs.adjust_font_size(-2), 16);
    }

    #[test]
    fn test_speed_cycle_wraps() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.cycle_audio_speed(), 1.25);
        assert_eq!(prefs.cycle_audio_speed(), 1.5);
        assert_eq!(prefs.cycle_audio_speed(), 2.0);
        assert_eq!(prefs.cycle_audio_speed(), 0.5);
    }

    #[test]
    fn test_set_by_name() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.set("font_family", "Scheherazade").unwrap(), "fontFamily");
        assert_eq!(prefs.set("Reciter", "husary").unwrap(), "currentReciter");
        assert_eq!(prefs.set("daily-goal", "50").unwrap(), "dailyGoal");
        assert_eq!(prefs.set("lineSpacing", "1.5").unwrap(), "lineSpacing");
        prefs.set("autoplay", "on").unwrap();
        prefs.set("wordHighlight", "off").unwrap();

        assert_eq!(prefs.font_family, "Scheherazade");
        assert_eq!(prefs.reciter, "husary");
        assert_eq!(prefs.daily_goal, 50);
        assert_eq!(prefs.line_spacing, 1.5);
        assert!(prefs.auto_play);
        assert!(!prefs.word_highlight);
        assert_eq!(prefs.describe("dailyGoal").as_deref(), Some("50"));
        assert!(!prefs.validate());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut prefs = Preferences::default();
        for (key, value) in [
            ("fontSize", "90"),
            ("lineSpacing", "abc"),
            ("audioSpeed", "1.1"),
            ("dailyGoal", "0"),
            ("reciter", "../x"),
            ("autoPlay", "maybe"),
            ("colour", "red"),
        ] {
            let err = prefs.set(key, value).unwrap_err();
            assert!(matches!(err, CoreError::InvalidPreference(_)), "{}", key);
        }
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_every_settable_key_is_described() {
        let prefs = Preferences::default();
        for key in SETTABLE_KEYS {
            assert!(prefs.describe(key).is_some(), "{}", key);
        }
    }

    #[test]
    fn test_backup_subset_applies_present_fields_only() {
        let mut prefs = Preferences::default();
        let backup: PreferenceBackup = serde_json::from_str(r#"{"darkMode": true}"#).unwrap();
        backup.apply_to(&mut prefs);
        assert!(prefs.dark_mode);
        assert_eq!(prefs.font_size, 24);
        assert_eq!(prefs.font_family, "Amiri");
    }
}
