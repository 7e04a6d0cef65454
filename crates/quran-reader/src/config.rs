use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::try_exists;

pub const MIN_WRAP_WIDTH: usize = 20;
pub const MAX_WRAP_WIDTH: usize = 400;

/// Missing fields take their value from `Config::default()`, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bootstrap corpus document. Defaults to `quran.json` in the data root.
    pub corpus_path: Option<PathBuf>,
    /// Root of the tafsir, translation and word-by-word documents.
    pub aux_data_dir: Option<PathBuf>,
    pub tafsir_variant: String,
    pub translation_variant: String,
    pub wrap_width: usize,
    pub show_translation_inline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_path: None,
            aux_data_dir: None,
            tafsir_variant: String::from("ibn-kathir"),
            translation_variant: String::from("en"),
            wrap_width: 80,
            show_translation_inline: false,
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if try_exists(&config_path).await? {
                match tokio::fs::read_to_string(&config_path).await {
                    Ok(content) => {
                        if content.trim().is_empty() {
                            log::warn!("Config file is empty, creating new one");
                            let default_config = Self::default();
                            let _ = default_config.save().await;
                            return Ok(default_config);
                        }

                        match serde_json::from_str::<Self>(&content) {
                            Ok(mut config) => {
                                config.validate()?;
                                log::info!(
                                    "Successfully loaded config from: {}",
                                    config_path.display()
                                );
                                return Ok(config);
                            }
                            Err(json_err) => {
                                log::error!("Failed to parse config file: {}", json_err);

                                let backup_path = config_path.with_extension("bak");
                                if let Err(e) = tokio::fs::copy(&config_path, &backup_path).await {
                                    log::warn!("Failed to backup broken config: {}", e);
                                } else {
                                    log::info!(
                                        "Backed up broken config to: {}",
                                        backup_path.display()
                                    );
                                }

                                let default_config = Self::default();
                                let _ = default_config.save().await;
                                return Ok(default_config);
                            }
                        }
                    }
                    Err(io_err) => {
                        log::error!("Failed to read config file: {}", io_err);
                    }
                }
            } else {
                log::info!("Config file does not exist, creating default");
            }
        }

        let default_config = Self::default();
        let _ = default_config.save().await;
        Ok(default_config)
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_path() {
            let mut config_to_save = self.clone();
            config_to_save.validate()?;

            if let Some(parent) = config_path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to create config directory: {} - {}",
                        parent.display(),
                        e
                    )
                })?;
            }

            let content = serde_json::to_string_pretty(&config_to_save)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            tokio::fs::write(&config_path, content).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to write config file: {} - {}",
                    config_path.display(),
                    e
                )
            })?;
            log::info!("Successfully saved config to: {}", config_path.display());
        }
        Ok(())
    }

    /// Validate configuration values and fix invalid ones
    pub fn validate(&mut self) -> Result<()> {
        let defaults = Self::default();
        let mut has_issues = false;

        if !(MIN_WRAP_WIDTH..=MAX_WRAP_WIDTH).contains(&self.wrap_width) {
            log::warn!("Invalid wrap width: {}, using default", self.wrap_width);
            self.wrap_width = defaults.wrap_width;
            has_issues = true;
        }

        if !is_variant_name(&self.tafsir_variant) {
            log::warn!("Invalid tafsir variant: '{}', using default", self.tafsir_variant);
            self.tafsir_variant = defaults.tafsir_variant;
            has_issues = true;
        }

        if !is_variant_name(&self.translation_variant) {
            log::warn!(
                "Invalid translation variant: '{}', using default",
                self.translation_variant
            );
            self.translation_variant = defaults.translation_variant;
            has_issues = true;
        }

        if has_issues {
            log::info!("Configuration validation completed with corrections");
        }

        Ok(())
    }

    pub fn aux_root(&self) -> PathBuf {
        self.aux_data_dir.clone().unwrap_or_else(data_root)
    }

    pub fn corpus_source(&self) -> PathBuf {
        self.corpus_path
            .clone()
            .unwrap_or_else(|| self.aux_root().join("quran.json"))
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("QURAN_READER_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("QURAN_READER_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }

        ProjectDirs::from("com", "quran-reader", "quran-reader")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

fn is_variant_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Where bundled data lives when the config does not say.
fn data_root() -> PathBuf {
    if let Ok(dir) = std::env::var("QURAN_READER_DATA_DIR") {
        return PathBuf::from(dir);
    }
    ProjectDirs::from("com", "quran-reader", "quran-reader")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}
