use crate::error::{CaptionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    /// Longest image edge sent to the model (px)
    pub max_image_size: u32,
    /// Images forwarded per object group
    pub max_images_per_object: usize,
    /// Requests per pacing window
    pub rate_limit_batch: usize,
    pub rate_limit_window_secs: u64,
    /// Extra pause after a failed object
    pub failure_pause_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash-lite".into(),
            max_image_size: 2000,
            max_images_per_object: museum_caption_common::identity::DEFAULT_MAX_IMAGES,
            rate_limit_batch: 5,
            rate_limit_window_secs: 25,
            failure_pause_secs: 5,
            max_retries: 3,
            temperature: 0.4,
            timeout_seconds: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CaptionError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("museum-caption").join("config.json"))
    }

    /// API key from the environment (including `.env`), then the config file.
    pub fn get_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CaptionError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}
