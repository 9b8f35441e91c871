// src/models/config.rs

//! Application configuration record.
//!
//! Persisted as JSON at `~/.leetcode-scraper/config.json` and loaded at
//! startup; every field is optional on disk and falls back to the
//! defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LEETCODE_SESSION cookie value, pasted from a logged-in browser
    #[serde(default)]
    pub leetcode_cookie: String,

    /// Root directory of the archive
    #[serde(default = "defaults::save_directory")]
    pub save_directory: PathBuf,

    /// Cache raw API responses on disk
    #[serde(default = "defaults::cache_api_calls")]
    pub cache_api_calls: bool,

    /// Days before a cached response expires
    #[serde(default = "defaults::cache_expiration_days")]
    pub cache_expiration_days: u32,

    /// Regenerate documents that already exist on disk
    #[serde(default)]
    pub overwrite: bool,

    /// Playground languages to keep, in order; "all" keeps everything
    #[serde(default = "defaults::preferred_language_order")]
    pub preferred_language_order: Vec<String>,

    /// Recent accepted submissions to embed per question (0 disables)
    #[serde(default)]
    pub include_submissions_count: u32,

    /// Community solutions to feed the AI generator (0 disables)
    #[serde(default)]
    pub include_community_solution_count: u32,

    /// Embed the default code stubs section
    #[serde(default = "defaults::include_default_code")]
    pub include_default_code: bool,

    /// Explode animated GIFs into per-frame PNGs
    #[serde(default)]
    pub extract_gif_frames: bool,

    /// Image formats to recompress after download
    #[serde(default)]
    pub recompress_image_formats: Vec<RecompressFormat>,

    /// Inline downloaded images as base64 data URLs
    #[serde(default)]
    pub base64_encode_image: bool,

    /// Which referenced images to download
    #[serde(default)]
    pub download_images: DownloadImages,

    /// Download embedded videos through the external media tool
    #[serde(default)]
    pub download_videos: bool,

    /// Which questions to regenerate during bulk runs
    #[serde(default)]
    pub download_questions: DownloadQuestions,

    /// Parallel conversions during the PDF pass
    #[serde(default = "defaults::threads_count_for_pdf_conversion")]
    pub threads_count_for_pdf_conversion: usize,

    /// Consecutive transport failures before the circuit opens
    #[serde(default = "defaults::api_max_failures")]
    pub api_max_failures: u32,

    /// Solution generator for questions without an official editorial
    #[serde(default)]
    pub ai_solution_generator: AiBackend,

    /// OpenAI credentials, used when the generator is "openai"
    #[serde(default)]
    pub open_ai_api_key: String,
    #[serde(default = "defaults::open_ai_model")]
    pub open_ai_model: String,

    /// Ollama endpoint, used when the generator is "ollama"
    #[serde(default = "defaults::ollama_url")]
    pub ollama_url: String,
    #[serde(default)]
    pub ollama_model: String,
}

impl Config {
    /// Default config file location, `~/.leetcode-scraper/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leetcode-scraper")
            .join("config.json")
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Write the configuration as pretty JSON, creating parent dirs.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.save_directory.as_os_str().is_empty() {
            return Err(AppError::config("save_directory is empty"));
        }
        if self.cache_expiration_days == 0 {
            return Err(AppError::config("cache_expiration_days must be > 0"));
        }
        if self.api_max_failures == 0 {
            return Err(AppError::config("api_max_failures must be > 0"));
        }
        if !(1..=128).contains(&self.threads_count_for_pdf_conversion) {
            return Err(AppError::config(
                "threads_count_for_pdf_conversion must be in 1..=128",
            ));
        }
        if self.preferred_language_order.is_empty() {
            return Err(AppError::config("preferred_language_order is empty"));
        }
        match self.ai_solution_generator {
            AiBackend::OpenAi if self.open_ai_api_key.trim().is_empty() => {
                return Err(AppError::config(
                    "open_ai_api_key is required for the openai generator",
                ));
            }
            AiBackend::Ollama if self.ollama_model.trim().is_empty() => {
                return Err(AppError::config(
                    "ollama_model is required for the ollama generator",
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Cookie header value, when one was configured.
    pub fn cookie(&self) -> Option<&str> {
        let trimmed = self.leetcode_cookie.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn questions_dir(&self) -> PathBuf {
        self.save_directory.join("questions")
    }

    pub fn cards_dir(&self) -> PathBuf {
        self.save_directory.join("cards")
    }

    pub fn companies_dir(&self) -> PathBuf {
        self.save_directory.join("companies")
    }

    pub fn submissions_dir(&self) -> PathBuf {
        self.save_directory.join("submissions")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.save_directory.join("pdf")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.save_directory.join("cache")
    }

    /// Whether the recompression pass applies to the given format.
    pub fn recompress(&self, format: RecompressFormat) -> bool {
        self.recompress_image_formats
            .iter()
            .any(|f| *f == RecompressFormat::All || *f == format)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            leetcode_cookie: String::new(),
            save_directory: defaults::save_directory(),
            cache_api_calls: defaults::cache_api_calls(),
            cache_expiration_days: defaults::cache_expiration_days(),
            overwrite: false,
            preferred_language_order: defaults::preferred_language_order(),
            include_submissions_count: 0,
            include_community_solution_count: 0,
            include_default_code: defaults::include_default_code(),
            extract_gif_frames: false,
            recompress_image_formats: Vec::new(),
            base64_encode_image: false,
            download_images: DownloadImages::default(),
            download_videos: false,
            download_questions: DownloadQuestions::default(),
            threads_count_for_pdf_conversion: defaults::threads_count_for_pdf_conversion(),
            api_max_failures: defaults::api_max_failures(),
            ai_solution_generator: AiBackend::default(),
            open_ai_api_key: String::new(),
            open_ai_model: defaults::open_ai_model(),
            ollama_url: defaults::ollama_url(),
            ollama_model: String::new(),
        }
    }
}

/// Image download policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadImages {
    /// Leave references to the remote originals
    None,
    /// Download images that are not on disk yet
    #[default]
    New,
    /// Re-download every referenced image
    Always,
}

/// Question regeneration policy for bulk runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadQuestions {
    /// Skip questions whose document already exists
    #[default]
    New,
    /// Regenerate everything
    Always,
}

/// AI solution generator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiBackend {
    #[default]
    None,
    OpenAi,
    Ollama,
}

/// Image formats eligible for recompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecompressFormat {
    All,
    Png,
    Jpg,
    Webp,
}

mod defaults {
    use std::path::PathBuf;

    pub fn save_directory() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leetcode-archive")
    }
    pub fn cache_api_calls() -> bool {
        true
    }
    pub fn cache_expiration_days() -> u32 {
        7
    }
    pub fn preferred_language_order() -> Vec<String> {
        vec!["all".to_string()]
    }
    pub fn include_default_code() -> bool {
        true
    }
    pub fn threads_count_for_pdf_conversion() -> usize {
        8
    }
    pub fn api_max_failures() -> u32 {
        3
    }
    pub fn open_ai_model() -> String {
        "gpt-4o-mini".to_string()
    }
    pub fn ollama_url() -> String {
        "http://localhost:11434".to_string()
    }
}
