//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/halal-scan.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [ocr]
//! provider = "google-vision"   # or "http", "disabled"
//!
//! [pipeline]
//! match_strategy = "substring" # or "exact", "token-set", "edit-distance"
//!
//! [pipeline.lexicon]
//! generic_terms = ["vitamins", "spices", "seasoning"]
//! ```
//!
//! Every section except `[db]` is optional.

use anyhow::{Context, Result};
use halal_scan_core::learner::DEFAULT_SOURCE;
use halal_scan_core::pipeline::PipelineSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub learner: LearnerConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_provider")]
    pub provider: String,
    /// Endpoint for the `http` provider; optional override for `google-vision`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_ocr_max_retries")]
    pub max_retries: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: default_ocr_provider(),
            url: None,
            timeout_secs: default_ocr_timeout_secs(),
            max_retries: default_ocr_max_retries(),
        }
    }
}

fn default_ocr_provider() -> String {
    "disabled".to_string()
}
fn default_ocr_timeout_secs() -> u64 {
    20
}
fn default_ocr_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// End-to-end budget for text extraction, reference load, and classification.
    #[serde(default = "default_scan_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_store_max_retries")]
    pub store_max_retries: u32,
    /// First backoff delay; doubles per attempt.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_scan_timeout_secs(),
            store_max_retries: default_store_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_scan_timeout_secs() -> u64 {
    30
}
fn default_store_max_retries() -> u32 {
    2
}
fn default_retry_base_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct LearnerConfig {
    #[serde(default = "default_learner_enabled")]
    pub enabled: bool,
    #[serde(default = "default_learner_source")]
    pub source: String,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            enabled: default_learner_enabled(),
            source: default_learner_source(),
        }
    }
}

fn default_learner_enabled() -> bool {
    true
}
fn default_learner_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/halal-scan.sqlite"),
                max_connections: default_max_connections(),
            },
            server: ServerConfig::default(),
            ocr: OcrConfig::default(),
            scan: ScanConfig::default(),
            learner: LearnerConfig::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }
    if config.server.max_body_bytes == 0 {
        anyhow::bail!("server.max_body_bytes must be > 0");
    }

    match config.ocr.provider.as_str() {
        "disabled" | "google-vision" => {}
        "http" => {
            if config.ocr.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                anyhow::bail!("ocr.url must be set when provider is 'http'");
            }
        }
        other => anyhow::bail!(
            "Unknown OCR provider: '{}'. Must be disabled, http, or google-vision.",
            other
        ),
    }
    if config.ocr.timeout_secs == 0 {
        anyhow::bail!("ocr.timeout_secs must be > 0");
    }

    if config.scan.timeout_secs == 0 {
        anyhow::bail!("scan.timeout_secs must be > 0");
    }

    if config.learner.source.trim().is_empty() {
        anyhow::bail!("learner.source must not be empty");
    }

    let quality = &config.pipeline.quality;
    if !(quality.reject_ratio > 0.0 && quality.reject_ratio <= 1.0) {
        anyhow::bail!("pipeline.quality.reject_ratio must be in (0.0, 1.0]");
    }
    if quality.max_chars == 0 || quality.max_words == 0 || quality.min_letter_run == 0 {
        anyhow::bail!("pipeline.quality limits must be > 0");
    }

    config.pipeline.lexicon.validate()?;
    Ok(())
}
