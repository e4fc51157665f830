//! Text-extraction (OCR) providers.
//!
//! Defines the [`TextExtractor`] trait and concrete implementations:
//! - **[`DisabledExtractor`]**: every call fails; used when OCR is not configured.
//! - **[`HttpExtractor`]**: posts `{ "image": <base64> }` to a configured URL
//!   and reads the `text` field of the JSON reply.
//! - **[`GoogleVisionExtractor`]**: calls Cloud Vision `images:annotate`
//!   with `TEXT_DETECTION`.
//!
//! Use [`create_extractor`] to build the provider named in `[ocr]`.
//!
//! # Failure classes
//!
//! Each call makes exactly one request; retrying is the caller's job (see
//! [`crate::retry`]). Failures are classified so the caller knows whether
//! a retry can help:
//! - network error, timeout, HTTP 429, HTTP 5xx → [`OcrError::Transient`]
//! - other HTTP 4xx, malformed response body → [`OcrError::Permanent`]

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::OcrConfig;
use crate::retry::Transient;

pub const GOOGLE_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("text extraction is disabled")]
    Disabled,

    #[error("transient OCR failure: {0}")]
    Transient(String),

    #[error("OCR request failed: {0}")]
    Permanent(String),
}

impl Transient for OcrError {
    fn is_transient(&self) -> bool {
        matches!(self, OcrError::Transient(_))
    }
}

/// Turns image bytes into the provider's best-guess full text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError>;
}

pub fn create_extractor(config: &OcrConfig) -> anyhow::Result<Arc<dyn TextExtractor>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledExtractor)),
        "http" => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("ocr.url required for http provider"))?;
            Ok(Arc::new(HttpExtractor::new(url, config.timeout_secs)?))
        }
        "google-vision" => {
            let api_key = std::env::var("GOOGLE_VISION_API_KEY")
                .map_err(|_| anyhow::anyhow!("GOOGLE_VISION_API_KEY environment variable not set"))?;
            let endpoint = config
                .url
                .clone()
                .unwrap_or_else(|| GOOGLE_VISION_ENDPOINT.to_string());
            Ok(Arc::new(GoogleVisionExtractor::new(
                endpoint,
                api_key,
                config.timeout_secs,
            )?))
        }
        other => bail!("Unknown OCR provider: {}", other),
    }
}

// ============ Disabled ============

pub struct DisabledExtractor;

#[async_trait]
impl TextExtractor for DisabledExtractor {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn extract_text(&self, _image: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::Disabled)
    }
}

// ============ Generic HTTP ============

/// Provider for a self-hosted OCR endpoint.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpExtractor {
    pub fn new(url: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TextExtractor for HttpExtractor {
    fn name(&self) -> &str {
        "http"
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let body = json!({ "image": STANDARD.encode(image) });
        let reply = post_json(&self.client, &self.url, &body).await?;
        parse_http_response(&reply)
    }
}

fn parse_http_response(json: &Value) -> Result<String, OcrError> {
    json.get("text")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| OcrError::Permanent("invalid OCR response: missing text field".to_string()))
}

// ============ Google Cloud Vision ============

pub struct GoogleVisionExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionExtractor {
    pub fn new(endpoint: String, api_key: String, timeout_secs: u64) -> anyhow::Result<Self> {
        if api_key.trim().is_empty() {
            bail!("Google Vision API key must not be empty");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TextExtractor for GoogleVisionExtractor {
    fn name(&self) -> &str {
        "google-vision"
    }

    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "TEXT_DETECTION" }],
            }]
        });
        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let reply = post_json(&self.client, &url, &body).await?;
        parse_vision_response(&reply)
    }
}

/// Reads the detected text from an `images:annotate` reply.
///
/// Prefers `fullTextAnnotation.text`, falls back to the first
/// `textAnnotations[].description`, and returns an empty string when the
/// image simply contained no text.
fn parse_vision_response(json: &Value) -> Result<String, OcrError> {
    let first = json
        .get("responses")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .ok_or_else(|| {
            OcrError::Permanent("invalid Vision response: missing responses array".to_string())
        })?;

    if let Some(message) = first
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(OcrError::Permanent(format!("Vision API error: {}", message)));
    }

    if let Some(text) = first
        .get("fullTextAnnotation")
        .and_then(|a| a.get("text"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }

    Ok(first
        .get("textAnnotations")
        .and_then(|a| a.as_array())
        .and_then(|a| a.first())
        .and_then(|a| a.get("description"))
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string())
}

// ============ Transport ============

async fn post_json(client: &reqwest::Client, url: &str, body: &Value) -> Result<Value, OcrError> {
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| OcrError::Transient(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(|e| OcrError::Permanent(format!("malformed OCR response: {}", e)));
    }

    let body_text = response.text().await.unwrap_or_default();
    Err(status_error(status, &body_text))
}

fn status_error(status: StatusCode, body: &str) -> OcrError {
    let message = format!("OCR API error {}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        OcrError::Transient(message)
    } else {
        OcrError::Permanent(message)
    }
}
