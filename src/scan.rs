//! Scan service: image → text → verdict, with retry, a time budget, and
//! the learner as a side channel.
//!
//! One [`ScanService`] is shared by the HTTP server and the CLI. A scan
//! runs these steps inside a single `scan.timeout_secs` budget:
//!
//! 1. text extraction through the configured [`TextExtractor`] (retried on
//!    transient failures)
//! 2. segmentation, extraction, and the quality gate
//! 3. reference load (retried on transient failures)
//! 4. matching, rules, and aggregation
//!
//! Once a verdict exists, novel names are handed to the learner on a
//! spawned task. The caller gets the task handle and decides whether to
//! wait for it.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use tokio::task::JoinHandle;

use halal_scan_core::learner::{learn, LearnReport};
use halal_scan_core::models::ProductVerdict;
use halal_scan_core::store::{CandidateStore, ReferenceStore};
use halal_scan_core::{Classification, Pipeline, PipelineError};

use crate::config::{Config, LearnerConfig};
use crate::db;
use crate::migrate::run_migrations;
use crate::ocr::{create_extractor, DisabledExtractor, TextExtractor};
use crate::retry::{with_retry, RetryPolicy};
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("missing or invalid base64 image string")]
    InvalidImage,

    #[error("no text detected in the image")]
    NoText,

    #[error("image too unclear: gibberish ratio {ratio:.2} exceeds {threshold:.2}")]
    LowQuality { ratio: f64, threshold: f64 },

    #[error("collaborator call failed: {0:#}")]
    Collaborator(#[source] anyhow::Error),

    #[error("scan exceeded its {}s time budget", .0.as_secs())]
    Timeout(Duration),
}

impl From<PipelineError> for ScanError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::LowQuality { ratio, threshold } => {
                ScanError::LowQuality { ratio, threshold }
            }
            PipelineError::ReferenceStore(e) => ScanError::Collaborator(e),
        }
    }
}

/// A verdict plus the learner task it started, if any.
pub struct ScanOutcome {
    pub verdict: ProductVerdict,
    pub learner: Option<JoinHandle<LearnReport>>,
}

pub struct ScanService {
    pipeline: Arc<Pipeline>,
    extractor: Arc<dyn TextExtractor>,
    references: Arc<dyn ReferenceStore>,
    candidates: Arc<dyn CandidateStore>,
    ocr_retry: RetryPolicy,
    store_retry: RetryPolicy,
    timeout: Duration,
    learner: LearnerConfig,
}

impl ScanService {
    pub fn new(
        pipeline: Arc<Pipeline>,
        extractor: Arc<dyn TextExtractor>,
        references: Arc<dyn ReferenceStore>,
        candidates: Arc<dyn CandidateStore>,
    ) -> Self {
        Self {
            pipeline,
            extractor,
            references,
            candidates,
            ocr_retry: RetryPolicy::none(),
            store_retry: RetryPolicy::none(),
            timeout: Duration::from_secs(30),
            learner: LearnerConfig::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, ocr: RetryPolicy, store: RetryPolicy) -> Self {
        self.ocr_retry = ocr;
        self.store_retry = store;
        self
    }

    pub fn with_learner(mut self, learner: LearnerConfig) -> Self {
        self.learner = learner;
        self
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Scans a base64 image string as received over HTTP. A
    /// `data:<mime>;base64,` prefix and embedded whitespace are tolerated.
    pub async fn scan_base64(&self, payload: &str) -> Result<ScanOutcome, ScanError> {
        let image = decode_image(payload)?;
        self.scan_image(&image).await
    }

    pub async fn scan_image(&self, image: &[u8]) -> Result<ScanOutcome, ScanError> {
        if image.is_empty() {
            return Err(ScanError::InvalidImage);
        }
        tracing::info!(
            image_bytes = image.len(),
            extractor = self.extractor.name(),
            "scan accepted"
        );

        let classification = self
            .within_budget(async {
                let text = with_retry(&self.ocr_retry, "text extraction", || {
                    self.extractor.extract_text(image)
                })
                .await
                .map_err(|e| ScanError::Collaborator(e.into()))?;

                if text.trim().is_empty() {
                    return Err(ScanError::NoText);
                }
                self.classify_gated(&text).await
            })
            .await?;

        Ok(self.finish(classification))
    }

    /// Runs the pipeline on already-extracted label text.
    pub async fn classify_text(&self, text: &str) -> Result<ScanOutcome, ScanError> {
        let classification = self.within_budget(self.classify_gated(text)).await?;
        Ok(self.finish(classification))
    }

    async fn classify_gated(&self, text: &str) -> Result<Classification, ScanError> {
        let candidates = self.pipeline.prepare(text).map_err(|e| {
            if let PipelineError::LowQuality { ratio, threshold } = &e {
                tracing::info!(ratio, threshold, "scan rejected as low quality");
            }
            ScanError::from(e)
        })?;

        let references = with_retry(&self.store_retry, "reference load", || {
            self.references.list_references()
        })
        .await
        .map_err(ScanError::Collaborator)?;

        Ok(self.pipeline.classify_candidates(&candidates, &references))
    }

    async fn within_budget<T, F>(&self, fut: F) -> Result<T, ScanError>
    where
        F: Future<Output = Result<T, ScanError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ScanError::Timeout(self.timeout))?
    }

    fn finish(&self, classification: Classification) -> ScanOutcome {
        let Classification { verdict, novel, .. } = classification;

        let learner = if self.learner.enabled && !novel.is_empty() {
            let store = Arc::clone(&self.candidates);
            let source = self.learner.source.clone();
            Some(tokio::spawn(async move {
                learn(store.as_ref(), &novel, &source).await
            }))
        } else {
            None
        };

        ScanOutcome { verdict, learner }
    }
}

/// Decodes the `image` field of a scan request.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, ScanError> {
    let payload = payload.trim();
    let data = match payload.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((meta, data)) if meta.ends_with(";base64") => data,
            _ => return Err(ScanError::InvalidImage),
        },
        None => payload,
    };

    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| ScanError::InvalidImage)?;
    if bytes.is_empty() {
        return Err(ScanError::InvalidImage);
    }
    Ok(bytes)
}

/// Wires a [`ScanService`] to the configured SQLite database.
pub async fn build_service(
    config: &Config,
    extractor: Arc<dyn TextExtractor>,
) -> anyhow::Result<ScanService> {
    run_migrations(config).await?;
    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteStore::new(pool));
    let pipeline = Pipeline::new(config.pipeline.clone())?;

    let base_delay = Duration::from_millis(config.scan.retry_base_delay_ms);
    Ok(ScanService::new(Arc::new(pipeline), extractor, store.clone(), store)
        .with_timeout(Duration::from_secs(config.scan.timeout_secs))
        .with_retry(
            RetryPolicy::new(config.ocr.max_retries, base_delay),
            RetryPolicy::new(config.scan.store_max_retries, base_delay),
        )
        .with_learner(config.learner.clone()))
}

async fn report_outcome(outcome: ScanOutcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.verdict)?);

    if let Some(handle) = outcome.learner {
        let report = handle.await.context("learner task failed")?;
        eprintln!(
            "learner: {} new, {} already known, {} failed",
            report.inserted, report.already_known, report.failed
        );
    }
    Ok(())
}

/// `halal-scan classify <text-file>`: runs the pipeline on label text
/// without OCR. Learning is off unless `learn` is set.
pub async fn run_classify_file(config: &Config, path: &Path, learn: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read label text: {}", path.display()))?;

    let learner = LearnerConfig {
        enabled: learn,
        ..config.learner.clone()
    };
    let service = build_service(config, Arc::new(DisabledExtractor))
        .await?
        .with_learner(learner);

    let outcome = service.classify_text(&text).await?;
    report_outcome(outcome).await
}

/// `halal-scan scan <image-file>`: OCR plus pipeline on a local image.
pub async fn run_scan_image(config: &Config, path: &Path) -> anyhow::Result<()> {
    let image = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;

    let extractor = create_extractor(&config.ocr)?;
    let service = build_service(config, extractor).await?;

    let outcome = service.scan_image(&image).await?;
    report_outcome(outcome).await
}
