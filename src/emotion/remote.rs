//! Remote emotion classifier backed by an HTTP inference endpoint.
//!
//! The image is sent as PNG with a bearer token; the endpoint answers with a
//! list of `{label, score}` pairs (optionally nested per detected face).
//! Transient failures are retried a bounded number of times; malformed
//! responses and client errors are not.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::confidence::Confidence;
use super::label::EmotionLabel;
use super::provider::{
    Classification, ClassifierKind, ClassifyError, EmotionClassifier, EmotionScore,
};

/// Default per-attempt timeout for inference requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of attempts (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound on attempts, whatever the config asks for
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Maximum backoff delay
const MAX_BACKOFF_MS: u64 = 5000;

/// Errors building a [`RemoteClassifier`]
#[derive(Debug, Error)]
pub enum RemoteSetupError {
    #[error("Invalid inference endpoint '{0}': {1}")]
    InvalidUrl(String, String),

    #[error("API token is required for the remote classifier")]
    MissingToken,

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct RawScore {
    label: String,
    score: f32,
}

/// Shapes the inference endpoint may answer with
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Flat(Vec<RawScore>),
    PerFace(Vec<Vec<RawScore>>),
    Error { error: String },
}

/// Check if a reqwest error is retryable (transient network issues)
fn is_retryable_error(err: &reqwest::Error) -> bool {
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    if let Some(status) = err.status() {
        return is_retryable_status(status);
    }
    false
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

/// Exponential backoff with a little jitter
fn calculate_backoff(attempt: u32, initial: Duration) -> Duration {
    let initial_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
    let base_delay = initial_ms.saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = base_delay.min(MAX_BACKOFF_MS);
    let jitter = (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_millis() as u64)
        % 100;
    Duration::from_millis(capped_delay + jitter.min(capped_delay / 5))
}

/// Parse an inference response body into scores.
///
/// Returns an empty list when the endpoint saw no face.
pub fn parse_response(body: &str) -> Result<Vec<EmotionScore>, ClassifyError> {
    let parsed: InferenceResponse = serde_json::from_str(body).map_err(|e| {
        ClassifyError::Classification(format!("Failed to parse inference response: {}", e))
    })?;

    let raw = match parsed {
        InferenceResponse::Flat(scores) => scores,
        InferenceResponse::PerFace(faces) => {
            if faces.len() > 1 {
                debug!("{} faces detected, using the first", faces.len());
            }
            faces.into_iter().next().unwrap_or_default()
        }
        InferenceResponse::Error { error } => {
            return Err(ClassifyError::Classification(format!(
                "Inference endpoint error: {}",
                error
            )));
        }
    };

    if raw.is_empty() {
        return Ok(Vec::new());
    }

    // Some providers report percentages
    let is_percentage = raw.iter().any(|s| s.score > 1.0);

    let scores: Vec<EmotionScore> = raw
        .iter()
        .filter_map(|s| {
            let label = match s.label.parse::<EmotionLabel>() {
                Ok(label) => label,
                Err(_) => {
                    warn!("Ignoring unrecognised emotion label '{}'", s.label);
                    return None;
                }
            };
            let score = if is_percentage {
                Confidence::from_percentage(s.score)
            } else {
                Confidence::from_fraction(s.score)
            }?;
            Some(EmotionScore::new(label, score))
        })
        .collect();

    if scores.is_empty() {
        return Err(ClassifyError::Classification(format!(
            "No recognised emotion labels in response ({} entries)",
            raw.len()
        )));
    }

    Ok(scores)
}

/// Encode an image as PNG for upload
fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ClassifyError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ClassifyError::InvalidImage(format!("Failed to encode image: {}", e)))?;
    Ok(buf.into_inner())
}

/// Delegated classifier that calls an HTTP inference endpoint
#[derive(Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl RemoteClassifier {
    /// Create a new remote classifier with URL validation
    ///
    /// # Arguments
    /// * `endpoint` - Inference URL (http or https)
    /// * `api_token` - Bearer token for the endpoint
    /// * `timeout` - Per-attempt request timeout
    /// * `max_attempts` - Total attempts including the first, clamped to
    ///   `1..=MAX_ATTEMPTS_LIMIT`
    pub fn new(
        endpoint: &str,
        api_token: &str,
        timeout: Duration,
        max_attempts: u32,
    ) -> Result<Self, RemoteSetupError> {
        let cleaned_url = endpoint.trim();

        let parsed = reqwest::Url::parse(cleaned_url)
            .map_err(|e| RemoteSetupError::InvalidUrl(cleaned_url.to_string(), e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RemoteSetupError::InvalidUrl(
                cleaned_url.to_string(),
                format!("scheme must be http or https, got {}", parsed.scheme()),
            ));
        }

        if api_token.trim().is_empty() {
            return Err(RemoteSetupError::MissingToken);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()?;

        info!("RemoteClassifier created for {}", parsed.host_str().unwrap_or(cleaned_url));

        let clamped_attempts = max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT);
        if clamped_attempts != max_attempts {
            warn!(
                "max_attempts {} out of range, using {}",
                max_attempts, clamped_attempts
            );
        }

        Ok(Self {
            client,
            endpoint: cleaned_url.to_string(),
            api_token: api_token.trim().to_string(),
            max_attempts: clamped_attempts,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first retry delay (later retries double it)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Send the encoded image, retrying transient failures.
    /// Returns the response body of the first successful attempt.
    async fn post_with_retry(&self, body: Vec<u8>) -> Result<String, ClassifyError> {
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_token)).map_err(|_| {
            ClassifyError::Classification("API token contains invalid characters".to_string())
        })?;

        let mut last_error = String::new();

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = calculate_backoff(attempt - 1, self.initial_backoff);
                warn!(
                    "Inference attempt {} failed, retrying in {:?}",
                    attempt, backoff
                );
                tokio::time::sleep(backoff).await;
            }

            let result = self
                .client
                .post(&self.endpoint)
                .header(AUTHORIZATION, auth.clone())
                .header(CONTENT_TYPE, HeaderValue::from_static("image/png"))
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| {
                            ClassifyError::Classification(format!(
                                "Failed to read inference response: {}",
                                e
                            ))
                        });
                    }

                    let text = response.text().await.unwrap_or_default();
                    let detail = error_detail(&text);
                    if is_retryable_status(status) {
                        last_error = format!("Inference endpoint returned {}: {}", status, detail);
                        continue;
                    }
                    return Err(ClassifyError::Classification(format!(
                        "Inference endpoint returned {}: {}",
                        status, detail
                    )));
                }
                Err(e) => {
                    if is_retryable_error(&e) {
                        last_error = format!("Failed to reach inference endpoint: {}", e);
                        continue;
                    }
                    return Err(ClassifyError::Classification(format!(
                        "Failed to reach inference endpoint: {}",
                        e
                    )));
                }
            }
        }

        error!(
            "Inference failed after {} attempts: {}",
            self.max_attempts, last_error
        );
        Err(ClassifyError::Classification(last_error))
    }
}

/// Pull a short error message out of a failed response body
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(e) => e.error,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[async_trait]
impl EmotionClassifier for RemoteClassifier {
    async fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifyError> {
        let start_time = std::time::Instant::now();
        let body = encode_png(image)?;

        debug!(
            "Sending {}x{} image ({} bytes) to inference endpoint",
            image.width(),
            image.height(),
            body.len()
        );

        let text = self.post_with_retry(body).await?;
        let scores = parse_response(&text)?;
        let classification = Classification::from_scores(scores, ClassifierKind::Remote)?;

        debug!(
            "Remote classification complete in {:?}: {} ({})",
            start_time.elapsed(),
            classification.label,
            classification.confidence
        );

        Ok(classification)
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Remote
    }
}
