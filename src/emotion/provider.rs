//! Classifier abstraction shared by the local and remote emotion classifiers.

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::confidence::Confidence;
use super::label::EmotionLabel;

/// Errors that can occur during emotion classification
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The image could not be used at all (empty, undecodable)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The classifier ran but found no usable face
    #[error("No face detected")]
    NoFaceDetected,

    /// The classifier itself failed (network, provider error, bad response)
    #[error("Classification failed: {0}")]
    Classification(String),
}

/// Which classifier produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Rule,
    Remote,
}

impl Default for ClassifierKind {
    fn default() -> Self {
        Self::Rule
    }
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule" | "rule-based" | "local" => Ok(Self::Rule),
            "remote" | "api" => Ok(Self::Remote),
            _ => Err(format!("Unknown classifier: {}", s)),
        }
    }
}

/// One (label, score) pair from a classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: EmotionLabel,
    pub score: Confidence,
}

impl EmotionScore {
    pub fn new(label: EmotionLabel, score: Confidence) -> Self {
        Self { label, score }
    }
}

/// Result of classifying one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Dominant emotion
    pub label: EmotionLabel,
    pub confidence: Confidence,
    /// Per-label scores, highest first. Always contains the dominant label.
    pub distribution: Vec<EmotionScore>,
    pub classifier: ClassifierKind,
}

impl Classification {
    /// A classification with a single-entry distribution
    pub fn single(label: EmotionLabel, confidence: Confidence, classifier: ClassifierKind) -> Self {
        Self {
            label,
            confidence,
            distribution: vec![EmotionScore::new(label, confidence)],
            classifier,
        }
    }

    /// Pick the dominant label from a list of detections.
    ///
    /// An empty list means the provider saw no face. Ties keep the order
    /// the provider returned them in.
    pub fn from_scores(
        mut scores: Vec<EmotionScore>,
        classifier: ClassifierKind,
    ) -> Result<Self, ClassifyError> {
        if scores.is_empty() {
            return Err(ClassifyError::NoFaceDetected);
        }

        // Stable sort so equal scores stay in provider order
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let dominant = scores[0];
        Ok(Self {
            label: dominant.label,
            confidence: dominant.score,
            distribution: scores,
            classifier,
        })
    }
}

/// Anything that can turn an image into an emotion.
///
/// Implementations are read-only after construction and may be shared
/// across requests.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifyError>;

    fn kind(&self) -> ClassifierKind;
}
