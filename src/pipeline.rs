//! One photo in, one mood report out.
//!
//! Each request is independent: decode, classify, resolve media, locate the
//! clip. Failures are scoped to the request and reported by kind so the
//! caller can tell an unusable photo from a broken classifier.

use image::DynamicImage;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigError};
use crate::emotion::{
    ClassifierKind, ClassifyError, EmotionClassifier, RemoteClassifier, RemoteSetupError,
    RuleBasedClassifier,
};
use crate::image_source::{self, ImageError};
use crate::media::MediaResolver;
use crate::playback::PlaybackSurface;
use crate::report::{MediaOutcome, MoodReport};

/// Why a request produced no mood
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No face detected in the photo")]
    NoFaceDetected,

    #[error("Emotion classification failed: {0}")]
    Classification(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Remote classifier setup failed: {0}")]
    RemoteSetup(#[from] RemoteSetupError),
}

impl PipelineError {
    /// Suggestion shown to the user next to the error
    pub fn user_hint(&self) -> &'static str {
        match self {
            Self::InvalidImage(_) | Self::Classification(_) => {
                "Please try another photo. Make sure it has good lighting and a clear view of your face."
            }
            Self::NoFaceDetected => {
                "The photo was processed but no face was found. Face the camera directly and try again."
            }
            Self::Config(_) | Self::RemoteSetup(_) => {
                "Check the configuration and try again."
            }
        }
    }

    /// Whether the failure comes from configuration rather than the photo
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::RemoteSetup(_))
    }
}

impl From<ImageError> for PipelineError {
    fn from(e: ImageError) -> Self {
        Self::InvalidImage(e.to_string())
    }
}

impl From<ClassifyError> for PipelineError {
    fn from(e: ClassifyError) -> Self {
        match e {
            ClassifyError::InvalidImage(msg) => Self::InvalidImage(msg),
            ClassifyError::NoFaceDetected => Self::NoFaceDetected,
            ClassifyError::Classification(msg) => Self::Classification(msg),
        }
    }
}

/// Build the classifier selected in the config.
///
/// The remote classifier fails fast without an API token; there is no
/// fallback to the rule-based one.
pub fn build_classifier(config: &Config) -> Result<Box<dyn EmotionClassifier>, PipelineError> {
    match config.classifier {
        ClassifierKind::Rule => Ok(Box::new(RuleBasedClassifier::new(config.thresholds))),
        ClassifierKind::Remote => {
            let token = config.api_token()?;
            let classifier = RemoteClassifier::new(
                &config.endpoint,
                &token,
                config.timeout(),
                config.max_attempts,
            )?;
            Ok(Box::new(classifier))
        }
    }
}

/// Classifier, media table and playback surface for handling requests
pub struct EmotionPipeline {
    classifier: Box<dyn EmotionClassifier>,
    resolver: MediaResolver,
    playback: PlaybackSurface,
}

impl EmotionPipeline {
    pub fn new(
        classifier: Box<dyn EmotionClassifier>,
        resolver: MediaResolver,
        playback: PlaybackSurface,
    ) -> Self {
        Self {
            classifier,
            resolver,
            playback,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let classifier = build_classifier(config)?;
        info!(
            "Pipeline ready: classifier={:?}, music_dir={:?}",
            classifier.kind(),
            config.music_dir
        );
        Ok(Self::new(
            classifier,
            MediaResolver::default(),
            PlaybackSurface::new(&config.music_dir, config.player_command.clone()),
        ))
    }

    pub fn classifier_kind(&self) -> ClassifierKind {
        self.classifier.kind()
    }

    pub fn playback(&self) -> &PlaybackSurface {
        &self.playback
    }

    pub async fn process_path(&self, path: &Path) -> Result<MoodReport, PipelineError> {
        let image = image_source::load_from_path(path)?;
        self.process_image(&image).await
    }

    pub async fn process_bytes(&self, bytes: &[u8]) -> Result<MoodReport, PipelineError> {
        let image = image_source::load_from_bytes(bytes)?;
        self.process_image(&image).await
    }

    pub async fn process_image(&self, image: &DynamicImage) -> Result<MoodReport, PipelineError> {
        let classification = self.classifier.classify(image).await?;
        info!(
            "Detected mood: {} ({})",
            classification.label, classification.confidence
        );

        let media = match self.resolver.resolve(classification.label) {
            Ok(resolved) => {
                let playback = self.playback.locate(&resolved.media);
                MediaOutcome::Resolved {
                    media: resolved,
                    playback,
                }
            }
            Err(e) => {
                warn!("{}", e);
                MediaOutcome::NotFound {
                    message: e.to_string(),
                }
            }
        };

        Ok(MoodReport {
            classification,
            media,
        })
    }
}
