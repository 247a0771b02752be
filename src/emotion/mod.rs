//! Emotion detection from still images.
//!
//! Two classifiers share the [`EmotionClassifier`] trait: a local rule-based
//! classifier driven by grayscale brightness and contrast, and a remote
//! classifier that delegates to an HTTP inference endpoint.

mod confidence;
mod label;
mod provider;
pub mod remote;
pub mod rule_based;

pub use confidence::Confidence;
pub use label::EmotionLabel;
pub use provider::{
    Classification, ClassifierKind, ClassifyError, EmotionClassifier, EmotionScore,
};
pub use remote::{RemoteClassifier, RemoteSetupError};
pub use rule_based::{ImageStats, RuleBasedClassifier, RuleThresholds};
