//! Detect the mood of a photo and pick music to match.

pub mod config;
pub mod emotion;
pub mod image_source;
pub mod journal;
pub mod media;
pub mod pipeline;
pub mod playback;
pub mod report;

mod pipeline_tests;

pub use config::{Config, ConfigError};
pub use emotion::{Classification, ClassifierKind, Confidence, EmotionClassifier, EmotionLabel};
pub use media::{EmotionToMediaMap, MediaResolver};
pub use pipeline::{EmotionPipeline, PipelineError};
pub use report::MoodReport;
