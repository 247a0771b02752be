//! Rule-based emotion classifier using grayscale brightness and contrast.
//!
//! The thresholds are an uncalibrated heuristic. Confidence is a constant per
//! branch, not something measured from the image.

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::confidence::Confidence;
use super::label::EmotionLabel;
use super::provider::{Classification, ClassifierKind, ClassifyError, EmotionClassifier};

/// Brightness/contrast summary of an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    /// Mean 8-bit luma
    pub brightness: f64,
    /// Population standard deviation of luma
    pub contrast: f64,
}

impl ImageStats {
    /// Compute stats over the luma channel.
    ///
    /// Color images are reduced with the ITU-R 601-2 weights
    /// (299/587/114 per mille), truncating to 8 bits. Alpha is ignored.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ClassifyError> {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_samples(gray.as_raw()),
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => Self::from_samples(image.to_luma8().as_raw()),
            _ => Self::from_samples(&rec601_luma(image)),
        }
    }

    /// Compute stats over raw 8-bit intensity samples
    pub fn from_samples(samples: &[u8]) -> Result<Self, ClassifyError> {
        if samples.is_empty() {
            return Err(ClassifyError::InvalidImage("image has no pixels".to_string()));
        }

        let n = samples.len() as f64;
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Ok(Self {
            brightness: mean,
            contrast: variance.sqrt(),
        })
    }
}

fn rec601_luma(image: &DynamicImage) -> Vec<u8> {
    image
        .to_rgb8()
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
        })
        .collect()
}

/// Decision thresholds for the rule-based classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Above this contrast the image counts as "expressive"
    pub contrast: f64,
    /// Expressive and brighter than this: happy
    pub happy_brightness: f64,
    /// Expressive and darker than this: sad
    pub sad_brightness: f64,
    /// Flat and brighter than this: neutral (otherwise calm)
    pub neutral_brightness: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            contrast: 50.0,
            happy_brightness: 130.0,
            sad_brightness: 90.0,
            neutral_brightness: 110.0,
        }
    }
}

/// Labels the rule-based classifier can produce
pub const RULE_LABELS: [EmotionLabel; 5] = [
    EmotionLabel::Happy,
    EmotionLabel::Sad,
    EmotionLabel::Surprise,
    EmotionLabel::Neutral,
    EmotionLabel::Calm,
];

/// Stateless classifier over [`ImageStats`]
#[derive(Debug, Clone, Default)]
pub struct RuleBasedClassifier {
    thresholds: RuleThresholds,
}

impl RuleBasedClassifier {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Map stats to a label and its fixed confidence. Total over all inputs.
    pub fn classify_stats(&self, stats: ImageStats) -> (EmotionLabel, f32) {
        let t = &self.thresholds;
        if stats.contrast > t.contrast {
            if stats.brightness > t.happy_brightness {
                (EmotionLabel::Happy, 0.8)
            } else if stats.brightness < t.sad_brightness {
                (EmotionLabel::Sad, 0.7)
            } else {
                (EmotionLabel::Surprise, 0.6)
            }
        } else if stats.brightness > t.neutral_brightness {
            (EmotionLabel::Neutral, 0.75)
        } else {
            (EmotionLabel::Calm, 0.65)
        }
    }

    /// Synchronous classification, used directly by the async trait impl
    pub fn classify_image(&self, image: &DynamicImage) -> Result<Classification, ClassifyError> {
        let stats = ImageStats::from_image(image)?;
        let (label, confidence) = self.classify_stats(stats);

        debug!(
            "Rule-based: brightness={:.1} contrast={:.1} -> {} ({:.2})",
            stats.brightness, stats.contrast, label, confidence
        );

        let confidence = Confidence::from_fraction(confidence).unwrap_or(Confidence::ZERO);
        Ok(Classification::single(label, confidence, ClassifierKind::Rule))
    }
}

#[async_trait]
impl EmotionClassifier for RuleBasedClassifier {
    async fn classify(&self, image: &DynamicImage) -> Result<Classification, ClassifyError> {
        self.classify_image(image)
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Rule
    }
}
