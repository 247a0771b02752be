use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifier confidence, always stored as a fraction in [0, 1].
///
/// Providers disagree on scale (some report fractions, some percentages),
/// so values are normalized on the way in and only turned back into a
/// percentage for display.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Confidence(f32);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);

    /// Build from a fraction, clamping into [0, 1]. NaN is rejected.
    pub fn from_fraction(value: f32) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        Some(Self(value.clamp(0.0, 1.0)))
    }

    /// Build from a percentage in [0, 100]
    pub fn from_percentage(value: f32) -> Option<Self> {
        Self::from_fraction(value / 100.0)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    pub fn as_percentage(&self) -> f32 {
        self.0 * 100.0
    }

    /// Text progress bar of the given width, e.g. `[########--]`
    pub fn bar(&self, width: usize) -> String {
        let filled = ((self.0 * width as f32).round() as usize).min(width);
        format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.as_percentage())
    }
}

impl TryFrom<f32> for Confidence {
    type Error = String;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("Confidence out of range [0, 1]: {}", value));
        }
        Ok(Self(value))
    }
}

impl From<Confidence> for f32 {
    fn from(c: Confidence) -> f32 {
        c.0
    }
}
