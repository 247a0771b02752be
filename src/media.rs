//! Mapping from emotion labels to music clips.
//!
//! Labels without a dedicated clip alias to the nearest one that exists
//! (fear plays the sad clip, disgust the angry clip). Lookup never guesses:
//! a label with neither a clip nor a usable alias is `MediaNotFound`.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::emotion::EmotionLabel;

/// Errors resolving a label to media
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("No music available for emotion '{0}'")]
    NotFound(EmotionLabel),
}

/// Identifier of a clip inside the music directory, e.g. `happy.mp3`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    /// Clip named after a label: `{label}.mp3`
    pub fn for_label(label: EmotionLabel) -> Self {
        Self(format!("{}.mp3", label.as_str()))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a label was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMedia {
    pub media: MediaId,
    /// Label whose clip is actually played
    pub source_label: EmotionLabel,
    pub is_fallback: bool,
}

/// Label → clip table with single-hop fallback aliases
#[derive(Debug, Clone)]
pub struct EmotionToMediaMap {
    direct: BTreeMap<EmotionLabel, MediaId>,
    fallback: BTreeMap<EmotionLabel, EmotionLabel>,
}

impl Default for EmotionToMediaMap {
    fn default() -> Self {
        Self::builder()
            .clip(EmotionLabel::Happy)
            .clip(EmotionLabel::Sad)
            .clip(EmotionLabel::Neutral)
            .clip(EmotionLabel::Angry)
            .clip(EmotionLabel::Surprise)
            .clip(EmotionLabel::Calm)
            .alias(EmotionLabel::Fear, EmotionLabel::Sad)
            .alias(EmotionLabel::Disgust, EmotionLabel::Angry)
            .build()
    }
}

impl EmotionToMediaMap {
    pub fn builder() -> MediaMapBuilder {
        MediaMapBuilder::default()
    }

    /// Look up a label, following at most one fallback hop
    pub fn lookup(&self, label: EmotionLabel) -> Result<ResolvedMedia, MediaError> {
        if let Some(media) = self.direct.get(&label) {
            return Ok(ResolvedMedia {
                media: media.clone(),
                source_label: label,
                is_fallback: false,
            });
        }

        if let Some(target) = self.fallback.get(&label) {
            if let Some(media) = self.direct.get(target) {
                debug!("No clip for '{}', falling back to '{}'", label, target);
                return Ok(ResolvedMedia {
                    media: media.clone(),
                    source_label: *target,
                    is_fallback: true,
                });
            }
        }

        Err(MediaError::NotFound(label))
    }

    /// Labels with no direct or fallback entry
    pub fn unmapped(&self) -> Vec<EmotionLabel> {
        EmotionLabel::ALL
            .into_iter()
            .filter(|label| self.lookup(*label).is_err())
            .collect()
    }
}

/// Builder for [`EmotionToMediaMap`]
#[derive(Debug, Default)]
pub struct MediaMapBuilder {
    direct: BTreeMap<EmotionLabel, MediaId>,
    fallback: BTreeMap<EmotionLabel, EmotionLabel>,
}

impl MediaMapBuilder {
    /// Map a label to the clip named after it
    pub fn clip(self, label: EmotionLabel) -> Self {
        self.media(label, MediaId::for_label(label))
    }

    /// Map a label to a specific clip
    pub fn media(mut self, label: EmotionLabel, media: MediaId) -> Self {
        self.direct.insert(label, media);
        self
    }

    /// Play `target`'s clip when `label` has none
    pub fn alias(mut self, label: EmotionLabel, target: EmotionLabel) -> Self {
        self.fallback.insert(label, target);
        self
    }

    pub fn build(self) -> EmotionToMediaMap {
        EmotionToMediaMap {
            direct: self.direct,
            fallback: self.fallback,
        }
    }
}

/// Read-only resolver handed to the pipeline
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    map: EmotionToMediaMap,
}

impl MediaResolver {
    pub fn new(map: EmotionToMediaMap) -> Self {
        Self { map }
    }

    pub fn resolve(&self, label: EmotionLabel) -> Result<ResolvedMedia, MediaError> {
        self.map.lookup(label)
    }

    pub fn map(&self) -> &EmotionToMediaMap {
        &self.map
    }
}
