//! Display boundary: the only place confidence becomes a percentage.

use serde::Serialize;
use std::fmt::Write;

use crate::emotion::Classification;
use crate::media::ResolvedMedia;
use crate::playback::PlaybackStatus;

const BAR_WIDTH: usize = 20;

/// What happened when looking up music for the detected mood
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MediaOutcome {
    Resolved {
        #[serde(flatten)]
        media: ResolvedMedia,
        playback: PlaybackStatus,
    },
    NotFound {
        message: String,
    },
}

/// Everything produced for one photo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodReport {
    pub classification: Classification,
    pub media: MediaOutcome,
}

impl MoodReport {
    /// Clip path if one is ready to play
    pub fn playable(&self) -> Option<&PlaybackStatus> {
        match &self.media {
            MediaOutcome::Resolved { playback, .. } if playback.is_ready() => Some(playback),
            _ => None,
        }
    }

    pub fn render_text(&self, show_distribution: bool) -> String {
        let c = &self.classification;
        let mut out = String::new();

        let _ = writeln!(out, "Detected Mood: {} {}", c.label.title(), c.label.symbol());
        let _ = writeln!(out, "Confidence Level: {} {}", c.confidence.bar(BAR_WIDTH), c.confidence);

        if show_distribution && c.distribution.len() > 1 {
            let _ = writeln!(out, "\nAll emotions:");
            for score in &c.distribution {
                let _ = writeln!(
                    out,
                    "  {:<9} {} {:>6}",
                    score.label.as_str(),
                    score.label.symbol(),
                    score.score.to_string()
                );
            }
        }

        let _ = writeln!(out, "\nSuggested Music:");
        match &self.media {
            MediaOutcome::Resolved { media, playback } => {
                if media.is_fallback {
                    let _ = writeln!(
                        out,
                        "Playing {} music (no dedicated {} clip)",
                        media.source_label, c.label
                    );
                } else {
                    let _ = writeln!(out, "Playing {} music to match your mood!", c.label);
                }
                match playback {
                    PlaybackStatus::Ready(path) => {
                        let _ = writeln!(out, "Now Playing: {}", path.display());
                    }
                    PlaybackStatus::Missing(path) => {
                        let _ = writeln!(
                            out,
                            "Preview music not available ({} is missing).",
                            path.display()
                        );
                    }
                }
            }
            MediaOutcome::NotFound { message } => {
                let _ = writeln!(out, "{}", message);
            }
        }

        out
    }
}
