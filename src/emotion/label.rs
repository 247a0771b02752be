use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion labels any classifier may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Neutral,
    Angry,
    Surprise,
    Fear,
    Disgust,
    Calm,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 8] = [
        Self::Happy,
        Self::Sad,
        Self::Neutral,
        Self::Angry,
        Self::Surprise,
        Self::Fear,
        Self::Disgust,
        Self::Calm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Neutral => "neutral",
            Self::Angry => "angry",
            Self::Surprise => "surprise",
            Self::Fear => "fear",
            Self::Disgust => "disgust",
            Self::Calm => "calm",
        }
    }

    /// Emoji shown next to the label
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Happy => "😊",
            Self::Sad => "😢",
            Self::Neutral => "😐",
            Self::Angry => "😠",
            Self::Surprise => "😮",
            Self::Fear => "😨",
            Self::Disgust => "🤢",
            Self::Calm => "😌",
        }
    }

    /// Label with its first letter upper-cased ("Happy")
    pub fn title(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmotionLabel {
    type Err = String;

    /// Accepts canonical names plus the spellings inference providers tend to use
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" | "happiness" | "joy" => Ok(Self::Happy),
            "sad" | "sadness" => Ok(Self::Sad),
            "neutral" => Ok(Self::Neutral),
            "angry" | "anger" => Ok(Self::Angry),
            "surprise" | "surprised" => Ok(Self::Surprise),
            "fear" | "fearful" | "scared" => Ok(Self::Fear),
            "disgust" | "disgusted" | "contempt" => Ok(Self::Disgust),
            "calm" => Ok(Self::Calm),
            _ => Err(format!("Unknown emotion label: {}", s)),
        }
    }
}
