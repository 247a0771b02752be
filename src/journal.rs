//! Mood journal: one JSON object per line, appended each time the user saves
//! a detected mood.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::emotion::{Classification, ClassifierKind, Confidence, EmotionLabel};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize journal entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A saved mood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub label: EmotionLabel,
    pub confidence: Confidence,
    pub classifier: ClassifierKind,
    pub image_path: Option<String>,
    pub media: Option<String>,
}

impl MoodEntry {
    pub fn new(classification: &Classification, image_path: Option<&Path>, media: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            label: classification.label,
            confidence: classification.confidence,
            classifier: classification.classifier,
            image_path: image_path.map(|p| p.display().to_string()),
            media: media.map(str::to_string),
        }
    }
}

/// Append-only JSON-lines journal
#[derive(Debug, Clone)]
pub struct MoodJournal {
    path: PathBuf,
}

impl MoodJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &MoodEntry) -> Result<(), JournalError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        info!("Saved mood '{}' to {:?}", entry.label, self.path);
        Ok(())
    }

    /// Read all entries, skipping lines that fail to parse
    pub fn entries(&self) -> Result<Vec<MoodEntry>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MoodEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping corrupt journal line {}: {}", i + 1, e),
            }
        }

        debug!("Loaded {} journal entries", entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(label: EmotionLabel) -> Classification {
        Classification::single(
            label,
            Confidence::from_fraction(0.8).unwrap(),
            ClassifierKind::Rule,
        )
    }

    #[test]
    fn test_missing_journal_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = MoodJournal::new(dir.path().join("journal.jsonl"));
        assert!(journal.entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = MoodJournal::new(dir.path().join("sub").join("journal.jsonl"));

        let first = MoodEntry::new(&sample(EmotionLabel::Happy), Some(Path::new("me.jpg")), Some("happy.mp3"));
        let second = MoodEntry::new(&sample(EmotionLabel::Calm), None, None);
        journal.append(&first).unwrap();
        journal.append(&second).unwrap();

        let entries = journal.entries().unwrap();
        assert_eq!(entries, vec![first, second]);

        let raw = std::fs::read_to_string(journal.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let journal = MoodJournal::new(dir.path().join("journal.jsonl"));
        journal
            .append(&MoodEntry::new(&sample(EmotionLabel::Sad), None, None))
            .unwrap();

        let mut file = OpenOptions::new().append(true).open(journal.path()).unwrap();
        writeln!(file, "{{ truncated").unwrap();

        let entries = journal.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, EmotionLabel::Sad);
    }
}
