//! Playback surface: turns a resolved clip into a file on disk and optionally
//! hands it to an external audio player.
//!
//! A missing clip is not an error here. The caller still shows the detected
//! emotion and reports that no preview is available.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use crate::media::MediaId;

/// Whether a clip can be played
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum PlaybackStatus {
    Ready(PathBuf),
    Missing(PathBuf),
}

impl PlaybackStatus {
    pub fn path(&self) -> &Path {
        match self {
            Self::Ready(p) | Self::Missing(p) => p,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Music directory plus optional player command
#[derive(Debug, Clone)]
pub struct PlaybackSurface {
    music_dir: PathBuf,
    player_command: Option<String>,
}

impl PlaybackSurface {
    pub fn new(music_dir: impl Into<PathBuf>, player_command: Option<String>) -> Self {
        Self {
            music_dir: music_dir.into(),
            player_command: player_command.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    /// Locate the clip under the music directory
    pub fn locate(&self, media: &MediaId) -> PlaybackStatus {
        let path = self.music_dir.join(media.as_str());
        if path.is_file() {
            debug!("Clip found: {:?}", path);
            PlaybackStatus::Ready(path)
        } else {
            warn!("Clip not found: {:?}", path);
            PlaybackStatus::Missing(path)
        }
    }

    /// Launch the configured player on a ready clip.
    ///
    /// Returns `Ok(false)` when there is nothing to do (no player configured
    /// or the clip is missing). The player runs in the background and is
    /// reaped by a watcher thread when it exits.
    pub fn play(&self, status: &PlaybackStatus) -> Result<bool, String> {
        Ok(self.spawn_player(status)?.is_some())
    }

    fn spawn_player(
        &self,
        status: &PlaybackStatus,
    ) -> Result<Option<JoinHandle<io::Result<ExitStatus>>>, String> {
        let (Some(command), PlaybackStatus::Ready(path)) = (&self.player_command, status) else {
            return Ok(None);
        };

        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or("Player command is empty")?;

        info!("Starting player: {} {:?}", command, path);
        let mut child = Command::new(program)
            .args(parts)
            .arg(path)
            .spawn()
            .map_err(|e| format!("Failed to start player '{}': {}", program, e))?;

        let program = program.to_string();
        let watcher = std::thread::Builder::new()
            .name("player-watch".to_string())
            .spawn(move || {
                let exit = child.wait();
                match &exit {
                    Ok(code) if code.success() => debug!("Player finished"),
                    Ok(code) => warn!("Player '{}' exited with {}", program, code),
                    Err(e) => warn!("Failed to wait for player '{}': {}", program, e),
                }
                exit
            })
            .map_err(|e| format!("Failed to watch player process: {}", e))?;

        Ok(Some(watcher))
    }
}
