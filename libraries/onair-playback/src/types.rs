//! Core types for playback state management

use onair_core::{MediaItem, PlaylistEntry};
use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_SIZE;
use crate::volume::DEFAULT_VOLUME;

/// Seconds into a track below which "previous" walks history
pub const DEFAULT_HISTORY_WALK_THRESHOLD_SECS: f64 = 5.0;

/// Configuration for the playback store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 20)
    pub history_size: usize,

    /// Initial volume (0-100, default: 80)
    pub volume: u8,

    /// "Previous" pressed earlier than this walks history (default: 5s)
    pub history_walk_threshold_secs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            volume: DEFAULT_VOLUME,
            history_walk_threshold_secs: DEFAULT_HISTORY_WALK_THRESHOLD_SECS,
        }
    }
}

/// Point-in-time copy of the playback session
///
/// Handed to UI consumers; never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current: Option<MediaItem>,
    pub is_playing: bool,
    pub is_muted: bool,
    pub volume: u8,
    pub elapsed_seconds: f64,
    pub playlist: Vec<PlaylistEntry>,
    pub current_index: Option<usize>,
    /// Oldest first
    pub history: Vec<MediaItem>,
}

impl SessionSnapshot {
    pub fn is_in_playlist(&self, item: &MediaItem) -> bool {
        self.playlist.iter().any(|entry| entry.is_same_track(item))
    }

    pub fn is_current_media(&self, item: &MediaItem) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.is_same_track(item))
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            current: None,
            is_playing: false,
            is_muted: false,
            volume: DEFAULT_VOLUME,
            elapsed_seconds: 0.0,
            playlist: Vec::new(),
            current_index: None,
            history: Vec::new(),
        }
    }
}
