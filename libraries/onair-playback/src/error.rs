//! Error types for playback state management

use onair_core::CoreError;
use thiserror::Error;

/// Playback store errors
///
/// Every error leaves the store untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// Item failed identity validation
    #[error("Invalid media item: {0}")]
    InvalidMedia(#[from] CoreError),

    /// No media is currently loaded
    #[error("No media loaded")]
    NoMediaLoaded,

    /// Playlist is empty
    #[error("Playlist is empty")]
    PlaylistEmpty,

    /// Item is not in the playlist
    #[error("Not in playlist: {0}")]
    NotInPlaylist(String),

    /// Index out of bounds
    #[error("Index out of bounds: {index} (playlist length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Elapsed time is not a finite number
    #[error("Invalid elapsed time: {0}")]
    InvalidElapsed(f64),
}

/// Result type for playback store operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
