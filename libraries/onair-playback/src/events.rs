//! Store Events
//!
//! Transition events queued by every store mutation. The sync layer drains
//! them after each action and reacts to the specific transition instead of
//! re-reading the whole session:
//! - Track changes (remount the engine when its identity changes)
//! - Transport flips (debounced play/pause)
//! - Mute and volume changes (debounced engine commands)
//! - Playlist length changes

use onair_core::{MediaIdentity, MediaItem};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreEvent {
    /// Current item was (re)selected or cleared
    ///
    /// Emitted even when the same track is selected again: elapsed time
    /// restarts and the engine may need a play command.
    TrackChanged {
        /// Identity of the item that was current before
        previous: Option<MediaIdentity>,
        /// The new current item
        current: Option<MediaItem>,
    },

    /// `is_playing` flipped
    PlayingChanged {
        is_playing: bool,
    },

    /// Mute flag flipped
    MuteChanged {
        is_muted: bool,
    },

    /// Stored volume changed (already clamped)
    VolumeChanged {
        level: u8,
    },

    /// Playlist entries were added or removed
    PlaylistChanged {
        /// New playlist length
        length: usize,
    },
}
