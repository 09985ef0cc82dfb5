//! OnAir Playback Management
//!
//! Single source of truth for what is playing: the current item, the
//! playlist, history and transport flags.
//!
//! # Features
//!
//! - **Playlist**: ordered, de-duplicated by track identity
//! - **Navigation**: next/previous with wrap-around, jump to index
//! - **History**: bounded, used by "previous" early in a track
//! - **Volume**: clamped 0-100 with a separate mute flag
//! - **Events**: every transition is queued for the sync layer
//!
//! # Example
//!
//! ```rust
//! use onair_core::{ContentType, MediaItem};
//! use onair_playback::{PlaybackConfig, PlaybackStore, StoreEvent};
//!
//! let mut store = PlaybackStore::new(PlaybackConfig::default());
//!
//! let item = MediaItem::new("1", ContentType::Station, "night-drive", "Night Drive");
//! store.set_current_media(item).unwrap();
//!
//! assert!(store.is_playing());
//! assert_eq!(store.current_index(), Some(0));
//!
//! let events = store.drain_events();
//! assert!(events.contains(&StoreEvent::PlayingChanged { is_playing: true }));
//! ```

#![forbid(unsafe_code)]

mod error;
mod events;
mod history;
mod playlist;
mod store;
pub mod types;
mod volume;

pub use error::{PlaybackError, Result};
pub use events::StoreEvent;
pub use history::{History, DEFAULT_HISTORY_SIZE};
pub use playlist::Playlist;
pub use store::PlaybackStore;
pub use types::{PlaybackConfig, SessionSnapshot, DEFAULT_HISTORY_WALK_THRESHOLD_SECS};
pub use volume::{Volume, DEFAULT_VOLUME};
