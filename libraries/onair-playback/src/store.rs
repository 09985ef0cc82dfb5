//! Playback store - authoritative session state
//!
//! Owns the current item, playlist, history and transport flags. Pure
//! state logic: no timers, no I/O. Every mutation either applies fully or
//! returns an error and leaves the store untouched.

use onair_core::{MediaItem, PlaylistEntry};
use tracing::{debug, info, warn};

use crate::{
    error::{PlaybackError, Result},
    events::StoreEvent,
    history::History,
    playlist::Playlist,
    types::{PlaybackConfig, SessionSnapshot},
    volume::Volume,
};

/// Central playback state
///
/// One instance per application; the sync service owns it and is the only
/// path UI consumers mutate it through.
#[derive(Debug, Clone)]
pub struct PlaybackStore {
    // Transport
    current: Option<MediaItem>,
    is_playing: bool,
    volume: Volume,
    elapsed_seconds: f64,

    // Playlist and history
    playlist: Playlist,
    current_index: Option<usize>,
    history: History,

    // Settings
    history_walk_threshold_secs: f64,

    // Event queue for the sync layer
    pending_events: Vec<StoreEvent>,
}

impl PlaybackStore {
    /// Create new playback store
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            current: None,
            is_playing: false,
            volume: Volume::new(config.volume),
            elapsed_seconds: 0.0,
            playlist: Playlist::new(),
            current_index: None,
            history: History::new(config.history_size),
            history_walk_threshold_secs: config.history_walk_threshold_secs,
            pending_events: Vec::new(),
        }
    }

    // ===== Current Media =====

    /// Make `item` the current media and start playing it
    ///
    /// Reuses the playlist slot of the same track if there is one,
    /// otherwise appends the item.
    pub fn set_current_media(&mut self, item: MediaItem) -> Result<()> {
        Self::validate(&item)?;

        let index = if let Some(existing) = self.playlist.position(&item) {
            debug!(index = existing, "Switching to existing playlist entry");
            existing
        } else {
            let index = self.playlist.len();
            self.playlist.push(item.clone());
            debug!(length = self.playlist.len(), "Appended new playlist entry");
            self.emit_playlist_changed();
            index
        };

        info!("Set current media: {}", item.label());
        self.make_current(item, Some(index), true, true);
        Ok(())
    }

    // ===== Transport =====

    /// Flip play/pause
    pub fn toggle_play(&mut self) -> Result<()> {
        let target = !self.is_playing;
        self.set_playing(target)
    }

    /// Set play/pause directly
    pub fn set_playing(&mut self, playing: bool) -> Result<()> {
        if self.current.is_none() {
            debug!("Ignoring transport change: no media loaded");
            return Err(PlaybackError::NoMediaLoaded);
        }
        self.apply_playing(playing);
        Ok(())
    }

    /// Toggle mute, returns the new mute state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.volume.toggle_mute();
        debug!(muted, "Toggled mute");
        self.pending_events
            .push(StoreEvent::MuteChanged { is_muted: muted });
        muted
    }

    /// Set volume, clamped to 0-100; returns the stored level
    pub fn set_volume(&mut self, level: i32) -> u8 {
        let before = self.volume.level();
        let stored = self.volume.set_level(level);
        if stored != before {
            debug!(level = stored, "Volume changed");
            self.pending_events
                .push(StoreEvent::VolumeChanged { level: stored });
        }
        stored
    }

    /// Overwrite elapsed seconds (periodic engine poll)
    ///
    /// Non-finite values are rejected; negatives clamp to zero.
    pub fn set_elapsed_seconds(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(PlaybackError::InvalidElapsed(seconds));
        }
        self.elapsed_seconds = seconds.max(0.0);
        Ok(())
    }

    // ===== Playlist Management =====

    /// Append an item to the playlist
    ///
    /// Returns `Ok(false)` when the same track is already enqueued.
    pub fn add_to_playlist(&mut self, item: MediaItem) -> Result<bool> {
        Self::validate(&item)?;

        let label = item.label().to_string();
        if self.playlist.push(item).is_none() {
            debug!("Already in playlist: {}", label);
            return Ok(false);
        }

        info!("Added to playlist: {}", label);
        self.emit_playlist_changed();
        Ok(true)
    }

    /// Remove the playlist entry for the same track as `item`
    ///
    /// Removing the current entry moves playback to whatever now occupies
    /// its slot (wrapping to the first entry), or stops when the playlist
    /// becomes empty.
    pub fn remove_from_playlist(&mut self, item: &MediaItem) -> Result<()> {
        let Some(index) = self.playlist.position(item) else {
            debug!("Not in playlist: {}", item.label());
            return Err(PlaybackError::NotInPlaylist(item.identity().to_string()));
        };

        self.playlist.remove(index);
        info!("Removed from playlist: {}", item.label());
        self.emit_playlist_changed();

        match self.current_index {
            Some(current) if current == index => {
                if self.playlist.is_empty() {
                    self.stop_and_clear_current();
                } else {
                    let next = if index >= self.playlist.len() { 0 } else { index };
                    let keep_playing = self.is_playing;
                    let next_item = self.entry_item(next);
                    self.make_current(next_item, Some(next), keep_playing, true);
                }
            }
            Some(current) if current > index => {
                self.current_index = Some(current - 1);
            }
            _ => {}
        }

        Ok(())
    }

    /// Empty playlist and history, stop playback
    pub fn clear_playlist(&mut self) {
        info!("Clearing playlist");
        let had_entries = !self.playlist.is_empty();
        self.playlist.clear();
        self.history.clear();
        self.stop_and_clear_current();
        if had_entries {
            self.emit_playlist_changed();
        }
    }

    // ===== Navigation =====

    /// Advance to the next entry, wrapping to the first
    pub fn play_next(&mut self) -> Result<()> {
        let len = self.playlist.len();
        if len == 0 {
            debug!("play_next: playlist is empty");
            return Err(PlaybackError::PlaylistEmpty);
        }

        let next = self.current_index.map_or(0, |i| (i + 1) % len);
        let item = self.entry_item(next);
        info!("Playing next: {}", item.label());
        self.make_current(item, Some(next), true, true);
        Ok(())
    }

    /// Go back
    ///
    /// Early in a track (below the walk threshold) with at least two
    /// history entries, returns to the previously played item and consumes
    /// one history entry. Otherwise steps to the previous playlist slot,
    /// wrapping to the last. With nothing current, the last entry is picked
    /// rather than the second-to-last that `(-1 - 1 + len) % len` would give.
    pub fn play_previous(&mut self) -> Result<()> {
        let len = self.playlist.len();
        if len == 0 {
            debug!("play_previous: playlist is empty");
            return Err(PlaybackError::PlaylistEmpty);
        }

        if self.elapsed_seconds < self.history_walk_threshold_secs {
            let target = self
                .history
                .peek_previous()
                .and_then(|prev| self.playlist.position(prev).map(|i| (i, prev.clone())));

            if let Some((index, item)) = target {
                info!("Returning to previous item: {}", item.label());
                self.history.pop();
                self.make_current(item, Some(index), true, false);
                return Ok(());
            }
        }

        let prev = match self.current_index {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        let item = self.entry_item(prev);
        info!("Playing previous slot: {}", item.label());
        self.make_current(item, Some(prev), true, true);
        Ok(())
    }

    /// Play the entry at `index`
    pub fn play_at_index(&mut self, index: usize) -> Result<()> {
        let len = self.playlist.len();
        if index >= len {
            warn!(index, len, "Invalid playlist index");
            return Err(PlaybackError::IndexOutOfBounds { index, len });
        }

        let item = self.entry_item(index);
        info!(index, "Playing at index: {}", item.label());
        self.make_current(item, Some(index), true, true);
        Ok(())
    }

    // ===== Queries =====

    pub fn is_in_playlist(&self, item: &MediaItem) -> bool {
        self.playlist.contains(item)
    }

    pub fn is_current_media(&self, item: &MediaItem) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.is_same_track(item))
    }

    pub fn current(&self) -> Option<&MediaItem> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn playlist(&self) -> &[PlaylistEntry] {
        self.playlist.entries()
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// History items, oldest first
    pub fn history(&self) -> Vec<&MediaItem> {
        self.history.get_all()
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Copy of the current session for UI consumers
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current: self.current.clone(),
            is_playing: self.is_playing,
            is_muted: self.volume.is_muted(),
            volume: self.volume.level(),
            elapsed_seconds: self.elapsed_seconds,
            playlist: self.playlist.entries().to_vec(),
            current_index: self.current_index,
            history: self.history.get_all().into_iter().cloned().collect(),
        }
    }

    // ===== Internal =====

    fn validate(item: &MediaItem) -> Result<()> {
        item.validate().map_err(|err| {
            warn!("Rejected media item: {}", err);
            PlaybackError::from(err)
        })
    }

    /// Clone of the item at a known-valid playlist index
    fn entry_item(&self, index: usize) -> MediaItem {
        self.playlist.entries()[index].item.clone()
    }

    fn make_current(
        &mut self,
        item: MediaItem,
        index: Option<usize>,
        start_playing: bool,
        record_history: bool,
    ) {
        if record_history {
            self.history.push(item.clone());
        }

        let previous = self.current.as_ref().map(MediaItem::identity);
        self.current = Some(item.clone());
        self.current_index = index;
        self.elapsed_seconds = 0.0;

        self.pending_events.push(StoreEvent::TrackChanged {
            previous,
            current: Some(item),
        });

        if start_playing {
            self.apply_playing(true);
        }
    }

    fn stop_and_clear_current(&mut self) {
        if self.current.is_some() {
            let previous = self.current.take().map(|item| item.identity());
            self.pending_events.push(StoreEvent::TrackChanged {
                previous,
                current: None,
            });
        }
        self.current_index = None;
        self.elapsed_seconds = 0.0;
        self.apply_playing(false);
    }

    fn apply_playing(&mut self, playing: bool) {
        if self.is_playing != playing {
            self.is_playing = playing;
            debug!(playing, "Transport changed");
            self.pending_events
                .push(StoreEvent::PlayingChanged { is_playing: playing });
        }
    }

    fn emit_playlist_changed(&mut self) {
        self.pending_events.push(StoreEvent::PlaylistChanged {
            length: self.playlist.len(),
        });
    }
}

impl Default for PlaybackStore {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_core::ContentType;

    fn create_test_item(slug: &str) -> MediaItem {
        MediaItem::new(
            format!("id-{}", slug),
            ContentType::Station,
            slug,
            format!("Station {}", slug),
        )
    }

    fn store_with(slugs: &[&str]) -> PlaybackStore {
        let mut store = PlaybackStore::default();
        for slug in slugs {
            store.add_to_playlist(create_test_item(slug)).unwrap();
        }
        store.drain_events();
        store
    }

    #[test]
    fn create_store() {
        let store = PlaybackStore::new(PlaybackConfig::default());
        assert!(store.current().is_none());
        assert!(!store.is_playing());
        assert_eq!(store.volume(), 80);
        assert_eq!(store.current_index(), None);
        assert!(store.playlist().is_empty());
    }

    #[test]
    fn set_current_media_appends_and_plays() {
        let mut store = PlaybackStore::default();
        store.set_current_media(create_test_item("a")).unwrap();

        assert_eq!(store.current().unwrap().slug, "a");
        assert!(store.is_playing());
        assert_eq!(store.current_index(), Some(0));
        assert_eq!(store.playlist_len(), 1);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn set_current_media_reuses_existing_slot() {
        let mut store = store_with(&["a", "b", "c"]);
        store.set_current_media(create_test_item("b")).unwrap();

        assert_eq!(store.current_index(), Some(1));
        assert_eq!(store.playlist_len(), 3);
    }

    #[test]
    fn invalid_item_leaves_state_untouched() {
        let mut store = store_with(&["a"]);
        let bad = create_test_item("");

        assert!(matches!(
            store.set_current_media(bad.clone()),
            Err(PlaybackError::InvalidMedia(_))
        ));
        assert!(store.add_to_playlist(bad).is_err());
        assert_eq!(store.playlist_len(), 1);
        assert!(store.current().is_none());
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn transport_needs_media() {
        let mut store = PlaybackStore::default();
        assert_eq!(store.toggle_play(), Err(PlaybackError::NoMediaLoaded));
        assert!(!store.is_playing());

        store.set_current_media(create_test_item("a")).unwrap();
        store.toggle_play().unwrap();
        assert!(!store.is_playing());
        store.set_playing(true).unwrap();
        assert!(store.is_playing());
    }

    #[test]
    fn playing_event_only_on_flip() {
        let mut store = store_with(&["a"]);
        store.play_at_index(0).unwrap();
        store.drain_events();

        store.set_playing(true).unwrap();
        assert!(store.drain_events().is_empty());

        store.set_playing(false).unwrap();
        assert_eq!(
            store.drain_events(),
            vec![StoreEvent::PlayingChanged { is_playing: false }]
        );
    }

    #[test]
    fn volume_event_skipped_when_unchanged() {
        let mut store = PlaybackStore::default();
        assert_eq!(store.set_volume(80), 80);
        assert!(store.drain_events().is_empty());

        assert_eq!(store.set_volume(500), 100);
        assert_eq!(
            store.drain_events(),
            vec![StoreEvent::VolumeChanged { level: 100 }]
        );
    }

    #[test]
    fn elapsed_rejects_nan() {
        let mut store = PlaybackStore::default();
        assert!(store.set_elapsed_seconds(f64::NAN).is_err());
        store.set_elapsed_seconds(-2.0).unwrap();
        assert_eq!(store.elapsed_seconds(), 0.0);
        store.set_elapsed_seconds(12.5).unwrap();
        assert_eq!(store.elapsed_seconds(), 12.5);
    }

    #[test]
    fn remove_before_current_shifts_index() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_at_index(2).unwrap();

        store.remove_from_playlist(&create_test_item("a")).unwrap();
        assert_eq!(store.current_index(), Some(1));
        assert_eq!(store.current().unwrap().slug, "c");
    }

    #[test]
    fn remove_after_current_keeps_index() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_at_index(0).unwrap();

        store.remove_from_playlist(&create_test_item("c")).unwrap();
        assert_eq!(store.current_index(), Some(0));
    }

    #[test]
    fn remove_current_selects_same_slot() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_at_index(1).unwrap();
        store.set_elapsed_seconds(40.0).unwrap();

        store.remove_from_playlist(&create_test_item("b")).unwrap();
        assert_eq!(store.current().unwrap().slug, "c");
        assert_eq!(store.current_index(), Some(1));
        assert!(store.is_playing());
        assert_eq!(store.elapsed_seconds(), 0.0);
    }

    #[test]
    fn remove_current_last_wraps_to_first() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_at_index(2).unwrap();

        store.remove_from_playlist(&create_test_item("c")).unwrap();
        assert_eq!(store.current().unwrap().slug, "a");
        assert_eq!(store.current_index(), Some(0));
    }

    #[test]
    fn remove_current_keeps_paused_state() {
        let mut store = store_with(&["a", "b"]);
        store.play_at_index(0).unwrap();
        store.set_playing(false).unwrap();

        store.remove_from_playlist(&create_test_item("a")).unwrap();
        assert_eq!(store.current().unwrap().slug, "b");
        assert!(!store.is_playing());
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store = store_with(&["a"]);
        assert!(matches!(
            store.remove_from_playlist(&create_test_item("zzz")),
            Err(PlaybackError::NotInPlaylist(_))
        ));
        assert_eq!(store.playlist_len(), 1);
    }

    #[test]
    fn clear_playlist_stops() {
        let mut store = store_with(&["a", "b"]);
        store.play_at_index(1).unwrap();

        store.clear_playlist();
        assert!(store.current().is_none());
        assert_eq!(store.current_index(), None);
        assert!(!store.is_playing());
        assert!(store.history().is_empty());
        assert!(store.playlist().is_empty());
    }

    #[test]
    fn next_from_nothing_starts_at_first() {
        let mut store = store_with(&["a", "b"]);
        store.play_next().unwrap();
        assert_eq!(store.current_index(), Some(0));
    }

    #[test]
    fn next_on_empty_playlist_fails() {
        let mut store = PlaybackStore::default();
        assert_eq!(store.play_next(), Err(PlaybackError::PlaylistEmpty));
        assert_eq!(store.play_previous(), Err(PlaybackError::PlaylistEmpty));
    }

    #[test]
    fn previous_after_threshold_uses_slot() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_at_index(0).unwrap();
        store.play_at_index(2).unwrap();
        store.set_elapsed_seconds(30.0).unwrap();

        store.play_previous().unwrap();
        // Slot before index 2, not the history entry "a"
        assert_eq!(store.current().unwrap().slug, "b");
        assert_eq!(store.current_index(), Some(1));
    }

    #[test]
    fn previous_wraps_to_last_slot() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_at_index(0).unwrap();

        // Single history entry: index-based
        store.play_previous().unwrap();
        assert_eq!(store.current_index(), Some(2));
    }

    #[test]
    fn previous_from_nothing_picks_last() {
        let mut store = store_with(&["a", "b", "c"]);
        store.play_previous().unwrap();
        assert_eq!(store.current().unwrap().slug, "c");
        assert_eq!(store.current_index(), Some(2));
    }

    #[test]
    fn previous_history_walk_skips_removed_items() {
        let mut store = store_with(&["a", "b"]);
        store.play_at_index(0).unwrap();
        store.play_at_index(1).unwrap();
        store.remove_from_playlist(&create_test_item("a")).unwrap();

        // "a" is in history but not in the playlist any more
        store.play_previous().unwrap();
        assert_eq!(store.current().unwrap().slug, "b");
        assert_eq!(store.current_index(), Some(0));
    }

    #[test]
    fn play_at_index_out_of_range() {
        let mut store = store_with(&["a"]);
        assert_eq!(
            store.play_at_index(3),
            Err(PlaybackError::IndexOutOfBounds { index: 3, len: 1 })
        );
        assert!(store.current().is_none());
    }

    #[test]
    fn queries_use_track_identity() {
        let mut store = store_with(&["a", "b"]);
        store.play_at_index(1).unwrap();

        let mut other_b = create_test_item("b");
        other_b.id = "mirror".to_string();
        other_b.title = "Mirror".to_string();

        assert!(store.is_in_playlist(&other_b));
        assert!(store.is_current_media(&other_b));
        assert!(!store.is_current_media(&create_test_item("a")));
    }

    #[test]
    fn snapshot_mirrors_state() {
        let mut store = store_with(&["a", "b"]);
        store.play_at_index(1).unwrap();
        store.toggle_mute();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.current_index, Some(1));
        assert!(snapshot.is_muted);
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.playlist.len(), 2);
        assert_eq!(snapshot.history.len(), 1);
        assert!(snapshot.is_current_media(&create_test_item("b")));
    }
}
