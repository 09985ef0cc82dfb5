//! Synchronization core
//!
//! Reacts to store transitions, engine signals and timer fires, and tells
//! the runtime what to do next as a list of [`Effect`]s. Holds no timers
//! and performs no I/O, so every decision here is deterministic.

use onair_core::MediaItem;
use onair_engine::{
    AdapterState, EngineError, EngineMetadata, EngineSignal, EngineStateCode, PlayerAdapter,
    ProbeOutcome,
};
use onair_playback::{PlaybackError, PlaybackStore, SessionSnapshot, StoreEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{PlayerConfig, SyncSettings};

/// One-shot timers the runtime keeps, at most one pending per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Debounced play/pause command
    PlayPause,
    /// Debounced mute/unmute command
    Mute,
    /// Debounced volume command
    Volume,
    /// Readiness probe after the settle delay
    Probe,
    /// Wait between failed probes
    RetryBackoff,
    /// Play shortly after the engine became ready
    Autoplay,
    /// Remount a degraded engine
    Recovery,
}

impl TimerKind {
    pub const ALL: [TimerKind; 7] = [
        Self::PlayPause,
        Self::Mute,
        Self::Volume,
        Self::Probe,
        Self::RetryBackoff,
        Self::Autoplay,
        Self::Recovery,
    ];
}

/// What the runtime must do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Mount an engine instance bound to `generation`
    Mount { embed_id: String, generation: u64 },
    /// Tear down the instance of `generation`
    Unmount { generation: u64 },
    /// Arm a timer, replacing any pending one of the same kind
    Schedule {
        timer: TimerKind,
        after: Duration,
        generation: u64,
    },
    /// Drop a pending timer
    Cancel(TimerKind),
    /// Start the periodic position poll
    StartPoll { every: Duration },
    StopPoll,
}

/// User-facing triggers
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCurrentMedia(MediaItem),
    TogglePlay,
    SetPlaying(bool),
    ToggleMute,
    SetVolume(i32),
    SetElapsedSeconds(f64),
    AddToPlaylist(MediaItem),
    RemoveFromPlaylist(MediaItem),
    ClearPlaylist,
    PlayNext,
    PlayPrevious,
    PlayAtIndex(usize),
    SetAutoAdvance(bool),
}

/// Engine-side part of the published snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub state: AdapterState,
    pub generation: u64,
    pub embed_id: Option<String>,
    /// Media length reported after readiness
    pub duration: Option<f64>,
    pub metadata: Option<EngineMetadata>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Why the engine is running degraded
    pub degraded_cause: Option<String>,
}

/// Everything a UI needs to render the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub session: SessionSnapshot,
    pub engine: EngineStatus,
    pub auto_advance: bool,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            session: SessionSnapshot::default(),
            engine: EngineStatus::default(),
            auto_advance: true,
        }
    }
}

/// Store, adapter and the rules tying them together
#[derive(Debug)]
pub struct SyncCore {
    store: PlaybackStore,
    adapter: PlayerAdapter,
    settings: SyncSettings,
    auto_advance: bool,

    mounted_embed: Option<String>,
    polling: bool,
    recovery_remounts: u32,

    duration: Option<f64>,
    metadata: Option<EngineMetadata>,
    mount_error: Option<EngineError>,
}

impl SyncCore {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            store: PlaybackStore::new(config.playback.clone()),
            adapter: PlayerAdapter::new(config.adapter_config()),
            settings: config.sync.clone(),
            auto_advance: config.sync.auto_advance,
            mounted_embed: None,
            polling: false,
            recovery_remounts: 0,
            duration: None,
            metadata: None,
            mount_error: None,
        }
    }

    pub fn store(&self) -> &PlaybackStore {
        &self.store
    }

    pub fn adapter(&self) -> &PlayerAdapter {
        &self.adapter
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    // ===== Inputs =====

    /// Apply a user action
    ///
    /// Rejected actions are logged and leave everything unchanged.
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let result = match action {
            Action::SetCurrentMedia(item) => self.store.set_current_media(item),
            Action::TogglePlay => self.store.toggle_play(),
            Action::SetPlaying(playing) => self.store.set_playing(playing),
            Action::ToggleMute => {
                self.store.toggle_mute();
                Ok(())
            }
            Action::SetVolume(level) => {
                self.store.set_volume(level);
                Ok(())
            }
            Action::SetElapsedSeconds(seconds) => self.store.set_elapsed_seconds(seconds),
            Action::AddToPlaylist(item) => self.store.add_to_playlist(item).map(|_| ()),
            Action::RemoveFromPlaylist(item) => self.store.remove_from_playlist(&item),
            Action::ClearPlaylist => {
                self.store.clear_playlist();
                Ok(())
            }
            Action::PlayNext => self.store.play_next(),
            Action::PlayPrevious => self.store.play_previous(),
            Action::PlayAtIndex(index) => self.store.play_at_index(index),
            Action::SetAutoAdvance(enabled) => {
                info!(enabled, "Auto-advance toggled");
                self.auto_advance = enabled;
                Ok(())
            }
        };

        Self::absorb(result);
        self.react()
    }

    /// Handle a signal from a mounted engine
    pub fn on_engine_signal(&mut self, generation: u64, signal: EngineSignal) -> Vec<Effect> {
        let mut effects = Vec::new();

        match signal {
            EngineSignal::Ready(handle) => {
                if let Some(settle) = self.adapter.on_engine_ready(generation, handle) {
                    effects.push(self.schedule(TimerKind::Probe, settle));
                }
            }
            EngineSignal::StateChange(code) => {
                let change = self.adapter.on_state_change(generation, code);
                if change.promoted {
                    effects.push(Effect::Cancel(TimerKind::Probe));
                    effects.push(Effect::Cancel(TimerKind::RetryBackoff));
                    effects.push(Effect::Cancel(TimerKind::Recovery));
                    effects.extend(self.after_ready(false));
                }
                if let Some(state) = change.state {
                    self.on_lifecycle(state);
                }
            }
        }

        effects.extend(self.react());
        effects
    }

    /// Handle a timer fire
    ///
    /// Timers armed for an older engine generation are ignored.
    pub fn on_timer(&mut self, timer: TimerKind, generation: u64) -> Vec<Effect> {
        if generation != self.adapter.generation() {
            debug!(?timer, generation, "Ignoring timer from previous engine");
            return Vec::new();
        }

        let mut effects = Vec::new();
        match timer {
            TimerKind::PlayPause => {
                if self.store.is_playing() {
                    self.adapter.play();
                } else {
                    self.adapter.pause();
                }
            }
            TimerKind::Mute => self.push_mute(),
            TimerKind::Volume => {
                self.adapter.set_volume(self.store.volume());
            }
            TimerKind::Probe => match self.adapter.run_probe(generation) {
                ProbeOutcome::Ready => effects.extend(self.after_ready(false)),
                ProbeOutcome::Degraded => effects.extend(self.after_ready(true)),
                ProbeOutcome::RetryAfter(backoff) => {
                    effects.push(self.schedule(TimerKind::RetryBackoff, backoff));
                }
                ProbeOutcome::Skipped => {}
            },
            TimerKind::RetryBackoff => {
                if let Some(settle) = self.adapter.retry_due(generation) {
                    effects.push(self.schedule(TimerKind::Probe, settle));
                }
            }
            TimerKind::Autoplay => {
                if self.store.is_playing() {
                    self.adapter.play();
                }
            }
            TimerKind::Recovery => effects.extend(self.recover()),
        }

        effects.extend(self.react());
        effects
    }

    /// Periodic position poll
    pub fn on_poll_tick(&mut self) -> Vec<Effect> {
        if self.store.is_playing() && self.adapter.is_ready() {
            match self.adapter.current_time() {
                Some(seconds) if seconds.is_finite() => {
                    Self::absorb(self.store.set_elapsed_seconds(seconds));
                }
                other => debug!(?other, "Skipping unusable position read"),
            }
        }
        self.react()
    }

    /// Host failed to mount an engine instance
    ///
    /// Nothing stays mounted, so selecting the track again mounts afresh.
    /// Within the recovery budget a remount is also scheduled.
    pub fn on_mount_failed(&mut self, generation: u64, err: EngineError) -> Vec<Effect> {
        if generation != self.adapter.generation() {
            return Vec::new();
        }

        warn!(generation, "Engine mount failed: {}", err);
        self.mounted_embed = None;
        self.mount_error = Some(err);

        if self.recovery_remounts < self.settings.max_recovery_remounts {
            vec![self.schedule(TimerKind::Recovery, self.settings.recovery_delay())]
        } else {
            Vec::new()
        }
    }

    /// Tear everything down
    pub fn shutdown(&mut self) -> Vec<Effect> {
        info!("Sync core shutting down");
        let mut effects = self.cancel_engine_work();
        if self.mounted_embed.take().is_some() {
            effects.push(Effect::Unmount {
                generation: self.adapter.generation(),
            });
        }
        self.adapter.remount();
        effects
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let last_error = self
            .adapter
            .last_error()
            .or(self.mount_error.as_ref())
            .map(ToString::to_string);

        PlayerSnapshot {
            session: self.store.snapshot(),
            engine: EngineStatus {
                state: self.adapter.state(),
                generation: self.adapter.generation(),
                embed_id: self.mounted_embed.clone(),
                duration: self.duration,
                metadata: self.metadata.clone(),
                retry_count: self.adapter.retry_count(),
                last_error,
                degraded_cause: self.adapter.degraded_cause().map(ToString::to_string),
            },
            auto_advance: self.auto_advance,
        }
    }

    // ===== Reactions =====

    /// Turn queued store events into engine work
    fn react(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        for event in self.store.drain_events() {
            match event {
                StoreEvent::TrackChanged { current, .. } => {
                    effects.extend(self.on_track_changed(current.as_ref()));
                }
                StoreEvent::PlayingChanged { is_playing } => {
                    if self.adapter.has_handle() {
                        debug!(is_playing, "Scheduling play/pause");
                        effects.push(
                            self.schedule(TimerKind::PlayPause, self.settings.play_pause_debounce()),
                        );
                    }
                }
                StoreEvent::MuteChanged { .. } => {
                    if self.adapter.is_ready() {
                        effects.push(self.schedule(TimerKind::Mute, self.settings.mute_debounce()));
                    }
                }
                StoreEvent::VolumeChanged { .. } => {
                    if self.adapter.is_ready() {
                        effects
                            .push(self.schedule(TimerKind::Volume, self.settings.volume_debounce()));
                    }
                }
                StoreEvent::PlaylistChanged { length } => {
                    debug!(length, "Playlist changed");
                }
            }
        }

        effects.extend(self.update_poll());
        effects
    }

    fn on_track_changed(&mut self, current: Option<&MediaItem>) -> Vec<Effect> {
        let embed_id = current.and_then(MediaItem::embed_id);

        if embed_id.is_some() && embed_id == self.mounted_embed {
            // Same media re-selected: keep the engine, restart playback
            if self.store.is_playing() && self.adapter.has_handle() {
                return vec![self.schedule(
                    TimerKind::PlayPause,
                    self.settings.play_pause_debounce(),
                )];
            }
            return Vec::new();
        }

        let mut effects = self.cancel_engine_work();
        if self.mounted_embed.take().is_some() {
            effects.push(Effect::Unmount {
                generation: self.adapter.generation(),
            });
        }

        self.recovery_remounts = 0;
        self.clear_engine_info();
        let generation = self.adapter.remount();

        match embed_id {
            Some(embed_id) => {
                info!(%embed_id, generation, "Mounting engine for new track");
                self.mounted_embed = Some(embed_id.clone());
                effects.push(Effect::Mount {
                    embed_id,
                    generation,
                });
            }
            None => {
                if let Some(item) = current {
                    debug!("No embeddable media for {}", item.label());
                }
            }
        }

        effects
    }

    fn on_lifecycle(&mut self, state: EngineStateCode) {
        match state {
            EngineStateCode::Ended => {
                if self.auto_advance && self.store.playlist_len() > 1 {
                    info!("Track ended, advancing");
                    Self::absorb(self.store.play_next());
                } else {
                    info!("Track ended, stopping");
                    Self::absorb(self.store.set_playing(false));
                }
            }
            EngineStateCode::Playing if !self.store.is_playing() => {
                debug!("Engine playing on its own, syncing store");
                Self::absorb(self.store.set_playing(true));
            }
            EngineStateCode::Paused if self.store.is_playing() => {
                debug!("Engine paused on its own, syncing store");
                Self::absorb(self.store.set_playing(false));
            }
            _ => {}
        }
    }

    /// Bring a freshly ready engine in line with the store
    fn after_ready(&mut self, degraded: bool) -> Vec<Effect> {
        let mut effects = Vec::new();

        self.adapter.set_volume(self.store.volume());
        self.push_mute();
        self.duration = self.adapter.duration();
        self.metadata = self.adapter.metadata();

        if self.store.is_playing() {
            effects.push(self.schedule(TimerKind::Autoplay, self.settings.autoplay_delay()));
        }

        if degraded && self.recovery_remounts < self.settings.max_recovery_remounts {
            info!(
                delay_ms = self.settings.recovery_delay_ms,
                "Engine degraded, scheduling recovery remount"
            );
            effects.push(self.schedule(TimerKind::Recovery, self.settings.recovery_delay()));
        }

        effects
    }

    /// Remount a degraded engine, or retry a mount the host refused
    fn recover(&mut self) -> Vec<Effect> {
        let mount_failed = self.mounted_embed.is_none() && self.mount_error.is_some();
        if self.adapter.state() != AdapterState::DegradedReady && !mount_failed {
            return Vec::new();
        }
        let Some(embed_id) = self.store.current().and_then(MediaItem::embed_id) else {
            return Vec::new();
        };

        self.recovery_remounts += 1;
        warn!(
            %embed_id,
            attempt = self.recovery_remounts,
            "Remounting engine"
        );

        let mut effects = self.cancel_engine_work();
        if self.mounted_embed.take().is_some() {
            effects.push(Effect::Unmount {
                generation: self.adapter.generation(),
            });
        }

        self.clear_engine_info();
        let generation = self.adapter.remount();
        self.mounted_embed = Some(embed_id.clone());
        effects.push(Effect::Mount {
            embed_id,
            generation,
        });
        effects
    }

    fn update_poll(&mut self) -> Option<Effect> {
        let wanted = self.store.is_playing() && self.adapter.is_ready();
        if wanted == self.polling {
            return None;
        }

        self.polling = wanted;
        if wanted {
            debug!("Starting position poll");
            Some(Effect::StartPoll {
                every: self.settings.poll_interval(),
            })
        } else {
            debug!("Stopping position poll");
            Some(Effect::StopPoll)
        }
    }

    // ===== Helpers =====

    fn push_mute(&mut self) {
        if self.store.is_muted() {
            self.adapter.mute();
        } else {
            self.adapter.unmute();
        }
    }

    fn clear_engine_info(&mut self) {
        self.duration = None;
        self.metadata = None;
        self.mount_error = None;
    }

    fn schedule(&self, timer: TimerKind, after: Duration) -> Effect {
        Effect::Schedule {
            timer,
            after,
            generation: self.adapter.generation(),
        }
    }

    fn cancel_engine_work(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = TimerKind::ALL.into_iter().map(Effect::Cancel).collect();
        if self.polling {
            self.polling = false;
            effects.push(Effect::StopPoll);
        }
        effects
    }

    fn absorb(result: Result<(), PlaybackError>) {
        if let Err(err) = result {
            debug!("Action had no effect: {}", err);
        }
    }
}
