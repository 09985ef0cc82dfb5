//! Synchronization rules, driven step by step
//!
//! A small harness plays the runtime's role: it mounts simulated engines,
//! records armed timers and fires them on demand. No tokio involved.

use onair_core::{ContentType, MediaItem, MediaKind};
use onair_engine::{
    AdapterState, EngineEventSink, EngineHost, EngineSignal, EngineStateCode, SimulatedHost,
};
use onair_sync::{Action, Effect, PlayerConfig, SyncCore, TimerKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Harness =====

type Inbox = Arc<Mutex<Vec<(u64, EngineSignal)>>>;

struct Harness {
    core: SyncCore,
    host: SimulatedHost,
    inbox: Inbox,
    timers: HashMap<TimerKind, (Duration, u64)>,
    polling: bool,
    mounts: Vec<(String, u64)>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    fn with_config(config: PlayerConfig) -> Self {
        let host = SimulatedHost::new();
        host.update(|s| {
            s.duration = 180.0;
            s.metadata.title = "Engine title".to_string();
        });
        Self {
            core: SyncCore::new(&config),
            host,
            inbox: Arc::default(),
            timers: HashMap::new(),
            polling: false,
            mounts: Vec::new(),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Mount {
                    embed_id,
                    generation,
                } => {
                    self.mounts.push((embed_id.clone(), generation));
                    let inbox = Arc::clone(&self.inbox);
                    let sink = EngineEventSink::new(
                        generation,
                        Arc::new(move |generation: u64, signal: EngineSignal| {
                            inbox.lock().unwrap().push((generation, signal));
                        }),
                    );
                    if let Err(err) = self.host.mount(&embed_id, sink) {
                        let follow_up = self.core.on_mount_failed(generation, err);
                        self.apply(follow_up);
                    }
                }
                Effect::Unmount { generation } => {
                    self.host.unmount(generation);
                }
                Effect::Schedule {
                    timer,
                    after,
                    generation,
                } => {
                    self.timers.insert(timer, (after, generation));
                }
                Effect::Cancel(timer) => {
                    self.timers.remove(&timer);
                }
                Effect::StartPoll { .. } => self.polling = true,
                Effect::StopPoll => self.polling = false,
            }
        }
    }

    /// Feed queued engine signals to the core until none are left
    fn deliver(&mut self) {
        loop {
            let signals = std::mem::take(&mut *self.inbox.lock().unwrap());
            if signals.is_empty() {
                break;
            }
            for (generation, signal) in signals {
                let effects = self.core.on_engine_signal(generation, signal);
                self.apply(effects);
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        let effects = self.core.dispatch(action);
        self.apply(effects);
        self.deliver();
    }

    /// Fire an armed timer; `false` if none of that kind is pending
    fn fire(&mut self, timer: TimerKind) -> bool {
        let Some((_, generation)) = self.timers.remove(&timer) else {
            return false;
        };
        let effects = self.core.on_timer(timer, generation);
        self.apply(effects);
        self.deliver();
        true
    }

    fn emit(&mut self, state: EngineStateCode) {
        assert!(self.host.emit_state(state), "no engine mounted");
        self.deliver();
    }

    fn poll(&mut self) {
        let effects = self.core.on_poll_tick();
        self.apply(effects);
    }

    fn commands(&self) -> Vec<String> {
        self.host.state().commands
    }

    fn clear_commands(&self) {
        self.host.update(|s| s.commands.clear());
    }

    /// Select an item and let its engine come up
    fn start(&mut self, item: MediaItem) {
        self.dispatch(Action::SetCurrentMedia(item));
        assert!(self.fire(TimerKind::Probe));
        assert!(self.core.adapter().is_ready());
    }

    fn exhaust_probes(&mut self) {
        for _ in 0..2 {
            assert!(self.fire(TimerKind::Probe));
            assert!(self.fire(TimerKind::RetryBackoff));
        }
        assert!(self.fire(TimerKind::Probe));
    }

    fn slug(&self) -> Option<String> {
        self.core.store().current().map(|item| item.slug.clone())
    }
}

fn station(slug: &str) -> MediaItem {
    MediaItem::new(format!("id-{}", slug), ContentType::Station, slug, slug.to_uppercase())
        .with_source_url(format!("https://youtu.be/vid-{}", slug))
}

fn speech(slug: &str) -> MediaItem {
    MediaItem::new(format!("id-{}", slug), ContentType::Article, slug, slug)
        .with_media_kind(MediaKind::SynthesizedSpeech)
}

// ===== Engine lifecycle =====

#[test]
fn selecting_item_mounts_engine_and_autoplays() {
    let mut h = Harness::new();
    h.dispatch(Action::SetCurrentMedia(station("a")));

    assert_eq!(h.mounts, vec![("vid-a".to_string(), 1)]);
    assert_eq!(h.core.adapter().state(), AdapterState::ProbeInFlight);
    assert_eq!(
        h.timers.get(&TimerKind::Probe),
        Some(&(Duration::from_millis(500), 1))
    );
    // Nothing reaches the engine before the probe
    assert!(h.commands().is_empty());
    assert!(!h.polling);

    assert!(h.fire(TimerKind::Probe));
    assert_eq!(h.commands(), vec!["set_volume", "unmute"]);
    assert!(h.polling);
    assert_eq!(
        h.timers.get(&TimerKind::Autoplay),
        Some(&(Duration::from_millis(200), 1))
    );

    assert!(h.fire(TimerKind::Autoplay));
    assert_eq!(h.commands().last().map(String::as_str), Some("play"));

    let snapshot = h.core.snapshot();
    assert_eq!(snapshot.engine.state, AdapterState::Ready);
    assert_eq!(snapshot.engine.duration, Some(180.0));
    assert_eq!(snapshot.engine.metadata.unwrap().title, "Engine title");
    assert_eq!(snapshot.engine.embed_id.as_deref(), Some("vid-a"));
}

#[test]
fn reselecting_same_media_keeps_engine() {
    let mut h = Harness::new();
    h.start(station("a"));
    h.fire(TimerKind::Autoplay);

    h.dispatch(Action::SetCurrentMedia(station("a")));

    assert_eq!(h.mounts.len(), 1);
    assert!(h.timers.contains_key(&TimerKind::PlayPause));
    h.clear_commands();
    h.fire(TimerKind::PlayPause);
    assert_eq!(h.commands(), vec!["play"]);
}

#[test]
fn track_change_remounts_and_drops_old_timers() {
    let mut h = Harness::new();
    h.dispatch(Action::AddToPlaylist(station("b")));
    h.start(station("a"));
    h.dispatch(Action::SetVolume(30));
    assert!(h.timers.contains_key(&TimerKind::Volume));

    h.dispatch(Action::PlayAtIndex(0));

    assert_eq!(h.slug().as_deref(), Some("b"));
    assert_eq!(h.mounts.last(), Some(&("vid-b".to_string(), 2)));
    assert_eq!(h.host.state().unmounts, 1);
    assert!(!h.timers.contains_key(&TimerKind::Volume));
    assert!(!h.timers.contains_key(&TimerKind::Autoplay));
    assert!(!h.polling);
    assert_eq!(h.core.adapter().state(), AdapterState::ProbeInFlight);
}

#[test]
fn timers_from_previous_engine_are_ignored() {
    let mut h = Harness::new();
    h.dispatch(Action::AddToPlaylist(station("b")));
    h.start(station("a"));
    h.dispatch(Action::PlayAtIndex(0));
    h.fire(TimerKind::Probe);
    h.clear_commands();

    // A pause timer armed for generation 1 fires late
    let effects = h.core.on_timer(TimerKind::PlayPause, 1);
    assert!(effects.is_empty());
    assert!(h.commands().is_empty());
}

#[test]
fn media_without_embed_leaves_engine_unmounted() {
    let mut h = Harness::new();
    h.start(station("a"));

    h.dispatch(Action::SetCurrentMedia(speech("brief")));

    assert_eq!(h.host.state().unmounts, 1);
    assert_eq!(h.core.adapter().state(), AdapterState::Uninitialized);
    assert!(h.core.snapshot().engine.embed_id.is_none());

    // No engine: transport changes schedule nothing
    h.dispatch(Action::TogglePlay);
    assert!(h.timers.is_empty());
}

// ===== Debounced commands =====

#[test]
fn play_pause_debounce_keeps_latest_value() {
    let mut h = Harness::new();
    h.start(station("a"));
    h.fire(TimerKind::Autoplay);
    h.clear_commands();

    h.dispatch(Action::TogglePlay);
    h.dispatch(Action::TogglePlay);
    h.dispatch(Action::TogglePlay);

    assert_eq!(
        h.timers.get(&TimerKind::PlayPause).map(|(after, _)| *after),
        Some(Duration::from_millis(500))
    );
    h.fire(TimerKind::PlayPause);
    assert_eq!(h.commands(), vec!["pause"]);
}

#[test]
fn play_pause_scheduled_while_probe_pending() {
    let mut h = Harness::new();
    h.dispatch(Action::SetCurrentMedia(station("a")));
    h.dispatch(Action::TogglePlay);
    assert!(h.timers.contains_key(&TimerKind::PlayPause));

    // Fires before readiness: dropped by the adapter
    h.fire(TimerKind::PlayPause);
    assert!(h.commands().is_empty());
}

#[test]
fn mute_and_volume_wait_for_readiness() {
    let mut h = Harness::new();
    h.dispatch(Action::SetCurrentMedia(station("a")));
    h.dispatch(Action::ToggleMute);
    h.dispatch(Action::SetVolume(30));
    assert!(!h.timers.contains_key(&TimerKind::Mute));
    assert!(!h.timers.contains_key(&TimerKind::Volume));

    // Readiness pushes the current values instead
    h.fire(TimerKind::Probe);
    assert_eq!(h.commands(), vec!["set_volume", "mute"]);
    assert_eq!(h.host.state().volume, 30);
    assert!(h.host.state().muted);

    h.clear_commands();
    h.dispatch(Action::SetVolume(250));
    assert_eq!(
        h.timers.get(&TimerKind::Volume).map(|(after, _)| *after),
        Some(Duration::from_millis(200))
    );
    h.fire(TimerKind::Volume);
    h.dispatch(Action::ToggleMute);
    h.fire(TimerKind::Mute);
    assert_eq!(h.commands(), vec!["set_volume", "unmute"]);
    assert_eq!(h.host.state().volume, 100);
}

// ===== Polling =====

#[test]
fn poll_runs_only_while_playing_and_ready() {
    let mut h = Harness::new();
    h.dispatch(Action::SetCurrentMedia(station("a")));
    assert!(!h.polling);

    h.fire(TimerKind::Probe);
    assert!(h.polling);

    h.dispatch(Action::SetPlaying(false));
    assert!(!h.polling);

    h.dispatch(Action::SetPlaying(true));
    assert!(h.polling);
}

#[test]
fn poll_writes_elapsed_and_skips_bad_reads() {
    let mut h = Harness::new();
    h.start(station("a"));

    h.host.update(|s| s.position = 12.5);
    h.poll();
    assert_eq!(h.core.store().elapsed_seconds(), 12.5);

    h.host.update(|s| s.position = f64::NAN);
    h.poll();
    assert_eq!(h.core.store().elapsed_seconds(), 12.5);

    h.host.update(|s| s.position = f64::INFINITY);
    h.poll();
    assert_eq!(h.core.store().elapsed_seconds(), 12.5);

    // A throwing engine reads as zero
    h.host.update(|s| s.fail_reads = true);
    h.poll();
    assert_eq!(h.core.store().elapsed_seconds(), 0.0);
}

// ===== Engine lifecycle signals =====

#[test]
fn ended_advances_through_playlist() {
    let mut h = Harness::new();
    h.dispatch(Action::AddToPlaylist(station("a")));
    h.dispatch(Action::AddToPlaylist(station("b")));
    h.dispatch(Action::PlayAtIndex(0));
    h.fire(TimerKind::Probe);

    h.emit(EngineStateCode::Ended);

    assert_eq!(h.slug().as_deref(), Some("b"));
    assert!(h.core.store().is_playing());
    let history: Vec<_> = h
        .core
        .store()
        .history()
        .iter()
        .map(|item| item.slug.clone())
        .collect();
    assert_eq!(history, vec!["a", "b"]);
    assert_eq!(h.mounts.last(), Some(&("vid-b".to_string(), 2)));
}

#[test]
fn ended_on_single_item_stops() {
    let mut h = Harness::new();
    h.start(station("a"));

    h.emit(EngineStateCode::Ended);

    assert_eq!(h.slug().as_deref(), Some("a"));
    assert!(!h.core.store().is_playing());
    assert!(!h.polling);
}

#[test]
fn ended_with_auto_advance_off_stops() {
    let mut h = Harness::new();
    h.dispatch(Action::AddToPlaylist(station("b")));
    h.start(station("a"));
    h.dispatch(Action::SetAutoAdvance(false));

    h.emit(EngineStateCode::Ended);

    assert_eq!(h.slug().as_deref(), Some("a"));
    assert!(!h.core.store().is_playing());
    assert!(!h.core.snapshot().auto_advance);
}

#[test]
fn engine_transport_changes_reconcile_store() {
    let mut h = Harness::new();
    h.start(station("a"));

    h.emit(EngineStateCode::Paused);
    assert!(!h.core.store().is_playing());

    h.emit(EngineStateCode::Playing);
    assert!(h.core.store().is_playing());

    // Buffering changes nothing
    h.emit(EngineStateCode::Buffering);
    assert!(h.core.store().is_playing());
}

#[test]
fn state_signal_short_circuits_retry() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_probes = 5);
    h.dispatch(Action::SetCurrentMedia(station("a")));
    h.fire(TimerKind::Probe);
    assert_eq!(h.core.adapter().state(), AdapterState::Retrying);
    assert!(h.timers.contains_key(&TimerKind::RetryBackoff));

    h.emit(EngineStateCode::Buffering);

    assert_eq!(h.core.adapter().state(), AdapterState::Ready);
    assert!(!h.timers.contains_key(&TimerKind::RetryBackoff));
    assert!(h.timers.contains_key(&TimerKind::Autoplay));
    assert!(h.polling);
}

// ===== Degradation and recovery =====

#[test]
fn exhausted_probes_degrade_then_recover_once() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_probes = 6);
    h.dispatch(Action::SetCurrentMedia(station("a")));

    h.exhaust_probes();
    let snapshot = h.core.snapshot();
    assert_eq!(snapshot.engine.state, AdapterState::DegradedReady);
    assert_eq!(snapshot.engine.retry_count, 0);
    assert!(snapshot.engine.last_error.is_none());
    assert!(snapshot.engine.degraded_cause.is_some());
    assert_eq!(
        h.timers.get(&TimerKind::Recovery).map(|(after, _)| *after),
        Some(Duration::from_secs(5))
    );

    // One remount of the same media
    assert!(h.fire(TimerKind::Recovery));
    assert_eq!(h.mounts, vec![("vid-a".to_string(), 1), ("vid-a".to_string(), 2)]);
    assert_eq!(h.core.adapter().state(), AdapterState::ProbeInFlight);

    h.exhaust_probes();
    assert_eq!(h.core.adapter().state(), AdapterState::DegradedReady);
    assert!(!h.timers.contains_key(&TimerKind::Recovery));
}

#[test]
fn recovery_skipped_once_engine_recovers() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_probes = 3);
    h.dispatch(Action::SetCurrentMedia(station("a")));
    h.exhaust_probes();

    // Next track replaces the degraded engine before recovery fires
    h.dispatch(Action::SetCurrentMedia(station("b")));
    assert!(!h.timers.contains_key(&TimerKind::Recovery));
    let late = h.core.on_timer(TimerKind::Recovery, 1);
    assert!(!late
        .iter()
        .any(|effect| matches!(effect, Effect::Mount { .. })));
}

#[test]
fn live_degraded_engine_is_not_remounted() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_probes = 3);
    h.dispatch(Action::SetCurrentMedia(station("a")));
    h.exhaust_probes();
    assert!(h.timers.contains_key(&TimerKind::Recovery));

    // Engine reports playback, so it is alive after all
    h.emit(EngineStateCode::Playing);
    assert_eq!(h.core.adapter().state(), AdapterState::Ready);
    assert!(h.core.snapshot().engine.degraded_cause.is_none());
    assert!(!h.timers.contains_key(&TimerKind::Recovery));

    h.host.update(|s| s.position = 4.0);
    h.poll();
    assert_eq!(h.core.store().elapsed_seconds(), 4.0);

    let late = h.core.on_timer(TimerKind::Recovery, 1);
    assert!(late.is_empty());
    assert_eq!(h.mounts.len(), 1);
    assert_eq!(h.core.adapter().state(), AdapterState::Ready);
}

#[test]
fn recovery_remount_drops_stale_engine_info() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_probes = 3);
    h.dispatch(Action::SetCurrentMedia(station("a")));
    h.exhaust_probes();

    let snapshot = h.core.snapshot();
    assert_eq!(snapshot.engine.duration, Some(180.0));
    assert!(snapshot.engine.metadata.is_some());

    assert!(h.fire(TimerKind::Recovery));
    let snapshot = h.core.snapshot();
    assert_eq!(snapshot.engine.generation, 2);
    assert_eq!(snapshot.engine.embed_id.as_deref(), Some("vid-a"));
    assert!(snapshot.engine.duration.is_none());
    assert!(snapshot.engine.metadata.is_none());

    assert!(h.fire(TimerKind::Probe));
    assert_eq!(h.core.snapshot().engine.duration, Some(180.0));
}

#[test]
fn failed_mount_remounts_on_reselect() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_mounts = 1);
    h.dispatch(Action::SetCurrentMedia(station("a")));

    let snapshot = h.core.snapshot();
    assert_eq!(snapshot.engine.state, AdapterState::Uninitialized);
    assert!(snapshot.engine.embed_id.is_none());
    assert!(snapshot.engine.last_error.is_some());
    assert_eq!(h.host.state().mounts, 0);

    // Same track again gets a fresh mount
    h.start(station("a"));
    assert_eq!(h.mounts, vec![("vid-a".to_string(), 1), ("vid-a".to_string(), 2)]);
    assert_eq!(h.host.state().mounts, 1);
    assert!(h.core.snapshot().engine.last_error.is_none());
    assert!(!h.timers.contains_key(&TimerKind::Recovery));
}

#[test]
fn failed_mount_retried_after_delay() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_mounts = 1);
    h.dispatch(Action::SetCurrentMedia(station("a")));
    assert_eq!(
        h.timers.get(&TimerKind::Recovery),
        Some(&(Duration::from_secs(5), 1))
    );

    assert!(h.fire(TimerKind::Recovery));
    assert_eq!(h.host.state().embed_id.as_deref(), Some("vid-a"));
    assert!(h.fire(TimerKind::Probe));
    assert_eq!(h.core.adapter().state(), AdapterState::Ready);
    assert!(h.fire(TimerKind::Autoplay));
    assert!(h.host.state().playing);
}

#[test]
fn repeated_mount_failures_stop_retrying() {
    let mut h = Harness::new();
    h.host.update(|s| s.failing_mounts = 2);
    h.dispatch(Action::SetCurrentMedia(station("a")));

    assert!(h.fire(TimerKind::Recovery));
    assert_eq!(h.mounts.len(), 2);
    assert!(!h.timers.contains_key(&TimerKind::Recovery));
    assert!(h.core.snapshot().engine.last_error.is_some());
}

#[test]
fn clearing_playlist_unmounts_engine() {
    let mut h = Harness::new();
    h.start(station("a"));

    h.dispatch(Action::ClearPlaylist);

    assert!(h.core.store().current().is_none());
    assert_eq!(h.host.state().unmounts, 1);
    assert!(!h.polling);
    assert!(h.timers.is_empty());
    assert_eq!(h.core.adapter().state(), AdapterState::Uninitialized);
}

#[test]
fn shutdown_unmounts_and_cancels() {
    let mut h = Harness::new();
    h.start(station("a"));

    let effects = h.core.shutdown();
    assert!(effects.contains(&Effect::Unmount { generation: 1 }));
    assert!(effects.contains(&Effect::StopPoll));
    assert!(effects.contains(&Effect::Cancel(TimerKind::Autoplay)));
}
