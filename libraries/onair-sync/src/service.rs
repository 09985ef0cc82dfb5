//! Playback service
//!
//! A single tokio task owns the [`SyncCore`] and the engine host. UI
//! actions, engine signals, timer fires and poll ticks all arrive as
//! messages on one channel and are handled one at a time, so the store is
//! never observed mid-mutation.
//!
//! Timers and engine callbacks hold weak senders: once every
//! [`PlaybackClient`] is dropped the channel closes and the task stops.

use onair_core::MediaItem;
use onair_engine::{EngineEventSink, EngineHost, EngineSignal};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::error::{Result, SyncError};
use crate::glue::{Action, Effect, PlayerSnapshot, SyncCore, TimerKind};

enum Message {
    Action(Action),
    Engine { generation: u64, signal: EngineSignal },
    TimerFired { timer: TimerKind, token: u64 },
    PollTick { token: u64 },
    Snapshot(oneshot::Sender<PlayerSnapshot>),
    Shutdown,
}

/// Handle for driving the playback service
///
/// Cheap to clone; every clone talks to the same service.
#[derive(Clone)]
pub struct PlaybackClient {
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<PlayerSnapshot>,
}

impl PlaybackClient {
    pub fn set_current_media(&self, item: MediaItem) -> Result<()> {
        self.send(Action::SetCurrentMedia(item))
    }

    pub fn toggle_play(&self) -> Result<()> {
        self.send(Action::TogglePlay)
    }

    pub fn set_playing(&self, playing: bool) -> Result<()> {
        self.send(Action::SetPlaying(playing))
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(Action::ToggleMute)
    }

    /// Any integer is accepted; the store clamps to 0-100
    pub fn set_volume(&self, level: i32) -> Result<()> {
        self.send(Action::SetVolume(level))
    }

    pub fn set_elapsed_seconds(&self, seconds: f64) -> Result<()> {
        self.send(Action::SetElapsedSeconds(seconds))
    }

    pub fn add_to_playlist(&self, item: MediaItem) -> Result<()> {
        self.send(Action::AddToPlaylist(item))
    }

    pub fn remove_from_playlist(&self, item: MediaItem) -> Result<()> {
        self.send(Action::RemoveFromPlaylist(item))
    }

    pub fn clear_playlist(&self) -> Result<()> {
        self.send(Action::ClearPlaylist)
    }

    pub fn play_next(&self) -> Result<()> {
        self.send(Action::PlayNext)
    }

    pub fn play_previous(&self) -> Result<()> {
        self.send(Action::PlayPrevious)
    }

    pub fn play_at_index(&self, index: usize) -> Result<()> {
        self.send(Action::PlayAtIndex(index))
    }

    pub fn set_auto_advance(&self, enabled: bool) -> Result<()> {
        self.send(Action::SetAutoAdvance(enabled))
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Snapshot taken after every message sent so far was handled
    pub async fn settled_snapshot(&self) -> Result<PlayerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Message::Snapshot(reply))
            .map_err(|_| SyncError::ServiceStopped)?;
        response.await.map_err(|_| SyncError::ServiceStopped)
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    pub fn is_in_playlist(&self, item: &MediaItem) -> bool {
        self.snapshot.borrow().session.is_in_playlist(item)
    }

    pub fn is_current_media(&self, item: &MediaItem) -> bool {
        self.snapshot.borrow().session.is_current_media(item)
    }

    /// Stop the service, unmounting the engine
    pub fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Message::Shutdown)
            .map_err(|_| SyncError::ServiceStopped)
    }

    fn send(&self, action: Action) -> Result<()> {
        self.tx
            .send(Message::Action(action))
            .map_err(|_| SyncError::ServiceStopped)
    }
}

struct PendingTimer {
    token: u64,
    generation: u64,
    handle: JoinHandle<()>,
}

/// Spawns and runs the playback actor
pub struct PlaybackService {
    core: SyncCore,
    host: Box<dyn EngineHost>,
    tx: mpsc::WeakUnboundedSender<Message>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    timers: HashMap<TimerKind, PendingTimer>,
    poll: Option<(u64, JoinHandle<()>)>,
    next_token: u64,
}

impl PlaybackService {
    /// Start the service on the current tokio runtime
    pub fn spawn(
        config: PlayerConfig,
        host: Box<dyn EngineHost>,
    ) -> (PlaybackClient, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let core = SyncCore::new(&config);
        let (snapshot_tx, snapshot_rx) = watch::channel(core.snapshot());

        let service = Self {
            core,
            host,
            tx: tx.downgrade(),
            snapshot_tx,
            timers: HashMap::new(),
            poll: None,
            next_token: 0,
        };

        info!("Starting playback service");
        let handle = tokio::spawn(service.run(rx));

        let client = PlaybackClient {
            tx,
            snapshot: snapshot_rx,
        };
        (client, handle)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = rx.recv().await {
            let effects = match message {
                Message::Action(action) => {
                    debug!(?action, "Handling action");
                    self.core.dispatch(action)
                }
                Message::Engine { generation, signal } => {
                    self.core.on_engine_signal(generation, signal)
                }
                Message::TimerFired { timer, token } => match self.timers.get(&timer) {
                    Some(pending) if pending.token == token => {
                        let generation = pending.generation;
                        self.timers.remove(&timer);
                        self.core.on_timer(timer, generation)
                    }
                    _ => {
                        debug!(?timer, token, "Ignoring superseded timer");
                        Vec::new()
                    }
                },
                Message::PollTick { token } => match &self.poll {
                    Some((current, _)) if *current == token => self.core.on_poll_tick(),
                    _ => Vec::new(),
                },
                Message::Snapshot(reply) => {
                    let _ = reply.send(self.core.snapshot());
                    continue;
                }
                Message::Shutdown => break,
            };

            self.apply(effects);
            self.publish();
        }

        let effects = self.core.shutdown();
        self.apply(effects);
        self.abort_all();
        self.publish();
        info!("Playback service stopped");
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Mount {
                    embed_id,
                    generation,
                } => self.mount(&embed_id, generation),
                Effect::Unmount { generation } => self.host.unmount(generation),
                Effect::Schedule {
                    timer,
                    after,
                    generation,
                } => self.schedule(timer, after, generation),
                Effect::Cancel(timer) => {
                    if let Some(pending) = self.timers.remove(&timer) {
                        pending.handle.abort();
                    }
                }
                Effect::StartPoll { every } => self.start_poll(every),
                Effect::StopPoll => {
                    if let Some((_, handle)) = self.poll.take() {
                        handle.abort();
                    }
                }
            }
        }
    }

    fn mount(&mut self, embed_id: &str, generation: u64) {
        let weak = self.tx.clone();
        let sink = EngineEventSink::new(
            generation,
            Arc::new(move |generation: u64, signal: EngineSignal| {
                if let Some(tx) = weak.upgrade() {
                    let _ = tx.send(Message::Engine { generation, signal });
                }
            }),
        );

        if let Err(err) = self.host.mount(embed_id, sink) {
            let follow_up = self.core.on_mount_failed(generation, err);
            self.apply(follow_up);
        }
    }

    fn schedule(&mut self, timer: TimerKind, after: Duration, generation: u64) {
        let token = self.next_token();
        let weak = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(Message::TimerFired { timer, token });
            }
        });

        let pending = PendingTimer {
            token,
            generation,
            handle,
        };
        if let Some(previous) = self.timers.insert(timer, pending) {
            previous.handle.abort();
        }
    }

    fn start_poll(&mut self, every: Duration) {
        let token = self.next_token();
        let weak = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(tx) = weak.upgrade() else { break };
                if tx.send(Message::PollTick { token }).is_err() {
                    break;
                }
            }
        });

        if let Some((_, previous)) = self.poll.replace((token, handle)) {
            previous.abort();
        }
    }

    fn abort_all(&mut self) {
        for (_, pending) in self.timers.drain() {
            pending.handle.abort();
        }
        if let Some((_, handle)) = self.poll.take() {
            handle.abort();
        }
    }

    fn publish(&self) {
        let snapshot = self.core.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn next_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}
