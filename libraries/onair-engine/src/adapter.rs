//! Player adapter
//!
//! Guards every call into an embedded engine. The adapter owns the engine
//! handle inside its phase, so commands can only reach the engine once the
//! readiness probe has settled. It does no scheduling itself: methods that
//! need a delay return it, and the caller arms a timer tagged with the
//! current generation.
//!
//! ```text
//! Uninitialized --ready signal--> ProbeInFlight --probe ok--> Ready
//!                                   |      ^
//!                          probe fails   backoff elapsed
//!                                   v      |
//!                                  Retrying
//!            (after the last allowed attempt) --> DegradedReady
//! ```
//!
//! A state signal from the engine proves it is alive: it promotes any
//! pending or degraded phase straight to `Ready`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::handle::{EngineHandle, EngineMetadata, EngineOp, EngineStateCode};

/// Default wait between the ready signal and the probe
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Default wait after a failed probe
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(1000);

/// Default probe attempts before accepting a degraded engine
pub const DEFAULT_MAX_INIT_ATTEMPTS: u32 = 3;

/// Timing and retry settings for the readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub settle_delay: Duration,
    pub retry_backoff: Duration,
    pub max_init_attempts: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_init_attempts: DEFAULT_MAX_INIT_ATTEMPTS,
        }
    }
}

/// Observable adapter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterState {
    /// No engine handle yet
    #[default]
    Uninitialized,
    /// Handle received, probe pending
    ProbeInFlight,
    /// Probe failed, waiting for the backoff
    Retrying,
    /// Probe succeeded
    Ready,
    /// Probe kept failing; engine accepted anyway
    DegradedReady,
}

impl AdapterState {
    /// Whether commands are accepted
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::DegradedReady)
    }
}

/// Result of a scheduled probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Probe timer was stale or the adapter already moved on
    Skipped,
    /// Engine answered
    Ready,
    /// Engine did not answer; probe again after the delay
    RetryAfter(Duration),
    /// Attempts exhausted; commands are now accepted on a best-effort basis
    Degraded,
}

/// Result of handling a lifecycle signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// Parsed code, `None` when stale or unknown
    pub state: Option<EngineStateCode>,
    /// Signal promoted a pending probe straight to `Ready`
    pub promoted: bool,
}

enum Phase {
    Uninitialized,
    ProbeInFlight {
        handle: Box<dyn EngineHandle>,
    },
    Retrying {
        handle: Box<dyn EngineHandle>,
    },
    Ready {
        handle: Box<dyn EngineHandle>,
    },
    DegradedReady {
        handle: Box<dyn EngineHandle>,
        cause: EngineError,
    },
}

impl Phase {
    fn state(&self) -> AdapterState {
        match self {
            Self::Uninitialized => AdapterState::Uninitialized,
            Self::ProbeInFlight { .. } => AdapterState::ProbeInFlight,
            Self::Retrying { .. } => AdapterState::Retrying,
            Self::Ready { .. } => AdapterState::Ready,
            Self::DegradedReady { .. } => AdapterState::DegradedReady,
        }
    }
}

/// Guarded access to one engine instance at a time
pub struct PlayerAdapter {
    config: AdapterConfig,
    phase: Phase,
    generation: u64,
    retry_count: u32,
    last_error: Option<EngineError>,
}

impl PlayerAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            phase: Phase::Uninitialized,
            generation: 0,
            retry_count: 0,
            last_error: None,
        }
    }

    // ===== Lifecycle =====

    /// Drop the current engine and start a new generation
    ///
    /// Signals and timers tagged with an older generation are ignored from
    /// here on. Returns the new generation.
    pub fn remount(&mut self) -> u64 {
        self.generation += 1;
        self.phase = Phase::Uninitialized;
        self.retry_count = 0;
        self.last_error = None;
        debug!(generation = self.generation, "Adapter reset for remount");
        self.generation
    }

    /// Accept the handle from an engine ready signal
    ///
    /// Returns the settle delay after which [`Self::run_probe`] should run,
    /// or `None` if the signal is stale.
    pub fn on_engine_ready(
        &mut self,
        generation: u64,
        handle: Box<dyn EngineHandle>,
    ) -> Option<Duration> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Ignoring stale ready signal");
            return None;
        }
        if !matches!(self.phase, Phase::Uninitialized) {
            debug!("Duplicate ready signal, keeping current handle");
            return None;
        }

        info!(generation, "Engine ready, probing after settle delay");
        self.phase = Phase::ProbeInFlight { handle };
        Some(self.config.settle_delay)
    }

    /// Probe the engine after the settle delay
    pub fn run_probe(&mut self, generation: u64) -> ProbeOutcome {
        if generation != self.generation {
            return ProbeOutcome::Skipped;
        }

        let handle = match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
            Phase::ProbeInFlight { handle } => handle,
            other => {
                // Promoted by a state signal meanwhile, or torn down
                self.phase = other;
                return ProbeOutcome::Skipped;
            }
        };

        match handle.reachable() {
            Ok(()) => {
                Self::liveness_check(handle.as_ref());
                info!(generation, "Engine probe succeeded");
                self.enter_ready(handle);
                ProbeOutcome::Ready
            }
            Err(err) => {
                self.retry_count += 1;
                warn!(
                    attempt = self.retry_count,
                    max = self.config.max_init_attempts,
                    "Engine probe failed: {}",
                    err
                );

                if self.retry_count < self.config.max_init_attempts {
                    self.last_error = Some(err);
                    self.phase = Phase::Retrying { handle };
                    ProbeOutcome::RetryAfter(self.config.retry_backoff)
                } else {
                    warn!("Engine probe attempts exhausted, continuing degraded");
                    self.retry_count = 0;
                    self.last_error = None;
                    self.phase = Phase::DegradedReady { handle, cause: err };
                    ProbeOutcome::Degraded
                }
            }
        }
    }

    /// Backoff elapsed: schedule the next probe
    ///
    /// Returns the settle delay, or `None` when the retry is stale.
    pub fn retry_due(&mut self, generation: u64) -> Option<Duration> {
        if generation != self.generation {
            return None;
        }

        match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
            Phase::Retrying { handle } => {
                debug!(attempt = self.retry_count + 1, "Retrying engine probe");
                self.phase = Phase::ProbeInFlight { handle };
                Some(self.config.settle_delay)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Handle a raw lifecycle signal
    ///
    /// A signal arriving while the probe is pending proves the engine is
    /// alive and promotes the adapter to `Ready`.
    pub fn on_state_change(&mut self, generation: u64, code: i32) -> StateChange {
        if generation != self.generation {
            debug!(generation, code, "Ignoring stale state signal");
            return StateChange {
                state: None,
                promoted: false,
            };
        }

        let promoted = match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
            Phase::ProbeInFlight { handle }
            | Phase::Retrying { handle }
            | Phase::DegradedReady { handle, .. } => {
                info!(code, "Engine state signal proves liveness");
                self.enter_ready(handle);
                true
            }
            other => {
                self.phase = other;
                false
            }
        };

        let state = match EngineStateCode::try_from(code) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!("{}", err);
                None
            }
        };

        StateChange { state, promoted }
    }

    // ===== Commands =====

    pub fn play(&mut self) -> Option<()> {
        self.call(EngineOp::Play, |engine| engine.play())
    }

    pub fn pause(&mut self) -> Option<()> {
        self.call(EngineOp::Pause, |engine| engine.pause())
    }

    pub fn mute(&mut self) -> Option<()> {
        self.call(EngineOp::Mute, |engine| engine.mute())
    }

    pub fn unmute(&mut self) -> Option<()> {
        self.call(EngineOp::Unmute, |engine| engine.unmute())
    }

    pub fn set_volume(&mut self, level: u8) -> Option<()> {
        self.call(EngineOp::SetVolume, |engine| engine.set_volume(level.min(100)))
    }

    /// Playback position; `Some(0.0)` when the engine call fails
    pub fn current_time(&mut self) -> Option<f64> {
        self.read_seconds(EngineOp::CurrentTime, |engine| engine.current_time())
    }

    /// Media length; `Some(0.0)` when the engine call fails
    pub fn duration(&mut self) -> Option<f64> {
        self.read_seconds(EngineOp::Duration, |engine| engine.duration())
    }

    pub fn metadata(&mut self) -> Option<EngineMetadata> {
        self.call(EngineOp::Metadata, |engine| engine.metadata())
    }

    // ===== Queries =====

    pub fn state(&self) -> AdapterState {
        self.phase.state()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Whether an engine handle has been received for this generation
    pub fn has_handle(&self) -> bool {
        !matches!(self.phase, Phase::Uninitialized)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    /// Probe failure that led to `DegradedReady`
    pub fn degraded_cause(&self) -> Option<&EngineError> {
        match &self.phase {
            Phase::DegradedReady { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    // ===== Internal =====

    fn enter_ready(&mut self, handle: Box<dyn EngineHandle>) {
        self.retry_count = 0;
        self.last_error = None;
        self.phase = Phase::Ready { handle };
    }

    /// Partial functionality beats none: failed reads only log
    fn liveness_check(handle: &dyn EngineHandle) {
        if let Err(err) = handle.player_state() {
            warn!("Liveness check could not read player state: {}", err);
        }
        if let Err(err) = handle.duration() {
            warn!("Liveness check could not read duration: {}", err);
        }
    }

    fn call<T>(
        &mut self,
        op: EngineOp,
        f: impl FnOnce(&mut dyn EngineHandle) -> Result<T>,
    ) -> Option<T> {
        let state = self.phase.state();
        let handle = match &mut self.phase {
            Phase::Ready { handle } | Phase::DegradedReady { handle, .. } => handle,
            _ => {
                warn!(%op, ?state, "Engine not ready, command dropped");
                return None;
            }
        };

        if !handle.supports(op) {
            warn!(%op, "Engine does not expose operation");
            self.last_error = Some(EngineError::Unsupported(op));
            return None;
        }

        match f(handle.as_mut()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%op, "Engine call failed: {}", err);
                self.last_error = Some(err);
                None
            }
        }
    }

    fn read_seconds(
        &mut self,
        op: EngineOp,
        f: impl FnOnce(&dyn EngineHandle) -> Result<f64>,
    ) -> Option<f64> {
        let state = self.phase.state();
        let handle = match &self.phase {
            Phase::Ready { handle } | Phase::DegradedReady { handle, .. } => handle,
            _ => {
                debug!(%op, ?state, "Engine not ready, read skipped");
                return None;
            }
        };

        if !handle.supports(op) {
            warn!(%op, "Engine does not expose operation");
            self.last_error = Some(EngineError::Unsupported(op));
            return None;
        }

        match f(handle.as_ref()) {
            Ok(seconds) => Some(seconds),
            Err(err) => {
                warn!(%op, "Engine read failed, substituting 0: {}", err);
                self.last_error = Some(err);
                Some(0.0)
            }
        }
    }
}

impl Default for PlayerAdapter {
    fn default() -> Self {
        Self::new(AdapterConfig::default())
    }
}

impl std::fmt::Debug for PlayerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerAdapter")
            .field("state", &self.state())
            .field("generation", &self.generation)
            .field("retry_count", &self.retry_count)
            .field("last_error", &self.last_error)
            .finish()
    }
}
