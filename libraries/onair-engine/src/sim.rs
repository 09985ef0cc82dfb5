//! Simulated engine
//!
//! In-process stand-in for an embedded player, used by the demo binary and
//! by tests. The host and every handle it hands out share one state cell,
//! so the caller can observe commands and script failures from outside.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::handle::{
    EngineEventSink, EngineHandle, EngineHost, EngineMetadata, EngineOp, EngineStateCode,
};

/// Observable state of the simulated engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimState {
    /// Embed id of the mounted instance
    pub embed_id: Option<String>,
    pub generation: Option<u64>,
    pub playing: bool,
    pub muted: bool,
    pub volume: u8,
    pub position: f64,
    pub duration: f64,
    pub metadata: EngineMetadata,

    /// Remaining mounts the host refuses
    pub failing_mounts: u32,
    /// Remaining probes that report the engine unreachable
    pub failing_probes: u32,
    /// Position reads fail while set
    pub fail_reads: bool,
    /// Operations the engine does not expose
    pub unsupported: Vec<EngineOp>,

    /// Every command received, in order
    pub commands: Vec<String>,
    pub mounts: u32,
    pub unmounts: u32,
}

type Shared = Arc<Mutex<SimState>>;

fn lock(state: &Shared) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine handle backed by the shared simulation state
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    state: Shared,
}

impl SimulatedEngine {
    fn command(&self, op: EngineOp, apply: impl FnOnce(&mut SimState)) -> Result<()> {
        let mut state = lock(&self.state);
        state.commands.push(op.to_string());
        apply(&mut state);
        Ok(())
    }
}

impl EngineHandle for SimulatedEngine {
    fn supports(&self, op: EngineOp) -> bool {
        !lock(&self.state).unsupported.contains(&op)
    }

    fn play(&mut self) -> Result<()> {
        self.command(EngineOp::Play, |s| s.playing = true)
    }

    fn pause(&mut self) -> Result<()> {
        self.command(EngineOp::Pause, |s| s.playing = false)
    }

    fn mute(&mut self) -> Result<()> {
        self.command(EngineOp::Mute, |s| s.muted = true)
    }

    fn unmute(&mut self) -> Result<()> {
        self.command(EngineOp::Unmute, |s| s.muted = false)
    }

    fn set_volume(&mut self, level: u8) -> Result<()> {
        self.command(EngineOp::SetVolume, |s| s.volume = level)
    }

    fn current_time(&self) -> Result<f64> {
        let state = lock(&self.state);
        if state.fail_reads {
            return Err(EngineError::call_failed(EngineOp::CurrentTime, "simulated read failure"));
        }
        Ok(state.position)
    }

    fn duration(&self) -> Result<f64> {
        Ok(lock(&self.state).duration)
    }

    fn player_state(&self) -> Result<i32> {
        let state = lock(&self.state);
        let code = if state.playing {
            EngineStateCode::Playing
        } else {
            EngineStateCode::Paused
        };
        Ok(code.code())
    }

    fn metadata(&self) -> Result<EngineMetadata> {
        Ok(lock(&self.state).metadata.clone())
    }

    fn reachable(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.failing_probes > 0 {
            state.failing_probes -= 1;
            return Err(EngineError::Unreachable("simulated probe failure".to_string()));
        }
        Ok(())
    }
}

/// Host mounting [`SimulatedEngine`] instances
///
/// Mounting reports the instance ready immediately. Lifecycle transitions
/// are injected with [`SimulatedHost::emit_state`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedHost {
    state: Shared,
    sink: Arc<Mutex<Option<EngineEventSink>>>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the simulation state
    pub fn state(&self) -> SimState {
        lock(&self.state).clone()
    }

    /// Mutate the simulation state (script failures, advance position)
    pub fn update(&self, f: impl FnOnce(&mut SimState)) {
        f(&mut lock(&self.state));
    }

    /// Send a lifecycle signal from the mounted instance
    ///
    /// Returns `false` when nothing is mounted.
    pub fn emit_state(&self, state: EngineStateCode) -> bool {
        let sink = self
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match sink {
            Some(sink) => {
                sink.state_change(state.code());
                true
            }
            None => false,
        }
    }

    /// Send a raw state code, including ones the engine should never emit
    pub fn emit_raw_state(&self, code: i32) -> bool {
        let sink = self
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sink.map(|sink| sink.state_change(code)).is_some()
    }
}

impl EngineHost for SimulatedHost {
    fn mount(&mut self, embed_id: &str, sink: EngineEventSink) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if state.failing_mounts > 0 {
                state.failing_mounts -= 1;
                return Err(EngineError::MountFailed {
                    embed_id: embed_id.to_string(),
                    message: "simulated mount failure".to_string(),
                });
            }
            state.embed_id = Some(embed_id.to_string());
            state.generation = Some(sink.generation());
            state.playing = false;
            state.position = 0.0;
            state.metadata.video_id = embed_id.to_string();
            state.mounts += 1;
        }
        debug!(embed_id, generation = sink.generation(), "Simulated engine mounted");

        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink.clone());

        sink.ready(Box::new(SimulatedEngine {
            state: Arc::clone(&self.state),
        }));
        Ok(())
    }

    fn unmount(&mut self, generation: u64) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if sink.as_ref().is_some_and(|s| s.generation() == generation) {
            *sink = None;
            let mut state = lock(&self.state);
            state.embed_id = None;
            state.generation = None;
            state.playing = false;
            state.unmounts += 1;
            debug!(generation, "Simulated engine unmounted");
        }
    }
}
