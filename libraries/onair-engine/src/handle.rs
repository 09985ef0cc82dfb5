//! Engine embedding contract
//!
//! An embedded engine is a third-party player instance (an iframe video
//! player in the browser build, a simulated one in tests). It is mounted by
//! an [`EngineHost`] for one embed id and talks back through an
//! [`EngineEventSink`] bound to the mount generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{EngineError, Result};

/// Operations an engine may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOp {
    Play,
    Pause,
    Mute,
    Unmute,
    SetVolume,
    CurrentTime,
    Duration,
    PlayerState,
    Metadata,
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::SetVolume => "set_volume",
            Self::CurrentTime => "current_time",
            Self::Duration => "duration",
            Self::PlayerState => "player_state",
            Self::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// Engine lifecycle codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStateCode {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Queued,
}

impl EngineStateCode {
    /// Raw code as reported by the engine
    pub fn code(self) -> i32 {
        match self {
            Self::Unstarted => -1,
            Self::Ended => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Buffering => 3,
            Self::Queued => 5,
        }
    }
}

impl TryFrom<i32> for EngineStateCode {
    type Error = EngineError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            -1 => Ok(Self::Unstarted),
            0 => Ok(Self::Ended),
            1 => Ok(Self::Playing),
            2 => Ok(Self::Paused),
            3 => Ok(Self::Buffering),
            5 => Ok(Self::Queued),
            other => Err(EngineError::UnknownState(other)),
        }
    }
}

/// Descriptive data reported by the engine for the loaded media
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetadata {
    pub title: String,
    pub author: String,
    pub video_id: String,
}

/// A mounted engine instance
///
/// Every call may fail; callers go through [`crate::PlayerAdapter`], which
/// contains the failure.
pub trait EngineHandle: Send {
    /// Whether the engine exposes `op`
    fn supports(&self, op: EngineOp) -> bool;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn mute(&mut self) -> Result<()>;

    fn unmute(&mut self) -> Result<()>;

    /// Set volume as a 0-100 percentage
    fn set_volume(&mut self, level: u8) -> Result<()>;

    /// Playback position in seconds
    fn current_time(&self) -> Result<f64>;

    /// Media length in seconds
    fn duration(&self) -> Result<f64>;

    /// Raw lifecycle code (see [`EngineStateCode`])
    fn player_state(&self) -> Result<i32>;

    fn metadata(&self) -> Result<EngineMetadata>;

    /// Cheap call proving the instance answers at all
    fn reachable(&self) -> Result<()>;
}

/// Signals an engine instance sends to its owner
pub enum EngineSignal {
    /// Instance finished loading and hands over its handle
    Ready(Box<dyn EngineHandle>),

    /// Lifecycle transition, raw code
    StateChange(i32),
}

impl fmt::Debug for EngineSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready(..)"),
            Self::StateChange(code) => f.debug_tuple("StateChange").field(code).finish(),
        }
    }
}

/// Callback receiving engine signals tagged with their mount generation
pub type SignalCallback = Arc<dyn Fn(u64, EngineSignal) + Send + Sync>;

/// Where a mounted engine delivers its signals
///
/// Bound to one mount generation; the receiver drops signals whose
/// generation is no longer current.
#[derive(Clone)]
pub struct EngineEventSink {
    generation: u64,
    callback: SignalCallback,
}

impl EngineEventSink {
    pub fn new(generation: u64, callback: SignalCallback) -> Self {
        Self {
            generation,
            callback,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report the instance ready
    pub fn ready(&self, handle: Box<dyn EngineHandle>) {
        (self.callback)(self.generation, EngineSignal::Ready(handle));
    }

    /// Report a lifecycle transition
    pub fn state_change(&self, code: i32) {
        (self.callback)(self.generation, EngineSignal::StateChange(code));
    }
}

impl fmt::Debug for EngineEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineEventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Creates and destroys engine instances
pub trait EngineHost: Send {
    /// Mount an instance for `embed_id`
    ///
    /// The instance reports readiness through `sink`, possibly before this
    /// call returns.
    fn mount(&mut self, embed_id: &str, sink: EngineEventSink) -> Result<()>;

    /// Tear down the instance mounted for `generation`, if any
    fn unmount(&mut self, generation: u64);
}
