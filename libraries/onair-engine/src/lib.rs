//! OnAir Engine Adapter
//!
//! Contract for embedded media engines and the adapter that guards them.
//!
//! Engines are unreliable: they load asynchronously, may never answer, and
//! any call may throw. [`PlayerAdapter`] turns that into a small state
//! machine (`Uninitialized`, `ProbeInFlight`, `Retrying`, `Ready`,
//! `DegradedReady`) and makes sure no engine failure escapes.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use onair_engine::{
//!     AdapterState, EngineEventSink, EngineHost, EngineSignal, PlayerAdapter, ProbeOutcome,
//!     SimulatedHost,
//! };
//!
//! let mut adapter = PlayerAdapter::default();
//! let generation = adapter.remount();
//!
//! // Capture the ready signal the host sends on mount
//! let handle = Arc::new(std::sync::Mutex::new(None));
//! let slot = Arc::clone(&handle);
//! let sink = EngineEventSink::new(generation, Arc::new(move |_: u64, signal: EngineSignal| {
//!     if let EngineSignal::Ready(engine) = signal {
//!         *slot.lock().unwrap() = Some(engine);
//!     }
//! }));
//!
//! let mut host = SimulatedHost::new();
//! host.mount("dQw4w9WgXcQ", sink).unwrap();
//!
//! let engine = handle.lock().unwrap().take().unwrap();
//! adapter.on_engine_ready(generation, engine);
//! assert_eq!(adapter.run_probe(generation), ProbeOutcome::Ready);
//! assert_eq!(adapter.state(), AdapterState::Ready);
//! assert_eq!(adapter.play(), Some(()));
//! ```

#![forbid(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod handle;
pub mod sim;

pub use adapter::{
    AdapterConfig, AdapterState, PlayerAdapter, ProbeOutcome, StateChange,
    DEFAULT_MAX_INIT_ATTEMPTS, DEFAULT_RETRY_BACKOFF, DEFAULT_SETTLE_DELAY,
};
pub use error::{EngineError, Result};
pub use handle::{
    EngineEventSink, EngineHandle, EngineHost, EngineMetadata, EngineOp, EngineSignal,
    EngineStateCode, SignalCallback,
};
pub use sim::{SimState, SimulatedEngine, SimulatedHost};
