//! OnAir Sync
//!
//! Keeps the playback store and the embedded engine in step.
//!
//! - [`SyncCore`]: deterministic rules (debounces, polling, readiness,
//!   auto-advance, recovery) expressed as [`Effect`]s
//! - [`PlaybackService`]: tokio actor that owns the core, runs its timers
//!   and publishes [`PlayerSnapshot`]s
//! - [`PlaybackClient`]: the only way UI code touches playback state
//! - [`PlayerConfig`]: file and environment configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use onair_core::{ContentType, MediaItem};
//! use onair_engine::SimulatedHost;
//! use onair_sync::{PlaybackService, PlayerConfig};
//!
//! # async fn demo() -> onair_sync::Result<()> {
//! let config = PlayerConfig::load(None)?;
//! let (client, service) = PlaybackService::spawn(config, Box::new(SimulatedHost::new()));
//!
//! let item = MediaItem::new("1", ContentType::Station, "night-drive", "Night Drive")
//!     .with_source_url("https://youtu.be/dQw4w9WgXcQ");
//! client.set_current_media(item)?;
//!
//! let snapshot = client.settled_snapshot().await?;
//! assert!(snapshot.session.is_playing);
//!
//! client.shutdown()?;
//! let _ = service.await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod glue;
pub mod service;

pub use config::{EngineSettings, PlayerConfig, SyncSettings, ENV_PREFIX};
pub use error::{Result, SyncError};
pub use glue::{Action, Effect, EngineStatus, PlayerSnapshot, SyncCore, TimerKind};
pub use service::{PlaybackClient, PlaybackService};
