//! OnAir Player Core
//!
//! Shared domain types for the OnAir playback controller.
//!
//! This crate provides:
//! - **Media types**: `MediaItem`, `MediaKind`, `ContentType`
//! - **Identity rules**: two items are the same track when `slug` and
//!   `content_type` match (`MediaIdentity`)
//! - **Playlist entries**: presentation fields derived once at insertion
//! - **Embed ids**: engine instance identity extracted from `source_url`
//!
//! # Example
//!
//! ```rust
//! use onair_core::{ContentType, MediaItem, MediaKind};
//!
//! let a = MediaItem::new("1", ContentType::Station, "night-drive", "Night Drive")
//!     .with_media_kind(MediaKind::AudioEmbed)
//!     .with_source_url("https://youtu.be/dQw4w9WgXcQ");
//!
//! let b = MediaItem::new("2", ContentType::Station, "night-drive", "Night Drive (re-upload)");
//!
//! assert!(a.is_same_track(&b));
//! assert_eq!(a.embed_id().as_deref(), Some("dQw4w9WgXcQ"));
//! ```

#![forbid(unsafe_code)]

pub mod display;
pub mod embed;
pub mod error;
pub mod types;

pub use display::{format_clock, format_display_date, DATE_PLACEHOLDER, UNKNOWN_LOCATION};
pub use embed::extract_embed_id;
pub use error::{CoreError, Result};
pub use types::{ContentType, MediaIdentity, MediaItem, MediaKind, PlaylistEntry};
