mod media;
mod playlist_entry;

pub use media::{ContentType, MediaIdentity, MediaItem, MediaKind};
pub use playlist_entry::PlaylistEntry;
