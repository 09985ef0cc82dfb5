/// Playlist entry with presentation-derived fields
use serde::{Deserialize, Serialize};

use crate::display::{format_display_date, DATE_PLACEHOLDER, UNKNOWN_LOCATION};
use crate::types::{ContentType, MediaItem};

/// A media item as stored in the playlist
///
/// `location` and `display_date` are computed once when the entry is
/// created and never re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub item: MediaItem,
    pub location: String,
    pub display_date: String,
}

impl PlaylistEntry {
    /// Wrap an item, deriving its display fields
    pub fn new(item: MediaItem) -> Self {
        let location = derive_location(&item);
        let display_date = derive_display_date(&item);
        Self {
            item,
            location,
            display_date,
        }
    }

    pub fn is_same_track(&self, other: &MediaItem) -> bool {
        self.item.is_same_track(other)
    }
}

impl From<MediaItem> for PlaylistEntry {
    fn from(item: MediaItem) -> Self {
        Self::new(item)
    }
}

fn derive_location(item: &MediaItem) -> String {
    if let Some(location) = item.location.as_deref().filter(|l| !l.is_empty()) {
        return location.to_string();
    }
    if item.content_type == ContentType::Station {
        if let Some(city) = item.city.as_deref().filter(|c| !c.is_empty()) {
            return city.to_string();
        }
    }
    UNKNOWN_LOCATION.to_string()
}

fn derive_display_date(item: &MediaItem) -> String {
    if let Some(date) = item.display_date.as_deref().filter(|d| !d.is_empty()) {
        return date.to_string();
    }
    item.published_at
        .map(format_display_date)
        .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
}
