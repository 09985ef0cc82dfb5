//! Ordered, de-duplicated playlist
//!
//! Insertion order is playback order. Entries are unique by track identity
//! (`slug` + `content_type`).

use onair_core::{MediaItem, PlaylistEntry};

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the entry that is the same track as `item`
    pub fn position(&self, item: &MediaItem) -> Option<usize> {
        self.entries.iter().position(|entry| entry.is_same_track(item))
    }

    pub fn contains(&self, item: &MediaItem) -> bool {
        self.position(item).is_some()
    }

    /// Append an item unless the same track is already present
    ///
    /// Returns the index of the new entry, or `None` for a duplicate.
    pub fn push(&mut self, item: MediaItem) -> Option<usize> {
        if self.contains(&item) {
            return None;
        }
        self.entries.push(PlaylistEntry::new(item));
        Some(self.entries.len() - 1)
    }

    /// Remove entry by index
    pub fn remove(&mut self, index: usize) -> Option<PlaylistEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_core::ContentType;

    fn item(slug: &str) -> MediaItem {
        MediaItem::new(slug, ContentType::Article, slug, slug.to_uppercase())
    }

    #[test]
    fn push_rejects_same_track() {
        let mut playlist = Playlist::new();
        assert_eq!(playlist.push(item("a")), Some(0));
        assert_eq!(playlist.push(item("b")), Some(1));

        let mut dup = item("a");
        dup.id = "different-id".to_string();
        assert_eq!(playlist.push(dup), None);
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn remove_by_index() {
        let mut playlist = Playlist::new();
        playlist.push(item("a"));
        playlist.push(item("b"));

        let removed = playlist.remove(0).unwrap();
        assert_eq!(removed.item.slug, "a");
        assert_eq!(playlist.position(&item("b")), Some(0));
        assert!(playlist.remove(5).is_none());
    }
}
