//! Playback history tracking
//!
//! Maintains a bounded history of played items for "previous" navigation

use onair_core::MediaItem;
use std::collections::VecDeque;

/// Default history capacity
pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Playback history with bounded size
///
/// Ring buffer of recently played items, most recent at the back.
/// Consecutive entries are never the same track.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    items: VecDeque<MediaItem>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            items: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Record an item
    ///
    /// Skipped when the most recent entry is the same track. If history is
    /// full, the oldest entry is discarded first. Returns whether the item
    /// was recorded.
    pub fn push(&mut self, item: MediaItem) -> bool {
        if self.peek().is_some_and(|last| last.is_same_track(&item)) {
            return false;
        }

        if self.items.len() >= self.max_size {
            self.items.pop_front(); // Remove oldest
        }
        self.items.push_back(item);
        true
    }

    /// Get most recent item (without removing)
    pub fn peek(&self) -> Option<&MediaItem> {
        self.items.back()
    }

    /// Get the entry played before the most recent one
    pub fn peek_previous(&self) -> Option<&MediaItem> {
        let len = self.items.len();
        if len < 2 {
            return None;
        }
        self.items.get(len - 2)
    }

    /// Pop most recent item from history
    pub fn pop(&mut self) -> Option<MediaItem> {
        self.items.pop_back()
    }

    /// Get all history items (oldest first)
    pub fn get_all(&self) -> Vec<&MediaItem> {
        self.items.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get maximum history size
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
