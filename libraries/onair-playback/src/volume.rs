//! Volume and mute state
//!
//! The embedded engine takes volume as a 0-100 percentage, so no gain
//! curve is applied here; the level is clamped and passed through.

/// Default volume level
pub const DEFAULT_VOLUME: u8 = 80;

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume, clamped to 0-100
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(100),
            muted: false,
        }
    }

    /// Set volume level
    ///
    /// Any integer is accepted and clamped to 0-100. Returns the stored level.
    pub fn set_level(&mut self, level: i32) -> u8 {
        self.level = level.clamp(0, 100) as u8;
        self.level
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}
