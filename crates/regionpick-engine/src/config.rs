// Author: Dustin Pilgrim
// License: MIT

use std::time::Duration;

use regionpick_core::Easing;

/// Tuning for one capture session, handed over at session start.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    /// Distance (overlay px) within which a pointer grabs an edge or corner.
    pub edge_tolerance: i32,
    /// Pointer travel (overlay px) with the button held before Auto turns
    /// into a manual drag-out.
    pub drag_threshold: i32,
    pub animation_duration_ms: u64,
    pub disable_animation: bool,
    pub easing: Easing,
    /// Start with fine-grained element lookup enabled.
    pub find_children: bool,
    /// Offer whole monitors as candidates behind the windows.
    pub include_monitors: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: 8,
            drag_threshold: 6,
            animation_duration_ms: 100,
            disable_animation: false,
            easing: Easing::EaseOut,
            find_children: false,
            include_monitors: true,
        }
    }
}

impl SelectionConfig {
    pub fn animation_duration(&self) -> Duration {
        if self.disable_animation {
            Duration::ZERO
        } else {
            Duration::from_millis(self.animation_duration_ms)
        }
    }
}
