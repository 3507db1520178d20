// Author: Dustin Pilgrim
// License: MIT

use serde::{Deserialize, Serialize};

use crate::rect::Rect;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CandidateKind {
    /// Top-level window from the enumeration service.
    #[default]
    Window,
    /// UI element inside a window (buttons, panes, ...).
    Element,
    /// A whole monitor.
    Monitor,
    /// Full-desktop fallback used when element enumeration is unreliable.
    Desktop,
}

/// A selectable rectangle with a stable id and a stacking rank.
///
/// `z_rank` is the stacking order: lower = more visually on top.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub id: u64,
    pub rect: Rect,
    pub z_rank: u32,
    #[serde(default)]
    pub kind: CandidateKind,
}

impl Candidate {
    pub fn new(id: u64, rect: Rect, z_rank: u32) -> Self {
        Self {
            id,
            rect,
            z_rank,
            kind: CandidateKind::Window,
        }
    }

    pub fn with_kind(mut self, kind: CandidateKind) -> Self {
        self.kind = kind;
        self
    }
}
