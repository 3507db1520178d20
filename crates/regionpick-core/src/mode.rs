// Author: Dustin Pilgrim
// License: MIT

use serde::{Deserialize, Serialize};

/// Which mode the selection engine is in. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectionState {
    /// The engine proposes a rectangle from the candidate under the pointer.
    #[default]
    Auto,
    /// The user is dragging out a rectangle by hand.
    Manual,
    /// A committed selection is being moved or resized.
    Drag,
    /// A selection is committed and idle.
    Selected,
}

/// Which part of the selection a drag manipulates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    All,
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl DragMode {
    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }
}

/// Pointer shape the host should show over the overlay.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CursorIcon {
    #[default]
    Crosshair,
    Move,
    NsResize,
    EwResize,
    NwseResize,
    NeswResize,
}

impl CursorIcon {
    /// Name in the freedesktop cursor theme.
    pub fn theme_name(self) -> &'static str {
        match self {
            Self::Crosshair => "crosshair",
            Self::Move => "move",
            Self::NsResize => "ns-resize",
            Self::EwResize => "ew-resize",
            Self::NwseResize => "nwse-resize",
            Self::NeswResize => "nesw-resize",
        }
    }
}

impl From<DragMode> for CursorIcon {
    fn from(mode: DragMode) -> Self {
        match mode {
            DragMode::All => Self::Move,
            DragMode::Top | DragMode::Bottom => Self::NsResize,
            DragMode::Left | DragMode::Right => Self::EwResize,
            DragMode::TopLeft | DragMode::BottomRight => Self::NwseResize,
            DragMode::TopRight | DragMode::BottomLeft => Self::NeswResize,
        }
    }
}
