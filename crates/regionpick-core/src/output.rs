// Author: Dustin Pilgrim
// License: MIT

use serde::{Deserialize, Serialize};

use crate::rect::Rect;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    /// Platform-provided name when available (e.g. "DP-1").
    #[serde(default)]
    pub name: Option<String>,

    /// Position in the global virtual desktop, physical pixels.
    pub x: i32,
    pub y: i32,

    /// Physical size.
    pub width: i32,
    pub height: i32,

    /// Device pixel ratio (1.0, 1.25, 2.0, ...).
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl MonitorInfo {
    pub fn rect(&self) -> Rect {
        Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}
