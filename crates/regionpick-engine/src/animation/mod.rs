// Author: Dustin Pilgrim
// License: MIT

pub mod easing;
pub mod renderer;

pub use renderer::{AnimatedRect, Frame};
