// Author: Dustin Pilgrim
// License: MIT

pub mod candidate;
pub mod easing;
pub mod error;
pub mod mode;
pub mod output;
pub mod rect;

pub use candidate::{Candidate, CandidateKind};
pub use easing::Easing;
pub use error::HostError;
pub use mode::{CursorIcon, DragMode, SelectionState};
pub use output::MonitorInfo;
pub use rect::{Point, Rect};
