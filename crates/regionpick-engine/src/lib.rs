// Author: Dustin Pilgrim
// License: MIT

pub mod animation;
pub mod coalescer;
pub mod config;
pub mod geometry;
pub mod host;
pub mod index;
pub mod session;
pub mod transform;

pub use coalescer::{AutoSelectCoalescer, CoalescerStats, Ticket};
pub use config::SelectionConfig;
pub use host::{CandidateSource, LastSelectionStore, OverlayHost};
pub use index::{Lookup, SpatialIndex};
pub use session::{CaptureSession, SessionBounds};
pub use transform::CoordinateTransform;
