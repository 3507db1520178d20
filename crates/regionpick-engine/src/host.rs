// Author: Dustin Pilgrim
// License: MIT
//
// Seams to the host application. The engine owns none of the platform work:
// window enumeration, native window calls, drawing and persistence all come
// in through these traits.

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};

use regionpick_core::{Candidate, CursorIcon, HostError, Point, Rect};

/// Window / element enumeration. Rects are global desktop pixels.
pub trait CandidateSource {
    /// Selectable windows, topmost first. Called once per session.
    fn list_candidates(&self) -> LocalBoxFuture<'static, Result<Vec<(u64, Rect)>, HostError>>;

    /// Fine-grained hit test used while "find children" is on.
    ///
    /// `Ok(None)` means the service is unavailable here and the engine should
    /// use its own index instead.
    fn element_at_point(
        &self,
        _p: Point,
    ) -> LocalBoxFuture<'static, Result<Option<Vec<Candidate>>, HostError>> {
        future::ready(Ok(None)).boxed_local()
    }

    /// Whether `list_candidates` covers UI elements reliably. When it does
    /// not, a full-desktop candidate is added so every point has a hit.
    fn enumerates_elements(&self) -> bool {
        false
    }
}

/// The overlay window and its native surroundings.
pub trait OverlayHost {
    /// Put the overlay back into its native stacking order so the UI drawn
    /// over the selection receives pointer focus.
    fn restore_z_order(&self) -> Result<(), HostError>;

    fn request_focus(&self) -> Result<(), HostError>;

    /// Latest selection in overlay pixels, for toolbars and handles.
    fn selection_changed(&self, rect: Option<Rect>);

    fn set_cursor(&self, icon: CursorIcon);

    /// Ask for one frame callback; the host answers with
    /// `CaptureSession::on_frame`.
    fn request_frame(&self);

    fn draw(&self, rect: Option<Rect>);
}

/// The single "last selection" record kept between sessions.
/// Rects are global desktop pixels.
pub trait LastSelectionStore {
    fn load(&self) -> Result<Option<Rect>, HostError>;
    fn save(&self, rect: Rect) -> Result<(), HostError>;
}
