// Author: Dustin Pilgrim
// License: MIT

use regionpick_core::{CursorIcon, DragMode, Point, Rect};

/// Committed selections are never smaller than this on either axis.
pub const MIN_W: i32 = 1;
pub const MIN_H: i32 = 1;

const NEAR_TOP: u8 = 0b0001;
const NEAR_RIGHT: u8 = 0b0010;
const NEAR_BOTTOM: u8 = 0b0100;
const NEAR_LEFT: u8 = 0b1000;

pub fn normalize(r: Rect) -> Rect {
    Rect::new(r.min_x, r.min_y, r.max_x, r.max_y)
}

pub fn ensure_min_size(r: Rect) -> Rect {
    let mut r = normalize(r);
    if r.width() < MIN_W {
        r.max_x = r.min_x.saturating_add(MIN_W);
    }
    if r.height() < MIN_H {
        r.max_y = r.min_y.saturating_add(MIN_H);
    }
    r
}

/// Box spanned by two points, in any order.
pub fn span(a: Point, b: Point) -> Rect {
    Rect::new(a.x, a.y, b.x, b.y)
}

/// Which edge or corner of `rect` the point is close to.
///
/// An edge is near when the point is within `tolerance` of the edge line and
/// inside the edge's span grown by `tolerance`. Opposite edges never both
/// count; the closer one wins. No edge means `All`.
pub fn classify_edge_proximity(rect: Rect, p: Point, tolerance: i32) -> DragMode {
    let r = normalize(rect);
    let tol = tolerance.max(0);

    let in_x_span = p.x >= r.min_x - tol && p.x <= r.max_x + tol;
    let in_y_span = p.y >= r.min_y - tol && p.y <= r.max_y + tol;

    let d_left = (p.x - r.min_x).abs();
    let d_right = (p.x - r.max_x).abs();
    let d_top = (p.y - r.min_y).abs();
    let d_bottom = (p.y - r.max_y).abs();

    let mut bits = 0u8;

    if in_y_span && (d_left <= tol || d_right <= tol) {
        bits |= if d_left <= d_right { NEAR_LEFT } else { NEAR_RIGHT };
    }
    if in_x_span && (d_top <= tol || d_bottom <= tol) {
        bits |= if d_top <= d_bottom { NEAR_TOP } else { NEAR_BOTTOM };
    }

    // Corners first, then single edges.
    match bits {
        b if b == NEAR_TOP | NEAR_LEFT => DragMode::TopLeft,
        b if b == NEAR_TOP | NEAR_RIGHT => DragMode::TopRight,
        b if b == NEAR_BOTTOM | NEAR_RIGHT => DragMode::BottomRight,
        b if b == NEAR_BOTTOM | NEAR_LEFT => DragMode::BottomLeft,
        NEAR_TOP => DragMode::Top,
        NEAR_RIGHT => DragMode::Right,
        NEAR_BOTTOM => DragMode::Bottom,
        NEAR_LEFT => DragMode::Left,
        _ => DragMode::All,
    }
}

pub fn cursor_for(mode: DragMode) -> CursorIcon {
    CursorIcon::from(mode)
}

/// Apply the pointer delta since the grab to the edges `mode` implicates.
///
/// The result is normalized (dragging an edge past its opposite flips it) and
/// at least `MIN_W` x `MIN_H`.
pub fn apply_drag(mode: DragMode, origin_rect: Rect, origin: Point, current: Point) -> Rect {
    let dx = current.x - origin.x;
    let dy = current.y - origin.y;

    let o = normalize(origin_rect);
    let mut left = o.min_x;
    let mut top = o.min_y;
    let mut right = o.max_x;
    let mut bottom = o.max_y;

    if mode == DragMode::All {
        left += dx;
        right += dx;
        top += dy;
        bottom += dy;
    } else {
        if mode.moves_left() {
            left += dx;
        }
        if mode.moves_right() {
            right += dx;
        }
        if mode.moves_top() {
            top += dy;
        }
        if mode.moves_bottom() {
            bottom += dy;
        }
    }

    ensure_min_size(Rect::new(left, top, right, bottom))
}

fn clamp_axis(min: i32, max: i32, lo: i32, hi: i32) -> (i32, i32) {
    let hi = hi.max(lo.saturating_add(1));
    let a = min.max(lo);
    let b = max.min(hi);

    if b - a >= 1 {
        (a, b)
    } else if a >= hi {
        (hi - 1, hi)
    } else if b <= lo {
        (lo, lo + 1)
    } else {
        (a, a + 1)
    }
}

/// Intersect `rect` with `bounds`.
///
/// An axis that would collapse is pulled onto the nearest bound edge with a
/// width of one pixel instead.
pub fn clamp_rect_to_bounds(rect: Rect, bounds: Rect) -> Rect {
    let r = normalize(rect);
    let b = normalize(bounds);

    let (min_x, max_x) = clamp_axis(r.min_x, r.max_x, b.min_x, b.max_x);
    let (min_y, max_y) = clamp_axis(r.min_y, r.max_y, b.min_y, b.max_y);

    Rect {
        min_x,
        min_y,
        max_x,
        max_y,
    }
}

/// Move `rect` inside `bounds` without changing its size where it fits.
pub fn shift_into_bounds(rect: Rect, bounds: Rect) -> Rect {
    let r = normalize(rect);
    let b = normalize(bounds);

    let mut dx = 0;
    let mut dy = 0;

    if r.max_x > b.max_x {
        dx = b.max_x - r.max_x;
    }
    if r.min_x + dx < b.min_x {
        dx = b.min_x - r.min_x;
    }
    if r.max_y > b.max_y {
        dy = b.max_y - r.max_y;
    }
    if r.min_y + dy < b.min_y {
        dy = b.min_y - r.min_y;
    }

    r.translate(dx, dy)
}
