// Author: Dustin Pilgrim
// License: MIT
//
// Displayed-rectangle interpolation, drawn at most once per host frame.
//
// `update` never draws. It records the new target and reports whether the
// host needs to be asked for a frame; only the first update since the last
// frame does. The host's frame callback then calls `on_frame`, which reads
// the latest target only.

use std::time::{Duration, Instant};

use regionpick_core::{Easing, Rect};

use super::easing::{apply_easing, lerp};

#[derive(Debug, Clone, Copy, PartialEq)]
struct RectF {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl RectF {
    fn from_rect(r: Rect) -> Self {
        Self {
            min_x: r.min_x as f64,
            min_y: r.min_y as f64,
            max_x: r.max_x as f64,
            max_y: r.max_y as f64,
        }
    }

    fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self {
            min_x: lerp(a.min_x, b.min_x, t),
            min_y: lerp(a.min_y, b.min_y, t),
            max_x: lerp(a.max_x, b.max_x, t),
            max_y: lerp(a.max_y, b.max_y, t),
        }
    }

    fn round(self) -> Rect {
        Rect::new(
            self.min_x.round() as i32,
            self.min_y.round() as i32,
            self.max_x.round() as i32,
            self.max_y.round() as i32,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: RectF,
    to: RectF,
    started: Option<Instant>,
}

/// What the host should draw this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// `None` when nothing is highlighted.
    pub rect: Option<Rect>,
    /// The animation is still running; the renderer already asked for the
    /// next frame.
    pub more: bool,
}

#[derive(Debug)]
pub struct AnimatedRect {
    displayed: Option<RectF>,
    transition: Option<Transition>,
    duration: Duration,
    easing: Easing,
    frame_requested: bool,
    disposed: bool,
}

impl AnimatedRect {
    /// A zero duration makes every update a jump.
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            displayed: None,
            transition: None,
            duration,
            easing,
            frame_requested: false,
            disposed: false,
        }
    }

    pub fn displayed(&self) -> Option<Rect> {
        self.displayed.map(RectF::round)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Move toward `target`. Returns true when the host must be asked for a
    /// frame.
    pub fn update(&mut self, target: Rect, skip_animation: bool) -> bool {
        if self.disposed {
            return false;
        }

        let to = RectF::from_rect(target);

        match self.displayed {
            Some(from) if !skip_animation && !self.duration.is_zero() && from != to => {
                self.transition = Some(Transition {
                    from,
                    to,
                    started: None,
                });
            }
            _ => {
                self.transition = None;
                self.displayed = Some(to);
            }
        }

        self.raise_frame_request()
    }

    /// Drop the highlight entirely.
    pub fn clear(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.transition = None;
        self.displayed = None;
        self.raise_frame_request()
    }

    fn raise_frame_request(&mut self) -> bool {
        !std::mem::replace(&mut self.frame_requested, true)
    }

    /// Advance to `now` and return the snapshot to draw.
    ///
    /// `None` once disposed.
    pub fn on_frame(&mut self, now: Instant) -> Option<Frame> {
        if self.disposed {
            return None;
        }

        self.frame_requested = false;

        if let Some(tr) = self.transition.as_mut() {
            let started = *tr.started.get_or_insert(now);
            let elapsed = now.saturating_duration_since(started);
            let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();

            if t >= 1.0 {
                self.displayed = Some(tr.to);
                self.transition = None;
            } else {
                self.displayed = Some(RectF::lerp(tr.from, tr.to, apply_easing(t, self.easing)));
            }
        }

        let more = self.transition.is_some();
        if more {
            self.frame_requested = true;
        }

        Some(Frame {
            rect: self.displayed.map(RectF::round),
            more,
        })
    }

    /// Cancel any interpolation; later calls are no-ops.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.transition = None;
        self.frame_requested = false;
    }
}
