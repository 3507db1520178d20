// Author: Dustin Pilgrim
// License: MIT
//
// Three pixel spaces meet here:
// - global: the virtual desktop in physical pixels (window enumeration uses it)
// - monitor logical: per-monitor pixels divided by that monitor's scale
// - overlay: the full-desktop canvas, origin at the desktop's top-left,
//   divided by the overlay's own device pixel ratio
//
// Pointer input and the selection live in overlay space; candidates live in
// global space.

use regionpick_core::{MonitorInfo, Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicalPoint {
    pub monitor: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    monitors: Vec<MonitorInfo>,
    desktop: Rect,
    overlay_scale: f64,
}

fn sane_scale(s: f64) -> f64 {
    if s.is_finite() && s > 0.0 { s } else { 1.0 }
}

fn axis_gap(v: i32, min: i32, max: i32) -> i64 {
    if v < min {
        (min - v) as i64
    } else if v >= max {
        (v - (max - 1)) as i64
    } else {
        0
    }
}

fn dist2_to_rect(r: &Rect, p: Point) -> i64 {
    let dx = axis_gap(p.x, r.min_x, r.max_x);
    let dy = axis_gap(p.y, r.min_y, r.max_y);
    dx * dx + dy * dy
}

impl CoordinateTransform {
    /// With no monitors the desktop degenerates to a single pixel at the origin.
    pub fn new(monitors: Vec<MonitorInfo>, overlay_scale: f64) -> Self {
        let desktop = monitors
            .iter()
            .map(MonitorInfo::rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Rect::new(0, 0, 1, 1));

        Self {
            monitors,
            desktop,
            overlay_scale: sane_scale(overlay_scale),
        }
    }

    pub fn monitors(&self) -> &[MonitorInfo] {
        &self.monitors
    }

    /// Union of all monitors, global pixels.
    pub fn desktop(&self) -> Rect {
        self.desktop
    }

    pub fn overlay_scale(&self) -> f64 {
        self.overlay_scale
    }

    /// The overlay canvas in its own pixels; this is the capture bounds.
    pub fn overlay_bounds(&self) -> Rect {
        self.rect_to_overlay(self.desktop)
    }

    pub fn global_to_overlay(&self, p: Point) -> Point {
        Point::new(
            ((p.x - self.desktop.min_x) as f64 / self.overlay_scale).floor() as i32,
            ((p.y - self.desktop.min_y) as f64 / self.overlay_scale).floor() as i32,
        )
    }

    pub fn overlay_to_global(&self, p: Point) -> Point {
        Point::new(
            (p.x as f64 * self.overlay_scale).round() as i32 + self.desktop.min_x,
            (p.y as f64 * self.overlay_scale).round() as i32 + self.desktop.min_y,
        )
    }

    /// Global rect to overlay pixels, rounded outward so the result covers it.
    pub fn rect_to_overlay(&self, r: Rect) -> Rect {
        let s = self.overlay_scale;
        let ox = self.desktop.min_x;
        let oy = self.desktop.min_y;
        Rect::new(
            ((r.min_x - ox) as f64 / s).floor() as i32,
            ((r.min_y - oy) as f64 / s).floor() as i32,
            ((r.max_x - ox) as f64 / s).ceil() as i32,
            ((r.max_y - oy) as f64 / s).ceil() as i32,
        )
    }

    pub fn rect_to_global(&self, r: Rect) -> Rect {
        let s = self.overlay_scale;
        Rect::new(
            (r.min_x as f64 * s).floor() as i32 + self.desktop.min_x,
            (r.min_y as f64 * s).floor() as i32 + self.desktop.min_y,
            (r.max_x as f64 * s).ceil() as i32 + self.desktop.min_x,
            (r.max_y as f64 * s).ceil() as i32 + self.desktop.min_y,
        )
    }

    /// Index of the monitor a global point belongs to.
    ///
    /// Points in gaps between monitors (or outside the desktop) resolve to
    /// the nearest monitor.
    pub fn monitor_index_at(&self, p: Point) -> Option<usize> {
        if let Some(i) = self.monitors.iter().position(|m| m.rect().contains(p)) {
            return Some(i);
        }

        self.monitors
            .iter()
            .enumerate()
            .min_by_key(|(_, m)| dist2_to_rect(&m.rect(), p))
            .map(|(i, _)| i)
    }

    pub fn monitor_at(&self, p: Point) -> Option<&MonitorInfo> {
        self.monitor_index_at(p).map(|i| &self.monitors[i])
    }

    /// Rect of the monitor under an overlay point, in overlay pixels.
    ///
    /// Falls back to the whole overlay when there are no monitors.
    pub fn active_monitor_rect(&self, overlay_point: Point) -> Rect {
        let global = self.overlay_to_global(overlay_point);
        match self.monitor_at(global) {
            Some(m) => self.rect_to_overlay(m.rect()),
            None => self.overlay_bounds(),
        }
    }

    pub fn global_to_monitor_logical(&self, p: Point) -> Option<LogicalPoint> {
        let idx = self.monitor_index_at(p)?;
        let m = &self.monitors[idx];
        let s = sane_scale(m.scale);
        Some(LogicalPoint {
            monitor: idx,
            x: (p.x - m.x) as f64 / s,
            y: (p.y - m.y) as f64 / s,
        })
    }

    pub fn monitor_logical_to_global(&self, lp: LogicalPoint) -> Option<Point> {
        let m = self.monitors.get(lp.monitor)?;
        let s = sane_scale(m.scale);
        Some(Point::new(
            (lp.x * s).round() as i32 + m.x,
            (lp.y * s).round() as i32 + m.y,
        ))
    }
}
