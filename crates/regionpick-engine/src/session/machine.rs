// Author: Dustin Pilgrim
// License: MIT
//
// Selection state machine. Pure: every input returns the `Effects` the
// session has to carry out (lookups, redraws, host notifications), so the
// machine never calls out while its state is borrowed.

use std::rc::Rc;

use eventline::debug;

use regionpick_core::{Candidate, CursorIcon, DragMode, Point, Rect, SelectionState};

use crate::coalescer::Ticket;
use crate::config::SelectionConfig;
use crate::geometry::{
    apply_drag, classify_edge_proximity, clamp_rect_to_bounds, cursor_for, ensure_min_size,
    normalize, shift_into_bounds, span,
};
use crate::index::{order_hits, Lookup};
use crate::transform::CoordinateTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragContext {
    pub mode: DragMode,
    pub origin_rect: Rect,
    pub origin_pointer: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    To { rect: Rect, skip_animation: bool },
    Clear,
}

/// Work for the session to do after a transition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Effects {
    /// Submit an auto-select lookup for this overlay point.
    pub lookup: Option<Ticket>,
    pub redraw: Option<Redraw>,
    pub selection_changed: Option<Option<Rect>>,
    pub cursor: Option<CursorIcon>,
    /// Entered Selected from Auto or Manual: restore z-order and focus.
    pub entered_selected: bool,
    /// A selection was committed by the user (overlay pixels).
    pub committed: Option<Rect>,
}

impl Effects {
    fn show(&mut self, rect: Rect, skip_animation: bool) {
        self.redraw = Some(Redraw::To { rect, skip_animation });
        self.selection_changed = Some(Some(rect));
    }

    fn hide(&mut self) {
        self.redraw = Some(Redraw::Clear);
        self.selection_changed = Some(None);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub struct SelectionMachine {
    config: SelectionConfig,
    transform: Rc<CoordinateTransform>,
    bounds: Rect,

    state: SelectionState,
    rect: Option<Rect>,
    drag: Option<DragContext>,
    down: Option<Point>,
    pointer: Option<Point>,

    level: usize,
    hit_count: usize,
    auto_candidate: Option<Candidate>,
    find_children: bool,
    /// Bumped every time the machine leaves Auto. Lookup results stamped
    /// with an older epoch are dropped.
    auto_epoch: u64,
}

impl SelectionMachine {
    pub fn new(config: SelectionConfig, transform: Rc<CoordinateTransform>) -> Self {
        let bounds = transform.overlay_bounds();
        let find_children = config.find_children;
        Self {
            config,
            transform,
            bounds,
            state: SelectionState::Auto,
            rect: None,
            drag: None,
            down: None,
            pointer: None,
            level: 0,
            hit_count: 0,
            auto_candidate: None,
            find_children,
            auto_epoch: 0,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn drag_context(&self) -> Option<DragContext> {
        self.drag
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn auto_candidate(&self) -> Option<Candidate> {
        self.auto_candidate
    }

    pub fn find_children(&self) -> bool {
        self.find_children
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    /// Capture bounds in overlay pixels.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn auto_epoch(&self) -> u64 {
        self.auto_epoch
    }

    /// Stamp `at` with the current auto-select epoch.
    pub fn ticket(&self, at: Point) -> Ticket {
        Ticket {
            at,
            epoch: self.auto_epoch,
        }
    }

    fn enter(&mut self, next: SelectionState) {
        if self.state != next {
            debug!("selection: {:?} -> {:?}", self.state, next);
            if self.state == SelectionState::Auto {
                self.auto_epoch += 1;
            }
            self.state = next;
        }
    }

    fn relook(&self) -> Option<Ticket> {
        self.pointer.map(|p| self.ticket(p))
    }

    fn commit(&mut self, rect: Rect, fx: &mut Effects) {
        let r = ensure_min_size(clamp_rect_to_bounds(rect, self.bounds));
        self.rect = Some(r);
        self.down = None;
        self.drag = None;
        self.enter(SelectionState::Selected);
        fx.show(r, true);
        fx.committed = Some(r);
    }

    fn beyond_threshold(&self, down: Point, p: Point) -> bool {
        let t = self.config.drag_threshold.max(0) as i64;
        down.dist2(p) > t * t
    }

    pub fn pointer_down(&mut self, p: Point) -> Effects {
        let mut fx = Effects::default();
        self.pointer = Some(p);

        match self.state {
            SelectionState::Auto => {
                self.down = Some(p);
            }
            SelectionState::Selected => {
                let Some(rect) = self.rect else {
                    return fx;
                };
                let mode = classify_edge_proximity(rect, p, self.config.edge_tolerance);
                self.drag = Some(DragContext {
                    mode,
                    origin_rect: rect,
                    origin_pointer: p,
                });
                self.enter(SelectionState::Drag);
                fx.cursor = Some(cursor_for(mode));
            }
            // button already held
            SelectionState::Manual | SelectionState::Drag => {}
        }

        fx
    }

    pub fn pointer_move(&mut self, p: Point) -> Effects {
        let mut fx = Effects::default();
        self.pointer = Some(p);

        match self.state {
            SelectionState::Auto => match self.down {
                Some(down) if self.beyond_threshold(down, p) => {
                    let r = span(down, p);
                    self.rect = Some(r);
                    self.enter(SelectionState::Manual);
                    fx.show(r, true);
                    fx.cursor = Some(CursorIcon::Crosshair);
                }
                _ => fx.lookup = Some(self.ticket(p)),
            },
            SelectionState::Manual => {
                if let Some(down) = self.down {
                    let r = span(down, p);
                    self.rect = Some(r);
                    fx.show(r, true);
                }
            }
            SelectionState::Drag => {
                if let Some(ctx) = self.drag {
                    let r = apply_drag(ctx.mode, ctx.origin_rect, ctx.origin_pointer, p);
                    if self.rect != Some(r) {
                        self.rect = Some(r);
                        fx.show(r, true);
                    }
                }
            }
            SelectionState::Selected => {
                if let Some(rect) = self.rect {
                    let mode = classify_edge_proximity(rect, p, self.config.edge_tolerance);
                    fx.cursor = Some(cursor_for(mode));
                }
            }
        }

        fx
    }

    pub fn pointer_up(&mut self) -> Effects {
        let mut fx = Effects::default();

        match self.state {
            SelectionState::Auto => {
                let at = self.pointer.or(self.down);
                let rect = match (self.rect, at) {
                    (Some(r), _) => Some(r),
                    (None, Some(p)) => Some(self.transform.active_monitor_rect(p)),
                    (None, None) => None,
                };
                if let Some(r) = rect {
                    self.commit(r, &mut fx);
                    fx.entered_selected = true;
                } else {
                    self.down = None;
                }
            }
            SelectionState::Manual => {
                match self.rect {
                    Some(r) => {
                        self.commit(r, &mut fx);
                        fx.entered_selected = true;
                    }
                    None => self.down = None,
                }
            }
            SelectionState::Drag => {
                let whole = self.drag.map(|d| d.mode == DragMode::All).unwrap_or(false);
                if let Some(mut r) = self.rect {
                    if whole {
                        r = shift_into_bounds(r, self.bounds);
                    }
                    self.commit(r, &mut fx);
                } else {
                    self.drag = None;
                    self.enter(SelectionState::Selected);
                }
            }
            SelectionState::Selected => {}
        }

        fx
    }

    /// Positive delta (wheel down) goes one level deeper, negative goes back.
    pub fn wheel(&mut self, delta: i32) -> Effects {
        let mut fx = Effects::default();

        if self.state != SelectionState::Auto || delta == 0 {
            return fx;
        }

        let max_level = self.hit_count.saturating_sub(1);
        self.level = if delta > 0 {
            (self.level + 1).min(max_level)
        } else {
            self.level.saturating_sub(1)
        };
        debug!("auto-select level={} (hits={})", self.level, self.hit_count);

        fx.lookup = self.relook();
        fx
    }

    /// Apply a finished lookup. Ignored unless the machine has stayed in Auto
    /// since the ticket was issued.
    pub fn apply_lookup(&mut self, ticket: Ticket, lookup: Lookup) -> Effects {
        let mut fx = Effects::default();

        if self.state != SelectionState::Auto || ticket.epoch != self.auto_epoch {
            debug!(
                "auto-select: stale result for ({}, {}) ignored in {:?} (epoch {} != {})",
                ticket.at.x, ticket.at.y, self.state, ticket.epoch, self.auto_epoch
            );
            return fx;
        }

        // element lookups bypass the index, so fix their corners here too
        let mut hits: Vec<Candidate> = match lookup {
            Lookup::NotReady => return fx,
            Lookup::Ready(hits) => hits
                .into_iter()
                .map(|c| Candidate {
                    rect: normalize(c.rect),
                    ..c
                })
                .filter(|c| !c.rect.is_empty())
                .collect(),
        };

        if hits.is_empty() {
            self.hit_count = 0;
            self.auto_candidate = None;
            if self.rect.take().is_some() {
                fx.hide();
            }
            return fx;
        }

        order_hits(&mut hits);
        self.hit_count = hits.len();
        self.level = self.level.min(hits.len() - 1);

        let cand = hits[self.level];
        let r = clamp_rect_to_bounds(self.transform.rect_to_overlay(cand.rect), self.bounds);
        self.auto_candidate = Some(cand);

        if self.rect != Some(r) {
            self.rect = Some(r);
            fx.show(r, false);
        }

        fx
    }

    /// Programmatic override. `Some` forces Selected, `None` forces Auto.
    pub fn set_rect(&mut self, rect: Option<Rect>) -> Effects {
        let mut fx = Effects::default();

        match rect {
            Some(r) => {
                let from_pick = matches!(self.state, SelectionState::Auto | SelectionState::Manual);
                let r = ensure_min_size(clamp_rect_to_bounds(r, self.bounds));
                self.rect = Some(r);
                self.down = None;
                self.drag = None;
                self.enter(SelectionState::Selected);
                fx.show(r, false);
                fx.entered_selected = from_pick;
                if let Some(p) = self.pointer {
                    fx.cursor = Some(cursor_for(classify_edge_proximity(
                        r,
                        p,
                        self.config.edge_tolerance,
                    )));
                }
            }
            None => self.back_to_auto(&mut fx),
        }

        fx
    }

    /// External cancel: drop the selection and go back to picking.
    pub fn cancel(&mut self) -> Effects {
        let mut fx = Effects::default();
        self.back_to_auto(&mut fx);
        fx
    }

    fn back_to_auto(&mut self, fx: &mut Effects) {
        self.down = None;
        self.drag = None;
        self.auto_candidate = None;
        self.enter(SelectionState::Auto);
        if self.rect.take().is_some() {
            fx.hide();
        }
        fx.cursor = Some(CursorIcon::Crosshair);
        fx.lookup = self.relook();
    }

    pub fn toggle_find_children(&mut self) -> Effects {
        let mut fx = Effects::default();
        self.find_children = !self.find_children;
        debug!("find children: {}", self.find_children);
        if self.state == SelectionState::Auto {
            fx.lookup = self.relook();
        }
        fx
    }

    /// The index just came up; re-run the lookup where the pointer is.
    pub fn index_ready(&mut self) -> Effects {
        let mut fx = Effects::default();
        if self.state == SelectionState::Auto && self.down.is_none() {
            fx.lookup = self.relook();
        }
        fx
    }

    /// Session end: back to the initial state.
    pub fn reset(&mut self) {
        self.enter(SelectionState::Auto);
        self.auto_epoch += 1;
        self.rect = None;
        self.drag = None;
        self.down = None;
        self.pointer = None;
        self.level = 0;
        self.hit_count = 0;
        self.auto_candidate = None;
        self.find_children = self.config.find_children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use regionpick_core::MonitorInfo;

    fn machine() -> SelectionMachine {
        let transform = CoordinateTransform::new(
            vec![MonitorInfo {
                name: Some("DP-1".into()),
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                scale: 1.0,
            }],
            1.0,
        );
        SelectionMachine::new(SelectionConfig::default(), Rc::new(transform))
    }

    fn nested_hits() -> Lookup {
        Lookup::Ready(vec![
            Candidate::new(1, Rect::new(0, 0, 100, 100), 0),
            Candidate::new(2, Rect::new(0, 0, 50, 50), 1),
        ])
    }

    fn selected_at(rect: Rect) -> SelectionMachine {
        let mut m = machine();
        m.set_rect(Some(rect));
        assert_eq!(m.state(), SelectionState::Selected);
        m
    }

    #[test]
    fn auto_move_requests_lookup() {
        let mut m = machine();
        let fx = m.pointer_move(Point::new(10, 10));
        assert_eq!(fx.lookup.map(|t| t.at), Some(Point::new(10, 10)));
        assert_eq!(m.state(), SelectionState::Auto);
    }

    #[test]
    fn auto_picks_most_specific_then_wheel_goes_outward() {
        let mut m = machine();
        let p = Point::new(10, 10);
        m.pointer_move(p);

        let fx = m.apply_lookup(m.ticket(p), nested_hits());
        assert_eq!(m.rect(), Some(Rect::new(0, 0, 50, 50)));
        assert_eq!(m.auto_candidate().map(|c| c.id), Some(2));
        assert_eq!(
            fx.redraw,
            Some(Redraw::To { rect: Rect::new(0, 0, 50, 50), skip_animation: false })
        );

        let fx = m.wheel(1);
        assert_eq!(m.level(), 1);
        assert_eq!(fx.lookup, Some(m.ticket(p)));

        m.apply_lookup(m.ticket(p), nested_hits());
        assert_eq!(m.rect(), Some(Rect::new(0, 0, 100, 100)));
        assert_eq!(m.state(), SelectionState::Auto);
    }

    #[test]
    fn wheel_level_stays_in_range() {
        let mut m = machine();
        let p = Point::new(10, 10);
        m.pointer_move(p);
        m.apply_lookup(m.ticket(p), nested_hits());

        for _ in 0..5 {
            m.wheel(120);
        }
        assert_eq!(m.level(), 1);
        for _ in 0..5 {
            m.wheel(-120);
        }
        assert_eq!(m.level(), 0);

        // fewer hits at the next point: the level is clamped on apply
        m.wheel(1);
        m.apply_lookup(
            m.ticket(Point::new(75, 75)),
            Lookup::Ready(vec![Candidate::new(1, Rect::new(0, 0, 100, 100), 0)]),
        );
        assert_eq!(m.level(), 0);
    }

    #[test]
    fn not_ready_leaves_rect_alone() {
        let mut m = machine();
        let p = Point::new(10, 10);
        m.pointer_move(p);
        m.apply_lookup(m.ticket(p), nested_hits());
        let fx = m.apply_lookup(m.ticket(p), Lookup::NotReady);
        assert!(fx.is_empty());
        assert_eq!(m.rect(), Some(Rect::new(0, 0, 50, 50)));
    }

    #[test]
    fn empty_hits_clear_rect() {
        let mut m = machine();
        let p = Point::new(10, 10);
        m.apply_lookup(m.ticket(p), nested_hits());
        let fx = m.apply_lookup(m.ticket(Point::new(500, 500)), Lookup::Ready(Vec::new()));
        assert_eq!(fx.redraw, Some(Redraw::Clear));
        assert_eq!(m.rect(), None);
    }

    #[test]
    fn inverted_element_hit_is_normalized() {
        let mut m = machine();
        let p = Point::new(30, 30);
        m.pointer_move(p);
        let inverted = Rect {
            min_x: 80,
            min_y: 60,
            max_x: 20,
            max_y: 10,
        };
        m.apply_lookup(m.ticket(p), Lookup::Ready(vec![Candidate::new(3, inverted, 0)]));
        assert_eq!(m.rect(), Some(Rect::new(20, 10, 80, 60)));
    }

    #[test]
    fn manual_drag_out_then_release() {
        let mut m = machine();
        m.pointer_down(Point::new(20, 20));
        m.pointer_move(Point::new(22, 21));
        assert_eq!(m.state(), SelectionState::Auto, "inside threshold");

        m.pointer_move(Point::new(80, 40));
        assert_eq!(m.state(), SelectionState::Manual);
        assert_eq!(m.rect(), Some(Rect::new(20, 20, 80, 40)));

        let fx = m.pointer_up();
        assert_eq!(m.state(), SelectionState::Selected);
        assert_eq!(m.rect(), Some(Rect::new(20, 20, 80, 40)));
        assert!(fx.entered_selected);
        assert_eq!(fx.committed, Some(Rect::new(20, 20, 80, 40)));
    }

    #[test]
    fn manual_drag_up_and_left_normalizes() {
        let mut m = machine();
        m.pointer_down(Point::new(100, 100));
        m.pointer_move(Point::new(40, 60));
        assert_eq!(m.rect(), Some(Rect::new(40, 60, 100, 100)));
    }

    #[test]
    fn auto_click_commits_candidate() {
        let mut m = machine();
        let p = Point::new(10, 10);
        m.pointer_move(p);
        m.apply_lookup(m.ticket(p), nested_hits());
        m.pointer_down(p);
        let fx = m.pointer_up();
        assert_eq!(m.state(), SelectionState::Selected);
        assert_eq!(m.rect(), Some(Rect::new(0, 0, 50, 50)));
        assert!(fx.entered_selected);
    }

    #[test]
    fn auto_click_without_candidate_takes_monitor() {
        let mut m = machine();
        m.pointer_down(Point::new(300, 300));
        m.pointer_up();
        assert_eq!(m.rect(), Some(Rect::new(0, 0, 1920, 1080)));
    }

    #[test]
    fn stale_lookup_after_manual_is_ignored() {
        let mut m = machine();
        let early = m.ticket(Point::new(20, 20));
        m.pointer_down(Point::new(20, 20));
        m.pointer_move(Point::new(80, 40));
        let fx = m.apply_lookup(early, nested_hits());
        assert!(fx.is_empty());
        assert_eq!(m.rect(), Some(Rect::new(20, 20, 80, 40)));
    }

    #[test]
    fn selected_hover_sets_cursor() {
        let mut m = selected_at(Rect::new(10, 10, 110, 110));
        let fx = m.pointer_move(Point::new(10, 60));
        assert_eq!(fx.cursor, Some(CursorIcon::EwResize));
        let fx = m.pointer_move(Point::new(60, 60));
        assert_eq!(fx.cursor, Some(CursorIcon::Move));
    }

    #[test]
    fn edge_drag_resizes() {
        let mut m = selected_at(Rect::new(10, 10, 110, 110));
        m.pointer_down(Point::new(10, 60));
        assert_eq!(m.state(), SelectionState::Drag);
        assert_eq!(m.drag_context().map(|d| d.mode), Some(DragMode::Left));

        m.pointer_move(Point::new(0, 60));
        assert_eq!(m.rect(), Some(Rect::new(0, 10, 110, 110)));

        let fx = m.pointer_up();
        assert_eq!(m.state(), SelectionState::Selected);
        assert!(m.drag_context().is_none());
        assert!(!fx.entered_selected);
    }

    #[test]
    fn move_drag_translates() {
        let mut m = selected_at(Rect::new(0, 0, 50, 50));
        m.pointer_down(Point::new(25, 25));
        assert_eq!(m.drag_context().map(|d| d.mode), Some(DragMode::All));
        m.pointer_move(Point::new(35, 40));
        assert_eq!(m.rect(), Some(Rect::new(10, 15, 60, 65)));
    }

    #[test]
    fn drag_release_clamps_to_bounds() {
        let mut m = selected_at(Rect::new(1800, 1000, 1900, 1060));
        // grab the bottom-right corner and pull it off screen
        m.pointer_down(Point::new(1900, 1060));
        m.pointer_move(Point::new(2100, 1200));
        assert_eq!(m.rect(), Some(Rect::new(1800, 1000, 2100, 1200)));
        m.pointer_up();
        assert_eq!(m.rect(), Some(Rect::new(1800, 1000, 1920, 1080)));
    }

    #[test]
    fn whole_drag_release_keeps_size() {
        let mut m = selected_at(Rect::new(100, 100, 200, 200));
        m.pointer_down(Point::new(150, 150));
        m.pointer_move(Point::new(2000, 150));
        m.pointer_up();
        assert_eq!(m.rect(), Some(Rect::new(1820, 100, 1920, 200)));
    }

    #[test]
    fn cancel_returns_to_auto() {
        let mut m = selected_at(Rect::new(10, 10, 110, 110));
        m.pointer_move(Point::new(50, 50));
        let fx = m.cancel();
        assert_eq!(m.state(), SelectionState::Auto);
        assert_eq!(m.rect(), None);
        assert_eq!(fx.lookup.map(|t| t.at), Some(Point::new(50, 50)));
        assert_eq!(fx.selection_changed, Some(None));
    }

    #[test]
    fn set_rect_none_forces_auto() {
        let mut m = selected_at(Rect::new(10, 10, 110, 110));
        m.set_rect(None);
        assert_eq!(m.state(), SelectionState::Auto);
    }

    #[test]
    fn set_rect_is_clamped_and_sized() {
        let mut m = machine();
        m.set_rect(Some(Rect::new(1900, 500, 1900, 2000)));
        assert_eq!(m.rect(), Some(Rect::new(1900, 500, 1901, 1080)));
    }

    #[test]
    fn wheel_ignored_outside_auto() {
        let mut m = selected_at(Rect::new(10, 10, 110, 110));
        assert!(m.wheel(1).is_empty());
        assert_eq!(m.level(), 0);
    }

    #[test]
    fn toggle_find_children_relooks() {
        let mut m = machine();
        m.pointer_move(Point::new(3, 4));
        let fx = m.toggle_find_children();
        assert!(m.find_children());
        assert_eq!(fx.lookup.map(|t| t.at), Some(Point::new(3, 4)));
    }

    #[test]
    fn result_from_before_a_round_trip_through_selected_is_dropped() {
        let mut m = machine();
        let fx = m.pointer_move(Point::new(100, 100));
        let Some(early) = fx.lookup else {
            panic!("expected a lookup ticket");
        };

        m.set_rect(Some(Rect::new(500, 500, 600, 600)));
        m.pointer_move(Point::new(1500, 900));
        let fx = m.cancel();
        assert_eq!(m.state(), SelectionState::Auto);
        assert_ne!(fx.lookup.map(|t| t.epoch), Some(early.epoch));

        let hit = Candidate::new(1, Rect::new(0, 0, 200, 200), 0);
        let fx = m.apply_lookup(early, Lookup::Ready(vec![hit]));
        assert!(fx.is_empty());
        assert_eq!(m.rect(), None);
        assert_eq!(m.auto_candidate(), None);
    }

    #[test]
    fn epoch_only_moves_when_leaving_auto() {
        let mut m = machine();
        m.pointer_move(Point::new(5, 5));
        m.wheel(1);
        m.toggle_find_children();
        assert_eq!(m.auto_epoch(), 0);

        m.pointer_down(Point::new(5, 5));
        m.pointer_move(Point::new(50, 50));
        assert_eq!(m.state(), SelectionState::Manual);
        assert_eq!(m.auto_epoch(), 1);
        m.pointer_up();
        assert_eq!(m.auto_epoch(), 1);
    }
}
