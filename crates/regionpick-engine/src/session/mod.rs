// Author: Dustin Pilgrim
// License: MIT
//
// One capture session: created when the overlay is ready, consumed when it
// closes. Owns the selection machine, the candidate index, the lookup
// coalescer and the animated highlight, and turns machine effects into host
// calls. Host calls are made with no session borrow held.

pub mod machine;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use eventline::{debug, info, warn};
use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use futures_util::task::{LocalFutureObj, LocalSpawn};

use regionpick_core::{Candidate, HostError, MonitorInfo, Point, Rect, SelectionState};

use crate::animation::AnimatedRect;
use crate::coalescer::{AutoSelectCoalescer, CoalescerStats, LookupFn, Ticket};
use crate::config::SelectionConfig;
use crate::host::{CandidateSource, LastSelectionStore, OverlayHost};
use crate::index::{assemble_candidates, IndexSlot, Lookup, SpatialIndex};
use crate::transform::CoordinateTransform;

pub use machine::{DragContext, Effects, Redraw, SelectionMachine};

/// What the overlay covers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBounds {
    pub monitors: Vec<MonitorInfo>,
    /// Device pixel ratio of the overlay canvas.
    pub overlay_scale: f64,
}

impl Default for SessionBounds {
    fn default() -> Self {
        Self {
            monitors: Vec::new(),
            overlay_scale: 1.0,
        }
    }
}

struct State {
    machine: SelectionMachine,
    renderer: AnimatedRect,
    slot: IndexSlot,
    ended: bool,
}

struct Shared {
    state: RefCell<State>,
    config: SelectionConfig,
    transform: Rc<CoordinateTransform>,
    host: Rc<dyn OverlayHost>,
    store: Option<Rc<dyn LastSelectionStore>>,
    coalescer: RefCell<Option<AutoSelectCoalescer<Lookup>>>,
}

impl Shared {
    fn submit(&self, t: Ticket) {
        let coalescer = self.coalescer.borrow().clone();
        if let Some(c) = coalescer {
            c.submit(t);
        }
    }

    fn flush(&self, fx: Effects) {
        if fx.is_empty() {
            return;
        }

        let wants_frame = {
            let mut st = self.state.borrow_mut();
            match fx.redraw {
                Some(Redraw::To { rect, skip_animation }) => {
                    st.renderer.update(rect, skip_animation)
                }
                Some(Redraw::Clear) => st.renderer.clear(),
                None => false,
            }
        };

        if let Some(t) = fx.lookup {
            self.submit(t);
        }
        if let Some(sel) = fx.selection_changed {
            self.host.selection_changed(sel);
        }
        if let Some(icon) = fx.cursor {
            self.host.set_cursor(icon);
        }
        if wants_frame {
            self.host.request_frame();
        }

        if fx.entered_selected {
            if let Err(e) = self.host.restore_z_order() {
                warn!("overlay: restore z-order failed: {e}");
            }
            if let Err(e) = self.host.request_focus() {
                warn!("overlay: request focus failed: {e}");
            }
        }

        if let Some(r) = fx.committed {
            debug!(
                "selection committed: ({}, {}) {}x{}",
                r.min_x,
                r.min_y,
                r.width(),
                r.height()
            );
            if let Some(store) = &self.store {
                if let Err(e) = store.save(self.transform.rect_to_global(r)) {
                    warn!("last selection: save failed: {e}");
                }
            }
        }
    }

    /// Run `f` against the machine unless the session has ended, then carry
    /// out the effects.
    fn drive(&self, f: impl FnOnce(&mut SelectionMachine) -> Effects) {
        let fx = {
            let mut st = self.state.borrow_mut();
            if st.ended {
                return;
            }
            f(&mut st.machine)
        };
        self.flush(fx);
    }

    fn install_index(&self, windows: Vec<(u64, Rect)>, desktop_fallback: bool) {
        let monitors: Vec<Rect> = if self.config.include_monitors {
            self.transform.monitors().iter().map(MonitorInfo::rect).collect()
        } else {
            Vec::new()
        };
        let desktop = desktop_fallback.then(|| self.transform.desktop());

        let window_count = windows.len();
        let index = SpatialIndex::build(assemble_candidates(windows, &monitors, desktop));
        info!(
            "candidate index ready: {} entries ({} windows)",
            index.len(),
            window_count
        );

        {
            let mut st = self.state.borrow_mut();
            if st.ended {
                return;
            }
            st.slot.install(index);
        }

        self.drive(|m| m.index_ready());
    }

    fn shutdown(&self) {
        let coalescer = self.coalescer.borrow_mut().take();
        if let Some(c) = coalescer {
            c.close();
        }

        let mut st = self.state.borrow_mut();
        if st.ended {
            return;
        }
        st.ended = true;
        st.renderer.dispose();
        st.machine.reset();
        st.slot.clear();
    }
}

/// The caller-owned handle for one overlay session.
pub struct CaptureSession {
    shared: Rc<Shared>,
}

impl CaptureSession {
    /// Start a session. Candidate enumeration runs on `spawner`; until it
    /// completes, auto-select lookups report "not ready" and change nothing.
    pub fn start(
        bounds: SessionBounds,
        config: SelectionConfig,
        source: Rc<dyn CandidateSource>,
        host: Rc<dyn OverlayHost>,
        spawner: Rc<dyn LocalSpawn>,
        store: Option<Rc<dyn LastSelectionStore>>,
    ) -> Self {
        let transform = Rc::new(CoordinateTransform::new(bounds.monitors, bounds.overlay_scale));
        let machine = SelectionMachine::new(config.clone(), Rc::clone(&transform));
        let renderer = AnimatedRect::new(config.animation_duration(), config.easing);

        info!(
            "session start: {} monitor(s), overlay {}x{} @ {}",
            transform.monitors().len(),
            machine.bounds().width(),
            machine.bounds().height(),
            transform.overlay_scale()
        );

        let shared = Rc::new(Shared {
            state: RefCell::new(State {
                machine,
                renderer,
                slot: IndexSlot::default(),
                ended: false,
            }),
            config,
            transform,
            host,
            store,
            coalescer: RefCell::new(None),
        });

        let coalescer = AutoSelectCoalescer::new(
            Rc::clone(&spawner),
            lookup_fn(Rc::downgrade(&shared), Rc::clone(&source)),
            {
                let weak = Rc::downgrade(&shared);
                Box::new(move |t: Ticket, lookup: Lookup| {
                    if let Some(shared) = weak.upgrade() {
                        shared.drive(|m| m.apply_lookup(t, lookup));
                    }
                })
            },
        );
        *shared.coalescer.borrow_mut() = Some(coalescer);

        spawn_index_build(&shared, source, spawner.as_ref());

        Self { shared }
    }

    pub fn on_pointer_down(&self, p: Point) {
        self.shared.drive(|m| m.pointer_down(p));
    }

    pub fn on_pointer_move(&self, p: Point) {
        self.shared.drive(|m| m.pointer_move(p));
    }

    pub fn on_pointer_up(&self) {
        self.shared.drive(|m| m.pointer_up());
    }

    /// Positive delta = wheel down = one level deeper.
    pub fn on_wheel(&self, delta: i32) {
        self.shared.drive(|m| m.wheel(delta));
    }

    pub fn selection_rect(&self) -> Option<Rect> {
        self.shared.state.borrow().machine.rect()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.shared.state.borrow().machine.state()
    }

    /// `Some` forces Selected with that rect; `None` forces Auto.
    pub fn set_selection_rect(&self, rect: Option<Rect>) {
        self.shared.drive(|m| m.set_rect(rect));
    }

    pub fn cancel(&self) {
        self.shared.drive(|m| m.cancel());
    }

    pub fn toggle_find_children(&self) {
        self.shared.drive(|m| m.toggle_find_children());
    }

    pub fn find_children(&self) -> bool {
        self.shared.state.borrow().machine.find_children()
    }

    /// Re-select the rect saved by an earlier session.
    ///
    /// Returns whether one was restored. A failing store is logged and
    /// treated as empty.
    pub fn restore_last_selection(&self) -> bool {
        let Some(store) = &self.shared.store else {
            return false;
        };

        let global = match store.load() {
            Ok(Some(r)) => r,
            Ok(None) => return false,
            Err(e) => {
                warn!("last selection: load failed: {e}");
                return false;
            }
        };

        let overlay = self.shared.transform.rect_to_overlay(global);
        if !overlay.intersects(&self.shared.transform.overlay_bounds()) {
            debug!("last selection lies outside this desktop, ignored");
            return false;
        }

        self.set_selection_rect(Some(overlay));
        true
    }

    /// Host frame callback. Draws the latest snapshot at most once.
    pub fn on_frame(&self, now: Instant) {
        let frame = self.shared.state.borrow_mut().renderer.on_frame(now);
        let Some(frame) = frame else {
            return;
        };

        self.shared.host.draw(frame.rect);
        if frame.more {
            self.shared.host.request_frame();
        }
    }

    pub fn auto_select_level(&self) -> usize {
        self.shared.state.borrow().machine.level()
    }

    /// Candidate currently highlighted by auto-select, global pixels.
    pub fn auto_candidate(&self) -> Option<Candidate> {
        self.shared.state.borrow().machine.auto_candidate()
    }

    pub fn is_index_ready(&self) -> bool {
        self.shared.state.borrow().slot.is_ready()
    }

    pub fn is_animating(&self) -> bool {
        self.shared.state.borrow().renderer.is_animating()
    }

    /// An auto-select lookup is in flight or queued.
    pub fn is_lookup_busy(&self) -> bool {
        self.shared
            .coalescer
            .borrow()
            .as_ref()
            .is_some_and(|c| c.is_busy())
    }

    pub fn coalescer_stats(&self) -> CoalescerStats {
        self.shared
            .coalescer
            .borrow()
            .as_ref()
            .map(|c| c.stats())
            .unwrap_or_default()
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.shared.transform
    }

    /// End the session. In-flight lookups finish into nothing.
    pub fn end(self) {
        let stats = self.coalescer_stats();
        self.shared.shutdown();
        info!(
            "session end: {} lookup(s), {} dropped, {} failed",
            stats.looked_up,
            stats.dropped(),
            stats.failed
        );
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

fn lookup_fn(weak: Weak<Shared>, source: Rc<dyn CandidateSource>) -> LookupFn<Lookup> {
    Box::new(move |p: Point| -> LocalBoxFuture<'static, Result<Lookup, HostError>> {
        let Some(shared) = weak.upgrade() else {
            return future::ready(Ok(Lookup::NotReady)).boxed_local();
        };

        let global = shared.transform.overlay_to_global(p);
        let (slot, find_children) = {
            let st = shared.state.borrow();
            (st.slot.clone(), st.machine.find_children())
        };

        if !find_children {
            return future::ready(Ok(slot.query_point(global))).boxed_local();
        }

        let fine = source.element_at_point(global);
        async move {
            match fine.await? {
                Some(hits) => Ok(Lookup::Ready(hits)),
                None => Ok(slot.query_point(global)),
            }
        }
        .boxed_local()
    })
}

fn spawn_index_build(shared: &Rc<Shared>, source: Rc<dyn CandidateSource>, spawner: &dyn LocalSpawn) {
    let weak = Rc::downgrade(shared);
    let desktop_fallback = !source.enumerates_elements();
    let listing = source.list_candidates();

    let task = async move {
        let windows = match listing.await {
            Ok(w) => w,
            Err(e) => {
                warn!("window enumeration failed, continuing without windows: {e}");
                Vec::new()
            }
        };

        if let Some(shared) = weak.upgrade() {
            shared.install_index(windows, desktop_fallback);
        }
    };

    if let Err(e) = spawner.spawn_local_obj(LocalFutureObj::new(Box::pin(task))) {
        warn!("failed to spawn candidate enumeration: {e}");
    }
}
