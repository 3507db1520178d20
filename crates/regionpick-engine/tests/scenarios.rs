// Author: Dustin Pilgrim
// License: MIT
//
// End-to-end selection scenarios driven through `CaptureSession`.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};

use regionpick_core::{Candidate, CursorIcon, DragMode, HostError, MonitorInfo, Point, Rect, SelectionState};
use regionpick_engine::geometry::{apply_drag, classify_edge_proximity};
use regionpick_engine::{
    CandidateSource, CaptureSession, OverlayHost, SelectionConfig, SessionBounds,
};

#[derive(Default)]
struct QuietHost {
    selections: RefCell<Vec<Option<Rect>>>,
    cursors: RefCell<Vec<CursorIcon>>,
}

impl OverlayHost for QuietHost {
    fn restore_z_order(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn request_focus(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn selection_changed(&self, rect: Option<Rect>) {
        self.selections.borrow_mut().push(rect);
    }

    fn set_cursor(&self, icon: CursorIcon) {
        self.cursors.borrow_mut().push(icon);
    }

    fn request_frame(&self) {}

    fn draw(&self, _rect: Option<Rect>) {}
}

type Reply = oneshot::Sender<Result<Option<Vec<Candidate>>, HostError>>;

/// Windows come back immediately; element lookups wait for the test.
struct Layout {
    windows: Vec<(u64, Rect)>,
    element_points: RefCell<Vec<Point>>,
    element_replies: RefCell<Vec<Reply>>,
}

impl Layout {
    fn new(windows: Vec<(u64, Rect)>) -> Self {
        Self {
            windows,
            element_points: RefCell::new(Vec::new()),
            element_replies: RefCell::new(Vec::new()),
        }
    }

    fn answer_next(&self, hits: Vec<Candidate>) {
        let tx = self.element_replies.borrow_mut().remove(0);
        let _ = tx.send(Ok(Some(hits)));
    }
}

impl CandidateSource for Layout {
    fn list_candidates(&self) -> LocalBoxFuture<'static, Result<Vec<(u64, Rect)>, HostError>> {
        future::ready(Ok(self.windows.clone())).boxed_local()
    }

    fn element_at_point(
        &self,
        p: Point,
    ) -> LocalBoxFuture<'static, Result<Option<Vec<Candidate>>, HostError>> {
        let (tx, rx) = oneshot::channel();
        self.element_points.borrow_mut().push(p);
        self.element_replies.borrow_mut().push(tx);
        async move {
            rx.await
                .unwrap_or_else(|_| Err(HostError::Enumeration("lookup abandoned".into())))
        }
        .boxed_local()
    }

    fn enumerates_elements(&self) -> bool {
        true
    }
}

fn one_monitor() -> SessionBounds {
    SessionBounds {
        monitors: vec![MonitorInfo {
            name: Some("HDMI-A-1".into()),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
            scale: 1.0,
        }],
        overlay_scale: 1.0,
    }
}

fn start(
    pool: &LocalPool,
    layout: Rc<Layout>,
    host: Rc<QuietHost>,
    config: SelectionConfig,
) -> CaptureSession {
    CaptureSession::start(
        one_monitor(),
        config,
        layout,
        host,
        Rc::new(pool.spawner()),
        None,
    )
}

fn no_monitors() -> SelectionConfig {
    SelectionConfig {
        include_monitors: false,
        ..SelectionConfig::default()
    }
}

#[test]
fn nested_windows_pick_inner_then_wheel_to_outer() {
    let mut pool = LocalPool::new();
    let layout = Rc::new(Layout::new(vec![
        (1, Rect::new(0, 0, 100, 100)),
        (2, Rect::new(0, 0, 50, 50)),
    ]));
    let host = Rc::new(QuietHost::default());
    let session = start(&pool, layout, host, no_monitors());
    pool.run_until_stalled();

    session.on_pointer_move(Point::new(10, 10));
    pool.run_until_stalled();
    assert_eq!(session.auto_select_level(), 0);
    assert_eq!(session.selection_rect(), Some(Rect::new(0, 0, 50, 50)));
    assert_eq!(session.auto_candidate().map(|c| c.id), Some(2));

    session.on_wheel(1);
    pool.run_until_stalled();
    assert_eq!(session.auto_select_level(), 1);
    assert_eq!(session.selection_rect(), Some(Rect::new(0, 0, 100, 100)));
    assert_eq!(session.auto_candidate().map(|c| c.id), Some(1));

    // nothing deeper than the outermost hit
    session.on_wheel(1);
    pool.run_until_stalled();
    assert_eq!(session.auto_select_level(), 1);
}

#[test]
fn left_edge_resize() {
    let rect = Rect::new(10, 10, 110, 110);
    assert_eq!(classify_edge_proximity(rect, Point::new(10, 60), 8), DragMode::Left);
    assert_eq!(
        apply_drag(DragMode::Left, rect, Point::new(10, 60), Point::new(0, 60)),
        Rect::new(0, 10, 110, 110)
    );

    let mut pool = LocalPool::new();
    let host = Rc::new(QuietHost::default());
    let session = start(&pool, Rc::new(Layout::new(Vec::new())), host.clone(), SelectionConfig::default());
    pool.run_until_stalled();

    session.set_selection_rect(Some(rect));
    session.on_pointer_move(Point::new(10, 60));
    assert_eq!(host.cursors.borrow().last(), Some(&CursorIcon::EwResize));

    session.on_pointer_down(Point::new(10, 60));
    assert_eq!(session.selection_state(), SelectionState::Drag);
    session.on_pointer_move(Point::new(0, 60));
    session.on_pointer_up();

    assert_eq!(session.selection_state(), SelectionState::Selected);
    assert_eq!(session.selection_rect(), Some(Rect::new(0, 10, 110, 110)));
}

#[test]
fn manual_drag_out_commits() {
    let mut pool = LocalPool::new();
    let host = Rc::new(QuietHost::default());
    let session = start(&pool, Rc::new(Layout::new(Vec::new())), host.clone(), SelectionConfig::default());
    pool.run_until_stalled();

    session.on_pointer_down(Point::new(20, 20));
    session.on_pointer_move(Point::new(80, 40));
    assert_eq!(session.selection_state(), SelectionState::Manual);
    assert_eq!(session.selection_rect(), Some(Rect::new(20, 20, 80, 40)));

    session.on_pointer_up();
    assert_eq!(session.selection_state(), SelectionState::Selected);
    assert_eq!(session.selection_rect(), Some(Rect::new(20, 20, 80, 40)));
    assert_eq!(host.selections.borrow().last(), Some(&Some(Rect::new(20, 20, 80, 40))));
}

#[test]
fn whole_rect_move() {
    assert_eq!(
        apply_drag(DragMode::All, Rect::new(0, 0, 50, 50), Point::new(25, 25), Point::new(35, 40)),
        Rect::new(10, 15, 60, 65)
    );

    let mut pool = LocalPool::new();
    let session = start(
        &pool,
        Rc::new(Layout::new(Vec::new())),
        Rc::new(QuietHost::default()),
        SelectionConfig::default(),
    );
    pool.run_until_stalled();

    session.set_selection_rect(Some(Rect::new(0, 0, 50, 50)));
    session.on_pointer_down(Point::new(25, 25));
    session.on_pointer_move(Point::new(35, 40));
    assert_eq!(session.selection_rect(), Some(Rect::new(10, 15, 60, 65)));
}

#[test]
fn burst_of_moves_runs_first_and_last_lookup_only() {
    let mut pool = LocalPool::new();
    let layout = Rc::new(Layout::new(Vec::new()));
    let config = SelectionConfig {
        find_children: true,
        ..no_monitors()
    };
    let session = start(&pool, layout.clone(), Rc::new(QuietHost::default()), config);
    pool.run_until_stalled();

    let p1 = Point::new(100, 100);
    let p2 = Point::new(110, 100);
    let p3 = Point::new(120, 100);

    session.on_pointer_move(p1);
    pool.run_until_stalled();
    session.on_pointer_move(p2);
    pool.run_until_stalled();
    session.on_pointer_move(p3);
    pool.run_until_stalled();
    assert_eq!(*layout.element_points.borrow(), vec![p1]);

    layout.answer_next(vec![Candidate::new(5, Rect::new(90, 90, 115, 115), 0)]);
    pool.run_until_stalled();
    layout.answer_next(vec![Candidate::new(6, Rect::new(115, 90, 140, 115), 0)]);
    pool.run_until_stalled();

    assert_eq!(*layout.element_points.borrow(), vec![p1, p3]);
    assert_eq!(session.selection_rect(), Some(Rect::new(115, 90, 140, 115)));
    assert_eq!(session.coalescer_stats().dropped(), 1);
}

#[test]
fn late_result_after_manual_drag_is_ignored() {
    let mut pool = LocalPool::new();
    let layout = Rc::new(Layout::new(Vec::new()));
    let config = SelectionConfig {
        find_children: true,
        ..no_monitors()
    };
    let session = start(&pool, layout.clone(), Rc::new(QuietHost::default()), config);
    pool.run_until_stalled();

    session.on_pointer_move(Point::new(20, 20));
    pool.run_until_stalled();
    session.on_pointer_down(Point::new(20, 20));
    session.on_pointer_move(Point::new(80, 40));
    assert_eq!(session.selection_state(), SelectionState::Manual);

    layout.answer_next(vec![Candidate::new(5, Rect::new(0, 0, 500, 500), 0)]);
    pool.run_until_stalled();

    assert_eq!(session.selection_rect(), Some(Rect::new(20, 20, 80, 40)));
}

#[test]
fn cancel_after_selection_goes_back_to_picking() {
    let mut pool = LocalPool::new();
    let layout = Rc::new(Layout::new(vec![(3, Rect::new(400, 300, 800, 700))]));
    let session = start(&pool, layout, Rc::new(QuietHost::default()), no_monitors());
    pool.run_until_stalled();

    session.on_pointer_move(Point::new(500, 500));
    pool.run_until_stalled();
    session.on_pointer_down(Point::new(500, 500));
    session.on_pointer_up();
    assert_eq!(session.selection_state(), SelectionState::Selected);
    assert_eq!(session.selection_rect(), Some(Rect::new(400, 300, 800, 700)));

    session.cancel();
    assert_eq!(session.selection_state(), SelectionState::Auto);
    pool.run_until_stalled();
    assert_eq!(session.selection_rect(), Some(Rect::new(400, 300, 800, 700)));
}

#[test]
fn late_result_from_before_a_cancelled_selection_is_ignored() {
    let mut pool = LocalPool::new();
    let layout = Rc::new(Layout::new(Vec::new()));
    let config = SelectionConfig {
        find_children: true,
        ..no_monitors()
    };
    let session = start(&pool, layout.clone(), Rc::new(QuietHost::default()), config);
    pool.run_until_stalled();

    let first = Point::new(100, 100);
    let second = Point::new(1500, 900);

    session.on_pointer_move(first);
    pool.run_until_stalled();
    session.set_selection_rect(Some(Rect::new(500, 500, 600, 600)));
    session.on_pointer_move(second);
    session.cancel();
    assert_eq!(session.selection_state(), SelectionState::Auto);
    assert_eq!(session.selection_rect(), None);

    // the lookup started before the selection lands after the mode came back
    layout.answer_next(vec![Candidate::new(1, Rect::new(0, 0, 200, 200), 0)]);
    pool.run_until_stalled();
    assert_eq!(session.selection_rect(), None);
    assert_eq!(*layout.element_points.borrow(), vec![first, second]);

    layout.answer_next(vec![Candidate::new(2, Rect::new(1400, 800, 1600, 1000), 0)]);
    pool.run_until_stalled();
    assert_eq!(session.selection_rect(), Some(Rect::new(1400, 800, 1600, 1000)));
    assert_eq!(session.auto_candidate().map(|c| c.id), Some(2));
}
