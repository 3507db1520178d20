// Author: Dustin Pilgrim
// License: MIT
//
// Scripted sessions: a recorded desktop layout plays the host, a small text
// script plays the user.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use async_io::Timer;
use eventline::{debug, info, warn};
use futures::executor::LocalPool;
use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use regionpick_core::{Candidate, CursorIcon, HostError, MonitorInfo, Point, Rect, SelectionState};
use regionpick_engine::transform::LogicalPoint;
use regionpick_engine::{
    CandidateSource, CaptureSession, LastSelectionStore, OverlayHost, SelectionConfig,
    SessionBounds,
};

const FRAME: Duration = Duration::from_millis(16);
const MAX_FRAMES_PER_PUMP: usize = 1_000;
const MAX_SETTLE_ROUNDS: usize = 10_000;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WindowEntry {
    pub id: u64,
    pub rect: Rect,
}

/// A recorded desktop: monitors plus what the enumeration service reported.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Layout {
    pub monitors: Vec<MonitorInfo>,
    #[serde(default = "default_scale")]
    pub overlay_scale: f64,
    /// Topmost first.
    #[serde(default)]
    pub windows: Vec<WindowEntry>,
    /// Present when the recording had fine-grained element data.
    #[serde(default)]
    pub elements: Option<Vec<Candidate>>,
}

fn default_scale() -> f64 {
    1.0
}

impl Layout {
    pub fn from_json(s: &str) -> Result<Self, String> {
        let layout: Layout =
            serde_json::from_str(s).map_err(|e| format!("invalid layout: {e}"))?;
        if layout.monitors.is_empty() {
            return Err("invalid layout: no monitors in layout".into());
        }
        Ok(layout)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Move(Point),
    /// Move to a point given in one monitor's logical pixels.
    MoveOn { monitor: usize, at: Point },
    Down(Point),
    Up,
    Wheel(i32),
    ToggleChildren,
    Cancel,
    Restore,
    Select(Rect),
    Clear,
    Wait(Duration),
}

fn ints<const N: usize>(args: &[&str], lineno: usize) -> Result<[i32; N], String> {
    if args.len() != N {
        return Err(format!("line {lineno}: expected {N} argument(s), got {}", args.len()));
    }
    let mut out = [0; N];
    for (slot, a) in out.iter_mut().zip(args) {
        *slot = a
            .parse()
            .map_err(|e| format!("line {lineno}: bad number \"{a}\": {e}"))?;
    }
    Ok(out)
}

/// One event per line; blank lines and `#` comments are skipped.
///
/// ```text
/// move 10 10
/// lmove 1 200 100
/// down 20 20
/// up
/// wheel 1
/// tab
/// select 0 0 100 100
/// wait 50
/// ```
pub fn parse_script(src: &str) -> Result<Vec<Step>, String> {
    let mut steps = Vec::new();

    for (i, line) in src.lines().enumerate() {
        let lineno = i + 1;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        let step = match cmd.to_lowercase().as_str() {
            "move" => {
                let [x, y] = ints::<2>(&args, lineno)?;
                Step::Move(Point::new(x, y))
            }
            "lmove" => {
                let [m, x, y] = ints::<3>(&args, lineno)?;
                let monitor = usize::try_from(m)
                    .map_err(|_| format!("line {lineno}: monitor index must not be negative"))?;
                Step::MoveOn {
                    monitor,
                    at: Point::new(x, y),
                }
            }
            "down" => {
                let [x, y] = ints::<2>(&args, lineno)?;
                Step::Down(Point::new(x, y))
            }
            "up" => {
                ints::<0>(&args, lineno)?;
                Step::Up
            }
            "wheel" => {
                let [d] = ints::<1>(&args, lineno)?;
                Step::Wheel(d)
            }
            "tab" => Step::ToggleChildren,
            "cancel" => Step::Cancel,
            "restore" => Step::Restore,
            "clear" => Step::Clear,
            "select" => {
                let [a, b, c, d] = ints::<4>(&args, lineno)?;
                Step::Select(Rect::new(a, b, c, d))
            }
            "wait" => {
                let [ms] = ints::<1>(&args, lineno)?;
                let ms = u64::try_from(ms)
                    .map_err(|_| format!("line {lineno}: wait must not be negative"))?;
                Step::Wait(Duration::from_millis(ms))
            }
            other => return Err(format!("line {lineno}: unknown command \"{other}\"")),
        };

        steps.push(step);
    }

    Ok(steps)
}

struct ScriptedSource {
    windows: Vec<(u64, Rect)>,
    elements: Option<Vec<Candidate>>,
    delay: Duration,
}

fn after<T: 'static>(delay: Duration, value: T) -> LocalBoxFuture<'static, Result<T, HostError>> {
    async move {
        if !delay.is_zero() {
            Timer::after(delay).await;
        }
        Ok(value)
    }
    .boxed_local()
}

impl CandidateSource for ScriptedSource {
    fn list_candidates(&self) -> LocalBoxFuture<'static, Result<Vec<(u64, Rect)>, HostError>> {
        after(self.delay, self.windows.clone())
    }

    fn element_at_point(
        &self,
        p: Point,
    ) -> LocalBoxFuture<'static, Result<Option<Vec<Candidate>>, HostError>> {
        let Some(elements) = &self.elements else {
            return future::ready(Ok(None)).boxed_local();
        };

        let hits: Vec<Candidate> = elements.iter().filter(|c| c.rect.contains(p)).copied().collect();
        after(self.delay, Some(hits))
    }

    fn enumerates_elements(&self) -> bool {
        self.elements.is_some()
    }
}

#[derive(Default)]
struct ReplayHost {
    frame_requested: Cell<bool>,
    cursor: Cell<CursorIcon>,
    selection_events: Cell<usize>,
    draws: Cell<usize>,
    last_drawn: Cell<Option<Rect>>,
}

impl ReplayHost {
    fn take_frame_request(&self) -> bool {
        self.frame_requested.replace(false)
    }
}

impl OverlayHost for ReplayHost {
    fn restore_z_order(&self) -> Result<(), HostError> {
        debug!("host: restore z-order");
        Ok(())
    }

    fn request_focus(&self) -> Result<(), HostError> {
        debug!("host: request focus");
        Ok(())
    }

    fn selection_changed(&self, rect: Option<Rect>) {
        self.selection_events.set(self.selection_events.get() + 1);
        debug!("host: selection {:?}", rect);
    }

    fn set_cursor(&self, icon: CursorIcon) {
        if self.cursor.replace(icon) != icon {
            debug!("host: cursor {}", icon.theme_name());
        }
    }

    fn request_frame(&self) {
        self.frame_requested.set(true);
    }

    fn draw(&self, rect: Option<Rect>) {
        self.draws.set(self.draws.get() + 1);
        self.last_drawn.set(rect);
    }
}

pub struct ReplayOptions {
    pub lookup_delay: Duration,
    pub store: Option<Rc<dyn LastSelectionStore>>,
}

/// The last pointer position in every space the session knows about.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PointerReport {
    pub overlay: Point,
    pub global: Point,
    pub monitor: Option<String>,
    /// Monitor-logical position (divided by that monitor's scale).
    pub logical: Option<(f64, f64)>,
}

/// Where a replayed session ended up.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplayOutcome {
    pub state: SelectionState,
    /// Overlay pixels.
    pub rect: Option<Rect>,
    /// Global desktop pixels.
    pub global_rect: Option<Rect>,
    pub level: usize,
    pub candidate: Option<u64>,
    pub cursor: CursorIcon,
    pub lookups: u64,
    pub dropped: u64,
    pub failed: u64,
    pub selection_events: usize,
    pub draws: usize,
    pub last_drawn: Option<Rect>,
    pub pointer: Option<PointerReport>,
}

struct Driver {
    pool: LocalPool,
    host: Rc<ReplayHost>,
    session: CaptureSession,
    clock: Instant,
    pointer: Option<Point>,
}

impl Driver {
    fn pump_frames(&mut self) {
        let mut frames = 0;
        while self.host.take_frame_request() && frames < MAX_FRAMES_PER_PUMP {
            self.clock += FRAME;
            self.session.on_frame(self.clock);
            frames += 1;
        }
    }

    fn wait(&mut self, d: Duration) {
        self.pool.run_until(Timer::after(d));
        self.pool.run_until_stalled();
        self.pump_frames();
    }

    fn settle(&mut self, delay: Duration) {
        let tick = delay.max(Duration::from_millis(1));
        for _ in 0..MAX_SETTLE_ROUNDS {
            self.pool.run_until_stalled();
            self.pump_frames();
            if self.session.is_index_ready() && !self.session.is_lookup_busy() {
                return;
            }
            self.pool.run_until(Timer::after(tick));
        }
    }

    fn step(&mut self, step: Step) {
        debug!("replay: {:?}", step);
        match step {
            Step::Move(p) => {
                self.pointer = Some(p);
                self.session.on_pointer_move(p);
            }
            Step::MoveOn { monitor, at } => {
                let t = self.session.transform();
                let lp = LogicalPoint {
                    monitor,
                    x: at.x as f64,
                    y: at.y as f64,
                };
                let Some(global) = t.monitor_logical_to_global(lp) else {
                    warn!("replay: no monitor {monitor} in layout, step skipped");
                    return;
                };
                let p = t.global_to_overlay(global);
                self.pointer = Some(p);
                self.session.on_pointer_move(p);
            }
            Step::Down(p) => {
                self.pointer = Some(p);
                self.session.on_pointer_down(p);
            }
            Step::Up => self.session.on_pointer_up(),
            Step::Wheel(d) => self.session.on_wheel(d),
            Step::ToggleChildren => self.session.toggle_find_children(),
            Step::Cancel => self.session.cancel(),
            Step::Restore => {
                if !self.session.restore_last_selection() {
                    info!("replay: no last selection to restore");
                }
            }
            Step::Select(r) => self.session.set_selection_rect(Some(r)),
            Step::Clear => self.session.set_selection_rect(None),
            Step::Wait(d) => {
                self.wait(d);
                return;
            }
        }
        self.pool.run_until_stalled();
        self.pump_frames();
    }
}

pub fn run(
    layout: Layout,
    steps: &[Step],
    config: SelectionConfig,
    opts: ReplayOptions,
) -> ReplayOutcome {
    let pool = LocalPool::new();
    let host = Rc::new(ReplayHost::default());

    let source = Rc::new(ScriptedSource {
        windows: layout.windows.iter().map(|w| (w.id, w.rect)).collect(),
        elements: layout.elements,
        delay: opts.lookup_delay,
    });

    info!(
        "replay: {} window(s), {} step(s), lookup delay {:?}",
        source.windows.len(),
        steps.len(),
        opts.lookup_delay
    );

    let session = CaptureSession::start(
        SessionBounds {
            monitors: layout.monitors,
            overlay_scale: layout.overlay_scale,
        },
        config,
        source,
        host.clone(),
        Rc::new(pool.spawner()),
        opts.store,
    );

    let mut driver = Driver {
        pool,
        host,
        session,
        clock: Instant::now(),
        pointer: None,
    };

    driver.pool.run_until_stalled();
    for step in steps {
        driver.step(*step);
    }
    driver.settle(opts.lookup_delay);

    let Driver {
        host,
        session,
        pointer,
        ..
    } = driver;
    let stats = session.coalescer_stats();
    let rect = session.selection_rect();
    let pointer = pointer.map(|p| pointer_report(&session, p));

    let outcome = ReplayOutcome {
        state: session.selection_state(),
        rect,
        global_rect: rect.map(|r| session.transform().rect_to_global(r)),
        level: session.auto_select_level(),
        candidate: session.auto_candidate().map(|c| c.id),
        cursor: host.cursor.get(),
        lookups: stats.looked_up,
        dropped: stats.dropped(),
        failed: stats.failed,
        selection_events: host.selection_events.get(),
        draws: host.draws.get(),
        last_drawn: host.last_drawn.get(),
        pointer,
    };

    session.end();
    outcome
}

fn pointer_report(session: &CaptureSession, overlay: Point) -> PointerReport {
    let t = session.transform();
    let global = t.overlay_to_global(overlay);
    let logical = t.global_to_monitor_logical(global);

    PointerReport {
        overlay,
        global,
        monitor: logical
            .and_then(|lp| t.monitors().get(lp.monitor))
            .map(|m| m.name.clone().unwrap_or_else(|| "unnamed".into())),
        logical: logical.map(|lp| (lp.x, lp.y)),
    }
}
