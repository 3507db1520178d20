// Author: Dustin Pilgrim
// License: MIT
//
// Single-flight wrapper around the async candidate lookup.
//
// `submit` only overwrites a one-ticket mailbox. At most one worker task
// exists; it drains the mailbox one ticket at a time, so at most one lookup is
// in flight and at most one ticket waits behind it. Anything older is dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use eventline::{debug, warn};
use futures_util::future::LocalBoxFuture;
use futures_util::task::{LocalFutureObj, LocalSpawn};

use regionpick_core::{HostError, Point};

pub type LookupFn<T> = Box<dyn Fn(Point) -> LocalBoxFuture<'static, Result<T, HostError>>>;
pub type ApplyFn<T> = Box<dyn FnMut(Ticket, T)>;

/// A lookup point stamped with the auto-select epoch it was requested in.
/// The epoch comes back with the result so the receiver can tell whether it
/// left auto-select in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub at: Point,
    pub epoch: u64,
}

#[derive(Debug, Default)]
struct Mailbox {
    pending: Option<Ticket>,
    running: bool,
    closed: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerStats {
    pub submitted: u64,
    pub looked_up: u64,
    pub failed: u64,
}

impl CoalescerStats {
    /// Tickets overwritten in the mailbox before a worker picked them up.
    pub fn dropped(&self) -> u64 {
        self.submitted.saturating_sub(self.looked_up)
    }
}

struct Shared<T> {
    mailbox: RefCell<Mailbox>,
    lookup: LookupFn<T>,
    apply: RefCell<ApplyFn<T>>,
    spawner: Rc<dyn LocalSpawn>,
    stats: Cell<CoalescerStats>,
}

pub struct AutoSelectCoalescer<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for AutoSelectCoalescer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: 'static> AutoSelectCoalescer<T> {
    pub fn new(spawner: Rc<dyn LocalSpawn>, lookup: LookupFn<T>, apply: ApplyFn<T>) -> Self {
        Self {
            shared: Rc::new(Shared {
                mailbox: RefCell::new(Mailbox::default()),
                lookup,
                apply: RefCell::new(apply),
                spawner,
                stats: Cell::new(CoalescerStats::default()),
            }),
        }
    }

    /// Queue `t` as the newest ticket. Never blocks, never fails.
    pub fn submit(&self, t: Ticket) {
        let start_worker = {
            let mut mb = self.shared.mailbox.borrow_mut();
            if mb.closed {
                return;
            }
            if mb.pending.replace(t).is_some() {
                debug!("coalescer: replaced queued point with ({}, {})", t.at.x, t.at.y);
            }
            !std::mem::replace(&mut mb.running, true)
        };

        let mut stats = self.shared.stats.get();
        stats.submitted += 1;
        self.shared.stats.set(stats);

        if !start_worker {
            return;
        }

        let shared = Rc::clone(&self.shared);
        let task = LocalFutureObj::new(Box::pin(run_worker(shared)));
        if let Err(e) = self.shared.spawner.spawn_local_obj(task) {
            warn!("coalescer: failed to spawn lookup worker: {e}");
            let mut mb = self.shared.mailbox.borrow_mut();
            mb.running = false;
            mb.pending = None;
        }
    }

    /// A worker is running (a lookup is in flight or about to start).
    pub fn is_busy(&self) -> bool {
        self.shared.mailbox.borrow().running
    }

    pub fn stats(&self) -> CoalescerStats {
        self.shared.stats.get()
    }

    /// Stop accepting tickets. An in-flight lookup still completes but its
    /// result is discarded.
    pub fn close(&self) {
        let mut mb = self.shared.mailbox.borrow_mut();
        mb.closed = true;
        mb.pending = None;
    }
}

async fn run_worker<T>(shared: Rc<Shared<T>>) {
    loop {
        let ticket = {
            let mut mb = shared.mailbox.borrow_mut();
            match mb.pending.take() {
                Some(t) if !mb.closed => t,
                _ => {
                    mb.running = false;
                    return;
                }
            }
        };

        let mut stats = shared.stats.get();
        stats.looked_up += 1;
        shared.stats.set(stats);

        let result = (shared.lookup)(ticket.at).await;

        match result {
            Ok(value) => {
                if shared.mailbox.borrow().closed {
                    debug!("coalescer: closed while looking up, result discarded");
                    continue;
                }
                (shared.apply.borrow_mut())(ticket, value);
            }
            Err(e) => {
                let mut stats = shared.stats.get();
                stats.failed += 1;
                shared.stats.set(stats);
                debug!(
                    "coalescer: lookup at ({}, {}) failed: {e}",
                    ticket.at.x, ticket.at.y
                );
            }
        }
    }
}
