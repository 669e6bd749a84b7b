//! Frame-callback bookkeeping for animators.
//!
//! The host drives frames; animators only run while they hold a pending
//! [`AnimationHandle`]. A handle is an owned resource: dropping it cancels the
//! callback, and [`HandleSlot::acquire`] cancels the previous handle before a
//! new one is issued, so one owner never has two callbacks fighting over the
//! same output.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(u64);

#[derive(Debug, Default)]
struct SchedulerState {
    next_id: u64,
    pending: BTreeMap<HandleId, &'static str>,
    suspended: bool,
    cancelled: u64,
    finished: u64,
}

/// Registry of pending frame callbacks.
///
/// Cloning is cheap and every clone refers to the same registry. The engine is
/// single-threaded, so this is `Rc`-based and not `Send`.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

/// Counters for debug overlays and tests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    pub pending: usize,
    pub cancelled: u64,
    pub finished: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new pending handle for `owner`.
    ///
    /// Prefer [`HandleSlot::acquire`], which cancels the owner's previous
    /// handle first.
    pub fn request(&self, owner: &'static str) -> AnimationHandle {
        let mut state = self.state.borrow_mut();
        let id = HandleId(state.next_id);
        state.next_id += 1;
        state.pending.insert(id, owner);
        trace!(owner, id = id.0, "frame callback requested");

        AnimationHandle {
            id,
            owner,
            finished: false,
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn is_pending(&self, id: HandleId) -> bool {
        self.state.borrow().pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn pending_for(&self, owner: &str) -> usize {
        self.state
            .borrow()
            .pending
            .values()
            .filter(|o| **o == owner)
            .count()
    }

    pub fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }

    /// Stops running callbacks (e.g. the view went to a background tab).
    /// Pending handles stay registered and run again after [`resume`].
    ///
    /// [`resume`]: FrameScheduler::resume
    pub fn suspend(&self) {
        let mut state = self.state.borrow_mut();
        if !state.suspended {
            state.suspended = true;
            debug!(pending = state.pending.len(), "frame scheduler suspended");
        }
    }

    pub fn resume(&self) {
        let mut state = self.state.borrow_mut();
        if state.suspended {
            state.suspended = false;
            debug!(pending = state.pending.len(), "frame scheduler resumed");
        }
    }

    /// Cancels every pending callback (teardown). Returns how many were live.
    pub fn cancel_all(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let n = state.pending.len();
        state.pending.clear();
        state.cancelled += n as u64;
        if n > 0 {
            debug!(cancelled = n, "cancelled all frame callbacks");
        }
        n
    }

    pub fn stats(&self) -> SchedulerStats {
        let state = self.state.borrow();
        SchedulerStats {
            pending: state.pending.len(),
            cancelled: state.cancelled,
            finished: state.finished,
        }
    }
}

/// An owned, pending frame callback. Dropping it cancels the callback.
#[derive(Debug)]
pub struct AnimationHandle {
    id: HandleId,
    owner: &'static str,
    finished: bool,
    state: Weak<RefCell<SchedulerState>>,
}

impl AnimationHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// False once cancelled, including by [`FrameScheduler::cancel_all`] or
    /// when the scheduler itself is gone.
    pub fn is_pending(&self) -> bool {
        self.state.upgrade().is_some_and(|state| {
            let pending = state.borrow().pending.contains_key(&self.id);
            pending
        })
    }

    /// Pending and the scheduler is not suspended.
    pub fn is_runnable(&self) -> bool {
        self.state.upgrade().is_some_and(|state| {
            let state = state.borrow();
            !state.suspended && state.pending.contains_key(&self.id)
        })
    }

    /// Releases the handle after the animation ran to completion.
    pub fn finish(mut self) {
        self.finished = true;
    }

    pub fn cancel(self) {}
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        if state.pending.remove(&self.id).is_some() {
            if self.finished {
                state.finished += 1;
            } else {
                state.cancelled += 1;
                trace!(owner = self.owner, id = self.id.0, "frame callback cancelled");
            }
        }
    }
}

/// Holds at most one [`AnimationHandle`] for an animator.
#[derive(Debug, Default)]
pub struct HandleSlot {
    handle: Option<AnimationHandle>,
}

impl HandleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the current handle (synchronously) and then issues a new one.
    pub fn acquire(&mut self, scheduler: &FrameScheduler, owner: &'static str) -> HandleId {
        self.release();
        let handle = scheduler.request(owner);
        let id = handle.id();
        self.handle = Some(handle);
        id
    }

    /// Cancels the current handle. Returns whether one was held.
    pub fn release(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Releases the current handle as completed rather than cancelled.
    pub fn finish(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.finish();
        }
    }

    pub fn id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(AnimationHandle::id)
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(AnimationHandle::is_pending)
    }

    pub fn is_runnable(&self) -> bool {
        self.handle.as_ref().is_some_and(AnimationHandle::is_runnable)
    }
}
