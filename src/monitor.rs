//! Cooperative cancellation and progress tokens.
//!
//! A [`Monitor`] travels along with every evaluation. Nodes consult it at
//! their boundaries and spawn a child per dependency, so cancelling any
//! monitor is observed by every live descendant on its next check. The
//! monitor never raises, it only reports state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::error::Cancelled;

/// Lifecycle of a monitor. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorState {
    Running,
    Done,
    Cancelled,
}

/// Receives progress updates from a monitor.
pub trait ProgressSink: Send + Sync {
    /// Called whenever progress or the expected total changes.
    fn update(&self, progress: u64, total: Option<u64>);

    /// Called once, when the monitor reaches a terminal state.
    fn finish(&self, state: MonitorState);
}

struct Inner {
    /// Progress is reported to the parent by `weight` when this monitor is
    /// done. Cancellation flows the other way, through `token`.
    parent: Option<(Arc<Inner>, u64)>,
    token: CancellationToken,
    state: Mutex<MonitorState>,
    progress: AtomicU64,
    total: AtomicU64,
    sink: Option<Arc<dyn ProgressSink>>,
}

const NO_TOTAL: u64 = u64::MAX;

impl Inner {
    fn new(
        parent: Option<(Arc<Inner>, u64)>,
        token: CancellationToken,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Self {
        Self {
            parent,
            token,
            state: Mutex::new(MonitorState::Running),
            progress: AtomicU64::new(0),
            total: AtomicU64::new(NO_TOTAL),
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        // The guarded value is a plain enum, a poisoned lock still holds a
        // valid state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn total(&self) -> Option<u64> {
        match self.total.load(Ordering::Acquire) {
            NO_TOTAL => None,
            total => Some(total),
        }
    }

    fn notify(&self) {
        if let Some(sink) = &self.sink {
            sink.update(self.progress.load(Ordering::Acquire), self.total());
        }
    }

    /// Moves a running monitor into a terminal state. Returns `false` when a
    /// terminal state was already recorded.
    fn finish(&self, next: MonitorState) -> bool {
        let mut state = self.lock();
        if *state != MonitorState::Running {
            return false;
        }

        *state = next;
        drop(state);

        if let Some(sink) = &self.sink {
            sink.finish(next);
        }

        true
    }

    fn advance(&self, amount: u64) {
        let state = self.lock();
        if *state != MonitorState::Running {
            return;
        }

        self.progress.fetch_add(amount, Ordering::AcqRel);
        drop(state);

        self.notify();
    }
}

/// A hierarchical, cooperative cancellation and progress token.
///
/// Cloning a `Monitor` yields another handle to the same token, which is how
/// a watchdog or a test double cancels an evaluation in flight.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new(None, CancellationToken::new(), None)),
        }
    }

    /// A root monitor that reports its progress to `sink`.
    pub fn with_sink(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            inner: Arc::new(Inner::new(None, CancellationToken::new(), Some(sink))),
        }
    }

    /// Returns `Err(Cancelled)` if this monitor or any ancestor has been
    /// cancelled. A running monitor that observes an ancestor's cancellation
    /// records `Cancelled` as its own terminal state.
    pub fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.inner.is_cancelled() {
            self.inner.finish(MonitorState::Cancelled);
            return Err(Cancelled);
        }

        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Cancels this monitor's token. Live children observe it on their next
    /// check.
    pub fn cancel(&self) {
        self.inner.token.cancel();
        if self.inner.finish(MonitorState::Cancelled) {
            tracing::debug!("monitor cancelled");
        }
    }

    /// Creates a monitor scoped to one dependency. When the child reaches
    /// `Done`, this monitor advances by `weight`.
    pub fn spawn_child(&self, weight: u64) -> Monitor {
        Monitor {
            inner: Arc::new(Inner::new(
                Some((self.inner.clone(), weight)),
                self.inner.token.child_token(),
                None,
            )),
        }
    }

    pub fn set_total(&self, total: u64) {
        self.inner.total.store(total, Ordering::Release);
        self.inner.notify();
    }

    /// Adds `amount` units of progress. No-op once terminal.
    pub fn advance(&self, amount: u64) {
        self.inner.advance(amount);
    }

    /// Records completion. Calling it twice, or after cancellation, is a
    /// no-op.
    pub fn set_done(&self) {
        // An ancestor may have been cancelled without this monitor having
        // checked yet.
        let next = if self.inner.is_cancelled() {
            MonitorState::Cancelled
        } else {
            MonitorState::Done
        };

        if self.inner.finish(next)
            && next == MonitorState::Done
            && let Some((parent, weight)) = &self.inner.parent
        {
            parent.advance(*weight);
        }
    }

    pub fn state(&self) -> MonitorState {
        let state = *self.inner.lock();
        if state == MonitorState::Running && self.inner.is_cancelled() {
            self.inner.finish(MonitorState::Cancelled);
            return MonitorState::Cancelled;
        }

        state
    }

    pub fn progress(&self) -> u64 {
        self.inner.progress.load(Ordering::Acquire)
    }

    pub fn total(&self) -> Option<u64> {
        self.inner.total()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &*self.inner.lock())
            .field("progress", &self.progress())
            .field("total", &self.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<(u64, Option<u64>)>>,
        finished: Mutex<Vec<MonitorState>>,
    }

    impl ProgressSink for Recorder {
        fn update(&self, progress: u64, total: Option<u64>) {
            self.updates.lock().unwrap().push((progress, total));
        }

        fn finish(&self, state: MonitorState) {
            self.finished.lock().unwrap().push(state);
        }
    }

    #[test]
    fn test_done_is_terminal() {
        let monitor = Monitor::new();
        monitor.advance(2);
        monitor.set_done();
        monitor.set_done();
        monitor.advance(5);

        assert_eq!(monitor.state(), MonitorState::Done);
        assert_eq!(monitor.progress(), 2);
        assert!(monitor.check_cancelled().is_ok());
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let monitor = Monitor::new();
        monitor.advance(1);
        monitor.cancel();
        monitor.advance(5);

        assert_eq!(monitor.state(), MonitorState::Cancelled);
        assert_eq!(monitor.progress(), 1);
    }

    #[test]
    fn test_cancel_takes_precedence() {
        let monitor = Monitor::new();
        monitor.cancel();
        monitor.set_done();

        assert_eq!(monitor.state(), MonitorState::Cancelled);
        assert_eq!(monitor.check_cancelled(), Err(Cancelled));
    }

    #[test]
    fn test_cancel_after_done_keeps_done() {
        let monitor = Monitor::new();
        monitor.set_done();
        monitor.cancel();

        assert_eq!(monitor.state(), MonitorState::Done);
        assert_eq!(monitor.check_cancelled(), Err(Cancelled));
    }

    #[test]
    fn test_children_observe_parent_cancellation() {
        let parent = Monitor::new();
        let child = parent.spawn_child(1);
        let grandchild = child.spawn_child(1);

        assert!(grandchild.check_cancelled().is_ok());
        parent.cancel();

        assert!(child.is_cancelled());
        assert_eq!(grandchild.check_cancelled(), Err(Cancelled));
        assert_eq!(grandchild.state(), MonitorState::Cancelled);
    }

    #[test]
    fn test_child_cancellation_does_not_reach_parent() {
        let parent = Monitor::new();
        let child = parent.spawn_child(1);
        child.cancel();

        assert!(parent.check_cancelled().is_ok());
        assert_eq!(parent.state(), MonitorState::Running);
    }

    #[test]
    fn test_child_done_advances_parent_by_weight() {
        let parent = Monitor::new();
        parent.set_total(5);

        parent.spawn_child(2).set_done();
        parent.spawn_child(3).set_done();

        assert_eq!(parent.progress(), 5);
        assert_eq!(parent.total(), Some(5));
    }

    #[test]
    fn test_cancelled_child_does_not_advance_parent() {
        let parent = Monitor::new();
        let child = parent.spawn_child(1);
        child.cancel();
        child.set_done();

        assert_eq!(parent.progress(), 0);
    }

    #[test]
    fn test_sink_receives_updates() {
        let recorder = Arc::new(Recorder::default());
        let monitor = Monitor::with_sink(recorder.clone());

        monitor.set_total(2);
        monitor.spawn_child(1).set_done();
        monitor.advance(1);
        monitor.set_done();
        monitor.set_done();

        assert_eq!(
            *recorder.updates.lock().unwrap(),
            [(0, Some(2)), (1, Some(2)), (2, Some(2))]
        );
        assert_eq!(*recorder.finished.lock().unwrap(), [MonitorState::Done]);
    }
}
