//! Running monitor-aware suppliers and functions outside of a graph.
//!
//! A supplier is any closure taking a [`Monitor`] and returning an
//! `anyhow::Result`, a function additionally takes an input value. The executor gives it a monitor, turns an error return
//! or a panic into a labelled [`Cause`](crate::Cause), and always marks the
//! monitor done afterwards.

use crate::engine::{catch, settle};
use crate::error::Label;
use crate::monitor::Monitor;
use crate::outcome::Outcome;

/// Runs `supplier` under a fresh monitor.
pub fn run<T, F>(label: Label, supplier: F) -> Outcome<T>
where
    F: FnOnce(&Monitor) -> anyhow::Result<T>,
{
    run_with(&label, &Monitor::new(), supplier)
}

/// Runs `supplier` under `monitor`. Does not start if the monitor is
/// already cancelled.
pub fn run_with<T, F>(label: &Label, monitor: &Monitor, supplier: F) -> Outcome<T>
where
    F: FnOnce(&Monitor) -> anyhow::Result<T>,
{
    if let Err(cancelled) = monitor.check_cancelled() {
        return Outcome::empty(cancelled);
    }

    let outcome = settle(label, catch(|| supplier(monitor)));
    monitor.set_done();
    outcome
}

/// Applies `f` to `input` under a fresh monitor.
pub fn run_fn<I, T, F>(label: Label, input: I, f: F) -> Outcome<T>
where
    F: FnOnce(I, &Monitor) -> anyhow::Result<T>,
{
    run_fn_with(&label, input, &Monitor::new(), f)
}

/// Applies `f` to `input` under `monitor`, with the same guarantees as
/// [`run_with`].
pub fn run_fn_with<I, T, F>(label: &Label, input: I, monitor: &Monitor, f: F) -> Outcome<T>
where
    F: FnOnce(I, &Monitor) -> anyhow::Result<T>,
{
    run_with(label, monitor, |monitor| f(input, monitor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CauseKind;
    use crate::monitor::MonitorState;

    #[test]
    fn test_run_sets_done() {
        let monitor = Monitor::new();
        let outcome = run_with(&Label::new("tests", "run"), &monitor, |monitor| {
            monitor.advance(3);
            Ok("done")
        });

        assert_eq!(outcome.ok(), Some("done"));
        assert_eq!(monitor.state(), MonitorState::Done);
        assert_eq!(monitor.progress(), 3);
    }

    #[test]
    fn test_run_error() {
        let outcome: Outcome<()> = run(Label::new("tests", "error"), |_| anyhow::bail!("failed"));
        let cause = &outcome.causes()[0];

        assert_eq!(cause.kind(), CauseKind::Transform);
        assert_eq!(cause.underlying().map(ToString::to_string), Some("failed".into()));
    }

    #[test]
    fn test_run_panic_sets_done() {
        let monitor = Monitor::new();
        let outcome: Outcome<()> = run_with(&Label::new("tests", "panic"), &monitor, |_| {
            panic!("supplier exploded")
        });

        assert_eq!(outcome.causes()[0].kind(), CauseKind::Panicked);
        assert_eq!(monitor.state(), MonitorState::Done);
    }

    #[test]
    fn test_run_skips_cancelled() {
        let monitor = Monitor::new();
        monitor.cancel();

        let outcome = run_with(&Label::new("tests", "skip"), &monitor, |_| -> anyhow::Result<()> {
            unreachable!()
        });

        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_run_fn_applies_input() {
        let outcome = run_fn(Label::new("tests", "double"), 21, |x: i32, monitor| {
            monitor.advance(1);
            Ok(x * 2)
        });

        assert_eq!(outcome.ok(), Some(42));
    }

    #[test]
    fn test_run_fn_error_is_labelled() {
        let label = Label::new("tests", "parse");
        let outcome = run_fn(label.clone(), "x", |s: &str, _| Ok(s.parse::<u8>()?));
        let cause = &outcome.causes()[0];

        assert_eq!(cause.kind(), CauseKind::Transform);
        assert_eq!(cause.label(), Some(&label));
    }

    #[test]
    fn test_run_fn_skips_cancelled() {
        let monitor = Monitor::new();
        monitor.cancel();

        let outcome = run_fn_with(&Label::new("tests", "skip"), 1, &monitor, |_: i32, _| -> anyhow::Result<()> {
            unreachable!()
        });

        assert!(outcome.is_cancelled());
    }
}
