use std::marker::PhantomData;

use crate::engine::{Computation, Inspect, Node, NodeKind, catch, evaluate_dependency, inspect, settle};
use crate::error::Label;
use crate::monitor::Monitor;
use crate::outcome::Outcome;

pub(crate) struct Mapped<T, U, F> {
    label: Label,
    parent: Computation<T>,
    transform: F,
    _phantom: PhantomData<fn() -> U>,
}

impl<T, U, F> Mapped<T, U, F> {
    pub fn new(label: Label, parent: Computation<T>, transform: F) -> Self {
        Self {
            label,
            parent,
            transform,
            _phantom: PhantomData,
        }
    }
}

impl<T, U, F> Node<U> for Mapped<T, U, F>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(T) -> anyhow::Result<U> + Send + Sync,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Mapped
    }

    fn label(&self) -> Option<&Label> {
        Some(&self.label)
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        vec![inspect(&self.parent)]
    }

    fn evaluate(&self, monitor: &Monitor) -> Outcome<U> {
        let value = match apply_parent(&self.parent, monitor) {
            Outcome::Present(value) => value,
            Outcome::Empty(causes) => return Outcome::Empty(causes),
        };

        settle(&self.label, catch(|| (self.transform)(value)))
    }
}

pub(crate) struct FlatMapped<T, U, F> {
    label: Label,
    parent: Computation<T>,
    transform: F,
    _phantom: PhantomData<fn() -> U>,
}

impl<T, U, F> FlatMapped<T, U, F> {
    pub fn new(label: Label, parent: Computation<T>, transform: F) -> Self {
        Self {
            label,
            parent,
            transform,
            _phantom: PhantomData,
        }
    }
}

impl<T, U, F> Node<U> for FlatMapped<T, U, F>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(T) -> Outcome<U> + Send + Sync,
{
    fn kind(&self) -> NodeKind {
        NodeKind::FlatMapped
    }

    fn label(&self) -> Option<&Label> {
        Some(&self.label)
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        vec![inspect(&self.parent)]
    }

    fn evaluate(&self, monitor: &Monitor) -> Outcome<U> {
        let value = match apply_parent(&self.parent, monitor) {
            Outcome::Present(value) => value,
            Outcome::Empty(causes) => return Outcome::Empty(causes),
        };

        match catch(|| (self.transform)(value)) {
            Ok(outcome) => outcome,
            Err(cause) => settle(&self.label, Err(cause)),
        }
    }
}

/// Evaluates the single parent of a transform node. Empty parents are handed
/// back untouched; a present parent is only released if the monitor has not
/// been cancelled in the meantime.
fn apply_parent<T>(parent: &Computation<T>, monitor: &Monitor) -> Outcome<T>
where
    T: Send + Sync + 'static,
{
    monitor.set_total(1);

    if let Err(cancelled) = monitor.check_cancelled() {
        return Outcome::empty(cancelled);
    }

    let outcome = evaluate_dependency(parent, monitor);
    if outcome.is_empty() {
        return outcome;
    }

    match monitor.check_cancelled() {
        Ok(()) => outcome,
        Err(cancelled) => Outcome::empty(cancelled),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::computations::constant;
    use crate::error::{Cause, CauseKind};

    #[test]
    fn test_error_becomes_labelled_cause() {
        let mapped = constant("x").try_map(Label::new("parser", "number"), |s: &str| {
            Ok(s.parse::<i32>()?)
        });

        let outcome = mapped.compute();
        let cause = &outcome.causes()[0];
        assert_eq!(cause.kind(), CauseKind::Transform);
        assert_eq!(cause.label(), Some(&Label::new("parser", "number")));
        assert!(cause.underlying().is_some());
    }

    #[test]
    fn test_panic_becomes_labelled_cause() {
        let mapped = constant(0).map(Label::new("math", "divide"), |x: i32| {
            if x == 0 {
                panic!("division by zero");
            }
            10 / x
        });

        let outcome = mapped.compute();
        let cause = &outcome.causes()[0];
        assert_eq!(cause.kind(), CauseKind::Panicked);
        assert_eq!(cause.context(), "panicked: division by zero");
        assert_eq!(cause.label().map(Label::scope), Some("divide"));
    }

    #[test]
    fn test_empty_parent_skips_transform() {
        let calls = Arc::new(AtomicUsize::new(0));
        let parent = constant(()).flat_map(Label::new("tests", "parent"), |_| {
            Outcome::<i32>::empty(Cause::absent("missing"))
        });

        let counter = calls.clone();
        let mapped = parent.map(Label::new("tests", "child"), move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            x
        });

        let outcome = mapped.compute();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.causes().len(), 1);
        assert_eq!(outcome.causes()[0].context(), "missing");
        assert!(outcome.causes()[0].label().is_none());
    }

    #[test]
    fn test_flat_map_passes_causes_through() {
        let flat = constant(3).flat_map(Label::new("tests", "flat"), |_| {
            Outcome::<i32>::from_causes(vec![Cause::absent("a"), Cause::absent("b")])
        });

        let outcome = flat.compute();
        assert_eq!(outcome.causes().len(), 2);
        assert!(outcome.causes().iter().all(|cause| cause.label().is_none()));
    }

    #[test]
    fn test_flat_map_panic() {
        let flat = constant(3).flat_map(Label::new("tests", "flat"), |_| -> Outcome<i32> {
            panic!("nope")
        });

        let outcome = flat.compute();
        assert_eq!(outcome.causes()[0].kind(), CauseKind::Panicked);
        assert_eq!(outcome.causes()[0].label().map(Label::owner), Some("tests"));
    }
}
