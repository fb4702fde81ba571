use crate::engine::{Computation, Inspect, Node, NodeKind, cancelled, evaluate_dependency, inspect};
use crate::monitor::Monitor;
use crate::outcome::Outcome;
use crate::pair::Pair;

/// Evaluates the key, then the value, and pairs them up. The value is
/// evaluated even when the key is empty so both sides get reported.
pub(crate) struct PairNode<K, V> {
    key: Computation<K>,
    value: Computation<V>,
}

impl<K, V> PairNode<K, V> {
    pub fn new(key: Computation<K>, value: Computation<V>) -> Self {
        Self { key, value }
    }
}

impl<K, V> Node<Pair<K, V>> for PairNode<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Pair
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        vec![inspect(&self.key), inspect(&self.value)]
    }

    fn evaluate(&self, monitor: &Monitor) -> Outcome<Pair<K, V>> {
        monitor.set_total(2);

        if monitor.check_cancelled().is_err() {
            return cancelled(vec![]);
        }

        let key = evaluate_dependency(&self.key, monitor);

        if monitor.check_cancelled().is_err() {
            return cancelled(key.into_causes());
        }

        let value = evaluate_dependency(&self.value, monitor);

        key.merge(value).map(|(key, value)| Pair::new(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computations::{constant, pair};
    use crate::error::{Cause, Label};

    fn empty(context: &'static str) -> Computation<i32> {
        constant(()).flat_map(Label::new("tests", "empty"), move |_| {
            Outcome::empty(Cause::absent(context))
        })
    }

    #[test]
    fn test_both_present() {
        let outcome = pair(constant(1), constant("one")).compute();
        assert_eq!(outcome, Outcome::present(Pair::new(1, "one")));
    }

    #[test]
    fn test_both_sides_reported() {
        let outcome = pair(empty("key"), empty("value")).compute();
        let contexts: Vec<_> = outcome.causes().iter().map(Cause::context).collect();
        assert_eq!(contexts, ["key", "value"]);
    }

    #[test]
    fn test_cancelled_between_sides() {
        let monitor = Monitor::new();
        let handle = monitor.clone();
        let key = constant(1).map(Label::new("tests", "cancel"), move |x| {
            handle.cancel();
            x
        });

        let outcome = pair(key, empty("never")).evaluate(&monitor);
        assert_eq!(outcome.causes().len(), 1);
        assert!(outcome.is_cancelled());
    }
}
