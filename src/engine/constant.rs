use crate::engine::{Inspect, Node, NodeKind, cancelled};
use crate::monitor::Monitor;
use crate::outcome::Outcome;

/// A leaf wrapping a value. It is bound to its own monitor, so cancelling
/// that monitor also stops the constant from producing.
pub(crate) struct Constant<T> {
    value: T,
    monitor: Monitor,
}

impl<T> Constant<T> {
    pub fn new(value: T, monitor: Monitor) -> Self {
        Self { value, monitor }
    }
}

impl<T> Node<T> for Constant<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Constant
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        vec![]
    }

    fn evaluate(&self, monitor: &Monitor) -> Outcome<T> {
        if monitor.check_cancelled().is_err() || self.monitor.check_cancelled().is_err() {
            return cancelled(vec![]);
        }

        self.monitor.set_done();
        Outcome::Present(self.value.clone())
    }
}
