use crate::engine::{Inspect, Node, NodeKind};
use crate::error::Label;
use crate::executor;
use crate::monitor::Monitor;
use crate::outcome::Outcome;

/// A leaf whose value comes from a monitor-aware supplier. The supplier may
/// advance the monitor or poll it for cancellation while it works.
pub(crate) struct Supplied<F> {
    label: Label,
    supplier: F,
}

impl<F> Supplied<F> {
    pub fn new(label: Label, supplier: F) -> Self {
        Self { label, supplier }
    }
}

impl<T, F> Node<T> for Supplied<F>
where
    T: Send + Sync + 'static,
    F: Fn(&Monitor) -> anyhow::Result<T> + Send + Sync,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Supplied
    }

    fn label(&self) -> Option<&Label> {
        Some(&self.label)
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        vec![]
    }

    fn evaluate(&self, monitor: &Monitor) -> Outcome<T> {
        executor::run_with(&self.label, monitor, &self.supplier)
    }
}
