//! The computation graph.
//!
//! A [`Computation<T>`] is a cheap, clonable handle to an immutable node that
//! knows how to produce an [`Outcome<T>`] from the outcomes of its
//! dependencies. Nodes are shared through `Arc`, so the same dependency may
//! appear under several parents. Construction can only reference nodes that
//! already exist, which keeps every graph acyclic without a runtime check.
//!
//! ## Evaluation
//!
//! Evaluation is depth-first and single-threaded. Every composite node:
//!
//! 1. declares how many dependencies it has on its monitor,
//! 2. checks for cancellation before starting each dependency,
//! 3. evaluates each dependency in declaration order under a child monitor of
//!    weight one, and marks that child done afterwards,
//! 4. merges the dependency outcomes according to its variant.
//!
//! Nothing is cached across calls: two evaluations of the same node walk the
//! whole sub-graph twice.
//!
//! Evaluation recurses once per level of the graph on the calling thread's
//! stack. Chains of a thousand nodes are fine on a default test thread, but
//! much deeper graphs need a thread spawned with a larger stack
//! (`std::thread::Builder::stack_size`).

mod all_of;
mod constant;
mod mapped;
mod pair;
mod supplied;

use std::any::type_name;
use std::sync::Arc;

use crate::error::{Cause, Label, panic_message};
use crate::monitor::Monitor;
use crate::outcome::Outcome;

pub use crate::engine::all_of::{Collector, Conjunction};
pub(crate) use crate::engine::all_of::AllOf;
pub(crate) use crate::engine::constant::Constant;
pub(crate) use crate::engine::mapped::{FlatMapped, Mapped};
pub(crate) use crate::engine::pair::PairNode;
pub(crate) use crate::engine::supplied::Supplied;

/// Which variant a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Constant,
    Pair,
    AllOf,
    Mapped,
    FlatMapped,
    Supplied,
}

/// Identity of a node, stable for as long as any handle to it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

pub(crate) trait Node<T>: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn label(&self) -> Option<&Label> {
        None
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>>;

    fn evaluate(&self, monitor: &Monitor) -> Outcome<T>;
}

/// Type-erased, read-only view of a node, used to walk a graph without
/// knowing the value types flowing through it.
pub trait Inspect: Send + Sync {
    fn id(&self) -> NodeId;
    fn kind(&self) -> NodeKind;
    fn label(&self) -> Option<&Label>;
    fn output_type(&self) -> &'static str;
    fn dependencies(&self) -> Vec<Box<dyn Inspect>>;
}

/// A deferred, composable value of type `T`.
pub struct Computation<T> {
    node: Arc<dyn Node<T>>,
}

impl<T> Clone for Computation<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T> Computation<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn from_node(node: impl Node<T> + 'static) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Evaluates this node and, transitively, all of its dependencies under
    /// `monitor`.
    pub fn evaluate(&self, monitor: &Monitor) -> Outcome<T> {
        let outcome = self.node.evaluate(monitor);
        tracing::trace!(
            kind = ?self.node.kind(),
            present = outcome.is_present(),
            "node evaluated"
        );
        outcome
    }

    /// Evaluates this node under a fresh root monitor.
    pub fn compute(&self) -> Outcome<T> {
        let monitor = Monitor::new();
        let outcome = self.evaluate(&monitor);
        monitor.set_done();
        outcome
    }

    /// A mapped node applying an infallible transform.
    pub fn map<U, F>(&self, label: Label, f: F) -> Computation<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_map(label, move |value| Ok(f(value)))
    }

    /// A mapped node applying a transform that may fail.
    pub fn try_map<U, F>(&self, label: Label, f: F) -> Computation<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
    {
        Computation::from_node(Mapped::new(label, self.clone(), f))
    }

    /// A flat-mapped node; the outcome returned by `f` is passed through
    /// as-is.
    pub fn flat_map<U, F>(&self, label: Label, f: F) -> Computation<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> Outcome<U> + Send + Sync + 'static,
    {
        Computation::from_node(FlatMapped::new(label, self.clone(), f))
    }
}

impl<T> Inspect for Computation<T>
where
    T: 'static,
{
    fn id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.node) as *const () as usize)
    }

    fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    fn label(&self) -> Option<&Label> {
        self.node.label()
    }

    fn output_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        self.node.dependencies()
    }
}

impl<T> std::fmt::Debug for Computation<T>
where
    T: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computation")
            .field("kind", &self.kind())
            .field("label", &self.label())
            .field("output", &self.output_type())
            .finish()
    }
}

pub(crate) fn inspect<T>(computation: &Computation<T>) -> Box<dyn Inspect>
where
    T: 'static,
{
    Box::new(computation.clone())
}

/// Evaluates one dependency under a child monitor of weight one.
pub(crate) fn evaluate_dependency<T>(dependency: &Computation<T>, monitor: &Monitor) -> Outcome<T>
where
    T: Send + Sync + 'static,
{
    let child = monitor.spawn_child(1);
    let outcome = dependency.evaluate(&child);
    child.set_done();
    outcome
}

/// Empty outcome for an evaluation that observed cancellation, keeping the
/// causes collected so far and adding at most one cancellation cause.
pub(crate) fn cancelled<T>(mut causes: Vec<Cause>) -> Outcome<T> {
    tracing::debug!(collected = causes.len(), "evaluation cancelled");
    if !causes.iter().any(Cause::is_cancelled) {
        causes.push(Cause::cancelled());
    }
    Outcome::Empty(causes)
}

/// Runs user code, turning a panic into a cause.
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, Cause> {
    // User transforms only see values they own, a panic cannot leave the
    // graph itself in an inconsistent state.
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
        .map_err(|panic| Cause::panicked(panic_message(panic.as_ref())))
}

/// Converts the result of a labelled transform into an outcome.
pub(crate) fn settle<U>(label: &Label, result: Result<anyhow::Result<U>, Cause>) -> Outcome<U> {
    match result {
        Ok(Ok(value)) => Outcome::Present(value),
        Ok(Err(error)) => {
            tracing::debug!(label = %label, error = %error, "transform failed");
            Outcome::empty(Cause::transform(label.clone(), error))
        }
        Err(cause) => {
            tracing::debug!(label = %label, cause = %cause, "transform panicked");
            Outcome::empty(cause.with_label(label.clone()))
        }
    }
}
