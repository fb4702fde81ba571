//! Constructing computations and extracting their values.
//!
//! Rust has explicit `async` and `await` keywords, but they belong to
//! futures. This module offers the same two directions for computation
//! graphs as plain functions, so code can switch between the eager and the
//! deferred mode without being restructured:
//!
//! * the `lift*` functions enter the graph (values, outcomes, and functions
//!   become computations),
//! * the `resolve*` functions leave it again (computations and outcomes
//!   become values, or an [`EmptyError`]).
//!
//! ```
//! use reckon::Label;
//! use reckon::computations::*;
//!
//! let total = lift_map(Label::new("docs", "sum"), |values: Vec<i32>| values.iter().sum::<i32>());
//! let graph = total(&lift_all([1, 2, 3]));
//!
//! assert_eq!(resolve_computation(&graph).unwrap(), 6);
//! ```

use std::sync::Arc;

use crate::engine::{AllOf, Computation, Conjunction, Constant, PairNode, Supplied};
use crate::error::{EmptyError, Label};
use crate::monitor::Monitor;
use crate::outcome::Outcome;
use crate::pair::Pair;

const OWNER: &str = "computations";

/// A computation that always produces `value`.
pub fn constant<T>(value: T) -> Computation<T>
where
    T: Clone + Send + Sync + 'static,
{
    constant_with(value, Monitor::new())
}

/// A constant bound to `monitor`. Cancelling `monitor` makes the constant
/// produce a cancellation cause instead of its value.
pub fn constant_with<T>(value: T, monitor: Monitor) -> Computation<T>
where
    T: Clone + Send + Sync + 'static,
{
    Computation::from_node(Constant::new(value, monitor))
}

/// A computation of both `key` and `value`, key first.
pub fn pair<K, V>(key: Computation<K>, value: Computation<V>) -> Computation<Pair<K, V>>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    Computation::from_node(PairNode::new(key, value))
}

/// A computation of every member of `members`, in order. Accepts a
/// `Vec<Computation<T>>` or a tuple of computations.
///
/// An empty vector is vacuously present and produces an empty vector.
pub fn all_of<C>(members: C) -> Computation<C::Output>
where
    C: Conjunction,
{
    Computation::from_node(AllOf::new(members))
}

/// A monitor-aware leaf computation.
pub fn supply<T, F>(label: Label, supplier: F) -> Computation<T>
where
    T: Send + Sync + 'static,
    F: Fn(&Monitor) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Computation::from_node(Supplied::new(label, supplier))
}

/// Lifts a plain value into a constant computation.
pub fn lift<T>(value: T) -> Computation<T>
where
    T: Clone + Send + Sync + 'static,
{
    constant(value)
}

/// Lifts a present outcome into a constant computation. An empty outcome is
/// refused: failures must be dealt with before entering the graph.
pub fn lift_outcome<T>(outcome: Outcome<T>) -> Result<Computation<T>, EmptyError>
where
    T: Clone + Send + Sync + 'static,
{
    outcome.map(constant).into_result()
}

/// Returns the computation unchanged.
pub fn lift_computation<T>(computation: Computation<T>) -> Computation<T> {
    computation
}

/// A pair computation of two plain values.
pub fn lift_pair<K, V>(key: K, value: V) -> Computation<Pair<K, V>>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pair(lift(key), lift(value))
}

/// A conjunction of constant computations, one per value.
pub fn lift_all<T, I>(values: I) -> Computation<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    all_of(values.into_iter().map(lift).collect::<Vec<_>>())
}

/// Lifts an infallible function to operate on computations.
pub fn lift_map<T, U, F>(label: Label, f: F) -> impl Fn(&Computation<T>) -> Computation<U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |computation: &Computation<T>| {
        let f = f.clone();
        computation.map(label.clone(), move |value| (*f)(value))
    }
}

/// Lifts a fallible function to operate on computations. An `Err` becomes
/// a cause carrying `label`.
pub fn lift_try_map<T, U, F>(label: Label, f: F) -> impl Fn(&Computation<T>) -> Computation<U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(T) -> anyhow::Result<U> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |computation: &Computation<T>| {
        let f = f.clone();
        computation.try_map(label.clone(), move |value| (*f)(value))
    }
}

/// Lifts a function returning an outcome to operate on computations.
pub fn lift_flat_map<T, U, F>(label: Label, f: F) -> impl Fn(&Computation<T>) -> Computation<U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(T) -> Outcome<U> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |computation: &Computation<T>| {
        let f = f.clone();
        computation.flat_map(label.clone(), move |value| (*f)(value))
    }
}

/// Returns the value unchanged.
pub fn resolve<T>(value: T) -> T {
    value
}

/// The value of a present outcome, or the error describing its causes.
pub fn resolve_outcome<T>(outcome: Outcome<T>) -> Result<T, EmptyError> {
    outcome.into_result()
}

/// Evaluates `computation` with all of its dependencies under a fresh
/// monitor and unwraps the outcome.
pub fn resolve_computation<T>(computation: &Computation<T>) -> Result<T, EmptyError>
where
    T: Send + Sync + 'static,
{
    computation.compute().into_result()
}

/// Like [`resolve_computation`], under a caller-supplied monitor which is
/// marked done afterwards.
pub fn resolve_with<T>(computation: &Computation<T>, monitor: &Monitor) -> Result<T, EmptyError>
where
    T: Send + Sync + 'static,
{
    let outcome = computation.evaluate(monitor);
    monitor.set_done();
    outcome.into_result()
}

/// Un-lifts a function on computations back to a function on values.
pub fn await_map<T, U, F>(f: F) -> impl Fn(T) -> Result<U, EmptyError>
where
    T: Clone + Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(&Computation<T>) -> Computation<U>,
{
    move |value: T| resolve_computation(&f(&lift(value)))
}

/// A computation of the key of a pair computation.
pub fn get_key<K, V>(computation: &Computation<Pair<K, V>>) -> Computation<K>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    computation.map(Label::new(OWNER, "get_key"), Pair::into_key)
}

/// A computation of the value of a pair computation.
pub fn get_value<K, V>(computation: &Computation<Pair<K, V>>) -> Computation<V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    computation.map(Label::new(OWNER, "get_value"), Pair::into_value)
}

/// Splits a pair computation into its two projections and hands both to
/// `f`.
pub fn map_pair<K, V, R, F>(computation: &Computation<Pair<K, V>>, f: F) -> R
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    F: FnOnce(Computation<K>, Computation<V>) -> R,
{
    f(get_key(computation), get_value(computation))
}

/// Things that can enter the graph without knowing which mode they are in.
pub trait Lift {
    type Output;

    fn lift(self) -> Result<Computation<Self::Output>, EmptyError>;
}

impl<T> Lift for Computation<T> {
    type Output = T;

    fn lift(self) -> Result<Computation<T>, EmptyError> {
        Ok(self)
    }
}

impl<T> Lift for Outcome<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    fn lift(self) -> Result<Computation<T>, EmptyError> {
        lift_outcome(self)
    }
}

/// Things that can be forced into a value without knowing which mode they
/// are in.
pub trait Resolve {
    type Output;

    fn resolve(self) -> Result<Self::Output, EmptyError>;
}

impl<T> Resolve for Outcome<T> {
    type Output = T;

    fn resolve(self) -> Result<T, EmptyError> {
        resolve_outcome(self)
    }
}

impl<T> Resolve for &Computation<T>
where
    T: Send + Sync + 'static,
{
    type Output = T;

    fn resolve(self) -> Result<T, EmptyError> {
        resolve_computation(self)
    }
}

impl<T> Resolve for Computation<T>
where
    T: Send + Sync + 'static,
{
    type Output = T;

    fn resolve(self) -> Result<T, EmptyError> {
        resolve_computation(&self)
    }
}
