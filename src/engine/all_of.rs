use crate::engine::{Computation, Inspect, Node, NodeKind, cancelled, evaluate_dependency, inspect};
use crate::error::Cause;
use crate::monitor::Monitor;
use crate::outcome::Outcome;

/// Walks the members of a conjunction in order, collecting values and the
/// position-tagged causes of every member that failed.
///
/// Members are never skipped because an earlier one failed. Once the monitor
/// reports cancellation the collector stops, and every later member is left
/// untouched.
pub struct Collector<'a> {
    monitor: &'a Monitor,
    causes: Vec<Cause>,
    position: usize,
    stopped: bool,
}

impl<'a> Collector<'a> {
    fn new(monitor: &'a Monitor) -> Self {
        Self {
            monitor,
            causes: Vec::new(),
            position: 0,
            stopped: false,
        }
    }

    /// Evaluates the next member, returning its value if present.
    pub fn collect<T>(&mut self, computation: &Computation<T>) -> Option<T>
    where
        T: Send + Sync + 'static,
    {
        if self.stopped || self.monitor.check_cancelled().is_err() {
            self.stopped = true;
            return None;
        }

        let position = self.position;
        self.position += 1;

        match evaluate_dependency(computation, self.monitor) {
            Outcome::Present(value) => Some(value),
            Outcome::Empty(causes) => {
                self.causes
                    .extend(causes.into_iter().map(|cause| cause.at(position)));
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Outcome<T> {
        if self.stopped || self.monitor.check_cancelled().is_err() {
            return cancelled(self.causes);
        }

        match value {
            Some(value) if self.causes.is_empty() => Outcome::Present(value),
            _ => Outcome::Empty(self.causes),
        }
    }
}

/// An ordered group of computations that can be evaluated together.
///
/// Implemented for `Vec<Computation<T>>`, producing `Vec<T>`, and for tuples
/// of up to twelve computations, producing the tuple of their values.
pub trait Conjunction: Send + Sync + 'static {
    /// The resulting type when every member is present.
    type Output: Send + Sync + 'static;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>>;

    /// Evaluates every member through `collector`. Returns `Some` only when
    /// each member was present.
    fn collect(&self, collector: &mut Collector<'_>) -> Option<Self::Output>;
}

impl<T> Conjunction for Vec<Computation<T>>
where
    T: Send + Sync + 'static,
{
    type Output = Vec<T>;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        self.iter().map(inspect).collect()
    }

    fn collect(&self, collector: &mut Collector<'_>) -> Option<Self::Output> {
        let mut values = Vec::with_capacity(Vec::len(self));
        let mut complete = true;

        for computation in self {
            match collector.collect(computation) {
                Some(value) => values.push(value),
                None => complete = false,
            }
        }

        complete.then_some(values)
    }
}

macro_rules! impl_conjunction {
    ($($C:ident),*) => {
        #[allow(non_snake_case)]
        impl<$($C),*> Conjunction for ($(Computation<$C>,)*)
        where
            $($C: Send + Sync + 'static),*
        {
            type Output = ($($C,)*);

            fn len(&self) -> usize {
                [$(stringify!($C)),*].len()
            }

            fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
                let ($($C,)*) = self;
                vec![$(inspect($C),)*]
            }

            fn collect(&self, collector: &mut Collector<'_>) -> Option<Self::Output> {
                let ($($C,)*) = self;
                $(let $C = collector.collect($C);)*
                Some(($($C?,)*))
            }
        }
    };
}

impl_conjunction!(A);
impl_conjunction!(A, B);
impl_conjunction!(A, B, C);
impl_conjunction!(A, B, C, D);
impl_conjunction!(A, B, C, D, E);
impl_conjunction!(A, B, C, D, E, F);
impl_conjunction!(A, B, C, D, E, F, G);
impl_conjunction!(A, B, C, D, E, F, G, H);
impl_conjunction!(A, B, C, D, E, F, G, H, I);
impl_conjunction!(A, B, C, D, E, F, G, H, I, J);
impl_conjunction!(A, B, C, D, E, F, G, H, I, J, K);
impl_conjunction!(A, B, C, D, E, F, G, H, I, J, K, L);

pub(crate) struct AllOf<C> {
    members: C,
}

impl<C> AllOf<C> {
    pub fn new(members: C) -> Self {
        Self { members }
    }
}

impl<C> Node<C::Output> for AllOf<C>
where
    C: Conjunction,
{
    fn kind(&self) -> NodeKind {
        NodeKind::AllOf
    }

    fn dependencies(&self) -> Vec<Box<dyn Inspect>> {
        self.members.dependencies()
    }

    fn evaluate(&self, monitor: &Monitor) -> Outcome<C::Output> {
        monitor.set_total(self.members.len() as u64);

        let mut collector = Collector::new(monitor);
        let value = self.members.collect(&mut collector);
        collector.finish(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::computations::{all_of, constant, lift_outcome};
    use crate::error::{CauseKind, Label};

    fn failing(context: &'static str) -> Computation<i32> {
        constant(()).flat_map(Label::new("tests", context), move |_| {
            Outcome::empty(Cause::absent(context))
        })
    }

    #[test]
    fn test_vec_values_in_order() {
        let all = all_of(vec![constant(1), constant(2), constant(3)]);
        assert_eq!(all.compute(), Outcome::present(vec![1, 2, 3]));
    }

    #[test]
    fn test_empty_vec_is_present() {
        let all = all_of(Vec::<Computation<i32>>::new());
        assert_eq!(all.compute(), Outcome::present(vec![]));
    }

    #[test]
    fn test_tuple_values() {
        let all = all_of((constant(1), constant("two"), constant(3.0)));
        assert_eq!(all.compute().ok(), Some((1, "two", 3.0)));
    }

    #[test]
    fn test_positions_are_recorded() {
        let all = all_of(vec![constant(0), failing("one"), constant(2), failing("three")]);
        let causes = all.compute().into_causes();

        assert_eq!(causes.len(), 2);
        assert_eq!(causes[0].path(), &[1]);
        assert_eq!(causes[0].context(), "one");
        assert_eq!(causes[1].path(), &[3]);
        assert_eq!(causes[1].context(), "three");
    }

    #[test]
    fn test_nested_positions() {
        let inner = all_of(vec![constant(0), failing("deep")]);
        let outer = all_of((constant(()), inner));
        let causes = outer.compute().into_causes();

        assert_eq!(causes.len(), 1);
        assert_eq!(causes[0].path(), &[1, 1]);
    }

    #[test]
    fn test_progress_reaches_total() {
        let monitor = Monitor::new();
        let all = all_of(vec![constant(1), constant(2)]);
        assert!(all.evaluate(&monitor).is_present());

        assert_eq!(monitor.total(), Some(2));
        assert_eq!(monitor.progress(), 2);
    }

    #[test]
    fn test_single_cancellation_cause() {
        let monitor = Monitor::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let handle = monitor.clone();
        let trigger = {
            let log = log.clone();
            constant(1).map(Label::new("tests", "cancel"), move |x| {
                log.lock().unwrap().push(x);
                handle.cancel();
                x
            })
        };

        let inner = all_of(vec![trigger, constant(2)]);
        let outer = all_of((inner, lift_outcome(Outcome::present(3)).unwrap()));
        let causes = outer.evaluate(&monitor).into_causes();

        let cancelled: Vec<_> = causes
            .iter()
            .filter(|cause| cause.kind() == CauseKind::Cancelled)
            .collect();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(*log.lock().unwrap(), [1]);
    }

    #[test]
    fn test_cancellation_keeps_collected_causes() {
        let monitor = Monitor::new();
        let handle = monitor.clone();
        let trigger = constant(1).map(Label::new("tests", "cancel"), move |x| {
            handle.cancel();
            x
        });

        let all = all_of(vec![failing("c0"), trigger, constant(3)]);
        let causes = all.evaluate(&monitor).into_causes();

        let kinds: Vec<_> = causes.iter().map(Cause::kind).collect();
        assert_eq!(kinds, [CauseKind::Absent, CauseKind::Cancelled]);
        assert_eq!(causes[0].context(), "c0");
        assert_eq!(causes[0].path(), &[0]);
        assert!(causes[1].path().is_empty());
    }
}
