use crate::error::{Cause, EmptyError};

/// The result of a computation: either a present value or an ordered list of
/// causes explaining why there is none.
///
/// Inside the graph failure is data. The only way to turn an empty outcome
/// into an `Err` is [`Outcome::into_result`] (or the `resolve_*` functions
/// built on top of it).
#[derive(Debug, Clone)]
#[must_use]
pub enum Outcome<T> {
    Present(T),
    Empty(Vec<Cause>),
}

impl<T> Outcome<T> {
    pub fn present(value: T) -> Self {
        Outcome::Present(value)
    }

    pub fn empty(cause: impl Into<Cause>) -> Self {
        Outcome::Empty(vec![cause.into()])
    }

    pub fn from_causes(causes: Vec<Cause>) -> Self {
        Outcome::Empty(causes)
    }

    /// `None` becomes empty with the given context.
    pub fn from_option(value: Option<T>, context: &'static str) -> Self {
        match value {
            Some(value) => Outcome::Present(value),
            None => Outcome::Empty(vec![Cause::absent(context)]),
        }
    }

    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: Into<anyhow::Error>,
    {
        match result {
            Ok(value) => Outcome::Present(value),
            Err(error) => Outcome::Empty(vec![Cause::error(error)]),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Outcome::Present(_))
    }

    pub fn is_empty(&self) -> bool {
        !self.is_present()
    }

    /// Whether any of the causes is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.causes().iter().any(Cause::is_cancelled)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Present(value) => Some(value),
            Outcome::Empty(_) => None,
        }
    }

    pub fn causes(&self) -> &[Cause] {
        match self {
            Outcome::Present(_) => &[],
            Outcome::Empty(causes) => causes,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Present(value) => Some(value),
            Outcome::Empty(_) => None,
        }
    }

    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Present(value) => Outcome::Present(value),
            Outcome::Empty(causes) => Outcome::Empty(causes.clone()),
        }
    }

    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Present(value) => Outcome::Present(f(value)),
            Outcome::Empty(causes) => Outcome::Empty(causes),
        }
    }

    pub fn flat_map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Outcome::Present(value) => f(value),
            Outcome::Empty(causes) => Outcome::Empty(causes),
        }
    }

    pub fn or_else<F>(self, f: F) -> Outcome<T>
    where
        F: FnOnce(Vec<Cause>) -> Outcome<T>,
    {
        match self {
            Outcome::Present(value) => Outcome::Present(value),
            Outcome::Empty(causes) => f(causes),
        }
    }

    /// Combines two outcomes. Both present yields the pair of values,
    /// otherwise the causes of every empty operand are concatenated in call
    /// order.
    pub fn merge<U>(self, other: Outcome<U>) -> Outcome<(T, U)> {
        match (self, other) {
            (Outcome::Present(a), Outcome::Present(b)) => Outcome::Present((a, b)),
            (a, b) => {
                let mut causes = a.into_causes();
                causes.extend(b.into_causes());
                Outcome::Empty(causes)
            }
        }
    }

    pub fn into_causes(self) -> Vec<Cause> {
        match self {
            Outcome::Present(_) => Vec::new(),
            Outcome::Empty(causes) => causes,
        }
    }

    /// Returns the value, or an [`EmptyError`] whose source is the first
    /// cause.
    pub fn into_result(self) -> Result<T, EmptyError> {
        match self {
            Outcome::Present(value) => Ok(value),
            Outcome::Empty(causes) => Err(EmptyError::new(causes)),
        }
    }
}

impl<T> From<anyhow::Result<T>> for Outcome<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        Outcome::from_result(result)
    }
}

impl<T: PartialEq> PartialEq for Outcome<T> {
    /// Outcomes compare by value. Two empty outcomes are equal when their
    /// causes render the same way and have the same kinds.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Present(a), Outcome::Present(b)) => a == b,
            (Outcome::Empty(a), Outcome::Empty(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(a, b)| {
                        a.kind() == b.kind() && a.to_string() == b.to_string()
                    })
            }
            _ => false,
        }
    }
}
