use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use thiserror::Error;

/// Diagnostic identity attached to a transform combinator.
///
/// The owner names whoever built the combinator (a module, a type, a
/// subsystem) and the scope names the call site inside it. Labels never
/// influence the value a computation produces, they only show up in the
/// [`Cause`] recorded when the transform fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    owner: Cow<'static, str>,
    scope: Cow<'static, str>,
}

impl Label {
    pub fn new(owner: impl Into<Cow<'static, str>>, scope: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner: owner.into(),
            scope: scope.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.owner, self.scope)
    }
}

/// What kind of failure a [`Cause`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CauseKind {
    /// The value is legitimately unavailable.
    Absent,
    /// A monitor's cancellation flag was observed mid-evaluation.
    Cancelled,
    /// A transform returned an error.
    Transform,
    /// User code panicked and the panic was caught at a node boundary.
    Panicked,
}

/// A single diagnostic record explaining why an [`Outcome`](crate::Outcome)
/// is empty.
#[derive(Debug, Clone)]
pub struct Cause {
    kind: CauseKind,
    context: Cow<'static, str>,
    error: Option<Arc<anyhow::Error>>,
    label: Option<Label>,
    path: Vec<usize>,
}

impl Cause {
    fn new(kind: CauseKind, context: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            context: context.into(),
            error: None,
            label: None,
            path: Vec::new(),
        }
    }

    /// A plain "no value" cause with free-text context.
    pub fn absent(context: impl Into<Cow<'static, str>>) -> Self {
        Self::new(CauseKind::Absent, context)
    }

    pub fn cancelled() -> Self {
        Self::new(CauseKind::Cancelled, "computation was cancelled")
    }

    /// Wraps an underlying error as a cause.
    pub fn error(error: impl Into<anyhow::Error>) -> Self {
        let error = error.into();
        Self::new(CauseKind::Absent, error.to_string()).with_error(error)
    }

    /// A transform under `label` failed with `error`.
    pub fn transform(label: Label, error: impl Into<anyhow::Error>) -> Self {
        Self::new(CauseKind::Transform, "transform failed")
            .with_error(error)
            .with_label(label)
    }

    pub(crate) fn panicked(message: String) -> Self {
        Self::new(CauseKind::Panicked, message)
    }

    pub fn with_error(mut self, error: impl Into<anyhow::Error>) -> Self {
        self.error = Some(Arc::new(error.into()));
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// Records that this cause travelled through position `index` of an
    /// enclosing conjunction. Outer positions end up first.
    pub(crate) fn at(mut self, index: usize) -> Self {
        self.path.insert(0, index);
        self
    }

    pub fn kind(&self) -> CauseKind {
        self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == CauseKind::Cancelled
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn underlying(&self) -> Option<&anyhow::Error> {
        self.error.as_deref()
    }

    /// Positions inside nested conjunctions, outermost first.
    pub fn path(&self) -> &[usize] {
        &self.path
    }
}

impl Display for Cause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "[{label}] ")?;
        }

        if !self.path.is_empty() {
            let path: Vec<_> = self.path.iter().map(ToString::to_string).collect();
            write!(f, "at #{}: ", path.join("."))?;
        }

        f.write_str(&self.context)
    }
}

impl std::error::Error for Cause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error
            .as_deref()
            .map(|error| &**error as &(dyn std::error::Error + 'static))
    }
}

/// Signal returned by [`Monitor::check_cancelled`](crate::Monitor::check_cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("computation was cancelled")]
pub struct Cancelled;

impl From<Cancelled> for Cause {
    fn from(_: Cancelled) -> Self {
        Cause::cancelled()
    }
}

/// Raised when an empty [`Outcome`](crate::Outcome) is forced into a value.
///
/// The first cause is exposed as the error source, the remaining ones are
/// kept for callers that want the whole batch.
#[derive(Debug, Clone, Error)]
#[error("computation produced no value ({})", cause_count(.rest))]
pub struct EmptyError {
    #[source]
    first: Cause,
    rest: Vec<Cause>,
}

impl EmptyError {
    pub(crate) fn new(causes: Vec<Cause>) -> Self {
        let mut causes = causes.into_iter();
        let first = causes
            .next()
            .unwrap_or_else(|| Cause::absent("value is absent"));

        Self {
            first,
            rest: causes.collect(),
        }
    }

    pub fn first(&self) -> &Cause {
        &self.first
    }

    pub fn causes(&self) -> impl Iterator<Item = &Cause> {
        std::iter::once(&self.first).chain(&self.rest)
    }

    pub fn is_cancelled(&self) -> bool {
        self.causes().any(Cause::is_cancelled)
    }

    pub fn into_causes(self) -> Vec<Cause> {
        let mut causes = Vec::with_capacity(self.rest.len() + 1);
        causes.push(self.first);
        causes.extend(self.rest);
        causes
    }
}

fn cause_count(rest: &[Cause]) -> String {
    match rest.len() {
        0 => String::from("1 cause"),
        n => format!("{} causes", n + 1),
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        String::from("panicked with unknown payload")
    }
}
