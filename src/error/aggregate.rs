use core::fmt;
use core::ops::Deref;
use std::error::Error;
use std::panic;

use super::{InvalidState, Unwind};

/// A collection of errors.
///
/// Causes are appended with [`add_cause`] until the aggregate is finalized.
/// Finalizing collapses it: no causes means no error, a single cause is
/// handed back on its own, and only two or more causes are reported as an
/// `AggregateError`.
///
/// The `Debug` output lists every cause, indexed, followed by its chain of
/// sources.
///
/// # Example
///
/// ```
/// use task_chain::{AggregateError, Failure, Raised};
///
/// let mut errors = AggregateError::new();
/// errors.add_cause(Failure::new("oops")).unwrap();
/// errors.add_cause(Failure::new("oh no")).unwrap();
///
/// match errors.finalize() {
///     Err(Raised::Aggregate(errors)) => assert_eq!(errors.len(), 2),
///     _ => unreachable!(),
/// }
/// assert!(errors.add_cause(Failure::new("too late")).is_err());
/// ```
///
/// [`add_cause`]: AggregateError::add_cause
#[derive(Clone)]
pub struct AggregateError<E> {
    inner: Vec<E>,
    finalized: bool,
}

impl<E> AggregateError<E> {
    /// Create an empty aggregate that still accepts causes.
    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            finalized: false,
        }
    }

    /// Append a cause.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidState`] once the aggregate has been finalized.
    pub fn add_cause(&mut self, cause: E) -> Result<(), InvalidState> {
        if self.finalized {
            return Err(InvalidState("aggregate error is already finalized"));
        }
        self.inner.push(cause);
        Ok(())
    }

    /// Returns a copy of the collected causes.
    pub fn causes(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.inner.clone()
    }

    /// Returns `true` once the aggregate no longer accepts causes.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Consume the aggregate, returning its causes.
    pub fn into_causes(self) -> Vec<E> {
        self.inner
    }

    /// Mark the aggregate finalized and collapse it.
    ///
    /// # Errors
    ///
    /// Returns [`Raised::Single`] when exactly one cause was collected, and
    /// [`Raised::Aggregate`] with a copy of this aggregate when there are
    /// more.
    pub fn finalize(&mut self) -> Result<(), Raised<E>>
    where
        E: Clone,
    {
        self.finalized = true;
        match self.inner.as_slice() {
            [] => Ok(()),
            [cause] => Err(Raised::Single(cause.clone())),
            _ => Err(Raised::Aggregate(self.clone())),
        }
    }

    /// Finalize the aggregate and raise it on the current thread.
    ///
    /// Returns normally when no causes were collected. A single cause is
    /// raised through [`Unwind::unwind`]. Two or more causes panic with the
    /// `AggregateError` itself as payload.
    pub fn finalize_and_raise(mut self)
    where
        E: Error + Unwind + Send + 'static,
    {
        self.finalized = true;
        if self.inner.len() > 1 {
            tracing::error!("raising {self:?}");
            panic::panic_any(self)
        }
        if let Some(cause) = self.inner.pop() {
            cause.unwind()
        }
    }
}

impl<E> Default for AggregateError<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an aggregate that is already finalized.
impl<E> From<Vec<E>> for AggregateError<E> {
    fn from(inner: Vec<E>) -> Self {
        Self {
            inner,
            finalized: true,
        }
    }
}

impl<E: Error> fmt::Debug for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}:")?;

        for (i, err) in self.inner.iter().enumerate() {
            writeln!(f, "- Error {}: {err}", i + 1)?;
            let mut source = err.source();
            while let Some(cause) = source {
                writeln!(f, "    caused by: {cause}")?;
                source = cause.source();
            }
        }

        Ok(())
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred", self.inner.len())
    }
}

impl<E> Deref for AggregateError<E> {
    type Target = [E];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<E: Error> Error for AggregateError<E> {}

/// The outcome of finalizing a non-empty [`AggregateError`].
pub enum Raised<E> {
    /// Exactly one cause was collected.
    Single(E),
    /// Two or more causes were collected.
    Aggregate(AggregateError<E>),
}

impl<E: Error> fmt::Debug for Raised<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raised::Single(err) => f.debug_tuple("Single").field(err).finish(),
            Raised::Aggregate(errs) => f.debug_tuple("Aggregate").field(errs).finish(),
        }
    }
}

impl<E: Error> fmt::Display for Raised<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raised::Single(err) => fmt::Display::fmt(err, f),
            Raised::Aggregate(errs) => fmt::Display::fmt(errs, f),
        }
    }
}

impl<E: Error + 'static> Error for Raised<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Raised::Single(err) => err.source(),
            Raised::Aggregate(_) => None,
        }
    }
}
