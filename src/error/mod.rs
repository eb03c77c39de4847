//! Failure types shared by tasks and task groups.
//!
//! A task can fail in three ways, all represented by [`Failure`]:
//!
//! - its body returned an error ([`Failure::Error`]),
//! - its body panicked ([`Failure::Panic`]),
//! - its executor dropped the work before it ran to completion
//!   ([`Failure::Interrupted`]).
//!
//! Group barriers tag each failure with the task that produced it
//! ([`TaskFailure`]) and collect them in an [`AggregateError`].

use std::any::Any;
use std::error::Error as StdError;
use std::panic;
use std::sync::Arc;

use crate::task::TaskId;

pub use aggregate::{AggregateError, Raised};

mod aggregate;

/// A boxed error, the type task bodies convert their errors into.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The reason a task did not produce a value.
///
/// `Failure` is cheap to clone: every observer of a task sees the same
/// failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
    /// The task body returned an error.
    #[error(transparent)]
    Error(Arc<dyn StdError + Send + Sync + 'static>),

    /// The task body panicked. Carries the panic message.
    #[error("{0}")]
    Panic(Arc<str>),

    /// The wait for the task was interrupted: its executor dropped the work
    /// before it completed.
    #[error("task was interrupted before it completed")]
    Interrupted,
}

impl Failure {
    /// Wrap an error returned by a task body.
    ///
    /// Converting a `Failure` that was already boxed gives back the original
    /// failure instead of nesting it.
    ///
    /// # Example
    ///
    /// ```
    /// use task_chain::Failure;
    ///
    /// let failure = Failure::new("boom");
    /// assert_eq!(failure.to_string(), "boom");
    /// ```
    pub fn new<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        match error.into().downcast::<Failure>() {
            Ok(failure) => *failure,
            Err(error) => Failure::Error(Arc::from(error)),
        }
    }

    /// Convert a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Failure>() {
            Ok(failure) => return *failure,
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<TaskFailure>() {
            Ok(failure) => return failure.source,
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<AggregateError<TaskFailure>>() {
            Ok(errors) => return Failure::Error(Arc::new(*errors)),
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<AggregateError<Failure>>() {
            Ok(errors) => return Failure::Error(Arc::new(*errors)),
            Err(payload) => payload,
        };
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            Failure::Panic(Arc::from(*message))
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Failure::Panic(Arc::from(message.as_str()))
        } else {
            Failure::Panic(Arc::from("task panicked with a non-string payload"))
        }
    }

    /// Returns `true` if the task body panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, Failure::Panic(_))
    }

    /// Returns `true` if the wait for the task was interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Failure::Interrupted)
    }

    /// Attempt to downcast the error returned by the task body.
    ///
    /// Returns `None` for panics, interruptions, and errors of another type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Failure::Error(error) => error.downcast_ref::<E>(),
            Failure::Panic(_) | Failure::Interrupted => None,
        }
    }
}

/// A [`Failure`] tagged with the task that produced it.
///
/// Created by [`wait_all`](crate::task::wait_all) and
/// [`wait_all_unwrap`](crate::task::wait_all_unwrap).
#[derive(Debug, Clone, thiserror::Error)]
#[error("failure in {origin}")]
pub struct TaskFailure {
    origin: TaskId,
    #[source]
    source: Failure,
}

impl TaskFailure {
    /// Tag `source` with the task it came from.
    pub fn new(origin: TaskId, source: Failure) -> Self {
        Self { origin, source }
    }

    /// The task that failed.
    pub fn origin(&self) -> TaskId {
        self.origin
    }

    /// The failure of the task.
    pub fn failure(&self) -> &Failure {
        &self.source
    }

    /// Discard the tag.
    pub fn into_failure(self) -> Failure {
        self.source
    }
}

/// Misuse of an object in a state that does not allow the operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid state: {0}")]
pub struct InvalidState(pub(crate) &'static str);

/// Failures that can be raised as a panic on the current thread.
///
/// Panics are the runtime-kind failures of this crate. A failure that already
/// is a panic is resumed with its original message; anything else becomes the
/// payload of a new panic, so it can be recovered with
/// [`std::panic::catch_unwind`] and a downcast.
pub trait Unwind {
    /// Raise `self` as a panic.
    fn unwind(self) -> !;
}

impl Unwind for Failure {
    fn unwind(self) -> ! {
        match self {
            Failure::Panic(message) => panic::resume_unwind(Box::new(message.to_string())),
            failure => {
                // The default panic hook cannot print a typed payload.
                tracing::error!(%failure, "raising task failure");
                panic::panic_any(failure)
            }
        }
    }
}

impl Unwind for TaskFailure {
    fn unwind(self) -> ! {
        if self.source.is_panic() {
            self.source.unwind()
        }
        tracing::error!(task = %self.origin, failure = %self.source, "raising task failure");
        panic::panic_any(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io;

    #[test]
    fn new_keeps_message() {
        let failure = Failure::new(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(failure.to_string(), "boom");
        assert!(failure.downcast_ref::<io::Error>().is_some());
        assert!(!failure.is_panic());
    }

    #[test]
    fn new_does_not_nest_failures() {
        let failure = Failure::new(Failure::Interrupted);
        assert!(failure.is_interrupted());
    }

    #[test]
    fn panic_payloads() {
        let failure = Failure::from_panic(Box::new("static message"));
        assert_eq!(failure.to_string(), "static message");

        let failure = Failure::from_panic(Box::new(String::from("owned message")));
        assert_eq!(failure.to_string(), "owned message");
        assert!(failure.is_panic());

        let failure = Failure::from_panic(Box::new(Failure::Interrupted));
        assert!(failure.is_interrupted());

        let failure = Failure::from_panic(Box::new(42_u8));
        assert!(failure.is_panic());
    }

    #[test]
    fn aggregate_payload_keeps_causes() {
        let errors = AggregateError::from(vec![
            TaskFailure::new(TaskId::from_raw(1), Failure::new("oops")),
            TaskFailure::new(TaskId::from_raw(2), Failure::new("oh no")),
        ]);
        let failure = Failure::from_panic(Box::new(errors));
        assert!(!failure.is_panic());
        assert_eq!(failure.to_string(), "2 errors occurred");
        let errors = failure
            .downcast_ref::<AggregateError<TaskFailure>>()
            .unwrap();
        assert_eq!(errors[1].origin(), TaskId::from_raw(2));
    }

    #[test]
    fn unwind_resumes_panics_verbatim() {
        let payload = panic::catch_unwind(|| Failure::Panic(Arc::from("oh no")).unwind())
            .unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().unwrap(), "oh no");
    }

    #[test]
    fn unwind_wraps_errors() {
        let payload = panic::catch_unwind(|| Failure::new("oh no").unwind()).unwrap_err();
        let failure = payload.downcast_ref::<Failure>().unwrap();
        assert_eq!(failure.to_string(), "oh no");
    }

    #[test]
    fn task_failure_display() {
        let failure = TaskFailure::new(TaskId::from_raw(7), Failure::new("oops"));
        assert_eq!(failure.to_string(), "failure in task #7");
        assert_eq!(failure.source().unwrap().to_string(), "oops");
    }
}
