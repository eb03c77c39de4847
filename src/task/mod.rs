//! Chainable tasks.
//!
//! A [`Task`] is a handle to a computation running on an
//! [`Executor`](crate::executor::Executor). Tasks are chained into linear
//! pipelines: every combinator returns a new task that runs after the one it
//! was called on, and never modifies the original.
//!
//! | Combinator | Runs when the prior task... | New task completes with |
//! | --- | --- | --- |
//! | [`then`] | succeeded | the closure's output |
//! | [`try_then`] | succeeded | the closure's `Ok` value or error |
//! | [`then_run`] | succeeded, ignoring its value | the closure's output |
//! | [`combine`] | succeeded | `()` |
//! | [`handle`] | completed either way | `()` |
//! | [`recover`] | failed | the prior value, or the closure's replacement |
//!
//! A failure propagates down the chain unchanged, skipping every closure,
//! until a [`handle`] contains it or a [`recover`] replaces it.
//!
//! Tasks are completed at most once and every observer sees the same outcome,
//! which is why values are handed out by clone.
//!
//! # Blocking
//!
//! [`wait`], [`wait_unwrap`], [`wait_all`] and [`wait_all_unwrap`] block the
//! calling thread. Continuations never block a worker while they wait for the
//! task before them. A task body that itself calls one of the blocking
//! functions hands its worker's queue to a fresh thread and then blocks, so
//! tasks it spawned still run; each level of such nesting holds one extra
//! thread until the awaited task is done. Inside async code, `.await` the task
//! instead.
//!
//! # Example
//!
//! ```
//! use task_chain::Task;
//!
//! let task = Task::execute(|| 20)
//!     .then(|n| n + 1)
//!     .then(|n| n * 2);
//! assert_eq!(task.wait().unwrap(), 42);
//! ```
//!
//! [`then`]: Task::then
//! [`try_then`]: Task::try_then
//! [`then_run`]: Task::then_run
//! [`combine`]: Task::combine
//! [`handle`]: Task::handle
//! [`recover`]: Task::recover
//! [`wait`]: Task::wait
//! [`wait_unwrap`]: Task::wait_unwrap

use core::fmt;
use core::future::Future;
use core::panic::AssertUnwindSafe;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::Shared;
use futures::FutureExt;
use futures_core::future::BoxFuture;

use crate::error::{BoxError, Failure, Unwind};
use crate::executor::{self, Executor};

pub use group::{wait_all, wait_all_unwrap, Awaitable};
pub use into_future::TaskFuture;

mod group;
mod into_future;

type Outcome<T> = Shared<BoxFuture<'static, Result<T, Failure>>>;

/// A process-unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The numeric value of this id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task #{}", self.0)
    }
}

/// A handle to an asynchronous computation.
///
/// See the [module documentation](self) for an overview.
#[must_use = "tasks run in the background; dropping the handle discards the outcome"]
pub struct Task<T> {
    id: TaskId,
    executor: Arc<dyn Executor>,
    outcome: Outcome<T>,
}

impl<T> Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run `work` on the global executor.
    ///
    /// A panic in `work` completes the task with [`Failure::Panic`].
    ///
    /// # Panics
    ///
    /// Panics if the default global executor has to be started and cannot
    /// be. See [`executor::global`].
    pub fn execute<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::execute_on(executor::global(), work)
    }

    /// Run `work` on `executor`.
    pub fn execute_on<F>(executor: Arc<dyn Executor>, work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::start(executor, async move { Ok::<_, Failure>(work()) })
    }

    /// Run fallible `work` on the global executor.
    ///
    /// An `Err` completes the task with [`Failure::Error`].
    ///
    /// # Example
    ///
    /// ```
    /// use task_chain::Task;
    ///
    /// let task: Task<()> = Task::try_execute(|| Err("boom"));
    /// assert_eq!(task.wait().unwrap_err().to_string(), "boom");
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the default global executor has to be started and cannot
    /// be. See [`executor::global`].
    pub fn try_execute<F, E>(work: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::try_execute_on(executor::global(), work)
    }

    /// Run fallible `work` on `executor`.
    pub fn try_execute_on<F, E>(executor: Arc<dyn Executor>, work: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::start(executor, async move { work().map_err(Failure::new) })
    }

    /// A task that already succeeded with `value`, bound to the global
    /// executor.
    pub fn ready(value: T) -> Self {
        Self::completed(executor::global(), Ok(value))
    }

    /// A task that already failed with `failure`, bound to the global
    /// executor.
    pub fn failed(failure: Failure) -> Self {
        Self::completed(executor::global(), Err(failure))
    }

    fn completed(executor: Arc<dyn Executor>, outcome: Result<T, Failure>) -> Self {
        Self {
            id: TaskId::next(),
            executor,
            outcome: futures::future::ready(outcome).boxed().shared(),
        }
    }

    fn start<Fut>(executor: Arc<dyn Executor>, work: Fut) -> Self
    where
        Fut: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        let id = TaskId::next();
        let (sender, receiver) = oneshot::channel();
        executor.spawn(Box::pin(async move {
            let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => Err(Failure::from_panic(payload)),
            };
            if let Err(failure) = &outcome {
                tracing::debug!(task = %id, %failure, "task failed");
            }
            // Nobody is listening once every handle to the task is gone.
            let _ = sender.send(outcome);
        }));
        let outcome = receiver
            .map(move |received| match received {
                Ok(outcome) => outcome,
                Err(oneshot::Canceled) => {
                    tracing::warn!(task = %id, "task was dropped by its executor");
                    Err(Failure::Interrupted)
                }
            })
            .boxed()
            .shared();
        Self {
            id,
            executor,
            outcome,
        }
    }

    /// Run `f` with the value of this task once it succeeds.
    ///
    /// If this task fails, `f` is skipped and the new task fails with the
    /// same failure. Returning `()` from `f` gives a task that only signals
    /// completion.
    pub fn then<R, F>(&self, f: F) -> Task<R>
    where
        R: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let prior = self.outcome.clone();
        Task::start(self.executor.clone(), async move {
            let value = prior.await?;
            Ok::<_, Failure>(f(value))
        })
    }

    /// Run fallible `f` with the value of this task once it succeeds.
    ///
    /// An `Err` from `f` fails the new task.
    pub fn try_then<R, E, F>(&self, f: F) -> Task<R>
    where
        R: Clone + Send + Sync + 'static,
        E: Into<BoxError>,
        F: FnOnce(T) -> Result<R, E> + Send + 'static,
    {
        let prior = self.outcome.clone();
        Task::start(self.executor.clone(), async move {
            let value = prior.await?;
            f(value).map_err(Failure::new)
        })
    }

    /// Run `f` once this task succeeds, ignoring its value.
    ///
    /// Useful to inject a new value into the chain.
    pub fn then_run<R, F>(&self, f: F) -> Task<R>
    where
        R: Clone + Send + Sync + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let prior = self.outcome.clone();
        Task::start(self.executor.clone(), async move {
            prior.await?;
            Ok::<_, Failure>(f())
        })
    }

    /// Pass `value` and the value of this task to `f` once it succeeds.
    ///
    /// If this task fails, `f` is skipped, a warning is logged, and the new
    /// task fails with the same failure.
    pub fn combine<I, F>(&self, value: I, f: F) -> Task<()>
    where
        I: Send + 'static,
        F: FnOnce(I, T) + Send + 'static,
    {
        let id = self.id;
        let prior = self.outcome.clone();
        Task::start(self.executor.clone(), async move {
            match prior.await {
                Ok(output) => {
                    f(value, output);
                    Ok(())
                }
                Err(failure) => {
                    tracing::warn!(task = %id, %failure, "combine skipped, prior task failed");
                    Err(failure)
                }
            }
        })
    }

    /// Run `handler` once this task completes, with its failure if it failed.
    ///
    /// The new task succeeds whatever the outcome of this one, unless
    /// `handler` itself panics.
    ///
    /// # Example
    ///
    /// ```
    /// use task_chain::Task;
    ///
    /// let task: Task<()> = Task::try_execute(|| Err("boom"));
    /// let handled = task.handle(|failure| {
    ///     assert_eq!(failure.unwrap().to_string(), "boom");
    /// });
    /// assert!(handled.wait().is_ok());
    /// ```
    pub fn handle<F>(&self, handler: F) -> Task<()>
    where
        F: FnOnce(Option<Failure>) + Send + 'static,
    {
        let prior = self.outcome.clone();
        Task::start(self.executor.clone(), async move {
            handler(prior.await.err());
            Ok::<_, Failure>(())
        })
    }

    /// Replace a failure of this task with the value returned by `handler`.
    ///
    /// A success is passed through unchanged and `handler` is not called.
    /// Later steps of the chain run as if this task had succeeded.
    pub fn recover<F>(&self, handler: F) -> Task<T>
    where
        F: FnOnce(Failure) -> T + Send + 'static,
    {
        let prior = self.outcome.clone();
        Task::start(self.executor.clone(), async move {
            Ok::<_, Failure>(match prior.await {
                Ok(value) => value,
                Err(failure) => handler(failure),
            })
        })
    }

    /// Block the current thread until the task completes.
    ///
    /// # Errors
    ///
    /// Returns the failure of the task, exactly as the task produced it.
    pub fn wait(&self) -> Result<T, Failure> {
        executor::block_on(self.outcome.clone())
    }

    /// Block the current thread until the task completes, panicking if it
    /// failed.
    ///
    /// # Panics
    ///
    /// If the task body panicked, the panic is resumed with its original
    /// message. Any other failure is raised as a panic whose payload is the
    /// [`Failure`]; see [`Unwind`].
    pub fn wait_unwrap(&self) -> T {
        match self.wait() {
            Ok(value) => value,
            Err(failure) => failure.unwind(),
        }
    }

    /// The outcome of the task, if it completed.
    ///
    /// Never blocks.
    pub fn peek(&self) -> Option<Result<T, Failure>> {
        self.outcome.clone().now_or_never()
    }

    /// Returns `true` if the task completed.
    pub fn is_finished(&self) -> bool {
        self.peek().is_some()
    }
}

impl<T> Task<T> {
    /// The identifier of this task.
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            executor: self.executor.clone(),
            outcome: self.outcome.clone(),
        }
    }
}

impl<T> fmt::Debug for Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.peek() {
            None => "pending",
            Some(Ok(_)) => "succeeded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}

impl<T> fmt::Display for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}
