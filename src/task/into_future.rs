use core::fmt;
use core::future::{Future, IntoFuture};
use core::pin::Pin;
use core::task::{Context, Poll};

use super::{Outcome, Task, TaskId};
use crate::error::Failure;

/// A future which resolves to the outcome of a [`Task`].
///
/// This `struct` is created by awaiting a [`Task`], or by calling
/// [`IntoFuture::into_future`] on one. Awaiting a task never blocks the
/// thread, so it is the way to observe tasks from async code.
///
/// # Example
///
/// ```
/// use futures_lite::future::block_on;
/// use task_chain::Task;
///
/// block_on(async {
///     let task = Task::execute(|| 2).then(|n| n * 21);
///     assert_eq!(task.await.unwrap(), 42);
/// });
/// ```
#[pin_project::pin_project]
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct TaskFuture<T> {
    id: TaskId,
    #[pin]
    outcome: Outcome<T>,
}

impl<T> fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFuture").field("id", &self.id).finish()
    }
}

impl<T: Clone> Future for TaskFuture<T> {
    type Output = Result<T, Failure>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().outcome.poll(cx)
    }
}

impl<T> IntoFuture for Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T, Failure>;
    type IntoFuture = TaskFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        TaskFuture {
            id: self.id,
            outcome: self.outcome,
        }
    }
}

impl<T> IntoFuture for &Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T, Failure>;
    type IntoFuture = TaskFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.clone().into_future()
    }
}
