use crate::error::{AggregateError, Failure, TaskFailure};

use super::{Task, TaskId};

/// A task of any output type that can be waited on as part of a group.
///
/// Implemented for every [`Task`], so heterogeneous tasks can be passed to
/// [`wait_all`] and [`wait_all_unwrap`] together.
pub trait Awaitable {
    /// The identifier of the task.
    fn task_id(&self) -> TaskId;

    /// Block until the task completes, discarding its value.
    ///
    /// # Errors
    ///
    /// Returns the failure of the task.
    fn wait_done(&self) -> Result<(), Failure>;
}

impl<T> Awaitable for Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn task_id(&self) -> TaskId {
        self.id()
    }

    fn wait_done(&self) -> Result<(), Failure> {
        self.wait().map(drop)
    }
}

/// Block until every task in `tasks` completes.
///
/// Tasks are waited on in the order given. `handler` is called with every
/// failure, tagged with the task it came from; a failure never stops the
/// remaining tasks from being waited on.
///
/// # Example
///
/// ```
/// use task_chain::task::wait_all;
/// use task_chain::Task;
///
/// let a = Task::execute(|| 1);
/// let b: Task<()> = Task::try_execute(|| Err("oops"));
///
/// let mut failed = Vec::new();
/// wait_all(&[&a, &b], |failure| failed.push(failure.origin()));
/// assert_eq!(failed, vec![b.id()]);
/// ```
pub fn wait_all<H>(tasks: &[&dyn Awaitable], mut handler: H)
where
    H: FnMut(TaskFailure),
{
    for task in tasks {
        if let Err(failure) = task.wait_done() {
            let failure = TaskFailure::new(task.task_id(), failure);
            tracing::debug!(task = %failure.origin(), cause = %failure.failure(), "task in group failed");
            handler(failure);
        }
    }
}

/// Block until every task in `tasks` completes, panicking if any failed.
///
/// Every task is waited on before anything is raised.
///
/// # Panics
///
/// - With exactly one failed task, its [`TaskFailure`] is raised through
///   [`Unwind`](crate::Unwind): a panicking task body is resumed with its
///   original message, other failures become the panic payload.
/// - With two or more failed tasks, the payload is an
///   [`AggregateError<TaskFailure>`] holding one cause per failed task.
pub fn wait_all_unwrap(tasks: &[&dyn Awaitable]) {
    let mut causes = Vec::new();
    wait_all(tasks, |failure| causes.push(failure));
    AggregateError::from(causes).finalize_and_raise();
}
