//! Chainable background tasks, aggregated failures and a thread-safe list.
//!
//! The crate has three parts:
//!
//! - [`task`]: [`Task`] runs a closure on a shared worker pool and lets you
//!   chain continuations, handlers and recoveries onto it. Tasks can be waited
//!   on from synchronous code, or `.await`ed.
//! - [`error`]: the [`Failure`] a task completes with, and [`AggregateError`]
//!   for collecting several failures into one.
//! - [`collections`]: [`ConcurrentVec`](collections::ConcurrentVec), a growable
//!   array behind a reader/writer lock with snapshot and live iteration.
//!
//! Tasks run on the [global executor](executor::global) unless another
//! [`Executor`](executor::Executor) is passed in.
//!
//! # Examples
//!
//! Chain tasks and wait for the result:
//! ```rust
//! use task_chain::Task;
//!
//! let task = Task::execute(|| "hello")
//!     .then(|s| s.len())
//!     .then(|n| n * 2);
//! assert_eq!(task.wait().unwrap(), 10);
//! ```
//!
//! Wait on several tasks and raise every failure at once:
//! ```rust
//! use task_chain::task::wait_all_unwrap;
//! use task_chain::{AggregateError, Task, TaskFailure};
//! use std::panic::{self, AssertUnwindSafe};
//!
//! let a: Task<()> = Task::try_execute(|| Err("first"));
//! let b: Task<u8> = Task::try_execute(|| Err("second"));
//!
//! let payload = panic::catch_unwind(AssertUnwindSafe(|| wait_all_unwrap(&[&a, &b]))).unwrap_err();
//! let errors = payload.downcast_ref::<AggregateError<TaskFailure>>().unwrap();
//! assert_eq!(errors.len(), 2);
//! ```

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

/// The task-chain prelude.
pub mod prelude {
    pub use super::collections::ListIterator as _;
    pub use super::error::Unwind as _;
    pub use super::task::Awaitable as _;
}

pub mod collections;
pub mod error;
pub mod executor;
pub mod task;

pub use error::{AggregateError, BoxError, Failure, InvalidState, Raised, TaskFailure, Unwind};
pub use task::{Task, TaskId};
