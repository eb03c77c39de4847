//! The executor tasks run on.
//!
//! Every [`Task`](crate::Task) is bound to an [`Executor`]. Tasks created with
//! [`Task::execute`](crate::Task::execute) use the process-wide executor
//! returned by [`global`]; chained tasks inherit the executor of the task they
//! were chained on.
//!
//! The global executor is installed at most once. Call [`set_global`] before
//! the first task is created to replace the default [`Pool`]; once a task has
//! been created the default is in place and later installs are rejected.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use task_chain::executor::{Executor, Pool};
//! use task_chain::Task;
//!
//! let pool: Arc<dyn Executor> = Arc::new(Pool::builder().worker_threads(2).build().unwrap());
//! let task = Task::execute_on(pool, || 1 + 1);
//! assert_eq!(task.wait().unwrap(), 2);
//! ```

use std::env;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use once_cell::sync::OnceCell;
use tokio::runtime::{self, Runtime, RuntimeFlavor};

/// Environment variable read by [`PoolBuilder::from_env`].
pub const WORKER_THREADS_ENV: &str = "TASK_CHAIN_WORKER_THREADS";

const DEFAULT_THREAD_NAME: &str = "task-chain-worker";

static GLOBAL: OnceCell<Arc<dyn Executor>> = OnceCell::new();

/// Something that can run futures to completion in the background.
///
/// Implementations must eventually poll every spawned future to completion,
/// or drop it. A dropped future completes its task with
/// [`Failure::Interrupted`](crate::Failure::Interrupted).
pub trait Executor: Send + Sync + 'static {
    /// Schedule `future` for execution without blocking the caller.
    fn spawn(&self, future: BoxFuture<'static, ()>);
}

impl Executor for runtime::Handle {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        drop(runtime::Handle::spawn(self, future));
    }
}

/// Errors produced while configuring executors.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The global executor was already installed.
    #[error("the global executor is already initialized")]
    AlreadyInitialized,

    /// A configuration value could not be used.
    #[error("invalid executor configuration: {0}")]
    InvalidConfig(String),

    /// The worker threads could not be started.
    #[error("failed to start the worker pool")]
    Build(#[from] io::Error),
}

/// A work-stealing pool of worker threads.
///
/// Backed by a multi-threaded `tokio` runtime. Dropping the pool shuts the
/// runtime down without waiting; tasks still pending on it complete with
/// [`Failure::Interrupted`](crate::Failure::Interrupted).
pub struct Pool {
    runtime: Option<Runtime>,
    thread_name: String,
}

impl Pool {
    /// Start a pool with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker threads cannot be started.
    pub fn new() -> Result<Self, ExecutorError> {
        PoolBuilder::new().build()
    }

    /// Configure a new pool.
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// A handle to the underlying runtime.
    ///
    /// Returns `None` once the pool is shutting down.
    pub fn handle(&self) -> Option<&runtime::Handle> {
        self.runtime.as_ref().map(Runtime::handle)
    }
}

impl Executor for Pool {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        if let Some(runtime) = &self.runtime {
            drop(runtime.spawn(future));
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("thread_name", &self.thread_name)
            .field("running", &self.runtime.is_some())
            .finish()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        // The last reference may be released on one of our own workers, where
        // a blocking shutdown would panic.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Configuration for a [`Pool`].
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    worker_threads: Option<usize>,
    thread_name: String,
    thread_stack_size: Option<usize>,
}

impl PoolBuilder {
    /// The default configuration: one worker per core.
    pub fn new() -> Self {
        Self {
            worker_threads: None,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_stack_size: None,
        }
    }

    /// The default configuration, with the worker count taken from
    /// [`WORKER_THREADS_ENV`] when it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::InvalidConfig`] if the variable is set but is
    /// not a positive integer.
    pub fn from_env() -> Result<Self, ExecutorError> {
        let builder = Self::new();
        match env::var(WORKER_THREADS_ENV) {
            Ok(value) => match value.trim().parse::<usize>() {
                Ok(count) if count > 0 => Ok(builder.worker_threads(count)),
                _ => Err(ExecutorError::InvalidConfig(format!(
                    "{WORKER_THREADS_ENV} must be a positive integer, got {value:?}"
                ))),
            },
            Err(_) => Ok(builder),
        }
    }

    /// Set the number of worker threads.
    ///
    /// A count of zero is ignored.
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = (count > 0).then_some(count);
        self
    }

    /// Set the name given to worker threads.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the stack size of worker threads, in bytes.
    pub fn thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = Some(bytes);
        self
    }

    /// Start the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker threads cannot be started.
    pub fn build(self) -> Result<Pool, ExecutorError> {
        let mut builder = runtime::Builder::new_multi_thread();
        builder.thread_name(self.thread_name.clone());
        if let Some(count) = self.worker_threads {
            builder.worker_threads(count);
        }
        if let Some(bytes) = self.thread_stack_size {
            builder.thread_stack_size(bytes);
        }
        let runtime = builder.build()?;
        tracing::debug!(
            thread_name = %self.thread_name,
            worker_threads = ?self.worker_threads,
            "started worker pool"
        );
        Ok(Pool {
            runtime: Some(runtime),
            thread_name: self.thread_name,
        })
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the process-wide executor.
///
/// Must be called before the first task is created through
/// [`Task::execute`](crate::Task::execute). Replacing the executor has no
/// effect on work that was already scheduled.
///
/// # Errors
///
/// Returns [`ExecutorError::AlreadyInitialized`] if an executor is already
/// installed, including the default one.
pub fn set_global(executor: Arc<dyn Executor>) -> Result<(), ExecutorError> {
    GLOBAL
        .set(executor)
        .map_err(|_| ExecutorError::AlreadyInitialized)?;
    tracing::info!("installed global executor");
    Ok(())
}

/// The process-wide executor, starting the default [`Pool`] if none was
/// installed.
///
/// The default pool is configured with [`PoolBuilder::from_env`].
///
/// # Errors
///
/// Returns an error if the default pool cannot be configured or started.
pub fn try_global() -> Result<Arc<dyn Executor>, ExecutorError> {
    GLOBAL
        .get_or_try_init(|| {
            let pool = PoolBuilder::from_env()?.build()?;
            tracing::info!("started default global executor");
            Ok(Arc::new(pool) as Arc<dyn Executor>)
        })
        .cloned()
}

/// The process-wide executor, starting the default [`Pool`] if none was
/// installed.
///
/// # Panics
///
/// Panics if the default pool cannot be started, like
/// [`std::thread::spawn`] does when a thread cannot be created. Use
/// [`try_global`] to handle that case.
pub fn global() -> Arc<dyn Executor> {
    match try_global() {
        Ok(executor) => executor,
        Err(error) => panic!("failed to start the global executor: {error}"),
    }
}

/// Block the current thread until `future` completes.
///
/// On a worker of a multi-threaded `tokio` runtime the worker's queue is
/// handed to another thread first, so work spawned from the blocked thread
/// still runs.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    match runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| futures_lite::future::block_on(future))
        }
        _ => futures_lite::future::block_on(future),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use futures::channel::oneshot;

    #[test]
    fn pool_runs_futures() {
        let pool = Pool::builder().worker_threads(1).build().unwrap();
        let (sender, receiver) = oneshot::channel();
        pool.spawn(Box::pin(async move {
            sender.send(12).unwrap();
        }));
        assert_eq!(futures_lite::future::block_on(receiver), Ok(12));
    }

    #[test]
    fn zero_workers_is_ignored() {
        let builder = PoolBuilder::new().worker_threads(0);
        assert!(builder.worker_threads.is_none());
    }

    #[test]
    fn debug_output() {
        let pool = Pool::builder().thread_name("test-worker").build().unwrap();
        assert_eq!(
            format!("{pool:?}"),
            r#"Pool { thread_name: "test-worker", running: true }"#
        );
    }
}
