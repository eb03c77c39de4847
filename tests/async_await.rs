use std::sync::{mpsc, Arc};
use std::time::Duration;

use task_chain::executor::Executor;
use task_chain::Task;
use tokio::runtime::Handle;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_on_global_pool() {
    let task = Task::execute(|| 6).then(|n| n * 7);
    assert_eq!(task.await.unwrap(), 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_on_current_runtime() {
    let executor: Arc<dyn Executor> = Arc::new(Handle::current());
    let task = Task::execute_on(executor, || "tokio").then(str::len);
    assert_eq!((&task).await.unwrap(), 5);
    assert!(task.is_finished());
}

#[tokio::test]
async fn awaiting_does_not_block_the_runtime() {
    let (release, gate) = mpsc::channel::<()>();
    let gated = Task::execute(move || gate.recv().unwrap());
    let ticker = tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        "tick"
    });
    assert_eq!(ticker.await.unwrap(), "tick");
    assert!(!gated.is_finished());
    release.send(()).unwrap();
    gated.await.unwrap();
}

#[tokio::test]
async fn failure_through_await() {
    let task: Task<u8> = Task::try_execute(|| Err("boom"));
    let failure = task.clone().await.unwrap_err();
    assert_eq!(failure.to_string(), "boom");
    assert_eq!(task.peek().unwrap().unwrap_err().to_string(), "boom");
}
