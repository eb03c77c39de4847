use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use task_chain::collections::ConcurrentVec;
use task_chain::{Failure, Task};

#[test]
fn chained_steps_run_in_order() {
    let log = Arc::new(ConcurrentVec::new());
    log.push("first");

    let chain = {
        let second = log.clone();
        let third = log.clone();
        Task::execute(move || {
            second.push("second");
            thread::sleep(Duration::from_millis(50));
        })
        .then(move |()| third.push("third"))
    };
    chain.wait().unwrap();
    log.push("final");

    assert_eq!(*log, vec!["first", "second", "third", "final"]);
}

#[test]
fn every_step_happens_after_the_last() {
    let log = Arc::new(ConcurrentVec::new());
    let mut task = Task::ready(());
    for n in 0..32 {
        let log = log.clone();
        task = task.then(move |()| {
            if n % 4 == 0 {
                thread::sleep(Duration::from_millis(1));
            }
            log.push(n);
        });
    }
    task.wait().unwrap();
    assert_eq!(log.to_vec(), (0..32).collect::<Vec<_>>());
}

#[test]
fn failure_reaches_waiter_and_handler() {
    let task: Task<()> = Task::try_execute(|| Err("boom"));

    let failure = task.wait().unwrap_err();
    assert_eq!(failure.to_string(), "boom");

    let seen = Arc::new(ConcurrentVec::new());
    let handled = {
        let seen = seen.clone();
        task.handle(move |failure| seen.push(failure.map(|f| f.to_string())))
    };
    assert!(handled.wait().is_ok());
    assert_eq!(*seen, vec![Some("boom".to_string())]);
}

#[test]
fn failure_skips_later_steps() {
    let ran = Arc::new(AtomicBool::new(false));
    let task = {
        let ran = ran.clone();
        Task::<u32>::try_execute(|| Err("boom"))
            .then(|n| n + 1)
            .then(move |n| {
                ran.store(true, Ordering::SeqCst);
                n * 2
            })
    };
    assert_eq!(task.wait().unwrap_err().to_string(), "boom");
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn recovered_chain_continues() {
    let task = Task::<u32>::try_execute(|| Err("boom"))
        .then(|n| n + 100)
        .recover(|failure| {
            assert_eq!(failure.to_string(), "boom");
            1
        })
        .then(|n| n + 1);
    assert_eq!(task.wait().unwrap(), 2);
}

#[test]
fn handle_intercepts_failure_once() {
    let log = Arc::new(ConcurrentVec::new());
    let task = {
        let a = log.clone();
        let b = log.clone();
        Task::execute(move || a.push("body"))
            .try_then(|()| Err::<(), _>("step failed"))
            .handle(move |failure| b.push(if failure.is_some() { "handled" } else { "clean" }))
    };
    task.wait().unwrap();
    assert_eq!(*log, vec!["body", "handled"]);
}

#[test]
fn panicking_body_resumes_in_waiter() {
    let task: Task<u8> = Task::execute(|| panic!("boom"));
    assert!(task.wait().unwrap_err().is_panic());

    let payload = panic::catch_unwind(AssertUnwindSafe(|| task.wait_unwrap())).unwrap_err();
    assert_eq!(payload.downcast_ref::<String>().unwrap(), "boom");
}

#[test]
fn error_failure_raised_by_wait_unwrap() {
    let task: Task<u8> = Task::try_execute(|| Err("boom"));
    let payload = panic::catch_unwind(AssertUnwindSafe(|| task.wait_unwrap())).unwrap_err();
    let failure = payload.downcast_ref::<Failure>().unwrap();
    assert_eq!(failure.to_string(), "boom");
}

#[test]
fn combine_passes_value_through() {
    let out: Arc<ConcurrentVec<i32>> = Arc::new(ConcurrentVec::new());
    let task = Task::execute(|| 20).combine(out.clone(), |out, n| out.push(n + 1));
    task.wait().unwrap();
    assert_eq!(*out, vec![21]);
}

#[test]
fn combine_propagates_failure() {
    let out: Arc<ConcurrentVec<u32>> = Arc::new(ConcurrentVec::new());
    let task = Task::<u32>::try_execute(|| Err("boom")).combine(out.clone(), |out, n| out.push(n));
    assert_eq!(task.wait().unwrap_err().to_string(), "boom");
    assert!(out.is_empty());
}

#[test]
fn branches_share_one_outcome() {
    let root = Task::execute(|| vec![1, 2, 3]);
    let sum = root.then(|v| v.iter().sum::<i32>());
    let len = root.then(|v| v.len());
    assert_eq!(sum.wait().unwrap(), 6);
    assert_eq!(len.wait().unwrap(), 3);
    assert_eq!(root.wait().unwrap(), vec![1, 2, 3]);
}
