use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use rand::Rng;
use task_chain::collections::{CollectionError, ConcurrentVec};
use task_chain::prelude::*;

const THREADS: usize = 8;
const PER_THREAD: usize = 2_000;

#[test]
fn concurrent_appends_are_not_lost() {
    let list = Arc::new(ConcurrentVec::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let list = list.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for n in 0..PER_THREAD {
                    list.push((t, n));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(list.len(), THREADS * PER_THREAD);
    // Writers are serialized, so each thread's own items stay in order.
    for t in 0..THREADS {
        let mine: Vec<_> = list.iter().filter(|(owner, _)| *owner == t).map(|(_, n)| n).collect();
        assert_eq!(mine, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn interleaved_readers_and_writers() {
    let list = Arc::new(ConcurrentVec::new());
    let writers: Vec<_> = (0..THREADS)
        .map(|_| {
            let list = list.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..PER_THREAD {
                    match rng.gen_range(0..4) {
                        0 => {
                            let _ = list.insert(0, 1u64);
                        }
                        _ => list.push(1u64),
                    }
                }
            })
        })
        .collect();
    let reader = {
        let list = list.clone();
        thread::spawn(move || {
            let mut last = 0;
            while last < THREADS * PER_THREAD {
                let sum: u64 = list.iter().sum();
                assert!(sum as usize >= last);
                last = sum as usize;
            }
        })
    };
    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();
    assert_eq!(list.len(), THREADS * PER_THREAD);
}

#[test]
fn snapshot_is_isolated_from_writes() {
    let list: ConcurrentVec<u32> = (1..=5).collect();
    let snapshot = list.iter();
    list.clear();
    list.push(99);
    assert_eq!(snapshot.collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert_eq!(list, vec![99]);
}

#[test]
fn snapshot_cursor_rejects_mutation() {
    let list = ConcurrentVec::from(vec!["a", "b"]);
    let mut cursor = list.list_iter(0).unwrap();
    assert_eq!(cursor.next(), Some("a"));
    assert_eq!(cursor.add("c"), Err(CollectionError::Unsupported("add")));
    assert_eq!(cursor.set("c"), Err(CollectionError::Unsupported("set")));
    assert_eq!(cursor.remove(), Err(CollectionError::Unsupported("remove")));
    assert_eq!(list, vec!["a", "b"]);
}

#[derive(Debug, Default)]
struct Sample {
    hits: u32,
}

#[test]
fn snapshot_shares_element_state() {
    let list = ConcurrentVec::new();
    for _ in 0..3 {
        list.push(Arc::new(Mutex::new(Sample::default())));
    }
    let snapshot: Vec<_> = list.iter().collect();
    for sample in &snapshot {
        sample.lock().unwrap().hits += 1;
    }
    list.for_each(|sample| assert_eq!(sample.lock().unwrap().hits, 1));
}

#[test]
fn live_cursor_survives_concurrent_removal() {
    let list: Arc<ConcurrentVec<u32>> = Arc::new((0..5_000).collect());
    let remover = {
        let list = list.clone();
        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            while !list.is_empty() {
                let len = list.len();
                if len > 0 {
                    let _ = list.remove(rng.gen_range(0..len));
                }
            }
        })
    };

    let mut steps = 0;
    let mut cursor = list.sync_list_iter(0).unwrap();
    while cursor.next().is_some() {
        steps += 1;
        if steps % 7 == 0 {
            let _ = cursor.remove();
        }
    }
    remover.join().unwrap();
    assert!(steps <= 5_000);
    assert!(list.is_empty());
}
