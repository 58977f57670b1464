//! Commands under competing writers
//!
//! Tests:
//! - Guarded read-modify-write commands retry when they lose a race
//! - Retries are bounded and surface the race error
//! - Clients sharing one store see each other's counters

use std::sync::{Arc, Barrier};
use std::thread;

use redshim::{Client, Error, MemoryRecordStore, RecordStore};

use crate::common::*;

#[test]
fn test_ltrim_retries_after_lost_race() {
    let (r, store) = contended_client(2);
    for item in ["a", "b", "c", "d"] {
        r.rpush("myKey", item).unwrap();
    }
    r.ltrim("myKey", 1, 2).unwrap();
    assert_eq!(store.injected(), 2);
    assert_eq!(
        r.lrange("myKey", 0, -1).unwrap(),
        vec![b"b".to_vec(), b"c".to_vec()]
    );
}

#[test]
fn test_ltrim_gives_up_after_retry_budget() {
    let (r, _store) = contended_client(usize::MAX);
    for item in ["a", "b", "c"] {
        r.rpush("myKey", item).unwrap();
    }
    let err = r.ltrim("myKey", 0, 0).unwrap_err();
    assert!(matches!(err, Error::GenerationMismatch { .. }), "{:?}", err);
    assert_eq!(r.lsize("myKey").unwrap(), 3);
}

#[test]
fn test_numeric_text_promotion_retries() {
    let (r, store) = contended_client(1);
    r.set("n", "9").unwrap();
    assert_eq!(r.incr("n").unwrap(), 10);
    assert_eq!(store.injected(), 1);
}

#[test]
fn test_clients_share_counters() {
    init_tracing();
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let threads = 8;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let r = Client::new(store, &config_for("expanded")).unwrap();
                barrier.wait();
                for _ in 0..per_thread {
                    r.incr("visits").unwrap();
                    r.hincrby("stats", "visits", 1).unwrap();
                    r.rpush("log", "v").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let r = Client::new(store, &config_for("expanded")).unwrap();
    let total = (threads * per_thread) as i64;
    assert_eq!(r.get("visits").unwrap(), Some(total.to_string().into_bytes()));
    assert_eq!(
        r.hget("stats", "visits").unwrap(),
        Some(total.to_string().into_bytes())
    );
    assert_eq!(r.lsize("log").unwrap(), total);
}
