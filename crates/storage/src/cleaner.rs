//! TTL cleanup background task
//!
//! TTLCleaner runs in a background thread and periodically purges expired
//! records from a `MemoryRecordStore`. Reads already hide expired records;
//! the cleaner only reclaims their memory and index entries.
//!
//! - Runs in background thread, doesn't block writes between sweeps
//! - Graceful shutdown via atomic flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use crate::memory::MemoryRecordStore;

/// Background TTL cleanup task
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use redshim_storage::{MemoryRecordStore, TTLCleaner};
///
/// let store = Arc::new(MemoryRecordStore::new());
/// let cleaner = TTLCleaner::new(Arc::clone(&store), Duration::from_secs(60));
/// let handle = cleaner.start();
///
/// cleaner.shutdown();
/// handle.join().unwrap();
/// ```
pub struct TTLCleaner {
    store: Arc<MemoryRecordStore>,
    check_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl TTLCleaner {
    /// Create a new TTL cleaner
    pub fn new(store: Arc<MemoryRecordStore>, check_interval: Duration) -> Self {
        Self {
            store,
            check_interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background cleanup task
    ///
    /// The thread runs until `shutdown()` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let shutdown = Arc::clone(&self.shutdown);
        let check_interval = self.check_interval;

        thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                // Sleep in short slices so shutdown is observed promptly
                let sleep_interval = Duration::from_millis(100).min(check_interval);
                let mut elapsed = Duration::ZERO;

                while elapsed < check_interval {
                    if shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    thread::sleep(sleep_interval);
                    elapsed += sleep_interval;
                }

                let purged = store.purge_expired();
                trace!(target: "redshim::store", purged, "ttl sweep finished");
            }
        })
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if shutdown has been signaled
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
