//! Per-thread mutual exclusion for get-then-put sequences
//!
//! A store only guarantees that a single `put` is atomic. The engine reads a
//! checkpoint, runs steps, and writes new checkpoints; two such sequences on
//! the same thread must not interleave. [`ThreadLocks`] hands out one async
//! mutex per thread id, while different threads proceed in parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Keyed async mutexes, one per thread id
///
/// An entry lives only while some caller holds or waits on it; the last
/// [`ThreadGuard`] to drop removes it.
#[derive(Debug, Default, Clone)]
pub struct ThreadLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one thread id, released on drop
#[derive(Debug)]
pub struct ThreadGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
    thread_id: String,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone of the mutex, which keeps the entry
        self.locks
            .remove_if(&self.thread_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, thread_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn guard(&self, thread_id: &str, guard: OwnedMutexGuard<()>) -> ThreadGuard {
        ThreadGuard {
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
            thread_id: thread_id.to_string(),
        }
    }

    /// Wait for exclusive access to `thread_id`.
    ///
    /// The returned guard releases the lock on drop, including when the
    /// holding future is cancelled.
    pub async fn lock(&self, thread_id: &str) -> ThreadGuard {
        let mutex = self.mutex_for(thread_id);
        let guard = mutex.lock_owned().await;
        self.guard(thread_id, guard)
    }

    /// Acquire the lock only if nobody holds it.
    pub fn try_lock(&self, thread_id: &str) -> Option<ThreadGuard> {
        let mutex = self.mutex_for(thread_id);
        let guard = mutex.try_lock_owned().ok()?;
        Some(self.guard(thread_id, guard))
    }

    /// Number of thread ids with a live mutex
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
