// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-thread mutual exclusion for memory writes.
//!
//! Operations on one conversation thread queue behind each other; different
//! threads never contend. The lock is a scoped guard, so it is released on
//! every exit path, including errors and cancelled futures.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map from thread id to that thread's write lock.
#[derive(Clone, Default)]
pub struct ThreadSerializer {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `thread_id`.
    pub async fn acquire(&self, thread_id: &str) -> ThreadGuard {
        let lock = self
            .locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        ThreadGuard {
            guard: Some(guard),
            locks: self.locks.clone(),
            thread_id: thread_id.to_string(),
        }
    }

    /// Threads that currently hold or wait for a lock.
    pub fn active_threads(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one thread. Released on drop.
pub struct ThreadGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    thread_id: String,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Evict the entry once nobody holds or waits for it.
        self.locks
            .remove_if(&self.thread_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_thread_is_serialized() {
        let serializer = ThreadSerializer::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let serializer = serializer.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = serializer.acquire("t").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(serializer.active_threads(), 0);
    }

    #[tokio::test]
    async fn different_threads_do_not_block() {
        let serializer = ThreadSerializer::new();
        let _a = serializer.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_secs(1), serializer.acquire("b")).await;
        assert!(b.is_ok());
        assert_eq!(serializer.active_threads(), 2);
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leak() {
        let serializer = ThreadSerializer::new();
        let held = serializer.acquire("t").await;
        let waiter = tokio::time::timeout(Duration::from_millis(10), serializer.acquire("t")).await;
        assert!(waiter.is_err());
        drop(held);
        assert_eq!(serializer.active_threads(), 0);
        let _again = serializer.acquire("t").await;
    }
}
