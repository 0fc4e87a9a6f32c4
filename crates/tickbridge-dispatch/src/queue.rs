//! Dispatcher Queues
//!
//! Thread-safe FIFO queues backing the dispatcher:
//! - Main action queue: many producers, drained in snapshots by the main
//!   thread.
//! - Itemized work queue: many producers, consumed by the single worker
//!   thread, with condvar wakeups and a shutdown flag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Boxed main-thread callback
pub(crate) type MainFn = Box<dyn FnOnce() + Send + 'static>;

/// Retryable unit of background work
pub(crate) struct WorkItem {
    /// Returns `true` when the item completed, `false` to retry later
    pub run: Box<dyn FnMut() -> bool + Send + 'static>,
    /// Invocations so far
    pub attempts: u32,
}

impl WorkItem {
    pub fn new<F>(run: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self {
            run: Box::new(run),
            attempts: 0,
        }
    }
}

/// Main action queue
pub(crate) struct MainQueue {
    actions: Mutex<VecDeque<MainFn>>,
}

impl MainQueue {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, action: MainFn) {
        self.actions.lock().unwrap().push_back(action);
    }

    /// Take everything currently queued. Actions pushed after this call
    /// land in the next snapshot, so a drain is always bounded.
    pub fn take_all(&self) -> VecDeque<MainFn> {
        std::mem::take(&mut *self.actions.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }
}

/// Itemized work queue shared with the worker thread
pub(crate) struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    condvar: Condvar,
    shutdown: AtomicBool,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn push(&self, item: WorkItem) {
        let mut items = self.items.lock().unwrap();
        items.push_back(item);
        self.condvar.notify_one();
    }

    /// Pop the next item, waiting up to `idle` at a time while the queue is
    /// empty. Returns `None` only once the queue is empty and shutdown has
    /// been requested; items queued before shutdown are still handed out.
    pub fn next_item(&self, idle: Duration) -> Option<WorkItem> {
        let mut items = self.items.lock().unwrap();

        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }

            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }

            // Wait with timeout to re-check shutdown
            let result = self.condvar.wait_timeout(items, idle).unwrap();
            items = result.0;
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_queue_fifo() {
        let queue = MainQueue::new();
        queue.push(Box::new(|| {}));
        queue.push(Box::new(|| {}));
        assert_eq!(queue.len(), 2);

        let batch = queue.take_all();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_work_queue_drains_before_shutdown() {
        let queue = WorkQueue::new();
        queue.push(WorkItem::new(|| true));
        queue.shutdown();

        // The queued item is still handed out, then the queue reports done.
        assert!(queue.next_item(Duration::from_millis(1)).is_some());
        assert!(queue.next_item(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn test_work_queue_empty_after_shutdown() {
        let queue = WorkQueue::new();
        queue.shutdown();
        assert!(queue.next_item(Duration::from_millis(1)).is_none());
    }
}
