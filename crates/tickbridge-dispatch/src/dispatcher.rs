//! Cross-Thread Work Dispatcher
//!
//! Routes callbacks from arbitrary producer threads to the single main
//! thread (drained once per host tick) and runs retryable background work
//! serially on one lazily-spawned worker thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use crate::config::DispatcherConfig;
use crate::queue::{MainQueue, WorkItem, WorkQueue};

/// State shared with producer threads and the worker thread
struct Shared {
    config: DispatcherConfig,
    main_queue: MainQueue,
    work_queue: WorkQueue,
    /// Identity of whichever thread first calls `dispatch_all`
    main_thread: OnceLock<ThreadId>,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    main_dispatched: AtomicU64,
    main_panicked: AtomicU64,
    work_completed: AtomicU64,
    work_retried: AtomicU64,
    work_abandoned: AtomicU64,
    work_panicked: AtomicU64,
    workers_spawned: AtomicU64,
}

/// Cross-thread work dispatcher
///
/// Owned by the host application and shared with producer threads via
/// `Arc`. The host must call [`Dispatcher::dispatch_all`] once per tick on
/// its designated main thread; the first caller defines which thread that
/// is.
pub struct Dispatcher {
    shared: Arc<Shared>,
    /// Handle of the single background worker, once spawned
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("main_pending", &self.main_pending())
            .field("work_pending", &self.work_pending())
            .field("worker_started", &self.worker_started())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Dispatcher {
    /// Create a new dispatcher. No threads are spawned until background
    /// work is observed by `dispatch_all`.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                main_queue: MainQueue::new(),
                work_queue: WorkQueue::new(),
                main_thread: OnceLock::new(),
                counters: Counters::default(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Schedule a callback on the main thread.
    ///
    /// Callable from any thread. When called from the recorded main thread
    /// the callback runs synchronously and immediately, bypassing the
    /// queue; otherwise it is queued for the next `dispatch_all`. Dropped
    /// silently after shutdown.
    pub fn schedule_main<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.shared.work_queue.is_shut_down() {
            return;
        }

        if self.shared.main_thread.get() == Some(&thread::current().id()) {
            // Already on the main thread. Runs in the caller's context, so
            // a panic here propagates to the caller rather than being
            // swallowed.
            callback();
            self.shared
                .counters
                .main_dispatched
                .fetch_add(1, Ordering::Relaxed);
        } else {
            self.shared.main_queue.push(Box::new(callback));
        }
    }

    /// Schedule a retryable unit of background work.
    ///
    /// `work_fn` returns `true` when done; returning `false` re-enqueues it
    /// at the tail of the work queue for a later attempt. Callable from any
    /// thread; dropped silently after shutdown.
    pub fn schedule_work<F>(&self, work_fn: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if self.shared.work_queue.is_shut_down() {
            return;
        }

        self.shared.work_queue.push(WorkItem::new(work_fn));
    }

    /// Dispatch all queued main-thread callbacks.
    ///
    /// Must be called periodically (e.g. once per frame) on the host's
    /// designated thread. Drains a snapshot of the main queue in FIFO
    /// order, so callbacks queued by other threads during the drain land in
    /// the next pass and the call stays bounded. Spawns the background
    /// worker the first time the work queue is observed non-empty.
    pub fn dispatch_all(&self) {
        if self.shared.work_queue.is_shut_down() {
            return;
        }

        self.shared
            .main_thread
            .get_or_init(|| thread::current().id());

        for action in self.shared.main_queue.take_all() {
            match panic::catch_unwind(AssertUnwindSafe(action)) {
                Ok(()) => {
                    self.shared
                        .counters
                        .main_dispatched
                        .fetch_add(1, Ordering::Relaxed);
                }
                Err(payload) => {
                    self.shared
                        .counters
                        .main_panicked
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::error!(
                        panic = panic_message(payload.as_ref()),
                        "main-thread callback panicked; continuing drain"
                    );
                }
            }
        }

        self.maybe_spawn_worker();
    }

    /// Shut down the dispatcher.
    ///
    /// Runs one final `dispatch_all`, then stops accepting new callbacks
    /// and work, wakes the worker and joins it. Work items already queued
    /// are still executed, but an item reporting incomplete during shutdown
    /// is discarded instead of re-enqueued. Should be called from the main
    /// thread. Idempotent.
    pub fn shutdown(&self) {
        if !self.shared.work_queue.is_shut_down() {
            self.dispatch_all();
            tracing::info!("dispatcher shutting down");
            self.shared.work_queue.shutdown();
        }

        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Number of callbacks waiting for the next `dispatch_all`
    pub fn main_pending(&self) -> usize {
        self.shared.main_queue.len()
    }

    /// Number of queued work items
    pub fn work_pending(&self) -> usize {
        self.shared.work_queue.len()
    }

    /// Whether the background worker thread has been spawned
    pub fn worker_started(&self) -> bool {
        self.worker.lock().unwrap().is_some()
    }

    /// Whether `shutdown` has been requested
    pub fn is_shut_down(&self) -> bool {
        self.shared.work_queue.is_shut_down()
    }

    /// Snapshot of dispatcher counters and queue depths
    pub fn stats(&self) -> DispatcherStats {
        let counters = &self.shared.counters;
        DispatcherStats {
            main_dispatched: counters.main_dispatched.load(Ordering::Relaxed),
            main_panicked: counters.main_panicked.load(Ordering::Relaxed),
            work_completed: counters.work_completed.load(Ordering::Relaxed),
            work_retried: counters.work_retried.load(Ordering::Relaxed),
            work_abandoned: counters.work_abandoned.load(Ordering::Relaxed),
            work_panicked: counters.work_panicked.load(Ordering::Relaxed),
            main_pending: self.main_pending(),
            work_pending: self.work_pending(),
            workers_spawned: counters.workers_spawned.load(Ordering::Relaxed),
        }
    }

    /// Spawn the worker thread if work is queued and none exists yet
    fn maybe_spawn_worker(&self) {
        if self.shared.work_queue.is_empty() {
            return;
        }

        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(self.shared.config.worker_thread_name.clone())
            .spawn(move || run_worker(shared))
            .expect("Failed to spawn dispatcher worker thread");

        *worker = Some(handle);
        self.shared
            .counters
            .workers_spawned
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Background worker thread body
fn run_worker(shared: Arc<Shared>) {
    tracing::debug!("dispatcher worker thread started");

    let idle = shared.config.idle_poll_interval;
    while let Some(mut item) = shared.work_queue.next_item(idle) {
        item.attempts += 1;

        match panic::catch_unwind(AssertUnwindSafe(|| (item.run)())) {
            Ok(true) => {
                shared
                    .counters
                    .work_completed
                    .fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                if shared.work_queue.is_shut_down() {
                    shared
                        .counters
                        .work_abandoned
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("discarding incomplete work item during shutdown");
                } else if shared
                    .config
                    .max_attempts
                    .is_some_and(|max| item.attempts >= max)
                {
                    shared
                        .counters
                        .work_abandoned
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        attempts = item.attempts,
                        "abandoning work item: retry budget exhausted"
                    );
                } else {
                    shared
                        .counters
                        .work_retried
                        .fetch_add(1, Ordering::Relaxed);
                    shared.work_queue.push(item);
                }
            }
            Err(payload) => {
                shared
                    .counters
                    .work_panicked
                    .fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    panic = panic_message(payload.as_ref()),
                    "work item panicked; dropping it"
                );
            }
        }
    }

    tracing::debug!("dispatcher worker thread exiting");
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Dispatcher statistics
#[derive(Debug, Clone, Copy)]
pub struct DispatcherStats {
    /// Main callbacks executed (queued drains plus inline fast path)
    pub main_dispatched: u64,
    /// Main callbacks that panicked during a drain
    pub main_panicked: u64,
    /// Work items that reported complete
    pub work_completed: u64,
    /// Re-enqueues of incomplete work items
    pub work_retried: u64,
    /// Work items dropped incomplete (retry budget or shutdown)
    pub work_abandoned: u64,
    /// Work items that panicked
    pub work_panicked: u64,
    /// Callbacks currently queued for the main thread
    pub main_pending: usize,
    /// Work items currently queued
    pub work_pending: usize,
    /// Worker threads spawned over the dispatcher's lifetime (at most 1)
    pub workers_spawned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_empty_dispatch_is_noop() {
        let dispatcher = Dispatcher::default();

        dispatcher.dispatch_all();
        dispatcher.dispatch_all();

        assert!(!dispatcher.worker_started());
        let stats = dispatcher.stats();
        assert_eq!(stats.main_dispatched, 0);
        assert_eq!(stats.workers_spawned, 0);
    }

    #[test]
    fn test_schedule_main_queues_before_identity_recorded() {
        let dispatcher = Dispatcher::default();

        // No dispatch_all has run yet, so even the current thread is not
        // recognized as the main thread and the callback must be queued.
        let sent = Arc::new(AtomicU32::new(0));
        let sent_clone = Arc::clone(&sent);
        dispatcher.schedule_main(move || {
            sent_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(dispatcher.main_pending(), 1);
        assert_eq!(sent.load(Ordering::SeqCst), 0);

        dispatcher.dispatch_all();
        assert_eq!(sent.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.main_pending(), 0);
    }

    #[test]
    fn test_schedule_main_inline_on_main_thread() {
        let dispatcher = Dispatcher::default();
        dispatcher.dispatch_all(); // records this thread as main

        let ran = Arc::new(AtomicU32::new(0));
        let ran_clone = Arc::clone(&ran);
        dispatcher.schedule_main(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Executed synchronously, never queued.
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.main_pending(), 0);
    }

    #[test]
    fn test_main_drain_is_fifo() {
        let dispatcher = Dispatcher::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let order = Arc::clone(&order);
            dispatcher.schedule_main(move || {
                order.lock().unwrap().push(i);
            });
        }

        dispatcher.dispatch_all();
        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_main_callback_panic_does_not_stop_drain() {
        let dispatcher = Dispatcher::default();
        let ran = Arc::new(AtomicU32::new(0));

        dispatcher.schedule_main(|| panic!("boom"));
        let ran_clone = Arc::clone(&ran);
        dispatcher.schedule_main(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch_all();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        let stats = dispatcher.stats();
        assert_eq!(stats.main_panicked, 1);
        assert_eq!(stats.main_dispatched, 1);
    }

    #[test]
    fn test_schedule_after_shutdown_is_dropped() {
        let dispatcher = Dispatcher::default();
        dispatcher.shutdown();

        let ran = Arc::new(AtomicU32::new(0));
        let ran_clone = Arc::clone(&ran);
        dispatcher.schedule_main(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.schedule_work(|| true);

        dispatcher.dispatch_all();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.main_pending(), 0);
        assert_eq!(dispatcher.work_pending(), 0);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let dispatcher = Dispatcher::default();
        dispatcher.schedule_work(|| true);
        dispatcher.shutdown();
        dispatcher.shutdown();
        assert!(dispatcher.is_shut_down());
    }
}
