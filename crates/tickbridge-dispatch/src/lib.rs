//! tickbridge dispatch
//!
//! Cross-thread work dispatcher for frame-ticked hosts.
//!
//! Bridges threads that produce work (e.g. a native callback thread) and a
//! single main thread that is driven by an external per-frame tick:
//! - A main action queue of callbacks, drained once per tick on the main
//!   thread via [`Dispatcher::dispatch_all`].
//! - An itemized work queue of retryable tasks, executed serially on one
//!   lazily-spawned background worker thread.
//!
//! # Example
//! ```rust
//! use tickbridge_dispatch::Dispatcher;
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(Dispatcher::default());
//!
//! // Record the main thread identity and drain anything already queued.
//! dispatcher.dispatch_all();
//!
//! let handle = Arc::clone(&dispatcher);
//! std::thread::spawn(move || {
//!     handle.schedule_main(|| println!("runs on the main thread"));
//! })
//! .join()
//! .unwrap();
//!
//! dispatcher.dispatch_all();
//! dispatcher.shutdown();
//! ```

mod config;
mod dispatcher;
mod queue;

pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, DispatcherStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
