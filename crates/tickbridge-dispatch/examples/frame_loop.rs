//! Example: A host frame loop driving the dispatcher
//!
//! A producer thread stands in for a native callback thread: it generates
//! pose updates and publishes the ones that actually changed to the frame
//! loop via `schedule_main`. A retryable background task runs alongside on
//! the worker thread.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tickbridge_dispatch::Dispatcher;
use tickbridge_pose::{EpsilonEq, Pose, Vec3};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let dispatcher = Arc::new(Dispatcher::default());

    // A background task that needs a few attempts to finish.
    let mut attempts = 0;
    dispatcher.schedule_work(move || {
        attempts += 1;
        tracing::info!(attempts, "background upload attempt");
        attempts >= 3
    });

    // Producer thread: publish pose updates, skipping unchanged ones.
    let producer = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || {
            let mut last_sent = Pose::default();
            for i in 0..30u32 {
                let mut pose = last_sent;
                if i % 3 == 0 {
                    pose.position = Vec3::new(i as f32 * 0.01, 0.0, 0.0);
                }

                if pose.epsilon_eq(&last_sent) {
                    continue; // nothing moved, skip the update
                }
                last_sent = pose;

                dispatcher.schedule_main(move || {
                    tracing::info!(x = pose.position.x as f64, "applied pose update");
                });
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    // Host frame loop at roughly 60 Hz.
    for _frame in 0..20 {
        dispatcher.dispatch_all();
        thread::sleep(Duration::from_millis(16));
    }

    producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    dispatcher.shutdown();

    let stats = dispatcher.stats();
    tracing::info!(
        main_dispatched = stats.main_dispatched,
        work_completed = stats.work_completed,
        work_retried = stats.work_retried,
        "frame loop done"
    );
    Ok(())
}
