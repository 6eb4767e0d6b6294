//! Leak checks.
//!
//! The hub never spawns tasks of its own, so any task still alive after a
//! test's workers have finished was leaked by the code under test. Checks
//! poll for a while before failing because aborted tasks are reaped
//! asynchronously by the runtime.

use signaling_hub::client::Client;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// How long leak checks wait for tasks to wind down.
pub const LEAK_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Number of tasks alive when the baseline was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskBaseline(usize);

impl TaskBaseline {
    /// Record the current number of alive tasks on this runtime.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn capture() -> Self {
        Self(alive_tasks())
    }

    /// Alive task count at capture time.
    #[must_use]
    pub fn count(self) -> usize {
        self.0
    }
}

fn alive_tasks() -> usize {
    Handle::current().metrics().num_alive_tasks()
}

/// Panic if more tasks are alive than at `baseline` once [`LEAK_CHECK_TIMEOUT`] elapses.
pub async fn assert_no_task_leak(baseline: TaskBaseline) {
    let deadline = Instant::now() + LEAK_CHECK_TIMEOUT;

    loop {
        let alive = alive_tasks();
        if alive <= baseline.0 {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "task leak: {alive} tasks alive, baseline was {}",
            baseline.0
        );
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Panic if `client` still holds live subscriptions.
pub fn assert_no_subscription_leak(client: &Client) {
    let count = client.subscription_count();
    assert_eq!(
        count,
        0,
        "client {} still holds {count} subscriptions",
        client.id()
    );
}
