//! Periodic keep-alive scheduling.
//!
//! While the link is connected, a dedicated task ticks at a fixed interval
//! and enqueues a keep-alive command into the driver's queue. The task owns
//! nothing but the queue sender: the actual write happens inside the driver
//! task, serialized with every other operation on the link.
//!
//! Cancellation is synchronous (`JoinHandle::abort`), and the driver
//! additionally drops keep-alive commands in any state other than
//! `Connected`, so a tick already sitting in the queue when teardown starts
//! is a no-op.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::driver::Command;

/// Default keep-alive interval.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// Handle to a running heartbeat task.
#[derive(Debug)]
pub(crate) struct Heartbeat {
    task: JoinHandle<()>,
}

impl Heartbeat {
    /// Spawn a heartbeat that ticks every `period`, starting one period
    /// from now.
    pub(crate) fn spawn(tx: mpsc::Sender<Command>, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.send(Command::Keepalive).await.is_err() {
                    // Driver gone, nothing left to keep alive.
                    break;
                }
            }
        });

        Self { task }
    }

    /// Stop the heartbeat immediately.
    pub(crate) fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}
