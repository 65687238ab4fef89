//! Periodic reconciliation of executions stuck in `Started`.
//!
//! A run whose workflow died between start and seal would otherwise stay
//! `Started` forever. The watchdog sweeps the ledger on a fixed interval and
//! seals anything older than `max_age` as `Failed`.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{debug, error, info};

use crate::ledger::ExecutionLedger;

/// Handle to a running sweep thread. Dropping it stops the thread.
pub struct Watchdog {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn spawn(ledger: Arc<ExecutionLedger>, interval: StdDuration, max_age: Duration) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();

        let worker = thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, max_age_secs = max_age.num_seconds(), "watchdog started");
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => match ledger.sweep_stale(max_age) {
                        Ok(swept) => debug!(swept = swept.len(), "watchdog sweep finished"),
                        Err(err) => error!(error = %err, "watchdog sweep failed"),
                    },
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("watchdog stopped");
        });

        Self {
            stop: Some(stop),
            worker: Some(worker),
        }
    }

    /// Stop the sweep thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The worker may already be gone; either way it will not sweep again.
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("watchdog thread panicked");
            }
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration as StdDuration, Instant};

    use chrono::Duration;

    use attest_contracts::{audit::Actor, execution::ExecutionStatus};

    use super::Watchdog;
    use crate::test_support::harness;

    #[test]
    fn watchdog_fails_stale_executions_in_background() {
        let h = harness();
        let execution = h.ledger.start(&Actor::executor("crashed-runner"), None).unwrap();

        let watchdog = Watchdog::spawn(h.ledger.clone(), StdDuration::from_millis(5), Duration::seconds(-1));

        let deadline = Instant::now() + StdDuration::from_secs(5);
        while h.ledger.get(execution.id).unwrap().status == ExecutionStatus::Started {
            assert!(Instant::now() < deadline, "watchdog never swept the execution");
            thread::sleep(StdDuration::from_millis(5));
        }
        watchdog.stop();

        assert_eq!(h.ledger.get(execution.id).unwrap().status, ExecutionStatus::Failed);
    }

    #[test]
    fn fresh_executions_survive_the_sweep() {
        let h = harness();
        let execution = h.ledger.start(&Actor::executor("live-runner"), None).unwrap();

        let watchdog = Watchdog::spawn(h.ledger.clone(), StdDuration::from_millis(1), Duration::hours(1));
        thread::sleep(StdDuration::from_millis(20));
        drop(watchdog);

        assert_eq!(h.ledger.get(execution.id).unwrap().status, ExecutionStatus::Started);
    }
}
