/*!
 * Worker Handles
 *
 * A work unit runs on its own OS thread and reports through a single-slot
 * channel written exactly once. The handle is the supervisor's end: poll it,
 * join it, or detach it.
 *
 * Detaching leaks the thread. There is no way to interrupt arbitrary work
 * safely, so an abandoned worker runs to completion on its own and its result
 * is dropped. Worker threads never keep the process alive at exit.
 */

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How a work unit ended
#[derive(Debug)]
pub enum Outcome<T, E> {
    Returned(T),
    Failed(E),
    Panicked(String),
}

impl<T, E> Outcome<T, E> {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Returned(_))
    }
}

/// Supervisor's handle on one worker thread
pub struct WorkerHandle<T, E> {
    name: String,
    slot: flume::Receiver<Outcome<T, E>>,
    thread: Option<JoinHandle<()>>,
    spawned_at: Instant,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<T, E> WorkerHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Start `work` on a new named thread
    pub fn spawn<F>(name: impl Into<String>, work: F) -> std::io::Result<Self>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let name = name.into();
        let (tx, slot) = flume::bounded(1);

        let thread = std::thread::Builder::new().name(name.clone()).spawn(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(Ok(value)) => Outcome::Returned(value),
                Ok(Err(e)) => Outcome::Failed(e),
                Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
            };
            // Receiver is gone once the supervisor detached and moved on
            let _ = tx.send(outcome);
        })?;

        debug!(worker = %name, "worker started");

        Ok(Self {
            name,
            slot,
            thread: Some(thread),
            spawned_at: Instant::now(),
        })
    }

    /// Wait at most `timeout` for the outcome
    ///
    /// `None` means still running. A zero timeout is a non-blocking check.
    pub fn wait_for(&self, timeout: Duration) -> Option<Outcome<T, E>> {
        match self.slot.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(flume::RecvTimeoutError::Timeout) => None,
            Err(flume::RecvTimeoutError::Disconnected) => Some(self.lost()),
        }
    }

    /// Async flavour of `wait_for`
    pub async fn wait_for_async(&self, timeout: Duration) -> Option<Outcome<T, E>> {
        match tokio::time::timeout(timeout, self.slot.recv_async()).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(flume::RecvError::Disconnected)) => Some(self.lost()),
            Err(_) => None,
        }
    }

    /// Non-blocking check
    pub fn try_take(&self) -> Option<Outcome<T, E>> {
        match self.slot.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => Some(self.lost()),
        }
    }

    // Sender dropped without sending; only reachable if the thread died
    // outside catch_unwind
    fn lost(&self) -> Outcome<T, E> {
        Outcome::Panicked(format!("worker {} exited without reporting", self.name))
    }

    /// Block until the worker finishes
    pub fn join(mut self) -> Option<Outcome<T, E>> {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                return Some(self.lost());
            }
        }
        self.try_take()
    }

    /// Abandon the worker; its thread keeps running and is leaked
    pub fn detach(mut self) {
        if let Some(thread) = self.thread.take() {
            if !thread.is_finished() {
                warn!(
                    worker = %self.name,
                    running_ms = self.spawned_at.elapsed().as_millis() as u64,
                    "detaching worker still running"
                );
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.spawned_at.elapsed()
    }
}

impl<T, E> Drop for WorkerHandle<T, E> {
    fn drop(&mut self) {
        // Dropping the JoinHandle detaches the thread
        if let Some(thread) = self.thread.take() {
            if !thread.is_finished() {
                debug!(worker = %self.name, "worker handle dropped while running");
            }
        }
    }
}
