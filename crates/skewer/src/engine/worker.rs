//! Lifecycle handle for the background dispatch worker.

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use tokio::{task::JoinHandle, sync::Notify};
use tracing::debug;

/// A handle for managing the background task that hands closed batches to the predictor.
///
/// The task is given a running flag and a notifier when it is spawned. Stopping the handle
/// clears the flag and wakes the task so it can observe it.
///
/// # Example
///
/// ```ignore
/// let worker = BatchWorkerHandle::new(|running, notifier| {
///     tokio::spawn(async move {
///         while running.load(Ordering::SeqCst) {
///             notifier.notified().await;
///         }
///     })
/// });
/// ```
pub(crate) struct BatchWorkerHandle {
    /// Flag indicating whether the background task should continue running
    running: Arc<AtomicBool>,

    /// Handle to the spawned background task, becomes `None` after shutdown is initiated
    handle: Option<JoinHandle<()>>,

    /// Notification mechanism to wake up the background task
    notifier: Arc<Notify>,
}

impl BatchWorkerHandle {
    /// Creates a new `BatchWorkerHandle` by spawning a background task.
    ///
    /// # Parameters
    ///
    /// * `task` - A function that takes a running flag and a notifier, and returns a `JoinHandle`.
    ///   This function is responsible for creating and spawning the actual background task.
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>, Arc<Notify>) -> JoinHandle<()>,
    {
        let running = Arc::new(AtomicBool::new(true));
        let notifier = Arc::new(Notify::new());
        let handle = task(running.clone(), notifier.clone());

        Self {
            running,
            handle: Some(handle),
            notifier,
        }
    }

    /// Returns whether the task has been asked to keep running.
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the background task to stop.
    ///
    /// Safe to call repeatedly, and outside of a runtime: the task handle is only reaped when
    /// a runtime is available to do so.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.notifier.notify_one();

        if let Some(handle) = self.handle.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        let _ = handle.await;
                    });
                }
                Err(_) => debug!("no runtime available to reap dispatch worker"),
            }
        }
    }
}

impl Drop for BatchWorkerHandle {
    /// Ensures the background task is properly terminated when the handle is dropped.
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn draining_worker(stopped: Arc<AtomicBool>) -> (BatchWorkerHandle, mpsc::UnboundedSender<u32>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
        let worker = BatchWorkerHandle::new(move |running, notifier| {
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        Some(_) = rx.recv() => continue,
                        _ = notifier.notified() => {
                            if !running.load(Ordering::SeqCst) {
                                break;
                            }
                        }
                    }
                }
                stopped.store(true, Ordering::SeqCst);
            })
        });
        (worker, tx)
    }

    #[tokio::test]
    async fn test_new_worker_is_running() {
        let (worker, _tx) = draining_worker(Arc::new(AtomicBool::new(false)));
        assert!(worker.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_wakes_idle_task() {
        let stopped = Arc::new(AtomicBool::new(false));
        let (mut worker, tx) = draining_worker(stopped.clone());
        tx.send(1).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        worker.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!worker.is_running());
        assert!(worker.handle.is_none());
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_drop_stops_task() {
        let stopped = Arc::new(AtomicBool::new(false));
        {
            let (_worker, _tx) = draining_worker(stopped.clone());
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (mut worker, _tx) = draining_worker(Arc::new(AtomicBool::new(false)));
        worker.shutdown();
        worker.shutdown();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_shutdown_outside_runtime_does_not_panic() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let mut worker = {
            let _guard = runtime.enter();
            BatchWorkerHandle::new(|_running, _notifier| tokio::spawn(async {}))
        };
        worker.shutdown();
        assert!(worker.handle.is_none());
    }
}
