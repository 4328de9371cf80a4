//! Work that outlives a response
//!
//! The router hands each request's `wait_until` drain to [`BackgroundTasks`]
//! so shutdown can wait for it instead of dropping it.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::task::JoinSet;

/// Tracked set of detached host tasks
#[derive(Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    /// Spawn `future` and track it until [`shutdown`](Self::shutdown).
    ///
    /// Tasks that already finished are reaped first.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock();
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                tracing::warn!("Background task failed: {}", e);
            }
        }
        tasks.spawn(future);
    }

    /// Number of tasks spawned and not yet reaped
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Wait for every tracked task. Returns how many were awaited.
    pub async fn shutdown(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.lock());
        let mut awaited = 0;
        while let Some(result) = tasks.join_next().await {
            awaited += 1;
            if let Err(e) = result {
                tracing::warn!("Background task failed: {}", e);
            }
        }
        awaited
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_pending_work() {
        let tasks = BackgroundTasks::default();
        let done = Arc::new(AtomicUsize::new(0));

        for secs in [1, 5, 10] {
            let done = Arc::clone(&done);
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(tasks.len(), 3);

        assert_eq!(tasks.shutdown().await, 3);
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.len(), 0);
    }

    #[tokio::test]
    async fn test_panicked_task_does_not_stop_shutdown() {
        let tasks = BackgroundTasks::default();
        tasks.spawn(async { panic!("background work failed") });
        tasks.spawn(async {});
        assert_eq!(tasks.shutdown().await, 2);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_reaped() {
        let tasks = BackgroundTasks::default();
        tasks.spawn(async {});
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        tasks.spawn(async {});
        assert_eq!(tasks.len(), 1);
        tasks.shutdown().await;
    }
}
