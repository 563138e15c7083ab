use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::DEFAULT_WORKERS;

/// Bounded task pool. At most `workers` jobs run at once; the rest wait on a permit.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Jobs not yet finished stop at their next await point and yield nothing.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run `task` over every job and return the outputs in job order.
    ///
    /// `on_complete` fires once per job that finished, including jobs that
    /// panicked. A panic is logged with the job's label and its output is lost;
    /// the other jobs are unaffected.
    pub async fn map<J, T, F, Fut>(&self, jobs: Vec<J>, task: F, mut on_complete: impl FnMut()) -> Vec<T>
    where
        J: Display + Send + 'static,
        T: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let task = Arc::new(task);
        let mut set = JoinSet::new();
        let mut labels = HashMap::new();

        for (index, job) in jobs.into_iter().enumerate() {
            let label = job.to_string();
            let task = task.clone();
            let semaphore = self.semaphore.clone();
            let cancel = self.cancel.clone();

            let handle = set.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit.ok()?,
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    output = (*task)(job) => Some((index, output)),
                }
            });
            labels.insert(handle.id(), label);
        }

        let mut outputs = Vec::with_capacity(labels.len());
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((id, Some(output))) => {
                    labels.remove(&id);
                    outputs.push(output);
                    on_complete();
                }
                Ok((id, None)) => {
                    if let Some(label) = labels.remove(&id) {
                        debug!("Cancelled before finishing {}", label);
                    }
                }
                Err(e) => {
                    let label = labels.remove(&e.id()).unwrap_or_default();
                    if e.is_panic() {
                        error!("Worker for {} panicked", label);
                        on_complete();
                    } else {
                        debug!("Worker for {} aborted: {}", label, e);
                    }
                }
            }
        }

        outputs.sort_by_key(|(index, _)| *index);
        outputs.into_iter().map(|(_, output)| output).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_outputs_in_job_order() {
        let pool = WorkerPool::new(3);
        let mut completed = 0;
        let out = pool
            .map(
                (1..=6u64).collect(),
                |n: u64| async move {
                    tokio::time::sleep(Duration::from_millis(30 - n * 5)).await;
                    n * 10
                },
                || completed += 1,
            )
            .await;
        assert_eq!(out, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(completed, 6);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (r, p) = (running.clone(), peak.clone());
        pool.map(
            (0..8).collect::<Vec<u32>>(),
            move |_| {
                let (running, peak) = (r.clone(), p.clone());
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            },
            || {},
        )
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panic_does_not_stop_siblings() {
        let pool = WorkerPool::new(3);
        let mut completed = 0;
        let out = pool
            .map(
                vec!["a", "boom", "c"],
                |job: &'static str| async move {
                    if job == "boom" {
                        panic!("worker failure");
                    }
                    job.to_uppercase()
                },
                || completed += 1,
            )
            .await;
        assert_eq!(out, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(completed, 3);
    }

    #[tokio::test]
    async fn test_cancelled_pool_yields_nothing() {
        let pool = WorkerPool::new(1);
        pool.cancel();
        let out = pool.map(vec![1, 2, 3], |n| async move { n }, || {}).await;
        assert!(out.is_empty());
        assert!(pool.cancel_token().is_cancelled());
    }
}
