//! Bounded worker pool for fan-out task execution
//!
//! The pool dispatches each task independently: a failing or panicking task
//! is logged and dropped from the results, never aborting its siblings.
//! Results come back in completion order; callers that need submission order
//! must carry a sequence key in their result type.

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Sleeps a uniform random duration drawn from `range` (seconds)
///
/// This is the per-worker throttle applied immediately before each request;
/// it is per-task, not global, so throughput is concurrency / average delay.
pub async fn random_delay(range: (f64, f64)) {
    let (min, max) = range;
    if max <= 0.0 {
        return;
    }
    let secs = rand::thread_rng().gen_range(min..=max);
    tokio::time::sleep(Duration::from_secs_f64(secs.max(0.0))).await;
}

/// Runs every task through `worker` on a pool of `concurrency` workers
///
/// Each worker sleeps a random delay from `delay_range` before its work.
/// `worker` returns `Ok(Some(result))` to contribute a result, `Ok(None)` to
/// contribute nothing, and `Err` for a failure that should be logged and
/// isolated.
///
/// # Arguments
///
/// * `tasks` - The task set to execute
/// * `worker` - Async worker invoked once per task
/// * `concurrency` - Maximum number of tasks in flight (minimum 1)
/// * `delay_range` - Per-task random delay range in seconds
///
/// # Returns
///
/// Results of the non-failing tasks, in completion order.
pub async fn run_tasks<T, R, F, Fut>(
    tasks: Vec<T>,
    worker: F,
    concurrency: usize,
    delay_range: (f64, f64),
) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<R>>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set: JoinSet<anyhow::Result<Option<R>>> = JoinSet::new();

    for task in tasks {
        let semaphore = Arc::clone(&semaphore);
        let worker = worker.clone();
        join_set.spawn(async move {
            // The semaphore is never closed while the pool runs
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Ok(None);
            };
            random_delay(delay_range).await;
            worker(task).await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok(Some(result))) => results.push(result),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::error!("Task failed: {:#}", e),
            Err(e) => tracing::error!("Task panicked: {}", e),
        }
    }

    results
}
