//! Interval job runner.
//!
//! Each job key owns one timer loop. A job never overlaps itself: a tick
//! (or manual trigger) arriving while the previous run is still in flight
//! is skipped, not queued. Every run is tracked so shutdown can wait for
//! in-flight work to finish.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

type JobFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct Job {
    interval: Duration,
    run: JobFn,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
}

/// Resets the in-flight flag even if the job panics.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn try_spawn(
    tasks: &TaskTracker,
    key: &str,
    run: &JobFn,
    running: &Arc<AtomicBool>,
) -> Option<JoinHandle<()>> {
    if running
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        log::debug!("Job {key} still running, skipped");
        return None;
    }
    let guard = RunningGuard(Arc::clone(running));
    let fut = run();
    Some(tasks.spawn(async move {
        let _guard = guard;
        fut.await;
    }))
}

#[derive(Default)]
pub struct Scheduler {
    jobs: Mutex<HashMap<String, Job>>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job that first runs one `interval` from now.
    ///
    /// Returns `false` if the key is taken or the scheduler is shut down.
    pub fn add_job<F, Fut>(&self, key: &str, interval: Duration, job: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            log::warn!("Scheduler is shut down, job {key} not added");
            return false;
        }
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.contains_key(key) {
            return false;
        }
        let run: JobFn = Arc::new(move || job().boxed());
        let running = Arc::new(AtomicBool::new(false));
        jobs.insert(key.to_string(), self.spawn_loop(key, interval, run, running));
        log::info!("Job {key} scheduled every {}s", interval.as_secs());
        true
    }

    /// Replaces a job (or adds it).
    ///
    /// The replacement shares the old job's in-flight flag, so a run of the
    /// old job that is still going blocks the new one like its own would.
    pub fn reschedule<F, Fut>(&self, key: &str, interval: Duration, job: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            log::warn!("Scheduler is shut down, job {key} not rescheduled");
            return false;
        }
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let running = match jobs.remove(key) {
            Some(old) => {
                old.cancel.cancel();
                old.running
            }
            None => Arc::new(AtomicBool::new(false)),
        };
        let run: JobFn = Arc::new(move || job().boxed());
        jobs.insert(key.to_string(), self.spawn_loop(key, interval, run, running));
        log::info!("Job {key} rescheduled every {}s", interval.as_secs());
        true
    }

    pub fn remove_job(&self, key: &str) -> bool {
        let removed = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        match removed {
            Some(job) => {
                job.cancel.cancel();
                log::info!("Job {key} removed");
                true
            }
            None => false,
        }
    }

    /// Runs a job now, under the same no-overlap guard as its timer.
    ///
    /// `None` when the key is unknown or a run is already in flight.
    pub fn trigger(&self, key: &str) -> Option<JoinHandle<()>> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get(key)?;
        try_spawn(&self.tasks, key, &job.run, &job.running)
    }

    pub fn has_job(&self, key: &str) -> bool {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn interval_of(&self, key: &str) -> Option<Duration> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|job| job.interval)
    }

    pub fn job_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Stops every timer loop; no job can be added afterwards.
    ///
    /// Runs already in flight keep going, see [`Scheduler::wait_idle`].
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.tasks.close();
        log::info!("Scheduler stopped");
    }

    /// Waits up to `limit` for in-flight runs after [`Scheduler::shutdown`].
    ///
    /// Returns `false` if some run was still going when the limit passed.
    pub async fn wait_idle(&self, limit: Duration) -> bool {
        if tokio::time::timeout(limit, self.tasks.wait()).await.is_ok() {
            return true;
        }
        log::warn!(
            "{} job run(s) still in flight after {}s",
            self.tasks.len(),
            limit.as_secs()
        );
        false
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn spawn_loop(
        &self,
        key: &str,
        interval: Duration,
        run: JobFn,
        running: Arc<AtomicBool>,
    ) -> Job {
        let cancel = self.shutdown.child_token();
        let tasks = self.tasks.clone();
        let job = Job {
            interval,
            run: Arc::clone(&run),
            running: Arc::clone(&running),
            cancel: cancel.clone(),
        };

        let key = key.to_string();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        try_spawn(&tasks, &key, &run, &running);
                    }
                }
            }
            log::debug!("Job {key} loop exited");
        });
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_job(count: &Arc<AtomicUsize>, work: Duration) -> impl Fn() -> BoxFuture<'static, ()> + Send + Sync {
        let count = Arc::clone(count);
        move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(work).await;
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_on_every_interval() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        assert!(scheduler.add_job("sync", Duration::from_secs(60), counter_job(&count, Duration::ZERO)));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(126)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_ticks_are_skipped() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        // Runs take 150s on a 60s interval: starts at 60s and 240s only.
        scheduler.add_job("slow", Duration::from_secs(60), counter_job(&count, Duration::from_secs(150)));

        tokio::time::sleep(Duration::from_secs(400)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_keys_are_ignored_and_reschedule_replaces() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        assert!(scheduler.add_job("ddns_update_1", Duration::from_secs(60), counter_job(&count, Duration::ZERO)));
        assert!(!scheduler.add_job("ddns_update_1", Duration::from_secs(10), counter_job(&count, Duration::ZERO)));
        assert_eq!(scheduler.interval_of("ddns_update_1"), Some(Duration::from_secs(60)));

        assert!(scheduler.reschedule("ddns_update_1", Duration::from_secs(300), counter_job(&count, Duration::ZERO)));
        assert_eq!(scheduler.job_keys(), vec!["ddns_update_1".to_string()]);

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_respects_the_guard() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        scheduler.add_job("sync", Duration::from_secs(3600), counter_job(&count, Duration::from_secs(10)));

        let first = scheduler.trigger("sync").unwrap();
        tokio::task::yield_now().await;
        assert!(scheduler.trigger("sync").is_none());
        first.await.unwrap();

        scheduler.trigger("sync").unwrap().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(scheduler.trigger("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_keeps_the_in_flight_guard() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        scheduler.add_job("ddns_update_1", Duration::from_secs(3600), counter_job(&count, Duration::from_secs(30)));

        let old_run = scheduler.trigger("ddns_update_1").unwrap();
        tokio::task::yield_now().await;
        assert!(scheduler.reschedule("ddns_update_1", Duration::from_secs(3600), counter_job(&count, Duration::ZERO)));
        assert!(scheduler.trigger("ddns_update_1").is_none());

        old_run.await.unwrap();
        scheduler.trigger("ddns_update_1").unwrap().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_idle_lets_in_flight_runs_finish() {
        let scheduler = Scheduler::new();
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        scheduler.add_job("check_certificates", Duration::from_secs(3600), move || {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                flag.store(true, Ordering::SeqCst);
            }
        });

        drop(scheduler.trigger("check_certificates").unwrap());
        tokio::task::yield_now().await;
        scheduler.shutdown();
        assert!(scheduler.wait_idle(Duration::from_secs(10)).await);
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_idle_is_bounded() {
        let scheduler = Scheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        scheduler.add_job("stuck", Duration::from_secs(3600), counter_job(&count, Duration::from_secs(600)));

        drop(scheduler.trigger("stuck").unwrap());
        tokio::task::yield_now().await;
        scheduler.shutdown();
        assert!(!scheduler.wait_idle(Duration::from_secs(3)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_and_shutdown_stop_loops() {
        let scheduler = Scheduler::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        scheduler.add_job("a", Duration::from_secs(60), counter_job(&a, Duration::ZERO));
        scheduler.add_job("b", Duration::from_secs(60), counter_job(&b, Duration::ZERO));

        assert!(scheduler.remove_job("a"));
        assert!(!scheduler.remove_job("a"));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert!(!scheduler.add_job("c", Duration::from_secs(60), counter_job(&a, Duration::ZERO)));
        assert!(scheduler.job_keys().is_empty());
    }
}
