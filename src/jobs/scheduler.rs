use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jiff::Timestamp;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};
use uuid::Uuid;
use validator::Validate;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::executor::JobRunExecutor;
use crate::jobs::models::{JobRun, JobSpec, Schedule, parse_run_at};
use crate::jobs::registry::RunnerRegistry;
use crate::jobs::tracker::{InFlightTracker, TrackedState};
use crate::settlement::{CompletionNotifier, TriggerSource};

/// What a one-shot trigger did with a run
#[derive(Debug)]
pub enum RunDisposition {
    /// Not due yet; nothing executed or tracked
    Deferred { due_at: Timestamp },
    /// Executed to a final state and handed to the notifier
    Executed(JobRun),
}

/// Check that `expression` parses as a cron schedule
pub fn validate_cron_expression(expression: &str) -> JobResult<()> {
    Job::new_async(expression, |_uuid, _lock| Box::pin(async {}))
        .map(|_| ())
        .map_err(|e| JobError::InvalidCronExpression(format!("{}: {}", expression, e)))
}

/// Full static check of a job definition: shape, task kinds and params, and
/// its schedule.
pub fn check_job(registry: &RunnerRegistry, job: &JobSpec) -> JobResult<()> {
    job.validate()?;
    registry.validate_job(job)?;
    match &job.schedule {
        Schedule::Cron { expression } => validate_cron_expression(expression),
        Schedule::RunAt { timestamp } => parse_run_at(timestamp).map(|_| ()).map_err(|e| {
            JobError::invalid_schedule(&job.id, format!("cannot parse run_at '{}': {}", timestamp, e))
        }),
    }
}

/// Both trigger paths of the engine around one central cron scheduler
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    started: AtomicBool,
    executor: JobRunExecutor,
    notifier: CompletionNotifier,
    tracker: InFlightTracker,
    registrations: DashMap<String, Uuid>,
}

impl JobScheduler {
    pub async fn new(registry: RunnerRegistry, notifier: CompletionNotifier) -> JobResult<Self> {
        let scheduler = TokioCronScheduler::new().await?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            started: AtomicBool::new(false),
            executor: JobRunExecutor::new(Arc::new(registry)),
            notifier,
            tracker: InFlightTracker::new(),
            registrations: DashMap::new(),
        })
    }

    pub fn tracker(&self) -> &InFlightTracker {
        &self.tracker
    }

    pub fn executor(&self) -> &JobRunExecutor {
        &self.executor
    }

    /// Ids of jobs with an installed recurring trigger, sorted
    pub fn scheduled_jobs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registrations.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Start the cron clock. Calling it again is a no-op.
    pub async fn start(&self) -> JobResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = self.scheduler.lock().await.start().await {
            self.started.store(false, Ordering::SeqCst);
            return Err(e.into());
        }
        tracing::info!(jobs = self.registrations.len(), "Job scheduler started");
        Ok(())
    }

    /// Stop the cron clock gracefully
    pub async fn shutdown(&self) -> JobResult<()> {
        if !self.started.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.scheduler.lock().await.shutdown().await?;
        tracing::info!("Job scheduler stopped");
        Ok(())
    }

    /// Install a recurring trigger for `job` and start the clock.
    ///
    /// Every task kind is resolved up front, so a job that registers
    /// successfully never fails on an unknown kind at fire time.
    pub async fn schedule_cron(&self, job: JobSpec) -> JobResult<Uuid> {
        let Schedule::Cron { expression } = &job.schedule else {
            return Err(JobError::invalid_schedule(
                &job.id,
                format!("expected a cron schedule, got {}", job.schedule.kind()),
            ));
        };
        let expression = expression.clone();

        if self.registrations.contains_key(&job.id) {
            return Err(JobError::AlreadyScheduled(job.id.clone()));
        }
        job.validate()?;
        self.executor.registry().validate_job(&job)?;

        let job_id = job.id.clone();
        let executor = self.executor.clone();
        let notifier = self.notifier.clone();
        let job = Arc::new(job);

        let cron_job = Job::new_async(expression.as_str(), move |_uuid, _lock| {
            let executor = executor.clone();
            let notifier = notifier.clone();
            let job = Arc::clone(&job);

            Box::pin(async move {
                tracing::info!(job_id = %job.id, "Cron job start");
                let run = executor.execute(job.new_run()).await;
                notifier.notify(&run, TriggerSource::Cron).await;
            })
        })
        .map_err(|e| JobError::InvalidCronExpression(format!("{}: {}", expression, e)))?;

        let cron_id = self.scheduler.lock().await.add(cron_job).await?;

        let duplicate = match self.registrations.entry(job_id.clone()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(cron_id);
                false
            }
        };
        if duplicate {
            // Lost a race with a concurrent registration of the same id
            self.scheduler.lock().await.remove(&cron_id).await?;
            return Err(JobError::AlreadyScheduled(job_id));
        }

        self.tracker.insert(&job_id, TrackedState::Scheduled).await;
        tracing::info!(job_id = %job_id, %expression, %cron_id, "Registered cron job");

        self.start().await?;
        Ok(cron_id)
    }

    /// Remove a job's recurring trigger
    pub async fn unschedule(&self, job_id: &str) -> JobResult<()> {
        let (_, cron_id) = self
            .registrations
            .remove(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        self.scheduler.lock().await.remove(&cron_id).await?;
        self.tracker.remove(job_id).await;
        tracing::info!(job_id, %cron_id, "Unregistered cron job");
        Ok(())
    }

    /// Execute a one-shot run if its `run_at` instant has passed.
    ///
    /// The job is tracked as executing for the duration of the call and is
    /// never tracked once this returns. The tracker is keyed by job id, so a
    /// one-shot run of a job that also has a recurring trigger replaces the
    /// `Scheduled` marker and leaves the id untracked afterwards; the cron
    /// registration itself is untouched and still listed by
    /// [`JobScheduler::scheduled_jobs`].
    pub async fn execute_run(&self, run: JobRun) -> JobResult<RunDisposition> {
        let due_at = match run.scheduled_instant() {
            Some(Ok(due_at)) => due_at,
            Some(Err(e)) => {
                tracing::warn!(job_id = %run.job_id, run_id = %run.id, error = %e, "Unparseable one-shot schedule");
                return Err(JobError::invalid_schedule(
                    &run.job_id,
                    format!("cannot parse run_at: {}", e),
                ));
            }
            None => {
                return Err(JobError::invalid_schedule(
                    &run.job_id,
                    "one-shot runs need a run_at schedule",
                ));
            }
        };

        if due_at > Timestamp::now() {
            tracing::debug!(job_id = %run.job_id, run_id = %run.id, %due_at, "One-shot run not due yet");
            return Ok(RunDisposition::Deferred { due_at });
        }

        let job_id = run.job_id.clone();
        self.tracker.insert(&job_id, TrackedState::Executing).await;
        let run = self.executor.execute(run).await;
        self.notifier.notify(&run, TriggerSource::OneShot).await;
        self.tracker.remove(&job_id).await;

        Ok(RunDisposition::Executed(run))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::TaskSpec;
    use crate::jobs::types::RunStatus;
    use crate::settlement::testing::RecordingProvider;
    use serde_json::json;
    use std::time::Duration;

    async fn scheduler(provider: &RecordingProvider) -> JobScheduler {
        let notifier = CompletionNotifier::new(Arc::new(provider.clone()));
        JobScheduler::new(RunnerRegistry::with_builtin_runners(), notifier)
            .await
            .unwrap()
    }

    fn price_tasks() -> Vec<TaskSpec> {
        vec![
            TaskSpec::new("constant", json!({ "value": "2.5" })),
            TaskSpec::new("multiply", json!({ "times": 100 })),
        ]
    }

    fn one_shot(job_id: &str, at: Timestamp) -> JobSpec {
        JobSpec::new(job_id, Schedule::run_at_instant(at), price_tasks())
    }

    #[test]
    fn test_check_job() {
        let registry = RunnerRegistry::with_builtin_runners();

        let cron = JobSpec::new("a", Schedule::cron("0 */5 * * * *"), price_tasks());
        assert!(check_job(&registry, &cron).is_ok());

        let once = JobSpec::new("b", Schedule::run_at("2030-06-01 12:00:00"), price_tasks());
        assert!(check_job(&registry, &once).is_ok());

        let bad_cron = JobSpec::new("c", Schedule::cron("61 * * * * *"), price_tasks());
        assert!(matches!(
            check_job(&registry, &bad_cron),
            Err(JobError::InvalidCronExpression(_))
        ));

        let bad_date = JobSpec::new("d", Schedule::run_at("2030-13-01 00:00:00"), price_tasks());
        assert!(matches!(
            check_job(&registry, &bad_date),
            Err(JobError::InvalidSchedule { .. })
        ));

        let bad_params = JobSpec::new(
            "e",
            Schedule::cron("0 * * * * *"),
            vec![TaskSpec::new("multiply", json!({ "times": "lots" }))],
        );
        assert!(matches!(
            check_job(&registry, &bad_params),
            Err(JobError::InvalidTaskParams { .. })
        ));
    }

    #[tokio::test]
    async fn test_future_one_shot_is_deferred() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let at = Timestamp::now() + jiff::SignedDuration::from_hours(1);

        let disposition = scheduler.execute_run(one_shot("later", at).new_run()).await.unwrap();

        assert!(matches!(disposition, RunDisposition::Deferred { .. }));
        assert!(scheduler.tracker().is_empty().await);
        assert_eq!(provider.count().await, 0);
    }

    #[tokio::test]
    async fn test_due_one_shot_executes_and_untracks() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let at = Timestamp::now() - jiff::SignedDuration::from_secs(5);

        let disposition = scheduler.execute_run(one_shot("now", at).new_run()).await.unwrap();

        let RunDisposition::Executed(run) = disposition else {
            panic!("Expected the run to execute");
        };
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.result.value(), Some(&json!(250.0)));
        assert!(!scheduler.tracker().contains("now").await);
        assert_eq!(provider.count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_one_shot_untracks_without_settling() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let job = JobSpec::new(
            "broken",
            Schedule::run_at("2000-01-01 00:00:00"),
            vec![TaskSpec::new("oracle_bridge", json!(null))],
        );

        let disposition = scheduler.execute_run(job.new_run()).await.unwrap();

        let RunDisposition::Executed(run) = disposition else {
            panic!("Expected the run to execute");
        };
        assert_eq!(run.status, RunStatus::Errored);
        assert!(scheduler.tracker().is_empty().await);
        assert_eq!(provider.count().await, 0);
    }

    #[tokio::test]
    async fn test_settlement_failure_keeps_run_completed() {
        let provider = RecordingProvider::rejecting();
        let scheduler = scheduler(&provider).await;
        let at = Timestamp::now() - jiff::SignedDuration::from_secs(1);

        let disposition = scheduler.execute_run(one_shot("rejected", at).new_run()).await.unwrap();

        let RunDisposition::Executed(run) = disposition else {
            panic!("Expected the run to execute");
        };
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(provider.count().await, 1);
        assert!(scheduler.tracker().is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_shot_of_cron_job_clears_shared_marker() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let hourly = JobSpec::new("hourly", Schedule::cron("0 0 * * * *"), price_tasks());
        scheduler.schedule_cron(hourly.clone()).await.unwrap();

        let at = Timestamp::now() - jiff::SignedDuration::from_secs(1);
        let run = hourly.new_run_with(Schedule::run_at_instant(at));
        let disposition = scheduler.execute_run(run).await.unwrap();

        assert!(matches!(disposition, RunDisposition::Executed(_)));
        assert!(!scheduler.tracker().contains("hourly").await);
        assert_eq!(scheduler.scheduled_jobs(), vec!["hourly"]);
        assert_eq!(provider.count().await, 1);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_one_shot_schedule_is_surfaced() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let job = JobSpec::new("bad-date", Schedule::run_at("tomorrow-ish"), price_tasks());

        let err = scheduler.execute_run(job.new_run()).await.unwrap_err();

        assert!(matches!(err, JobError::InvalidSchedule { ref job_id, .. } if job_id == "bad-date"));
        assert!(scheduler.tracker().is_empty().await);
        assert_eq!(provider.count().await, 0);
    }

    #[tokio::test]
    async fn test_one_shot_rejects_cron_schedule() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let job = JobSpec::new("cron", Schedule::cron("0 * * * * *"), price_tasks());

        assert!(scheduler.execute_run(job.new_run()).await.is_err());
    }

    #[tokio::test]
    async fn test_schedule_cron_validation() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;

        let not_cron = JobSpec::new("a", Schedule::run_at("2000-01-01 00:00:00"), price_tasks());
        assert!(matches!(
            scheduler.schedule_cron(not_cron).await,
            Err(JobError::InvalidSchedule { .. })
        ));

        let bad_expression = JobSpec::new("b", Schedule::cron("every tuesday"), price_tasks());
        assert!(matches!(
            scheduler.schedule_cron(bad_expression).await,
            Err(JobError::InvalidCronExpression(_))
        ));

        let unknown_kind = JobSpec::new(
            "c",
            Schedule::cron("0 * * * * *"),
            vec![TaskSpec::new("ethtx", json!(null))],
        );
        assert!(matches!(
            scheduler.schedule_cron(unknown_kind).await,
            Err(JobError::UnknownTaskKind(_))
        ));

        let no_tasks = JobSpec::new("d", Schedule::cron("0 * * * * *"), vec![]);
        assert!(matches!(
            scheduler.schedule_cron(no_tasks).await,
            Err(JobError::InvalidJob(_))
        ));

        assert!(scheduler.scheduled_jobs().is_empty());
        assert!(scheduler.tracker().is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cron_registration_tracks_and_unschedules() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let job = JobSpec::new("hourly", Schedule::cron("0 0 * * * *"), price_tasks());

        scheduler.schedule_cron(job.clone()).await.unwrap();
        assert_eq!(scheduler.scheduled_jobs(), vec!["hourly"]);
        assert_eq!(
            scheduler.tracker().get("hourly").await.map(|t| t.state),
            Some(TrackedState::Scheduled)
        );

        assert!(matches!(
            scheduler.schedule_cron(job).await,
            Err(JobError::AlreadyScheduled(_))
        ));

        scheduler.unschedule("hourly").await.unwrap();
        assert!(scheduler.scheduled_jobs().is_empty());
        assert!(!scheduler.tracker().contains("hourly").await);
        assert!(matches!(
            scheduler.unschedule("hourly").await,
            Err(JobError::NotFound(_))
        ));

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cron_fire_creates_and_settles_runs() {
        let provider = RecordingProvider::default();
        let scheduler = scheduler(&provider).await;
        let job = JobSpec::new("every-second", Schedule::cron("* * * * * *"), price_tasks());

        scheduler.schedule_cron(job).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.shutdown().await.unwrap();

        let submitted = provider.submitted.lock().await;
        assert!(!submitted.is_empty());
        assert!(submitted.iter().all(|run| run.status == RunStatus::Completed));
        // Each fire builds a fresh run
        if submitted.len() > 1 {
            assert_ne!(submitted[0].id, submitted[1].id);
        }
        // Registration marks the job, not individual fires
        assert!(scheduler.tracker().contains("every-second").await);
    }
}
