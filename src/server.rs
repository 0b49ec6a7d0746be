//! Engine process lifecycle
//!
//! Installs every configured job on a [`JobScheduler`], arms one-shot jobs
//! that are not yet due, and tears everything down on a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{Environment, settings::Settings};
use crate::jobs::models::parse_run_at;
use crate::jobs::scheduler::check_job;
use crate::jobs::{JobError, JobRun, JobScheduler, JobSpec, RunDisposition, RunnerRegistry, Schedule};
use crate::settlement::{CompletionNotifier, SettlementProvider, provider_from_settings};

/// Engine process manager
pub struct Server {
    settings: Settings,
}

/// A started engine; dropping it without [`EngineHandle::shutdown`] leaves
/// the cron clock running.
pub struct EngineHandle {
    scheduler: Arc<JobScheduler>,
    cancel: CancellationToken,
    pending: JoinSet<()>,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the engine and run until a shutdown signal
    ///
    /// # Errors
    /// - Settlement provider configuration errors
    /// - Any configured job failing its startup checks
    /// - Scheduler startup or shutdown errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        tracing::info!(
            level = %self.settings.logger.level,
            console_enabled = %self.settings.logger.console.enabled,
            file_enabled = %self.settings.logger.file.enabled,
            "Logger configuration loaded"
        );

        let handle = self.start().await?;
        tracing::info!(
            scheduled = handle.scheduler().scheduled_jobs().len(),
            armed = handle.pending_one_shots(),
            "Engine running"
        );

        shutdown_signal().await;
        handle.shutdown().await?;

        tracing::info!("Engine shutdown complete");
        Ok(())
    }

    /// Build the engine and install every configured job
    pub async fn start(&self) -> anyhow::Result<EngineHandle> {
        let provider = provider_from_settings(&self.settings.settlement);
        provider.validate_config().await?;
        tracing::info!(provider = provider.name(), "Settlement provider configured");

        self.start_with(provider).await
    }

    async fn start_with(&self, provider: Arc<dyn SettlementProvider>) -> anyhow::Result<EngineHandle> {
        let notifier = CompletionNotifier::new(provider);
        let scheduler = Arc::new(JobScheduler::new(RunnerRegistry::with_builtin_runners(), notifier).await?);

        let mut handle = EngineHandle {
            scheduler,
            cancel: CancellationToken::new(),
            pending: JoinSet::new(),
        };

        if !self.settings.engine.enabled {
            tracing::warn!(jobs = self.settings.jobs.len(), "Engine disabled, no jobs installed");
            return Ok(handle);
        }

        // Nothing is installed until every job passes
        for job in &self.settings.jobs {
            check_job(handle.scheduler.executor().registry(), job)?;
        }

        if let Err(e) = self.install_jobs(&mut handle).await {
            if let Err(shutdown_error) = handle.shutdown().await {
                tracing::error!(error = %shutdown_error, "Failed to stop engine after startup error");
            }
            return Err(e);
        }

        Ok(handle)
    }

    async fn install_jobs(&self, handle: &mut EngineHandle) -> anyhow::Result<()> {
        for job in &self.settings.jobs {
            match &job.schedule {
                Schedule::Cron { .. } => {
                    handle.scheduler.schedule_cron(job.clone()).await?;
                }
                Schedule::RunAt { timestamp } => {
                    let due_at = parse_run_at(timestamp)
                        .map_err(|e| JobError::invalid_schedule(&job.id, e.to_string()))?;
                    self.install_one_shot(handle, job, due_at).await?;
                }
            }
        }
        Ok(())
    }

    async fn install_one_shot(
        &self,
        handle: &mut EngineHandle,
        job: &JobSpec,
        due_at: Timestamp,
    ) -> anyhow::Result<()> {
        if due_at > Timestamp::now() {
            tracing::info!(job_id = %job.id, %due_at, "Armed one-shot job");
            handle.arm(job.new_run(), due_at);
            return Ok(());
        }

        if !self.settings.engine.run_due_on_start {
            tracing::info!(job_id = %job.id, %due_at, "Skipping one-shot job already past its time");
            return Ok(());
        }

        if let RunDisposition::Executed(run) = handle.scheduler.execute_run(job.new_run()).await? {
            tracing::info!(job_id = %job.id, run_id = %run.id, status = %run.status, "One-shot job executed at startup");
        }
        Ok(())
    }
}

impl EngineHandle {
    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// One-shot jobs still waiting for their time
    pub fn pending_one_shots(&self) -> usize {
        self.pending.len()
    }

    /// Sleep until `due_at`, then hand the run to the one-shot trigger
    fn arm(&mut self, run: JobRun, due_at: Timestamp) {
        let scheduler = Arc::clone(&self.scheduler);
        let cancel = self.cancel.clone();

        self.pending.spawn(async move {
            let mut due_at = due_at;
            loop {
                let wait = Duration::try_from(Timestamp::now().duration_until(due_at)).unwrap_or_default();
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(job_id = %run.job_id, run_id = %run.id, "One-shot job cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(wait) => {}
                }

                match scheduler.execute_run(run.clone()).await {
                    // Woke a little early
                    Ok(RunDisposition::Deferred { due_at: next }) => due_at = next,
                    Ok(RunDisposition::Executed(run)) => {
                        tracing::info!(job_id = %run.job_id, run_id = %run.id, status = %run.status, "One-shot job executed");
                        return;
                    }
                    Err(e) => {
                        tracing::error!(job_id = %run.job_id, run_id = %run.id, error = %e, "One-shot job failed to start");
                        return;
                    }
                }
            }
        });
    }

    /// Cancel armed one-shot jobs, wait for any in progress, and stop the
    /// cron clock
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.cancel.cancel();
        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "One-shot task panicked");
            }
        }
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
