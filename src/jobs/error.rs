use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Unknown task kind: {0}")]
    UnknownTaskKind(String),

    #[error("Invalid parameters for task kind '{kind}': {message}")]
    InvalidTaskParams { kind: String, message: String },

    #[error("Invalid cron expression: {0}")]
    InvalidCronExpression(String),

    #[error("Invalid schedule for job {job_id}: {message}")]
    InvalidSchedule { job_id: String, message: String },

    #[error("Invalid job definition: {0}")]
    InvalidJob(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already scheduled: {0}")]
    AlreadyScheduled(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl JobError {
    pub fn invalid_schedule(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            job_id: job_id.into(),
            message: message.into(),
        }
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for JobError {
    fn from(error: tokio_cron_scheduler::JobSchedulerError) -> Self {
        JobError::Scheduler(error.to_string())
    }
}

impl From<validator::ValidationErrors> for JobError {
    fn from(errors: validator::ValidationErrors) -> Self {
        JobError::InvalidJob(errors.to_string())
    }
}

pub type JobResult<T> = Result<T, JobError>;
