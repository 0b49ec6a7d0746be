//! Job engine: task chains, their runs, and the triggers that start them.

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod models;
pub mod registry;
pub mod runners;
pub mod scheduler;
pub mod tracker;
pub mod types;

pub use error::{JobError, JobResult};
pub use executor::JobRunExecutor;
pub use models::{JobRun, JobSpec, Schedule, TaskRun, TaskSpec};
pub use registry::RunnerRegistry;
pub use scheduler::{JobScheduler, RunDisposition};
pub use tracker::{InFlightTracker, TrackedJob, TrackedState};
pub use types::{RunResult, RunStatus, TaskRunner};
