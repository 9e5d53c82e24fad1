//! Pluggable persistence backends (spec §4.5/§6), matching the teacher's
//! `arvak_grpc::storage::{JobStorage, memory, sqlite}` split.

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use qrelay_domain::{Deployment, DeploymentId, Device, Job, JobId, JobState, ResultRow, UserId};

use crate::error::OrchestratorResult;

/// Query filter for `list_jobs` (spec §4.5D). `owner` must always be
/// supplied by the caller; `list_jobs` returns rows owned by `owner` plus
/// publicly-owned (`None`-owner) rows, never an unfiltered table scan (spec
/// §8 invariant 8).
#[derive(Clone, Debug, Default)]
pub struct JobFilter {
    pub owner: Option<UserId>,
    pub state: Option<JobState>,
    pub device: Option<String>,
    pub limit: usize,
}

impl JobFilter {
    pub fn new(owner: Option<UserId>) -> Self {
        Self {
            owner,
            limit: 100,
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// The CRUD + query surface the orchestrator core consumes, widened from
/// `arvak_grpc::storage::JobStorage`'s job-only shape to the full entity
/// set this workspace's spec requires.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_job(&self, job: Job) -> OrchestratorResult<()>;
    async fn get_job(&self, id: JobId) -> OrchestratorResult<Option<Job>>;
    async fn update_state(&self, id: JobId, state: JobState) -> OrchestratorResult<()>;
    async fn set_provider_job_id(&self, id: JobId, provider_job_id: String) -> OrchestratorResult<()>;
    async fn append_results(&self, results: Vec<ResultRow>) -> OrchestratorResult<()>;
    async fn list_results(&self, job_id: JobId) -> OrchestratorResult<Vec<ResultRow>>;
    async fn list_jobs(&self, filter: JobFilter) -> OrchestratorResult<Vec<Job>>;
    async fn delete_job(&self, id: JobId) -> OrchestratorResult<()>;

    async fn upsert_device(&self, device: Device) -> OrchestratorResult<()>;
    async fn list_devices(&self, provider: &str) -> OrchestratorResult<Vec<Device>>;
    async fn get_device(&self, provider: &str, name: &str) -> OrchestratorResult<Option<Device>>;

    async fn create_deployment(&self, deployment: Deployment) -> OrchestratorResult<()>;
    async fn get_deployment(&self, id: DeploymentId) -> OrchestratorResult<Option<Deployment>>;
}
