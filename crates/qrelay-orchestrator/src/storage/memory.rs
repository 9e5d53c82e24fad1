//! In-memory store — no persistence across restarts, used by default and
//! by all tests. Mirrors `arvak_grpc::storage::memory::MemoryStorage`'s
//! `Arc<RwLock<FxHashMap<...>>>` shape.

use std::sync::Arc;

use async_trait::async_trait;
use qrelay_domain::{Deployment, DeploymentId, Device, Job, JobId, JobState, ResultRow, UserId};
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use super::{JobFilter, Store};
use crate::error::OrchestratorResult;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    jobs: Arc<RwLock<FxHashMap<JobId, Job>>>,
    results: Arc<RwLock<FxHashMap<JobId, Vec<ResultRow>>>>,
    devices: Arc<RwLock<FxHashMap<(String, String), Device>>>,
    deployments: Arc<RwLock<FxHashMap<DeploymentId, Deployment>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(job: &Job, owner: &Option<UserId>) -> bool {
    job.owned_by(owner)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_job(&self, job: Job) -> OrchestratorResult<()> {
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> OrchestratorResult<Option<Job>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update_state(&self, id: JobId, state: JobState) -> OrchestratorResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| crate::error::OrchestratorError::Storage(format!("job not found: {id}")))?;
        job.transition_to(state)?;
        Ok(())
    }

    async fn set_provider_job_id(&self, id: JobId, provider_job_id: String) -> OrchestratorResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| crate::error::OrchestratorError::Storage(format!("job not found: {id}")))?;
        job.provider_job_id = Some(provider_job_id);
        Ok(())
    }

    async fn append_results(&self, rows: Vec<ResultRow>) -> OrchestratorResult<()> {
        let mut results = self.results.write().await;
        for row in rows {
            results.entry(row.job_id).or_default().push(row);
        }
        Ok(())
    }

    async fn list_results(&self, job_id: JobId) -> OrchestratorResult<Vec<ResultRow>> {
        Ok(self.results.read().await.get(&job_id).cloned().unwrap_or_default())
    }

    async fn list_jobs(&self, filter: JobFilter) -> OrchestratorResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut results: Vec<Job> = jobs
            .values()
            .filter(|job| owned_by(job, &filter.owner))
            .filter(|job| filter.state.is_none_or(|s| job.state == s))
            .filter(|job| filter.device.as_deref().is_none_or(|d| job.device == d))
            .cloned()
            .collect();
        results.sort_by_key(|j| std::cmp::Reverse(j.created_at));
        if filter.limit > 0 {
            results.truncate(filter.limit);
        }
        Ok(results)
    }

    async fn delete_job(&self, id: JobId) -> OrchestratorResult<()> {
        self.jobs.write().await.remove(&id);
        self.results.write().await.remove(&id);
        Ok(())
    }

    async fn upsert_device(&self, device: Device) -> OrchestratorResult<()> {
        let key = (device.provider.clone(), device.name.clone());
        self.devices.write().await.insert(key, device);
        Ok(())
    }

    async fn list_devices(&self, provider: &str) -> OrchestratorResult<Vec<Device>> {
        Ok(self
            .devices
            .read()
            .await
            .values()
            .filter(|d| d.provider == provider)
            .cloned()
            .collect())
    }

    async fn get_device(&self, provider: &str, name: &str) -> OrchestratorResult<Option<Device>> {
        Ok(self
            .devices
            .read()
            .await
            .get(&(provider.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_deployment(&self, deployment: Deployment) -> OrchestratorResult<()> {
        self.deployments.write().await.insert(deployment.id, deployment);
        Ok(())
    }

    async fn get_deployment(&self, id: DeploymentId) -> OrchestratorResult<Option<Deployment>> {
        Ok(self.deployments.read().await.get(&id).cloned())
    }
}

/// Bridges this store to the narrow capability `qrelay-pilot` actually
/// needs, so a pilot's `save_devices_from_provider` can take `&InMemoryStore`
/// without `qrelay-pilot` depending on this crate.
#[async_trait]
impl qrelay_pilot::DeviceRegistrar for InMemoryStore {
    async fn upsert_device(&self, device: Device) -> qrelay_pilot::PilotResult<()> {
        Store::upsert_device(self, device)
            .await
            .map_err(|e| qrelay_pilot::PilotError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_domain::JobType;

    fn sample_job() -> Job {
        Job::new(None, "local", DeploymentId::new(), vec![], 1000, JobType::Runner, None)
    }

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let store = InMemoryStore::new();
        let job = sample_job();
        let id = job.id;
        store.create_job(job).await.unwrap();
        let fetched = store.get_job(id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn update_state_enforces_transition_table() {
        let store = InMemoryStore::new();
        let job = sample_job();
        let id = job.id;
        store.create_job(job).await.unwrap();

        store.update_state(id, JobState::Running).await.unwrap();
        let err = store.update_state(id, JobState::Ready).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn list_jobs_filters_by_ownership() {
        let store = InMemoryStore::new();
        let alice = UserId("alice".to_string());
        let owned = Job::new(
            Some(alice.clone()),
            "local",
            DeploymentId::new(),
            vec![],
            1000,
            JobType::Runner,
            None,
        );
        let public = sample_job();
        store.create_job(owned).await.unwrap();
        store.create_job(public).await.unwrap();

        let alice_view = store.list_jobs(JobFilter::new(Some(alice))).await.unwrap();
        assert_eq!(alice_view.len(), 2);

        let bob_view = store
            .list_jobs(JobFilter::new(Some(UserId("bob".to_string()))))
            .await
            .unwrap();
        assert_eq!(bob_view.len(), 1);
    }

    #[tokio::test]
    async fn delete_job_removes_results_too() {
        let store = InMemoryStore::new();
        let job = sample_job();
        let id = job.id;
        store.create_job(job).await.unwrap();
        store
            .append_results(vec![ResultRow::error(id, None, "boom", "")])
            .await
            .unwrap();

        store.delete_job(id).await.unwrap();
        assert!(store.get_job(id).await.unwrap().is_none());
        assert!(store.list_results(id).await.unwrap().is_empty());
    }
}
