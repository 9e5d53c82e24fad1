//! The orchestrator itself: an in-process bounded work queue plus a
//! worker pool (spec §5 "Scheduling model"), with a synchronous mode that
//! reuses the same [`dispatch::dispatch`] body inline.
//!
//! Cancellation of a still-queued job revokes a `CancellationToken` keyed
//! by job id rather than aborting a task — the teacher's
//! `arvak_grpc::server::service::job_execution` keys its abort handles the
//! same way but over `tokio::task::AbortHandle`, which only exists once a
//! task has been spawned; a queued-but-not-dispatched job has no task yet.

use std::sync::Arc;

use qrelay_domain::{Deployment, Job, JobId, JobState, UserId};
use qrelay_format::FormatRegistry;
use qrelay_pilot::Pilot;
use qrelay_transpile::TranspileGraph;
use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::OrchestratorConfig;
use crate::dispatch::{self, PilotRegistry};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::storage::Store;

/// Owns the queue, worker pool, and every dependency `dispatch` needs.
pub struct Orchestrator {
    store: Arc<dyn Store>,
    formats: Arc<FormatRegistry>,
    transpiler: Arc<TranspileGraph>,
    pilots: Arc<PilotRegistry>,
    config: OrchestratorConfig,
    queue_tx: mpsc::Sender<JobId>,
    pending: Arc<RwLock<FxHashMap<JobId, CancellationToken>>>,
}

impl Orchestrator {
    /// Builds the orchestrator and, if `config.execute_asynchronously`,
    /// spawns `config.worker_pool_size` worker tasks pulling from the
    /// shared queue.
    pub fn new(
        store: Arc<dyn Store>,
        formats: FormatRegistry,
        transpiler: TranspileGraph,
        pilots: PilotRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        let formats = Arc::new(formats);
        let transpiler = Arc::new(transpiler);
        let pilots = Arc::new(pilots);
        let pending: Arc<RwLock<FxHashMap<JobId, CancellationToken>>> = Arc::new(RwLock::new(FxHashMap::default()));

        if config.execute_asynchronously {
            let queue_rx = Arc::new(Mutex::new(queue_rx));
            for worker_id in 0..config.worker_pool_size.max(1) {
                spawn_worker(
                    worker_id,
                    queue_rx.clone(),
                    pending.clone(),
                    store.clone(),
                    formats.clone(),
                    transpiler.clone(),
                    pilots.clone(),
                    config.clone(),
                );
            }
        }

        Self {
            store,
            formats,
            transpiler,
            pilots,
            config,
            queue_tx,
            pending,
        }
    }

    /// Creates the deployment's job row in READY state and, in asynchronous
    /// mode, enqueues it for the worker pool; in synchronous mode runs
    /// `dispatch` inline and returns only once the job reaches a terminal
    /// state (spec §4.5 "Create and run" steps 1–2).
    #[instrument(skip(self, job))]
    pub async fn submit(&self, job: Job) -> OrchestratorResult<JobId> {
        let job_id = job.id;
        self.store.create_job(job).await?;

        if !self.config.execute_asynchronously {
            dispatch::dispatch(job_id, self.store.as_ref(), &self.formats, &self.transpiler, &self.pilots, &self.config)
                .await?;
            return Ok(job_id);
        }

        let token = CancellationToken::new();
        self.pending.write().await.insert(job_id, token);

        if self.queue_tx.try_send(job_id).is_err() {
            self.pending.write().await.remove(&job_id);
            return Err(OrchestratorError::QueueFull);
        }

        Ok(job_id)
    }

    /// Cancels `job_id` on behalf of `user`.
    ///
    /// - READY + still queued: revokes the queue entry, transitions to
    ///   CANCELED.
    /// - RUNNING: delegates to the owning pilot's `cancel`.
    /// - Terminal: fails via the job state machine's own
    ///   `InvalidStateTransition`.
    /// - Synchronous mode: unconditionally `NotImplementedInSyncMode`,
    ///   since there is no queued entry or cancellation token threaded
    ///   through the inline dispatch path to revoke (spec §5).
    pub async fn cancel(&self, job_id: JobId, user: &Option<UserId>) -> OrchestratorResult<()> {
        if !self.config.execute_asynchronously {
            return Err(OrchestratorError::NotImplementedInSyncMode);
        }

        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| OrchestratorError::Storage(format!("job not found: {job_id}")))?;

        if !job.owned_by(user) {
            return Err(qrelay_domain::DomainError::Forbidden.into());
        }

        match job.state {
            JobState::Ready => {
                if let Some(token) = self.pending.write().await.remove(&job_id) {
                    token.cancel();
                    self.store.update_state(job_id, JobState::Canceled).await?;
                    Ok(())
                } else {
                    // Dequeued by a worker between our read and the cancel
                    // attempt; let the caller retry and observe RUNNING.
                    Err(qrelay_domain::DomainError::InvalidStateTransition {
                        from: JobState::Ready.to_string(),
                        to: JobState::Canceled.to_string(),
                    }
                    .into())
                }
            }
            JobState::Running => {
                let (_, pilot) = self.resolve_pilot(&job).await?;
                pilot.cancel(&job, user, None).await?;
                Ok(())
            }
            terminal => Err(qrelay_domain::DomainError::InvalidStateTransition {
                from: terminal.to_string(),
                to: JobState::Canceled.to_string(),
            }
            .into()),
        }
    }

    /// Derives a fresh job from `job_id`'s fields (not its results),
    /// submitting it as a new job (spec §4.5 "Re-run").
    pub async fn rerun(&self, job_id: JobId) -> OrchestratorResult<JobId> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| OrchestratorError::Storage(format!("job not found: {job_id}")))?;

        let fresh = Job::new(
            job.owner,
            job.device,
            job.deployment_id,
            job.programs,
            job.shots,
            job.job_type,
            job.name,
        );
        self.submit(fresh).await
    }

    /// Deletes `job_id` if terminal or owned by `user`, cascading to its
    /// results but not its deployment (spec §4.5 "Delete").
    pub async fn delete(&self, job_id: JobId, user: &Option<UserId>) -> OrchestratorResult<()> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| OrchestratorError::Storage(format!("job not found: {job_id}")))?;

        if !job.state.is_terminal() && !job.owned_by(user) {
            return Err(qrelay_domain::DomainError::Forbidden.into());
        }

        self.pending.write().await.remove(&job_id);
        self.store.delete_job(job_id).await
    }

    pub async fn register_device_deployment(&self, deployment: Deployment) -> OrchestratorResult<()> {
        self.store.create_deployment(deployment).await
    }

    async fn resolve_pilot(&self, job: &Job) -> OrchestratorResult<(String, Arc<dyn Pilot>)> {
        for (provider, pilot) in self.pilots.iter() {
            if self.store.get_device(provider, &job.device).await?.is_some() {
                return Ok((provider.clone(), pilot.clone()));
            }
        }
        Err(OrchestratorError::UnknownDevice(job.device.clone()))
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_worker(
    worker_id: usize,
    queue_rx: Arc<Mutex<mpsc::Receiver<JobId>>>,
    pending: Arc<RwLock<FxHashMap<JobId, CancellationToken>>>,
    store: Arc<dyn Store>,
    formats: Arc<FormatRegistry>,
    transpiler: Arc<TranspileGraph>,
    pilots: Arc<PilotRegistry>,
    config: OrchestratorConfig,
) {
    tokio::spawn(async move {
        loop {
            let job_id = {
                let mut rx = queue_rx.lock().await;
                match rx.recv().await {
                    Some(id) => id,
                    None => break,
                }
            };

            // Removing the entry is the revoke-vs-dispatch race resolver:
            // whichever of `cancel` and this worker removes it first wins.
            let token = pending.write().await.remove(&job_id);
            let Some(token) = token else {
                continue;
            };
            if token.is_cancelled() {
                continue;
            }

            info!(worker_id, job_id = %job_id, "dispatching job");
            match dispatch::dispatch(job_id, store.as_ref(), &formats, &transpiler, &pilots, &config).await {
                Ok(state) => info!(worker_id, job_id = %job_id, ?state, "job dispatch finished"),
                Err(e) => warn!(worker_id, job_id = %job_id, error = %e, "job dispatch errored"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qrelay_domain::{DeploymentId, FormatId, JobType, ProgramSource, Provider, QuantumProgram};
    use qrelay_pilot::{DeviceRegistrar, PilotResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always-succeeds pilot for exercising the orchestrator without a real
    /// provider, in the spirit of spec §8's S1 Bell-pair scenario.
    struct MockPilot {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Pilot for MockPilot {
        fn provider_name(&self) -> &str {
            "local"
        }

        fn supported_formats(&self) -> &[FormatId] {
            &[FormatId::Qasm2]
        }

        async fn run(
            &self,
            job: &Job,
            _circuits: &[(qrelay_domain::ProgramId, qrelay_domain::PreparedCircuit)],
            _token: Option<&str>,
        ) -> PilotResult<(JobState, Vec<qrelay_domain::ResultRow>)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let row = qrelay_domain::ResultRow::new(
                job.id,
                None,
                qrelay_domain::ResultKind::Counts,
                serde_json::json!({"00": 512, "11": 512}),
                serde_json::json!({}),
            );
            Ok((JobState::Finished, vec![row]))
        }

        async fn execute_provider_specific(
            &self,
            _job: &Job,
            _circuits: &[(qrelay_domain::ProgramId, qrelay_domain::PreparedCircuit)],
            job_type: JobType,
            _token: Option<&str>,
        ) -> PilotResult<(JobState, Vec<qrelay_domain::ResultRow>)> {
            Err(qrelay_pilot::PilotError::UnsupportedJobType(format!("{job_type:?}")))
        }

        async fn cancel(&self, _job: &Job, _user: &Option<UserId>, _token: Option<&str>) -> PilotResult<()> {
            Err(qrelay_pilot::PilotError::CancelUnsupported)
        }

        fn default_provider(&self) -> Provider {
            Provider {
                name: "local".to_string(),
                with_token: false,
                supported_formats: vec![FormatId::Qasm2],
            }
        }

        fn default_job(&self, device: &qrelay_domain::Device) -> (Job, Deployment) {
            let deployment = Deployment::new(None, "default");
            let job = Job::new(
                None,
                device.name.clone(),
                deployment.id,
                vec![],
                100,
                JobType::Runner,
                None,
            );
            (job, deployment)
        }

        async fn save_devices_from_provider(&self, _sink: &dyn DeviceRegistrar, _token: Option<&str>) -> PilotResult<()> {
            Ok(())
        }

        async fn is_device_available(&self, _device: &qrelay_domain::Device, _token: Option<&str>) -> PilotResult<bool> {
            Ok(true)
        }

        async fn device_data(&self, _device: &qrelay_domain::Device, _token: Option<&str>) -> PilotResult<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    fn bell_pair_job(device: &str) -> Job {
        let deployment_id = DeploymentId::new();
        let program = QuantumProgram {
            id: qrelay_domain::ProgramId::new(),
            deployment_id,
            format: FormatId::Qasm2,
            source: ProgramSource::Text(
                "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q[0] -> c[0];\nmeasure q[1] -> c[1];\n"
                    .to_string(),
            ),
        };
        Job::new(None, device, deployment_id, vec![program], 1000, JobType::Runner, None)
    }

    async fn build_orchestrator(execute_asynchronously: bool) -> (Orchestrator, Arc<crate::storage::InMemoryStore>) {
        let store = Arc::new(crate::storage::InMemoryStore::new());
        store
            .upsert_device(qrelay_domain::Device {
                provider: "local".to_string(),
                name: "qasm_simulator".to_string(),
                num_qubits: 32,
                is_simulator: true,
                is_local: true,
            })
            .await
            .unwrap();

        let mut pilots: PilotRegistry = FxHashMap::default();
        pilots.insert("local".to_string(), Arc::new(MockPilot { calls: AtomicUsize::new(0) }) as Arc<dyn Pilot>);

        let config = OrchestratorConfig {
            execute_asynchronously,
            worker_pool_size: 2,
            ..OrchestratorConfig::default()
        };

        let orchestrator = Orchestrator::new(
            store.clone() as Arc<dyn Store>,
            FormatRegistry::new(),
            TranspileGraph::new(),
            pilots,
            config,
        );
        (orchestrator, store)
    }

    #[tokio::test]
    async fn synchronous_submit_reaches_finished() {
        let (orchestrator, store) = build_orchestrator(false).await;
        let job_id = orchestrator.submit(bell_pair_job("qasm_simulator")).await.unwrap();
        let job = store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Finished);
    }

    #[tokio::test]
    async fn asynchronous_submit_eventually_finishes() {
        let (orchestrator, store) = build_orchestrator(true).await;
        let job_id = orchestrator.submit(bell_pair_job("qasm_simulator")).await.unwrap();

        let mut job = store.get_job(job_id).await.unwrap().unwrap();
        for _ in 0..50 {
            if job.state.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            job = store.get_job(job_id).await.unwrap().unwrap();
        }
        assert_eq!(job.state, JobState::Finished);
    }

    #[tokio::test]
    async fn cancel_in_sync_mode_is_rejected() {
        let (orchestrator, _store) = build_orchestrator(false).await;
        let job_id = orchestrator.submit(bell_pair_job("qasm_simulator")).await.unwrap();
        let err = orchestrator.cancel(job_id, &None).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotImplementedInSyncMode));
    }

    #[tokio::test]
    async fn unknown_device_fails_dispatch_but_keeps_job_queryable() {
        let (orchestrator, store) = build_orchestrator(false).await;
        let job = bell_pair_job("no_such_device");
        let job_id = job.id;
        let err = orchestrator.submit(job).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownDevice(_)));

        let job = store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Ready);
    }
}
