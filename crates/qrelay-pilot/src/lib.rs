//! The pilot trait contract (spec §4.3/§4.6): a uniform, capability-tagged
//! driver abstraction over heterogeneous provider SDKs/APIs, shaped like
//! the teacher's `Backend` trait but widened to the job-type polymorphism
//! pilots actually need instead of a single submit/status/result triple.

mod error;

pub use error::{PilotError, PilotResult};

use async_trait::async_trait;
use qrelay_domain::{Device, Job, JobState, JobType, PreparedCircuit, Provider, ProgramId, UserId};

/// The narrow capability a pilot needs from whatever owns device storage,
/// without depending on the full persistence-boundary trait (see crate
/// docs for why this is split out instead of taking `&dyn Store`).
#[async_trait]
pub trait DeviceRegistrar: Send + Sync {
    async fn upsert_device(&self, device: Device) -> PilotResult<()>;
}

/// A uniform driver over one quantum-computing provider.
///
/// Implementations vary in which [`JobType`]s they support and how they map
/// results; unsupported operations return [`PilotError::UnsupportedJobType`]
/// or [`PilotError::CancelUnsupported`] rather than panicking, so the
/// orchestrator can treat every pilot polymorphically (spec §4.3's
/// "polymorphism over pilots" design note).
#[async_trait]
pub trait Pilot: Send + Sync {
    fn provider_name(&self) -> &str;

    fn supported_formats(&self) -> &[qrelay_domain::FormatId];

    /// Runs a plain RUNNER job: submit the given circuits and return the
    /// job's terminal state together with the `Result` rows it produced.
    /// The orchestrator persists both the rows and the state transition on
    /// the pilot's behalf, in that order (spec §5's persist-before-transition
    /// ordering guarantee) — pilots never touch storage directly.
    async fn run(
        &self,
        job: &Job,
        circuits: &[(ProgramId, PreparedCircuit)],
        token: Option<&str>,
    ) -> PilotResult<(JobState, Vec<qrelay_domain::ResultRow>)>;

    /// Handles SAMPLER, ESTIMATOR, FILE_UPLOAD, and FILE_RUN. Pilots that do
    /// not support a given type fail with [`PilotError::UnsupportedJobType`].
    async fn execute_provider_specific(
        &self,
        job: &Job,
        circuits: &[(ProgramId, PreparedCircuit)],
        job_type: JobType,
        token: Option<&str>,
    ) -> PilotResult<(JobState, Vec<qrelay_domain::ResultRow>)>;

    /// Cancels a RUNNING job. Pilots that cannot interrupt an in-flight
    /// provider call fail with [`PilotError::CancelUnsupported`] and the job
    /// stays RUNNING (spec §5).
    async fn cancel(&self, job: &Job, user: &Option<UserId>, token: Option<&str>) -> PilotResult<()>;

    /// The `Provider` row this pilot registers itself under.
    fn default_provider(&self) -> Provider;

    /// A default job/deployment pair usable for smoke-testing this pilot
    /// against a given device, mirroring
    /// `base_pilot.create_default_job_with_circuit_and_device`.
    fn default_job(&self, device: &Device) -> (Job, qrelay_domain::Deployment);

    async fn save_devices_from_provider(
        &self,
        sink: &dyn DeviceRegistrar,
        token: Option<&str>,
    ) -> PilotResult<()>;

    async fn is_device_available(&self, device: &Device, token: Option<&str>) -> PilotResult<bool>;

    async fn device_data(&self, device: &Device, token: Option<&str>) -> PilotResult<serde_json::Value>;
}
