//! Entity model (spec §3) — plain data plus invariant-enforcing constructors
//! and transition methods, mirroring `arvak_hal::job::Job`/`JobStatus`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::format::FormatId;
use crate::ids::{DeploymentId, JobId, ProgramId, ResultId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub with_token: bool,
    pub supported_formats: Vec<FormatId>,
}

impl Provider {
    pub fn supports(&self, format: FormatId) -> bool {
        self.supported_formats.contains(&format)
    }
}

/// `num_qubits == -1` means "unknown at registration time" (spec §3/§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub provider: String,
    pub name: String,
    pub num_qubits: i64,
    pub is_simulator: bool,
    pub is_local: bool,
}

impl Device {
    pub fn num_qubits_known(&self) -> Option<u32> {
        if self.num_qubits < 0 {
            None
        } else {
            Some(self.num_qubits as u32)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgramSource {
    Text(String),
    PythonFile {
        path: String,
        metadata_path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumProgram {
    pub id: ProgramId,
    pub deployment_id: DeploymentId,
    pub format: FormatId,
    pub source: ProgramSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub owner: Option<UserId>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub programs: Vec<QuantumProgram>,
}

impl Deployment {
    pub fn new(owner: Option<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: DeploymentId::new(),
            owner,
            name: name.into(),
            created_at: Utc::now(),
            programs: Vec::new(),
        }
    }

    /// Ownership check used by every entry point that scopes a read/write to
    /// a caller (spec §8 invariant 8): `None` owner is public and visible to
    /// any caller, `Some` owner must match exactly.
    pub fn owned_by(&self, caller: &Option<UserId>) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => caller.as_ref() == Some(owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Runner,
    Sampler,
    Estimator,
    FileUpload,
    FileRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Ready,
    Running,
    Finished,
    Error,
    Canceled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Error | JobState::Canceled)
    }

    /// The transition table from spec §4.5/§8 invariant 6: from any terminal
    /// state nothing is reachable; from READY only RUNNING/CANCELED; from
    /// RUNNING only the three terminal states.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match self {
            Ready => matches!(next, Running | Canceled),
            Running => matches!(next, Finished | Error | Canceled),
            Finished | Error | Canceled => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Ready => "READY",
            JobState::Running => "RUNNING",
            JobState::Finished => "FINISHED",
            JobState::Error => "ERROR",
            JobState::Canceled => "CANCELED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner: Option<UserId>,
    pub device: String,
    pub deployment_id: DeploymentId,
    /// Snapshot of the deployment's programs at enqueue time (spec §3).
    pub programs: Vec<QuantumProgram>,
    pub shots: u32,
    pub job_type: JobType,
    pub name: Option<String>,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub provider_job_id: Option<String>,
    pub backend_state: Option<serde_json::Value>,
}

impl Job {
    pub fn new(
        owner: Option<UserId>,
        device: impl Into<String>,
        deployment_id: DeploymentId,
        programs: Vec<QuantumProgram>,
        shots: u32,
        job_type: JobType,
        name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            owner,
            device: device.into(),
            deployment_id,
            programs,
            shots,
            job_type,
            name,
            state: JobState::Ready,
            created_at: now,
            updated_at: now,
            provider_job_id: None,
            backend_state: None,
        }
    }

    /// Applies a validated state transition, bumping `updated_at`.
    ///
    /// Callers that need the ownership check run it first via `owned_by` —
    /// this method only enforces the state machine, not authorization.
    pub fn transition_to(&mut self, next: JobState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn owned_by(&self, caller: &Option<UserId>) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => caller.as_ref() == Some(owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    Counts,
    Probabilities,
    QuasiDist,
    ValueAndVariance,
    Expectation,
    UploadSuccessful,
    ScriptReturn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: ResultId,
    pub job_id: JobId,
    pub program_id: Option<ProgramId>,
    pub kind: ResultKind,
    pub data: serde_json::Value,
    pub meta: serde_json::Value,
}

impl ResultRow {
    pub fn new(
        job_id: JobId,
        program_id: Option<ProgramId>,
        kind: ResultKind,
        data: serde_json::Value,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            id: ResultId::new(),
            job_id,
            program_id,
            kind,
            data,
            meta,
        }
    }

    pub fn error(
        job_id: JobId,
        program_id: Option<ProgramId>,
        exception_message: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self::new(
            job_id,
            program_id,
            ResultKind::Error,
            serde_json::json!({ "exception_message": exception_message.into() }),
            serde_json::json!({ "stack_trace": stack_trace.into() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(deployment_id: DeploymentId) -> QuantumProgram {
        QuantumProgram {
            id: ProgramId::new(),
            deployment_id,
            format: FormatId::Qasm2,
            source: ProgramSource::Text("OPENQASM 2.0;".to_string()),
        }
    }

    #[test]
    fn ready_only_reaches_running_or_canceled() {
        assert!(JobState::Ready.can_transition_to(JobState::Running));
        assert!(JobState::Ready.can_transition_to(JobState::Canceled));
        assert!(!JobState::Ready.can_transition_to(JobState::Finished));
        assert!(!JobState::Ready.can_transition_to(JobState::Error));
    }

    #[test]
    fn terminal_states_are_sticky() {
        for terminal in [JobState::Finished, JobState::Error, JobState::Canceled] {
            for next in [
                JobState::Ready,
                JobState::Running,
                JobState::Finished,
                JobState::Error,
                JobState::Canceled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn job_transition_updates_timestamp_and_state() {
        let deployment_id = DeploymentId::new();
        let mut job = Job::new(
            None,
            "local",
            deployment_id,
            vec![program(deployment_id)],
            1000,
            JobType::Runner,
            None,
        );
        let before = job.updated_at;
        job.transition_to(JobState::Running).unwrap();
        assert_eq!(job.state, JobState::Running);
        assert!(job.updated_at >= before);
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let deployment_id = DeploymentId::new();
        let mut job = Job::new(
            None,
            "local",
            deployment_id,
            vec![program(deployment_id)],
            1000,
            JobType::Runner,
            None,
        );
        let err = job.transition_to(JobState::Finished).unwrap_err();
        assert_eq!(err.status_hint(), crate::error::StatusHint::Conflict);
    }

    #[test]
    fn ownership_none_is_public() {
        let deployment_id = DeploymentId::new();
        let job = Job::new(
            None,
            "local",
            deployment_id,
            vec![program(deployment_id)],
            1000,
            JobType::Runner,
            None,
        );
        assert!(job.owned_by(&Some(UserId("anyone".to_string()))));
        assert!(job.owned_by(&None));
    }

    #[test]
    fn ownership_some_requires_exact_match() {
        let deployment_id = DeploymentId::new();
        let owner = UserId("alice".to_string());
        let job = Job::new(
            Some(owner.clone()),
            "local",
            deployment_id,
            vec![program(deployment_id)],
            1000,
            JobType::Runner,
            None,
        );
        assert!(job.owned_by(&Some(owner)));
        assert!(!job.owned_by(&Some(UserId("bob".to_string()))));
        assert!(!job.owned_by(&None));
    }
}
