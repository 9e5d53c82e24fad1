//! [`IonqPilot`]: the `Pilot` impl driving IonQ's native REST API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use qrelay_domain::{
    Deployment, Device, FormatId, Job, JobState, JobType, PreparedCircuit, Provider, ProgramId,
    ProgramSource, QuantumProgram, ResultKind, ResultRow, UserId,
};
use qrelay_pilot::{DeviceRegistrar, Pilot, PilotError, PilotResult};

use crate::api::{BackendInfo, IonqClient};
use crate::circuit::{self, histogram_to_counts};
use crate::error::IonqError;

/// The synthetic local-simulator device this pilot registers itself,
/// mirroring the Python pilot's `ionq_local_simulator` entry with
/// `num_qubits=-1` (unbounded, since it has no fixed hardware qubit count).
pub const LOCAL_SIMULATOR: &str = "ionq_local_simulator";

const BACKEND_INFO_TTL: Duration = Duration::from_secs(5 * 60);
const POLL_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(2);

const SUPPORTED_FORMATS: [FormatId; 1] = [FormatId::Qasm3];

/// IonQ pilot. One client per pilot instance; the device is resolved
/// per-job via `job.device`.
pub struct IonqPilot {
    client: Arc<IonqClient>,
    backend_info: RwLock<HashMap<String, (BackendInfo, Instant)>>,
}

impl IonqPilot {
    pub fn new() -> Result<Self, IonqError> {
        let token = std::env::var("IONQ_TOKEN").map_err(|_| IonqError::MissingToken)?;
        let client = IonqClient::new(token)?;
        Ok(Self {
            client: Arc::new(client),
            backend_info: RwLock::new(HashMap::new()),
        })
    }

    async fn get_backend_info(&self, name: &str) -> Result<BackendInfo, IonqError> {
        {
            let cached = self.backend_info.read().await;
            if let Some((info, fetched_at)) = cached.get(name) {
                if fetched_at.elapsed() < BACKEND_INFO_TTL {
                    return Ok(info.clone());
                }
            }
        }
        let info = self.client.get_backend(name).await?;
        self.backend_info
            .write()
            .await
            .insert(name.to_string(), (info.clone(), Instant::now()));
        Ok(info)
    }

    async fn poll_until_terminal(&self, job_id: &str) -> Result<crate::api::JobStatusResponse, IonqError> {
        let start = Instant::now();
        loop {
            let status = self.client.get_job_status(job_id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if start.elapsed() > POLL_TIMEOUT {
                return Err(IonqError::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Builds the COUNTS and PROBABILITIES rows a single program's histogram
/// produces, mirroring `IONQPilot.__map_runner_results_to_dataclass`'s
/// pairing of a counts result with a derived probabilities result. Keys are
/// normalized to canonical `0x`-prefixed hex form (spec §4.4) before either
/// row is built, so COUNTS and PROBABILITIES always agree on key format with
/// every other pilot in the workspace.
fn histogram_to_rows(
    job_id: qrelay_domain::JobId,
    program_id: ProgramId,
    histogram: &HashMap<String, f64>,
    num_qubits: usize,
    shots: u32,
) -> PilotResult<Vec<ResultRow>> {
    let raw_counts = histogram_to_counts(histogram, num_qubits, shots);
    let fx_counts: rustc_hash::FxHashMap<String, u64> = raw_counts.into_iter().collect();
    let hex_counts =
        qrelay_normalize::binary_to_hex(&fx_counts, false).map_err(|e| PilotError::Internal(e.to_string()))?;
    let probabilities = qrelay_normalize::counts_to_probabilities(&hex_counts);

    Ok(vec![
        ResultRow::new(
            job_id,
            Some(program_id),
            ResultKind::Counts,
            serde_json::to_value(&hex_counts).unwrap_or_default(),
            serde_json::json!({}),
        ),
        ResultRow::new(
            job_id,
            Some(program_id),
            ResultKind::Probabilities,
            serde_json::to_value(&probabilities).unwrap_or_default(),
            serde_json::json!({}),
        ),
    ])
}

#[async_trait]
impl Pilot for IonqPilot {
    fn provider_name(&self) -> &str {
        "ionq"
    }

    fn supported_formats(&self) -> &[FormatId] {
        &SUPPORTED_FORMATS
    }

    async fn run(
        &self,
        job: &Job,
        circuits: &[(ProgramId, PreparedCircuit)],
        _token: Option<&str>,
    ) -> PilotResult<(JobState, Vec<ResultRow>)> {
        let is_local = job.device == LOCAL_SIMULATOR;
        if !is_local {
            let info = self.get_backend_info(&job.device).await?;
            if !info.is_available() {
                return Err(PilotError::ProviderUnavailable(format!(
                    "{} is not available",
                    job.device
                )));
            }
        }

        // IonQ's REST API takes one circuit per job; fan out and recombine.
        let mut rows = Vec::with_capacity(circuits.len() * 2);
        for (program_id, circuit) in circuits {
            let ionq_circuit = circuit::emit(circuit)?;
            let job_id = self.client.submit_job(&job.device, &ionq_circuit, job.shots).await?;
            let status = self.poll_until_terminal(&job_id).await?;

            if status.is_failed() {
                let msg = status.error_message().unwrap_or_else(|| "job failed".to_string());
                rows.push(ResultRow::error(job.id, Some(*program_id), msg, ""));
                continue;
            }
            if status.is_cancelled() {
                return Ok((JobState::Canceled, rows));
            }

            let histogram = self.client.get_job_results(&job_id).await?;
            rows.extend(histogram_to_rows(
                job.id,
                *program_id,
                &histogram,
                circuit.num_qubits as usize,
                job.shots,
            )?);
        }

        let state = if rows.iter().any(|r| r.kind == ResultKind::Error) {
            JobState::Error
        } else {
            JobState::Finished
        };
        Ok((state, rows))
    }

    async fn execute_provider_specific(
        &self,
        job: &Job,
        circuits: &[(ProgramId, PreparedCircuit)],
        job_type: JobType,
        token: Option<&str>,
    ) -> PilotResult<(JobState, Vec<ResultRow>)> {
        match job_type {
            JobType::Sampler => self.run(job, circuits, token).await,
            other => Err(PilotError::UnsupportedJobType(format!("{other:?}"))),
        }
    }

    /// IonQ's Python pilot implements cancellation, unlike IBM/Braket's
    /// fallback — but there's still no window in this synchronous-run
    /// architecture where `provider_job_id` is populated before `run`
    /// returns, so the only reachable case today is the `None` branch.
    async fn cancel(&self, job: &Job, _user: &Option<UserId>, _token: Option<&str>) -> PilotResult<()> {
        match &job.provider_job_id {
            Some(id) => {
                self.client.cancel_job(id).await?;
                Ok(())
            }
            None => Err(PilotError::CancelUnsupported),
        }
    }

    fn default_provider(&self) -> Provider {
        Provider {
            name: "ionq".to_string(),
            with_token: true,
            supported_formats: SUPPORTED_FORMATS.to_vec(),
        }
    }

    fn default_job(&self, device: &Device) -> (Job, Deployment) {
        let mut deployment = Deployment::new(None, "ionq-bell-pair-smoke-test");
        let program = QuantumProgram {
            id: ProgramId::new(),
            deployment_id: deployment.id,
            format: FormatId::Qasm3,
            source: ProgramSource::Text(bell_pair_qasm3()),
        };
        deployment.programs.push(program.clone());

        let job = Job::new(
            None,
            device.name.clone(),
            deployment.id,
            vec![program],
            100,
            JobType::Runner,
            Some("bell-pair-smoke-test".to_string()),
        );
        (job, deployment)
    }

    async fn save_devices_from_provider(&self, sink: &dyn DeviceRegistrar, _token: Option<&str>) -> PilotResult<()> {
        let backends = self.client.list_backends().await?;
        for backend in backends {
            sink.upsert_device(Device {
                provider: "ionq".to_string(),
                name: backend.backend.clone(),
                num_qubits: i64::from(backend.qubits.unwrap_or(0)),
                is_simulator: backend.is_simulator(),
                is_local: false,
            })
            .await?;
        }

        sink.upsert_device(Device {
            provider: "ionq".to_string(),
            name: LOCAL_SIMULATOR.to_string(),
            num_qubits: -1,
            is_simulator: true,
            is_local: true,
        })
        .await?;
        Ok(())
    }

    async fn is_device_available(&self, device: &Device, _token: Option<&str>) -> PilotResult<bool> {
        if device.is_simulator {
            return Ok(true);
        }
        match self.get_backend_info(&device.name).await {
            Ok(info) => Ok(info.is_available()),
            Err(IonqError::BackendUnavailable(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn device_data(&self, device: &Device, _token: Option<&str>) -> PilotResult<serde_json::Value> {
        let info = self.get_backend_info(&device.name).await?;
        Ok(serde_json::json!({
            "backend": info.backend,
            "qubits": info.qubits,
            "status": info.status,
        }))
    }
}

fn bell_pair_qasm3() -> String {
    r#"OPENQASM 3.0;
include "stdgates.inc";
qubit[2] q;
bit[2] c;
h q[0];
cx q[0], q[1];
c[0] = measure q[0];
c[1] = measure q[1];
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_domain::JobId;

    #[test]
    fn histogram_to_rows_produces_counts_and_probabilities() {
        let mut histogram = HashMap::new();
        histogram.insert("0".to_string(), 0.5);
        histogram.insert("3".to_string(), 0.5);

        let job_id = JobId::new();
        let program_id = ProgramId::new();
        let rows = histogram_to_rows(job_id, program_id, &histogram, 2, 1000).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, ResultKind::Counts);
        assert_eq!(rows[1].kind, ResultKind::Probabilities);

        let counts = rows[0].data.as_object().unwrap();
        for key in counts.keys() {
            assert!(key == "0x0" || key == "0x3", "unexpected outcome {key}");
        }
    }
}
