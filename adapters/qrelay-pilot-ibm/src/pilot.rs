//! [`IbmPilot`]: the `Pilot` impl driving IBM Quantum Platform's Qiskit
//! Runtime Sampler primitive over REST.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use qrelay_domain::{
    Deployment, Device, FormatId, Job, JobState, JobType, PreparedCircuit, Provider, ProgramId,
    ProgramSource, QuantumProgram, ResultKind, ResultRow, UserId,
};
use qrelay_pilot::{DeviceRegistrar, Pilot, PilotError, PilotResult};

use crate::api::{BackendInfo, IbmClient, JobResultResponse, LEGACY_ENDPOINT};
use crate::error::IbmError;
use crate::qasm;

const DEFAULT_BACKEND: &str = "ibm_torino";
const BACKEND_INFO_TTL: Duration = Duration::from_secs(5 * 60);
/// How long `run` polls the submitted job before giving up with a
/// [`PilotError::Timeout`] (the orchestrator's retry loop then decides
/// whether to try again).
const POLL_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(2);

const SUPPORTED_FORMATS: [FormatId; 1] = [FormatId::Qasm3];

/// IBM Quantum Platform pilot. One client per pilot instance; `target`
/// (the default backend used by `default_job`/device sync) is fixed at
/// construction since IBM's device is resolved per-job via `job.device`.
pub struct IbmPilot {
    client: Arc<IbmClient>,
    target: String,
    backend_info: RwLock<HashMap<String, (BackendInfo, Instant)>>,
}

impl IbmPilot {
    /// Legacy direct-token mode, reading `IBM_QUANTUM_TOKEN`.
    pub fn new() -> Result<Self, IbmError> {
        let token = std::env::var("IBM_QUANTUM_TOKEN").map_err(|_| IbmError::MissingToken)?;
        let client = IbmClient::new(LEGACY_ENDPOINT, &token)?;
        Ok(Self {
            client: Arc::new(client),
            target: DEFAULT_BACKEND.to_string(),
            backend_info: RwLock::new(HashMap::new()),
        })
    }

    /// New IBM Cloud API key flow, reading `IBM_API_KEY`/`IBM_SERVICE_CRN`;
    /// falls back to `IBM_QUANTUM_TOKEN` with the legacy endpoint.
    pub async fn connect() -> Result<Self, IbmError> {
        if let Ok(api_key) = std::env::var("IBM_API_KEY") {
            let service_crn = std::env::var("IBM_SERVICE_CRN").map_err(|_| IbmError::MissingServiceCrn)?;
            info!("connecting to IBM Cloud API (IAM key exchange)");
            let client = IbmClient::connect(&api_key, &service_crn).await?;
            return Ok(Self {
                client: Arc::new(client),
                target: DEFAULT_BACKEND.to_string(),
                backend_info: RwLock::new(HashMap::new()),
            });
        }
        Self::new()
    }

    async fn get_backend_info(&self, name: &str) -> Result<BackendInfo, IbmError> {
        {
            let cached = self.backend_info.read().await;
            if let Some((info, fetched_at)) = cached.get(name) {
                if fetched_at.elapsed() < BACKEND_INFO_TTL {
                    return Ok(info.clone());
                }
            }
        }
        let info = self.client.get_backend(name).await?;
        self.backend_info.write().await.insert(name.to_string(), (info.clone(), Instant::now()));
        Ok(info)
    }

    async fn poll_until_terminal(&self, provider_job_id: &str) -> Result<crate::api::JobStatusResponse, IbmError> {
        let start = Instant::now();
        loop {
            let status = self.client.get_job_status(provider_job_id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if start.elapsed() > POLL_TIMEOUT {
                return Err(IbmError::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Builds the COUNTS and PROBABILITIES row pair for every circuit in a
    /// job, normalizing each result's raw bitstring keys to canonical
    /// `0x`-prefixed hex form (spec §4.4) before either row is built.
    fn results_to_rows(
        job_id: qrelay_domain::JobId,
        program_ids: &[ProgramId],
        results: &JobResultResponse,
    ) -> PilotResult<Vec<ResultRow>> {
        let mut rows = Vec::with_capacity(program_ids.len() * 2);
        for (program_id, result) in program_ids.iter().zip(results.results.iter()) {
            let raw_counts = result_to_counts(result);
            let fx_counts: rustc_hash::FxHashMap<String, u64> = raw_counts.into_iter().collect();
            let hex_counts = qrelay_normalize::binary_to_hex(&fx_counts, false)
                .map_err(|e| PilotError::Internal(e.to_string()))?;
            let probabilities = qrelay_normalize::counts_to_probabilities(&hex_counts);

            rows.push(ResultRow::new(
                job_id,
                Some(*program_id),
                ResultKind::Counts,
                serde_json::to_value(&hex_counts).unwrap_or_default(),
                serde_json::json!({}),
            ));
            rows.push(ResultRow::new(
                job_id,
                Some(*program_id),
                ResultKind::Probabilities,
                serde_json::to_value(&probabilities).unwrap_or_default(),
                serde_json::json!({}),
            ));
        }
        Ok(rows)
    }
}

/// Converts one Sampler result into bitstring counts, handling both V2
/// (`data.<register>.samples`, hex per-shot) and V1 (`counts`/`quasi_dists`).
fn result_to_counts(result: &crate::api::SamplerResult) -> HashMap<String, u64> {
    let mut counts = HashMap::new();

    if let Some(data) = &result.data {
        for register in data.values() {
            let bit_width = infer_bit_width(&register.samples);
            for sample in &register.samples {
                let binary = hex_to_binary(sample, bit_width);
                *counts.entry(binary).or_insert(0) += 1;
            }
        }
        return counts;
    }

    if let Some(raw_counts) = &result.counts {
        for (bitstring, &count) in raw_counts {
            counts.insert(hex_to_binary(bitstring, 0), count);
        }
        return counts;
    }

    if let Some(dist) = result.quasi_dists.as_ref().and_then(|d| d.first()) {
        let shots: f64 = result
            .metadata
            .as_ref()
            .and_then(|m| m.get("shots"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(1024) as f64;
        for (bitstring, &prob) in dist {
            let count = (prob * shots).max(0.0).round() as u64;
            if count > 0 {
                counts.insert(hex_to_binary(bitstring, 0), count);
            }
        }
    }

    counts
}

fn infer_bit_width(samples: &[String]) -> usize {
    let max_val = samples
        .iter()
        .filter_map(|s| u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok())
        .max()
        .unwrap_or(0);
    if max_val == 0 {
        1
    } else {
        64 - max_val.leading_zeros() as usize
    }
}

fn hex_to_binary(hex: &str, width: usize) -> String {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    match u64::from_str_radix(hex, 16) {
        Ok(value) => {
            let width = if width > 0 { width } else { hex.len() * 4 };
            format!("{value:0>width$b}")
        }
        Err(_) => hex.to_string(),
    }
}

#[async_trait]
impl Pilot for IbmPilot {
    fn provider_name(&self) -> &str {
        "ibm"
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
        let info = self.get_backend_info(&job.device).await?;
        if !info.status.operational {
            return Err(PilotError::ProviderUnavailable(format!(
                "{} is not operational",
                job.device
            )));
        }

        let mut program_ids = Vec::with_capacity(circuits.len());
        let mut texts = Vec::with_capacity(circuits.len());
        for (program_id, circuit) in circuits {
            if circuit.num_qubits as usize > info.num_qubits {
                return Err(PilotError::InvalidCircuit(format!(
                    "circuit requires {} qubits but {} only has {}",
                    circuit.num_qubits, job.device, info.num_qubits
                )));
            }
            program_ids.push(*program_id);
            texts.push(qasm::emit(circuit)?);
        }

        let submitted = self.client.submit_sampler_job(&job.device, texts, job.shots, true).await?;
        let status = self.poll_until_terminal(&submitted.id).await?;

        if status.is_failed() {
            let msg = status.error_message().unwrap_or_else(|| "job failed".to_string());
            return Ok((
                JobState::Error,
                vec![ResultRow::error(job.id, None, msg, "")],
            ));
        }
        if status.is_cancelled() {
            return Ok((JobState::Canceled, Vec::new()));
        }

        let results = self.client.get_job_results(&submitted.id).await?;
        let rows = Self::results_to_rows(job.id, &program_ids, &results)?;
        Ok((JobState::Finished, rows))
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
            name: "ibm".to_string(),
            with_token: true,
            supported_formats: SUPPORTED_FORMATS.to_vec(),
        }
    }

    fn default_job(&self, device: &Device) -> (Job, Deployment) {
        let mut deployment = Deployment::new(None, "ibm-bell-pair-smoke-test");
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
            1000,
            JobType::Runner,
            Some("bell-pair-smoke-test".to_string()),
        );
        (job, deployment)
    }

    async fn save_devices_from_provider(&self, sink: &dyn DeviceRegistrar, _token: Option<&str>) -> PilotResult<()> {
        let backends = self.client.list_backends().await?;
        for backend in backends {
            sink.upsert_device(Device {
                provider: "ibm".to_string(),
                name: backend.name,
                num_qubits: backend.num_qubits as i64,
                is_simulator: backend.simulator,
                is_local: false,
            })
            .await?;
        }
        Ok(())
    }

    async fn is_device_available(&self, device: &Device, _token: Option<&str>) -> PilotResult<bool> {
        match self.get_backend_info(&device.name).await {
            Ok(info) => Ok(info.status.operational),
            Err(IbmError::BackendUnavailable(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn device_data(&self, device: &Device, _token: Option<&str>) -> PilotResult<serde_json::Value> {
        let info = self.get_backend_info(&device.name).await?;
        Ok(serde_json::json!({
            "name": info.name,
            "num_qubits": info.num_qubits,
            "operational": info.status.operational,
            "basis_gates": info.basis_gates,
            "simulator": info.simulator,
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

    #[test]
    fn hex_to_binary_pads_to_width() {
        assert_eq!(hex_to_binary("0x3", 4), "0011");
        assert_eq!(hex_to_binary("0x0", 0), "0000");
    }

    #[test]
    fn infer_bit_width_finds_max_sample() {
        let samples = vec!["0x0".to_string(), "0x3".to_string()];
        assert_eq!(infer_bit_width(&samples), 2);
    }

    #[test]
    fn result_to_counts_prefers_v2_samples() {
        let mut data = HashMap::new();
        data.insert(
            "c".to_string(),
            crate::api::ClassicalRegisterData {
                samples: vec!["0x0".to_string(), "0x3".to_string(), "0x0".to_string()],
            },
        );
        let result = crate::api::SamplerResult {
            data: Some(data),
            quasi_dists: None,
            counts: None,
            metadata: None,
        };
        let counts = result_to_counts(&result);
        assert_eq!(counts.get("00"), Some(&2));
        assert_eq!(counts.get("11"), Some(&1));
    }
}
