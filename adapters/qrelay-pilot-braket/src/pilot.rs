//! [`BraketPilot`]: the `Pilot` impl driving AWS Braket's quantum-task API,
//! submitting OpenQASM 3 text and reading results back from S3.

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

use crate::api::{BraketClient, DeviceInfo, DeviceStatus, TaskResult, TaskStatus};
use crate::device::{arn_for_name, preset_for_device, KNOWN_DEVICES, SV1};
use crate::error::{BraketError, BraketResult};
use crate::qasm;

const DEVICE_INFO_TTL: Duration = Duration::from_secs(5 * 60);
/// How long `run` polls the submitted task before giving up with a
/// [`PilotError::Timeout`] (the orchestrator's retry loop then decides
/// whether to try again).
const POLL_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(2);

const SUPPORTED_FORMATS: [FormatId; 1] = [FormatId::Qasm3];

/// AWS Braket pilot. One client per pilot instance; the device ARN is
/// resolved per-job from `job.device` via [`crate::device`]'s known-ARN
/// table (a friendly name like `"sv1"`) or taken as-is if it already looks
/// like an ARN.
pub struct BraketPilot {
    client: Arc<BraketClient>,
    device_info: RwLock<HashMap<String, (DeviceInfo, Instant)>>,
}

impl BraketPilot {
    /// Reads configuration from environment variables:
    /// - `ARVAK_BRAKET_S3_BUCKET` (required) — S3 bucket for task results
    /// - `ARVAK_BRAKET_S3_PREFIX` (optional, default: `"arvak-results"`)
    /// - `AWS_REGION` (optional, default: `"us-east-1"`)
    ///
    /// AWS credentials are loaded from the default chain (environment,
    /// SSO, config files, IAM role).
    pub async fn connect() -> Result<Self, BraketError> {
        let s3_bucket =
            std::env::var("ARVAK_BRAKET_S3_BUCKET").map_err(|_| BraketError::MissingS3Bucket)?;
        let s3_prefix =
            std::env::var("ARVAK_BRAKET_S3_PREFIX").unwrap_or_else(|_| "arvak-results".to_string());
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let client = BraketClient::new(&region, &s3_bucket, &s3_prefix).await?;
        Ok(Self {
            client: Arc::new(client),
            device_info: RwLock::new(HashMap::new()),
        })
    }

    fn resolve_arn(device_name: &str) -> BraketResult<String> {
        if device_name.starts_with("arn:") {
            return Ok(device_name.to_string());
        }
        arn_for_name(device_name)
            .map(str::to_string)
            .ok_or_else(|| BraketError::InvalidDeviceArn(device_name.to_string()))
    }

    async fn get_device_info(&self, arn: &str) -> BraketResult<DeviceInfo> {
        {
            let cached = self.device_info.read().await;
            if let Some((info, fetched_at)) = cached.get(arn) {
                if fetched_at.elapsed() < DEVICE_INFO_TTL {
                    return Ok(info.clone());
                }
            }
        }
        let info = self.client.get_device(arn).await?;
        self.device_info
            .write()
            .await
            .insert(arn.to_string(), (info.clone(), Instant::now()));
        Ok(info)
    }

    async fn poll_until_terminal(&self, task_arn: &str) -> BraketResult<TaskStatus> {
        let start = Instant::now();
        loop {
            let status = self.client.get_task_status(task_arn).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if start.elapsed() > POLL_TIMEOUT {
                return Err(BraketError::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Parses one task result into bitstring counts, preferring
/// `measurementCounts`, then raw `measurements`, then falling back to
/// `measurementProbabilities` scaled by `submitted_shots`. Bitstrings here
/// are still provider-local — `run` routes this output through
/// `qrelay_normalize::binary_to_hex` before it reaches a result row.
fn parse_result(result: &TaskResult, submitted_shots: u32) -> HashMap<String, u64> {
    let mut counts = HashMap::new();

    if let Some(measurement_counts) = &result.measurement_counts {
        for (bitstring, &count) in measurement_counts {
            counts.insert(bitstring.clone(), count);
        }
        return counts;
    }

    if let Some(measurements) = &result.measurements {
        for measurement in measurements {
            let bitstring: String = measurement.iter().map(|b| if *b == 0 { '0' } else { '1' }).collect();
            *counts.entry(bitstring).or_insert(0) += 1;
        }
        return counts;
    }

    if let Some(probs) = &result.measurement_probabilities {
        let total_shots = if submitted_shots > 0 {
            f64::from(submitted_shots)
        } else {
            1000.0_f64
        };
        for (bitstring, &prob) in probs {
            let count = (prob * total_shots).max(0.0).round() as u64;
            if count > 0 {
                counts.insert(bitstring.clone(), count);
            }
        }
    }

    counts
}

#[async_trait]
impl Pilot for BraketPilot {
    fn provider_name(&self) -> &str {
        "braket"
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
        let arn = Self::resolve_arn(&job.device)?;
        let info = self.get_device_info(&arn).await?;
        if info.status != DeviceStatus::Online {
            return Err(PilotError::ProviderUnavailable(format!(
                "{} is {:?}",
                info.device_name, info.status
            )));
        }

        let preset = preset_for_device(&arn);
        if let Some(preset) = preset {
            for (_, circuit) in circuits {
                if circuit.num_qubits as u32 > preset.num_qubits {
                    return Err(PilotError::InvalidCircuit(format!(
                        "circuit requires {} qubits but {} only has {}",
                        circuit.num_qubits, info.device_name, preset.num_qubits
                    )));
                }
            }
        }

        // Braket has no batch-submit endpoint: one task per circuit.
        let mut rows = Vec::with_capacity(circuits.len());
        for (program_id, circuit) in circuits {
            let qasm = qasm::emit(circuit)?;
            let task_arn = self.client.create_task(&arn, &qasm, job.shots).await?;
            let status = self.poll_until_terminal(&task_arn).await?;

            match status {
                TaskStatus::Failed(msg) => {
                    rows.push(ResultRow::error(job.id, Some(*program_id), msg, ""));
                    continue;
                }
                TaskStatus::Cancelled | TaskStatus::Cancelling => {
                    return Ok((JobState::Canceled, rows));
                }
                TaskStatus::Completed => {}
                _ => unreachable!("poll_until_terminal only returns terminal statuses"),
            }

            let result = self.client.get_task_result(&task_arn).await?;
            let raw_counts = parse_result(&result, job.shots);
            let fx_counts: rustc_hash::FxHashMap<String, u64> = raw_counts.into_iter().collect();
            let hex_counts = qrelay_normalize::binary_to_hex(&fx_counts, false)
                .map_err(|e| PilotError::Internal(e.to_string()))?;
            let probabilities = qrelay_normalize::counts_to_probabilities(&hex_counts);

            rows.push(ResultRow::new(
                job.id,
                Some(*program_id),
                ResultKind::Counts,
                serde_json::to_value(&hex_counts).unwrap_or_default(),
                serde_json::json!({ "task_arn": task_arn }),
            ));
            rows.push(ResultRow::new(
                job.id,
                Some(*program_id),
                ResultKind::Probabilities,
                serde_json::to_value(&probabilities).unwrap_or_default(),
                serde_json::json!({ "task_arn": task_arn }),
            ));
        }

        let state = if rows.iter().all(|r| r.kind == ResultKind::Error) {
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

    async fn cancel(&self, job: &Job, _user: &Option<UserId>, _token: Option<&str>) -> PilotResult<()> {
        match &job.provider_job_id {
            Some(task_arn) => {
                self.client.cancel_task(task_arn).await?;
                Ok(())
            }
            None => Err(PilotError::CancelUnsupported),
        }
    }

    fn default_provider(&self) -> Provider {
        Provider {
            name: "braket".to_string(),
            with_token: false,
            supported_formats: SUPPORTED_FORMATS.to_vec(),
        }
    }

    fn default_job(&self, device: &Device) -> (Job, Deployment) {
        let mut deployment = Deployment::new(None, "braket-bell-pair-smoke-test");
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
        for (name, arn) in KNOWN_DEVICES {
            let (num_qubits, is_simulator) = match self.get_device_info(arn).await {
                Ok(info) => (
                    preset_for_device(arn).map_or(0, |p| p.num_qubits),
                    info.device_type == crate::api::DeviceType::Simulator,
                ),
                Err(_) => match preset_for_device(arn) {
                    Some(preset) => (preset.num_qubits, preset.is_simulator),
                    None => continue,
                },
            };
            sink.upsert_device(Device {
                provider: "braket".to_string(),
                name: (*name).to_string(),
                num_qubits: i64::from(num_qubits),
                is_simulator,
                is_local: false,
            })
            .await?;
        }
        Ok(())
    }

    async fn is_device_available(&self, device: &Device, _token: Option<&str>) -> PilotResult<bool> {
        let arn = Self::resolve_arn(&device.name)?;
        match self.get_device_info(&arn).await {
            Ok(info) => Ok(info.status == DeviceStatus::Online),
            Err(BraketError::InvalidDeviceArn(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn device_data(&self, device: &Device, _token: Option<&str>) -> PilotResult<serde_json::Value> {
        let arn = Self::resolve_arn(&device.name)?;
        let info = self.get_device_info(&arn).await?;
        Ok(serde_json::json!({
            "device_arn": info.device_arn,
            "device_name": info.device_name,
            "provider_name": info.provider_name,
            "status": format!("{:?}", info.status),
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
    fn resolve_arn_passes_through_existing_arn() {
        assert_eq!(BraketPilot::resolve_arn(SV1).unwrap(), SV1);
    }

    #[test]
    fn resolve_arn_maps_friendly_name() {
        assert_eq!(BraketPilot::resolve_arn("sv1").unwrap(), SV1);
    }

    #[test]
    fn resolve_arn_rejects_unknown_name() {
        assert!(BraketPilot::resolve_arn("not-a-real-device").is_err());
    }

    #[test]
    fn parse_result_prefers_counts() {
        let mut measurement_counts = HashMap::new();
        measurement_counts.insert("00".to_string(), 500);
        measurement_counts.insert("11".to_string(), 500);
        let result = TaskResult {
            measurement_counts: Some(measurement_counts),
            measurement_probabilities: None,
            measurements: None,
            measured_qubits: Some(vec![0, 1]),
            additional_metadata: None,
        };
        let counts = parse_result(&result, 1000);
        assert_eq!(counts.get("00"), Some(&500));
        assert_eq!(counts.get("11"), Some(&500));
    }

    #[test]
    fn parse_result_falls_back_to_raw_measurements() {
        let result = TaskResult {
            measurement_counts: None,
            measurement_probabilities: None,
            measurements: Some(vec![vec![0, 0], vec![1, 1], vec![1, 1]]),
            measured_qubits: Some(vec![0, 1]),
            additional_metadata: None,
        };
        let counts = parse_result(&result, 3);
        assert_eq!(counts.get("00"), Some(&1));
        assert_eq!(counts.get("11"), Some(&2));
    }
}
