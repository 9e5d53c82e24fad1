//! [`SimPilot`]: the `Pilot` impl wrapping the statevector engine.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, instrument};

use qrelay_domain::{
    Deployment, Device, FormatId, Job, JobState, JobType, PreparedCircuit, Provider, ProgramId,
    ProgramSource, QuantumProgram, ResultKind, ResultRow, UserId,
};
use qrelay_pilot::{DeviceRegistrar, Pilot, PilotError, PilotResult};

use crate::statevector::Statevector;

const SUPPORTED_FORMATS: [FormatId; 2] = [FormatId::Qasm2, FormatId::Qasm3];

/// Local in-process simulator. Every `run`/`execute_provider_specific` call
/// runs to completion before returning, so there is never a window in which
/// `cancel` could observe a job mid-flight — it always fails with
/// [`PilotError::CancelUnsupported`].
pub struct SimPilot {
    max_qubits: u32,
}

impl SimPilot {
    pub fn new() -> Self {
        Self { max_qubits: 20 }
    }

    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self { max_qubits }
    }

    #[instrument(skip(self, circuit), fields(num_qubits = circuit.num_qubits, shots))]
    fn run_simulation(&self, circuit: &PreparedCircuit, shots: u32) -> rustc_hash::FxHashMap<String, u64> {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits as usize;

        let mut counts: rustc_hash::FxHashMap<String, u64> = rustc_hash::FxHashMap::default();

        for shot in 0..shots {
            let mut sv = Statevector::new(num_qubits);
            for inst in &circuit.instructions {
                sv.apply(inst);
            }
            let outcome = sv.sample();
            let bitstring = sv.outcome_to_bitstring(outcome);
            *counts.entry(bitstring).or_insert(0) += 1;

            if shot > 0 && shot % 1000 == 0 {
                debug!(shot, "shots completed");
            }
        }

        debug!(elapsed = ?start.elapsed(), "simulation completed");
        counts
    }
}

impl Default for SimPilot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pilot for SimPilot {
    fn provider_name(&self) -> &str {
        "simulator"
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
        let mut rows = Vec::with_capacity(circuits.len());
        for (program_id, circuit) in circuits {
            if circuit.num_qubits > self.max_qubits {
                return Err(PilotError::InvalidCircuit(format!(
                    "circuit has {} qubits but simulator only supports {}",
                    circuit.num_qubits, self.max_qubits
                )));
            }
            let raw_counts = self.run_simulation(circuit, job.shots);
            let hex_counts = qrelay_normalize::binary_to_hex(&raw_counts, false)
                .map_err(|e| PilotError::Internal(e.to_string()))?;
            let probabilities = qrelay_normalize::counts_to_probabilities(&hex_counts);

            rows.push(ResultRow::new(
                job.id,
                Some(*program_id),
                ResultKind::Counts,
                serde_json::to_value(&hex_counts).expect("counts map serializes"),
                serde_json::json!({ "shots": job.shots }),
            ));
            rows.push(ResultRow::new(
                job.id,
                Some(*program_id),
                ResultKind::Probabilities,
                serde_json::to_value(&probabilities).expect("probabilities map serializes"),
                serde_json::json!({ "shots": job.shots }),
            ));
        }
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

    async fn cancel(&self, _job: &Job, _user: &Option<UserId>, _token: Option<&str>) -> PilotResult<()> {
        Err(PilotError::CancelUnsupported)
    }

    fn default_provider(&self) -> Provider {
        Provider {
            name: "simulator".to_string(),
            with_token: false,
            supported_formats: SUPPORTED_FORMATS.to_vec(),
        }
    }

    fn default_job(&self, device: &Device) -> (Job, Deployment) {
        let mut deployment = Deployment::new(None, "simulator-bell-pair-smoke-test");
        let program = QuantumProgram {
            id: ProgramId::new(),
            deployment_id: deployment.id,
            format: FormatId::Qasm2,
            source: ProgramSource::Text(bell_pair_qasm2()),
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
        sink.upsert_device(Device {
            provider: "simulator".to_string(),
            name: "local_simulator".to_string(),
            num_qubits: self.max_qubits as i64,
            is_simulator: true,
            is_local: true,
        })
        .await
    }

    async fn is_device_available(&self, _device: &Device, _token: Option<&str>) -> PilotResult<bool> {
        Ok(true)
    }

    async fn device_data(&self, device: &Device, _token: Option<&str>) -> PilotResult<serde_json::Value> {
        Ok(serde_json::json!({
            "provider": device.provider,
            "name": device.name,
            "max_qubits": self.max_qubits,
            "is_simulator": true,
        }))
    }
}

fn bell_pair_qasm2() -> String {
    r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q[0] -> c[0];
measure q[1] -> c[1];
"#
    .to_string()
}
