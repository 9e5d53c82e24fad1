//! [`RigettiPilot`]: the `Pilot` impl wrapping the local statevector engine.
//!
//! The Rigetti integration this is grounded on never had a working remote
//! path — its local-QVM branch was dead code and its cloud branch shipped
//! with empty, hardcoded credentials. The only behavior it reliably exposed
//! was simulating against a fixed `"9q-qvm"` device, so that's what this
//! pilot does, reusing [`qrelay_pilot_sim::Statevector`] rather than
//! duplicating its gate matrices.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, instrument};

use qrelay_domain::{
    Deployment, Device, FormatId, Job, JobState, JobType, PreparedCircuit, Provider, ProgramId,
    ProgramSource, QuantumProgram, ResultKind, ResultRow, UserId,
};
use qrelay_pilot::{DeviceRegistrar, Pilot, PilotError, PilotResult};
use qrelay_pilot_sim::Statevector;

use crate::error::RigettiError;

/// The only device this pilot ever registers, matching the Python source's
/// `save_devices_from_provider`, which always inserts exactly one row for
/// `"9q-qvm"` with an unbounded (`-1`) qubit count.
pub const DEVICE_NAME: &str = "9q-qvm";

const SUPPORTED_FORMATS: [FormatId; 1] = [FormatId::QuilText];

/// Local QVM-style simulator. Like [`qrelay_pilot_sim::SimPilot`], every
/// `run` call completes synchronously, so `cancel` never has anything to
/// interrupt.
pub struct RigettiPilot {
    max_qubits: u32,
}

impl RigettiPilot {
    pub fn new() -> Self {
        Self { max_qubits: 9 }
    }

    #[instrument(skip(self, circuit), fields(num_qubits = circuit.num_qubits, shots))]
    fn run_simulation(&self, circuit: &PreparedCircuit, shots: u32) -> rustc_hash::FxHashMap<String, u64> {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits as usize;

        let mut counts: rustc_hash::FxHashMap<String, u64> = rustc_hash::FxHashMap::default();
        for _ in 0..shots {
            let mut sv = Statevector::new(num_qubits);
            for inst in &circuit.instructions {
                sv.apply(inst);
            }
            let outcome = sv.sample();
            let bitstring = sv.outcome_to_bitstring(outcome);
            *counts.entry(bitstring).or_insert(0) += 1;
        }

        debug!(elapsed = ?start.elapsed(), "rigetti qvm simulation completed");
        counts
    }
}

impl Default for RigettiPilot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pilot for RigettiPilot {
    fn provider_name(&self) -> &str {
        "rigetti"
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
                let err: PilotError = RigettiError::TooManyQubits {
                    required: circuit.num_qubits,
                    available: self.max_qubits,
                }
                .into();
                return Err(err);
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
                serde_json::json!({ "shots": job.shots, "device": DEVICE_NAME }),
            ));
            rows.push(ResultRow::new(
                job.id,
                Some(*program_id),
                ResultKind::Probabilities,
                serde_json::to_value(&probabilities).expect("probabilities map serializes"),
                serde_json::json!({ "shots": job.shots, "device": DEVICE_NAME }),
            ));
        }
        Ok((JobState::Finished, rows))
    }

    /// The Python pilot always raises on its provider-specific path — there
    /// was never a working SAMPLER/ESTIMATOR implementation to carry
    /// forward, so every job type but RUNNER stays unsupported.
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
            name: "rigetti".to_string(),
            with_token: false,
            supported_formats: SUPPORTED_FORMATS.to_vec(),
        }
    }

    fn default_job(&self, device: &Device) -> (Job, Deployment) {
        let mut deployment = Deployment::new(None, "rigetti-bell-pair-smoke-test");
        let program = QuantumProgram {
            id: ProgramId::new(),
            deployment_id: deployment.id,
            format: FormatId::QuilText,
            source: ProgramSource::Text(bell_pair_quil()),
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
            provider: "rigetti".to_string(),
            name: DEVICE_NAME.to_string(),
            num_qubits: -1,
            is_simulator: true,
            is_local: false,
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

fn bell_pair_quil() -> String {
    r#"DECLARE ro BIT[2]
H 0
CNOT 0 1
MEASURE 0 ro[0]
MEASURE 1 ro[1]
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_domain::{ClbitId, DeploymentId, Instruction, QubitId};

    fn bell_circuit() -> PreparedCircuit {
        let mut circuit = PreparedCircuit::new(2, 2);
        circuit.push(Instruction::gate("h", vec![QubitId(0)], vec![]));
        circuit.push(Instruction::gate("cx", vec![QubitId(0), QubitId(1)], vec![]));
        circuit.push(Instruction::measure(QubitId(0), ClbitId(0)));
        circuit.push(Instruction::measure(QubitId(1), ClbitId(1)));
        circuit
    }

    fn bell_job(shots: u32) -> (Job, ProgramId) {
        let deployment_id = DeploymentId::new();
        let program_id = ProgramId::new();
        let program = QuantumProgram {
            id: program_id,
            deployment_id,
            format: FormatId::QuilText,
            source: ProgramSource::Text(bell_pair_quil()),
        };
        let job = Job::new(None, DEVICE_NAME, deployment_id, vec![program], shots, JobType::Runner, None);
        (job, program_id)
    }

    #[tokio::test]
    async fn bell_pair_only_yields_00_and_11() {
        let pilot = RigettiPilot::new();
        let (job, program_id) = bell_job(500);
        let circuits = vec![(program_id, bell_circuit())];

        let (state, rows) = pilot.run(&job, &circuits, None).await.unwrap();
        assert_eq!(state, JobState::Finished);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, ResultKind::Counts);
        assert_eq!(rows[1].kind, ResultKind::Probabilities);

        let counts = rows[0].data.as_object().unwrap();
        let total: u64 = counts.values().map(|v| v.as_u64().unwrap()).sum();
        assert_eq!(total, 500);
        for key in counts.keys() {
            assert!(key == "0x0" || key == "0x3", "unexpected outcome {key}");
        }

        let probabilities = rows[1].data.as_object().unwrap();
        let total_prob: f64 = probabilities.values().map(|v| v.as_f64().unwrap()).sum();
        assert!((total_prob - 1.0).abs() < 1e-9);
        for key in probabilities.keys() {
            assert!(key == "0x0" || key == "0x3", "unexpected outcome {key}");
        }
    }

    #[tokio::test]
    async fn oversized_circuit_is_rejected() {
        let pilot = RigettiPilot::new();
        let deployment_id = DeploymentId::new();
        let program_id = ProgramId::new();
        let mut circuit = PreparedCircuit::new(10, 0);
        circuit.push(Instruction::gate("h", vec![QubitId(0)], vec![]));
        let program = QuantumProgram {
            id: program_id,
            deployment_id,
            format: FormatId::QuilText,
            source: ProgramSource::Text(bell_pair_quil()),
        };
        let job = Job::new(None, DEVICE_NAME, deployment_id, vec![program], 10, JobType::Runner, None);

        let err = pilot.run(&job, &[(program_id, circuit)], None).await.unwrap_err();
        assert!(matches!(err, PilotError::InvalidCircuit(_)));
    }

    #[tokio::test]
    async fn cancel_is_never_supported() {
        let pilot = RigettiPilot::new();
        let (job, _) = bell_job(1);
        let err = pilot.cancel(&job, &None, None).await.unwrap_err();
        assert!(matches!(err, PilotError::CancelUnsupported));
    }

    #[tokio::test]
    async fn device_is_always_available() {
        let pilot = RigettiPilot::new();
        let device = Device {
            provider: "rigetti".to_string(),
            name: DEVICE_NAME.to_string(),
            num_qubits: -1,
            is_simulator: true,
            is_local: false,
        };
        assert!(pilot.is_device_available(&device, None).await.unwrap());
    }

    #[tokio::test]
    async fn estimator_job_type_is_unsupported() {
        let pilot = RigettiPilot::new();
        let (job, program_id) = bell_job(1);
        let circuits = vec![(program_id, bell_circuit())];

        let err = pilot
            .execute_provider_specific(&job, &circuits, JobType::Estimator, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::UnsupportedJobType(_)));
    }
}
