//! Runs a 1000-shot Bell-pair job against the local simulator pilot,
//! end to end: format registry -> transpile graph -> orchestrator ->
//! pilot, then prints the resulting counts.

use qrelay_demos::{build_sync_demo_orchestrator, DEMO_DEVICE};
use qrelay_domain::{DeploymentId, FormatId, JobType, ProgramId, ProgramSource, QuantumProgram};
use qrelay_orchestrator::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let (orchestrator, store) = build_sync_demo_orchestrator().await;

    let deployment_id = DeploymentId::new();
    let program = QuantumProgram {
        id: ProgramId::new(),
        deployment_id,
        format: FormatId::Qasm2,
        source: ProgramSource::Text(bell_pair_qasm2()),
    };
    let job = qrelay_domain::Job::new(
        None,
        DEMO_DEVICE,
        deployment_id,
        vec![program],
        1000,
        JobType::Runner,
        Some("bell-pair-demo".to_string()),
    );

    let job_id = orchestrator
        .submit(job)
        .await
        .expect("submitting against the demo-registered device never fails");

    let finished = store.get_job(job_id).await.unwrap().unwrap();
    println!("job {job_id} reached state {:?}", finished.state);

    for row in store.list_results(job_id).await.unwrap() {
        println!("{:?}: {}", row.kind, row.data);
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
