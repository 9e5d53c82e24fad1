//! The transpile-then-dispatch sequence (spec §4.5 steps 3–7), extracted
//! into one function used by both the synchronous caller path and the
//! worker loop — the teacher's `job_execution.rs` duplicates this logic
//! between `execute_job_sync` and `spawn_job_execution` with a `// TODO`
//! admitting it should be extracted; this repo does the extraction.

use std::sync::Arc;

use qrelay_domain::{Job, JobId, JobState, PreparedCircuit, ProgramId, ProgramSource, QuantumProgram, ResultRow};
use qrelay_format::FormatRegistry;
use qrelay_pilot::{Pilot, PilotError};
use qrelay_transpile::TranspileGraph;
use rustc_hash::FxHashMap;
use tracing::{info, instrument, warn};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::storage::Store;

/// Provider name -> pilot driving that provider.
pub type PilotRegistry = FxHashMap<String, Arc<dyn Pilot>>;

/// Runs the full transpile-then-dispatch sequence for a READY job and
/// returns the terminal state it reached. Persists every state transition
/// and result row along the way (persist-before-transition: result rows
/// for a program are appended before the job's own state is flipped to a
/// terminal state, per spec §5's ordering guarantee).
#[instrument(skip(store, formats, transpiler, pilots, config), fields(job_id = %job_id))]
pub async fn dispatch(
    job_id: JobId,
    store: &dyn Store,
    formats: &FormatRegistry,
    transpiler: &TranspileGraph,
    pilots: &PilotRegistry,
    config: &OrchestratorConfig,
) -> OrchestratorResult<JobState> {
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| OrchestratorError::Storage(format!("job not found: {job_id}")))?;

    let (provider, pilot) = resolve_pilot(&job, store, pilots).await?;

    store.update_state(job_id, JobState::Running).await?;
    info!(provider = %provider, device = %job.device, "job running");

    let mut circuits = Vec::new();
    let mut any_transpile_succeeded = false;

    for program in &job.programs {
        match prepare_program(formats, transpiler, pilot.as_ref(), program) {
            Ok(prepared) => {
                any_transpile_succeeded = true;
                circuits.push((program.id, prepared));
            }
            Err(e) => {
                warn!(program_id = %program.id, error = %e, "transpile failed for program");
                store
                    .append_results(vec![ResultRow::error(job_id, Some(program.id), e.to_string(), "")])
                    .await?;
            }
        }
    }

    if !any_transpile_succeeded {
        store.update_state(job_id, JobState::Error).await?;
        return Ok(JobState::Error);
    }

    let token = config.provider_token(&provider);
    let outcome = run_with_retry(pilot.as_ref(), &job, &circuits, token.as_deref(), config).await;

    let final_state = match outcome {
        Ok((state, rows)) => {
            if !rows.is_empty() {
                store.append_results(rows).await?;
            }
            state
        }
        Err(e) => {
            store
                .append_results(vec![ResultRow::error(job_id, None, e.to_string(), "")])
                .await?;
            JobState::Error
        }
    };

    store.update_state(job_id, final_state).await?;
    Ok(final_state)
}

async fn resolve_pilot(
    job: &Job,
    store: &dyn Store,
    pilots: &PilotRegistry,
) -> OrchestratorResult<(String, Arc<dyn Pilot>)> {
    for (provider, pilot) in pilots {
        if store.get_device(provider, &job.device).await?.is_some() {
            return Ok((provider.clone(), pilot.clone()));
        }
    }
    Err(OrchestratorError::UnknownDevice(job.device.clone()))
}

fn prepare_program(
    formats: &FormatRegistry,
    transpiler: &TranspileGraph,
    pilot: &dyn Pilot,
    program: &QuantumProgram,
) -> OrchestratorResult<PreparedCircuit> {
    let source = match &program.source {
        ProgramSource::Text(text) => text,
        ProgramSource::PythonFile { .. } => {
            return Err(OrchestratorError::UnknownProvider(
                "python-file sources require the file-upload/file-run pilot path".to_string(),
            ));
        }
    };

    let prepared = formats.preprocess(program.format, source)?;
    let plan = transpiler.plan(program.format, pilot.supported_formats())?;
    Ok(plan.compile(prepared)?)
}

/// Retries the pilot's provider call with exponential backoff, matching
/// `arvak_grpc::server::service::job_execution`'s attempt loop, but only
/// around the provider call — transpile failures above are per-program and
/// terminal.
async fn run_with_retry(
    pilot: &dyn Pilot,
    job: &Job,
    circuits: &[(ProgramId, PreparedCircuit)],
    token: Option<&str>,
    config: &OrchestratorConfig,
) -> Result<(JobState, Vec<ResultRow>), PilotError> {
    let mut last_error = None;

    for attempt in 0..config.max_retry_attempts {
        if attempt > 0 {
            let backoff = config.retry_backoff_base * (1 << attempt);
            warn!(attempt = attempt + 1, ?backoff, "retrying after transient pilot failure");
            tokio::time::sleep(backoff).await;
        }

        match run_job_type(pilot, job, circuits, token).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) if e.is_transient() && attempt + 1 < config.max_retry_attempts => {
                last_error = Some(e);
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(PilotError::Internal("exhausted retries with no recorded error".to_string())))
}

async fn run_job_type(
    pilot: &dyn Pilot,
    job: &Job,
    circuits: &[(ProgramId, PreparedCircuit)],
    token: Option<&str>,
) -> Result<(JobState, Vec<ResultRow>), PilotError> {
    use qrelay_domain::JobType::*;
    match job.job_type {
        Runner => pilot.run(job, circuits, token).await,
        Sampler | Estimator | FileUpload | FileRun => {
            pilot.execute_provider_specific(job, circuits, job.job_type, token).await
        }
    }
}
