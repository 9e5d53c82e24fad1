//! SQLite-backed store, behind the `sqlite` feature.
//!
//! Mirrors `arvak_grpc::storage::sqlite::SqliteStorage`: a single
//! `Arc<Mutex<Connection>>`, schema created with `CREATE TABLE IF NOT
//! EXISTS` at open time (no migration framework), every query run via
//! `tokio::task::spawn_blocking` since `rusqlite::Connection` is not `Send`
//! across an `.await` point.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use qrelay_domain::{Deployment, DeploymentId, Device, Job, JobId, JobState, QuantumProgram, ResultRow, UserId};
use rusqlite::{Connection, OptionalExtension, params};
use tokio::task;

use super::{JobFilter, Store};
use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if absent) the database at `path` and ensures the
    /// schema exists.
    ///
    /// Acquires a blocking `Mutex` to run schema setup, so call this outside
    /// of an async context or inside `spawn_blocking`.
    pub fn open<P: AsRef<Path>>(path: P) -> OrchestratorResult<Self> {
        let conn = Connection::open(path).map_err(sqlite_err)?;
        conn.execute("PRAGMA foreign_keys = ON", []).map_err(sqlite_err)?;
        let store = Self {
            connection: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> OrchestratorResult<()> {
        let conn = self.connection.lock().map_err(|_| poison_err())?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                owner TEXT,
                device TEXT NOT NULL,
                deployment_id TEXT NOT NULL,
                programs_json TEXT NOT NULL,
                shots INTEGER NOT NULL,
                job_type TEXT NOT NULL,
                name TEXT,
                state TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                provider_job_id TEXT,
                backend_state_json TEXT
            )",
            [],
        )
        .map_err(sqlite_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS job_results (
                result_id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL,
                program_id TEXT,
                kind TEXT NOT NULL,
                data_json TEXT NOT NULL,
                meta_json TEXT NOT NULL,
                FOREIGN KEY (job_id) REFERENCES jobs(job_id) ON DELETE CASCADE
            )",
            [],
        )
        .map_err(sqlite_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS devices (
                provider TEXT NOT NULL,
                name TEXT NOT NULL,
                num_qubits INTEGER NOT NULL,
                is_simulator INTEGER NOT NULL,
                is_local INTEGER NOT NULL,
                PRIMARY KEY (provider, name)
            )",
            [],
        )
        .map_err(sqlite_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS deployments (
                deployment_id TEXT PRIMARY KEY,
                owner TEXT,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                programs_json TEXT NOT NULL
            )",
            [],
        )
        .map_err(sqlite_err)?;

        conn.execute("CREATE INDEX IF NOT EXISTS idx_jobs_owner ON jobs(owner)", [])
            .map_err(sqlite_err)?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state)", [])
            .map_err(sqlite_err)?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_jobs_device ON jobs(device)", [])
            .map_err(sqlite_err)?;

        Ok(())
    }
}

fn sqlite_err(e: rusqlite::Error) -> OrchestratorError {
    OrchestratorError::Storage(e.to_string())
}

fn poison_err() -> OrchestratorError {
    OrchestratorError::Storage("database lock poisoned".to_string())
}

fn join_err(e: task::JoinError) -> OrchestratorError {
    OrchestratorError::Storage(format!("blocking task join error: {e}"))
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let job_id: String = row.get(0)?;
    let owner: Option<String> = row.get(1)?;
    let programs_json: String = row.get(4)?;
    let job_type_json: String = row.get(6)?;
    let state_json: String = row.get(8)?;
    let backend_state_json: Option<String> = row.get(12)?;

    let from_json_err = |e: serde_json::Error| rusqlite::Error::ToSqlConversionFailure(Box::new(e));

    Ok(Job {
        id: JobId(uuid::Uuid::parse_str(&job_id).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?),
        owner: owner.map(UserId),
        device: row.get(2)?,
        deployment_id: DeploymentId(
            uuid::Uuid::parse_str(&row.get::<_, String>(3)?)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
        ),
        programs: serde_json::from_str::<Vec<QuantumProgram>>(&programs_json).map_err(from_json_err)?,
        shots: row.get::<_, i64>(5)? as u32,
        job_type: serde_json::from_str(&job_type_json).map_err(from_json_err)?,
        name: row.get(7)?,
        state: serde_json::from_str(&state_json).map_err(from_json_err)?,
        created_at: chrono::DateTime::from_timestamp(row.get(9)?, 0).unwrap_or_else(chrono::Utc::now),
        updated_at: chrono::DateTime::from_timestamp(row.get(10)?, 0).unwrap_or_else(chrono::Utc::now),
        provider_job_id: row.get(11)?,
        backend_state: backend_state_json
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(from_json_err)?,
    })
}

const JOB_COLUMNS: &str = "job_id, owner, device, deployment_id, programs_json, shots, job_type, name, state, created_at, updated_at, provider_job_id, backend_state_json";

#[async_trait]
impl Store for SqliteStore {
    async fn create_job(&self, job: Job) -> OrchestratorResult<()> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.execute(
                &format!("INSERT OR REPLACE INTO jobs ({JOB_COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)"),
                params![
                    job.id.0.to_string(),
                    job.owner.as_ref().map(|u| u.0.clone()),
                    job.device,
                    job.deployment_id.0.to_string(),
                    serde_json::to_string(&job.programs).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                    job.shots as i64,
                    serde_json::to_string(&job.job_type).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                    job.name,
                    serde_json::to_string(&job.state).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                    job.created_at.timestamp(),
                    job.updated_at.timestamp(),
                    job.provider_job_id,
                    job.backend_state
                        .as_ref()
                        .map(serde_json::to_string)
                        .transpose()
                        .map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                ],
            )
            .map_err(sqlite_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn get_job(&self, id: JobId) -> OrchestratorResult<Option<Job>> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = ?1"),
                params![id.0.to_string()],
                row_to_job,
            )
            .optional()
            .map_err(sqlite_err)
        })
        .await
        .map_err(join_err)?
    }

    async fn update_state(&self, id: JobId, state: JobState) -> OrchestratorResult<()> {
        let existing = self
            .get_job(id)
            .await?
            .ok_or_else(|| OrchestratorError::Storage(format!("job not found: {id}")))?;
        if !existing.state.can_transition_to(state) {
            return Err(qrelay_domain::DomainError::InvalidStateTransition {
                from: existing.state.to_string(),
                to: state.to_string(),
            }
            .into());
        }

        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.execute(
                "UPDATE jobs SET state = ?1, updated_at = ?2 WHERE job_id = ?3",
                params![
                    serde_json::to_string(&state).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                    chrono::Utc::now().timestamp(),
                    id.0.to_string(),
                ],
            )
            .map_err(sqlite_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn set_provider_job_id(&self, id: JobId, provider_job_id: String) -> OrchestratorResult<()> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.execute(
                "UPDATE jobs SET provider_job_id = ?1 WHERE job_id = ?2",
                params![provider_job_id, id.0.to_string()],
            )
            .map_err(sqlite_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn append_results(&self, rows: Vec<ResultRow>) -> OrchestratorResult<()> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            for row in rows {
                conn.execute(
                    "INSERT OR REPLACE INTO job_results (result_id, job_id, program_id, kind, data_json, meta_json)
                     VALUES (?1,?2,?3,?4,?5,?6)",
                    params![
                        row.id.0.to_string(),
                        row.job_id.0.to_string(),
                        row.program_id.map(|p| p.0.to_string()),
                        serde_json::to_string(&row.kind).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                        row.data.to_string(),
                        row.meta.to_string(),
                    ],
                )
                .map_err(sqlite_err)?;
            }
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn list_results(&self, job_id: JobId) -> OrchestratorResult<Vec<ResultRow>> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            let mut stmt = conn
                .prepare("SELECT result_id, job_id, program_id, kind, data_json, meta_json FROM job_results WHERE job_id = ?1")
                .map_err(sqlite_err)?;
            let rows = stmt
                .query_map(params![job_id.0.to_string()], |row| {
                    let from_json_err = |e: serde_json::Error| rusqlite::Error::ToSqlConversionFailure(Box::new(e));
                    let kind_json: String = row.get(3)?;
                    let data_json: String = row.get(4)?;
                    let meta_json: String = row.get(5)?;
                    let program_id: Option<String> = row.get(2)?;
                    Ok(ResultRow {
                        id: qrelay_domain::ResultId(
                            uuid::Uuid::parse_str(&row.get::<_, String>(0)?)
                                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
                        ),
                        job_id: JobId(
                            uuid::Uuid::parse_str(&row.get::<_, String>(1)?)
                                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
                        ),
                        program_id: program_id
                            .map(|p| uuid::Uuid::parse_str(&p).map(qrelay_domain::ProgramId))
                            .transpose()
                            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
                        kind: serde_json::from_str(&kind_json).map_err(from_json_err)?,
                        data: serde_json::from_str(&data_json).map_err(from_json_err)?,
                        meta: serde_json::from_str(&meta_json).map_err(from_json_err)?,
                    })
                })
                .map_err(sqlite_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(sqlite_err)?;
            Ok(rows)
        })
        .await
        .map_err(join_err)?
    }

    async fn list_jobs(&self, filter: JobFilter) -> OrchestratorResult<Vec<Job>> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;

            let mut query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE (owner IS NULL OR owner = ?1)");
            let owner_param = filter.owner.as_ref().map(|u| u.0.clone()).unwrap_or_default();
            let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_param)];

            if let Some(state) = &filter.state {
                query.push_str(" AND state = ?");
                sql_params.push(Box::new(
                    serde_json::to_string(state).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                ));
            }
            if let Some(device) = &filter.device {
                query.push_str(" AND device = ?");
                sql_params.push(Box::new(device.clone()));
            }
            query.push_str(" ORDER BY created_at DESC LIMIT ?");
            sql_params.push(Box::new(filter.limit as i64));

            let mut stmt = conn.prepare(&query).map_err(sqlite_err)?;
            let param_refs: Vec<&dyn rusqlite::ToSql> = sql_params.iter().map(|p| p.as_ref()).collect();
            let jobs = stmt
                .query_map(param_refs.as_slice(), row_to_job)
                .map_err(sqlite_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(sqlite_err)?;
            Ok(jobs)
        })
        .await
        .map_err(join_err)?
    }

    async fn delete_job(&self, id: JobId) -> OrchestratorResult<()> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.execute("DELETE FROM job_results WHERE job_id = ?1", params![id.0.to_string()])
                .map_err(sqlite_err)?;
            conn.execute("DELETE FROM jobs WHERE job_id = ?1", params![id.0.to_string()])
                .map_err(sqlite_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn upsert_device(&self, device: Device) -> OrchestratorResult<()> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.execute(
                "INSERT OR REPLACE INTO devices (provider, name, num_qubits, is_simulator, is_local)
                 VALUES (?1,?2,?3,?4,?5)",
                params![
                    device.provider,
                    device.name,
                    device.num_qubits,
                    device.is_simulator,
                    device.is_local,
                ],
            )
            .map_err(sqlite_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn list_devices(&self, provider: &str) -> OrchestratorResult<Vec<Device>> {
        let conn = self.connection.clone();
        let provider = provider.to_string();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            let mut stmt = conn
                .prepare("SELECT provider, name, num_qubits, is_simulator, is_local FROM devices WHERE provider = ?1")
                .map_err(sqlite_err)?;
            let devices = stmt
                .query_map(params![provider], |row| {
                    Ok(Device {
                        provider: row.get(0)?,
                        name: row.get(1)?,
                        num_qubits: row.get(2)?,
                        is_simulator: row.get(3)?,
                        is_local: row.get(4)?,
                    })
                })
                .map_err(sqlite_err)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(sqlite_err)?;
            Ok(devices)
        })
        .await
        .map_err(join_err)?
    }

    async fn get_device(&self, provider: &str, name: &str) -> OrchestratorResult<Option<Device>> {
        let conn = self.connection.clone();
        let provider = provider.to_string();
        let name = name.to_string();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.query_row(
                "SELECT provider, name, num_qubits, is_simulator, is_local FROM devices WHERE provider = ?1 AND name = ?2",
                params![provider, name],
                |row| {
                    Ok(Device {
                        provider: row.get(0)?,
                        name: row.get(1)?,
                        num_qubits: row.get(2)?,
                        is_simulator: row.get(3)?,
                        is_local: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(sqlite_err)
        })
        .await
        .map_err(join_err)?
    }

    async fn create_deployment(&self, deployment: Deployment) -> OrchestratorResult<()> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.execute(
                "INSERT OR REPLACE INTO deployments (deployment_id, owner, name, created_at, programs_json)
                 VALUES (?1,?2,?3,?4,?5)",
                params![
                    deployment.id.0.to_string(),
                    deployment.owner.as_ref().map(|u| u.0.clone()),
                    deployment.name,
                    deployment.created_at.timestamp(),
                    serde_json::to_string(&deployment.programs).map_err(|e| OrchestratorError::Storage(e.to_string()))?,
                ],
            )
            .map_err(sqlite_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn get_deployment(&self, id: DeploymentId) -> OrchestratorResult<Option<Deployment>> {
        let conn = self.connection.clone();
        task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poison_err())?;
            conn.query_row(
                "SELECT deployment_id, owner, name, created_at, programs_json FROM deployments WHERE deployment_id = ?1",
                params![id.0.to_string()],
                |row| {
                    let from_json_err = |e: serde_json::Error| rusqlite::Error::ToSqlConversionFailure(Box::new(e));
                    let programs_json: String = row.get(4)?;
                    let owner: Option<String> = row.get(1)?;
                    Ok(Deployment {
                        id: DeploymentId(
                            uuid::Uuid::parse_str(&row.get::<_, String>(0)?)
                                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?,
                        ),
                        owner: owner.map(UserId),
                        name: row.get(2)?,
                        created_at: chrono::DateTime::from_timestamp(row.get(3)?, 0).unwrap_or_else(chrono::Utc::now),
                        programs: serde_json::from_str(&programs_json).map_err(from_json_err)?,
                    })
                },
            )
            .optional()
            .map_err(sqlite_err)
        })
        .await
        .map_err(join_err)?
    }
}

/// Bridges this store to the narrow capability `qrelay-pilot` needs.
#[async_trait]
impl qrelay_pilot::DeviceRegistrar for SqliteStore {
    async fn upsert_device(&self, device: Device) -> qrelay_pilot::PilotResult<()> {
        Store::upsert_device(self, device)
            .await
            .map_err(|e| qrelay_pilot::PilotError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_domain::JobType;

    #[tokio::test]
    async fn lifecycle_round_trips_through_sqlite() {
        let store = SqliteStore::open(":memory:").unwrap();
        let job = Job::new(None, "local", DeploymentId::new(), vec![], 1000, JobType::Runner, None);
        let id = job.id;

        store.create_job(job).await.unwrap();
        let fetched = store.get_job(id).await.unwrap().unwrap();
        assert_eq!(fetched.state, JobState::Ready);

        store.update_state(id, JobState::Running).await.unwrap();
        let fetched = store.get_job(id).await.unwrap().unwrap();
        assert_eq!(fetched.state, JobState::Running);

        store.delete_job(id).await.unwrap();
        assert!(store.get_job(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected_before_writing() {
        let store = SqliteStore::open(":memory:").unwrap();
        let job = Job::new(None, "local", DeploymentId::new(), vec![], 1000, JobType::Runner, None);
        let id = job.id;
        store.create_job(job).await.unwrap();

        let err = store.update_state(id, JobState::Finished).await;
        assert!(err.is_err());
        let fetched = store.get_job(id).await.unwrap().unwrap();
        assert_eq!(fetched.state, JobState::Ready);
    }

    #[tokio::test]
    async fn devices_round_trip() {
        let store = SqliteStore::open(":memory:").unwrap();
        let device = Device {
            provider: "local".to_string(),
            name: "qasm_simulator".to_string(),
            num_qubits: 32,
            is_simulator: true,
            is_local: true,
        };
        store.upsert_device(device.clone()).await.unwrap();
        let fetched = store.get_device("local", "qasm_simulator").await.unwrap().unwrap();
        assert_eq!(fetched, device);
        assert_eq!(store.list_devices("local").await.unwrap().len(), 1);
    }
}
