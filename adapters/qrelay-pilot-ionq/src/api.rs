//! IonQ REST API client wrapper (`api.ionq.co/v0.3`).

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::circuit::IonqCircuit;
use crate::error::{IonqError, IonqResult};

const DEFAULT_ENDPOINT: &str = "https://api.ionq.co/v0.3";

/// IonQ API client.
pub struct IonqClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl IonqClient {
    pub fn new(token: impl Into<String>) -> IonqResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
        })
    }

    fn auth_header(&self) -> String {
        format!("apiKey {}", self.token)
    }

    pub async fn submit_job(
        &self,
        device_name: &str,
        circuit: &IonqCircuit,
        shots: u32,
    ) -> IonqResult<String> {
        let body = serde_json::json!({
            "target": device_name,
            "shots": shots,
            "input": {
                "format": "ionq.circuit.v0",
                "qubits": circuit.qubits,
                "circuit": circuit.circuit,
            },
        });

        let resp = self
            .http
            .post(format!("{}/jobs", self.endpoint))
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let parsed: SubmitJobResponse = resp.json().await?;
        Ok(parsed.id)
    }

    pub async fn get_job_status(&self, job_id: &str) -> IonqResult<JobStatusResponse> {
        let resp = self
            .http
            .get(format!("{}/jobs/{job_id}", self.endpoint))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IonqError::JobNotFound(job_id.to_string()));
        }
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn get_job_results(
        &self,
        job_id: &str,
    ) -> IonqResult<HashMap<String, f64>> {
        let resp = self
            .http
            .get(format!("{}/jobs/{job_id}/results", self.endpoint))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn cancel_job(&self, job_id: &str) -> IonqResult<()> {
        let resp = self
            .http
            .put(format!("{}/jobs/{job_id}/status/cancel", self.endpoint))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn list_backends(&self) -> IonqResult<Vec<BackendInfo>> {
        let resp = self
            .http
            .get(format!("{}/backends", self.endpoint))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    pub async fn get_backend(&self, name: &str) -> IonqResult<BackendInfo> {
        let resp = self
            .http
            .get(format!("{}/backends/{name}", self.endpoint))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IonqError::BackendUnavailable(name.to_string()));
        }
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> IonqResult<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let message = resp
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(IonqError::ApiError {
            message: format!("unauthorized: {message}"),
        });
    }
    Err(IonqError::ApiError {
        message: format!("{status}: {message}"),
    })
}

#[derive(Debug, Deserialize)]
struct SubmitJobResponse {
    id: String,
}

/// Job status payload from `GET /jobs/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub status: String,
    #[serde(default)]
    pub qubits: Option<u32>,
    #[serde(default)]
    pub failure: Option<FailureInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailureInfo {
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusResponse {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "completed" | "failed" | "canceled" | "aborted"
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "aborted")
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == "canceled"
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure.as_ref().and_then(|f| f.error.clone())
    }
}

/// Device/backend info from `GET /backends`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendInfo {
    pub backend: String,
    #[serde(default)]
    pub qubits: Option<u32>,
    pub status: String,
}

impl BackendInfo {
    pub fn is_simulator(&self) -> bool {
        self.backend == "simulator" || self.backend.starts_with("simulator.")
    }

    pub fn is_available(&self) -> bool {
        self.status == "available"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_terminal_states() {
        let status = |s: &str| JobStatusResponse {
            status: s.to_string(),
            qubits: None,
            failure: None,
        };
        assert!(status("completed").is_terminal());
        assert!(status("failed").is_terminal());
        assert!(status("canceled").is_terminal());
        assert!(!status("running").is_terminal());
        assert!(!status("ready").is_terminal());
    }

    #[test]
    fn backend_info_simulator_detection() {
        let backend = BackendInfo {
            backend: "simulator".to_string(),
            qubits: Some(29),
            status: "available".to_string(),
        };
        assert!(backend.is_simulator());
        assert!(backend.is_available());
    }

    #[test]
    fn backend_info_qpu_is_not_simulator() {
        let backend = BackendInfo {
            backend: "qpu.harmony".to_string(),
            qubits: Some(11),
            status: "available".to_string(),
        };
        assert!(!backend.is_simulator());
    }
}
