//! Client for the external run/repair service.
//!
//! Both endpoints are plain JSON request/response calls. The trait seam lets
//! the controller be exercised against a mock service in tests.

use crate::model::{Patch, SessionConfig};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error kind the run endpoint reports when execution succeeded.
pub(crate) const RUN_OK_SENTINEL: &str = "NONE";

/// Final status the repair endpoint reports when the repair converged.
pub(crate) const REPAIR_OK_STATUS: &str = "SUCCESS";

#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub error_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairRequest {
    pub code: String,
    pub prompt: String,
    /// The service expects the iteration budget as a text-encoded integer.
    pub max_iterations: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairResponse {
    #[serde(default)]
    pub final_code: String,
    #[serde(default)]
    pub changes: Vec<Patch>,
    #[serde(default)]
    pub parsed_error: ParsedError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedError {
    #[serde(default)]
    pub last_iteration: LastIteration,
    #[serde(default)]
    pub final_status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastIteration {
    #[serde(default)]
    pub stdout: String,
}

/// Request/response boundary to the execution service.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn run(&self, req: RunRequest) -> Result<RunResponse>;
    async fn repair(&self, req: RepairRequest) -> Result<RepairResponse>;
}

/// `reqwest`-backed service client.
pub struct HttpExecutionService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpExecutionService {
    pub fn new(cfg: &SessionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn run(&self, req: RunRequest) -> Result<RunResponse> {
        let resp = self
            .http
            .post(format!("{}/run", self.base_url))
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<RunResponse>().await?)
    }

    async fn repair(&self, req: RepairRequest) -> Result<RepairResponse> {
        let resp = self
            .http
            .post(format!("{}/repair", self.base_url))
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<RepairResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeType;

    #[test]
    fn run_response_parses_with_defaults() {
        let resp: RunResponse = serde_json::from_str(r#"{"stdout":"5\n"}"#).unwrap();
        assert_eq!(resp.stdout, "5\n");
        assert_eq!(resp.stderr, "");
        // Absent error kind is not the success sentinel.
        assert_ne!(resp.error_type, RUN_OK_SENTINEL);
    }

    #[test]
    fn repair_response_parses_full_payload() {
        let raw = r#"{
            "final_code": "print(5)",
            "changes": [{
                "iteration": 1,
                "fix_method": "llm",
                "error_type": "SyntaxError",
                "change_type": "added",
                "line_old": null,
                "line_new": 4,
                "old_text": "",
                "new_text": "print(5)",
                "reason": "missing call"
            }],
            "parsed_error": {
                "last_iteration": {"stdout": "5\n"},
                "final_status": "SUCCESS"
            }
        }"#;
        let resp: RepairResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.final_code, "print(5)");
        assert_eq!(resp.changes.len(), 1);
        assert_eq!(resp.changes[0].change_type, ChangeType::Added);
        assert_eq!(resp.changes[0].line_new, Some(4));
        assert_eq!(resp.parsed_error.final_status, REPAIR_OK_STATUS);
        assert_eq!(resp.parsed_error.last_iteration.stdout, "5\n");
    }

    #[test]
    fn repair_response_defaults_when_fields_absent() {
        let resp: RepairResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.final_code, "");
        assert!(resp.changes.is_empty());
        assert_eq!(resp.parsed_error.final_status, "");
        assert_eq!(resp.parsed_error.last_iteration.stdout, "");
    }
}
