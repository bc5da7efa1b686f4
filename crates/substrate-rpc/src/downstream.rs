//! Typed request/response contracts for each downstream family named in §6,
//! plus the per-service default timeout table used by the Workflow Planner
//! (§4.4) to fill in a step's timeout when the caller doesn't supply one.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::validation::{
    validate_file_size, validate_memory_limit, validate_non_empty, validate_supported_language,
    validate_timeout_ms, Validate,
};

/// Languages the sandbox accepts, per §4.1's validation example.
pub const SUPPORTED_LANGUAGES: &[&str] = &["python", "node", "rust", "go"];

/// Per-service default operation timeouts, named in §4.4.
pub fn default_timeout_for_service(service: &str) -> Option<Duration> {
    let seconds = match service {
        "sandbox" => 300,
        "fileprocess" => 120,
        "cyberagent" => 180,
        "mageagent" => 90,
        "graphrag" => 60,
        _ => return None,
    };
    Some(Duration::from_secs(seconds))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub memory: String,
    pub cpu_millis: Option<u32>,
}

/// `POST /execute` request body for the code execution sandbox (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxRequest {
    pub code: String,
    pub language: String,
    pub packages: Option<Vec<String>>,
    pub files: Option<HashMap<String, String>>,
    pub timeout_ms: u64,
    pub resource_limits: ResourceLimits,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxResponse {
    pub success: bool,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i32>,
    pub execution_time_ms: u64,
    pub resource_usage: Option<Value>,
    pub artifacts: Option<Vec<String>>,
    pub error: Option<String>,
}

impl Validate for SandboxRequest {
    fn validate(&self) -> Result<(), RpcError> {
        validate_non_empty("code", &self.code)?;
        validate_supported_language(&self.language, SUPPORTED_LANGUAGES)?;
        validate_timeout_ms(self.timeout_ms)?;
        validate_memory_limit(&self.resource_limits.memory)?;
        if let Some(files) = &self.files {
            let total: u64 = files.values().map(|f| f.len() as u64).sum();
            validate_file_size(total)?;
        }
        Ok(())
    }
}

/// File processor request/response (§6: "analogous validated JSON RPC
/// surface").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProcessRequest {
    pub file_name: String,
    pub content_base64: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProcessResponse {
    pub success: bool,
    pub extracted_text: Option<String>,
    pub classification: Option<String>,
    pub error: Option<String>,
}

impl Validate for FileProcessRequest {
    fn validate(&self) -> Result<(), RpcError> {
        validate_non_empty("fileName", &self.file_name)?;
        validate_non_empty("contentBase64", &self.content_base64)?;
        validate_file_size(self.size_bytes)
    }
}

/// Cyber scanner request/response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CyberScanRequest {
    pub artifact_id: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CyberScanResponse {
    pub success: bool,
    pub threat_level: Option<String>,
    pub findings: Option<Vec<String>>,
    pub error: Option<String>,
}

impl Validate for CyberScanRequest {
    fn validate(&self) -> Result<(), RpcError> {
        validate_non_empty("artifactId", &self.artifact_id)?;
        validate_non_empty("contentBase64", &self.content_base64)
    }
}

/// Knowledge store request/response, used by both the RPC client family and
/// the streaming pipeline's persistence sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStoreRequest {
    pub collection: String,
    pub documents: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStoreResponse {
    pub success: bool,
    pub stored_count: usize,
    pub error: Option<String>,
}

impl Validate for KnowledgeStoreRequest {
    fn validate(&self) -> Result<(), RpcError> {
        validate_non_empty("collection", &self.collection)?;
        if self.documents.is_empty() {
            return Err(RpcError::Validation("documents must not be empty".into()));
        }
        Ok(())
    }
}

/// LLM completion request/response (vendor-neutral; see [`crate::DownstreamTransport`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCompletionRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCompletionResponse {
    pub success: bool,
    pub completion: Option<String>,
    pub error: Option<String>,
}

impl Validate for LlmCompletionRequest {
    fn validate(&self) -> Result<(), RpcError> {
        validate_non_empty("prompt", &self.prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_service_defaults_match_table() {
        assert_eq!(default_timeout_for_service("sandbox"), Some(Duration::from_secs(300)));
        assert_eq!(default_timeout_for_service("fileprocess"), Some(Duration::from_secs(120)));
        assert_eq!(default_timeout_for_service("cyberagent"), Some(Duration::from_secs(180)));
        assert_eq!(default_timeout_for_service("mageagent"), Some(Duration::from_secs(90)));
        assert_eq!(default_timeout_for_service("graphrag"), Some(Duration::from_secs(60)));
        assert_eq!(default_timeout_for_service("unknown"), None);
    }

    #[test]
    fn sandbox_request_rejects_oversize_memory() {
        let req = SandboxRequest {
            code: "print(1)".into(),
            language: "python".into(),
            packages: None,
            files: None,
            timeout_ms: 1000,
            resource_limits: ResourceLimits { memory: "4096Mi".into(), cpu_millis: None },
            metadata: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn sandbox_request_accepts_valid_input() {
        let req = SandboxRequest {
            code: "print(1)".into(),
            language: "python".into(),
            packages: None,
            files: None,
            timeout_ms: 1000,
            resource_limits: ResourceLimits { memory: "512Mi".into(), cpu_millis: None },
            metadata: None,
        };
        assert!(req.validate().is_ok());
    }
}
