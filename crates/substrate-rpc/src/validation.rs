//! Per-operation request validation.
//!
//! Validation runs before the circuit breaker is consulted; a validation
//! failure never touches breaker state or retry budget (§4.1, §7: "Validation
//! ... never touches the breaker").

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RpcError;

/// `^(\d+)(Mi|Gi)$`, matching the sandbox's memory-limit contract (§6).
static MEMORY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(Mi|Gi)$").expect("valid regex"));

pub const MAX_TIMEOUT_MS: u64 = 300_000;
pub const MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Implemented by every typed request the resilient client carries, so
/// `execute` can fail fast without ever touching the breaker or the wire.
pub trait Validate {
    fn validate(&self) -> Result<(), RpcError>;
}

/// Parses a sandbox-style memory limit (e.g. `"512Mi"`, `"2Gi"`) into bytes.
pub fn parse_memory_limit(limit: &str) -> Result<u64, RpcError> {
    let caps = MEMORY_PATTERN
        .captures(limit)
        .ok_or_else(|| RpcError::Validation(format!("memory limit `{limit}` does not match ^(\\d+)(Mi|Gi)$")))?;
    let amount: u64 = caps[1]
        .parse()
        .map_err(|_| RpcError::Validation(format!("memory limit `{limit}` has an unparsable quantity")))?;
    let unit = &caps[2];
    let bytes = match unit {
        "Mi" => amount * 1024 * 1024,
        "Gi" => amount * 1024 * 1024 * 1024,
        _ => unreachable!("regex only matches Mi|Gi"),
    };
    Ok(bytes)
}

/// Validates a memory limit string is well-formed and does not exceed 2048Mi,
/// per §4.1's example validation rule.
pub fn validate_memory_limit(limit: &str) -> Result<(), RpcError> {
    let bytes = parse_memory_limit(limit)?;
    let max_bytes = 2048u64 * 1024 * 1024;
    if bytes > max_bytes {
        return Err(RpcError::Validation(format!(
            "memory limit `{limit}` exceeds the 2048Mi cap"
        )));
    }
    Ok(())
}

pub fn validate_timeout_ms(timeout_ms: u64) -> Result<(), RpcError> {
    if timeout_ms == 0 || timeout_ms > MAX_TIMEOUT_MS {
        return Err(RpcError::Validation(format!(
            "timeout {timeout_ms}ms must be in (0, {MAX_TIMEOUT_MS}]"
        )));
    }
    Ok(())
}

pub fn validate_file_size(size_bytes: u64) -> Result<(), RpcError> {
    if size_bytes > MAX_FILE_SIZE_BYTES {
        return Err(RpcError::Validation(format!(
            "file size {size_bytes} bytes exceeds the {MAX_FILE_SIZE_BYTES} byte cap"
        )));
    }
    Ok(())
}

pub fn validate_non_empty(field: &'static str, value: &str) -> Result<(), RpcError> {
    if value.trim().is_empty() {
        return Err(RpcError::Validation(format!("`{field}` must not be empty")));
    }
    Ok(())
}

pub fn validate_supported_language(language: &str, supported: &[&str]) -> Result<(), RpcError> {
    if !supported.contains(&language) {
        return Err(RpcError::Validation(format!(
            "language `{language}` is not in the supported set {supported:?}"
        )));
    }
    Ok(())
}
