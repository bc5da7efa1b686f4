//! Tenant context propagation.
//!
//! [`TenantContext`] carries the identifiers that every downstream call,
//! log line, and metric sample is scoped by. It is the basis of isolation,
//! rate limiting, and audit across the substrate.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::{Deserialize, Serialize};

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,100}$").expect("valid regex"));

/// Where a `TenantContext` was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    Token,
    Headers,
    System,
}

/// Error returned when constructing a `TenantContext` from untrusted input.
#[derive(Debug, thiserror::Error)]
pub enum TenantContextError {
    #[error("identifier field `{field}` does not match ^[A-Za-z0-9_-]{{1,100}}$: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), TenantContextError> {
    if IDENTIFIER_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(TenantContextError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

fn validate_optional_identifier(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), TenantContextError> {
    match value {
        Some(v) => validate_identifier(field, v),
        None => Ok(()),
    }
}

/// Carries company/app/user/request identifiers through every call.
///
/// `companyId` and `appId` are always present on any context that reaches the
/// core; `requestId` is unique per inbound request and propagates unchanged
/// through every downstream call this context is threaded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub company_id: String,
    pub app_id: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub roles: Option<Vec<String>>,
    pub permissions: Option<Vec<String>>,
    pub session_id: Option<String>,
    pub request_id: String,
    pub timestamp: i64,
    pub source: ContextSource,
}

impl TenantContext {
    /// Builds a context, validating every identifier field against
    /// `^[A-Za-z0-9_-]{1,100}$`.
    pub fn new(
        company_id: impl Into<String>,
        app_id: impl Into<String>,
        request_id: impl Into<String>,
        source: ContextSource,
    ) -> Result<Self, TenantContextError> {
        let company_id = company_id.into();
        let app_id = app_id.into();
        let request_id = request_id.into();

        validate_identifier("companyId", &company_id)?;
        validate_identifier("appId", &app_id)?;
        validate_identifier("requestId", &request_id)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        Ok(Self {
            company_id,
            app_id,
            user_id: None,
            user_email: None,
            user_name: None,
            roles: None,
            permissions: None,
            session_id: None,
            request_id,
            timestamp,
            source,
        })
    }

    /// Sets the user id, validating it against the identifier pattern.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Result<Self, TenantContextError> {
        let user_id = user_id.into();
        validate_identifier("userId", &user_id)?;
        self.user_id = Some(user_id);
        Ok(self)
    }

    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = Some(roles);
        self
    }

    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_session_id(
        mut self,
        session_id: impl Into<String>,
    ) -> Result<Self, TenantContextError> {
        let session_id = session_id.into();
        validate_identifier("sessionId", &session_id)?;
        self.session_id = Some(session_id);
        Ok(self)
    }

    /// Validates every currently-set optional identifier field. Useful after
    /// deserializing a context from an untrusted transport.
    pub fn validate(&self) -> Result<(), TenantContextError> {
        validate_identifier("companyId", &self.company_id)?;
        validate_identifier("appId", &self.app_id)?;
        validate_identifier("requestId", &self.request_id)?;
        validate_optional_identifier("userId", self.user_id.as_deref())?;
        validate_optional_identifier("sessionId", self.session_id.as_deref())?;
        Ok(())
    }

    /// A tracing span scoping every log event to this tenant/request.
    #[cfg(feature = "tracing")]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "tenant",
            company_id = %self.company_id,
            app_id = %self.app_id,
            request_id = %self.request_id,
        )
    }
}
