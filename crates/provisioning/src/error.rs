//! Failure taxonomy for participant provisioning.
//!
//! Capability implementations report failures with a [`FailureReason`] from a
//! closed set. The orchestrator turns the first failure it sees into a single
//! [`ProvisionFailure`] tagged with the step that produced it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure reasons shared by every capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    NotFound,
    Conflict,
    BadRequest,
    Unauthorized,
    Unexpected,
}

impl FailureReason {
    /// Every member of the taxonomy, in declaration order.
    pub const ALL: [FailureReason; 5] = [
        FailureReason::NotFound,
        FailureReason::Conflict,
        FailureReason::BadRequest,
        FailureReason::Unauthorized,
        FailureReason::Unexpected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "NOT_FOUND",
            FailureReason::Conflict => "CONFLICT",
            FailureReason::BadRequest => "BAD_REQUEST",
            FailureReason::Unauthorized => "UNAUTHORIZED",
            FailureReason::Unexpected => "UNEXPECTED",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by the identity, config and resource capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
pub struct ServiceFailure {
    pub reason: FailureReason,
    pub detail: Option<String>,
}

impl ServiceFailure {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: Some(detail.into()),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::NotFound, detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::Conflict, detail)
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::BadRequest, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::Unauthorized, detail)
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::Unexpected, detail)
    }
}

/// Result of a capability call.
pub type ServiceResult<T> = Result<T, ServiceFailure>;

/// Opaque secret vault failure. The vault contract carries no reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("secret vault operation failed")]
pub struct VaultError;

/// Endpoint registry failure with a free-form detail message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("endpoint registry failure: {detail}")]
pub struct RegistryError {
    pub detail: String,
}

impl RegistryError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Provisioning step that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisionStep {
    Validating,
    CreatingIdentity,
    SavingConfig,
    StoringSecret,
    RegisteringEndpoint,
    SeedingResources,
}

impl ProvisionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionStep::Validating => "VALIDATING",
            ProvisionStep::CreatingIdentity => "CREATING_IDENTITY",
            ProvisionStep::SavingConfig => "SAVING_CONFIG",
            ProvisionStep::StoringSecret => "STORING_SECRET",
            ProvisionStep::RegisteringEndpoint => "REGISTERING_ENDPOINT",
            ProvisionStep::SeedingResources => "SEEDING_RESOURCES",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single failure outcome of a provisioning call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("provisioning failed at {step} with {reason}")]
pub struct ProvisionFailure {
    pub step: ProvisionStep,
    pub reason: FailureReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProvisionFailure {
    pub fn at(step: ProvisionStep, failure: ServiceFailure) -> Self {
        Self {
            step,
            reason: failure.reason,
            detail: failure.detail,
        }
    }
}

/// Vault failures carry no taxonomy and no detail.
impl From<VaultError> for ServiceFailure {
    fn from(_: VaultError) -> Self {
        Self {
            reason: FailureReason::Unexpected,
            detail: None,
        }
    }
}

/// Registry failures surface their detail verbatim.
impl From<RegistryError> for ServiceFailure {
    fn from(err: RegistryError) -> Self {
        Self {
            reason: FailureReason::Unexpected,
            detail: Some(err.detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serializes_screaming_snake() {
        for reason in FailureReason::ALL {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_step_tag_matches_serde() {
        let json = serde_json::to_string(&ProvisionStep::CreatingIdentity).unwrap();
        assert_eq!(json, "\"CREATING_IDENTITY\"");
        assert_eq!(ProvisionStep::RegisteringEndpoint.to_string(), "REGISTERING_ENDPOINT");
    }

    #[test]
    fn test_service_failure_display() {
        assert_eq!(
            ServiceFailure::conflict("p1 exists").to_string(),
            "CONFLICT: p1 exists"
        );
        let bare = ServiceFailure {
            reason: FailureReason::Unexpected,
            detail: None,
        };
        assert_eq!(bare.to_string(), "UNEXPECTED");
    }

    #[test]
    fn test_vault_failure_is_unexpected_without_detail() {
        let failure = ProvisionFailure::at(ProvisionStep::StoringSecret, VaultError.into());
        assert_eq!(failure.step, ProvisionStep::StoringSecret);
        assert_eq!(failure.reason, FailureReason::Unexpected);
        assert!(failure.detail.is_none());
    }

    #[test]
    fn test_registry_detail_is_verbatim() {
        let failure = ProvisionFailure::at(
            ProvisionStep::RegisteringEndpoint,
            RegistryError::new("dataplane unreachable").into(),
        );
        assert_eq!(failure.step, ProvisionStep::RegisteringEndpoint);
        assert_eq!(failure.reason, FailureReason::Unexpected);
        assert_eq!(failure.detail.as_deref(), Some("dataplane unreachable"));
    }

    #[test]
    fn test_failure_serialization_omits_missing_detail() {
        let failure = ProvisionFailure::at(ProvisionStep::StoringSecret, VaultError.into());
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["step"], "STORING_SECRET");
        assert_eq!(json["reason"], "UNEXPECTED");
        assert!(json.get("detail").is_none());
    }
}
