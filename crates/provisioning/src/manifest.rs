//! Inbound provisioning request.
//!
//! The manifest is decoded by the transport layer and consumed read-only by
//! the orchestrator. OAuth fields are optional at decode time; the config step
//! decides whether the set is complete.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ServiceFailure, ServiceResult};

/// Catalog protocol used when a manifest does not name one.
pub const DEFAULT_CATALOG_PROTOCOL: &str = "dataspace-protocol-http:2025-1";

/// Client secret material. Zeroized on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the raw secret. Only the vault step should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Catalog query defaults a participant starts out with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefaults {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub counter_party_did: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn default_protocol() -> String {
    DEFAULT_CATALOG_PROTOCOL.to_string()
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            counter_party_did: None,
            limit: None,
        }
    }
}

impl QueryDefaults {
    fn validate(&self) -> ServiceResult<()> {
        if self.protocol.trim().is_empty() {
            return Err(ServiceFailure::bad_request(
                "queryDefaults.protocol must not be empty",
            ));
        }
        if self.limit == Some(0) {
            return Err(ServiceFailure::bad_request(
                "queryDefaults.limit must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Request describing a new participant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantManifest {
    /// Internal participant context identifier
    #[serde(default)]
    pub participant_context_id: String,
    /// Human-facing participant id, typically a DID
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretValue>,
    #[serde(default)]
    pub client_secret_alias: Option<String>,
    #[serde(default)]
    pub query_defaults: Option<QueryDefaults>,
}

impl ParticipantManifest {
    /// Manifest with every OAuth field populated.
    pub fn new(
        participant_context_id: impl Into<String>,
        participant_id: impl Into<String>,
        active: bool,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret_alias: impl Into<String>,
        client_secret: SecretValue,
    ) -> Self {
        Self {
            participant_context_id: participant_context_id.into(),
            participant_id: Some(participant_id.into()),
            active,
            token_url: Some(token_url.into()),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret),
            client_secret_alias: Some(client_secret_alias.into()),
            query_defaults: None,
        }
    }

    /// Decode a manifest from a JSON body.
    pub fn from_json(body: &[u8]) -> ServiceResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| ServiceFailure::bad_request(format!("Invalid manifest JSON: {e}")))
    }

    /// Checks that must pass before anything is created.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.participant_context_id.trim().is_empty() {
            return Err(ServiceFailure::bad_request(
                "participantContextId is required",
            ));
        }
        if let Some(defaults) = &self.query_defaults {
            defaults.validate()?;
        }
        Ok(())
    }

    /// Query defaults, falling back to the catalog protocol default.
    pub fn query_defaults_or_default(&self) -> QueryDefaults {
        self.query_defaults.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "participantContextId": "p1",
            "participantId": "did:web:p1",
            "active": true,
            "tokenUrl": "https://idp/token",
            "clientId": "c1",
            "clientSecret": "s3cr3t",
            "clientSecretAlias": "p1-secret"
        }"#
    }

    #[test]
    fn test_decode_camel_case() {
        let manifest = ParticipantManifest::from_json(sample_json().as_bytes()).unwrap();
        assert_eq!(manifest.participant_context_id, "p1");
        assert_eq!(manifest.participant_id.as_deref(), Some("did:web:p1"));
        assert!(manifest.active);
        assert_eq!(manifest.client_secret.as_ref().unwrap().expose(), "s3cr3t");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let manifest = ParticipantManifest::from_json(sample_json().as_bytes()).unwrap();
        let debug = format!("{:?}", manifest);
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("SecretValue(***)"));
    }

    #[test]
    fn test_secret_is_opaque() {
        assert!(SecretValue::new("").is_empty());
        assert!(!SecretValue::new("   ").is_empty());
        assert_eq!(SecretValue::new(" s ").expose(), " s ");
    }

    #[test]
    fn test_missing_context_id_rejected() {
        let manifest = ParticipantManifest::from_json(br#"{"participantId": "x"}"#).unwrap();
        let err = manifest.validate().unwrap_err();
        assert_eq!(err.reason, crate::FailureReason::BadRequest);
    }

    #[test]
    fn test_blank_context_id_rejected() {
        let manifest =
            ParticipantManifest::from_json(br#"{"participantContextId": "   "}"#).unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let err = ParticipantManifest::from_json(b"{not json").unwrap_err();
        assert_eq!(err.reason, crate::FailureReason::BadRequest);
    }

    #[test]
    fn test_query_defaults() {
        let manifest = ParticipantManifest::from_json(
            br#"{"participantContextId": "p1", "queryDefaults": {"limit": 50}}"#,
        )
        .unwrap();
        let defaults = manifest.query_defaults_or_default();
        assert_eq!(defaults.protocol, DEFAULT_CATALOG_PROTOCOL);
        assert_eq!(defaults.limit, Some(50));
        assert!(manifest.validate().is_ok());

        let zero_limit = ParticipantManifest::from_json(
            br#"{"participantContextId": "p1", "queryDefaults": {"limit": 0}}"#,
        )
        .unwrap();
        assert!(zero_limit.validate().is_err());
    }
}
