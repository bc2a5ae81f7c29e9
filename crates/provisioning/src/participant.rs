//! Participant identity and configuration records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ServiceFailure, ServiceResult};
use crate::manifest::ParticipantManifest;

pub const TOKEN_URL: &str = "edc.iam.sts.oauth.token.url";
pub const CLIENT_ID: &str = "edc.iam.sts.oauth.client.id";
pub const CLIENT_SECRET_ALIAS: &str = "edc.iam.sts.oauth.client.secret.alias";
pub const ISSUER_ID: &str = "edc.iam.issuer.id";
pub const PARTICIPANT_ID: &str = "edc.participant.id";

/// Keys every persisted participant configuration carries.
pub const REQUIRED_CONFIG_KEYS: [&str; 5] =
    [TOKEN_URL, CLIENT_ID, CLIENT_SECRET_ALIAS, ISSUER_ID, PARTICIPANT_ID];

/// Lifecycle state of a participant identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantState {
    Created,
    Activated,
    Suspended,
}

/// Identity record owned by the identity context store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantIdentity {
    pub participant_context_id: String,
    pub state: ParticipantState,
}

impl ParticipantIdentity {
    pub fn new(participant_context_id: impl Into<String>, state: ParticipantState) -> ServiceResult<Self> {
        let participant_context_id = participant_context_id.into();
        if participant_context_id.trim().is_empty() {
            return Err(ServiceFailure::bad_request(
                "participant context id must not be empty",
            ));
        }
        Ok(Self {
            participant_context_id,
            state,
        })
    }

    /// Initial identity: `Activated` when the manifest asks for it, else `Created`.
    pub fn from_manifest(manifest: &ParticipantManifest) -> ServiceResult<Self> {
        let state = if manifest.active {
            ParticipantState::Activated
        } else {
            ParticipantState::Created
        };
        Self::new(manifest.participant_context_id.clone(), state)
    }
}

/// Configuration scoped to one participant. Always holds all required keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    entries: BTreeMap<String, String>,
}

impl ParticipantConfig {
    /// Build the five-key configuration from a manifest.
    ///
    /// Fails with `BAD_REQUEST` naming the first missing field; a partial map
    /// is never produced.
    pub fn from_manifest(manifest: &ParticipantManifest) -> ServiceResult<Self> {
        let token_url = required(&manifest.token_url, "tokenUrl")?;
        let client_id = required(&manifest.client_id, "clientId")?;
        let alias = required(&manifest.client_secret_alias, "clientSecretAlias")?;
        let participant_id = required(&manifest.participant_id, "participantId")?;

        let entries = BTreeMap::from([
            (TOKEN_URL.to_string(), token_url.to_string()),
            (CLIENT_ID.to_string(), client_id.to_string()),
            (CLIENT_SECRET_ALIAS.to_string(), alias.to_string()),
            (ISSUER_ID.to_string(), participant_id.to_string()),
            (PARTICIPANT_ID.to_string(), participant_id.to_string()),
        ]);
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> ServiceResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceFailure::bad_request(format!("{field} is required"))),
    }
}
