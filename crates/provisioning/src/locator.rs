//! Opaque resource locator handed back for a provisioned participant.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use std::fmt;

use crate::error::{ServiceFailure, ServiceResult};

/// Collection path participants are created under.
pub const PARTICIPANTS_PATH: &str = "/v1alpha/participants";

/// Locator for a participant, derived from its context id with URL-safe base64.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantLocator {
    participant_context_id: String,
}

impl ParticipantLocator {
    pub fn new(participant_context_id: impl Into<String>) -> Self {
        Self {
            participant_context_id: participant_context_id.into(),
        }
    }

    pub fn participant_context_id(&self) -> &str {
        &self.participant_context_id
    }

    /// URL-safe path segment.
    pub fn encoded(&self) -> String {
        URL_SAFE.encode(self.participant_context_id.as_bytes())
    }

    /// Path of the created participant, relative to the API context.
    pub fn path(&self) -> String {
        format!("{PARTICIPANTS_PATH}/{}", self.encoded())
    }

    /// Recover the participant context id from a locator path or bare segment.
    pub fn decode(locator: &str) -> ServiceResult<Self> {
        let segment = locator.rsplit('/').next().unwrap_or(locator);
        if segment.is_empty() {
            return Err(ServiceFailure::bad_request("participant locator is empty"));
        }
        let bytes = URL_SAFE
            .decode(segment)
            .map_err(|e| ServiceFailure::bad_request(format!("invalid participant locator: {e}")))?;
        let participant_context_id = String::from_utf8(bytes)
            .map_err(|_| ServiceFailure::bad_request("participant locator is not valid UTF-8"))?;
        Ok(Self::new(participant_context_id))
    }
}

impl fmt::Display for ParticipantLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
