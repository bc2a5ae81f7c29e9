//! Data-movement endpoint registered on behalf of a participant.

use onboard_core::DataPlaneConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ServiceFailure, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInstance {
    pub participant_context_id: String,
    pub url: String,
    pub allowed_source_types: BTreeSet<String>,
    pub allowed_transfer_types: BTreeSet<String>,
}

impl EndpointInstance {
    pub fn new<S, T>(
        participant_context_id: impl Into<String>,
        url: impl Into<String>,
        source_types: S,
        transfer_types: T,
    ) -> ServiceResult<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let instance = Self {
            participant_context_id: participant_context_id.into(),
            url: url.into(),
            allowed_source_types: source_types.into_iter().map(Into::into).collect(),
            allowed_transfer_types: transfer_types.into_iter().map(Into::into).collect(),
        };

        if instance.participant_context_id.trim().is_empty() {
            return Err(ServiceFailure::bad_request(
                "endpoint requires a participant context id",
            ));
        }
        if instance.url.trim().is_empty() {
            return Err(ServiceFailure::bad_request("endpoint url must not be empty"));
        }
        if instance.allowed_source_types.is_empty() || instance.allowed_transfer_types.is_empty() {
            return Err(ServiceFailure::bad_request(
                "endpoint requires at least one source type and one transfer type",
            ));
        }
        Ok(instance)
    }

    /// Default endpoint for a participant, as configured in `[dataplane]`.
    pub fn for_participant(
        participant_context_id: &str,
        dataplane: &DataPlaneConfig,
    ) -> ServiceResult<Self> {
        Self::new(
            participant_context_id,
            dataplane.url.clone(),
            dataplane.allowed_source_types.iter().cloned(),
            dataplane.allowed_transfer_types.iter().cloned(),
        )
    }

    pub fn supports_transfer(&self, source_type: &str, transfer_type: &str) -> bool {
        self.allowed_source_types.contains(source_type)
            && self.allowed_transfer_types.contains(transfer_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dataplane_pairing() {
        let endpoint = EndpointInstance::for_participant("p1", &DataPlaneConfig::default()).unwrap();
        assert_eq!(endpoint.participant_context_id, "p1");
        assert!(endpoint.supports_transfer("HttpData", "HttpData-PULL"));
        assert!(!endpoint.supports_transfer("HttpData", "HttpData-PUSH"));
    }

    #[test]
    fn test_rejects_empty_sets() {
        let result = EndpointInstance::new("p1", "http://dp", Vec::<String>::new(), ["HttpData-PULL"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_missing_participant() {
        let result = EndpointInstance::new("", "http://dp", ["HttpData"], ["HttpData-PULL"]);
        assert!(result.is_err());
    }
}
