//! Capability interfaces the orchestrator consumes.
//!
//! Each capability is a synchronous call that completes or fails within a
//! bounded time. Timeouts and retries belong to the implementations.

use std::collections::BTreeMap;

use crate::endpoint::EndpointInstance;
use crate::error::{RegistryError, ServiceResult, VaultError};
use crate::participant::{ParticipantConfig, ParticipantIdentity};
use crate::resource::Resource;

/// Persistence for participant identity records.
pub trait IdentityContextStore: Send + Sync {
    /// Create a new identity. A second create for the same id fails with `CONFLICT`.
    fn create(&self, identity: ParticipantIdentity) -> ServiceResult<ParticipantIdentity>;

    fn get(&self, participant_context_id: &str) -> ServiceResult<ParticipantIdentity>;
}

/// Key/value configuration scoped to a participant.
pub trait ConfigStore: Send + Sync {
    fn save(&self, participant_context_id: &str, config: ParticipantConfig) -> ServiceResult<()>;

    fn get(&self, participant_context_id: &str) -> ServiceResult<BTreeMap<String, String>>;
}

/// Opaque secret storage addressed by alias.
pub trait SecretVault: Send + Sync {
    fn store_secret(&self, alias: &str, value: &str) -> Result<(), VaultError>;

    fn resolve_secret(&self, alias: &str) -> Option<String>;
}

/// Registry of data-movement endpoints.
pub trait EndpointRegistry: Send + Sync {
    fn add_instance(&self, instance: EndpointInstance) -> Result<EndpointInstance, RegistryError>;

    fn instances_for(&self, participant_context_id: &str) -> Vec<EndpointInstance>;
}

/// Creation and lookup of one kind of access-controlled resource.
pub trait ResourceService<R: Resource>: Send + Sync {
    fn create(&self, resource: R) -> ServiceResult<R>;

    fn get(&self, id: &str) -> ServiceResult<R>;
}
