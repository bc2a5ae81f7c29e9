//! In-memory capability backends for development and testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use zeroize::Zeroizing;

use crate::capability::{
    ConfigStore, EndpointRegistry, IdentityContextStore, ResourceService, SecretVault,
};
use crate::endpoint::EndpointInstance;
use crate::error::{RegistryError, ServiceFailure, ServiceResult, VaultError};
use crate::participant::{ParticipantConfig, ParticipantIdentity};
use crate::resource::Resource;

fn poisoned(what: &str) -> ServiceFailure {
    ServiceFailure::unexpected(format!("{what} lock poisoned"))
}

/// Identity store with first-writer-wins create semantics.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, ParticipantIdentity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityContextStore for InMemoryIdentityStore {
    fn create(&self, identity: ParticipantIdentity) -> ServiceResult<ParticipantIdentity> {
        let mut identities = self
            .identities
            .write()
            .map_err(|_| poisoned("identity store"))?;

        if identities.contains_key(&identity.participant_context_id) {
            return Err(ServiceFailure::conflict(format!(
                "participant context {} already exists",
                identity.participant_context_id
            )));
        }
        identities.insert(identity.participant_context_id.clone(), identity.clone());
        Ok(identity)
    }

    fn get(&self, participant_context_id: &str) -> ServiceResult<ParticipantIdentity> {
        self.identities
            .read()
            .map_err(|_| poisoned("identity store"))?
            .get(participant_context_id)
            .cloned()
            .ok_or_else(|| {
                ServiceFailure::not_found(format!(
                    "participant context {participant_context_id} not found"
                ))
            })
    }
}

#[derive(Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn save(&self, participant_context_id: &str, config: ParticipantConfig) -> ServiceResult<()> {
        self.configs
            .write()
            .map_err(|_| poisoned("config store"))?
            .insert(participant_context_id.to_string(), config.into_map());
        Ok(())
    }

    fn get(&self, participant_context_id: &str) -> ServiceResult<BTreeMap<String, String>> {
        self.configs
            .read()
            .map_err(|_| poisoned("config store"))?
            .get(participant_context_id)
            .cloned()
            .ok_or_else(|| {
                ServiceFailure::not_found(format!(
                    "no config for participant context {participant_context_id}"
                ))
            })
    }
}

/// Vault keeping secrets in process memory. Stored values are zeroized on drop.
#[derive(Default)]
pub struct InMemoryVault {
    secrets: RwLock<HashMap<String, Zeroizing<String>>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretVault for InMemoryVault {
    fn store_secret(&self, alias: &str, value: &str) -> Result<(), VaultError> {
        if alias.trim().is_empty() {
            return Err(VaultError);
        }
        let mut secrets = self.secrets.write().map_err(|_| VaultError)?;
        // Aliases are write-once
        if secrets.contains_key(alias) {
            return Err(VaultError);
        }
        secrets.insert(alias.to_string(), Zeroizing::new(value.to_string()));
        Ok(())
    }

    fn resolve_secret(&self, alias: &str) -> Option<String> {
        self.secrets
            .read()
            .ok()?
            .get(alias)
            .map(|secret| secret.as_str().to_string())
    }
}

/// Endpoint registry. When given the identity store, instances referencing an
/// unknown participant are rejected.
#[derive(Default)]
pub struct InMemoryEndpointRegistry {
    instances: RwLock<Vec<EndpointInstance>>,
    identities: Option<Arc<dyn IdentityContextStore>>,
}

impl InMemoryEndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity_check(identities: Arc<dyn IdentityContextStore>) -> Self {
        Self {
            instances: RwLock::default(),
            identities: Some(identities),
        }
    }
}

impl EndpointRegistry for InMemoryEndpointRegistry {
    fn add_instance(&self, instance: EndpointInstance) -> Result<EndpointInstance, RegistryError> {
        if let Some(identities) = &self.identities {
            identities
                .get(&instance.participant_context_id)
                .map_err(|_| {
                    RegistryError::new(format!(
                        "unknown participant context {}",
                        instance.participant_context_id
                    ))
                })?;
        }
        self.instances
            .write()
            .map_err(|_| RegistryError::new("endpoint registry lock poisoned"))?
            .push(instance.clone());
        Ok(instance)
    }

    fn instances_for(&self, participant_context_id: &str) -> Vec<EndpointInstance> {
        self.instances
            .read()
            .map(|instances| {
                instances
                    .iter()
                    .filter(|i| i.participant_context_id == participant_context_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Resource service keyed by resource id. Duplicate ids fail with `CONFLICT`.
pub struct InMemoryResourceService<R: Resource> {
    resources: RwLock<HashMap<String, R>>,
}

impl<R: Resource> Default for InMemoryResourceService<R> {
    fn default() -> Self {
        Self {
            resources: RwLock::default(),
        }
    }
}

impl<R: Resource> InMemoryResourceService<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// All resources owned by a participant.
    pub fn for_participant(&self, participant_context_id: &str) -> Vec<R> {
        self.resources
            .read()
            .map(|resources| {
                resources
                    .values()
                    .filter(|r| r.participant_context_id() == participant_context_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<R: Resource> ResourceService<R> for InMemoryResourceService<R> {
    fn create(&self, resource: R) -> ServiceResult<R> {
        let mut resources = self.resources.write().map_err(|_| poisoned(R::KIND))?;
        if resources.contains_key(resource.id()) {
            return Err(ServiceFailure::conflict(format!(
                "{} {} already exists",
                R::KIND,
                resource.id()
            )));
        }
        resources.insert(resource.id().to_string(), resource.clone());
        Ok(resource)
    }

    fn get(&self, id: &str) -> ServiceResult<R> {
        self.resources
            .read()
            .map_err(|_| poisoned(R::KIND))?
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceFailure::not_found(format!("{} {id} not found", R::KIND)))
    }
}
