//! Provisioning orchestrator.
//!
//! Drives one participant through identity creation, configuration, secret
//! storage, endpoint registration and resource seeding, in that order. The
//! first failing step ends the run; nothing created by earlier steps is rolled
//! back.
//!
//! The orchestrator holds no per-call state. Concurrent calls for the same
//! participant are serialized by the identity store's uniqueness guarantee:
//! the first create wins and later ones fail with `CONFLICT`.

use onboard_core::{Config, DataPlaneConfig, SeedConfig};
use std::sync::Arc;
use tracing::{info, warn};

use crate::capability::{
    ConfigStore, EndpointRegistry, IdentityContextStore, ResourceService, SecretVault,
};
use crate::endpoint::EndpointInstance;
use crate::error::{FailureReason, ProvisionFailure, ServiceFailure, ServiceResult};
use crate::locator::ParticipantLocator;
use crate::manifest::ParticipantManifest;
use crate::participant::{ParticipantConfig, ParticipantIdentity};
use crate::resource::{Asset, ContractDefinition, PolicyDefinition};
use crate::run::{ProvisioningRun, RunError};
use crate::seed::{seed_resources, ResourceServices, SeedPlan};

/// Deployment defaults applied to every provisioned participant.
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    pub dataplane: DataPlaneConfig,
    pub seed: SeedPlan,
}

impl ProvisioningSettings {
    pub fn new(dataplane: DataPlaneConfig, seed: SeedConfig) -> Self {
        Self {
            dataplane,
            seed: SeedPlan::new(seed),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dataplane.clone(), config.seed.clone())
    }
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self::new(DataPlaneConfig::default(), SeedConfig::default())
    }
}

/// Handles to the three resource services.
#[derive(Clone)]
pub struct ResourceServiceHandles {
    pub assets: Arc<dyn ResourceService<Asset>>,
    pub policies: Arc<dyn ResourceService<PolicyDefinition>>,
    pub contract_definitions: Arc<dyn ResourceService<ContractDefinition>>,
}

impl ResourceServiceHandles {
    fn as_services(&self) -> ResourceServices<'_> {
        ResourceServices {
            assets: self.assets.as_ref(),
            policies: self.policies.as_ref(),
            contract_definitions: self.contract_definitions.as_ref(),
        }
    }
}

/// Coordinates the capability calls that make up provisioning.
#[derive(Clone)]
pub struct ProvisioningOrchestrator {
    identity_store: Arc<dyn IdentityContextStore>,
    config_store: Arc<dyn ConfigStore>,
    vault: Arc<dyn SecretVault>,
    endpoint_registry: Arc<dyn EndpointRegistry>,
    resources: ResourceServiceHandles,
    settings: ProvisioningSettings,
}

impl ProvisioningOrchestrator {
    pub fn new(
        identity_store: Arc<dyn IdentityContextStore>,
        config_store: Arc<dyn ConfigStore>,
        vault: Arc<dyn SecretVault>,
        endpoint_registry: Arc<dyn EndpointRegistry>,
        resources: ResourceServiceHandles,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            identity_store,
            config_store,
            vault,
            endpoint_registry,
            resources,
            settings,
        }
    }

    pub fn settings(&self) -> &ProvisioningSettings {
        &self.settings
    }

    /// Provision a participant, returning its locator or the first failure.
    pub fn provision(
        &self,
        manifest: &ParticipantManifest,
    ) -> Result<ParticipantLocator, ProvisionFailure> {
        self.provision_with_run(manifest).0
    }

    /// Like [`provision`](Self::provision), also returning the finished run.
    pub fn provision_with_run(
        &self,
        manifest: &ParticipantManifest,
    ) -> (Result<ParticipantLocator, ProvisionFailure>, ProvisioningRun) {
        let mut run = ProvisioningRun::new(manifest.participant_context_id.clone());
        let outcome = self.execute(manifest, &mut run);

        match &outcome {
            Ok(locator) => info!(
                participant_context_id = %manifest.participant_context_id,
                locator = %locator,
                "participant provisioned"
            ),
            Err(failure) => warn!(
                participant_context_id = %manifest.participant_context_id,
                step = %failure.step,
                reason = %failure.reason,
                detail = failure.detail.as_deref().unwrap_or(""),
                "participant provisioning failed"
            ),
        }
        (outcome, run)
    }

    fn execute(
        &self,
        manifest: &ParticipantManifest,
        run: &mut ProvisioningRun,
    ) -> Result<ParticipantLocator, ProvisionFailure> {
        complete(run, manifest.validate())?;

        let identity = complete(
            run,
            ParticipantIdentity::from_manifest(manifest)
                .and_then(|identity| self.identity_store.create(identity)),
        )?;
        let participant_context_id = identity.participant_context_id.as_str();
        let query_defaults = manifest.query_defaults_or_default();
        info!(
            participant_context_id,
            state = ?identity.state,
            catalog_protocol = %query_defaults.protocol,
            counter_party_did = query_defaults.counter_party_did.as_deref().unwrap_or(""),
            "identity created"
        );

        let secret = complete(run, self.save_config(participant_context_id, manifest))?;

        complete(
            run,
            self.vault
                .store_secret(&secret.alias, secret.value)
                .map_err(ServiceFailure::from),
        )?;
        info!(participant_context_id, alias = %secret.alias, "client secret stored");

        let endpoint = complete(
            run,
            EndpointInstance::for_participant(participant_context_id, &self.settings.dataplane)
                .and_then(|instance| {
                    self.endpoint_registry
                        .add_instance(instance)
                        .map_err(ServiceFailure::from)
                }),
        )?;
        info!(participant_context_id, url = %endpoint.url, "data plane endpoint registered");

        let seeded = complete(
            run,
            seed_resources(&self.settings.seed, &self.resources.as_services(), participant_context_id),
        )?;
        info!(
            participant_context_id,
            asset_id = %seeded.asset.id,
            policy_id = %seeded.policy.id,
            contract_definition_id = %seeded.contract_definition.id,
            "seed resources created"
        );

        Ok(ParticipantLocator::new(participant_context_id))
    }

    /// Build and persist the participant configuration. Every OAuth field,
    /// including the secret value needed by the next step, must be present
    /// before anything is written.
    fn save_config<'m>(
        &self,
        participant_context_id: &str,
        manifest: &'m ParticipantManifest,
    ) -> ServiceResult<SecretRef<'m>> {
        let config = ParticipantConfig::from_manifest(manifest)?;
        let value = manifest
            .client_secret
            .as_ref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ServiceFailure::bad_request("clientSecret is required"))?;
        let alias = config
            .get(crate::participant::CLIENT_SECRET_ALIAS)
            .map(str::to_string)
            .ok_or_else(|| ServiceFailure::bad_request("clientSecretAlias is required"))?;

        self.config_store.save(participant_context_id, config)?;
        info!(participant_context_id, "participant config saved");

        Ok(SecretRef {
            alias,
            value: value.expose(),
        })
    }
}

/// Secret alias and value carried from the config step to the vault step.
struct SecretRef<'m> {
    alias: String,
    value: &'m str,
}

/// Advance the run on success, or mark the current step failed.
fn complete<T>(run: &mut ProvisioningRun, outcome: ServiceResult<T>) -> Result<T, ProvisionFailure> {
    match outcome {
        Ok(value) => {
            run.advance().map_err(|e| invalid_transition(run, e))?;
            Ok(value)
        }
        Err(failure) => {
            let step = run.fail().map_err(|e| invalid_transition(run, e))?;
            Err(ProvisionFailure::at(step, failure))
        }
    }
}

fn invalid_transition(run: &ProvisioningRun, err: RunError) -> ProvisionFailure {
    ProvisionFailure {
        step: run.last_step(),
        reason: FailureReason::Unexpected,
        detail: Some(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionStep;
    use crate::manifest::SecretValue;
    use crate::memory::{
        InMemoryConfigStore, InMemoryEndpointRegistry, InMemoryIdentityStore,
        InMemoryResourceService, InMemoryVault,
    };
    use crate::run::ProvisioningState;

    fn orchestrator() -> ProvisioningOrchestrator {
        let identities = Arc::new(InMemoryIdentityStore::new());
        ProvisioningOrchestrator::new(
            identities.clone(),
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(InMemoryVault::new()),
            Arc::new(InMemoryEndpointRegistry::with_identity_check(identities)),
            ResourceServiceHandles {
                assets: Arc::new(InMemoryResourceService::<Asset>::new()),
                policies: Arc::new(InMemoryResourceService::<PolicyDefinition>::new()),
                contract_definitions: Arc::new(
                    InMemoryResourceService::<ContractDefinition>::new(),
                ),
            },
            ProvisioningSettings::default(),
        )
    }

    fn manifest(id: &str) -> ParticipantManifest {
        ParticipantManifest::new(
            id,
            format!("did:web:{id}"),
            true,
            "https://idp/token",
            "c1",
            format!("{id}-secret"),
            SecretValue::new("s3cr3t"),
        )
    }

    #[test]
    fn test_run_reaches_done() {
        let (outcome, run) = orchestrator().provision_with_run(&manifest("p1"));
        assert_eq!(outcome.unwrap().participant_context_id(), "p1");
        assert!(run.is_done());
        assert_eq!(run.history().len(), 6);
    }

    #[test]
    fn test_validation_failure_creates_nothing() {
        let orchestrator = orchestrator();
        let (outcome, run) = orchestrator.provision_with_run(&manifest(""));
        let failure = outcome.unwrap_err();
        assert_eq!(failure.step, ProvisionStep::Validating);
        assert_eq!(failure.reason, FailureReason::BadRequest);
        assert_eq!(
            run.current_state(),
            ProvisioningState::Failed(ProvisionStep::Validating)
        );
    }

    #[test]
    fn test_missing_secret_fails_config_step() {
        let mut m = manifest("p1");
        m.client_secret = Some(SecretValue::new(""));
        let failure = orchestrator().provision(&m).unwrap_err();
        assert_eq!(failure.step, ProvisionStep::SavingConfig);
        assert_eq!(failure.reason, FailureReason::BadRequest);
        assert_eq!(failure.detail.as_deref(), Some("clientSecret is required"));
    }

    #[test]
    fn test_whitespace_secret_is_accepted() {
        let mut m = manifest("p1");
        m.client_secret = Some(SecretValue::new("  "));
        assert!(orchestrator().provision(&m).is_ok());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default_config();
        config.seed.claim_value = "gold".to_string();
        let settings = ProvisioningSettings::from_config(&config);
        let policy = settings.seed.policy("pol-1", "p1").unwrap();
        assert_eq!(policy.policy.permissions[0].constraints[0].right_expression, "gold");
    }
}
