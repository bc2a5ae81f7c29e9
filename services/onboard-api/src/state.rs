use onboard_core::Config;
use onboard_provisioning::{
    Asset, ContractDefinition, InMemoryConfigStore, InMemoryEndpointRegistry,
    InMemoryIdentityStore, InMemoryResourceService, InMemoryVault, PolicyDefinition,
    ProvisioningOrchestrator, ProvisioningSettings, ResourceServiceHandles,
};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub orchestrator: ProvisioningOrchestrator,
}

impl AppState {
    /// State backed by in-process stores. Everything is lost on restart.
    pub fn in_memory(config: Config) -> Self {
        let identities = Arc::new(InMemoryIdentityStore::new());
        let orchestrator = ProvisioningOrchestrator::new(
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
            ProvisioningSettings::from_config(&config),
        );

        AppState {
            config,
            orchestrator,
        }
    }
}
