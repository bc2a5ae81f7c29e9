//! Baseline resources seeded for every new participant.
//!
//! One asset, one policy gated on a membership credential claim, and one
//! contract definition binding that policy (as both access and contract
//! policy) to exactly that asset. The three creations run as a short-circuit
//! chain: a later resource is never created when an earlier one failed.

use onboard_core::SeedConfig;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::capability::ResourceService;
use crate::error::{ServiceFailure, ServiceResult};
use crate::resource::{
    Asset, AtomicConstraint, ContractDefinition, Criterion, DataAddress, Operator, Permission,
    Policy, PolicyDefinition, ASSET_ID_PROPERTY,
};

/// Action granted by the seeded policy.
pub const USE_ACTION: &str = "use";

/// Data address type of the seeded asset.
pub const HTTP_DATA: &str = "HttpData";

/// Resource services the seed chain writes to.
pub struct ResourceServices<'a> {
    pub assets: &'a dyn ResourceService<Asset>,
    pub policies: &'a dyn ResourceService<PolicyDefinition>,
    pub contract_definitions: &'a dyn ResourceService<ContractDefinition>,
}

/// Builds the seed resource values from the `[seed]` configuration.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    config: SeedConfig,
}

impl SeedPlan {
    pub fn new(config: SeedConfig) -> Self {
        Self { config }
    }

    pub fn asset(&self, asset_id: &str, participant_context_id: &str) -> ServiceResult<Asset> {
        let properties = BTreeMap::from([(
            "description".to_string(),
            self.config.description.clone(),
        )]);
        let data_address = DataAddress::new(HTTP_DATA)
            .with_property("baseUrl", self.config.base_url.clone())
            .with_property("proxyPath", self.config.proxy_path.to_string())
            .with_property("proxyQueryParams", self.config.proxy_query_params.to_string());

        Asset::new(asset_id, participant_context_id, properties, data_address)
    }

    pub fn policy(&self, policy_id: &str, participant_context_id: &str) -> ServiceResult<PolicyDefinition> {
        let constraint = AtomicConstraint::new(
            self.config.claim_name.clone(),
            Operator::Eq,
            self.config.claim_value.clone(),
        );
        let policy = Policy {
            permissions: vec![Permission::new(USE_ACTION, vec![constraint])],
        };
        PolicyDefinition::new(policy_id, participant_context_id, policy)
    }

    pub fn contract_definition(
        &self,
        definition_id: &str,
        participant_context_id: &str,
        asset_id: &str,
        policy_id: &str,
    ) -> ServiceResult<ContractDefinition> {
        ContractDefinition::new(
            definition_id,
            participant_context_id,
            policy_id,
            policy_id,
            vec![Criterion::new(ASSET_ID_PROPERTY, Operator::Eq, asset_id)],
        )
    }
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self::new(SeedConfig::default())
    }
}

/// The resources created by a successful seed chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResourceSet {
    pub asset: Asset,
    pub policy: PolicyDefinition,
    pub contract_definition: ContractDefinition,
}

impl SeedResourceSet {
    /// Contract definition must point both policy references at the seeded
    /// policy and its selector must resolve to the seeded asset.
    pub fn verify_linkage(&self) -> ServiceResult<()> {
        let cd = &self.contract_definition;
        if cd.access_policy_id != self.policy.id || cd.contract_policy_id != self.policy.id {
            return Err(ServiceFailure::unexpected(format!(
                "contract definition {} does not reference policy {}",
                cd.id, self.policy.id
            )));
        }
        if cd.assets_selector.is_empty() || !cd.selects(&self.asset) {
            return Err(ServiceFailure::unexpected(format!(
                "contract definition {} does not select asset {}",
                cd.id, self.asset.id
            )));
        }
        Ok(())
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create asset, then policy, then contract definition.
pub fn seed_resources(
    plan: &SeedPlan,
    services: &ResourceServices<'_>,
    participant_context_id: &str,
) -> ServiceResult<SeedResourceSet> {
    let asset_id = generate_id();

    plan.asset(&asset_id, participant_context_id)
        .and_then(|asset| services.assets.create(asset))
        .and_then(|asset| {
            plan.policy(&generate_id(), participant_context_id)
                .and_then(|policy| services.policies.create(policy))
                .map(|policy| (asset, policy))
        })
        .and_then(|(asset, policy)| {
            plan.contract_definition(&generate_id(), participant_context_id, &asset.id, &policy.id)
                .and_then(|cd| services.contract_definitions.create(cd))
                .map(|contract_definition| SeedResourceSet {
                    asset,
                    policy,
                    contract_definition,
                })
        })
        .and_then(|set| {
            set.verify_linkage()?;
            Ok(set)
        })
}
