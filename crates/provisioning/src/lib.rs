//! Participant provisioning for a dataspace connector.
//!
//! A provisioning request (a [`ParticipantManifest`]) establishes, in a fixed
//! order, everything a new participant needs before it can take part in data
//! exchange:
//!
//! 1. an identity record in the identity context store
//! 2. its OAuth/issuer configuration in the config store
//! 3. its client secret in the vault
//! 4. a data-movement endpoint in the endpoint registry
//! 5. a baseline asset, policy and contract definition
//!
//! Each step consumes only what earlier steps produced. The first failure ends
//! the run and is reported as a [`ProvisionFailure`] carrying the step tag and
//! a reason from the closed [`FailureReason`] taxonomy. Steps that already
//! succeeded are not compensated.
//!
//! # Capabilities
//!
//! The stores, vault, registry and resource services are traits in
//! [`capability`]; [`memory`] provides lock-protected in-process backends.

pub mod capability;
pub mod endpoint;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod memory;
pub mod orchestrator;
pub mod participant;
pub mod resource;
pub mod run;
pub mod seed;

pub use capability::{
    ConfigStore, EndpointRegistry, IdentityContextStore, ResourceService, SecretVault,
};
pub use endpoint::EndpointInstance;
pub use error::{
    FailureReason, ProvisionFailure, ProvisionStep, RegistryError, ServiceFailure, ServiceResult,
    VaultError,
};
pub use locator::{ParticipantLocator, PARTICIPANTS_PATH};
pub use manifest::{ParticipantManifest, QueryDefaults, SecretValue};
pub use memory::{
    InMemoryConfigStore, InMemoryEndpointRegistry, InMemoryIdentityStore,
    InMemoryResourceService, InMemoryVault,
};
pub use orchestrator::{ProvisioningOrchestrator, ProvisioningSettings, ResourceServiceHandles};
pub use participant::{ParticipantConfig, ParticipantIdentity, ParticipantState};
pub use resource::{
    Asset, AtomicConstraint, ContractDefinition, Criterion, DataAddress, Operator, Permission,
    Policy, PolicyDefinition, Resource, ASSET_ID_PROPERTY,
};
pub use run::{ProvisioningRun, ProvisioningState, RunError, StateTransition};
pub use seed::{seed_resources, SeedPlan, SeedResourceSet};
