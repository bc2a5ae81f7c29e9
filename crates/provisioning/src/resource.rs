//! Access-controlled resources: assets, policy definitions and contract
//! definitions.
//!
//! A contract definition binds an access policy and a contract policy to the
//! assets matched by its selector. Each type is built through a constructor
//! that rejects empty identifiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ServiceFailure, ServiceResult};

/// Canonical property holding an asset's identifier.
pub const ASSET_ID_PROPERTY: &str = "https://w3id.org/edc/v0.0.1/ns/id";

/// Resource types the resource services manage.
pub trait Resource: Clone + Send + Sync + 'static {
    /// Resource kind used in log lines and failure details
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn participant_context_id(&self) -> &str;
}

fn require_id(kind: &str, field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceFailure::bad_request(format!("{kind} {field} must not be empty")));
    }
    Ok(())
}

/// Where and how an asset's data is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAddress {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, String>,
}

impl DataAddress {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub participant_context_id: String,
    pub properties: BTreeMap<String, String>,
    pub data_address: DataAddress,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        participant_context_id: impl Into<String>,
        properties: BTreeMap<String, String>,
        data_address: DataAddress,
    ) -> ServiceResult<Self> {
        let asset = Self {
            id: id.into(),
            participant_context_id: participant_context_id.into(),
            properties,
            data_address,
        };
        require_id(Self::KIND, "id", &asset.id)?;
        require_id(Self::KIND, "participantContextId", &asset.participant_context_id)?;
        require_id(Self::KIND, "dataAddress.type", &asset.data_address.kind)?;
        Ok(asset)
    }

    /// Value of a property, with the canonical id property resolving to `id`.
    pub fn property(&self, key: &str) -> Option<&str> {
        if key == ASSET_ID_PROPERTY {
            return Some(&self.id);
        }
        self.properties.get(key).map(String::as_str)
    }
}

impl Resource for Asset {
    const KIND: &'static str = "asset";

    fn id(&self) -> &str {
        &self.id
    }

    fn participant_context_id(&self) -> &str {
        &self.participant_context_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
        }
    }

    fn evaluate(&self, left: &str, right: &str) -> bool {
        match self {
            Operator::Eq => left == right,
            Operator::Neq => left != right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Constraint comparing a named claim against a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicConstraint {
    pub left_expression: String,
    pub operator: Operator,
    pub right_expression: String,
}

impl AtomicConstraint {
    pub fn new(left: impl Into<String>, operator: Operator, right: impl Into<String>) -> Self {
        Self {
            left_expression: left.into(),
            operator,
            right_expression: right.into(),
        }
    }

    /// Evaluate against a set of presented claims. A missing claim never matches.
    pub fn is_satisfied_by(&self, claims: &BTreeMap<String, String>) -> bool {
        claims
            .get(&self.left_expression)
            .is_some_and(|value| self.operator.evaluate(value, &self.right_expression))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub action: Action,
    pub constraints: Vec<AtomicConstraint>,
}

impl Permission {
    pub fn new(action: impl Into<String>, constraints: Vec<AtomicConstraint>) -> Self {
        Self {
            action: Action {
                kind: action.into(),
            },
            constraints,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub permissions: Vec<Permission>,
}

impl Policy {
    /// Whether `action` is permitted for a holder presenting `claims`.
    pub fn permits(&self, action: &str, claims: &BTreeMap<String, String>) -> bool {
        self.permissions.iter().any(|p| {
            p.action.kind == action && p.constraints.iter().all(|c| c.is_satisfied_by(claims))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDefinition {
    pub id: String,
    pub participant_context_id: String,
    pub policy: Policy,
}

impl PolicyDefinition {
    pub fn new(
        id: impl Into<String>,
        participant_context_id: impl Into<String>,
        policy: Policy,
    ) -> ServiceResult<Self> {
        let definition = Self {
            id: id.into(),
            participant_context_id: participant_context_id.into(),
            policy,
        };
        require_id(Self::KIND, "id", &definition.id)?;
        require_id(Self::KIND, "participantContextId", &definition.participant_context_id)?;
        if definition.policy.permissions.is_empty() {
            return Err(ServiceFailure::bad_request(
                "policy must grant at least one permission",
            ));
        }
        Ok(definition)
    }
}

impl Resource for PolicyDefinition {
    const KIND: &'static str = "policy";

    fn id(&self) -> &str {
        &self.id
    }

    fn participant_context_id(&self) -> &str {
        &self.participant_context_id
    }
}

/// Selector criterion over asset properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub operand_left: String,
    pub operator: Operator,
    pub operand_right: String,
}

impl Criterion {
    pub fn new(left: impl Into<String>, operator: Operator, right: impl Into<String>) -> Self {
        Self {
            operand_left: left.into(),
            operator,
            operand_right: right.into(),
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        asset
            .property(&self.operand_left)
            .is_some_and(|value| self.operator.evaluate(value, &self.operand_right))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinition {
    pub id: String,
    pub participant_context_id: String,
    pub access_policy_id: String,
    pub contract_policy_id: String,
    pub assets_selector: Vec<Criterion>,
}

impl ContractDefinition {
    pub fn new(
        id: impl Into<String>,
        participant_context_id: impl Into<String>,
        access_policy_id: impl Into<String>,
        contract_policy_id: impl Into<String>,
        assets_selector: Vec<Criterion>,
    ) -> ServiceResult<Self> {
        let definition = Self {
            id: id.into(),
            participant_context_id: participant_context_id.into(),
            access_policy_id: access_policy_id.into(),
            contract_policy_id: contract_policy_id.into(),
            assets_selector,
        };
        require_id(Self::KIND, "id", &definition.id)?;
        require_id(Self::KIND, "participantContextId", &definition.participant_context_id)?;
        require_id(Self::KIND, "accessPolicyId", &definition.access_policy_id)?;
        require_id(Self::KIND, "contractPolicyId", &definition.contract_policy_id)?;
        Ok(definition)
    }

    /// An asset is selected when every criterion matches it.
    pub fn selects(&self, asset: &Asset) -> bool {
        self.assets_selector.iter().all(|c| c.matches(asset))
    }
}

impl Resource for ContractDefinition {
    const KIND: &'static str = "contract definition";

    fn id(&self) -> &str {
        &self.id
    }

    fn participant_context_id(&self) -> &str {
        &self.participant_context_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str) -> Asset {
        Asset::new(id, "p1", BTreeMap::new(), DataAddress::new("HttpData")).unwrap()
    }

    #[test]
    fn test_asset_requires_ids() {
        assert!(Asset::new("", "p1", BTreeMap::new(), DataAddress::new("HttpData")).is_err());
        assert!(Asset::new("a1", "", BTreeMap::new(), DataAddress::new("HttpData")).is_err());
        assert!(Asset::new("a1", "p1", BTreeMap::new(), DataAddress::new("")).is_err());
    }

    #[test]
    fn test_criterion_on_canonical_id() {
        let criterion = Criterion::new(ASSET_ID_PROPERTY, Operator::Eq, "a1");
        assert!(criterion.matches(&asset("a1")));
        assert!(!criterion.matches(&asset("a2")));
    }

    #[test]
    fn test_constraint_requires_claim() {
        let constraint = AtomicConstraint::new("MembershipCredential", Operator::Eq, "active");
        let mut claims = BTreeMap::new();
        assert!(!constraint.is_satisfied_by(&claims));

        claims.insert("MembershipCredential".to_string(), "suspended".to_string());
        assert!(!constraint.is_satisfied_by(&claims));

        claims.insert("MembershipCredential".to_string(), "active".to_string());
        assert!(constraint.is_satisfied_by(&claims));
    }

    #[test]
    fn test_policy_permits_only_granted_action() {
        let policy = Policy {
            permissions: vec![Permission::new(
                "use",
                vec![AtomicConstraint::new("MembershipCredential", Operator::Eq, "active")],
            )],
        };
        let claims = BTreeMap::from([("MembershipCredential".to_string(), "active".to_string())]);
        assert!(policy.permits("use", &claims));
        assert!(!policy.permits("transfer", &claims));
        assert!(!policy.permits("use", &BTreeMap::new()));
    }

    #[test]
    fn test_policy_definition_requires_permission() {
        assert!(PolicyDefinition::new("pol-1", "p1", Policy::default()).is_err());
    }

    #[test]
    fn test_contract_definition_requires_policy_refs() {
        assert!(ContractDefinition::new("cd-1", "p1", "", "pol-1", vec![]).is_err());
        assert!(ContractDefinition::new("cd-1", "p1", "pol-1", "pol-1", vec![]).is_ok());
    }

    #[test]
    fn test_operator_serialization() {
        let criterion = Criterion::new(ASSET_ID_PROPERTY, Operator::Eq, "a1");
        let json = serde_json::to_value(&criterion).unwrap();
        assert_eq!(json["operator"], "=");
        assert_eq!(json["operandLeft"], ASSET_ID_PROPERTY);
    }
}
