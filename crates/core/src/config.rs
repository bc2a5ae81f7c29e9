//! Configuration management for the onboarding service.
//!
//! Every section and field is optional in the TOML file; anything left out
//! falls back to [`Config::default_config`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub dataplane: DataPlaneConfig,
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
}

/// Management API context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ApiConfig {
    /// Context path without trailing `/`, so the root context is empty.
    pub fn context_path(&self) -> &str {
        self.path.trim_end_matches('/')
    }
}

/// Default data-movement endpoint registered for every new participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPlaneConfig {
    pub url: String,
    pub allowed_source_types: Vec<String>,
    pub allowed_transfer_types: Vec<String>,
}

/// Baseline asset and policy seeded for every new participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub description: String,
    pub base_url: String,
    pub proxy_path: bool,
    pub proxy_query_params: bool,
    /// Credential claim the seeded policy constrains on
    pub claim_name: String,
    pub claim_value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            path: "/api/mgmt".to_string(),
        }
    }
}

impl Default for DataPlaneConfig {
    fn default() -> Self {
        Self {
            url: "http://dataplane.edc-v.cluster.svc.local:8083/api/control/v1/dataflows"
                .to_string(),
            allowed_source_types: vec!["HttpData".to_string()],
            allowed_transfer_types: vec!["HttpData-PULL".to_string()],
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            description: "This asset requires the Membership credential to access".to_string(),
            base_url: "https://jsonplaceholder.typicode.com/todos".to_string(),
            proxy_path: true,
            proxy_query_params: true,
            claim_name: "MembershipCredential".to_string(),
            claim_value: "active".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plain,
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load and validate a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Check the invariants the provisioning flow relies on.
    pub fn validate(&self) -> Result<()> {
        if self.api.port == 0 {
            return Err(CoreError::InvalidConfig("api.port must be non-zero".to_string()));
        }
        if !self.api.path.starts_with('/') {
            return Err(CoreError::InvalidConfig(format!(
                "api.path must start with '/': {}",
                self.api.path
            )));
        }
        if self.dataplane.url.trim().is_empty() {
            return Err(CoreError::InvalidConfig("dataplane.url is required".to_string()));
        }
        if self.dataplane.allowed_source_types.is_empty() {
            return Err(CoreError::InvalidConfig(
                "dataplane.allowed_source_types must not be empty".to_string(),
            ));
        }
        if self.dataplane.allowed_transfer_types.is_empty() {
            return Err(CoreError::InvalidConfig(
                "dataplane.allowed_transfer_types must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address the management API binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
