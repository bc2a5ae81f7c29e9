//! Core functionality shared across the onboarding workspace.
//!
//! This crate provides logging initialization, file-based configuration and
//! the core error type used by the provisioning crate and the management API.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, Config, DataPlaneConfig, LogFormat, LoggingConfig, SeedConfig};
pub use error::{CoreError, Result};
