//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (SUBREPO_*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::SiteConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "subrepo-perms.toml",
    ".subrepo-perms.toml",
    "/etc/subrepo-perms/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<SiteConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let site_config: SiteConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&site_config)?;

    Ok(site_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<SiteConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults are handled by serde defaults on SiteConfig

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with SUBREPO_ prefix
    // e.g., SUBREPO_SUB_REPO_PERMISSIONS__ENABLED
    // Double underscore (__) maps to nested keys
    builder = builder.add_source(
        Environment::with_prefix("SUBREPO")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let site_config: SiteConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&site_config)?;

    Ok(site_config)
}

/// Validate configuration values
fn validate_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let sub_repo = &config.sub_repo_permissions;

    if sub_repo.user_cache_size == 0 {
        return Err(ConfigError::Invalid {
            message: "sub_repo_permissions.user_cache_size must be greater than 0".to_string(),
        });
    }

    if sub_repo.user_cache_ttl_seconds == 0 {
        return Err(ConfigError::Invalid {
            message: "sub_repo_permissions.user_cache_ttl_seconds must be greater than 0"
                .to_string(),
        });
    }

    Ok(())
}
