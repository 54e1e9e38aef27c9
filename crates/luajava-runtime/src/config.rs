//! Sandbox configuration files.
//!
//! Embedders describe the sandbox for a script host in a TOML (or JSON)
//! document:
//!
//! ```toml
//! [sandbox]
//! whitelist = ["com.example."]
//! blacklist = ["com.example.internal."]
//! ```
//!
//! Leaving out the `[sandbox]` table means scripts run unrestricted. A
//! `[sandbox]` table without a `whitelist` key denies every class.

use crate::error::{BridgeError, BridgeResult};
use crate::sandbox::Sandbox;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Sandbox applied to scripts. `None` leaves them unrestricted.
    #[serde(default)]
    pub sandbox: Option<Sandbox>,
}

impl BridgeConfig {
    /// Load a configuration file. Files ending in `.json` are parsed as
    /// JSON, everything else as TOML.
    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_str(&content)
        }
    }

    /// Parse a configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(content: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> BridgeResult<()> {
        let Some(sandbox) = &self.sandbox else {
            return Ok(());
        };

        if let Some(whitelist) = sandbox.whitelist() {
            check_duplicates("whitelist", whitelist)?;
            if whitelist.iter().any(String::is_empty) {
                warn!("sandbox whitelist contains an empty prefix; every class is permitted");
            }
        }

        if let Some(blacklist) = sandbox.blacklist() {
            check_duplicates("blacklist", blacklist)?;
        }

        Ok(())
    }

    /// Build the configured sandbox, if any.
    pub fn into_sandbox(self) -> Option<Sandbox> {
        self.sandbox
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> BridgeResult<String> {
        toml::to_string(self).map_err(|e| BridgeError::InvalidPolicy(e.to_string()))
    }
}

fn check_duplicates(list: &str, prefixes: &[String]) -> BridgeResult<()> {
    let mut seen = HashSet::new();
    for prefix in prefixes {
        if !seen.insert(prefix.as_str()) {
            return Err(BridgeError::InvalidPolicy(format!(
                "duplicate {} prefix '{}'",
                list, prefix
            )));
        }
    }
    Ok(())
}
