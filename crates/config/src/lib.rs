// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! YAML configuration for the catalog sync tool.
//!
//! A configuration file names the store to talk to and a few per-run
//! defaults:
//!
//! ```yaml
//! store:
//!   base_url: "https://catalog.example.com/api"
//!   api_token: "..."
//!   timeout_secs: 30
//! vendor: "Acme"
//! default_protection: "n"
//! ```

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Connection settings for the catalog store service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Base URL of the resource API.
    pub base_url: String,
    /// Bearer token attached to every request, if the service requires one.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Top-level settings for a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Store connection parameters.
    pub store: StoreSettings,
    /// Vendor name used when the document does not declare one.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Protection written to address blocks whose stored value is empty
    /// and whose document entry says nothing.
    #[serde(default = "default_protection")]
    pub default_protection: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_protection() -> String {
    "n".to_string()
}

impl SyncSettings {
    /// Loads and validates settings from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let settings: SyncSettings =
            serde_yaml::from_reader(file).context("Failed to parse YAML configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Minimal settings for runs configured entirely from the command line.
    pub fn for_url(base_url: &str) -> Self {
        Self {
            store: StoreSettings {
                base_url: base_url.to_string(),
                api_token: None,
                timeout_secs: default_timeout_secs(),
            },
            vendor: None,
            default_protection: default_protection(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.store.base_url.trim().is_empty() {
            anyhow::bail!("store.base_url must not be empty");
        }
        if self.store.timeout_secs == 0 {
            anyhow::bail!("store.timeout_secs must be greater than zero");
        }
        if !["s", "n", "p"].contains(&self.default_protection.as_str()) {
            anyhow::bail!(
                "default_protection must be one of 's', 'n', 'p', got '{}'",
                self.default_protection
            );
        }
        Ok(())
    }
}
