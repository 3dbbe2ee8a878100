// Copyright (c) 2026 fhgate contributors
// SPDX-License-Identifier: AGPL-3.0

// Server Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - NFSv4 handle expiry behaviour
// - The pseudo filesystem export
// - The table of real exports

use crate::domain::export::ExportId;
use crate::domain::server_state::HandlePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "fhgate.io/v1";
pub const KIND: &str = "ServerConfig";

/// Top-level server configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfigManifest {
    /// API version (must be "fhgate.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServerConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ServerConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigSpec {
    #[serde(default)]
    pub nfsv4: Nfsv4Config,

    #[serde(default)]
    pub pseudofs: PseudoFsConfig,

    #[serde(default)]
    pub exports: Vec<ExportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nfsv4Config {
    /// Stamp v4 handles with the server boot time so they expire on restart
    #[serde(default)]
    pub fh_expire: bool,

    /// Report an expired handle to the client instead of accepting it
    #[serde(default = "default_true")]
    pub returns_err_fh_expired: bool,
}

impl Default for Nfsv4Config {
    fn default() -> Self {
        Self {
            fh_expire: false,
            returns_err_fh_expired: true,
        }
    }
}

impl Nfsv4Config {
    pub fn handle_policy(&self) -> HandlePolicy {
        HandlePolicy {
            expire_on_reboot: self.fh_expire,
            report_expired_as_error: self.returns_err_fh_expired,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PseudoFsConfig {
    #[serde(default)]
    pub export_id: i16,

    #[serde(default = "default_root_name")]
    pub root_name: String,
}

impl Default for PseudoFsConfig {
    fn default() -> Self {
        Self {
            export_id: ExportId::PSEUDO.value(),
            root_name: default_root_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub id: i16,
    pub path: String,
}

fn default_true() -> bool {
    true
}

fn default_root_name() -> String {
    "/".to_string()
}

impl Default for ServerConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "fhgate".to_string(),
                version: None,
            },
            spec: ServerConfigSpec::default(),
        }
    }
}

impl ServerConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. FHGATE_CONFIG_PATH environment variable
    /// 2. ./fhgate-config.yaml (working directory)
    /// 3. /etc/fhgate/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("FHGATE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./fhgate-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        let system_config = PathBuf::from("/etc/fhgate/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_bool("FHGATE_FH_EXPIRE") {
            self.spec.nfsv4.fh_expire = value;
        }
        if let Some(value) = env_bool("FHGATE_FH_EXPIRED_IS_ERROR") {
            self.spec.nfsv4.returns_err_fh_expired = value;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.pseudofs.root_name.is_empty() {
            anyhow::bail!("spec.pseudofs.root_name cannot be empty");
        }

        let mut seen = HashSet::new();
        for export in &self.spec.exports {
            if export.path.is_empty() {
                anyhow::bail!("Export path cannot be empty for export id {}", export.id);
            }
            if export.id == self.spec.pseudofs.export_id {
                anyhow::bail!(
                    "Export id {} ({}) collides with the pseudo filesystem export id",
                    export.id,
                    export.path
                );
            }
            if !seen.insert(export.id) {
                anyhow::bail!("Duplicate export id {} ({})", export.id, export.path);
            }
        }

        Ok(())
    }

    pub fn handle_policy(&self) -> HandlePolicy {
        self.spec.nfsv4.handle_policy()
    }

    pub fn pseudo_export_id(&self) -> ExportId {
        ExportId(self.spec.pseudofs.export_id)
    }
}

fn env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => {
            tracing::info!("Environment override: {}=true", name);
            Some(true)
        }
        "false" | "0" | "no" | "off" => {
            tracing::info!("Environment override: {}=false", name);
            Some(false)
        }
        _ => {
            tracing::warn!(
                "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                name,
                val
            );
            None
        }
    }
}
