//! Application configuration.
//!
//! Defaults overlaid with an optional YAML file. Environment overrides and
//! command-line flags are applied on top by the CLI.

use crate::acr::{ContainerRegistryClientOptions, RegistryAudience};
use crate::error::{AzError, Result};
use crate::http::ClientConfig;
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;


/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "AZLOOK_CONFIG";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub registry: Registry,
    #[serde(default)]
    pub storage: Storage,
}

impl Config {
    /// Parses a `Config` from a YAML string, over defaults.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config`.
    ///
    /// An explicit path must exist. With `None` the default path is used when
    /// a file is there, otherwise defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?);

        let source = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(AzError::config(
                        "Config file not found".to_string(),
                        Some(p.display().to_string()),
                    ));
                }
                Some(p.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.exists()),
        };

        if let Some(p) = &source {
            debug!(path = %p.display(), "loading config file");
            builder = builder.add_source(
                File::from(p.as_path())
                    .format(FileFormat::Yaml)
                    .required(true),
            );
        }

        Self::from_builder(builder, source.as_deref())
    }

    /// `$AZLOOK_CONFIG`, else `<config_dir>/azlook/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        Self::default_path_with(&|key: &str| std::env::var(key).ok())
    }

    /// Same as [`Config::default_path`] with environment values read
    /// through `lookup`.
    pub fn default_path_with<F>(lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("azlook").join("config.yaml"))
    }

    /// HTTP transport settings from `network`.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.network.timeout)
            .with_max_idle_per_host(self.network.max_idle_per_host)
    }

    /// Registry client options from `registry` and `network`.
    pub fn registry_options(&self) -> Result<ContainerRegistryClientOptions> {
        let mut options = ContainerRegistryClientOptions::default()
            .with_audience(self.registry.audience.parse::<RegistryAudience>()?)
            .with_http(self.client_config());
        if let Some(n) = self.registry.page_size {
            options = options.with_page_size(n);
        }
        Ok(options)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                AzError::config_with_source(
                    "Failed to load configuration".to_string(),
                    path.map(|p| p.display().to_string()),
                    e,
                )
            })
    }
}

/// Output formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Output {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub color: ColorChoice,
}

/// Output formats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,

    Json,

    Yaml,
}

/// Color output choices.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,

    Always,

    Never,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

/// Container registry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registry {
    #[serde(default)]
    pub endpoint: Option<String>,

    /// `public`, `china`, `government` or an audience URL
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Admin user; switches the registry to Basic credentials
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub page_size: Option<usize>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            endpoint: None,
            audience: default_audience(),
            username: None,
            page_size: None,
        }
    }
}

fn default_audience() -> String {
    "public".to_string()
}

/// Blob storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Storage {
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub container: Option<String>,

    #[serde(default)]
    pub sas_token: Option<String>,
}
