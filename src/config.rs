//! Configuration management for the adapter CLI

use crate::error::{OobError, Result};
use crate::http::TransportOptions;
use crate::models::{ConnectionParams, MatchPolicy, ProviderKind};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// File-based configuration structure matching config/default.toml
#[derive(Debug, Deserialize)]
struct FileConfig {
    provider: Option<ProviderSection>,
    transport: Option<TransportSection>,
}

#[derive(Debug, Deserialize)]
struct ProviderSection {
    name: Option<String>,
    key: Option<String>,
    domain: Option<String>,
    api_url: Option<String>,
    http_url: Option<String>,
    match_policy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransportSection {
    timeout_secs: Option<u64>,
    retries: Option<u32>,
    max_body_size_mb: Option<usize>,
    proxy: Option<String>,
}

/// Everything needed to build an adapter and its transport
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    pub provider: Option<ProviderKind>,
    pub connection: ConnectionParams,
    pub transport: TransportOptions,
}

impl AdapterConfig {
    /// Returns the configured provider or a configuration error
    pub fn require_provider(&self) -> Result<ProviderKind> {
        self.provider
            .ok_or_else(|| OobError::Config("no provider selected".to_string()))
    }
}

/// Parses configuration from TOML text and merges it with defaults
pub fn parse_config(content: &str) -> Result<AdapterConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = AdapterConfig::default();

    if let Some(provider) = file_config.provider {
        if let Some(name) = provider.name {
            config.provider = Some(ProviderKind::from_str(&name)?);
        }
        if let Some(key) = provider.key {
            config.connection.key = key;
        }
        if let Some(domain) = provider.domain {
            config.connection.domain = domain;
        }
        if let Some(api_url) = provider.api_url {
            config.connection.api_url = api_url;
        }
        if let Some(http_url) = provider.http_url {
            config.connection.http_url = http_url;
        }
        if let Some(policy) = provider.match_policy {
            config.connection.match_policy = MatchPolicy::from_str(&policy)?;
        }
    }

    if let Some(transport) = file_config.transport {
        if let Some(timeout) = transport.timeout_secs {
            config.transport.timeout_secs = positive_timeout(timeout)?;
        }
        if let Some(retries) = transport.retries {
            config.transport.retries = retries;
        }
        if let Some(mb) = transport.max_body_size_mb {
            config.transport.max_body_size = body_size_bytes(mb)?;
        }
        if transport.proxy.is_some() {
            config.transport.proxy = transport.proxy;
        }
    }

    Ok(config)
}

fn positive_timeout(secs: u64) -> Result<u64> {
    if secs == 0 {
        return Err(OobError::Config("timeout_secs must be positive".to_string()));
    }
    Ok(secs)
}

fn body_size_bytes(mb: usize) -> Result<usize> {
    if mb == 0 {
        return Err(OobError::Config("max_body_size_mb must be positive".to_string()));
    }
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| OobError::Config(format!("max_body_size_mb {mb} is too large")))
}

/// Loads configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AdapterConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Overrides taken from the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub key: Option<String>,
    pub domain: Option<String>,
    pub api_url: Option<String>,
    pub http_url: Option<String>,
    pub match_policy: Option<String>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub proxy: Option<String>,
}

/// Merges CLI arguments into an existing AdapterConfig
pub fn merge_cli_args(config: &mut AdapterConfig, cli: CliOverrides) -> Result<()> {
    if let Some(name) = cli.provider {
        config.provider = Some(ProviderKind::from_str(&name)?);
    }
    if let Some(key) = cli.key {
        config.connection.key = key;
    }
    if let Some(domain) = cli.domain {
        config.connection.domain = domain;
    }
    if let Some(api_url) = cli.api_url {
        config.connection.api_url = api_url;
    }
    if let Some(http_url) = cli.http_url {
        config.connection.http_url = http_url;
    }
    if let Some(policy) = cli.match_policy {
        config.connection.match_policy = MatchPolicy::from_str(&policy)?;
    }
    if let Some(t) = cli.timeout {
        config.transport.timeout_secs = positive_timeout(t)?;
    }
    if let Some(r) = cli.retries {
        config.transport.retries = r;
    }
    if let Some(p) = cli.proxy {
        config.transport.proxy = Some(p);
    }
    Ok(())
}
