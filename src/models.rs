//! Core data models shared by the adapter and its connectors

use crate::error::OobError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of out-of-band interaction a caller wants to confirm
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Http,
    Dns,
    Jndi,
    Rmi,
    Ldap,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::Http,
        FilterType::Dns,
        FilterType::Jndi,
        FilterType::Rmi,
        FilterType::Ldap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Http => "http",
            FilterType::Dns => "dns",
            FilterType::Jndi => "jndi",
            FilterType::Rmi => "rmi",
            FilterType::Ldap => "ldap",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = OobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(FilterType::Http),
            "dns" => Ok(FilterType::Dns),
            "jndi" => Ok(FilterType::Jndi),
            "rmi" => Ok(FilterType::Rmi),
            "ldap" => Ok(FilterType::Ldap),
            _ => Err(OobError::UnknownFilterType(s.to_string())),
        }
    }
}

/// Interaction-log backend selected when building an adapter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// ceye.io: static API token, no handshake
    Ceye,
    /// dnslog.cn: session cookie issued alongside a subdomain
    Dnslogcn,
    /// alphalog: `/get` handshake returning key, subdomain and JNDI bases
    Alphalog,
    /// xray reverse platform: separate DNS and HTTP generators
    Xray,
    /// self-hosted revsuit recorder
    Revsuit,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Ceye,
        ProviderKind::Dnslogcn,
        ProviderKind::Alphalog,
        ProviderKind::Xray,
        ProviderKind::Revsuit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ceye => "ceye",
            ProviderKind::Dnslogcn => "dnslogcn",
            ProviderKind::Alphalog => "alphalog",
            ProviderKind::Xray => "xray",
            ProviderKind::Revsuit => "revsuit",
        }
    }

    /// Generic filter kinds this provider can validate
    pub fn supported_filter_types(&self) -> &'static [FilterType] {
        match self {
            ProviderKind::Ceye | ProviderKind::Dnslogcn => {
                &[FilterType::Http, FilterType::Dns, FilterType::Jndi]
            }
            ProviderKind::Alphalog => &FilterType::ALL,
            ProviderKind::Xray | ProviderKind::Revsuit => &[FilterType::Http, FilterType::Dns],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = OobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ceye" => Ok(ProviderKind::Ceye),
            "dnslogcn" => Ok(ProviderKind::Dnslogcn),
            "alphalog" => Ok(ProviderKind::Alphalog),
            "xray" => Ok(ProviderKind::Xray),
            "revsuit" => Ok(ProviderKind::Revsuit),
            _ => Err(OobError::UnknownProvider(s.to_string())),
        }
    }
}

/// How much of a generated address must appear in a log before it counts as a hit
///
/// Some upstream log APIs return truncated or flaky listings, so the
/// `Loose` rules for alphalog and xray do not require the token itself.
/// This favours false positives over false negatives. `Strict` always
/// requires the token.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    Loose,
    Strict,
}

impl FromStr for MatchPolicy {
    type Err = OobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loose" => Ok(MatchPolicy::Loose),
            "strict" => Ok(MatchPolicy::Strict),
            _ => Err(OobError::UnknownMatchPolicy(s.to_string())),
        }
    }
}

/// Credentials and endpoints supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// API token or key
    pub key: String,
    /// DNS zone the provider records lookups for
    pub domain: String,
    /// Base URL of the provider's query API
    pub api_url: String,
    /// Base URL of the provider's HTTP recorder (revsuit only)
    pub http_url: String,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

impl ConnectionParams {
    pub fn new(key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_http_url(mut self, http_url: impl Into<String>) -> Self {
        self.http_url = http_url.into();
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }
}

/// Candidate callback addresses, all embedding the same random token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDomains {
    pub filter: String,
    pub http: String,
    pub dns: String,
    pub jndi: String,
    pub rmi: String,
    pub ldap: String,
}

impl ValidationDomains {
    /// Returns the address offered for a given interaction kind, if any
    pub fn address(&self, kind: FilterType) -> Option<&str> {
        let value = match kind {
            FilterType::Http => &self.http,
            FilterType::Dns => &self.dns,
            FilterType::Jndi => &self.jndi,
            FilterType::Rmi => &self.rmi,
            FilterType::Ldap => &self.ldap,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Input to a single validation poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateParams {
    pub filter: String,
    pub filter_type: FilterType,
}

impl ValidateParams {
    pub fn new(filter: impl Into<String>, filter_type: FilterType) -> Self {
        Self {
            filter: filter.into(),
            filter_type,
        }
    }
}

/// Body used when a filter kind is not recognized or not supported
pub const UNKNOWN_FILTER_TYPE: &str = "unknown filter type";

/// Outcome of one validation poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub provider: Option<ProviderKind>,
    /// Requested kind as given by the caller
    pub filter_type: String,
    /// Raw provider response, kept for debugging
    pub body: String,
}

impl ValidationResult {
    pub fn hit(provider: ProviderKind, filter_type: FilterType, body: String) -> Self {
        Self {
            is_valid: true,
            provider: Some(provider),
            filter_type: filter_type.to_string(),
            body,
        }
    }

    pub fn miss(provider: ProviderKind, filter_type: FilterType, body: String) -> Self {
        Self {
            is_valid: false,
            provider: Some(provider),
            filter_type: filter_type.to_string(),
            body,
        }
    }

    pub fn unknown_filter_type(provider: Option<ProviderKind>, filter_type: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            provider,
            filter_type: filter_type.into(),
            body: UNKNOWN_FILTER_TYPE.to_string(),
        }
    }
}

/// One normalized interaction entry from a provider log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub raw: String,
    pub snippet: String,
    /// Best-effort identity for deduplication, may be empty
    pub unique_key: String,
}
