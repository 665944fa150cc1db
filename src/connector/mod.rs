//! Provider connectors
//!
//! Each backend gets its own connector type implementing
//! [`ProviderConnector`]. [`Connector`] is the closed set of those types and
//! is what the adapter stores.

pub mod alphalog;
pub mod ceye;
pub mod dnslogcn;
pub mod revsuit;
pub mod xray;

pub use alphalog::AlphalogConnector;
pub use ceye::CeyeConnector;
pub use dnslogcn::DnslogcnConnector;
pub use revsuit::RevsuitConnector;
pub use xray::XrayConnector;

use crate::error::Result;
use crate::http::{Transport, TransportResponse};
use crate::models::{
    ConnectionParams, FilterType, ProviderKind, ValidateParams, ValidationDomains,
    ValidationResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Operations every provider backend supports
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Builds a fresh set of callback addresses around a new random token
    fn validation_domains(&self) -> ValidationDomains;

    /// Whether the connector finished its bootstrap and can be polled
    fn is_valid(&self) -> bool;

    /// Maps a generic kind to the provider's own query kind, `None` if unsupported
    fn filter_type_mapping(&self, kind: FilterType) -> Option<&'static str>;

    /// Fetches the current interaction log for a provider-specific kind
    async fn poll(&self, provider_kind: &'static str, filter: &str) -> TransportResponse;

    /// Pure check of an already fetched log body
    fn matches(&self, body: &str, kind: FilterType, filter: &str) -> bool;

    /// Polls the backend and decides whether `params.filter` was logged
    async fn validate(&self, params: &ValidateParams) -> ValidationResult {
        let provider = self.kind();
        let Some(provider_kind) = self.filter_type_mapping(params.filter_type) else {
            return ValidationResult::unknown_filter_type(Some(provider), params.filter_type.as_str());
        };

        let response = self.poll(provider_kind, &params.filter).await;
        let body = response.text().into_owned();

        if response.is_no_response() {
            debug!("{provider}: no response while polling {provider_kind} log");
            return ValidationResult::miss(provider, params.filter_type, body);
        }

        if !params.filter.is_empty() && self.matches(&body, params.filter_type, &params.filter) {
            debug!("{provider}: filter {} found in {provider_kind} log", params.filter);
            ValidationResult::hit(provider, params.filter_type, body)
        } else {
            ValidationResult::miss(provider, params.filter_type, body)
        }
    }
}

/// The connector bound to an adapter
pub enum Connector {
    Ceye(CeyeConnector),
    Dnslogcn(DnslogcnConnector),
    Alphalog(AlphalogConnector),
    Xray(XrayConnector),
    Revsuit(RevsuitConnector),
}

impl Connector {
    /// Builds and bootstraps the connector for `kind`.
    ///
    /// `params.api_url` must already be resolved, see [`default_api_url`].
    pub async fn connect(
        kind: ProviderKind,
        params: &ConnectionParams,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let connector = match kind {
            ProviderKind::Ceye => {
                Connector::Ceye(CeyeConnector::new(params, transport))
            }
            ProviderKind::Dnslogcn => Connector::Dnslogcn(
                DnslogcnConnector::connect(params, transport).await?,
            ),
            ProviderKind::Alphalog => {
                Connector::Alphalog(AlphalogConnector::connect(params, transport).await?)
            }
            ProviderKind::Xray => Connector::Xray(XrayConnector::connect(params, transport).await?),
            ProviderKind::Revsuit => {
                Connector::Revsuit(RevsuitConnector::connect(params, transport).await?)
            }
        };
        Ok(connector)
    }

    pub fn as_provider(&self) -> &dyn ProviderConnector {
        match self {
            Connector::Ceye(c) => c,
            Connector::Dnslogcn(c) => c,
            Connector::Alphalog(c) => c,
            Connector::Xray(c) => c,
            Connector::Revsuit(c) => c,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.as_provider().kind()
    }
}

/// API base used when the caller does not supply one.
///
/// ceye and dnslog.cn serve their query API from a fixed public host; the
/// other providers answer on the recorded domain itself.
pub fn default_api_url(kind: ProviderKind, domain: &str) -> String {
    match kind {
        ProviderKind::Ceye => ceye::CEYE_API_URL.to_string(),
        ProviderKind::Dnslogcn => dnslogcn::DNSLOGCN_API_URL.to_string(),
        ProviderKind::Alphalog | ProviderKind::Xray | ProviderKind::Revsuit => {
            format!("http://{domain}")
        }
    }
}

/// Case-insensitive substring test used by every match rule
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Joins a base URL and a path segment with exactly one slash
pub(crate) fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}
