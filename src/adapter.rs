//! Provider-agnostic facade over a single bound connector

use crate::connector::{default_api_url, Connector, ProviderConnector};
use crate::error::{OobError, Result};
use crate::http::Transport;
use crate::models::{
    ConnectionParams, FilterType, ProviderKind, Record, ValidateParams, ValidationDomains,
    ValidationResult,
};
use crate::records;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Entry point for generating callback addresses and confirming interactions.
///
/// An adapter is bound to exactly one provider connector at construction.
/// It is effectively immutable afterwards and can be shared behind an `Arc`.
#[derive(Default)]
pub struct OobAdapter {
    params: ConnectionParams,
    connector: Option<Connector>,
}

impl OobAdapter {
    /// Builds an adapter for a provider given by name (`ceye`, `dnslogcn`,
    /// `alphalog`, `xray`, `revsuit`), running its bootstrap handshake.
    pub async fn new(
        provider: &str,
        params: ConnectionParams,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let kind = ProviderKind::from_str(provider)?;
        Self::with_provider(kind, params, transport).await
    }

    pub async fn with_provider(
        kind: ProviderKind,
        mut params: ConnectionParams,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        params.domain = params.domain.trim().to_string();
        if params.domain.is_empty() {
            return Err(OobError::MissingParameter("domain"));
        }

        let api_url = params.api_url.trim().trim_end_matches('/');
        params.api_url = if api_url.is_empty() {
            default_api_url(kind, &params.domain)
        } else {
            api_url.to_string()
        };

        let connector = Connector::connect(kind, &params, transport).await?;
        info!("Bound {kind} connector for {}", params.domain);

        Ok(Self {
            params,
            connector: Some(connector),
        })
    }

    /// An adapter with no connector; every operation is a safe no-op
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        self.connector.as_ref().map(Connector::kind)
    }

    /// Parameters after normalization
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn active(&self) -> Option<&dyn ProviderConnector> {
        self.connector.as_ref().map(Connector::as_provider)
    }

    pub fn validation_domains(&self) -> ValidationDomains {
        self.active()
            .map(|c| c.validation_domains())
            .unwrap_or_default()
    }

    pub async fn validate_result(&self, params: &ValidateParams) -> ValidationResult {
        match self.active() {
            Some(connector) => connector.validate(params).await,
            None => ValidationResult::unknown_filter_type(None, params.filter_type.as_str()),
        }
    }

    /// Like [`validate_result`](Self::validate_result) for a filter kind
    /// given as text; unrecognized kinds produce the "unknown filter type"
    /// result instead of an error.
    pub async fn validate_raw(&self, filter: &str, filter_type: &str) -> ValidationResult {
        match FilterType::from_str(filter_type) {
            Ok(kind) => {
                self.validate_result(&ValidateParams::new(filter, kind))
                    .await
            }
            Err(_) => ValidationResult::unknown_filter_type(self.provider(), filter_type),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.active().is_some_and(|c| c.is_valid())
    }

    /// Fetches the newest raw log for a kind without testing any token.
    ///
    /// Returns `None` when the adapter is unbound, the provider does not
    /// support `kind`, or the backend returned an empty body.
    pub async fn poll(&self, kind: FilterType) -> Option<Vec<u8>> {
        let connector = self.active()?;
        if connector.filter_type_mapping(kind).is_none() {
            debug!("{} cannot poll {kind} logs", connector.kind());
            return None;
        }

        let result = connector.validate(&ValidateParams::new("", kind)).await;
        if result.body.is_empty() {
            None
        } else {
            Some(result.body.into_bytes())
        }
    }

    pub async fn poll_records(&self, kind: FilterType) -> Vec<Record> {
        match self.poll(kind).await {
            Some(body) => records::normalize(&body),
            None => Vec::new(),
        }
    }

    /// Provider-aware check of a body the caller fetched itself. No I/O.
    pub fn matches(&self, body: &[u8], kind: FilterType, filter: &str) -> bool {
        let Some(connector) = self.active() else {
            return false;
        };
        if body.is_empty() || filter.is_empty() {
            return false;
        }
        connector.matches(&String::from_utf8_lossy(body), kind, filter)
    }

    /// Re-polls until the filter shows up or `timeout` elapses.
    ///
    /// Provider logs are cumulative, so a later poll also sees earlier hits.
    /// Returns the last result observed.
    pub async fn wait_for(
        &self,
        params: &ValidateParams,
        timeout: Duration,
        interval: Duration,
    ) -> ValidationResult {
        // `None` when the timeout is too large to represent: poll until a hit
        let deadline = Instant::now().checked_add(timeout);

        loop {
            let result = self.validate_result(params).await;
            let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
            if result.is_valid || expired {
                return result;
            }
            let supported = self
                .active()
                .and_then(|c| c.filter_type_mapping(params.filter_type))
                .is_some();
            if !supported {
                return result;
            }

            sleep(interval).await;
        }
    }
}
