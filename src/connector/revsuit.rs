//! Self-hosted revsuit recorder connector
//!
//! The admin API is authenticated with a `token=<key>` cookie. HTTP
//! callbacks are recorded under `{http_url}/<token>`, DNS lookups under
//! `<token>.{domain}` where the domain is usually a `log.` zone.

use super::{contains_ci, join_url, ProviderConnector};
use crate::error::{OobError, Result};
use crate::http::cookie::token_cookie;
use crate::http::{Transport, TransportResponse};
use crate::models::{ConnectionParams, FilterType, ProviderKind, ValidationDomains};
use crate::token::random_token;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

const TOKEN_LEN: usize = 8;
const PAGE_SIZE: u32 = 100;

pub struct RevsuitConnector {
    api_url: String,
    dns_domain: String,
    http_url: String,
    cookie: String,
    alive: bool,
    transport: Arc<dyn Transport>,
}

impl RevsuitConnector {
    pub async fn connect(params: &ConnectionParams, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_url = params.api_url.trim_end_matches('/').to_string();
        let cookie = token_cookie(&params.key);
        let url = format!("{api_url}/api/record/dns?page=1&pageSize=1&order=desc");

        let response = transport.get_with_cookie(&url, &cookie).await;
        if response.is_no_response() {
            return Err(OobError::bootstrap(
                ProviderKind::Revsuit,
                format!("no response from {url}"),
            ));
        }

        if params.http_url.is_empty() {
            warn!("revsuit: no http_url configured, HTTP callbacks disabled");
        }
        info!("revsuit: recorder at {api_url}, dns zone {}", params.domain);
        Ok(Self {
            api_url,
            dns_domain: params.domain.clone(),
            http_url: params.http_url.clone(),
            cookie,
            alive: true,
            transport,
        })
    }
}

#[async_trait]
impl ProviderConnector for RevsuitConnector {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Revsuit
    }

    fn validation_domains(&self) -> ValidationDomains {
        let filter = random_token(TOKEN_LEN);
        let http = if self.http_url.is_empty() {
            String::new()
        } else {
            join_url(&self.http_url, &filter)
        };
        ValidationDomains {
            http,
            dns: format!("{filter}.{}", self.dns_domain),
            filter,
            ..ValidationDomains::default()
        }
    }

    fn is_valid(&self) -> bool {
        self.alive
    }

    fn filter_type_mapping(&self, kind: FilterType) -> Option<&'static str> {
        match kind {
            FilterType::Http => Some("http"),
            FilterType::Dns => Some("dns"),
            FilterType::Jndi | FilterType::Rmi | FilterType::Ldap => None,
        }
    }

    async fn poll(&self, provider_kind: &'static str, _filter: &str) -> TransportResponse {
        let url = format!(
            "{}/api/record/{provider_kind}?page=1&pageSize={PAGE_SIZE}&order=desc",
            self.api_url
        );
        self.transport.get_with_cookie(&url, &self.cookie).await
    }

    fn matches(&self, body: &str, kind: FilterType, filter: &str) -> bool {
        match kind {
            FilterType::Http => contains_ci(body, &format!("/log/{filter}")),
            FilterType::Dns => contains_ci(body, &format!("{filter}.log")),
            FilterType::Jndi | FilterType::Rmi | FilterType::Ldap => false,
        }
    }
}
