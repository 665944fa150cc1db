//! dnslog.cn connector
//!
//! `getdomain.php` hands out a subdomain bound to a PHP session cookie;
//! `getrecords.php` lists lookups for that session only.

use super::{contains_ci, ProviderConnector};
use crate::error::{OobError, Result};
use crate::http::{Transport, TransportResponse};
use crate::models::{ConnectionParams, FilterType, ProviderKind, ValidationDomains};
use crate::token::{cache_buster, random_token};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub const DNSLOGCN_API_URL: &str = "http://dnslog.cn";
const TOKEN_LEN: usize = 6;

pub struct DnslogcnConnector {
    api_url: String,
    /// Subdomain issued for this session, e.g. `ab12cd.dnslog.cn`
    subdomain: String,
    cookie: String,
    alive: bool,
    transport: Arc<dyn Transport>,
}

impl DnslogcnConnector {
    pub async fn connect(params: &ConnectionParams, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_url = params.api_url.trim_end_matches('/').to_string();
        let url = format!("{api_url}/getdomain.php?t={}", cache_buster());

        let response = transport.get_capturing_cookie(&url).await;
        if response.is_no_response() {
            return Err(OobError::bootstrap(
                ProviderKind::Dnslogcn,
                format!("no response from {url}"),
            ));
        }

        let subdomain = response.text().trim().to_string();
        if !subdomain.contains(&format!(".{}", params.domain)) {
            return Err(OobError::bootstrap(
                ProviderKind::Dnslogcn,
                format!("issued domain '{subdomain}' is not under {}", params.domain),
            ));
        }

        let cookie = response.set_cookie.unwrap_or_default();
        if cookie.is_empty() {
            warn!("dnslogcn: no session cookie issued, records may be empty");
        }

        info!("dnslogcn: session subdomain {subdomain}");
        Ok(Self {
            api_url,
            subdomain,
            cookie,
            alive: true,
            transport,
        })
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }
}

#[async_trait]
impl ProviderConnector for DnslogcnConnector {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dnslogcn
    }

    fn validation_domains(&self) -> ValidationDomains {
        let filter = random_token(TOKEN_LEN);
        let dns = format!("{filter}.{}", self.subdomain);
        ValidationDomains {
            http: format!("http://{dns}"),
            jndi: dns.clone(),
            dns,
            filter,
            ..ValidationDomains::default()
        }
    }

    fn is_valid(&self) -> bool {
        self.alive
    }

    // The records endpoint does not separate kinds: HTTP callbacks show up
    // as the DNS lookup that preceded them.
    fn filter_type_mapping(&self, kind: FilterType) -> Option<&'static str> {
        match kind {
            FilterType::Http | FilterType::Dns | FilterType::Jndi => Some("dns"),
            FilterType::Rmi | FilterType::Ldap => None,
        }
    }

    async fn poll(&self, _provider_kind: &'static str, _filter: &str) -> TransportResponse {
        let url = format!("{}/getrecords.php?t={}", self.api_url, cache_buster());
        self.transport.get_with_cookie(&url, &self.cookie).await
    }

    fn matches(&self, body: &str, _kind: FilterType, filter: &str) -> bool {
        contains_ci(body, filter)
    }
}
