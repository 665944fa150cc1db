//! xray reverse-platform connector
//!
//! Two generators are called at bootstrap, both authenticated with an
//! `X-Token` header:
//!
//! - `/_/api/cland/generate/dns_domain` → `{"data": {"prefix": "p-9a393c-iod8", "root": "..."}}`
//! - `/_/api/cland/generate/http_url` → `{"data": {"url": "http://x.x.x.x:8777/p/369d50/K5W0/"}}`
//!
//! Events are listed per kind from `/_/api/cland/event/list`.

use super::{contains_ci, join_url, ProviderConnector};
use crate::error::{OobError, Result};
use crate::http::{Transport, TransportResponse};
use crate::models::{ConnectionParams, FilterType, MatchPolicy, ProviderKind, ValidationDomains};
use crate::token::random_token;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const TOKEN_LEN: usize = 6;
const TOKEN_HEADER: &str = "X-Token";

#[derive(Debug, Default, Deserialize)]
struct XrayEnvelope {
    #[serde(default)]
    data: XrayData,
}

#[derive(Debug, Default, Deserialize)]
struct XrayData {
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    root: String,
    #[serde(default)]
    url: String,
}

pub struct XrayConnector {
    api_url: String,
    domain: String,
    headers: Vec<(String, String)>,
    /// DNS label prefix issued by the platform, e.g. `p-9a393c-iod8`
    dns_prefix: String,
    /// HTTP callback base issued by the platform
    http_url: String,
    policy: MatchPolicy,
    alive: bool,
    transport: Arc<dyn Transport>,
}

impl XrayConnector {
    pub async fn connect(params: &ConnectionParams, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_url = params.api_url.trim_end_matches('/').to_string();
        let headers = vec![(TOKEN_HEADER.to_string(), params.key.clone())];

        let dns = generate(&*transport, &api_url, "dns_domain", &headers).await?;
        if dns.prefix.is_empty() {
            return Err(OobError::bootstrap(ProviderKind::Xray, "dns_domain returned no prefix"));
        }

        let http = generate(&*transport, &api_url, "http_url", &headers).await?;
        if http.url.is_empty() {
            return Err(OobError::bootstrap(ProviderKind::Xray, "http_url returned no url"));
        }

        info!(
            "xray: dns prefix {} (root {}), http base {}",
            dns.prefix, dns.root, http.url
        );
        Ok(Self {
            api_url,
            domain: params.domain.clone(),
            headers,
            dns_prefix: dns.prefix,
            http_url: http.url,
            policy: params.match_policy,
            alive: true,
            transport,
        })
    }

    pub fn dns_prefix(&self) -> &str {
        &self.dns_prefix
    }

    pub fn http_url(&self) -> &str {
        &self.http_url
    }

    /// Path portion of the issued HTTP URL starting at `/p/`, without trailing slash
    fn http_path(&self) -> Option<&str> {
        let start = self.http_url.find("/p/")?;
        Some(self.http_url[start..].trim_end_matches('/'))
    }
}

async fn generate(
    transport: &dyn Transport,
    api_url: &str,
    what: &str,
    headers: &[(String, String)],
) -> Result<XrayData> {
    let url = format!("{api_url}/_/api/cland/generate/{what}");
    let response = transport.get_with_headers(&url, headers).await;
    if response.is_no_response() {
        return Err(OobError::bootstrap(
            ProviderKind::Xray,
            format!("no response from {url}"),
        ));
    }

    let envelope: XrayEnvelope = serde_json::from_slice(&response.body).map_err(|e| {
        OobError::bootstrap(ProviderKind::Xray, format!("malformed {what} response: {e}"))
    })?;
    Ok(envelope.data)
}

#[async_trait]
impl ProviderConnector for XrayConnector {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Xray
    }

    fn validation_domains(&self) -> ValidationDomains {
        let filter = random_token(TOKEN_LEN);
        ValidationDomains {
            http: join_url(&self.http_url, &filter),
            dns: format!("{}.{filter}.{}", self.dns_prefix, self.domain),
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
            "{}/_/api/cland/event/list?lastID=&count=10&eventType={provider_kind}&action=Next",
            self.api_url
        );
        self.transport.get_with_headers(&url, &self.headers).await
    }

    fn matches(&self, body: &str, kind: FilterType, filter: &str) -> bool {
        match (kind, self.policy) {
            (FilterType::Http, MatchPolicy::Loose) => contains_ci(body, &format!("/{filter}")),
            (FilterType::Http, MatchPolicy::Strict) => match self.http_path() {
                Some(path) => contains_ci(body, &format!("{path}/{filter}")),
                None => contains_ci(body, &format!("/{filter}")),
            },
            (FilterType::Dns, MatchPolicy::Loose) => {
                debug!("xray: loose dns match, token not required");
                contains_ci(body, &format!("{}.", self.dns_prefix))
            }
            (FilterType::Dns, MatchPolicy::Strict) => {
                contains_ci(body, &format!("{}.{filter}", self.dns_prefix))
            }
            (FilterType::Jndi | FilterType::Rmi | FilterType::Ldap, _) => false,
        }
    }
}
