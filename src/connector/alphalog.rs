//! alphalog connector
//!
//! `GET {api}/get` issues a session:
//!
//! ```json
//! {"key": "...", "subdomain": "x1.alphalog.cn", "rmi": "rmi://1.2.3.4:1099", "ldap": "ldap://1.2.3.4:1389"}
//! ```
//!
//! Logs are fetched by POSTing `key=<key>` back to the API root.

use super::{contains_ci, join_url, ProviderConnector};
use crate::error::{OobError, Result};
use crate::http::{Transport, TransportResponse};
use crate::models::{ConnectionParams, FilterType, MatchPolicy, ProviderKind, ValidationDomains};
use crate::token::random_token;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const TOKEN_LEN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
struct AlphalogSession {
    #[serde(default)]
    key: String,
    #[serde(default)]
    subdomain: String,
    #[serde(default)]
    rmi: String,
    #[serde(default)]
    ldap: String,
}

pub struct AlphalogConnector {
    api_url: String,
    session: AlphalogSession,
    policy: MatchPolicy,
    alive: bool,
    transport: Arc<dyn Transport>,
}

impl AlphalogConnector {
    pub async fn connect(params: &ConnectionParams, transport: Arc<dyn Transport>) -> Result<Self> {
        let api_url = params.api_url.trim_end_matches('/').to_string();
        let url = format!("{api_url}/get");

        let response = transport.get(&url).await;
        if response.is_no_response() {
            return Err(OobError::bootstrap(
                ProviderKind::Alphalog,
                format!("no response from {url}"),
            ));
        }

        let session: AlphalogSession = serde_json::from_slice(&response.body).map_err(|e| {
            OobError::bootstrap(ProviderKind::Alphalog, format!("malformed session response: {e}"))
        })?;
        if session.key.is_empty() || session.subdomain.is_empty() {
            return Err(OobError::bootstrap(
                ProviderKind::Alphalog,
                "session response is missing key or subdomain",
            ));
        }

        info!("alphalog: session subdomain {}", session.subdomain);
        Ok(Self {
            api_url,
            session,
            policy: params.match_policy,
            alive: true,
            transport,
        })
    }
}

#[async_trait]
impl ProviderConnector for AlphalogConnector {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Alphalog
    }

    fn validation_domains(&self) -> ValidationDomains {
        let filter = random_token(TOKEN_LEN);
        let dns = format!("{filter}.{}", self.session.subdomain);
        let on_base = |base: &str| {
            if base.is_empty() {
                String::new()
            } else {
                join_url(base, &filter)
            }
        };
        ValidationDomains {
            http: format!("http://{dns}"),
            jndi: on_base(&self.session.ldap),
            rmi: on_base(&self.session.rmi),
            ldap: on_base(&self.session.ldap),
            dns,
            filter,
        }
    }

    fn is_valid(&self) -> bool {
        self.alive
    }

    fn filter_type_mapping(&self, kind: FilterType) -> Option<&'static str> {
        Some(kind.as_str())
    }

    async fn poll(&self, _provider_kind: &'static str, _filter: &str) -> TransportResponse {
        let body = format!("key={}", self.session.key);
        self.transport.post(&self.api_url, &body, "").await
    }

    fn matches(&self, body: &str, kind: FilterType, filter: &str) -> bool {
        match self.policy {
            MatchPolicy::Loose => {
                debug!("alphalog: loose match, trailing delimiter not required");
                contains_ci(body, filter)
            }
            MatchPolicy::Strict => match kind {
                FilterType::Http | FilterType::Dns => contains_ci(body, &format!("{filter}.")),
                FilterType::Jndi | FilterType::Rmi | FilterType::Ldap => {
                    contains_ci(body, &format!("/{filter}"))
                }
            },
        }
    }
}
