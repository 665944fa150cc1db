//! ceye.io connector
//!
//! No handshake: the API token comes from configuration and the identifier
//! subdomain is fixed per account.
//! Records API: `/v1/records?token={token}&type={dns|http}&filter={filter}`

use super::{contains_ci, ProviderConnector};
use crate::http::{Transport, TransportResponse};
use crate::models::{ConnectionParams, FilterType, ProviderKind, ValidationDomains};
use crate::token::random_token;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub const CEYE_API_URL: &str = "http://api.ceye.io";
const TOKEN_LEN: usize = 10;

pub struct CeyeConnector {
    token: String,
    domain: String,
    api_url: String,
    transport: Arc<dyn Transport>,
}

impl CeyeConnector {
    pub fn new(params: &ConnectionParams, transport: Arc<dyn Transport>) -> Self {
        if params.key.is_empty() {
            warn!("ceye: no API token configured, validation will always miss");
        } else {
            info!("ceye: using identifier {}", params.domain);
        }
        Self {
            token: params.key.clone(),
            domain: params.domain.clone(),
            api_url: params.api_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

#[async_trait]
impl ProviderConnector for CeyeConnector {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ceye
    }

    fn validation_domains(&self) -> ValidationDomains {
        let filter = random_token(TOKEN_LEN);
        let dns = format!("{filter}.{}", self.domain);
        ValidationDomains {
            http: format!("http://{dns}"),
            jndi: dns.clone(),
            dns,
            filter,
            ..ValidationDomains::default()
        }
    }

    fn is_valid(&self) -> bool {
        !self.token.is_empty()
    }

    fn filter_type_mapping(&self, kind: FilterType) -> Option<&'static str> {
        match kind {
            FilterType::Http => Some("http"),
            FilterType::Dns | FilterType::Jndi => Some("dns"),
            FilterType::Rmi | FilterType::Ldap => None,
        }
    }

    async fn poll(&self, provider_kind: &'static str, filter: &str) -> TransportResponse {
        let url = format!(
            "{}/v1/records?token={}&type={provider_kind}&filter={filter}",
            self.api_url, self.token
        );
        self.transport.get(&url).await
    }

    fn matches(&self, body: &str, _kind: FilterType, filter: &str) -> bool {
        contains_ci(body, &format!("{filter}."))
    }
}
