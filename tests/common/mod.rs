//! Common test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use oob_adapter::http::{HttpClient, Transport, TransportOptions, TransportResponse};
use oob_adapter::ValidationDomains;
use std::sync::Arc;

/// Real transport tuned for mock servers: short deadline, no retries
pub fn test_transport() -> Arc<dyn Transport> {
    Arc::new(
        HttpClient::new(TransportOptions {
            timeout_secs: 5,
            retries: 0,
            ..TransportOptions::default()
        })
        .expect("failed to create client"),
    )
}

/// Transport whose every call fails with the status-0 sentinel
pub struct DeadTransport;

#[async_trait]
impl Transport for DeadTransport {
    async fn get(&self, _url: &str) -> TransportResponse {
        TransportResponse::no_response()
    }

    async fn get_with_cookie(&self, _url: &str, _cookie: &str) -> TransportResponse {
        TransportResponse::no_response()
    }

    async fn get_capturing_cookie(&self, _url: &str) -> TransportResponse {
        TransportResponse::no_response()
    }

    async fn get_with_headers(
        &self,
        _url: &str,
        _headers: &[(String, String)],
    ) -> TransportResponse {
        TransportResponse::no_response()
    }

    async fn post(&self, _url: &str, _body: &str, _content_type: &str) -> TransportResponse {
        TransportResponse::no_response()
    }
}

pub fn dead_transport() -> Arc<dyn Transport> {
    Arc::new(DeadTransport)
}

/// Asserts the filter is present and embedded in every offered address
pub fn assert_filter_embedded(domains: &ValidationDomains) {
    assert!(!domains.filter.is_empty(), "filter should not be empty");
    for address in [
        &domains.http,
        &domains.dns,
        &domains.jndi,
        &domains.rmi,
        &domains.ldap,
    ] {
        if !address.is_empty() {
            assert!(
                address.contains(&domains.filter),
                "address {address} should embed filter {}",
                domains.filter
            );
        }
    }
}
