//! HTTP transport consumed by the provider connectors
//!
//! Connectors only see the [`Transport`] trait. Every call returns a
//! [`TransportResponse`]; a status of `0` means the request could not be
//! completed at all and is never a real HTTP status.

pub mod client;
pub mod cookie;
pub mod user_agent;

pub use client::{HttpClient, TransportOptions};

use async_trait::async_trait;
use std::borrow::Cow;

/// Status and body of one completed (or failed) request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Session cookie captured from `Set-Cookie`, as `name=value` pairs
    pub set_cookie: Option<String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub const NO_RESPONSE: u16 = 0;

    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            set_cookie: None,
            body: body.into(),
        }
    }

    pub fn no_response() -> Self {
        Self::default()
    }

    pub fn is_no_response(&self) -> bool {
        self.status == Self::NO_RESPONSE
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Retried, deadline-bounded HTTP operations
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> TransportResponse;

    /// GET sending a raw `Cookie` header
    async fn get_with_cookie(&self, url: &str, cookie: &str) -> TransportResponse;

    /// GET that fills [`TransportResponse::set_cookie`] from the response
    async fn get_capturing_cookie(&self, url: &str) -> TransportResponse;

    async fn get_with_headers(&self, url: &str, headers: &[(String, String)])
        -> TransportResponse;

    /// POST a body; an empty `content_type` means form-urlencoded
    async fn post(&self, url: &str, body: &str, content_type: &str) -> TransportResponse;
}
