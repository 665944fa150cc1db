//! reqwest-backed transport with retries, body capping and an overall deadline

use super::cookie::session_cookie;
use super::user_agent::random_user_agent;
use super::{Transport, TransportResponse};
use crate::error::{OobError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const INITIAL_BACKOFF_MS: u64 = 500;

/// Tunables for [`HttpClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Overall deadline per call, retries included
    pub timeout_secs: u64,
    /// Extra attempts after the first one
    pub retries: u32,
    /// Bytes kept from a response body
    pub max_body_size: usize,
    pub proxy: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 3,
            max_body_size: 10 * 1024 * 1024,
            proxy: None,
        }
    }
}

/// Production [`Transport`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    options: TransportOptions,
    request_count: Arc<AtomicU64>,
}

impl HttpClient {
    pub fn new(options: TransportOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .redirect(reqwest::redirect::Policy::none());

        if let Some(ref proxy_url) = options.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| OobError::Config(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            options,
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Returns the total number of attempts sent, retries included
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Runs one logical request under the overall deadline
    async fn execute<F>(&self, url: &str, build_request: F, capture_cookie: bool) -> TransportResponse
    where
        F: Fn() -> RequestBuilder + Send,
    {
        if url.is_empty() {
            return TransportResponse::no_response();
        }

        let deadline = Duration::from_secs(self.options.timeout_secs);
        let attempt = self.fetch(url, build_request, capture_cookie);

        match timeout(deadline, attempt).await {
            Ok(Some(response)) => response,
            Ok(None) => TransportResponse::no_response(),
            Err(_) => {
                warn!("Request to {url} exceeded {deadline:?} deadline");
                TransportResponse::no_response()
            }
        }
    }

    async fn fetch<F>(&self, url: &str, build_request: F, capture_cookie: bool) -> Option<TransportResponse>
    where
        F: Fn() -> RequestBuilder,
    {
        let response = self.send_with_retry(url, build_request).await?;
        let status = response.status().as_u16();
        let set_cookie = if capture_cookie {
            session_cookie(
                response
                    .headers()
                    .get_all(SET_COOKIE)
                    .iter()
                    .filter_map(|v| v.to_str().ok()),
            )
        } else {
            None
        };
        let body = self.read_capped(response).await?;
        Some(TransportResponse {
            status,
            set_cookie,
            body,
        })
    }

    async fn send_with_retry<F>(&self, url: &str, build_request: F) -> Option<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempts = self.options.retries.saturating_add(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1));
                debug!("Retry attempt {attempt} for {url}, waiting {backoff:?}");
                sleep(backoff).await;
            }

            self.request_count.fetch_add(1, Ordering::Relaxed);

            let req = build_request().header(USER_AGENT, random_user_agent());
            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!("Response: {status} for {url}");

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt + 1 < attempts {
                        warn!("Rate limited by {url}, backing off");
                        continue;
                    }
                    return Some(response);
                }
                Err(e) => {
                    warn!("Request to {url} failed (attempt {attempt}): {e}");
                }
            }
        }

        None
    }

    async fn read_capped(&self, mut response: Response) -> Option<Vec<u8>> {
        let limit = self.options.max_body_size;
        let mut body = Vec::new();

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = limit - body.len();
                    if chunk.len() >= remaining {
                        body.extend_from_slice(&chunk[..remaining]);
                        debug!("Response body truncated at {limit} bytes");
                        break;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read response body: {e}");
                    return None;
                }
            }
        }

        Some(body)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> TransportResponse {
        self.execute(url, || self.client.get(url), false).await
    }

    async fn get_with_cookie(&self, url: &str, cookie: &str) -> TransportResponse {
        self.execute(url, || self.client.get(url).header(COOKIE, cookie), false)
            .await
    }

    async fn get_capturing_cookie(&self, url: &str) -> TransportResponse {
        self.execute(url, || self.client.get(url), true).await
    }

    async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> TransportResponse {
        self.execute(
            url,
            || {
                let mut req = self.client.get(url);
                for (key, value) in headers {
                    req = req.header(key.as_str(), value.as_str());
                }
                req
            },
            false,
        )
        .await
    }

    async fn post(&self, url: &str, body: &str, content_type: &str) -> TransportResponse {
        let content_type = if content_type.is_empty() {
            FORM_URLENCODED
        } else {
            content_type
        };
        self.execute(
            url,
            || {
                self.client
                    .post(url)
                    .header(CONTENT_TYPE, content_type)
                    .body(body.to_string())
            },
            false,
        )
        .await
    }
}
