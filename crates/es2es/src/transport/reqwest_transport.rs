//! 📡 The real transport: a pooled `reqwest::Client` pointed at the wide, unforgiving internet.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::trace;

use super::{Auth, HttpMethod, OutboundRequest, RawResponse, Transport};

/// 📡 HTTP transport backed by one shared `reqwest::Client`.
///
/// The client is built once and reused for every scroll and bulk call, because spinning up
/// a new client per request is the networking equivalent of buying a new car every time
/// you need groceries. Cloning is cheap: the pool lives behind an `Arc` inside reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 🚀 Build a client with a connect timeout and an overall request timeout.
    /// Polite people wait, but not forever.
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .context("💀 The HTTP client refused to be born. The TLS stack wept. Probably a missing cert store or a cursed system configuration.")?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        let mut url = reqwest::Url::parse(&request.url)
            .with_context(|| format!("💀 '{}' is not a URL we can dial. Include the scheme, e.g. http://localhost:9200", request.url))?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }

        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        // 🔒 api key beats basic auth in this club
        match &request.auth {
            Some(Auth::ApiKey(api_key)) => {
                builder = builder.header("Authorization", format!("ApiKey {}", api_key));
            }
            Some(Auth::Basic { username, password }) => {
                builder = builder.basic_auth(username, password.as_ref());
            }
            None => {}
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        // 💀 no .context() here: a connection failure surfaces as the reqwest::Error itself
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        trace!("📥 {} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(RawResponse {
            method: request.method,
            status,
            url: request.url,
            body,
            request_body: request.body,
        })
    }
}
