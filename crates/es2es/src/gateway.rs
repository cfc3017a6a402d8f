//! 🚪 The Request Gateway: one call in, one decoded JSON value out.
//!
//! 🎬 *[a request stands at the gate. it has a URL, a verb, and a body it is nervous about.]*
//!
//! The gateway builds the URL, serializes the body, sets the content type, picks the verb,
//! hands the whole thing to the injected [`Transport`], and runs whatever comes back through
//! [`unpack_response`]. Exactly one network call per invocation. No retries. No regrets.
//! (Some regrets.)
//!
//! 🧠 Knowledge graph:
//! - `url.rs`: `build_url`, the slash janitor
//! - `options.rs`: `RequestOptions`, the pass-through bag (headers, timeout, auth, params)
//! - `unpack.rs`: `unpack_response`, engine errors vs HTTP errors vs JSON
//! - this file: `Gateway`, `RequestTarget`, `Payload`

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::transport::{HttpMethod, OutboundRequest, Transport};

pub mod options;
pub mod unpack;
pub mod url;

pub use options::RequestOptions;
pub use unpack::unpack_response;
pub use url::build_url;

/// 📍 Where a request is going: endpoint, index, operation path, and an optional trailing
/// api segment. Empty pieces are dropped when the URL is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub endpoint: &'a str,
    pub index: &'a str,
    pub op_path: &'a str,
    pub api: Option<&'a str>,
}

impl<'a> RequestTarget<'a> {
    pub fn new(endpoint: &'a str, index: &'a str, op_path: &'a str) -> Self {
        Self {
            endpoint,
            index,
            op_path,
            api: None,
        }
    }

    pub fn with_api(mut self, api: &'a str) -> Self {
        self.api = Some(api);
        self
    }

    pub fn url(&self) -> String {
        build_url(
            self.endpoint,
            [self.index, self.op_path, self.api.unwrap_or_default()],
        )
    }
}

/// 📦 A request body. Strings travel as-is; JSON values get serialized compactly first.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    fn into_body(self) -> Result<String> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Json(value) => serde_json::to_string(&value)
                .context("💀 Failed to serialize the request body. The JSON refused to become JSON."),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// 🚪 The gateway. Owns the transport it was given, and nothing else.
#[derive(Debug, Clone)]
pub struct Gateway<T: Transport> {
    transport: T,
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// 📡 Issue one request and return the decoded JSON body.
    ///
    /// `Content-Type: application/json` is added unless `options` already carries a
    /// `Content-Type`. Everything else in `options` is forwarded untouched.
    pub async fn request(
        &self,
        target: RequestTarget<'_>,
        method: HttpMethod,
        data: Option<Payload>,
        options: &RequestOptions,
    ) -> Result<Value> {
        let url = target.url();
        let body = data.map(Payload::into_body).transpose()?;

        let mut headers: Vec<(String, String)> = options
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if !options.has_header("Content-Type") {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        debug!(
            "📡 {} {} ({} byte body)",
            method,
            url,
            body.as_ref().map_or(0, String::len)
        );

        let outbound = OutboundRequest {
            method,
            url,
            headers,
            query: options
                .params
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            body,
            timeout: options.timeout(),
            auth: options.auth(),
        };

        let response = self.transport.send(outbound).await?;
        unpack_response(response)
    }
}
