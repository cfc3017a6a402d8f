//! 🔌 Transport: the one place bytes actually leave the building.
//!
//! 🚰 The gateway decides *what* to send. A [`Transport`] decides *how*. Production uses
//! [`ReqwestTransport`], a pooled `reqwest::Client`. Tests use [`InMemoryTransport`], which
//! replays a script and writes down everything it was asked to do, like a very patient intern.
//!
//! The transport is handed to the gateway explicitly. No global client, no lazy static,
//! no "where did this connection pool come from" at 3am.
//!
//! 🦆 The duck travels by UDP. It has never arrived.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::ConfigurationError;

pub mod in_mem;
pub mod reqwest_transport;

pub use in_mem::InMemoryTransport;
pub use reqwest_transport::ReqwestTransport;

/// 🎭 The closed set of verbs we speak. Picked at runtime by name, checked before dialing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigurationError;

    /// 🔤 Case-insensitive. `post`, `POST` and `PoSt` are all welcome. `yeet` is not.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "head" => Ok(HttpMethod::Head),
            _ => Err(ConfigurationError::UnknownMethod(name.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 🔒 Auth is tri-modal: api key, basic, or "I hope anonymous works".
/// API key wins when both are configured. This is not a democracy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Basic {
        username: String,
        password: Option<String>,
    },
    ApiKey(String),
}

/// 📤 Everything a transport needs to make exactly one call. Already fully resolved:
/// URL built, body serialized, headers decided.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// 🔧 URL query parameters, forwarded as-is.
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
    pub auth: Option<Auth>,
}

/// 📥 What came back, plus a back-reference to what we sent, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// 🎭 The verb that produced this response. HEAD is the only one allowed to come back empty.
    pub method: HttpMethod,
    pub status: u16,
    pub url: String,
    pub body: String,
    pub request_body: Option<String>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 🔌 One request in, one response out. No retries. Retries are a lifestyle we don't lead.
///
/// # Contract
/// - A completed HTTP exchange is `Ok(RawResponse)`, whatever its status. Judging the status
///   is the unpacker's job.
/// - A failed exchange (refused, timed out, DNS sulking) is `Err`, carrying the underlying
///   client error unchanged.
#[async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse>;
}
