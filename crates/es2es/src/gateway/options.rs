use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::transport::Auth;

/// 🎒 The pass-through bag for one side of a transfer.
///
/// Everything in here is forwarded to the transport as-is: headers, a per-request timeout,
/// credentials, and `params`, an opaque bag of engine-specific URL query parameters we
/// don't interpret (`preference`, `routing`, `request_cache`, whatever your cluster fancies).
///
/// Deserializes straight out of an `[origin]` / `[destination]` config table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestOptions {
    /// 📨 Extra headers. A `Content-Type` in here replaces the default `application/json`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// ⏱️ Per-request timeout, overriding the client-wide one.
    #[serde(default, deserialize_with = "crate::app_config::lenient::optional_number")]
    pub timeout_secs: Option<u64>,
    /// 🔒 Username for basic auth. Optional, like flossing.
    #[serde(default)]
    pub username: Option<String>,
    /// 🔒 Password. If this is in plaintext in your config file, consider env vars.
    #[serde(default)]
    pub password: Option<String>,
    /// 🔒 API key auth. Wins over basic auth when both are set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// 🔧 URL query parameters, forwarded untouched.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// 🔒 Auth priority: API key, then basic, then nothing.
    pub fn auth(&self) -> Option<Auth> {
        if let Some(api_key) = &self.api_key {
            Some(Auth::ApiKey(api_key.clone()))
        } else {
            self.username.as_ref().map(|username| Auth::Basic {
                username: username.clone(),
                password: self.password.clone(),
            })
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|key| key.eq_ignore_ascii_case(name))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}
