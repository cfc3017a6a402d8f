//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment: `ES2ES_*` environment variables first, then an optional TOML
//! file on top. Nested keys in env vars use a double underscore:
//! `ES2ES_ORIGIN__PASSWORD=hunter2` lands in `[origin] password`.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::common::IndexLocation;
use crate::extract::ScrollSettings;
use crate::gateway::RequestOptions;

pub(crate) mod lenient;

/// 📦 The whole transfer, described: where from, where to, how to scroll, how patient to be.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub origin: EndpointConfig,
    pub destination: EndpointConfig,
    #[serde(default)]
    pub scroll: ScrollSettings,
    #[serde(default)]
    pub http: HttpConfig,
}

/// 📡 One side of the transfer: a cluster, an index, and whatever that cluster needs to hear.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    pub url: String,
    pub index: String,
    /// 🎭 Verb for scroll requests on the origin. Ignored on the destination, bulk is always POST.
    #[serde(default = "default_method")]
    pub method: String,
    /// 🎒 headers, auth, timeout, params: same table, flattened in
    #[serde(flatten)]
    pub options: RequestOptions,
}

fn default_method() -> String {
    "post".to_string()
}

impl EndpointConfig {
    pub fn location(&self) -> IndexLocation {
        IndexLocation::new(&self.url, &self.index)
    }
}

/// ⏱️ Client-wide HTTP knobs. Per-side `timeout_secs` overrides `timeout_secs` here.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs", deserialize_with = "lenient::number")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs", deserialize_with = "lenient::number")]
    pub timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 🚀 Load the config from a file, from env vars, or from the sheer power of hoping.
///
/// - `None` → env vars only. No file. No assumptions.
/// - `Some(path)` → env vars + TOML file, merged. The file wins on conflicts.
///
/// 💀 Returns an error if the result doesn't parse, with a message that says where we looked.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {}",
        config_file_name.map_or_else(|| "<environment only>".to_string(), |p| p.display().to_string())
    );

    let config = environment_layer();
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (ES2ES_*). \
             Check [origin], [destination] and their url/index keys.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (ES2ES_*). \
                 No file was provided, so this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

/// 🌱 `ES2ES_*` variables as the exact text that was exported.
///
/// Figment's own `Env` provider guesses types, so an index called `2024` turns into a number
/// and a password of `007` turns into `7`. Here every value stays a string, and the numeric
/// knobs parse text themselves (see [`lenient`]).
fn environment_layer() -> Figment {
    Env::prefixed("ES2ES_")
        .split("__")
        .iter()
        .fold(Figment::new(), |figment, (key, value)| {
            figment.merge(Serialized::default(key.as_str(), value))
        })
}
