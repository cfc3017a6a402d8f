//! 💀 Errors: the named tragedies of es2es.
//!
//! Everything in this crate returns `anyhow::Result` and piles on `.context(...)` like
//! a detective piling up evidence. But some failures deserve a proper name tag, so callers
//! can `downcast_ref` them and react: the engine said no, the HTTP layer said no,
//! the config said no, or the engine said something that wasn't even JSON.
//!
//! 🦆 The duck has filed all four under "not my fault".

use thiserror::Error;

/// 🚨 The engine answered, politely, with an error object tucked inside the body.
///
/// Raised whenever a response body carries `error.root_cause`, no matter what the HTTP
/// status claimed. A 200 with an error inside is still an error. Trust the body, not the envelope.
#[derive(Debug, Error, Clone, PartialEq)]
#[error(
    "💀 The search engine rejected the request with '{error_type}': {reason} (index: {}, status: {status})",
    .index.as_deref().unwrap_or("<none>")
)]
pub struct EngineError {
    /// 📝 The engine's own explanation. Usually helpful. Occasionally poetry.
    pub reason: String,
    /// 🏷️ `type` from the root cause, e.g. `index_not_found_exception`.
    pub error_type: String,
    /// 📡 The index the engine was grumpy about, when it tells us.
    pub index: Option<String>,
    /// 🔢 HTTP status that came along for the ride.
    pub status: u16,
    /// 📦 The body we sent, kept around for the postmortem.
    pub request_body: Option<String>,
}

/// 🌩️ The HTTP layer itself failed: a 4xx/5xx with no engine error object to explain it.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("💀 HTTP {status} from '{url}'. The response body read: '{body}'")]
pub struct HttpStatusError {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// 🧩 The engine answered, but not in a shape we can use.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("💀 Malformed response from '{url}': {detail}")]
pub struct MalformedResponseError {
    pub url: String,
    pub detail: String,
}

/// 🔧 Something in the caller's setup is wrong. Detected before any byte hits the wire.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// 🪞 Origin and destination are the same (endpoint, index). Copying an index onto
    /// itself while scrolling it is a snake eating its own tail.
    #[error("💀 Refusing to transfer '{index}' at '{endpoint}' onto itself. Pick a different destination index or endpoint.")]
    SelfTransfer { endpoint: String, index: String },

    /// 🎭 A verb we don't speak. We know GET, POST, PUT, DELETE and HEAD. That's the whole vocabulary.
    #[error("💀 Unknown HTTP method '{0}'. Supported methods: get, post, put, delete, head.")]
    UnknownMethod(String),

    /// 📏 A page of zero documents would scroll forever and move nothing.
    #[error("💀 Scroll chunk size must be at least 1.")]
    ZeroChunkSize,
}
