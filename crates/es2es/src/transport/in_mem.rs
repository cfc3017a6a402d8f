//! # Previously, on es2es...
//!
//! 🎬 Somebody wanted to test a scroll loop without standing up a cluster, a docker compose
//! file, and a small emotional support server rack. This module is what they got.
//!
//! [`InMemoryTransport`] replays a scripted queue of responses, one per call, and writes down
//! every [`OutboundRequest`] it receives behind an `Arc<Mutex<...>>`, so tests can hand the
//! transport to a gateway and still inspect the evidence afterwards.
//!
//! ⚠️ This is for tests and dry runs. If you're deploying this to prod, please also deploy a therapist.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{OutboundRequest, RawResponse, Transport};

/// 🎞️ One line of the script: either the server answers, or the network falls over.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Reply { status: u16, body: String },
    Fail(String),
}

impl ScriptedResponse {
    /// ✅ A JSON reply with the given status.
    pub fn json(status: u16, body: Value) -> Self {
        ScriptedResponse::Reply {
            status,
            body: body.to_string(),
        }
    }

    /// 📝 A reply with a body that may or may not be JSON. We don't judge. The unpacker does.
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        ScriptedResponse::Reply {
            status,
            body: body.into(),
        }
    }

    /// 💀 The exchange never completes. Like a transport-level failure, minus the packet loss.
    pub fn fail(message: impl Into<String>) -> Self {
        ScriptedResponse::Fail(message.into())
    }
}

/// 📼 A transport that never forgets. Replays a script, records every request.
///
/// Clone-able because tests need to peek inside after handing one copy to the gateway.
/// The `Arc`s mean every clone shares the same script and the same evidence locker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    received: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl InMemoryTransport {
    pub fn new(script: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 🔍 Every request received so far, in order.
    pub async fn requests(&self) -> Vec<OutboundRequest> {
        self.received.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.received.lock().await.len()
    }

    /// 🎞️ Lines of script not yet performed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        self.received.lock().await.push(request.clone());
        let next = self.script.lock().await.pop_front();
        match next {
            Some(ScriptedResponse::Reply { status, body }) => Ok(RawResponse {
                method: request.method,
                status,
                url: request.url,
                body,
                request_body: request.body,
            }),
            Some(ScriptedResponse::Fail(message)) => anyhow::bail!("💀 {}", message),
            None => anyhow::bail!(
                "💀 In-memory transport ran out of script at {} {}. The actors went home. Nobody wrote act three.",
                request.method,
                request.url
            ),
        }
    }
}
