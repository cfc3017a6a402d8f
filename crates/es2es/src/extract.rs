//! 📜 The scroll extractor: a pull-based, forward-only walk through an index.
//!
//! 🎬 *[a cursor is born. it will live for exactly one extraction. it does not know this yet.]*
//!
//! The first `next_page()` opens a scroll with `size = chunk_size`. Every page that comes
//! back full earns another trip with the latest `_scroll_id`. The first page that comes back
//! short (empty included) is the last one. No lookahead, no buffering: one page in memory
//! at a time, fetched only when someone asks.
//!
//! ```text
//!   Init ──open──▶ Open{cursor} ──advance──▶ Open{cursor'} ──…──▶ Exhausted
//!     │                                                              ▲
//!     └────────── short first page ──────────────────────────────────┘
//! ```
//!
//! 🧠 Knowledge graph:
//! - Requests go through [`Gateway::request`], so engine errors arrive typed
//! - The cursor never leaves this struct; dropping the extractor abandons it to server-side
//!   expiry, [`ScrollExtractor::release`] clears it explicitly
//! - Any error moves the state to `Exhausted`. Non-restartable, by contract.

use std::borrow::Cow;

use anyhow::{Context, Result};
use futures::Stream;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use crate::common::{Document, Page};
use crate::errors::{ConfigurationError, MalformedResponseError};
use crate::gateway::{Gateway, RequestOptions, RequestTarget};
use crate::transport::{HttpMethod, Transport};

/// ⚙️ How to scroll: page size, keep-alive, and which documents to bother with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScrollSettings {
    /// 📦 Documents per page. Also the "is there more?" yardstick.
    #[serde(default = "default_chunk_size", deserialize_with = "crate::app_config::lenient::number")]
    pub chunk_size: usize,
    /// ⏳ How long the engine keeps the cursor warm between pages, e.g. `5m`.
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,
    /// 🔍 Optional query restricting which documents move. Absent = all of them.
    #[serde(default)]
    pub query: Option<Value>,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_keep_alive() -> String {
    "5m".to_string()
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            keep_alive: default_keep_alive(),
            query: None,
        }
    }
}

impl ScrollSettings {
    pub fn new(chunk_size: usize, keep_alive: impl Into<String>) -> Self {
        Self {
            chunk_size,
            keep_alive: keep_alive.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ScrollState {
    Init,
    Open { scroll_id: String },
    Exhausted,
}

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<Value>,
    hits: ScrollHits,
}

#[derive(Debug, Deserialize)]
struct ScrollHits {
    #[serde(default)]
    total: Option<Value>,
    hits: Vec<Document>,
}

/// 📜 A scroll over one index. Ask it for pages until it says there are none left.
#[derive(Debug)]
pub struct ScrollExtractor<'a, T: Transport> {
    gateway: &'a Gateway<T>,
    endpoint: String,
    index: String,
    method: HttpMethod,
    settings: ScrollSettings,
    options: RequestOptions,
    state: ScrollState,
    total_hits: Option<u64>,
    requests_issued: usize,
}

/// 🚀 Start a lazy extraction over `endpoint/index`. Nothing is sent until the first `next_page()`.
pub fn extract_data<'a, T: Transport>(
    gateway: &'a Gateway<T>,
    endpoint: &str,
    index: &str,
    method: HttpMethod,
    settings: &ScrollSettings,
    options: &RequestOptions,
) -> ScrollExtractor<'a, T> {
    ScrollExtractor {
        gateway,
        endpoint: endpoint.to_string(),
        index: index.to_string(),
        method,
        settings: settings.clone(),
        options: options.clone(),
        state: ScrollState::Init,
        total_hits: None,
        requests_issued: 0,
    }
}

impl<'a, T: Transport> ScrollExtractor<'a, T> {
    /// 🤔 Is there possibly another page? `false` once the last page was handed out or an error hit.
    pub fn has_more(&self) -> bool {
        self.state != ScrollState::Exhausted
    }

    /// 📊 The engine's count of matching documents, known after the first page.
    pub fn total_hits(&self) -> Option<u64> {
        self.total_hits
    }

    /// 🔢 How many scroll requests went over the wire so far.
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// 📄 Fetch the next page. `Ok(None)` once the scroll is done; no request is made then.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let chunk_size = self.settings.chunk_size;
        if chunk_size == 0 {
            self.state = ScrollState::Exhausted;
            return Err(ConfigurationError::ZeroChunkSize.into());
        }

        // 🔒 taken out before the await: if anything below fails, we stay Exhausted
        let state = std::mem::replace(&mut self.state, ScrollState::Exhausted);
        let call = match state {
            ScrollState::Exhausted => return Ok(None),
            ScrollState::Init => self.open_call(),
            ScrollState::Open { scroll_id } => self.advance_call(scroll_id),
        };
        let options = match &call.keep_alive_param {
            Some(keep_alive) => Cow::Owned(self.options.clone().with_param("scroll", keep_alive.as_str())),
            None => Cow::Borrowed(&self.options),
        };

        self.requests_issued += 1;
        let value = self
            .gateway
            .request(call.target(), self.method, Some(call.body.clone().into()), &options)
            .await
            .with_context(|| format!("💀 Scroll request #{} against '{}' failed.", self.requests_issued, self.index))?;

        let response: ScrollResponse = serde_json::from_value(value).map_err(|e| MalformedResponseError {
            url: call.url(),
            detail: format!("scroll response is missing hits.hits or carries a hit without _source ({e})"),
        })?;

        if self.total_hits.is_none() {
            self.total_hits = response.hits.total.as_ref().and_then(total_of);
        }

        let page = response.hits.hits;
        trace!("📄 Scroll page #{} carried {} hits", self.requests_issued, page.len());

        if page.len() >= chunk_size {
            let scroll_id = response
                .scroll_id
                .as_ref()
                .map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .ok_or_else(|| MalformedResponseError {
                    url: call.url(),
                    detail: "a full scroll page arrived without a _scroll_id".to_string(),
                })?;
            self.state = ScrollState::Open { scroll_id };
        } else {
            debug!(
                "🏁 Scroll over '{}' finished after {} requests (last page: {} hits)",
                self.index,
                self.requests_issued,
                page.len()
            );
        }

        Ok(Some(page))
    }

    /// 🌊 Turn the extractor into a `Stream` of pages. Same laziness, different costume.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> {
        futures::stream::try_unfold(self, |mut extractor| async move {
            Ok::<_, anyhow::Error>(extractor.next_page().await?.map(|page| (page, extractor)))
        })
    }

    /// 🗑️ Clear the scroll cursor on the engine, if one is still open, and consume the extractor.
    ///
    /// Optional. An abandoned cursor expires on its own after `keep_alive`; this just
    /// returns the search context to the cluster sooner.
    pub async fn release(self) -> Result<()> {
        if let ScrollState::Open { scroll_id } = &self.state {
            debug!("🗑️ Releasing scroll cursor on '{}'", self.endpoint);
            self.gateway
                .request(
                    RequestTarget::new(&self.endpoint, "", "_search").with_api("scroll"),
                    HttpMethod::Delete,
                    Some(json!({ "scroll_id": [scroll_id] }).into()),
                    &self.options,
                )
                .await
                .context("💀 Failed to release the scroll cursor. It will expire on its own, eventually.")?;
        }
        Ok(())
    }

    fn open_call(&self) -> ScrollCall {
        let mut body = Map::new();
        body.insert("size".to_string(), json!(self.settings.chunk_size));
        if let Some(query) = &self.settings.query {
            body.insert("query".to_string(), query.clone());
        }
        ScrollCall {
            endpoint: self.endpoint.clone(),
            index: self.index.clone(),
            api: None,
            keep_alive_param: Some(self.settings.keep_alive.clone()),
            body: Value::Object(body),
        }
    }

    fn advance_call(&self, scroll_id: String) -> ScrollCall {
        ScrollCall {
            endpoint: self.endpoint.clone(),
            index: String::new(),
            api: Some("scroll"),
            keep_alive_param: None,
            body: json!({ "scroll": self.settings.keep_alive, "scroll_id": scroll_id }),
        }
    }
}

/// 📍 One scroll request, fully owned, so the state borrow ends before the await starts.
/// The opening call carries `?scroll=<keep_alive>`; follow-ups carry it in the body.
struct ScrollCall {
    endpoint: String,
    index: String,
    api: Option<&'static str>,
    keep_alive_param: Option<String>,
    body: Value,
}

impl ScrollCall {
    fn target(&self) -> RequestTarget<'_> {
        RequestTarget {
            endpoint: &self.endpoint,
            index: &self.index,
            op_path: "_search",
            api: self.api,
        }
    }

    fn url(&self) -> String {
        self.target().url()
    }
}

/// 📊 `hits.total` is a number on old engines and `{"value": n, "relation": ..}` on newer ones.
fn total_of(total: &Value) -> Option<u64> {
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigurationError, EngineError, MalformedResponseError};
    use crate::transport::in_mem::{InMemoryTransport, ScriptedResponse};
    use futures::TryStreamExt;

    fn hits(n: usize, offset: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"_index": "an_index", "_id": format!("doc-{}", offset + i), "_score": 1.0, "_source": {"n": offset + i}}))
            .collect()
    }

    fn scroll_page(scroll_id: &str, n: usize, offset: usize) -> ScriptedResponse {
        ScriptedResponse::json(
            200,
            json!({"_scroll_id": scroll_id, "hits": {"total": {"value": 2841, "relation": "eq"}, "hits": hits(n, offset)}}),
        )
    }

    #[tokio::test]
    async fn the_one_where_123_full_pages_and_a_short_one_take_exactly_124_requests() -> Result<()> {
        let mut script: Vec<ScriptedResponse> = (0..123).map(|i| scroll_page("100", 23, i * 23)).collect();
        script.push(scroll_page("100", 12, 123 * 23));
        let transport = InMemoryTransport::new(script);
        let gateway = Gateway::new(transport.clone());

        let mut extractor = extract_data(
            &gateway,
            "an_endpoint",
            "an_index",
            HttpMethod::Post,
            &ScrollSettings::new(23, "1m"),
            &RequestOptions::default(),
        );

        let mut lengths = Vec::new();
        while let Some(page) = extractor.next_page().await? {
            lengths.push(page.len());
        }

        assert_eq!(lengths.len(), 124);
        assert!(lengths[..123].iter().all(|&len| len == 23));
        assert_eq!(lengths[123], 12);
        assert_eq!(transport.request_count().await, 124, "one request per page, not one more");
        assert_eq!(extractor.requests_issued(), 124);
        assert_eq!(extractor.total_hits(), Some(2841));
        assert!(!extractor.has_more());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_first_request_opens_and_the_rest_follow_the_latest_cursor() -> Result<()> {
        let transport = InMemoryTransport::new([
            scroll_page("cursor-1", 2, 0),
            scroll_page("cursor-2", 2, 2),
            scroll_page("cursor-3", 1, 4),
        ]);
        let gateway = Gateway::new(transport.clone());
        let settings = ScrollSettings::new(2, "1m").with_query(json!({"term": {"kind": "book"}}));
        let options = RequestOptions::default().with_param("preference", "_local");

        let pages: Vec<Page> = extract_data(&gateway, "http://es:9200/", "books", HttpMethod::Get, &settings, &options)
            .into_stream()
            .try_collect()
            .await?;
        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(pages[2][0].id, Some(json!("doc-4")));

        let sent = transport.requests().await;
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url, "http://es:9200/books/_search");
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"size":2,"query":{"term":{"kind":"book"}}}"#));
        assert_eq!(sent[1].url, "http://es:9200/_search/scroll");
        assert_eq!(sent[1].body.as_deref(), Some(r#"{"scroll":"1m","scroll_id":"cursor-1"}"#));
        assert_eq!(sent[2].body.as_deref(), Some(r#"{"scroll":"1m","scroll_id":"cursor-2"}"#));
        for request in &sent {
            assert!(request.query.contains(&("preference".to_string(), "_local".to_string())));
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_scroll_keep_alive_rides_on_the_opening_request() -> Result<()> {
        let transport = InMemoryTransport::new([scroll_page("c", 0, 0)]);
        let gateway = Gateway::new(transport.clone());

        let mut extractor = extract_data(
            &gateway,
            "http://es",
            "books",
            HttpMethod::Post,
            &ScrollSettings::new(10, "2m"),
            &RequestOptions::default(),
        );
        extractor.next_page().await?;

        let sent = transport.requests().await;
        assert!(sent[0].query.contains(&("scroll".to_string(), "2m".to_string())));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_short_first_page_is_the_only_page() -> Result<()> {
        let transport = InMemoryTransport::new([scroll_page("c", 5, 0)]);
        let gateway = Gateway::new(transport.clone());
        let mut extractor = extract_data(
            &gateway,
            "http://es",
            "books",
            HttpMethod::Post,
            &ScrollSettings::new(10, "1m"),
            &RequestOptions::default(),
        );

        assert!(extractor.has_more());
        assert_eq!(extractor.next_page().await?.map(|p| p.len()), Some(5));
        assert!(!extractor.has_more());
        assert!(extractor.next_page().await?.is_none());
        assert_eq!(transport.request_count().await, 1, "no second request after a short page");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_final_page_is_still_yielded() -> Result<()> {
        let transport = InMemoryTransport::new([scroll_page("c", 3, 0), scroll_page("c", 0, 3)]);
        let gateway = Gateway::new(transport.clone());
        let pages: Vec<Page> = extract_data(
            &gateway,
            "http://es",
            "books",
            HttpMethod::Post,
            &ScrollSettings::new(3, "1m"),
            &RequestOptions::default(),
        )
        .into_stream()
        .try_collect()
        .await?;

        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 0]);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_zero_chunk_size_never_touches_the_network() {
        let transport = InMemoryTransport::new(Vec::<ScriptedResponse>::new());
        let gateway = Gateway::new(transport.clone());
        let mut extractor = extract_data(
            &gateway,
            "http://es",
            "books",
            HttpMethod::Post,
            &ScrollSettings::new(0, "1m"),
            &RequestOptions::default(),
        );

        let err = extractor.next_page().await.unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigurationError>(), Some(&ConfigurationError::ZeroChunkSize));
        assert_eq!(transport.request_count().await, 0);
    }

    #[tokio::test]
    async fn the_one_where_a_full_page_without_a_cursor_is_malformed() {
        let transport = InMemoryTransport::new([ScriptedResponse::json(200, json!({"hits": {"hits": hits(2, 0)}}))]);
        let gateway = Gateway::new(transport);
        let mut extractor = extract_data(
            &gateway,
            "http://es",
            "books",
            HttpMethod::Post,
            &ScrollSettings::new(2, "1m"),
            &RequestOptions::default(),
        );

        let err = extractor.next_page().await.unwrap_err();
        assert!(err.downcast_ref::<MalformedResponseError>().is_some());
        assert!(!extractor.has_more());
    }

    #[tokio::test]
    async fn the_one_where_an_engine_error_mid_scroll_ends_the_scroll_for_good() {
        let transport = InMemoryTransport::new([
            scroll_page("c", 2, 0),
            ScriptedResponse::json(
                404,
                json!({"error": {"root_cause": [{"type": "search_context_missing_exception", "reason": "No search context found"}]}}),
            ),
        ]);
        let gateway = Gateway::new(transport.clone());
        let mut extractor = extract_data(
            &gateway,
            "http://es",
            "books",
            HttpMethod::Post,
            &ScrollSettings::new(2, "1m"),
            &RequestOptions::default(),
        );

        assert!(extractor.next_page().await.is_ok());
        let err = extractor.next_page().await.unwrap_err();
        let engine = err.downcast_ref::<EngineError>().expect("should be an EngineError");
        assert_eq!(engine.error_type, "search_context_missing_exception");
        assert!(!extractor.has_more());
        assert!(matches!(extractor.next_page().await, Ok(None)), "non-restartable, by contract");
        assert_eq!(transport.request_count().await, 2);
    }

    #[tokio::test]
    async fn the_one_where_release_clears_an_open_cursor_and_skips_a_finished_one() -> Result<()> {
        let transport = InMemoryTransport::new([
            scroll_page("open-cursor", 2, 0),
            ScriptedResponse::json(200, json!({"succeeded": true, "num_freed": 1})),
            scroll_page("done", 1, 0),
        ]);
        let gateway = Gateway::new(transport.clone());
        let settings = ScrollSettings::new(2, "1m");

        let mut abandoned = extract_data(&gateway, "http://es", "books", HttpMethod::Post, &settings, &RequestOptions::default());
        abandoned.next_page().await?;
        abandoned.release().await?;

        let mut finished = extract_data(&gateway, "http://es", "books", HttpMethod::Post, &settings, &RequestOptions::default());
        finished.next_page().await?;
        finished.release().await?;

        let sent = transport.requests().await;
        assert_eq!(sent.len(), 3, "the finished scroll has nothing to release");
        assert_eq!(sent[1].method, HttpMethod::Delete);
        assert_eq!(sent[1].url, "http://es/_search/scroll");
        assert_eq!(sent[1].body.as_deref(), Some(r#"{"scroll_id":["open-cursor"]}"#));
        Ok(())
    }

    #[test]
    fn the_one_where_hits_total_speaks_both_dialects() {
        assert_eq!(total_of(&json!(35)), Some(35));
        assert_eq!(total_of(&json!({"value": 35, "relation": "eq"})), Some(35));
        assert_eq!(total_of(&json!("lots")), None);
    }
}
