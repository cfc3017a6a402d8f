//! 🚚 es2es: copy one search index into another, one scroll page at a time.
//!
//! 🎬 *[the origin index has documents. the destination index has hopes. we have a loop.]*
//!
//! The pieces, bottom to top:
//! - [`build_url`] and [`unpack_response`]: slashes in, JSON (or a named error) out
//! - [`Gateway`]: one request over an injected [`Transport`], decoded
//! - [`extract_data`]: a lazy scroll over the origin, page by page
//! - [`format_bulk_docs`]: a page, dressed as a bulk payload
//! - [`transfer_index`]: all of the above, in a loop, until the scroll runs dry
//!
//! [`run`] wires a real [`ReqwestTransport`] to an [`AppConfig`] and does the whole thing.

use anyhow::{Context, Result};

pub mod app_config;
pub mod bulk;
pub mod common;
pub mod errors;
pub mod extract;
pub mod gateway;
pub mod progress;
pub mod transfer;
pub mod transport;

pub use app_config::{AppConfig, load_config};
pub use bulk::{format_bulk_doc, format_bulk_docs};
pub use common::{Document, IndexLocation, Page};
pub use errors::{ConfigurationError, EngineError, HttpStatusError, MalformedResponseError};
pub use extract::{ScrollExtractor, ScrollSettings, extract_data};
pub use gateway::{Gateway, Payload, RequestOptions, RequestTarget, build_url, unpack_response};
pub use progress::{TransferProgress, TransferSummary};
pub use transfer::{transfer_index, transfer_index_with_progress};
pub use transport::{Auth, HttpMethod, OutboundRequest, RawResponse, ReqwestTransport, Transport};

/// 🚀 Run the transfer described by `app_config` against real clusters.
pub async fn run(app_config: AppConfig) -> Result<TransferSummary> {
    let transport = ReqwestTransport::new(app_config.http.connect_timeout(), app_config.http.timeout())
        .context("💀 Failed to build the HTTP transport")?;
    let gateway = Gateway::new(transport);

    transfer_index(
        &gateway,
        &app_config.origin.location(),
        &app_config.destination.location(),
        &app_config.origin.method,
        &app_config.scroll,
        &app_config.origin.options,
        &app_config.destination.options,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_config::{EndpointConfig, HttpConfig};
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hits(n: usize, offset: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"_index": "books", "_id": format!("b-{}", offset + i), "_score": 1.0, "_source": {"title": format!("book {}", offset + i), "pages": 100 + i}}))
            .collect()
    }

    fn endpoint(url: String, index: &str) -> EndpointConfig {
        EndpointConfig {
            url,
            index: index.to_string(),
            method: "post".to_string(),
            options: RequestOptions::default(),
        }
    }

    #[tokio::test]
    async fn the_one_where_35_docs_cross_the_wire_in_two_scrolls_and_two_bulks() -> Result<()> {
        let origin = MockServer::start().await;
        let destination = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/books/_search"))
            .and(query_param("scroll", "1m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"_scroll_id": "cursor-1", "hits": {"total": {"value": 35, "relation": "eq"}, "hits": hits(23, 0)}}),
            ))
            .expect(1)
            .mount(&origin)
            .await;
        Mock::given(method("POST"))
            .and(path("/_search/scroll"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"_scroll_id": "cursor-2", "hits": {"total": {"value": 35}, "hits": hits(12, 23)}})),
            )
            .expect(1)
            .mount(&origin)
            .await;
        Mock::given(method("POST"))
            .and(path("/books-v2/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"took": 5, "errors": false, "items": []})))
            .expect(2)
            .mount(&destination)
            .await;

        let config = AppConfig {
            origin: endpoint(origin.uri(), "books"),
            destination: endpoint(format!("{}/", destination.uri()), "books-v2"),
            scroll: ScrollSettings::new(23, "1m"),
            http: HttpConfig::default(),
        };

        let summary = run(config).await?;
        assert_eq!(summary.documents, 35);
        assert_eq!(summary.pages, 2);

        let bulks = destination.received_requests().await.expect("request recording is on by default");
        let line_counts: Vec<usize> = bulks
            .iter()
            .map(|request| String::from_utf8_lossy(&request.body).lines().count())
            .collect();
        assert_eq!(line_counts, vec![46, 24]);

        let scrolls = origin.received_requests().await.expect("request recording is on by default");
        let advance: Value = serde_json::from_slice(&scrolls[1].body)?;
        assert_eq!(advance, json!({"scroll": "1m", "scroll_id": "cursor-1"}));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_missing_origin_index_surfaces_as_an_engine_error() {
        let origin = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/nope/_search"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"root_cause": [{"type": "index_not_found_exception", "reason": "no such index [nope]", "index": "nope"}]},
                "status": 404
            })))
            .mount(&origin)
            .await;

        let config = AppConfig {
            origin: endpoint(origin.uri(), "nope"),
            destination: endpoint(origin.uri(), "somewhere-else"),
            scroll: ScrollSettings::default(),
            http: HttpConfig::default(),
        };

        let err = run(config).await.unwrap_err();
        let engine = err.downcast_ref::<EngineError>().expect("should be an EngineError");
        assert_eq!(engine.error_type, "index_not_found_exception");
        assert_eq!(engine.index.as_deref(), Some("nope"));
        assert_eq!(engine.status, 404);
    }
}
