//! 🚚 The transfer orchestrator: scroll out of one index, bulk into another, repeat.
//!
//! 🎬 *[two indices. one has documents. one wants them. this module is the moving van.]*
//!
//! ```text
//!   origin ──scroll──▶ Page ──format_bulk_docs──▶ payload ──POST _bulk──▶ destination
//!      ▲                                                                      │
//!      └──────────────────── next page, until a short one ◀───────────────────┘
//! ```
//!
//! Sequential on purpose: one request in flight, scroll and bulk never overlap. A bulk
//! failure stops the whole thing. There is no resume. There is only starting over, wiser.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::bulk::format_bulk_docs;
use crate::common::IndexLocation;
use crate::errors::ConfigurationError;
use crate::extract::{ScrollSettings, extract_data};
use crate::gateway::{Gateway, RequestOptions, RequestTarget};
use crate::progress::{TransferProgress, TransferSummary};
use crate::transport::{HttpMethod, Transport};

/// 🚚 Copy every document of `origin` (or every one `settings.query` matches) into `dest`.
///
/// `origin_method` is the verb used for scroll requests, by name (`"post"`, `"GET"`, ...).
/// Both the verb and the self-transfer check are settled before anything touches the network.
/// Empty scroll pages are skipped rather than sent, since an empty `_bulk` body is a 400.
pub async fn transfer_index<T: Transport>(
    gateway: &Gateway<T>,
    origin: &IndexLocation,
    dest: &IndexLocation,
    origin_method: &str,
    settings: &ScrollSettings,
    origin_options: &RequestOptions,
    dest_options: &RequestOptions,
) -> Result<TransferSummary> {
    transfer_index_with_progress(
        gateway,
        origin,
        dest,
        origin_method,
        settings,
        origin_options,
        dest_options,
        TransferProgress::new(format!("{origin} → {dest}")),
    )
    .await
}

/// 🙈 [`transfer_index`], but you bring the progress display. Handy when nobody is watching.
#[allow(clippy::too_many_arguments)]
pub async fn transfer_index_with_progress<T: Transport>(
    gateway: &Gateway<T>,
    origin: &IndexLocation,
    dest: &IndexLocation,
    origin_method: &str,
    settings: &ScrollSettings,
    origin_options: &RequestOptions,
    dest_options: &RequestOptions,
    mut progress: TransferProgress,
) -> Result<TransferSummary> {
    let method: HttpMethod = origin_method.parse()?;
    if origin.is_same_index_as(dest) {
        return Err(ConfigurationError::SelfTransfer {
            endpoint: origin.endpoint.clone(),
            index: origin.index.clone(),
        }
        .into());
    }

    info!(
        "🚚 Transferring {} → {} ({} docs per page, scroll kept alive for {})",
        origin, dest, settings.chunk_size, settings.keep_alive
    );

    let mut extractor = extract_data(gateway, &origin.endpoint, &origin.index, method, settings, origin_options);
    let bulk_target = RequestTarget::new(&dest.endpoint, &dest.index, "").with_api("_bulk");

    while let Some(page) = extractor.next_page().await? {
        if let Some(total) = extractor.total_hits() {
            progress.set_total(total);
        }
        if page.is_empty() {
            // -- 🫥 an empty bulk body is a 400 waiting to happen. nothing to move, move on.
            debug!("🫥 Skipping an empty page from {}", origin);
            continue;
        }

        let payload = format_bulk_docs(&page)?;
        let payload_bytes = payload.len() as u64;
        let response = gateway
            .request(bulk_target, HttpMethod::Post, Some(payload.into()), dest_options)
            .await
            .with_context(|| format!("💀 Bulk submission of {} documents into {} failed.", page.len(), dest))?;

        let rejected = rejected_items(&response);
        if rejected > 0 {
            warn!(
                "⚠️ {} rejected {} of {} documents in a bulk request. The rest made it.",
                dest,
                rejected,
                page.len()
            );
        }

        progress.record_page(page.len() as u64, payload_bytes);
    }

    let summary = progress.finish();
    info!(
        "🏁 Transfer {} → {} done: {} documents in {} pages",
        origin, dest, summary.documents, summary.pages
    );
    Ok(summary)
}

/// 🔍 `{"errors": true, "items": [...]}`: count the items that came back with an `error`.
/// `errors: true` with no readable items still counts as at least one rejection.
fn rejected_items(bulk_response: &Value) -> usize {
    if !bulk_response.get("errors").and_then(Value::as_bool).unwrap_or(false) {
        return 0;
    }
    let counted = bulk_response
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.as_object()
                        .and_then(|actions| actions.values().next())
                        .is_some_and(|result| result.get("error").is_some())
                })
                .count()
        })
        .unwrap_or(0);
    counted.max(1)
}
