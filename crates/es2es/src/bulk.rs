//! 📡 Bulk formatting: documents, dressed for the bulk API's peculiar tastes. 🚀
//!
//! 🎬 COLD OPEN. INT. ELASTICSEARCH CLUSTER, BULK ENDPOINT, HIGH NOON
//!
//! The bulk API has rules.
//!
//! Rule 1: Two lines per document. Action metadata, then document source. Always.
//! Rule 2: Newline-delimited. Not comma-separated. Not XML. NEWLINES.
//! Rule 3: The trailing newline on the whole body matters. It MATTERS.
//!          Three engineers lost weekends to this. One of them still flinches at `\n`.
//!
//! ## Knowledge Graph 🧠
//! - Input: a page of [`Document`]s straight out of a scroll response
//! - Action line: `{"index":{"id":<id>}}`, plus `"routing"` when the origin had one
//! - Source line: `_source`, compact, keys in original order (serde_json `preserve_order`)
//! - `_score` and `_index` are read and left at the border
//!
//! ⚠️ When the singularity happens, the bulk API will still require two lines
//! per document. Some things transcend consciousness. 🦆

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};

use crate::common::Document;

/// 🔄 Format one document as its sacred two-line pair, without the trailing newline.
///
/// ```text
/// {"index":{"id":322}}
/// {"a_field":43,"another_field":54}
/// ```
///
/// A document without an identifier gets `{"index":{}}` and the destination assigns one.
/// YOLO mode. Elasticsearch's favorite mode.
pub fn format_bulk_doc(doc: &Document) -> Result<String> {
    let mut the_action_metadata = Map::new();
    if let Some(id) = &doc.id {
        the_action_metadata.insert("id".to_string(), id.clone());
    }
    if let Some(routing) = &doc.routing {
        the_action_metadata.insert("routing".to_string(), routing.clone());
    }

    let the_action_line = serde_json::to_string(&json!({ "index": Value::Object(the_action_metadata) }))
        .context("💀 Failed to serialize bulk action metadata. The JSON that describes JSON has failed to become JSON.")?;
    let the_source_line = serde_json::to_string(&doc.source)
        .context("💀 Failed to serialize a document's _source. It arrived as JSON and refused to leave as JSON.")?;

    Ok(format!("{}\n{}", the_action_line, the_source_line))
}

/// 📦 Format a whole page into one bulk payload: `2 × docs.len()` lines, trailing newline included.
///
/// An empty page formats to an empty string, not to a lonely `\n`.
pub fn format_bulk_docs(docs: &[Document]) -> Result<String> {
    let mut bulk_body = String::new();
    for doc in docs {
        bulk_body.push_str(&format_bulk_doc(doc)?);
        bulk_body.push('\n');
    }
    Ok(bulk_body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(raw: Value) -> Document {
        serde_json::from_value(raw).expect("💀 fixture should be a valid Document")
    }

    #[test]
    fn the_one_where_two_docs_become_four_lines_in_the_right_order() -> Result<()> {
        let docs = vec![
            doc(json!({"_score": 23, "_index": null, "id": 322,
                       "_source": {"a_field": 43, "another_field": 54}})),
            doc(json!({"_score": "blah", "_index": 34, "id": "joel",
                       "_source": {"a_field": "klinger", "another_field": 21}})),
        ];

        assert_eq!(
            format_bulk_docs(&docs)?,
            concat!(
                "{\"index\":{\"id\":322}}\n",
                "{\"a_field\":43,\"another_field\":54}\n",
                "{\"index\":{\"id\":\"joel\"}}\n",
                "{\"a_field\":\"klinger\",\"another_field\":21}\n",
            )
        );
        Ok(())
    }

    #[test]
    fn the_one_where_nothing_in_means_nothing_out() -> Result<()> {
        assert_eq!(format_bulk_docs(&[])?, "");
        Ok(())
    }

    #[test]
    fn the_one_where_line_count_is_always_twice_the_doc_count() -> Result<()> {
        for n in [1usize, 2, 7, 23] {
            let docs: Vec<Document> = (0..n)
                .map(|i| doc(json!({"_id": format!("d-{i}"), "_source": {"n": i, "text": "line\nbreak"}})))
                .collect();
            let payload = format_bulk_docs(&docs)?;
            assert!(payload.ends_with('\n'));
            assert_eq!(payload.lines().count(), 2 * n, "escaped newlines inside strings must not split lines");
        }
        Ok(())
    }

    #[test]
    fn the_one_where_source_keys_keep_their_place_in_line() -> Result<()> {
        let d = doc(json!({"_id": "x", "_source": {"zulu": 1, "alpha": 2, "mike": {"yankee": 3, "bravo": 4}}}));
        let payload = format_bulk_docs(&[d])?;
        let source_line = payload.lines().nth(1).expect("source line");
        assert_eq!(source_line, r#"{"zulu":1,"alpha":2,"mike":{"yankee":3,"bravo":4}}"#);
        Ok(())
    }

    #[test]
    fn the_one_where_score_and_index_are_left_at_the_border() -> Result<()> {
        let d = doc(json!({"_id": 1, "_score": 9.5, "_index": "old-home", "_source": {"k": "v"}}));
        let pair = format_bulk_doc(&d)?;
        assert!(!pair.contains("old-home"));
        assert!(!pair.contains("9.5"));
        assert!(!pair.ends_with('\n'), "single pairs leave the trailing newline to the payload");
        Ok(())
    }

    #[test]
    fn the_one_where_an_anonymous_doc_lets_the_engine_pick_a_name() -> Result<()> {
        let d = doc(json!({"_source": {"orphan": true}}));
        assert_eq!(format_bulk_doc(&d)?, "{\"index\":{}}\n{\"orphan\":true}");
        Ok(())
    }

    #[test]
    fn the_one_where_custom_routing_survives_the_trip() -> Result<()> {
        let d = doc(json!({"_id": "r1", "_routing": "user-7", "_source": {"a": 1}}));
        let action: Value = serde_json::from_str(format_bulk_doc(&d)?.lines().next().expect("action line"))?;
        assert_eq!(action, json!({"index": {"id": "r1", "routing": "user-7"}}));
        Ok(())
    }
}
