//! 📦 Common data structures: the building blocks of es2es.
//!
//! 🎬 COLD OPEN. INT. DATA CENTER, 3:47 AM
//!
//! A scroll page arrives. Quietly. Carrying its hits like a responsible adult carrying
//! groceries in one trip. Each [`Document`] knows its `_source`. Most know their `_id`.
//! None of them know what's coming next. Relatable.
//!
//! These structs ferry documents from the origin index to the destination index.
//! They don't ask questions. They carry the data. Please tip your postal workers. 🦆

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 📄 A page: one scroll step's worth of documents, in the order the engine sent them.
pub type Page = Vec<Document>;

/// 🎯 A single search hit, as the engine returns it inside `hits.hits`.
///
/// Only `_source` survives the trip to the destination. `_score` and `_index` ride along
/// for debugging and are left at the border. The identifier is read from `_id`
/// (what the engine sends) or `id` (what hand-built fixtures tend to use).
///
/// `_source` is a [`Map`] and `serde_json` is built with `preserve_order`, so field order
/// leaves exactly the way it came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// 🪪 The document's identity. A number or a string, the engine doesn't judge.
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// 📡 Where it lived. Informational only.
    #[serde(rename = "_index", default)]
    pub index: Option<Value>,

    /// 🏅 How relevant it was to a match_all. Spoiler: all equally.
    #[serde(rename = "_score", default)]
    pub score: Option<Value>,

    /// 🔧 Custom shard routing, only present when the origin used it.
    #[serde(rename = "_routing", default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<Value>,

    /// 📦 The payload. The only part that gets persisted on re-index.
    #[serde(rename = "_source")]
    pub source: Map<String, Value>,
}

/// 📍 One (endpoint, index) pair. Two of these being equal is how we catch self-transfers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexLocation {
    pub endpoint: String,
    pub index: String,
}

impl IndexLocation {
    pub fn new(endpoint: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            index: index.into(),
        }
    }

    /// 🪞 Same index on the same cluster, ignoring a trailing slash on the endpoint.
    pub fn is_same_index_as(&self, other: &IndexLocation) -> bool {
        self.index == other.index
            && self.endpoint.trim_end_matches('/') == other.endpoint.trim_end_matches('/')
    }
}

impl std::fmt::Display for IndexLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.endpoint.trim_end_matches('/'), self.index)
    }
}
