//! # Multi-Search Module
//!
//! Request planning and response reassembly for batch relation lookups.
//!
//! One sub-query is issued per (relation type, record) pair, type-major then
//! record-minor. The plan remembers the pair behind every position, so the
//! response is mapped back by zipping, never by index arithmetic.
//!
//! ## Sub-queries
//!
//! | relation   | query                                   |
//! |------------|-----------------------------------------|
//! | `children` | `terms parentUuid = [uuid]`             |
//! | `services` | `terms recordOperateOn = [uuid]`        |
//! | otherwise  | `match_all`, `size: 0` (never any hits) |

use crate::{Identifier, IncomingRelations, Link, LocalizedText, RelataError, Record, RelationType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Index every sub-query targets.
pub const RECORDS_INDEX: &str = "records";

/// Source fields requested for related records.
pub const SOURCE_FIELDS: [&str; 2] = ["resourceTitle*", "id"];

/// Relation groups of many records, keyed by record uuid.
pub type BatchRelations = BTreeMap<String, IncomingRelations>;

/// Index field linking a related record back to the queried uuid.
#[must_use]
pub fn search_field(relation_type: &RelationType) -> Option<&'static str> {
    match relation_type {
        RelationType::Children => Some("parentUuid"),
        RelationType::Services => Some("recordOperateOn"),
        _ => None,
    }
}

/// Query body for one (record, relation type) pair.
#[must_use]
pub fn sub_query(uuid: &str, relation_type: &RelationType) -> Value {
    match search_field(relation_type) {
        Some(field) => json!({
            "query": {"terms": {field: [uuid]}},
            "_source": SOURCE_FIELDS,
        }),
        None => json!({
            "query": {"match_all": {}},
            "from": 0,
            "size": 0,
        }),
    }
}

// =============================================================================
// PLAN
// =============================================================================

/// One planned sub-query.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub uuid: String,
    pub relation_type: RelationType,
    pub query: Value,
}

/// Ordered list of sub-queries for one batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiSearchPlan {
    entries: Vec<SubQuery>,
    uuids: Vec<String>,
    types: Vec<RelationType>,
}

impl MultiSearchPlan {
    /// Plan sub-queries for every record and relation type.
    #[must_use]
    pub fn build(records: &[Record], types: &[RelationType]) -> Self {
        let uuids: Vec<String> = records.iter().map(|r| r.uuid.clone()).collect();
        let mut entries = Vec::with_capacity(uuids.len() * types.len());
        for relation_type in types {
            for uuid in &uuids {
                entries.push(SubQuery {
                    uuid: uuid.clone(),
                    relation_type: relation_type.clone(),
                    query: sub_query(uuid, relation_type),
                });
            }
        }
        Self {
            entries,
            uuids,
            types: types.to_vec(),
        }
    }

    /// Planned sub-queries in request order.
    #[must_use]
    pub fn entries(&self) -> &[SubQuery] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newline-delimited request body: a header line and a query line per entry.
    #[must_use]
    pub fn body(&self) -> String {
        let header = json!({"index": RECORDS_INDEX}).to_string();
        let mut body = String::new();
        for entry in &self.entries {
            body.push_str(&header);
            body.push('\n');
            body.push_str(&entry.query.to_string());
            body.push('\n');
        }
        body
    }

    /// Map sub-results back to their (record, relation type) pairs.
    ///
    /// Every planned record gets every planned type: `Some(links)` when the
    /// sub-result had hits, `None` otherwise. A response of the wrong length or
    /// a failed sub-query fails the whole batch.
    pub fn reassemble(&self, response: MultiSearchResponse) -> Result<BatchRelations, RelataError> {
        if response.responses.len() != self.entries.len() {
            return Err(RelataError::BatchResolve(format!(
                "expected {} sub-results, got {}",
                self.entries.len(),
                response.responses.len()
            )));
        }

        let mut related: BatchRelations = self
            .uuids
            .iter()
            .map(|uuid| {
                let groups = self.types.iter().map(|t| (t.clone(), None)).collect();
                (uuid.clone(), groups)
            })
            .collect();

        for (entry, result) in self.entries.iter().zip(response.responses) {
            if let Some(error) = result.error {
                return Err(RelataError::BatchResolve(format!(
                    "sub-query for {} of {} failed: {}",
                    entry.relation_type, entry.uuid, error
                )));
            }

            let links = result.into_links();
            let value = if links.is_empty() { None } else { Some(links) };
            related
                .entry(entry.uuid.clone())
                .or_default()
                .insert(entry.relation_type.clone(), value);
        }

        Ok(related)
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// `_msearch` response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiSearchResponse {
    #[serde(default)]
    pub responses: Vec<SubResponse>,
}

/// One sub-result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubResponse {
    #[serde(default)]
    pub hits: Hits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: HitTotal,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HitTotal {
    #[serde(default)]
    pub value: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl Hit {
    /// Hit with an id and a default-language title, as the index returns it.
    #[must_use]
    pub fn new(id: &str, title: &str) -> Self {
        let mut source = Map::new();
        source.insert("id".into(), Value::String(id.into()));
        source.insert("resourceTitleObject".into(), json!({"default": title}));
        Self { source }
    }

    /// Link with the record id and its default title as English text.
    #[must_use]
    pub fn to_link(&self) -> Link {
        let id = self
            .source
            .get("id")
            .cloned()
            .and_then(|v| serde_json::from_value::<Identifier>(v).ok());
        let title = self
            .source
            .get("resourceTitleObject")
            .and_then(|t| t.get("default"))
            .and_then(Value::as_str)
            .map(|t| LocalizedText::localized("eng", t));

        Link {
            id,
            title,
            ..Link::default()
        }
    }
}

impl SubResponse {
    /// Sub-result carrying the given hits.
    #[must_use]
    pub fn with_hits(hits: Vec<Hit>) -> Self {
        Self {
            hits: Hits {
                total: HitTotal {
                    value: hits.len() as u64,
                },
                hits,
            },
            error: None,
        }
    }

    fn into_links(self) -> Vec<Link> {
        if self.hits.total.value == 0 {
            return Vec::new();
        }
        self.hits.hits.iter().map(Hit::to_link).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
