//! # Stats Module
//!
//! Children listing with facet buckets: pick a bucket value to narrow the list
//! to the records it contains, pick it again to go back to the full list.

use crate::collate::locale_compare;
use crate::{Identifier, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A terms aggregation as returned by the search index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// One bucket with its top hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: Value,
    #[serde(default)]
    pub docs: BucketDocs,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketDocs {
    #[serde(default)]
    pub hits: BucketHits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketHits {
    #[serde(default)]
    pub hits: Vec<BucketHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketHit {
    #[serde(rename = "_id")]
    pub id: Identifier,
}

impl Bucket {
    /// Bucket whose key is a string.
    #[must_use]
    pub fn new(key: &str, ids: &[&str]) -> Self {
        Self {
            key: Value::String(key.to_string()),
            docs: BucketDocs {
                hits: BucketHits {
                    hits: ids
                        .iter()
                        .map(|id| BucketHit {
                            id: Identifier::new(*id),
                        })
                        .collect(),
                },
            },
        }
    }

    fn key_matches(&self, value: &str) -> bool {
        match &self.key {
            Value::String(s) => s == value,
            other => other.to_string() == value,
        }
    }

    fn doc_ids(&self) -> impl Iterator<Item = &Identifier> {
        self.docs.hits.hits.iter().map(|h| &h.id)
    }
}

/// Children with facet filtering.
#[derive(Debug, Clone)]
pub struct RelatedWithStats {
    children: Vec<Record>,
    aggregations: BTreeMap<String, Aggregation>,
    filters: Vec<String>,
    sort_by: Option<String>,
    current: Option<String>,
    displayed: Vec<usize>,
}

impl RelatedWithStats {
    /// Build the view.
    ///
    /// `filters` defaults to every aggregation key. Aggregations without
    /// buckets are dropped from the filter list.
    #[must_use]
    pub fn new(
        children: Vec<Record>,
        aggregations: BTreeMap<String, Aggregation>,
        filters: Option<Vec<String>>,
        sort_by: Option<String>,
    ) -> Self {
        let filters = filters
            .unwrap_or_else(|| aggregations.keys().cloned().collect())
            .into_iter()
            .filter(|key| {
                aggregations
                    .get(key)
                    .is_none_or(|agg| !agg.buckets.is_empty())
            })
            .collect();

        let mut view = Self {
            children,
            aggregations,
            filters,
            sort_by,
            current: None,
            displayed: Vec::new(),
        };
        view.reset();
        view
    }

    /// Facets offered to the user.
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// The active `key-value` selection, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Records currently shown.
    #[must_use]
    pub fn displayed(&self) -> Vec<&Record> {
        self.displayed.iter().map(|&i| &self.children[i]).collect()
    }

    /// Show every child again.
    pub fn reset(&mut self) {
        self.current = None;
        self.displayed = (0..self.children.len()).collect();
        self.sort();
    }

    /// Narrow to the records of bucket `value` in aggregation `key`.
    ///
    /// Selecting the active bucket again resets the view.
    pub fn filter_by(&mut self, key: &str, value: &str) {
        let selection = format!("{key}-{value}");
        if self.current.as_deref() == Some(selection.as_str()) {
            self.reset();
            return;
        }

        let mut displayed = Vec::new();
        if let Some(aggregation) = self.aggregations.get(key) {
            for bucket in aggregation.buckets.iter().filter(|b| b.key_matches(value)) {
                for id in bucket.doc_ids() {
                    displayed.extend(
                        self.children
                            .iter()
                            .enumerate()
                            .filter(|(_, child)| child.id.as_ref() == Some(id))
                            .map(|(i, _)| i),
                    );
                }
            }
        }

        self.current = Some(selection);
        self.displayed = displayed;
        self.sort();
    }

    fn sort(&mut self) {
        let Some(field) = self.sort_by.as_deref() else {
            return;
        };
        let children = &self.children;
        let key = |i: usize| match children[i].value(field) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        self.displayed.sort_by(|&a, &b| locale_compare(&key(a), &key(b)));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn children() -> Vec<Record> {
        vec![
            Record::new("1", "u1").with_field("resourceTitle", "Zebra crossings"),
            Record::new("2", "u2").with_field("resourceTitle", "bridges"),
            Record::new("3", "u3").with_field("resourceTitle", "Avenues"),
        ]
    }

    fn aggregations() -> BTreeMap<String, Aggregation> {
        let mut aggs = BTreeMap::new();
        aggs.insert(
            "format".to_string(),
            Aggregation {
                buckets: vec![Bucket::new("ESRI Shapefile", &["1", "3"]), Bucket::new("CSV", &["2"])],
            },
        );
        aggs.insert("status".to_string(), Aggregation::default());
        aggs
    }

    fn titles(view: &RelatedWithStats) -> Vec<String> {
        view.displayed()
            .iter()
            .filter_map(|r| r.value("resourceTitle"))
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn empty_aggregations_are_not_offered() {
        let view = RelatedWithStats::new(children(), aggregations(), None, None);
        assert_eq!(view.filters(), ["format".to_string()]);
    }

    #[test]
    fn initial_view_is_sorted() {
        let view = RelatedWithStats::new(
            children(),
            aggregations(),
            None,
            Some("resourceTitle".into()),
        );
        assert_eq!(titles(&view), vec!["Avenues", "bridges", "Zebra crossings"]);
    }

    #[test]
    fn filter_by_bucket_then_toggle_back() {
        let mut view = RelatedWithStats::new(
            children(),
            aggregations(),
            None,
            Some("resourceTitle".into()),
        );

        view.filter_by("format", "ESRI Shapefile");
        assert_eq!(view.current(), Some("format-ESRI Shapefile"));
        assert_eq!(titles(&view), vec!["Avenues", "Zebra crossings"]);

        view.filter_by("format", "ESRI Shapefile");
        assert_eq!(view.current(), None);
        assert_eq!(view.displayed().len(), 3);
    }

    #[test]
    fn unknown_bucket_shows_nothing() {
        let mut view = RelatedWithStats::new(children(), aggregations(), None, None);
        view.filter_by("format", "GeoJSON");
        assert!(view.displayed().is_empty());
    }

    #[test]
    fn buckets_deserialize_from_index_shape() {
        let agg: Aggregation = serde_json::from_value(serde_json::json!({
            "buckets": [{"key": 2020, "docs": {"hits": {"hits": [{"_id": "1"}]}}}]
        }))
        .expect("agg");

        assert!(agg.buckets[0].key_matches("2020"));
        assert_eq!(agg.buckets[0].doc_ids().count(), 1);
    }
}
