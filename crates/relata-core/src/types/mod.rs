//! # Core Type Definitions
//!
//! This module contains all core types for the Relata relation engine:
//! - Identifiers and relation type tags (`Identifier`, `RelationType`)
//! - Related resource entries (`Link`, `LocalizedText`)
//! - Catalog records (`Record`) and relation groups (`Relations`, `IncomingRelations`)
//! - Error types (`RelataError`)
//!
//! ## Absent vs. empty
//!
//! A relation group that was never requested (or never returned) is absent from
//! the map. A group that was requested and came back without entries is present
//! and empty. `IncomingRelations` additionally allows an explicit `None` value for
//! groups the backend reported as "nothing there".

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a record or link.
///
/// Catalog indexes are not consistent about identifier encoding: the same id can
/// arrive as `"42"` or `42`. Both deserialize to the same textual identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl Identifier {
    /// Create a new identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

// =============================================================================
// RELATION TYPES
// =============================================================================

/// Category of related resource.
///
/// Known tags get their own variant; anything else the backend returns is kept
/// verbatim in `Other` so it survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    Children,
    Parent,
    Services,
    Datasets,
    Siblings,
    Associated,
    Onlines,
    FeatureCatalogs,
    HasSources,
    Sources,
    HasFeatureCatalogs,
    Thumbnails,
    Related,
    Other(String),
}

impl RelationType {
    /// The wire tag of this relation type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Children => "children",
            Self::Parent => "parent",
            Self::Services => "services",
            Self::Datasets => "datasets",
            Self::Siblings => "siblings",
            Self::Associated => "associated",
            Self::Onlines => "onlines",
            Self::FeatureCatalogs => "fcats",
            Self::HasSources => "hassources",
            Self::Sources => "sources",
            Self::HasFeatureCatalogs => "hasfeaturecats",
            Self::Thumbnails => "thumbnails",
            Self::Related => "related",
            Self::Other(tag) => tag,
        }
    }

    /// Parse a single tag. Never fails: unknown tags become `Other`.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "children" => Self::Children,
            "parent" => Self::Parent,
            "services" => Self::Services,
            "datasets" => Self::Datasets,
            "siblings" => Self::Siblings,
            "associated" => Self::Associated,
            "onlines" => Self::Onlines,
            "fcats" => Self::FeatureCatalogs,
            "hassources" => Self::HasSources,
            "sources" => Self::Sources,
            "hasfeaturecats" => Self::HasFeatureCatalogs,
            "thumbnails" => Self::Thumbnails,
            "related" => Self::Related,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RelationType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for RelationType {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<RelationType> for String {
    fn from(t: RelationType) -> Self {
        t.as_str().to_string()
    }
}

/// Parse a pipe-delimited list of relation types (`"children|services"`).
///
/// Blank segments are skipped, duplicates are kept only once (first wins).
#[must_use]
pub fn parse_types(pipe_delimited: &str) -> Vec<RelationType> {
    let mut types: Vec<RelationType> = Vec::new();
    for tag in pipe_delimited.split('|').map(str::trim) {
        if tag.is_empty() {
            continue;
        }
        let t = RelationType::parse(tag);
        if !types.contains(&t) {
            types.push(t);
        }
    }
    types
}

/// Join relation types back into their pipe-delimited form.
#[must_use]
pub fn join_types(types: &[RelationType]) -> String {
    types
        .iter()
        .map(RelationType::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

// =============================================================================
// LOCALIZED TEXT
// =============================================================================

/// A text attribute that is either a plain string or a per-language object.
///
/// Language objects look like `{"eng": "Roads", "fre": "Routes"}`; some
/// endpoints wrap a single value as `{"#text": "Roads"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized(Map<String, Value>),
}

impl LocalizedText {
    /// Build a single-language value.
    #[must_use]
    pub fn localized(lang: &str, text: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(lang.to_string(), Value::String(text.into()));
        Self::Localized(map)
    }

    /// The plain string, if this is not a language object.
    #[must_use]
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s),
            Self::Localized(_) => None,
        }
    }

    /// Resolve a display string for `lang`.
    ///
    /// Lookup order: `#text`, `lang`, `eng`, then the first string value.
    #[must_use]
    pub fn resolve(&self, lang: &str) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s),
            Self::Localized(map) => ["#text", lang, "eng"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .or_else(|| map.values().find_map(Value::as_str)),
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_string())
    }
}

// =============================================================================
// LINK
// =============================================================================

/// A single related-resource entry.
///
/// The shape varies by relation type, so only a handful of fields are modelled;
/// everything else is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(
        default,
        rename = "associationType",
        skip_serializing_if = "Option::is_none"
    )]
    pub association_type: Option<String>,
    #[serde(default, rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Every attribute not listed above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Link {
    /// Create a link with only an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(Identifier::new(id)),
            ..Self::default()
        }
    }

    /// Set a plain title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(LocalizedText::Plain(title.into()));
        self
    }

    /// Set the protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set a plain URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(LocalizedText::Plain(url.into()));
        self
    }

    /// Set the association type.
    #[must_use]
    pub fn with_association_type(mut self, association: impl Into<String>) -> Self {
        self.association_type = Some(association.into());
        self
    }

    /// Set an arbitrary extension attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Read a string attribute by its wire name.
    ///
    /// Localized attributes only answer when they hold a plain string.
    /// Non-string extension values are treated as missing.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.id.as_ref().map(Identifier::as_str),
            "title" => self.title.as_ref().and_then(LocalizedText::as_plain),
            "url" => self.url.as_ref().and_then(LocalizedText::as_plain),
            "description" => self.description.as_ref().and_then(LocalizedText::as_plain),
            "protocol" => self.protocol.as_deref(),
            "associationType" => self.association_type.as_deref(),
            "mimeType" => self.mime_type.as_deref(),
            other => self.extra.get(other).and_then(Value::as_str),
        }
    }

    /// Title to display for `lang`, falling back to an empty string.
    #[must_use]
    pub fn display_title(&self, lang: &str) -> &str {
        self.title
            .as_ref()
            .and_then(|t| t.resolve(lang))
            .unwrap_or_default()
    }
}

// =============================================================================
// RELATION GROUPS
// =============================================================================

/// Aggregated relation groups of one record, as shown by a panel.
pub type Relations = BTreeMap<RelationType, Vec<Link>>;

/// Relation groups as delivered by a backend or embedded in a record.
///
/// `None` values mean "reported, but nothing there".
pub type IncomingRelations = BTreeMap<RelationType, Option<Vec<Link>>>;

// =============================================================================
// RECORD
// =============================================================================

/// A catalog record as returned by the search index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default)]
    pub uuid: String,
    /// Relation data already embedded by the backend, if any.
    #[serde(
        default,
        rename = "relatedRecords",
        skip_serializing_if = "Option::is_none"
    )]
    pub related_records: Option<IncomingRelations>,
    /// The record's own online resources.
    #[serde(default, rename = "link", skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Every other index field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with an id and a uuid.
    #[must_use]
    pub fn new(id: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            id: Some(Identifier::new(id)),
            uuid: uuid.into(),
            ..Self::default()
        }
    }

    /// Set an index field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set embedded relation data.
    #[must_use]
    pub fn with_related(mut self, related: IncomingRelations) -> Self {
        self.related_records = Some(related);
        self
    }

    /// Attach an online resource.
    #[must_use]
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Resolve a field name or a dotted path (`cl_status.key`).
    ///
    /// `id` and `uuid` resolve to the modelled identifiers.
    #[must_use]
    pub fn value(&self, path: &str) -> Option<Value> {
        match path {
            "id" => return self.id.as_ref().map(|id| Value::String(id.0.clone())),
            "uuid" => return Some(Value::String(self.uuid.clone())),
            _ => {}
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    /// Online resources whose protocol mentions `link_type` (case-insensitive).
    #[must_use]
    pub fn links_by_type(&self, link_type: &str) -> Vec<Link> {
        let needle = link_type.to_lowercase();
        self.links
            .iter()
            .filter(|link| {
                link.protocol
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Relata system.
///
/// None of them is fatal to a hosting application: every failure degrades to
/// "no related content shown". Cancellation is not an error.
#[derive(Debug, Clone, Error)]
pub enum RelataError {
    /// A filter expression carries an invalid regular expression.
    #[error("Malformed filter '{expression}': {reason}")]
    MalformedFilter { expression: String, reason: String },

    /// Loading related records for one panel failed.
    #[error("Something went wrong loading related records of type {types}: {reason}")]
    RelationFetch { types: String, reason: String },

    /// The batched multi-search failed as a whole.
    #[error("Batch relation query failed: {0}")]
    BatchResolve(String),

    /// The sort column of a table projection holds a non-string value.
    #[error("Cannot sort on column '{column}': row {row} is not a string")]
    ProjectionSort { column: String, row: usize },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A payload could not be decoded.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relation_type_round_trips_known_and_unknown_tags() {
        assert_eq!(RelationType::parse("fcats"), RelationType::FeatureCatalogs);
        assert_eq!(RelationType::Siblings.as_str(), "siblings");

        let custom = RelationType::parse("brothersAndSisters");
        assert_eq!(custom, RelationType::Other("brothersAndSisters".into()));
        assert_eq!(custom.to_string(), "brothersAndSisters");
    }

    #[test]
    fn parse_types_skips_blanks_and_duplicates() {
        let types = parse_types("children| services||children ");
        assert_eq!(types, vec![RelationType::Children, RelationType::Services]);
        assert_eq!(join_types(&types), "children|services");
    }

    #[test]
    fn identifier_accepts_numbers() {
        let link: Link = serde_json::from_value(json!({"id": 42})).expect("link");
        assert_eq!(link.id, Some(Identifier::new("42")));
    }

    #[test]
    fn link_keeps_unknown_attributes() {
        let link: Link = serde_json::from_value(json!({
            "id": "a",
            "protocol": "OGC:WMS",
            "function": "browsing",
            "applicationProfile": {"x": 1}
        }))
        .expect("link");

        assert_eq!(link.attribute("protocol"), Some("OGC:WMS"));
        assert_eq!(link.attribute("function"), Some("browsing"));
        assert_eq!(link.attribute("applicationProfile"), None);
        assert_eq!(link.attribute("nope"), None);

        let back = serde_json::to_value(&link).expect("serialize");
        assert_eq!(back["function"], "browsing");
    }

    #[test]
    fn localized_title_resolution_order() {
        let link: Link = serde_json::from_value(json!({
            "title": {"fre": "Routes", "eng": "Roads"}
        }))
        .expect("link");
        assert_eq!(link.display_title("fre"), "Routes");
        assert_eq!(link.display_title("ger"), "Roads");

        let wrapped: Link =
            serde_json::from_value(json!({"title": {"#text": "Rivers"}})).expect("link");
        assert_eq!(wrapped.display_title("eng"), "Rivers");

        let plain = Link::new("1").with_title("Lakes");
        assert_eq!(plain.display_title("eng"), "Lakes");
        assert_eq!(Link::new("2").display_title("eng"), "");
    }

    #[test]
    fn incoming_relations_distinguish_null_from_missing() {
        let incoming: IncomingRelations = serde_json::from_value(json!({
            "children": [],
            "services": null
        }))
        .expect("relations");

        assert_eq!(incoming.get(&RelationType::Children), Some(&Some(vec![])));
        assert_eq!(incoming.get(&RelationType::Services), Some(&None));
        assert!(!incoming.contains_key(&RelationType::Siblings));
    }

    #[test]
    fn record_value_follows_dotted_paths() {
        let record = Record::new("7", "uuid-7")
            .with_field("resourceTitle", "Roads")
            .with_field("cl_status", json!({"key": "completed"}))
            .with_field("tags", json!(["a", "b"]));

        assert_eq!(record.value("id"), Some(json!("7")));
        assert_eq!(record.value("uuid"), Some(json!("uuid-7")));
        assert_eq!(record.value("resourceTitle"), Some(json!("Roads")));
        assert_eq!(record.value("cl_status.key"), Some(json!("completed")));
        assert_eq!(record.value("tags.1"), Some(json!("b")));
        assert_eq!(record.value("cl_status.missing"), None);
    }

    #[test]
    fn links_by_type_matches_protocol_case_insensitively() {
        let record = Record::new("1", "u1")
            .with_link(Link::new("a").with_protocol("OGC:WMS"))
            .with_link(Link::new("b").with_protocol("WWW:DOWNLOAD"))
            .with_link(Link::new("c"));

        let ogc = record.links_by_type("ogc");
        assert_eq!(ogc.len(), 1);
        assert_eq!(ogc[0].attribute("id"), Some("a"));
    }
}
