//! # Link Type Module
//!
//! Explicit table classifying links into display types (`WMS`, `DOWNLOAD`,
//! `MDSIBLING`, ...) and mapping each type to an icon, a badge and an action
//! flag. The table is injected wherever links are rendered.
//!
//! ```toml
//! [[link_rules]]
//! protocol = "OGC:WMS"
//! type = "WMS"
//!
//! [link_types.WMS]
//! icon = "fa-globe"
//! badge = "WMS"
//! action = true
//! layer = true
//! ```

use crate::{Link, RelataError, RelationType};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display type for online links that match no rule.
pub const DEFAULT_LINK_TYPE: &str = "LINK";

const DEFAULT_ICON: &str = "fa-link";

/// Protocol rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRuleConfig {
    /// Case-insensitive regex searched in the link protocol.
    pub protocol: String,
    #[serde(rename = "type")]
    pub main_type: String,
}

/// Presentation of one display type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkTypeInfo {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    /// Whether the type has a viewer action.
    #[serde(default)]
    pub action: bool,
    /// Whether links of this type can be added as map layers.
    #[serde(default)]
    pub layer: bool,
}

/// Serializable form of the table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkTypeConfig {
    #[serde(default)]
    pub link_rules: Vec<LinkRuleConfig>,
    #[serde(default)]
    pub link_types: BTreeMap<String, LinkTypeInfo>,
}

/// Compiled link type table.
#[derive(Debug, Clone)]
pub struct LinkTypeTable {
    rules: Vec<(Regex, String)>,
    types: BTreeMap<String, LinkTypeInfo>,
}

impl LinkTypeTable {
    /// Compile a configuration.
    pub fn from_config(config: &LinkTypeConfig) -> Result<Self, RelataError> {
        let rules = config
            .link_rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&rule.protocol)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, rule.main_type.clone()))
                    .map_err(|e| {
                        RelataError::Config(format!("link rule '{}': {}", rule.protocol, e))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            types: config.link_types.clone(),
        })
    }

    /// Built-in table covering the common OGC, ESRI, Atom and download protocols.
    #[must_use]
    pub fn default_config() -> LinkTypeConfig {
        let rule = |protocol: &str, main_type: &str| LinkRuleConfig {
            protocol: protocol.to_string(),
            main_type: main_type.to_string(),
        };
        let info = |icon: &str, badge: Option<&str>, action: bool, layer: bool| LinkTypeInfo {
            icon: Some(icon.to_string()),
            badge: badge.map(str::to_string),
            action,
            layer,
        };

        let link_rules = vec![
            rule("^OGC:WMTS", "WMTS"),
            rule("^OGC:WMS", "WMS"),
            rule("^OGC:WFS", "WFS"),
            rule("^OGC:WCS", "WCS"),
            rule("^ESRI:REST", "ESRI:REST"),
            rule("atom", "ATOM"),
            rule("DOWNLOAD|^FILE:|^DB:", "DOWNLOAD"),
        ];

        let mut link_types = BTreeMap::new();
        link_types.insert("WMS".into(), info("fa-globe", Some("WMS"), true, true));
        link_types.insert("WMTS".into(), info("fa-globe", Some("WMTS"), true, true));
        link_types.insert("ESRI:REST".into(), info("fa-globe", Some("ESRI"), true, true));
        link_types.insert("WFS".into(), info("fa-table", Some("WFS"), true, false));
        link_types.insert("WCS".into(), info("fa-th", Some("WCS"), false, false));
        link_types.insert("ATOM".into(), info("fa-rss", Some("ATOM"), true, false));
        link_types.insert("DOWNLOAD".into(), info("fa-download", None, false, false));
        link_types.insert(DEFAULT_LINK_TYPE.into(), info("fa-link", None, false, false));
        link_types.insert("MDSIBLING".into(), info("fa-sitemap", None, false, false));
        link_types.insert("MDCHILDREN".into(), info("fa-folder-open", None, false, false));
        link_types.insert("MDPARENT".into(), info("fa-folder", None, false, false));
        link_types.insert("MDSERVICE".into(), info("fa-cloud", None, false, false));
        link_types.insert("MDDATASET".into(), info("fa-database", None, false, false));
        link_types.insert("MDFCATS".into(), info("fa-table", None, false, false));
        link_types.insert("MDSOURCE".into(), info("fa-share-alt", None, false, false));

        LinkTypeConfig {
            link_rules,
            link_types,
        }
    }

    /// Display type of `link` found under `relation_type`.
    ///
    /// Record relations map to an `MD*` type; online links go through the
    /// protocol rules in order and fall back to `LINK`.
    #[must_use]
    pub fn main_type(&self, link: &Link, relation_type: &RelationType) -> String {
        let record_type = match relation_type {
            RelationType::Siblings | RelationType::Associated => Some("MDSIBLING"),
            RelationType::Children => Some("MDCHILDREN"),
            RelationType::Parent => Some("MDPARENT"),
            RelationType::Services => Some("MDSERVICE"),
            RelationType::Datasets => Some("MDDATASET"),
            RelationType::FeatureCatalogs | RelationType::HasFeatureCatalogs => Some("MDFCATS"),
            RelationType::Sources | RelationType::HasSources => Some("MDSOURCE"),
            _ => None,
        };
        if let Some(t) = record_type {
            return t.to_string();
        }

        let protocol = link.protocol.as_deref().unwrap_or_default();
        self.rules
            .iter()
            .find(|(re, _)| !protocol.is_empty() && re.is_match(protocol))
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| DEFAULT_LINK_TYPE.to_string())
    }

    /// Icon class for a display type.
    #[must_use]
    pub fn icon(&self, main_type: &str) -> &str {
        self.types
            .get(main_type)
            .and_then(|i| i.icon.as_deref())
            .unwrap_or(DEFAULT_ICON)
    }

    /// Badge text: the configured badge, else the link's MIME type.
    #[must_use]
    pub fn badge_label(&self, main_type: &str, link: &Link) -> Option<String> {
        self.types
            .get(main_type)
            .and_then(|i| i.badge.clone())
            .or_else(|| link.mime_type.clone())
    }

    /// Whether a display type has a viewer action.
    #[must_use]
    pub fn has_action(&self, main_type: &str) -> bool {
        self.types.get(main_type).is_some_and(|i| i.action)
    }

    /// Whether `link` can be added to a map as a layer.
    #[must_use]
    pub fn is_layer_protocol(&self, link: &Link) -> bool {
        let main_type = self.main_type(link, &RelationType::Onlines);
        self.types.get(&main_type).is_some_and(|i| i.layer)
    }

    /// A sibling with a declared association type.
    #[must_use]
    pub fn is_sibling(&self, main_type: &str, link: &Link) -> bool {
        main_type == "MDSIBLING" && link.association_type.as_deref().is_some_and(|a| !a.is_empty())
    }
}

impl Default for LinkTypeTable {
    fn default() -> Self {
        // Built-in rules are covered by `default_rules_compile`.
        Self::from_config(&Self::default_config()).unwrap_or_else(|_| Self {
            rules: Vec::new(),
            types: BTreeMap::new(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
