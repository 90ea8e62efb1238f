//! # Panel Module
//!
//! Declarative panel configuration and the per-type "show all" item windows.

use crate::aggregate::Aggregator;
use crate::filter::FilterExpression;
use crate::{RelataError, RelationType, parse_types};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the relation types of a panel are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// One tab per relation type.
    Tabset,
    /// Relation types stacked one below the other.
    #[default]
    Stacked,
}

/// How the items of one relation type are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Card,
    #[default]
    List,
}

/// Configuration of one related-resources panel.
///
/// ```toml
/// [[panel]]
/// types = "onlines"
/// filter = "protocol:OGC:.*|ESRI:.*|atom.*"
/// title = "API"
/// mode = "tabset"
/// layout = "card"
/// size = 3
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Pipe-delimited relation types.
    pub types: String,
    /// Optional filter expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Title translation key.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub mode: DisplayMode,
    #[serde(default)]
    pub layout: Layout,
    /// Items shown per type before "show all" (card layout only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl PanelConfig {
    /// Panel over `types` with default mode and layout.
    #[must_use]
    pub fn new(types: impl Into<String>) -> Self {
        Self {
            types: types.into(),
            ..Self::default()
        }
    }

    /// Set the filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the title key.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the display mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the item threshold.
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// The requested relation types, in declaration order.
    #[must_use]
    pub fn relation_types(&self) -> Vec<RelationType> {
        parse_types(&self.types)
    }

    /// Parse the filter expression, if any.
    pub fn filter_expression(&self) -> Result<Option<FilterExpression>, RelataError> {
        self.filter
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(FilterExpression::parse)
            .transpose()
    }

    /// Build the aggregator for this panel.
    pub fn aggregator(&self) -> Result<Aggregator, RelataError> {
        Ok(match self.filter_expression()? {
            Some(filter) => Aggregator::with_filter(filter),
            None => Aggregator::new(),
        })
    }

    /// Check the configuration before use.
    pub fn validate(&self) -> Result<(), RelataError> {
        if self.relation_types().is_empty() {
            return Err(RelataError::Config(format!(
                "panel '{}' requests no relation types",
                self.title
            )));
        }
        self.filter_expression().map(|_| ())
    }
}

// =============================================================================
// ITEM WINDOWS
// =============================================================================

/// Number of items displayed per relation type.
///
/// A window starts at the panel threshold the first time a type appears and
/// toggles between the threshold and the full count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemWindow {
    threshold: Option<usize>,
    shown: BTreeMap<RelationType, Option<usize>>,
}

impl ItemWindow {
    /// Windows for a panel with the given threshold (`None` = show everything).
    #[must_use]
    pub fn new(threshold: Option<usize>) -> Self {
        Self {
            threshold,
            shown: BTreeMap::new(),
        }
    }

    /// Register a type at the threshold, keeping an existing window.
    pub fn open(&mut self, relation_type: &RelationType) {
        self.shown
            .entry(relation_type.clone())
            .or_insert(self.threshold);
    }

    /// Flip a type between the threshold and `total` items.
    pub fn toggle(&mut self, relation_type: &RelationType, total: usize) {
        let next = match self.shown.get(relation_type).copied().flatten() {
            current if current == self.threshold => Some(total),
            _ => self.threshold,
        };
        self.shown.insert(relation_type.clone(), next);
    }

    /// How many of `total` items to display.
    #[must_use]
    pub fn visible(&self, relation_type: &RelationType, total: usize) -> usize {
        match self.shown.get(relation_type).copied().flatten() {
            Some(limit) => limit.min(total),
            None => total,
        }
    }

    /// Whether a "show all" control is useful for this type.
    #[must_use]
    pub fn is_truncated(&self, relation_type: &RelationType, total: usize) -> bool {
        self.threshold.is_some_and(|limit| total > limit)
            && self.visible(relation_type, total) < total
    }

    /// Forget every window.
    pub fn clear(&mut self) {
        self.shown.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_from_toml_shape() {
        let config: PanelConfig = serde_json::from_value(serde_json::json!({
            "types": "onlines",
            "filter": "protocol:OGC:.*",
            "title": "API",
            "mode": "tabset",
            "layout": "card",
            "size": 3
        }))
        .expect("config");

        assert_eq!(config.mode, DisplayMode::Tabset);
        assert_eq!(config.layout, Layout::Card);
        assert_eq!(config.relation_types(), vec![RelationType::Onlines]);
        assert!(config.filter_expression().expect("filter").is_some());
    }

    #[test]
    fn empty_filter_means_no_filter() {
        let config = PanelConfig::new("children").with_filter("");
        assert!(config.filter_expression().expect("filter").is_none());
        assert!(config.aggregator().expect("aggregator").filter().is_none());
    }

    #[test]
    fn validate_rejects_empty_types_and_bad_filters() {
        assert!(matches!(
            PanelConfig::new(" | ").validate(),
            Err(RelataError::Config(_))
        ));
        assert!(matches!(
            PanelConfig::new("onlines").with_filter("protocol:[").validate(),
            Err(RelataError::MalformedFilter { .. })
        ));
        assert!(PanelConfig::new("onlines").validate().is_ok());
    }

    #[test]
    fn item_window_toggles_between_threshold_and_total() {
        let mut window = ItemWindow::new(Some(3));
        let t = RelationType::Onlines;
        window.open(&t);

        assert_eq!(window.visible(&t, 10), 3);
        assert!(window.is_truncated(&t, 10));

        window.toggle(&t, 10);
        assert_eq!(window.visible(&t, 10), 10);
        assert!(!window.is_truncated(&t, 10));

        window.toggle(&t, 10);
        assert_eq!(window.visible(&t, 10), 3);
    }

    #[test]
    fn item_window_without_threshold_shows_everything() {
        let mut window = ItemWindow::new(None);
        let t = RelationType::Children;
        window.open(&t);
        assert_eq!(window.visible(&t, 7), 7);
        assert!(!window.is_truncated(&t, 7));
    }
}
