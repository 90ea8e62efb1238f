//! # Settings
//!
//! Catalog connection, panels and link types, read from a TOML file and
//! overridden by environment variables.
//!
//! ```toml
//! [catalog]
//! url = "https://catalog.example.org/geonetwork/srv"
//! timeout_secs = 10
//!
//! [[panel]]
//! types = "onlines"
//! filter = "protocol:OGC:.*|ESRI:.*"
//! title = "API"
//! ```
//!
//! | Variable                | Default                                   |
//! |-------------------------|-------------------------------------------|
//! | `RELATA_URL`            | `http://localhost:8080/geonetwork/srv`    |
//! | `RELATA_API_KEY`        | unset                                     |
//! | `RELATA_TIMEOUT_SECS`   | `30`                                      |
//! | `RELATA_CACHE_TTL_SECS` | `60` (`0` disables the cache)             |

use relata_core::{LinkTypeConfig, LinkTypeTable, PanelConfig, RelataError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Catalog URL used when nothing is configured.
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8080/geonetwork/srv";

/// Configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "relata.toml";

/// Catalog connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Related-response cache TTL. `0` disables caching.
    pub cache_ttl_secs: u64,
    /// Preferred language for titles.
    pub lang: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
            cache_ttl_secs: 60,
            lang: "eng".to_string(),
        }
    }
}

/// Everything the application reads from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: CatalogSettings,
    #[serde(rename = "panel")]
    pub panels: Vec<PanelConfig>,
    #[serde(flatten)]
    pub link_types: LinkTypeConfig,
}

impl Settings {
    /// Load settings from `path`, or from `relata.toml` when it exists, then
    /// apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, RelataError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        settings.apply_env_from(|key| std::env::var(key).ok());
        settings.drop_malformed_filters();
        settings.validate()?;
        Ok(settings)
    }

    /// Remove panel filters that do not parse. The affected panels show
    /// unfiltered results; the rest of the settings stay usable.
    pub fn drop_malformed_filters(&mut self) {
        for panel in &mut self.panels {
            if let Err(e) = panel.filter_expression() {
                tracing::warn!(panel = %panel.title, error = %e, "ignoring panel filter");
                panel.filter = None;
            }
        }
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RelataError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelataError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Self::from_toml_str(&contents)
    }

    /// Parse TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, RelataError> {
        toml::from_str(contents).map_err(|e| RelataError::Config(e.to_string()))
    }

    /// Override catalog settings from an environment lookup.
    ///
    /// Unparseable numbers are ignored. An empty `RELATA_API_KEY` clears the key.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("RELATA_URL").filter(|u| !u.is_empty()) {
            self.catalog.url = url;
        }
        if let Some(key) = lookup("RELATA_API_KEY") {
            self.catalog.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(secs) = lookup("RELATA_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.catalog.timeout_secs = secs;
        }
        if let Some(secs) = lookup("RELATA_CACHE_TTL_SECS").and_then(|s| s.parse().ok()) {
            self.catalog.cache_ttl_secs = secs;
        }
    }

    /// Check panels and link rules.
    pub fn validate(&self) -> Result<(), RelataError> {
        if self.catalog.timeout_secs == 0 {
            return Err(RelataError::Config("timeout_secs must be positive".into()));
        }
        for panel in &self.panels {
            panel.validate()?;
        }
        self.link_table().map(|_| ())
    }

    /// Compiled link type table. The built-in table applies when no rules
    /// or types are configured.
    pub fn link_table(&self) -> Result<LinkTypeTable, RelataError> {
        if self.link_types == LinkTypeConfig::default() {
            return Ok(LinkTypeTable::default());
        }
        LinkTypeTable::from_config(&self.link_types)
    }

    /// Panel whose title matches `title`.
    pub fn panel(&self, title: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.title == title)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use relata_core::{DisplayMode, RelationType};
    use std::collections::BTreeMap;

    #[test]
    fn empty_toml_gives_defaults() {
        let settings = Settings::from_toml_str("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.catalog.url, DEFAULT_CATALOG_URL);
        assert_eq!(settings.catalog.timeout_secs, 30);
        assert_eq!(settings.catalog.cache_ttl_secs, 60);
    }

    #[test]
    fn panels_and_link_types_parse() {
        let settings = Settings::from_toml_str(
            r#"
            [catalog]
            url = "https://example.org/srv"

            [[panel]]
            types = "onlines"
            filter = "protocol:OGC:.*"
            title = "API"
            mode = "tabset"

            [[panel]]
            types = "siblings|associated"

            [[link_rules]]
            protocol = "OGC:WMS"
            type = "WMS"

            [link_types.WMS]
            icon = "fa-globe"
            action = true
            "#,
        )
        .expect("parse");

        assert_eq!(settings.catalog.url, "https://example.org/srv");
        assert_eq!(settings.catalog.timeout_secs, 30);
        assert_eq!(settings.panels.len(), 2);
        assert_eq!(settings.panels[0].mode, DisplayMode::Tabset);
        assert_eq!(
            settings.panels[1].relation_types(),
            vec![RelationType::Siblings, RelationType::Associated]
        );
        assert_eq!(settings.panel("API"), Some(&settings.panels[0]));
        assert!(settings.validate().is_ok());

        let table = settings.link_table().expect("table");
        assert!(table.has_action("WMS"));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: BTreeMap<&str, &str> = [
            ("RELATA_URL", "http://other/srv"),
            ("RELATA_API_KEY", "secret"),
            ("RELATA_TIMEOUT_SECS", "5"),
            ("RELATA_CACHE_TTL_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.catalog.url, "http://other/srv");
        assert_eq!(settings.catalog.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.catalog.timeout_secs, 5);
        assert_eq!(settings.catalog.cache_ttl_secs, 60);
    }

    #[test]
    fn empty_api_key_clears_it() {
        let mut settings = Settings::default();
        settings.catalog.api_key = Some("old".into());
        settings.apply_env_from(|key| (key == "RELATA_API_KEY").then(String::new));
        assert!(settings.catalog.api_key.is_none());
    }

    #[test]
    fn malformed_panel_filter_fails_validation() {
        let settings = Settings::from_toml_str(
            r#"
            [[panel]]
            types = "onlines"
            filter = "protocol:("
            "#,
        )
        .expect("parse");
        assert!(matches!(
            settings.validate(),
            Err(RelataError::MalformedFilter { .. })
        ));
    }

    #[test]
    fn malformed_panel_filters_are_dropped() {
        let mut settings = Settings::from_toml_str(
            r#"
            [[panel]]
            title = "Good"
            types = "onlines"
            filter = "protocol:OGC:.*"

            [[panel]]
            title = "Broken"
            types = "onlines"
            filter = "protocol:("
            "#,
        )
        .expect("parse");

        settings.drop_malformed_filters();

        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.panel("Good").and_then(|p| p.filter.as_deref()),
            Some("protocol:OGC:.*")
        );
        let broken = settings.panel("Broken").expect("panel kept");
        assert_eq!(broken.filter, None);
    }

    #[test]
    fn bad_link_rule_fails_validation() {
        let settings = Settings::from_toml_str(
            r#"
            [[link_rules]]
            protocol = "OGC:("
            type = "WMS"
            "#,
        )
        .expect("parse");
        assert!(matches!(settings.validate(), Err(RelataError::Config(_))));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(matches!(
            Settings::from_toml_str("[[panel]\ntypes ="),
            Err(RelataError::Config(_))
        ));
    }
}
