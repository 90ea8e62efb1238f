//! # Container Module
//!
//! Sections of a multi-panel container built from a record's embedded
//! relation data, without any network call.
//!
//! Each `PanelConfig` yields one section per requested relation type. Filters
//! only apply in tabset mode, where several sections share one relation type
//! and split it by attribute (API / download / other links).

use crate::panel::{DisplayMode, PanelConfig};
use crate::{Link, RelataError, Record, RelationType};

/// One displayed section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub relation_type: RelationType,
    /// `None` when the record carries no data for this type.
    pub links: Option<Vec<Link>>,
    pub found: bool,
}

/// Build the sections for `record` from `configs`.
///
/// A malformed filter fails the whole container; callers decide whether to
/// fall back to unfiltered configs.
pub fn build_sections(
    record: &Record,
    configs: &[PanelConfig],
    mode: DisplayMode,
) -> Result<Vec<Section>, RelataError> {
    let mut sections = Vec::new();

    for config in configs {
        let filter = match mode {
            DisplayMode::Tabset => config.filter_expression()?,
            DisplayMode::Stacked => None,
        };

        for relation_type in config.relation_types() {
            let embedded = record
                .related_records
                .as_ref()
                .and_then(|related| related.get(&relation_type))
                .cloned()
                .flatten();

            let links = match (&filter, embedded) {
                (Some(filter), Some(links)) => Some(filter.apply(&links)),
                (_, links) => links,
            };
            let found = links.as_ref().is_some_and(|l| !l.is_empty());

            sections.push(Section {
                title: config.title.clone(),
                relation_type,
                links,
                found,
            });
        }
    }

    Ok(sections)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IncomingRelations;

    fn record() -> Record {
        let mut related = IncomingRelations::new();
        related.insert(
            RelationType::Onlines,
            Some(vec![
                Link::new("wms").with_protocol("OGC:WMS"),
                Link::new("zip").with_protocol("WWW:DOWNLOAD"),
                Link::new("home").with_protocol("WWW:LINK"),
            ]),
        );
        related.insert(RelationType::Children, None);
        Record::new("1", "u1").with_related(related)
    }

    fn configs() -> Vec<PanelConfig> {
        vec![
            PanelConfig::new("onlines")
                .with_filter("protocol:OGC:.*|ESRI:.*")
                .with_title("API"),
            PanelConfig::new("onlines")
                .with_filter("protocol:.*DOWNLOAD.*")
                .with_title("download"),
            PanelConfig::new("onlines")
                .with_filter("-protocol:OGC:.*|ESRI:.*|.*DOWNLOAD.*")
                .with_title("links"),
        ]
    }

    fn ids(section: &Section) -> Vec<&str> {
        section
            .links
            .iter()
            .flatten()
            .filter_map(|l| l.attribute("id"))
            .collect()
    }

    #[test]
    fn tabset_splits_one_type_by_filters() {
        let sections = build_sections(&record(), &configs(), DisplayMode::Tabset).expect("build");

        assert_eq!(sections.len(), 3);
        assert_eq!(ids(&sections[0]), vec!["wms"]);
        assert_eq!(ids(&sections[1]), vec!["zip"]);
        assert_eq!(ids(&sections[2]), vec!["home"]);
        assert!(sections.iter().all(|s| s.found));
    }

    #[test]
    fn stacked_mode_ignores_filters() {
        let sections = build_sections(&record(), &configs(), DisplayMode::Stacked).expect("build");
        assert!(sections.iter().all(|s| ids(s).len() == 3));
    }

    #[test]
    fn missing_and_null_types_are_not_found() {
        let configs = vec![PanelConfig::new("children|siblings").with_title("family")];
        let sections = build_sections(&record(), &configs, DisplayMode::Tabset).expect("build");

        assert_eq!(sections.len(), 2);
        assert!(sections.iter().all(|s| s.links.is_none() && !s.found));
    }

    #[test]
    fn malformed_filter_fails_in_tabset_mode() {
        let configs = vec![PanelConfig::new("onlines").with_filter("protocol:(")];
        assert!(build_sections(&record(), &configs, DisplayMode::Tabset).is_err());
        assert!(build_sections(&record(), &configs, DisplayMode::Stacked).is_ok());
    }
}
