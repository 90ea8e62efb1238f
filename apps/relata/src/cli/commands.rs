//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::parse_type_list;
use crate::batch::BatchResolver;
use crate::client::RelatedClient;
use crate::fetcher::RelationFetcher;
use crate::presenter::{PanelPresenter, PanelSnapshot, PanelState};
use crate::settings::Settings;
use relata_core::{
    Aggregation, BatchRelations, Cell, DisplayMode, Identifier, Link, LinkTypeTable, PanelConfig,
    Record, RelataError, RelatedObserver, RelatedWithStats, RelationType, TableHeaders,
    build_sections, evaluate, join_types, parse_columns, project,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE INPUT
// =============================================================================

/// Maximum input file size (50 MB).
const MAX_INPUT_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Canonicalize `path` and make sure it is a regular file of sane size.
fn validate_input_path(path: &Path) -> Result<PathBuf, RelataError> {
    let canonical = path.canonicalize().map_err(|e| {
        RelataError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RelataError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| RelataError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(RelataError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_INPUT_FILE_SIZE
        )));
    }

    Ok(canonical)
}

/// Read and decode a JSON input file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RelataError> {
    let validated = validate_input_path(path)?;
    let contents = std::fs::read(&validated)
        .map_err(|e| RelataError::Io(format!("Read file: {}", e)))?;
    serde_json::from_slice(&contents)
        .map_err(|e| RelataError::Deserialization(format!("{}: {}", path.display(), e)))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn catalog_client(settings: &Settings) -> Result<RelatedClient, RelataError> {
    RelatedClient::from_settings(&settings.catalog).map_err(|e| RelataError::Config(e.to_string()))
}

/// One line describing a link: display type, title and URL.
fn describe_link(table: &LinkTypeTable, link: &Link, relation_type: &RelationType, lang: &str) -> String {
    let main_type = table.main_type(link, relation_type);
    let title = match link.display_title(lang) {
        "" => link.attribute("id").unwrap_or("?"),
        title => title,
    };
    let mut line = format!("[{}] {}", main_type, title);
    if let Some(badge) = table.badge_label(&main_type, link) {
        line.push_str(&format!(" <{}>", badge));
    }
    if let Some(url) = link.url.as_ref().and_then(|u| u.resolve(lang)) {
        line.push_str(&format!(" - {}", url));
    }
    line
}

// =============================================================================
// RELATED COMMAND
// =============================================================================

/// Panel configuration for `related`: a configured panel or one built from
/// `--types`/`--filter`.
///
/// A filter that does not parse is left to the presenter, which logs it and
/// shows unfiltered results.
fn related_panel(
    settings: &Settings,
    types: &str,
    filter: Option<&str>,
    panel: Option<&str>,
) -> Result<PanelConfig, RelataError> {
    let config = match panel {
        Some(title) => settings
            .panel(title)
            .cloned()
            .ok_or_else(|| RelataError::Config(format!("No panel titled '{}'", title)))?,
        None => {
            let mut config =
                PanelConfig::new(join_types(&parse_type_list(types))).with_title("related");
            if let Some(filter) = filter {
                config = config.with_filter(filter);
            }
            config
        }
    };
    if config.relation_types().is_empty() {
        return Err(RelataError::Config(format!(
            "panel '{}' requests no relation types",
            config.title
        )));
    }
    Ok(config)
}

/// Load one record's related resources through a panel presenter.
pub async fn cmd_related(
    settings: &Settings,
    json_mode: bool,
    record: &str,
    types: &str,
    filter: Option<&str>,
    panel: Option<&str>,
) -> Result<(), RelataError> {
    let config = related_panel(settings, types, filter, panel)?;

    let observer = RelatedObserver::new();
    let mut presenter = PanelPresenter::new(config, RelationFetcher::new(catalog_client(settings)?))
        .with_observer(&observer);
    let mut rx = presenter.subscribe();

    tracing::info!(record, "loading related resources");
    presenter.bind(&Record {
        id: Some(Identifier::new(record)),
        ..Record::default()
    });

    let snapshot: PanelSnapshot = rx
        .wait_for(|s| matches!(s.state, PanelState::Loaded | PanelState::Failed))
        .await
        .map_err(|e| RelataError::Io(e.to_string()))?
        .clone();

    if let Some(error) = snapshot.error {
        return Err(error);
    }

    if json_mode {
        let output = serde_json::json!({
            "record": record,
            "found": snapshot.found,
            "relations": snapshot.relations,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Related resources of {}", record);
    println!("==========================");
    if !snapshot.found {
        println!("No related resources.");
        return Ok(());
    }

    let table = settings.link_table()?;
    for (relation_type, links) in &snapshot.relations {
        if links.is_empty() {
            continue;
        }
        println!();
        println!("{} ({})", relation_type, links.len());
        let visible = snapshot.window.visible(relation_type, links.len());
        for link in links.iter().take(visible) {
            println!(
                "  {}",
                describe_link(&table, link, relation_type, &settings.catalog.lang)
            );
        }
        if snapshot.window.is_truncated(relation_type, links.len()) {
            println!("  ... {} more", links.len() - visible);
        }
    }

    Ok(())
}

// =============================================================================
// BATCH / BULK COMMANDS
// =============================================================================

/// Related records of several records in one multi-search.
pub async fn cmd_batch(
    settings: &Settings,
    json_mode: bool,
    uuids: &[String],
    types: &str,
) -> Result<(), RelataError> {
    let types = parse_type_list(types);
    let records: Vec<Record> = uuids
        .iter()
        .map(|uuid| Record {
            uuid: uuid.clone(),
            ..Record::default()
        })
        .collect();

    let resolver = BatchResolver::new(catalog_client(settings)?);
    let related = resolver.resolve(&records, &types).await?;
    print_batch(settings, json_mode, &related);
    Ok(())
}

/// Related records of several records through the bulk endpoint.
pub async fn cmd_bulk(
    settings: &Settings,
    json_mode: bool,
    uuids: &[String],
    types: &str,
) -> Result<(), RelataError> {
    let types = parse_type_list(types);
    let resolver = BatchResolver::new(catalog_client(settings)?);
    let related = resolver.resolve_bulk(uuids, &types).await?;
    print_batch(settings, json_mode, &related);
    Ok(())
}

fn print_batch(settings: &Settings, json_mode: bool, related: &BatchRelations) {
    if json_mode {
        print_json(&serde_json::json!(related));
        return;
    }

    for (uuid, groups) in related {
        println!("{}", uuid);
        for (relation_type, links) in groups {
            match links {
                Some(links) => {
                    println!("  {} ({})", relation_type, links.len());
                    for link in links {
                        let title = link.display_title(&settings.catalog.lang);
                        let id = link.attribute("id").unwrap_or("?");
                        println!("    {} {}", id, title);
                    }
                }
                None => println!("  {} (none)", relation_type),
            }
        }
    }
}

// =============================================================================
// TABLE COMMAND
// =============================================================================

fn cell_json(cell: &Cell) -> serde_json::Value {
    match cell {
        Cell::Value(value) => value.clone(),
        Cell::Links(links) => serde_json::json!(links),
        Cell::Missing => serde_json::Value::Null,
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Value(serde_json::Value::String(s)) => s.clone(),
        Cell::Value(value) => value.to_string(),
        Cell::Links(links) => links
            .iter()
            .filter_map(|l| l.url.as_ref().and_then(|u| u.as_plain()))
            .collect::<Vec<_>>()
            .join(" "),
        Cell::Missing => String::new(),
    }
}

/// Project records onto columns, sorted by the first one.
pub fn cmd_table(
    json_mode: bool,
    input: &Path,
    columns: &str,
    labels: Option<&str>,
) -> Result<(), RelataError> {
    let records: Vec<Record> = read_json(input)?;
    let columns = parse_columns(columns);
    let headers = TableHeaders::from_columns(&columns, labels);
    let rows = project(&records, &columns)?;

    if json_mode {
        let rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "uuid": row.record.uuid,
                    "cells": row.cells.iter().map(cell_json).collect::<Vec<_>>(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "headers": headers.0, "rows": rows }));
        return Ok(());
    }

    println!("{}", headers.0.join("\t"));
    for row in &rows {
        let cells: Vec<String> = row.cells.iter().map(cell_text).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

// =============================================================================
// FILTER COMMAND
// =============================================================================

/// Apply a filter expression to links read from a file.
pub fn cmd_filter(
    settings: &Settings,
    json_mode: bool,
    input: &Path,
    expr: &str,
) -> Result<(), RelataError> {
    let links: Vec<Link> = read_json(input)?;
    let kept = evaluate(&links, expr)?;
    tracing::debug!(expr, total = links.len(), kept = kept.len(), "filter applied");

    if json_mode {
        print_json(&serde_json::json!(kept));
        return Ok(());
    }

    let table = settings.link_table()?;
    println!("{} of {} links match '{}'", kept.len(), links.len(), expr);
    for link in &kept {
        println!(
            "  {}",
            describe_link(&table, link, &RelationType::Onlines, &settings.catalog.lang)
        );
    }
    Ok(())
}

// =============================================================================
// SECTIONS COMMAND
// =============================================================================

fn parse_mode(mode: &str) -> Result<DisplayMode, RelataError> {
    match mode {
        "stacked" => Ok(DisplayMode::Stacked),
        "tabset" => Ok(DisplayMode::Tabset),
        other => Err(RelataError::Config(format!(
            "Unknown display mode '{}' (expected stacked or tabset)",
            other
        ))),
    }
}

/// Sections of the configured panels for a record with embedded relations.
pub fn cmd_sections(
    settings: &Settings,
    json_mode: bool,
    input: &Path,
    mode: &str,
) -> Result<(), RelataError> {
    if settings.panels.is_empty() {
        return Err(RelataError::Config("No panels configured".to_string()));
    }
    let mode = parse_mode(mode)?;
    let record: Record = read_json(input)?;
    let sections = build_sections(&record, &settings.panels, mode)?;

    if json_mode {
        let output: Vec<serde_json::Value> = sections
            .iter()
            .map(|s| {
                serde_json::json!({
                    "title": s.title,
                    "type": s.relation_type,
                    "found": s.found,
                    "links": s.links,
                })
            })
            .collect();
        print_json(&serde_json::json!(output));
        return Ok(());
    }

    let table = settings.link_table()?;
    for section in &sections {
        let count = section.links.as_ref().map_or(0, Vec::len);
        println!("{} / {} ({})", section.title, section.relation_type, count);
        for link in section.links.iter().flatten() {
            println!(
                "  {}",
                describe_link(&table, link, &section.relation_type, &settings.catalog.lang)
            );
        }
    }
    Ok(())
}

// =============================================================================
// FACETS COMMAND
// =============================================================================

/// Children and their aggregations, as returned by a children search.
#[derive(Debug, Deserialize)]
pub struct FacetInput {
    pub children: Vec<Record>,
    #[serde(default)]
    pub aggregations: BTreeMap<String, Aggregation>,
    #[serde(default)]
    pub filters: Option<Vec<String>>,
    #[serde(default)]
    pub sort_by: Option<String>,
}

/// Narrow children by facet selections (`key=value`), in order.
pub fn cmd_facets(json_mode: bool, input: &Path, select: &[String]) -> Result<(), RelataError> {
    let input: FacetInput = read_json(input)?;
    let mut view = RelatedWithStats::new(
        input.children,
        input.aggregations,
        input.filters,
        input.sort_by,
    );

    for selection in select {
        let (key, value) = selection.split_once('=').ok_or_else(|| {
            RelataError::Config(format!("Facet selection '{}' is not key=value", selection))
        })?;
        view.filter_by(key, value);
    }

    let displayed = view.displayed();
    if json_mode {
        let output = serde_json::json!({
            "filters": view.filters(),
            "current": view.current(),
            "records": displayed,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Facets: {}", view.filters().join(", "));
    if let Some(current) = view.current() {
        println!("Active: {}", current);
    }
    println!("{} records", displayed.len());
    for record in displayed {
        let title = record
            .value("resourceTitle")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        println!("  {} {}", record.uuid, title);
    }
    Ok(())
}

// =============================================================================
// PANELS COMMAND
// =============================================================================

/// List configured panels.
pub fn cmd_panels(settings: &Settings, json_mode: bool) -> Result<(), RelataError> {
    if json_mode {
        print_json(&serde_json::json!({
            "catalog": settings.catalog.url,
            "panels": settings.panels,
        }));
        return Ok(());
    }

    println!("Relata Panels");
    println!("=============");
    println!("Catalog: {}", settings.catalog.url);
    println!();
    if settings.panels.is_empty() {
        println!("No panels configured.");
        return Ok(());
    }
    for panel in &settings.panels {
        let title = if panel.title.is_empty() { "(untitled)" } else { &panel.title };
        println!("{}", title);
        println!("  Types:  {}", panel.types);
        if let Some(filter) = &panel.filter {
            println!("  Filter: {}", filter);
        }
        println!("  Mode:   {:?} / {:?}", panel.mode, panel.layout);
        if let Some(size) = panel.size {
            println!("  Size:   {}", size);
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn json_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn related_panel_keeps_a_malformed_filter_for_the_presenter() {
        let settings = Settings::default();
        let config = related_panel(&settings, "onlines", Some("protocol:("), None)
            .expect("panel");
        assert_eq!(config.filter.as_deref(), Some("protocol:("));
        assert_eq!(config.relation_types(), vec![RelationType::Onlines]);
    }

    #[test]
    fn related_panel_needs_relation_types() {
        let settings = Settings::default();
        assert!(matches!(
            related_panel(&settings, "", None, None),
            Err(RelataError::Config(_))
        ));
        assert!(matches!(
            related_panel(&settings, "onlines", None, Some("Missing")),
            Err(RelataError::Config(_))
        ));
    }

    #[test]
    fn read_json_rejects_directories() {
        let dir = tempfile::tempdir().expect("dir");
        let err = read_json::<Vec<Link>>(dir.path()).expect_err("directory");
        assert!(matches!(err, RelataError::Io(_)));
    }

    #[test]
    fn read_json_reports_bad_payloads() {
        let file = json_file("{not json");
        let err = read_json::<Vec<Link>>(file.path()).expect_err("bad json");
        assert!(matches!(err, RelataError::Deserialization(_)));
    }

    #[test]
    fn filter_command_runs_on_a_file() {
        let file = json_file(
            r#"[{"id": "a", "protocol": "OGC:WMS"}, {"id": "b", "protocol": "WWW:LINK"}]"#,
        );
        let settings = Settings::default();
        assert!(cmd_filter(&settings, true, file.path(), "protocol:OGC").is_ok());
        assert!(matches!(
            cmd_filter(&settings, true, file.path(), "protocol:("),
            Err(RelataError::MalformedFilter { .. })
        ));
    }

    #[test]
    fn table_command_surfaces_sort_errors() {
        let file = json_file(r#"[{"uuid": "a", "year": 2020}, {"uuid": "b", "year": 2021}]"#);
        assert!(matches!(
            cmd_table(true, file.path(), "year", None),
            Err(RelataError::ProjectionSort { .. })
        ));
        assert!(cmd_table(false, file.path(), "uuid,year", Some("Id,Year")).is_ok());
    }

    #[test]
    fn sections_need_panels_and_a_known_mode() {
        let file = json_file(r#"{"uuid": "a", "relatedRecords": {"onlines": []}}"#);
        let mut settings = Settings::default();
        assert!(matches!(
            cmd_sections(&settings, true, file.path(), "stacked"),
            Err(RelataError::Config(_))
        ));

        settings.panels.push(PanelConfig::new("onlines").with_title("Links"));
        assert!(cmd_sections(&settings, true, file.path(), "tabset").is_ok());
        assert!(matches!(
            cmd_sections(&settings, true, file.path(), "grid"),
            Err(RelataError::Config(_))
        ));
    }

    #[test]
    fn facets_require_key_value_selections() {
        let file = json_file(
            r#"{
                "children": [{"id": "1", "uuid": "a"}, {"id": "2", "uuid": "b"}],
                "aggregations": {
                    "format": {"buckets": [
                        {"key": "csv", "docs": {"hits": {"hits": [{"_id": "1"}]}}}
                    ]}
                }
            }"#,
        );
        assert!(cmd_facets(false, file.path(), &["format=csv".to_string()]).is_ok());
        assert!(matches!(
            cmd_facets(false, file.path(), &["format".to_string()]),
            Err(RelataError::Config(_))
        ));
    }

    #[test]
    fn describe_link_prefers_titles_over_ids() {
        let table = LinkTypeTable::default();
        let link = Link::new("42")
            .with_protocol("OGC:WMS")
            .with_title("Rivers")
            .with_url("https://example.org/wms");
        let line = describe_link(&table, &link, &RelationType::Onlines, "eng");
        assert!(line.contains("Rivers"));
        assert!(line.contains("https://example.org/wms"));

        let untitled = describe_link(&table, &Link::new("42"), &RelationType::Onlines, "eng");
        assert!(untitled.contains("42"));
    }
}
