//! Integration tests for settings files.

use relata::Settings;
use relata_core::{DisplayMode, Layout, RelataError, RelationType};
use std::io::Write;

fn settings_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

#[test]
fn load_reads_panels_from_the_given_file() {
    let file = settings_file(
        r#"
        [catalog]
        timeout_secs = 10
        lang = "fre"

        [[panel]]
        title = "API"
        types = "onlines"
        filter = "protocol:OGC:.*|ESRI:.*|atom.*"
        mode = "tabset"
        layout = "card"
        size = 3

        [[panel]]
        title = "Download"
        types = "onlines"
        filter = "protocol:.*DOWNLOAD.*"
        mode = "tabset"
        "#,
    );

    let settings = Settings::load(Some(file.path())).expect("load");

    assert_eq!(settings.catalog.lang, "fre");
    assert_eq!(settings.panels.len(), 2);
    let api = settings.panel("API").expect("API panel");
    assert_eq!(api.mode, DisplayMode::Tabset);
    assert_eq!(api.layout, Layout::Card);
    assert_eq!(api.size, Some(3));
    assert_eq!(api.relation_types(), vec![RelationType::Onlines]);
    assert!(settings.panel("Other").is_none());
}

#[test]
fn load_drops_malformed_panel_filters() {
    let file = settings_file(
        r#"
        [[panel]]
        title = "API"
        types = "onlines"
        filter = "protocol:OGC:.*"

        [[panel]]
        title = "Broken"
        types = "onlines"
        filter = "protocol:("
        "#,
    );

    let settings = Settings::load(Some(file.path())).expect("load");

    assert_eq!(settings.panels.len(), 2);
    let api = settings.panel("API").expect("API panel");
    assert_eq!(api.filter.as_deref(), Some("protocol:OGC:.*"));
    let broken = settings.panel("Broken").expect("Broken panel");
    assert_eq!(broken.filter, None);
    assert_eq!(broken.relation_types(), vec![RelationType::Onlines]);
}

#[test]
fn load_rejects_panels_without_types() {
    let file = settings_file(
        r#"
        [[panel]]
        title = "Empty"
        types = ""
        "#,
    );
    assert!(matches!(
        Settings::load(Some(file.path())),
        Err(RelataError::Config(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("dir");
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        Settings::load(Some(&path)),
        Err(RelataError::Io(_))
    ));
}

#[test]
fn custom_link_types_replace_the_builtin_table() {
    let file = settings_file(
        r#"
        [[link_rules]]
        protocol = "^OGC:WMS"
        type = "MAP"

        [link_types.MAP]
        icon = "fa-map"
        badge = "Map"
        action = true
        layer = true
        "#,
    );

    let settings = Settings::load(Some(file.path())).expect("load");
    let table = settings.link_table().expect("table");
    let link = relata_core::Link::new("1").with_protocol("ogc:wms-1.3.0");

    let main_type = table.main_type(&link, &RelationType::Onlines);
    assert_eq!(main_type, "MAP");
    assert_eq!(table.icon(&main_type), "fa-map");
    assert!(table.has_action(&main_type));
    assert!(table.is_layer_protocol(&link));
}
