//! # Relata CLI Module
//!
//! This module implements the CLI interface for Relata.
//!
//! ## Available Commands
//!
//! - `related` - Load the related resources panel of one record
//! - `batch` - Related records of many records in one multi-search
//! - `bulk` - Related records of many records through the bulk endpoint
//! - `table` - Project records from a file onto columns
//! - `filter` - Apply a filter expression to links from a file
//! - `sections` - Container sections of a record with embedded relations
//! - `facets` - Narrow a children list by aggregation buckets
//! - `panels` - List configured panels

mod commands;

use crate::settings::Settings;
use clap::{Parser, Subcommand};
use relata_core::{RelataError, RelationType, parse_types};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Relata - related resources for metadata catalogs
///
/// Loads, filters and aggregates the records related to a catalog record:
/// parents, children, services, datasets, siblings and online resources.
#[derive(Parser, Debug)]
#[command(name = "relata")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the settings file (defaults to relata.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the related resources of one record
    Related {
        /// Record id or uuid
        record: String,

        /// Relation types, pipe or comma separated
        #[arg(short, long, default_value = "parent|children|services|datasets|siblings")]
        types: String,

        /// Filter expression, e.g. "-protocol:OGC:.*"
        #[arg(short, long, allow_hyphen_values = true)]
        filter: Option<String>,

        /// Use the configured panel with this title instead of --types/--filter
        #[arg(short, long)]
        panel: Option<String>,
    },

    /// Related records of many records in one multi-search
    Batch {
        /// Record uuids
        #[arg(short, long = "uuid", required = true)]
        uuids: Vec<String>,

        /// Relation types, pipe or comma separated
        #[arg(short, long, default_value = "children|services")]
        types: String,
    },

    /// Related records of many records through the bulk related endpoint
    Bulk {
        /// Record uuids
        #[arg(short, long = "uuid", required = true)]
        uuids: Vec<String>,

        /// Relation types, pipe or comma separated
        #[arg(short, long, default_value = "children|services")]
        types: String,
    },

    /// Project records from a JSON file onto columns
    Table {
        /// JSON array of records
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated columns (`field`, `a.b.c` or `link/TYPE`)
        #[arg(long)]
        columns: String,

        /// Comma-separated header labels
        #[arg(short, long)]
        labels: Option<String>,
    },

    /// Apply a filter expression to links from a JSON file
    Filter {
        /// JSON array of links
        #[arg(short, long)]
        input: PathBuf,

        /// Filter expression
        #[arg(short, long, allow_hyphen_values = true)]
        expr: String,
    },

    /// Container sections of a record carrying embedded relations
    Sections {
        /// JSON record with `relatedRecords`
        #[arg(short, long)]
        input: PathBuf,

        /// Display mode (stacked, tabset)
        #[arg(short, long, default_value = "stacked")]
        mode: String,
    },

    /// Narrow a children list by aggregation buckets
    Facets {
        /// JSON object with `children` and `aggregations`
        #[arg(short, long)]
        input: PathBuf,

        /// Bucket selection as key=value, applied in order
        #[arg(short, long)]
        select: Vec<String>,
    },

    /// List configured panels
    Panels,
}

/// Relation types from a pipe- or comma-separated list.
pub fn parse_type_list(list: &str) -> Vec<RelationType> {
    parse_types(&list.replace(',', "|"))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RelataError> {
    let json_mode = cli.json_mode;
    let settings = Settings::load(cli.config.as_deref())?;
    if cli.verbose {
        tracing::info!(catalog = %settings.catalog.url, panels = settings.panels.len(), "settings loaded");
    }

    match cli.command {
        Some(Commands::Related {
            record,
            types,
            filter,
            panel,
        }) => {
            cmd_related(
                &settings,
                json_mode,
                &record,
                &types,
                filter.as_deref(),
                panel.as_deref(),
            )
            .await
        }
        Some(Commands::Batch { uuids, types }) => {
            cmd_batch(&settings, json_mode, &uuids, &types).await
        }
        Some(Commands::Bulk { uuids, types }) => {
            cmd_bulk(&settings, json_mode, &uuids, &types).await
        }
        Some(Commands::Table {
            input,
            columns,
            labels,
        }) => cmd_table(json_mode, &input, &columns, labels.as_deref()),
        Some(Commands::Filter { input, expr }) => cmd_filter(&settings, json_mode, &input, &expr),
        Some(Commands::Sections { input, mode }) => {
            cmd_sections(&settings, json_mode, &input, &mode)
        }
        Some(Commands::Facets { input, select }) => cmd_facets(json_mode, &input, &select),
        Some(Commands::Panels) | None => cmd_panels(&settings, json_mode),
    }
}
