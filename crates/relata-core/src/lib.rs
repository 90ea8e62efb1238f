//! # relata-core
//!
//! The deterministic relation engine for Relata - THE LOGIC.
//!
//! Given catalog records and the relation groups a backend returns for them,
//! this crate decides what a "related resources" panel shows:
//! - `filter` - declarative `[-]attribute:pattern` link filters
//! - `aggregate` - merging relation groups and folding `associated` into `siblings`
//! - `msearch` - planning batch lookups and mapping sub-results back to records
//! - `projector` / `stats` / `container` - view models for tables, facets and tabs
//! - `observer` - page-level "anything related?" bookkeeping
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network: fetching lives in the `relata` app crate
//! - NO logging: every failure is returned as a `RelataError`
//! - Deterministic: relation groups are kept in `BTreeMap`s, links in input order

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod collate;
pub mod container;
pub mod filter;
pub mod link_type;
pub mod msearch;
pub mod observer;
pub mod panel;
pub mod projector;
pub mod stats;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Identifier, IncomingRelations, Link, LocalizedText, Record, RelataError, RelationType,
    Relations, join_types, parse_types,
};

// =============================================================================
// RE-EXPORTS: Relation Pipeline
// =============================================================================

pub use aggregate::{Aggregator, reconcile_siblings, relation_found};
pub use filter::{FilterExpression, evaluate};
pub use msearch::{BatchRelations, MultiSearchPlan, MultiSearchResponse};
pub use observer::{CycleToken, ObserverSubscription, PanelId, RelatedObserver};
pub use panel::{DisplayMode, ItemWindow, Layout, PanelConfig};

// =============================================================================
// RE-EXPORTS: View Models
// =============================================================================

pub use collate::locale_compare;
pub use container::{Section, build_sections};
pub use link_type::{LinkTypeConfig, LinkTypeTable};
pub use projector::{Cell, Column, Row, TableHeaders, parse_columns, project};
pub use stats::{Aggregation, Bucket, RelatedWithStats};
