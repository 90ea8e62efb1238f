//! # relata
//!
//! The network-facing side of Relata: everything that talks to a catalog.
//!
//! - `client` - HTTP client for the related, bulk related and multi-search endpoints
//! - `fetcher` - cancellable per-record relation lookups
//! - `presenter` - one panel bound to one record, latest bind wins
//! - `batch` - related records of many records in one round trip
//! - `settings` - TOML settings with environment overrides
//! - `cli` - the `relata` command line

pub mod batch;
pub mod cli;
pub mod client;
pub mod fetcher;
pub mod presenter;
pub mod settings;

pub use batch::BatchResolver;
pub use client::{ClientError, RelatedClient};
pub use fetcher::{CancellableFetch, RelationFetcher, RelationSource};
pub use presenter::{PanelPresenter, PanelSnapshot, PanelState};
pub use settings::{CatalogSettings, Settings};
