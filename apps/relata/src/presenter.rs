//! # Panel Presenter
//!
//! Drives one related-resources panel bound to a record.
//!
//! ## State machine
//!
//! ```text
//! Idle --bind--> Loading --ok--> Loaded
//!   |                    \--err--> Failed
//!   \--bind (embedded relations)--> Loaded
//! ```
//!
//! Every `bind` starts a new generation: the previous fetch is aborted and
//! relation data is replaced wholesale. A fetch only commits while its
//! generation is still the current one, so a late answer for an old record
//! can never overwrite the new one.
//!
//! State is published through a `tokio::sync::watch` channel.

use crate::fetcher::{RelationFetcher, RelationSource};
use relata_core::{
    Aggregator, CycleToken, Identifier, IncomingRelations, ItemWindow, ObserverSubscription,
    PanelConfig, Record, RelataError, RelatedObserver, RelationType, Relations,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Load state of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Everything a rendering layer needs to draw the panel.
#[derive(Debug, Clone, Default)]
pub struct PanelSnapshot {
    pub generation: u64,
    pub state: PanelState,
    /// The record the relations belong to.
    pub record: Option<Identifier>,
    pub relations: Relations,
    pub found: bool,
    /// Transient notice after a failed load.
    pub error: Option<RelataError>,
    pub window: ItemWindow,
}

/// Presenter for one panel.
pub struct PanelPresenter<S> {
    config: PanelConfig,
    types: Vec<RelationType>,
    aggregator: Aggregator,
    fetcher: RelationFetcher<S>,
    tx: watch::Sender<PanelSnapshot>,
    generation: u64,
    inflight: Option<JoinHandle<()>>,
    subscription: Option<Arc<ObserverSubscription>>,
    cycle: Option<CycleToken>,
}

impl<S: RelationSource> PanelPresenter<S> {
    /// Create a presenter for `config`.
    ///
    /// A malformed filter is logged and the panel falls back to unfiltered
    /// results.
    pub fn new(config: PanelConfig, fetcher: RelationFetcher<S>) -> Self {
        let aggregator = config.aggregator().unwrap_or_else(|e| {
            tracing::warn!(panel = %config.title, error = %e, "ignoring panel filter");
            Aggregator::new()
        });
        let (tx, _) = watch::channel(PanelSnapshot {
            window: ItemWindow::new(config.size),
            ..PanelSnapshot::default()
        });

        Self {
            types: config.relation_types(),
            config,
            aggregator,
            fetcher,
            tx,
            generation: 0,
            inflight: None,
            subscription: None,
            cycle: None,
        }
    }

    /// Report load cycles to `observer`.
    pub fn with_observer(mut self, observer: &RelatedObserver) -> Self {
        self.subscription = Some(Arc::new(observer.register()));
        self
    }

    /// The panel configuration.
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.tx.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> PanelSnapshot {
        self.tx.borrow().clone()
    }

    /// Bind the panel to `record`, replacing whatever it showed before.
    pub fn bind(&mut self, record: &Record) {
        self.abort_inflight();
        self.generation += 1;
        let generation = self.generation;

        if let Some(embedded) = &record.related_records {
            let incoming: IncomingRelations = self
                .types
                .iter()
                .map(|t| (t.clone(), embedded.get(t).cloned().flatten()))
                .collect();

            self.start_cycle();
            let mut snapshot = self.fresh_snapshot(generation, record.id.clone());
            snapshot.found = self.aggregator.aggregate(&mut snapshot.relations, incoming);
            snapshot.state = PanelState::Loaded;
            open_windows(&mut snapshot);
            let found = snapshot.found;
            self.tx.send_replace(snapshot);
            self.close_cycle(found);
            tracing::debug!(panel = %self.config.title, found, "relations read from record");
            return;
        }

        let Some(target) = request_target(record) else {
            self.tx
                .send_replace(self.fresh_snapshot(generation, record.id.clone()));
            self.close_cycle(false);
            return;
        };

        let mut snapshot = self.fresh_snapshot(generation, record.id.clone());
        snapshot.state = PanelState::Loading;
        self.tx.send_replace(snapshot);
        let cycle = self.start_cycle();

        tracing::debug!(panel = %self.config.title, record = %target, generation, "loading relations");
        let fetch = self.fetcher.fetch(&target, &self.types);
        let tx = self.tx.clone();
        let aggregator = self.aggregator.clone();
        let subscription = self.subscription.clone();
        let title = self.config.title.clone();

        self.inflight = Some(tokio::spawn(async move {
            let Some(result) = fetch.outcome().await else {
                return;
            };

            let mut committed = None;
            tx.send_if_modified(|snapshot| {
                if snapshot.generation != generation {
                    return false;
                }
                match result {
                    Ok(incoming) => {
                        snapshot.found = aggregator.aggregate(&mut snapshot.relations, incoming);
                        snapshot.state = PanelState::Loaded;
                        open_windows(snapshot);
                    }
                    Err(e) => {
                        tracing::warn!(panel = %title, error = %e, "related records unavailable");
                        snapshot.found = false;
                        snapshot.state = PanelState::Failed;
                        snapshot.error = Some(e);
                    }
                }
                committed = Some(snapshot.found);
                true
            });

            match (committed, subscription.zip(cycle)) {
                (Some(found), Some((sub, cycle))) => {
                    sub.finish(cycle, found);
                }
                (None, _) => tracing::debug!(generation, "dropped stale relations"),
                _ => {}
            }
        }));
    }

    /// Detach the panel from its record.
    pub fn unbind(&mut self) {
        self.abort_inflight();
        self.generation += 1;
        self.tx.send_replace(self.fresh_snapshot(self.generation, None));
        self.close_cycle(false);
    }

    /// Flip a relation type between its first items and all of them.
    pub fn toggle_all_items(&self, relation_type: &RelationType) {
        self.tx.send_modify(|snapshot| {
            let total = snapshot.relations.get(relation_type).map_or(0, Vec::len);
            snapshot.window.toggle(relation_type, total);
        });
    }

    fn fresh_snapshot(&self, generation: u64, record: Option<Identifier>) -> PanelSnapshot {
        PanelSnapshot {
            generation,
            record,
            window: ItemWindow::new(self.config.size),
            ..PanelSnapshot::default()
        }
    }

    fn start_cycle(&mut self) -> Option<CycleToken> {
        self.cycle = self.subscription.as_ref().map(|sub| sub.start());
        self.cycle
    }

    /// Finish the cycle this presenter started last, if it is still open.
    fn close_cycle(&mut self, found: bool) {
        if let (Some(sub), Some(cycle)) = (&self.subscription, self.cycle.take()) {
            sub.finish(cycle, found);
        }
    }

    fn abort_inflight(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }
}

impl<S> Drop for PanelPresenter<S> {
    fn drop(&mut self) {
        if let Some(task) = self.inflight.take() {
            task.abort();
        }
    }
}

/// Identifier to request relations for: the record id, else its uuid.
fn request_target(record: &Record) -> Option<String> {
    record
        .id
        .as_ref()
        .map(|id| id.0.clone())
        .or_else(|| (!record.uuid.is_empty()).then(|| record.uuid.clone()))
}

fn open_windows(snapshot: &mut PanelSnapshot) {
    for relation_type in snapshot.relations.keys() {
        snapshot.window.open(relation_type);
    }
}

// =============================================================================
// TESTS
// =============================================================================
