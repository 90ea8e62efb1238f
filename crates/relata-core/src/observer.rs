//! # Observer Module
//!
//! Page-level bookkeeping across several panels: is anything still loading,
//! and did any panel find related content?
//!
//! Panels register and get an `ObserverSubscription` back. The subscription
//! reports `start`/`finish` for each load cycle and unregisters the panel when
//! dropped. Bookkeeping is serialized behind one mutex, keyed by panel id.
//!
//! `start` hands out a `CycleToken`. Only the token of the panel's latest
//! cycle can finish it; a late `finish` from a superseded cycle is ignored.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifier of a panel within one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PanelId(pub u64);

/// Identifies one load cycle of one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleToken(u64);

#[derive(Debug, Default)]
struct ObserverState {
    next_id: u64,
    next_cycle: u64,
    registered: BTreeSet<PanelId>,
    pending: BTreeMap<PanelId, CycleToken>,
    results: BTreeMap<PanelId, bool>,
    cycles_started: u64,
    cycles_finished: u64,
    cycles_superseded: u64,
}

/// Point-in-time view of the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverSummary {
    pub registered: usize,
    pub loading: usize,
    pub has_related: bool,
    pub cycles_started: u64,
    pub cycles_finished: u64,
    pub cycles_superseded: u64,
}

/// Tracks the load state of many panels.
#[derive(Debug, Clone, Default)]
pub struct RelatedObserver {
    state: Arc<Mutex<ObserverState>>,
}

impl RelatedObserver {
    /// Create an empty observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ObserverState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new panel.
    #[must_use]
    pub fn register(&self) -> ObserverSubscription {
        let mut state = self.lock();
        let id = PanelId(state.next_id);
        state.next_id += 1;
        state.registered.insert(id);
        ObserverSubscription {
            observer: self.clone(),
            id,
        }
    }

    /// True while at least one registered panel is loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// True when a registered panel finished with related content.
    #[must_use]
    pub fn has_related(&self) -> bool {
        self.lock().results.values().any(|found| *found)
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn summary(&self) -> ObserverSummary {
        let state = self.lock();
        ObserverSummary {
            registered: state.registered.len(),
            loading: state.pending.len(),
            has_related: state.results.values().any(|found| *found),
            cycles_started: state.cycles_started,
            cycles_finished: state.cycles_finished,
            cycles_superseded: state.cycles_superseded,
        }
    }

    fn start(&self, id: PanelId) -> CycleToken {
        let mut state = self.lock();
        let token = CycleToken(state.next_cycle);
        state.next_cycle += 1;
        if !state.registered.contains(&id) {
            return token;
        }
        if state.pending.insert(id, token).is_some() {
            // A newer cycle replaces the one still in flight.
            state.cycles_superseded += 1;
        }
        state.results.remove(&id);
        state.cycles_started += 1;
        token
    }

    fn finish(&self, id: PanelId, token: CycleToken, found: bool) -> bool {
        let mut state = self.lock();
        if state.pending.get(&id) != Some(&token) {
            return false;
        }
        state.pending.remove(&id);
        state.results.insert(id, found);
        state.cycles_finished += 1;
        true
    }

    fn unregister(&self, id: PanelId) {
        let mut state = self.lock();
        state.registered.remove(&id);
        state.pending.remove(&id);
        state.results.remove(&id);
    }
}

/// Registration of one panel. Unregisters on drop.
#[derive(Debug)]
pub struct ObserverSubscription {
    observer: RelatedObserver,
    id: PanelId,
}

impl ObserverSubscription {
    /// The panel id assigned at registration.
    #[must_use]
    pub fn id(&self) -> PanelId {
        self.id
    }

    /// A load cycle begins. Pass the token back to `finish`.
    #[must_use = "the token is needed to finish the cycle"]
    pub fn start(&self) -> CycleToken {
        self.observer.start(self.id)
    }

    /// The cycle identified by `token` ended.
    ///
    /// Returns false, and changes nothing, unless `token` is the panel's
    /// pending cycle.
    pub fn finish(&self, token: CycleToken, found: bool) -> bool {
        self.observer.finish(self.id, token, found)
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        self.observer.unregister(self.id);
    }
}

// =============================================================================
// TESTS
// =============================================================================
