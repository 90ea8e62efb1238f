//! # Aggregate Module
//!
//! Merges fetched (or embedded) relation groups into the per-record structure
//! a panel displays.
//!
//! - Absent incoming values are skipped, present ones replace the stored group
//! - The optional filter is applied to every present group
//! - `associated` is folded into `siblings` once all groups are merged

use crate::filter::FilterExpression;
use crate::{IncomingRelations, Link, RelationType, Relations};

/// Relation aggregator for one panel configuration.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    filter: Option<FilterExpression>,
}

impl Aggregator {
    /// Aggregator without a filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator applying `filter` to every incoming group.
    #[must_use]
    pub fn with_filter(filter: FilterExpression) -> Self {
        Self {
            filter: Some(filter),
        }
    }

    /// The configured filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&FilterExpression> {
        self.filter.as_ref()
    }

    /// Merge `incoming` into `current`.
    ///
    /// Returns the "relation found" flag: true iff at least one group in
    /// `current` is non-empty afterwards.
    pub fn aggregate(&self, current: &mut Relations, incoming: IncomingRelations) -> bool {
        for (relation_type, value) in incoming {
            let Some(links) = value else {
                continue;
            };

            let slot = current.entry(relation_type).or_default();
            *slot = match &self.filter {
                Some(filter) => filter.apply(&links),
                None => links,
            };
        }

        reconcile_siblings(current);
        relation_found(current)
    }
}

/// Fold `associated` into `siblings`.
///
/// Every associated link whose id is not already among the siblings is appended
/// in associated order; `associated` is left empty. Nothing happens unless both
/// groups are present.
pub fn reconcile_siblings(relations: &mut Relations) {
    if !relations.contains_key(&RelationType::Siblings) {
        return;
    }
    let Some(associated) = relations.get_mut(&RelationType::Associated) else {
        return;
    };
    let associated = std::mem::take(associated);

    let siblings = relations.entry(RelationType::Siblings).or_default();
    for link in associated {
        if !contains_link(siblings, &link) {
            siblings.push(link);
        }
    }
}

fn contains_link(links: &[Link], candidate: &Link) -> bool {
    links.iter().any(|l| l.id == candidate.id)
}

/// True iff any group holds at least one link.
#[must_use]
pub fn relation_found(relations: &Relations) -> bool {
    relations.values().any(|links| !links.is_empty())
}

// =============================================================================
// TESTS
// =============================================================================
