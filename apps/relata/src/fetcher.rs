//! # Relation Fetcher
//!
//! Cancellable per-record relation lookups.
//!
//! Every fetch runs in its own tokio task. Cancelling aborts that task, so the
//! network call is dropped and its result is never delivered.

use crate::client::RelatedClient;
use relata_core::{IncomingRelations, RelataError, RelationType, join_types};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Anything that can answer "what is related to this record?".
pub trait RelationSource: Send + Sync + 'static {
    /// Relation groups of `uuid_or_id` for the requested types.
    fn related(
        &self,
        uuid_or_id: &str,
        types: &[RelationType],
    ) -> impl Future<Output = Result<IncomingRelations, RelataError>> + Send;
}

impl RelationSource for RelatedClient {
    async fn related(
        &self,
        uuid_or_id: &str,
        types: &[RelationType],
    ) -> Result<IncomingRelations, RelataError> {
        RelatedClient::related(self, uuid_or_id, types)
            .await
            .map_err(|e| RelataError::RelationFetch {
                types: join_types(types),
                reason: e.to_string(),
            })
    }
}

/// Issues cancellable fetches against a shared source.
pub struct RelationFetcher<S> {
    source: Arc<S>,
}

impl<S> Clone for RelationFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: RelationSource> RelationFetcher<S> {
    /// Wrap a source.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Start fetching `types` for `uuid_or_id`.
    pub fn fetch(&self, uuid_or_id: &str, types: &[RelationType]) -> CancellableFetch {
        let source = Arc::clone(&self.source);
        let id = uuid_or_id.to_string();
        let requested = types.to_vec();
        let handle = tokio::spawn(async move { source.related(&id, &requested).await });

        CancellableFetch {
            handle: Some(handle),
            types: types.to_vec(),
        }
    }
}

/// Handle on one in-flight fetch. Dropping it cancels the fetch.
#[derive(Debug)]
pub struct CancellableFetch {
    handle: Option<JoinHandle<Result<IncomingRelations, RelataError>>>,
    types: Vec<RelationType>,
}

impl CancellableFetch {
    /// Abort the fetch. Its outcome will be `None`.
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Whether the underlying task has completed (or been aborted).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the result. `None` if the fetch was cancelled.
    pub async fn outcome(mut self) -> Option<Result<IncomingRelations, RelataError>> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => None,
            Err(e) => Some(Err(RelataError::RelationFetch {
                types: join_types(&self.types),
                reason: e.to_string(),
            })),
        }
    }
}

impl Drop for CancellableFetch {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// TESTS
// =============================================================================
