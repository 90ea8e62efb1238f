//! # Batch Resolver
//!
//! Related records for many records at once, in a single round trip.

use crate::client::RelatedClient;
use relata_core::{BatchRelations, MultiSearchPlan, Record, RelataError, RelationType, join_types};

/// Resolves relations for a list of records.
#[derive(Clone)]
pub struct BatchResolver {
    client: RelatedClient,
}

impl BatchResolver {
    pub fn new(client: RelatedClient) -> Self {
        Self { client }
    }

    /// One multi-search sub-query per (type, record) pair.
    ///
    /// The batch fails as a whole when the request fails or any sub-query
    /// reports an error. Records with no hits map to absent groups.
    pub async fn resolve(
        &self,
        records: &[Record],
        types: &[RelationType],
    ) -> Result<BatchRelations, RelataError> {
        let plan = MultiSearchPlan::build(records, types);
        if plan.is_empty() {
            return Ok(BatchRelations::new());
        }

        tracing::debug!(
            records = records.len(),
            types = %join_types(types),
            queries = plan.len(),
            "resolving relations in batch"
        );
        let response = self
            .client
            .msearch(plan.body())
            .await
            .map_err(|e| RelataError::BatchResolve(e.to_string()))?;

        plan.reassemble(response)
    }

    /// The same lookup through the bulk related endpoint.
    pub async fn resolve_bulk(
        &self,
        uuids: &[String],
        types: &[RelationType],
    ) -> Result<BatchRelations, RelataError> {
        if uuids.is_empty() {
            return Ok(BatchRelations::new());
        }
        self.client
            .related_bulk(uuids, types)
            .await
            .map_err(|e| RelataError::BatchResolve(e.to_string()))
    }
}
