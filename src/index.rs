use selector_core::{IndexRequest, IndexSpec};

use crate::error::FindResult;
use crate::port::{ExecutionPort, IndexOutcome, IndexResult};

/// Submits `spec` to `database`. Succeeds when the index was created or an
/// equivalent one already exists.
///
/// The backend may build the index lazily, so a query issued right after
/// this call is not guaranteed to use it yet.
pub async fn create_index<P>(port: &P, database: &str, spec: &IndexSpec) -> FindResult<IndexOutcome>
where
    P: ExecutionPort + ?Sized,
{
    let request = IndexRequest::from(spec);
    let outcome = port.create_index(database, &request).await?;
    match outcome.result {
        IndexResult::Created => tracing::info!(
            "Created index '{}' on {:?} in '{}'",
            outcome.name,
            spec.fields(),
            database
        ),
        IndexResult::Exists => tracing::debug!(
            "Index '{}' on {:?} already exists in '{}'",
            outcome.name,
            spec.fields(),
            database
        ),
    }
    Ok(outcome)
}
