//! Pagination engine.
//!
//! A find call issues strictly sequential rounds against an
//! [`ExecutionPort`]: round `k + 1` forwards the bookmark of round `k`
//! verbatim. Rows are concatenated in round order and never re-sorted, since
//! the backend already returns each round in the requested order.
//!
//! The set is treated as exhausted when a round returns fewer rows than
//! requested, or when the bookmark comes back empty or unchanged. With a
//! limit, the engine stops as soon as the limit is reached and never issues
//! a trailing round just to confirm exhaustion.

mod result_set;

pub use result_set::{ResultSet, Row};

use selector_core::{FindRequest, Pagination, QueryOptions, Selector};

use crate::port::ExecutionPort;

/// Runs `selector` with `options` against `database`.
///
/// Transport and backend failures do not abort with an `Err`: they end the
/// pagination and are attached to the returned [`ResultSet`] together with
/// the rows of every earlier round.
pub async fn find<P>(
    port: &P,
    database: &str,
    selector: &Selector,
    options: &QueryOptions,
) -> ResultSet
where
    P: ExecutionPort + ?Sized,
{
    let limits = port.limits();
    let (target, single_round) = match options.pagination() {
        Pagination::SingleRound => (limits.max_page_size, true),
        Pagination::UpTo(n) => (n, false),
        Pagination::Exhaust => (limits.fetch_ceiling, false),
    };

    let mut result = ResultSet::default();
    if target == 0 {
        return result;
    }

    tracing::debug!("find in '{}': {} (target {})", database, selector, target);

    let base = FindRequest::new(selector, options);
    let mut bookmark: Option<String> = None;
    let mut round = 0usize;

    loop {
        round += 1;
        let remaining = target - result.len();
        let page_size = remaining.min(limits.max_page_size);
        let request = base.for_round(page_size, bookmark.as_deref());

        let page = match port.execute(database, &request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("find round {} in '{}' failed: {}", round, database, e);
                result.fail(e);
                break;
            }
        };

        if let Some(warning) = page.warning {
            tracing::warn!("find round {} in '{}': {}", round, database, warning);
            result.push_warning(warning);
        }

        let returned = page.docs.len();
        let mut docs = page.docs;
        if returned > remaining {
            tracing::warn!(
                "find round {} returned {} rows for a page of {}, truncating",
                round,
                returned,
                page_size
            );
            docs.truncate(remaining);
        }
        result.push_page(docs);
        tracing::debug!(
            "find round {} in '{}': requested {}, returned {}",
            round,
            database,
            page_size,
            returned
        );

        let next = page.bookmark;
        let exhausted = returned < page_size
            || next.as_deref().map_or(true, str::is_empty)
            || next == bookmark;
        result.set_bookmark(next.clone());

        if single_round || exhausted || result.len() >= target {
            break;
        }
        bookmark = next;
    }

    tracing::info!(
        "find in '{}' finished: {} rows in {} rounds{}",
        database,
        result.len(),
        round,
        if result.is_ok() { "" } else { " (with error)" }
    );
    result
}
