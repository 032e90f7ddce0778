//! Incident collection: paginated window fetch, acknowledgment enrichment,
//! and the search primitives used by the note tool.
//!
//! Everything here is strictly sequential: one request in flight at a time,
//! with a fixed inter-request delay in the enrichment loop as rate-limit
//! courtesy toward the external API.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{AckEvent, Incident, IncidentStatus};

/// Fixed page size for the listing endpoint.
pub const PAGE_LIMIT: u32 = 100;

/// Delay between per-incident log entry fetches, in milliseconds.
pub const ENRICH_DELAY_MS: u64 = 50;

/// Lookback window for deduplication-key searches.
///
/// Together with [`DEDUP_SEARCH_MAX_OFFSET`] this bounds the API cost of a
/// search; both are unverified tradeoffs between completeness and call
/// volume rather than documented API limits.
pub const DEDUP_SEARCH_LOOKBACK_DAYS: i64 = 7;

/// Offset cap for deduplication-key searches.
pub const DEDUP_SEARCH_MAX_OFFSET: u32 = 500;

/// Lookback window for title searches.
pub const TITLE_SEARCH_LOOKBACK_DAYS: i64 = 7;

/// Fetch every incident created in `[since, until]`, across all statuses.
///
/// Pages of [`PAGE_LIMIT`] records are requested until the API reports no
/// further pages. A page-fetch error terminates pagination with whatever has
/// accumulated so far; an empty or short result is a valid-but-incomplete
/// outcome, not a hard error.
pub async fn fetch_incidents(
    client: &ApiClient,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Vec<Incident> {
    let mut incidents = Vec::new();
    let mut offset = 0;

    loop {
        let page = match client
            .list_incidents_page(since, until, offset, PAGE_LIMIT, &IncidentStatus::ALL)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(offset, error = %e, "page fetch failed; returning partial result");
                break;
            }
        };

        let more = page.more;
        incidents.extend(page.incidents);
        info!(retrieved = incidents.len(), "fetched incident page");

        if !more {
            break;
        }
        offset += PAGE_LIMIT;
    }

    incidents
}

/// Attach the first acknowledgement event to each incident.
///
/// One activity-log call per incident, throttled by [`ENRICH_DELAY_MS`]. The
/// earliest acknowledge-type entry wins. A failed lookup is skipped and the
/// incident proceeds without enrichment; it never aborts the batch.
///
/// This materially changes acknowledgment-latency results versus the listing
/// endpoint's summary field, which does not reliably expose the first
/// acknowledgement event.
pub async fn enrich_acknowledgments(client: &ApiClient, incidents: &mut [Incident]) {
    let total = incidents.len();

    for (index, incident) in incidents.iter_mut().enumerate() {
        if index > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(ENRICH_DELAY_MS)).await;
        }

        let entries = match client.list_log_entries(&incident.id).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(incident = %incident.id, error = %e, "log entry fetch failed; skipping");
                continue;
            }
        };

        let first_ack = entries
            .iter()
            .filter(|e| e.is_acknowledgement())
            .filter_map(|e| e.created_at.map(|at| (at, e)))
            .min_by_key(|(at, _)| *at);

        if let Some((at, entry)) = first_ack {
            let actor = entry
                .agent
                .as_ref()
                .map(|a| a.summary.clone())
                .unwrap_or_default();
            incident.first_ack = Some(AckEvent { at, actor });
        }

        if (index + 1) % 25 == 0 || index + 1 == total {
            info!(enriched = index + 1, total, "acknowledgment enrichment progress");
        }
    }
}

/// Find the incident whose triggering event carried `dedup_key`.
///
/// Scans the last [`DEDUP_SEARCH_LOOKBACK_DAYS`] days page by page, stopping
/// at [`DEDUP_SEARCH_MAX_OFFSET`]. A key that only exists beyond the cap is
/// reported as not found.
pub async fn find_by_dedup_key(
    client: &ApiClient,
    dedup_key: &str,
) -> Result<Option<Incident>, ApiError> {
    let until = Utc::now();
    let since = until - Duration::days(DEDUP_SEARCH_LOOKBACK_DAYS);
    let mut offset = 0;

    while offset < DEDUP_SEARCH_MAX_OFFSET {
        let page = client
            .list_incidents_page(since, until, offset, PAGE_LIMIT, &IncidentStatus::ALL)
            .await?;

        let more = page.more;
        if let Some(found) = page
            .incidents
            .into_iter()
            .find(|i| i.dedup_key() == Some(dedup_key))
        {
            return Ok(Some(found));
        }

        if !more {
            break;
        }
        offset += PAGE_LIMIT;
    }

    Ok(None)
}

/// Find recent incidents whose title contains `term` (case-insensitive).
///
/// Resolved incidents are filtered out locally unless `include_resolved` is
/// set; server-side status filtering is never relied on. Results are sorted
/// most-recent-created first, which is also the tie-break when a caller
/// needs a single match.
pub async fn search_by_title(
    client: &ApiClient,
    term: &str,
    include_resolved: bool,
) -> Result<Vec<Incident>, ApiError> {
    let until = Utc::now();
    let since = until - Duration::days(TITLE_SEARCH_LOOKBACK_DAYS);
    let needle = term.to_lowercase();

    let statuses: &[IncidentStatus] = if include_resolved {
        &IncidentStatus::ALL
    } else {
        &[IncidentStatus::Triggered, IncidentStatus::Acknowledged]
    };

    let mut matches = Vec::new();
    let mut offset = 0;

    loop {
        let page = client
            .list_incidents_page(since, until, offset, PAGE_LIMIT, statuses)
            .await?;

        let more = page.more;
        matches.extend(page.incidents.into_iter().filter(|i| {
            let status_ok = include_resolved || i.status != IncidentStatus::Resolved;
            status_ok && i.title.to_lowercase().contains(&needle)
        }));

        if !more {
            break;
        }
        offset += PAGE_LIMIT;
    }

    matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(matches)
}
