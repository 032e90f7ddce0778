//! Analytics aggregation over a fetched incident set.
//!
//! Pure functions of the input slice; no I/O. The total incident count is
//! fixed once at the top of [`summarize`] and every percentage is computed
//! against it.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::model::{Incident, IncidentStatus};

/// How many service groups the summary keeps.
pub const TOP_SERVICES: usize = 10;

/// How many client groups the summary keeps.
pub const TOP_CLIENTS: usize = 10;

/// How many alert-title groups the summary keeps.
pub const TOP_TITLES: usize = 15;

/// Acknowledgment latencies above this cap (7 days, in minutes) are treated
/// as clock-skew or data artifacts and excluded.
pub const ACK_OUTLIER_CAP_MINUTES: f64 = 10_080.0;

/// Bucket label for incidents with no extractable client name.
pub const UNKNOWN_CLIENT: &str = "Unknown Client";

/// Bucket label for incidents with no responder in any source list.
pub const UNASSIGNED: &str = "Unassigned";

/// Weekday labels in fixed Monday-first order.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One group in a top-N breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct GroupCount {
    /// Group label.
    pub name: String,

    /// Incidents in the group.
    pub count: usize,

    /// `round(100 * count / total, 2)` against the window total.
    pub percentage: f64,
}

/// Counts per lifecycle status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub triggered: usize,
    pub acknowledged: usize,
    pub resolved: usize,
}

impl StatusCounts {
    /// Sum across all statuses; always equals the window total.
    pub fn total(&self) -> usize {
        self.triggered + self.acknowledged + self.resolved
    }
}

/// Mean and median latency over the incidents that qualified.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    /// How many incidents contributed.
    pub count: usize,

    /// Mean latency in minutes.
    pub mean_minutes: f64,

    /// Lower-median latency in minutes: the value at index
    /// `floor(count / 2)` of the ascending-sorted list, not the textbook
    /// average-of-two-middles for even-sized sets.
    pub median_minutes: f64,
}

/// One day in the daily trend.
#[derive(Debug, Clone, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// One weekday bucket, Monday-first.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayCount {
    pub name: &'static str,
    pub count: usize,
}

/// The full analytics summary for one report run.
///
/// Derived and transient: computed once from the fetched set, consumed by
/// the renderer, and discarded.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    /// Incidents in the window, fixed once at aggregation start.
    pub total_incidents: usize,

    /// Partition by status.
    pub status_counts: StatusCounts,

    /// Top services by incident count.
    pub top_services: Vec<GroupCount>,

    /// Top clients by incident count (heuristic extraction; see
    /// [`extract_client_name`]).
    pub top_clients: Vec<GroupCount>,

    /// Top alert titles by incident count.
    pub top_titles: Vec<GroupCount>,

    /// All assignees by incident count.
    pub assignees: Vec<GroupCount>,

    /// Urgency distribution.
    pub urgency: Vec<GroupCount>,

    /// Resolution latency, when any incident qualified.
    pub resolution: Option<LatencyStats>,

    /// Acknowledgment latency, when any incident qualified.
    pub acknowledgment: Option<LatencyStats>,

    /// Daily incident volume in chronological order.
    pub daily: Vec<DailyCount>,

    /// Incident volume by hour of day, index 0-23.
    pub hourly: Vec<usize>,

    /// Incident volume by weekday, Monday-first.
    pub weekday: Vec<WeekdayCount>,
}

/// Compute the analytics summary for an incident set.
pub fn summarize(incidents: &[Incident]) -> AnalyticsSummary {
    let total = incidents.len();

    AnalyticsSummary {
        total_incidents: total,
        status_counts: status_counts(incidents),
        top_services: top_groups(incidents, total, Some(TOP_SERVICES), |i| {
            i.service_name().unwrap_or("Unknown Service").to_string()
        }),
        top_clients: top_groups(incidents, total, Some(TOP_CLIENTS), |i| {
            extract_client_name(&i.title, i.service_name())
        }),
        top_titles: top_groups(incidents, total, Some(TOP_TITLES), |i| i.title.clone()),
        assignees: top_groups(incidents, total, None, assignee_name),
        urgency: top_groups(incidents, total, None, |i| i.urgency.label().to_string()),
        resolution: resolution_latency(incidents),
        acknowledgment: acknowledgment_latency(incidents),
        daily: daily_counts(incidents),
        hourly: hourly_counts(incidents),
        weekday: weekday_counts(incidents),
    }
}

fn status_counts(incidents: &[Incident]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for incident in incidents {
        match incident.status {
            IncidentStatus::Triggered => counts.triggered += 1,
            IncidentStatus::Acknowledged => counts.acknowledged += 1,
            IncidentStatus::Resolved => counts.resolved += 1,
        }
    }
    counts
}

/// Group incidents by a key, sort descending by size, and keep the top N
/// (all groups when `top_n` is `None`). Ties break alphabetically so output
/// is deterministic.
fn top_groups(
    incidents: &[Incident],
    total: usize,
    top_n: Option<usize>,
    key: impl Fn(&Incident) -> String,
) -> Vec<GroupCount> {
    let mut buckets: HashMap<String, usize> = HashMap::new();
    for incident in incidents {
        *buckets.entry(key(incident)).or_insert(0) += 1;
    }

    let mut groups: Vec<_> = buckets.into_iter().collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(n) = top_n {
        groups.truncate(n);
    }

    groups
        .into_iter()
        .map(|(name, count)| GroupCount {
            name,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// `round(100 * count / total, 2)`; zero when the window is empty.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * count as f64 / total as f64 * 100.0).round() / 100.0
}

/// Extract a client name from an incident title, falling back to the
/// service name.
///
/// This is an ordered chain of best-effort pattern matches; the first rule
/// that matches wins. It is inherently heuristic and must not be treated as
/// authoritative.
///
/// 1. An explicit `Client Name: X` marker (up to the next comma).
/// 2. An alternate `ame.client:` marker (next token).
/// 3. A hyphen-delimited prefix (`Acme - disk full`).
/// 4. The leading token of the service name.
/// 5. The `Unknown Client` bucket.
pub fn extract_client_name(title: &str, service_name: Option<&str>) -> String {
    client_from_explicit_marker(title)
        .or_else(|| client_from_alt_marker(title))
        .or_else(|| client_from_hyphen_prefix(title))
        .or_else(|| service_name.and_then(client_from_service))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `marker`
/// in `haystack`.
///
/// The scan runs over the original string, so the offset is safe to slice
/// `haystack` with; offsets taken from a `to_lowercase` copy can shift under
/// non-ASCII case folding and land mid-character. The markers are pure
/// ASCII, so a match always starts and ends on a char boundary.
fn find_marker(haystack: &str, marker: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(marker.len())
        .position(|window| window.eq_ignore_ascii_case(marker.as_bytes()))
}

/// Rule 1: `Client Name: Acme Corp, disk full` -> `Acme Corp`.
fn client_from_explicit_marker(title: &str) -> Option<String> {
    let start = find_marker(title, "client name:")? + "client name:".len();
    let rest = &title[start..];
    let name = rest.split(',').next().unwrap_or(rest).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Rule 2: `ame.client: acme ...` -> `acme`.
fn client_from_alt_marker(title: &str) -> Option<String> {
    let start = find_marker(title, "ame.client:")? + "ame.client:".len();
    let rest = &title[start..];
    let name = rest
        .trim_start()
        .split([',', ' '])
        .next()
        .unwrap_or("")
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Rule 3: `Acme - disk full` -> `Acme`. Short prefixes only, so ordinary
/// hyphenated prose does not get misread as a client name.
fn client_from_hyphen_prefix(title: &str) -> Option<String> {
    let (prefix, _) = title.split_once(" - ")?;
    let name = prefix.trim();
    (!name.is_empty() && name.len() <= 40).then(|| name.to_string())
}

/// Rule 4: leading token of the service name, split on hyphen or space:
/// `Network-Monitor` -> `Network`.
fn client_from_service(service_name: &str) -> Option<String> {
    let token = service_name
        .split(['-', ' '])
        .next()
        .unwrap_or("")
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Pick the responder bucket for an incident.
///
/// Falls back through three sources in order: the assignment list, the
/// acknowledger list, then the assignee list, taking the first entry of the
/// first non-empty source. Incidents with none land in `Unassigned`.
fn assignee_name(incident: &Incident) -> String {
    if let Some(name) = incident
        .assignments
        .iter()
        .filter_map(|a| a.assignee.as_ref())
        .map(|r| r.summary.trim())
        .find(|s| !s.is_empty())
    {
        return name.to_string();
    }
    if let Some(name) = incident
        .acknowledgers
        .iter()
        .map(|r| r.summary.trim())
        .find(|s| !s.is_empty())
    {
        return name.to_string();
    }
    if let Some(name) = incident
        .assignees
        .iter()
        .map(|r| r.summary.trim())
        .find(|s| !s.is_empty())
    {
        return name.to_string();
    }
    UNASSIGNED.to_string()
}

/// Mean and lower-median over a latency sample; `None` when empty.
fn latency_stats(mut minutes: Vec<f64>) -> Option<LatencyStats> {
    if minutes.is_empty() {
        return None;
    }
    minutes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = minutes.len();
    let mean = minutes.iter().sum::<f64>() / count as f64;
    let median = minutes[count / 2];

    Some(LatencyStats {
        count,
        mean_minutes: (mean * 100.0).round() / 100.0,
        median_minutes: (median * 100.0).round() / 100.0,
    })
}

/// Resolution latency over resolved incidents with both timestamps present
/// and the resolution strictly after creation.
fn resolution_latency(incidents: &[Incident]) -> Option<LatencyStats> {
    let minutes: Vec<f64> = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Resolved)
        .filter_map(|i| Some((i.created_at?, i.resolved_at?)))
        .filter(|(created, resolved)| resolved > created)
        .map(|(created, resolved)| (resolved - created).num_seconds() as f64 / 60.0)
        .collect();

    latency_stats(minutes)
}

/// Acknowledgment latency over incidents with acknowledgment data, with
/// non-positive and greater-than-7-day values discarded as outliers.
fn acknowledgment_latency(incidents: &[Incident]) -> Option<LatencyStats> {
    let minutes: Vec<f64> = incidents
        .iter()
        .filter_map(|i| Some((i.created_at?, i.ack_time()?)))
        .map(|(created, acked)| (acked - created).num_seconds() as f64 / 60.0)
        .filter(|m| *m > 0.0 && *m <= ACK_OUTLIER_CAP_MINUTES)
        .collect();

    latency_stats(minutes)
}

/// Incident volume per calendar date, chronological.
fn daily_counts(incidents: &[Incident]) -> Vec<DailyCount> {
    let mut buckets: HashMap<NaiveDate, usize> = HashMap::new();
    for incident in incidents {
        if let Some(created) = incident.created_at {
            *buckets.entry(created.date_naive()).or_insert(0) += 1;
        }
    }

    let mut days: Vec<_> = buckets
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect();
    days.sort_by_key(|d| d.date);
    days
}

/// Incident volume per hour of day, index 0-23.
fn hourly_counts(incidents: &[Incident]) -> Vec<usize> {
    let mut hours = vec![0usize; 24];
    for incident in incidents {
        if let Some(created) = incident.created_at {
            hours[created.hour() as usize] += 1;
        }
    }
    hours
}

/// Incident volume per weekday in fixed Monday-first order.
fn weekday_counts(incidents: &[Incident]) -> Vec<WeekdayCount> {
    let mut counts = [0usize; 7];
    for incident in incidents {
        if let Some(created) = incident.created_at {
            counts[created.weekday().num_days_from_monday() as usize] += 1;
        }
    }

    WEEKDAYS
        .into_iter()
        .zip(counts)
        .map(|(name, count)| WeekdayCount { name, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AckEvent, Acknowledgement, Assignment, Reference, Urgency};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn incident(id: &str, title: &str, created: &str) -> Incident {
        Incident {
            id: id.to_string(),
            title: title.to_string(),
            created_at: Some(at(created)),
            ..Default::default()
        }
    }

    fn service(name: &str) -> Option<Reference> {
        Some(Reference {
            id: "S1".to_string(),
            summary: name.to_string(),
            ref_type: "service_reference".to_string(),
        })
    }

    #[test]
    fn test_status_counts_sum_to_total() {
        let mut incidents = vec![
            incident("P1", "a", "2026-08-01T10:00:00Z"),
            incident("P2", "b", "2026-08-02T11:00:00Z"),
            incident("P3", "c", "2026-08-03T12:00:00Z"),
        ];
        incidents[1].status = IncidentStatus::Acknowledged;
        incidents[2].status = IncidentStatus::Resolved;

        let summary = summarize(&incidents);

        assert_eq!(summary.total_incidents, 3);
        assert_eq!(summary.status_counts.total(), summary.total_incidents);
        assert_eq!(summary.status_counts.triggered, 1);
        assert_eq!(summary.status_counts.acknowledged, 1);
        assert_eq!(summary.status_counts.resolved, 1);
    }

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 5), 100.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn test_top_group_percentages_sum_at_most_100() {
        let mut incidents = Vec::new();
        for n in 0..23 {
            let mut i = incident(&format!("P{n}"), &format!("title {}", n % 7), "2026-08-01T10:00:00Z");
            i.service = service(&format!("svc-{}", n % 13));
            incidents.push(i);
        }

        let summary = summarize(&incidents);

        let sum: f64 = summary.top_services.iter().map(|g| g.percentage).sum();
        assert!(sum <= 100.0 + 1e-9);
        for group in &summary.top_services {
            assert_eq!(group.percentage, percentage(group.count, 23));
        }
        assert!(summary.top_services.len() <= TOP_SERVICES);
    }

    #[test]
    fn test_lower_median_convention() {
        let stats = latency_stats(vec![40.0, 10.0, 30.0, 20.0]).unwrap();
        assert_eq!(stats.median_minutes, 30.0);
        assert_eq!(stats.mean_minutes, 25.0);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn test_client_extraction_explicit_marker() {
        assert_eq!(
            extract_client_name("Client Name: Acme Corp, disk full", None),
            "Acme Corp"
        );
    }

    #[test]
    fn test_client_extraction_alt_marker() {
        assert_eq!(
            extract_client_name("alert ame.client: acme disk full", None),
            "acme"
        );
    }

    #[test]
    fn test_client_extraction_survives_non_ascii_titles() {
        // Case folding can change byte lengths ahead of the marker; the
        // extracted name must not shift (or panic on a char boundary).
        assert_eq!(
            extract_client_name("İİ Client Name: Ücorp, disk full", None),
            "Ücorp"
        );
        assert_eq!(
            extract_client_name("İstanbul ame.client: ücorp down", None),
            "ücorp"
        );
    }

    #[test]
    fn test_client_extraction_hyphen_prefix() {
        assert_eq!(extract_client_name("Globex - CPU pegged", None), "Globex");
    }

    #[test]
    fn test_client_extraction_service_fallback() {
        assert_eq!(
            extract_client_name("disk full on db-01", Some("Network-Monitor")),
            "Network"
        );
    }

    #[test]
    fn test_client_extraction_unknown() {
        assert_eq!(extract_client_name("disk full", None), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_assignee_fallback_chain() {
        let mut i = incident("P1", "a", "2026-08-01T10:00:00Z");
        assert_eq!(assignee_name(&i), UNASSIGNED);

        i.assignees.push(Reference {
            summary: "Cleo".to_string(),
            ..Default::default()
        });
        assert_eq!(assignee_name(&i), "Cleo");

        i.acknowledgers.push(Reference {
            summary: "Bea".to_string(),
            ..Default::default()
        });
        assert_eq!(assignee_name(&i), "Bea");

        i.assignments.push(Assignment {
            at: None,
            assignee: Some(Reference {
                summary: "Ada".to_string(),
                ..Default::default()
            }),
        });
        assert_eq!(assignee_name(&i), "Ada");
    }

    #[test]
    fn test_ack_latency_excludes_outliers() {
        let created = at("2026-08-01T10:00:00Z");

        let mut ok = incident("P1", "a", "2026-08-01T10:00:00Z");
        ok.first_ack = Some(AckEvent {
            at: created + Duration::minutes(20),
            actor: "Ada".to_string(),
        });

        // Ack at creation time: non-positive latency, excluded.
        let mut at_creation = incident("P2", "b", "2026-08-01T10:00:00Z");
        at_creation.first_ack = Some(AckEvent {
            at: created,
            actor: "Bea".to_string(),
        });

        // Ack eight days later: beyond the 10080-minute cap, excluded.
        let mut late = incident("P3", "c", "2026-08-01T10:00:00Z");
        late.first_ack = Some(AckEvent {
            at: created + Duration::days(8),
            actor: "Cleo".to_string(),
        });

        let stats = acknowledgment_latency(&[ok, at_creation, late]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean_minutes, 20.0);
    }

    #[test]
    fn test_ack_latency_uses_inline_acknowledgements() {
        let created = at("2026-08-01T10:00:00Z");
        let mut i = incident("P1", "a", "2026-08-01T10:00:00Z");
        i.acknowledgements.push(Acknowledgement {
            at: Some(created + Duration::minutes(12)),
            acknowledger: None,
        });

        let stats = acknowledgment_latency(&[i]).unwrap();
        assert_eq!(stats.median_minutes, 12.0);
    }

    #[test]
    fn test_resolution_latency_requires_valid_ordering() {
        let mut resolved = incident("P1", "a", "2026-08-01T10:00:00Z");
        resolved.status = IncidentStatus::Resolved;
        resolved.resolved_at = Some(at("2026-08-01T11:30:00Z"));

        // Resolution before creation: malformed, excluded silently.
        let mut skewed = incident("P2", "b", "2026-08-01T10:00:00Z");
        skewed.status = IncidentStatus::Resolved;
        skewed.resolved_at = Some(at("2026-08-01T09:00:00Z"));

        // Not resolved: excluded even with a resolution timestamp.
        let mut open = incident("P3", "c", "2026-08-01T10:00:00Z");
        open.resolved_at = Some(at("2026-08-01T12:00:00Z"));

        let stats = resolution_latency(&[resolved, skewed, open]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean_minutes, 90.0);
    }

    #[test]
    fn test_daily_counts_chronological() {
        let incidents = vec![
            incident("P1", "a", "2026-08-03T10:00:00Z"),
            incident("P2", "b", "2026-08-01T10:00:00Z"),
            incident("P3", "c", "2026-08-01T22:00:00Z"),
        ];

        let daily = daily_counts(&incidents);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(daily[0].count, 2);
        assert_eq!(daily[1].count, 1);
    }

    #[test]
    fn test_hourly_and_weekday_buckets() {
        // 2026-08-01 is a Saturday.
        let incidents = vec![
            incident("P1", "a", "2026-08-01T00:15:00Z"),
            incident("P2", "b", "2026-08-01T23:45:00Z"),
            incident("P3", "c", "2026-08-03T12:00:00Z"), // Monday
        ];

        let hourly = hourly_counts(&incidents);
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[0], 1);
        assert_eq!(hourly[23], 1);
        assert_eq!(hourly[12], 1);

        let weekday = weekday_counts(&incidents);
        assert_eq!(weekday[0].name, "Monday");
        assert_eq!(weekday[0].count, 1);
        assert_eq!(weekday[5].name, "Saturday");
        assert_eq!(weekday[5].count, 2);
    }

    #[test]
    fn test_urgency_distribution_covers_all_groups() {
        let mut incidents = vec![
            incident("P1", "a", "2026-08-01T10:00:00Z"),
            incident("P2", "b", "2026-08-01T10:00:00Z"),
            incident("P3", "c", "2026-08-01T10:00:00Z"),
        ];
        incidents[2].urgency = Urgency::Low;

        let summary = summarize(&incidents);
        let sum: f64 = summary.urgency.iter().map(|g| g.percentage).sum();

        assert_eq!(summary.urgency.len(), 2);
        assert!((sum - 100.0).abs() < 0.02);
    }

    #[test]
    fn test_summarize_empty_set() {
        let summary = summarize(&[]);

        assert_eq!(summary.total_incidents, 0);
        assert!(summary.resolution.is_none());
        assert!(summary.acknowledgment.is_none());
        assert!(summary.daily.is_empty());
        assert_eq!(summary.hourly.iter().sum::<usize>(), 0);
    }

    #[test]
    fn test_timezone_normalized_to_utc_buckets() {
        let created = Utc.with_ymd_and_hms(2026, 8, 1, 23, 30, 0).unwrap();
        let i = Incident {
            created_at: Some(created),
            ..incident("P1", "a", "2026-08-01T10:00:00Z")
        };

        let hourly = hourly_counts(&[i]);
        assert_eq!(hourly[23], 1);
    }
}
