//! HTML report renderer.
//!
//! Turns an [`AnalyticsSummary`] into a single self-contained HTML document:
//! stat cards, a daily-volume line chart, top-N tables, and distribution
//! charts. Chart specifications are embedded as JSON and rendered
//! client-side by Chart.js; no network access happens in this module.
//!
//! User-influenced text (titles, client names, actor names) is escaped where
//! it lands in HTML bodies. Chart labels stay raw so the canvas renders them
//! verbatim; the serialized chart JSON has `<` escaped instead, which keeps
//! label text from closing the script tag.

use serde_json::json;

use crate::analytics::{AnalyticsSummary, GroupCount, LatencyStats};

/// File name of the generated report.
pub const REPORT_FILE_NAME: &str = "incident_report.html";

/// Render the full report document.
pub fn render_report(summary: &AnalyticsSummary, title: &str, range_label: &str) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("<script src=\"https://cdn.jsdelivr.net/npm/chart.js@4\"></script>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    html.push_str(&format!(
        "<header><h1>{}</h1><p class=\"range\">{} &middot; generated {}</p></header>\n",
        escape_html(title),
        escape_html(range_label),
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));

    html.push_str(&stat_cards(summary));

    html.push_str(&chart_section(
        "daily-chart",
        "Daily Incident Volume",
        &daily_chart_spec(summary),
    ));

    html.push_str("<section class=\"tables\">\n");
    html.push_str(&group_table("Top Services", &summary.top_services));
    html.push_str(&group_table("Top Clients", &summary.top_clients));
    html.push_str(&group_table("Top Alert Titles", &summary.top_titles));
    html.push_str("</section>\n");

    html.push_str(&chart_section(
        "assignee-chart",
        "Incidents by Assignee",
        &bar_chart_spec(&summary.assignees, "Incidents"),
    ));
    html.push_str(&chart_section(
        "urgency-chart",
        "Urgency Distribution",
        &doughnut_chart_spec(&summary.urgency),
    ));
    html.push_str(&chart_section(
        "hourly-chart",
        "Incidents by Hour of Day",
        &hourly_chart_spec(summary),
    ));
    html.push_str(&chart_section(
        "weekday-chart",
        "Incidents by Day of Week",
        &weekday_chart_spec(summary),
    ));

    html.push_str("</body>\n</html>\n");
    html
}

/// Escape the HTML reserved characters in user-influenced text.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = "<style>\n\
body { font-family: -apple-system, 'Segoe UI', sans-serif; margin: 0; background: #f4f5f7; color: #172b4d; }\n\
header { background: #1d3557; color: #fff; padding: 24px 32px; }\n\
header .range { color: #a8c0dd; margin: 4px 0 0; }\n\
section { margin: 24px 32px; }\n\
.cards { display: flex; flex-wrap: wrap; gap: 16px; margin: 24px 32px; }\n\
.card { background: #fff; border-radius: 8px; padding: 16px 24px; min-width: 140px; box-shadow: 0 1px 3px rgba(0,0,0,.12); }\n\
.card .value { font-size: 28px; font-weight: 700; }\n\
.card .label { color: #6b778c; font-size: 13px; text-transform: uppercase; }\n\
.tables { display: flex; flex-wrap: wrap; gap: 24px; }\n\
table { background: #fff; border-collapse: collapse; border-radius: 8px; overflow: hidden; box-shadow: 0 1px 3px rgba(0,0,0,.12); }\n\
th, td { padding: 8px 16px; text-align: left; border-bottom: 1px solid #ebecf0; font-size: 14px; }\n\
th { background: #ebecf0; text-transform: uppercase; font-size: 12px; color: #6b778c; }\n\
.chart-box { background: #fff; border-radius: 8px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.12); max-width: 900px; }\n\
canvas { max-height: 320px; }\n\
</style>\n";

fn stat_cards(summary: &AnalyticsSummary) -> String {
    let mut cards = String::from("<div class=\"cards\">\n");

    let mut push_card = |value: String, label: &str| {
        cards.push_str(&format!(
            "<div class=\"card\"><div class=\"value\">{value}</div><div class=\"label\">{label}</div></div>\n"
        ));
    };

    push_card(summary.total_incidents.to_string(), "Total Incidents");
    push_card(summary.status_counts.triggered.to_string(), "Triggered");
    push_card(summary.status_counts.acknowledged.to_string(), "Acknowledged");
    push_card(summary.status_counts.resolved.to_string(), "Resolved");
    push_card(latency_label(&summary.acknowledgment), "Median Ack (min)");
    push_card(latency_label(&summary.resolution), "Median Resolve (min)");

    cards.push_str("</div>\n");
    cards
}

fn latency_label(stats: &Option<LatencyStats>) -> String {
    match stats {
        Some(s) => format!("{:.1}", s.median_minutes),
        None => "n/a".to_string(),
    }
}

fn group_table(heading: &str, groups: &[GroupCount]) -> String {
    let mut table = format!(
        "<div><h2>{}</h2>\n<table>\n<tr><th>Name</th><th>Count</th><th>%</th></tr>\n",
        escape_html(heading)
    );
    for group in groups {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
            escape_html(&group.name),
            group.count,
            group.percentage
        ));
    }
    table.push_str("</table>\n</div>\n");
    table
}

/// Wrap one chart canvas plus its Chart.js spec in a section.
///
/// `<` in the serialized spec is rewritten to its backslash-u escape (valid
/// in both JSON and JS string literals), so raw label text can never close
/// the script tag.
fn chart_section(canvas_id: &str, heading: &str, spec: &serde_json::Value) -> String {
    let spec = spec.to_string().replace('<', "\\u003c");
    format!(
        "<section><h2>{}</h2><div class=\"chart-box\"><canvas id=\"{canvas_id}\"></canvas></div>\n\
         <script>new Chart(document.getElementById('{canvas_id}'), {});</script>\n</section>\n",
        escape_html(heading),
        spec
    )
}

fn daily_chart_spec(summary: &AnalyticsSummary) -> serde_json::Value {
    let labels: Vec<String> = summary.daily.iter().map(|d| d.date.to_string()).collect();
    let counts: Vec<usize> = summary.daily.iter().map(|d| d.count).collect();

    json!({
        "type": "line",
        "data": {
            "labels": labels,
            "datasets": [{
                "label": "Incidents",
                "data": counts,
                "borderColor": "#e63946",
                "backgroundColor": "rgba(230,57,70,.15)",
                "fill": true,
                "tension": 0.2
            }]
        },
        "options": { "plugins": { "legend": { "display": false } } }
    })
}

fn bar_chart_spec(groups: &[GroupCount], label: &str) -> serde_json::Value {
    let labels: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    let counts: Vec<usize> = groups.iter().map(|g| g.count).collect();

    json!({
        "type": "bar",
        "data": {
            "labels": labels,
            "datasets": [{ "label": label, "data": counts, "backgroundColor": "#457b9d" }]
        },
        "options": { "plugins": { "legend": { "display": false } } }
    })
}

fn doughnut_chart_spec(groups: &[GroupCount]) -> serde_json::Value {
    let labels: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    let counts: Vec<usize> = groups.iter().map(|g| g.count).collect();

    json!({
        "type": "doughnut",
        "data": {
            "labels": labels,
            "datasets": [{
                "data": counts,
                "backgroundColor": ["#e63946", "#457b9d", "#2a9d8f", "#e9c46a"]
            }]
        }
    })
}

fn hourly_chart_spec(summary: &AnalyticsSummary) -> serde_json::Value {
    let labels: Vec<String> = (0..24).map(|h| format!("{h:02}")).collect();

    json!({
        "type": "bar",
        "data": {
            "labels": labels,
            "datasets": [{ "label": "Incidents", "data": summary.hourly.clone(), "backgroundColor": "#2a9d8f" }]
        },
        "options": { "plugins": { "legend": { "display": false } } }
    })
}

fn weekday_chart_spec(summary: &AnalyticsSummary) -> serde_json::Value {
    let labels: Vec<&str> = summary.weekday.iter().map(|w| w.name).collect();
    let counts: Vec<usize> = summary.weekday.iter().map(|w| w.count).collect();

    json!({
        "type": "bar",
        "data": {
            "labels": labels,
            "datasets": [{ "label": "Incidents", "data": counts, "backgroundColor": "#e9c46a" }]
        },
        "options": { "plugins": { "legend": { "display": false } } }
    })
}
