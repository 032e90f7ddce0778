//! pagerkit-note - append a note to an existing incident.
//!
//! The incident is located by direct ID, title substring, or deduplication
//! key. The API token is validated against the abilities endpoint before any
//! other work.

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pagerkit::api::ApiClient;
use pagerkit::collect::{find_by_dedup_key, search_by_title};
use pagerkit::config::ApiConfig;
use pagerkit::model::Incident;

#[derive(Debug, Parser)]
#[command(name = "pagerkit-note", about = "Append a note to an incident")]
struct Args {
    /// API token (falls back to PAGERKIT_API_TOKEN).
    #[arg(long)]
    token: Option<String>,

    /// Incident ID to annotate directly.
    #[arg(long)]
    incident: Option<String>,

    /// Locate the incident by title substring (case-insensitive).
    #[arg(long, value_name = "TERM")]
    search_title: Option<String>,

    /// Locate the incident by the deduplication key of its triggering event.
    #[arg(long, value_name = "KEY")]
    search_dedup_key: Option<String>,

    /// Include resolved incidents in title searches.
    #[arg(long)]
    include_resolved: bool,

    /// Print matching incidents instead of posting a note.
    #[arg(long)]
    list_only: bool,

    /// Note text to post.
    #[arg(long)]
    note: Option<String>,

    /// Operator email; must name a valid account in the incident system.
    /// Required when posting a note, unused with --list-only.
    #[arg(long, value_name = "EMAIL")]
    from: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("pagerkit=info".parse()?))
        .init();

    let args = Args::parse();
    let config = ApiConfig::resolve(args.token.clone())?;
    let client = ApiClient::new(config);

    // Token check comes first; everything else is wasted work on a bad token.
    client
        .check_abilities()
        .await
        .context("API token validation failed")?;

    let incident = resolve_incident(&client, &args).await?;

    let incident = match incident {
        Some(incident) => incident,
        None => return Ok(()), // list-only mode already printed
    };

    let content = match &args.note {
        Some(note) if !note.is_empty() => note,
        _ => bail!("no note text supplied; pass --note"),
    };
    let from = match &args.from {
        Some(email) if !email.is_empty() => email,
        _ => bail!("no operator email supplied; pass --from"),
    };

    // A typoed email should fail here, not after the note request.
    client
        .ensure_requester(from)
        .await
        .context("operator email validation failed")?;

    let note = client
        .post_note(&incident.id, from, content)
        .await
        .with_context(|| format!("failed to post note to incident {}", incident.id))?;

    info!(incident = %incident.id, note = %note.id, "note posted");
    println!(
        "Posted note {} to incident {} ({})",
        note.id, incident.id, incident.title
    );
    Ok(())
}

/// Resolve the target incident from the identifier flags.
///
/// Returns `None` only in list-only mode, after printing the matches.
async fn resolve_incident(client: &ApiClient, args: &Args) -> anyhow::Result<Option<Incident>> {
    if let Some(id) = &args.incident {
        let incident = client
            .get_incident(id)
            .await
            .with_context(|| format!("incident '{id}' could not be fetched"))?;
        if args.list_only {
            print_matches(std::slice::from_ref(&incident));
            return Ok(None);
        }
        return Ok(Some(incident));
    }

    if let Some(term) = &args.search_title {
        let matches = search_by_title(client, term, args.include_resolved)
            .await
            .context("title search failed")?;

        if matches.is_empty() {
            bail!(
                "no incident title contains '{term}'; broaden the term or pass --include-resolved"
            );
        }
        if args.list_only {
            print_matches(&matches);
            return Ok(None);
        }
        if matches.len() > 1 {
            warn!(
                matches = matches.len(),
                "multiple incidents match; using the most recently created"
            );
        }
        return Ok(matches.into_iter().next());
    }

    if let Some(key) = &args.search_dedup_key {
        let found = find_by_dedup_key(client, key)
            .await
            .context("deduplication-key search failed")?;

        let incident = found.ok_or_else(|| {
            anyhow::anyhow!(
                "no incident in the search window carries dedup key '{key}'; \
                 the search covers 7 days and at most 500 records"
            )
        })?;
        if args.list_only {
            print_matches(std::slice::from_ref(&incident));
            return Ok(None);
        }
        return Ok(Some(incident));
    }

    bail!("no incident identifier supplied; pass --incident, --search-title, or --search-dedup-key")
}

fn print_matches(incidents: &[Incident]) {
    for incident in incidents {
        let created = incident
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{}  {}  {:<12} {}",
            incident.id,
            created,
            incident.status.label(),
            incident.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_client(server: &MockServer) -> ApiClient {
        ApiClient::new(ApiConfig::with_base_url("test-token", server.base_url()))
    }

    #[tokio::test]
    async fn test_direct_incident_honors_list_only() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/incidents/P1");
            then.status(200).json_body(json!({
                "incident": { "id": "P1", "title": "disk full" }
            }));
        });

        let args = Args::parse_from(["pagerkit-note", "--incident", "P1", "--list-only"]);
        let resolved = resolve_incident(&mock_client(&server), &args).await.unwrap();
        assert!(resolved.is_none(), "list-only must not hand back a post target");

        let args = Args::parse_from(["pagerkit-note", "--incident", "P1"]);
        let resolved = resolve_incident(&mock_client(&server), &args).await.unwrap();
        assert_eq!(resolved.expect("incident").id, "P1");

        mock.assert_hits(2);
    }

    #[test]
    fn test_from_is_optional_at_parse_time() {
        let args = Args::parse_from(["pagerkit-note", "--search-title", "disk", "--list-only"]);
        assert!(args.from.is_none());
        assert!(args.list_only);
    }
}
