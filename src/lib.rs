//! Pagerkit - SOC command-line tooling for an incident management API.
//!
//! # Overview
//!
//! Three independent utilities against a PagerDuty-style REST API:
//!
//! - `pagerkit-note`: resolve an incident (direct ID, title search, or
//!   deduplication-key search) and append a note to it.
//! - `pagerkit-event`: create a new incident through the event ingestion
//!   webhook.
//! - `pagerkit-report`: fetch a rolling 30-day incident history, enrich it
//!   with first-acknowledgement timing, and render an HTML analytics report.
//!
//! Execution is strictly sequential throughout: one HTTP request in flight
//! at a time, no persistence beyond a single run.
//!
//! # Modules
//!
//! - [`config`]: explicit token/base-URL configuration
//! - [`model`]: serde data model for the API
//! - [`api`]: REST client
//! - [`events`]: ingestion webhook client
//! - [`collect`]: paginated fetch, enrichment, and search primitives
//! - [`analytics`]: pure aggregation of the fetched incident set
//! - [`report`]: HTML report rendering
//! - [`error`]: API error taxonomy

pub mod analytics;
pub mod api;
pub mod collect;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod report;
