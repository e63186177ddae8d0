//! Meetup event listing client.
//!
//! Calls `GET {api_base_url}/2/events` signed with the access token and
//! validates each result into an [`EventRecord`].

use meetup2md_core::{EventRecord, Venue};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::handshake::AuthorizedSession;
use crate::oauth1::OAuthSigner;
use crate::provider::{BoxFuture, EventQuery, EventSource};

use super::config::MeetupSettings;
use super::{read_body, send_error, PROVIDER_NAME};

/// Client for the Meetup events API.
#[derive(Debug, Clone)]
pub struct MeetupClient {
    settings: MeetupSettings,
    http_client: reqwest::Client,
    signer: OAuthSigner,
}

impl MeetupClient {
    /// Creates a client signing requests with an authorized session.
    pub fn new(settings: MeetupSettings, session: &AuthorizedSession) -> ProviderResult<Self> {
        let http_client = settings.http_client()?;
        let signer = OAuthSigner::new(session.consumer.clone()).with_token(session.access.clone());
        Ok(Self {
            settings,
            http_client,
            signer,
        })
    }

    /// Builds the listing URL for a query.
    pub fn events_url(&self, query: &EventQuery) -> ProviderResult<Url> {
        let base = format!("{}/2/events", self.settings.api_base_url.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[
                ("group_urlname", query.group_urlname.as_str()),
                ("time", query.time_range.as_str()),
                ("status", query.status.as_str()),
            ],
        )
        .map_err(|e| {
            ProviderError::configuration(format!("invalid API base URL '{}': {}", base, e))
                .with_provider(PROVIDER_NAME)
        })
    }

    async fn list_events(&self, query: EventQuery) -> ProviderResult<Vec<EventRecord>> {
        let url = self.events_url(&query)?;
        let header = self.signer.authorize("GET", &url, &[])?;
        debug!(group = %query.group_urlname, time = %query.time_range, status = %query.status, "Fetching events");

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await
            .map_err(send_error)?;

        let body = read_body(response).await?;
        let events = parse_events(&body)?;
        debug!(count = events.len(), "Fetched events");
        Ok(events)
    }
}

impl EventSource for MeetupClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
        Box::pin(self.list_events(query))
    }
}

/// Parses an event listing body, dropping records that fail validation.
fn parse_events(body: &str) -> ProviderResult<Vec<EventRecord>> {
    let list: EventListResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
            .with_provider(PROVIDER_NAME)
            .with_source(e)
    })?;
    Ok(list.results.into_iter().filter_map(convert_event).collect())
}

/// Validates an API event into a record.
fn convert_event(event: ApiEvent) -> Option<EventRecord> {
    let Some(id) = event.id.as_ref().and_then(scalar_string) else {
        warn!("Skipping event without an id");
        return None;
    };
    let Some(name) = event.name else {
        warn!("Skipping event {} without a name", id);
        return None;
    };
    let Some(time) = event.time else {
        warn!("Skipping event {} without a start time", id);
        return None;
    };
    let Some(mut record) = EventRecord::from_millis(&id, name, time) else {
        warn!("Skipping event {} with out-of-range time {}", id, time);
        return None;
    };

    if let Some(description) = event.description {
        record = record.with_description(description);
    }
    if let Some(updated) = event.updated {
        record = record.with_updated(updated);
    }
    if let Some(venue) = event.venue {
        record = record.with_venue(convert_venue(venue));
    }
    Some(record)
}

fn convert_venue(venue: ApiVenue) -> Venue {
    Venue {
        name: text(venue.name).unwrap_or_default(),
        address_1: text(venue.address_1),
        address_2: text(venue.address_2),
        address_3: text(venue.address_3),
        city: text(venue.city),
        state: text(venue.state),
        zip: text(venue.zip),
    }
}

/// Keeps a field only when the API sent a JSON string.
fn text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Accepts ids sent either as strings or as numbers.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Response envelope of `/2/events`.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    results: Vec<ApiEvent>,
}

/// A single event from the API.
#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: Option<Value>,
    name: Option<String>,
    /// Start time, milliseconds since the epoch.
    time: Option<i64>,
    /// Last update, milliseconds since the epoch.
    updated: Option<i64>,
    description: Option<String>,
    venue: Option<ApiVenue>,
}

/// Venue from the API. Fields stay untyped so non-string values count as absent.
#[derive(Debug, Deserialize)]
struct ApiVenue {
    name: Option<Value>,
    address_1: Option<Value>,
    address_2: Option<Value>,
    address_3: Option<Value>,
    city: Option<Value>,
    state: Option<Value>,
    zip: Option<Value>,
}
