use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use shared::domain::{Event, EventId, EventMembership, UserId};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RemoteQueryError {
    #[error("data service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("data service rejected query with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("expected exactly one event for id {id}")]
    NotExactlyOne { id: EventId },
    #[error("data service returned event {returned} for requested id {requested}")]
    MismatchedRow {
        requested: EventId,
        returned: EventId,
    },
    #[error("identifier must not be empty")]
    BlankIdentifier,
}

/// Authenticated handle for the remote data service. Built once from the
/// configured endpoint and key, then passed to every read explicitly.
#[derive(Clone)]
pub struct DataSession {
    http: Client,
    base_url: String,
    api_key: String,
}

impl DataSession {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn read(&self, table: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[derive(Debug, Deserialize)]
struct MembershipCount {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEvent {
    #[serde(flatten)]
    event: Event,
    #[serde(default)]
    event_memberships: Vec<MembershipCount>,
}

#[derive(Debug, Deserialize)]
struct MembershipRow {
    #[serde(flatten)]
    membership: EventMembership,
    events: Option<EmbeddedEvent>,
}

/// Full event collection, ordered however the service orders it.
pub async fn list_events(session: &DataSession) -> Result<Vec<Event>, RemoteQueryError> {
    let response = session
        .read("events")
        .query(&[("select", "*")])
        .send()
        .await?;
    let response = ensure_success(response).await?;
    let events: Vec<Event> = response.json().await?;
    debug!(count = events.len(), "events: listed");
    Ok(events)
}

/// Events reachable through the user's memberships, each annotated with its
/// membership count. The service embeds the event (and the count aggregate)
/// inside every membership row; rows whose join is missing are skipped.
pub async fn list_events_for_user(
    session: &DataSession,
    user_id: &UserId,
) -> Result<Vec<Event>, RemoteQueryError> {
    if user_id.is_blank() {
        return Err(RemoteQueryError::BlankIdentifier);
    }

    let filter = format!("eq.{user_id}");
    let response = session
        .read("event_memberships")
        .query(&[
            ("select", "*,events(*,event_memberships(count))"),
            ("user_id", filter.as_str()),
        ])
        .send()
        .await?;
    let response = ensure_success(response).await?;
    let rows: Vec<MembershipRow> = response.json().await?;

    let events = rows
        .into_iter()
        .filter_map(|row| {
            if row.membership.user_id != *user_id {
                warn!(
                    requested = %user_id,
                    returned = %row.membership.user_id,
                    "events: dropping membership row for a different user"
                );
                return None;
            }
            let embedded = row.events?;
            let mut event = embedded.event;
            event.attendee_count = embedded.event_memberships.first().map(|row| row.count);
            Some(event)
        })
        .collect::<Vec<_>>();

    debug!(user_id = %user_id, count = events.len(), "events: listed for user");
    Ok(events)
}

/// Exactly one event with its assets. The request carries the single-object
/// accept header, so the service itself enforces the exactly-one contract
/// and answers 406 for zero or many rows.
pub async fn get_event(session: &DataSession, id: &EventId) -> Result<Event, RemoteQueryError> {
    if id.is_blank() {
        return Err(RemoteQueryError::BlankIdentifier);
    }

    let filter = format!("eq.{id}");
    let response = session
        .read("events")
        .query(&[("select", "*,assets(*)"), ("id", filter.as_str())])
        .header(header::ACCEPT, "application/vnd.pgrst.object+json")
        .send()
        .await?;

    if response.status() == StatusCode::NOT_ACCEPTABLE {
        return Err(RemoteQueryError::NotExactlyOne { id: id.clone() });
    }
    let response = ensure_success(response).await?;
    let event: Event = response.json().await?;

    if event.id != *id {
        return Err(RemoteQueryError::MismatchedRow {
            requested: id.clone(),
            returned: event.id,
        });
    }
    Ok(event)
}

async fn ensure_success(response: Response) -> Result<Response, RemoteQueryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RemoteQueryError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
