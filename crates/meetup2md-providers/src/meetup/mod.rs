//! Meetup API adapter.
//!
//! - [`MeetupOAuth`] talks to the OAuth 1.0a token endpoints
//! - [`MeetupClient`] lists group events with an access token
//! - [`MeetupSettings`] holds the endpoints, overridable from configuration
//!
//! # Example
//!
//! ```ignore
//! use meetup2md_providers::meetup::{MeetupClient, MeetupOAuth, MeetupSettings};
//! use meetup2md_providers::{EventQuery, Handshake, HandshakeInput, HandshakeOutcome};
//!
//! let settings = MeetupSettings::default();
//! let oauth = MeetupOAuth::new(settings.clone())?;
//! if let HandshakeOutcome::Authorized(session) =
//!     Handshake::new(&oauth).advance(&mut store, HandshakeInput::default()).await?
//! {
//!     let client = MeetupClient::new(settings, &session)?;
//!     let events = client.fetch_events(EventQuery::new("rust-meetup")).await?;
//! }
//! ```

mod client;
mod config;
mod oauth;

pub use client::MeetupClient;
pub use config::MeetupSettings;
pub use oauth::MeetupOAuth;

use crate::error::{ProviderError, ProviderResult};

/// Provider name attached to errors.
pub const PROVIDER_NAME: &str = "meetup";

/// Maps a transport failure to a network error.
fn send_error(e: reqwest::Error) -> ProviderError {
    let err = if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    };
    err.with_provider(PROVIDER_NAME).with_source(e)
}

/// Reads a response body, turning error statuses into provider errors.
async fn read_body(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        ProviderError::network(format!("failed to read response: {}", e)).with_provider(PROVIDER_NAME)
    })?;

    if status.is_success() {
        return Ok(body);
    }

    let err = match status {
        reqwest::StatusCode::BAD_REQUEST => ProviderError::bad_request(body),
        reqwest::StatusCode::UNAUTHORIZED => ProviderError::authentication(format!(
            "credentials rejected: {}",
            body
        )),
        reqwest::StatusCode::FORBIDDEN => ProviderError::authorization(body),
        _ => ProviderError::server(format!("API error ({}): {}", status, body)),
    };
    Err(err.with_provider(PROVIDER_NAME))
}
