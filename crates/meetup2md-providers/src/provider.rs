//! Service traits for the OAuth endpoints and the event listing.
//!
//! [`OAuthService`] covers the three OAuth 1.0a endpoints the handshake talks
//! to. [`EventSource`] lists the events of one group. The Meetup adapter
//! implements both; tests substitute in-process fakes.

use std::future::Future;
use std::pin::Pin;

use meetup2md_core::EventRecord;

use crate::credentials::Credential;
use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The result of exchanging a request token for an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// The long-lived access token.
    pub token: Credential,
    /// The id of the member who approved access, when the server reports it.
    pub member_id: Option<String>,
}

/// The OAuth 1.0a endpoints of a service.
pub trait OAuthService: Send + Sync {
    /// Obtains a request token for out-of-band authorization.
    fn fetch_request_token<'a>(&'a self, consumer: &'a Credential) -> BoxFuture<'a, ProviderResult<Credential>>;

    /// Builds the URL where the member approves the request token.
    fn authorize_url(&self, request_token: &Credential) -> ProviderResult<String>;

    /// Exchanges an approved request token and its verifier for an access token.
    fn fetch_access_token<'a>(
        &'a self,
        consumer: &'a Credential,
        request_token: &'a Credential,
        verifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<AccessGrant>>;
}

/// Filters for an event listing.
///
/// `time_range` and `status` are passed through verbatim; the API validates
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub group_urlname: String,
    pub time_range: String,
    pub status: String,
}

impl EventQuery {
    /// Default time range: from now to one month ahead.
    pub const DEFAULT_TIME_RANGE: &'static str = "0,1m";
    /// Default event status filter.
    pub const DEFAULT_STATUS: &'static str = "upcoming";

    /// Creates a query for a group with the default range and status.
    pub fn new(group_urlname: impl Into<String>) -> Self {
        Self {
            group_urlname: group_urlname.into(),
            time_range: Self::DEFAULT_TIME_RANGE.to_string(),
            status: Self::DEFAULT_STATUS.to_string(),
        }
    }

    /// Builder method to set the time range.
    pub fn with_time_range(mut self, time_range: impl Into<String>) -> Self {
        self.time_range = time_range.into();
        self
    }

    /// Builder method to set the status filter.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// A source of group events.
pub trait EventSource: Send + Sync {
    /// Returns the name of this source (e.g., "meetup").
    fn name(&self) -> &str;

    /// Fetches the events matching `query`, in the order the API returns them.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network errors, rejected credentials or
    /// rejected filters. Errors are never retried.
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>>;
}

/// An event source that always fails.
///
/// Useful in tests, or as a placeholder when the real source cannot be built.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: ProviderError,
}

impl ErrorSource {
    /// Creates a new failing source.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl EventSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_events(&self, _query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
        let error =
            ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}
