//! Meetup API client settings.

use std::time::Duration;

use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

/// Endpoints and transport settings for the Meetup API.
///
/// Defaults point at the public API. Every field can be overridden from the
/// `[internal]` configuration section through [`MeetupSettings::from_overrides`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetupSettings {
    /// Base URL for API calls; event listings live under `/2/events`.
    pub api_base_url: String,
    pub request_token_url: String,
    pub access_token_url: String,
    /// Page where the member approves a request token.
    pub authorize_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for MeetupSettings {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            request_token_url: Self::DEFAULT_REQUEST_TOKEN_URL.to_string(),
            access_token_url: Self::DEFAULT_ACCESS_TOKEN_URL.to_string(),
            authorize_url: Self::DEFAULT_AUTHORIZE_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("meetup2md/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MeetupSettings {
    pub const DEFAULT_API_BASE_URL: &'static str = "https://api.meetup.com";
    pub const DEFAULT_REQUEST_TOKEN_URL: &'static str = "https://api.meetup.com/oauth/request/";
    pub const DEFAULT_ACCESS_TOKEN_URL: &'static str = "https://api.meetup.com/oauth/access/";
    pub const DEFAULT_AUTHORIZE_URL: &'static str = "https://secure.meetup.com/authorize/";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Builds settings from `key = value` overrides.
    ///
    /// Unknown keys are skipped with a warning. A `timeout_secs` that is not
    /// a positive integer is a configuration error.
    pub fn from_overrides<'a, I>(overrides: I) -> ProviderResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut settings = Self::default();
        for (key, value) in overrides {
            let value = value.trim();
            match key {
                "api_base_url" => settings.api_base_url = value.trim_end_matches('/').to_string(),
                "request_token_url" => settings.request_token_url = value.to_string(),
                "access_token_url" => settings.access_token_url = value.to_string(),
                "authorize_url" => settings.authorize_url = value.to_string(),
                "user_agent" => settings.user_agent = value.to_string(),
                "timeout_secs" => {
                    let secs = value
                        .parse::<u64>()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or_else(|| {
                            ProviderError::configuration(format!(
                                "timeout_secs must be a positive integer, got '{}'",
                                value
                            ))
                        })?;
                    settings.timeout = Duration::from_secs(secs);
                }
                other => warn!("Ignoring unknown internal setting '{}'", other),
            }
        }
        Ok(settings)
    }

    /// Sets the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the HTTP client shared by the OAuth and event calls.
    pub(crate) fn http_client(&self) -> ProviderResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
            })
    }
}
