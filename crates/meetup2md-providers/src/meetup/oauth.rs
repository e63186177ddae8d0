//! Meetup OAuth 1.0a token endpoints.

use tracing::debug;
use url::Url;

use crate::credentials::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::oauth1::OAuthSigner;
use crate::provider::{AccessGrant, BoxFuture, OAuthService};

use super::config::MeetupSettings;
use super::{read_body, send_error, PROVIDER_NAME};

/// Callback value for out-of-band verification: the member copies the
/// verifier code by hand.
const OUT_OF_BAND_CALLBACK: &str = "oob";

/// Client for the Meetup request-token, authorize and access-token endpoints.
#[derive(Debug, Clone)]
pub struct MeetupOAuth {
    settings: MeetupSettings,
    http_client: reqwest::Client,
}

impl MeetupOAuth {
    /// Creates a new OAuth client.
    pub fn new(settings: MeetupSettings) -> ProviderResult<Self> {
        let http_client = settings.http_client()?;
        Ok(Self {
            settings,
            http_client,
        })
    }

    async fn token_request(
        &self,
        endpoint: &str,
        signer: OAuthSigner,
        extra: &[(&str, &str)],
    ) -> ProviderResult<(Credential, Option<String>)> {
        let url = parse_url(endpoint)?;
        let header = signer.authorize("POST", &url, extra)?;
        debug!(endpoint = %url, "Requesting OAuth token");

        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await
            .map_err(send_error)?;

        let body = read_body(response).await?;
        parse_token_response(&body)
    }
}

impl OAuthService for MeetupOAuth {
    fn fetch_request_token<'a>(&'a self, consumer: &'a Credential) -> BoxFuture<'a, ProviderResult<Credential>> {
        Box::pin(async move {
            let signer = OAuthSigner::new(consumer.clone());
            let (token, _) = self
                .token_request(
                    &self.settings.request_token_url,
                    signer,
                    &[("oauth_callback", OUT_OF_BAND_CALLBACK)],
                )
                .await?;
            Ok(token)
        })
    }

    fn authorize_url(&self, request_token: &Credential) -> ProviderResult<String> {
        let url = Url::parse_with_params(
            &self.settings.authorize_url,
            &[("oauth_token", request_token.key.as_str())],
        )
        .map_err(|e| invalid_url(&self.settings.authorize_url, e))?;
        Ok(url.into())
    }

    fn fetch_access_token<'a>(
        &'a self,
        consumer: &'a Credential,
        request_token: &'a Credential,
        verifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<AccessGrant>> {
        Box::pin(async move {
            let signer = OAuthSigner::new(consumer.clone()).with_token(request_token.clone());
            let (token, member_id) = self
                .token_request(
                    &self.settings.access_token_url,
                    signer,
                    &[("oauth_verifier", verifier)],
                )
                .await?;
            Ok(AccessGrant { token, member_id })
        })
    }
}

fn parse_url(raw: &str) -> ProviderResult<Url> {
    Url::parse(raw).map_err(|e| invalid_url(raw, e))
}

fn invalid_url(raw: &str, e: url::ParseError) -> ProviderError {
    ProviderError::configuration(format!("invalid URL '{}': {}", raw, e)).with_provider(PROVIDER_NAME)
}

/// Parses a form-encoded token response.
///
/// Returns the token and, for access-token responses, the member id.
fn parse_token_response(body: &str) -> ProviderResult<(Credential, Option<String>)> {
    let mut key = None;
    let mut secret = None;
    let mut member_id = None;

    for (name, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match name.as_ref() {
            "oauth_token" => key = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            "member_id" => member_id = Some(value.into_owned()),
            _ => {}
        }
    }

    match (key, secret) {
        (Some(key), Some(secret)) if !key.is_empty() => Ok((Credential::new(key, secret), member_id)),
        _ => Err(ProviderError::invalid_response(format!(
            "token response is missing oauth_token or oauth_token_secret: {}",
            body
        ))
        .with_provider(PROVIDER_NAME)),
    }
}
