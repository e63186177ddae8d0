//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! # Signing Overview
//!
//! 1. Collect the protocol parameters (`oauth_consumer_key`, `oauth_nonce`, ...)
//! 2. Merge them with the request's query and form parameters
//! 3. Percent-encode, sort and join them into the normalized parameter string
//! 4. Build the signature base string `METHOD&base_uri&params`
//! 5. HMAC-SHA1 it with `consumer_secret&token_secret` and base64 the digest
//! 6. Send the protocol parameters and signature in the `Authorization` header

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;
use url::Url;

use crate::credentials::Credential;
use crate::error::{ProviderError, ProviderResult};

type HmacSha1 = Hmac<Sha1>;

/// The only signature method this module produces.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Protocol version sent with every request.
pub const OAUTH_VERSION: &str = "1.0";

/// Percent-encodes a string as required by RFC 5849 section 3.6.
///
/// Only `A-Z a-z 0-9 - . _ ~` pass through unencoded.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Builds the base string URI: scheme and host lowercased, default port
/// dropped, no query or fragment.
pub fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}

/// Normalizes request parameters into the form used in the base string.
///
/// Names and values are encoded first, then sorted by name and by value for
/// repeated names.
pub fn normalize_parameters<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut encoded: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the signature base string for a request.
///
/// Query parameters are read from `url`; `params` holds the protocol
/// parameters plus any form body parameters.
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let all = query
        .iter()
        .chain(params.iter())
        .filter(|(k, _)| k != "oauth_signature")
        .map(|(k, v)| (k.as_str(), v.as_str()));

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&base_string_uri(url)),
        percent_encode(&normalize_parameters(all))
    )
}

/// Signs a base string with HMAC-SHA1.
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> ProviderResult<String> {
    let key = format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ProviderError::internal(format!("invalid signing key: {}", e)))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Formats the `Authorization` header value from signed parameters.
pub fn authorization_header(params: &[(String, String)]) -> String {
    let fields = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

/// Signs requests on behalf of a consumer and, optionally, a token.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer: Credential,
    token: Option<Credential>,
}

impl OAuthSigner {
    /// Creates a signer for requests made with only the consumer credential.
    pub fn new(consumer: Credential) -> Self {
        Self {
            consumer,
            token: None,
        }
    }

    /// Builder method to sign with a request or access token.
    pub fn with_token(mut self, token: Credential) -> Self {
        self.token = Some(token);
        self
    }

    /// Returns the `Authorization` header for a request.
    ///
    /// `extra` carries protocol parameters specific to the call, such as
    /// `oauth_callback` or `oauth_verifier`.
    pub fn authorize(&self, method: &str, url: &Url, extra: &[(&str, &str)]) -> ProviderResult<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorize_with(method, url, extra, &generate_nonce(), &timestamp)
    }

    /// Like [`OAuthSigner::authorize`] with a fixed nonce and timestamp.
    pub fn authorize_with(
        &self,
        method: &str,
        url: &Url,
        extra: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> ProviderResult<String> {
        let mut params = self.protocol_parameters(nonce, timestamp);
        params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let base = signature_base_string(method, url, &params);
        let token_secret = self.token.as_ref().map(|t| t.secret.as_str()).unwrap_or_default();
        let signature = sign(&base, &self.consumer.secret, token_secret)?;

        params.push(("oauth_signature".to_string(), signature));
        Ok(authorization_header(&params))
    }

    fn protocol_parameters(&self, nonce: &str, timestamp: &str) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer.key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = &self.token {
            params.push(("oauth_token".to_string(), token.key.clone()));
        }
        params
    }
}

/// Generates a nonce from 16 random bytes, hex-encoded.
fn generate_nonce() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
