//! Three-legged OAuth 1.0a handshake.
//!
//! The handshake spans several CLI invocations. Its progress lives entirely
//! in the [`TokenStore`]: [`HandshakeState::resume`] reads the store back
//! into an explicit state and [`Handshake::advance`] moves it forward as far
//! as it can without operator action.
//!
//! # Flow
//!
//! ```text
//! NoConsumer ──(--consumer)──▶ HaveConsumer ──request token──▶ HaveRequestToken
//!                                  │                                │
//!                                  │ access stored                  │ --verifier
//!                                  ▼                                ▼
//!                            HaveAccessToken ◀──────access token────┘
//! ```
//!
//! Every transition persists the store before the next step runs, so a
//! failure never loses a token that was already issued.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::{Credential, CredentialSlot, TokenStore};
use crate::error::{HandshakeError, ProviderResult};
use crate::provider::OAuthService;

/// Where the handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandshakeState {
    /// No consumer credential is known yet.
    NoConsumer,
    /// A consumer is stored but no token has been requested.
    HaveConsumer { consumer: Credential },
    /// A request token awaits the member's approval.
    HaveRequestToken {
        consumer: Credential,
        request: Credential,
    },
    /// An access token is stored. Terminal.
    HaveAccessToken {
        consumer: Credential,
        access: Credential,
    },
}

impl HandshakeState {
    /// Reconstructs the state from stored credentials.
    ///
    /// A stored access token wins over a leftover request token.
    pub fn resume<S: TokenStore + ?Sized>(store: &S) -> ProviderResult<Self> {
        let Some(consumer) = store.credential(CredentialSlot::Consumer)? else {
            return Ok(Self::NoConsumer);
        };

        if let Some(access) = store.credential(CredentialSlot::Access)? {
            return Ok(Self::HaveAccessToken { consumer, access });
        }

        match store.credential(CredentialSlot::Request)? {
            Some(request) => Ok(Self::HaveRequestToken { consumer, request }),
            None => Ok(Self::HaveConsumer { consumer }),
        }
    }

    /// Returns true once an access token is available.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::HaveAccessToken { .. })
    }

    /// Returns a short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoConsumer => "no_consumer",
            Self::HaveConsumer { .. } => "have_consumer",
            Self::HaveRequestToken { .. } => "have_request_token",
            Self::HaveAccessToken { .. } => "have_access_token",
        }
    }
}

/// What the operator supplied on this invocation.
#[derive(Debug, Clone, Default)]
pub struct HandshakeInput {
    /// Consumer credential, used only when none is stored yet.
    pub consumer: Option<Credential>,
    /// Verifier code shown after approving the request token.
    pub verifier: Option<String>,
}

impl HandshakeInput {
    /// Builder method to supply a consumer credential.
    pub fn with_consumer(mut self, consumer: Credential) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Builder method to supply a verifier.
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.verifier = Some(verifier.into());
        self
    }
}

/// Credentials for signed API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSession {
    pub consumer: Credential,
    pub access: Credential,
    /// Set only on the invocation that completed the exchange.
    pub member_id: Option<String>,
}

/// How far a handshake got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// API calls can be made.
    Authorized(AuthorizedSession),
    /// The member must approve access at `authorize_url`, then the program
    /// is run again with the verifier.
    PendingAuthorization { authorize_url: String },
}

/// Drives the handshake against an [`OAuthService`].
#[derive(Debug)]
pub struct Handshake<'a, O: OAuthService + ?Sized> {
    service: &'a O,
}

impl<'a, O: OAuthService + ?Sized> Handshake<'a, O> {
    /// Creates a handshake using `service` for the token endpoints.
    pub fn new(service: &'a O) -> Self {
        Self { service }
    }

    /// Advances the handshake as far as possible.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::MissingConsumerCredentials`] when no consumer is
    ///   stored and `input` has none
    /// - [`HandshakeError::MissingVerifier`] when a request token is pending
    ///   and `input` has no verifier
    /// - [`HandshakeError::Provider`] when a token endpoint or the store fails
    pub async fn advance<S: TokenStore + ?Sized>(
        &self,
        store: &mut S,
        input: HandshakeInput,
    ) -> Result<HandshakeOutcome, HandshakeError> {
        let mut state = HandshakeState::resume(store)?;
        debug!(state = state.name(), "Resumed handshake");

        if input.consumer.is_some() && !matches!(state, HandshakeState::NoConsumer) {
            debug!("Consumer already stored, ignoring supplied consumer");
        }

        loop {
            state = match state {
                HandshakeState::NoConsumer => {
                    let consumer = input
                        .consumer
                        .clone()
                        .ok_or(HandshakeError::MissingConsumerCredentials)?;
                    store.insert_credential(CredentialSlot::Consumer, &consumer)?;
                    store.persist()?;
                    info!("Stored consumer credentials");
                    HandshakeState::HaveConsumer { consumer }
                }

                HandshakeState::HaveConsumer { consumer } => {
                    let request = self.service.fetch_request_token(&consumer).await?;
                    store.insert_credential(CredentialSlot::Request, &request)?;
                    store.persist()?;
                    let authorize_url = self.service.authorize_url(&request)?;
                    info!("Request token obtained, authorization required");
                    return Ok(HandshakeOutcome::PendingAuthorization { authorize_url });
                }

                HandshakeState::HaveRequestToken { consumer, request } => {
                    let verifier = input
                        .verifier
                        .as_deref()
                        .filter(|v| !v.is_empty())
                        .ok_or(HandshakeError::MissingVerifier)?;
                    let grant = self
                        .service
                        .fetch_access_token(&consumer, &request, verifier)
                        .await?;
                    store.insert_credential(CredentialSlot::Access, &grant.token)?;
                    store.remove_credential(CredentialSlot::Request)?;
                    store.persist()?;
                    info!(member_id = grant.member_id.as_deref().unwrap_or("unknown"), "Access granted");
                    return Ok(HandshakeOutcome::Authorized(AuthorizedSession {
                        consumer,
                        access: grant.token,
                        member_id: grant.member_id,
                    }));
                }

                HandshakeState::HaveAccessToken { consumer, access } => {
                    debug!("Using stored access token");
                    return Ok(HandshakeOutcome::Authorized(AuthorizedSession {
                        consumer,
                        access,
                        member_id: None,
                    }));
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::credentials::MemoryTokenStore;
    use crate::error::{ProviderError, ProviderErrorCode};
    use crate::provider::{AccessGrant, BoxFuture};

    /// Token endpoints answering from memory and counting calls.
    #[derive(Default)]
    struct FakeOAuth {
        request_calls: AtomicUsize,
        access_calls: AtomicUsize,
        reject_verifier: bool,
    }

    impl OAuthService for FakeOAuth {
        fn fetch_request_token<'a>(&'a self, consumer: &'a Credential) -> BoxFuture<'a, ProviderResult<Credential>> {
            self.request_calls.fetch_add(1, Ordering::SeqCst);
            let result: ProviderResult<Credential> =
                Ok(Credential::new(format!("req-for-{}", consumer.key), "req-secret"));
            Box::pin(async move { result })
        }

        fn authorize_url(&self, request_token: &Credential) -> ProviderResult<String> {
            Ok(format!("https://auth.example.com/authorize/?oauth_token={}", request_token.key))
        }

        fn fetch_access_token<'a>(
            &'a self,
            _consumer: &'a Credential,
            request_token: &'a Credential,
            verifier: &'a str,
        ) -> BoxFuture<'a, ProviderResult<AccessGrant>> {
            self.access_calls.fetch_add(1, Ordering::SeqCst);
            let result: ProviderResult<AccessGrant> = if self.reject_verifier {
                Err(ProviderError::authentication("invalid verifier"))
            } else {
                Ok(AccessGrant {
                    token: Credential::new(format!("acc-{}-{}", request_token.key, verifier), "acc-secret"),
                    member_id: Some("4242".to_string()),
                })
            };
            Box::pin(async move { result })
        }
    }

    fn consumer() -> Credential {
        Credential::new("ck", "cs")
    }

    mod resume {
        use super::*;

        #[test]
        fn empty_store() {
            let store = MemoryTokenStore::new();
            assert_eq!(HandshakeState::resume(&store).unwrap(), HandshakeState::NoConsumer);
        }

        #[test]
        fn consumer_only() {
            let store = MemoryTokenStore::new().with_credential(CredentialSlot::Consumer, consumer());
            let state = HandshakeState::resume(&store).unwrap();
            assert_eq!(state, HandshakeState::HaveConsumer { consumer: consumer() });
            assert!(!state.is_authorized());
        }

        #[test]
        fn access_wins_over_request() {
            let store = MemoryTokenStore::new()
                .with_credential(CredentialSlot::Consumer, consumer())
                .with_credential(CredentialSlot::Request, Credential::new("rk", "rs"))
                .with_credential(CredentialSlot::Access, Credential::new("ak", "as"));
            let state = HandshakeState::resume(&store).unwrap();
            assert!(state.is_authorized());
            assert_eq!(state.name(), "have_access_token");
        }

        #[test]
        fn tokens_without_consumer_are_ignored() {
            let store = MemoryTokenStore::new().with_credential(CredentialSlot::Access, Credential::new("ak", "as"));
            assert_eq!(HandshakeState::resume(&store).unwrap(), HandshakeState::NoConsumer);
        }

        #[test]
        fn state_serializes_with_tag() {
            let state = HandshakeState::HaveConsumer { consumer: consumer() };
            let json = serde_json::to_value(&state).unwrap();
            assert_eq!(json["state"], "have_consumer");
            assert_eq!(json["consumer"]["key"], "ck");
            let back: HandshakeState = serde_json::from_value(json).unwrap();
            assert_eq!(back, state);
        }
    }

    #[tokio::test]
    async fn missing_consumer_fails() {
        let service = FakeOAuth::default();
        let mut store = MemoryTokenStore::new();

        let err = Handshake::new(&service)
            .advance(&mut store, HandshakeInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, HandshakeError::MissingConsumerCredentials));
        assert_eq!(store.persist_count(), 0);
    }

    #[tokio::test]
    async fn consumer_then_verifier_completes() {
        let service = FakeOAuth::default();
        let mut store = MemoryTokenStore::new().with_credential(CredentialSlot::Consumer, consumer());
        let handshake = Handshake::new(&service);

        let first = handshake
            .advance(&mut store, HandshakeInput::default())
            .await
            .unwrap();
        match first {
            HandshakeOutcome::PendingAuthorization { authorize_url } => {
                assert!(authorize_url.ends_with("oauth_token=req-for-ck"));
            }
            other => panic!("expected pending authorization, got {:?}", other),
        }
        assert_eq!(
            store.credential(CredentialSlot::Request).unwrap(),
            Some(Credential::new("req-for-ck", "req-secret"))
        );
        assert_eq!(store.persist_count(), 1);

        let second = handshake
            .advance(&mut store, HandshakeInput::default().with_verifier("123456"))
            .await
            .unwrap();
        let HandshakeOutcome::Authorized(session) = second else {
            panic!("expected authorized outcome");
        };
        assert_eq!(session.consumer, consumer());
        assert_eq!(session.access.key, "acc-req-for-ck-123456");
        assert_eq!(session.member_id.as_deref(), Some("4242"));

        assert!(store.contains(CredentialSlot::Access));
        assert!(!store.contains(CredentialSlot::Request));
        assert_eq!(store.persist_count(), 2);
        assert_eq!(service.request_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.access_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn supplied_consumer_is_stored_first() {
        let service = FakeOAuth::default();
        let mut store = MemoryTokenStore::new();

        let outcome = Handshake::new(&service)
            .advance(&mut store, HandshakeInput::default().with_consumer(consumer()))
            .await
            .unwrap();

        assert!(matches!(outcome, HandshakeOutcome::PendingAuthorization { .. }));
        assert_eq!(store.credential(CredentialSlot::Consumer).unwrap(), Some(consumer()));
        assert!(store.contains(CredentialSlot::Request));
        assert_eq!(store.persist_count(), 2);
    }

    #[tokio::test]
    async fn stored_consumer_is_not_replaced() {
        let service = FakeOAuth::default();
        let mut store = MemoryTokenStore::new().with_credential(CredentialSlot::Consumer, consumer());

        Handshake::new(&service)
            .advance(
                &mut store,
                HandshakeInput::default().with_consumer(Credential::new("other", "x")),
            )
            .await
            .unwrap();

        assert_eq!(store.credential(CredentialSlot::Consumer).unwrap(), Some(consumer()));
    }

    #[tokio::test]
    async fn pending_request_requires_verifier() {
        let service = FakeOAuth::default();
        let mut store = MemoryTokenStore::new()
            .with_credential(CredentialSlot::Consumer, consumer())
            .with_credential(CredentialSlot::Request, Credential::new("rk", "rs"));

        let err = Handshake::new(&service)
            .advance(&mut store, HandshakeInput::default().with_verifier(""))
            .await
            .unwrap_err();

        assert!(matches!(err, HandshakeError::MissingVerifier));
        assert!(store.contains(CredentialSlot::Request));
        assert_eq!(service.access_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_verifier_keeps_request_token() {
        let service = FakeOAuth {
            reject_verifier: true,
            ..Default::default()
        };
        let mut store = MemoryTokenStore::new()
            .with_credential(CredentialSlot::Consumer, consumer())
            .with_credential(CredentialSlot::Request, Credential::new("rk", "rs"));

        let err = Handshake::new(&service)
            .advance(&mut store, HandshakeInput::default().with_verifier("bad"))
            .await
            .unwrap_err();

        let HandshakeError::Provider(inner) = err else {
            panic!("expected provider error");
        };
        assert_eq!(inner.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(store.contains(CredentialSlot::Request));
        assert!(!store.contains(CredentialSlot::Access));
    }

    #[tokio::test]
    async fn stored_access_short_circuits() {
        let service = FakeOAuth::default();
        let mut store = MemoryTokenStore::new()
            .with_credential(CredentialSlot::Consumer, consumer())
            .with_credential(CredentialSlot::Access, Credential::new("ak", "as"));

        let outcome = Handshake::new(&service)
            .advance(&mut store, HandshakeInput::default().with_verifier("ignored"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            HandshakeOutcome::Authorized(AuthorizedSession {
                consumer: consumer(),
                access: Credential::new("ak", "as"),
                member_id: None,
            })
        );
        assert_eq!(service.request_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.access_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.persist_count(), 0);
    }
}
