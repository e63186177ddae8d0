//! Authorization step.

use std::io;

use tracing::{info, warn};

use meetup2md_providers::{
    AuthorizedSession, Handshake, HandshakeInput, HandshakeOutcome, OAuthService,
};

use crate::cli::Cli;
use crate::config::{CredentialStore, EVENTS_SECTION};
use crate::error::ClientResult;

/// Builds the handshake input from the command line.
pub fn handshake_input(cli: &Cli) -> HandshakeInput {
    let mut input = HandshakeInput::default();
    if let Some(consumer) = cli.consumer_credential() {
        input = input.with_consumer(consumer);
    }
    if let Some(verifier) = cli.verifier.as_deref() {
        input = input.with_verifier(verifier);
    }
    input
}

/// Advances the OAuth handshake and opens the browser when the member has
/// to approve access.
///
/// An empty `[events]` section is added on the first run, and the
/// configuration is saved whether or not authorization is still pending.
///
/// Returns `None` while authorization is pending; the program should then
/// exit successfully and be run again with `--verifier`.
pub async fn authorize<O: OAuthService + ?Sized>(
    service: &O,
    store: &mut CredentialStore,
    input: HandshakeInput,
) -> ClientResult<Option<AuthorizedSession>> {
    authorize_with(service, store, input, |url| open::that(url)).await
}

/// Like [`authorize`], with the browser launcher supplied by the caller.
pub async fn authorize_with<O, L>(
    service: &O,
    store: &mut CredentialStore,
    input: HandshakeInput,
    launch: L,
) -> ClientResult<Option<AuthorizedSession>>
where
    O: OAuthService + ?Sized,
    L: FnOnce(&str) -> io::Result<()>,
{
    store.ensure_section(EVENTS_SECTION);
    let outcome = Handshake::new(service).advance(store, input).await?;
    store.save()?;

    match outcome {
        HandshakeOutcome::Authorized(session) => {
            if let Some(member_id) = session.member_id.as_deref() {
                info!(member_id, "Authorization complete");
                println!("Authorized as member {}.", member_id);
            }
            Ok(Some(session))
        }
        HandshakeOutcome::PendingAuthorization { authorize_url } => {
            println!("Approve access to your Meetup account in the browser,");
            println!("then run again with --verifier CODE.");
            if let Err(e) = launch(&authorize_url) {
                warn!("Could not open browser: {}", e);
                println!();
                println!("Open this URL to authorize:");
                println!("  {}", authorize_url);
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use clap::Parser;
    use meetup2md_providers::{
        AccessGrant, BoxFuture, Credential, ProviderError, ProviderResult,
    };

    use super::*;
    use crate::error::ClientError;

    #[derive(Default)]
    struct FakeOAuth {
        request_calls: AtomicUsize,
        access_calls: AtomicUsize,
    }

    impl OAuthService for FakeOAuth {
        fn fetch_request_token<'a>(
            &'a self,
            _consumer: &'a Credential,
        ) -> BoxFuture<'a, ProviderResult<Credential>> {
            self.request_calls.fetch_add(1, Ordering::SeqCst);
            let result: ProviderResult<Credential> = Ok(Credential::new("rk", "rs"));
            Box::pin(async move { result })
        }

        fn authorize_url(&self, request: &Credential) -> ProviderResult<String> {
            Ok(format!("https://meetup.test/authorize/?oauth_token={}", request.key))
        }

        fn fetch_access_token<'a>(
            &'a self,
            _consumer: &'a Credential,
            request: &'a Credential,
            verifier: &'a str,
        ) -> BoxFuture<'a, ProviderResult<AccessGrant>> {
            self.access_calls.fetch_add(1, Ordering::SeqCst);
            let result: ProviderResult<AccessGrant> = if request.key == "rk" && verifier == "1234" {
                Ok(AccessGrant {
                    token: Credential::new("ak", "as"),
                    member_id: Some("42".to_string()),
                })
            } else {
                Err(ProviderError::authentication("bad verifier"))
            };
            Box::pin(async move { result })
        }
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["meetup2md"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn store_at(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::load(dir.path().join("config.toml")).unwrap()
    }

    #[test]
    fn input_from_cli() {
        let input = handshake_input(&cli(&["--consumer", "ck", "cs", "--verifier", "1234"]));
        assert_eq!(input.consumer, Some(Credential::new("ck", "cs")));
        assert_eq!(input.verifier.as_deref(), Some("1234"));

        let input = handshake_input(&cli(&[]));
        assert!(input.consumer.is_none());
        assert!(input.verifier.is_none());
    }

    #[tokio::test]
    async fn pending_then_authorized() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeOAuth::default();
        let opened = RefCell::new(Vec::new());

        let mut store = store_at(&dir);
        let session = authorize_with(
            &service,
            &mut store,
            handshake_input(&cli(&["--consumer", "ck", "cs"])),
            |url| {
                opened.borrow_mut().push(url.to_string());
                Ok(())
            },
        )
        .await
        .unwrap();
        assert!(session.is_none());
        assert_eq!(opened.borrow().len(), 1);
        let saved = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
        assert!(saved.contains("[events]"));
        assert!(opened.borrow()[0].contains("oauth_token=rk"));

        // A fresh load sees what the first run persisted
        let mut store = store_at(&dir);
        assert!(store.has_section("request"));
        let session = authorize_with(
            &service,
            &mut store,
            handshake_input(&cli(&["--verifier", "1234"])),
            |_| panic!("browser must not open once authorized"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(session.access, Credential::new("ak", "as"));
        assert_eq!(session.member_id.as_deref(), Some("42"));

        let store = store_at(&dir);
        assert!(store.has_section("access"));
        assert!(!store.has_section("request"));
        assert_eq!(service.request_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.access_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn browser_failure_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);
        let session = authorize_with(
            &FakeOAuth::default(),
            &mut store,
            handshake_input(&cli(&["--consumer", "ck", "cs"])),
            |_| Err(io::Error::other("no display")),
        )
        .await
        .unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn missing_consumer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);
        let err = authorize_with(&FakeOAuth::default(), &mut store, HandshakeInput::default(), |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingConsumerCredentials));
    }

    #[tokio::test]
    async fn stored_access_run_adds_events_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# keep me\n[consumer]\nkey = \"ck\"\nsecret = \"cs\"\n[access]\nkey = \"ak\"\nsecret = \"as\"\n",
        )
        .unwrap();

        let mut store = store_at(&dir);
        authorize_with(&FakeOAuth::default(), &mut store, HandshakeInput::default(), |_| Ok(()))
            .await
            .unwrap()
            .unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("# keep me\n"));
        assert!(saved.contains("[events]"));
    }

    #[tokio::test]
    async fn missing_verifier() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);
        store.set("consumer", "ck", "cs").unwrap();
        store.set("request", "rk", "rs").unwrap();

        let err = authorize_with(&FakeOAuth::default(), &mut store, HandshakeInput::default(), |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingVerifier));
    }

    #[tokio::test]
    async fn stored_access_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_at(&dir);
        store.set("consumer", "ck", "cs").unwrap();
        store.set("access", "ak", "as").unwrap();

        let service = FakeOAuth::default();
        let session = authorize_with(&service, &mut store, HandshakeInput::default(), |_| Ok(()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.consumer, Credential::new("ck", "cs"));
        assert!(session.member_id.is_none());
        assert_eq!(service.request_calls.load(Ordering::SeqCst), 0);
    }
}
