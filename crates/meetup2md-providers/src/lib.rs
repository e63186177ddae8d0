//! OAuth handshake and event API adapters.
//!
//! This crate connects meetup2md to the outside world:
//!
//! - [`oauth1`] - RFC 5849 HMAC-SHA1 request signing
//! - [`TokenStore`] - Where handshake credentials are persisted
//! - [`Handshake`] - The three-legged OAuth flow as an explicit state machine
//! - [`EventSource`] - Lists group events as [`meetup2md_core::EventRecord`]s
//! - [`meetup`] - The Meetup implementation of both service traits
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   advance()   ┌──────────────┐
//! │  TokenStore  │◀─────────────▶│  Handshake   │──▶ MeetupOAuth
//! └──────────────┘               └──────┬───────┘
//!                                       │ AuthorizedSession
//!                                       ▼
//!                                ┌──────────────┐
//!                                │ MeetupClient │──▶ Vec<EventRecord>
//!                                └──────────────┘
//! ```

pub mod credentials;
pub mod error;
pub mod handshake;
pub mod meetup;
pub mod oauth1;
pub mod provider;

// Re-export main types at crate root
pub use credentials::{Credential, CredentialSlot, MemoryTokenStore, TokenStore};
pub use error::{
    CONSUMER_REGISTRATION_URL, HandshakeError, ProviderError, ProviderErrorCode, ProviderResult,
};
pub use handshake::{
    AuthorizedSession, Handshake, HandshakeInput, HandshakeOutcome, HandshakeState,
};
pub use provider::{AccessGrant, BoxFuture, ErrorSource, EventQuery, EventSource, OAuthService};
