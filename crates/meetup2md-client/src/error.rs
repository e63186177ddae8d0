//! Client error types.

use std::path::PathBuf;

use thiserror::Error;

use meetup2md_core::CoreError;
use meetup2md_providers::{HandshakeError, ProviderError, CONSUMER_REGISTRATION_URL};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No consumer credentials are stored and none were passed.
    #[error(
        "please pass the consumer key and secret with --consumer KEY SECRET\n\
         set up a key and secret here: {}",
        CONSUMER_REGISTRATION_URL
    )]
    MissingConsumerCredentials,

    /// A request token is pending and `--verifier` was not given.
    #[error("to complete the authorization you must supply a --verifier")]
    MissingVerifier,

    /// The group to fetch could not be resolved from CLI or configuration.
    #[error("must specify the name of the group to retrieve events from (--group-name or group_name in [events])")]
    MissingGroupName,

    /// The configured output directory does not exist.
    #[error("output directory must already exist: {}", .0.display())]
    OutputDirectoryMissing(PathBuf),

    /// A credential section or one of its keys is absent.
    #[error("missing credential: [{section}] has no {key}")]
    MissingCredential { section: String, key: &'static str },

    /// A credential section was added twice.
    #[error("section [{0}] already exists")]
    DuplicateSection(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Event API or OAuth error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Transformation or export error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Returns true for errors that are usage mistakes on the command line.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::MissingGroupName)
    }
}

impl From<HandshakeError> for ClientError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::MissingConsumerCredentials => Self::MissingConsumerCredentials,
            HandshakeError::MissingVerifier => Self::MissingVerifier,
            HandshakeError::Provider(e) => Self::Provider(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_errors_map_to_client_errors() {
        assert!(matches!(
            ClientError::from(HandshakeError::MissingVerifier),
            ClientError::MissingVerifier
        ));
        assert!(matches!(
            ClientError::from(HandshakeError::MissingConsumerCredentials),
            ClientError::MissingConsumerCredentials
        ));
        assert!(matches!(
            ClientError::from(HandshakeError::Provider(ProviderError::network("down"))),
            ClientError::Provider(_)
        ));
    }

    #[test]
    fn missing_consumer_points_to_registration() {
        let msg = ClientError::MissingConsumerCredentials.to_string();
        assert!(msg.contains("--consumer"));
        assert!(msg.contains(CONSUMER_REGISTRATION_URL));
    }

    #[test]
    fn only_missing_group_is_usage() {
        assert!(ClientError::MissingGroupName.is_usage());
        assert!(!ClientError::MissingVerifier.is_usage());
        assert!(!ClientError::OutputDirectoryMissing(PathBuf::from("/nope")).is_usage());
    }

    #[test]
    fn display_messages() {
        let err = ClientError::MissingCredential {
            section: "access".to_string(),
            key: "secret",
        };
        assert_eq!(err.to_string(), "missing credential: [access] has no secret");
        assert_eq!(
            ClientError::DuplicateSection("request".to_string()).to_string(),
            "section [request] already exists"
        );
    }
}
