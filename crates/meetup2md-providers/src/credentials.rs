//! Credentials and the storage seam used by the OAuth handshake.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

/// A key and secret pair: an OAuth consumer or token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub key: String,
    pub secret: String,
}

impl Credential {
    /// Creates a new credential.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The named places a credential can be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialSlot {
    /// The application key and secret, supplied by the operator.
    Consumer,
    /// The transient request token, only present mid-handshake.
    Request,
    /// The long-lived access token.
    Access,
}

impl CredentialSlot {
    /// All slots, in handshake order.
    pub const ALL: [CredentialSlot; 3] = [Self::Consumer, Self::Request, Self::Access];

    /// Returns the section name used in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Request => "request",
            Self::Access => "access",
        }
    }
}

impl fmt::Display for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence for handshake credentials.
///
/// Implementations keep the slots in memory and write them out on
/// [`TokenStore::persist`]. The handshake persists after every transition.
pub trait TokenStore {
    /// Returns the credential in `slot`, or `None` when the slot is empty.
    ///
    /// A slot holding only a key or only a secret is an error.
    fn credential(&self, slot: CredentialSlot) -> ProviderResult<Option<Credential>>;

    /// Stores a credential in an empty slot.
    ///
    /// Fails when the slot is already occupied.
    fn insert_credential(&mut self, slot: CredentialSlot, credential: &Credential) -> ProviderResult<()>;

    /// Empties a slot. Removing an empty slot is a no-op.
    fn remove_credential(&mut self, slot: CredentialSlot) -> ProviderResult<()>;

    /// Writes the current state to durable storage.
    fn persist(&mut self) -> ProviderResult<()>;
}

/// An in-memory [`TokenStore`].
///
/// Counts how often it was persisted, which makes it handy for tests and
/// dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    slots: HashMap<CredentialSlot, Credential>,
    persist_count: usize,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to pre-fill a slot.
    pub fn with_credential(mut self, slot: CredentialSlot, credential: Credential) -> Self {
        self.slots.insert(slot, credential);
        self
    }

    /// Returns true if the slot holds a credential.
    pub fn contains(&self, slot: CredentialSlot) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Returns how many times [`TokenStore::persist`] was called.
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl TokenStore for MemoryTokenStore {
    fn credential(&self, slot: CredentialSlot) -> ProviderResult<Option<Credential>> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn insert_credential(&mut self, slot: CredentialSlot, credential: &Credential) -> ProviderResult<()> {
        if self.slots.contains_key(&slot) {
            return Err(ProviderError::storage(format!("section '{}' already exists", slot)));
        }
        self.slots.insert(slot, credential.clone());
        Ok(())
    }

    fn remove_credential(&mut self, slot: CredentialSlot) -> ProviderResult<()> {
        self.slots.remove(&slot);
        Ok(())
    }

    fn persist(&mut self) -> ProviderResult<()> {
        self.persist_count += 1;
        Ok(())
    }
}
