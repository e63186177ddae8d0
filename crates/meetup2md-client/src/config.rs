//! Configuration file: credentials, event options and client overrides.
//!
//! The file is TOML with one table per section:
//!
//! ```toml
//! [consumer]
//! key = "..."
//! secret = "..."
//!
//! [access]
//! key = "..."
//! secret = "..."
//!
//! [events]
//! group_name = "rust-meetup"
//! output_dir = "content/events"
//!
//! [internal]
//! timeout_secs = "10"
//! ```
//!
//! Edits go through `toml_edit`, so comments and unknown keys survive a
//! save.

use std::fs;
use std::path::{Path, PathBuf};

use toml_edit::{DocumentMut, Item, Table};
use tracing::debug;

use meetup2md_providers::{Credential, CredentialSlot, ProviderError, ProviderResult, TokenStore};

use crate::error::{ClientError, ClientResult};

/// Section holding default event options.
pub const EVENTS_SECTION: &str = "events";

/// Section holding API client overrides.
pub const INTERNAL_SECTION: &str = "internal";

/// The persisted configuration file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    doc: DocumentMut,
}

impl CredentialStore {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetup2md")
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing file yields an empty configuration bound to that path.
    pub fn load(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, starting empty", path.display());
                String::new()
            }
            Err(e) => {
                return Err(ClientError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        Self::parse(path, &content)
    }

    /// Parses configuration text bound to `path`.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> ClientResult<Self> {
        let path = path.into();
        let doc = content.parse::<DocumentMut>().map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Self { path, doc })
    }

    /// Returns the file this configuration is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the section exists.
    pub fn has_section(&self, name: &str) -> bool {
        self.doc.get(name).is_some_and(Item::is_table_like)
    }

    /// Returns the credential stored in section `name`.
    pub fn get(&self, name: &str) -> ClientResult<Credential> {
        let key = self.credential_field(name, "key")?;
        let secret = self.credential_field(name, "secret")?;
        Ok(Credential::new(key, secret))
    }

    fn credential_field(&self, name: &str, field: &'static str) -> ClientResult<String> {
        self.doc
            .get(name)
            .and_then(|section| section.get(field))
            .and_then(scalar)
            .ok_or_else(|| ClientError::MissingCredential {
                section: name.to_string(),
                key: field,
            })
    }

    /// Adds a credential section.
    ///
    /// Fails with [`ClientError::DuplicateSection`] if the section exists.
    pub fn set(&mut self, name: &str, key: &str, secret: &str) -> ClientResult<()> {
        if self.doc.contains_key(name) {
            return Err(ClientError::DuplicateSection(name.to_string()));
        }
        let mut table = Table::new();
        table["key"] = toml_edit::value(key);
        table["secret"] = toml_edit::value(secret);
        self.doc[name] = Item::Table(table);
        Ok(())
    }

    /// Removes a section, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.doc.remove(name).is_some()
    }

    /// Adds an empty section if it does not exist yet.
    pub fn ensure_section(&mut self, name: &str) {
        if !self.doc.contains_key(name) {
            self.doc[name] = Item::Table(Table::new());
        }
    }

    /// Resolves an event option.
    ///
    /// The command-line value wins, then `[events]`. Empty strings count as
    /// unset at both levels.
    pub fn option(&self, name: &str, cli_value: Option<&str>) -> Option<String> {
        cli_value
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.doc
                    .get(EVENTS_SECTION)
                    .and_then(|events| events.get(name))
                    .and_then(scalar)
                    .filter(|v| !v.is_empty())
            })
    }

    /// Resolves an event option with a fallback.
    pub fn option_or(&self, name: &str, cli_value: Option<&str>, fallback: &str) -> String {
        self.option(name, cli_value)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Returns the `[internal]` overrides as key/value pairs.
    pub fn internal_overrides(&self) -> Vec<(String, String)> {
        let Some(table) = self.doc.get(INTERNAL_SECTION).and_then(Item::as_table_like) else {
            return Vec::new();
        };
        table
            .iter()
            .filter_map(|(key, item)| scalar(item).map(|value| (key.to_string(), value)))
            .collect()
    }

    /// Saves the configuration to its own path.
    pub fn save(&self) -> ClientResult<()> {
        self.save_to(&self.path)
    }

    /// Saves the configuration to `path`, replacing the file.
    pub fn save_to(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Config(format!(
                    "failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(path, self.doc.to_string()).map_err(|e| {
            ClientError::Config(format!("failed to write {}: {}", path.display(), e))
        })?;

        // The file holds OAuth secrets
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(path, perms);
        }

        debug!("Saved configuration to {}", path.display());
        Ok(())
    }
}

impl TokenStore for CredentialStore {
    fn credential(&self, slot: CredentialSlot) -> ProviderResult<Option<Credential>> {
        if !self.has_section(slot.as_str()) {
            return Ok(None);
        }
        self.get(slot.as_str()).map(Some).map_err(storage_error)
    }

    fn insert_credential(&mut self, slot: CredentialSlot, credential: &Credential) -> ProviderResult<()> {
        self.set(slot.as_str(), &credential.key, &credential.secret)
            .map_err(storage_error)
    }

    fn remove_credential(&mut self, slot: CredentialSlot) -> ProviderResult<()> {
        self.remove(slot.as_str());
        Ok(())
    }

    fn persist(&mut self) -> ProviderResult<()> {
        self.save().map_err(storage_error)
    }
}

fn storage_error(err: ClientError) -> ProviderError {
    ProviderError::storage(err.to_string()).with_source(err)
}

/// Reads a scalar value as a string. Tables and arrays are not scalars.
fn scalar(item: &Item) -> Option<String> {
    let value = item.as_value()?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    if let Some(i) = value.as_integer() {
        return Some(i.to_string());
    }
    if let Some(f) = value.as_float() {
        return Some(f.to_string());
    }
    value.as_bool().map(|b| b.to_string())
}
