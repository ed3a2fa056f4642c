//! Secret storage abstraction.
//!
//! API keys never live in the settings table; the embedding application
//! provides a keyring- or file-backed implementation of [`SecretStore`].

use crate::errors::Result;

/// Store for sensitive values such as provider API keys.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, key: &str) -> Result<Option<String>>;
    fn set_secret(&self, key: &str, value: &str) -> Result<()>;
    fn delete_secret(&self, key: &str) -> Result<()>;
}
