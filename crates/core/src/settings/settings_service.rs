use super::SettingsRepositoryTrait;
use crate::errors::{DatabaseError, Error, Result};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

/// Settings key holding the user's base currency.
pub const BASE_CURRENCY_KEY: &str = "base_currency";

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_base_currency(&self) -> Result<Option<String>>;

    /// Get a single setting value by key. Returns None if not found.
    fn get_setting_value(&self, key: &str) -> Result<Option<String>>;

    /// Set a single setting value by key.
    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()>;
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        Self {
            settings_repository,
        }
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_base_currency(&self) -> Result<Option<String>> {
        self.get_setting_value(BASE_CURRENCY_KEY)
    }

    fn get_setting_value(&self, key: &str) -> Result<Option<String>> {
        match self.settings_repository.get_setting(key) {
            Ok(value) => Ok(Some(value)),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()> {
        debug!("Updating setting {}", key);
        self.settings_repository.update_setting(key, value).await
    }
}
