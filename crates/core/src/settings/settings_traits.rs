//! Repository traits for settings.

use async_trait::async_trait;

use crate::errors::Result;

/// Repository trait for managing application settings.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Get a single setting value by key. Missing keys yield a not-found error.
    fn get_setting(&self, setting_key: &str) -> Result<String>;

    /// Insert or update a single setting.
    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()>;
}
