//! Settings module - key/value application settings.

mod settings_service;
mod settings_traits;

pub use settings_service::{SettingsService, SettingsServiceTrait, BASE_CURRENCY_KEY};
pub use settings_traits::SettingsRepositoryTrait;
