//! User settings wire types

use crate::locale::Locale;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_notifications")]
    pub notifications_enabled: bool,
    /// `None` until the user first saves a change
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_notifications() -> bool {
    true
}

impl UserSettings {
    /// Settings for a user who never saved any
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            locale: Locale::default(),
            notifications_enabled: default_notifications(),
            updated_at: None,
        }
    }

    pub fn apply(&mut self, request: &UpdateSettingsRequest, now: DateTime<Utc>) {
        if let Some(locale) = request.locale {
            self.locale = locale;
        }
        if let Some(enabled) = request.notifications_enabled {
            self.notifications_enabled = enabled;
        }
        self.updated_at = Some(now);
    }
}

/// Partial update request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub locale: Option<Locale>,
    pub notifications_enabled: Option<bool>,
}
