//! User settings persistence
//!
//! One JSON file per user under `<base>/settings/`. User ids come from an
//! upstream gateway and may contain characters that are not safe in file
//! names, so files are keyed by the hex-encoded id.

use crate::error::Result;
use crate::locale::Locale;
use crate::settings::types::{UpdateSettingsRequest, UserSettings};
use crate::storage;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct SettingsStore {
    dir: PathBuf,
    items: RwLock<HashMap<String, UserSettings>>,
}

fn file_id(user_id: &str) -> String {
    user_id
        .bytes()
        .fold(String::from("usr-"), |mut acc, b| {
            let _ = write!(acc, "{:02x}", b);
            acc
        })
}

impl SettingsStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        let items: HashMap<String, UserSettings> = storage::load_json_files::<UserSettings>(&dir)
            .into_iter()
            .map(|s| (s.user_id.clone(), s))
            .collect();
        tracing::debug!(count = items.len(), "Settings loaded from {}", dir.display());
        Ok(Self {
            dir,
            items: RwLock::new(items),
        })
    }

    /// Stored settings, or defaults when the user never saved any
    pub async fn get(&self, user_id: &str) -> UserSettings {
        self.items
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserSettings::defaults_for(user_id))
    }

    pub async fn locale(&self, user_id: &str) -> Locale {
        self.get(user_id).await.locale
    }

    pub async fn update(
        &self,
        user_id: &str,
        request: &UpdateSettingsRequest,
        now: DateTime<Utc>,
    ) -> Result<UserSettings> {
        let mut items = self.items.write().await;
        let mut next = items
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserSettings::defaults_for(user_id));
        next.apply(request, now);
        storage::write_json(&self.dir, &file_id(user_id), &next).await?;
        items.insert(user_id.to_string(), next.clone());
        Ok(next)
    }

    /// Forget stored settings so defaults apply again
    pub async fn reset(&self, user_id: &str) -> Result<UserSettings> {
        let mut items = self.items.write().await;
        storage::remove_json(&self.dir, &file_id(user_id)).await?;
        items.remove(user_id);
        Ok(UserSettings::defaults_for(user_id))
    }
}
