//! Journal store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base>/journal/
//! ├── jrn-<uuid>.json
//! └── ...
//! ```
//!
//! Entries are only ever appended.

use crate::error::Result;
use crate::journal::types::JournalEntry;
use crate::storage;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JournalStore {
    dir: PathBuf,
    /// Ordered by (created_at, id), oldest first
    entries: RwLock<Vec<JournalEntry>>,
}

fn order_key(entry: &JournalEntry) -> (chrono::DateTime<chrono::Utc>, &str) {
    (entry.created_at, entry.id.as_str())
}

impl JournalStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        let mut entries = storage::load_json_files::<JournalEntry>(&dir);
        entries.sort_by(|a, b| order_key(a).cmp(&order_key(b)));
        tracing::info!(count = entries.len(), "Journal loaded from {}", dir.display());
        Ok(Self {
            dir,
            entries: RwLock::new(entries),
        })
    }

    /// Persist and append entries. Entries written before a failure stay.
    ///
    /// Entries are placed by (created_at, id), not by arrival order.
    pub async fn append(&self, new_entries: Vec<JournalEntry>) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let mut written = 0;
        for entry in new_entries {
            storage::write_json(&self.dir, &entry.id, &entry).await?;
            let at = entries.partition_point(|e| order_key(e) <= order_key(&entry));
            entries.insert(at, entry);
            written += 1;
        }
        Ok(written)
    }

    /// A user's entries, newest first, optionally limited to one experiment
    pub async fn list_for_user(
        &self,
        user_id: &str,
        experiment_id: Option<&str>,
    ) -> Vec<JournalEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .filter(|e| experiment_id.map_or(true, |id| e.experiment_id == id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn entry(user: &str, experiment: &str, minutes: i64, response: &str) -> JournalEntry {
        JournalEntry {
            id: storage::new_id("jrn"),
            user_id: user.to_string(),
            subscription_id: "sub-1".to_string(),
            experiment_id: experiment.to_string(),
            task_id: "task-1".to_string(),
            day_number: 1,
            block_id: "notes".to_string(),
            created_at: Utc::now() + Duration::minutes(minutes),
            response: response.to_string(),
        }
    }

    #[tokio::test]
    async fn test_newest_first_and_filters() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path().to_path_buf()).await.unwrap();
        store
            .append(vec![
                entry("u1", "exp-1", 0, "first"),
                entry("u1", "exp-2", 1, "second"),
                entry("u2", "exp-1", 2, "other user"),
                entry("u1", "exp-1", 3, "third"),
            ])
            .await
            .unwrap();

        let all: Vec<String> = store
            .list_for_user("u1", None)
            .await
            .into_iter()
            .map(|e| e.response)
            .collect();
        assert_eq!(all, vec!["third", "second", "first"]);

        let exp1 = store.list_for_user("u1", Some("exp-1")).await;
        assert_eq!(exp1.len(), 2);
        assert!(exp1.iter().all(|e| e.experiment_id == "exp-1"));
    }

    #[tokio::test]
    async fn test_late_append_keeps_time_order() {
        let dir = TempDir::new().unwrap();
        let store = JournalStore::new(dir.path().to_path_buf()).await.unwrap();
        store.append(vec![entry("u1", "exp-1", 5, "later")]).await.unwrap();
        // Stamped earlier but appended second
        store.append(vec![entry("u1", "exp-1", 0, "earlier")]).await.unwrap();

        let live: Vec<String> = store
            .list_for_user("u1", None)
            .await
            .into_iter()
            .map(|e| e.response)
            .collect();
        assert_eq!(live, vec!["later", "earlier"]);

        let reloaded = JournalStore::new(dir.path().to_path_buf()).await.unwrap();
        let after: Vec<String> = reloaded
            .list_for_user("u1", None)
            .await
            .into_iter()
            .map(|e| e.response)
            .collect();
        assert_eq!(after, live);
    }

    #[tokio::test]
    async fn test_entries_survive_reload() {
        let dir = TempDir::new().unwrap();
        {
            let store = JournalStore::new(dir.path().to_path_buf()).await.unwrap();
            store
                .append(vec![entry("u1", "exp-1", 0, "a"), entry("u1", "exp-1", 5, "b")])
                .await
                .unwrap();
        }
        let store = JournalStore::new(dir.path().to_path_buf()).await.unwrap();
        let entries = store.list_for_user("u1", None).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].response, "b");
    }
}
