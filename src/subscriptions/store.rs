//! Subscription store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base>/subscriptions/
//! ├── sub-<uuid>.json
//! └── ...
//! ```
//!
//! The store owns the uniqueness constraint on active subscriptions: at most
//! one `offered | started` subscription per (user, experiment). The index is
//! checked and updated under the same write lock as the document itself.

use crate::error::{Error, Result};
use crate::storage;
use crate::subscriptions::migration::{ImportReport, LegacySubscription};
use crate::subscriptions::types::*;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

type PairKey = (String, String);

#[derive(Default)]
struct Inner {
    by_id: HashMap<String, Subscription>,
    /// (user, experiment) → id of the active subscription
    active: HashMap<PairKey, String>,
}

impl Inner {
    fn pair(sub: &Subscription) -> PairKey {
        (sub.user_id.clone(), sub.experiment_id.clone())
    }

    fn active_conflict(&self, sub: &Subscription) -> Option<&String> {
        if !sub.status.is_active() {
            return None;
        }
        self.active
            .get(&Self::pair(sub))
            .filter(|existing| **existing != sub.id)
    }

    fn commit(&mut self, sub: Subscription) {
        let pair = Self::pair(&sub);
        if sub.status.is_active() {
            self.active.insert(pair, sub.id.clone());
        } else if self.active.get(&pair) == Some(&sub.id) {
            self.active.remove(&pair);
        }
        self.by_id.insert(sub.id.clone(), sub);
    }
}

/// In-memory subscription store backed by JSON files
pub struct SubscriptionStore {
    dir: PathBuf,
    inner: RwLock<Inner>,
}

impl SubscriptionStore {
    /// Open (or create) the store, rebuilding the active-pair index
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;

        let mut loaded = storage::load_json_files::<Subscription>(&dir);
        loaded.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut inner = Inner::default();
        for sub in loaded {
            if let Some(existing) = inner.active_conflict(&sub) {
                tracing::warn!(
                    subscription_id = %sub.id,
                    existing = %existing,
                    "Duplicate active subscription on disk; keeping the older one active in the index"
                );
                inner.by_id.insert(sub.id.clone(), sub);
                continue;
            }
            inner.commit(sub);
        }
        tracing::info!(count = inner.by_id.len(), "Subscription store loaded from {}", dir.display());

        Ok(Self {
            dir,
            inner: RwLock::new(inner),
        })
    }

    /// Create an `offered` subscription, enforcing the active-pair constraint
    pub async fn insert(&self, sub: Subscription) -> Result<Subscription> {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&sub.id) {
            return Err(Error::Conflict(format!("Subscription '{}' already exists", sub.id)));
        }
        if let Some(existing) = inner.active_conflict(&sub) {
            return Err(Error::Conflict(format!(
                "User '{}' already has an active subscription ('{}') to experiment '{}'",
                sub.user_id, existing, sub.experiment_id
            )));
        }
        storage::write_json(&self.dir, &sub.id, &sub).await?;
        inner.commit(sub.clone());
        Ok(sub)
    }

    pub async fn get(&self, id: &str) -> Option<Subscription> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    /// Subscription owned by `user_id`; other users' subscriptions look missing
    pub async fn get_owned(&self, id: &str, user_id: &str) -> Result<Subscription> {
        self.get(id)
            .await
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("Subscription '{}' not found", id)))
    }

    /// A user's subscriptions, oldest first, optionally filtered by status
    pub async fn list_for_user(
        &self,
        user_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> Vec<Subscription> {
        let inner = self.inner.read().await;
        let mut subs: Vec<Subscription> = inner
            .by_id
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();
        subs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        subs
    }

    /// Active subscription for a (user, experiment) pair
    pub async fn active_for(&self, user_id: &str, experiment_id: &str) -> Option<Subscription> {
        let inner = self.inner.read().await;
        let id = inner
            .active
            .get(&(user_id.to_string(), experiment_id.to_string()))?;
        inner.by_id.get(id).cloned()
    }

    /// Apply `apply` to a copy of the subscription and commit it once persisted.
    ///
    /// Ownership is checked against `user_id`. If `apply` fails, or the write
    /// fails, the stored subscription is left untouched.
    pub async fn update<R>(
        &self,
        id: &str,
        user_id: &str,
        apply: impl FnOnce(&mut Subscription) -> Result<R>,
    ) -> Result<(Subscription, R)> {
        let mut inner = self.inner.write().await;
        let mut next = inner
            .by_id
            .get(id)
            .filter(|s| s.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Subscription '{}' not found", id)))?;

        let result = apply(&mut next)?;
        if let Some(existing) = inner.active_conflict(&next) {
            return Err(Error::Conflict(format!(
                "Subscription '{}' conflicts with active subscription '{}'",
                id, existing
            )));
        }
        storage::write_json(&self.dir, id, &next).await?;
        inner.commit(next.clone());
        Ok((next, result))
    }

    /// Import legacy documents, merging duplicate completions
    pub async fn import_legacy(&self, docs: Vec<LegacySubscription>) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let mut docs = docs;
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        for doc in docs {
            let (sub, duplicates) = doc.into_subscription();
            let id = sub.id.clone();
            match self.insert_imported(sub).await {
                Ok(()) => {
                    report.imported += 1;
                    report.merged_duplicates += duplicates;
                }
                Err(Error::Conflict(reason)) => {
                    tracing::warn!(subscription_id = %id, "Skipping legacy subscription: {}", reason);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    async fn insert_imported(&self, sub: Subscription) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&sub.id) {
            return Err(Error::Conflict(format!("id '{}' already exists", sub.id)));
        }
        if let Some(existing) = inner.active_conflict(&sub) {
            return Err(Error::Conflict(format!(
                "pair already has active subscription '{}'",
                existing
            )));
        }
        storage::write_json(&self.dir, &sub.id, &sub).await?;
        inner.commit(sub);
        Ok(())
    }
}
