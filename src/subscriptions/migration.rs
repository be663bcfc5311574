//! Import of legacy subscription documents
//!
//! Older clients appended a new completion record on every submission, so a
//! legacy subscription may hold several records for the same
//! (task, day). Importing folds them into one [`Completion`] each: the
//! earliest record supplies `first_completed_at`, and every record with a
//! non-empty response adds one to `response_count`.

use crate::subscriptions::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Completion record as written by legacy clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCompletion {
    pub task_id: String,
    pub day_number: u32,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub responses: Responses,
}

/// Subscription document as written by legacy clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySubscription {
    pub id: String,
    pub user_id: String,
    pub experiment_id: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_day: Option<u32>,
    #[serde(default)]
    pub completions: Vec<LegacyCompletion>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Outcome of an import run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    /// Documents rejected by the active-pair constraint or an id clash
    pub skipped: usize,
    /// Duplicate completion records folded away
    pub merged_duplicates: usize,
}

/// Fold duplicate legacy records into one completion per (task, day).
///
/// Returns the merged completions ordered by day then first completion,
/// plus the number of duplicates that were folded away.
pub fn merge_completions(records: Vec<LegacyCompletion>) -> (Vec<Completion>, usize) {
    let mut records = records;
    records.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));

    let mut merged: BTreeMap<(u32, String), Completion> = BTreeMap::new();
    let mut duplicates = 0;
    for record in records {
        let answered = u32::from(has_answers(&record.responses));
        match merged.get_mut(&(record.day_number, record.task_id.clone())) {
            Some(existing) => {
                existing.response_count += answered;
                duplicates += 1;
            }
            None => {
                merged.insert(
                    (record.day_number, record.task_id.clone()),
                    Completion {
                        task_id: record.task_id,
                        day_number: record.day_number,
                        first_completed_at: record.completed_at,
                        response_count: answered,
                    },
                );
            }
        }
    }

    let mut completions: Vec<Completion> = merged.into_values().collect();
    completions.sort_by(|a, b| {
        a.day_number
            .cmp(&b.day_number)
            .then(a.first_completed_at.cmp(&b.first_completed_at))
    });
    (completions, duplicates)
}

impl LegacySubscription {
    /// Convert into the current document shape, returning folded duplicates
    pub fn into_subscription(self) -> (Subscription, usize) {
        let (completions, duplicates) = merge_completions(self.completions);
        let updated_at = self
            .ended_at
            .or(self.started_at)
            .unwrap_or(self.created_at);
        let current_day = match self.status {
            SubscriptionStatus::Offered => None,
            _ => Some(self.current_day.unwrap_or(1).max(1)),
        };
        let subscription = Subscription {
            id: self.id,
            user_id: self.user_id,
            experiment_id: self.experiment_id,
            status: self.status,
            current_day,
            completions,
            created_at: self.created_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            updated_at,
        };
        (subscription, duplicates)
    }
}
