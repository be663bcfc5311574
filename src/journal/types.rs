//! Journal wire types
//!
//! A journal entry is the free-text answer to one `text` block. Entries are
//! append-only and independent of completion records: uncompleting a task
//! leaves its journal entries in place.

use crate::content::types::{BlockKind, Task};
use crate::storage::new_id;
use crate::subscriptions::types::{ResponseValue, Responses, Subscription};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub subscription_id: String,
    pub experiment_id: String,
    pub task_id: String,
    pub day_number: u32,
    pub block_id: String,
    pub created_at: DateTime<Utc>,
    pub response: String,
}

impl JournalEntry {
    /// Entries for every non-blank answer to a text block of `task`
    pub fn from_answers(
        subscription: &Subscription,
        task: &Task,
        day_number: u32,
        responses: &Responses,
        now: DateTime<Utc>,
    ) -> Vec<Self> {
        task.blocks
            .iter()
            .filter(|block| matches!(block.kind, BlockKind::Text { .. }))
            .filter_map(|block| match responses.get(&block.id) {
                Some(ResponseValue::Text(text)) if !text.trim().is_empty() => Some(Self {
                    id: new_id("jrn"),
                    user_id: subscription.user_id.clone(),
                    subscription_id: subscription.id.clone(),
                    experiment_id: subscription.experiment_id.clone(),
                    task_id: task.id.clone(),
                    day_number,
                    block_id: block.id.clone(),
                    created_at: now,
                    response: text.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Journal entry joined with resolved content names
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalItem {
    pub id: String,
    pub subscription_id: String,
    pub experiment_id: String,
    pub experiment_name: String,
    pub task_id: String,
    pub task_name: String,
    pub task_icon: String,
    pub day_number: u32,
    pub block_id: String,
    pub block_label: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing the journal
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalQuery {
    pub experiment_id: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}
