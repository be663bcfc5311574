//! Joins journal entries to experiment and task metadata

use crate::content::store::ContentStore;
use crate::content::types::{Experiment, Task};
use crate::journal::types::{JournalEntry, JournalItem};
use crate::locale::Locale;
use std::collections::HashMap;

/// Resolve names for one page of entries.
///
/// Content that has since been deleted resolves to empty strings; the entry
/// itself is always kept.
pub async fn project(
    content: &ContentStore,
    entries: Vec<JournalEntry>,
    locale: Locale,
) -> Vec<JournalItem> {
    let mut experiments: HashMap<String, Option<Experiment>> = HashMap::new();
    let mut tasks: HashMap<String, Option<Task>> = HashMap::new();
    let mut items = Vec::with_capacity(entries.len());

    for entry in entries {
        if !experiments.contains_key(&entry.experiment_id) {
            let found = content.get::<Experiment>(&entry.experiment_id).await;
            experiments.insert(entry.experiment_id.clone(), found);
        }
        if !tasks.contains_key(&entry.task_id) {
            let found = content.get::<Task>(&entry.task_id).await;
            tasks.insert(entry.task_id.clone(), found);
        }

        let experiment = experiments.get(&entry.experiment_id).and_then(Option::as_ref);
        let task = tasks.get(&entry.task_id).and_then(Option::as_ref);
        let block_label = task
            .and_then(|t| t.block(&entry.block_id))
            .and_then(|b| b.label())
            .map(|l| l.resolve(locale).to_string())
            .unwrap_or_default();

        items.push(JournalItem {
            experiment_name: experiment
                .map(|e| e.name.resolve(locale).to_string())
                .unwrap_or_default(),
            task_name: task
                .map(|t| t.name.resolve(locale).to_string())
                .unwrap_or_default(),
            task_icon: task.map(|t| t.icon.clone()).unwrap_or_default(),
            block_label,
            id: entry.id,
            subscription_id: entry.subscription_id,
            experiment_id: entry.experiment_id,
            task_id: entry.task_id,
            day_number: entry.day_number,
            block_id: entry.block_id,
            response: entry.response,
            created_at: entry.created_at,
        });
    }
    items
}
