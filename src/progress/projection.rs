//! Today view projection
//!
//! Joins each started subscription to its experiment's current day and to
//! the subscription's own completions. Nothing is written.

use crate::content::store::ContentStore;
use crate::content::types::{Experiment, Task};
use crate::locale::Locale;
use crate::progress::types::{TodayExperiment, TodayTask};
use crate::subscriptions::types::Subscription;

/// Build the view for `subscriptions`, ordered by start time.
///
/// Subscriptions whose experiment no longer exists are skipped, as are
/// day entries pointing at deleted tasks.
pub async fn today(
    content: &ContentStore,
    subscriptions: Vec<Subscription>,
    locale: Locale,
) -> Vec<TodayExperiment> {
    let mut subscriptions = subscriptions;
    subscriptions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));

    let mut view = Vec::with_capacity(subscriptions.len());
    for sub in subscriptions {
        let Some(experiment) = content.get::<Experiment>(&sub.experiment_id).await else {
            tracing::warn!(
                subscription_id = %sub.id,
                experiment_id = %sub.experiment_id,
                "Skipping subscription to missing experiment"
            );
            continue;
        };

        // An experiment shortened in place shows its last day
        let current_day = sub
            .current_day
            .unwrap_or(1)
            .min(experiment.total_days())
            .max(1);
        let mut tasks = Vec::new();
        if let Some(day) = experiment.day(current_day) {
            for task_id in &day.tasks {
                let Some(task) = content.get::<Task>(task_id).await else {
                    tracing::debug!(task_id = %task_id, "Skipping missing task");
                    continue;
                };
                tasks.push(TodayTask {
                    completed: sub.is_completed(task_id, current_day),
                    task_id: task.id,
                    name: task.name.resolve(locale).to_string(),
                    icon: task.icon,
                });
            }
        }

        let completed_count = tasks.iter().filter(|t| t.completed).count();
        let total_days = experiment.total_days();
        view.push(TodayExperiment {
            subscription_id: sub.id,
            experiment_name: experiment.name.resolve(locale).to_string(),
            experiment_id: experiment.id,
            box_id: experiment.box_id,
            current_day,
            total_days,
            total_count: tasks.len(),
            completed_count,
            tasks,
            started_at: sub.started_at,
        });
    }
    view
}
