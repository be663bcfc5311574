//! Subscription engine
//!
//! Coordinates the content store, the subscription store and the journal.
//! Every operation touches exactly one subscription document; journal
//! entries are appended after the completion has been committed.

use crate::content::store::ContentStore;
use crate::content::types::{Experiment, Task};
use crate::error::{Error, Result};
use crate::journal::store::JournalStore;
use crate::journal::types::JournalEntry;
use crate::subscriptions::responses::validate_responses;
use crate::subscriptions::store::SubscriptionStore;
use crate::subscriptions::types::*;
use chrono::Utc;
use std::sync::Arc;

pub struct SubscriptionEngine {
    content: Arc<ContentStore>,
    subscriptions: Arc<SubscriptionStore>,
    journal: Arc<JournalStore>,
}

impl SubscriptionEngine {
    pub fn new(
        content: Arc<ContentStore>,
        subscriptions: Arc<SubscriptionStore>,
        journal: Arc<JournalStore>,
    ) -> Self {
        Self {
            content,
            subscriptions,
            journal,
        }
    }

    /// Self-enrollment: only published experiments can be joined
    pub async fn offer(&self, user_id: &str, experiment_id: &str) -> Result<Subscription> {
        self.content.get_published::<Experiment>(experiment_id).await?;
        self.insert_offer(user_id, experiment_id).await
    }

    /// Admin assignment: any existing experiment, published or not
    pub async fn assign(&self, user_id: &str, experiment_id: &str) -> Result<Subscription> {
        if user_id.trim().is_empty() {
            return Err(Error::validation("userId must not be empty"));
        }
        if self.content.get::<Experiment>(experiment_id).await.is_none() {
            return Err(Error::NotFound(format!(
                "Experiment '{}' not found",
                experiment_id
            )));
        }
        self.insert_offer(user_id, experiment_id).await
    }

    async fn insert_offer(&self, user_id: &str, experiment_id: &str) -> Result<Subscription> {
        let sub = self
            .subscriptions
            .insert(Subscription::offered(user_id, experiment_id, Utc::now()))
            .await?;
        tracing::info!(
            subscription_id = %sub.id,
            user_id = %user_id,
            experiment_id = %experiment_id,
            "Subscription offered"
        );
        Ok(sub)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Subscription> {
        self.subscriptions.get_owned(id, user_id).await
    }

    pub async fn list(
        &self,
        user_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> Vec<Subscription> {
        self.subscriptions.list_for_user(user_id, status).await
    }

    pub async fn start(&self, user_id: &str, id: &str) -> Result<Subscription> {
        let current = self.subscriptions.get_owned(id, user_id).await?;
        let experiment = self.experiment_of(&current).await?;
        let (sub, ()) = self
            .subscriptions
            .update(id, user_id, |s| s.start(&experiment, Utc::now()))
            .await?;
        tracing::info!(subscription_id = %sub.id, "Subscription started");
        Ok(sub)
    }

    async fn experiment_of(&self, sub: &Subscription) -> Result<Experiment> {
        self.content
            .get::<Experiment>(&sub.experiment_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Experiment '{}' not found", sub.experiment_id)))
    }

    pub async fn abandon(&self, user_id: &str, id: &str) -> Result<Subscription> {
        let (sub, ()) = self
            .subscriptions
            .update(id, user_id, |s| s.abandon(Utc::now()))
            .await?;
        tracing::info!(subscription_id = %sub.id, "Subscription abandoned");
        Ok(sub)
    }

    /// Record a task completion, advance the day and journal text answers
    pub async fn complete_task(
        &self,
        user_id: &str,
        id: &str,
        request: CompleteTaskRequest,
    ) -> Result<CompletionResponse> {
        let current = self.subscriptions.get_owned(id, user_id).await?;
        let experiment = self.experiment_of(&current).await?;
        let task = self.content.get::<Task>(&request.task_id).await;

        let CompleteTaskRequest {
            task_id,
            day_number,
            responses,
        } = request;
        let answered = has_answers(&responses);
        let now = Utc::now();

        let (sub, outcome) = self
            .subscriptions
            .update(id, user_id, |s| {
                // State and scheduling errors take precedence over answer errors
                let outcome = s.complete_task(&experiment, &task_id, day_number, answered, now)?;
                let task = task
                    .as_ref()
                    .ok_or_else(|| Error::NotFound(format!("Task '{}' not found", task_id)))?;
                validate_responses(task, &responses)?;
                Ok(outcome)
            })
            .await?;

        tracing::info!(
            subscription_id = %sub.id,
            task_id = %task_id,
            day_number,
            response_count = outcome.completion.response_count,
            "Task completed"
        );
        if let Some(day) = outcome.advanced_to {
            tracing::info!(subscription_id = %sub.id, day, "Advanced to next day");
        }

        if let Some(task) = &task {
            let entries = JournalEntry::from_answers(&sub, task, day_number, &responses, now);
            if !entries.is_empty() {
                // The completion is already committed; a retry would count twice
                if let Err(e) = self.journal.append(entries).await {
                    tracing::error!(
                        subscription_id = %sub.id,
                        error = %e,
                        "Failed to append journal entries"
                    );
                }
            }
        }

        Ok(CompletionResponse {
            completion: outcome.completion,
            subscription: sub,
            advanced_to: outcome.advanced_to,
            finished: outcome.finished,
        })
    }

    /// Remove a completion; journal entries are kept
    pub async fn uncomplete_task(
        &self,
        user_id: &str,
        id: &str,
        task_id: &str,
        day_number: u32,
    ) -> Result<Subscription> {
        let (sub, removed) = self
            .subscriptions
            .update(id, user_id, |s| s.uncomplete_task(task_id, day_number, Utc::now()))
            .await?;
        tracing::info!(
            subscription_id = %sub.id,
            task_id = %removed.task_id,
            day_number = removed.day_number,
            "Task uncompleted"
        );
        Ok(sub)
    }
}
