//! Subscription state machine
//!
//! ```text
//! offered ──start──▶ started ──last task of last day──▶ completed
//!    │                  │
//!    └────abandon───────┴──────────abandon─────────────▶ abandoned
//! ```
//!
//! Transitions are pure: they mutate a [`Subscription`] value and take the
//! current time as an argument. Persistence and the active-pair constraint
//! are handled by the store.

use crate::content::types::Experiment;
use crate::error::{Error, Result};
use crate::storage::new_id;
use crate::subscriptions::types::*;
use chrono::{DateTime, Utc};

/// What a task completion changed
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub completion: Completion,
    pub advanced_to: Option<u32>,
    pub finished: bool,
}

impl Subscription {
    /// New subscription in the `offered` state
    pub fn offered(user_id: &str, experiment_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id("sub"),
            user_id: user_id.to_string(),
            experiment_id: experiment_id.to_string(),
            status: SubscriptionStatus::Offered,
            current_day: None,
            completions: Vec::new(),
            created_at: now,
            started_at: None,
            ended_at: None,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: SubscriptionStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition(format!(
                "Subscription '{}' cannot go from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        if next.is_terminal() {
            self.ended_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    fn require_started(&self) -> Result<()> {
        if self.status != SubscriptionStatus::Started {
            return Err(Error::InvalidTransition(format!(
                "Subscription '{}' is {}, not started",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// offered → started, day one. The experiment needs at least one day.
    pub fn start(&mut self, experiment: &Experiment, now: DateTime<Utc>) -> Result<()> {
        let next = SubscriptionStatus::Started;
        if self.status.can_transition_to(next) && experiment.total_days() == 0 {
            return Err(Error::validation(format!(
                "Experiment '{}' has no days",
                experiment.id
            )));
        }
        self.transition(next, now)?;
        self.current_day = Some(1);
        self.started_at = Some(now);
        Ok(())
    }

    /// offered | started → abandoned
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(SubscriptionStatus::Abandoned, now)
    }

    pub fn completion(&self, task_id: &str, day_number: u32) -> Option<&Completion> {
        self.completions
            .iter()
            .find(|c| c.task_id == task_id && c.day_number == day_number)
    }

    pub fn is_completed(&self, task_id: &str, day_number: u32) -> bool {
        self.completion(task_id, day_number).is_some()
    }

    /// Record a task completion and advance the day when it is done.
    ///
    /// `answered` says whether the submission carried a non-empty response.
    /// A repeat completion keeps `first_completed_at` and bumps
    /// `response_count` only when answered.
    pub fn complete_task(
        &mut self,
        experiment: &Experiment,
        task_id: &str,
        day_number: u32,
        answered: bool,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        self.require_started()?;
        let current_day = self.current_day.unwrap_or(1);
        if day_number == 0 || day_number > current_day {
            return Err(Error::validation(format!(
                "Day {} is not available yet (current day is {})",
                day_number, current_day
            )));
        }
        if !experiment.schedules(task_id, day_number) {
            return Err(Error::validation(format!(
                "Task '{}' is not scheduled on day {}",
                task_id, day_number
            )));
        }

        let increment = u32::from(answered);
        let completion = match self
            .completions
            .iter_mut()
            .find(|c| c.task_id == task_id && c.day_number == day_number)
        {
            Some(existing) => {
                existing.response_count += increment;
                existing.clone()
            }
            None => {
                let created = Completion {
                    task_id: task_id.to_string(),
                    day_number,
                    first_completed_at: now,
                    response_count: increment,
                };
                self.completions.push(created.clone());
                created
            }
        };
        self.updated_at = now;

        let advanced_to = self.advance(experiment, now)?;
        Ok(CompletionOutcome {
            completion,
            advanced_to,
            finished: self.status == SubscriptionStatus::Completed,
        })
    }

    /// Remove the completion for (task, day); the day does not move back
    pub fn uncomplete_task(
        &mut self,
        task_id: &str,
        day_number: u32,
        now: DateTime<Utc>,
    ) -> Result<Completion> {
        self.require_started()?;
        let index = self
            .completions
            .iter()
            .position(|c| c.task_id == task_id && c.day_number == day_number)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No completion of task '{}' on day {}",
                    task_id, day_number
                ))
            })?;
        self.updated_at = now;
        Ok(self.completions.remove(index))
    }

    /// Whether every task scheduled on `day_number` has been completed
    pub fn day_done(&self, experiment: &Experiment, day_number: u32) -> bool {
        experiment
            .day(day_number)
            .is_some_and(|day| day.tasks.iter().all(|t| self.is_completed(t, day_number)))
    }

    /// Move past finished days. Returns the new current day if it changed.
    ///
    /// A current day beyond the end of a shortened experiment is pulled back
    /// to the last day first.
    fn advance(&mut self, experiment: &Experiment, now: DateTime<Utc>) -> Result<Option<u32>> {
        let total = experiment.total_days();
        let start_day = self.current_day.unwrap_or(1);
        let mut day = start_day.min(total).max(1);
        self.current_day = Some(day);

        while self.day_done(experiment, day) {
            if day >= total {
                self.current_day = Some(total);
                self.transition(SubscriptionStatus::Completed, now)?;
                tracing::info!(
                    subscription_id = %self.id,
                    experiment_id = %self.experiment_id,
                    "Subscription completed"
                );
                break;
            }
            day += 1;
            self.current_day = Some(day);
        }

        Ok((day != start_day).then_some(day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::{ContentStatus, Day};
    use crate::locale::LocalizedText;
    use chrono::Duration;

    fn make_experiment(days: &[&[&str]]) -> Experiment {
        let now = Utc::now();
        Experiment {
            id: "exp-1".to_string(),
            name: LocalizedText::new("Walk more", "Caminar más"),
            description: LocalizedText::default(),
            box_id: "box-1".to_string(),
            overviews: vec![],
            days: days
                .iter()
                .enumerate()
                .map(|(i, tasks)| Day {
                    id: format!("day-{}", i + 1),
                    tasks: tasks.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
            status: ContentStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }

    fn t0() -> DateTime<Utc> {
        "2026-03-01T08:00:00Z".parse().unwrap()
    }

    fn started() -> Subscription {
        let mut sub = Subscription::offered("u1", "exp-1", t0());
        sub.start(&make_experiment(&[&["walk"]]), t0()).unwrap();
        sub
    }

    #[test]
    fn test_offer_and_start() {
        let experiment = make_experiment(&[&["walk"]]);
        let mut sub = Subscription::offered("u1", "exp-1", t0());
        assert_eq!(sub.status, SubscriptionStatus::Offered);
        assert_eq!(sub.current_day, None);

        sub.start(&experiment, t0()).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Started);
        assert_eq!(sub.current_day, Some(1));
        assert_eq!(sub.started_at, Some(t0()));

        assert!(matches!(sub.start(&experiment, t0()), Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn test_two_day_example() {
        let experiment = make_experiment(&[&["walk"], &["stretch"]]);
        let mut sub = started();

        let outcome = sub.complete_task(&experiment, "walk", 1, true, t0()).unwrap();
        assert_eq!(outcome.advanced_to, Some(2));
        assert!(!outcome.finished);
        assert_eq!(sub.current_day, Some(2));

        let outcome = sub.complete_task(&experiment, "stretch", 2, true, t0()).unwrap();
        assert!(outcome.finished);
        assert_eq!(sub.status, SubscriptionStatus::Completed);
        assert_eq!(sub.current_day, Some(2));
        assert!(sub.ended_at.is_some());
    }

    #[test]
    fn test_day_waits_for_all_tasks() {
        let experiment = make_experiment(&[&["walk", "journal"], &["stretch"]]);
        let mut sub = started();

        let outcome = sub.complete_task(&experiment, "journal", 1, false, t0()).unwrap();
        assert_eq!(outcome.advanced_to, None);
        assert_eq!(sub.current_day, Some(1));

        let outcome = sub.complete_task(&experiment, "walk", 1, false, t0()).unwrap();
        assert_eq!(outcome.advanced_to, Some(2));
    }

    #[test]
    fn test_repeat_preserves_first_timestamp() {
        let experiment = make_experiment(&[&["walk", "journal"]]);
        let mut sub = started();
        let later = t0() + Duration::hours(3);

        let first = sub.complete_task(&experiment, "walk", 1, true, t0()).unwrap();
        assert_eq!(first.completion.response_count, 1);

        let second = sub.complete_task(&experiment, "walk", 1, true, later).unwrap();
        assert_eq!(second.completion.first_completed_at, t0());
        assert_eq!(second.completion.response_count, 2);

        // Empty resubmission does not count as a response
        let third = sub.complete_task(&experiment, "walk", 1, false, later).unwrap();
        assert_eq!(third.completion.response_count, 2);
        assert_eq!(sub.completions.len(), 1);
    }

    #[test]
    fn test_first_completion_without_answers() {
        let experiment = make_experiment(&[&["walk", "journal"]]);
        let mut sub = started();
        let outcome = sub.complete_task(&experiment, "walk", 1, false, t0()).unwrap();
        assert_eq!(outcome.completion.response_count, 0);
    }

    #[test]
    fn test_uncomplete_then_complete_resets() {
        let experiment = make_experiment(&[&["walk", "journal"]]);
        let mut sub = started();
        let later = t0() + Duration::days(1);

        sub.complete_task(&experiment, "walk", 1, true, t0()).unwrap();
        sub.complete_task(&experiment, "walk", 1, true, t0()).unwrap();
        let removed = sub.uncomplete_task("walk", 1, later).unwrap();
        assert_eq!(removed.response_count, 2);
        assert!(!sub.is_completed("walk", 1));

        let outcome = sub.complete_task(&experiment, "walk", 1, true, later).unwrap();
        assert_eq!(outcome.completion.response_count, 1);
        assert_eq!(outcome.completion.first_completed_at, later);
    }

    #[test]
    fn test_uncomplete_missing() {
        let mut sub = started();
        assert!(matches!(sub.uncomplete_task("walk", 1, t0()), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_uncomplete_does_not_regress_day() {
        let experiment = make_experiment(&[&["walk"], &["stretch"], &["rest"]]);
        let mut sub = started();
        sub.complete_task(&experiment, "walk", 1, false, t0()).unwrap();
        sub.uncomplete_task("walk", 1, t0()).unwrap();
        assert_eq!(sub.current_day, Some(2));
    }

    #[test]
    fn test_future_day_rejected() {
        let experiment = make_experiment(&[&["walk"], &["stretch"]]);
        let mut sub = started();
        let err = sub.complete_task(&experiment, "stretch", 2, true, t0()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(sub.completions.is_empty());
    }

    #[test]
    fn test_task_must_be_scheduled_on_day() {
        let experiment = make_experiment(&[&["walk"], &["stretch"]]);
        let mut sub = started();
        let err = sub.complete_task(&experiment, "stretch", 1, true, t0()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_catch_up_on_earlier_day() {
        let experiment = make_experiment(&[&["walk", "journal"], &["stretch"], &["rest"]]);
        let mut sub = started();
        sub.complete_task(&experiment, "walk", 1, false, t0()).unwrap();
        sub.complete_task(&experiment, "journal", 1, false, t0()).unwrap();
        assert_eq!(sub.current_day, Some(2));

        // Redo a day-one task after uncompleting it; day two is untouched
        sub.uncomplete_task("journal", 1, t0()).unwrap();
        let outcome = sub.complete_task(&experiment, "journal", 1, true, t0()).unwrap();
        assert_eq!(outcome.advanced_to, None);
        assert_eq!(sub.current_day, Some(2));
    }

    #[test]
    fn test_empty_days_are_skipped() {
        let experiment = make_experiment(&[&["walk"], &[], &["rest"]]);
        let mut sub = started();
        let outcome = sub.complete_task(&experiment, "walk", 1, false, t0()).unwrap();
        assert_eq!(outcome.advanced_to, Some(3));
    }

    #[test]
    fn test_current_day_never_exceeds_total() {
        let experiment = make_experiment(&[&["walk"], &[]]);
        let mut sub = started();
        let outcome = sub.complete_task(&experiment, "walk", 1, false, t0()).unwrap();
        assert!(outcome.finished);
        assert_eq!(sub.current_day, Some(experiment.total_days()));
    }

    #[test]
    fn test_start_rejects_experiment_without_days() {
        let empty = make_experiment(&[]);
        let mut sub = Subscription::offered("u1", "exp-1", t0());
        let err = sub.start(&empty, t0()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(sub.status, SubscriptionStatus::Offered);
        assert_eq!(sub.current_day, None);
    }

    #[test]
    fn test_shortened_experiment_pulls_day_back() {
        let long = make_experiment(&[&["walk"], &["stretch"], &["rest"]]);
        let mut sub = started();
        sub.complete_task(&long, "walk", 1, false, t0()).unwrap();
        sub.complete_task(&long, "stretch", 2, false, t0()).unwrap();
        assert_eq!(sub.current_day, Some(3));

        // Edited in place down to two days while the subscriber is on day three
        let short = make_experiment(&[&["walk"], &["stretch"]]);
        let outcome = sub.complete_task(&short, "walk", 1, true, t0()).unwrap();
        assert!(outcome.finished);
        assert_eq!(sub.status, SubscriptionStatus::Completed);
        assert_eq!(sub.current_day, Some(short.total_days()));
    }

    #[test]
    fn test_shortened_experiment_waits_on_last_day() {
        let long = make_experiment(&[&["walk"], &["stretch"], &["rest"]]);
        let mut sub = started();
        sub.complete_task(&long, "walk", 1, false, t0()).unwrap();
        sub.complete_task(&long, "stretch", 2, false, t0()).unwrap();

        let short = make_experiment(&[&["walk"], &["stretch", "journal"]]);
        let outcome = sub.complete_task(&short, "walk", 1, true, t0()).unwrap();
        assert!(!outcome.finished);
        assert_eq!(outcome.advanced_to, Some(2));
        assert_eq!(sub.current_day, Some(2));

        let outcome = sub.complete_task(&short, "journal", 2, false, t0()).unwrap();
        assert!(outcome.finished);
        assert_eq!(sub.current_day, Some(2));
    }

    #[test]
    fn test_completion_requires_started() {
        let experiment = make_experiment(&[&["walk"]]);
        let mut sub = Subscription::offered("u1", "exp-1", t0());
        assert!(matches!(
            sub.complete_task(&experiment, "walk", 1, true, t0()),
            Err(Error::InvalidTransition(_))
        ));

        let mut done = started();
        done.complete_task(&experiment, "walk", 1, true, t0()).unwrap();
        assert!(matches!(
            done.complete_task(&experiment, "walk", 1, true, t0()),
            Err(Error::InvalidTransition(_))
        ));
        assert!(matches!(done.uncomplete_task("walk", 1, t0()), Err(Error::InvalidTransition(_))));
    }

    #[test]
    fn test_abandon_is_terminal() {
        let mut sub = Subscription::offered("u1", "exp-1", t0());
        sub.abandon(t0()).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Abandoned);
        assert!(sub.ended_at.is_some());
        assert!(sub.start(&make_experiment(&[&["walk"]]), t0()).is_err());
        assert!(sub.abandon(t0()).is_err());

        let mut sub = started();
        sub.abandon(t0()).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Abandoned);
    }
}
