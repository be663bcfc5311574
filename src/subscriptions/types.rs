//! Subscription wire types
//!
//! A subscription binds one user to one experiment. Its completions record
//! which tasks were finished on which day. All types use camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Offered,
    Started,
    Completed,
    Abandoned,
}

impl SubscriptionStatus {
    /// Offered and started subscriptions occupy the (user, experiment) slot
    pub fn is_active(self) -> bool {
        matches!(self, Self::Offered | Self::Started)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Allowed edges of the lifecycle state machine
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Offered, Self::Started)
                | (Self::Offered, Self::Abandoned)
                | (Self::Started, Self::Completed)
                | (Self::Started, Self::Abandoned)
        )
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offered => write!(f, "offered"),
            Self::Started => write!(f, "started"),
            Self::Completed => write!(f, "completed"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offered" => Ok(Self::Offered),
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(format!("unknown subscription status: {}", other)),
        }
    }
}

/// A user's enrollment in one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub experiment_id: String,
    pub status: SubscriptionStatus,
    /// 1-based; `None` until started
    pub current_day: Option<u32>,
    #[serde(default)]
    pub completions: Vec<Completion>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Record that a task was finished on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub task_id: String,
    pub day_number: u32,
    pub first_completed_at: DateTime<Utc>,
    pub response_count: u32,
}

/// One answer to a task block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Number(f64),
    Text(String),
    Choices(Vec<String>),
}

impl ResponseValue {
    /// Blank text and empty choice lists count as unanswered
    pub fn is_answered(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(text) => !text.trim().is_empty(),
            Self::Choices(choices) => !choices.is_empty(),
        }
    }
}

/// Answers keyed by block id
pub type Responses = BTreeMap<String, ResponseValue>;

/// Whether a submission carries at least one answer
pub fn has_answers(responses: &Responses) -> bool {
    responses.values().any(ResponseValue::is_answered)
}

// =============================================================================
// Requests
// =============================================================================

/// Self-enrollment body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub experiment_id: String,
}

/// Admin assignment body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub user_id: String,
    pub experiment_id: String,
}

/// Task completion body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    pub task_id: String,
    pub day_number: u32,
    #[serde(default)]
    pub responses: Responses,
}

/// Result of a completion: the stored record and the subscription after it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub completion: Completion,
    pub subscription: Subscription,
    /// Day the subscription moved to, if it advanced
    pub advanced_to: Option<u32>,
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_edges() {
        use SubscriptionStatus::*;
        assert!(Offered.can_transition_to(Started));
        assert!(Offered.can_transition_to(Abandoned));
        assert!(Started.can_transition_to(Completed));
        assert!(Started.can_transition_to(Abandoned));
        assert!(!Offered.can_transition_to(Completed));
        assert!(!Started.can_transition_to(Offered));
        for terminal in [Completed, Abandoned] {
            assert!(terminal.is_terminal());
            for next in [Offered, Started, Completed, Abandoned] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("started".parse::<SubscriptionStatus>().unwrap(), SubscriptionStatus::Started);
        assert!("paused".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn test_response_values_untagged() {
        let responses: Responses = serde_json::from_str(
            r#"{"hours": 7.5, "notes": "slept well", "tags": ["calm", "rested"], "empty": []}"#,
        )
        .unwrap();
        assert_eq!(responses["hours"], ResponseValue::Number(7.5));
        assert_eq!(responses["notes"], ResponseValue::Text("slept well".to_string()));
        assert_eq!(
            responses["tags"],
            ResponseValue::Choices(vec!["calm".to_string(), "rested".to_string()])
        );
        assert!(!responses["empty"].is_answered());
    }

    #[test]
    fn test_has_answers() {
        let mut responses = Responses::new();
        assert!(!has_answers(&responses));
        responses.insert("notes".to_string(), ResponseValue::Text("   ".to_string()));
        assert!(!has_answers(&responses));
        responses.insert("hours".to_string(), ResponseValue::Number(0.0));
        assert!(has_answers(&responses));
    }

    #[test]
    fn test_completion_wire_shape() {
        let completion = Completion {
            task_id: "task-1".to_string(),
            day_number: 2,
            first_completed_at: "2026-01-02T08:00:00Z".parse().unwrap(),
            response_count: 3,
        };
        let json = serde_json::to_string(&completion).unwrap();
        assert!(json.contains("\"taskId\":\"task-1\""));
        assert!(json.contains("\"dayNumber\":2"));
        assert!(json.contains("\"firstCompletedAt\":\"2026-01-02T08:00:00Z\""));
        assert!(json.contains("\"responseCount\":3"));
    }

    #[test]
    fn test_complete_request_defaults_responses() {
        let req: CompleteTaskRequest =
            serde_json::from_str(r#"{"taskId": "task-1", "dayNumber": 1}"#).unwrap();
        assert!(req.responses.is_empty());
    }
}
