//! Checks a task submission against the task's blocks

use crate::content::types::{BlockKind, Task};
use crate::content::validate::Problems;
use crate::error::Result;
use crate::subscriptions::types::{ResponseValue, Responses};

/// Validate answers against `task`, reporting every problem at once
pub fn validate_responses(task: &Task, responses: &Responses) -> Result<()> {
    let mut problems = Problems::default();

    for (block_id, value) in responses {
        let Some(block) = task.block(block_id) else {
            problems.push(format!("'{}' is not a block of this task", block_id));
            continue;
        };
        if !value.is_answered() {
            continue;
        }
        match (&block.kind, value) {
            (BlockKind::Markdown { .. }, _) => {
                problems.push(format!("'{}' does not accept answers", block_id));
            }
            (BlockKind::Text { .. }, ResponseValue::Text(_)) => {}
            (BlockKind::Number { min, max, .. }, ResponseValue::Number(n)) => {
                if !n.is_finite() {
                    problems.push(format!("'{}' must be a finite number", block_id));
                }
                if min.is_some_and(|min| *n < min) || max.is_some_and(|max| *n > max) {
                    problems.push(format!("'{}' is out of range", block_id));
                }
            }
            (BlockKind::Select { options, multiple, .. }, ResponseValue::Choices(choices)) => {
                if !multiple && choices.len() > 1 {
                    problems.push(format!("'{}' accepts a single choice", block_id));
                }
                for choice in choices {
                    if !options.iter().any(|o| &o.value == choice) {
                        problems.push(format!("'{}' has no option '{}'", block_id, choice));
                    }
                }
            }
            (BlockKind::Select { options, .. }, ResponseValue::Text(choice)) => {
                // A bare string is accepted as a single choice
                if !options.iter().any(|o| &o.value == choice) {
                    problems.push(format!("'{}' has no option '{}'", block_id, choice));
                }
            }
            _ => problems.push(format!("'{}' has the wrong answer type", block_id)),
        }
    }

    for block in task.blocks.iter().filter(|b| b.required) {
        let answered = responses
            .get(&block.id)
            .is_some_and(ResponseValue::is_answered);
        if !answered {
            problems.push(format!("'{}' is required", block.id));
        }
    }

    problems.finish("submission")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::{Block, ContentStatus, SelectOption};
    use crate::error::Error;
    use crate::locale::LocalizedText;
    use chrono::Utc;

    fn label() -> LocalizedText {
        LocalizedText::new("Label", "Etiqueta")
    }

    fn make_task() -> Task {
        let now = Utc::now();
        Task {
            id: "task-1".to_string(),
            name: LocalizedText::new("Reflect", "Reflexionar"),
            icon: "pen".to_string(),
            blocks: vec![
                Block {
                    id: "intro".to_string(),
                    required: false,
                    kind: BlockKind::Markdown { body: label() },
                },
                Block {
                    id: "notes".to_string(),
                    required: true,
                    kind: BlockKind::Text {
                        label: label(),
                        placeholder: LocalizedText::default(),
                        multiline: true,
                    },
                },
                Block {
                    id: "hours".to_string(),
                    required: false,
                    kind: BlockKind::Number {
                        label: label(),
                        placeholder: LocalizedText::default(),
                        min: Some(0.0),
                        max: Some(24.0),
                    },
                },
                Block {
                    id: "mood".to_string(),
                    required: false,
                    kind: BlockKind::Select {
                        label: label(),
                        options: vec![
                            SelectOption { value: "good".to_string(), label: label() },
                            SelectOption { value: "bad".to_string(), label: label() },
                        ],
                        multiple: false,
                    },
                },
            ],
            status: ContentStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }

    fn responses(json: &str) -> Responses {
        serde_json::from_str(json).unwrap()
    }

    fn details(result: Result<()>) -> Vec<String> {
        match result {
            Err(Error::Validation { details, .. }) => details,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_submission() {
        let task = make_task();
        let r = responses(r#"{"notes": "went well", "hours": 8, "mood": ["good"]}"#);
        assert!(validate_responses(&task, &r).is_ok());
        let r = responses(r#"{"notes": "ok", "mood": "bad"}"#);
        assert!(validate_responses(&task, &r).is_ok());
    }

    #[test]
    fn test_required_block_missing() {
        let task = make_task();
        let d = details(validate_responses(&task, &responses(r#"{"hours": 3}"#)));
        assert_eq!(d, vec!["'notes' is required".to_string()]);

        let d = details(validate_responses(&task, &responses(r#"{"notes": "  "}"#)));
        assert_eq!(d, vec!["'notes' is required".to_string()]);
    }

    #[test]
    fn test_type_and_option_errors() {
        let task = make_task();
        let d = details(validate_responses(
            &task,
            &responses(r#"{"notes": 5, "hours": 30, "mood": ["good", "ugly"], "intro": "x", "other": "y"}"#),
        ));
        assert!(d.iter().any(|p| p.contains("'notes' has the wrong answer type")));
        assert!(d.iter().any(|p| p.contains("'hours' is out of range")));
        assert!(d.iter().any(|p| p.contains("single choice")));
        assert!(d.iter().any(|p| p.contains("no option 'ugly'")));
        assert!(d.iter().any(|p| p.contains("'intro' does not accept answers")));
        assert!(d.iter().any(|p| p.contains("'other' is not a block")));
        // A wrongly typed answer is still an answer
        assert!(!d.iter().any(|p| p.contains("'notes' is required")));
    }
}
