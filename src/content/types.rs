//! Content entity types
//!
//! Boxes group experiments, experiments are ordered days of task
//! references, tasks are ordered content blocks. Every entity carries a
//! draft/published status. All types use camelCase JSON serialization.

use crate::locale::LocalizedText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publish status shared by all content entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
        }
    }
}

// =============================================================================
// Box
// =============================================================================

/// Thematic grouping of experiments (Sleep, Eat, Move, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentBox {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub icon: String,
    pub thumbnail: Option<String>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace body for a box
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxInput {
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub icon: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

// =============================================================================
// Experiment
// =============================================================================

/// Multi-day behavioral program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub box_id: String,
    pub overviews: Vec<Overview>,
    pub days: Vec<Day>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Experiment {
    pub fn total_days(&self) -> u32 {
        self.days.len() as u32
    }

    /// Tasks for a 1-based day number
    pub fn day(&self, day_number: u32) -> Option<&Day> {
        let index = day_number.checked_sub(1)? as usize;
        self.days.get(index)
    }

    /// Whether `task_id` is scheduled on `day_number`
    pub fn schedules(&self, task_id: &str, day_number: u32) -> bool {
        self.day(day_number)
            .is_some_and(|d| d.tasks.iter().any(|t| t == task_id))
    }

    pub fn references_task(&self, task_id: &str) -> bool {
        self.days.iter().any(|d| d.tasks.iter().any(|t| t == task_id))
    }
}

/// Intro content shown before day one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub id: String,
    pub title: LocalizedText,
    pub body: LocalizedText,
}

/// One day of an experiment: ordered task references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub id: String,
    pub tasks: Vec<String>,
}

/// Create/replace body for an experiment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentInput {
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub box_id: String,
    #[serde(default)]
    pub overviews: Vec<OverviewInput>,
    #[serde(default)]
    pub days: Vec<DayInput>,
}

/// Overview entry in an experiment input; id is kept when supplied
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
}

/// Day entry in an experiment input; id is kept when supplied
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
}

// =============================================================================
// Task
// =============================================================================

/// Daily activity made of content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: LocalizedText,
    pub icon: String,
    pub blocks: Vec<Block>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }
}

/// One content block of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    /// Prompt shown next to the input; markdown blocks have none
    pub fn label(&self) -> Option<&LocalizedText> {
        match &self.kind {
            BlockKind::Markdown { .. } => None,
            BlockKind::Text { label, .. }
            | BlockKind::Number { label, .. }
            | BlockKind::Select { label, .. } => Some(label),
        }
    }
}

/// Block payload, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Markdown {
        body: LocalizedText,
    },
    Text {
        label: LocalizedText,
        #[serde(default)]
        placeholder: LocalizedText,
        #[serde(default)]
        multiline: bool,
    },
    Number {
        label: LocalizedText,
        #[serde(default)]
        placeholder: LocalizedText,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Select {
        label: LocalizedText,
        options: Vec<SelectOption>,
        #[serde(default)]
        multiple: bool,
    },
}

/// Choice of a select block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub label: LocalizedText,
}

/// Create/replace body for a task
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub name: LocalizedText,
    pub icon: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

// =============================================================================
// Document
// =============================================================================

/// Static page (terms, privacy, about)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub slug: String,
    pub title: LocalizedText,
    pub body: LocalizedText,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace body for a document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    pub slug: String,
    pub title: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
}

// =============================================================================
// Read models
// =============================================================================

/// Published box with its published experiments
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxDetail {
    #[serde(flatten)]
    pub item: ExperimentBox,
    pub experiments: Vec<Experiment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tagged_serialization() {
        let block = Block {
            id: "mood".to_string(),
            required: true,
            kind: BlockKind::Select {
                label: LocalizedText::new("Mood", "Ánimo"),
                options: vec![SelectOption {
                    value: "good".to_string(),
                    label: LocalizedText::new("Good", "Bien"),
                }],
                multiple: false,
            },
        };
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"select\""));
        assert!(json.contains("\"required\":true"));

        let parsed: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, block);
    }

    #[test]
    fn test_block_defaults() {
        let json = r#"{"id": "notes", "type": "text", "label": {"en": "Notes", "es": "Notas"}}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(!block.required);
        match block.kind {
            BlockKind::Text { multiline, placeholder, .. } => {
                assert!(!multiline);
                assert!(placeholder.is_blank());
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_block_type_rejected() {
        let json = r#"{"id": "x", "type": "video"}"#;
        assert!(serde_json::from_str::<Block>(json).is_err());
    }

    #[test]
    fn test_experiment_day_lookup() {
        let now = Utc::now();
        let experiment = Experiment {
            id: "exp-1".to_string(),
            name: LocalizedText::new("Sleep", "Dormir"),
            description: LocalizedText::default(),
            box_id: "box-1".to_string(),
            overviews: vec![],
            days: vec![
                Day {
                    id: "d1".to_string(),
                    tasks: vec!["t1".to_string()],
                },
                Day {
                    id: "d2".to_string(),
                    tasks: vec!["t2".to_string()],
                },
            ],
            status: ContentStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(experiment.total_days(), 2);
        assert!(experiment.day(0).is_none());
        assert!(experiment.schedules("t2", 2));
        assert!(!experiment.schedules("t2", 1));
        assert!(!experiment.schedules("t1", 3));
        assert!(experiment.references_task("t1"));
        assert!(!experiment.references_task("t9"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ContentStatus::Published).unwrap(),
            "\"published\""
        );
        assert_eq!(ContentStatus::default(), ContentStatus::Draft);
    }
}
