//! Today view wire types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Progress on one started experiment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayExperiment {
    pub subscription_id: String,
    pub experiment_id: String,
    pub experiment_name: String,
    pub box_id: String,
    pub current_day: u32,
    pub total_days: u32,
    pub tasks: Vec<TodayTask>,
    pub completed_count: usize,
    pub total_count: usize,
    pub started_at: Option<DateTime<Utc>>,
}

/// One task scheduled on the current day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTask {
    pub task_id: String,
    pub name: String,
    pub icon: String,
    pub completed: bool,
}
