//! HTTP handler for the today view
//!
//! - GET /api/v1/today: progress on every started experiment

use crate::auth::Identity;
use crate::content::store::ContentStore;
use crate::progress::projection::today;
use crate::progress::types::TodayExperiment;
use crate::settings::store::SettingsStore;
use crate::subscriptions::store::SubscriptionStore;
use crate::subscriptions::types::SubscriptionStatus;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

/// Shared state for the today view
#[derive(Clone)]
pub struct ProgressState {
    pub content: Arc<ContentStore>,
    pub subscriptions: Arc<SubscriptionStore>,
    pub settings: Arc<SettingsStore>,
}

pub fn progress_router(state: ProgressState) -> Router {
    Router::new()
        .route("/api/v1/today", get(get_today))
        .with_state(state)
}

/// GET /api/v1/today
async fn get_today(
    identity: Identity,
    State(state): State<ProgressState>,
) -> Json<Vec<TodayExperiment>> {
    let subs = state
        .subscriptions
        .list_for_user(&identity.user_id, Some(SubscriptionStatus::Started))
        .await;
    let locale = state.settings.locale(&identity.user_id).await;
    Json(today(&state.content, subs, locale).await)
}
