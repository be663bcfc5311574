//! HTTP handlers for the caller's settings
//!
//! - GET    /api/v1/me/settings      : current settings (defaults if never saved)
//! - PATCH  /api/v1/me/settings      : update locale and/or notifications
//! - POST   /api/v1/me/settings/reset: back to defaults

use crate::auth::Identity;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::settings::store::SettingsStore;
use crate::settings::types::*;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

/// Shared state for settings handlers
#[derive(Clone)]
pub struct SettingsState {
    pub store: Arc<SettingsStore>,
}

/// Create the settings router
pub fn settings_router(state: SettingsState) -> Router {
    Router::new()
        .route("/api/v1/me/settings", get(get_settings).patch(update_settings))
        .route("/api/v1/me/settings/reset", post(reset_settings))
        .with_state(state)
}

/// GET /api/v1/me/settings
async fn get_settings(
    identity: Identity,
    State(state): State<SettingsState>,
) -> Json<UserSettings> {
    Json(state.store.get(&identity.user_id).await)
}

/// PATCH /api/v1/me/settings
async fn update_settings(
    identity: Identity,
    State(state): State<SettingsState>,
    JsonBody(request): JsonBody<UpdateSettingsRequest>,
) -> Result<Json<UserSettings>> {
    let settings = state
        .store
        .update(&identity.user_id, &request, Utc::now())
        .await?;
    tracing::debug!(user_id = %identity.user_id, locale = %settings.locale, "Settings updated");
    Ok(Json(settings))
}

/// POST /api/v1/me/settings/reset
async fn reset_settings(
    identity: Identity,
    State(state): State<SettingsState>,
) -> Result<Json<UserSettings>> {
    Ok(Json(state.store.reset(&identity.user_id).await?))
}
