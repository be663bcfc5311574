//! HTTP handler for the caller's journal
//!
//! - GET /api/v1/journal?experimentId=&page=&perPage=: newest first

use crate::auth::Identity;
use crate::content::store::ContentStore;
use crate::extract::QueryParams;
use crate::journal::projection::project;
use crate::journal::store::JournalStore;
use crate::journal::types::*;
use crate::pagination::{self, PaginatedResponse};
use crate::settings::store::SettingsStore;
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

/// Shared state for journal handlers
#[derive(Clone)]
pub struct JournalState {
    pub journal: Arc<JournalStore>,
    pub content: Arc<ContentStore>,
    pub settings: Arc<SettingsStore>,
}

pub fn journal_router(state: JournalState) -> Router {
    Router::new()
        .route("/api/v1/journal", get(list_journal))
        .with_state(state)
}

/// GET /api/v1/journal
async fn list_journal(
    identity: Identity,
    State(state): State<JournalState>,
    QueryParams(query): QueryParams<JournalQuery>,
) -> Json<PaginatedResponse<JournalItem>> {
    let (page, per_page) = pagination::normalize(query.page, query.per_page);
    let entries = state
        .journal
        .list_for_user(&identity.user_id, query.experiment_id.as_deref())
        .await;

    // Only the requested page is joined to content
    let page_of_entries = pagination::paginate(entries, page, per_page);
    let locale = state.settings.locale(&identity.user_id).await;
    let data = project(&state.content, page_of_entries.data, locale).await;

    Json(PaginatedResponse {
        data,
        pagination: page_of_entries.pagination,
    })
}
