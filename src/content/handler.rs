//! HTTP handlers for content reads and the admin editor
//!
//! Public endpoints (published content only):
//! - GET    /api/v1/boxes             : published boxes
//! - GET    /api/v1/boxes/:id         : box with its published experiments
//! - GET    /api/v1/experiments/:id   : published experiment
//! - GET    /api/v1/tasks/:id         : published task
//! - GET    /api/v1/documents/:slug   : published document
//!
//! Admin endpoints, for each kind in `boxes | experiments | tasks | documents`:
//! - GET    /api/v1/admin/:kind             : list (optional `?status=`)
//! - POST   /api/v1/admin/:kind             : create (draft)
//! - GET    /api/v1/admin/:kind/:id         : detail
//! - PUT    /api/v1/admin/:kind/:id         : replace in place
//! - DELETE /api/v1/admin/:kind/:id         : delete
//! - POST   /api/v1/admin/:kind/:id/publish : publish
//! - POST   /api/v1/admin/:kind/:id/unpublish: back to draft

use crate::auth::AdminIdentity;
use crate::content::store::{Authoring, ContentStore};
use crate::content::types::*;
use crate::error::{Error, Result};
use crate::extract::{JsonBody, PathParams, QueryParams};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for content handlers
#[derive(Clone)]
pub struct ContentState {
    pub store: Arc<ContentStore>,
}

/// Create the content router (public reads + admin editor)
pub fn content_router(state: ContentState) -> Router {
    Router::new()
        .route("/api/v1/boxes", get(list_boxes))
        .route("/api/v1/boxes/:id", get(get_box))
        .route("/api/v1/experiments/:id", get(get_published::<Experiment>))
        .route("/api/v1/tasks/:id", get(get_published::<Task>))
        .route("/api/v1/documents/:slug", get(get_document))
        .merge(admin_routes::<ExperimentBox>("boxes"))
        .merge(admin_routes::<Experiment>("experiments"))
        .merge(admin_routes::<Task>("tasks"))
        .merge(admin_routes::<Document>("documents"))
        .with_state(state)
}

fn admin_routes<T: Authoring>(kind: &str) -> Router<ContentState> {
    let base = format!("/api/v1/admin/{}", kind);
    Router::new()
        .route(&base, get(admin_list::<T>).post(admin_create::<T>))
        .route(
            &format!("{}/:id", base),
            get(admin_get::<T>)
                .put(admin_replace::<T>)
                .delete(admin_delete::<T>),
        )
        .route(&format!("{}/:id/publish", base), post(publish::<T>))
        .route(&format!("{}/:id/unpublish", base), post(unpublish::<T>))
}

#[derive(Debug, Deserialize)]
struct AdminListQuery {
    status: Option<ContentStatus>,
}

// =============================================================================
// Public handlers
// =============================================================================

/// GET /api/v1/boxes
async fn list_boxes(State(state): State<ContentState>) -> impl IntoResponse {
    Json(
        state
            .store
            .list::<ExperimentBox>(Some(ContentStatus::Published))
            .await,
    )
}

/// GET /api/v1/boxes/:id
async fn get_box(
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<BoxDetail>> {
    Ok(Json(state.store.box_detail(&id).await?))
}

/// GET /api/v1/{experiments,tasks}/:id
async fn get_published<T: Authoring>(
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<T>> {
    Ok(Json(state.store.get_published::<T>(&id).await?))
}

/// GET /api/v1/documents/:slug
async fn get_document(
    State(state): State<ContentState>,
    PathParams(slug): PathParams<String>,
) -> Result<Json<Document>> {
    Ok(Json(state.store.document_by_slug(&slug).await?))
}

// =============================================================================
// Admin handlers
// =============================================================================

async fn admin_list<T: Authoring>(
    _admin: AdminIdentity,
    State(state): State<ContentState>,
    QueryParams(params): QueryParams<AdminListQuery>,
) -> Json<Vec<T>> {
    Json(state.store.list::<T>(params.status).await)
}

async fn admin_get<T: Authoring>(
    _admin: AdminIdentity,
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<T>> {
    state
        .store
        .get::<T>(&id)
        .await
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("{} '{}' not found", T::KIND, id)))
}

async fn admin_create<T: Authoring>(
    AdminIdentity(admin): AdminIdentity,
    State(state): State<ContentState>,
    JsonBody(input): JsonBody<T::Input>,
) -> Result<(StatusCode, Json<T>)> {
    let item = T::create(&state.store, input).await?;
    tracing::info!(kind = T::KIND, id = %item.id(), admin = %admin.user_id, "Content created");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn admin_replace<T: Authoring>(
    AdminIdentity(admin): AdminIdentity,
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
    JsonBody(input): JsonBody<T::Input>,
) -> Result<Json<T>> {
    let item = T::replace(&state.store, &id, input).await?;
    tracing::info!(kind = T::KIND, id = %id, admin = %admin.user_id, "Content updated");
    Ok(Json(item))
}

async fn admin_delete<T: Authoring>(
    AdminIdentity(admin): AdminIdentity,
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
) -> Result<StatusCode> {
    T::delete(&state.store, &id).await?;
    tracing::info!(kind = T::KIND, id = %id, admin = %admin.user_id, "Content deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn publish<T: Authoring>(
    _admin: AdminIdentity,
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<T>> {
    Ok(Json(
        state
            .store
            .set_status::<T>(&id, ContentStatus::Published)
            .await?,
    ))
}

async fn unpublish<T: Authoring>(
    _admin: AdminIdentity,
    State(state): State<ContentState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<T>> {
    Ok(Json(
        state
            .store
            .set_status::<T>(&id, ContentStatus::Draft)
            .await?,
    ))
}
