//! HTTP handlers for subscriptions
//!
//! Caller endpoints (own subscriptions only):
//! - GET    /api/v1/subscriptions                              : list (optional `?status=`)
//! - POST   /api/v1/subscriptions                              : self-enroll (offered)
//! - GET    /api/v1/subscriptions/:id                          : detail
//! - POST   /api/v1/subscriptions/:id/start                    : offered → started
//! - POST   /api/v1/subscriptions/:id/abandon                  : → abandoned
//! - POST   /api/v1/subscriptions/:id/completions              : complete a task
//! - DELETE /api/v1/subscriptions/:id/completions/:day/:task_id: uncomplete
//!
//! Admin endpoints:
//! - POST   /api/v1/admin/subscriptions                        : assign to a user

use crate::auth::{AdminIdentity, Identity};
use crate::error::Result;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::subscriptions::engine::SubscriptionEngine;
use crate::subscriptions::types::*;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for subscription handlers
#[derive(Clone)]
pub struct SubscriptionsState {
    pub engine: Arc<SubscriptionEngine>,
}

/// Create the subscriptions router
pub fn subscriptions_router(state: SubscriptionsState) -> Router {
    Router::new()
        .route(
            "/api/v1/subscriptions",
            get(list_subscriptions).post(offer_subscription),
        )
        .route("/api/v1/subscriptions/:id", get(get_subscription))
        .route("/api/v1/subscriptions/:id/start", post(start_subscription))
        .route("/api/v1/subscriptions/:id/abandon", post(abandon_subscription))
        .route("/api/v1/subscriptions/:id/completions", post(complete_task))
        .route(
            "/api/v1/subscriptions/:id/completions/:day/:task_id",
            delete(uncomplete_task),
        )
        .route("/api/v1/admin/subscriptions", post(assign_subscription))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<SubscriptionStatus>,
}

/// GET /api/v1/subscriptions
async fn list_subscriptions(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Json<Vec<Subscription>> {
    Json(state.engine.list(&identity.user_id, query.status).await)
}

/// POST /api/v1/subscriptions
async fn offer_subscription(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    JsonBody(request): JsonBody<OfferRequest>,
) -> Result<(StatusCode, Json<Subscription>)> {
    let sub = state
        .engine
        .offer(&identity.user_id, &request.experiment_id)
        .await?;
    Ok((StatusCode::CREATED, Json(sub)))
}

/// GET /api/v1/subscriptions/:id
async fn get_subscription(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<Subscription>> {
    Ok(Json(state.engine.get(&identity.user_id, &id).await?))
}

/// POST /api/v1/subscriptions/:id/start
async fn start_subscription(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<Subscription>> {
    Ok(Json(state.engine.start(&identity.user_id, &id).await?))
}

/// POST /api/v1/subscriptions/:id/abandon
async fn abandon_subscription(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    PathParams(id): PathParams<String>,
) -> Result<Json<Subscription>> {
    Ok(Json(state.engine.abandon(&identity.user_id, &id).await?))
}

/// POST /api/v1/subscriptions/:id/completions
async fn complete_task(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    PathParams(id): PathParams<String>,
    JsonBody(request): JsonBody<CompleteTaskRequest>,
) -> Result<Json<CompletionResponse>> {
    Ok(Json(
        state
            .engine
            .complete_task(&identity.user_id, &id, request)
            .await?,
    ))
}

/// DELETE /api/v1/subscriptions/:id/completions/:day/:task_id
async fn uncomplete_task(
    identity: Identity,
    State(state): State<SubscriptionsState>,
    PathParams((id, day, task_id)): PathParams<(String, u32, String)>,
) -> Result<Json<Subscription>> {
    Ok(Json(
        state
            .engine
            .uncomplete_task(&identity.user_id, &id, &task_id, day)
            .await?,
    ))
}

/// POST /api/v1/admin/subscriptions
async fn assign_subscription(
    AdminIdentity(admin): AdminIdentity,
    State(state): State<SubscriptionsState>,
    JsonBody(request): JsonBody<AssignRequest>,
) -> Result<(StatusCode, Json<Subscription>)> {
    let sub = state
        .engine
        .assign(&request.user_id, &request.experiment_id)
        .await?;
    tracing::info!(subscription_id = %sub.id, admin = %admin.user_id, "Subscription assigned");
    Ok((StatusCode::CREATED, Json(sub)))
}
