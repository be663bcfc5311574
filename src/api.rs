//! Unified API router for Habitlab
//!
//! Merges all module routers into a single axum `Router` with CORS, HTTP
//! tracing and the identity middleware.
//!
//! ## Endpoint Map
//!
//! | Prefix                          | Module        | Description                       |
//! |---------------------------------|---------------|-----------------------------------|
//! | `/health`                       | api           | Load balancer health probe        |
//! | `/api/v1/boxes`, `/experiments`, `/tasks`, `/documents` | content | Published content |
//! | `/api/v1/admin/{kind}/*`        | content       | Admin editor and publish workflow |
//! | `/api/v1/subscriptions/*`       | subscriptions | Enrollment, lifecycle, completions |
//! | `/api/v1/admin/subscriptions`   | subscriptions | Admin assignment                  |
//! | `/api/v1/today`                 | progress      | Today view                        |
//! | `/api/v1/journal`               | journal       | Journal projection                |
//! | `/api/v1/me/settings/*`         | settings      | Per-user preferences              |

use crate::auth::with_identity;
use crate::config::{HabitlabConfig, StorageConfig};
use crate::content::{content_router, ContentState, ContentStore};
use crate::error::{Error, Result};
use crate::journal::{journal_router, JournalState, JournalStore};
use crate::progress::{progress_router, ProgressState};
use crate::settings::{settings_router, SettingsState, SettingsStore};
use crate::subscriptions::{
    subscriptions_router, SubscriptionEngine, SubscriptionStore, SubscriptionsState,
};
use axum::{
    http::{header, HeaderName, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Combined application state holding references to all stores
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentStore>,
    pub subscriptions: Arc<SubscriptionStore>,
    pub journal: Arc<JournalStore>,
    pub settings: Arc<SettingsStore>,
    pub engine: Arc<SubscriptionEngine>,
}

impl AppState {
    /// Open every store under the configured base directory
    pub async fn open(storage: &StorageConfig) -> Result<Self> {
        let content = Arc::new(ContentStore::new(storage.content_dir()).await?);
        let subscriptions = Arc::new(SubscriptionStore::new(storage.subscriptions_dir()).await?);
        let journal = Arc::new(JournalStore::new(storage.journal_dir()).await?);
        let settings = Arc::new(SettingsStore::new(storage.settings_dir()).await?);
        let engine = Arc::new(SubscriptionEngine::new(
            content.clone(),
            subscriptions.clone(),
            journal.clone(),
        ));
        Ok(Self {
            content,
            subscriptions,
            journal,
            settings,
            engine,
        })
    }
}

/// Build the complete Habitlab HTTP application
///
/// Merges all module routers, adds identity, tracing and CORS middleware,
/// and returns a single `Router` ready to be served by `axum::serve`.
pub fn build_app(state: &AppState, config: &HabitlabConfig) -> Router {
    let cors = build_cors(config);

    let api = Router::new()
        .merge(content_router(ContentState {
            store: state.content.clone(),
        }))
        .merge(subscriptions_router(SubscriptionsState {
            engine: state.engine.clone(),
        }))
        .merge(progress_router(ProgressState {
            content: state.content.clone(),
            subscriptions: state.subscriptions.clone(),
            settings: state.settings.clone(),
        }))
        .merge(journal_router(JournalState {
            journal: state.journal.clone(),
            content: state.content.clone(),
            settings: state.settings.clone(),
        }))
        .merge(settings_router(SettingsState {
            store: state.settings.clone(),
        }));

    with_identity(api, Arc::new(config.auth.clone()))
        // Root-level probe, outside the identity layer
        .route("/health", get(health_check))
        .fallback(route_not_found)
        .layer(middleware::map_response(hide_method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Unknown routes answer exactly like a denied admin route
async fn route_not_found() -> Error {
    Error::NotFound("Not found".to_string())
}

/// A wrong method on a known path is reported as a missing route
async fn hide_method_not_allowed(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return route_not_found().await.into_response();
    }
    response
}

fn build_cors(config: &HabitlabConfig) -> CorsLayer {
    let origins = &config.server.cors_origins;
    let mut headers = vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT];
    for name in [&config.auth.user_header, &config.auth.role_header] {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(h) => headers.push(h),
            Err(e) => tracing::warn!("Ignoring invalid identity header name '{}': {}", name, e),
        }
    }

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(headers);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn make_app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = HabitlabConfig::default();
        config.storage.base_dir = dir.path().to_path_buf();
        let state = AppState::open(&config.storage).await.unwrap();
        (build_app(&state, &config), dir)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn request(
        user: Option<(&str, &str)>,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = user {
            builder = builder.header("x-user-id", id).header("x-user-role", role);
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 64)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _dir) = make_app().await;
        let resp = app
            .oneshot(request(None, "GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[test]
    fn test_build_cors_with_origins() {
        let mut config = HabitlabConfig::default();
        config.server.cors_origins = vec![
            "http://localhost:5173".to_string(),
            "https://app.example.com".to_string(),
        ];
        let _cors = build_cors(&config);
    }

    #[tokio::test]
    async fn test_unknown_route_matches_admin_denial() {
        let (app, _dir) = make_app().await;
        let user = Some(("u1", "user"));
        let denied = call(&app, request(user, "GET", "/api/v1/admin/boxes", None)).await;
        assert_eq!(denied.0, StatusCode::NOT_FOUND);
        assert_eq!(denied.1["error"]["code"], "NOT_FOUND");

        for uri in ["/api/v1/admin/nothing-here", "/api/v1/nope"] {
            let missing = call(&app, request(user, "GET", uri, None)).await;
            assert_eq!(missing, denied, "{} differs from a denied admin route", uri);
        }

        // Anonymous callers see the same thing
        let anonymous = call(&app, request(None, "GET", "/api/v1/admin/boxes", None)).await;
        assert_eq!(anonymous, denied);

        // So does an unsupported method on an admin path
        let wrong_method = call(&app, request(user, "PATCH", "/api/v1/admin/boxes", None)).await;
        assert_eq!(wrong_method, denied);
    }

    #[tokio::test]
    async fn test_end_to_end_flow() {
        let (app, _dir) = make_app().await;
        let admin = Some(("editor", "admin"));
        let user = Some(("u1", "user"));

        let (status, task) = call(
            &app,
            request(
                admin,
                "POST",
                "/api/v1/admin/tasks",
                Some(json!({
                    "name": {"en": "Walk", "es": "Caminar"},
                    "icon": "walk",
                    "blocks": [{
                        "id": "notes", "type": "text",
                        "label": {"en": "Notes", "es": "Notas"},
                        "placeholder": {"en": "", "es": ""},
                        "multiline": true
                    }]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let task_id = task["id"].as_str().unwrap().to_string();

        let (_, item) = call(
            &app,
            request(
                admin,
                "POST",
                "/api/v1/admin/boxes",
                Some(json!({"name": {"en": "Move", "es": "Moverse"}, "icon": "run"})),
            ),
        )
        .await;
        let box_id = item["id"].as_str().unwrap().to_string();

        let (status, experiment) = call(
            &app,
            request(
                admin,
                "POST",
                "/api/v1/admin/experiments",
                Some(json!({
                    "name": {"en": "One day", "es": "Un día"},
                    "boxId": box_id,
                    "days": [{"tasks": [task_id]}]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let exp_id = experiment["id"].as_str().unwrap().to_string();

        // Draft experiments cannot be joined
        let (status, _) = call(
            &app,
            request(user, "POST", "/api/v1/subscriptions", Some(json!({"experimentId": exp_id}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        for uri in [
            format!("/api/v1/admin/experiments/{}/publish", exp_id),
            format!("/api/v1/admin/tasks/{}/publish", task_id),
        ] {
            let (status, _) = call(&app, request(admin, "POST", &uri, None)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, sub) = call(
            &app,
            request(user, "POST", "/api/v1/subscriptions", Some(json!({"experimentId": exp_id}))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let sub_id = sub["id"].as_str().unwrap().to_string();
        call(
            &app,
            request(user, "POST", &format!("/api/v1/subscriptions/{}/start", sub_id), None),
        )
        .await;

        let (_, today) = call(&app, request(user, "GET", "/api/v1/today", None)).await;
        assert_eq!(today[0]["tasks"][0]["name"], "Walk");

        let (status, done) = call(
            &app,
            request(
                user,
                "POST",
                &format!("/api/v1/subscriptions/{}/completions", sub_id),
                Some(json!({"taskId": task_id, "dayNumber": 1, "responses": {"notes": "done"}})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["finished"], true);
        assert_eq!(done["subscription"]["status"], "completed");

        let (_, today) = call(&app, request(user, "GET", "/api/v1/today", None)).await;
        assert_eq!(today, json!([]));

        call(
            &app,
            request(user, "PATCH", "/api/v1/me/settings", Some(json!({"locale": "es"}))),
        )
        .await;
        let (_, journal) = call(&app, request(user, "GET", "/api/v1/journal", None)).await;
        assert_eq!(journal["data"][0]["response"], "done");
        assert_eq!(journal["data"][0]["taskName"], "Caminar");
        assert_eq!(journal["data"][0]["blockLabel"], "Notas");

        // Box is still a draft and stays hidden
        let (status, _) = call(&app, request(None, "GET", &format!("/api/v1/boxes/{}", box_id), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
