//! Caller identity
//!
//! Authentication happens upstream: the gateway in front of Habitlab
//! verifies the session and forwards the user id and role as headers. The
//! [`identify`] middleware turns those headers into an [`Identity`] request
//! extension, and handlers pull it out with the [`Identity`] or
//! [`AdminIdentity`] extractors.

use crate::config::AuthConfig;
use crate::error::Error;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Caller that passed the admin-role check
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

/// Read identity headers into a request extension.
///
/// Requests without a user header pass through unidentified; the extractors
/// decide whether that is acceptable for the route.
pub async fn identify(
    State(config): State<Arc<AuthConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let user_id = headers
        .get(config.user_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    if let Some(user_id) = user_id {
        let role = match headers
            .get(config.role_header.as_str())
            .and_then(|v| v.to_str().ok())
        {
            Some(role) if role.trim() == config.admin_role => Role::Admin,
            _ => Role::User,
        };
        request.extensions_mut().insert(Identity { user_id, role });
    }

    next.run(request).await
}

/// Wrap a router with the identity middleware
pub fn with_identity(router: Router, config: Arc<AuthConfig>) -> Router {
    router.layer(middleware::from_fn_with_state(config, identify))
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(Error::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Anonymous callers get the same 404 as non-admins.
        let identity = Identity::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::Forbidden("anonymous caller on admin route".to_string()))?;
        if !identity.is_admin() {
            tracing::debug!(user_id = %identity.user_id, "Non-admin caller on admin route");
            return Err(Error::Forbidden("admin role required".to_string()));
        }
        Ok(AdminIdentity(identity))
    }
}
