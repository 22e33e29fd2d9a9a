use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::auth::{
    dto::ErrorResponse,
    error::ServiceError,
    jwt::{TokenService, BEARER_PREFIX},
};

/// Routes reachable without a token.
pub const EXEMPT_PATHS: [&str; 3] = ["/register", "/login", "/health"];

/// Identity verified by [`access_gate`], stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[derive(Debug, PartialEq, Eq)]
pub enum GateOutcome {
    PassThrough,
    Authenticated(AuthUser),
    Rejected,
}

pub fn evaluate(path: &str, authorization: Option<&str>, tokens: &TokenService) -> GateOutcome {
    if EXEMPT_PATHS.contains(&path) {
        return GateOutcome::PassThrough;
    }
    // Wrong shape never reaches the token service.
    let Some(token) = authorization.and_then(|h| h.strip_prefix(BEARER_PREFIX)) else {
        return GateOutcome::Rejected;
    };
    match tokens.verify(token) {
        Ok(user_id) => GateOutcome::Authenticated(AuthUser(user_id)),
        Err(_) => GateOutcome::Rejected,
    }
}

pub async fn access_gate(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match evaluate(req.uri().path(), authorization, &tokens) {
        GateOutcome::PassThrough => next.run(req).await,
        GateOutcome::Authenticated(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        GateOutcome::Rejected => {
            warn!(path = %req.uri().path(), "invalid or missing token");
            (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    message: "Invalid Authorization Header".into(),
                }),
            )
                .into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(ServiceError::Forbidden)
    }
}
