use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse,
            UpdateProfileRequest,
        },
        error::ServiceError,
        extractors::AuthUser,
        services::ProfileService,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/my-profile", get(get_my_profile).put(update_my_profile))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(e) => {
            warn!(error = %e, "bad request body");
            Err(e.into())
        }
    }
}

#[instrument(skip_all)]
pub async fn register(
    State(profiles): State<ProfileService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ServiceError> {
    let req = body(payload)?;
    Ok(Json(profiles.register(req).await?))
}

#[instrument(skip_all)]
pub async fn login(
    State(profiles): State<ProfileService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let req = body(payload)?;
    Ok(Json(profiles.login(req).await?))
}

#[instrument(skip(profiles))]
pub async fn get_my_profile(
    State(profiles): State<ProfileService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ServiceError> {
    Ok(Json(profiles.get_profile(user_id).await?))
}

#[instrument(skip(profiles, payload))]
pub async fn update_my_profile(
    State(profiles): State<ProfileService>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ServiceError> {
    let req = body(payload)?;
    Ok(Json(profiles.update_profile(user_id, req).await?))
}
