use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    claims::Capability,
    dto::{LoginRequest, RegisterRequest, UpdateProfileRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
};
use crate::{
    error::AppResult,
    json::JsonResponse,
    state::AppState,
    users::{service, PublicUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<JsonResponse<PublicUser>>)> {
    let Json(payload) = payload?;
    let draft = payload.into_draft()?;
    let user = service::create_user(state.users.as_ref(), draft).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(JsonResponse::ok(PublicUser::from(user)).message("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<JsonResponse<PublicUser>>> {
    let Json(payload) = payload?;
    let (email, password) = payload.into_credentials()?;
    let user = service::authenticate(state.users.as_ref(), &email, &password).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok(Json(
        JsonResponse::ok(PublicUser::from(user))
            .token(token)
            .message("Login successful"),
    ))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<JsonResponse<PublicUser>>> {
    let user = service::get_user(state.users.as_ref(), claims.sub).await?;
    Ok(Json(JsonResponse::ok(PublicUser::from(user))))
}

#[instrument(skip(state, claims, payload), fields(user_id = %claims.sub))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Json<JsonResponse<PublicUser>>> {
    claims.require(Capability::EditOwnProfile)?;
    let Json(payload) = payload?;
    let patch = payload.into_patch()?;
    let user = service::update_user(state.users.as_ref(), claims.sub, patch).await?;
    Ok(Json(
        JsonResponse::ok(PublicUser::from(user)).message("Profile updated successfully"),
    ))
}
