use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::QueryRejection,
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::ListQuery, form::AdminUserForm};
use crate::{
    auth::extractors::AdminUser,
    error::{AppError, AppResult},
    images::services::{discard_image, discard_replaced, store_profile_image},
    json::JsonResponse,
    state::AppState,
    users::{
        service::{self, ListParams},
        PublicUser,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Ids that are not UUIDs cannot exist.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::user_not_found())
}

#[instrument(skip(state, admin, query), fields(admin_id = %admin.sub))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<JsonResponse<Vec<PublicUser>>>> {
    let params: ListParams = query
        .map(|Query(q)| q)
        .unwrap_or_default()
        .into();
    let page = service::list_users(state.users.as_ref(), &params).await?;
    let items = page.items.into_iter().map(PublicUser::from).collect();
    Ok(Json(JsonResponse::ok(items).paginated(page.pagination)))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.sub))]
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<JsonResponse<PublicUser>>> {
    let user = service::get_user(state.users.as_ref(), parse_id(&id)?).await?;
    Ok(Json(JsonResponse::ok(PublicUser::from(user))))
}

#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.sub))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<JsonResponse<PublicUser>>)> {
    let mut form =
        AdminUserForm::from_multipart(multipart?, state.config.uploads.max_bytes).await?;
    let mut draft = form.to_draft()?;

    let image = match form.take_image() {
        Some(upload) => Some(store_profile_image(state.storage.as_ref(), upload).await?),
        None => None,
    };
    if let Some(img) = &image {
        draft.profile_image = img.url.clone();
    }

    let user = match service::create_user(state.users.as_ref(), draft).await {
        Ok(u) => u,
        Err(e) => {
            if let Some(img) = &image {
                discard_image(state.storage.as_ref(), img).await;
            }
            return Err(e);
        }
    };

    info!(user_id = %user.id, role = %user.role, "user created by admin");
    Ok((
        StatusCode::CREATED,
        Json(JsonResponse::ok(PublicUser::from(user)).message("User created successfully")),
    ))
}

#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.sub))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<JsonResponse<PublicUser>>> {
    let id = parse_id(&id)?;
    let mut form =
        AdminUserForm::from_multipart(multipart?, state.config.uploads.max_bytes).await?;
    let mut patch = form.to_patch()?;
    let previous_image = service::get_user(state.users.as_ref(), id).await?.profile_image;

    let image = match form.take_image() {
        Some(upload) => Some(store_profile_image(state.storage.as_ref(), upload).await?),
        None => None,
    };
    if let Some(img) = &image {
        patch.profile_image = Some(img.url.clone());
    }

    let user = match service::update_user(state.users.as_ref(), id, patch).await {
        Ok(u) => u,
        Err(e) => {
            if let Some(img) = &image {
                discard_image(state.storage.as_ref(), img).await;
            }
            return Err(e);
        }
    };

    if image.is_some() && !previous_image.is_empty() {
        discard_replaced(state.storage.as_ref(), &previous_image, &user.profile_image).await;
    }

    info!(user_id = %user.id, "user updated by admin");
    Ok(Json(
        JsonResponse::ok(PublicUser::from(user)).message("User updated successfully"),
    ))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.sub))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<JsonResponse<()>>> {
    service::delete_user(state.users.as_ref(), parse_id(&id)?).await?;
    Ok(Json(JsonResponse::message_only("User deleted successfully")))
}
