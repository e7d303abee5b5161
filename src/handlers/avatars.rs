use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, StaffUser};
use crate::models::{Avatar, CreateAvatar};
use crate::repositories::AvatarRepository;
use crate::storage::{MediaStore, StoredFile};

#[derive(Clone)]
pub struct AvatarsState {
    pub avatar_repo: AvatarRepository,
    pub media: MediaStore,
}

pub async fn list(
    State(state): State<AvatarsState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Avatar>>> {
    Ok(Json(state.avatar_repo.find_all().await?))
}

pub async fn create(
    State(state): State<AvatarsState>,
    _staff: StaffUser,
    Json(form): Json<CreateAvatar>,
) -> Result<Response> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("Avatar name is required".to_string()));
    }
    if form.url.trim().is_empty() {
        return Err(AppError::Validation("Avatar url is required".to_string()));
    }

    let avatar = state.avatar_repo.create(&form.name, &form.url).await?;
    Ok((StatusCode::CREATED, Json(avatar)).into_response())
}

pub async fn delete(
    State(state): State<AvatarsState>,
    _staff: StaffUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.avatar_repo.delete(&id).await? {
        return Err(AppError::not_found("Avatar"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Raw image upload; the body is the file and `Content-Type` its type.
pub async fn upload(
    State(state): State<AvatarsState>,
    staff: StaffUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing content type".to_string()))?;

    let stored: StoredFile = state.media.save(content_type, &body).await?;
    tracing::info!("{} uploaded {}", staff.email, stored.name);
    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

pub async fn serve_media(
    State(state): State<AvatarsState>,
    Path(name): Path<String>,
) -> Result<Response> {
    let (bytes, content_type) = state
        .media
        .load(&name)
        .await?
        .ok_or_else(|| AppError::not_found("File"))?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
