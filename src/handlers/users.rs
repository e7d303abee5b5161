use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, AuthUser, StaffUser};
use crate::models::user::{validate_email, validate_password};
use crate::models::{
    ChangePassword, SyncCredentials, SyncCredentialsResult, UpdateProfile, UpdateRole, User,
};
use crate::repositories::user_repo::verify_password;
use crate::repositories::{AvatarRepository, SessionRepository, UserRepository};

#[derive(Clone)]
pub struct UsersState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
    pub avatar_repo: AvatarRepository,
}

pub async fn update_profile(
    State(state): State<UsersState>,
    auth_user: AuthUser,
    Json(update): Json<UpdateProfile>,
) -> Result<Json<User>> {
    update.validate()?;

    if let Some(avatar_id) = &update.avatar_id {
        state
            .avatar_repo
            .find_by_id(avatar_id)
            .await?
            .ok_or_else(|| AppError::Validation("Unknown avatar".to_string()))?;
    }

    let user = state
        .user_repo
        .update_profile(&auth_user.id, update)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<UsersState>,
    auth_user: AuthUser,
    Json(form): Json<ChangePassword>,
) -> Result<StatusCode> {
    let user = state
        .user_repo
        .find_by_id(&auth_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !verify_password(&form.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    validate_password(&form.new_password)?;

    state
        .user_repo
        .update_password(&auth_user.id, &form.new_password)
        .await?;
    let dropped = state
        .session_repo
        .delete_for_user(&auth_user.id, Some(&auth_user.token))
        .await?;
    tracing::info!(
        "User {} changed password, {} other sessions signed out",
        auth_user.email,
        dropped
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<UsersState>,
    _staff: StaffUser,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.user_repo.find_all().await?))
}

pub async fn show(
    State(state): State<UsersState>,
    _staff: StaffUser,
    Path(user_id): Path<String>,
) -> Result<Json<User>> {
    let user = state
        .user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user))
}

pub async fn update_role(
    State(state): State<UsersState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    Json(form): Json<UpdateRole>,
) -> Result<Json<User>> {
    if admin.id == user_id {
        return Err(AppError::BadRequest(
            "Cannot change your own role".to_string(),
        ));
    }

    if !state.user_repo.update_role(&user_id, form.role).await? {
        return Err(AppError::not_found("User"));
    }
    tracing::info!(
        "{} set role of user {} to {}",
        admin.email,
        user_id,
        form.role.as_str()
    );

    let user = state
        .user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<UsersState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    if admin.id == user_id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    if !state.user_repo.delete(&user_id).await? {
        return Err(AppError::not_found("User"));
    }
    tracing::info!("{} deleted user {}", admin.email, user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Admin-side email/password sync for an account.
pub async fn sync_credentials(
    State(state): State<UsersState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    Json(form): Json<SyncCredentials>,
) -> Result<Json<SyncCredentialsResult>> {
    if form.email.is_none() && form.password.is_none() {
        return Err(AppError::BadRequest(
            "Nothing to update: provide email and/or password".to_string(),
        ));
    }
    if let Some(email) = &form.email {
        validate_email(email)?;
    }
    if let Some(password) = &form.password {
        validate_password(password)?;
    }

    state
        .user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if let Some(email) = &form.email {
        state.user_repo.update_email(&user_id, email).await?;
    }

    let password_changed = match &form.password {
        Some(password) => {
            state.user_repo.update_password(&user_id, password).await?;
            state.session_repo.delete_for_user(&user_id, None).await?;
            true
        }
        None => false,
    };

    let user = state
        .user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    tracing::info!(
        "{} synced credentials of user {} (password changed: {})",
        admin.email,
        user.id,
        password_changed
    );

    Ok(Json(SyncCredentialsResult {
        id: user.id,
        email: user.email,
        password_changed,
    }))
}
