use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{LoginCredentials, RegisterUser, User};
use crate::repositories::{SessionRepository, UserRepository};
use crate::session::{create_session_cookie, remove_session_cookie};

#[derive(Clone)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
}

pub async fn register(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(form): Json<RegisterUser>,
) -> Result<Response> {
    form.validate()?;

    let user = state
        .user_repo
        .register(&form.email, &form.password, &form.display_name())
        .await?;
    tracing::info!("Registered user {} as {}", user.email, user.role.as_str());

    let token = state.session_repo.create(&user.id).await?;
    let jar = jar.add(create_session_cookie(&token));

    Ok((StatusCode::CREATED, jar, Json(user)).into_response())
}

pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Response> {
    let user = state
        .user_repo
        .verify_password(&credentials.email, &credentials.password)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let token = state.session_repo.create(&user.id).await?;
    let jar = jar.add(create_session_cookie(&token));

    Ok((jar, Json(user)).into_response())
}

pub async fn logout(
    State(state): State<AuthState>,
    auth_user: AuthUser,
    jar: CookieJar,
) -> Result<Response> {
    state.session_repo.delete(&auth_user.token).await?;
    let jar = jar.add(remove_session_cookie());
    Ok((StatusCode::NO_CONTENT, jar).into_response())
}

pub async fn me(State(state): State<AuthState>, auth_user: AuthUser) -> Result<Json<User>> {
    let user = state
        .user_repo
        .find_by_id(&auth_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user))
}
