use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::models::{User, UserRole};
use crate::repositories::SessionRepository;
use crate::session::get_session_token;

/// The caller behind a valid `session` cookie.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub token: String,
}

impl AuthUser {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            token,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Staff may act on anyone; others only on themselves.
    pub fn can_act_for(&self, user_id: &str) -> bool {
        self.is_staff() || self.id == user_id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session_repo = parts
            .extensions
            .get::<SessionRepository>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session repository not configured".to_string()))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let token = get_session_token(&jar).ok_or(AppError::Unauthorized)?;

        let user = session_repo
            .find_user(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser::new(user, token))
    }
}

/// Admin or personal trainer.
#[derive(Clone, Debug)]
pub struct StaffUser(pub AuthUser);

impl Deref for StaffUser {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff() {
            return Err(AppError::Forbidden("Staff access required".to_string()));
        }
        Ok(StaffUser(user))
    }
}

#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

impl Deref for AdminUser {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(id: &str, role: UserRole) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            display_name: id.to_string(),
            role,
            token: "t".to_string(),
        }
    }

    #[test]
    fn test_can_act_for() {
        let user = auth_user("u1", UserRole::User);
        assert!(user.can_act_for("u1"));
        assert!(!user.can_act_for("u2"));

        let trainer = auth_user("p1", UserRole::Personal);
        assert!(trainer.can_act_for("u2"));
    }
}
