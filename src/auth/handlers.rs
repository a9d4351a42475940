use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AdminResetPasswordRequest, AuthResponse, LoginRequest, MessageResponse, PublicUser,
            RefreshRequest, RegisterRequest, ResetPasswordRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
    users::repo::{NewUser, Role, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/profile", post(profile))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/reset-password-admin", post(reset_password_admin))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Role strings from the registration form: "guru" is a teacher, everything
/// else falls back to student.
fn role_from_form(role: Option<&str>) -> Role {
    match role {
        Some("guru") => Role::Teacher,
        _ => Role::Student,
    }
}

fn token_pair(
    keys: &JwtKeys,
    user: &User,
) -> Result<(String, String), ApiError> {
    let token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;
    Ok((token, refresh_token))
}

fn public_user(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::BadRequest("Email already in use".into()));
    }

    let hash = hash_password(&payload.password)?;
    let new_user = NewUser {
        email: payload.email.clone(),
        password_hash: hash,
        name: payload.name.clone(),
        role: role_from_form(payload.role.as_deref()),
        ..NewUser::default()
    };

    // The unique index on email is authoritative; the pre-check above only
    // produces a friendlier error.
    let user = match User::create(&state.db, &new_user).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("Email already in use".into()))
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let (token, refresh_token) = token_pair(&keys, &user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        token,
        refresh_token,
        user: public_user(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Invalid credentials".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let (token, refresh_token) = token_pair(&keys, &user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        refresh_token,
        user: public_user(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    // Re-load so a deleted user or changed role invalidates the session.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let (token, refresh_token) = token_pair(&keys, &user)?;
    Ok(Json(AuthResponse {
        token,
        refresh_token,
        user: public_user(&user),
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(public_user(&user)))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    let user = User::find_by_id(&state.db, principal.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if !verify_password(&payload.old_password, &user.password_hash)? {
        warn!(user_id = %user.id, "reset-password with wrong old password");
        return Err(ApiError::BadRequest("Old password is incorrect".into()));
    }

    let hash = hash_password(&payload.new_password)?;
    User::set_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password_admin(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<AdminResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if principal.role != Role::Teacher {
        return Err(ApiError::Forbidden(
            "Only teachers can reset passwords".into(),
        ));
    }
    if payload.new_password.len() < 8 {
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    let user = User::find_by_id(&state.db, payload.target_user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let hash = hash_password(&payload.new_password)?;
    User::set_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, admin = %principal.id, "password reset by teacher");
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("siswa@sekolah.sch.id"));
        assert!(is_valid_email("a.b+c@example.com"));
    }

    #[test]
    fn email_regex_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn guru_maps_to_teacher() {
        assert_eq!(role_from_form(Some("guru")), Role::Teacher);
        assert_eq!(role_from_form(Some("siswa")), Role::Student);
        assert_eq!(role_from_form(None), Role::Student);
    }
}
