use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    follow::repo::{self, FollowUser},
    state::AppState,
    users::repo::User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/follow/:id", post(follow_user).delete(unfollow_user))
        .route("/follow/followers/:id", get(get_followers))
        .route("/follow/following/:id", get(get_following))
        .route("/follow/is-following/:id", get(is_following))
        .route("/follow/stats/:id", get(follow_stats))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub following: FollowUser,
}

#[instrument(skip(state))]
pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(following_id): Path<Uuid>,
) -> Result<(StatusCode, Json<FollowResponse>), ApiError> {
    if principal.id == following_id {
        return Err(ApiError::BadRequest("Cannot follow yourself".into()));
    }

    let target = User::find_by_id(&state.db, following_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if repo::exists(&state.db, principal.id, following_id).await? {
        return Err(ApiError::BadRequest("Already following this user".into()));
    }

    repo::insert(&state.db, principal.id, following_id).await?;
    info!(follower = %principal.id, following = %following_id, "follow created");

    Ok((
        StatusCode::CREATED,
        Json(FollowResponse {
            follower_id: principal.id,
            following_id,
            following: FollowUser {
                id: target.id,
                name: target.name,
                email: target.email,
                avatar: target.avatar,
                role: target.role,
                bio: target.bio,
            },
        }),
    ))
}

#[instrument(skip(state))]
pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(following_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = repo::delete(&state.db, principal.id, following_id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Follow relationship not found"));
    }
    info!(follower = %principal.id, following = %following_id, "follow removed");
    Ok(Json(json!({ "message": "Unfollowed successfully" })))
}

#[instrument(skip(state))]
pub async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<FollowUser>>, ApiError> {
    Ok(Json(repo::followers(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<FollowUser>>, ApiError> {
    Ok(Json(repo::following(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn is_following(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let is_following = repo::exists(&state.db, principal.id, user_id).await?;
    Ok(Json(json!({ "isFollowing": is_following })))
}

#[instrument(skip(state))]
pub async fn follow_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (followers, following) = tokio::try_join!(
        repo::follower_count(&state.db, user_id),
        repo::following_count(&state.db, user_id),
    )?;
    Ok(Json(json!({ "followers": followers, "following": following })))
}
