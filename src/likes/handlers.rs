use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    follow::repo::FollowUser,
    likes::repo,
    mail,
    projects::repo::{find_with_owner, ProjectWithOwner},
    state::AppState,
    users::repo::User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/project-likes/:id", post(like_project).delete(unlike_project))
        .route("/project-likes/project/:id", get(get_project_likes))
        .route("/project-likes/user/:id", get(get_user_likes))
        .route("/project-likes/is-liked/:id", get(is_liked))
        .route("/project-likes/count/:id", get(like_count))
}

#[instrument(skip(state))]
pub async fn like_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let project = find_with_owner(&state.db, project_id)
        .await?
        .ok_or(ApiError::NotFound("Project not found"))?;

    if repo::exists(&state.db, principal.id, project_id).await? {
        return Err(ApiError::BadRequest("Already liked this project".into()));
    }

    repo::insert(&state.db, principal.id, project_id).await?;
    info!(user_id = %principal.id, project_id = %project_id, "project liked");

    // Owner gets a best-effort email unless they liked their own project.
    if project.project.user_id != principal.id {
        notify_owner_about_like(&state, &project, principal.id).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "userId": principal.id, "projectId": project_id })),
    ))
}

async fn notify_owner_about_like(state: &AppState, project: &ProjectWithOwner, liker_id: Uuid) {
    let result = async {
        let owner = User::find_by_id(&state.db, project.project.user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project owner missing"))?;
        let liker_name = User::find_by_id(&state.db, liker_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "Someone".into());

        let project_url = format!(
            "{}/project/{}",
            state.config.frontend_url, project.project.id
        );
        let (subject, html) = mail::project_liked_email(
            &owner.name,
            &liker_name,
            &project.project.title,
            &project_url,
        );
        state.mailer.send(&owner.email, &subject, &html).await
    }
    .await;

    if let Err(e) = result {
        warn!(error = %e, project_id = %project.project.id, "failed to send like notification");
    }
}

#[instrument(skip(state))]
pub async fn unlike_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = repo::delete(&state.db, principal.id, project_id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Like not found"));
    }
    info!(user_id = %principal.id, project_id = %project_id, "project unliked");
    Ok(Json(json!({ "message": "Unlike successfully" })))
}

#[instrument(skip(state))]
pub async fn get_project_likes(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<FollowUser>>, ApiError> {
    Ok(Json(repo::likers(&state.db, project_id).await?))
}

#[instrument(skip(state))]
pub async fn get_user_likes(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectWithOwner>>, ApiError> {
    Ok(Json(repo::liked_projects(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn is_liked(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let is_liked = repo::exists(&state.db, principal.id, project_id).await?;
    Ok(Json(json!({ "isLiked": is_liked })))
}

#[instrument(skip(state))]
pub async fn like_count(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = repo::count(&state.db, project_id).await?;
    Ok(Json(json!({ "count": count })))
}
