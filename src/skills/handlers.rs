use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    access::ensure_owner_or_teacher,
    auth::AuthUser,
    error::ApiError,
    skills::repo::{self, Skill, SkillWithOwner},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills))
        // POST path segment is the owner's user id.
        .route(
            "/skills/:id",
            get(get_skill)
                .post(create_skill)
                .patch(update_skill)
                .delete(delete_skill),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSkillRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillListQuery {
    pub user_id: Option<Uuid>,
}

#[instrument(skip(state, payload))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), ApiError> {
    ensure_owner_or_teacher(&principal, user_id)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let skill = repo::insert(&state.db, user_id, name).await?;
    info!(skill_id = %skill.id, user_id = %user_id, "skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

#[instrument(skip(state))]
pub async fn list_skills(
    State(state): State<AppState>,
    Query(q): Query<SkillListQuery>,
) -> Result<Json<Vec<SkillWithOwner>>, ApiError> {
    let skills = repo::list_with_owner(&state.db, q.user_id).await?;
    Ok(Json(skills))
}

#[instrument(skip(state))]
pub async fn get_skill(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Skill>, ApiError> {
    let skill = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Skill not found"))?;
    ensure_owner_or_teacher(&principal, skill.user_id)?;
    Ok(Json(skill))
}

#[instrument(skip(state, payload))]
pub async fn update_skill(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSkillRequest>,
) -> Result<Json<Skill>, ApiError> {
    let skill = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Skill not found"))?;
    ensure_owner_or_teacher(&principal, skill.user_id)?;

    let skill = match payload.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => repo::update_name(&state.db, id, name).await?,
        _ => skill,
    };
    Ok(Json(skill))
}

#[instrument(skip(state))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let skill = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Skill not found"))?;
    ensure_owner_or_teacher(&principal, skill.user_id)?;

    repo::delete(&state.db, id).await?;
    info!(skill_id = %id, "skill deleted");
    Ok(Json(json!({ "message": "Skill deleted" })))
}
