use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    projects::{
        dto::{KeywordsQuery, ListQuery, SearchQuery},
        repo,
        service::{self, CreateProjectInput, UpdateProjectInput},
    },
    state::AppState,
    storage,
};

const MAX_IMAGES: usize = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/search", get(search_projects))
        .route("/projects/search/keywords", get(search_by_keywords))
        // POST interprets the path segment as the owner's user id
        // (original API shape: POST /projects/:userId).
        .route(
            "/projects/:id",
            get(get_project)
                .post(create_project)
                .patch(update_project)
                .delete(delete_project),
        )
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

/// Fields collected from the multipart form used by both create and update.
#[derive(Debug, Default)]
struct ProjectForm {
    title: Option<String>,
    description: Option<String>,
    highlight: Option<bool>,
    keywords: Option<Vec<String>>,
    github: Option<String>,
    video: Option<String>,
    images: Vec<String>,
}

async fn read_project_form(state: &AppState, mut mp: Multipart) -> Result<ProjectForm, ApiError> {
    let mut form = ProjectForm::default();

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" | "images[]" => {
                if form.images.len() >= MAX_IMAGES {
                    return Err(ApiError::BadRequest("Too many images".into()));
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                if storage::image_ext(&file_name).is_none() {
                    return Err(ApiError::BadRequest("Only image files are allowed!".into()));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let path = storage::save_image(
                    &state.config.upload_dir,
                    "projects",
                    "images",
                    &file_name,
                    data,
                )
                .await?;
                form.images.push(path);
            }
            "title" => form.title = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "github" => form.github = Some(text(field).await?),
            "video" => form.video = Some(text(field).await?),
            "highlight" => form.highlight = Some(text(field).await? == "true"),
            "keywords" => {
                let raw = text(field).await?;
                let parsed: Vec<String> = serde_json::from_str(&raw)
                    .map_err(|_| ApiError::BadRequest("Invalid keywords".into()))?;
                form.keywords = Some(parsed);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[instrument(skip(state, mp))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(owner_id): Path<Uuid>,
    mp: Multipart,
) -> Result<(StatusCode, Json<repo::ProjectWithOwner>), ApiError> {
    let form = read_project_form(&state, mp).await?;

    let title = form
        .title
        .ok_or_else(|| ApiError::BadRequest("Title is required".into()))?;
    let description = form
        .description
        .ok_or_else(|| ApiError::BadRequest("Description is required".into()))?;

    let input = CreateProjectInput {
        title,
        description,
        highlight: form.highlight.unwrap_or(false),
        keywords: form.keywords.unwrap_or_default(),
        github: form.github,
        video: form.video,
        images: form.images,
    };

    let project = service::create_project(&state, owner_id, &principal, input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(skip(state, mp))]
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<repo::ProjectWithOwner>, ApiError> {
    let form = read_project_form(&state, mp).await?;

    let patch = UpdateProjectInput {
        title: form.title,
        description: form.description,
        highlight: form.highlight,
        keywords: form.keywords,
        github: form.github,
        video: form.video,
        images: form.images,
    };

    let project = service::update_project(&state, id, &principal, patch).await?;
    Ok(Json(project))
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    service::remove_project(&state, id, &principal).await?;
    Ok(Json(json!({ "message": "Project deleted" })))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<repo::ProjectWithOwner>>, ApiError> {
    let projects = repo::list_with_owner(&state.db, q.user_id, q.highlight_filter()).await?;
    Ok(Json(projects))
}

#[instrument(skip(state))]
pub async fn search_projects(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<repo::ProjectWithOwner>>, ApiError> {
    let projects = repo::search_with_owner(&state.db, &q.q).await?;
    Ok(Json(projects))
}

#[instrument(skip(state))]
pub async fn search_by_keywords(
    State(state): State<AppState>,
    Query(q): Query<KeywordsQuery>,
) -> Result<Json<Vec<repo::ProjectWithOwner>>, ApiError> {
    let keywords: Vec<String> = q
        .keywords
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let projects = repo::search_by_keywords(&state.db, &keywords).await?;
    Ok(Json(projects))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<repo::ProjectWithOwner>, ApiError> {
    let project = repo::find_with_owner(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project not found"))?;
    Ok(Json(project))
}
