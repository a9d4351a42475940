use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats/overview", get(overview))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub students: i64,
    pub teachers: i64,
    pub projects_highlight: i64,
    pub skills_distinct: i64,
}

async fn count(db: &PgPool, sql: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(db).await
}

#[instrument(skip(state))]
pub async fn overview(State(state): State<AppState>) -> Result<Json<OverviewResponse>, ApiError> {
    let (students, teachers, projects_highlight, skills_distinct) = tokio::try_join!(
        count(&state.db, "SELECT COUNT(*) FROM users WHERE role = 'STUDENT'"),
        count(&state.db, "SELECT COUNT(*) FROM users WHERE role = 'TEACHER'"),
        count(&state.db, "SELECT COUNT(*) FROM projects WHERE highlight"),
        count(&state.db, "SELECT COUNT(DISTINCT name) FROM skills"),
    )?;

    Ok(Json(OverviewResponse {
        students,
        teachers,
        projects_highlight,
        skills_distinct,
    }))
}
