use sqlx::PgPool;
use uuid::Uuid;

use crate::follow::repo::FollowUser;
use crate::projects::repo::{list_by_user_liked, ProjectWithOwner};

pub async fn insert(db: &PgPool, user_id: Uuid, project_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO project_likes (user_id, project_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(project_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &PgPool, user_id: Uuid, project_id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM project_likes WHERE user_id = $1 AND project_id = $2")
        .bind(user_id)
        .bind(project_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn exists(db: &PgPool, user_id: Uuid, project_id: Uuid) -> sqlx::Result<bool> {
    let found = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM project_likes WHERE user_id = $1 AND project_id = $2",
    )
    .bind(user_id)
    .bind(project_id)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

/// Users who liked the project, most recent first.
pub async fn likers(db: &PgPool, project_id: Uuid) -> sqlx::Result<Vec<FollowUser>> {
    sqlx::query_as::<_, FollowUser>(
        r#"
        SELECT u.id, u.name, u.email, u.avatar, u.role, u.bio
        FROM project_likes l
        JOIN users u ON u.id = l.user_id
        WHERE l.project_id = $1
        ORDER BY l.created_at DESC
        "#,
    )
    .bind(project_id)
    .fetch_all(db)
    .await
}

/// Projects liked by the user, most recently liked first.
pub async fn liked_projects(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<ProjectWithOwner>> {
    list_by_user_liked(db, user_id).await
}

pub async fn count(db: &PgPool, project_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project_likes WHERE project_id = $1")
        .bind(project_id)
        .fetch_one(db)
        .await
}
