use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::users::repo::Role;

/// Public user fields returned for follower/following listings and used as
/// notification recipients.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FollowUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub bio: Option<String>,
}

pub async fn insert(db: &PgPool, follower_id: Uuid, following_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO follows (follower_id, following_id) VALUES ($1, $2)")
        .bind(follower_id)
        .bind(following_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &PgPool, follower_id: Uuid, following_id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
        .bind(follower_id)
        .bind(following_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn exists(db: &PgPool, follower_id: Uuid, following_id: Uuid) -> sqlx::Result<bool> {
    let found = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2",
    )
    .bind(follower_id)
    .bind(following_id)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

/// Users following `user_id`, newest follow first.
pub async fn followers(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<FollowUser>> {
    sqlx::query_as::<_, FollowUser>(
        r#"
        SELECT u.id, u.name, u.email, u.avatar, u.role, u.bio
        FROM follows f
        JOIN users u ON u.id = f.follower_id
        WHERE f.following_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Users that `user_id` follows, newest follow first.
pub async fn following(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<FollowUser>> {
    sqlx::query_as::<_, FollowUser>(
        r#"
        SELECT u.id, u.name, u.email, u.avatar, u.role, u.bio
        FROM follows f
        JOIN users u ON u.id = f.following_id
        WHERE f.follower_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn follower_count(db: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

pub async fn following_count(db: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}
