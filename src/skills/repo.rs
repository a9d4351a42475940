use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

/// Skill with its owner's public name attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillWithOwner {
    #[serde(flatten)]
    pub skill: Skill,
    pub user: SkillOwner,
}

#[derive(Debug, Serialize)]
pub struct SkillOwner {
    pub id: Uuid,
    pub name: String,
}

#[derive(FromRow)]
struct SkillOwnerRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: OffsetDateTime,
    owner_name: String,
}

impl SkillOwnerRow {
    fn split(self) -> SkillWithOwner {
        SkillWithOwner {
            user: SkillOwner {
                id: self.user_id,
                name: self.owner_name,
            },
            skill: Skill {
                id: self.id,
                user_id: self.user_id,
                name: self.name,
                created_at: self.created_at,
            },
        }
    }
}

pub async fn insert(db: &PgPool, user_id: Uuid, name: &str) -> sqlx::Result<Skill> {
    sqlx::query_as::<_, Skill>(
        r#"
        INSERT INTO skills (user_id, name)
        VALUES ($1, $2)
        RETURNING id, user_id, name, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Skill>> {
    sqlx::query_as::<_, Skill>("SELECT id, user_id, name, created_at FROM skills WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_with_owner(
    db: &PgPool,
    user_id: Option<Uuid>,
) -> sqlx::Result<Vec<SkillWithOwner>> {
    let rows = sqlx::query_as::<_, SkillOwnerRow>(
        r#"
        SELECT s.id, s.user_id, s.name, s.created_at, u.name AS owner_name
        FROM skills s
        JOIN users u ON u.id = s.user_id
        WHERE $1::uuid IS NULL OR s.user_id = $1
        ORDER BY s.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(SkillOwnerRow::split).collect())
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Skill>> {
    sqlx::query_as::<_, Skill>(
        "SELECT id, user_id, name, created_at FROM skills WHERE user_id = $1 ORDER BY name",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn update_name(db: &PgPool, id: Uuid, name: &str) -> sqlx::Result<Skill> {
    sqlx::query_as::<_, Skill>(
        "UPDATE skills SET name = $2 WHERE id = $1 RETURNING id, user_id, name, created_at",
    )
    .bind(id)
    .bind(name)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
