use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

const USER_COLUMNS: &str = "id, email, password_hash, name, role, bio, avatar, \
     github, linkedin, twitter, website, location, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &PgPool, new: &NewUser) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, role, bio, avatar,
                               github, linkedin, twitter, website, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(new.role)
        .bind(&new.bio)
        .bind(&new.avatar)
        .bind(&new.github)
        .bind(&new.linkedin)
        .bind(&new.twitter)
        .bind(&new.website)
        .bind(&new.location)
        .fetch_one(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
    }

    /// Full-row update; callers merge patch fields into the loaded user first.
    pub async fn update(db: &PgPool, user: &User) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, role = $5, bio = $6,
                avatar = $7, github = $8, linkedin = $9, twitter = $10,
                website = $11, location = $12
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(&user.github)
        .bind(&user.linkedin)
        .bind(&user.twitter)
        .bind(&user.website)
        .bind(&user.location)
        .fetch_one(db)
        .await
    }

    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_avatar(db: &PgPool, id: Uuid, avatar: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET avatar = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(avatar)
        .fetch_one(db)
        .await
    }

    /// Hard delete; skills, projects, follows and likes cascade in the schema.
    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}

/// Student row for the public search and top-students listings.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
}

pub async fn search_students(db: &PgPool, query: &str) -> sqlx::Result<Vec<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT id, name, bio, avatar, role
        FROM users u
        WHERE u.role = 'STUDENT'
          AND ($1 = ''
               OR u.name ILIKE '%' || $1 || '%'
               OR EXISTS (
                      SELECT 1 FROM skills s
                      WHERE s.user_id = u.id AND s.name ILIKE '%' || $1 || '%'
                  ))
        ORDER BY u.created_at DESC
        "#,
    )
    .bind(query.trim())
    .fetch_all(db)
    .await
}

pub async fn top_students(db: &PgPool, limit: i64) -> sqlx::Result<Vec<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT u.id, u.name, u.bio, u.avatar, u.role
        FROM users u
        LEFT JOIN projects p ON p.user_id = u.id
        WHERE u.role = 'STUDENT'
        GROUP BY u.id
        ORDER BY COUNT(p.id) DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn skill_names(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM skills WHERE user_id = $1 ORDER BY name")
        .bind(user_id)
        .fetch_all(db)
        .await
}
