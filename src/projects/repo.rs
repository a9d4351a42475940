use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::HighlightedProject;
use crate::users::dto::ProjectCard;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
    pub highlight: bool,
    pub keywords: Vec<String>,
    pub github: Option<String>,
    pub video: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewProject {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
    pub highlight: bool,
    pub keywords: Vec<String>,
    pub github: Option<String>,
    pub video: Option<String>,
}

/// Owner fields attached to project responses.
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,
    pub user: Owner,
}

#[derive(FromRow)]
struct ProjectOwnerRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    images: Vec<String>,
    thumbnail: Option<String>,
    highlight: bool,
    keywords: Vec<String>,
    github: Option<String>,
    video: Option<String>,
    created_at: OffsetDateTime,
    owner_name: String,
    owner_avatar: Option<String>,
    owner_bio: Option<String>,
}

impl ProjectOwnerRow {
    fn split(self) -> ProjectWithOwner {
        ProjectWithOwner {
            user: Owner {
                id: self.user_id,
                name: self.owner_name,
                avatar: self.owner_avatar,
                bio: self.owner_bio,
            },
            project: Project {
                id: self.id,
                user_id: self.user_id,
                title: self.title,
                description: self.description,
                images: self.images,
                thumbnail: self.thumbnail,
                highlight: self.highlight,
                keywords: self.keywords,
                github: self.github,
                video: self.video,
                created_at: self.created_at,
            },
        }
    }
}

const PROJECT_COLUMNS: &str = "id, user_id, title, description, images, thumbnail, \
     highlight, keywords, github, video, created_at";

const JOINED_COLUMNS: &str = "p.id, p.user_id, p.title, p.description, p.images, \
     p.thumbnail, p.highlight, p.keywords, p.github, p.video, p.created_at, \
     u.name AS owner_name, u.avatar AS owner_avatar, u.bio AS owner_bio";

pub async fn insert(db: &PgPool, new: &NewProject) -> sqlx::Result<Project> {
    sqlx::query_as::<_, Project>(&format!(
        r#"
        INSERT INTO projects (user_id, title, description, images, thumbnail,
                              highlight, keywords, github, video)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(new.user_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.images)
    .bind(&new.thumbnail)
    .bind(new.highlight)
    .bind(&new.keywords)
    .bind(&new.github)
    .bind(&new.video)
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Project>> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_with_owner(db: &PgPool, id: Uuid) -> sqlx::Result<Option<ProjectWithOwner>> {
    let row = sqlx::query_as::<_, ProjectOwnerRow>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(ProjectOwnerRow::split))
}

/// Listing used by `GET /projects`. With no owner filter the public view only
/// shows highlighted projects; an explicit highlight filter always wins.
pub async fn list_with_owner(
    db: &PgPool,
    user_id: Option<Uuid>,
    highlight: Option<bool>,
) -> sqlx::Result<Vec<ProjectWithOwner>> {
    let highlight = highlight.or(if user_id.is_none() { Some(true) } else { None });
    let rows = sqlx::query_as::<_, ProjectOwnerRow>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.user_id
        WHERE ($1::uuid IS NULL OR p.user_id = $1)
          AND ($2::boolean IS NULL OR p.highlight = $2)
        ORDER BY p.created_at DESC
        "#
    ))
    .bind(user_id)
    .bind(highlight)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(ProjectOwnerRow::split).collect())
}

/// Case-insensitive substring search over title, description and keywords.
/// A blank query returns everything, newest first.
pub async fn search_with_owner(db: &PgPool, query: &str) -> sqlx::Result<Vec<ProjectWithOwner>> {
    let rows = sqlx::query_as::<_, ProjectOwnerRow>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.user_id
        WHERE ($1 = ''
               OR p.title ILIKE '%' || $1 || '%'
               OR p.description ILIKE '%' || $1 || '%'
               OR EXISTS (
                      SELECT 1 FROM unnest(p.keywords) kw
                      WHERE kw ILIKE '%' || $1 || '%'
                  ))
        ORDER BY p.created_at DESC
        "#
    ))
    .bind(query.trim())
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(ProjectOwnerRow::split).collect())
}

/// Keyword-overlap search across highlighted projects only.
pub async fn search_by_keywords(
    db: &PgPool,
    keywords: &[String],
) -> sqlx::Result<Vec<ProjectWithOwner>> {
    let rows = sqlx::query_as::<_, ProjectOwnerRow>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM projects p
        JOIN users u ON u.id = p.user_id
        WHERE p.highlight AND p.keywords && $1::text[]
        ORDER BY p.created_at DESC
        "#
    ))
    .bind(keywords)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(ProjectOwnerRow::split).collect())
}

/// Pre-check for the per-owner case-insensitive title uniqueness. The unique
/// index on (user_id, lower(title)) remains authoritative under races.
pub async fn duplicate_title_exists(
    db: &PgPool,
    user_id: Uuid,
    title: &str,
    exclude: Option<Uuid>,
) -> sqlx::Result<bool> {
    let found = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM projects
        WHERE user_id = $1
          AND lower(title) = lower($2)
          AND ($3::uuid IS NULL OR id <> $3)
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(exclude)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

/// Currently highlighted projects of an owner, optionally excluding the
/// project being updated. Returned in the limit-exceeded error payload.
pub async fn highlighted(
    db: &PgPool,
    user_id: Uuid,
    exclude: Option<Uuid>,
) -> sqlx::Result<Vec<HighlightedProject>> {
    sqlx::query_as::<_, HighlightedProject>(
        r#"
        SELECT id, title, thumbnail, images
        FROM projects
        WHERE user_id = $1
          AND highlight
          AND ($2::uuid IS NULL OR id <> $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(exclude)
    .fetch_all(db)
    .await
}

/// Full-row update; the service merges patch fields before calling this.
pub async fn update(db: &PgPool, project: &Project) -> sqlx::Result<Project> {
    sqlx::query_as::<_, Project>(&format!(
        r#"
        UPDATE projects
        SET title = $2, description = $3, images = $4, thumbnail = $5,
            highlight = $6, keywords = $7, github = $8, video = $9
        WHERE id = $1
        RETURNING {PROJECT_COLUMNS}
        "#
    ))
    .bind(project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.images)
    .bind(&project.thumbnail)
    .bind(project.highlight)
    .bind(&project.keywords)
    .bind(&project.github)
    .bind(&project.video)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Projects a user has liked, most recently liked first.
pub async fn list_by_user_liked(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<ProjectWithOwner>> {
    let rows = sqlx::query_as::<_, ProjectOwnerRow>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM project_likes l
        JOIN projects p ON p.id = l.project_id
        JOIN users u ON u.id = p.user_id
        WHERE l.user_id = $1
        ORDER BY l.created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(ProjectOwnerRow::split).collect())
}

/// Up to `limit` highlighted-project cards for profile-style listings.
pub async fn highlight_cards(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> sqlx::Result<Vec<ProjectCard>> {
    sqlx::query_as::<_, ProjectCard>(
        r#"
        SELECT id, title, description, images
        FROM projects
        WHERE user_id = $1 AND highlight
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
}
