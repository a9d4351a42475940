use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::projects::repo::Project;
use crate::skills::repo::Skill;
use crate::users::repo::{Role, StudentRow, User};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// User as returned by management endpoints (no password hash, no socials).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role,
            bio: u.bio.clone(),
            avatar: u.avatar.clone(),
            created_at: u.created_at,
        }
    }
}

/// Listing entry: management fields plus owned skills and projects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithPortfolio {
    #[serde(flatten)]
    pub user: UserSummary,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
}

/// Full public profile, socials included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
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
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
}

/// Highlighted-project card shown on search and top-students results.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillName {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    #[serde(flatten)]
    pub student: StudentRow,
    pub skills: Vec<SkillName>,
    pub projects: Vec<ProjectCard>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}
