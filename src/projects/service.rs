use futures::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    access::ensure_owner_or_teacher,
    auth::Principal,
    error::{is_unique_violation, ApiError},
    mail,
    projects::repo::{self, NewProject, Owner, Project, ProjectWithOwner},
    state::AppState,
    users::repo::User,
};

#[derive(Debug)]
pub struct CreateProjectInput {
    pub title: String,
    pub description: String,
    pub highlight: bool,
    pub keywords: Vec<String>,
    pub github: Option<String>,
    pub video: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Default)]
pub struct UpdateProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub highlight: Option<bool>,
    pub keywords: Option<Vec<String>>,
    pub github: Option<String>,
    pub video: Option<String>,
    /// New images fully replace the list and re-derive the thumbnail.
    pub images: Vec<String>,
}

pub(crate) fn normalize_title(title: &str) -> String {
    title.trim().to_string()
}

/// Case-insensitive title equality after trimming. Used both for duplicate
/// detection pre-checks and for "did the title change" detection on update.
pub(crate) fn titles_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub(crate) fn derive_thumbnail(images: &[String]) -> Option<String> {
    images.first().cloned()
}

/// Max highlighted projects per student.
pub(crate) const HIGHLIGHT_LIMIT: usize = 3;

async fn check_highlight_limit(
    state: &AppState,
    owner_id: Uuid,
    exclude: Option<Uuid>,
) -> Result<(), ApiError> {
    let current = repo::highlighted(&state.db, owner_id, exclude).await?;
    if current.len() >= HIGHLIGHT_LIMIT {
        return Err(ApiError::HighlightLimitExceeded {
            current_highlights: current,
        });
    }
    Ok(())
}

pub async fn create_project(
    state: &AppState,
    owner_id: Uuid,
    principal: &Principal,
    input: CreateProjectInput,
) -> Result<ProjectWithOwner, ApiError> {
    ensure_owner_or_teacher(principal, owner_id)?;

    let title = normalize_title(&input.title);
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }

    // Friendly pre-check; the unique index is the real guard.
    if repo::duplicate_title_exists(&state.db, owner_id, &title, None).await? {
        return Err(ApiError::DuplicateTitle);
    }

    if input.highlight {
        check_highlight_limit(state, owner_id, None).await?;
    }

    let new = NewProject {
        user_id: owner_id,
        title,
        description: input.description,
        thumbnail: derive_thumbnail(&input.images),
        images: input.images,
        highlight: input.highlight,
        keywords: input.keywords,
        github: input.github,
        video: input.video,
    };

    let project = match repo::insert(&state.db, &new).await {
        Ok(p) => p,
        // Lost the race between pre-check and insert: same domain error.
        Err(e) if is_unique_violation(&e) => return Err(ApiError::DuplicateTitle),
        Err(e) => return Err(e.into()),
    };

    info!(project_id = %project.id, owner_id = %owner_id, "project created");

    notify_followers_about_new_project(state, owner_id, &project).await;

    let owner = User::find_by_id(&state.db, owner_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(ProjectWithOwner {
        project,
        user: Owner {
            id: owner.id,
            name: owner.name,
            avatar: owner.avatar,
            bio: owner.bio,
        },
    })
}

pub async fn update_project(
    state: &AppState,
    id: Uuid,
    principal: &Principal,
    patch: UpdateProjectInput,
) -> Result<ProjectWithOwner, ApiError> {
    let mut project = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project not found"))?;

    ensure_owner_or_teacher(principal, project.user_id)?;

    if patch.highlight == Some(true) && !project.highlight {
        check_highlight_limit(state, project.user_id, Some(id)).await?;
    }

    if let Some(new_title) = &patch.title {
        let new_title = normalize_title(new_title);
        if !new_title.is_empty() && !titles_match(&new_title, &project.title) {
            if repo::duplicate_title_exists(&state.db, project.user_id, &new_title, Some(id))
                .await?
            {
                return Err(ApiError::DuplicateTitle);
            }
        }
        if !new_title.is_empty() {
            project.title = new_title;
        }
    }

    if let Some(description) = patch.description {
        project.description = description;
    }
    if let Some(highlight) = patch.highlight {
        project.highlight = highlight;
    }
    if let Some(keywords) = patch.keywords {
        project.keywords = keywords;
    }
    if patch.github.is_some() {
        project.github = patch.github;
    }
    if patch.video.is_some() {
        project.video = patch.video;
    }
    if !patch.images.is_empty() {
        project.thumbnail = derive_thumbnail(&patch.images);
        project.images = patch.images;
    }

    let project = match repo::update(&state.db, &project).await {
        Ok(p) => p,
        Err(e) if is_unique_violation(&e) => return Err(ApiError::DuplicateTitle),
        Err(e) => return Err(e.into()),
    };

    info!(project_id = %project.id, "project updated");

    let owner = User::find_by_id(&state.db, project.user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(ProjectWithOwner {
        user: Owner {
            id: owner.id,
            name: owner.name,
            avatar: owner.avatar,
            bio: owner.bio,
        },
        project,
    })
}

pub async fn remove_project(
    state: &AppState,
    id: Uuid,
    principal: &Principal,
) -> Result<(), ApiError> {
    let project = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Project not found"))?;

    ensure_owner_or_teacher(principal, project.user_id)?;

    repo::delete(&state.db, id).await?;
    info!(project_id = %id, "project deleted");
    Ok(())
}

/// Best-effort fan-out to every follower of the owner. All sends go out
/// concurrently; any failure is logged and swallowed so the create call
/// never fails on mail problems.
async fn notify_followers_about_new_project(state: &AppState, owner_id: Uuid, project: &Project) {
    if let Err(e) = try_notify_followers(state, owner_id, project).await {
        error!(error = %e, owner_id = %owner_id, "error notifying followers");
    }
}

async fn try_notify_followers(
    state: &AppState,
    owner_id: Uuid,
    project: &Project,
) -> anyhow::Result<()> {
    let followers = crate::follow::repo::followers(&state.db, owner_id).await?;
    if followers.is_empty() {
        return Ok(());
    }

    let uploader_name = User::find_by_id(&state.db, owner_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Someone".into());

    let project_url = format!("{}/project/{}", state.config.frontend_url, project.id);

    let sends = followers.iter().map(|follower| {
        let (subject, html) = mail::new_project_email(
            &follower.name,
            &uploader_name,
            &project.title,
            &project.description,
            &project_url,
        );
        let mailer = state.mailer.clone();
        let to = follower.email.clone();
        async move {
            if let Err(e) = mailer.send(&to, &subject, &html).await {
                warn!(error = %e, %to, "failed to send new-project email");
            }
        }
    });
    join_all(sends).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_trims_whitespace() {
        assert_eq!(normalize_title("  My App  "), "My App");
        assert_eq!(normalize_title("\tPortfolio\n"), "Portfolio");
    }

    #[test]
    fn titles_match_is_case_insensitive() {
        assert!(titles_match("My App", "my app"));
        assert!(titles_match("My App", "my app "));
        assert!(titles_match("  MY APP", "my app"));
        assert!(!titles_match("My App", "My Application"));
    }

    #[test]
    fn thumbnail_is_first_image_or_none() {
        assert_eq!(derive_thumbnail(&[]), None);
        assert_eq!(
            derive_thumbnail(&["/uploads/projects/a.jpg".into(), "/uploads/projects/b.jpg".into()]),
            Some("/uploads/projects/a.jpg".into())
        );
    }

    #[test]
    fn highlight_limit_is_three() {
        assert_eq!(HIGHLIGHT_LIMIT, 3);
    }
}
