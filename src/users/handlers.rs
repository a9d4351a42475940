use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    access::ensure_owner_or_teacher,
    auth::{handlers::is_valid_email, password::hash_password, AuthUser},
    error::{is_unique_violation, ApiError},
    projects, skills,
    state::AppState,
    storage,
    users::{
        dto::{
            CreateUserRequest, LimitQuery, SearchQuery, SkillName, StudentSummary,
            UpdateUserRequest, UserProfile, UserSummary, UserWithPortfolio,
        },
        repo::{self, NewUser, Role, User},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/search", get(search_users))
        .route("/users/top-students", get(top_students))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route(
            "/users/:id/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(5 * 1024 * 1024)),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let role = payload.role.unwrap_or(Role::Student);
    if principal.role != Role::Teacher && role != Role::Student {
        return Err(ApiError::Forbidden(
            "Only teachers can create non-student accounts".into(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    let new = NewUser {
        email,
        password_hash: hash_password(&payload.password)?,
        name: payload.name,
        role,
        bio: payload.bio,
        avatar: payload.avatar,
        github: payload.github,
        linkedin: payload.linkedin,
        twitter: payload.twitter,
        website: payload.website,
        location: payload.location,
    };

    let user = match User::create(&state.db, &new).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("Email already in use".into()))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, created_by = %principal.id, "user created");
    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

async fn with_portfolio(state: &AppState, user: &User) -> Result<UserWithPortfolio, ApiError> {
    let (skills, projects) = tokio::try_join!(
        skills::repo::list_by_user(&state.db, user.id),
        projects::repo::list_by_user(&state.db, user.id),
    )?;
    Ok(UserWithPortfolio {
        user: UserSummary::from(user),
        skills,
        projects,
    })
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<UserWithPortfolio>>, ApiError> {
    // Teachers see everyone, students only themselves.
    let users = if principal.role == Role::Teacher {
        User::list_all(&state.db).await?
    } else {
        User::find_by_id(&state.db, principal.id)
            .await?
            .into_iter()
            .collect()
    };

    let mut out = Vec::with_capacity(users.len());
    for user in &users {
        out.push(with_portfolio(&state, user).await?);
    }
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<StudentSummary>>, ApiError> {
    let students = repo::search_students(&state.db, &q.q).await?;

    let mut out = Vec::with_capacity(students.len());
    for student in students {
        let skills = repo::skill_names(&state.db, student.id).await?;
        let cards = projects::repo::highlight_cards(&state.db, student.id, i64::MAX).await?;
        out.push(StudentSummary {
            student,
            skills: skills.into_iter().map(|name| SkillName { name }).collect(),
            projects: cards,
        });
    }
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn top_students(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<StudentSummary>>, ApiError> {
    let limit = q.limit.unwrap_or(10).clamp(1, 100);
    let students = repo::top_students(&state.db, limit).await?;

    let mut out = Vec::with_capacity(students.len());
    for student in students {
        let skills = repo::skill_names(&state.db, student.id).await?;
        let cards = projects::repo::highlight_cards(&state.db, student.id, 3).await?;
        out.push(StudentSummary {
            student,
            skills: skills.into_iter().map(|name| SkillName { name }).collect(),
            projects: cards,
        });
    }
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let (skills, projects) = tokio::try_join!(
        skills::repo::list_by_user(&state.db, user.id),
        projects::repo::list_by_user(&state.db, user.id),
    )?;

    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        bio: user.bio,
        avatar: user.avatar,
        github: user.github,
        linkedin: user.linkedin,
        twitter: user.twitter,
        website: user.website,
        location: user.location,
        created_at: user.created_at,
        skills,
        projects,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    ensure_owner_or_teacher(&principal, id)?;

    let mut user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::BadRequest("Invalid email".into()));
        }
        user.email = email;
    }
    if let Some(password) = payload.password {
        if password.len() < 8 {
            return Err(ApiError::BadRequest("Password too short".into()));
        }
        user.password_hash = hash_password(&password)?;
    }
    if let Some(name) = payload.name {
        user.name = name;
    }
    // Role changes are a teacher-only operation; students cannot promote
    // themselves.
    if let Some(role) = payload.role {
        if principal.role != Role::Teacher {
            return Err(ApiError::Forbidden("Only teachers can change roles".into()));
        }
        user.role = role;
    }
    if payload.bio.is_some() {
        user.bio = payload.bio;
    }
    if payload.avatar.is_some() {
        user.avatar = payload.avatar;
    }
    if payload.github.is_some() {
        user.github = payload.github;
    }
    if payload.linkedin.is_some() {
        user.linkedin = payload.linkedin;
    }
    if payload.twitter.is_some() {
        user.twitter = payload.twitter;
    }
    if payload.website.is_some() {
        user.website = payload.website;
    }
    if payload.location.is_some() {
        user.location = payload.location;
    }

    let user = match User::update(&state.db, &user).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("Email already in use".into()))
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "user updated");
    Ok(Json(UserSummary::from(&user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if principal.role != Role::Teacher {
        return Err(ApiError::Forbidden("Only teachers can delete users".into()));
    }

    let removed = User::delete(&state.db, id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("User not found"));
    }
    info!(user_id = %id, deleted_by = %principal.id, "user deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

#[instrument(skip(state, mp))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<UserSummary>, ApiError> {
    ensure_owner_or_teacher(&principal, id)?;

    let mut avatar_path: Option<String> = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if storage::image_ext(&file_name).is_none() {
            return Err(ApiError::BadRequest("Only image files are allowed!".into()));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let path =
            storage::save_image(&state.config.upload_dir, "avatars", "avatar", &file_name, data)
                .await?;
        avatar_path = Some(path);
    }

    let avatar =
        avatar_path.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;

    let user = match User::set_avatar(&state.db, id, &avatar).await {
        Ok(u) => u,
        Err(sqlx::Error::RowNotFound) => return Err(ApiError::NotFound("User not found")),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %id, avatar = %avatar, "avatar updated");
    Ok(Json(UserSummary::from(&user)))
}
