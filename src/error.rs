use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Compact view of a highlighted project, returned in the
/// `HighlightLimitExceeded` payload so the client can offer an
/// unhighlight-then-retry flow.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedProject {
    pub id: Uuid,
    pub title: String,
    pub thumbnail: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Access denied")]
    AccessDenied,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Project dengan judul yang sama sudah ada")]
    DuplicateTitle,

    #[error("Maksimal 3 project highlight per siswa")]
    HighlightLimitExceeded {
        current_highlights: Vec<HighlightedProject>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

/// True when the database rejected a write due to a unique constraint
/// (Postgres SQLSTATE 23505). The caller translates this to the matching
/// domain error instead of leaking a raw database failure.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::AccessDenied | ApiError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                json!({ "message": self.to_string() }),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "message": self.to_string() }),
            ),
            ApiError::DuplicateTitle => (
                StatusCode::CONFLICT,
                json!({ "message": self.to_string() }),
            ),
            ApiError::HighlightLimitExceeded { current_highlights } => (
                StatusCode::FORBIDDEN,
                json!({
                    "message": self.to_string(),
                    "currentHighlights": current_highlights,
                }),
            ),
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": self.to_string() }),
            ),
            ApiError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": self.to_string() }),
            ),
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn access_denied_maps_to_403() {
        let res = ApiError::AccessDenied.into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn duplicate_title_maps_to_409() {
        let res = ApiError::DuplicateTitle.into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn highlight_limit_maps_to_403_with_payload() {
        let err = ApiError::HighlightLimitExceeded {
            current_highlights: vec![
                HighlightedProject {
                    id: Uuid::new_v4(),
                    title: "Portfolio Site".into(),
                    thumbnail: None,
                    images: vec![],
                },
                HighlightedProject {
                    id: Uuid::new_v4(),
                    title: "Blog App".into(),
                    thumbnail: Some("/uploads/projects/x.jpg".into()),
                    images: vec!["/uploads/projects/x.jpg".into()],
                },
                HighlightedProject {
                    id: Uuid::new_v4(),
                    title: "Game Demo".into(),
                    thumbnail: None,
                    images: vec![],
                },
            ],
        };
        if let ApiError::HighlightLimitExceeded { current_highlights } = &err {
            let json = serde_json::to_value(current_highlights).unwrap();
            assert_eq!(json.as_array().unwrap().len(), 3);
        }
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn highlighted_project_serializes_camel_case() {
        let p = HighlightedProject {
            id: Uuid::new_v4(),
            title: "t".into(),
            thumbnail: Some("/uploads/projects/a.png".into()),
            images: vec!["/uploads/projects/a.png".into()],
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"thumbnail\""));
        assert!(json.contains("\"images\""));
    }

    #[test]
    fn not_found_maps_to_404() {
        let res = ApiError::NotFound("Project not found").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
