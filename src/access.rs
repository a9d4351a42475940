use uuid::Uuid;

use crate::{auth::Principal, error::ApiError, users::repo::Role};

/// Uniform ownership check applied before every mutating operation:
/// teachers may act on any record, students only on their own.
pub fn ensure_owner_or_teacher(principal: &Principal, owner_id: Uuid) -> Result<(), ApiError> {
    if principal.role == Role::Teacher || principal.id == owner_id {
        Ok(())
    } else {
        Err(ApiError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: Uuid) -> Principal {
        Principal {
            id,
            role: Role::Student,
        }
    }

    #[test]
    fn owner_is_allowed() {
        let id = Uuid::new_v4();
        assert!(ensure_owner_or_teacher(&student(id), id).is_ok());
    }

    #[test]
    fn other_student_is_denied() {
        let res = ensure_owner_or_teacher(&student(Uuid::new_v4()), Uuid::new_v4());
        assert!(matches!(res, Err(ApiError::AccessDenied)));
    }

    #[test]
    fn teacher_is_allowed_on_any_record() {
        let teacher = Principal {
            id: Uuid::new_v4(),
            role: Role::Teacher,
        };
        assert!(ensure_owner_or_teacher(&teacher, Uuid::new_v4()).is_ok());
    }
}
