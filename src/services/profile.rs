use serde::Serialize;

use crate::database::models::{Role, Student, Teacher, User};
use crate::database::repositories::Repositories;
use crate::filter::FilterData;
use crate::services::error::ServiceError;

/// A user's role-specific profile document
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Student(Student),
    Teacher(Teacher),
    /// Admins have no separate collection; the user record is the profile
    Admin(User),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Student(_) => Role::Student,
            Profile::Teacher(_) => Role::Teacher,
            Profile::Admin(_) => Role::Admin,
        }
    }
}

/// Joins `users` (source of truth for role) with the matching profile collection
pub struct ProfileResolver<'a> {
    db: &'a Repositories,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(db: &'a Repositories) -> Self {
        Self { db }
    }

    pub async fn user(&self, email: &str) -> Result<User, ServiceError> {
        self.db
            .users
            .select_one(FilterData::eq("email", email))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User not found: {}", email)))
    }

    pub async fn role(&self, email: &str) -> Result<Role, ServiceError> {
        Ok(self.user(email).await?.role)
    }

    pub async fn resolve(&self, email: &str) -> Result<Profile, ServiceError> {
        let user = self.user(email).await?;
        match user.role {
            Role::Student => self
                .db
                .students
                .select_one(FilterData::eq("email", email))
                .await?
                .map(Profile::Student)
                .ok_or_else(|| ServiceError::NotFound(format!("Student profile not found: {}", email))),
            Role::Teacher => self
                .db
                .teachers
                .select_one(FilterData::eq("email", email))
                .await?
                .map(Profile::Teacher)
                .ok_or_else(|| ServiceError::NotFound(format!("Teacher profile not found: {}", email))),
            Role::Admin => Ok(Profile::Admin(user)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;
    use uuid::Uuid;

    fn user(email: &str, role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Someone".to_string(),
            email: email.to_string(),
            role,
            image: None,
            roll: None,
            created_at: Utc::now(),
            last_login: Utc::now(),
        }
    }

    #[tokio::test]
    async fn admin_user_is_its_own_profile() {
        let db = Repositories::new(Arc::new(MemoryStore::new()));
        db.users.insert(&user("root@x.com", Role::Admin)).await.unwrap();

        let profile = ProfileResolver::new(&db).resolve("root@x.com").await.unwrap();
        assert_eq!(profile.role(), Role::Admin);
        assert!(matches!(profile, Profile::Admin(ref u) if u.email == "root@x.com"));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let db = Repositories::new(Arc::new(MemoryStore::new()));
        let err = ProfileResolver::new(&db).resolve("ghost@x.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn teacher_role_without_profile_is_not_found() {
        let db = Repositories::new(Arc::new(MemoryStore::new()));
        db.users.insert(&user("t@x.com", Role::Teacher)).await.unwrap();
        let err = ProfileResolver::new(&db).resolve("t@x.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.contains("Teacher profile")));
    }
}
