use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{PersonalDetails, Role, Student, User};
use crate::database::repositories::Repositories;
use crate::filter::FilterData;
use crate::services::error::ServiceError;

/// Validated input for a new student account
#[derive(Debug, Clone)]
pub struct StudentRegistration {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub details: PersonalDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredStudent {
    pub user: User,
    pub student: Student,
}

/// Create the user and student records for a new registration.
///
/// `roll` is `count(students) + 1` read before the insert; two concurrent
/// registrations can observe the same count and share a roll.
pub async fn register_student(db: &Repositories, registration: StudentRegistration) -> Result<RegisteredStudent, ServiceError> {
    let existing = db.users.count(FilterData::eq("email", registration.email.as_str())).await?;
    if existing > 0 {
        return Err(ServiceError::Conflict(format!("Email already registered: {}", registration.email)));
    }

    let roll = db.students.count(FilterData::all()).await? + 1;
    let now = Utc::now();

    let user = User {
        id: Uuid::new_v4(),
        name: registration.name.clone(),
        email: registration.email.clone(),
        role: Role::Student,
        image: registration.image.clone(),
        roll: Some(roll),
        created_at: now,
        last_login: now,
    };
    let user = db.users.insert(&user).await?;

    let student = Student {
        id: Uuid::new_v4(),
        name: registration.name,
        email: registration.email,
        image: registration.image,
        roll,
        details: registration.details,
        created_at: now,
        last_login: now,
    };
    let student = db.students.insert(&student).await?;

    info!("Registered student {} with roll {}", student.email, roll);
    Ok(RegisteredStudent { user, student })
}
