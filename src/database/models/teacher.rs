use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::student::{PersonalDetails, Student};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub students: Vec<String>,
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            students: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<i64>,
    #[serde(flatten)]
    pub details: PersonalDetails,
    #[serde(default)]
    pub courses: Vec<Course>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "last_login")]
    pub last_login: DateTime<Utc>,
}

impl Teacher {
    /// Copy a student's record into a fresh teacher document seeded with one course.
    /// `createdAt` and `last_login` carry over from the student.
    pub fn promoted_from(student: &Student, course: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: student.name.clone(),
            email: student.email.clone(),
            image: student.image.clone(),
            roll: Some(student.roll),
            details: student.details.clone(),
            courses: vec![Course::new(course)],
            created_at: student.created_at,
            last_login: student.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn promotion_copies_student_fields() {
        let student = Student {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            image: None,
            roll: 5,
            details: PersonalDetails { gender: Some("female".to_string()), ..Default::default() },
            created_at: Utc::now(),
            last_login: Utc::now(),
        };

        let teacher = Teacher::promoted_from(&student, "Spanish");
        assert_ne!(teacher.id, student.id);
        assert_eq!(teacher.email, "ana@x.com");
        assert_eq!(teacher.roll, Some(5));
        assert_eq!(teacher.details, student.details);
        assert_eq!(teacher.created_at, student.created_at);
        assert_eq!(teacher.courses.len(), 1);
        assert_eq!(teacher.courses[0].name, "Spanish");
        assert!(teacher.courses[0].students.is_empty());
    }

    #[test]
    fn serializes_flattened_details_in_camel_case() {
        let value = json!({
            "_id": Uuid::new_v4(),
            "name": "Bo",
            "email": "bo@x.com",
            "guardianName": "Cy",
            "createdAt": "2024-01-01T00:00:00Z",
            "last_login": "2024-01-02T00:00:00Z"
        });
        let teacher: Teacher = serde_json::from_value(value).unwrap();
        assert_eq!(teacher.details.guardian_name.as_deref(), Some("Cy"));
        assert!(teacher.courses.is_empty());

        let out = serde_json::to_value(&teacher).unwrap();
        assert_eq!(out["guardianName"], "Cy");
        assert!(out.get("gender").is_none());
        assert!(out.get("last_login").is_some());
    }
}
