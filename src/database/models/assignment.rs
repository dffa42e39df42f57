use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Teacher email
    pub uploaded_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

pub const STATUS_SUBMITTED: &str = "submitted";

/// A student's link-based answer to an assignment, graded by an admin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub submission_link: String,
    pub student_email: String,
    pub student_name: String,
    pub status: String,
    #[serde(default)]
    pub mark: Option<f64>,
    #[serde(default)]
    pub admin_comments: Option<String>,
    #[serde(default)]
    pub marked_by: Option<String>,
    #[serde(default)]
    pub marked_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}
