use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::store::Document;

/// Enrollment written by an external checkout flow; read-only here
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub student_email: String,
    #[serde(flatten)]
    pub course: Document,
}
