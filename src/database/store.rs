use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::FilterData;

/// A stored document: a JSON object carrying its system id under `_id`.
pub type Document = Map<String, Value>;

/// Key under which every document stores its system-generated id
pub const ID_FIELD: &str = "_id";

/// Fields owned by the service that API payloads may never overwrite
pub const SYSTEM_FIELDS: &[&str] = &[ID_FIELD, "createdAt"];

/// Independently addressed collections of the school platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Students,
    Teachers,
    Videos,
    Announcements,
    Assignments,
    AssignmentSubmissions,
    QuizzesTasks,
    EnrolledCourses,
    TeacherRequests,
    Messages,
}

impl Collection {
    pub const ALL: [Collection; 11] = [
        Collection::Users,
        Collection::Students,
        Collection::Teachers,
        Collection::Videos,
        Collection::Announcements,
        Collection::Assignments,
        Collection::AssignmentSubmissions,
        Collection::QuizzesTasks,
        Collection::EnrolledCourses,
        Collection::TeacherRequests,
        Collection::Messages,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Students => "students",
            Collection::Teachers => "teachers",
            Collection::Videos => "videos",
            Collection::Announcements => "announcements",
            Collection::Assignments => "assignments",
            Collection::AssignmentSubmissions => "assignment_submissions",
            Collection::QuizzesTasks => "quizzes_tasks",
            Collection::EnrolledCourses => "enrolled_courses",
            Collection::TeacherRequests => "teacher_requests",
            Collection::Messages => "messages",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Read the system id of a document
pub fn document_id(doc: &Document) -> Result<Uuid, DatabaseError> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| DatabaseError::QueryError("document is missing a valid _id".to_string()))
}

/// Persistence collaborator. Each call touches one collection; single-document
/// writes are atomic, nothing spans documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document that already carries its `_id`
    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, DatabaseError>;

    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<Vec<Document>, DatabaseError>;

    async fn count(&self, collection: Collection, filter: &FilterData) -> Result<i64, DatabaseError>;

    /// Shallow-merge `changes` into one document; `None` when the id is unknown
    async fn update_one(&self, collection: Collection, id: Uuid, changes: Document) -> Result<Option<Document>, DatabaseError>;

    /// Shallow-merge `changes` into every matching document
    async fn update_many(&self, collection: Collection, filter: &FilterData, changes: Document) -> Result<u64, DatabaseError>;

    async fn delete_one(&self, collection: Collection, id: Uuid) -> Result<bool, DatabaseError>;

    async fn delete_many(&self, collection: Collection, filter: &FilterData) -> Result<u64, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
