use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Announcement, Assignment, AssignmentSubmission, EnrolledCourse, Message, QuizTask, Student, Teacher,
    TeacherRequest, User, Video,
};
use crate::database::repository::Repository;
use crate::database::store::{Collection, DocumentStore};
use crate::filter::FilterData;

/// Typed repositories for every collection, handed to handlers through `AppState`
#[derive(Clone)]
pub struct Repositories {
    store: Arc<dyn DocumentStore>,
    pub users: Repository<User>,
    pub students: Repository<Student>,
    pub teachers: Repository<Teacher>,
    pub videos: Repository<Video>,
    pub announcements: Repository<Announcement>,
    pub assignments: Repository<Assignment>,
    pub submissions: Repository<AssignmentSubmission>,
    pub quizzes_tasks: Repository<QuizTask>,
    pub enrolled_courses: Repository<EnrolledCourse>,
    pub teacher_requests: Repository<TeacherRequest>,
    pub messages: Repository<Message>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(Collection::Users, store.clone()),
            students: Repository::new(Collection::Students, store.clone()),
            teachers: Repository::new(Collection::Teachers, store.clone()),
            videos: Repository::new(Collection::Videos, store.clone()),
            announcements: Repository::new(Collection::Announcements, store.clone()),
            assignments: Repository::new(Collection::Assignments, store.clone()),
            submissions: Repository::new(Collection::AssignmentSubmissions, store.clone()),
            quizzes_tasks: Repository::new(Collection::QuizzesTasks, store.clone()),
            enrolled_courses: Repository::new(Collection::EnrolledCourses, store.clone()),
            teacher_requests: Repository::new(Collection::TeacherRequests, store.clone()),
            messages: Repository::new(Collection::Messages, store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

impl Repository<AssignmentSubmission> {
    /// Submissions referencing any of `assignment_ids`, filtered by the store
    pub async fn select_for_assignments(&self, assignment_ids: &[Uuid]) -> Result<Vec<AssignmentSubmission>, DatabaseError> {
        if assignment_ids.is_empty() {
            return Ok(vec![]);
        }
        let ids = assignment_ids.iter().map(|id| json!(id)).collect();
        self.select_any(FilterData::any_of("assignmentId", ids)).await
    }
}
