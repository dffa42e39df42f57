use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::models::{RequestStatus, Role, Teacher, TeacherRequest};
use crate::database::repositories::Repositories;
use crate::database::store::Document;
use crate::filter::FilterData;
use crate::services::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub request: TeacherRequest,
    pub teacher: Teacher,
}

/// Moves a student into the teacher collection when their request is approved.
///
/// The writes run in a fixed order with no transaction and no compensation:
/// a failure part way leaves the earlier writes in place. Each failed step is
/// logged so the partial migration can be repaired by hand.
pub struct PromotionWorkflow<'a> {
    db: &'a Repositories,
}

impl<'a> PromotionWorkflow<'a> {
    pub fn new(db: &'a Repositories) -> Self {
        Self { db }
    }

    pub async fn approve(&self, request_id: Uuid) -> Result<Promotion, ServiceError> {
        let request = self.load(request_id).await?;
        if request.status != RequestStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "Teacher request {} is already {}",
                request_id, request.status
            )));
        }

        let student = self
            .db
            .students
            .select_one(FilterData::eq("email", request.email.as_str()))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Student not found: {}", request.email)))?;

        let now = Utc::now();

        let request = self
            .db
            .teacher_requests
            .update_id(request_id, status_changes(RequestStatus::Approved))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Teacher request not found: {}", request_id)))?;
        info!("Promotion {}: request marked Approved", request_id);

        let mut role = Document::new();
        role.insert("role".to_string(), json!(Role::Teacher));
        role.insert("last_login".to_string(), json!(now));
        self.db
            .users
            .update_where(FilterData::eq("email", request.email.as_str()), role)
            .await
            .map_err(|e| step_failed(request_id, "set user role", e.into()))?;
        info!("Promotion {}: user {} is now a teacher", request_id, request.email);

        let teacher = self
            .db
            .teachers
            .insert(&Teacher::promoted_from(&student, &request.course))
            .await
            .map_err(|e| step_failed(request_id, "insert teacher", e.into()))?;
        info!("Promotion {}: created teacher {}", request_id, teacher.id);

        self.db
            .students
            .delete_id(student.id)
            .await
            .map_err(|e| step_failed(request_id, "delete student", e.into()))?;
        info!("Promotion {}: removed student {}", request_id, student.id);

        Ok(Promotion { request, teacher })
    }

    /// Non-approval status changes: `Pending -> Rejected`, or a no-op `Pending -> Pending`
    pub async fn set_status(&self, request_id: Uuid, status: RequestStatus) -> Result<TeacherRequest, ServiceError> {
        let request = self.load(request_id).await?;

        if status == RequestStatus::Approved {
            return Err(ServiceError::Validation(
                "Use the approve route to approve a teacher request".to_string(),
            ));
        }
        if request.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Teacher request {} is already {}",
                request_id, request.status
            )));
        }
        if status == request.status {
            return Ok(request);
        }

        let updated = self
            .db
            .teacher_requests
            .update_id(request_id, status_changes(status))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Teacher request not found: {}", request_id)))?;
        info!("Teacher request {} marked {}", request_id, status);
        Ok(updated)
    }

    async fn load(&self, request_id: Uuid) -> Result<TeacherRequest, ServiceError> {
        self.db
            .teacher_requests
            .select_id(request_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Teacher request not found: {}", request_id)))
    }
}

fn status_changes(status: RequestStatus) -> Document {
    let mut changes = Document::new();
    changes.insert("status".to_string(), json!(status));
    changes.insert("updatedAt".to_string(), json!(Utc::now()));
    changes
}

fn step_failed(request_id: Uuid, step: &str, err: ServiceError) -> ServiceError {
    error!(
        "Promotion {} left partially applied: step '{}' failed: {}",
        request_id, step, err
    );
    err
}
