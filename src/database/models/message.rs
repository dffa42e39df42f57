use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub sender_email: String,
    pub receiver_email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_email: impl Into<String>, receiver_email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_email: sender_email.into(),
            receiver_email: receiver_email.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// The participant on the other side from `email`
    pub fn counterpart(&self, email: &str) -> &str {
        if self.sender_email == email {
            &self.receiver_email
        } else {
            &self.sender_email
        }
    }
}
